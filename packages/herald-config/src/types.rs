use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub audience: Audience,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Audience {
	/// Upper bound applied to every requested page size.
	#[serde(default = "default_max_page_limit")]
	pub max_page_limit: u32,
	/// Page size used by paged lookups when a request carries no paging.
	#[serde(default = "default_page_limit")]
	pub default_page_limit: u32,
	/// When true, group filters without an enrollment status are restricted to
	/// `default_enrollment_status`.
	#[serde(default = "default_true")]
	pub enrolled_only: bool,
	#[serde(default = "default_enrollment_status")]
	pub default_enrollment_status: String,
}
impl Default for Audience {
	fn default() -> Self {
		Self {
			max_page_limit: default_max_page_limit(),
			default_page_limit: default_page_limit(),
			enrolled_only: default_true(),
			default_enrollment_status: default_enrollment_status(),
		}
	}
}

fn default_max_page_limit() -> u32 {
	1_000
}

fn default_page_limit() -> u32 {
	100
}

fn default_true() -> bool {
	true
}

fn default_enrollment_status() -> String {
	"STUDENT_ENROLLMENT_STATUS_ENROLLED".to_string()
}
