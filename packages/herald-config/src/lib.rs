mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Audience, Config, Postgres, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.audience.max_page_limit == 0 {
		return Err(Error::Validation {
			message: "audience.max_page_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.audience.default_page_limit == 0 {
		return Err(Error::Validation {
			message: "audience.default_page_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.audience.default_page_limit > cfg.audience.max_page_limit {
		return Err(Error::Validation {
			message: "audience.default_page_limit must not exceed audience.max_page_limit."
				.to_string(),
		});
	}
	if cfg.audience.enrolled_only && cfg.audience.default_enrollment_status.is_empty() {
		return Err(Error::Validation {
			message:
				"audience.default_enrollment_status must be non-empty when audience.enrolled_only is true."
					.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let status = cfg.audience.default_enrollment_status.trim();

	if status.len() != cfg.audience.default_enrollment_status.len() {
		cfg.audience.default_enrollment_status = status.to_string();
	}
}
