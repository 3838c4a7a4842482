#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("{context}: {source}")]
	Query {
		context: &'static str,
		#[source]
		source: sqlx::Error,
	},
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Row has {actual} columns but the compiled projection expects {expected}.")]
	ScanMismatch { expected: usize, actual: usize },
	#[error("Unexpected column value: {0}")]
	Decode(String),
}
impl From<herald_domain::Error> for Error {
	fn from(err: herald_domain::Error) -> Self {
		Self::InvalidArgument(err.to_string())
	}
}
