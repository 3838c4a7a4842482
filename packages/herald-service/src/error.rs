pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<herald_domain::Error> for Error {
	fn from(err: herald_domain::Error) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}

impl From<herald_storage::Error> for Error {
	fn from(err: herald_storage::Error) -> Self {
		match err {
			herald_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			herald_storage::Error::Sqlx(_)
			| herald_storage::Error::Query { .. }
			| herald_storage::Error::ScanMismatch { .. }
			| herald_storage::Error::Decode(_) => Self::Storage { message: err.to_string() },
		}
	}
}
