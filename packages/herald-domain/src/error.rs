pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("order_by_name must be one of default, asc, or desc; got {value:?}.")]
	InvalidOrderByName { value: String },
	#[error("Unknown user group {value:?}.")]
	UnknownUserGroup { value: String },
	#[error("Draft audience filter requires a group filter, an individual filter, or paging.")]
	EmptyDraftFilter,
	#[error("Individual audience filter must list its user ids explicitly.")]
	IndividualUserIdsRequired,
	#[error("Invalid filter: {message}")]
	InvalidFilter { message: String },
}
