pub mod audience;
pub mod filter;
pub mod selector;

mod error;

pub use audience::Audience;
pub use error::{Error, Result};
pub use filter::{
	DraftAudienceFilter, FetchOptions, GroupAudienceFilter, IndividualAudienceFilter,
	OrderByName, Paging, SendAudienceFilter, UserGroup,
};
pub use selector::Selector;
