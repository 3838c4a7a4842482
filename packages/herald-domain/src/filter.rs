use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserGroup {
	#[serde(rename = "USER_GROUP_STUDENT")]
	Student,
	#[serde(rename = "USER_GROUP_PARENT")]
	Parent,
}
impl UserGroup {
	/// Declaration order; unions always list the student branch first.
	pub const ORDERED: [Self; 2] = [Self::Student, Self::Parent];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Student => "USER_GROUP_STUDENT",
			Self::Parent => "USER_GROUP_PARENT",
		}
	}
}
impl FromStr for UserGroup {
	type Err = Error;

	fn from_str(value: &str) -> Result<Self> {
		match value {
			"USER_GROUP_STUDENT" => Ok(Self::Student),
			"USER_GROUP_PARENT" => Ok(Self::Parent),
			_ => Err(Error::UnknownUserGroup { value: value.to_string() }),
		}
	}
}
impl fmt::Display for UserGroup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Limit and offset travel together; a filter either pages or it does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
	pub limit: u32,
	pub offset: u32,
}
impl Paging {
	pub fn new(limit: u32, offset: u32) -> Self {
		Self { limit, offset }
	}

	pub fn clamped(self, max_limit: u32) -> Self {
		Self { limit: self.limit.min(max_limit), offset: self.offset }
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupAudienceFilter {
	pub location: Selector,
	pub course: Selector,
	pub class: Selector,
	pub grade: Selector,
	pub school: Selector,
	pub user_groups: Vec<UserGroup>,
	pub keyword: Option<String>,
	pub enrollment_status: Option<String>,
	/// Restricts results to these user ids; `Some(vec![])` matches nobody.
	pub include_user_ids: Option<Vec<String>>,
	pub exclude_user_ids: Vec<String>,
	pub paging: Option<Paging>,
}
impl GroupAudienceFilter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Trimmed keyword; blank keywords count as absent.
	pub fn keyword(&self) -> Option<&str> {
		self.keyword.as_deref().map(str::trim).filter(|keyword| !keyword.is_empty())
	}

	/// True when every target-group facet is deselected, which resolves to no audience.
	pub fn selects_nothing(&self) -> bool {
		[&self.location, &self.course, &self.class, &self.grade, &self.school]
			.into_iter()
			.all(Selector::is_none)
	}

	pub fn validate(&self) -> Result<()> {
		if let Some(status) = self.enrollment_status.as_deref()
			&& status.trim().is_empty()
		{
			return Err(Error::InvalidFilter {
				message: "enrollment_status must not be blank when provided.".to_string(),
			});
		}
		if self.exclude_user_ids.iter().any(|id| id.trim().is_empty()) {
			return Err(Error::InvalidFilter {
				message: "exclude_user_ids must not contain blank ids.".to_string(),
			});
		}

		Ok(())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndividualAudienceFilter {
	pub location: Selector,
	pub user_ids: Selector,
	pub enrollment_statuses: Selector,
}
impl IndividualAudienceFilter {
	pub fn new<I, S>(user_ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { user_ids: Selector::list(user_ids), ..Self::default() }
	}

	pub fn validate(&self) -> Result<()> {
		if !matches!(self.user_ids, Selector::List(_)) {
			return Err(Error::IndividualUserIdsRequired);
		}

		Ok(())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftAudienceFilter {
	pub group: Option<GroupAudienceFilter>,
	pub individual: Option<IndividualAudienceFilter>,
	pub paging: Option<Paging>,
}
impl DraftAudienceFilter {
	pub fn validate(&self) -> Result<()> {
		if self.group.is_none() && self.individual.is_none() && self.paging.is_none() {
			return Err(Error::EmptyDraftFilter);
		}
		if let Some(group) = self.group.as_ref() {
			group.validate()?;
		}
		if let Some(individual) = self.individual.as_ref() {
			individual.validate()?;
		}

		Ok(())
	}
}

/// Targeting resolved when a notification is sent.
///
/// The target group reaches recipients through its facets. Its user groups also decide
/// whether each receiver student resolves to the student, the student's parents, or both.
/// Generic receivers resolve whatever their user group. `location` and
/// `enrollment_statuses` constrain both kinds of directly named recipients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendAudienceFilter {
	pub target: GroupAudienceFilter,
	pub generic_receiver_ids: Vec<String>,
	/// Student ids.
	pub receiver_ids: Vec<String>,
	pub location: Selector,
	pub enrollment_statuses: Selector,
}
impl SendAudienceFilter {
	pub fn validate(&self) -> Result<()> {
		self.target.validate()?;

		let mut receivers = self.generic_receiver_ids.iter().chain(&self.receiver_ids);

		if receivers.any(|id| id.trim().is_empty()) {
			return Err(Error::InvalidFilter {
				message: "receiver ids must not contain blank ids.".to_string(),
			});
		}

		Ok(())
	}

	/// Generic receivers as an individual filter; `None` when nobody is named.
	pub fn generic_receivers(&self) -> Option<IndividualAudienceFilter> {
		self.individual(&self.generic_receiver_ids)
	}

	/// Receiver students as an individual filter; `None` when nobody is named.
	pub fn receiver_students(&self) -> Option<IndividualAudienceFilter> {
		self.individual(&self.receiver_ids)
	}

	fn individual(&self, ids: &[String]) -> Option<IndividualAudienceFilter> {
		if ids.is_empty() {
			return None;
		}

		Some(IndividualAudienceFilter {
			location: self.location.clone(),
			user_ids: Selector::list(ids.iter().cloned()),
			enrollment_statuses: self.enrollment_statuses.clone(),
		})
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OrderByName {
	#[default]
	Default,
	Ascending,
	Descending,
}
impl OrderByName {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Default => "default",
			Self::Ascending => "asc",
			Self::Descending => "desc",
		}
	}

	/// SQL direction keyword, absent for the default (unordered) case.
	pub fn direction(&self) -> Option<&'static str> {
		match self {
			Self::Default => None,
			Self::Ascending => Some("ASC"),
			Self::Descending => Some("DESC"),
		}
	}
}
impl FromStr for OrderByName {
	type Err = Error;

	fn from_str(value: &str) -> Result<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"default" => Ok(Self::Default),
			"asc" | "ascending" => Ok(Self::Ascending),
			"desc" | "descending" => Ok(Self::Descending),
			_ => Err(Error::InvalidOrderByName { value: value.to_string() }),
		}
	}
}
impl TryFrom<String> for OrderByName {
	type Error = Error;

	fn try_from(value: String) -> Result<Self> {
		value.parse()
	}
}
impl From<OrderByName> for String {
	fn from(value: OrderByName) -> Self {
		value.as_str().to_string()
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
	pub order_by_name: OrderByName,
	pub include_name: bool,
}
impl FetchOptions {
	/// Validates raw option text before it becomes a typed `FetchOptions`.
	pub fn parse(order_by_name: &str, include_name: bool) -> Result<Self> {
		Ok(Self { order_by_name: order_by_name.parse()?, include_name })
	}
}
