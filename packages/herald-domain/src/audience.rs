use serde::{Deserialize, Serialize};

use crate::UserGroup;

/// A resolved notification recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audience {
	pub user_id: String,
	pub student_id: Option<String>,
	pub parent_id: Option<String>,
	pub grade_id: Option<String>,
	/// Children of a parent recipient, ordered by id; empty for students.
	pub child_ids: Vec<String>,
	pub user_group: UserGroup,
	pub is_individual: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
}
