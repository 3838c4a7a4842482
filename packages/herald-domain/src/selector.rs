use serde::{Deserialize, Serialize};

/// Tri-state value of one targeting facet.
///
/// `Unconstrained` and `List(vec![])` are deliberately distinct: the first adds no
/// predicate at all, the second binds an empty array and therefore matches zero rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "ids", rename_all = "snake_case")]
pub enum Selector {
	#[default]
	Unconstrained,
	None,
	All,
	List(Vec<String>),
}
impl Selector {
	pub fn list<I, S>(ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::List(ids.into_iter().map(Into::into).collect())
	}

	pub fn is_none(&self) -> bool {
		matches!(self, Self::None)
	}

	/// True when the facet's relation must be joined (`All` or `List`).
	pub fn needs_join(&self) -> bool {
		matches!(self, Self::All | Self::List(_))
	}
}
