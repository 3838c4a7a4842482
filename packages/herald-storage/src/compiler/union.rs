use herald_domain::UserGroup;

use crate::compiler::{
	args::{ArgBuilder, Param},
	branch::{BranchPair, BranchQuery},
};

/// Requested branches, combined with `UNION` in student-then-parent order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnionQuery {
	branches: Vec<BranchQuery>,
}
impl UnionQuery {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.branches.is_empty()
	}

	pub fn branches(&self) -> &[BranchQuery] {
		&self.branches
	}

	/// Renders `(<branch>) UNION (<branch>)`; empty when no branch was requested.
	pub fn render(&self) -> String {
		self.branches
			.iter()
			.map(|branch| format!("(\n{}\n)", branch.render()))
			.collect::<Vec<_>>()
			.join("\nUNION\n")
	}
}

/// Keeps the branches whose user group was requested.
///
/// When nothing was requested the builder is rewound to `start`, the placeholder it handed
/// out before the pair was compiled, since the arguments bound for the dropped branches no
/// longer correspond to any placeholder. A pair compiled first rewinds to a pristine builder.
pub fn combine_branches(
	pair: BranchPair,
	requested: &[UserGroup],
	args: &mut ArgBuilder,
	start: Param,
) -> UnionQuery {
	let BranchPair { student, parent } = pair;
	let branches = [student, parent]
		.into_iter()
		.filter(|branch| requested.contains(&branch.origin()))
		.collect::<Vec<_>>();

	if branches.is_empty() {
		args.rewind(start);
	}

	UnionQuery { branches }
}
