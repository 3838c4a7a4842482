//! Compiles audience filters into parameterized Postgres queries.
//!
//! Every compilation walks the filter once, building a plan and binding arguments in
//! placeholder order. The plan is then rendered twice: once with ordering for fetching and
//! once without for counting.

pub mod args;
pub mod branch;
pub mod draft;
pub mod expr;
pub mod union;

pub use args::{ArgBuilder, Param, SqlArg};

use herald_domain::{
	DraftAudienceFilter, FetchOptions, GroupAudienceFilter, IndividualAudienceFilter, OrderByName,
	Paging, SendAudienceFilter, UserGroup,
};

use crate::compiler::{draft::Layer, union::UnionQuery};

const COLUMNS: [&str; 9] = [
	"user_id",
	"student_id",
	"parent_id",
	"grade_id",
	"child_ids",
	"user_group",
	"is_individual",
	"name",
	"email",
];

/// Column shape of every row a compiled query returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
	Base,
	/// Base columns plus `name` and `email`.
	WithName,
}
impl Projection {
	fn from_flags(include_name: bool, order: OrderByName, keyword: bool) -> Self {
		if include_name || keyword || order != OrderByName::Default {
			Self::WithName
		} else {
			Self::Base
		}
	}

	pub fn for_group(filter: &GroupAudienceFilter, options: &FetchOptions) -> Self {
		Self::from_flags(options.include_name, options.order_by_name, filter.keyword().is_some())
	}

	pub fn for_individual(options: &FetchOptions) -> Self {
		Self::from_flags(options.include_name, options.order_by_name, false)
	}

	/// A draft projects names when either side would.
	pub fn for_draft(filter: &DraftAudienceFilter, options: &FetchOptions) -> Self {
		let keyword = filter.group.as_ref().is_some_and(|group| group.keyword().is_some());

		Self::from_flags(options.include_name, options.order_by_name, keyword)
	}

	pub fn for_send(filter: &SendAudienceFilter, options: &FetchOptions) -> Self {
		Self::for_group(&filter.target, options)
	}

	pub fn has_name(&self) -> bool {
		matches!(self, Self::WithName)
	}

	pub fn columns(&self) -> &'static [&'static str] {
		match self {
			Self::Base => &COLUMNS[..7],
			Self::WithName => &COLUMNS,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudiencePlan {
	/// Resolves to no audience without touching the database.
	Empty,
	Union(UnionQuery),
	/// At least two non-empty layers in precedence order.
	Layered(Vec<(Layer, UnionQuery)>),
}
impl AudiencePlan {
	fn from_union(query: UnionQuery) -> Self {
		if query.is_empty() { Self::Empty } else { Self::Union(query) }
	}

	fn render(&self) -> String {
		match self {
			Self::Empty => String::new(),
			Self::Union(query) => query.render(),
			Self::Layered(layers) => draft::render_layers(layers),
		}
	}
}

/// SQL text paired with the arguments its placeholders refer to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
	pub sql: String,
	pub args: ArgBuilder,
}
impl Statement {
	pub fn is_empty(&self) -> bool {
		self.sql.is_empty()
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledAudienceQuery {
	plan: AudiencePlan,
	projection: Projection,
	order: OrderByName,
	paging: Option<Paging>,
	args: ArgBuilder,
}
impl CompiledAudienceQuery {
	fn new(
		plan: AudiencePlan,
		projection: Projection,
		order: OrderByName,
		paging: Option<Paging>,
		mut args: ArgBuilder,
	) -> Self {
		if plan == AudiencePlan::Empty {
			args.reset();
		}

		Self { plan, projection, order, paging, args }
	}

	pub fn is_empty(&self) -> bool {
		self.plan == AudiencePlan::Empty
	}

	pub fn plan(&self) -> &AudiencePlan {
		&self.plan
	}

	pub fn projection(&self) -> Projection {
		self.projection
	}

	pub fn paging(&self) -> Option<Paging> {
		self.paging
	}

	/// Arguments bound by the filter itself, excluding paging.
	pub fn args(&self) -> &[SqlArg] {
		self.args.args()
	}

	/// Names tie-break on `user_id`, so equal names keep a stable order across pages.
	pub fn query_with_order(&self) -> String {
		let body = self.plan.render();

		match self.order.direction() {
			Some(direction) if !body.is_empty() =>
				format!("{body}\nORDER BY name {direction}, user_id {direction}"),
			_ => body,
		}
	}

	pub fn query_without_order(&self) -> String {
		self.plan.render()
	}

	/// The ordered query with `LIMIT`/`OFFSET` appended when the filter pages.
	pub fn fetch_statement(&self) -> Statement {
		let mut args = self.args.clone();
		let mut sql = self.query_with_order();

		if let Some(paging) = self.paging
			&& !sql.is_empty()
		{
			let limit = args.add(SqlArg::Int8(i64::from(paging.limit)));
			let offset = args.add(SqlArg::Int8(i64::from(paging.offset)));

			sql.push_str(&format!("\nLIMIT {limit} OFFSET {offset}"));
		}

		Statement { sql, args }
	}

	/// Counts the unordered, unpaged query; shares its arguments with `fetch_statement`.
	pub fn count_statement(&self) -> Statement {
		let body = self.query_without_order();
		let sql =
			if body.is_empty() { body } else { format!("SELECT COUNT(*) FROM (\n{body}\n) AS t") };

		Statement { sql, args: self.args.clone() }
	}
}

pub fn compile_group(
	filter: &GroupAudienceFilter,
	options: &FetchOptions,
) -> CompiledAudienceQuery {
	let projection = Projection::for_group(filter, options);
	let mut args = ArgBuilder::new();
	let query = compile_group_union(filter, projection, &mut args);

	CompiledAudienceQuery::new(
		AudiencePlan::from_union(query),
		projection,
		options.order_by_name,
		filter.paging,
		args,
	)
}

pub fn compile_individual(
	filter: &IndividualAudienceFilter,
	options: &FetchOptions,
) -> CompiledAudienceQuery {
	let projection = Projection::for_individual(options);
	let mut args = ArgBuilder::new();
	let query = compile_individual_union(filter, projection, &mut args);

	CompiledAudienceQuery::new(
		AudiencePlan::from_union(query),
		projection,
		options.order_by_name,
		None,
		args,
	)
}

/// The group side compiles first, so its arguments always precede the individual side's.
pub fn compile_draft(
	filter: &DraftAudienceFilter,
	options: &FetchOptions,
) -> CompiledAudienceQuery {
	let projection = Projection::for_draft(filter, options);
	let mut args = ArgBuilder::new();
	let group =
		filter.group.as_ref().map(|group| compile_group_union(group, projection, &mut args));
	let individual = filter
		.individual
		.as_ref()
		.map(|individual| compile_individual_union(individual, projection, &mut args));

	CompiledAudienceQuery::new(
		draft::combine_draft(group, individual),
		projection,
		options.order_by_name,
		filter.paging,
		args,
	)
}

/// Resolves everyone a notification reaches when it is sent.
///
/// Group targeting binds first, then generic receivers, then receiver students. A recipient
/// reached by an earlier layer is dropped from the later ones. Send-time resolution is never
/// paged.
pub fn compile_send(
	filter: &SendAudienceFilter,
	options: &FetchOptions,
) -> CompiledAudienceQuery {
	let projection = Projection::for_send(filter, options);
	let mut args = ArgBuilder::new();
	let group = compile_group_union(&filter.target, projection, &mut args);
	let generic = filter
		.generic_receivers()
		.map(|individual| compile_individual_union(&individual, projection, &mut args));
	let receivers = filter.receiver_students().map(|students| {
		compile_receiver_union(&students, &filter.target.user_groups, projection, &mut args)
	});

	CompiledAudienceQuery::new(
		draft::combine_layers([
			(Layer::Group, Some(group)),
			(Layer::Individual, generic),
			(Layer::Receiver, receivers),
		]),
		projection,
		options.order_by_name,
		None,
		args,
	)
}

fn compile_group_union(
	filter: &GroupAudienceFilter,
	projection: Projection,
	args: &mut ArgBuilder,
) -> UnionQuery {
	if filter.selects_nothing() {
		return UnionQuery::empty();
	}

	let start = args.next();
	let pair = branch::compile_group_branches(filter, projection, args);

	union::combine_branches(pair, &filter.user_groups, args, start)
}

/// Individual targeting names its recipients directly, so both user groups are always kept.
fn compile_individual_union(
	filter: &IndividualAudienceFilter,
	projection: Projection,
	args: &mut ArgBuilder,
) -> UnionQuery {
	let start = args.next();
	let pair = branch::compile_individual_branches(filter, projection, args);

	union::combine_branches(pair, &UserGroup::ORDERED, args, start)
}

/// Receiver students resolve to the user groups the target group selects.
fn compile_receiver_union(
	filter: &IndividualAudienceFilter,
	user_groups: &[UserGroup],
	projection: Projection,
	args: &mut ArgBuilder,
) -> UnionQuery {
	let start = args.next();
	let pair = branch::compile_receiver_branches(filter, projection, args);

	union::combine_branches(pair, user_groups, args, start)
}
