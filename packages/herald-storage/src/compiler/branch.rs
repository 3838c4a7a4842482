use herald_domain::{GroupAudienceFilter, IndividualAudienceFilter, Selector, UserGroup};

use crate::compiler::{
	Projection,
	args::{ArgBuilder, SqlArg},
	expr::{self, Expr, Operand},
};

const ENROLLMENT_WINDOW: &str =
	"sesh.start_date <= now() AND (sesh.end_date IS NULL OR sesh.end_date > now())";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchKind {
	Group,
	Individual,
	/// Students named directly, reaching the students themselves and their parents.
	Receiver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Relation {
	Users,
	AccessPaths,
	Enrollment,
	Courses,
	Classes,
	Schools,
}

/// Relations joined onto a branch. Each flag renders one `JOIN`, so a relation requested by
/// several facets still appears once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Joins {
	users: bool,
	access_paths: bool,
	enrollment: bool,
	courses: bool,
	classes: bool,
	schools: bool,
}
impl Joins {
	fn require(&mut self, relation: Relation) {
		match relation {
			Relation::Users => self.users = true,
			Relation::AccessPaths => self.access_paths = true,
			Relation::Enrollment => self.enrollment = true,
			Relation::Courses => self.courses = true,
			Relation::Classes => self.classes = true,
			Relation::Schools => self.schools = true,
		}
	}
}

/// How a facet treats `Selector::None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WhenNone {
	/// The facet gates nothing: no join, no predicate, no argument.
	Deselect,
	/// The facet excludes every row.
	MatchNothing,
}

/// One `SELECT` producing recipients of a single user group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchQuery {
	origin: UserGroup,
	kind: BranchKind,
	projection: Projection,
	joins: Joins,
	predicates: Vec<Expr>,
}
impl BranchQuery {
	fn new(origin: UserGroup, kind: BranchKind, projection: Projection) -> Self {
		let mut joins = Joins::default();

		if projection.has_name() {
			joins.require(Relation::Users);
		}

		Self { origin, kind, projection, joins, predicates: Vec::new() }
	}

	pub fn origin(&self) -> UserGroup {
		self.origin
	}

	pub fn kind(&self) -> BranchKind {
		self.kind
	}

	/// Id column of the recipient this branch produces.
	fn origin_id(&self) -> &'static str {
		match self.origin {
			UserGroup::Student => "s.student_id",
			UserGroup::Parent => "p.parent_id",
		}
	}

	/// Whose access paths the location facet reads. Group targeting locates parents through
	/// their children; individual targeting locates every recipient directly.
	fn location_holder(&self) -> &'static str {
		match (self.kind, self.origin) {
			(BranchKind::Individual, UserGroup::Parent) => "p.parent_id",
			_ => "s.student_id",
		}
	}

	/// Student-scoped relations must sit at a targeted location when both are joined.
	fn location_link(&self, alias: &str) -> String {
		if self.joins.access_paths && self.location_holder() == "s.student_id" {
			format!(" AND {alias}.location_id = uap.location_id")
		} else {
			String::new()
		}
	}

	fn select_list(&self) -> Vec<String> {
		let is_individual = match self.kind {
			BranchKind::Group => "FALSE",
			BranchKind::Individual | BranchKind::Receiver => "TRUE",
		};
		let mut columns = match self.origin {
			UserGroup::Student => vec![
				"s.student_id AS user_id".to_string(),
				"s.student_id AS student_id".to_string(),
				"NULL::text AS parent_id".to_string(),
				"s.grade_id AS grade_id".to_string(),
				"NULL::text[] AS child_ids".to_string(),
			],
			UserGroup::Parent => vec![
				"p.parent_id AS user_id".to_string(),
				"NULL::text AS student_id".to_string(),
				"p.parent_id AS parent_id".to_string(),
				"NULL::text AS grade_id".to_string(),
				"array_agg(DISTINCT s.student_id ORDER BY s.student_id) AS child_ids".to_string(),
			],
		};

		columns.push(format!("'{}'::text AS user_group", self.origin.as_str()));
		columns.push(format!("{is_individual} AS is_individual"));

		if self.projection.has_name() {
			columns.push("u.name AS name".to_string());
			columns.push("u.email AS email".to_string());
		}

		columns
	}

	fn join_clauses(&self) -> Vec<String> {
		let mut joins = Vec::new();

		if self.origin == UserGroup::Parent {
			joins.push(
				"JOIN student_parents sp ON sp.parent_id = p.parent_id AND sp.deleted_at IS NULL"
					.to_string(),
			);
			joins.push(
				"JOIN students s ON s.student_id = sp.student_id AND s.deleted_at IS NULL"
					.to_string(),
			);
		}
		if self.joins.users {
			joins.push(format!(
				"JOIN users u ON u.user_id = {} AND u.deleted_at IS NULL",
				self.origin_id()
			));
		}
		if self.joins.access_paths {
			joins.push(format!(
				"JOIN user_access_paths uap ON uap.user_id = {} AND uap.deleted_at IS NULL",
				self.location_holder()
			));
		}
		if self.joins.enrollment {
			joins.push(format!(
				"JOIN student_enrollment_status_history sesh ON sesh.student_id = s.student_id \
				 AND sesh.deleted_at IS NULL AND {ENROLLMENT_WINDOW}{}",
				self.location_link("sesh")
			));
		}
		if self.joins.courses {
			joins.push(format!(
				"JOIN student_course sc ON sc.student_id = s.student_id AND sc.deleted_at IS NULL{}",
				self.location_link("sc")
			));
		}
		if self.joins.classes {
			joins.push(
				"JOIN class_member cm ON cm.user_id = s.student_id AND cm.deleted_at IS NULL"
					.to_string(),
			);
		}
		if self.joins.schools {
			joins.push(
				"JOIN school_history sh ON sh.student_id = s.student_id AND sh.deleted_at IS NULL \
				 AND sh.is_current"
					.to_string(),
			);
		}

		joins
	}

	/// Renders the branch as a standalone `SELECT` without ordering or paging.
	pub fn render(&self) -> String {
		let distinct = match self.origin {
			UserGroup::Student => " DISTINCT",
			UserGroup::Parent => "",
		};
		let from = match self.origin {
			UserGroup::Student => "students s",
			UserGroup::Parent => "parents p",
		};
		let mut conditions = vec![Expr::IsNull(Operand::Column(match self.origin {
			UserGroup::Student => "s.deleted_at",
			UserGroup::Parent => "p.deleted_at",
		}))];

		conditions.extend(self.predicates.iter().cloned());

		let select_list = self.select_list().join(",\n\t");
		let mut sql = format!("SELECT{distinct}\n\t{select_list}\nFROM {from}");

		for join in self.join_clauses() {
			sql.push('\n');
			sql.push_str(&join);
		}

		sql.push_str(&format!("\nWHERE {}", Expr::And(conditions)));

		if self.origin == UserGroup::Parent {
			sql.push_str(&format!("\nGROUP BY {}", self.origin_id()));

			if self.projection.has_name() {
				sql.push_str(", u.name, u.email");
			}
		}

		sql
	}
}

/// The student and parent branches compiled from one filter, in lockstep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchPair {
	pub student: BranchQuery,
	pub parent: BranchQuery,
}
impl BranchPair {
	fn new(kind: BranchKind, projection: Projection) -> Self {
		Self {
			student: BranchQuery::new(UserGroup::Student, kind, projection),
			parent: BranchQuery::new(UserGroup::Parent, kind, projection),
		}
	}

	fn require(&mut self, relation: Relation) {
		self.student.joins.require(relation);
		self.parent.joins.require(relation);
	}

	/// Adds the same predicate to both branches; `build` only picks branch-specific columns.
	fn push(&mut self, build: impl Fn(&BranchQuery) -> Expr) {
		let student = build(&self.student);
		let parent = build(&self.parent);

		self.student.predicates.push(student);
		self.parent.predicates.push(parent);
	}

	/// Applies one id facet. A `List` binds exactly one argument, shared by both branches.
	fn apply_selector(
		&mut self,
		args: &mut ArgBuilder,
		selector: &Selector,
		relation: Option<Relation>,
		column: fn(&BranchQuery) -> &'static str,
		when_none: WhenNone,
	) {
		if selector.needs_join()
			&& let Some(relation) = relation
		{
			self.require(relation);
		}

		match selector {
			Selector::Unconstrained | Selector::All => {},
			Selector::None => match when_none {
				WhenNone::Deselect => {},
				WhenNone::MatchNothing => self.push(|_| Expr::Bool(false)),
			},
			Selector::List(ids) => {
				let param = args.add(SqlArg::TextArray(ids.clone()));

				self.push(|branch| Expr::column_in(column(branch), param));
			},
		}
	}
}

/// Compiles a group filter into both branches.
///
/// Arguments are bound in a fixed facet order: enrollment status, keyword, course, class,
/// location, grade, included ids, excluded ids, school. Facets that contribute nothing bind
/// nothing.
pub fn compile_group_branches(
	filter: &GroupAudienceFilter,
	projection: Projection,
	args: &mut ArgBuilder,
) -> BranchPair {
	let mut pair = BranchPair::new(BranchKind::Group, projection);

	if let Some(status) = filter.enrollment_status.as_deref() {
		let param = args.add(SqlArg::Text(status.to_string()));

		pair.require(Relation::Enrollment);
		pair.push(|_| Expr::column_eq("sesh.enrollment_status", param));
	}
	if let Some(keyword) = filter.keyword() {
		let param = args.add(SqlArg::Text(expr::like_literal(keyword)));

		pair.require(Relation::Users);
		pair.push(|_| Expr::contains_any(&["u.name", "u.email"], param));
	}

	// Course, class, grade, and school treat `None` as deselected; the all-`None` filter is
	// short-circuited before compilation.
	pair.apply_selector(
		args,
		&filter.course,
		Some(Relation::Courses),
		|_| "sc.course_id",
		WhenNone::Deselect,
	);
	pair.apply_selector(
		args,
		&filter.class,
		Some(Relation::Classes),
		|_| "cm.class_id",
		WhenNone::Deselect,
	);
	pair.apply_selector(
		args,
		&filter.location,
		Some(Relation::AccessPaths),
		|_| "uap.location_id",
		WhenNone::Deselect,
	);
	pair.apply_selector(args, &filter.grade, None, |_| "s.grade_id", WhenNone::Deselect);

	if let Some(ids) = filter.include_user_ids.as_ref() {
		let param = args.add(SqlArg::TextArray(ids.clone()));

		pair.push(|branch| Expr::column_in(branch.origin_id(), param));
	}
	if !filter.exclude_user_ids.is_empty() {
		let param = args.add(SqlArg::TextArray(filter.exclude_user_ids.clone()));

		pair.push(|branch| Expr::column_not_in(branch.origin_id(), param));
	}

	pair.apply_selector(
		args,
		&filter.school,
		Some(Relation::Schools),
		|_| "sh.school_id",
		WhenNone::Deselect,
	);

	pair
}

/// Compiles an individual filter into both branches, binding enrollment statuses, user ids,
/// then locations.
pub fn compile_individual_branches(
	filter: &IndividualAudienceFilter,
	projection: Projection,
	args: &mut ArgBuilder,
) -> BranchPair {
	let mut pair = BranchPair::new(BranchKind::Individual, projection);

	pair.apply_selector(
		args,
		&filter.enrollment_statuses,
		Some(Relation::Enrollment),
		|_| "sesh.enrollment_status",
		WhenNone::Deselect,
	);
	// Naming nobody must reach nobody.
	pair.apply_selector(
		args,
		&filter.user_ids,
		None,
		BranchQuery::origin_id,
		WhenNone::MatchNothing,
	);
	pair.apply_selector(
		args,
		&filter.location,
		Some(Relation::AccessPaths),
		|_| "uap.location_id",
		WhenNone::Deselect,
	);

	pair
}

/// Compiles directly named students into both branches, binding enrollment statuses, student
/// ids, then locations. Every constraint reads the student; the parent branch reaches the
/// named students' parents and aggregates only those students as children.
pub fn compile_receiver_branches(
	filter: &IndividualAudienceFilter,
	projection: Projection,
	args: &mut ArgBuilder,
) -> BranchPair {
	let mut pair = BranchPair::new(BranchKind::Receiver, projection);

	pair.apply_selector(
		args,
		&filter.enrollment_statuses,
		Some(Relation::Enrollment),
		|_| "sesh.enrollment_status",
		WhenNone::Deselect,
	);
	pair.apply_selector(args, &filter.user_ids, None, |_| "s.student_id", WhenNone::MatchNothing);
	pair.apply_selector(
		args,
		&filter.location,
		Some(Relation::AccessPaths),
		|_| "uap.location_id",
		WhenNone::Deselect,
	);

	pair
}
