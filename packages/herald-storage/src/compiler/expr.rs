use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::compiler::args::Param;

/// Leaf value inside a predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
	Column(&'static str),
	Param(Param),
	/// A text-array placeholder with an explicit cast, needed where Postgres cannot infer it.
	TextArray(Param),
	/// `CONCAT('%', $n::text, '%')`, a substring pattern for `ILIKE`.
	Substring(Param),
}
impl Display for Operand {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		match self {
			Self::Column(column) => f.write_str(column),
			Self::Param(param) => write!(f, "{param}"),
			Self::TextArray(param) => write!(f, "{param}::text[]"),
			Self::Substring(param) => write!(f, "CONCAT('%', {param}::text, '%')"),
		}
	}
}

/// Escapes `LIKE` wildcards so `value` matches literally under the default backslash escape.
pub fn like_literal(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());

	for ch in value.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			escaped.push('\\');
		}

		escaped.push(ch);
	}

	escaped
}

/// Predicate tree rendered into a `WHERE` clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
	And(Vec<Expr>),
	Or(Vec<Expr>),
	Not(Box<Expr>),
	Bool(bool),
	IsNull(Operand),
	Eq { left: Operand, right: Operand },
	Any { left: Operand, array: Operand },
	ILike { left: Operand, pattern: Operand },
}
impl Expr {
	/// `($n::text[] IS NULL OR column = ANY($n))`.
	///
	/// The null guard keeps the predicate total when the bound array is null; an empty
	/// array still matches zero rows.
	pub fn column_in(column: &'static str, param: Param) -> Self {
		Self::Or(vec![
			Self::IsNull(Operand::TextArray(param)),
			Self::Any { left: Operand::Column(column), array: Operand::Param(param) },
		])
	}

	pub fn column_eq(column: &'static str, param: Param) -> Self {
		Self::Eq { left: Operand::Column(column), right: Operand::Param(param) }
	}

	pub fn column_not_in(column: &'static str, param: Param) -> Self {
		Self::Not(Box::new(Self::Any {
			left: Operand::Column(column),
			array: Operand::Param(param),
		}))
	}

	/// Case-insensitive substring match against any of `columns`.
	pub fn contains_any(columns: &[&'static str], param: Param) -> Self {
		Self::Or(
			columns
				.iter()
				.copied()
				.map(|column| Self::ILike {
					left: Operand::Column(column),
					pattern: Operand::Substring(param),
				})
				.collect(),
		)
	}

	fn is_compound(&self) -> bool {
		matches!(self, Self::And(nodes) | Self::Or(nodes) if nodes.len() > 1)
	}

	fn fmt_joined(nodes: &[Self], separator: &str, f: &mut Formatter<'_>) -> FmtResult {
		for (idx, node) in nodes.iter().enumerate() {
			if idx > 0 {
				f.write_str(separator)?;
			}

			if node.is_compound() {
				write!(f, "({node})")?;
			} else {
				write!(f, "{node}")?;
			}
		}

		Ok(())
	}
}
impl Display for Expr {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		match self {
			Self::And(nodes) if nodes.is_empty() => f.write_str("TRUE"),
			Self::Or(nodes) if nodes.is_empty() => f.write_str("FALSE"),
			Self::And(nodes) => Self::fmt_joined(nodes, " AND ", f),
			Self::Or(nodes) => Self::fmt_joined(nodes, " OR ", f),
			Self::Not(node) => write!(f, "NOT ({node})"),
			Self::Bool(true) => f.write_str("TRUE"),
			Self::Bool(false) => f.write_str("FALSE"),
			Self::IsNull(operand) => write!(f, "{operand} IS NULL"),
			Self::Eq { left, right } => write!(f, "{left} = {right}"),
			Self::Any { left, array } => write!(f, "{left} = ANY({array})"),
			Self::ILike { left, pattern } => write!(f, "{left} ILIKE {pattern}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::compiler::{
		args::{ArgBuilder, SqlArg},
		expr::{self, Expr},
	};

	#[test]
	fn like_wildcards_are_escaped() {
		assert_eq!(expr::like_literal("ann"), "ann");
		assert_eq!(expr::like_literal("100%_a\\b"), "100\\%\\_a\\\\b");
	}

	#[test]
	fn list_predicate_guards_null_arrays() {
		let mut args = ArgBuilder::new();
		let param = args.add(SqlArg::TextArray(vec!["location-1".to_string()]));

		assert_eq!(
			Expr::column_in("uap.location_id", param).to_string(),
			"$1::text[] IS NULL OR uap.location_id = ANY($1)"
		);
	}

	#[test]
	fn nested_groups_are_parenthesized() {
		let mut args = ArgBuilder::new();
		let status = args.add(SqlArg::Text("enrolled".to_string()));
		let keyword = args.add(SqlArg::Text("ann".to_string()));
		let expr = Expr::And(vec![
			Expr::Bool(true),
			Expr::column_eq("sesh.enrollment_status", status),
			Expr::contains_any(&["u.name", "u.email"], keyword),
		]);

		assert_eq!(
			expr.to_string(),
			"TRUE AND sesh.enrollment_status = $1 AND \
			 (u.name ILIKE CONCAT('%', $2::text, '%') OR u.email ILIKE CONCAT('%', $2::text, '%'))"
		);
	}

	#[test]
	fn empty_groups_render_identities() {
		assert_eq!(Expr::And(Vec::new()).to_string(), "TRUE");
		assert_eq!(Expr::Or(Vec::new()).to_string(), "FALSE");
	}
}
