use std::fmt;

use sqlx::{Arguments, postgres::PgArguments};

/// A positional placeholder, rendered as `$n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Param(usize);
impl Param {
	pub fn index(&self) -> usize {
		self.0
	}
}
impl fmt::Display for Param {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "${}", self.0)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqlArg {
	Text(String),
	TextArray(Vec<String>),
	Int8(i64),
}

/// Hands out placeholder indices and records the bound values in the same order.
///
/// The index always equals `args.len() + 1`, so the rendered text and the argument list
/// cannot drift apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgBuilder {
	index: usize,
	args: Vec<SqlArg>,
}
impl ArgBuilder {
	pub fn new() -> Self {
		Self { index: 1, args: Vec::new() }
	}

	/// The placeholder the next `add` will return.
	pub fn next(&self) -> Param {
		Param(self.index)
	}

	pub fn add(&mut self, arg: SqlArg) -> Param {
		let param = Param(self.index);

		self.args.push(arg);
		self.index += 1;

		param
	}

	/// Returns the builder to its pristine state, discarding every recorded argument.
	pub fn reset(&mut self) {
		self.index = 1;
		self.args.clear();
	}

	/// Drops every argument bound at or after `to`, so `to` is handed out again next.
	pub fn rewind(&mut self, to: Param) {
		if to.0 < self.index {
			self.args.truncate(to.0 - 1);
			self.index = to.0;
		}
	}

	pub fn args(&self) -> &[SqlArg] {
		&self.args
	}

	pub fn len(&self) -> usize {
		self.args.len()
	}

	pub fn is_empty(&self) -> bool {
		self.args.is_empty()
	}

	pub fn to_pg_arguments(&self) -> Result<PgArguments, sqlx::Error> {
		let mut arguments = PgArguments::default();

		for arg in &self.args {
			match arg {
				SqlArg::Text(value) => Arguments::add(&mut arguments, value.clone()),
				SqlArg::TextArray(values) => Arguments::add(&mut arguments, values.clone()),
				SqlArg::Int8(value) => Arguments::add(&mut arguments, *value),
			}
			.map_err(sqlx::Error::Encode)?;
		}

		Ok(arguments)
	}
}
impl Default for ArgBuilder {
	fn default() -> Self {
		Self::new()
	}
}
