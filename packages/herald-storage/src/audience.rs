use herald_domain::{
	Audience, DraftAudienceFilter, FetchOptions, GroupAudienceFilter, IndividualAudienceFilter,
	SendAudienceFilter, UserGroup,
};
use sqlx::{Executor, Postgres, Row, postgres::PgRow};

use crate::{
	Error, Result,
	compiler::{self, CompiledAudienceQuery, Projection},
};

pub async fn find_group_audiences<'e, E>(
	executor: E,
	filter: &GroupAudienceFilter,
	options: &FetchOptions,
) -> Result<Vec<Audience>>
where
	E: Executor<'e, Database = Postgres>,
{
	filter.validate()?;

	fetch_audiences(executor, &compiler::compile_group(filter, options)).await
}

pub async fn count_group_audiences<'e, E>(executor: E, filter: &GroupAudienceFilter) -> Result<u32>
where
	E: Executor<'e, Database = Postgres>,
{
	filter.validate()?;

	count_audiences(executor, &compiler::compile_group(filter, &FetchOptions::default())).await
}

/// Individual recipients are listed unordered, unpaged, and without names.
pub async fn find_individual_audiences<'e, E>(
	executor: E,
	filter: &IndividualAudienceFilter,
) -> Result<Vec<Audience>>
where
	E: Executor<'e, Database = Postgres>,
{
	filter.validate()?;

	fetch_audiences(executor, &compiler::compile_individual(filter, &FetchOptions::default()))
		.await
}

pub async fn find_draft_audiences<'e, E>(
	executor: E,
	filter: &DraftAudienceFilter,
	options: &FetchOptions,
) -> Result<Vec<Audience>>
where
	E: Executor<'e, Database = Postgres>,
{
	filter.validate()?;

	fetch_audiences(executor, &compiler::compile_draft(filter, options)).await
}

pub async fn count_draft_audiences<'e, E>(executor: E, filter: &DraftAudienceFilter) -> Result<u32>
where
	E: Executor<'e, Database = Postgres>,
{
	filter.validate()?;

	count_audiences(executor, &compiler::compile_draft(filter, &FetchOptions::default())).await
}

/// Everyone a notification reaches when sent: group targets, then generic receivers, then
/// receiver students expanded by the target's user groups.
pub async fn find_send_audiences<'e, E>(
	executor: E,
	filter: &SendAudienceFilter,
	options: &FetchOptions,
) -> Result<Vec<Audience>>
where
	E: Executor<'e, Database = Postgres>,
{
	filter.validate()?;

	fetch_audiences(executor, &compiler::compile_send(filter, options)).await
}

pub async fn count_send_audiences<'e, E>(executor: E, filter: &SendAudienceFilter) -> Result<u32>
where
	E: Executor<'e, Database = Postgres>,
{
	filter.validate()?;

	count_audiences(executor, &compiler::compile_send(filter, &FetchOptions::default())).await
}

/// Runs the ordered, paged variant of a compiled query. An empty query returns no rows
/// without a round trip.
pub async fn fetch_audiences<'e, E>(
	executor: E,
	compiled: &CompiledAudienceQuery,
) -> Result<Vec<Audience>>
where
	E: Executor<'e, Database = Postgres>,
{
	let statement = compiled.fetch_statement();

	if statement.is_empty() {
		tracing::debug!("Audience query resolved to no audience.");

		return Ok(Vec::new());
	}

	tracing::debug!(
		args = statement.args.len(),
		projection = ?compiled.projection(),
		paging = ?compiled.paging(),
		"Fetching audiences."
	);

	let arguments = statement.args.to_pg_arguments()?;
	let rows = sqlx::query_with(&statement.sql, arguments)
		.fetch_all(executor)
		.await
		.map_err(|source| Error::Query { context: "Failed to fetch audiences", source })?;

	rows.iter().map(|row| scan_audience(row, compiled.projection())).collect()
}

/// Runs the unordered count variant of a compiled query.
pub async fn count_audiences<'e, E>(executor: E, compiled: &CompiledAudienceQuery) -> Result<u32>
where
	E: Executor<'e, Database = Postgres>,
{
	let statement = compiled.count_statement();

	if statement.is_empty() {
		return Ok(0);
	}

	tracing::debug!(args = statement.args.len(), "Counting audiences.");

	let arguments = statement.args.to_pg_arguments()?;
	let count = sqlx::query_scalar_with::<_, i64, _>(&statement.sql, arguments)
		.fetch_one(executor)
		.await
		.map_err(|source| Error::Query { context: "Failed to count audiences", source })?;

	u32::try_from(count)
		.map_err(|_| Error::Decode(format!("audience count {count} is out of range")))
}

/// Maps one row onto an `Audience`, positionally checked against the projection.
fn scan_audience(row: &PgRow, projection: Projection) -> Result<Audience> {
	let expected = projection.columns().len();

	if row.len() != expected {
		tracing::warn!(expected, actual = row.len(), "Audience row does not match the projection.");

		return Err(Error::ScanMismatch { expected, actual: row.len() });
	}

	let user_group: String = row.try_get("user_group")?;
	let user_group = user_group.parse::<UserGroup>().map_err(|err| Error::Decode(err.to_string()))?;
	let child_ids: Option<Vec<String>> = row.try_get("child_ids")?;
	let (name, email) = if projection.has_name() {
		(row.try_get("name")?, row.try_get("email")?)
	} else {
		(None, None)
	};

	Ok(Audience {
		user_id: row.try_get("user_id")?,
		student_id: row.try_get("student_id")?,
		parent_id: row.try_get("parent_id")?,
		grade_id: row.try_get("grade_id")?,
		child_ids: child_ids.unwrap_or_default(),
		user_group,
		is_individual: row.try_get("is_individual")?,
		name,
		email,
	})
}
