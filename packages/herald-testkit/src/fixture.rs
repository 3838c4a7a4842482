//! Row builders for the audience tables, used by Postgres-backed tests.

use sqlx::PgPool;
use time::{Duration, OffsetDateTime};

use crate::Result;

pub const STUDENT: &str = "USER_GROUP_STUDENT";
pub const PARENT: &str = "USER_GROUP_PARENT";
pub const ENROLLED: &str = "STUDENT_ENROLLMENT_STATUS_ENROLLED";

pub async fn insert_user(
	pool: &PgPool,
	user_id: &str,
	name: &str,
	email: Option<&str>,
	user_group: &str,
) -> Result<()> {
	sqlx::query("INSERT INTO users (user_id, name, email, user_group) VALUES ($1, $2, $3, $4)")
		.bind(user_id)
		.bind(name)
		.bind(email)
		.bind(user_group)
		.execute(pool)
		.await?;

	Ok(())
}

pub async fn insert_student(
	pool: &PgPool,
	student_id: &str,
	name: &str,
	grade_id: Option<&str>,
) -> Result<()> {
	let email = format!("{student_id}@example.com");

	insert_user(pool, student_id, name, Some(email.as_str()), STUDENT).await?;

	sqlx::query("INSERT INTO students (student_id, grade_id) VALUES ($1, $2)")
		.bind(student_id)
		.bind(grade_id)
		.execute(pool)
		.await?;

	Ok(())
}

/// Inserts a parent and links it to each child.
pub async fn insert_parent(
	pool: &PgPool,
	parent_id: &str,
	name: &str,
	child_ids: &[&str],
) -> Result<()> {
	let email = format!("{parent_id}@example.com");

	insert_user(pool, parent_id, name, Some(email.as_str()), PARENT).await?;

	sqlx::query("INSERT INTO parents (parent_id) VALUES ($1)").bind(parent_id).execute(pool).await?;

	for child_id in child_ids {
		sqlx::query("INSERT INTO student_parents (student_id, parent_id) VALUES ($1, $2)")
			.bind(child_id)
			.bind(parent_id)
			.execute(pool)
			.await?;
	}

	Ok(())
}

pub async fn insert_access_path(pool: &PgPool, user_id: &str, location_id: &str) -> Result<()> {
	sqlx::query("INSERT INTO user_access_paths (user_id, location_id) VALUES ($1, $2)")
		.bind(user_id)
		.bind(location_id)
		.execute(pool)
		.await?;

	Ok(())
}

/// Inserts an enrollment row that started yesterday and is still open.
pub async fn insert_current_enrollment(
	pool: &PgPool,
	student_id: &str,
	location_id: &str,
	status: &str,
) -> Result<()> {
	let start = OffsetDateTime::now_utc() - Duration::days(1);

	insert_enrollment(pool, student_id, location_id, status, start, None).await
}

pub async fn insert_enrollment(
	pool: &PgPool,
	student_id: &str,
	location_id: &str,
	status: &str,
	start_date: OffsetDateTime,
	end_date: Option<OffsetDateTime>,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO student_enrollment_status_history (
	student_id,
	location_id,
	enrollment_status,
	start_date,
	end_date
)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(student_id)
	.bind(location_id)
	.bind(status)
	.bind(start_date)
	.bind(end_date)
	.execute(pool)
	.await?;

	Ok(())
}

pub async fn insert_course(
	pool: &PgPool,
	student_id: &str,
	course_id: &str,
	location_id: &str,
) -> Result<()> {
	sqlx::query(
		"INSERT INTO student_course (student_id, course_id, location_id) VALUES ($1, $2, $3)",
	)
	.bind(student_id)
	.bind(course_id)
	.bind(location_id)
	.execute(pool)
	.await?;

	Ok(())
}

pub async fn insert_class_member(pool: &PgPool, class_id: &str, user_id: &str) -> Result<()> {
	sqlx::query("INSERT INTO class_member (class_member_id, class_id, user_id) VALUES ($1, $2, $3)")
		.bind(format!("{class_id}:{user_id}"))
		.bind(class_id)
		.bind(user_id)
		.execute(pool)
		.await?;

	Ok(())
}

pub async fn insert_school(
	pool: &PgPool,
	student_id: &str,
	school_id: &str,
	is_current: bool,
) -> Result<()> {
	sqlx::query("INSERT INTO school_history (student_id, school_id, is_current) VALUES ($1, $2, $3)")
		.bind(student_id)
		.bind(school_id)
		.bind(is_current)
		.execute(pool)
		.await?;

	Ok(())
}

/// Marks a user and its student or parent row as deleted.
pub async fn soft_delete_user(pool: &PgPool, user_id: &str) -> Result<()> {
	for sql in [
		"UPDATE users SET deleted_at = now() WHERE user_id = $1",
		"UPDATE students SET deleted_at = now() WHERE student_id = $1",
		"UPDATE parents SET deleted_at = now() WHERE parent_id = $1",
	] {
		sqlx::query(sql).bind(user_id).execute(pool).await?;
	}

	Ok(())
}
