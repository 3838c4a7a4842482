pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_users.sql" => out.push_str(include_str!("../../../sql/tables/001_users.sql")),
				"tables/002_students.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_students.sql")),
				"tables/003_parents.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_parents.sql")),
				"tables/004_student_parents.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_student_parents.sql")),
				"tables/005_user_access_paths.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_user_access_paths.sql")),
				"tables/006_student_enrollment_status_history.sql" => out.push_str(include_str!(
					"../../../sql/tables/006_student_enrollment_status_history.sql"
				)),
				"tables/007_student_course.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_student_course.sql")),
				"tables/008_class_member.sql" =>
					out.push_str(include_str!("../../../sql/tables/008_class_member.sql")),
				"tables/009_school_history.sql" =>
					out.push_str(include_str!("../../../sql/tables/009_school_history.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	#[test]
	fn includes_are_expanded() {
		let sql = super::render_schema();

		assert!(!sql.contains("\\ir "));

		for table in [
			"users",
			"students",
			"parents",
			"student_parents",
			"user_access_paths",
			"student_enrollment_status_history",
			"student_course",
			"class_member",
			"school_history",
		] {
			assert!(
				sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
				"Missing table {table}."
			);
		}
	}
}
