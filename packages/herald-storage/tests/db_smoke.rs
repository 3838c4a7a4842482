use herald_config::Postgres;
use herald_storage::db::Db;
use herald_testkit::TestDatabase;

#[tokio::test]
#[ignore = "Requires external Postgres. Set HERALD_PG_DSN to run."]
async fn db_connects_and_bootstraps() {
	let Some(base_dsn) = herald_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps; set HERALD_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");
	// Bootstrapping twice must be a no-op.
	db.ensure_schema().await.expect("Failed to re-run schema bootstrap.");

	for table in ["students", "student_enrollment_status_history", "user_access_paths"] {
		let count: i64 = sqlx::query_scalar(
			"SELECT count(*) FROM information_schema.tables WHERE table_name = $1",
		)
		.bind(table)
		.fetch_one(&db.pool)
		.await
		.expect("Failed to query schema tables.");

		assert_eq!(count, 1, "Missing table {table}.");
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
