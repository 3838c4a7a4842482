use time::{Duration, OffsetDateTime};

use herald_config::Postgres;
use herald_domain::{
	DraftAudienceFilter, FetchOptions, GroupAudienceFilter, IndividualAudienceFilter,
	OrderByName, Paging, Selector, SendAudienceFilter, UserGroup,
};
use herald_storage::{audience, db::Db};
use herald_testkit::{
	TestDatabase,
	fixture::{self, ENROLLED},
};

async fn setup() -> Option<(TestDatabase, Db)> {
	let Some(base_dsn) = herald_testkit::env_dsn() else {
		eprintln!("Skipping audience Postgres test; set HERALD_PG_DSN to run it.");

		return None;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");
	seed(&db).await;

	Some((test_db, db))
}

/// Three enrolled students in L1 with two parents, plus rows each scenario must skip:
/// a student in L3, a student whose enrollment ended, and a deleted student.
async fn seed(db: &Db) {
	let pool = &db.pool;

	for (id, name) in [("S1", "Ann Lee"), ("S2", "Bob Kim"), ("S3", "Cid Ray")] {
		fixture::insert_student(pool, id, name, Some("G1")).await.expect("Failed to seed student.");
		fixture::insert_access_path(pool, id, "L1").await.expect("Failed to seed access path.");
		fixture::insert_current_enrollment(pool, id, "L1", ENROLLED)
			.await
			.expect("Failed to seed enrollment.");
		fixture::insert_course(pool, id, "C1", "L1").await.expect("Failed to seed course.");
	}

	fixture::insert_student(pool, "S4", "Dee Fox", Some("G2")).await.expect("Failed to seed S4.");
	fixture::insert_access_path(pool, "S4", "L3").await.expect("Failed to seed S4 path.");
	fixture::insert_current_enrollment(pool, "S4", "L3", ENROLLED)
		.await
		.expect("Failed to seed S4 enrollment.");
	fixture::insert_course(pool, "S4", "C1", "L3").await.expect("Failed to seed S4 course.");

	let now = OffsetDateTime::now_utc();

	fixture::insert_student(pool, "S5", "Eve Ash", Some("G1")).await.expect("Failed to seed S5.");
	fixture::insert_access_path(pool, "S5", "L1").await.expect("Failed to seed S5 path.");
	fixture::insert_enrollment(
		pool,
		"S5",
		"L1",
		ENROLLED,
		now - Duration::days(30),
		Some(now - Duration::days(2)),
	)
	.await
	.expect("Failed to seed S5 enrollment.");
	fixture::insert_course(pool, "S5", "C1", "L1").await.expect("Failed to seed S5 course.");

	fixture::insert_student(pool, "S6", "Fay Orr", Some("G1")).await.expect("Failed to seed S6.");
	fixture::insert_access_path(pool, "S6", "L1").await.expect("Failed to seed S6 path.");
	fixture::insert_current_enrollment(pool, "S6", "L1", ENROLLED)
		.await
		.expect("Failed to seed S6 enrollment.");
	fixture::soft_delete_user(pool, "S6").await.expect("Failed to delete S6.");

	fixture::insert_parent(pool, "P1", "Gus Lee", &["S1", "S2"]).await.expect("Failed to seed P1.");
	fixture::insert_parent(pool, "P2", "Hal Ray", &["S3"]).await.expect("Failed to seed P2.");
	fixture::insert_parent(pool, "P3", "Ivy Fox", &["S4"]).await.expect("Failed to seed P3.");
}

fn scenario_filter() -> GroupAudienceFilter {
	GroupAudienceFilter {
		location: Selector::list(["L1", "L2"]),
		course: Selector::All,
		user_groups: vec![UserGroup::Student, UserGroup::Parent],
		enrollment_status: Some(ENROLLED.to_string()),
		paging: Some(Paging::new(10, 0)),
		..Default::default()
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HERALD_PG_DSN to run."]
async fn group_scenario_returns_students_and_parents() {
	let Some((test_db, db)) = setup().await else {
		return;
	};
	let filter = scenario_filter();
	let rows = audience::find_group_audiences(&db.pool, &filter, &FetchOptions::default())
		.await
		.expect("Failed to fetch audiences.");
	let count =
		audience::count_group_audiences(&db.pool, &filter).await.expect("Failed to count.");

	assert_eq!(rows.len(), 5);
	assert_eq!(count, 5);

	let p1 = rows.iter().find(|row| row.user_id == "P1").expect("Expected parent P1.");

	assert_eq!(p1.user_group, UserGroup::Parent);
	assert_eq!(p1.child_ids, vec!["S1".to_string(), "S2".to_string()]);
	assert_eq!(p1.student_id, None);
	assert!(!p1.is_individual);

	let s1 = rows.iter().find(|row| row.user_id == "S1").expect("Expected student S1.");

	assert_eq!(s1.grade_id.as_deref(), Some("G1"));
	assert!(s1.child_ids.is_empty());
	assert_eq!(s1.name, None);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HERALD_PG_DSN to run."]
async fn paged_fetch_is_ordered_and_count_ignores_paging() {
	let Some((test_db, db)) = setup().await else {
		return;
	};
	let filter = GroupAudienceFilter { paging: Some(Paging::new(2, 1)), ..scenario_filter() };
	let options = FetchOptions { order_by_name: OrderByName::Ascending, include_name: true };
	let rows = audience::find_group_audiences(&db.pool, &filter, &options)
		.await
		.expect("Failed to fetch audiences.");
	let count =
		audience::count_group_audiences(&db.pool, &filter).await.expect("Failed to count.");
	let names = rows.iter().filter_map(|row| row.name.clone()).collect::<Vec<_>>();

	// Ascending names: Ann Lee, Bob Kim, Cid Ray, Gus Lee, Hal Ray.
	assert_eq!(names, vec!["Bob Kim".to_string(), "Cid Ray".to_string()]);
	assert_eq!(rows[0].email.as_deref(), Some("S2@example.com"));
	assert_eq!(count, 5);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HERALD_PG_DSN to run."]
async fn unpaged_fetch_matches_count() {
	let Some((test_db, db)) = setup().await else {
		return;
	};
	let filter = GroupAudienceFilter {
		location: Selector::Unconstrained,
		course: Selector::list(["C1"]),
		paging: None,
		..scenario_filter()
	};
	let rows = audience::find_group_audiences(&db.pool, &filter, &FetchOptions::default())
		.await
		.expect("Failed to fetch audiences.");
	let count =
		audience::count_group_audiences(&db.pool, &filter).await.expect("Failed to count.");

	// S1-S4 and P1-P3; S5's enrollment ended and S6 is deleted.
	assert_eq!(rows.len(), 7);
	assert_eq!(count, 7);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HERALD_PG_DSN to run."]
async fn keyword_matches_origin_name_or_email() {
	let Some((test_db, db)) = setup().await else {
		return;
	};
	let filter = GroupAudienceFilter { keyword: Some("lee".to_string()), ..scenario_filter() };
	let rows = audience::find_group_audiences(&db.pool, &filter, &FetchOptions::default())
		.await
		.expect("Failed to fetch audiences.");
	let mut ids = rows.iter().map(|row| row.user_id.as_str()).collect::<Vec<_>>();

	ids.sort_unstable();

	assert_eq!(ids, vec!["P1", "S1"]);
	assert!(rows.iter().all(|row| row.name.is_some()));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HERALD_PG_DSN to run."]
async fn empty_id_list_matches_nobody() {
	let Some((test_db, db)) = setup().await else {
		return;
	};
	let filter = GroupAudienceFilter { location: Selector::List(Vec::new()), ..scenario_filter() };
	let rows = audience::find_group_audiences(&db.pool, &filter, &FetchOptions::default())
		.await
		.expect("Failed to fetch audiences.");
	let count =
		audience::count_group_audiences(&db.pool, &filter).await.expect("Failed to count.");

	assert!(rows.is_empty());
	assert_eq!(count, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HERALD_PG_DSN to run."]
async fn draft_reports_group_recipients_once() {
	let Some((test_db, db)) = setup().await else {
		return;
	};
	let draft = DraftAudienceFilter {
		group: Some(GroupAudienceFilter {
			user_groups: vec![UserGroup::Student],
			paging: None,
			..scenario_filter()
		}),
		individual: Some(IndividualAudienceFilter::new(["S1", "S4"])),
		paging: Some(Paging::new(10, 0)),
	};
	let options = FetchOptions { order_by_name: OrderByName::Ascending, include_name: false };
	let rows = audience::find_draft_audiences(&db.pool, &draft, &options)
		.await
		.expect("Failed to fetch draft audiences.");
	let count =
		audience::count_draft_audiences(&db.pool, &draft).await.expect("Failed to count.");
	let s1 = rows.iter().filter(|row| row.user_id == "S1").collect::<Vec<_>>();
	let s4 = rows.iter().find(|row| row.user_id == "S4").expect("Expected individual S4.");

	assert_eq!(rows.len(), 4);
	assert_eq!(count, 4);
	assert_eq!(s1.len(), 1);
	assert!(!s1[0].is_individual);
	assert!(s4.is_individual);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HERALD_PG_DSN to run."]
async fn individual_targets_resolve_both_user_groups() {
	let Some((test_db, db)) = setup().await else {
		return;
	};
	let filter = IndividualAudienceFilter::new(["S2", "P3", "S6"]);
	let rows = audience::find_individual_audiences(&db.pool, &filter)
		.await
		.expect("Failed to fetch individual audiences.");
	let mut ids = rows.iter().map(|row| row.user_id.as_str()).collect::<Vec<_>>();

	ids.sort_unstable();

	assert_eq!(ids, vec!["P3", "S2"]);
	assert!(rows.iter().all(|row| row.is_individual));

	let p3 = rows.iter().find(|row| row.user_id == "P3").expect("Expected parent P3.");

	assert_eq!(p3.child_ids, vec!["S4".to_string()]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HERALD_PG_DSN to run."]
async fn keyword_wildcards_match_literally() {
	let Some((test_db, db)) = setup().await else {
		return;
	};

	for keyword in ["%", "_"] {
		let filter =
			GroupAudienceFilter { keyword: Some(keyword.to_string()), ..scenario_filter() };
		let count =
			audience::count_group_audiences(&db.pool, &filter).await.expect("Failed to count.");

		assert_eq!(count, 0, "Keyword {keyword:?} must not act as a wildcard.");
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HERALD_PG_DSN to run."]
async fn receiver_students_reach_their_parents_once() {
	let Some((test_db, db)) = setup().await else {
		return;
	};
	let filter = SendAudienceFilter {
		target: GroupAudienceFilter {
			location: Selector::None,
			course: Selector::None,
			class: Selector::None,
			grade: Selector::None,
			school: Selector::None,
			user_groups: vec![UserGroup::Parent],
			..Default::default()
		},
		receiver_ids: vec!["S1".to_string(), "S2".to_string()],
		..Default::default()
	};
	let rows = audience::find_send_audiences(&db.pool, &filter, &FetchOptions::default())
		.await
		.expect("Failed to fetch send audiences.");
	let count = audience::count_send_audiences(&db.pool, &filter).await.expect("Failed to count.");

	assert_eq!(rows.len(), 1);
	assert_eq!(count, 1);
	assert_eq!(rows[0].user_id, "P1");
	assert_eq!(rows[0].user_group, UserGroup::Parent);
	assert_eq!(rows[0].child_ids, vec!["S1".to_string(), "S2".to_string()]);
	assert!(rows[0].is_individual);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HERALD_PG_DSN to run."]
async fn send_reports_each_recipient_once_by_layer() {
	let Some((test_db, db)) = setup().await else {
		return;
	};
	let filter = SendAudienceFilter {
		target: GroupAudienceFilter { paging: None, ..scenario_filter() },
		generic_receiver_ids: vec!["S1".to_string(), "P3".to_string()],
		receiver_ids: vec!["S4".to_string()],
		..Default::default()
	};
	let rows = audience::find_send_audiences(&db.pool, &filter, &FetchOptions::default())
		.await
		.expect("Failed to fetch send audiences.");
	let count = audience::count_send_audiences(&db.pool, &filter).await.expect("Failed to count.");
	let mut ids = rows.iter().map(|row| row.user_id.as_str()).collect::<Vec<_>>();

	ids.sort_unstable();

	// The group reaches S1-S3, P1 and P2; P3 is a generic receiver and S4 a receiver student.
	assert_eq!(ids, vec!["P1", "P2", "P3", "S1", "S2", "S3", "S4"]);
	assert_eq!(count, 7);

	let s1 = rows.iter().find(|row| row.user_id == "S1").expect("Expected group student S1.");
	let p3 = rows.iter().find(|row| row.user_id == "P3").expect("Expected generic parent P3.");
	let s4 = rows.iter().find(|row| row.user_id == "S4").expect("Expected receiver S4.");

	assert!(!s1.is_individual);
	assert!(p3.is_individual);
	assert_eq!(p3.child_ids, vec!["S4".to_string()]);
	assert!(s4.is_individual);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
