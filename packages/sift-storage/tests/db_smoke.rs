use sift_config::Postgres;
use sift_storage::{PgExecutor, SqlArg, SqlExecutor, SqlValue, db::Db};
use sift_testkit::TestDatabase;

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn db_connects_and_bootstraps() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");
	// Bootstrapping twice must be a no-op.
	db.ensure_schema().await.expect("Failed to re-run schema bootstrap.");

	for table in [
		"samples",
		"sample_relationships",
		"data_set_relationships",
		"role_assignments",
		"metaproject_assignments",
	] {
		let count: i64 = sqlx::query_scalar(
			"SELECT count(*) FROM information_schema.tables WHERE table_name = $1",
		)
		.bind(table)
		.fetch_one(&db.pool)
		.await
		.expect("Failed to query schema tables.");

		assert_eq!(count, 1, "missing table {table}");
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn executor_binds_arguments_and_decodes_rows() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!(
			"Skipping executor_binds_arguments_and_decodes_rows; set SIFT_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");
	let executor = PgExecutor::new(db.pool.clone());
	let rows = executor
		.execute(
			"SELECT $1::bigint, $2::text, NULL::text, $3::bool, cardinality($4::bigint[])",
			&[
				SqlArg::BigInt(42),
				SqlArg::Text("S1".to_string()),
				SqlArg::Bool(true),
				SqlArg::BigIntArray(vec![1, 2, 3]),
			],
		)
		.await
		.expect("Failed to execute query.");

	assert_eq!(
		rows,
		vec![vec![
			SqlValue::Int(42),
			SqlValue::Text("S1".to_string()),
			SqlValue::Null,
			SqlValue::Bool(true),
			SqlValue::Int(3),
		]]
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
