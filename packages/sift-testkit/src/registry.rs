//! Fixture writer for the registry schema.
//!
//! Every insert returns the new row id. Perm ids are derived from codes, so codes must be unique
//! per table within one database.

use sqlx::PgPool;
use time::OffsetDateTime;

use crate::Result;

/// Entity a tag is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagTarget {
	Sample(i64),
	Experiment(i64),
	DataSet(i64),
}

#[derive(Debug, Clone)]
pub struct Registry {
	pool: PgPool,
}
impl Registry {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	pub async fn space(&self, code: &str) -> Result<i64> {
		self.insert_code("INSERT INTO spaces (code) VALUES ($1) RETURNING id", code).await
	}

	pub async fn project(&self, space_id: i64, code: &str) -> Result<i64> {
		let id = sqlx::query_scalar(
			"INSERT INTO projects (code, perm_id, space_id) VALUES ($1, $2, $3) RETURNING id",
		)
		.bind(code)
		.bind(perm_id(code))
		.bind(space_id)
		.fetch_one(&self.pool)
		.await?;

		Ok(id)
	}

	pub async fn sample_type(&self, code: &str) -> Result<i64> {
		self.insert_code("INSERT INTO sample_types (code) VALUES ($1) RETURNING id", code).await
	}

	pub async fn experiment_type(&self, code: &str) -> Result<i64> {
		self.insert_code("INSERT INTO experiment_types (code) VALUES ($1) RETURNING id", code).await
	}

	pub async fn data_set_type(&self, code: &str) -> Result<i64> {
		self.insert_code("INSERT INTO data_set_types (code) VALUES ($1) RETURNING id", code).await
	}

	pub async fn experiment(&self, code: &str, type_id: i64, project_id: i64) -> Result<i64> {
		let id = sqlx::query_scalar(
			"\
INSERT INTO experiments (code, perm_id, exty_id, proj_id)
VALUES ($1, $2, $3, $4)
RETURNING id",
		)
		.bind(code)
		.bind(perm_id(code))
		.bind(type_id)
		.bind(project_id)
		.fetch_one(&self.pool)
		.await?;

		Ok(id)
	}

	/// Starts a sample with no space, project or experiment.
	pub fn sample<'a>(&'a self, code: &'a str, type_id: i64) -> SampleDraft<'a> {
		SampleDraft {
			registry: self,
			code,
			type_id,
			space_id: None,
			project_id: None,
			experiment_id: None,
			registered: None,
		}
	}

	pub async fn data_set(
		&self,
		code: &str,
		type_id: i64,
		experiment_id: Option<i64>,
		sample_id: Option<i64>,
	) -> Result<i64> {
		let id = sqlx::query_scalar(
			"\
INSERT INTO data_sets (code, perm_id, dsty_id, expe_id, samp_id)
VALUES ($1, $2, $3, $4, $5)
RETURNING id",
		)
		.bind(code)
		.bind(perm_id(code))
		.bind(type_id)
		.bind(experiment_id)
		.bind(sample_id)
		.fetch_one(&self.pool)
		.await?;

		Ok(id)
	}

	pub async fn sample_parent(&self, parent_id: i64, child_id: i64) -> Result<()> {
		sqlx::query("INSERT INTO sample_relationships (parent_id, child_id) VALUES ($1, $2)")
			.bind(parent_id)
			.bind(child_id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	pub async fn property_type(&self, code: &str, data_type: &str) -> Result<i64> {
		let id = sqlx::query_scalar(
			"INSERT INTO property_types (code, data_type) VALUES ($1, $2) RETURNING id",
		)
		.bind(code)
		.bind(data_type)
		.fetch_one(&self.pool)
		.await?;

		Ok(id)
	}

	pub async fn sample_property(&self, sample_id: i64, type_id: i64, value: &str) -> Result<()> {
		sqlx::query("INSERT INTO sample_properties (samp_id, prty_id, value) VALUES ($1, $2, $3)")
			.bind(sample_id)
			.bind(type_id)
			.bind(value)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	pub async fn tag(&self, owner_id: i64, code: &str) -> Result<i64> {
		let id = sqlx::query_scalar(
			"INSERT INTO metaprojects (code, owner_id) VALUES ($1, $2) RETURNING id",
		)
		.bind(code)
		.bind(owner_id)
		.fetch_one(&self.pool)
		.await?;

		Ok(id)
	}

	pub async fn attach_tag(&self, tag_id: i64, target: TagTarget) -> Result<()> {
		let (sample_id, experiment_id, data_set_id) = match target {
			TagTarget::Sample(id) => (Some(id), None, None),
			TagTarget::Experiment(id) => (None, Some(id), None),
			TagTarget::DataSet(id) => (None, None, Some(id)),
		};

		sqlx::query(
			"\
INSERT INTO metaproject_assignments (mepr_id, samp_id, expe_id, data_id)
VALUES ($1, $2, $3, $4)",
		)
		.bind(tag_id)
		.bind(sample_id)
		.bind(experiment_id)
		.bind(data_set_id)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	pub async fn grant_instance(&self, person_id: i64, role: &str) -> Result<()> {
		self.grant(person_id, role, None, None).await
	}

	pub async fn grant_space(&self, person_id: i64, space_id: i64) -> Result<()> {
		self.grant(person_id, "USER", Some(space_id), None).await
	}

	pub async fn grant_project(&self, person_id: i64, project_id: i64) -> Result<()> {
		self.grant(person_id, "USER", None, Some(project_id)).await
	}

	async fn grant(
		&self,
		person_id: i64,
		role: &str,
		space_id: Option<i64>,
		project_id: Option<i64>,
	) -> Result<()> {
		sqlx::query(
			"\
INSERT INTO role_assignments (person_id, role, space_id, project_id)
VALUES ($1, $2, $3, $4)",
		)
		.bind(person_id)
		.bind(role)
		.bind(space_id)
		.bind(project_id)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	async fn insert_code(&self, sql: &str, code: &str) -> Result<i64> {
		Ok(sqlx::query_scalar(sql).bind(code).fetch_one(&self.pool).await?)
	}
}

/// A sample row waiting for [`SampleDraft::insert`].
#[must_use]
pub struct SampleDraft<'a> {
	registry: &'a Registry,
	code: &'a str,
	type_id: i64,
	space_id: Option<i64>,
	project_id: Option<i64>,
	experiment_id: Option<i64>,
	registered: Option<OffsetDateTime>,
}
impl SampleDraft<'_> {
	pub fn in_space(mut self, space_id: i64) -> Self {
		self.space_id = Some(space_id);

		self
	}

	pub fn in_project(mut self, project_id: i64) -> Self {
		self.project_id = Some(project_id);

		self
	}

	pub fn in_experiment(mut self, experiment_id: i64) -> Self {
		self.experiment_id = Some(experiment_id);

		self
	}

	pub fn registered_at(mut self, at: OffsetDateTime) -> Self {
		self.registered = Some(at);

		self
	}

	pub async fn insert(self) -> Result<i64> {
		let id = sqlx::query_scalar(
			"\
INSERT INTO samples (code, perm_id, saty_id, space_id, proj_id, expe_id, registration_timestamp)
VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, now()))
RETURNING id",
		)
		.bind(self.code)
		.bind(perm_id(self.code))
		.bind(self.type_id)
		.bind(self.space_id)
		.bind(self.project_id)
		.bind(self.experiment_id)
		.bind(self.registered)
		.fetch_one(&self.registry.pool)
		.await?;

		Ok(id)
	}
}

fn perm_id(code: &str) -> String {
	format!("20190601-{code}")
}
