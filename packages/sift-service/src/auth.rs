//! Row-level authorization.
//!
//! A user either holds an instance-wide role or is scoped to a set of spaces and projects. The
//! filter keeps only candidates reachable from that scope and never widens the input set. Tags are
//! private: only their owner sees them, whatever the owner's roles.

use std::{
	collections::{BTreeSet, HashSet},
	sync::Arc,
};

use sift_domain::EntityKind;
use sift_storage::{BoxFuture, SqlArg, SqlExecutor, SqlValue, executor};

use crate::{Error, Result, set_algebra::IdSet, translator};

const LOAD_ROLE_ASSIGNMENTS: &str = "\
SELECT role, space_id, project_id
FROM role_assignments
WHERE person_id = $1";
const OWNED_TAGS: &str = "SELECT id FROM metaprojects WHERE id = ANY($1) AND owner_id = $2";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorisationInformation {
	/// Unset when the user could not be identified; such a user owns no tags.
	pub person_id: Option<i64>,
	pub instance_roles: BTreeSet<String>,
	pub authorized_space_ids: HashSet<i64>,
	pub authorized_project_ids: HashSet<i64>,
}
impl AuthorisationInformation {
	pub fn has_instance_role(&self) -> bool {
		!self.instance_roles.is_empty()
	}

	pub fn has_scope(&self) -> bool {
		!self.authorized_space_ids.is_empty() || !self.authorized_project_ids.is_empty()
	}
}

pub trait AuthorisationProvider
where
	Self: Send + Sync,
{
	fn authorisation<'a>(
		&'a self,
		user_id: i64,
	) -> BoxFuture<'a, Result<AuthorisationInformation>>;
}

/// Reads role assignments; a row without space and project is an instance-wide role.
pub struct SqlAuthorisationProvider {
	executor: Arc<dyn SqlExecutor>,
}
impl SqlAuthorisationProvider {
	pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
		Self { executor }
	}

	async fn load(&self, user_id: i64) -> Result<AuthorisationInformation> {
		let rows = self.executor.execute(LOAD_ROLE_ASSIGNMENTS, &[SqlArg::BigInt(user_id)]).await?;
		let mut info =
			AuthorisationInformation { person_id: Some(user_id), ..Default::default() };

		for row in rows {
			match row.as_slice() {
				[SqlValue::Text(role), SqlValue::Null, SqlValue::Null] => {
					info.instance_roles.insert(role.clone());
				},
				[SqlValue::Text(_), SqlValue::Int(space_id), SqlValue::Null] => {
					info.authorized_space_ids.insert(*space_id);
				},
				[SqlValue::Text(_), SqlValue::Null, SqlValue::Int(project_id)] => {
					info.authorized_project_ids.insert(*project_id);
				},
				_ =>
					return Err(Error::Storage {
						message: "Unexpected role_assignments row shape.".to_string(),
					}),
			}
		}

		Ok(info)
	}
}

impl AuthorisationProvider for SqlAuthorisationProvider {
	fn authorisation<'a>(
		&'a self,
		user_id: i64,
	) -> BoxFuture<'a, Result<AuthorisationInformation>> {
		Box::pin(self.load(user_id))
	}
}

/// Keeps the candidates `auth` may read, using at most one query.
pub async fn filter_by_user_rights(
	executor: &dyn SqlExecutor,
	auth: &AuthorisationInformation,
	kind: EntityKind,
	candidates: IdSet,
) -> Result<IdSet> {
	if candidates.is_empty() {
		return Ok(candidates);
	}
	if kind == EntityKind::Tag {
		return filter_owned_tags(executor, auth, candidates).await;
	}
	if auth.has_instance_role() || kind.is_type() {
		return Ok(candidates);
	}
	if !auth.has_scope() {
		return Ok(IdSet::new());
	}

	let Some(sql) = scope_query(kind) else {
		return Ok(candidates);
	};
	let args = [
		SqlArg::BigIntArray(translator::sorted(&candidates)),
		SqlArg::BigIntArray(translator::sorted(&auth.authorized_space_ids)),
		SqlArg::BigIntArray(translator::sorted(&auth.authorized_project_ids)),
	];
	let visible = executor::fetch_ids(executor, sql, &args).await?;

	// Never widen the candidate set.
	Ok(visible.into_iter().filter(|id| candidates.contains(id)).collect())
}

async fn filter_owned_tags(
	executor: &dyn SqlExecutor,
	auth: &AuthorisationInformation,
	candidates: IdSet,
) -> Result<IdSet> {
	let Some(person_id) = auth.person_id else {
		return Ok(IdSet::new());
	};
	let args =
		[SqlArg::BigIntArray(translator::sorted(&candidates)), SqlArg::BigInt(person_id)];
	let owned = executor::fetch_ids(executor, OWNED_TAGS, &args).await?;

	Ok(owned.into_iter().filter(|id| candidates.contains(id)).collect())
}

/// `$1` candidates, `$2` authorized spaces, `$3` authorized projects.
fn scope_query(kind: EntityKind) -> Option<&'static str> {
	match kind {
		EntityKind::Sample => Some(
			"\
SELECT s.id
FROM samples s
LEFT JOIN projects p ON p.id = s.proj_id
LEFT JOIN experiments e ON e.id = s.expe_id
LEFT JOIN projects ep ON ep.id = e.proj_id
WHERE s.id = ANY($1)
	AND (
		s.space_id = ANY($2)
		OR p.space_id = ANY($2)
		OR ep.space_id = ANY($2)
		OR s.proj_id = ANY($3)
		OR e.proj_id = ANY($3)
	)",
		),
		EntityKind::Experiment => Some(
			"\
SELECT e.id
FROM experiments e
JOIN projects p ON p.id = e.proj_id
WHERE e.id = ANY($1)
	AND (p.space_id = ANY($2) OR e.proj_id = ANY($3))",
		),
		// A data set is reachable through its experiment or through its sample's own scope.
		EntityKind::DataSet => Some(
			"\
SELECT d.id
FROM data_sets d
LEFT JOIN experiments e ON e.id = d.expe_id
LEFT JOIN projects ep ON ep.id = e.proj_id
LEFT JOIN samples s ON s.id = d.samp_id
LEFT JOIN projects sp ON sp.id = s.proj_id
LEFT JOIN experiments se ON se.id = s.expe_id
LEFT JOIN projects sep ON sep.id = se.proj_id
WHERE d.id = ANY($1)
	AND (
		ep.space_id = ANY($2)
		OR e.proj_id = ANY($3)
		OR s.space_id = ANY($2)
		OR sp.space_id = ANY($2)
		OR s.proj_id = ANY($3)
		OR sep.space_id = ANY($2)
		OR se.proj_id = ANY($3)
	)",
		),
		EntityKind::Project => Some(
			"\
SELECT id
FROM projects
WHERE id = ANY($1)
	AND (space_id = ANY($2) OR id = ANY($3))",
		),
		EntityKind::Space => Some(
			"\
SELECT id
FROM spaces
WHERE id = ANY($1)
	AND (id = ANY($2) OR id IN (SELECT space_id FROM projects WHERE id = ANY($3)))",
		),
		EntityKind::SampleType
		| EntityKind::ExperimentType
		| EntityKind::DataSetType
		| EntityKind::Tag => None,
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use sift_domain::EntityKind;
	use sift_storage::{SqlArg, SqlValue};

	use crate::{
		auth::{
			AuthorisationInformation, AuthorisationProvider, SqlAuthorisationProvider,
			filter_by_user_rights,
		},
		set_algebra::IdSet,
		test_support::ScriptedExecutor,
	};

	fn scoped(spaces: &[i64], projects: &[i64]) -> AuthorisationInformation {
		AuthorisationInformation {
			authorized_space_ids: spaces.iter().copied().collect(),
			authorized_project_ids: projects.iter().copied().collect(),
			..Default::default()
		}
	}

	#[tokio::test]
	async fn instance_role_passes_candidates_without_a_query() {
		let executor = ScriptedExecutor::new();
		let auth = AuthorisationInformation {
			instance_roles: ["ADMIN".to_string()].into(),
			..Default::default()
		};
		let filtered =
			filter_by_user_rights(executor.as_ref(), &auth, EntityKind::Sample, IdSet::from([1, 2]))
				.await
				.expect("filter succeeds");

		assert_eq!(filtered, IdSet::from([1, 2]));
		assert!(executor.calls().is_empty());
	}

	#[tokio::test]
	async fn type_kinds_are_unscoped() {
		let executor = ScriptedExecutor::new();
		let filtered = filter_by_user_rights(
			executor.as_ref(),
			&AuthorisationInformation::default(),
			EntityKind::SampleType,
			IdSet::from([4]),
		)
		.await
		.expect("filter succeeds");

		assert_eq!(filtered, IdSet::from([4]));
		assert!(executor.calls().is_empty());
	}

	#[tokio::test]
	async fn empty_scope_denies_without_a_query() {
		let executor = ScriptedExecutor::new();
		let filtered = filter_by_user_rights(
			executor.as_ref(),
			&AuthorisationInformation::default(),
			EntityKind::Experiment,
			IdSet::from([1, 2, 3]),
		)
		.await
		.expect("filter succeeds");

		assert!(filtered.is_empty());
		assert!(executor.calls().is_empty());
	}

	#[tokio::test]
	async fn scoped_users_get_one_batched_query() {
		let executor = ScriptedExecutor::new();

		executor.push_ids(&[2, 3]);

		let filtered = filter_by_user_rights(
			executor.as_ref(),
			&scoped(&[10], &[20]),
			EntityKind::Sample,
			IdSet::from([1, 2, 3]),
		)
		.await
		.expect("filter succeeds");
		let calls = executor.calls();

		assert_eq!(filtered, IdSet::from([2, 3]));
		assert_eq!(calls.len(), 1);
		assert_eq!(
			calls[0].1,
			vec![
				SqlArg::BigIntArray(vec![1, 2, 3]),
				SqlArg::BigIntArray(vec![10]),
				SqlArg::BigIntArray(vec![20]),
			]
		);
	}

	#[tokio::test]
	async fn filter_never_widens_the_candidates() {
		let executor = ScriptedExecutor::new();

		executor.push_ids(&[2, 99]);

		let filtered = filter_by_user_rights(
			executor.as_ref(),
			&scoped(&[10], &[]),
			EntityKind::Project,
			IdSet::from([1, 2]),
		)
		.await
		.expect("filter succeeds");

		assert_eq!(filtered, IdSet::from([2]));
	}

	#[tokio::test]
	async fn tags_are_visible_to_their_owner_only() {
		let executor = ScriptedExecutor::new();

		executor.push_ids(&[8]);

		let owner = AuthorisationInformation {
			person_id: Some(5),
			instance_roles: ["ADMIN".to_string()].into(),
			..Default::default()
		};
		let filtered =
			filter_by_user_rights(executor.as_ref(), &owner, EntityKind::Tag, IdSet::from([7, 8]))
				.await
				.expect("filter succeeds");

		assert_eq!(filtered, IdSet::from([8]));
		assert_eq!(
			executor.calls(),
			vec![(
				"SELECT id FROM metaprojects WHERE id = ANY($1) AND owner_id = $2".to_string(),
				vec![SqlArg::BigIntArray(vec![7, 8]), SqlArg::BigInt(5)],
			)]
		);

		let anonymous = filter_by_user_rights(
			executor.as_ref(),
			&AuthorisationInformation::default(),
			EntityKind::Tag,
			IdSet::from([7, 8]),
		)
		.await
		.expect("filter succeeds");

		assert!(anonymous.is_empty());
		assert_eq!(executor.calls().len(), 1);
	}

	#[tokio::test]
	async fn role_assignments_split_into_instance_space_and_project_scope() {
		let executor = ScriptedExecutor::new();

		executor.push_rows(vec![
			vec![SqlValue::Text("OBSERVER".to_string()), SqlValue::Int(1), SqlValue::Null],
			vec![SqlValue::Text("USER".to_string()), SqlValue::Null, SqlValue::Int(7)],
		]);

		let provider = SqlAuthorisationProvider::new(executor.clone());
		let info = provider.authorisation(42).await.expect("roles load");

		assert_eq!(info.person_id, Some(42));
		assert!(!info.has_instance_role());
		assert_eq!(info.authorized_space_ids, HashSet::from([1]));
		assert_eq!(info.authorized_project_ids, HashSet::from([7]));
		assert_eq!(executor.calls()[0].1, vec![SqlArg::BigInt(42)]);
	}
}
