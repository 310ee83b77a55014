//! Expansion of related id sets back onto the owning kind.
//!
//! The search manager evaluates the nested tree of a relation or reference leaf with the full
//! pipeline first, including authorization. This module only maps the resulting ids across the
//! relationship table, foreign key or link table.

use std::sync::Arc;

use sift_domain::{Direction, EntityKind};
use sift_storage::SqlExecutor;

use crate::{
	Result,
	mapper::{ReferenceMapping, TableMapper},
	resolver::QueryResolver,
	set_algebra::IdSet,
	translator,
};

pub struct RelationResolver {
	ids: QueryResolver,
}
impl RelationResolver {
	pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
		Self { ids: QueryResolver::new(executor) }
	}

	/// Owners of `kind` with a parent (`Direction::Parent`) or child in `related`.
	pub async fn expand_relation(
		&self,
		kind: EntityKind,
		direction: Direction,
		related: &IdSet,
	) -> Result<IdSet> {
		let table = TableMapper::for_kind(kind).relationship_table()?;

		if related.is_empty() {
			return Ok(IdSet::new());
		}

		self.ids.fetch(&translator::relation_expansion(table, direction, related)).await
	}

	/// Owners of `kind` whose reference column or link points into `related`.
	pub async fn expand_reference(
		&self,
		kind: EntityKind,
		reference: ReferenceMapping,
		related: &IdSet,
	) -> Result<IdSet> {
		if related.is_empty() {
			return Ok(IdSet::new());
		}

		let mapper = TableMapper::for_kind(kind);

		self.ids.fetch(&translator::reference_expansion(mapper, reference.via, related)).await
	}
}
