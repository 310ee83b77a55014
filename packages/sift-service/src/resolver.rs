//! Non-recursive leaves: one predicate per column, one query per predicate.

use std::sync::Arc;

use sift_domain::{AbsenceLeaf, AttributeLeaf, EntityKind, PropertyLeaf, PropertyTarget};
use sift_storage::{SqlExecutor, executor};

use crate::{
	Result,
	mapper::TableMapper,
	properties::PropertyDictionary,
	set_algebra::{self, IdSet},
	translator::{self, SelectQuery},
};

#[derive(Debug, Clone, Copy)]
pub enum Leaf<'a> {
	Attribute(&'a AttributeLeaf),
	Property(&'a PropertyLeaf),
	Absence(&'a AbsenceLeaf),
}

pub struct QueryResolver {
	executor: Arc<dyn SqlExecutor>,
}
impl QueryResolver {
	pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
		Self { executor }
	}

	pub async fn all_ids(&self, kind: EntityKind) -> Result<IdSet> {
		self.fetch(&translator::all_ids(TableMapper::for_kind(kind))).await
	}

	/// Resolves a leaf to the unauthorized ids of `kind` it matches.
	///
	/// Every query is built before the first one runs, so a malformed leaf never reaches the
	/// store. `properties` caches the property dictionary across the leaves of one search.
	pub async fn resolve(
		&self,
		properties: &mut Option<PropertyDictionary>,
		kind: EntityKind,
		leaf: Leaf<'_>,
	) -> Result<IdSet> {
		let mapper = TableMapper::for_kind(kind);
		let queries = match leaf {
			Leaf::Attribute(leaf) => translator::attribute(mapper, leaf)?,
			Leaf::Absence(leaf) => vec![translator::absence(mapper, leaf.field)?],
			Leaf::Property(leaf) => {
				mapper.property_mapping()?;

				let dictionary = self.dictionary(properties).await?;
				let value_type = leaf.value().value_type();

				match leaf.target() {
					PropertyTarget::Code(code) => vec![translator::property(
						mapper,
						dictionary.compatible(code, value_type)?,
						leaf.match_kind(),
						leaf.value(),
					)?],
					PropertyTarget::Any => dictionary
						.all_compatible(value_type)
						.into_iter()
						.map(|property| {
							translator::property(mapper, property, leaf.match_kind(), leaf.value())
						})
						.collect::<Result<Vec<_>, _>>()?,
				}
			},
		};
		let mut sets = Vec::with_capacity(queries.len());

		for query in &queries {
			sets.push(self.fetch(query).await?);
		}

		Ok(set_algebra::union(sets))
	}

	pub(crate) async fn fetch(&self, query: &SelectQuery) -> Result<IdSet> {
		let ids = executor::fetch_ids(self.executor.as_ref(), &query.sql, &query.args).await?;

		Ok(ids.into_iter().collect())
	}

	async fn dictionary<'c>(
		&self,
		slot: &'c mut Option<PropertyDictionary>,
	) -> Result<&'c PropertyDictionary> {
		let dictionary = match slot.take() {
			Some(dictionary) => dictionary,
			None => PropertyDictionary::load(self.executor.as_ref()).await?,
		};

		Ok(slot.insert(dictionary))
	}
}
