//! Recursive evaluation of criteria trees.
//!
//! Children are evaluated in order and merged with the set algebra. Relation and reference leaves
//! run their nested tree through the full pipeline, including its own authorization filter, and
//! then expand the result onto the owning kind. The root result is filtered exactly once.

use std::sync::Arc;

use sift_domain::{CriteriaNode, EntityKind, FetchOptions};
use sift_storage::{BoxFuture, SqlExecutor};

use crate::{
	Result,
	auth::{self, AuthorisationInformation, AuthorisationProvider},
	mapper::TableMapper,
	properties::PropertyDictionary,
	relation::RelationResolver,
	resolver::{Leaf, QueryResolver},
	set_algebra::{self, IdSet},
	sort::{self, SearchResult},
};

/// Per-call state. Built once per top-level search and dropped with it.
struct SearchContext {
	auth: AuthorisationInformation,
	properties: Option<PropertyDictionary>,
}

pub struct SearchManager {
	executor: Arc<dyn SqlExecutor>,
	authorisation: Arc<dyn AuthorisationProvider>,
	resolver: QueryResolver,
	relations: RelationResolver,
}
impl SearchManager {
	pub fn new(
		executor: Arc<dyn SqlExecutor>,
		authorisation: Arc<dyn AuthorisationProvider>,
	) -> Self {
		Self {
			resolver: QueryResolver::new(executor.clone()),
			relations: RelationResolver::new(executor.clone()),
			executor,
			authorisation,
		}
	}

	/// Authorized ids of `kind` matching `criteria`.
	pub async fn search_ids(
		&self,
		user_id: i64,
		kind: EntityKind,
		criteria: &CriteriaNode,
	) -> Result<IdSet> {
		let auth = self.authorise(user_id).await;
		let mut ctx = SearchContext { auth, properties: None };
		let ids = self.search_authorised(&mut ctx, kind, criteria).await?;

		tracing::debug!(user_id, kind = %kind, matched = ids.len(), "Search completed.");

		Ok(ids)
	}

	pub async fn search(
		&self,
		user_id: i64,
		kind: EntityKind,
		criteria: &CriteriaNode,
		fetch: &FetchOptions,
	) -> Result<SearchResult> {
		let ids = self.search_ids(user_id, kind, criteria).await?;

		sort::sort_and_page(self.executor.as_ref(), kind, &ids, fetch).await
	}

	async fn authorise(&self, user_id: i64) -> AuthorisationInformation {
		match self.authorisation.authorisation(user_id).await {
			Ok(auth) => auth,
			Err(err) => {
				tracing::warn!(user_id, error = %err, "Authorisation lookup failed. Denying access.");

				AuthorisationInformation::default()
			},
		}
	}

	fn search_authorised<'a>(
		&'a self,
		ctx: &'a mut SearchContext,
		kind: EntityKind,
		node: &'a CriteriaNode,
	) -> BoxFuture<'a, Result<IdSet>> {
		Box::pin(async move {
			let candidates = self.evaluate(ctx, kind, node).await?;

			auth::filter_by_user_rights(self.executor.as_ref(), &ctx.auth, kind, candidates).await
		})
	}

	fn evaluate<'a>(
		&'a self,
		ctx: &'a mut SearchContext,
		kind: EntityKind,
		node: &'a CriteriaNode,
	) -> BoxFuture<'a, Result<IdSet>> {
		Box::pin(async move {
			let ids = match node {
				CriteriaNode::Operator { children, .. } if children.is_empty() =>
					self.resolver.all_ids(kind).await?,
				CriteriaNode::Operator { operator, children } => {
					let mut sets = Vec::with_capacity(children.len());

					for child in children {
						sets.push(self.evaluate(ctx, kind, child).await?);
					}

					set_algebra::merge(*operator, sets)
				},
				CriteriaNode::Attribute(leaf) =>
					self.resolver.resolve(&mut ctx.properties, kind, Leaf::Attribute(leaf)).await?,
				CriteriaNode::Property(leaf) =>
					self.resolver.resolve(&mut ctx.properties, kind, Leaf::Property(leaf)).await?,
				CriteriaNode::Absence(leaf) =>
					self.resolver.resolve(&mut ctx.properties, kind, Leaf::Absence(leaf)).await?,
				CriteriaNode::Relation(leaf) => {
					TableMapper::for_kind(kind).relationship_table()?;

					let related = self.search_authorised(ctx, kind, &leaf.nested).await?;

					self.relations.expand_relation(kind, leaf.direction, &related).await?
				},
				CriteriaNode::Reference(leaf) => {
					let mapping = TableMapper::for_kind(kind).reference(leaf.reference)?;
					let related = self.search_authorised(ctx, mapping.target, &leaf.nested).await?;

					self.relations.expand_reference(kind, mapping, &related).await?
				},
			};

			tracing::debug!(
				kind = %kind,
				node = node_label(node),
				matched = ids.len(),
				"Criteria node resolved."
			);

			Ok(ids)
		})
	}
}

fn node_label(node: &CriteriaNode) -> &'static str {
	match node {
		CriteriaNode::Operator { .. } => "operator",
		CriteriaNode::Attribute(_) => "attribute",
		CriteriaNode::Property(_) => "property",
		CriteriaNode::Relation(_) => "relation",
		CriteriaNode::Reference(_) => "reference",
		CriteriaNode::Absence(_) => "absence",
	}
}
