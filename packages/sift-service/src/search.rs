use serde::{Deserialize, Serialize};
use serde_json::Value;

use sift_domain::{EntityKind, FetchOptions, dsl};

use crate::{Error, Result, SiftService, sort::SearchResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub kind: EntityKind,
	pub user_id: i64,
	/// Criteria tree in the JSON DSL; see [`sift_domain::dsl`].
	pub criteria: Value,
	#[serde(default)]
	pub fetch_options: FetchOptions,
}

impl SiftService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResult> {
		let max_page_count = self.cfg.search.max_page_count;
		let mut fetch = req.fetch_options;

		match fetch.count {
			Some(count) if count > max_page_count =>
				return Err(Error::InvalidRequest {
					message: format!(
						"fetch_options.count must be at most {max_page_count}, got {count}."
					),
				}),
			Some(_) => {},
			None => fetch.count = Some(max_page_count),
		}

		let criteria = dsl::parse_criteria(&req.criteria, &self.criteria_limits())?;

		tracing::debug!(
			user_id = req.user_id,
			kind = %req.kind,
			depth = criteria.depth(),
			"Search request parsed."
		);

		self.manager.search(req.user_id, req.kind, &criteria, &fetch).await
	}
}
