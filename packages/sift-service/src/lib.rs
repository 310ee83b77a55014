pub mod auth;
pub mod manager;
pub mod mapper;
pub mod properties;
pub mod relation;
pub mod resolver;
pub mod search;
pub mod set_algebra;
pub mod sort;
pub mod translator;

mod error;
#[cfg(test)]
mod test_support;

pub use auth::{AuthorisationInformation, AuthorisationProvider, SqlAuthorisationProvider};
pub use error::{Error, Result};
pub use manager::SearchManager;
pub use search::SearchRequest;
pub use set_algebra::IdSet;
pub use sift_storage::BoxFuture;
pub use sort::SearchResult;

use std::sync::Arc;

use sift_config::Config;
use sift_domain::dsl::CriteriaLimits;
use sift_storage::SqlExecutor;

pub struct SiftService {
	pub cfg: Config,
	pub manager: SearchManager,
}
impl SiftService {
	/// Authorizes against the `role_assignments` table behind `executor`.
	pub fn new(cfg: Config, executor: Arc<dyn SqlExecutor>) -> Self {
		let authorisation = Arc::new(SqlAuthorisationProvider::new(executor.clone()));

		Self::with_authorisation(cfg, executor, authorisation)
	}

	pub fn with_authorisation(
		cfg: Config,
		executor: Arc<dyn SqlExecutor>,
		authorisation: Arc<dyn AuthorisationProvider>,
	) -> Self {
		Self { cfg, manager: SearchManager::new(executor, authorisation) }
	}

	pub fn criteria_limits(&self) -> CriteriaLimits {
		CriteriaLimits {
			max_depth: self.cfg.search.max_criteria_depth,
			max_nodes: self.cfg.search.max_criteria_nodes,
			max_in_set_items: self.cfg.search.max_in_set_items,
		}
	}
}
