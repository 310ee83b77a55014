use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Input limits applied to criteria trees before they reach the search manager.
///
/// The manager itself never bounds recursion; these limits are the upstream guard against
/// pathological nesting.
#[derive(Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_max_criteria_depth")]
	pub max_criteria_depth: usize,
	#[serde(default = "default_max_criteria_nodes")]
	pub max_criteria_nodes: usize,
	#[serde(default = "default_max_in_set_items")]
	pub max_in_set_items: usize,
	/// Upper bound for `fetch_options.count`.
	#[serde(default = "default_max_page_count")]
	pub max_page_count: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			max_criteria_depth: default_max_criteria_depth(),
			max_criteria_nodes: default_max_criteria_nodes(),
			max_in_set_items: default_max_in_set_items(),
			max_page_count: default_max_page_count(),
		}
	}
}

fn default_max_criteria_depth() -> usize {
	16
}

fn default_max_criteria_nodes() -> usize {
	256
}

fn default_max_in_set_items() -> usize {
	1_024
}

fn default_max_page_count() -> u32 {
	10_000
}
