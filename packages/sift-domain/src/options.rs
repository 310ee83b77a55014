use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
	Id,
	Code,
	PermId,
	RegistrationDate,
	ModificationDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
	#[default]
	Asc,
	Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sorting {
	pub field: SortField,
	#[serde(default)]
	pub order: SortOrder,
}

/// Orderings applied after the id set is computed. Ties always fall back to the primary key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOptions {
	#[serde(default)]
	pub sortings: Vec<Sorting>,
}
impl SortOptions {
	pub fn by(mut self, field: SortField, order: SortOrder) -> Self {
		self.sortings.push(Sorting { field, order });

		self
	}
}

/// Paging over the sorted result. `count: None` returns everything from `from` on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
	#[serde(default)]
	pub from: Option<u32>,
	#[serde(default)]
	pub count: Option<u32>,
	#[serde(default)]
	pub sort: SortOptions,
}
