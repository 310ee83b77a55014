use serde::{Deserialize, Serialize};

use sift_domain::{EntityKind, FetchOptions, SortOrder};
use sift_storage::{SqlArg, SqlExecutor, executor};

use crate::{Result, mapper::TableMapper, set_algebra::IdSet, translator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
	pub ids: Vec<i64>,
	/// Size of the authorized id set before paging.
	pub total_count: usize,
}

/// Orders and pages authorized ids. Ties always fall back to ascending id.
pub async fn sort_and_page(
	executor: &dyn SqlExecutor,
	kind: EntityKind,
	ids: &IdSet,
	fetch: &FetchOptions,
) -> Result<SearchResult> {
	let total_count = ids.len();
	let from = fetch.from.unwrap_or(0) as usize;
	let mapper = TableMapper::for_kind(kind);
	let mut order = Vec::with_capacity(fetch.sort.sortings.len() + 1);

	for sorting in &fetch.sort.sortings {
		let direction = match sorting.order {
			SortOrder::Asc => "ASC",
			SortOrder::Desc => "DESC",
		};

		order.push(format!("{} {direction}", mapper.sort_column(sorting.field)?));
	}

	if ids.is_empty() || from >= total_count || fetch.count == Some(0) {
		return Ok(SearchResult { ids: Vec::new(), total_count });
	}
	// Id order needs no round trip.
	if order.is_empty() {
		let count = fetch.count.map_or(usize::MAX, |count| count as usize);
		let page = translator::sorted(ids).into_iter().skip(from).take(count).collect();

		return Ok(SearchResult { ids: page, total_count });
	}

	order.push("id ASC".to_string());

	let mut sql = format!(
		"SELECT id FROM {} WHERE id = ANY($1) ORDER BY {} OFFSET $2",
		mapper.table,
		order.join(", ")
	);
	let mut args = vec![SqlArg::BigIntArray(translator::sorted(ids)), SqlArg::BigInt(from as i64)];

	if let Some(count) = fetch.count {
		sql.push_str(" LIMIT $3");
		args.push(SqlArg::BigInt(i64::from(count)));
	}

	let page = executor::fetch_ids(executor, &sql, &args).await?;

	Ok(SearchResult { ids: page, total_count })
}

#[cfg(test)]
mod tests {
	use sift_domain::{EntityKind, FetchOptions, SortField, SortOptions, SortOrder};
	use sift_storage::SqlArg;

	use crate::{set_algebra::IdSet, sort::sort_and_page, test_support::ScriptedExecutor};

	#[tokio::test]
	async fn unsorted_pages_by_id_without_a_query() {
		let executor = ScriptedExecutor::new();
		let fetch = FetchOptions { from: Some(1), count: Some(2), ..Default::default() };
		let result =
			sort_and_page(executor.as_ref(), EntityKind::Sample, &IdSet::from([9, 3, 5, 7]), &fetch)
				.await
				.expect("pages");

		assert_eq!(result.ids, vec![5, 7]);
		assert_eq!(result.total_count, 4);
		assert!(executor.calls().is_empty());
	}

	#[tokio::test]
	async fn sorted_pages_use_one_ordered_query() {
		let executor = ScriptedExecutor::new();

		executor.push_ids(&[7, 3]);

		let fetch = FetchOptions {
			from: Some(0),
			count: Some(2),
			sort: SortOptions::default().by(SortField::Code, SortOrder::Desc),
		};
		let result =
			sort_and_page(executor.as_ref(), EntityKind::Sample, &IdSet::from([3, 5, 7]), &fetch)
				.await
				.expect("pages");

		assert_eq!(result.ids, vec![7, 3]);
		assert_eq!(result.total_count, 3);
		assert_eq!(
			executor.calls(),
			vec![(
				"SELECT id FROM samples WHERE id = ANY($1) ORDER BY code DESC, id ASC OFFSET $2 LIMIT $3"
					.to_string(),
				vec![SqlArg::BigIntArray(vec![3, 5, 7]), SqlArg::BigInt(0), SqlArg::BigInt(2)],
			)]
		);
	}

	#[tokio::test]
	async fn offset_past_the_end_is_an_empty_page() {
		let executor = ScriptedExecutor::new();
		let fetch = FetchOptions {
			from: Some(10),
			sort: SortOptions::default().by(SortField::RegistrationDate, SortOrder::Asc),
			..Default::default()
		};
		let result = sort_and_page(executor.as_ref(), EntityKind::Project, &IdSet::from([1]), &fetch)
			.await
			.expect("pages");

		assert!(result.ids.is_empty());
		assert_eq!(result.total_count, 1);
	}

	#[tokio::test]
	async fn registration_sort_is_rejected_for_type_kinds() {
		let executor = ScriptedExecutor::new();
		let fetch = FetchOptions {
			sort: SortOptions::default().by(SortField::RegistrationDate, SortOrder::Asc),
			..Default::default()
		};

		assert!(
			sort_and_page(executor.as_ref(), EntityKind::SampleType, &IdSet::from([1]), &fetch)
				.await
				.is_err()
		);
	}
}
