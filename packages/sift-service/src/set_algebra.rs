//! Boolean combination of id sets.
//!
//! An empty input collection yields an empty set for both operators. This differs from an
//! operator node without children, which the search manager treats as "every entity".

use std::collections::HashSet;

use sift_domain::Operator;

pub type IdSet = HashSet<i64>;

pub fn merge(operator: Operator, sets: Vec<IdSet>) -> IdSet {
	match operator {
		Operator::And => intersection(sets),
		Operator::Or => union(sets),
	}
}

/// Intersects starting from the smallest set and stops as soon as the result is empty.
pub fn intersection(mut sets: Vec<IdSet>) -> IdSet {
	let Some(smallest) = smallest_index(&sets) else {
		return IdSet::new();
	};
	let mut result = sets.swap_remove(smallest);

	for set in &sets {
		if result.is_empty() {
			break;
		}

		result.retain(|id| set.contains(id));
	}

	result
}

pub fn union(sets: Vec<IdSet>) -> IdSet {
	let mut sets = sets.into_iter();
	let Some(mut result) = sets.next() else {
		return IdSet::new();
	};

	for set in sets {
		result.extend(set);
	}

	result
}

/// `None` only when there are no sets at all.
pub fn smallest_set(sets: &[IdSet]) -> Option<&IdSet> {
	smallest_index(sets).map(|index| &sets[index])
}

fn smallest_index(sets: &[IdSet]) -> Option<usize> {
	let mut best: Option<usize> = None;

	for (index, set) in sets.iter().enumerate() {
		if set.is_empty() {
			return Some(index);
		}
		if best.is_none_or(|current| set.len() < sets[current].len()) {
			best = Some(index);
		}
	}

	best
}

#[cfg(test)]
mod tests {
	use sift_domain::Operator;

	use crate::set_algebra::{IdSet, intersection, merge, smallest_set, union};

	fn ids(values: &[i64]) -> IdSet {
		values.iter().copied().collect()
	}

	#[test]
	fn and_intersects() {
		assert_eq!(merge(Operator::And, vec![ids(&[1, 2, 3]), ids(&[2, 3, 4])]), ids(&[2, 3]));
	}

	#[test]
	fn four_way_merge() {
		let sets = vec![ids(&[1, 2, 3, 4, 5]), ids(&[3, 5, 6, 7, 8]), ids(&[2, 3, 9]), ids(&[3, 5])];

		assert_eq!(merge(Operator::And, sets.clone()), ids(&[3]));
		assert_eq!(merge(Operator::Or, sets), ids(&[1, 2, 3, 4, 5, 6, 7, 8, 9]));
	}

	#[test]
	fn or_unions() {
		assert_eq!(merge(Operator::Or, vec![ids(&[1]), ids(&[2])]), ids(&[1, 2]));
	}

	#[test]
	fn empty_member_empties_the_intersection() {
		assert_eq!(merge(Operator::And, vec![ids(&[1, 2]), IdSet::new()]), IdSet::new());
	}

	#[test]
	fn empty_input_yields_empty_set_for_both_operators() {
		assert_eq!(merge(Operator::And, Vec::new()), IdSet::new());
		assert_eq!(merge(Operator::Or, Vec::new()), IdSet::new());
	}

	#[test]
	fn merge_is_idempotent() {
		let set = ids(&[4, 5, 6]);

		assert_eq!(intersection(vec![set.clone(), set.clone()]), set);
		assert_eq!(union(vec![set.clone(), set.clone()]), set);
	}

	#[test]
	fn smallest_set_sentinel() {
		assert_eq!(smallest_set(&[]), None);
		assert_eq!(smallest_set(&[ids(&[1, 2]), IdSet::new(), ids(&[3])]), Some(&IdSet::new()));
		assert_eq!(smallest_set(&[ids(&[1, 2, 3]), ids(&[7]), ids(&[4, 5])]), Some(&ids(&[7])));
	}

	#[test]
	fn single_set_passes_through() {
		assert_eq!(merge(Operator::And, vec![ids(&[9])]), ids(&[9]));
		assert_eq!(merge(Operator::Or, vec![ids(&[9])]), ids(&[9]));
	}
}
