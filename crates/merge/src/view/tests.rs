use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::VecSource;

type AscView = MergeView<u32, fn(&u32, &u32) -> Ordering>;

const ASC: fn(&u32, &u32) -> Ordering = u32::cmp;

fn shared<T: Clone + Send + Sync + 'static>(id: u64, items: Vec<T>) -> Arc<VecSource<T>> {
	VecSource::new(id, items).shared()
}

fn ascending(sources: Vec<Vec<u32>>, page_size: usize) -> AscView {
	let sources = sources.into_iter().enumerate().map(|(id, items)| shared(id as u64, items) as SharedSource<u32>).collect();
	MergeView::new(sources, ASC, MergeConfig::with_page_size(page_size)).expect("valid page size")
}

#[test]
fn merges_two_interleaved_sources() {
	let mut view = ascending(vec![vec![1, 3, 5], vec![2, 4, 6]], 2);
	assert_eq!(view.count(), 6);
	assert_eq!(view.get_range(0, 4), vec![1, 2, 3, 4]);
	assert_eq!(view.checkpoint(2), Some(&[1, 1][..]));
	assert_eq!(view.checkpoint(4), Some(&[2, 2][..]));
	assert_eq!(view.get_range(4, 10), vec![5, 6]);
}

#[test]
fn ties_follow_source_order() {
	let sources: Vec<SharedSource<(u32, char)>> = vec![shared(7, vec![(1u32, 'a'), (2, 'a'), (2, 'a')]), shared(3, vec![(2u32, 'b'), (3, 'b')])];
	let mut view = MergeView::new(sources, |a: &(u32, char), b: &(u32, char)| a.0.cmp(&b.0), MergeConfig::with_page_size(2)).expect("valid page size");
	assert_eq!(view.get_range(0, 5), vec![(1, 'a'), (2, 'a'), (2, 'a'), (2, 'b'), (3, 'b')]);
	// Same answer from a checkpoint.
	assert_eq!(view.get_range(2, 2), vec![(2, 'a'), (2, 'b')]);
}

#[test]
fn random_access_matches_sequential_reads() {
	let mut warm = ascending(vec![vec![1, 4, 7, 10], vec![2, 5, 8], vec![3, 6, 9]], 3);
	let all = warm.get_range(0, 10);
	assert_eq!(all, (1..=10).collect::<Vec<_>>());

	let mut cold = ascending(vec![vec![1, 4, 7, 10], vec![2, 5, 8], vec![3, 6, 9]], 3);
	assert_eq!(cold.get_range(7, 2), vec![8, 9]);
	assert_eq!(cold.item_at(9), Some(10));
	assert_eq!(cold.item_at(10), None);
	assert_eq!(warm.get_range(7, 2), vec![8, 9]);
}

#[test]
fn out_of_range_requests_are_empty_or_short() {
	let mut view = ascending(vec![vec![1, 2], vec![3]], 2);
	assert_eq!(view.get_range(3, 5), Vec::<u32>::new());
	assert_eq!(view.get_range(2, 5), vec![3]);
	assert_eq!(view.get_range(0, 0), Vec::<u32>::new());
}

#[test]
fn checkpoints_bound_replay_to_one_page() {
	let evens: Vec<u32> = (0..500).map(|i| i * 2).collect();
	let odds: Vec<u32> = (0..500).map(|i| i * 2 + 1).collect();
	let mut view = ascending(vec![evens, odds], 16);
	assert_eq!(view.get_range(0, 1000).len(), 1000);
	assert_eq!(view.checkpoints().len(), 1000 / 16);

	view.clear_checkpoints();
	assert!(view.checkpoints().is_empty());
	assert_eq!(view.get_range(990, 3), vec![990, 991, 992]);
	assert_eq!(view.checkpoint(992), Some(&[496, 496][..]));
}

#[test]
fn empty_sources_are_not_live() {
	let empty = shared(1, Vec::<u32>::new());
	let full = shared(2, vec![5u32, 6]);
	let sources: Vec<SharedSource<u32>> = vec![empty.clone(), full];
	let mut view = MergeView::new(sources, ASC, MergeConfig::with_page_size(4)).expect("valid page size");
	assert_eq!(view.live_sources().iter().map(|s| s.id).collect::<Vec<_>>(), vec![2]);
	let version = view.data_version();

	assert!(!view.update_data());
	assert_eq!(view.data_version(), version);

	empty.replace(vec![1]);
	assert!(view.update_data());
	assert_eq!(view.data_version(), version + 1);
	assert_eq!(view.live_sources().iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);
	assert_eq!(view.get_range(0, 3), vec![1, 5, 6]);
}

#[test]
fn any_source_change_discards_checkpoints() {
	let left = shared(1, vec![1u32, 3, 5, 7]);
	let right = shared(2, vec![2u32, 4, 6, 8]);
	let sources: Vec<SharedSource<u32>> = vec![left.clone(), right.clone()];
	let mut view = MergeView::new(sources, ASC, MergeConfig::with_page_size(2)).expect("valid page size");
	view.get_range(0, 8);
	assert_eq!(view.checkpoints().len(), 4);

	// Same count, new contents.
	left.replace(vec![10, 30, 50, 70]);
	assert!(view.update_data());
	assert!(view.checkpoints().is_empty());
	assert_eq!(view.get_range(0, 4), vec![2, 4, 6, 8]);

	// Membership change.
	assert!(view.set_sources(vec![right as SharedSource<u32>]));
	assert_eq!(view.count(), 4);
	assert_eq!(view.live_sources().len(), 1);
	assert_eq!(view.checkpoint(2), None);
}

#[test]
fn unchanged_sources_keep_their_page() {
	let left = shared(1, (0..8u32).map(|i| i * 2).collect());
	let right = shared(2, (0..8u32).map(|i| i * 2 + 1).collect());
	let sources: Vec<SharedSource<u32>> = vec![left.clone(), right.clone()];
	let mut view = MergeView::new(sources, ASC, MergeConfig::with_page_size(8)).expect("valid page size");
	view.get_range(0, 4);
	assert_eq!(view.page_fetches(), 2);

	// Reordering keeps both pages.
	let reordered: Vec<SharedSource<u32>> = vec![right, left];
	assert!(view.set_sources(reordered));
	assert_eq!(view.page_fetches(), 2);
	assert_eq!(view.get_range(0, 4), vec![0, 1, 2, 3]);
	assert_eq!(view.page_fetches(), 2);
}

#[test]
fn rebuilt_source_with_equal_stamp_replaces_the_old_one() {
	let original = shared(1, vec![1u32, 3]);
	let sources: Vec<SharedSource<u32>> = vec![original.clone()];
	let mut view = MergeView::new(sources, ASC, MergeConfig::with_page_size(2)).expect("valid page size");
	assert_eq!(view.get_range(0, 2), vec![1, 3]);

	let rebuilt = shared(1, vec![7u32, 9]);
	assert_eq!(SourceStamp::of(&*rebuilt), SourceStamp::of(&*original));
	assert!(view.set_sources(vec![rebuilt as SharedSource<u32>]));
	assert!(view.checkpoints().is_empty());
	assert_eq!(view.get_range(0, 2), vec![7, 9]);
	assert_eq!(view.page_fetches(), 1);
}

#[test]
fn zero_page_size_is_rejected() {
	let result: Result<AscView, _> = MergeView::new(Vec::new(), ASC, MergeConfig::with_page_size(0));
	assert_eq!(result.err(), Some(MergeError::ZeroPageSize));
}

fn sorted_sources() -> impl Strategy<Value = Vec<Vec<u32>>> {
	prop::collection::vec(prop::collection::vec(0u32..40, 0..30), 1..5).prop_map(|mut sources| {
		for source in &mut sources {
			source.sort_unstable();
		}
		sources
	})
}

/// Stable sort of the concatenation equals a k-way merge with ties to the lowest source.
fn reference(sources: &[Vec<u32>]) -> Vec<u32> {
	let mut all: Vec<u32> = sources.concat();
	all.sort();
	all
}

proptest! {
	#[test]
	fn prop_ranges_match_reference(sources in sorted_sources(), page_size in 1usize..6, start in 0usize..130, len in 0usize..40) {
		let expected = reference(&sources);
		let mut view = ascending(sources, page_size);
		prop_assert_eq!(view.count(), expected.len());

		let from = start.min(expected.len());
		let to = (start + len).min(expected.len());
		prop_assert_eq!(view.get_range(start, len), expected[from..to].to_vec());
		// A second read starts from whatever checkpoints the first left behind.
		prop_assert_eq!(view.get_range(0, expected.len()), expected.clone());
		prop_assert_eq!(view.get_range(start, len), expected[from..to].to_vec());
	}

	/// Cursors restored from any checkpoint match a replay from position 0.
	#[test]
	fn prop_checkpoints_round_trip(sources in sorted_sources(), page_size in 1usize..6) {
		let mut warm = ascending(sources.clone(), page_size);
		let total = warm.count();
		warm.get_range(0, total);

		let positions: Vec<usize> = warm.checkpoints().positions().collect();
		prop_assert_eq!(positions.len(), total / page_size);
		let mut previous = vec![0; warm.live_sources().len()];
		for pos in positions {
			let saved = warm.checkpoint(pos).map(<[usize]>::to_vec).unwrap_or_default();
			prop_assert_eq!(saved.iter().sum::<usize>(), pos);
			prop_assert!(saved.iter().zip(&previous).all(|(now, before)| now >= before));

			let mut cold = ascending(sources.clone(), page_size);
			prop_assert_eq!(cold.cursors_at(pos), saved.clone());
			prop_assert_eq!(warm.cursors_at(pos), saved.clone());
			previous = saved;
		}
	}

	/// Cursors further on, replayed from an earlier checkpoint, match a cold replay.
	#[test]
	fn prop_replay_from_earlier_checkpoint(sources in sorted_sources(), page_size in 1usize..6, pages in 1usize..8, extra in 0usize..20) {
		let total = reference(&sources).len();
		let from = (pages * page_size).min(total / page_size * page_size);
		prop_assume!(from > 0);
		let target = (from + extra).min(total);

		let mut partial = ascending(sources.clone(), page_size);
		partial.get_range(0, from);
		prop_assert!(partial.checkpoint(from).is_some());
		prop_assert!(partial.checkpoints().positions().all(|pos| pos <= from));
		// Pull the resume cursor back so the next walk starts from the checkpoint.
		partial.item_at(0);

		let mut cold = ascending(sources, page_size);
		let expected = cold.cursors_at(target);
		prop_assert_eq!(expected.iter().sum::<usize>(), target);
		prop_assert_eq!(partial.cursors_at(target), expected);
	}
}
