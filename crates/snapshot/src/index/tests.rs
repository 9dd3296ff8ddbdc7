use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

fn text(value: &str) -> (Checksum, IndexEntry) {
	let value = AssetValue::Text(value.into());
	(value.checksum(), IndexEntry::Asset(value))
}

fn leaf(values: &[&str]) -> Arc<ChecksumIndex> {
	Arc::new(ChecksumIndex::new(values.iter().map(|v| text(v))))
}

#[test]
fn test_index_checksum_combines_entries_in_order() {
	let (a, _) = text("a");
	let (b, _) = text("b");
	let index = ChecksumIndex::new([text("a"), text("b")]);
	assert_eq!(index.checksum(), Checksum::combine([a, b]));
	assert_eq!(index.summary().items(), &[a, b]);
	assert_eq!(index.len(), 2);
}

#[test]
fn test_duplicate_entry_keeps_first_position() {
	let (a, _) = text("a");
	let (b, _) = text("b");
	let index = ChecksumIndex::new([text("a"), text("b"), text("a")]);
	assert_eq!(index.summary().items(), &[a, b]);
}

#[test]
fn test_probe_resolves_own_checksum_to_summary() {
	let index = leaf(&["x", "y"]);
	let mut remaining = HashSet::from([index.checksum()]);
	let mut found = HashMap::new();
	index.probe(&mut remaining, &mut found);

	assert!(remaining.is_empty());
	assert_eq!(found[&index.checksum()], AssetValue::Checksums(index.summary().clone()));
}

#[test]
fn test_probe_leaves_unmatched_checksums_outstanding() {
	let index = leaf(&["x"]);
	let (x, _) = text("x");
	let (missing, _) = text("missing");
	let mut remaining = HashSet::from([x, missing]);
	let mut found = HashMap::new();
	index.probe(&mut remaining, &mut found);

	assert_eq!(remaining, HashSet::from([missing]));
	assert_eq!(found[&x], AssetValue::Text("x".into()));
}

#[test]
fn test_probe_matches_child_reference_without_descending() {
	let child = leaf(&["deep"]);
	let parent = ChecksumIndex::new([(child.checksum(), IndexEntry::Child(Arc::clone(&child)))]);
	let (deep, _) = text("deep");
	let mut remaining = HashSet::from([child.checksum(), deep]);
	let mut found = HashMap::new();
	parent.probe(&mut remaining, &mut found);

	assert_eq!(remaining, HashSet::from([deep]));
	assert_eq!(found[&child.checksum()], AssetValue::Checksums(child.summary().clone()));
}

#[test]
fn test_probe_both_sides_agree() {
	let index = leaf(&["a", "b", "c", "d"]);
	let (a, _) = text("a");
	let (z, _) = text("z");

	// Fewer outstanding than entries.
	let mut small = HashSet::from([a]);
	let mut small_found = HashMap::new();
	index.probe(&mut small, &mut small_found);

	// More outstanding than entries.
	let extra: Vec<_> = (0..8).map(|i| text(&format!("extra-{i}")).0).collect();
	let mut large: HashSet<_> = extra.iter().copied().chain([a, z]).collect();
	let mut large_found = HashMap::new();
	index.probe(&mut large, &mut large_found);

	assert_eq!(small_found, large_found);
	assert!(large.contains(&z));
	assert!(!large.contains(&a));
}

#[test]
fn test_find_descends_depth_first_and_stops_when_done() {
	let first = leaf(&["one"]);
	let second = leaf(&["two"]);
	let root = ChecksumIndex::new([
		(first.checksum(), IndexEntry::Child(Arc::clone(&first))),
		(second.checksum(), IndexEntry::Child(Arc::clone(&second))),
	]);
	let (one, _) = text("one");
	let (two, _) = text("two");
	let mut remaining = HashSet::from([one, two]);
	let mut found = HashMap::new();
	root.find(&mut remaining, &mut found);

	assert!(remaining.is_empty());
	assert_eq!(found.len(), 2);
	assert_eq!(found[&two], AssetValue::Text("two".into()));
}

#[test]
fn test_index_cell_publishes_once() {
	let cell = IndexCell::default();
	let builds = AtomicUsize::new(0);
	let build = || {
		builds.fetch_add(1, Ordering::SeqCst);
		ChecksumIndex::new([text("x")])
	};

	assert!(!cell.is_published());
	let first = cell.get_or_publish(build);
	let second = cell.get_or_publish(build);
	assert!(cell.is_published());
	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_index_cell_racing_builders_adopt_one_winner() {
	let cell = IndexCell::default();
	let barrier = std::sync::Barrier::new(8);

	let published: Vec<Arc<ChecksumIndex>> = std::thread::scope(|scope| {
		let handles: Vec<_> = (0..8)
			.map(|_| {
				scope.spawn(|| {
					cell.get_or_publish(|| {
						barrier.wait();
						ChecksumIndex::new([text("raced")])
					})
				})
			})
			.collect();
		handles.into_iter().map(|h| h.join().unwrap()).collect()
	});

	for index in &published[1..] {
		assert!(Arc::ptr_eq(index, &published[0]));
	}
}
