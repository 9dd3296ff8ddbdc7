//! Per-node checksum indexes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use cohost_checksum::{Checksum, ChecksumCollection};
use indexmap::IndexMap;

use crate::asset::AssetValue;

/// Target of one index entry.
#[derive(Debug, Clone)]
pub enum IndexEntry {
	/// Content owned directly by the node.
	Asset(AssetValue),
	/// Index of a child node, keyed by the child's checksum.
	Child(Arc<ChecksumIndex>),
}

/// Mapping from the checksums a node owns to their values or child indexes.
///
/// The node's own checksum is the combination of its entry checksums in
/// order; it resolves to a [`AssetValue::Checksums`] listing those entries.
#[derive(Debug)]
pub struct ChecksumIndex {
	summary: ChecksumCollection,
	entries: IndexMap<Checksum, IndexEntry>,
}

impl ChecksumIndex {
	/// Builds an index from ordered entries.
	///
	/// A checksum listed twice keeps its first position; content addressing
	/// makes the two targets interchangeable.
	pub fn new(entries: impl IntoIterator<Item = (Checksum, IndexEntry)>) -> Self {
		let mut map = IndexMap::new();
		for (checksum, entry) in entries {
			map.entry(checksum).or_insert(entry);
		}
		let summary = map.keys().copied().collect();
		Self { summary, entries: map }
	}

	/// Checksum of the node this index describes.
	pub fn checksum(&self) -> Checksum {
		self.summary.checksum()
	}

	/// Entry checksums in order, the value the node's own checksum resolves to.
	pub fn summary(&self) -> &ChecksumCollection {
		&self.summary
	}

	/// Number of direct entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if the node owns nothing.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Looks up a direct entry.
	pub fn get(&self, checksum: &Checksum) -> Option<&IndexEntry> {
		self.entries.get(checksum)
	}

	/// Child indexes in insertion order.
	pub fn children(&self) -> impl Iterator<Item = &Arc<ChecksumIndex>> {
		self.entries.values().filter_map(|entry| match entry {
			IndexEntry::Child(child) => Some(child),
			IndexEntry::Asset(_) => None,
		})
	}

	/// Matches outstanding checksums against this node only.
	///
	/// Matched checksums move from `remaining` to `found`. Costs one probe per
	/// outstanding checksum or per entry, whichever side is smaller.
	pub fn probe(&self, remaining: &mut HashSet<Checksum>, found: &mut HashMap<Checksum, AssetValue>) {
		if remaining.is_empty() {
			return;
		}

		let own = self.checksum();
		if remaining.remove(&own) {
			found.insert(own, AssetValue::Checksums(self.summary.clone()));
		}

		if self.entries.len() < remaining.len() {
			for (checksum, entry) in &self.entries {
				if remaining.remove(checksum) {
					found.insert(*checksum, entry_value(entry));
				}
			}
		} else {
			remaining.retain(|checksum| match self.entries.get(checksum) {
				Some(entry) => {
					found.insert(*checksum, entry_value(entry));
					false
				}
				None => true,
			});
		}
	}

	/// Probes this node, then descends depth-first into children until
	/// `remaining` is empty.
	pub fn find(&self, remaining: &mut HashSet<Checksum>, found: &mut HashMap<Checksum, AssetValue>) {
		self.probe(remaining, found);
		for child in self.children() {
			if remaining.is_empty() {
				break;
			}
			child.find(remaining, found);
		}
	}
}

fn entry_value(entry: &IndexEntry) -> AssetValue {
	match entry {
		IndexEntry::Asset(value) => value.clone(),
		IndexEntry::Child(child) => AssetValue::Checksums(child.summary.clone()),
	}
}

/// Publish-once slot for a node's index.
#[derive(Debug, Default)]
pub(crate) struct IndexCell(ArcSwapOption<ChecksumIndex>);

impl IndexCell {
	/// Returns the published index, building and publishing it on first use.
	///
	/// Racing builders each compute an index; the first compare-and-swap wins
	/// and the others drop their copy.
	pub(crate) fn get_or_publish(&self, build: impl FnOnce() -> ChecksumIndex) -> Arc<ChecksumIndex> {
		if let Some(index) = self.0.load_full() {
			return index;
		}

		let built = Arc::new(build());
		let previous = self
			.0
			.compare_and_swap(&None::<Arc<ChecksumIndex>>, Some(Arc::clone(&built)));
		match &*previous {
			Some(winner) => Arc::clone(winner),
			None => built,
		}
	}

	pub(crate) fn is_published(&self) -> bool {
		self.0.load().is_some()
	}
}

#[cfg(test)]
mod tests;
