use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Checksum;

/// Immutable ordered list of checksums, itself addressed by
/// [`Checksum::combine`] of its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Checksum>", into = "Vec<Checksum>")]
pub struct ChecksumCollection {
	checksum: Checksum,
	items: Arc<[Checksum]>,
}

impl ChecksumCollection {
	/// Builds a collection and computes its checksum.
	pub fn new(items: impl Into<Arc<[Checksum]>>) -> Self {
		let items = items.into();
		let checksum = Checksum::combine(items.iter().copied());
		Self { checksum, items }
	}

	/// Checksum of the whole collection.
	pub fn checksum(&self) -> Checksum {
		self.checksum
	}

	/// Members in order.
	pub fn items(&self) -> &[Checksum] {
		&self.items
	}
}

impl Deref for ChecksumCollection {
	type Target = [Checksum];

	fn deref(&self) -> &[Checksum] {
		&self.items
	}
}

impl FromIterator<Checksum> for ChecksumCollection {
	fn from_iter<I: IntoIterator<Item = Checksum>>(iter: I) -> Self {
		Self::new(iter.into_iter().collect::<Vec<_>>())
	}
}

impl From<Vec<Checksum>> for ChecksumCollection {
	fn from(items: Vec<Checksum>) -> Self {
		Self::new(items)
	}
}

impl From<ChecksumCollection> for Vec<Checksum> {
	fn from(collection: ChecksumCollection) -> Self {
		collection.items.to_vec()
	}
}
