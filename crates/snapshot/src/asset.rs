use std::sync::Arc;

use cohost_checksum::{Checksum, ChecksumCollection, ChecksumWriter};
use serde::{Deserialize, Serialize};

use crate::attributes::{DocumentAttributes, ProjectAttributes, SolutionAttributes};

/// Content that can be addressed by checksum inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetValue {
	/// Absent content; only ever paired with [`Checksum::NULL`].
	Null,
	/// Ordered checksums of a node's entries or of a child list.
	Checksums(ChecksumCollection),
	/// Solution metadata.
	SolutionAttributes(Arc<SolutionAttributes>),
	/// Project metadata.
	ProjectAttributes(Arc<ProjectAttributes>),
	/// Document metadata.
	DocumentAttributes(Arc<DocumentAttributes>),
	/// Document text.
	Text(Arc<str>),
}

impl AssetValue {
	/// Returns true for [`AssetValue::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Computes the content checksum of this value.
	pub fn checksum(&self) -> Checksum {
		match self {
			Self::Null => Checksum::NULL,
			Self::Checksums(collection) => collection.checksum(),
			Self::SolutionAttributes(attributes) => attributes.checksum(),
			Self::ProjectAttributes(attributes) => attributes.checksum(),
			Self::DocumentAttributes(attributes) => attributes.checksum(),
			Self::Text(text) => text_checksum(text),
		}
	}

	/// Short name of the variant, for logs.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Checksums(_) => "checksums",
			Self::SolutionAttributes(_) => "solution_attributes",
			Self::ProjectAttributes(_) => "project_attributes",
			Self::DocumentAttributes(_) => "document_attributes",
			Self::Text(_) => "text",
		}
	}
}

pub(crate) fn text_checksum(text: &str) -> Checksum {
	ChecksumWriter::new(b"text").write_str(text).finish()
}

/// A value paired with its checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
	checksum: Checksum,
	value: AssetValue,
}

impl Asset {
	/// The sentinel asset for [`Checksum::NULL`].
	pub const NULL: Asset = Asset {
		checksum: Checksum::NULL,
		value: AssetValue::Null,
	};

	/// Pairs a checksum with its value.
	///
	/// # Panics
	///
	/// Panics if exactly one of `checksum` and `value` is the null sentinel.
	pub fn new(checksum: Checksum, value: AssetValue) -> Self {
		assert_eq!(
			checksum.is_null(),
			value.is_null(),
			"null checksum and null asset value must coincide (checksum {checksum}, value kind {})",
			value.kind()
		);
		Self { checksum, value }
	}

	/// Builds an asset from a value, computing its checksum.
	pub fn from_value(value: AssetValue) -> Self {
		Self {
			checksum: value.checksum(),
			value,
		}
	}

	/// Checksum of the value.
	pub fn checksum(&self) -> Checksum {
		self.checksum
	}

	/// The value.
	pub fn value(&self) -> &AssetValue {
		&self.value
	}

	/// Consumes the asset, returning its value.
	pub fn into_value(self) -> AssetValue {
		self.value
	}

	/// Returns true for the sentinel asset.
	pub fn is_null(&self) -> bool {
		self.checksum.is_null()
	}
}
