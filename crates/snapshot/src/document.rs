use std::sync::Arc;

use cohost_checksum::Checksum;

use crate::asset::{AssetValue, text_checksum};
use crate::attributes::{DocumentAttributes, DocumentId};
use crate::index::{ChecksumIndex, IndexCell, IndexEntry};

/// Leaf item of a snapshot: one document's metadata and text.
#[derive(Debug)]
pub struct Document {
	attributes: Arc<DocumentAttributes>,
	text: Arc<str>,
	index: IndexCell,
}

impl Document {
	/// Creates a document.
	pub fn new(attributes: DocumentAttributes, text: impl Into<Arc<str>>) -> Self {
		Self {
			attributes: Arc::new(attributes),
			text: text.into(),
			index: IndexCell::default(),
		}
	}

	/// Returns a copy of this document with different text.
	pub fn with_text(&self, text: impl Into<Arc<str>>) -> Self {
		Self {
			attributes: Arc::clone(&self.attributes),
			text: text.into(),
			index: IndexCell::default(),
		}
	}

	/// Document identity.
	pub fn id(&self) -> DocumentId {
		self.attributes.id
	}

	/// Document metadata.
	pub fn attributes(&self) -> &DocumentAttributes {
		&self.attributes
	}

	/// Document text.
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Checksum of this document.
	pub fn checksum(&self) -> Checksum {
		self.checksum_index().checksum()
	}

	/// Index of `{attributes, text}`, built on first use.
	pub fn checksum_index(&self) -> Arc<ChecksumIndex> {
		self.index.get_or_publish(|| {
			ChecksumIndex::new([
				(
					self.attributes.checksum(),
					IndexEntry::Asset(AssetValue::DocumentAttributes(Arc::clone(&self.attributes))),
				),
				(text_checksum(&self.text), IndexEntry::Asset(AssetValue::Text(Arc::clone(&self.text)))),
			])
		})
	}

	/// Returns true once the index has been materialized.
	pub fn is_indexed(&self) -> bool {
		self.index.is_published()
	}
}
