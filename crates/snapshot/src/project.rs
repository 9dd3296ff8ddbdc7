use std::sync::Arc;

use cohost_checksum::{Checksum, ChecksumCollection};

use crate::asset::AssetValue;
use crate::attributes::{DocumentId, ProjectAttributes, ProjectId};
use crate::document::Document;
use crate::index::{ChecksumIndex, IndexCell, IndexEntry};

/// Sub-tree of a snapshot: one project and its documents.
#[derive(Debug)]
pub struct Project {
	attributes: Arc<ProjectAttributes>,
	documents: Vec<Arc<Document>>,
	index: IndexCell,
}

impl Project {
	/// Creates a project.
	pub fn new(attributes: ProjectAttributes, documents: Vec<Arc<Document>>) -> Self {
		Self {
			attributes: Arc::new(attributes),
			documents,
			index: IndexCell::default(),
		}
	}

	/// Project identity.
	pub fn id(&self) -> ProjectId {
		self.attributes.id
	}

	/// Project metadata.
	pub fn attributes(&self) -> &ProjectAttributes {
		&self.attributes
	}

	/// Documents in order.
	pub fn documents(&self) -> &[Arc<Document>] {
		&self.documents
	}

	/// Finds a document by id.
	pub fn document(&self, id: DocumentId) -> Option<&Arc<Document>> {
		self.documents.iter().find(|doc| doc.id() == id)
	}

	/// Returns a copy with `document` replacing the one with the same id, or
	/// appended if absent. Other documents are shared.
	pub fn with_document(&self, document: Arc<Document>) -> Self {
		let mut documents = self.documents.clone();
		match documents.iter_mut().find(|doc| doc.id() == document.id()) {
			Some(slot) => *slot = document,
			None => documents.push(document),
		}
		Self {
			attributes: Arc::clone(&self.attributes),
			documents,
			index: IndexCell::default(),
		}
	}

	/// Checksum of this project.
	pub fn checksum(&self) -> Checksum {
		self.checksum_index().checksum()
	}

	/// Index of `{attributes, document list, documents…}`, built on first use.
	pub fn checksum_index(&self) -> Arc<ChecksumIndex> {
		self.index.get_or_publish(|| {
			let children: Vec<_> = self.documents.iter().map(|doc| doc.checksum_index()).collect();
			let list: ChecksumCollection = children.iter().map(|child| child.checksum()).collect();

			let mut entries = Vec::with_capacity(children.len() + 2);
			entries.push((
				self.attributes.checksum(),
				IndexEntry::Asset(AssetValue::ProjectAttributes(Arc::clone(&self.attributes))),
			));
			entries.push((list.checksum(), IndexEntry::Asset(AssetValue::Checksums(list))));
			entries.extend(children.into_iter().map(|child| (child.checksum(), IndexEntry::Child(child))));
			ChecksumIndex::new(entries)
		})
	}

	/// Returns true once the index has been materialized.
	pub fn is_indexed(&self) -> bool {
		self.index.is_published()
	}
}
