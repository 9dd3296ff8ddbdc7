use std::sync::Arc;

use cohost_checksum::{Checksum, ChecksumCollection};

use crate::asset::AssetValue;
use crate::attributes::{DocumentId, ProjectId, SolutionAttributes};
use crate::document::Document;
use crate::index::{ChecksumIndex, IndexCell, IndexEntry};
use crate::project::Project;

/// Root of a workspace snapshot.
#[derive(Debug)]
pub struct Solution {
	attributes: Arc<SolutionAttributes>,
	projects: Vec<Arc<Project>>,
	index: IndexCell,
}

impl Solution {
	/// Creates a solution.
	pub fn new(attributes: SolutionAttributes, projects: Vec<Arc<Project>>) -> Self {
		Self::from_parts(Arc::new(attributes), projects)
	}

	fn from_parts(attributes: Arc<SolutionAttributes>, projects: Vec<Arc<Project>>) -> Self {
		Self {
			attributes,
			projects,
			index: IndexCell::default(),
		}
	}

	/// Solution metadata.
	pub fn attributes(&self) -> &SolutionAttributes {
		&self.attributes
	}

	/// Projects in order.
	pub fn projects(&self) -> &[Arc<Project>] {
		&self.projects
	}

	/// Finds a project by id.
	pub fn project(&self, id: ProjectId) -> Option<&Arc<Project>> {
		self.projects.iter().find(|project| project.id() == id)
	}

	/// Finds a document by id in any project.
	pub fn document(&self, id: DocumentId) -> Option<&Arc<Document>> {
		self.projects.iter().find_map(|project| project.document(id))
	}

	/// Returns a copy with `project` replacing the one with the same id, or
	/// appended if absent.
	pub fn with_project(&self, project: Arc<Project>) -> Self {
		let mut projects = self.projects.clone();
		match projects.iter_mut().find(|p| p.id() == project.id()) {
			Some(slot) => *slot = project,
			None => projects.push(project),
		}
		Self::from_parts(Arc::clone(&self.attributes), projects)
	}

	/// Returns a copy without the given project.
	pub fn without_project(&self, id: ProjectId) -> Self {
		let projects = self.projects.iter().filter(|p| p.id() != id).cloned().collect();
		Self::from_parts(Arc::clone(&self.attributes), projects)
	}

	/// Returns a copy where one document's text is replaced, or `None` if no
	/// project contains the document.
	///
	/// Only the owning project and the document are rebuilt; every other node
	/// is shared and keeps its materialized index.
	pub fn with_document_text(&self, id: DocumentId, text: impl Into<Arc<str>>) -> Option<Self> {
		let project = self.projects.iter().find(|project| project.document(id).is_some())?;
		let document = project.document(id)?;
		let updated = project.with_document(Arc::new(document.with_text(text)));
		Some(self.with_project(Arc::new(updated)))
	}

	/// Checksum of the whole snapshot.
	pub fn checksum(&self) -> Checksum {
		self.checksum_index().checksum()
	}

	/// Index of `{attributes, project list, projects…}`, built on first use.
	pub fn checksum_index(&self) -> Arc<ChecksumIndex> {
		self.index.get_or_publish(|| {
			let children: Vec<_> = self.projects.iter().map(|project| project.checksum_index()).collect();
			let list: ChecksumCollection = children.iter().map(|child| child.checksum()).collect();

			let mut entries = Vec::with_capacity(children.len() + 2);
			entries.push((
				self.attributes.checksum(),
				IndexEntry::Asset(AssetValue::SolutionAttributes(Arc::clone(&self.attributes))),
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
