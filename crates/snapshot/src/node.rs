use std::sync::Arc;

use cohost_checksum::Checksum;

use crate::document::Document;
use crate::index::ChecksumIndex;
use crate::project::Project;
use crate::solution::Solution;

/// Uniform view over the three node shapes of a snapshot.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
	/// The root.
	Solution(&'a Solution),
	/// A sub-tree.
	Project(&'a Project),
	/// A leaf item.
	Document(&'a Document),
}

impl<'a> Node<'a> {
	/// Checksum of the node.
	pub fn checksum(self) -> Checksum {
		self.checksum_index().checksum()
	}

	/// The node's memoized index.
	pub fn checksum_index(self) -> Arc<ChecksumIndex> {
		match self {
			Self::Solution(solution) => solution.checksum_index(),
			Self::Project(project) => project.checksum_index(),
			Self::Document(document) => document.checksum_index(),
		}
	}

	/// Direct children in order.
	pub fn children(self) -> Vec<Node<'a>> {
		match self {
			Self::Solution(solution) => solution.projects().iter().map(|p| Node::Project(p)).collect(),
			Self::Project(project) => project.documents().iter().map(|d| Node::Document(d)).collect(),
			Self::Document(_) => Vec::new(),
		}
	}

	/// Short name of the node shape, for logs.
	pub fn kind(self) -> &'static str {
		match self {
			Self::Solution(_) => "solution",
			Self::Project(_) => "project",
			Self::Document(_) => "document",
		}
	}
}

impl<'a> From<&'a Solution> for Node<'a> {
	fn from(solution: &'a Solution) -> Self {
		Self::Solution(solution)
	}
}
