//! Immutable workspace snapshots shared between the client and worker processes.
//!
//! # Mental model
//!
//! - A [`Solution`] is one versioned state of the workspace: a root owning an
//!   ordered list of [`Project`]s, each owning an ordered list of [`Document`]s.
//! - Nodes are never mutated. Edits build a new [`Solution`] that shares every
//!   untouched project and document with its predecessor through `Arc`.
//! - Every piece of content a peer may ask for is an [`Asset`]: a value plus the
//!   [`Checksum`] of that value.
//! - Each node can produce a [`ChecksumIndex`] mapping the checksums it owns to
//!   asset values or to the indexes of its children. The root index checksum is
//!   the snapshot's identity.
//!
//! # Invariants
//!
//! 1. Structurally equal content MUST produce equal checksums.
//!    - Enforced in: [`AssetValue::checksum`], [`ChecksumIndex::new`]
//! 2. An asset's checksum MUST be [`Checksum::NULL`] iff its value is [`AssetValue::Null`].
//!    - Enforced in: [`Asset::new`]
//! 3. A node's index MUST be published at most once; concurrent builders race to
//!    compute it and all adopt the first published value.
//!    - Enforced in: `IndexCell::get_or_publish`
//!
//! # Concurrency and ordering
//!
//! - Index materialization holds no lock. Two threads visiting a fresh node may
//!   both build its index; the results are equal by construction and only one
//!   is kept.

#![warn(missing_docs)]

mod asset;
mod attributes;
mod document;
mod index;
mod node;
mod project;
mod solution;

pub use asset::{Asset, AssetValue};
pub use attributes::{
	DocumentAttributes, DocumentId, ProjectAttributes, ProjectId, SolutionAttributes, SolutionId,
};
pub use cohost_checksum::{Checksum, ChecksumCollection};
pub use document::Document;
pub use index::{ChecksumIndex, IndexEntry};
pub use node::Node;
pub use project::Project;
pub use solution::Solution;
