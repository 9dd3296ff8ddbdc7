use std::fmt;
use std::path::{Path, PathBuf};

use cohost_checksum::{Checksum, ChecksumWriter};
use serde::{Deserialize, Serialize};

macro_rules! node_id {
	($(#[$meta:meta])* $name:ident, $prefix:literal) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		pub struct $name(pub u32);

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, concat!($prefix, "#{}"), self.0)
			}
		}
	};
}

node_id!(
	/// Identity of a solution across versions.
	SolutionId,
	"solution"
);
node_id!(
	/// Identity of a project across versions.
	ProjectId,
	"project"
);
node_id!(
	/// Identity of a document across versions.
	DocumentId,
	"document"
);

/// Raw path bytes, so paths that differ only in non-UTF-8 content hash apart.
fn path_bytes(path: Option<&Path>) -> Option<&[u8]> {
	path.map(|path| path.as_os_str().as_encoded_bytes())
}

/// Solution-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionAttributes {
	/// Stable solution identity.
	pub id: SolutionId,
	/// Solution file, if the workspace has one.
	pub file_path: Option<PathBuf>,
	/// Workspace version counter supplied by the host.
	pub version: u64,
}

impl SolutionAttributes {
	/// Content checksum of these attributes.
	pub fn checksum(&self) -> Checksum {
		ChecksumWriter::new(b"solution-attributes")
			.write_u64(self.id.0.into())
			.write_opt_bytes(path_bytes(self.file_path.as_deref()))
			.write_u64(self.version)
			.finish()
	}
}

/// Project-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAttributes {
	/// Stable project identity.
	pub id: ProjectId,
	/// Display name.
	pub name: String,
	/// Language name, e.g. `rust`.
	pub language: String,
	/// Project manifest, if the project is backed by one.
	pub file_path: Option<PathBuf>,
	/// Whether the project system can restore this project's dependencies.
	pub restorable: bool,
}

impl ProjectAttributes {
	/// Content checksum of these attributes.
	pub fn checksum(&self) -> Checksum {
		ChecksumWriter::new(b"project-attributes")
			.write_u64(self.id.0.into())
			.write_str(&self.name)
			.write_str(&self.language)
			.write_opt_bytes(path_bytes(self.file_path.as_deref()))
			.write_bool(self.restorable)
			.finish()
	}
}

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAttributes {
	/// Stable document identity.
	pub id: DocumentId,
	/// Display name.
	pub name: String,
	/// Backing file, if any.
	pub file_path: Option<PathBuf>,
}

impl DocumentAttributes {
	/// Content checksum of these attributes.
	pub fn checksum(&self) -> Checksum {
		ChecksumWriter::new(b"document-attributes")
			.write_u64(self.id.0.into())
			.write_str(&self.name)
			.write_opt_bytes(path_bytes(self.file_path.as_deref()))
			.finish()
	}
}
