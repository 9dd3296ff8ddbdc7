use cohost_snapshot::Checksum;

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Recoverable failures of lease acquisition and asset resolution.
///
/// Requests for checksums that are not part of a leased snapshot are not
/// represented here; they are contract violations and panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The caller cancelled the operation.
	#[error("operation cancelled")]
	Cancelled,
	/// No snapshot is retained for the requested checksum.
	#[error("no snapshot retained for solution {0}")]
	SnapshotUnavailable(Checksum),
	/// The snapshot source failed.
	#[error("snapshot source failed for solution {checksum}: {reason}")]
	Upstream {
		/// Requested solution checksum.
		checksum: Checksum,
		/// Source failure description.
		reason: String,
	},
	/// The snapshot source returned a snapshot for a different checksum.
	#[error("snapshot requested as {expected} hashes to {actual}")]
	ChecksumMismatch {
		/// Requested solution checksum.
		expected: Checksum,
		/// Checksum of the returned snapshot.
		actual: Checksum,
	},
	/// An asset could not be serialized for replication.
	#[error("failed to encode asset {checksum}: {reason}")]
	Encode {
		/// Asset checksum.
		checksum: Checksum,
		/// Encoder failure description.
		reason: String,
	},
}

impl Error {
	/// Returns true for [`Error::Cancelled`].
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}
