use std::collections::HashMap;

use bytes::Bytes;
use cohost_snapshot::{Asset, Checksum};
use parking_lot::Mutex;
use tracing::debug;

use crate::{Error, Result};

/// Serialization-side resources owned by one scope.
///
/// Caches the encoded form of every asset sent to a peer while the scope is
/// live. Created with the scope and disposed exactly once by the storage when
/// the last handle is released.
#[derive(Debug)]
pub struct ReplicationContext {
	solution: Checksum,
	encoded: Mutex<HashMap<Checksum, Bytes>>,
}

impl ReplicationContext {
	pub(crate) fn new(solution: Checksum) -> Self {
		debug!(solution = %solution, "replication.context.created");
		Self {
			solution,
			encoded: Mutex::new(HashMap::new()),
		}
	}

	/// Encodes an asset value, reusing a prior encoding of the same checksum.
	pub fn encode(&self, asset: &Asset) -> Result<Bytes> {
		if let Some(bytes) = self.encoded.lock().get(&asset.checksum()) {
			return Ok(bytes.clone());
		}

		let bytes = postcard::to_allocvec(asset.value())
			.map(Bytes::from)
			.map_err(|err| Error::Encode {
				checksum: asset.checksum(),
				reason: err.to_string(),
			})?;
		Ok(self
			.encoded
			.lock()
			.entry(asset.checksum())
			.or_insert(bytes)
			.clone())
	}

	/// Number of cached encodings.
	pub fn cached(&self) -> usize {
		self.encoded.lock().len()
	}

	pub(crate) fn dispose(self) {
		let released = self.encoded.into_inner().len();
		debug!(solution = %self.solution, released, "replication.context.disposed");
	}
}
