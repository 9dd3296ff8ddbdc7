//! Sources of solution snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cohost_snapshot::{Checksum, Solution};
use parking_lot::RwLock;
use tracing::debug;

use crate::{Error, Result};

/// Produces the solution snapshot for a checksum sent by a peer.
#[async_trait]
pub trait SolutionProvider: Send + Sync {
	/// Returns the snapshot whose checksum is `checksum`.
	///
	/// # Errors
	///
	/// Returns [`Error::SnapshotUnavailable`] when no such snapshot is
	/// retained, or [`Error::Upstream`] when it cannot be produced.
	async fn solution(&self, checksum: Checksum) -> Result<Arc<Solution>>;
}

/// Provider holding published snapshots in memory.
///
/// Snapshots stay available until [`forget`](Self::forget) is called, which
/// models a version aging out on the client side.
#[derive(Debug, Default)]
pub struct InMemorySolutionProvider {
	solutions: RwLock<HashMap<Checksum, Arc<Solution>>>,
}

impl InMemorySolutionProvider {
	/// Creates an empty provider.
	pub fn new() -> Self {
		Self::default()
	}

	/// Retains `solution` and returns its checksum.
	pub fn publish(&self, solution: Arc<Solution>) -> Checksum {
		let checksum = solution.checksum();
		self.solutions.write().insert(checksum, solution);
		debug!(checksum = %checksum, "provider.published");
		checksum
	}

	/// Drops a retained snapshot. Returns true if it was present.
	pub fn forget(&self, checksum: Checksum) -> bool {
		self.solutions.write().remove(&checksum).is_some()
	}

	/// Number of retained snapshots.
	pub fn len(&self) -> usize {
		self.solutions.read().len()
	}

	/// Returns true if nothing is retained.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[async_trait]
impl SolutionProvider for InMemorySolutionProvider {
	async fn solution(&self, checksum: Checksum) -> Result<Arc<Solution>> {
		self.solutions
			.read()
			.get(&checksum)
			.cloned()
			.ok_or(Error::SnapshotUnavailable(checksum))
	}
}
