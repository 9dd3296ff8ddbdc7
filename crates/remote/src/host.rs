//! Request runner binding handlers to leased snapshots.

use std::future::Future;
use std::sync::Arc;

use cohost_snapshot::Checksum;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::provider::SolutionProvider;
use crate::scope::ScopeHandle;
use crate::storage::AssetStorage;
use crate::{Error, Result};

/// Runs request handlers against the snapshot a peer addressed.
///
/// Each call leases the snapshot for the duration of the handler only; the
/// handle moves into the handler and is released on every exit path.
#[derive(Clone)]
pub struct RemoteHost {
	storage: AssetStorage,
	provider: Arc<dyn SolutionProvider>,
}

impl RemoteHost {
	/// Creates a host over `storage`, fetching missing snapshots from `provider`.
	pub fn new(storage: AssetStorage, provider: Arc<dyn SolutionProvider>) -> Self {
		Self { storage, provider }
	}

	/// The storage leases are taken from.
	pub fn storage(&self) -> &AssetStorage {
		&self.storage
	}

	/// Leases `checksum` and runs `handler` with the lease.
	///
	/// Returns `Ok(None)` when the snapshot cannot be obtained: it was never
	/// published, has aged out, or the provider failed.
	///
	/// # Errors
	///
	/// Returns [`Error::Cancelled`] if `cancel` fires while leasing, and any
	/// error `handler` returns.
	pub async fn run<F, Fut, T>(&self, checksum: Checksum, cancel: &CancellationToken, handler: F) -> Result<Option<T>>
	where
		F: FnOnce(ScopeHandle) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let provider = Arc::clone(&self.provider);
		let leased = self
			.storage
			.get_or_create(checksum, cancel, || async move { provider.solution(checksum).await })
			.await;

		let scope = match leased {
			Ok(scope) => scope,
			Err(Error::Cancelled) => {
				trace!(checksum = %checksum, "host.run.cancelled");
				return Err(Error::Cancelled);
			}
			Err(err) => {
				warn!(checksum = %checksum, error = %err, "host.run.snapshot_unavailable");
				return Ok(None);
			}
		};

		handler(scope).await.map(Some)
	}
}

impl std::fmt::Debug for RemoteHost {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RemoteHost")
			.field("storage", &self.storage)
			.finish_non_exhaustive()
	}
}
