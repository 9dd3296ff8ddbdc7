//! Ref-counted registry of leased snapshots.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cohost_snapshot::{Checksum, Solution};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::config::{RemoteConfig, SearchConfig};
use crate::pool::AssetPools;
use crate::scope::{Scope, ScopeHandle};
use crate::{Error, Result};

/// Outcome a creating caller publishes to callers waiting on the same checksum.
type Outcome = Option<Result<(), Error>>;

enum Slot {
	/// Creation in progress; the leader publishes through the paired sender.
	Pending(watch::Receiver<Outcome>),
	Live { scope: Arc<Scope>, ref_count: usize },
}

struct StorageInner {
	slots: Mutex<HashMap<Checksum, Slot>>,
	pools: Arc<AssetPools>,
	search: SearchConfig,
	scopes_created: AtomicU64,
	scopes_disposed: AtomicU64,
}

/// Counters describing storage activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
	/// Scopes constructed since the storage was created.
	pub scopes_created: u64,
	/// Scopes whose replication context has been disposed.
	pub scopes_disposed: u64,
	/// Scopes currently leased.
	pub live_scopes: usize,
}

/// Process-wide cache of leased snapshots keyed by solution checksum.
///
/// # Invariants
///
/// - At most one [`Scope`] exists per checksum at a time.
/// - A scope's replication context is disposed exactly once, after the last
///   [`ScopeHandle`] for it is dropped.
/// - The gate is held only to insert, remove, or adjust a count. Snapshot
///   factories and disposal run outside it.
///
/// # Concurrency
///
/// Concurrent [`get_or_create`](Self::get_or_create) calls for one checksum are
/// single-flight: the first caller leaves a pending slot and runs the factory,
/// the rest wait for it to publish. A failed leader hands its error to the
/// waiters. A cancelled leader clears the slot and the waiters retry.
#[derive(Clone)]
pub struct AssetStorage {
	inner: Arc<StorageInner>,
}

enum Enter {
	Live(ScopeHandle),
	Wait(watch::Receiver<Outcome>),
	Lead(watch::Sender<Outcome>),
}

impl AssetStorage {
	/// Creates an empty storage.
	pub fn new(config: &RemoteConfig) -> Self {
		Self {
			inner: Arc::new(StorageInner {
				slots: Mutex::new(HashMap::new()),
				pools: Arc::new(AssetPools::new(&config.pool)),
				search: config.search.clone(),
				scopes_created: AtomicU64::new(0),
				scopes_disposed: AtomicU64::new(0),
			}),
		}
	}

	/// Leases the snapshot for `checksum`, calling `factory` only if no scope
	/// for it is live or being created.
	///
	/// # Errors
	///
	/// - [`Error::Cancelled`] if `cancel` fires before a handle is obtained.
	/// - Any error returned by `factory`, also delivered to callers that were
	///   waiting on this creation.
	/// - [`Error::ChecksumMismatch`] if the produced solution does not hash to
	///   `checksum`.
	///
	/// No entry is left behind on any error path.
	pub async fn get_or_create<F, Fut>(&self, checksum: Checksum, cancel: &CancellationToken, factory: F) -> Result<ScopeHandle>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<Arc<Solution>>>,
	{
		let tx = loop {
			if cancel.is_cancelled() {
				return Err(Error::Cancelled);
			}
			match self.enter(checksum) {
				Enter::Live(handle) => return Ok(handle),
				Enter::Lead(tx) => break tx,
				Enter::Wait(mut rx) => {
					let outcome = tokio::select! {
						biased;
						_ = cancel.cancelled() => return Err(Error::Cancelled),
						published = rx.wait_for(Option::is_some) => published.ok().and_then(|value| (*value).clone()),
					};
					match outcome {
						Some(Err(err)) => return Err(err),
						// Live now, or the leader went away. Either way re-enter.
						Some(Ok(())) | None => {
							trace!(checksum = %checksum, "storage.wait.retry");
						}
					}
				}
			}
		};

		let guard = PendingGuard {
			inner: &self.inner,
			checksum,
			tx: Some(tx),
		};

		let created = tokio::select! {
			biased;
			_ = cancel.cancelled() => Err(Error::Cancelled),
			solution = factory() => solution,
		};
		let solution = match created {
			Ok(solution) if solution.checksum() == checksum => solution,
			Ok(solution) => {
				let err = Error::ChecksumMismatch {
					expected: checksum,
					actual: solution.checksum(),
				};
				guard.fail(err.clone());
				return Err(err);
			}
			Err(Error::Cancelled) => return Err(Error::Cancelled),
			Err(err) => {
				guard.fail(err.clone());
				return Err(err);
			}
		};

		let scope = Arc::new(Scope::new(
			checksum,
			solution,
			Arc::clone(&self.inner.pools),
			self.inner.search.clone(),
		));
		self.inner.scopes_created.fetch_add(1, Ordering::Relaxed);
		guard.publish(Arc::clone(&scope));
		debug!(checksum = %checksum, ref_count = 1, "storage.scope.created");
		Ok(ScopeHandle::new(self.clone(), scope))
	}

	fn enter(&self, checksum: Checksum) -> Enter {
		let mut slots = self.inner.slots.lock();
		match slots.get_mut(&checksum) {
			Some(Slot::Live { scope, ref_count }) => {
				*ref_count += 1;
				trace!(checksum = %checksum, ref_count = *ref_count, "storage.scope.acquired");
				Enter::Live(ScopeHandle::new(self.clone(), Arc::clone(scope)))
			}
			Some(Slot::Pending(rx)) => Enter::Wait(rx.clone()),
			None => {
				let (tx, rx) = watch::channel(None);
				slots.insert(checksum, Slot::Pending(rx));
				Enter::Lead(tx)
			}
		}
	}

	/// Drops one reference to `scope`, disposing it if it was the last.
	pub(crate) fn release(&self, scope: &Arc<Scope>) {
		let checksum = scope.checksum();
		let disposed = {
			let mut slots = self.inner.slots.lock();
			match slots.get_mut(&checksum) {
				Some(Slot::Live { scope: live, ref_count }) if Arc::ptr_eq(live, scope) => {
					*ref_count -= 1;
					trace!(checksum = %checksum, ref_count = *ref_count, "storage.scope.released");
					if *ref_count == 0 {
						slots.remove(&checksum);
						true
					} else {
						false
					}
				}
				_ => {
					error!(checksum = %checksum, "storage.release.unknown_scope");
					debug_assert!(false, "released scope {checksum} is not live");
					false
				}
			}
		};

		if disposed && scope.dispose() {
			self.inner.scopes_disposed.fetch_add(1, Ordering::Relaxed);
			debug!(checksum = %checksum, "storage.scope.disposed");
		}
	}

	/// Reference count of the live scope for `checksum`, or 0.
	pub fn ref_count(&self, checksum: Checksum) -> usize {
		match self.inner.slots.lock().get(&checksum) {
			Some(Slot::Live { ref_count, .. }) => *ref_count,
			_ => 0,
		}
	}

	/// Number of live scopes.
	pub fn len(&self) -> usize {
		self.inner
			.slots
			.lock()
			.values()
			.filter(|slot| matches!(slot, Slot::Live { .. }))
			.count()
	}

	/// Returns true if no scope is live.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Snapshot of the storage counters.
	pub fn stats(&self) -> StorageStats {
		StorageStats {
			scopes_created: self.inner.scopes_created.load(Ordering::Relaxed),
			scopes_disposed: self.inner.scopes_disposed.load(Ordering::Relaxed),
			live_scopes: self.len(),
		}
	}
}

impl Default for AssetStorage {
	fn default() -> Self {
		Self::new(&RemoteConfig::default())
	}
}

impl std::fmt::Debug for AssetStorage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AssetStorage").field("stats", &self.stats()).finish()
	}
}

/// Owns a pending slot for the duration of a factory call.
///
/// Dropping it without publishing removes the slot and closes the channel, so
/// waiters retry instead of hanging.
struct PendingGuard<'a> {
	inner: &'a StorageInner,
	checksum: Checksum,
	tx: Option<watch::Sender<Outcome>>,
}

impl PendingGuard<'_> {
	fn publish(mut self, scope: Arc<Scope>) {
		self.inner
			.slots
			.lock()
			.insert(self.checksum, Slot::Live { scope, ref_count: 1 });
		if let Some(tx) = self.tx.take() {
			tx.send_replace(Some(Ok(())));
		}
	}

	fn fail(mut self, err: Error) {
		self.inner.slots.lock().remove(&self.checksum);
		debug!(checksum = %self.checksum, error = %err, "storage.scope.create_failed");
		if let Some(tx) = self.tx.take() {
			tx.send_replace(Some(Err(err)));
		}
	}
}

impl Drop for PendingGuard<'_> {
	fn drop(&mut self) {
		if let Some(tx) = self.tx.take() {
			self.inner.slots.lock().remove(&self.checksum);
			drop(tx);
			trace!(checksum = %self.checksum, "storage.scope.create_abandoned");
		}
	}
}

#[cfg(test)]
mod tests;
