//! Leased snapshots and asset resolution.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use bytes::Bytes;
use cohost_snapshot::{Asset, AssetValue, Checksum, Node, Solution};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace};

use crate::config::SearchConfig;
use crate::pool::AssetPools;
use crate::replication::ReplicationContext;
use crate::storage::AssetStorage;
use crate::{Error, Result};

/// One leased snapshot: a solution pinned by its checksum together with the
/// replication resources serving it.
///
/// Scopes are created and destroyed by [`AssetStorage`]; callers only see
/// them through a [`ScopeHandle`].
pub struct Scope {
	checksum: Checksum,
	solution: Arc<Solution>,
	replication: RwLock<Option<ReplicationContext>>,
	pools: Arc<AssetPools>,
	search: SearchConfig,
}

impl Scope {
	pub(crate) fn new(checksum: Checksum, solution: Arc<Solution>, pools: Arc<AssetPools>, search: SearchConfig) -> Self {
		Self {
			checksum,
			solution,
			replication: RwLock::new(Some(ReplicationContext::new(checksum))),
			pools,
			search,
		}
	}

	/// Checksum of the leased solution.
	pub fn checksum(&self) -> Checksum {
		self.checksum
	}

	/// The leased solution.
	pub fn solution(&self) -> &Arc<Solution> {
		&self.solution
	}

	/// Resolves every requested checksum to its asset.
	///
	/// [`Checksum::NULL`] resolves to [`Asset::NULL`] without touching the
	/// snapshot. Duplicate requests collapse to one entry.
	///
	/// # Errors
	///
	/// Returns [`Error::Cancelled`] if `cancel` fires before the search or
	/// between projects.
	///
	/// # Panics
	///
	/// Panics if any requested checksum is not part of the leased snapshot.
	pub async fn resolve_many(&self, checksums: &[Checksum], cancel: &CancellationToken) -> Result<HashMap<Checksum, Asset>> {
		if cancel.is_cancelled() {
			return Err(Error::Cancelled);
		}

		let mut remaining = self.pools.checksum_sets.get();
		remaining.extend(checksums.iter().copied());
		let requested = remaining.len();

		let mut assets = HashMap::with_capacity(requested);
		if remaining.remove(&Checksum::NULL) {
			assets.insert(Checksum::NULL, Asset::NULL);
		}

		let mut found = self.pools.value_maps.get();
		if !remaining.is_empty() {
			self.find_assets(&mut remaining, &mut found, cancel).await?;
		}

		assets.extend(found.drain().map(|(checksum, value)| (checksum, Asset::new(checksum, value))));
		if assets.len() != requested {
			self.missing_assets(&remaining, requested, assets.len());
		}
		debug_assert!(remaining.is_empty());

		trace!(solution = %self.checksum, requested, "scope.resolve_many");
		Ok(assets)
	}

	/// Resolves a single checksum.
	///
	/// # Errors
	///
	/// Returns [`Error::Cancelled`] if `cancel` fires before or during the search.
	///
	/// # Panics
	///
	/// Panics if the checksum is not part of the leased snapshot.
	pub async fn resolve_one(&self, checksum: Checksum, cancel: &CancellationToken) -> Result<Asset> {
		if checksum.is_null() {
			return Ok(Asset::NULL);
		}
		if cancel.is_cancelled() {
			return Err(Error::Cancelled);
		}

		let mut remaining = self.pools.checksum_sets.get();
		remaining.insert(checksum);
		let mut found = self.pools.value_maps.get();
		self.find_assets(&mut remaining, &mut found, cancel).await?;

		if found.len() != 1 {
			self.missing_assets(&remaining, 1, found.len());
		}
		let Some(value) = found.remove(&checksum) else {
			self.missing_assets(&remaining, 1, 0);
		};
		Ok(Asset::new(checksum, value))
	}

	/// Encodes an asset through this scope's replication context.
	///
	/// # Panics
	///
	/// Panics if the scope was already disposed. A live [`ScopeHandle`] keeps
	/// its scope undisposed, so this only fires on a broken release protocol.
	pub fn encode(&self, asset: &Asset) -> Result<Bytes> {
		match self.replication.read().as_ref() {
			Some(context) => context.encode(asset),
			None => {
				error!(solution = %self.checksum, "scope.encode_after_dispose");
				panic!("encode on disposed scope {}", self.checksum);
			}
		}
	}

	/// Number of encodings cached by the replication context.
	pub fn cached_encodings(&self) -> usize {
		self.replication.read().as_ref().map_or(0, ReplicationContext::cached)
	}

	/// Drops the replication context. Returns false if it was already gone.
	pub(crate) fn dispose(&self) -> bool {
		match self.replication.write().take() {
			Some(context) => {
				context.dispose();
				true
			}
			None => false,
		}
	}

	/// Searches the root index, then each project in order while anything is
	/// outstanding.
	async fn find_assets(
		&self,
		remaining: &mut HashSet<Checksum>,
		found: &mut HashMap<Checksum, AssetValue>,
		cancel: &CancellationToken,
	) -> Result<()> {
		let root = Node::from(self.solution.as_ref());
		root.checksum_index().probe(remaining, found);

		for project in root.children() {
			if remaining.is_empty() {
				break;
			}
			if cancel.is_cancelled() {
				return Err(Error::Cancelled);
			}
			project.checksum_index().find(remaining, found);
			if self.search.yield_between_subtrees {
				tokio::task::yield_now().await;
			}
		}
		Ok(())
	}

	#[cold]
	fn missing_assets(&self, remaining: &HashSet<Checksum>, requested: usize, resolved: usize) -> ! {
		let missing: Vec<String> = remaining.iter().take(8).map(Checksum::to_string).collect();
		error!(
			solution = %self.checksum,
			requested,
			resolved,
			?missing,
			"scope.assets_not_in_snapshot"
		);
		panic!(
			"solution {} resolved {resolved} of {requested} requested assets; missing {missing:?}",
			self.checksum
		);
	}
}

impl fmt::Debug for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Scope")
			.field("checksum", &self.checksum)
			.field("disposed", &self.replication.read().is_none())
			.finish_non_exhaustive()
	}
}

/// One reference to a leased [`Scope`].
///
/// Dropping the handle releases the reference through the owning storage on
/// every exit path, including errors and cancelled futures.
pub struct ScopeHandle {
	storage: AssetStorage,
	scope: Arc<Scope>,
}

impl ScopeHandle {
	pub(crate) fn new(storage: AssetStorage, scope: Arc<Scope>) -> Self {
		Self { storage, scope }
	}

	/// Releases this reference now.
	pub fn release(self) {}
}

impl Deref for ScopeHandle {
	type Target = Scope;

	fn deref(&self) -> &Scope {
		&self.scope
	}
}

impl Drop for ScopeHandle {
	fn drop(&mut self) {
		self.storage.release(&self.scope);
	}
}

impl fmt::Debug for ScopeHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ScopeHandle").field(&self.scope).finish()
	}
}
