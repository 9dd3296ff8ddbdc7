//! Reference-counted snapshot leases for out-of-process language services.
//!
//! # Purpose
//!
//! - Let a worker process answer requests "as of" a specific workspace snapshot
//!   without re-materializing the snapshot on every call.
//! - Share one materialization between every concurrent request addressing the
//!   same snapshot checksum, and release it as soon as the last one finishes.
//! - Resolve batches of asset checksums against a leased snapshot without
//!   walking the whole tree.
//! - Exclude transport, framing and the analysis work itself; handlers in
//!   [`handlers`] show how requests consume a lease.
//!
//! # Mental model
//!
//! - A peer sends a solution [`Checksum`](cohost_snapshot::Checksum). [`AssetStorage::get_or_create`]
//!   returns a [`ScopeHandle`] for it, building the [`Scope`] from a factory the
//!   first time the checksum is seen.
//! - Each handle is one reference. Dropping it is the release; there is no
//!   separate call to forget.
//! - A scope owns a [`ReplicationContext`] which caches encoded assets. It is
//!   created with the scope and disposed when the last handle goes away.
//! - [`Scope::resolve_many`] probes the root index, then each project subtree in
//!   order, and stops as soon as nothing is outstanding.
//!
//! # Key types
//!
//! | Type | Meaning | Constraints | Constructed / mutated in |
//! |---|---|---|---|
//! | [`AssetStorage`] | Checksum-keyed registry of live scopes | MUST hold its gate only for O(1) map updates | `AssetStorage::get_or_create`, `AssetStorage::release` |
//! | [`Scope`] | One leased snapshot | MUST NOT dispose itself; only the storage disposes it | `Scope::new`, `Scope::dispose` |
//! | [`ScopeHandle`] | One reference to a scope | MUST release exactly once, on drop | `AssetStorage::get_or_create` |
//! | [`ReplicationContext`] | Encoding cache owned by a scope | MUST be disposed exactly once | `Scope::new`, `Scope::dispose` |
//! | [`RemoteHost`] | Runs handlers against addressed snapshots | MUST map upstream failures to "no result" | `RemoteHost::run` |
//!
//! # Invariants
//!
//! 1. At most one scope MUST exist per solution checksum.
//!    - Enforced in: `AssetStorage::enter` (pending slot), `PendingGuard::publish`
//!    - Tested by: `storage::tests::test_concurrent_creation_is_single_flight`
//!    - Failure symptom: the same snapshot is materialized twice and encodings diverge between requests.
//!
//! 2. A replication context MUST be disposed exactly once, after the last release.
//!    - Enforced in: `AssetStorage::release`, `Scope::dispose`
//!    - Tested by: `storage::tests::test_second_lease_reuses_scope`, `tests/lease.rs`
//!    - Failure symptom: use of a disposed context, or unbounded memory growth in a long-running worker.
//!
//! 3. A failed or cancelled creation MUST leave no entry behind.
//!    - Enforced in: `PendingGuard::fail`, `Drop for PendingGuard`
//!    - Tested by: `storage::tests::test_factory_failure_leaves_no_entry`, `storage::tests::test_dropped_leader_future_leaves_no_entry`
//!    - Failure symptom: every later request for the checksum waits forever.
//!
//! 4. A resolve MUST return exactly one asset per distinct requested checksum.
//!    - Enforced in: `Scope::resolve_many`, `Scope::resolve_one`
//!    - Tested by: `tests/resolve.rs`
//!    - Failure symptom: a peer silently works on a partial tree.
//!
//! # Errors
//!
//! - Recoverable outcomes (cancellation, snapshot unavailable, encode failure)
//!   are [`Error`] values.
//! - A requested checksum missing from the leased snapshot is a broken
//!   client/server agreement and panics after an `error!` event.
//!
//! # Concurrency
//!
//! - Any number of tasks may resolve against one scope at once. Node indexes
//!   are published once and shared.
//! - Cancelling a resolve aborts only that search; the caller still owns its
//!   handle.

#![warn(missing_docs)]

mod config;
mod error;
pub mod handlers;
mod host;
mod pool;
mod provider;
mod replication;
mod scope;
mod storage;

pub use config::{ConfigError, LogConfig, PoolConfig, RemoteConfig, SearchConfig};
pub use error::{Error, Result};
pub use host::RemoteHost;
pub use pool::{Pool, Pooled, Recycle};
pub use provider::{InMemorySolutionProvider, SolutionProvider};
pub use replication::ReplicationContext;
pub use scope::{Scope, ScopeHandle};
pub use storage::{AssetStorage, StorageStats};
pub use tokio_util::sync::CancellationToken;
