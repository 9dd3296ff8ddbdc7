use std::sync::atomic::AtomicUsize;

use cohost_snapshot::{Document, DocumentAttributes, DocumentId, Project, ProjectAttributes, ProjectId, SolutionAttributes, SolutionId};
use tokio::sync::oneshot;

use super::*;

fn solution(version: u64, text: &str) -> Arc<Solution> {
	let document = Arc::new(Document::new(
		DocumentAttributes {
			id: DocumentId(1),
			name: "lib.rs".into(),
			file_path: None,
		},
		text,
	));
	let project = Arc::new(Project::new(
		ProjectAttributes {
			id: ProjectId(1),
			name: "p1".into(),
			language: "rust".into(),
			file_path: None,
			restorable: false,
		},
		vec![document],
	));
	Arc::new(Solution::new(
		SolutionAttributes {
			id: SolutionId(1),
			file_path: None,
			version,
		},
		vec![project],
	))
}

async fn lease(storage: &AssetStorage, solution: &Arc<Solution>) -> ScopeHandle {
	let solution = Arc::clone(solution);
	storage
		.get_or_create(solution.checksum(), &CancellationToken::new(), || async move { Ok(solution) })
		.await
		.unwrap()
}

#[tokio::test]
async fn test_second_lease_reuses_scope() {
	let storage = AssetStorage::default();
	let snapshot = solution(1, "x");
	let calls = AtomicUsize::new(0);
	let token = CancellationToken::new();

	let factory = || async {
		calls.fetch_add(1, Ordering::SeqCst);
		Ok(Arc::clone(&snapshot))
	};
	let first = storage.get_or_create(snapshot.checksum(), &token, factory).await.unwrap();
	let second = storage.get_or_create(snapshot.checksum(), &token, factory).await.unwrap();

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(storage.ref_count(snapshot.checksum()), 2);
	assert!(Arc::ptr_eq(first.solution(), second.solution()));

	drop(first);
	assert_eq!(storage.ref_count(snapshot.checksum()), 1);
	assert_eq!(storage.stats().scopes_disposed, 0);
	second.release();
	assert!(storage.is_empty());
	assert_eq!(
		storage.stats(),
		StorageStats {
			scopes_created: 1,
			scopes_disposed: 1,
			live_scopes: 0,
		}
	);
}

#[tokio::test]
async fn test_distinct_checksums_get_distinct_scopes() {
	let storage = AssetStorage::default();
	let a = solution(1, "x");
	let b = solution(2, "x");
	assert_ne!(a.checksum(), b.checksum());

	let ha = lease(&storage, &a).await;
	let hb = lease(&storage, &b).await;
	assert_eq!(storage.len(), 2);

	drop(ha);
	assert_eq!(storage.ref_count(a.checksum()), 0);
	assert_eq!(storage.ref_count(b.checksum()), 1);
	assert_eq!(hb.checksum(), b.checksum());
}

#[tokio::test]
async fn test_factory_failure_leaves_no_entry() {
	let storage = AssetStorage::default();
	let checksum = solution(1, "x").checksum();

	let err = storage
		.get_or_create(checksum, &CancellationToken::new(), || async move {
			Err(Error::SnapshotUnavailable(checksum))
		})
		.await
		.unwrap_err();

	assert_eq!(err, Error::SnapshotUnavailable(checksum));
	assert!(storage.is_empty());
	assert_eq!(storage.stats().scopes_created, 0);
}

#[tokio::test]
async fn test_checksum_mismatch_is_rejected() {
	let storage = AssetStorage::default();
	let requested = solution(1, "x").checksum();
	let other = solution(1, "y");

	let err = storage
		.get_or_create(requested, &CancellationToken::new(), || async move { Ok(other) })
		.await
		.unwrap_err();

	assert!(matches!(err, Error::ChecksumMismatch { expected, .. } if expected == requested));
	assert!(storage.is_empty());
}

#[tokio::test]
async fn test_cancelled_before_start_skips_factory() {
	let storage = AssetStorage::default();
	let token = CancellationToken::new();
	token.cancel();

	let err = storage
		.get_or_create(solution(1, "x").checksum(), &token, || std::future::pending::<Result<Arc<Solution>>>())
		.await
		.unwrap_err();
	assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_cancelled_factory_leaves_no_entry() {
	let storage = AssetStorage::default();
	let snapshot = solution(1, "x");
	let token = CancellationToken::new();

	let pending = {
		let storage = storage.clone();
		let token = token.clone();
		let checksum = snapshot.checksum();
		tokio::spawn(async move {
			storage
				.get_or_create(checksum, &token, || std::future::pending::<Result<Arc<Solution>>>())
				.await
		})
	};
	tokio::task::yield_now().await;
	token.cancel();

	assert_eq!(pending.await.unwrap().unwrap_err(), Error::Cancelled);
	assert!(storage.is_empty());

	let handle = lease(&storage, &snapshot).await;
	assert_eq!(storage.ref_count(handle.checksum()), 1);
}

#[tokio::test]
async fn test_dropped_leader_future_leaves_no_entry() {
	let storage = AssetStorage::default();
	let checksum = solution(1, "x").checksum();

	let token = CancellationToken::new();
	let create = storage.get_or_create(checksum, &token, || std::future::pending::<Result<Arc<Solution>>>());
	let timed_out = tokio::time::timeout(std::time::Duration::from_millis(10), create).await;
	assert!(timed_out.is_err());
	assert!(storage.is_empty());
	assert!(storage.inner.slots.lock().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creation_is_single_flight() {
	let storage = AssetStorage::default();
	let snapshot = solution(1, "x");
	let calls = Arc::new(AtomicUsize::new(0));

	let tasks: Vec<_> = (0..16)
		.map(|_| {
			let storage = storage.clone();
			let snapshot = Arc::clone(&snapshot);
			let calls = Arc::clone(&calls);
			tokio::spawn(async move {
				let checksum = snapshot.checksum();
				storage
					.get_or_create(checksum, &CancellationToken::new(), || async move {
						calls.fetch_add(1, Ordering::SeqCst);
						tokio::time::sleep(std::time::Duration::from_millis(20)).await;
						Ok(snapshot)
					})
					.await
			})
		})
		.collect();

	let mut handles = Vec::new();
	for task in tasks {
		handles.push(task.await.unwrap().unwrap());
	}

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(storage.ref_count(snapshot.checksum()), 16);

	drop(handles);
	assert_eq!(
		storage.stats(),
		StorageStats {
			scopes_created: 1,
			scopes_disposed: 1,
			live_scopes: 0,
		}
	);
}

#[tokio::test]
async fn test_waiters_share_leader_failure() {
	let storage = AssetStorage::default();
	let checksum = solution(1, "x").checksum();
	let (release_tx, release_rx) = oneshot::channel::<()>();

	let leader = {
		let storage = storage.clone();
		tokio::spawn(async move {
			storage
				.get_or_create(checksum, &CancellationToken::new(), || async move {
					let _ = release_rx.await;
					Err(Error::Upstream {
						checksum,
						reason: "aged out".into(),
					})
				})
				.await
		})
	};
	tokio::task::yield_now().await;

	let waiter_calls = Arc::new(AtomicUsize::new(0));
	let waiter = {
		let storage = storage.clone();
		let calls = Arc::clone(&waiter_calls);
		tokio::spawn(async move {
			storage
				.get_or_create(checksum, &CancellationToken::new(), || async move {
					calls.fetch_add(1, Ordering::SeqCst);
					Err(Error::SnapshotUnavailable(checksum))
				})
				.await
		})
	};
	tokio::task::yield_now().await;
	release_tx.send(()).unwrap();

	let expected = Error::Upstream {
		checksum,
		reason: "aged out".into(),
	};
	assert_eq!(leader.await.unwrap().unwrap_err(), expected);
	assert_eq!(waiter.await.unwrap().unwrap_err(), expected);
	assert_eq!(waiter_calls.load(Ordering::SeqCst), 0);
	assert!(storage.is_empty());
}

#[tokio::test]
async fn test_waiter_takes_over_after_leader_cancel() {
	let storage = AssetStorage::default();
	let snapshot = solution(1, "x");
	let checksum = snapshot.checksum();
	let leader_token = CancellationToken::new();

	let leader = {
		let storage = storage.clone();
		let token = leader_token.clone();
		tokio::spawn(async move {
			storage
				.get_or_create(checksum, &token, || std::future::pending::<Result<Arc<Solution>>>())
				.await
		})
	};
	tokio::task::yield_now().await;

	let waiter = {
		let storage = storage.clone();
		let snapshot = Arc::clone(&snapshot);
		tokio::spawn(async move {
			storage
				.get_or_create(checksum, &CancellationToken::new(), || async move { Ok(snapshot) })
				.await
		})
	};
	tokio::task::yield_now().await;
	leader_token.cancel();

	assert!(leader.await.unwrap().unwrap_err().is_cancelled());
	let handle = waiter.await.unwrap().unwrap();
	assert_eq!(storage.ref_count(checksum), 1);
	assert_eq!(handle.checksum(), checksum);
}

#[tokio::test]
async fn test_cancelled_waiter_does_not_disturb_leader() {
	let storage = AssetStorage::default();
	let snapshot = solution(1, "x");
	let checksum = snapshot.checksum();
	let (release_tx, release_rx) = oneshot::channel::<()>();

	let leader = {
		let storage = storage.clone();
		let snapshot = Arc::clone(&snapshot);
		tokio::spawn(async move {
			storage
				.get_or_create(checksum, &CancellationToken::new(), || async move {
					let _ = release_rx.await;
					Ok(snapshot)
				})
				.await
		})
	};
	tokio::task::yield_now().await;

	let waiter_token = CancellationToken::new();
	let waiter = {
		let storage = storage.clone();
		let token = waiter_token.clone();
		tokio::spawn(async move {
			storage
				.get_or_create(checksum, &token, || std::future::pending::<Result<Arc<Solution>>>())
				.await
		})
	};
	tokio::task::yield_now().await;
	waiter_token.cancel();
	assert!(waiter.await.unwrap().unwrap_err().is_cancelled());

	release_tx.send(()).unwrap();
	let handle = leader.await.unwrap().unwrap();
	assert_eq!(storage.ref_count(checksum), 1);
	drop(handle);
	assert!(storage.is_empty());
}

#[test]
#[should_panic(expected = "encode on disposed scope")]
fn test_encode_after_dispose_panics() {
	let snapshot = solution(1, "x");
	let scope = Scope::new(
		snapshot.checksum(),
		Arc::clone(&snapshot),
		Arc::new(AssetPools::new(&crate::config::PoolConfig::default())),
		SearchConfig::default(),
	);
	assert!(scope.dispose());
	assert!(!scope.dispose());

	let _ = scope.encode(&cohost_snapshot::Asset::NULL);
}
