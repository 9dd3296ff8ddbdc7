//! `inspect` subcommand.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use cohost_remote::handlers::handle_restorable_projects;
use cohost_remote::{
	AssetStorage, CancellationToken, InMemorySolutionProvider, RemoteConfig, RemoteHost, StorageStats,
};
use cohost_snapshot::{Checksum, ChecksumIndex, IndexEntry, Solution};
use tracing::debug;

use crate::loader;

/// What a peer would see of a loaded workspace.
#[derive(Debug)]
pub struct Report {
	pub checksum: Checksum,
	pub projects: usize,
	pub documents: usize,
	pub restorable: Vec<String>,
	/// Resolved asset count per value kind.
	pub assets: BTreeMap<&'static str, usize>,
	pub stats: StorageStats,
}

/// Loads `root`, leases it through a [`RemoteHost`] and resolves every asset.
pub async fn run(root: &Path, config: &RemoteConfig) -> anyhow::Result<Report> {
	let solution = Arc::new(loader::load_solution(root).with_context(|| format!("loading {}", root.display()))?);
	let documents = solution.projects().iter().map(|project| project.documents().len()).sum();

	let provider = Arc::new(InMemorySolutionProvider::new());
	let checksum = provider.publish(Arc::clone(&solution));
	let storage = AssetStorage::new(config);
	let host = RemoteHost::new(storage.clone(), provider);
	let cancel = CancellationToken::new();

	let restorable = handle_restorable_projects(&host, checksum, &cancel)
		.await?
		.context("snapshot disappeared before restorable projects were listed")?;

	let requested = addressable_checksums(&solution);
	let search = &cancel;
	let assets = host
		.run(checksum, &cancel, |scope| async move {
			let assets = scope.resolve_many(&requested, search).await?;
			let mut kinds = BTreeMap::new();
			for asset in assets.values() {
				*kinds.entry(asset.value().kind()).or_insert(0) += 1;
			}
			Ok(kinds)
		})
		.await?
		.context("snapshot disappeared before assets were resolved")?;
	debug!(checksum = %checksum, kinds = assets.len(), "inspect.resolved");

	Ok(Report {
		checksum,
		projects: solution.projects().len(),
		documents,
		restorable,
		assets,
		stats: storage.stats(),
	})
}

/// Every checksum reachable from the root index, root first.
fn addressable_checksums(solution: &Solution) -> Vec<Checksum> {
	fn walk(index: &ChecksumIndex, out: &mut Vec<Checksum>) {
		out.push(index.checksum());
		for checksum in index.summary().iter() {
			match index.get(checksum) {
				Some(IndexEntry::Child(child)) => walk(child, out),
				_ => out.push(*checksum),
			}
		}
	}

	let mut out = Vec::new();
	walk(&solution.checksum_index(), &mut out);
	out
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "solution  {}", self.checksum)?;
		writeln!(f, "projects  {}", self.projects)?;
		writeln!(f, "documents {}", self.documents)?;
		writeln!(f, "restorable projects:")?;
		for path in &self.restorable {
			writeln!(f, "  {path}")?;
		}
		writeln!(f, "assets:")?;
		for (kind, count) in &self.assets {
			writeln!(f, "  {kind:<20} {count}")?;
		}
		writeln!(
			f,
			"scopes created {} disposed {} live {}",
			self.stats.scopes_created, self.stats.scopes_disposed, self.stats.live_scopes
		)
	}
}
