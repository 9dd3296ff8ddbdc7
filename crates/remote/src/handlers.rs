//! Request handlers that consume a leased snapshot.

use std::collections::HashSet;
use std::ops::Range;

use bytes::Bytes;
use cohost_snapshot::{Checksum, DocumentId, Solution};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::Result;
use crate::host::RemoteHost;
use crate::scope::Scope;

/// Method name of the restorable projects request.
pub const RESTORABLE_PROJECTS_METHOD: &str = "workspace/_cohost_restorableProjects";
/// Method name of the asset synchronization request.
pub const GET_ASSETS_METHOD: &str = "cohost/getAssets";
/// Method name of the document text range request.
pub const DOCUMENT_TEXT_RANGE_METHOD: &str = "cohost/documentTextRange";

/// An asset serialized for a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAsset {
	/// Checksum the peer asked for.
	pub checksum: Checksum,
	/// Serialized asset value.
	pub bytes: Bytes,
}

/// Project file paths a client can restore.
///
/// Projects without a file path or not marked restorable are skipped. Several
/// projects may share one file (multi-targeting); each path is listed once.
/// The result is ordered case-insensitively so clients see a stable list.
pub fn restorable_projects(solution: &Solution) -> Vec<String> {
	let mut seen = HashSet::new();
	let mut paths: Vec<String> = solution
		.projects()
		.iter()
		.filter(|project| project.attributes().restorable)
		.filter_map(|project| project.attributes().file_path.as_ref())
		.map(|path| path.display().to_string())
		.filter(|path| seen.insert(path.clone()))
		.collect();
	paths.sort_by_cached_key(|path| path.to_lowercase());
	paths
}

/// Resolves and encodes the requested assets, in request order with
/// duplicates removed.
///
/// # Errors
///
/// Returns [`crate::Error::Cancelled`] if `cancel` fires, or an encoding error.
///
/// # Panics
///
/// Panics if a checksum is not part of the scope's snapshot.
pub async fn get_assets(scope: &Scope, checksums: &[Checksum], cancel: &CancellationToken) -> Result<Vec<EncodedAsset>> {
	let assets = scope.resolve_many(checksums, cancel).await?;

	let mut emitted = HashSet::with_capacity(assets.len());
	let mut encoded = Vec::with_capacity(assets.len());
	for checksum in checksums {
		if !emitted.insert(*checksum) {
			continue;
		}
		// resolve_many returns every requested checksum or panics.
		encoded.push(EncodedAsset {
			checksum: *checksum,
			bytes: scope.encode(&assets[checksum])?,
		});
	}
	Ok(encoded)
}

/// Text of lines `lines` of a document, including line terminators.
///
/// Returns `None` when the document is not in the solution or the range
/// reaches past its last line.
pub fn document_text_range(solution: &Solution, document: DocumentId, lines: Range<usize>) -> Option<String> {
	let text = solution.document(document)?.text();
	if lines.start > lines.end {
		return None;
	}

	let mut all = text.split_inclusive('\n');
	let mut selected = String::new();
	for _ in 0..lines.start {
		all.next()?;
	}
	for _ in lines {
		selected.push_str(all.next()?);
	}
	Some(selected)
}

/// Serves [`RESTORABLE_PROJECTS_METHOD`] against the addressed snapshot.
///
/// # Errors
///
/// Returns [`crate::Error::Cancelled`] if `cancel` fires while leasing.
pub async fn handle_restorable_projects(
	host: &RemoteHost,
	checksum: Checksum,
	cancel: &CancellationToken,
) -> Result<Option<Vec<String>>> {
	trace!(method = RESTORABLE_PROJECTS_METHOD, checksum = %checksum, "handler.request");
	host.run(checksum, cancel, |scope| async move { Ok(restorable_projects(scope.solution())) })
		.await
}

/// Serves [`GET_ASSETS_METHOD`] against the addressed snapshot.
///
/// # Errors
///
/// See [`get_assets`].
pub async fn handle_get_assets(
	host: &RemoteHost,
	checksum: Checksum,
	checksums: &[Checksum],
	cancel: &CancellationToken,
) -> Result<Option<Vec<EncodedAsset>>> {
	trace!(method = GET_ASSETS_METHOD, checksum = %checksum, requested = checksums.len(), "handler.request");
	host.run(checksum, cancel, |scope| async move { get_assets(&scope, checksums, cancel).await })
		.await
}

/// Serves [`DOCUMENT_TEXT_RANGE_METHOD`] against the addressed snapshot.
///
/// # Errors
///
/// Returns [`crate::Error::Cancelled`] if `cancel` fires while leasing.
pub async fn handle_document_text_range(
	host: &RemoteHost,
	checksum: Checksum,
	document: DocumentId,
	lines: Range<usize>,
	cancel: &CancellationToken,
) -> Result<Option<String>> {
	trace!(method = DOCUMENT_TEXT_RANGE_METHOD, checksum = %checksum, %document, "handler.request");
	let text = host
		.run(checksum, cancel, |scope| async move {
			Ok(document_text_range(scope.solution(), document, lines))
		})
		.await?;
	Ok(text.flatten())
}
