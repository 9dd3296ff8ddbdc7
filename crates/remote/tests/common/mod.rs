//! Snapshot fixtures shared by the lease and resolve tests.

#![allow(dead_code)]

use std::sync::Arc;

use cohost_remote::{AssetStorage, CancellationToken, ScopeHandle};
use cohost_snapshot::{
	Checksum, ChecksumIndex, Document, DocumentAttributes, DocumentId, IndexEntry, Project, ProjectAttributes, ProjectId,
	Solution, SolutionAttributes, SolutionId,
};

/// Builds a solution with one project per entry of `projects`, each holding
/// one document per text.
pub fn solution(version: u64, projects: &[(&str, &[&str])]) -> Arc<Solution> {
	let mut next_document = 0;
	let projects = projects
		.iter()
		.zip(1..)
		.map(|((name, texts), id)| {
			let documents = texts
				.iter()
				.map(|text| {
					next_document += 1;
					Arc::new(Document::new(
						DocumentAttributes {
							id: DocumentId(next_document),
							name: format!("{name}-{next_document}.rs"),
							file_path: None,
						},
						*text,
					))
				})
				.collect();
			Arc::new(Project::new(
				ProjectAttributes {
					id: ProjectId(id),
					name: (*name).to_string(),
					language: "rust".into(),
					file_path: None,
					restorable: false,
				},
				documents,
			))
		})
		.collect();

	Arc::new(Solution::new(
		SolutionAttributes {
			id: SolutionId(1),
			file_path: None,
			version,
		},
		projects,
	))
}

/// Every checksum addressable in `solution`, in depth-first order.
pub fn all_checksums(solution: &Solution) -> Vec<Checksum> {
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

/// Leases `solution` from `storage`, serving it directly as the factory.
pub async fn lease(storage: &AssetStorage, solution: &Arc<Solution>) -> ScopeHandle {
	let solution = Arc::clone(solution);
	storage
		.get_or_create(solution.checksum(), &CancellationToken::new(), || async move { Ok(solution) })
		.await
		.expect("lease")
}
