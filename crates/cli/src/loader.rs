//! Builds a solution snapshot from a directory tree.
//!
//! Every immediate subdirectory of the root is a project. Files under a
//! project, filtered through ignore files, become its documents. A project is
//! restorable when it carries a recognized manifest.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cohost_snapshot::{
	Document, DocumentAttributes, DocumentId, Project, ProjectAttributes, ProjectId, Solution, SolutionAttributes,
	SolutionId,
};
use ignore::WalkBuilder;
use tracing::{debug, warn};

/// Manifest file names and the language they imply.
const MANIFESTS: &[(&str, &str)] = &[
	("Cargo.toml", "rust"),
	("package.json", "javascript"),
	("pyproject.toml", "python"),
];

/// Errors raised while loading a workspace.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
	/// The root is missing or not a directory.
	#[error("{} is not a directory", .0.display())]
	NotADirectory(PathBuf),
	/// A directory or file could not be read.
	#[error("failed to read {}: {source}", path.display())]
	Io {
		/// Path that failed.
		path: PathBuf,
		/// Underlying I/O error.
		#[source]
		source: io::Error,
	},
}

/// Loads the workspace at `root`.
pub fn load_solution(root: &Path) -> Result<Solution, LoadError> {
	if !root.is_dir() {
		return Err(LoadError::NotADirectory(root.to_path_buf()));
	}

	let mut project_dirs = Vec::new();
	for entry in read_dir(root)? {
		let entry = entry.map_err(|source| io_error(root, source))?;
		let path = entry.path();
		if path.is_dir() && !is_hidden(&path) {
			project_dirs.push(path);
		}
	}
	project_dirs.sort();

	let mut next_document = 0;
	let projects = project_dirs
		.iter()
		.zip(1..)
		.map(|(dir, id)| load_project(dir, ProjectId(id), &mut next_document).map(Arc::new))
		.collect::<Result<Vec<_>, _>>()?;

	debug!(root = %root.display(), projects = projects.len(), "loader.solution");
	Ok(Solution::new(
		SolutionAttributes {
			id: SolutionId(1),
			file_path: Some(root.to_path_buf()),
			version: 0,
		},
		projects,
	))
}

fn load_project(dir: &Path, id: ProjectId, next_document: &mut u32) -> Result<Project, LoadError> {
	let name = dir
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_default();
	let manifest = find_manifest(dir)?;

	let walker = WalkBuilder::new(dir)
		.standard_filters(true)
		.require_git(false)
		.follow_links(false)
		.sort_by_file_name(|a, b| a.cmp(b))
		.build();

	let mut documents = Vec::new();
	for entry in walker {
		let entry = match entry {
			Ok(entry) => entry,
			Err(err) => {
				warn!(project = %name, error = %err, "loader.walk_error");
				continue;
			}
		};
		if !entry.file_type().is_some_and(|file_type| file_type.is_file()) {
			continue;
		}

		let path = entry.into_path();
		let text = match std::fs::read_to_string(&path) {
			Ok(text) => text,
			Err(err) if err.kind() == io::ErrorKind::InvalidData => {
				debug!(path = %path.display(), "loader.skip_binary");
				continue;
			}
			Err(source) => return Err(io_error(&path, source)),
		};

		*next_document += 1;
		let relative = path.strip_prefix(dir).unwrap_or(&path);
		documents.push(Arc::new(Document::new(
			DocumentAttributes {
				id: DocumentId(*next_document),
				name: relative.to_string_lossy().into_owned(),
				file_path: Some(path.clone()),
			},
			text,
		)));
	}

	let (file_path, language) = match manifest {
		Some((path, language)) => (Some(path), language),
		None => (None, "unknown"),
	};
	debug!(project = %name, documents = documents.len(), restorable = file_path.is_some(), "loader.project");

	Ok(Project::new(
		ProjectAttributes {
			id,
			name,
			language: language.into(),
			restorable: file_path.is_some(),
			file_path,
		},
		documents,
	))
}

/// First manifest found directly in `dir`, with its language.
fn find_manifest(dir: &Path) -> Result<Option<(PathBuf, &'static str)>, LoadError> {
	for &(file_name, language) in MANIFESTS {
		let path = dir.join(file_name);
		if path.is_file() {
			return Ok(Some((path, language)));
		}
	}

	let mut csproj = Vec::new();
	for entry in read_dir(dir)? {
		let path = entry.map_err(|source| io_error(dir, source))?.path();
		if path.is_file() && path.extension().is_some_and(|ext| ext == "csproj") {
			csproj.push(path);
		}
	}
	csproj.sort();
	Ok(csproj.into_iter().next().map(|path| (path, "csharp")))
}

fn read_dir(dir: &Path) -> Result<std::fs::ReadDir, LoadError> {
	std::fs::read_dir(dir).map_err(|source| io_error(dir, source))
}

fn io_error(path: &Path, source: io::Error) -> LoadError {
	LoadError::Io {
		path: path.to_path_buf(),
		source,
	}
}

fn is_hidden(path: &Path) -> bool {
	path.file_name()
		.and_then(|name| name.to_str())
		.is_some_and(|name| name.starts_with('.'))
}
