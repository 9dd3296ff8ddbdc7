//! Cohost worker binary.
//!
//! Loads a workspace directory as a snapshot and serves it through the same
//! lease machinery a remote worker uses, reporting what a peer would see.

mod inspect;
mod loader;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cohost_remote::RemoteConfig;
use tracing::info;

/// Worker command line arguments.
#[derive(Parser, Debug)]
#[command(name = "cohost-worker")]
#[command(about = "Out-of-process snapshot host for language tooling")]
struct Args {
	/// Configuration file (TOML)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Load a workspace and report its snapshot
	Inspect {
		/// Workspace root; each subdirectory is a project
		root: PathBuf,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => RemoteConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => RemoteConfig::default(),
	};
	setup_tracing(args.verbose, &config.log.filter);

	info!("starting cohost-worker");

	match args.command {
		Command::Inspect { root } => {
			let report = inspect::run(&root, &config).await?;
			print!("{report}");
		}
	}
	Ok(())
}

fn setup_tracing(verbose: bool, filter: &str) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("cohost_remote=trace,debug")
		} else {
			EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"))
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
