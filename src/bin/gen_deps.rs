//! Print the internal import graph of a Python project as JSON.
//!
//! ```text
//! gen-deps <project_path> <package_name> [-g <group_file>]
//! ```
//!
//! The group file lists extra module prefixes to treat as internal, one
//! per line.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use clap::Parser;
use doppelganger::deps::{DependencyGraph, DepsError};

#[derive(Debug, thiserror::Error)]
enum GenDepsError {
    #[error("failed to read group file {path}: {source}")]
    GroupFile { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Deps(#[from] DepsError),
}

#[derive(Parser, Debug)]
#[command(name = "gen-deps", about = "Generate the internal import graph of a Python project")]
struct Cli {
    /// Root of the project.
    project_path: PathBuf,

    /// Package directory to scan, relative to the root. Empty scans the
    /// whole root.
    package_name: String,

    /// File of additional internal module prefixes, one per line.
    #[arg(short = 'g', long = "group")]
    group: Option<PathBuf>,
}

fn main() -> Result<(), GenDepsError> {
    let cli = Cli::parse();
    let groups = match &cli.group {
        Some(path) => read_groups(path)?,
        None => BTreeSet::new(),
    };
    let graph = DependencyGraph::build(&cli.project_path, &cli.package_name, &groups)?;
    println!("{}", graph.to_json());
    Ok(())
}

fn read_groups(path: &Path) -> Result<BTreeSet<String>, GenDepsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| GenDepsError::GroupFile { path: path.to_path_buf(), source })?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
