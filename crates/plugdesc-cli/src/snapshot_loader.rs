//! Loading declaration snapshots written by the host build
//!
//! Each input is a JSON snapshot file, a directory searched recursively for
//! `*.json` snapshots, or `-` for stdin. Everything is concatenated into one
//! snapshot in argument order; files inside a directory are taken in path
//! order so repeated runs see the same declaration order.

use anyhow::{bail, Context, Result};
use plugdesc_logger as logger;
use plugdesc_manifest::DeclarationSnapshot;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Load and concatenate every snapshot named by `inputs`
pub fn load_snapshots(inputs: &[PathBuf]) -> Result<DeclarationSnapshot> {
    let mut snapshot = DeclarationSnapshot::default();

    for input in inputs {
        if input.as_os_str() == "-" {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read declaration snapshot from stdin")?;
            snapshot.append(parse_snapshot(&content, Path::new("<stdin>"))?);
        } else if input.is_dir() {
            for file in snapshot_files(input)? {
                snapshot.append(read_snapshot(&file)?);
            }
        } else if input.is_file() {
            snapshot.append(read_snapshot(input)?);
        } else {
            bail!("Declaration snapshot not found: {}", input.display());
        }
    }

    logger::debug(&format!(
        "Loaded {} declarations from {} input(s)",
        snapshot.len(),
        inputs.len()
    ));
    Ok(snapshot)
}

/// `*.json` files under `dir`, sorted by path
fn snapshot_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry =
            entry.with_context(|| format!("Failed to walk snapshot directory {}", dir.display()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn read_snapshot(path: &Path) -> Result<DeclarationSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read declaration snapshot {}", path.display()))?;
    parse_snapshot(&content, path)
}

fn parse_snapshot(content: &str, origin: &Path) -> Result<DeclarationSnapshot> {
    let snapshot = DeclarationSnapshot::from_json_str(content)
        .with_context(|| format!("Invalid declaration snapshot {}", origin.display()))?;
    logger::step(&format!(
        "{}: {} declarations",
        origin.display(),
        snapshot.len()
    ));
    Ok(snapshot)
}
