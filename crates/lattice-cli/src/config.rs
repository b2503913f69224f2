//! Project loading: the `lattice.json` manifest and the unit files under it.

use anyhow::{Context, Result, bail};
use lattice_checker::{DriverOptions, ModuleSource, UnitSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "lattice.json";
pub const UNIT_FILE_SUFFIX: &str = ".unit.json";

/// The project manifest.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub modules: Vec<ModuleSource>,
    pub options: DriverOptions,
}

/// A unit file holds one unit or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum UnitFile {
    One(UnitSource),
    Many(Vec<UnitSource>),
}

#[derive(Debug)]
pub struct LoadedProject {
    pub root: PathBuf,
    pub manifest: Manifest,
    pub units: Vec<UnitSource>,
    /// Unit files in the order they were read.
    pub files: Vec<PathBuf>,
}

/// Load the project at `path`, which is either the project directory or
/// its manifest. A directory without a manifest uses the default one.
pub fn load_project(path: &Path) -> Result<LoadedProject> {
    let (root, manifest_path) = if path.is_dir() {
        (path.to_path_buf(), path.join(MANIFEST_FILE))
    } else if path.is_file() {
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (root, path.to_path_buf())
    } else {
        bail!("project not found: {}", path.display());
    };

    let manifest = if manifest_path.is_file() {
        load_manifest(&manifest_path)?
    } else {
        debug!(root = %root.display(), "no manifest, using defaults");
        Manifest::default()
    };

    let mut units = Vec::new();
    let mut files = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("failed to read project directory {}", root.display()))?;
        let is_unit_file = entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(UNIT_FILE_SUFFIX));
        if !is_unit_file {
            continue;
        }
        let file = entry.path();
        let relative = file.strip_prefix(&root).unwrap_or(file);
        for mut unit in load_unit_file(file)? {
            if unit.module.is_none() {
                unit.module = module_for(&manifest.modules, relative);
            }
            units.push(unit);
        }
        files.push(file.to_path_buf());
    }
    debug!(units = units.len(), files = files.len(), "project loaded");

    Ok(LoadedProject {
        root,
        manifest,
        units,
        files,
    })
}

pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse manifest: {}", path.display()))
}

fn load_unit_file(path: &Path) -> Result<Vec<UnitSource>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read unit file: {}", path.display()))?;
    let file: UnitFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse unit file: {}", path.display()))?;
    Ok(match file {
        UnitFile::One(unit) => vec![unit],
        UnitFile::Many(units) => units,
    })
}

/// The module whose `root` directory contains `relative`, deepest root
/// first.
fn module_for(modules: &[ModuleSource], relative: &Path) -> Option<String> {
    modules
        .iter()
        .filter_map(|module| {
            let root = module.root.as_deref()?;
            relative
                .starts_with(root)
                .then_some((Path::new(root).components().count(), module))
        })
        .max_by_key(|(depth, _)| *depth)
        .map(|(_, module)| module.name.clone())
}

#[cfg(test)]
#[path = "../tests/config_tests.rs"]
mod tests;
