// dora-core/src/archive/build.rs
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Component, Path};

use dora_common::artifact::{ArtifactTracker, TempArtifact};
use dora_common::error::{DoraError, Result};
use glob::Pattern;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Dependency install dir and previous build output, never shipped to the device.
pub const DEFAULT_EXCLUDES: &[&str] = &["node_modules/**", "dist/**"];

/// Glob patterns matched against `/`-separated paths relative to the project root.
#[derive(Debug, Clone)]
pub struct ExcludeSet {
    patterns: Vec<ExcludePattern>,
}

#[derive(Debug, Clone)]
struct ExcludePattern {
    entry: Pattern,
    // For `dir/**` patterns, matches `dir` itself so the walk can prune it.
    dir: Option<Pattern>,
}

impl ExcludeSet {
    /// Built-in exclusions plus user supplied ones.
    pub fn new(extra: &[String]) -> Result<Self> {
        let mut patterns = Vec::new();
        for raw in DEFAULT_EXCLUDES
            .iter()
            .copied()
            .chain(extra.iter().map(String::as_str))
        {
            let entry = Pattern::new(raw)
                .map_err(|e| DoraError::Build(format!("Invalid exclude pattern '{raw}': {e}")))?;
            let dir = match raw.strip_suffix("/**") {
                Some(prefix) => Some(Pattern::new(prefix).map_err(|e| {
                    DoraError::Build(format!("Invalid exclude pattern '{raw}': {e}"))
                })?),
                None => None,
            };
            patterns.push(ExcludePattern { entry, dir });
        }
        Ok(Self { patterns })
    }

    pub fn is_excluded(&self, relative: &str, is_dir: bool) -> bool {
        self.patterns.iter().any(|p| {
            p.entry.matches(relative)
                || (is_dir && p.dir.as_ref().is_some_and(|d| d.matches(relative)))
        })
    }
}

impl Default for ExcludeSet {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_EXCLUDES
                .iter()
                .filter_map(|raw| {
                    let entry = Pattern::new(raw).ok()?;
                    let dir = raw.strip_suffix("/**").and_then(|p| Pattern::new(p).ok());
                    Some(ExcludePattern { entry, dir })
                })
                .collect(),
        }
    }
}

/// Entry name inside the archive: relative, `/`-separated.
pub(crate) fn archive_name(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for comp in relative.components() {
        match comp {
            Component::Normal(p) => parts.push(p.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Packages `source_dir` into a zip artifact owned by the caller.
///
/// Entries are written in file-name order with a fixed timestamp and fixed modes, so
/// the same tree always produces the same bytes.
pub fn build_archive(
    source_dir: &Path,
    exclude: &ExcludeSet,
    artifacts: &ArtifactTracker,
) -> Result<TempArtifact> {
    if !source_dir.is_dir() {
        return Err(DoraError::Build(format!(
            "Source directory {} does not exist",
            source_dir.display()
        )));
    }
    let artifact = artifacts.create("dora-push-").map_err(|e| {
        DoraError::Build(format!("No writable temp location for the archive: {e}"))
    })?;
    debug!(
        "Building archive of {} into {}",
        source_dir.display(),
        artifact.path().display()
    );
    let file = File::create(artifact.path()).map_err(|e| {
        DoraError::Build(format!(
            "Failed to open archive {}: {}",
            artifact.path().display(),
            e
        ))
    })?;
    // On error the artifact is dropped and its file removed.
    let count = write_entries(source_dir, exclude, BufWriter::new(file))?;
    debug!(
        "Archived {} files from {}",
        count,
        source_dir.display()
    );
    Ok(artifact)
}

fn write_entries(
    source_dir: &Path,
    exclude: &ExcludeSet,
    out: BufWriter<File>,
) -> Result<usize> {
    let mut zip = ZipWriter::new(out);
    let file_options = entry_options(0o644);
    let dir_options = entry_options(0o755);
    let mut files = 0;

    let walker = WalkDir::new(source_dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = entry.path().strip_prefix(source_dir).unwrap_or(entry.path());
            match archive_name(relative) {
                Some(name) => !exclude.is_excluded(&name, entry.file_type().is_dir()),
                None => true,
            }
        });

    for entry in walker {
        let entry = entry.map_err(|e| DoraError::Build(format!("Failed to walk source tree: {e}")))?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| DoraError::Build(format!("Unexpected path outside source: {e}")))?;
        let Some(name) = archive_name(relative) else {
            warn!(
                "Skipping entry with non UTF-8 or unusual path: {}",
                entry.path().display()
            );
            continue;
        };
        let file_type = entry.file_type();
        if file_type.is_dir() {
            zip.add_directory(name.as_str(), dir_options)
                .map_err(|e| zip_error(&name, e))?;
        } else if file_type.is_file() {
            zip.start_file(name.as_str(), file_options)
                .map_err(|e| zip_error(&name, e))?;
            let mut source = File::open(entry.path())
                .map_err(|e| DoraError::Build(format!("Failed to read {}: {}", entry.path().display(), e)))?;
            io::copy(&mut source, &mut zip)
                .map_err(|e| DoraError::Build(format!("Failed to archive {}: {}", entry.path().display(), e)))?;
            files += 1;
        } else {
            debug!("Skipping non-regular entry {}", entry.path().display());
        }
    }

    zip.finish()
        .map_err(|e| DoraError::Build(format!("Failed to finalize archive: {e}")))?;
    Ok(files)
}

fn entry_options(mode: u32) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(mode)
}

fn zip_error(name: &str, e: zip::result::ZipError) -> DoraError {
    DoraError::Build(format!("Failed to add '{name}' to archive: {e}"))
}
