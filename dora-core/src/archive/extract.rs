// dora-core/src/archive/extract.rs
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Component, Path, PathBuf};

use dora_common::error::{DoraError, Result};
use tracing::{debug, error, warn};
use zip::read::ZipArchive;

/// Unpacks a pulled addon archive into `target_dir`, replacing files that already exist.
///
/// There is no rollback: when an entry fails, whatever was extracted before it stays on
/// disk and the error is returned. Returns the number of regular files written.
pub fn extract_archive(archive_path: &Path, target_dir: &Path) -> Result<usize> {
    debug!(
        "Extracting archive '{}' to '{}'",
        archive_path.display(),
        target_dir.display()
    );

    fs::create_dir_all(target_dir).map_err(|e| {
        DoraError::Extraction(format!(
            "Failed to create target directory {}: {}",
            target_dir.display(),
            e
        ))
    })?;

    let file = File::open(archive_path).map_err(|e| {
        DoraError::Extraction(format!(
            "Failed to open archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;

    extract_zip_archive(file, target_dir, archive_path)
}

fn extract_zip_archive<R: Read + Seek>(
    reader: R,
    target_dir: &Path,
    archive_path_for_log: &Path,
) -> Result<usize> {
    let mut archive = ZipArchive::new(reader).map_err(|e| {
        DoraError::Extraction(format!(
            "Failed to open ZIP {}: {}",
            archive_path_for_log.display(),
            e
        ))
    })?;
    debug!(
        "Starting ZIP extraction for {} ({} entries)",
        archive_path_for_log.display(),
        archive.len()
    );

    let mut files_written = 0;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| {
            DoraError::Extraction(format!(
                "Error reading ZIP index {} in {}: {}",
                i,
                archive_path_for_log.display(),
                e
            ))
        })?;

        let path_in_archive = match file.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                warn!("Skipping unsafe ZIP entry name {}", file.name());
                continue;
            }
        };

        let mut final_target_path_on_disk = target_dir.to_path_buf();
        for comp in path_in_archive.components() {
            match comp {
                Component::Normal(p) => final_target_path_on_disk.push(p),
                Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) | Component::RootDir => {
                    error!(
                        "Disallowed component {:?} in ZIP path {}",
                        comp,
                        path_in_archive.display()
                    );
                    return Err(DoraError::Extraction(format!(
                        "Disallowed component in ZIP path {}",
                        path_in_archive.display()
                    )));
                }
            }
        }
        if final_target_path_on_disk == target_dir {
            continue;
        }
        if !final_target_path_on_disk.starts_with(target_dir) {
            error!(
                "ZIP path traversal detected: {} -> {}",
                path_in_archive.display(),
                final_target_path_on_disk.display()
            );
            return Err(DoraError::Extraction(format!(
                "ZIP path traversal detected in {}",
                archive_path_for_log.display()
            )));
        }

        if file.is_symlink() {
            warn!(
                "Skipping symlink entry {} in {}",
                path_in_archive.display(),
                archive_path_for_log.display()
            );
            continue;
        }
        if let Some(link) = linked_ancestor(target_dir, &final_target_path_on_disk) {
            warn!(
                "Skipping ZIP entry {}: {} is a symlink",
                path_in_archive.display(),
                link.display()
            );
            continue;
        }

        if let Some(parent) = final_target_path_on_disk.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| io_failure("create dir", parent, e))?;
            }
        }

        if file.is_dir() {
            if !final_target_path_on_disk.is_dir() {
                fs::create_dir_all(&final_target_path_on_disk)
                    .map_err(|e| io_failure("create dir", &final_target_path_on_disk, e))?;
            }
        } else {
            // Regular file, replacing whatever is there.
            if final_target_path_on_disk.symlink_metadata().is_ok() {
                match fs::remove_file(&final_target_path_on_disk) {
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(io_failure("replace", &final_target_path_on_disk, e));
                    }
                }
            }
            let mut out_file = File::create(&final_target_path_on_disk)
                .map_err(|e| io_failure("create file", &final_target_path_on_disk, e))?;
            io::copy(&mut file, &mut out_file)
                .map_err(|e| io_failure("write", &final_target_path_on_disk, e))?;
            files_written += 1;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                if final_target_path_on_disk.is_file() {
                    fs::set_permissions(
                        &final_target_path_on_disk,
                        fs::Permissions::from_mode(mode & 0o777),
                    )
                    .map_err(|e| io_failure("set permissions on", &final_target_path_on_disk, e))?;
                }
            }
        }
    }
    debug!(
        "Finished ZIP extraction for {}: {} files",
        archive_path_for_log.display(),
        files_written
    );
    Ok(files_written)
}

/// First directory between `target_dir` and `path` that is a symlink on disk. Writing
/// through one could land outside the destination.
fn linked_ancestor(target_dir: &Path, path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .skip(1)
        .take_while(|dir| *dir != target_dir && dir.starts_with(target_dir))
        .find(|dir| {
            dir.symlink_metadata()
                .map(|meta| meta.file_type().is_symlink())
                .unwrap_or(false)
        })
        .map(Path::to_path_buf)
}

fn io_failure(action: &str, path: &Path, e: io::Error) -> DoraError {
    DoraError::Extraction(format!("Failed to {} {}: {}", action, path.display(), e))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::*;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, body) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(body).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_nested_and_empty_files_over_existing_content() {
        let scratch = tempfile::tempdir().unwrap();
        let archive = scratch.path().join("a.zip");
        write_zip(
            &archive,
            &[
                ("package.json", b"{}"),
                ("src/", b""),
                ("src/deep/b.js", b"new"),
                ("empty.txt", b""),
            ],
        );
        let dest = scratch.path().join("dest");
        fs::create_dir_all(dest.join("src/deep")).unwrap();
        fs::write(dest.join("src/deep/b.js"), "old contents that are longer").unwrap();
        fs::write(dest.join("keep.me"), "untouched").unwrap();

        let written = extract_archive(&archive, &dest).unwrap();
        assert_eq!(written, 3);
        assert_eq!(fs::read_to_string(dest.join("src/deep/b.js")).unwrap(), "new");
        assert_eq!(fs::read(dest.join("empty.txt")).unwrap().len(), 0);
        assert_eq!(fs::read_to_string(dest.join("keep.me")).unwrap(), "untouched");
    }

    #[test]
    fn corrupt_archive_is_an_extraction_error() {
        let scratch = tempfile::tempdir().unwrap();
        let archive = scratch.path().join("bad.zip");
        fs::write(&archive, b"this is not a zip").unwrap();
        let err = extract_archive(&archive, &scratch.path().join("out")).unwrap_err();
        assert!(matches!(err, DoraError::Extraction(_)));
    }

    #[test]
    fn traversal_entries_are_skipped() {
        let scratch = tempfile::tempdir().unwrap();
        let archive = scratch.path().join("evil.zip");
        write_zip(&archive, &[("../escape.txt", b"x"), ("ok.txt", b"y")]);
        let dest = scratch.path().join("out");
        assert_eq!(extract_archive(&archive, &dest).unwrap(), 1);
        assert!(!scratch.path().join("escape.txt").exists());
        assert!(dest.join("ok.txt").exists());
    }

    #[test]
    fn symlink_entries_cannot_redirect_writes() {
        let scratch = tempfile::tempdir().unwrap();
        let outside = scratch.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        let archive = scratch.path().join("links.zip");
        let mut zip = ZipWriter::new(File::create(&archive).unwrap());
        zip.add_symlink("link", outside.to_string_lossy(), SimpleFileOptions::default())
            .unwrap();
        zip.start_file("link/escaped.txt", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"x").unwrap();
        zip.start_file("index.js", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"ok").unwrap();
        zip.finish().unwrap();

        let dest = scratch.path().join("dest");
        let written = extract_archive(&archive, &dest).unwrap();

        assert!(!outside.join("escaped.txt").exists());
        let link = dest.join("link").symlink_metadata().unwrap();
        assert!(!link.file_type().is_symlink());
        assert_eq!(written, 2);
        assert!(dest.join("link/escaped.txt").is_file());
        assert_eq!(fs::read_to_string(dest.join("index.js")).unwrap(), "ok");
    }

    #[cfg(unix)]
    #[test]
    fn existing_symlinked_dirs_in_destination_are_not_followed() {
        let scratch = tempfile::tempdir().unwrap();
        let outside = scratch.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        let dest = scratch.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        std::os::unix::fs::symlink(&outside, dest.join("src")).unwrap();
        let archive = scratch.path().join("a.zip");
        write_zip(&archive, &[("src/a.js", b"new"), ("package.json", b"{}")]);

        assert_eq!(extract_archive(&archive, &dest).unwrap(), 1);
        assert!(!outside.join("a.js").exists());
        assert!(dest.join("package.json").exists());
    }
}
