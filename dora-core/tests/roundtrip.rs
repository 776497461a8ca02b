//! Packaging a project and extracting it again reproduces the shipped files.

mod common;

use std::fs;

use common::*;
use dora_common::artifact::ArtifactTracker;
use dora_core::archive::{build_archive, extract_archive, ExcludeSet};
use dora_core::find_project_root;

#[test]
fn build_then_extract_drops_only_excluded_paths() {
    let project = tempfile::tempdir().unwrap();
    sample_project(project.path());
    let out = tempfile::tempdir().unwrap();
    let tracker = ArtifactTracker::new();

    let artifact = build_archive(project.path(), &ExcludeSet::default(), &tracker).unwrap();
    extract_archive(artifact.path(), out.path()).unwrap();
    artifact.delete().unwrap();

    assert_eq!(
        file_set(out.path()),
        vec!["package.json", "src/a.js", "src/deep/b.js"]
    );
    assert!(!out.path().join("node_modules").exists());
    assert!(tracker.live().is_empty());
}

#[test]
fn contents_survive_byte_for_byte() {
    let project = tempfile::tempdir().unwrap();
    let root = project.path();
    fs::write(root.join("package.json"), r#"{"uuid": "u"}"#).unwrap();
    let binary: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    let mut nested = root.to_path_buf();
    for level in 0..8 {
        nested = nested.join(format!("level{level}"));
    }
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("blob.bin"), &binary).unwrap();
    fs::write(nested.join("empty.js"), "").unwrap();
    fs::create_dir_all(root.join("dist")).unwrap();
    fs::write(root.join("dist/old.zip"), "stale build").unwrap();
    fs::write(root.join("debug.log"), "noise").unwrap();

    let tracker = ArtifactTracker::new();
    let exclude = ExcludeSet::new(&["*.log".to_string()]).unwrap();
    let artifact = build_archive(root, &exclude, &tracker).unwrap();
    let out = tempfile::tempdir().unwrap();
    extract_archive(artifact.path(), out.path()).unwrap();

    let relative = nested.strip_prefix(root).unwrap();
    assert_eq!(fs::read(out.path().join(relative).join("blob.bin")).unwrap(), binary);
    assert_eq!(fs::read(out.path().join(relative).join("empty.js")).unwrap().len(), 0);
    assert!(!out.path().join("dist").exists());
    assert!(!out.path().join("debug.log").exists());
    assert_eq!(file_set(out.path()).len(), 3);
}

#[test]
fn active_file_deep_in_project_resolves_to_manifest_dir() {
    let project = tempfile::tempdir().unwrap();
    sample_project(project.path());
    let root = find_project_root(&project.path().join("src/deep/b.js")).unwrap();
    assert_eq!(root, project.path());
}
