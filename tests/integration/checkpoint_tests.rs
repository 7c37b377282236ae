use pardupes::checkpoint::{Checkpoint, CheckpointError};
use pardupes::pipeline::{FinderError, Pipeline, PipelineConfig};
use pardupes::scanner::{traverse, TraverseConfig};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn populate(dir: &Path) {
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("a.txt"), b"duplicate").unwrap();
    fs::write(dir.join("nested/b.txt"), b"duplicate").unwrap();
    fs::write(dir.join("c.txt"), b"something else").unwrap();
    fs::write(dir.join("d.txt"), b"tiny").unwrap();
}

fn membership(groups: &[pardupes::duplicates::SizeGroup]) -> BTreeSet<(u64, PathBuf)> {
    groups
        .iter()
        .flat_map(|g| g.files.iter().map(move |f| (g.size, f.path.clone())))
        .collect()
}

#[test]
fn test_checkpoint_reproduces_traversal_groups() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    populate(&tree);
    let checkpoint_path = dir.path().join("walk.json.gz");

    let config = TraverseConfig::default().with_min_size(1);
    let traversal = traverse(&[tree.clone()], &config).unwrap();
    Checkpoint::from_traversal(&traversal, 1)
        .save(&checkpoint_path)
        .unwrap();

    let reloaded = Checkpoint::load(&checkpoint_path)
        .unwrap()
        .unwrap()
        .into_traversal();
    assert_eq!(membership(&reloaded.groups), membership(&traversal.groups));
    assert_eq!(reloaded.candidate_files, traversal.candidate_files);
    assert_eq!(reloaded.candidate_bytes, traversal.candidate_bytes);

    let fresh = traverse(&[tree], &config).unwrap();
    assert_eq!(membership(&reloaded.groups), membership(&fresh.groups));
}

#[test]
fn test_pipeline_writes_then_reuses_checkpoint() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    populate(&tree);
    let checkpoint_path = dir.path().join("walk.json");

    let config = PipelineConfig::new(vec![tree.clone()]).with_checkpoint(Some(checkpoint_path.clone()), false);
    let (first_sets, first) = Pipeline::new(config.clone()).run().unwrap();
    assert!(!first.from_checkpoint);
    assert!(checkpoint_path.exists());

    let (second_sets, second) = Pipeline::new(config).run().unwrap();
    assert!(second.from_checkpoint);
    assert_eq!(first_sets, second_sets);
    assert_eq!(second.candidate_files, first.candidate_files);
}

#[test]
fn test_checkpoint_without_roots() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    populate(&tree);
    let checkpoint_path = dir.path().join("walk.json");

    let with_roots = PipelineConfig::new(vec![tree]).with_checkpoint(Some(checkpoint_path.clone()), false);
    Pipeline::new(with_roots).run().unwrap();

    let without_roots = PipelineConfig::default().with_checkpoint(Some(checkpoint_path), true);
    let (sets, summary) = Pipeline::new(without_roots).run().unwrap();
    assert!(summary.from_checkpoint);
    assert_eq!(sets.len(), 1);
}

#[test]
fn test_checkpoint_groups_below_min_size_are_skipped() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    fs::create_dir_all(&tree).unwrap();
    fs::write(tree.join("tiny1"), b"tiny").unwrap();
    fs::write(tree.join("tiny2"), b"tiny").unwrap();
    let checkpoint_path = dir.path().join("walk.json");

    let config = PipelineConfig::new(vec![tree.clone()]).with_checkpoint(Some(checkpoint_path), false);
    let (sets, _) = Pipeline::new(config.clone()).run().unwrap();
    assert_eq!(sets.len(), 1);

    // Removed files would show up as read errors if they were fingerprinted.
    fs::remove_file(tree.join("tiny1")).unwrap();
    fs::remove_file(tree.join("tiny2")).unwrap();

    let (sets, summary) = Pipeline::new(config.with_min_size(100)).run().unwrap();
    assert!(summary.from_checkpoint);
    assert!(sets.is_empty());
    assert_eq!(summary.read_errors, 0);
    assert_eq!(summary.candidate_files, 0);
    assert_eq!(summary.skipped_files, 2);
    assert_eq!(summary.skipped_bytes, 8);
}

#[test]
fn test_vanished_file_dropped_silently() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    fs::create_dir_all(&tree).unwrap();
    for name in ["one", "two", "three"] {
        fs::write(tree.join(name), b"identical bytes").unwrap();
    }
    let checkpoint_path = dir.path().join("walk.json");
    let config = PipelineConfig::new(vec![tree.clone()]).with_checkpoint(Some(checkpoint_path), false);
    Pipeline::new(config.clone()).run().unwrap();

    // Gone between traversal and fingerprinting.
    fs::remove_file(tree.join("two")).unwrap();

    let (sets, summary) = Pipeline::new(config).run().unwrap();
    assert!(summary.from_checkpoint);
    assert_eq!(summary.read_errors, 1);
    assert_eq!(sets.len(), 1);
    assert!(sets[0].original.path.ends_with("one"));
    assert_eq!(sets[0].duplicates.len(), 1);
    assert!(sets[0].duplicates[0].path.ends_with("three"));
}

#[test]
fn test_corrupt_checkpoint_falls_back_and_rewrites() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    populate(&tree);
    let checkpoint_path = dir.path().join("walk.json");
    fs::write(&checkpoint_path, b"{\"checksum\": \"abc\", \"checkpoint\": {").unwrap();

    let config = PipelineConfig::new(vec![tree]).with_checkpoint(Some(checkpoint_path.clone()), false);
    let (sets, summary) = Pipeline::new(config).run().unwrap();
    assert!(!summary.from_checkpoint);
    assert_eq!(sets.len(), 1);

    assert!(Checkpoint::load(&checkpoint_path).unwrap().is_some());
}

#[test]
fn test_corrupt_required_checkpoint_is_fatal() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    populate(&tree);
    let checkpoint_path = dir.path().join("walk.json");
    fs::write(&checkpoint_path, b"not json at all").unwrap();

    let config = PipelineConfig::new(vec![tree]).with_checkpoint(Some(checkpoint_path), true);
    let result = Pipeline::new(config).run();
    assert!(matches!(
        result,
        Err(FinderError::Checkpoint(CheckpointError::Corrupt { .. }))
    ));
}

#[test]
fn test_unwritable_checkpoint_is_not_fatal() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    populate(&tree);
    let checkpoint_path = dir.path().join("missing-dir").join("walk.json");

    let config = PipelineConfig::new(vec![tree]).with_checkpoint(Some(checkpoint_path.clone()), false);
    let (sets, _) = Pipeline::new(config).run().unwrap();
    assert_eq!(sets.len(), 1);
    assert!(!checkpoint_path.exists());
}
