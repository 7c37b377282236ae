use pardupes::pipeline::{FinderError, Pipeline, PipelineConfig};
use pardupes::progress::ProgressTracker;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

fn root(dir: &Path) -> PathBuf {
    dir.canonicalize().unwrap()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let (sets, summary) = Pipeline::new(PipelineConfig::new(vec![root(dir.path())]))
        .run()
        .unwrap();

    assert!(sets.is_empty());
    assert_eq!(summary.files_discovered, 0);
    assert_eq!(summary.duplicate_sets, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"content a").unwrap();
    fs::write(dir.path().join("b.txt"), b"content b").unwrap();
    fs::write(dir.path().join("c.txt"), b"content c").unwrap();

    let (sets, summary) = Pipeline::new(PipelineConfig::new(vec![root(dir.path())]))
        .run()
        .unwrap();

    // Same size, different content: compared but never matched.
    assert!(sets.is_empty());
    assert_eq!(summary.files_discovered, 3);
    assert_eq!(summary.candidate_files, 3);
}

#[test]
fn test_scan_two_identical_one_different() {
    let dir = tempdir().unwrap();
    let base = root(dir.path());
    let x = vec![b'x'; 100];
    let mut y = x.clone();
    y[99] = b'y';
    fs::write(base.join("file1"), &x).unwrap();
    fs::write(base.join("file2"), &y).unwrap();
    fs::write(base.join("file3"), &x).unwrap();

    let config = PipelineConfig::new(vec![base.clone()]).with_min_size(1);
    let (sets, summary) = Pipeline::new(config).run().unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].original.path, base.join("file1"));
    assert_eq!(sets[0].duplicates.len(), 1);
    assert_eq!(sets[0].duplicates[0].path, base.join("file3"));
    assert_eq!(summary.duplicate_bytes, 100);
}

#[test]
fn test_scan_below_min_size_never_compared() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("empty"), b"").unwrap();
    fs::write(dir.path().join("five"), b"12345").unwrap();
    fs::write(dir.path().join("five_again"), b"12345").unwrap();

    let progress = Arc::new(ProgressTracker::hidden());
    let config = PipelineConfig::new(vec![root(dir.path())]).with_min_size(10);
    let (sets, summary) = Pipeline::new(config)
        .with_progress_tracker(Arc::clone(&progress))
        .run()
        .unwrap();

    assert!(sets.is_empty());
    assert_eq!(summary.files_discovered, 0);
    assert_eq!(summary.skipped_files, 3);
    assert_eq!(summary.skipped_bytes, 10);
    assert_eq!(progress.files_processed(), 3);
    assert_eq!(progress.bytes_processed(), 10);
    assert_eq!(progress.total_files(), 3);
}

#[test]
fn test_scan_large_files_differing_in_the_middle_gap() {
    // Larger than the sampling threshold, equal in every sampled region.
    let dir = tempdir().unwrap();
    let size = 512 * 1024;
    let a = vec![7u8; size];
    let mut b = a.clone();
    b[size / 4] = 8;
    fs::write(dir.path().join("a.bin"), &a).unwrap();
    fs::write(dir.path().join("b.bin"), &b).unwrap();
    fs::write(dir.path().join("c.bin"), &a).unwrap();

    let (sets, _) = Pipeline::new(PipelineConfig::new(vec![root(dir.path())]))
        .run()
        .unwrap();

    assert_eq!(sets.len(), 1);
    assert!(sets[0].original.path.ends_with("a.bin"));
    assert_eq!(sets[0].duplicates.len(), 1);
    assert!(sets[0].duplicates[0].path.ends_with("c.bin"));
}

#[test]
fn test_scan_nested_directories_and_natural_order() {
    let dir = tempdir().unwrap();
    let base = root(dir.path());
    fs::create_dir_all(base.join("sub/deeper")).unwrap();
    for name in ["img10.jpg", "img2.jpg", "sub/img1.jpg", "sub/deeper/img3.jpg"] {
        fs::write(base.join(name), b"same picture").unwrap();
    }

    let config = PipelineConfig::new(vec![base.clone()])
        .with_traversal_concurrency(4)
        .with_read_concurrency(2)
        .with_group_concurrency(Some(3));
    let (sets, _) = Pipeline::new(config).run().unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].original.path, base.join("img2.jpg"));
    let duplicates: Vec<PathBuf> = sets[0].duplicates.iter().map(|d| d.path.clone()).collect();
    assert_eq!(
        duplicates,
        vec![
            base.join("img10.jpg"),
            base.join("sub/deeper/img3.jpg"),
            base.join("sub/img1.jpg"),
        ]
    );
}

#[test]
fn test_scan_paranoid_mode() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"paranoid content").unwrap();
    fs::write(dir.path().join("b"), b"paranoid content").unwrap();

    let config = PipelineConfig::new(vec![root(dir.path())]).with_paranoid(true);
    let (sets, _) = Pipeline::new(config).run().unwrap();
    assert_eq!(sets.len(), 1);
}

#[test]
fn test_scan_missing_root_is_fatal() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");

    let result = Pipeline::new(PipelineConfig::new(vec![missing.clone()])).run();
    match result {
        Err(FinderError::PathNotFound(path)) => assert_eq!(path, missing),
        other => panic!("expected PathNotFound, got {:?}", other.map(|(s, _)| s.len())),
    }
}

#[test]
fn test_scan_file_root_is_fatal() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    fs::write(&file, b"x").unwrap();

    let result = Pipeline::new(PipelineConfig::new(vec![file])).run();
    assert!(matches!(result, Err(FinderError::NotADirectory(_))));
}

#[cfg(unix)]
#[test]
fn test_scan_symlinks_not_followed() {
    let dir = tempdir().unwrap();
    let base = root(dir.path());
    fs::create_dir(base.join("real")).unwrap();
    fs::write(base.join("real/data"), b"linked content").unwrap();
    std::os::unix::fs::symlink(base.join("real"), base.join("dir_link")).unwrap();
    std::os::unix::fs::symlink(base.join("real/data"), base.join("file_link")).unwrap();

    let (sets, summary) = Pipeline::new(PipelineConfig::new(vec![base])).run().unwrap();
    assert!(sets.is_empty());
    assert_eq!(summary.files_discovered, 1);
}
