use pardupes::duplicates::DuplicateComparator;
use pardupes::pipeline::{Pipeline, PipelineConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn two_roots() -> (tempfile::TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    let photos = base.join("photos");
    let backup = base.join("backup");
    fs::create_dir_all(&photos).unwrap();
    fs::create_dir_all(&backup).unwrap();
    fs::write(photos.join("z.jpg"), b"holiday").unwrap();
    fs::write(backup.join("a.jpg"), b"holiday").unwrap();
    (dir, photos, backup)
}

#[test]
fn test_earlier_root_keeps_original() {
    let (_dir, photos, backup) = two_roots();

    let config = PipelineConfig::new(vec![photos.clone(), backup.clone()]);
    let (sets, _) = Pipeline::new(config).run().unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].original.path, photos.join("z.jpg"));
    assert_eq!(sets[0].duplicates[0].path, backup.join("a.jpg"));

    let config = PipelineConfig::new(vec![backup.clone(), photos.clone()]);
    let (sets, _) = Pipeline::new(config).run().unwrap();
    assert_eq!(sets[0].original.path, backup.join("a.jpg"));
    assert_eq!(sets[0].duplicates[0].path, photos.join("z.jpg"));
}

#[test]
fn test_original_choice_is_repeatable() {
    let (_dir, photos, backup) = two_roots();
    fs::write(backup.join("b.jpg"), b"holiday").unwrap();
    fs::write(photos.join("y.jpg"), b"holiday").unwrap();

    let roots = vec![photos.clone(), backup];
    let mut originals = Vec::new();
    for concurrency in [1, 2, 8] {
        let config = PipelineConfig::new(roots.clone())
            .with_traversal_concurrency(concurrency)
            .with_read_concurrency(concurrency);
        let (sets, _) = Pipeline::new(config).run().unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].duplicates.len(), 3);
        originals.push(sets[0].original.path.clone());
    }
    assert!(originals.iter().all(|p| *p == photos.join("y.jpg")));
}

#[test]
fn test_overlapping_roots_counted_once() {
    let (_dir, photos, backup) = two_roots();
    let base = photos.parent().unwrap().to_path_buf();

    let config = PipelineConfig::new(vec![photos.clone(), base, backup, photos.clone()]);
    let (sets, summary) = Pipeline::new(config).run().unwrap();
    assert_eq!(summary.files_discovered, 2);
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].duplicates.len(), 1);
    assert_eq!(sets[0].original.path, photos.join("z.jpg"));
}

#[test]
fn test_sets_sorted_by_original_rank() {
    let (_dir, photos, backup) = two_roots();
    fs::write(backup.join("doc1.txt"), b"report contents").unwrap();
    fs::write(backup.join("doc2.txt"), b"report contents").unwrap();

    let roots = vec![photos.clone(), backup.clone()];
    let (sets, _) = Pipeline::new(PipelineConfig::new(roots.clone())).run().unwrap();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].original.path, photos.join("z.jpg"));
    assert_eq!(sets[1].original.path, backup.join("doc1.txt"));

    let comparator = DuplicateComparator::new(&roots);
    assert!(comparator.rank(&sets[0].original.path) < comparator.rank(&sets[1].original.path));
}
