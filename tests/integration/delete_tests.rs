use pardupes::actions::{delete_duplicates, DeleteConfig};
use pardupes::pipeline::{Pipeline, PipelineConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_delete_leaves_one_survivor_per_content() {
    let dir = tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    fs::create_dir_all(base.join("keep")).unwrap();
    fs::create_dir_all(base.join("spare")).unwrap();
    for name in ["keep/a", "spare/a", "spare/a copy", "spare/a copy 2"] {
        fs::write(base.join(name), b"first content").unwrap();
    }
    for name in ["keep/b", "spare/b"] {
        fs::write(base.join(name), b"second content!!").unwrap();
    }
    fs::write(base.join("spare/unique"), b"only one of these").unwrap();

    let roots = vec![base.join("keep"), base.join("spare")];
    let (sets, _) = Pipeline::new(PipelineConfig::new(roots.clone())).run().unwrap();
    assert_eq!(sets.len(), 2);

    let result = delete_duplicates(&sets, &DeleteConfig::permanent());
    assert_eq!(result.success_count(), 4);
    assert!(result.all_succeeded());
    assert_eq!(result.bytes_freed, 3 * 13 + 16);

    for set in &sets {
        assert!(set.original.path.exists());
        assert!(set.original.path.starts_with(base.join("keep")));
        for dup in &set.duplicates {
            assert!(!dup.path.exists());
        }
    }
    assert!(base.join("spare/unique").exists());

    // Nothing left to find, and deleting again is a no-op.
    let (after, _) = Pipeline::new(PipelineConfig::new(roots)).run().unwrap();
    assert!(after.is_empty());
    let again = delete_duplicates(&sets, &DeleteConfig::permanent());
    assert_eq!(again.success_count(), 0);
    assert_eq!(again.already_removed.len(), 4);
    assert!(again.all_succeeded());
}

#[test]
fn test_delete_nothing_to_do() {
    let result = delete_duplicates(&[], &DeleteConfig::default());
    assert!(result.nothing_to_do());
    assert_eq!(result.summary(), "Nothing to delete");
}
