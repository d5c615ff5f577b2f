use std::fs;
use std::path::Path;

use bisect::scratch::ScratchChart;

#[test]
fn copy_is_isolated_and_removed() {
    let original = tempfile::tempdir().unwrap();
    fs::write(original.path().join("Chart.yaml"), "name: c\n").unwrap();
    fs::create_dir_all(original.path().join("templates/sub")).unwrap();
    fs::write(original.path().join("templates/sub/a.yaml"), "a: 1\n").unwrap();

    let scratch = ScratchChart::acquire(original.path()).unwrap();
    let copy = scratch.path().to_path_buf();
    assert!(copy.join("Chart.yaml").is_file());
    assert_eq!(fs::read_to_string(copy.join("templates/sub/a.yaml")).unwrap(), "a: 1\n");

    scratch
        .overwrite(Path::new("templates/sub/a.yaml"), "a: 2\n")
        .unwrap();
    assert_eq!(fs::read_to_string(copy.join("templates/sub/a.yaml")).unwrap(), "a: 2\n");
    assert_eq!(
        fs::read_to_string(original.path().join("templates/sub/a.yaml")).unwrap(),
        "a: 1\n"
    );

    scratch.release().unwrap();
    assert!(!copy.exists());
}

#[test]
fn dropping_removes_the_copy() {
    let original = tempfile::tempdir().unwrap();
    fs::write(original.path().join("Chart.yaml"), "name: c\n").unwrap();

    let copy = {
        let scratch = ScratchChart::acquire(original.path()).unwrap();
        scratch.path().to_path_buf()
    };
    assert!(!copy.exists());
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_copied_without_looping() {
    use std::os::unix::fs::symlink;

    let original = tempfile::tempdir().unwrap();
    let root = original.path();
    fs::write(root.join("Chart.yaml"), "name: c\n").unwrap();
    fs::create_dir_all(root.join("templates")).unwrap();
    fs::create_dir_all(root.join("shared")).unwrap();
    fs::write(root.join("shared/common.yaml"), "common: 1\n").unwrap();
    symlink(root.join("shared"), root.join("templates/linked")).unwrap();
    symlink(root, root.join("templates/loop")).unwrap();
    symlink(root.join("missing"), root.join("templates/dangling")).unwrap();

    let scratch = ScratchChart::acquire(root).unwrap();
    let copy = scratch.path();
    assert_eq!(
        fs::read_to_string(copy.join("templates/linked/common.yaml")).unwrap(),
        "common: 1\n"
    );
    assert!(!copy.join("templates/loop").exists());
    assert!(!copy.join("templates/dangling").exists());
}
