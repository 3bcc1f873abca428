//! Platform collaborators: environment enumeration and recursive deletion.

use std::io;
use std::path::Path;

/// Returns the process environment as `NAME=VALUE` strings.
///
/// Names or values that are not valid Unicode are decoded lossily.
pub fn current_environment() -> Vec<String> {
    std::env::vars_os()
        .map(|(name, value)| format!("{}={}", name.to_string_lossy(), value.to_string_lossy()))
        .collect()
}

/// Removes a directory and everything below it.
///
/// On Windows, read-only files block deletion; their read-only attribute is
/// cleared and the removal retried once.
pub fn delete_tree(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            clear_readonly(path)?;
            std::fs::remove_dir_all(path)
        }
        result => result,
    }
}

#[cfg(windows)]
#[allow(clippy::permissions_set_readonly_false)]
fn clear_readonly(path: &Path) -> io::Result<()> {
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            clear_readonly(&entry.path())?;
        } else {
            let mut perms = entry.metadata()?.permissions();
            if perms.readonly() {
                perms.set_readonly(false);
                std::fs::set_permissions(entry.path(), perms)?;
            }
        }
    }
    Ok(())
}

#[cfg(not(windows))]
fn clear_readonly(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn environment_entries_have_separator() {
        let env = current_environment();
        assert!(env.iter().all(|e| e.contains('=')));
    }

    #[test]
    fn environment_contains_known_variable() {
        // Cargo sets this for every test binary it runs.
        let env = current_environment();
        assert!(env.iter().any(|e| e.starts_with("CARGO_MANIFEST_DIR=")));
    }

    #[test]
    fn delete_tree_removes_nested_content() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tree");
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/file.txt"), "x").unwrap();
        fs::write(root.join("top.txt"), "y").unwrap();

        delete_tree(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn delete_tree_removes_read_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tree");
        fs::create_dir_all(&root).unwrap();
        let file = root.join("locked.bin");
        fs::write(&file, "x").unwrap();
        let mut perms = fs::metadata(&file).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&file, perms).unwrap();

        delete_tree(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn delete_tree_missing_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(delete_tree(&dir.path().join("absent")).is_err());
    }
}
