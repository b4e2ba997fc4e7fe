//! Local directory discovery.
//!
//! Entries are discovered fresh on every run and never modified. The walk
//! is sequential and yields entries in a stable order: within each
//! directory, children are visited sorted by file name.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised while reading the local tree.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The given root is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root path has no usable base name (e.g. `/`).
    #[error("cannot derive a folder name from {0}")]
    NoBaseName(PathBuf),

    /// Reading a directory or its metadata failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WalkError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Whether a local entry is a directory or a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Directory,
    File,
}

/// A path discovered on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalEntry {
    /// Base name of the entry.
    pub name: String,
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// Directory containing the entry.
    pub parent: PathBuf,
    /// Directory or file.
    pub kind: EntryKind,
}

impl LocalEntry {
    fn from_path(path: PathBuf, kind: EntryKind) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            name,
            path,
            parent,
            kind,
        }
    }
}

/// Resolves a directory argument into its root entry.
///
/// The path is made absolute so that `.` or `proj/` still yield a base name.
pub fn root_entry(dir: impl AsRef<Path>) -> Result<LocalEntry, WalkError> {
    let dir = dir.as_ref();
    let metadata = fs::metadata(dir).map_err(|e| WalkError::io(dir, e))?;
    if !metadata.is_dir() {
        return Err(WalkError::NotADirectory(dir.to_path_buf()));
    }

    let absolute = fs::canonicalize(dir).map_err(|e| WalkError::io(dir, e))?;
    let entry = LocalEntry::from_path(absolute, EntryKind::Directory);
    if entry.name.is_empty() {
        return Err(WalkError::NoBaseName(dir.to_path_buf()));
    }
    Ok(entry)
}

/// Recursively lists every regular file under `root`.
///
/// A symbolic link to a regular file is listed under the link's own name.
/// Symbolic links to directories are not descended into, and dangling links
/// are skipped. Any unreadable directory aborts the walk with
/// [`WalkError::Io`].
pub fn walk_files(root: &LocalEntry) -> Result<Vec<LocalEntry>, WalkError> {
    let mut files = Vec::new();
    walk_into(&root.path, &mut files)?;
    debug!(root = %root.path.display(), count = files.len(), "walked local directory");
    Ok(files)
}

fn walk_into(dir: &Path, files: &mut Vec<LocalEntry>) -> Result<(), WalkError> {
    let mut children: Vec<(PathBuf, fs::FileType)> = fs::read_dir(dir)
        .map_err(|e| WalkError::io(dir, e))?
        .map(|entry| {
            let entry = entry.map_err(|e| WalkError::io(dir, e))?;
            let file_type = entry.file_type().map_err(|e| WalkError::io(&entry.path(), e))?;
            Ok((entry.path(), file_type))
        })
        .collect::<Result<_, WalkError>>()?;
    children.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));

    for (path, file_type) in children {
        if file_type.is_dir() {
            walk_into(&path, files)?;
        } else if file_type.is_file() {
            trace!(path = %path.display(), "found file");
            files.push(LocalEntry::from_path(path, EntryKind::File));
        } else if file_type.is_symlink() {
            match fs::metadata(&path) {
                Ok(target) if target.is_file() => {
                    trace!(path = %path.display(), "found symlinked file");
                    files.push(LocalEntry::from_path(path, EntryKind::File));
                }
                Ok(target) if target.is_dir() => {
                    debug!(path = %path.display(), "skipping symlinked directory");
                }
                Ok(_) => debug!(path = %path.display(), "skipping symlink to special file"),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping dangling symlink"),
            }
        } else {
            debug!(path = %path.display(), "skipping special file");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn root_entry_uses_base_name() {
        let tmp = tempfile::tempdir().unwrap();
        let proj = tmp.path().join("proj");
        fs::create_dir(&proj).unwrap();

        let root = root_entry(&proj).unwrap();
        assert_eq!(root.name, "proj");
        assert_eq!(root.kind, EntryKind::Directory);
        assert!(root.path.is_absolute());
    }

    #[test]
    fn root_entry_rejects_files() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("note.txt");
        touch(&file, "x");

        let err = root_entry(&file).unwrap_err();
        assert!(matches!(err, WalkError::NotADirectory(_)));
    }

    #[test]
    fn root_entry_missing_dir_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = root_entry(tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, WalkError::Io { .. }));
    }

    #[test]
    fn walk_is_recursive_and_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        let proj = tmp.path().join("proj");
        touch(&proj.join("readme.txt"), "hello");
        touch(&proj.join("docs").join("spec.txt"), "spec");
        touch(&proj.join("a.txt"), "a");

        let root = root_entry(&proj).unwrap();
        let files = walk_files(&root).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "spec.txt", "readme.txt"]);
        assert!(files.iter().all(|f| f.kind == EntryKind::File));
        assert!(files[1].parent.ends_with("docs"));
    }

    #[test]
    fn walk_empty_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = root_entry(tmp.path()).unwrap();
        assert!(walk_files(&root).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn walk_lists_symlinked_files_but_not_symlinked_dirs() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().unwrap();
        let proj = tmp.path().join("proj");
        let outside = tmp.path().join("outside");
        touch(&proj.join("a.txt"), "a");
        touch(&outside.join("target.txt"), "target");
        touch(&outside.join("nested").join("deep.txt"), "deep");

        symlink(outside.join("target.txt"), proj.join("link.txt")).unwrap();
        symlink(outside.join("nested"), proj.join("linked-dir")).unwrap();
        symlink(outside.join("missing.txt"), proj.join("dangling.txt")).unwrap();

        let root = root_entry(&proj).unwrap();
        let files = walk_files(&root).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "link.txt"]);
        assert_eq!(files[1].path, root.path.join("link.txt"));
        assert_eq!(fs::read_to_string(&files[1].path).unwrap(), "target");
    }
}
