//! One-way folder synchronization.
//!
//! [`FolderSynchronizer`] reconciles a local directory tree against a
//! [`RemoteDirectory`]: it finds or creates a folder named after the local
//! directory, then finds or updates every file underneath it. Remote content
//! is never deleted, so re-running against an unchanged tree only updates
//! files in place.
//!
//! The tree is flattened: every file, regardless of depth, becomes a direct
//! child of the single target folder. Two files with the same base name in
//! different subdirectories therefore reconcile against the same remote file.
//!
//! ```text
//! proj/                     remote: proj/
//! ├── a.txt          ──▶            ├── a.txt
//! └── docs/                         └── spec.txt
//!     └── spec.txt
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use driveinvite_core::{LocalEntry, WalkError, root_entry, walk_files};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::remote::{RemoteDirectory, RemoteNode};

/// Errors that abort a synchronization run.
///
/// Remote failures on individual files are not errors; they are reported
/// as [`FileOutcome::Failed`] and the run continues.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local tree could not be read.
    #[error("failed to read local directory: {0}")]
    Walk(#[from] WalkError),

    /// The target folder could neither be found nor created.
    #[error("failed to resolve remote folder '{name}': {source}")]
    FolderResolution {
        name: String,
        #[source]
        source: ProviderError,
    },

    /// A local file could not be read during upload or update.
    #[error("failed to read {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: ProviderError,
    },
}

/// The remote call that failed for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Lookup,
    Upload,
    Update,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Self::Lookup => "lookup",
            Self::Upload => "upload",
            Self::Update => "update",
        };
        f.write_str(stage)
    }
}

/// Result of reconciling a single file.
#[derive(Debug)]
pub enum FileOutcome {
    /// No remote file with that name existed; a new one was uploaded.
    Created(RemoteNode),
    /// A remote file with that name existed; its content was replaced.
    Updated(RemoteNode),
    /// A remote call failed. Later files are still attempted.
    Failed {
        stage: SyncStage,
        error: ProviderError,
    },
}

impl FileOutcome {
    /// Returns the remote node on success.
    pub fn node(&self) -> Option<&RemoteNode> {
        match self {
            Self::Created(node) | Self::Updated(node) => Some(node),
            Self::Failed { .. } => None,
        }
    }

    /// Returns true if the file could not be reconciled.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// A local file and what happened to it.
#[derive(Debug)]
pub struct FileReport {
    pub name: String,
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// The result of a synchronization run.
///
/// Files appear in walk order. There is no aggregate success flag: the run
/// succeeded once the folder was resolved.
#[derive(Debug)]
pub struct SyncReport {
    /// The resolved target folder.
    pub folder: RemoteNode,
    pub files: Vec<FileReport>,
}

impl SyncReport {
    /// Returns the identifier of the target folder.
    pub fn folder_id(&self) -> &str {
        &self.folder.id
    }

    /// Returns the shareable link of the target folder, if any.
    pub fn folder_link(&self) -> Option<&str> {
        self.folder.link.as_deref()
    }
}

/// Maps local entries to the remote folder they are reconciled into.
///
/// Built once per run after folder resolution and dropped afterwards.
/// Every file maps to the root folder.
#[derive(Debug)]
pub struct SyncMapping {
    root: PathBuf,
    folder: RemoteNode,
}

impl SyncMapping {
    /// Creates a mapping for the tree rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, folder: RemoteNode) -> Self {
        Self {
            root: root.into(),
            folder,
        }
    }

    /// Returns the remote folder a local entry is reconciled into.
    pub fn target_for(&self, entry: &LocalEntry) -> &RemoteNode {
        debug_assert!(entry.path.starts_with(&self.root));
        &self.folder
    }

    /// Returns the root folder.
    pub fn folder(&self) -> &RemoteNode {
        &self.folder
    }

    fn into_folder(self) -> RemoteNode {
        self.folder
    }
}

/// Reconciles local directories into a remote store.
pub struct FolderSynchronizer<'a> {
    remote: &'a dyn RemoteDirectory,
    parent_id: String,
}

impl<'a> FolderSynchronizer<'a> {
    /// Parent identifier used when none is configured.
    pub const DEFAULT_PARENT: &'static str = "root";

    /// Creates a synchronizer that places folders under the store's root.
    pub fn new(remote: &'a dyn RemoteDirectory) -> Self {
        Self {
            remote,
            parent_id: Self::DEFAULT_PARENT.to_string(),
        }
    }

    /// Sets the remote folder that target folders are created under.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = parent_id.into();
        self
    }

    /// Returns the configured parent identifier.
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// Finds the folder `name` under the configured parent, creating it if
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::FolderResolution`] if the lookup or the creation
    /// fails. Nothing is retried.
    pub async fn resolve_folder(&self, name: &str) -> Result<RemoteNode, SyncError> {
        let found = self
            .remote
            .find_folder(name, &self.parent_id)
            .await
            .map_err(|source| {
                warn!(folder = name, error = %source, "folder lookup failed");
                SyncError::FolderResolution {
                    name: name.to_string(),
                    source,
                }
            })?;

        if let Some(folder) = found {
            debug!(folder = name, id = %folder.id, "reusing existing folder");
            return Ok(folder);
        }

        match self.remote.create_folder(name, &self.parent_id).await {
            Ok(folder) => {
                info!(folder = name, id = %folder.id, "created folder");
                Ok(folder)
            }
            Err(source) => {
                warn!(folder = name, error = %source, "failed to create folder");
                Err(SyncError::FolderResolution {
                    name: name.to_string(),
                    source,
                })
            }
        }
    }

    /// Reconciles one local file into `folder`.
    ///
    /// Looks the file up by base name; updates it in place when found,
    /// uploads it otherwise. Remote failures become
    /// [`FileOutcome::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::LocalIo`] only when the local file cannot be
    /// read.
    pub async fn sync_file(
        &self,
        entry: &LocalEntry,
        folder: &RemoteNode,
    ) -> Result<FileOutcome, SyncError> {
        let existing = match self.remote.find_file_in_folder(&folder.id, &entry.name).await {
            Ok(existing) => existing,
            Err(error) => {
                warn!(file = %entry.name, error = %error, "file lookup failed");
                return Ok(FileOutcome::Failed {
                    stage: SyncStage::Lookup,
                    error,
                });
            }
        };

        let (stage, result) = match existing {
            Some(remote_file) => (
                SyncStage::Update,
                self.remote.update_file(&entry.path, &remote_file.id).await,
            ),
            None => (
                SyncStage::Upload,
                self.remote.upload_file(&entry.path, &folder.id).await,
            ),
        };

        match result {
            Ok(node) if stage == SyncStage::Update => {
                info!(file = %entry.name, id = %node.id, "file updated");
                Ok(FileOutcome::Updated(node))
            }
            Ok(node) => {
                info!(file = %entry.name, id = %node.id, "file uploaded");
                Ok(FileOutcome::Created(node))
            }
            Err(source) if source.is_local_io() => Err(SyncError::LocalIo {
                path: entry.path.clone(),
                source,
            }),
            Err(error) => {
                warn!(file = %entry.name, %stage, error = %error, "failed to sync file");
                Ok(FileOutcome::Failed { stage, error })
            }
        }
    }

    /// Synchronizes the directory at `dir`.
    ///
    /// The target folder is named after the directory's base name. Files
    /// are reconciled one at a time in walk order.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be read, if the folder cannot be
    /// resolved (no file is touched in that case), or if a local file
    /// cannot be read.
    pub async fn sync_directory(&self, dir: impl AsRef<Path>) -> Result<SyncReport, SyncError> {
        let root = root_entry(dir)?;
        let folder = self.resolve_folder(&root.name).await?;
        let mapping = SyncMapping::new(&root.path, folder);

        let entries = walk_files(&root)?;
        let mut files = Vec::with_capacity(entries.len());
        for entry in entries {
            let outcome = self.sync_file(&entry, mapping.target_for(&entry)).await?;
            files.push(FileReport {
                name: entry.name,
                path: entry.path,
                outcome,
            });
        }

        let failed = files.iter().filter(|f| f.outcome.is_failed()).count();
        debug!(
            folder = %mapping.folder().name,
            files = files.len(),
            failed,
            "synchronization finished"
        );

        Ok(SyncReport {
            folder: mapping.into_folder(),
            files,
        })
    }
}
