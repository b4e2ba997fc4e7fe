//! RemoteDirectory trait definition.
//!
//! This module defines the [`RemoteDirectory`] trait, the abstraction over a
//! hierarchical cloud file store (Google Drive) that the folder synchronizer
//! reconciles against.
//!
//! Remote nodes are not keyed by name: two folders with the same name can sit
//! under the same parent. Lookups return the first match.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Keeps the service traits object-safe so commands can hold
/// `&dyn RemoteDirectory` and tests can swap in fakes.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The kind of a remote node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

/// A folder or file in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNode {
    /// Opaque identifier assigned by the remote store.
    pub id: String,
    /// Display name (not unique within a parent).
    pub name: String,
    /// Identifier of the containing folder, when known.
    pub parent_id: Option<String>,
    pub kind: NodeKind,
    /// Shareable browser link, when the store returns one.
    pub link: Option<String>,
}

impl RemoteNode {
    /// Creates a folder node.
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            kind: NodeKind::Folder,
            link: None,
        }
    }

    /// Creates a file node.
    pub fn file(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            kind: NodeKind::File,
            link: None,
        }
    }

    /// Builder method to set the parent identifier.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Builder method to set the shareable link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Returns true if this node is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// A hierarchical file store.
///
/// None of the operations are transactional and none are retried.
/// Implementations log at debug level and report failures as
/// [`ProviderError`](crate::ProviderError); the caller decides whether a
/// failure is fatal.
pub trait RemoteDirectory: Send + Sync {
    /// Returns the name of the backing service (e.g. "drive").
    fn name(&self) -> &str;

    /// Finds a non-trashed folder with exactly `name` under `parent_id`.
    ///
    /// Returns the first match when several exist.
    fn find_folder<'a>(
        &'a self,
        name: &'a str,
        parent_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Option<RemoteNode>>>;

    /// Creates a folder named `name` under `parent_id`.
    fn create_folder<'a>(
        &'a self,
        name: &'a str,
        parent_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RemoteNode>>;

    /// Finds a non-trashed file with exactly `name` directly inside `folder_id`.
    fn find_file_in_folder<'a>(
        &'a self,
        folder_id: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Option<RemoteNode>>>;

    /// Uploads the local file at `path` as a new object inside `parent_id`.
    ///
    /// The remote name is the file's base name.
    fn upload_file<'a>(
        &'a self,
        path: &'a Path,
        parent_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RemoteNode>>;

    /// Replaces the content of `file_id` with the local file at `path`.
    ///
    /// The identifier of the remote object is preserved.
    fn update_file<'a>(
        &'a self,
        path: &'a Path,
        file_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RemoteNode>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_builders() {
        let folder = RemoteNode::folder("f1", "proj")
            .with_parent("root")
            .with_link("https://drive.google.com/drive/folders/f1");

        assert!(folder.is_folder());
        assert_eq!(folder.parent_id.as_deref(), Some("root"));
        assert!(folder.link.is_some());

        let file = RemoteNode::file("x1", "a.txt");
        assert!(!file.is_folder());
        assert!(file.parent_id.is_none());
    }

    #[test]
    fn node_kind_serializes_lowercase() {
        let json = serde_json::to_string(&NodeKind::Folder).unwrap();
        assert_eq!(json, "\"folder\"");
    }
}
