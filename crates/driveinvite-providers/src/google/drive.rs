//! Google Drive v3 client.
//!
//! Implements [`RemoteDirectory`] over the Drive REST API. Files are sent
//! with a single multipart upload (metadata + media) on creation and a
//! media-only PATCH on update, so the file id is preserved.

use std::path::Path;
use std::sync::Arc;

use rand::Rng as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::TokenSource;
use crate::error::{ProviderError, ProviderResult};
use crate::remote::{BoxFuture, NodeKind, RemoteDirectory, RemoteNode};

use super::config::GoogleConfig;
use super::http::{build_http_client, check_status, read_json, transport_error};

const SERVICE: &str = "drive";

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const NODE_FIELDS: &str = "id,name,mimeType,webViewLink";
const LIST_FIELDS: &str = "files(id,name,mimeType,webViewLink)";

/// Drive API client.
pub struct DriveClient {
    http_client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    api_base: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    web_view_link: Option<String>,
}

impl DriveFile {
    fn into_node(self, parent_id: Option<&str>) -> RemoteNode {
        let kind = if self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE) {
            NodeKind::Folder
        } else {
            NodeKind::File
        };
        RemoteNode {
            id: self.id,
            name: self.name,
            parent_id: parent_id.map(String::from),
            kind,
            link: self.web_view_link,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    parents: [&'a str; 1],
}

impl DriveClient {
    pub fn new(tokens: Arc<dyn TokenSource>, config: &GoogleConfig) -> ProviderResult<Self> {
        Ok(Self {
            http_client: build_http_client(config.timeout, &config.user_agent)?,
            tokens,
            api_base: config.endpoints.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.api_base)
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/drive/v3/files", self.api_base)
    }

    async fn list_first(
        &self,
        query: String,
        parent_id: &str,
    ) -> ProviderResult<Option<RemoteNode>> {
        let token = self.tokens.access_token().await?;
        debug!(q = %query, "searching drive");

        let response = self
            .http_client
            .get(self.files_url())
            .bearer_auth(token)
            .query(&[("q", query.as_str()), ("spaces", "drive"), ("fields", LIST_FIELDS)])
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = check_status(SERVICE, response).await?;
        let list: FileList = read_json(SERVICE, response).await?;

        if list.files.len() > 1 {
            debug!(matches = list.files.len(), "several matches, taking the first");
        }
        Ok(list
            .files
            .into_iter()
            .next()
            .map(|f| f.into_node(Some(parent_id))))
    }

    async fn find_folder_impl(
        &self,
        name: &str,
        parent_id: &str,
    ) -> ProviderResult<Option<RemoteNode>> {
        self.list_first(search_query(name, parent_id, Some(FOLDER_MIME_TYPE)), parent_id)
            .await
    }

    async fn find_file_impl(
        &self,
        folder_id: &str,
        name: &str,
    ) -> ProviderResult<Option<RemoteNode>> {
        self.list_first(search_query(name, folder_id, None), folder_id)
            .await
    }

    async fn create_folder_impl(&self, name: &str, parent_id: &str) -> ProviderResult<RemoteNode> {
        let token = self.tokens.access_token().await?;
        let metadata = FileMetadata {
            name,
            mime_type: Some(FOLDER_MIME_TYPE),
            parents: [parent_id],
        };

        let response = self
            .http_client
            .post(self.files_url())
            .bearer_auth(token)
            .query(&[("fields", NODE_FIELDS)])
            .json(&metadata)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = check_status(SERVICE, response).await?;
        let file: DriveFile = read_json(SERVICE, response).await?;

        debug!(name, id = %file.id, "folder created");
        Ok(file.into_node(Some(parent_id)))
    }

    async fn upload_file_impl(&self, path: &Path, parent_id: &str) -> ProviderResult<RemoteNode> {
        let name = file_name(path)?;
        let content = read_local(path).await?;
        let mime_type = guess_mime_type(path);
        let metadata = FileMetadata {
            name: &name,
            mime_type: None,
            parents: [parent_id],
        };
        let metadata = serde_json::to_vec(&metadata)
            .map_err(|e| ProviderError::internal(format!("failed to encode metadata: {}", e)))?;

        let boundary = upload_boundary();
        let body = multipart_related(&boundary, &metadata, mime_type, &content);

        let token = self.tokens.access_token().await?;
        let response = self
            .http_client
            .post(self.upload_url())
            .bearer_auth(token)
            .query(&[("uploadType", "multipart"), ("fields", NODE_FIELDS)])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = check_status(SERVICE, response).await?;
        let file: DriveFile = read_json(SERVICE, response).await?;

        debug!(name = %name, id = %file.id, bytes = content.len(), "file uploaded");
        Ok(file.into_node(Some(parent_id)))
    }

    async fn update_file_impl(&self, path: &Path, file_id: &str) -> ProviderResult<RemoteNode> {
        let content = read_local(path).await?;
        let size = content.len();

        let token = self.tokens.access_token().await?;
        let response = self
            .http_client
            .patch(format!("{}/{}", self.upload_url(), urlencoding::encode(file_id)))
            .bearer_auth(token)
            .query(&[("uploadType", "media"), ("fields", NODE_FIELDS)])
            .header(reqwest::header::CONTENT_TYPE, guess_mime_type(path))
            .body(content)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = check_status(SERVICE, response).await?;
        let file: DriveFile = read_json(SERVICE, response).await?;

        debug!(id = %file.id, bytes = size, "file updated");
        Ok(file.into_node(None))
    }
}

impl RemoteDirectory for DriveClient {
    fn name(&self) -> &str {
        SERVICE
    }

    fn find_folder<'a>(
        &'a self,
        name: &'a str,
        parent_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Option<RemoteNode>>> {
        Box::pin(self.find_folder_impl(name, parent_id))
    }

    fn create_folder<'a>(
        &'a self,
        name: &'a str,
        parent_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RemoteNode>> {
        Box::pin(self.create_folder_impl(name, parent_id))
    }

    fn find_file_in_folder<'a>(
        &'a self,
        folder_id: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Option<RemoteNode>>> {
        Box::pin(self.find_file_impl(folder_id, name))
    }

    fn upload_file<'a>(
        &'a self,
        path: &'a Path,
        parent_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RemoteNode>> {
        Box::pin(self.upload_file_impl(path, parent_id))
    }

    fn update_file<'a>(
        &'a self,
        path: &'a Path,
        file_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RemoteNode>> {
        Box::pin(self.update_file_impl(path, file_id))
    }
}

/// Escapes a value for use inside a single-quoted Drive query string.
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn search_query(name: &str, parent_id: &str, mime_type: Option<&str>) -> String {
    let mut query = format!("'{}' in parents", escape_query_value(parent_id));
    if let Some(mime_type) = mime_type {
        query.push_str(&format!(" and mimeType='{}'", mime_type));
    }
    query.push_str(&format!(
        " and name='{}' and trashed=false",
        escape_query_value(name)
    ));
    query
}

fn file_name(path: &Path) -> ProviderResult<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ProviderError::local_io(format!("{} has no file name", path.display())))
}

async fn read_local(path: &Path) -> ProviderResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        ProviderError::local_io(format!("failed to read {}: {}", path.display(), e))
            .with_provider(SERVICE)
            .with_source(e)
    })
}

fn upload_boundary() -> String {
    format!("driveinvite_{:016x}", rand::rng().random::<u64>())
}

fn multipart_related(boundary: &str, metadata: &[u8], mime_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + content.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

/// Guesses an upload content type from the file extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "htm" | "html" => "text/html",
        "ics" => "text/calendar",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}
