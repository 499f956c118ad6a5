//! Google Drive v3 collaborators: folder listing and invoice download.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Deserialize;

use crate::error::FetchError;
use crate::grid::{CellGrid, SheetGrid};
use crate::http_client::google_client;
use crate::pipeline::{CandidateFile, ContentFetcher, FileLister};

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

/// Drive client watching a single folder.
pub struct DriveClient {
    access_token: String,
    folder_id: String,
    /// Only files created inside this window are listed, mirroring how the
    /// trigger fires every few minutes.
    lookback: Duration,
}

#[derive(Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: Option<String>,
    created_time: Option<DateTime<Utc>>,
}

impl DriveClient {
    pub fn new(access_token: String, folder_id: String, lookback_minutes: i64) -> Self {
        Self {
            access_token,
            folder_id,
            lookback: Duration::minutes(lookback_minutes),
        }
    }
}

#[async_trait]
impl FileLister for DriveClient {
    async fn list_files(&self) -> Result<Vec<CandidateFile>, FetchError> {
        let threshold =
            (Utc::now() - self.lookback).to_rfc3339_opts(SecondsFormat::Secs, true);
        let query = format!(
            "'{}' in parents and createdTime > '{}'",
            self.folder_id, threshold
        );
        tracing::debug!("Drive query: {}", query);

        let response = google_client()
            .get(DRIVE_FILES_URL)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id, name, createdTime, mimeType)"),
                ("orderBy", "createdTime desc"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("Drive list request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchError::Transport(format!(
                "Drive list returned {}",
                response.status()
            )));
        }

        let body: FileListResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Transport(format!("Drive list response unreadable: {}", e)))?;

        tracing::info!(
            "{} file(s) created in the last {} minute(s)",
            body.files.len(),
            self.lookback.num_minutes()
        );

        Ok(body
            .files
            .into_iter()
            .map(|f| CandidateFile {
                id: f.id,
                name: f.name,
                mime_type: f.mime_type,
                created_time: f.created_time,
            })
            .collect())
    }
}

#[async_trait]
impl ContentFetcher for DriveClient {
    async fn fetch_grid(&self, file: &CandidateFile) -> Result<Box<dyn CellGrid>, FetchError> {
        let url = format!("{}/{}", DRIVE_FILES_URL, file.id);
        let response = google_client()
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("download of {} failed: {}", file.name, e)))?;

        if !response.status().is_success() {
            return Err(FetchError::Transport(format!(
                "download of {} returned {}",
                file.name,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("download of {} truncated: {}", file.name, e)))?;
        tracing::debug!("downloaded {} bytes for {}", bytes.len(), file.name);

        let grid = SheetGrid::from_bytes(&file.name, bytes.to_vec())?;
        Ok(Box::new(grid))
    }
}
