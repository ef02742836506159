//! Reserve → upload → commit protocol for Game Center localization images.

use std::path::{Path, PathBuf};

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::asc::{ApiError, AppStoreConnectClient};
use crate::gamecenter::ItemKind;
use crate::util::{asset_delivery_state, truncate};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed reservation: {0}")]
    Reservation(String),
    #[error("no upload operations returned (state: {state})")]
    EmptyReservation { state: String },
    #[error("upload range {offset}+{length} exceeds file size {size}")]
    RangeOutOfBounds { offset: u64, length: u64, size: u64 },
    #[error("unsupported upload method {0}")]
    Method(String),
    #[error("upload to {url} failed {status}: {message}")]
    Transfer {
        url: String,
        status: StatusCode,
        message: String,
    },
    #[error("upload request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl UploadError {
    /// Stage label used in progress lines.
    pub fn stage(&self) -> &'static str {
        match self {
            UploadError::Io { .. } => "READ FAILED",
            UploadError::Reservation(_) | UploadError::EmptyReservation { .. } => {
                "RESERVE FAILED"
            }
            UploadError::Api(_) => "API FAILED",
            _ => "UPLOAD FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestHeader {
    pub name: String,
    pub value: String,
}

/// One byte range the API wants sent to `url`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOperation {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub offset: u64,
    pub length: u64,
    #[serde(default)]
    pub request_headers: Vec<RequestHeader>,
}

#[derive(Debug, Clone)]
pub struct Reservation {
    pub image_id: String,
    pub operations: Vec<UploadOperation>,
    pub state: Option<String>,
}

impl Reservation {
    pub fn from_response(document: &Value) -> Result<Self, UploadError> {
        let data = document
            .get("data")
            .filter(|d| !d.is_null())
            .ok_or_else(|| UploadError::Reservation("missing data".into()))?;
        let image_id = data
            .get("id")
            .and_then(|s| s.as_str())
            .ok_or_else(|| UploadError::Reservation("missing image id".into()))?
            .to_string();
        let operations: Vec<UploadOperation> = match data
            .get("attributes")
            .and_then(|a| a.get("uploadOperations"))
        {
            Some(ops) if !ops.is_null() => serde_json::from_value(ops.clone())
                .map_err(|e| UploadError::Reservation(e.to_string()))?,
            _ => Vec::new(),
        };
        let state = asset_delivery_state(data);
        if operations.is_empty() {
            return Err(UploadError::EmptyReservation {
                state: state.unwrap_or_default(),
            });
        }
        Ok(Self {
            image_id,
            operations,
            state,
        })
    }
}

pub fn operation_bytes<'a>(data: &'a [u8], op: &UploadOperation) -> Result<&'a [u8], UploadError> {
    let size = data.len() as u64;
    let end = op
        .offset
        .checked_add(op.length)
        .filter(|end| *end <= size)
        .ok_or(UploadError::RangeOutOfBounds {
            offset: op.offset,
            length: op.length,
            size,
        })?;
    Ok(&data[op.offset as usize..end as usize])
}

/// Slices `data` for every operation, failing before anything is sent if a
/// range falls outside the file.
pub fn plan_chunks<'a>(
    data: &'a [u8],
    operations: &[UploadOperation],
) -> Result<Vec<&'a [u8]>, UploadError> {
    operations
        .iter()
        .map(|op| operation_bytes(data, op))
        .collect()
}

/// Sends each chunk to its operation's URL. These are storage URLs, not API
/// endpoints, so no bearer token is attached.
pub async fn send_operations(
    client: &AppStoreConnectClient,
    operations: &[UploadOperation],
    data: &[u8],
) -> Result<u64, UploadError> {
    let chunks = plan_chunks(data, operations)?;
    let mut sent = 0u64;
    for (op, chunk) in operations.iter().zip(chunks) {
        let method = Method::from_bytes(op.method.as_bytes())
            .map_err(|_| UploadError::Method(op.method.clone()))?;
        let mut req = client.http().request(method, op.url.as_str());
        for header in &op.request_headers {
            req = req.header(header.name.as_str(), header.value.as_str());
        }
        debug!(url = %op.url, offset = op.offset, length = op.length, "uploading chunk");
        let res = req.body(chunk.to_vec()).send().await?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(UploadError::Transfer {
                url: op.url.clone(),
                status,
                message: truncate(&text, 300).to_string(),
            });
        }
        sent += chunk.len() as u64;
    }
    Ok(sent)
}

/// Deletes the image currently attached to a localization.
///
/// Returns the id of the removed image, or `None` when there was nothing to
/// remove. A failed lookup, or a DELETE answered with 404, counts as
/// "nothing attached".
pub async fn remove_existing_image(
    client: &AppStoreConnectClient,
    kind: ItemKind,
    localization_id: &str,
) -> Result<Option<String>, ApiError> {
    let image_id = match client.localization_image_id(kind, localization_id).await {
        Ok(Some(id)) => id,
        Ok(None) => return Ok(None),
        Err(error) => {
            debug!(%error, localization_id, "no existing image to delete");
            return Ok(None);
        }
    };
    match client.delete_image(kind, &image_id).await {
        Ok(()) => Ok(Some(image_id)),
        Err(error) if error.is_not_found() => {
            debug!(%image_id, "image was already gone");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub image_id: String,
    pub file_name: String,
    pub bytes: u64,
    pub operations: usize,
    pub state: String,
}

/// Reserves an image resource for `path`, streams its bytes and commits it.
pub async fn upload_image(
    client: &AppStoreConnectClient,
    kind: ItemKind,
    localization_id: &str,
    path: &Path,
) -> Result<UploadedImage, UploadError> {
    let data = std::fs::read(path).map_err(|source| UploadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let reserved = client
        .reserve_image(kind, localization_id, &file_name, data.len() as u64)
        .await?;
    let reservation = Reservation::from_response(&reserved)?;

    let bytes = send_operations(client, &reservation.operations, &data).await?;

    let committed = client.commit_image(kind, &reservation.image_id).await?;
    let state = committed
        .get("data")
        .and_then(asset_delivery_state)
        .unwrap_or_else(|| "UNKNOWN".to_string());

    Ok(UploadedImage {
        image_id: reservation.image_id,
        file_name,
        bytes,
        operations: reservation.operations.len(),
        state,
    })
}
