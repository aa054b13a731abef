//! Image uploads to object storage.
//!
//! An [`Upload`] runs on its own task and exposes progress as a stream of
//! whole percentages followed by a single terminal result, so callers can
//! either watch progress or just await the download URL.

use crate::models::draft::MAX_IMAGES;
use crate::models::ListingDraft;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

/// Largest accepted image
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Bytes sent per part
pub const CHUNK_SIZE: usize = 256 * 1024;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Image upload failed (2 mb max per image): {name} is {size} bytes")]
    TooLarge { name: String, size: usize },

    #[error("You can only upload {} images per listing", MAX_IMAGES)]
    TooMany,

    #[error("No images selected")]
    Empty,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Upload task stopped before finishing")]
    Aborted,
}

/// Chunked object storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` of `object` starting at `offset`
    async fn put_part(&self, object: &str, offset: usize, bytes: &[u8]) -> Result<(), UploadError>;

    /// Finish the object and return its download URL
    async fn complete(&self, object: &str) -> Result<String, UploadError>;
}

/// A running upload
pub struct Upload {
    object: String,
    progress: UnboundedReceiverStream<u8>,
    task: JoinHandle<Result<String, UploadError>>,
}

impl Upload {
    /// Storage name of the object being written
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Percentages written so far, non-decreasing, ending at 100 on success
    pub fn progress(&mut self) -> &mut UnboundedReceiverStream<u8> {
        &mut self.progress
    }

    /// Handle that stops the upload task
    pub fn abort_handle(&self) -> AbortHandle {
        self.task.abort_handle()
    }

    /// Wait for the download URL
    pub async fn finish(self) -> Result<String, UploadError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Upload of {} aborted: {}", self.object, e);
                Err(UploadError::Aborted)
            }
        }
    }
}

/// Storage name for a file: upload time in millis followed by the file name
pub fn object_name(file_name: &str) -> String {
    format!("{}{}", Utc::now().timestamp_millis(), file_name)
}

/// Start uploading `bytes` on a background task
pub fn start_upload(
    store: Arc<dyn ObjectStore>,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<Upload, UploadError> {
    check_size(file_name, &bytes)?;

    let object = object_name(file_name);
    let (tx, rx) = mpsc::unbounded_channel();

    let name = object.clone();
    let task = tokio::spawn(async move {
        let total = bytes.len();
        // A dropped receiver just means nobody is watching
        let _ = tx.send(0);

        let mut sent = 0;
        for chunk in bytes.chunks(CHUNK_SIZE) {
            store.put_part(&name, sent, chunk).await?;
            sent += chunk.len();
            let _ = tx.send((sent * 100 / total) as u8);
        }
        if total == 0 {
            let _ = tx.send(100);
        }

        let url = store.complete(&name).await?;
        debug!("Uploaded {} ({} bytes)", name, total);
        Ok::<_, UploadError>(url)
    });

    Ok(Upload {
        object,
        progress: UnboundedReceiverStream::new(rx),
        task,
    })
}

fn check_size(file_name: &str, bytes: &[u8]) -> Result<(), UploadError> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(UploadError::TooLarge {
            name: file_name.to_string(),
            size: bytes.len(),
        });
    }
    Ok(())
}

/// Upload `files` concurrently and add their URLs to the draft.
/// On any failure the draft is left as it was and the other uploads of the
/// batch are stopped.
pub async fn upload_listing_images(
    store: Arc<dyn ObjectStore>,
    draft: &mut ListingDraft,
    files: Vec<(String, Vec<u8>)>,
) -> Result<usize, UploadError> {
    if files.is_empty() {
        return Err(UploadError::Empty);
    }
    if files.len() + draft.image_urls.len() > MAX_IMAGES {
        return Err(UploadError::TooMany);
    }

    // Nothing is spawned unless every file fits
    for (name, bytes) in &files {
        check_size(name, bytes)?;
    }

    let uploads = files
        .into_iter()
        .map(|(name, bytes)| start_upload(store.clone(), &name, bytes))
        .collect::<Result<Vec<_>, _>>()?;
    let aborts: Vec<AbortHandle> = uploads.iter().map(Upload::abort_handle).collect();

    let urls = match try_join_all(uploads.into_iter().map(Upload::finish)).await {
        Ok(urls) => urls,
        Err(e) => {
            warn!("Image batch failed, stopping {} uploads: {}", aborts.len(), e);
            for handle in &aborts {
                handle.abort();
            }
            return Err(e);
        }
    };
    let count = urls.len();
    draft.image_urls.extend(urls);
    info!("Added {} images to listing draft", count);
    Ok(count)
}

/// Object store held in memory
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    reject: Option<String>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every object whose name contains `pattern`
    pub fn rejecting(pattern: &str) -> Self {
        Self {
            reject: Some(pattern.to_string()),
            ..Default::default()
        }
    }

    pub async fn object(&self, name: &str) -> Option<Vec<u8>> {
        self.objects.lock().await.get(name).cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_part(&self, object: &str, offset: usize, bytes: &[u8]) -> Result<(), UploadError> {
        if let Some(pattern) = &self.reject {
            if object.contains(pattern.as_str()) {
                return Err(UploadError::Storage(format!("{} rejected", object)));
            }
        }
        let mut objects = self.objects.lock().await;
        let data = objects.entry(object.to_string()).or_default();
        if data.len() != offset {
            return Err(UploadError::Storage(format!(
                "{}: part at {} but {} bytes written",
                object,
                offset,
                data.len()
            )));
        }
        data.extend_from_slice(bytes);
        Ok(())
    }

    async fn complete(&self, object: &str) -> Result<String, UploadError> {
        let mut objects = self.objects.lock().await;
        objects.entry(object.to_string()).or_default();
        Ok(format!("memory://images/{}", object))
    }
}
