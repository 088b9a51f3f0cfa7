/// Per-trick archive storage on the local filesystem
///
/// Each trick owns at most one uploaded archive, kept at
/// `{root}/{trick_id}/{file_name}`. Replacing an archive removes the whole
/// folder before the new file is written, so folders never accumulate stale
/// uploads.
///
/// # Example
///
/// ```no_run
/// use bytes::Bytes;
/// use tricks_shared::archive::{ArchiveStore, UploadedArchive};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = ArchiveStore::new("./storage/archives");
/// let trick_id = Uuid::new_v4();
///
/// let upload = UploadedArchive::new("demo.zip", Bytes::from_static(b"PK..."))?;
/// store.store(trick_id, &upload).await?;
///
/// let current = store.current(trick_id).await?;
/// assert_eq!(current.map(|a| a.name), Some("demo.zip".to_string()));
/// # Ok(())
/// # }
/// ```

use bytes::Bytes;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Error type for archive storage operations
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The client supplied a file name that cannot be stored
    #[error("Invalid archive file name: {0:?}")]
    InvalidFileName(String),

    /// Filesystem operation failed
    #[error("Archive I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// An uploaded archive waiting to be moved into a trick's folder
#[derive(Debug, Clone)]
pub struct UploadedArchive {
    file_name: String,
    data: Bytes,
}

impl UploadedArchive {
    /// Wraps an upload, reducing the client file name to its last component
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::InvalidFileName` when nothing usable remains.
    pub fn new(client_file_name: &str, data: Bytes) -> Result<Self, ArchiveError> {
        let file_name = sanitize_file_name(client_file_name)
            .ok_or_else(|| ArchiveError::InvalidFileName(client_file_name.to_string()))?;

        Ok(Self { file_name, data })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// Archive currently attached to a trick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveFile {
    pub name: String,
    pub size_bytes: u64,
}

/// Reduces a client-supplied file name to a safe final path component
///
/// Both `/` and `\` count as separators since browsers on Windows may send
/// full paths.
///
/// ```
/// use tricks_shared::archive::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name(r"C:\Users\me\demo.zip"), Some("demo.zip".to_string()));
/// assert_eq!(sanitize_file_name("../.."), None);
/// ```
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("").trim();

    if last.is_empty() || last == "." || last == ".." || last.chars().any(char::is_control) {
        return None;
    }

    Some(last.to_string())
}

/// Filesystem-backed archive storage rooted at one directory
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: PathBuf,
}

impl ArchiveStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder holding the archive of `trick_id`
    pub fn folder(&self, trick_id: Uuid) -> PathBuf {
        self.root.join(trick_id.to_string())
    }

    /// The archive stored for a trick, if any
    ///
    /// When a folder somehow holds several files the first by name wins.
    pub async fn current(&self, trick_id: Uuid) -> Result<Option<ArchiveFile>, ArchiveError> {
        let folder = self.folder(trick_id);

        let mut entries = match fs::read_dir(&folder).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ArchiveError::io(&folder, e)),
        };

        let mut found: Option<ArchiveFile> = None;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ArchiveError::io(&folder, e))?
        {
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| ArchiveError::io(&entry.path(), e))?;
            if !metadata.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if found.as_ref().map_or(true, |f| name < f.name) {
                found = Some(ArchiveFile {
                    name,
                    size_bytes: metadata.len(),
                });
            }
        }

        Ok(found)
    }

    /// Moves an upload into the trick's folder, creating it when needed
    pub async fn store(
        &self,
        trick_id: Uuid,
        upload: &UploadedArchive,
    ) -> Result<PathBuf, ArchiveError> {
        let folder = self.folder(trick_id);
        fs::create_dir_all(&folder)
            .await
            .map_err(|e| ArchiveError::io(&folder, e))?;

        let path = folder.join(upload.file_name());
        fs::write(&path, upload.data())
            .await
            .map_err(|e| ArchiveError::io(&path, e))?;

        info!(
            %trick_id,
            file_name = upload.file_name(),
            bytes = upload.data().len(),
            "Stored trick archive"
        );
        Ok(path)
    }

    /// Deletes the existing folder, then stores the upload in a fresh one
    pub async fn replace(
        &self,
        trick_id: Uuid,
        upload: &UploadedArchive,
    ) -> Result<PathBuf, ArchiveError> {
        self.delete_folder(trick_id).await?;
        self.store(trick_id, upload).await
    }

    /// Recursively removes the trick's folder
    ///
    /// Returns `false` when there was no folder to remove.
    pub async fn delete_folder(&self, trick_id: Uuid) -> Result<bool, ArchiveError> {
        let folder = self.folder(trick_id);

        match fs::remove_dir_all(&folder).await {
            Ok(()) => {
                info!(%trick_id, "Deleted trick archive folder");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%trick_id, "No archive folder to delete");
                Ok(false)
            }
            Err(e) => Err(ArchiveError::io(&folder, e)),
        }
    }
}
