pub mod naming;

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::AppError;

pub const AUDIO_DIR: &str = "audios";
pub const UPLOAD_DIR: &str = "uploads";
pub const TEMP_DIR: &str = "tmp";
pub const PROJECT_DIR: &str = "projects";

const STANDARD_DIRS: [&str; 4] = [AUDIO_DIR, UPLOAD_DIR, TEMP_DIR, PROJECT_DIR];

/// What an artifact is; decides its directory and filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Speech,
    Conversion,
    Upload,
    Inbound,
}

impl Category {
    pub fn dir(self) -> &'static str {
        match self {
            Category::Speech | Category::Conversion => AUDIO_DIR,
            Category::Upload => UPLOAD_DIR,
            Category::Inbound => TEMP_DIR,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Category::Speech => "speech",
            Category::Conversion => "sts",
            Category::Upload => "upload",
            Category::Inbound => "inbound",
        }
    }
}

/// Store-root-relative path with `/` separators, safe to hand to clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PublicRef(String);

impl PublicRef {
    fn new(dir: &str, file_name: &str) -> Self {
        Self(format!("{}/{}", dir, file_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for PublicRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioned {
    Created(PathBuf),
    AlreadyExists(PathBuf),
}

impl Provisioned {
    pub fn path(&self) -> &Path {
        match self {
            Provisioned::Created(path) | Provisioned::AlreadyExists(path) => path.as_path(),
        }
    }

    pub fn name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Create every directory (and its parents) that does not exist yet.
///
/// Safe to race: a directory that appears concurrently is not an error.
pub async fn ensure_directories<I, P>(paths: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    for path in paths {
        let path = path.as_ref();
        fs::create_dir_all(path).await?;
        tracing::debug!("Directory ready: {}", path.display());
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open a store at `root`, provisioning the root and its standard subdirectories.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        let dirs = std::iter::once(root.clone()).chain(STANDARD_DIRS.iter().map(|d| root.join(d)));
        ensure_directories(dirs).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, reference: &PublicRef) -> PathBuf {
        reference
            .as_str()
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Persist `bytes` under a fresh name and return its public reference.
    ///
    /// The file only becomes visible under its final name once fully written.
    pub async fn write_artifact(
        &self,
        category: Category,
        bytes: &[u8],
        extension: &str,
    ) -> Result<PublicRef, AppError> {
        let dir = self.root.join(category.dir());

        loop {
            let name = naming::file_name(category.prefix(), naming::next_stamp(), extension);
            let final_path = dir.join(&name);
            if fs::try_exists(&final_path).await? {
                continue;
            }

            // Staged outside the served directories; rename is atomic within one filesystem.
            let part_path = self.root.join(TEMP_DIR).join(format!(".{}.part", name));
            match write_part(&part_path, bytes).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    discard_part(&part_path).await;
                    return Err(e.into());
                }
            }

            if let Err(e) = fs::rename(&part_path, &final_path).await {
                discard_part(&part_path).await;
                return Err(e.into());
            }

            let reference = PublicRef::new(category.dir(), &name);
            tracing::debug!("Wrote artifact {} ({} bytes)", reference, bytes.len());
            return Ok(reference);
        }
    }

    /// Drain `chunks` in order, then persist the concatenation as one artifact.
    ///
    /// Nothing is written if the stream yields an error or no bytes at all.
    pub async fn write_artifact_from_chunks<S, E>(
        &self,
        category: Category,
        chunks: S,
        extension: &str,
    ) -> Result<PublicRef, AppError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: fmt::Display,
    {
        let mut chunks = std::pin::pin!(chunks);
        let mut buffer = Vec::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| AppError::UpstreamStream(e.to_string()))?;
            buffer.extend_from_slice(&chunk);
        }

        if buffer.is_empty() {
            return Err(AppError::Upstream("provider returned no audio".into()));
        }

        self.write_artifact(category, &buffer, extension).await
    }

    /// Create `projects/<sanitized name>`, reporting whether it was already there.
    pub async fn create_named_subdirectory(&self, name: &str) -> Result<Provisioned, AppError> {
        let dir_name = naming::sanitize(name);
        if dir_name.is_empty() {
            return Err(AppError::BadRequest("Directory name cannot be empty".into()));
        }

        let path = self.root.join(PROJECT_DIR).join(&dir_name);
        match fs::create_dir(&path).await {
            Ok(()) => Ok(Provisioned::Created(path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if fs::metadata(&path).await?.is_dir() {
                    Ok(Provisioned::AlreadyExists(path))
                } else {
                    Err(e.into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a temporary upload. Failures are logged, never returned.
    pub async fn consume_temporary_upload(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => tracing::debug!("Removed temporary upload {}", path.display()),
            Err(e) => tracing::warn!(
                "Failed to remove temporary upload {}: {}",
                path.display(),
                e
            ),
        }
    }
}

async fn write_part(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

async fn discard_part(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!("Failed to discard partial file {}: {}", path.display(), e);
        }
    }
}
