// partially (c) 2016 Google Inc. (Lewin Bormann, lewinb@google.com)
//
// See project root for licensing information.
//
pub use crate::types::TokenInfo;

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Implement your own token storage solution by implementing this trait. You need a way to
/// store and retrieve tokens.
///
/// There is exactly one token per storage: the authenticator asks for it once on startup, and
/// hands over a replacement whenever a new one was obtained.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Store a token, replacing whatever was stored before.
    async fn set(&self, token: TokenInfo) -> io::Result<()>;

    /// Retrieve the stored token. `None` means no usable token is stored.
    async fn get(&self) -> Option<TokenInfo>;
}

pub(crate) enum Storage {
    Memory { token: Mutex<Option<TokenInfo>> },
    Disk(DiskStorage),
    Custom(Box<dyn TokenStorage>),
}

impl Storage {
    pub(crate) async fn set(&self, token: TokenInfo) -> io::Result<()> {
        match self {
            Storage::Memory { token: stored } => {
                *stored.lock().await = Some(token);
                Ok(())
            }
            Storage::Disk(disk_storage) => disk_storage.set(token).await,
            Storage::Custom(custom_storage) => custom_storage.set(token).await,
        }
    }

    pub(crate) async fn get(&self) -> Option<TokenInfo> {
        match self {
            Storage::Memory { token } => token.lock().await.clone(),
            Storage::Disk(disk_storage) => disk_storage.get().await,
            Storage::Custom(custom_storage) => custom_storage.get().await,
        }
    }
}

/// Serializes the token to a JSON file on disk.
///
/// The file is read once, when the storage is created. A missing or unparseable file is a
/// cache miss; its parent directory is created on the first write.
pub(crate) struct DiskStorage {
    token: Mutex<Option<TokenInfo>>,
    filename: PathBuf,
}

impl DiskStorage {
    pub(crate) async fn new(filename: PathBuf) -> Self {
        let token = match load_from_file(&filename).await {
            Ok(token) => {
                log::debug!("Loaded token from {}", filename.display());
                Some(token)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Ignoring unreadable token cache {}: {}", filename.display(), e);
                None
            }
        };

        DiskStorage {
            token: Mutex::new(token),
            filename,
        }
    }

    pub(crate) async fn set(&self, token: TokenInfo) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        let json = serde_json::to_string(&token)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut lock = self.token.lock().await;
        if let Some(dir) = self.filename.parent() {
            ensure_dir(dir).await?;
        }
        let mut f = open_writeable_file(&self.filename).await?;
        f.write_all(json.as_bytes()).await?;
        f.flush().await?;
        *lock = Some(token);
        log::info!("Token stored to {}", self.filename.display());
        Ok(())
    }

    pub(crate) async fn get(&self) -> Option<TokenInfo> {
        self.token.lock().await.clone()
    }
}

async fn load_from_file(filename: &Path) -> io::Result<TokenInfo> {
    let contents = tokio::fs::read(filename).await?;
    serde_json::from_slice(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Create `dir` if it is missing. A directory that already exists is fine; any other failure
/// is handed back to the caller.
async fn ensure_dir(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
async fn open_writeable_file(filename: impl AsRef<Path>) -> io::Result<tokio::fs::File> {
    // Ensure if the file is created it's only readable and writable by the
    // current user.
    use std::os::unix::fs::OpenOptionsExt;
    let opts: tokio::fs::OpenOptions = {
        let mut opts = std::fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true).mode(0o600);
        opts.into()
    };
    opts.open(filename).await
}

#[cfg(not(unix))]
async fn open_writeable_file(filename: impl AsRef<Path>) -> io::Result<tokio::fs::File> {
    // I don't have knowledge of windows or other platforms to know how to
    // create a file that's only readable by the current user.
    tokio::fs::File::create(filename).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(access_token: &str) -> TokenInfo {
        TokenInfo {
            access_token: access_token.to_owned(),
            refresh_token: Some("refreshtoken".to_owned()),
            token_type: "Bearer".to_owned(),
            expires_at: None,
            id_token: None,
        }
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = Storage::Memory {
            token: Default::default(),
        };
        assert_eq!(storage.get().await, None);
        storage.set(token("first")).await.unwrap();
        storage.set(token("second")).await.unwrap();
        assert_eq!(storage.get().await, Some(token("second")));
    }

    #[tokio::test]
    async fn test_disk_storage_creates_directory() {
        let tempdir = tempfile::tempdir().unwrap();
        let filename = tempdir.path().join(".credentials").join("drive-token.json");

        let storage = DiskStorage::new(filename.clone()).await;
        assert_eq!(storage.get().await, None);
        storage.set(token("accesstoken")).await.unwrap();
        assert!(filename.parent().unwrap().is_dir());

        // The directory exists now; storing again must not fail.
        let storage = DiskStorage::new(filename.clone()).await;
        assert_eq!(storage.get().await, Some(token("accesstoken")));
        storage.set(token("accesstoken2")).await.unwrap();

        let reloaded = DiskStorage::new(filename).await;
        assert_eq!(reloaded.get().await, Some(token("accesstoken2")));
    }

    #[tokio::test]
    async fn test_disk_storage_ignores_garbage() {
        let tempdir = tempfile::tempdir().unwrap();
        let filename = tempdir.path().join("tokens.json");
        tokio::fs::write(&filename, b"{not json").await.unwrap();

        let storage = DiskStorage::new(filename).await;
        assert_eq!(storage.get().await, None);
    }

    #[tokio::test]
    async fn test_disk_storage_propagates_dir_failure() {
        let tempdir = tempfile::tempdir().unwrap();
        // A regular file where the cache directory should go.
        let blocker = tempdir.path().join(".credentials");
        tokio::fs::write(&blocker, b"").await.unwrap();

        let storage = DiskStorage::new(blocker.join("drive-token.json")).await;
        assert!(storage.set(token("accesstoken")).await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_dir_relative_filename() {
        assert!(ensure_dir(Path::new("")).await.is_ok());
    }
}
