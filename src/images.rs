use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{error::AppResult, tmdb::TmdbClient};

/// Local directory of downloaded posters and provider logos, keyed by
/// poster id.
#[derive(Clone, Debug)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub async fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn contains(&self, poster_id: &str) -> AppResult<bool> {
        let Some(path) = self.path_for(poster_id) else {
            return Ok(false);
        };
        Ok(tokio::fs::try_exists(path).await?)
    }

    /// Downloads `poster_id` unless it is already on disk. Returns whether a
    /// new file was written.
    pub async fn ensure(&self, tmdb: &TmdbClient, poster_id: &str) -> AppResult<bool> {
        let Some(path) = self.path_for(poster_id) else {
            warn!(poster_id = %poster_id, "refusing to store image with unsafe name");
            return Ok(false);
        };

        if tokio::fs::try_exists(&path).await? {
            return Ok(false);
        }

        let Some(bytes) = tmdb.fetch_image(poster_id).await? else {
            return Ok(false);
        };

        let size = bytes.len();
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &bytes))
            .await
            .map_err(std::io::Error::other)??;

        debug!(poster_id = %poster_id, size, "saved image");
        Ok(true)
    }

    fn path_for(&self, poster_id: &str) -> Option<PathBuf> {
        is_plain_file_name(poster_id).then(|| self.dir.join(poster_id))
    }
}

/// Writes into a uniquely named temp file in `dir`, then renames it over
/// `path`. Concurrent writers of the same image each rename a complete file.
fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tempfile::Builder::new().prefix(".").suffix(".part").tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}
