use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    AlreadyPresent,
}

/// Writes `data` to `path` unless a file is already there.
///
/// The check and the write are not atomic against another writer of the same
/// path; both would write identical bytes, and the rename keeps readers from
/// ever observing a partial file.
pub async fn write_if_absent(path: &Path, data: &[u8], sync: bool) -> io::Result<WriteOutcome> {
    match fs::metadata(path).await {
        Ok(_) => return Ok(WriteOutcome::AlreadyPresent),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    write_atomic(path, data, sync).await?;
    Ok(WriteOutcome::Written)
}

async fn write_atomic(path: &Path, data: &[u8], sync: bool) -> io::Result<PathBuf> {
    let tmp = tmp_path(path);
    let result = async {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .await?;
        file.write_all(data).await?;
        file.flush().await?;
        if sync {
            file.sync_all().await?;
        }
        drop(file);
        fs::rename(&tmp, path).await
    }
    .await;
    if let Err(err) = result {
        let _ = fs::remove_file(&tmp).await;
        return Err(err);
    }
    Ok(path.to_path_buf())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn existing_file_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        std::fs::write(&path, b"first").unwrap();

        let outcome = write_if_absent(&path, b"second", false).await.unwrap();
        assert_eq!(outcome, WriteOutcome::AlreadyPresent);
        assert_eq!(std::fs::read(&path).unwrap(), b"first");
    }

    #[tokio::test]
    async fn writes_without_leaving_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");

        let outcome = write_if_absent(&path, b"payload", true).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
