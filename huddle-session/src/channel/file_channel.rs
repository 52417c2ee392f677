use crate::channel::SharedChannel;
use async_trait::async_trait;
use huddle_core::ChannelError;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Store backed by a directory holding one file per key, so separate
/// processes on the same machine can share it.
///
/// A write goes to a fresh temp file in the directory and is then renamed
/// over the key's file. Readers see the old value or the new one, and writes
/// to different keys never touch the same file. Same-key writes are
/// last-writer-wins.
pub struct FileChannel {
    dir: PathBuf,
}

impl FileChannel {
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(file_name(key))
    }
}

/// Keys are display names plus a suffix, so anything outside `[A-Za-z0-9_-]`
/// is escaped as `%XX`. Escaped names never start with the `.` of temp files.
fn file_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            name.push(b as char);
        } else {
            name.push_str(&format!("%{b:02X}"));
        }
    }
    name
}

fn replace_file(dir: &Path, target: &Path, value: &[u8]) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(value)?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl SharedChannel for FileChannel {
    async fn write(&self, key: &str, value: String) -> Result<(), ChannelError> {
        debug!(dir = %self.dir.display(), key, "file store write");
        let dir = self.dir.clone();
        let target = self.entry_path(key);
        tokio::task::spawn_blocking(move || replace_file(&dir, &target, value.as_bytes()))
            .await
            .map_err(io::Error::other)??;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<String>, ChannelError> {
        match tokio::fs::read_to_string(self.entry_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), ChannelError> {
        match tokio::fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
