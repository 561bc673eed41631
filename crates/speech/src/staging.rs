use std::path::Path;

use tempfile::NamedTempFile;

use crate::{AudioEncoding, AudioUpload, error::Result};

/// Prefix for staged upload files
const STAGING_PREFIX: &str = "nova-";

/// An upload written to a temporary file
///
/// The file is removed when the value is dropped, so every exit path of a
/// request cleans up after itself.
#[derive(Debug)]
pub struct StagedAudio {
    file: NamedTempFile,
    filename: String,
    encoding: AudioEncoding,
}

impl StagedAudio {
    /// Write the upload into a fresh temporary file
    ///
    /// `dir` overrides the system temporary directory.
    pub async fn stage(upload: &AudioUpload, dir: Option<&Path>) -> Result<Self> {
        let suffix = staging_suffix(&upload.filename);

        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX).suffix(&suffix);

        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        tokio::fs::write(file.path(), &upload.bytes).await?;

        tracing::debug!(
            path = %file.path().display(),
            bytes = upload.bytes.len(),
            "staged upload"
        );

        Ok(Self {
            file,
            filename: upload.filename.clone(),
            encoding: AudioEncoding::from_filename(&upload.filename),
        })
    }

    /// Read the staged audio back
    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.file.path()).await?)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Name the client gave the upload
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }
}

/// Keep a plain extension so the staged file is recognisable on disk
fn staging_suffix(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(filename: &str, bytes: &[u8]) -> AudioUpload {
        AudioUpload {
            bytes: bytes.to_vec(),
            filename: filename.to_string(),
            content_type: "audio/mpeg".to_string(),
        }
    }

    #[tokio::test]
    async fn staged_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedAudio::stage(&upload("call.MP3", b"ID3 fake audio"), Some(dir.path()))
            .await
            .unwrap();

        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("nova-"));
        assert_eq!(path.extension().unwrap(), "mp3");
        assert_eq!(staged.encoding(), AudioEncoding::Mp3);
        assert_eq!(staged.read().await.unwrap(), b"ID3 fake audio");

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn hostile_filename_does_not_escape_dir() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedAudio::stage(&upload("../../etc/passwd", b"x"), Some(dir.path()))
            .await
            .unwrap();

        assert_eq!(staged.path().parent().unwrap(), dir.path());
        assert_eq!(staged.filename(), "../../etc/passwd");
        assert_eq!(staged.encoding(), AudioEncoding::EncodingUnspecified);
    }

    #[test]
    fn suffixes() {
        assert_eq!(staging_suffix("memo.m4a"), ".m4a");
        assert_eq!(staging_suffix("memo"), "");
        assert_eq!(staging_suffix("memo.tar.gz/../x"), "");
        assert_eq!(staging_suffix("memo.we!rd"), "");
    }
}
