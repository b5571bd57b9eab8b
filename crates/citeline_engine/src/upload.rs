use std::path::{Path, PathBuf};

use crate::{ClientError, FailureKind};

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("only PDF files can be uploaded: {}", .0.display())]
    NotPdf(PathBuf),
    #[error("file too large ({actual} bytes, maximum {max_bytes})")]
    TooLarge { max_bytes: u64, actual: u64 },
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<UploadError> for ClientError {
    fn from(err: UploadError) -> Self {
        ClientError::new(FailureKind::InvalidUpload, err.to_string())
    }
}

/// A local document that passed validation and is ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Reads `path` for upload, applying the same checks the backend enforces.
pub async fn read_upload(path: &Path, max_bytes: u64) -> Result<UploadFile, UploadError> {
    if !has_pdf_extension(path) {
        return Err(UploadError::NotPdf(path.to_path_buf()));
    }
    let unreadable = |source| UploadError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let metadata = tokio::fs::metadata(path).await.map_err(unreadable)?;
    if metadata.len() > max_bytes {
        return Err(UploadError::TooLarge {
            max_bytes,
            actual: metadata.len(),
        });
    }
    let bytes = tokio::fs::read(path).await.map_err(unreadable)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    Ok(UploadFile { filename, bytes })
}

#[cfg(test)]
mod tests {
    use super::has_pdf_extension;
    use std::path::Path;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_pdf_extension(Path::new("/tmp/Report.PDF")));
        assert!(has_pdf_extension(Path::new("paper.pdf")));
        assert!(!has_pdf_extension(Path::new("paper.pdf.txt")));
        assert!(!has_pdf_extension(Path::new("pdf")));
    }
}
