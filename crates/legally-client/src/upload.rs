//! Upload validation

use crate::error::{ClientError, ClientResult};
use std::path::Path;

/// Size units for [`format_file_size`]
const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// One file selected for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    /// File name sent to the backend
    pub file_name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    /// Create upload from memory
    #[inline]
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read upload from disk
    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(ClientError::pdf_required)?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::io(path, e))?;
        Ok(Self { file_name, bytes })
    }

    /// File size in bytes
    #[inline]
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Human-readable size
    #[inline]
    #[must_use]
    pub fn display_size(&self) -> String {
        format_file_size(self.size())
    }

    /// Reject anything that is not a non-empty `.pdf`
    pub fn validate(&self) -> ClientResult<()> {
        if !has_pdf_extension(&self.file_name) || self.bytes.is_empty() {
            tracing::debug!(file = %self.file_name, size = self.size(), "rejected upload");
            return Err(ClientError::pdf_required());
        }
        Ok(())
    }
}

fn has_pdf_extension(name: &str) -> bool {
    name.len() > 4
        && name
            .get(name.len() - 4..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".pdf"))
}

/// Format a byte count as `0 Bytes`, `1.5 KB`, `2 MB`
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1024;
        unit += 1;
    }

    let divisor = 1024_u64.pow(u32::try_from(unit).unwrap_or(0)) as f64;
    let value = format!("{:.2}", bytes as f64 / divisor);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{value} {}", SIZE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1), "1 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
        assert_eq!(format_file_size(2048 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn test_validate_extension() {
        assert!(DocumentUpload::new("contract.pdf", vec![1]).validate().is_ok());
        assert!(DocumentUpload::new("CONTRACT.PDF", vec![1]).validate().is_ok());
        assert!(DocumentUpload::new("contract.docx", vec![1]).validate().is_err());
        assert!(DocumentUpload::new(".pdf", vec![1]).validate().is_err());
        assert!(DocumentUpload::new("contract.pdf.exe", vec![1]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_file() {
        let err = DocumentUpload::new("empty.pdf", Vec::new()).validate().unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(ref m) if m == crate::error::PDF_REQUIRED_MESSAGE));
    }

    #[test]
    fn test_multibyte_name() {
        assert!(DocumentUpload::new("договор.pdf", vec![1]).validate().is_ok());
        assert!(DocumentUpload::new("дог", vec![1]).validate().is_err());
    }

    #[tokio::test]
    async fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lease.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let upload = DocumentUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.file_name, "lease.pdf");
        assert_eq!(upload.display_size(), "8 Bytes");
        assert!(upload.validate().is_ok());

        let missing = DocumentUpload::from_path(dir.path().join("gone.pdf")).await;
        assert!(matches!(missing, Err(ClientError::Io { .. })));
    }
}
