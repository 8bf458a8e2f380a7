//! Upload helpers - turn files into self-contained data URLs and back.
//!
//! The vault stores images and PDFs inline as `data:<mime>;base64,<payload>`
//! strings. Validation (size limit, accepted type) happens here, before
//! anything reaches the store; the store itself accepts any string.

use crate::error::{Result, VaultError};
use crate::item::MediaDraft;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One mebibyte, the unit upload limits are configured in.
pub const MB: u64 = 1024 * 1024;

/// Kind of file an upload slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Pdf,
}

impl UploadKind {
    /// Accept pattern, as shown to the user.
    pub fn accept(&self) -> &'static str {
        match self {
            Self::Image => "image/*",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn accepts(&self, mime: &str) -> bool {
        match self {
            Self::Image => mime.starts_with("image/"),
            Self::Pdf => mime == "application/pdf",
        }
    }
}

/// A validated file, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Suggested title taken from the file name
    pub title: String,
    pub mime: String,
    /// Size of the original file in bytes
    pub size: u64,
    pub data_url: String,
}

impl Upload {
    /// Draft for the store, using `title` when given and the suggested one otherwise.
    pub fn into_draft(self, title: Option<String>) -> MediaDraft {
        MediaDraft {
            title: title.unwrap_or(self.title),
            data_url: self.data_url,
        }
    }
}

/// Read a file as a data URL after checking its size and type.
pub fn read_as_data_url(path: &Path, kind: UploadKind, max_bytes: u64) -> Result<Upload> {
    let size = fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(VaultError::FileTooLarge {
            size,
            max: max_bytes,
        });
    }

    let mime = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    if !kind.accepts(&mime) {
        return Err(VaultError::InvalidFileType {
            mime,
            accept: kind.accept(),
        });
    }

    let bytes = fs::read(path)?;
    debug!("[Upload] Encoded {:?} ({}, {} bytes)", path, mime, size);

    Ok(Upload {
        title: title_from_file_name(path),
        data_url: encode_data_url(&mime, &bytes),
        mime,
        size,
    })
}

/// Title suggested for an uploaded file: its name up to the first dot.
pub fn title_from_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('.').next().map(str::to_string))
        .unwrap_or_default()
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 data URL into its MIME type and decoded bytes.
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>)> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or(VaultError::InvalidDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(VaultError::InvalidDataUrl)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(VaultError::InvalidDataUrl)?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| VaultError::InvalidDataUrl)?;

    let mime = if mime.is_empty() {
        "application/octet-stream".to_string()
    } else {
        mime.to_string()
    };
    Ok((mime, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_image() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("holiday.beach.png");
        fs::write(&path, [0x89, b'P', b'N', b'G'])?;

        let upload = read_as_data_url(&path, UploadKind::Image, 5 * MB)?;
        assert_eq!(upload.title, "holiday");
        assert_eq!(upload.mime, "image/png");
        assert_eq!(upload.size, 4);
        assert_eq!(upload.data_url, "data:image/png;base64,iVBORw==");
        Ok(())
    }

    #[test]
    fn test_rejects_large_file() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("scan.pdf");
        fs::write(&path, vec![0u8; 2048])?;

        let err = read_as_data_url(&path, UploadKind::Pdf, 1024).unwrap_err();
        assert!(matches!(err, VaultError::FileTooLarge { size: 2048, max: 1024 }));
        Ok(())
    }

    #[test]
    fn test_rejects_wrong_type() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("notes.txt");
        fs::write(&path, "hello")?;

        let err = read_as_data_url(&path, UploadKind::Image, MB).unwrap_err();
        assert!(matches!(
            err,
            VaultError::InvalidFileType { ref mime, accept: "image/*" } if mime == "text/plain"
        ));

        let pdf = temp.path().join("cat.png");
        fs::write(&pdf, "x")?;
        assert!(read_as_data_url(&pdf, UploadKind::Pdf, MB).is_err());
        Ok(())
    }

    #[test]
    fn test_decode_data_url() -> Result<()> {
        let (mime, bytes) = decode_data_url("data:application/pdf;base64,JVBERi0=")?;
        assert_eq!(mime, "application/pdf");
        assert_eq!(bytes, b"%PDF-");

        let (mime, bytes) = decode_data_url(&encode_data_url("", b"abc"))?;
        assert_eq!(mime, "application/octet-stream");
        assert_eq!(bytes, b"abc");
        Ok(())
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for bad in [
            "image/png;base64,AAAA",
            "data:image/png;base64",
            "data:text/plain,hello",
            "data:image/png;base64,@@@",
        ] {
            assert!(
                matches!(decode_data_url(bad), Err(VaultError::InvalidDataUrl)),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_into_draft_title_override() {
        let upload = Upload {
            title: "scan".to_string(),
            mime: "application/pdf".to_string(),
            size: 1,
            data_url: "data:application/pdf;base64,AA==".to_string(),
        };
        assert_eq!(upload.clone().into_draft(None).title, "scan");
        assert_eq!(upload.into_draft(Some("Tax 2024".to_string())).title, "Tax 2024");
    }
}
