//! /upload command - send a PDF and show the extracted text

use chatdesk_core::ChatSession;
use std::path::Path;

use crate::utils::{format_size, truncate_chars};

const TEXT_PREVIEW_CHARS: usize = 1500;

pub struct UploadCommand;

impl UploadCommand {
    /// File name and size, or why the file cannot be sent
    pub fn preview(path: &Path) -> Result<String, String> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| format!("Not a file: {}", path.display()))?;

        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return Err(format!("Only PDF files can be uploaded: {}", name));
        }

        let metadata = std::fs::metadata(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        if !metadata.is_file() {
            return Err(format!("Not a file: {}", path.display()));
        }

        Ok(format!("📄 {} ({})", name, format_size(metadata.len())))
    }

    /// Upload the file and format the extracted text
    pub async fn run(session: &mut ChatSession, path: &Path) -> Result<String, String> {
        let text = session.upload_pdf(path).await.map_err(|e| {
            tracing::warn!("PDF upload failed: {}", e);
            format!("Upload failed: {}", e)
        })?;
        Ok(Self::format_text(&text))
    }

    fn format_text(text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return "The document contains no extractable text.".to_string();
        }
        format!(
            "Extracted text ({} chars):\n\n{}",
            text.chars().count(),
            truncate_chars(text, TEXT_PREVIEW_CHARS)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_rejects_non_pdf() {
        let err = UploadCommand::preview(Path::new("notes.txt")).unwrap_err();
        assert!(err.contains("Only PDF files"));
    }

    #[test]
    fn test_preview_missing_file() {
        assert!(UploadCommand::preview(Path::new("/nonexistent/brochure.pdf")).is_err());
    }

    #[test]
    fn test_preview_shows_name_and_size() {
        let dir = std::env::temp_dir().join(format!("chatdesk-upload-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("Brochure.PDF");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        assert_eq!(UploadCommand::preview(&path).unwrap(), "📄 Brochure.PDF (2.0 KB)");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_format_text() {
        assert_eq!(
            UploadCommand::format_text("  \n"),
            "The document contains no extractable text."
        );
        assert!(UploadCommand::format_text("Hola").ends_with("\n\nHola"));
    }
}
