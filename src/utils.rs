// src/utils.rs
use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use std::path::Path;

/// Accepted upload formats, by extension.
pub const UPLOAD_EXTENSIONS: &[&str] = &["pdf", "docx"];

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Keep letters, digits and underscores; whitespace becomes `_`.
pub fn sanitize_filename(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// `<Full_Name>_CV_<year>.<extension>`, or `CV_<year>.<extension>` when no name is known.
pub fn document_file_name(full_name: Option<&str>, extension: &str) -> String {
    let year = Utc::now().year();
    match full_name.map(sanitize_filename).filter(|n| !n.is_empty()) {
        Some(name) => format!("{}_CV_{}.{}", name, year, extension),
        None => format!("CV_{}.{}", year, extension),
    }
}

/// Get file extension in lowercase
pub fn get_file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Validate file extension against allowed types
pub fn validate_file_extension(filename: &str, allowed: &[&str]) -> Result<String> {
    let ext = get_file_extension(filename)
        .ok_or_else(|| anyhow::anyhow!("File has no extension: {}", filename))?;

    if !allowed.contains(&ext.as_str()) {
        anyhow::bail!(
            "Unsupported file extension: {}. Allowed: {:?}",
            ext,
            allowed
        );
    }

    Ok(ext)
}

pub fn content_type_for(extension: &str) -> Option<&'static str> {
    match extension {
        "pdf" => Some(PDF_CONTENT_TYPE),
        "docx" => Some(DOCX_CONTENT_TYPE),
        _ => None,
    }
}

pub async fn write_file_safe(path: &Path, content: &[u8]) -> Result<()> {
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

pub async fn read_file_safe(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Jane Q. Doe"), "Jane_Q_Doe");
        assert_eq!(sanitize_filename("  Zoë   O'Brien "), "Zoë_OBrien");
        assert_eq!(sanitize_filename("../etc/passwd"), "etcpasswd");
    }

    #[test]
    fn test_document_file_name() {
        let year = Utc::now().year();
        assert_eq!(
            document_file_name(Some("Jane Doe"), "pdf"),
            format!("Jane_Doe_CV_{}.pdf", year)
        );
        assert_eq!(
            document_file_name(None, "pdf"),
            format!("CV_{}.pdf", year)
        );
        assert_eq!(
            document_file_name(Some("%%"), "pdf"),
            format!("CV_{}.pdf", year)
        );
    }

    #[test]
    fn test_get_file_extension() {
        assert_eq!(get_file_extension("test.pdf"), Some("pdf".to_string()));
        assert_eq!(
            get_file_extension("document.DOCX"),
            Some("docx".to_string())
        );
        assert_eq!(get_file_extension("noext"), None);
    }

    #[test]
    fn test_validate_file_extension() {
        assert_eq!(
            validate_file_extension("cv.PDF", UPLOAD_EXTENSIONS).unwrap(),
            "pdf"
        );
        assert!(validate_file_extension("test.txt", UPLOAD_EXTENSIONS).is_err());
        assert!(validate_file_extension("noext", UPLOAD_EXTENSIONS).is_err());
        assert_eq!(content_type_for("docx"), Some(DOCX_CONTENT_TYPE));
        assert_eq!(content_type_for("txt"), None);
    }
}
