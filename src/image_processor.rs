use std::path::Path;

use crate::errors::AppResult;
use crate::security::InputValidator;

/// A page loaded into memory, ready to be attached to an upload request
#[derive(Debug, Clone)]
pub struct PageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

pub async fn read_page(path: &Path) -> AppResult<PageFile> {
    InputValidator::validate_file_path(path)?;

    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    Ok(PageFile {
        file_name,
        bytes,
        mime_type: mime_type_for(path),
    })
}
