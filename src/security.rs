use regex::Regex;
use std::path::Path;

use crate::errors::{AppError, AppResult};

/// X rejects still images larger than 5MB
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Page extensions accepted for discovery and upload (compared lowercase)
pub const PAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Media attachments allowed on a single post
pub const MAX_MEDIA_PER_POST: usize = 4;

pub struct InputValidator;

impl InputValidator {
    pub fn has_page_extension(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext.as_str()))
    }

    pub fn validate_file_path(path: &Path) -> AppResult<()> {
        let display = path.to_string_lossy();

        if display.trim().is_empty() {
            return Err(AppError::validation("file_path", "File path cannot be empty"));
        }

        if path.extension().is_none() {
            return Err(AppError::validation("file_path", "File must have an extension"));
        }

        if !Self::has_page_extension(path) {
            return Err(AppError::invalid_file_type(&display));
        }

        if !path.exists() {
            return Err(AppError::file_not_found(&display));
        }

        if !path.is_file() {
            return Err(AppError::validation("file_path", "Path is not a file"));
        }

        Ok(())
    }

    /// Checks a page before anything is posted: allowed type, size limit and a
    /// readable image header.
    pub fn validate_image_file(path: &Path) -> AppResult<()> {
        Self::validate_file_path(path)?;

        let metadata = std::fs::metadata(path)?;
        if metadata.len() > MAX_IMAGE_BYTES {
            return Err(AppError::file_too_large(&path.to_string_lossy()));
        }

        // Only reads the header
        image::image_dimensions(path)?;

        Ok(())
    }

    pub fn validate_shop_url(url: &str) -> AppResult<()> {
        let trimmed = url.trim();

        if trimmed.is_empty() {
            return Err(AppError::validation("shop_url", "Shop URL cannot be empty"));
        }

        let url_pattern = Regex::new(r"^https?://[^\s/$.?#][^\s]*$")
            .map_err(|e| AppError::Config(e.to_string()))?;
        if !url_pattern.is_match(trimmed) {
            return Err(AppError::validation(
                "shop_url",
                "Must be an absolute http(s) URL",
            ));
        }

        Ok(())
    }

    pub fn validate_final_text(template: &str) -> AppResult<()> {
        if !template.contains("{shop_url}") {
            return Err(AppError::validation(
                "final_text",
                "Template has no {shop_url} placeholder",
            ));
        }
        Ok(())
    }

    pub fn validate_batch_size(batch_size: usize) -> AppResult<()> {
        if batch_size == 0 || batch_size > MAX_MEDIA_PER_POST {
            return Err(AppError::validation("batch_size", "Must be between 1 and 4"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_extension_is_case_insensitive() {
        assert!(InputValidator::has_page_extension(Path::new("a/page_01.PNG")));
        assert!(InputValidator::has_page_extension(Path::new("a/page_01.Jpeg")));
        assert!(InputValidator::has_page_extension(Path::new("a/page_01.jpg")));
        assert!(!InputValidator::has_page_extension(Path::new("a/notes.txt")));
        assert!(!InputValidator::has_page_extension(Path::new("a/page.webp")));
        assert!(!InputValidator::has_page_extension(Path::new("a/README")));
    }

    #[test]
    fn test_validate_file_path_rejects_missing_and_wrong_type() {
        let missing = InputValidator::validate_file_path(Path::new("definitely_missing.png"));
        assert!(matches!(missing, Err(AppError::FileNotFound { .. })));

        let wrong_type = InputValidator::validate_file_path(Path::new("notes.gif"));
        assert!(matches!(wrong_type, Err(AppError::InvalidFileType { .. })));
    }

    #[test]
    fn test_validate_image_file_rejects_non_image_content() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("page_01.png");
        std::fs::write(&fake, b"This is not an image").unwrap();

        assert!(InputValidator::validate_image_file(&fake).is_err());
    }

    #[test]
    fn test_validate_image_file_accepts_real_png() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page_01.png");
        image::RgbImage::new(2, 2).save(&page).unwrap();

        assert!(InputValidator::validate_image_file(&page).is_ok());
    }

    #[test]
    fn test_shop_url_validation() {
        assert!(InputValidator::validate_shop_url("https://example.com").is_ok());
        assert!(InputValidator::validate_shop_url("http://shop.example.com/item?id=3").is_ok());
        assert!(InputValidator::validate_shop_url("").is_err());
        assert!(InputValidator::validate_shop_url("example.com").is_err());
        assert!(InputValidator::validate_shop_url("https://exa mple.com").is_err());
    }

    #[test]
    fn test_final_text_and_batch_size() {
        assert!(InputValidator::validate_final_text("Buy it: {shop_url}").is_ok());
        assert!(InputValidator::validate_final_text("Buy it somewhere").is_err());

        assert!(InputValidator::validate_batch_size(0).is_err());
        assert!(InputValidator::validate_batch_size(2).is_ok());
        assert!(InputValidator::validate_batch_size(4).is_ok());
        assert!(InputValidator::validate_batch_size(5).is_err());
    }
}
