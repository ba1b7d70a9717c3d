//! Upload validation for documents sent to tag detection.
//!
//! Only documents the detection model can read are accepted: PDF plans and
//! raster scans. The content type is taken from magic bytes, never from the
//! client's claim.

/// Content types accepted for detection.
pub const SUPPORTED_CONTENT_TYPES: &[&str] = &["application/pdf", "image/png", "image/jpeg"];

/// Result of upload validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub allowed: bool,
    pub block_reason: Option<String>,
    pub detected_type: Option<String>,
}

impl ValidationResult {
    pub fn allowed(detected: impl Into<String>) -> Self {
        Self {
            allowed: true,
            block_reason: None,
            detected_type: Some(detected.into()),
        }
    }

    pub fn blocked(reason: impl Into<String>, detected: Option<String>) -> Self {
        Self {
            allowed: false,
            block_reason: Some(reason.into()),
            detected_type: detected,
        }
    }
}

/// Detect content type from magic bytes, falling back to the file extension.
pub fn detect_content_type(filename: &str, data: &[u8]) -> Option<String> {
    if let Some(kind) = infer::get(data) {
        return Some(kind.mime_type().to_string());
    }

    let ext = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())?;
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => return None,
    };
    Some(mime.to_string())
}

/// Validate an uploaded document before storing it or running detection.
pub fn validate_upload(filename: &str, data: &[u8], max_size_bytes: usize) -> ValidationResult {
    if data.is_empty() {
        return ValidationResult::blocked("File is empty", None);
    }
    if data.len() > max_size_bytes {
        return ValidationResult::blocked(
            format!("File exceeds maximum size of {} bytes", max_size_bytes),
            None,
        );
    }

    match detect_content_type(filename, data) {
        Some(mime) if SUPPORTED_CONTENT_TYPES.contains(&mime.as_str()) => {
            ValidationResult::allowed(mime)
        }
        Some(mime) => ValidationResult::blocked(
            format!("Unsupported document type: {}", mime),
            Some(mime),
        ),
        None => ValidationResult::blocked("Unrecognized document type", None),
    }
}

/// Sanitize filename for safe storage
pub fn sanitize_filename(filename: &str) -> String {
    // Remove path components
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    // Replace dangerous characters; ',' is kept since names are keys, not tags
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    // Truncate if too long (preserve extension)
    if sanitized.len() > 255 {
        let truncate = |s: &str, max: usize| -> String {
            let mut end = max;
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            s[..end].to_string()
        };
        if let Some(dot_pos) = sanitized.rfind('.') {
            let ext = &sanitized[dot_pos..];
            if ext.len() < 255 {
                let stem = truncate(&sanitized[..dot_pos], 255 - ext.len());
                return format!("{}{}", stem, ext);
            }
        }
        return truncate(sanitized, 255);
    }

    sanitized.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF_HEADER: &[u8] = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n";
    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_detect_pdf_magic_bytes() {
        assert_eq!(
            detect_content_type("whatever.bin", PDF_HEADER).as_deref(),
            Some("application/pdf")
        );
    }

    #[test]
    fn test_detect_png_magic_bytes() {
        assert_eq!(
            detect_content_type("fake.txt", PNG_HEADER).as_deref(),
            Some("image/png")
        );
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        assert_eq!(
            detect_content_type("scan.JPG", b"no magic here").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(detect_content_type("notes.txt", b"plain"), None);
    }

    #[test]
    fn test_validate_upload_accepts_pdf() {
        let result = validate_upload("plan_A.pdf", PDF_HEADER, 1024);
        assert!(result.allowed);
        assert_eq!(result.detected_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn test_validate_upload_rejects_empty_and_oversized() {
        assert!(!validate_upload("plan_A.pdf", b"", 1024).allowed);

        let result = validate_upload("plan_A.pdf", PDF_HEADER, 4);
        assert!(!result.allowed);
        assert!(result.block_reason.unwrap().contains("maximum size"));
    }

    #[test]
    fn test_validate_upload_rejects_unsupported() {
        let result = validate_upload("notes.txt", b"hello", 1024);
        assert!(!result.allowed);

        let zip = [0x50, 0x4B, 0x03, 0x04, 0x14, 0x00, 0x00, 0x00];
        let result = validate_upload("plan.pdf", &zip, 1024);
        assert!(!result.allowed, "magic bytes win over a .pdf extension");
    }

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/plan_A.pdf"), "plan_A.pdf");
        assert_eq!(sanitize_filename("C:\\plans\\plan_B.pdf"), "plan_B.pdf");
    }

    #[test]
    fn test_sanitize_replaces_dangerous_chars() {
        assert_eq!(sanitize_filename("plan<1>?.pdf"), "plan_1__.pdf");
        assert_eq!(sanitize_filename("   "), "unnamed_file");
    }

    #[test]
    fn test_sanitize_truncates_preserving_extension() {
        let long = format!("{}.pdf", "a".repeat(300));
        let out = sanitize_filename(&long);
        assert_eq!(out.len(), 255);
        assert!(out.ends_with(".pdf"));
    }
}
