use std::path::Path;

/// Detect Content-Type based on file extension
///
/// Returns `None` for extensions a gallery never uploads, leaving the
/// content type to the store's default.
pub fn detect_content_type(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "zip" => "application/zip",
        "html" | "htm" => "text/html; charset=utf-8",
        _ => return None,
    };
    Some(mime.to_string())
}
