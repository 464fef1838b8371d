//! Content-type utilities

/// Get the MIME content-type for a file extension or type label
///
/// Unknown extensions fall back to `mime_guess`, then to
/// `application/octet-stream`.
pub fn get_content_type(format: &str) -> &'static str {
    match format.to_lowercase().as_str() {
        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",

        // Documents
        "pdf" => "application/pdf",
        "rtf" => "application/rtf",
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",

        // Code
        "py" | "python" => "text/x-python",
        "sh" | "shell" => "application/x-sh",

        // Archives
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" | "gzip" => "application/gzip",
        "bz2" | "bzip" => "application/x-bzip2",
        "xz" => "application/x-xz",
        "rar" => "application/vnd.rar",
        "7z" | "7zip" => "application/x-7z-compressed",

        // Executables
        "elf" => "application/x-executable",
        "exe" | "dll" | "pebin" => "application/vnd.microsoft.portable-executable",
        "macho" => "application/x-mach-binary",
        "wasm" => "application/wasm",
        "sqlite" | "db" => "application/vnd.sqlite3",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "m4a" => "audio/mp4",

        // Video
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",

        other => mime_guess::from_ext(other)
            .first_raw()
            .unwrap_or("application/octet-stream"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_types() {
        assert_eq!(get_content_type("png"), "image/png");
        assert_eq!(get_content_type("jpg"), "image/jpeg");
        assert_eq!(get_content_type("jpeg"), "image/jpeg");
        assert_eq!(get_content_type("webp"), "image/webp");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(get_content_type("PNG"), "image/png");
        assert_eq!(get_content_type("PDF"), "application/pdf");
    }

    #[test]
    fn test_labels_without_extension() {
        assert_eq!(get_content_type("elf"), "application/x-executable");
        assert_eq!(get_content_type("macho"), "application/x-mach-binary");
    }

    #[test]
    fn test_mime_guess_fallback() {
        assert_eq!(get_content_type("odt"), "application/vnd.oasis.opendocument.text");
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(get_content_type("xyz123"), "application/octet-stream");
        assert_eq!(get_content_type(""), "application/octet-stream");
    }
}
