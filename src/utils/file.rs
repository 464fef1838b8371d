use crate::error::{AppError, Result};

/// Nome file da salvare nel job: solo l'ultimo componente, senza caratteri di controllo
pub fn sanitize_file_name(filename: &str) -> String {
    let base = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn validate_file_size(size: u64, max_size_mb: u64) -> Result<()> {
    let max_bytes = max_size_mb * 1024 * 1024;
    if size > max_bytes {
        return Err(AppError::FileTooLarge(max_size_mb));
    }
    Ok(())
}
