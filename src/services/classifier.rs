//! Motore di classificazione del tipo di file.
//!
//! Il motore viene costruito una sola volta all'avvio del processo e passato
//! per riferimento al worker e alle route.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{ClassificationOutcome, Extensions};
use crate::utils::get_content_type;

/// Quanti byte iniziali vengono esaminati dalle euristiche testuali
const TEXT_SAMPLE_LEN: usize = 8 * 1024;

const MAGIC_SCORE: f64 = 0.99;
const TEXT_SCORE: f64 = 0.9;
const PLAIN_TEXT_SCORE: f64 = 0.75;
const UNKNOWN_SCORE: f64 = 0.5;

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, data: &[u8]) -> Result<ClassificationOutcome>;
}

pub type SharedClassifier = Arc<dyn Classifier>;

/// Firma binaria: `magic` atteso a partire da `offset`
#[derive(Debug, Clone)]
struct Signature {
    label: &'static str,
    offset: usize,
    magic: &'static [u8],
    group: &'static str,
    description: &'static str,
    extensions: &'static [&'static str],
}

const fn sig(
    label: &'static str,
    offset: usize,
    magic: &'static [u8],
    group: &'static str,
    description: &'static str,
    extensions: &'static [&'static str],
) -> Signature {
    Signature {
        label,
        offset,
        magic,
        group,
        description,
        extensions,
    }
}

const SIGNATURES: &[Signature] = &[
    sig("pdf", 0, b"%PDF", "document", "PDF document", &["pdf"]),
    sig("png", 0, b"\x89PNG\r\n\x1a\n", "image", "PNG image data", &["png"]),
    sig("jpeg", 0, b"\xff\xd8\xff", "image", "JPEG image data", &["jpg", "jpeg"]),
    sig("gif", 0, b"GIF87a", "image", "GIF image data", &["gif"]),
    sig("gif", 0, b"GIF89a", "image", "GIF image data", &["gif"]),
    sig("webp", 8, b"WEBP", "image", "WebP image data", &["webp"]),
    sig("bmp", 0, b"BM", "image", "BMP image data", &["bmp"]),
    sig("tiff", 0, b"II*\x00", "image", "TIFF image data", &["tiff", "tif"]),
    sig("tiff", 0, b"MM\x00*", "image", "TIFF image data", &["tiff", "tif"]),
    sig("ico", 0, b"\x00\x00\x01\x00", "image", "Windows icon", &["ico"]),
    sig("wav", 8, b"WAVE", "audio", "Waveform audio", &["wav"]),
    sig("avi", 8, b"AVI ", "video", "AVI video", &["avi"]),
    sig("flac", 0, b"fLaC", "audio", "FLAC audio", &["flac"]),
    sig("ogg", 0, b"OggS", "audio", "Ogg container", &["ogg", "oga"]),
    sig("mp3", 0, b"ID3", "audio", "MP3 audio with ID3 tag", &["mp3"]),
    sig("mp4", 4, b"ftypqt", "video", "QuickTime movie", &["mov"]),
    sig("mp4", 4, b"ftyp", "video", "ISO media (MP4)", &["mp4", "m4a", "m4v"]),
    sig("webm", 0, b"\x1a\x45\xdf\xa3", "video", "Matroska / WebM", &["mkv", "webm"]),
    sig("zip", 0, b"PK\x03\x04", "archive", "Zip archive data", &["zip"]),
    sig("zip", 0, b"PK\x05\x06", "archive", "Empty zip archive", &["zip"]),
    sig("gzip", 0, b"\x1f\x8b", "archive", "gzip compressed data", &["gz"]),
    sig("bzip", 0, b"BZh", "archive", "bzip2 compressed data", &["bz2"]),
    sig("xz", 0, b"\xfd7zXZ\x00", "archive", "XZ compressed data", &["xz"]),
    sig("7zip", 0, b"7z\xbc\xaf\x27\x1c", "archive", "7-zip archive data", &["7z"]),
    sig("rar", 0, b"Rar!\x1a\x07", "archive", "RAR archive data", &["rar"]),
    sig("tar", 257, b"ustar", "archive", "POSIX tar archive", &["tar"]),
    sig("elf", 0, b"\x7fELF", "executable", "ELF executable", &[]),
    sig("pebin", 0, b"MZ", "executable", "PE executable", &["exe", "dll"]),
    sig("macho", 0, b"\xcf\xfa\xed\xfe", "executable", "Mach-O executable", &[]),
    sig("wasm", 0, b"\x00asm", "executable", "WebAssembly binary", &["wasm"]),
    sig("sqlite", 0, b"SQLite format 3\x00", "code", "SQLite database", &["sqlite", "db"]),
    sig("rtf", 0, b"{\\rtf", "text", "Rich Text Format", &["rtf"]),
];

/// Classificatore basato su firme binarie ed euristiche testuali
#[derive(Debug, Clone)]
pub struct SignatureClassifier {
    signatures: Vec<Signature>,
}

impl SignatureClassifier {
    /// Prepara la tabella delle firme. Fallisce se la tabella non è coerente.
    pub fn load() -> Result<Self> {
        let mut signatures = SIGNATURES.to_vec();

        if let Some(bad) = signatures
            .iter()
            .find(|s| s.magic.is_empty() || s.label.is_empty())
        {
            return Err(AppError::Internal(format!(
                "Firma non valida nella tabella: {:?}",
                bad.label
            )));
        }

        // Le firme più specifiche vincono su quelle più corte
        signatures.sort_by(|a, b| (b.offset + b.magic.len()).cmp(&(a.offset + a.magic.len())));

        tracing::info!("Classificatore inizializzato con {} firme", signatures.len());

        Ok(Self { signatures })
    }

    fn detect(&self, data: &[u8]) -> ClassificationOutcome {
        if data.is_empty() {
            return ClassificationOutcome {
                label: "empty".to_string(),
                is_text: false,
                score: 1.0,
                group: "inode".to_string(),
                mime_type: "inode/x-empty".to_string(),
                extension: Extensions::default(),
                description: Some("Empty file".to_string()),
            };
        }

        if let Some(signature) = self.signatures.iter().find(|s| {
            data.len() >= s.offset + s.magic.len()
                && &data[s.offset..s.offset + s.magic.len()] == s.magic
        }) {
            return outcome(
                signature.label,
                false,
                MAGIC_SCORE,
                signature.group,
                signature.description,
                signature.extensions,
            );
        }

        if let Some(text) = as_text(data) {
            return classify_text(text, data);
        }

        ClassificationOutcome {
            label: "unknown".to_string(),
            is_text: false,
            score: UNKNOWN_SCORE,
            group: "unknown".to_string(),
            mime_type: "application/octet-stream".to_string(),
            extension: Extensions::default(),
            description: Some("Unknown binary data".to_string()),
        }
    }
}

#[async_trait]
impl Classifier for SignatureClassifier {
    async fn classify(&self, data: &[u8]) -> Result<ClassificationOutcome> {
        Ok(self.detect(data))
    }
}

fn outcome(
    label: &str,
    is_text: bool,
    score: f64,
    group: &str,
    description: &str,
    extensions: &[&str],
) -> ClassificationOutcome {
    let mime_type = extensions
        .first()
        .map(|ext| get_content_type(ext).to_string())
        .unwrap_or_else(|| get_content_type(label).to_string());

    let extension = match extensions {
        [single] => Extensions::One(single.to_string()),
        many => Extensions::Many(many.iter().map(|e| e.to_string()).collect()),
    };

    ClassificationOutcome {
        label: label.to_string(),
        is_text,
        score,
        group: group.to_string(),
        mime_type,
        extension,
        description: Some(description.to_string()),
    }
}

/// Restituisce il campione iniziale come testo se sembra UTF-8 senza byte nulli
fn as_text(data: &[u8]) -> Option<&str> {
    let sample = &data[..data.len().min(TEXT_SAMPLE_LEN)];
    if sample.contains(&0) {
        return None;
    }

    match std::str::from_utf8(sample) {
        Ok(text) => Some(text),
        // Il campione può troncare un carattere multibyte
        Err(e) if e.error_len().is_none() && e.valid_up_to() > 0 => {
            std::str::from_utf8(&sample[..e.valid_up_to()]).ok()
        }
        Err(_) => None,
    }
}

fn classify_text(sample: &str, data: &[u8]) -> ClassificationOutcome {
    let trimmed = sample.trim_start_matches('\u{feff}').trim_start();
    let lower = trimmed
        .chars()
        .take(256)
        .collect::<String>()
        .to_ascii_lowercase();

    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_slice::<serde_json::Value>(data).is_ok()
    {
        return outcome("json", true, TEXT_SCORE, "code", "JSON document", &["json"]);
    }

    if lower.starts_with("<svg") || (lower.starts_with("<?xml") && lower.contains("<svg")) {
        return outcome("svg", true, TEXT_SCORE, "image", "SVG image", &["svg"]);
    }

    if lower.starts_with("<?xml") {
        return outcome("xml", true, TEXT_SCORE, "code", "XML document", &["xml"]);
    }

    if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        return outcome("html", true, TEXT_SCORE, "code", "HTML document", &["html", "htm"]);
    }

    if let Some(first_line) = lower.lines().next() {
        if first_line.starts_with("#!") {
            if first_line.contains("python") {
                return outcome("python", true, TEXT_SCORE, "code", "Python script", &["py"]);
            }
            if first_line.contains("sh") {
                return outcome("shell", true, TEXT_SCORE, "code", "Shell script", &["sh"]);
            }
        }
    }

    if looks_like_markdown(trimmed) {
        return outcome(
            "markdown",
            true,
            PLAIN_TEXT_SCORE,
            "text",
            "Markdown document",
            &["md"],
        );
    }

    if looks_like_csv(trimmed) {
        return outcome("csv", true, PLAIN_TEXT_SCORE, "code", "CSV document", &["csv"]);
    }

    outcome("txt", true, PLAIN_TEXT_SCORE, "text", "Generic text document", &["txt"])
}

fn looks_like_markdown(text: &str) -> bool {
    text.lines().take(20).any(|line| {
        let line = line.trim_start();
        line.starts_with("# ") || line.starts_with("## ") || line.starts_with("```")
    })
}

fn looks_like_csv(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().take(10).filter(|l| !l.is_empty()).collect();
    if lines.len() < 2 {
        return false;
    }
    let columns = lines[0].matches(',').count();
    columns > 0 && lines.iter().all(|l| l.matches(',').count() == columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(data: &[u8]) -> ClassificationOutcome {
        SignatureClassifier::load().unwrap().detect(data)
    }

    #[test]
    fn test_pdf_magic() {
        let out = classify(&[0x25, 0x50, 0x44, 0x46]);
        assert_eq!(out.label, "pdf");
        assert_eq!(out.score, 0.99);
        assert_eq!(out.mime_type, "application/pdf");
        assert_eq!(out.extension, Extensions::One("pdf".to_string()));
        assert!(!out.is_text);
    }

    #[test]
    fn test_jpeg_has_two_extensions() {
        let out = classify(&[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10]);
        assert_eq!(out.label, "jpeg");
        assert_eq!(out.extension.display(), "jpg, jpeg");
        assert_eq!(out.mime_type, "image/jpeg");
    }

    #[test]
    fn test_offset_signature() {
        let mut data = b"RIFF\x00\x00\x00\x00WEBPVP8 ".to_vec();
        assert_eq!(classify(&data).label, "webp");
        data[8..12].copy_from_slice(b"WAVE");
        assert_eq!(classify(&data).label, "wav");
    }

    #[test]
    fn test_text_heuristics() {
        assert_eq!(classify(br#"{"a": [1, 2]}"#).label, "json");
        assert_eq!(classify(b"<!DOCTYPE html><html></html>").label, "html");
        assert_eq!(classify(b"<?xml version=\"1.0\"?><svg></svg>").label, "svg");
        assert_eq!(classify(b"#!/usr/bin/env python3\nprint(1)\n").label, "python");
        assert_eq!(classify(b"#!/bin/bash\necho hi\n").label, "shell");
        assert_eq!(classify(b"# Title\n\nSome text\n").label, "markdown");
        assert_eq!(classify(b"a,b,c\n1,2,3\n4,5,6\n").label, "csv");

        let plain = classify("ciao mondo, è un testo".as_bytes());
        assert_eq!(plain.label, "txt");
        assert!(plain.is_text);
        assert_eq!(plain.mime_type, "text/plain");
    }

    #[test]
    fn test_broken_json_is_plain_text() {
        assert_eq!(classify(b"{ not json").label, "txt");
    }

    #[test]
    fn test_empty_and_unknown() {
        let empty = classify(&[]);
        assert_eq!(empty.label, "empty");
        assert_eq!(empty.extension.display(), "");

        let unknown = classify(&[0x00, 0x13, 0x37, 0x00, 0xfe]);
        assert_eq!(unknown.label, "unknown");
        assert_eq!(unknown.mime_type, "application/octet-stream");
    }

    #[test]
    fn test_truncated_multibyte_sample_still_text() {
        let mut data = vec![b'a'; TEXT_SAMPLE_LEN - 1];
        data.extend_from_slice("è".as_bytes());
        assert!(as_text(&data).is_some());
    }
}
