use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, Result};

/// Estensioni proposte dal classificatore: una sola o una lista di candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extensions {
    One(String),
    Many(Vec<String>),
}

impl Extensions {
    /// Stringa da mostrare: le liste sono unite con ", "
    pub fn display(&self) -> String {
        match self {
            Extensions::One(ext) => ext.clone(),
            Extensions::Many(exts) => exts.join(", "),
        }
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Extensions::Many(Vec::new())
    }
}

/// Output grezzo del motore di classificazione
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationOutcome {
    pub label: String,
    pub is_text: bool,
    pub score: f64,
    pub group: String,
    pub mime_type: String,
    pub extension: Extensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Risultato di un job completato
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    /// Nome del file caricato
    pub file_name: String,
    /// Etichetta del tipo rilevato (es. "pdf")
    pub file_type: String,
    pub is_text: bool,
    /// Confidenza tra 0 e 1
    pub score: f64,
    /// Confidenza in percentuale intera (es. "99%")
    pub score_percent: String,
    pub description: String,
    pub group: String,
    pub mime_type: String,
    /// Estensioni candidate separate da ", "
    pub extension: String,
}

impl JobResult {
    /// Deriva il risultato dall'output del classificatore.
    /// I campi mancanti prendono un default, un punteggio non valido è un errore.
    pub fn from_outcome(file_name: &str, outcome: ClassificationOutcome) -> Result<Self> {
        if !outcome.score.is_finite() || !(0.0..=1.0).contains(&outcome.score) {
            return Err(AppError::Classification(format!(
                "Punteggio non valido: {}",
                outcome.score
            )));
        }

        let mime_type = if outcome.mime_type.is_empty() {
            "application/octet-stream".to_string()
        } else {
            outcome.mime_type
        };

        let label = if outcome.label.trim().is_empty() {
            "unknown".to_string()
        } else {
            outcome.label
        };

        let group = if outcome.group.is_empty() {
            "unknown".to_string()
        } else {
            outcome.group
        };

        Ok(Self {
            file_name: file_name.to_string(),
            score_percent: format_score_percent(outcome.score),
            extension: outcome.extension.display(),
            file_type: label,
            is_text: outcome.is_text,
            score: outcome.score,
            description: outcome.description.unwrap_or_default(),
            group,
            mime_type,
        })
    }
}

/// Formatta il punteggio come percentuale intera, arrotondando per eccesso a metà
pub fn format_score_percent(score: f64) -> String {
    let percent = (score.clamp(0.0, 1.0) * 100.0 + 0.5).floor() as u32;
    format!("{}%", percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(label: &str, score: f64) -> ClassificationOutcome {
        ClassificationOutcome {
            label: label.to_string(),
            is_text: false,
            score,
            group: "document".to_string(),
            mime_type: "application/pdf".to_string(),
            extension: Extensions::One("pdf".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_score_percent() {
        assert_eq!(format_score_percent(0.99), "99%");
        assert_eq!(format_score_percent(0.0), "0%");
        assert_eq!(format_score_percent(1.0), "100%");
        assert_eq!(format_score_percent(0.856), "86%");
        assert_eq!(format_score_percent(0.125), "13%");
    }

    #[test]
    fn test_extensions_display() {
        let many = Extensions::Many(vec!["jpg".to_string(), "jpeg".to_string()]);
        assert_eq!(many.display(), "jpg, jpeg");
        assert_eq!(Extensions::Many(vec![]).display(), "");
        assert_eq!(Extensions::One("pdf".to_string()).display(), "pdf");
    }

    #[test]
    fn test_extensions_deserialize_both_shapes() {
        let one: Extensions = serde_json::from_str("\"pdf\"").unwrap();
        let many: Extensions = serde_json::from_str("[\"jpg\",\"jpeg\"]").unwrap();
        assert_eq!(one, Extensions::One("pdf".to_string()));
        assert_eq!(many.display(), "jpg, jpeg");
    }

    #[test]
    fn test_from_outcome() {
        let result = JobResult::from_outcome("test.pdf", outcome("pdf", 0.99)).unwrap();
        assert_eq!(result.file_name, "test.pdf");
        assert_eq!(result.file_type, "pdf");
        assert_eq!(result.score_percent, "99%");
        assert_eq!(result.extension, "pdf");
        assert_eq!(result.description, "");
    }

    #[test]
    fn test_from_outcome_rejects_invalid_score() {
        assert!(JobResult::from_outcome("a", outcome("pdf", 1.5)).is_err());
        assert!(JobResult::from_outcome("a", outcome("pdf", f64::NAN)).is_err());
    }

    #[test]
    fn test_from_outcome_fills_defaults() {
        let mut raw = outcome("bin", 0.5);
        raw.mime_type = String::new();
        raw.group = String::new();
        let result = JobResult::from_outcome("a", raw).unwrap();
        assert_eq!(result.mime_type, "application/octet-stream");
        assert_eq!(result.group, "unknown");
    }

    #[test]
    fn test_from_outcome_defaults_blank_label() {
        let result = JobResult::from_outcome("a", outcome("  ", 0.5)).unwrap();
        assert_eq!(result.file_type, "unknown");
        assert_eq!(result.score_percent, "50%");
    }
}
