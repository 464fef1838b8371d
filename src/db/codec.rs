//! Formato dei record nello store: JSON camelCase, payload come array numerico

use crate::models::JobRecord;

use super::StoreResult;

pub fn encode_record(record: &JobRecord) -> StoreResult<String> {
    Ok(serde_json::to_string(record)?)
}

pub fn decode_record(raw: &str) -> StoreResult<JobRecord> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobParameter, JobResult, JobStatus};

    #[test]
    fn test_payload_is_numeric_array() {
        let record = JobRecord::new(JobParameter::new(vec![0x25, 0x50, 0x44, 0x46], "test.pdf"));
        let json = encode_record(&record).unwrap();
        assert!(json.contains("\"fileData\":[37,80,68,70]"));
        assert!(json.contains("\"fileName\":\"test.pdf\""));
        assert!(json.contains("\"status\":\"pending\""));
        assert!(!json.contains("\"result\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_bytes_and_timestamps_survive() {
        let data: Vec<u8> = (0..=255).collect();
        let record = JobRecord::new(JobParameter::new(data.clone(), "all-bytes.bin"));
        let decoded = decode_record(&encode_record(&record).unwrap()).unwrap();
        assert_eq!(decoded.parameter.file_data, data);
        assert_eq!(decoded.created_at, record.created_at);
        assert_eq!(decoded.updated_at, record.updated_at);
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_empty_payload() {
        let record = JobRecord::new(JobParameter::new(Vec::new(), "empty.txt"));
        let decoded = decode_record(&encode_record(&record).unwrap()).unwrap();
        assert!(decoded.parameter.file_data.is_empty());
    }

    #[test]
    fn test_decode_record_without_bookkeeping_fields() {
        let raw = r#"{
            "id": "abc",
            "parameter": {"fileData": [1, 2], "fileName": "a.bin"},
            "status": "completed",
            "result": {
                "fileName": "a.bin", "fileType": "unknown", "isText": false,
                "score": 0.5, "scorePercent": "50%", "description": "",
                "group": "unknown", "mimeType": "application/octet-stream", "extension": ""
            },
            "createdAt": "2024-05-01T10:00:00.000Z",
            "updatedAt": "2024-05-01T10:00:01.000Z"
        }"#;
        let record = decode_record(raw).unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.version, 0);
        assert_eq!(record.attempts, 0);
        assert!(record.claimed_at.is_none());
        assert_eq!(
            record.result.map(|r: JobResult| r.score_percent),
            Some("50%".to_string())
        );
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_record("not json").is_err());
        assert!(decode_record(r#"{"id":"x"}"#).is_err());
    }
}
