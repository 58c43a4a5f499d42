//! Ground-truth source
//!
//! The corpus records one raw MICR field record per check id. A check
//! with no recorded ground truth cannot be scored; asking for it is an
//! error, never a silent skip.

use micracc_common::micr::GroundTruthRecord;
use micracc_common::{CheckId, Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Supplies the recorded ground truth for a check id
pub trait GroundTruthSource {
    fn ground_truth(&self, id: CheckId) -> Result<GroundTruthRecord>;
}

/// Ground truth loaded from a JSON document (check id to raw record)
#[derive(Debug)]
pub struct JsonGroundTruth {
    records: BTreeMap<CheckId, GroundTruthRecord>,
}

impl JsonGroundTruth {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read ground truth {}: {}",
                path.display(),
                e
            ))
        })?;
        let records: BTreeMap<CheckId, GroundTruthRecord> = serde_json::from_str(&contents)
            .map_err(|e| {
                Error::Config(format!(
                    "Failed to parse ground truth {}: {}",
                    path.display(),
                    e
                ))
            })?;

        info!(
            checks = records.len(),
            "Loaded ground truth from {}",
            path.display()
        );
        Ok(Self { records })
    }

    pub fn from_records(records: BTreeMap<CheckId, GroundTruthRecord>) -> Self {
        Self { records }
    }
}

impl GroundTruthSource for JsonGroundTruth {
    fn ground_truth(&self, id: CheckId) -> Result<GroundTruthRecord> {
        self.records
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no ground truth recorded for check {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_camel_case_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "1": {{
                    "payorBankRoutingNumber": "1234567",
                    "payorBankCheckDigit": "8",
                    "onUs": "1234567890/",
                    "auxiliaryOnUs": "1234567"
                }},
                "2": {{
                    "payorBankRoutingNumber": "7654321",
                    "payorBankCheckDigit": "0",
                    "onUs": "555/"
                }}
            }}"#
        )
        .unwrap();

        let source = JsonGroundTruth::load(file.path()).unwrap();
        let record = source.ground_truth(1).unwrap();
        assert_eq!(record.payor_bank_routing_number.as_deref(), Some("1234567"));
        assert_eq!(record.auxiliary_on_us.as_deref(), Some("1234567"));
        assert_eq!(source.ground_truth(2).unwrap().auxiliary_on_us, None);
    }

    #[test]
    fn unknown_check_id_is_not_found() {
        let source = JsonGroundTruth::from_records(BTreeMap::new());
        let err = source.ground_truth(99).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
    }

    #[test]
    fn missing_document_is_config_error() {
        let err = JsonGroundTruth::load(Path::new("/nonexistent/ground-truth.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {:?}", err);
    }
}
