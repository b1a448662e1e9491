use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::label::ExpectedFields;

/// Request to validate one product label.
///
/// Wire shape is flat camelCase:
/// `{labelImageUri, deviceId, batchId, manufacturingDate, rohsCompliance, serialNumber?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    /// `data:<mimetype>;base64,<encoded_data>`
    #[garde(length(min = 1))]
    pub label_image_uri: String,

    #[serde(flatten)]
    #[garde(dive)]
    pub expected: ExpectedFields,
}

impl ValidationRequest {
    pub fn new(label_image_uri: impl Into<String>, expected: ExpectedFields) -> Self {
        Self {
            label_image_uri: label_image_uri.into(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_flat_request() {
        let request: ValidationRequest = serde_json::from_value(serde_json::json!({
            "labelImageUri": "data:image/png;base64,AAAA",
            "deviceId": "DEV002",
            "batchId": "BATCH-A2",
            "manufacturingDate": "2024-07-16",
            "rohsCompliance": false,
            "serialNumber": "SN-TRSMT-002"
        }))
        .unwrap();

        assert_eq!(request.expected.device_id, "DEV002");
        assert!(!request.expected.rohs_compliance);
        assert_eq!(request.expected.serial_number.as_deref(), Some("SN-TRSMT-002"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validation_dives_into_expected_fields() {
        let request: ValidationRequest = serde_json::from_value(serde_json::json!({
            "labelImageUri": "data:image/png;base64,AAAA",
            "deviceId": "DEV002",
            "batchId": "",
            "manufacturingDate": "2024-07-16",
            "rohsCompliance": false
        }))
        .unwrap();

        let report = request.validate().unwrap_err().to_string();
        assert!(report.to_lowercase().contains("batch"), "{report}");
    }

    #[test]
    fn test_missing_compliance_flag_rejected() {
        let result = serde_json::from_value::<ValidationRequest>(serde_json::json!({
            "labelImageUri": "data:image/png;base64,AAAA",
            "deviceId": "DEV002",
            "batchId": "BATCH-A2",
            "manufacturingDate": "2024-07-16"
        }));
        assert!(result.is_err());
    }
}
