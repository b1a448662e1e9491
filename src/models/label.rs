use std::fmt;

use chrono::NaiveDate;
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Explanation returned when every expected field was found on the label.
pub const ALL_CORRECT: &str = "All information is present and correct on the label.";

/// Fields printed on a TraceSmart product label, in explanation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum LabelField {
    #[strum(serialize = "Device ID")]
    DeviceId,
    #[strum(serialize = "Batch ID")]
    BatchId,
    #[strum(serialize = "Manufacturing Date")]
    ManufacturingDate,
    #[strum(serialize = "RoHS Compliance")]
    RohsCompliance,
    #[strum(serialize = "Serial Number")]
    SerialNumber,
}

impl LabelField {
    /// Captions a label may print in front of this field's value.
    /// Longer captions come first so alternation prefers them.
    pub fn captions(self) -> &'static [&'static str] {
        match self {
            LabelField::DeviceId => &["Device ID", "Device-ID", "DeviceID", "Device"],
            LabelField::BatchId => &["Batch ID", "Batch-ID", "BatchID", "Batch No", "Batch", "Lot"],
            LabelField::ManufacturingDate => &[
                "Date of Manufacture",
                "Manufacturing Date",
                "Mfg. Date",
                "Mfg Date",
                "MfgDate",
                "MFD",
            ],
            LabelField::RohsCompliance => &["RoHS Compliant", "RoHS"],
            LabelField::SerialNumber => &["Serial Number", "Serial No.", "Serial No", "S/N", "SN"],
        }
    }
}

/// Values the label is expected to carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedFields {
    #[garde(length(min = 1, max = 200))]
    pub device_id: String,

    #[garde(length(min = 1, max = 200))]
    pub batch_id: String,

    /// YYYY-MM-DD
    #[garde(custom(calendar_date))]
    pub manufacturing_date: String,

    #[garde(skip)]
    pub rohs_compliance: bool,

    /// Absent on label variants that carry no serial number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(min = 1, max = 200))]
    pub serial_number: Option<String>,
}

impl ExpectedFields {
    /// Literal value expected for a text field. `None` for the compliance flag
    /// and for an absent serial number.
    pub fn text_value(&self, field: LabelField) -> Option<&str> {
        match field {
            LabelField::DeviceId => Some(&self.device_id),
            LabelField::BatchId => Some(&self.batch_id),
            LabelField::ManufacturingDate => Some(&self.manufacturing_date),
            LabelField::RohsCompliance => None,
            LabelField::SerialNumber => self.serial_number.as_deref(),
        }
    }

    /// The fields this request checks, in explanation order.
    pub fn checked_fields(&self) -> Vec<LabelField> {
        use strum::IntoEnumIterator;
        LabelField::iter()
            .filter(|f| *f != LabelField::SerialNumber || self.serial_number.is_some())
            .collect()
    }
}

fn calendar_date(value: &str, _ctx: &()) -> garde::Result {
    if value.len() != 10 || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err(garde::Error::new("must be a calendar date in YYYY-MM-DD format"));
    }
    Ok(())
}

/// Outcome of checking one field against the extracted label text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldStatus {
    Correct,
    /// Something resembling the field was printed, but not the expected value.
    Incorrect { found: String },
    /// The label carries both an affirmative and a negative marker.
    Conflicting,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldVerification {
    pub field: LabelField,
    pub expected: String,
    #[serde(flatten)]
    pub status: FieldStatus,
}

impl FieldVerification {
    pub fn matches(&self) -> bool {
        self.status == FieldStatus::Correct
    }
}

impl fmt::Display for FieldVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            FieldStatus::Correct => write!(f, "{}: Correct.", self.field),
            FieldStatus::Incorrect { found } => write!(
                f,
                "{}: Found '{}' instead of '{}'.",
                self.field, found, self.expected
            ),
            FieldStatus::Conflicting => write!(
                f,
                "{}: Conflicting markers found, expected '{}'.",
                self.field, self.expected
            ),
            FieldStatus::Missing => write!(f, "{}: Missing.", self.field),
        }
    }
}

/// Pipeline output. Both fields are always present, including on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    #[garde(skip)]
    pub is_valid: bool,

    #[garde(length(min = 1))]
    pub validation_result: String,
}

impl ValidationResponse {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            validation_result: ALL_CORRECT.to_string(),
        }
    }

    pub fn invalid(explanation: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            validation_result: explanation.into(),
        }
    }

    /// Verdict over per-field results: valid only if every field matched, otherwise
    /// an explanation that addresses each field in turn.
    pub fn from_field_results(results: &[FieldVerification]) -> Self {
        if results.is_empty() {
            return Self::invalid("No label fields were checked.");
        }
        if results.iter().all(FieldVerification::matches) {
            return Self::valid();
        }
        let explanation = results
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        Self::invalid(explanation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_expected() -> ExpectedFields {
        ExpectedFields {
            device_id: "DEV001".to_string(),
            batch_id: "BATCH-A1".to_string(),
            manufacturing_date: "2024-07-15".to_string(),
            rohs_compliance: true,
            serial_number: Some("SN-TRSMT-001".to_string()),
        }
    }

    #[test]
    fn test_expected_fields_valid() {
        assert!(sample_expected().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_device_id() {
        let mut fields = sample_expected();
        fields.device_id = String::new();
        assert!(fields.validate().is_err());
    }

    #[test]
    fn test_rejects_non_calendar_dates() {
        for bad in ["2024-13-01", "2024-02-30", "15/07/2024", "2024-7-15", ""] {
            let mut fields = sample_expected();
            fields.manufacturing_date = bad.to_string();
            assert!(fields.validate().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn test_serial_number_optional() {
        let mut fields = sample_expected();
        fields.serial_number = None;
        assert!(fields.validate().is_ok());
        assert!(!fields.checked_fields().contains(&LabelField::SerialNumber));
        assert_eq!(fields.checked_fields().len(), 4);
    }

    #[test]
    fn test_empty_serial_number_rejected() {
        let mut fields = sample_expected();
        fields.serial_number = Some(String::new());
        assert!(fields.validate().is_err());
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let json = serde_json::to_value(ValidationResponse::valid()).unwrap();
        assert_eq!(json["isValid"], true);
        assert_eq!(json["validationResult"], ALL_CORRECT);

        let fields: ExpectedFields = serde_json::from_value(serde_json::json!({
            "deviceId": "DEV001",
            "batchId": "BATCH-A1",
            "manufacturingDate": "2024-07-15",
            "rohsCompliance": true
        }))
        .unwrap();
        assert_eq!(fields.serial_number, None);
    }

    #[test]
    fn test_explanation_lists_every_field() {
        let results = vec![
            FieldVerification {
                field: LabelField::DeviceId,
                expected: "DEV001".to_string(),
                status: FieldStatus::Correct,
            },
            FieldVerification {
                field: LabelField::BatchId,
                expected: "BATCH-A1".to_string(),
                status: FieldStatus::Missing,
            },
            FieldVerification {
                field: LabelField::SerialNumber,
                expected: "SN-TRSMT-001".to_string(),
                status: FieldStatus::Incorrect {
                    found: "SN-999".to_string(),
                },
            },
        ];
        let response = ValidationResponse::from_field_results(&results);
        assert!(!response.is_valid);
        assert_eq!(
            response.validation_result,
            "Device ID: Correct. Batch ID: Missing. Serial Number: Found 'SN-999' instead of 'SN-TRSMT-001'."
        );
    }

    #[test]
    fn test_no_results_is_not_valid() {
        assert!(!ValidationResponse::from_field_results(&[]).is_valid);
    }
}
