//! Label texts and expected fields shared by the integration tests

use tracesmart_label_verify::models::label::ExpectedFields;

/// 1x1 PNG, base64 encoded
pub const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

/// Label carrying every expected field verbatim
pub const COMPLETE_LABEL: &str = "TraceSmart Components\n\
Device ID: DEV001\n\
Batch ID: BATCH-A1\n\
Manufacturing Date: 2024-07-15\n\
RoHS: Yes\n\
Serial Number: SN-TRSMT-001";

/// Batch id omitted, wrong serial number printed
pub const DEFECTIVE_LABEL: &str = "TraceSmart Components\n\
Device ID: DEV001\n\
Manufacturing Date: 2024-07-15\n\
RoHS: Yes\n\
Serial Number: SN-999";

pub fn png_data_uri() -> String {
    format!("data:image/png;base64,{PNG_BASE64}")
}

pub fn png_bytes() -> Vec<u8> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(PNG_BASE64)
        .expect("fixture PNG is valid base64")
}

pub fn expected_fields() -> ExpectedFields {
    ExpectedFields {
        device_id: "DEV001".to_string(),
        batch_id: "BATCH-A1".to_string(),
        manufacturing_date: "2024-07-15".to_string(),
        rohs_compliance: true,
        serial_number: Some("SN-TRSMT-001".to_string()),
    }
}
