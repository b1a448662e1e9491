use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::models::label::ExpectedFields;
use crate::models::verification::ValidationRequest;

const LABEL_IMAGE_BASE: &str = "https://placehold.co/400x200.png";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("{0} is not RoHS compliant")]
    NotCompliant(String),

    #[error("Failed to build label image URL: {0}")]
    Url(String),
}

/// A product moving through the TraceSmart inspection line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub device_id: String,
    pub batch_id: String,
    /// YYYY-MM-DD
    pub manufacturing_date: String,
    pub rohs_compliant: bool,
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_image_url: Option<String>,
}

impl Product {
    fn new(id: &str, device_id: &str, batch_id: &str, date: &str, rohs: bool, serial: &str) -> Self {
        Self {
            id: id.to_string(),
            device_id: device_id.to_string(),
            batch_id: batch_id.to_string(),
            manufacturing_date: date.to_string(),
            rohs_compliant: rohs,
            serial_number: serial.to_string(),
            label_image_url: None,
        }
    }

    /// Text printed on the product's label, one entry per line.
    pub fn label_text(&self) -> String {
        format!(
            "DeviceID:{}\nBatchID:{}\nMfgDate:{}\nRoHS:{}\nSN:{}",
            self.device_id,
            self.batch_id,
            self.manufacturing_date,
            if self.rohs_compliant { "Yes" } else { "No" },
            self.serial_number,
        )
    }

    /// Placeholder-rendered label image for this product. Only RoHS compliant
    /// products get a label.
    pub fn label_image_url(&self) -> Result<String, LabelError> {
        if !self.rohs_compliant {
            return Err(LabelError::NotCompliant(self.device_id.clone()));
        }
        // The renderer takes a literal `\n` as a line break.
        let text = self.label_text().replace('\n', "\\n");
        let url = Url::parse_with_params(
            LABEL_IMAGE_BASE,
            [("text", text.as_str()), ("font", "spacegrotesk")],
        )
        .map_err(|e| LabelError::Url(e.to_string()))?;
        Ok(url.into())
    }

    /// Generate the label and attach it, approving the product.
    pub fn generate_label(&mut self) -> Result<&str, LabelError> {
        let url = match self.label_image_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(device_id = %self.device_id, error = %e, "Label generation rejected");
                return Err(e);
            }
        };
        tracing::info!(device_id = %self.device_id, "Label generated");
        Ok(self.label_image_url.insert(url).as_str())
    }

    pub fn expected_fields(&self) -> ExpectedFields {
        ExpectedFields {
            device_id: self.device_id.clone(),
            batch_id: self.batch_id.clone(),
            manufacturing_date: self.manufacturing_date.clone(),
            rohs_compliance: self.rohs_compliant,
            serial_number: Some(self.serial_number.clone()),
        }
    }

    /// Build the validation request for this product's label image.
    pub fn validation_request(&self, label_image_uri: impl Into<String>) -> ValidationRequest {
        ValidationRequest::new(label_image_uri, self.expected_fields())
    }
}

/// The demo line's initial product queue.
pub fn sample_catalog() -> Vec<Product> {
    vec![
        Product::new("p1", "DEV001", "BATCH-A1", "2024-07-15", true, "SN-TRSMT-001"),
        Product::new("p2", "DEV002", "BATCH-A2", "2024-07-16", false, "SN-TRSMT-002"),
        Product::new("p3", "DEV003", "BATCH-B1", "2024-07-17", true, "SN-TRSMT-003"),
        Product::new("p4", "DEV004", "BATCH-B2", "2024-07-18", true, "SN-TRSMT-004"),
        Product::new("p5", "DEV005", "BATCH-C1", "2024-07-19", true, "SN-TRSMT-005"),
    ]
}
