pub mod comparison;
pub mod genai;
pub mod image;
pub mod ocr;
pub mod pipeline;
pub mod validation;
