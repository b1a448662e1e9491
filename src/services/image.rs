use base64::Engine;
use image::ImageFormat;

/// Image formats the vision model accepts for label OCR.
const ACCEPTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::WebP,
    ImageFormat::Gif,
];

/// A decoded label image: MIME type plus raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelImage {
    mime_type: String,
    bytes: Vec<u8>,
}

impl LabelImage {
    /// Parse a `data:<mimetype>;base64,<encoded_data>` URI.
    ///
    /// The declared MIME type must name an accepted image format and agree with
    /// the format sniffed from the decoded bytes.
    pub fn from_data_uri(uri: &str) -> Result<Self, ImageError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or(ImageError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageError::NotDataUri)?;

        let mut params = header.split(';');
        let mime_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(ImageError::NotBase64);
        }

        let declared = ImageFormat::from_mime_type(&mime_type)
            .filter(|f| ACCEPTED_FORMATS.contains(f))
            .ok_or_else(|| ImageError::UnsupportedMime(mime_type.clone()))?;

        let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }

        let detected = image::guess_format(&bytes).map_err(|_| ImageError::Unrecognized)?;
        if detected != declared {
            return Err(ImageError::FormatMismatch {
                declared: mime_type,
                detected: detected.to_mime_type().to_string(),
            });
        }

        Ok(Self { mime_type, bytes })
    }

    /// Wrap raw uploaded bytes, deriving the MIME type from the image header.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let format = image::guess_format(&bytes).map_err(|_| ImageError::Unrecognized)?;
        if !ACCEPTED_FORMATS.contains(&format) {
            return Err(ImageError::UnsupportedMime(format.to_mime_type().to_string()));
        }
        Ok(Self {
            mime_type: format.to_mime_type().to_string(),
            bytes,
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("label image must be a data URI of the form data:<mimetype>;base64,<data>")]
    NotDataUri,

    #[error("label image data URI must use base64 encoding")]
    NotBase64,

    #[error("unsupported label image type: {0}")]
    UnsupportedMime(String),

    #[error("label image payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("label image is empty")]
    Empty,

    #[error("label image bytes are not a recognized image format")]
    Unrecognized,

    #[error("label image declared as {declared} but contains {detected}")]
    FormatMismatch { declared: String, detected: String },
}
