use thiserror::Error;

/// Failures raised by the OCR collaborator for a single image. Each one is
/// contained at the image boundary: the image's record becomes `Error` and
/// the batch keeps going. Only `Unavailable` is fatal, and it is raised
/// before any image is processed.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR bridge is unavailable: {0}")]
    Unavailable(String),

    #[error("failed to invoke OCR bridge")]
    Bridge(#[from] std::io::Error),

    #[error("OCR engine failed: {stderr}")]
    Engine { stderr: String },

    #[error("failed to parse OCR response")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("failed to decode image")]
    ImageDecode(#[from] image::ImageError),
}
