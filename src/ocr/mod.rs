pub mod bridge;

use std::path::PathBuf;

use once_cell::sync::OnceCell;

use crate::core::error::OcrError;
use crate::core::model::FragmentSet;

pub use bridge::EasyOcrBridge;

/// The external OCR collaborator: image bytes in, recognized fragments out,
/// in the order the engine emitted them.
pub trait OcrEngine {
    fn recognize(&self, source_id: &str, image: &[u8]) -> Result<FragmentSet, OcrError>;
}

static SHARED: OnceCell<EasyOcrBridge> = OnceCell::new();

/// Process-wide engine handle, created on first use and reused afterwards.
/// The first caller's work dir and language selection win; later calls get
/// the already-initialized bridge.
pub fn shared_engine(work_dir: PathBuf, lang: &str) -> Result<&'static EasyOcrBridge, OcrError> {
    SHARED.get_or_try_init(|| {
        let bridge = EasyOcrBridge::new(work_dir).with_lang(lang.to_string());
        bridge.ensure_available()?;
        Ok(bridge)
    })
}
