use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::OcrError;
use crate::core::geometry::BBox;
use crate::core::model::{Fragment, FragmentSet};
use crate::ocr::OcrEngine;

/// One recognized region on the wire. Geometry and confidence are optional
/// so older bridge scripts that emit bare text lines still parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeFragment {
    pub text: String,
    #[serde(default)]
    pub bbox: Option<[f32; 4]>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl From<BridgeFragment> for Fragment {
    fn from(wire: BridgeFragment) -> Self {
        Fragment {
            text: wire.text,
            bbox: wire.bbox.map(|b| BBox::new(b[0], b[1], b[2], b[3])),
            confidence: wire.confidence,
        }
    }
}

/// EasyOCR via a python bridge process: the image is staged into the work
/// dir, the bridge script prints a JSON array of fragments on stdout.
#[derive(Debug, Clone)]
pub struct EasyOcrBridge {
    work_dir: PathBuf,
    script_path: PathBuf,
    lang: String,
}

impl EasyOcrBridge {
    pub fn new(work_dir: PathBuf) -> Self {
        let script_path = PathBuf::from("bridge/easyocr_bridge.py");
        Self {
            work_dir,
            script_path,
            lang: "ja,en".to_string(),
        }
    }

    pub fn with_script(mut self, script_path: PathBuf) -> Self {
        self.script_path = script_path;
        self
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    /// Checked once before any image is processed; a missing bridge script
    /// aborts the whole batch rather than failing image by image.
    pub fn ensure_available(&self) -> Result<(), OcrError> {
        if !self.script_path.is_file() {
            return Err(OcrError::Unavailable(format!(
                "bridge script not found: {}",
                self.script_path.display()
            )));
        }
        Ok(())
    }

    fn stage_image(&self, source_id: &str, image: &[u8]) -> Result<PathBuf, OcrError> {
        fs::create_dir_all(&self.work_dir)?;
        let file_name = source_id.replace(['/', '\\'], "_");
        let staged = self.work_dir.join(file_name);
        fs::write(&staged, image)?;
        Ok(staged)
    }
}

impl OcrEngine for EasyOcrBridge {
    fn recognize(&self, source_id: &str, image: &[u8]) -> Result<FragmentSet, OcrError> {
        // Reject undecodable bytes before spawning the bridge.
        image::load_from_memory(image)?;

        let staged = self.stage_image(source_id, image)?;
        debug!(source_id, script = %self.script_path.display(), "invoking OCR bridge");

        let output = Command::new("python3")
            .arg(&self.script_path)
            .arg("--image")
            .arg(&staged)
            .arg("--lang")
            .arg(&self.lang)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(OcrError::Engine { stderr });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let fragments: Vec<BridgeFragment> = serde_json::from_str(&stdout)?;
        Ok(fragments.into_iter().map(Fragment::from).collect())
    }
}
