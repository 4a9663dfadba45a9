use anyhow::Result;

use crate::content::classify::ContentRepresentation;

/// Destination for copy actions. Implemented by the front end.
pub trait ClipboardSink {
    fn copy_text(&self, text: &str) -> Result<()>;
    fn copy_image(&self, bytes: &[u8]) -> Result<()>;
}

impl ContentRepresentation {
    /// Copy to the sink: images as bytes, everything else as text.
    /// Returns false when there was nothing to copy.
    pub fn copy_to(&self, sink: &dyn ClipboardSink) -> Result<bool> {
        match self {
            Self::Image { bytes, .. } => sink.copy_image(bytes)?,
            other => match other.text() {
                Some(text) => sink.copy_text(text)?,
                None => return Ok(false),
            },
        }
        Ok(true)
    }
}
