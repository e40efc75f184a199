use std::sync::Arc;

use anyhow::{Context, Result};
use lumina_core::{Clipboard, MemoryClipboard};

/// The desktop clipboard, opened per write.
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("failed to open system clipboard")?;
        clipboard
            .set_text(text.to_string())
            .context("failed to write to system clipboard")
    }
}

/// Falls back to an in-memory clipboard when no display is available.
pub fn system_clipboard() -> Arc<dyn Clipboard> {
    match arboard::Clipboard::new() {
        Ok(_) => Arc::new(SystemClipboard),
        Err(err) => {
            tracing::warn!(error = %err, "system clipboard unavailable, copies stay in memory");
            Arc::new(MemoryClipboard::new())
        }
    }
}
