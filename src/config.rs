use std::path::Path;

use serde::Deserialize;

use crate::error::EngineError;

// ── Assets ────────────────────────────────────────────────────────────────────

/// Asset paths and dialogue constants, read once at startup.
///
/// All fields have defaults pointing at the `resources/` placeholders that
/// `build.rs` generates, so a bare checkout runs without a config file.
/// A JSON file (see [`Assets::from_file`]) overrides any subset of fields:
///
/// ```json
/// { "atlas_path": "gfx/dialog.png", "font_px": 12.0 }
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Assets {
    /// Dialogue tile atlas image (a 4×3 grid of `tile_w × tile_h` cells).
    pub atlas_path: String,
    /// Width of one atlas cell in pixels.
    pub tile_w: u32,
    /// Height of one atlas cell in pixels.
    pub tile_h: u32,
    /// TTF/OTF face used for dialogue text.
    pub font_path: String,
    /// Rasterization size in pixels.
    pub font_px: f32,
    /// Wrap width cap for dialogue text, in pixels.
    pub max_text_width: u32,
    /// Avatar sprite drawn in the 3D scene.
    pub avatar_path: String,
    /// Uniform scale applied to the screen-space overlay pass.
    pub overlay_scale: f32,
}

impl Default for Assets {
    fn default() -> Self {
        Self {
            atlas_path: "resources/dialog.png".into(),
            tile_w: 16,
            tile_h: 8,
            font_path: "resources/retro.ttf".into(),
            font_px: 12.0,
            max_text_width: 200,
            avatar_path: "resources/avatar.png".into(),
            overlay_scale: 2.0,
        }
    }
}

impl Assets {
    /// Load from a JSON file. Missing file → defaults; unreadable or
    /// malformed JSON → `Config` error (a present-but-broken config is a
    /// mistake worth stopping on, a missing one is not).
    pub fn from_file(path: &str) -> Result<Self, EngineError> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        serde_json::from_str(&data).map_err(|e| EngineError::Config(format!("{path}: {e}")))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_point_at_resources() {
        let a = Assets::default();
        assert!(a.atlas_path.starts_with("resources/"));
        assert!(a.avatar_path.starts_with("resources/"));
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let a: Assets = serde_json::from_str(r#"{ "font_px": 24.0 }"#).unwrap();
        assert_eq!(a.font_px, 24.0);
        assert_eq!(a.tile_w, Assets::default().tile_w);
        assert_eq!(a.max_text_width, 200);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let a = Assets::from_file("no/such/config.json").unwrap();
        assert_eq!(a, Assets::default());
    }
}
