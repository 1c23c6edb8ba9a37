use thiserror::Error;

/// Startup and draw-path errors.
///
/// Asset and font failures are fatal at startup — the engine refuses to
/// enter the render loop without its atlas and font. `TileIndexOutOfRange`
/// is a defensive check against a layout-constant mismatch, not a runtime
/// condition.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Image asset missing, undecodable, or with unusable dimensions.
    #[error("asset load failed: {0}")]
    AssetLoad(String),

    /// Font face unparseable or missing required metrics.
    #[error("font load failed: {0}")]
    FontLoad(String),

    /// Atlas tile index outside the valid range.
    #[error("tile index {index} out of range (atlas holds {count} tiles)")]
    TileIndexOutOfRange { index: u32, count: u32 },

    /// Malformed assets configuration file.
    #[error("config error: {0}")]
    Config(String),
}
