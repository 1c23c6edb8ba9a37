// ── WindowMode ────────────────────────────────────────────────────────────────

/// Controls how the OS window is presented.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WindowMode {
    /// Standard decorated window at the configured resolution.
    Windowed,
    /// Borderless window sized to match the monitor's native resolution.
    Borderless,
}

// ── WindowConfig ──────────────────────────────────────────────────────────────

/// Window configuration snapshot: the physical pixel size to restore when
/// returning to windowed mode, plus the active mode.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowConfig {
    /// Window width in physical pixels.
    pub physical_width: u32,
    /// Window height in physical pixels.
    pub physical_height: u32,
    /// Active window mode.
    pub mode: WindowMode,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            physical_width: 640,
            physical_height: 480,
            mode: WindowMode::Windowed,
        }
    }
}
