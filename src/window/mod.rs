pub mod config;

pub use config::{WindowConfig, WindowMode};

use winit::dpi::PhysicalSize;
use winit::window::{Fullscreen, Window};

/// Apply `config` to `window`, updating decorations, fullscreen state, and size.
///
/// # Windowed
/// Removes any active fullscreen mode, restores decorations, and requests
/// the window be resized to `config.physical_width × physical_height`.
/// `request_inner_size` may apply asynchronously; the engine's resize
/// handler reconciles the final size either way.
///
/// # Borderless
/// Enters a borderless fullscreen window on the current monitor
/// (`Fullscreen::Borderless(None)`); the monitor's native resolution
/// becomes the window size.
pub fn apply_window_settings(window: &Window, config: &WindowConfig) {
    match config.mode {
        WindowMode::Windowed => {
            window.set_fullscreen(None);
            window.set_decorations(true);
            window.set_resizable(false);
            let _ = window.request_inner_size(PhysicalSize::new(
                config.physical_width,
                config.physical_height,
            ));
        }

        WindowMode::Borderless => {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
    }
}
