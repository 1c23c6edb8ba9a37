use bulle::config::Assets;
use bulle::engine::{Engine, Game, KeyCode};
use bulle::renderer::TextureId;
use bulle::window::{WindowConfig, WindowMode, apply_window_settings};
use glam::Vec3;

/// Long enough to exceed the wrap cap, so the demo shows the box wrapping
/// and justifying across multiple tile rows.
const DIALOG_TEXT: &str =
    "The indicator still needs to be placed according to whatever this \
     dialogue is pointing at. Wander with the arrow keys; the caption \
     tracks your projected position.";

// ── WanderDemo ───────────────────────────────────────────────────────────────

struct WanderDemo {
    avatar: Option<TextureId>,
    pos: Vec3,
    /// Active window configuration; toggled by F11.
    window_config: WindowConfig,
}

impl WanderDemo {
    fn new() -> Self {
        Self {
            avatar: None,
            pos: Vec3::ZERO,
            window_config: WindowConfig::default(),
        }
    }
}

impl Game for WanderDemo {
    fn on_enter(&mut self, engine: &mut Engine) {
        let path = engine.assets().avatar_path.clone();
        match engine.load_texture(&path) {
            Ok(id) => self.avatar = Some(id),
            Err(e) => log::error!("avatar sprite unavailable: {e}"),
        }
    }

    fn update(&mut self, engine: &mut Engine) {
        if engine.is_key_pressed(KeyCode::Escape) {
            engine.request_quit();
            return;
        }

        // F11: toggle Windowed ↔ Borderless.
        if engine.is_key_pressed(KeyCode::F11) {
            self.window_config.mode = match self.window_config.mode {
                WindowMode::Windowed => WindowMode::Borderless,
                WindowMode::Borderless => WindowMode::Windowed,
            };
            apply_window_settings(&engine.renderer.window, &self.window_config);
        }

        // One world unit per fixed tick, matching the update rate.
        if engine.is_key_held(KeyCode::ArrowRight) { self.pos.x += 1.0; }
        if engine.is_key_held(KeyCode::ArrowLeft)  { self.pos.x -= 1.0; }
        if engine.is_key_held(KeyCode::ArrowUp)    { self.pos.z -= 1.0; }
        if engine.is_key_held(KeyCode::ArrowDown)  { self.pos.z += 1.0; }

        let p = engine.project(self.pos);
        engine.set_caption(format!(
            "[{}, {}, {:.3}]",
            p.x.floor(),
            p.y.floor(),
            p.z
        ));
    }

    fn render(&mut self, engine: &mut Engine) {
        if let Some(avatar) = self.avatar {
            engine.draw_sprite_3d(avatar, self.pos);
        }
        if let Err(e) = engine.draw_dialog(DIALOG_TEXT, 10.0, 10.0) {
            log::error!("dialog: {e}");
        }
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let assets = Assets::from_file("bulle.json").expect("unreadable assets config");

    Engine::builder()
        .with_title("bulle demo")
        .with_size(640, 480)
        .with_assets(assets)
        .run(WanderDemo::new());
}
