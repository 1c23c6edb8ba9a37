use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
pub use winit::keyboard::KeyCode;
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::camera::SceneCamera;
use crate::config::Assets;
use crate::dialog::{Dialog, OverlayFrame};
use crate::error::EngineError;
use crate::input::InputState;
use crate::renderer::atlas::DialogAtlas;
use crate::renderer::pipeline::SceneVertex;
use crate::renderer::text::FontPainter;
use crate::renderer::{Renderer, SceneDraw, TextureId};

// ── Color ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub const WHITE: Self = Self([1.0, 1.0, 1.0, 1.0]);
    pub const BLACK: Self = Self([0.0, 0.0, 0.0, 1.0]);
    pub const GRAY: Self = Self([0.6, 0.6, 0.6, 1.0]);
    pub const RED: Self = Self([1.0, 0.0, 0.0, 1.0]);
    pub const YELLOW: Self = Self([1.0, 1.0, 0.0, 1.0]);
    pub const TRANSPARENT: Self = Self([0.0, 0.0, 0.0, 0.0]);
}

// ── Game trait ──────────────────────────────────────────────────────────────

pub trait Game {
    fn on_enter(&mut self, _engine: &mut Engine) {}
    fn update(&mut self, engine: &mut Engine);
    fn render(&mut self, engine: &mut Engine);
}

// ── Engine ──────────────────────────────────────────────────────────────────

pub struct Engine {
    /// GPU renderer — holds the WGPU surface, pipelines, and textures.
    pub renderer: Renderer,
    /// Keyboard state for the current frame.
    pub input: InputState,
    /// Perspective camera over the 3D scene.
    pub camera: SceneCamera,
    assets: Assets,
    /// Dialogue box renderer with its rendered-text cache.
    dialog: Dialog<FontPainter>,
    /// Overlay quads accumulated during `game.render()`; cleared each frame.
    overlay: OverlayFrame,
    /// Scene quads accumulated during `game.render()`; cleared each frame.
    scene_vertices: Vec<SceneVertex>,
    scene_draws: Vec<SceneDraw>,
    /// Pending window-caption change, applied at end of frame.
    caption: Option<String>,
    dt: f32,
    tick: u64,
    /// Set by `request_quit()`; the event loop exits after the current tick.
    quit_requested: bool,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn dt(&self) -> f32 { self.dt }
    pub fn tick(&self) -> u64 { self.tick }
    pub fn assets(&self) -> &Assets { &self.assets }

    pub fn is_key_held(&self, key: KeyCode) -> bool { self.input.is_key_held(key) }
    pub fn is_key_pressed(&self, key: KeyCode) -> bool { self.input.is_key_pressed(key) }
    pub fn is_key_released(&self, key: KeyCode) -> bool { self.input.is_key_released(key) }

    /// Signal that the application should exit. The event loop will call
    /// `exit()` after the current update tick completes.
    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    // ── Assets ─────────────────────────────────────────────────────────────

    /// Register a PNG for scene-pass drawing. Call from `on_enter`.
    pub fn load_texture(&mut self, path: &str) -> Result<TextureId, EngineError> {
        self.renderer.load_texture(path)
    }

    // ── Scene drawing ──────────────────────────────────────────────────────

    /// Queue a textured quad standing in the scene at `pos`: a unit quad
    /// spanning x ∈ [-0.5, 0.5], y ∈ [0, 1], scaled by the texture's pixel
    /// dimensions — so a 16×24 sprite is 16 world units wide and 24 tall,
    /// with `pos` at the bottom centre.
    pub fn draw_sprite_3d(&mut self, texture: TextureId, pos: Vec3) {
        let Some((w, h)) = self.renderer.texture_size(texture) else {
            log::warn!("draw_sprite_3d: unknown texture id {texture}");
            return;
        };
        let (w, h) = (w as f32, h as f32);

        let start = self.scene_vertices.len() as u32;
        let tl = SceneVertex { position: [pos.x - w * 0.5, pos.y + h, pos.z], uv: [0.0, 0.0] };
        let tr = SceneVertex { position: [pos.x + w * 0.5, pos.y + h, pos.z], uv: [1.0, 0.0] };
        let bl = SceneVertex { position: [pos.x - w * 0.5, pos.y,     pos.z], uv: [0.0, 1.0] };
        let br = SceneVertex { position: [pos.x + w * 0.5, pos.y,     pos.z], uv: [1.0, 1.0] };
        self.scene_vertices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
        self.scene_draws.push(SceneDraw { texture, start, count: 6 });
    }

    // ── Dialogue ───────────────────────────────────────────────────────────

    /// Draw a dialogue box anchored at `(x, y)` in overlay coordinates
    /// (pre-scale pixels; see `Assets::overlay_scale`).
    pub fn draw_dialog(&mut self, text: &str, x: f32, y: f32) -> Result<(), EngineError> {
        self.dialog.draw_text(&mut self.overlay, text, x, y)
    }

    /// Drop the dialogue's cached glyph image; the next draw re-rasterizes.
    pub fn invalidate_dialog(&mut self) {
        self.dialog.invalidate();
    }

    // ── Projection / caption ───────────────────────────────────────────────

    /// Project a world-space point to window coordinates (x right, y down,
    /// z = NDC depth) using the scene camera and the current window size.
    pub fn project(&self, world: Vec3) -> Vec3 {
        let size = self.renderer.window.inner_size();
        self.camera.project(world, size.width as f32, size.height as f32)
    }

    /// Replace the window caption at the end of this frame (applied only
    /// when it actually changed, so per-frame calls are cheap).
    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = Some(caption.into());
    }

    // ── Internal frame plumbing ────────────────────────────────────────────

    /// Upload the current perspective matrix to the GPU.
    /// Called once per frame before `renderer.render()`.
    pub(crate) fn sync_camera(&mut self) {
        let size = self.renderer.window.inner_size();
        let uniform = self.camera.build_view_proj(size.width as f32, size.height as f32);
        self.renderer.update_camera(&uniform);
    }

    /// Push the dialogue glyph image to the GPU when its generation moved.
    pub(crate) fn sync_dialog(&mut self) {
        if let Some(image) = self.dialog.cached_image() {
            let generation = self.dialog.generation();
            self.renderer.upload_glyphs(image, generation);
        }
    }
}

// ── EngineBuilder ───────────────────────────────────────────────────────────

pub struct EngineBuilder {
    title: String,
    width: u32,
    height: u32,
    assets: Assets,
    target_ups: u32,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            title: "bulle".into(),
            width: 640,
            height: 480,
            assets: Assets::default(),
            target_ups: 60,
        }
    }
}

impl EngineBuilder {
    pub fn with_title(mut self, title: &str) -> Self { self.title = title.into(); self }
    pub fn with_size(mut self, width: u32, height: u32) -> Self { self.width = width; self.height = height; self }
    pub fn with_assets(mut self, assets: Assets) -> Self { self.assets = assets; self }
    pub fn with_ups(mut self, ups: u32) -> Self { self.target_ups = ups; self }

    pub fn run(self, game: impl Game + 'static) {
        let event_loop = EventLoop::new().unwrap();
        let fixed_dt = 1.0 / self.target_ups as f32;
        let mut app = App {
            config: self,
            game: Box::new(game),
            engine: None,
            last_instant: None,
            accumulator: 0.0,
            fixed_dt,
            last_caption: String::new(),
        };
        event_loop.run_app(&mut app).unwrap();
    }
}

// ── App (winit ApplicationHandler) ──────────────────────────────────────────

struct App {
    config: EngineBuilder,
    game: Box<dyn Game>,
    engine: Option<Engine>,
    last_instant: Option<Instant>,
    accumulator: f32,
    fixed_dt: f32,
    last_caption: String,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title(&self.config.title)
                        .with_inner_size(winit::dpi::PhysicalSize::new(
                            self.config.width,
                            self.config.height,
                        ))
                        .with_resizable(false),
                )
                .unwrap(),
        );

        // Asset failures are fatal here — the engine must not reach the
        // render loop without its atlas and font.
        let assets = self.config.assets.clone();
        log::info!("loading dialogue atlas from {}", assets.atlas_path);
        let atlas = DialogAtlas::from_file(&assets.atlas_path, assets.tile_w, assets.tile_h)
            .expect("failed to load dialogue atlas");
        log::info!("loading font from {}", assets.font_path);
        let font = FontPainter::from_file(&assets.font_path, assets.font_px)
            .expect("failed to load dialogue font");

        let renderer = pollster::block_on(Renderer::new(
            Arc::clone(&window),
            &atlas,
            assets.overlay_scale,
        ));
        let dialog = Dialog::new(atlas, font, assets.max_text_width);

        let mut engine = Engine {
            renderer,
            input: InputState::new(),
            camera: SceneCamera::new(),
            assets,
            dialog,
            overlay: OverlayFrame::new(),
            scene_vertices: Vec::new(),
            scene_draws: Vec::new(),
            caption: None,
            dt: 0.0,
            tick: 0,
            quit_requested: false,
        };

        self.game.on_enter(&mut engine);
        self.engine = Some(engine);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(engine) = self.engine.as_ref() {
            engine.renderer.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(engine) = self.engine.as_mut() else { return };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                engine.renderer.resize(size);
            }

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let elapsed = match self.last_instant {
                    Some(prev) => now.duration_since(prev).as_secs_f32().min(0.25),
                    None => self.fixed_dt,
                };
                self.last_instant = Some(now);
                self.accumulator += elapsed;

                while self.accumulator >= self.fixed_dt {
                    engine.dt = self.fixed_dt;
                    engine.tick += 1;
                    self.game.update(engine);
                    if engine.quit_requested {
                        event_loop.exit();
                        return;
                    }
                    self.accumulator -= self.fixed_dt;
                }

                engine.overlay.clear();
                engine.scene_vertices.clear();
                engine.scene_draws.clear();
                self.game.render(engine);

                engine.sync_camera();
                engine.sync_dialog();

                if let Some(caption) = engine.caption.take() {
                    if caption != self.last_caption {
                        engine.renderer.window.set_title(&caption);
                        self.last_caption = caption;
                    }
                }

                match engine
                    .renderer
                    .render(&engine.scene_vertices, &engine.scene_draws, &engine.overlay)
                {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let size = engine.renderer.window.inner_size();
                        engine.renderer.resize(size);
                    }
                    Err(e) => log::error!("render error: {e}"),
                }

                engine.input.clear_frame_state();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    if engine.input.keys_held.insert(code) {
                        engine.input.keys_pressed.insert(code);
                    }
                }
                ElementState::Released => {
                    engine.input.keys_held.remove(&code);
                    engine.input.keys_released.insert(code);
                }
            },

            _ => {}
        }
    }
}
