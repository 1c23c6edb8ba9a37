pub mod atlas;
pub mod pipeline;
pub mod text;

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use atlas::DialogAtlas;
use pipeline::{
    DEPTH_FORMAT, OverlayPipeline, ScenePipeline, SceneVertex, create_overlay_pipeline,
    create_scene_pipeline, orthographic_projection,
};
use text::TextImage;

use crate::camera::CameraUniform;
use crate::dialog::OverlayFrame;
use crate::error::EngineError;

// ── Scene textures ───────────────────────────────────────────────────────────

/// Handle to a texture registered with [`Renderer::load_texture`].
pub type TextureId = usize;

struct SceneTexture {
    width: u32,
    height: u32,
    bind_group: wgpu::BindGroup,
}

/// One textured draw inside the scene pass: a vertex range paired with the
/// texture it samples.
#[derive(Copy, Clone, Debug)]
pub struct SceneDraw {
    pub texture: TextureId,
    pub start: u32,
    pub count: u32,
}

// ── Renderer ─────────────────────────────────────────────────────────────────

pub struct Renderer {
    pub window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    scene_pipeline: ScenePipeline,
    overlay_pipeline: OverlayPipeline,
    depth_view: wgpu::TextureView,
    /// Perspective view-projection buffer — scene pass only.
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    /// Static orthographic projection — overlay pass only.
    projection_buffer: wgpu::Buffer,
    projection_bind_group: wgpu::BindGroup,
    /// Uniform scale baked into the overlay projection.
    overlay_scale: f32,
    /// Bind group for the dialogue tile atlas (always present).
    atlas_bind_group: wgpu::BindGroup,
    /// Textures registered for the scene pass (avatar sprites etc.).
    textures: Vec<SceneTexture>,
    /// Current dialogue glyph texture, replaced when the dialog cache
    /// generation moves.
    glyph_bind_group: Option<wgpu::BindGroup>,
    glyph_generation: u64,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, dialog_atlas: &DialogAtlas, overlay_scale: f32) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(Arc::clone(&window)).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .expect("no suitable GPU adapter found");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .expect("failed to create device");

        let caps = surface.get_capabilities(&adapter);
        let format = caps.formats[0];

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let scene_pipeline = create_scene_pipeline(&device, format);
        let overlay_pipeline = create_overlay_pipeline(&device, format);
        let depth_view = create_depth_view(&device, &config);

        // ── Perspective camera buffer (scene pass) ────────────────────────
        // Seeded with the identity; the engine uploads the real matrix
        // before the first frame via update_camera.
        let cam_uniform = CameraUniform {
            view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
        };
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::cast_slice(std::slice::from_ref(&cam_uniform)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bg"),
            layout: &scene_pipeline.camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // ── Static overlay projection buffer ──────────────────────────────
        let proj = orthographic_projection(
            config.width as f32,
            config.height as f32,
            overlay_scale,
        );
        let projection_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("projection_buffer"),
            contents: bytemuck::cast_slice(&proj),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let projection_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("projection_bg"),
            layout: &overlay_pipeline.projection_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: projection_buffer.as_entire_binding(),
            }],
        });

        let (atlas_view, atlas_sampler) = dialog_atlas.upload(&device, &queue);
        let atlas_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("atlas_bg"),
            layout: &overlay_pipeline.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&atlas_sampler),
                },
            ],
        });

        Self {
            window,
            surface,
            device,
            queue,
            config,
            scene_pipeline,
            overlay_pipeline,
            depth_view,
            camera_buffer,
            camera_bind_group,
            projection_buffer,
            projection_bind_group,
            overlay_scale,
            atlas_bind_group,
            textures: Vec::new(),
            glyph_bind_group: None,
            glyph_generation: 0,
        }
    }

    /// Decode a PNG and register it for scene-pass drawing.
    /// Call during initialisation, before the game loop starts.
    pub fn load_texture(&mut self, path: &str) -> Result<TextureId, EngineError> {
        let img = image::open(path)
            .map_err(|e| EngineError::AssetLoad(format!("texture {path}: {e}")))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(EngineError::AssetLoad(format!("texture {path} is empty")));
        }

        let (view, sampler) = upload_rgba(&self.device, &self.queue, &img, "scene_texture");
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_texture_bg"),
            layout: &self.scene_pipeline.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        self.textures.push(SceneTexture {
            width,
            height,
            bind_group,
        });
        Ok(self.textures.len() - 1)
    }

    /// Pixel dimensions of a registered texture.
    pub fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures.get(id).map(|t| (t.width, t.height))
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, &self.config);

        // Keep the overlay projection up-to-date with the window size.
        let proj = orthographic_projection(
            new_size.width as f32,
            new_size.height as f32,
            self.overlay_scale,
        );
        self.queue
            .write_buffer(&self.projection_buffer, 0, bytemuck::cast_slice(&proj));
    }

    /// Upload a new perspective view-projection matrix to the GPU.
    /// Call once per frame, before `render`.
    pub fn update_camera(&mut self, uniform: &CameraUniform) {
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(std::slice::from_ref(uniform)),
        );
    }

    /// (Re)upload the dialogue glyph image when the dialog cache
    /// generation has moved. A 0×0 image clears the glyph texture.
    pub fn upload_glyphs(&mut self, image: &TextImage, generation: u64) {
        if generation == self.glyph_generation {
            return;
        }
        self.glyph_generation = generation;

        if image.is_empty() {
            self.glyph_bind_group = None;
            return;
        }

        // Coverage → white RGBA with alpha, so the overlay shader's vertex
        // tint decides the final text colour.
        let mut rgba = Vec::with_capacity(image.data.len() * 4);
        for &v in &image.data {
            rgba.extend_from_slice(&[0xFF, 0xFF, 0xFF, v]);
        }
        let img = image::RgbaImage::from_raw(image.width, image.height, rgba)
            .expect("coverage buffer matches image dimensions");

        let (view, sampler) = upload_rgba(&self.device, &self.queue, &img, "dialog_glyphs");
        self.glyph_bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("dialog_glyphs_bg"),
            layout: &self.overlay_pipeline.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        }));
    }

    /// Render one frame.
    ///
    /// Pass 1 — scene: textured quads under the perspective camera, depth
    /// buffer cleared to 1.0, one draw per registered texture in use.
    /// Pass 2 — overlay: dialogue tiles then glyph quads under the
    /// orthographic projection, no depth attachment, so overlay geometry
    /// layers in emission order.
    pub fn render(
        &mut self,
        scene_verts: &[SceneVertex],
        scene_draws: &[SceneDraw],
        frame: &OverlayFrame,
    ) -> Result<(), wgpu::SurfaceError> {
        let surface_tex = self.surface.get_current_texture()?;
        let view = surface_tex
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        // ── Pass 1: 3D scene [perspective, depth-tested] ──────────────────
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if !scene_verts.is_empty() {
                let vbuf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("scene_vertex_buffer"),
                    contents: bytemuck::cast_slice(scene_verts),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                pass.set_pipeline(&self.scene_pipeline.render_pipeline);
                pass.set_bind_group(0, &self.camera_bind_group, &[]);
                pass.set_vertex_buffer(0, vbuf.slice(..));
                for draw in scene_draws {
                    if let Some(tex) = self.textures.get(draw.texture) {
                        pass.set_bind_group(1, &tex.bind_group, &[]);
                        pass.draw(draw.start..draw.start + draw.count, 0..1);
                    }
                }
            }
        }

        // ── Pass 2: overlay [orthographic, painter order] ─────────────────
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("overlay_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if !frame.tile_vertices.is_empty() {
                let vbuf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("overlay_tile_buffer"),
                    contents: bytemuck::cast_slice(&frame.tile_vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                pass.set_pipeline(&self.overlay_pipeline.render_pipeline);
                pass.set_bind_group(0, &self.projection_bind_group, &[]);
                pass.set_bind_group(1, &self.atlas_bind_group, &[]);
                pass.set_vertex_buffer(0, vbuf.slice(..));
                pass.draw(0..frame.tile_vertices.len() as u32, 0..1);
            }

            if !frame.text_vertices.is_empty() {
                if let Some(glyph_bg) = &self.glyph_bind_group {
                    let vbuf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("overlay_text_buffer"),
                        contents: bytemuck::cast_slice(&frame.text_vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
                    pass.set_pipeline(&self.overlay_pipeline.render_pipeline);
                    pass.set_bind_group(0, &self.projection_bind_group, &[]);
                    pass.set_bind_group(1, glyph_bg, &[]);
                    pass.set_vertex_buffer(0, vbuf.slice(..));
                    pass.draw(0..frame.text_vertices.len() as u32, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_tex.present();
        Ok(())
    }
}

// ── GPU helpers ──────────────────────────────────────────────────────────────

fn create_depth_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    img: &image::RgbaImage,
    label: &str,
) -> (wgpu::TextureView, wgpu::Sampler) {
    let (w, h) = img.dimensions();
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        img.as_raw(),
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });
    (view, sampler)
}
