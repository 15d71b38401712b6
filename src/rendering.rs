//! Rendering system with wgpu pipeline and shader management.
//!
//! The scene is tiny and rebuilt on the CPU every frame: the ground
//! patch, a floating image-plane proxy, frustum lines, square point
//! markers and the HUD overlay texture. No depth buffer; draw order
//! is painter's order, back to front.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;

use crate::params::RenderConfig;
use crate::sim::FrameSnapshot;

/// Uniform buffer for the scene shader (view-projection matrix)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
}

/// Flat-colored vertex shared by every scene pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

// Fixed vertex capacities: the scene has a constant shape, so buffers
// are allocated once at their maximum size and rewritten each frame.
const MAX_TRIANGLE_VERTS: usize = 12;
const MAX_LINE_VERTS: usize = 10;
const MAX_MARKER_VERTS: usize = 72;

// Markers on the patch surface are lifted half a meter so they stay
// visible over the patch fill
const GROUND_MARKER_LIFT_M: f32 = 0.5;

// Image-plane proxy: a small rectangle hung just under the camera,
// scaled from the patch spans
const IMAGE_PLANE_DROP: f32 = 0.1;
const IMAGE_PLANE_SCALE: f32 = 0.05;
const IMAGE_MARKER_DROP: f32 = 0.095;

/// Per-frame vertex lists consumed by [`RenderSystem::render`].
pub struct SceneGeometry {
    /// World-space triangles (ground patch, image plane)
    pub triangles: Vec<ColorVertex>,
    /// World-space line segments (centroid ray, frustum edges)
    pub lines: Vec<ColorVertex>,
    /// Screen-space marker triangles, positions already in NDC
    pub markers: Vec<ColorVertex>,
}

/// View-projection matrix of the fixed external observer.
pub fn observer_view_proj(config: &RenderConfig) -> Mat4 {
    let eye = Vec3::from_array(config.observer_eye_m);
    let target = Vec3::from_array(config.observer_target_m);
    let view = Mat4::look_at_rh(eye, target, Vec3::Y);
    let proj = Mat4::perspective_rh(
        config.fov_y_degrees.to_radians(),
        config.aspect_ratio,
        config.near_plane_m,
        config.far_plane_m,
    );
    proj * view
}

/// Convert an 8-bit sRGB color to the linear values the shader writes.
fn srgb(r: u8, g: u8, b: u8, a: f32) -> [f32; 4] {
    fn channel(c: u8) -> f32 {
        let c = c as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    [channel(r), channel(g), channel(b), a]
}

fn push_quad(out: &mut Vec<ColorVertex>, corners: [Vec3; 4], color: [f32; 4]) {
    let [a, b, c, d] = corners;
    for p in [a, b, c, a, c, d] {
        out.push(ColorVertex {
            position: p.to_array(),
            color,
        });
    }
}

fn push_line(out: &mut Vec<ColorVertex>, from: Vec3, to: Vec3, color: [f32; 4]) {
    for p in [from, to] {
        out.push(ColorVertex {
            position: p.to_array(),
            color,
        });
    }
}

/// Project a world point and append a square marker in NDC.
/// Points behind the observer are skipped.
fn push_marker(
    out: &mut Vec<ColorVertex>,
    world: Vec3,
    view_proj: Mat4,
    surface_size: (u32, u32),
    size_px: f32,
    color: [f32; 4],
) {
    let clip = view_proj * Vec4::new(world.x, world.y, world.z, 1.0);
    if clip.w <= 0.0 {
        return;
    }
    let cx = clip.x / clip.w;
    let cy = clip.y / clip.w;
    let half_w = size_px / surface_size.0 as f32;
    let half_h = size_px / surface_size.1 as f32;
    push_quad(
        out,
        [
            Vec3::new(cx - half_w, cy - half_h, 0.0),
            Vec3::new(cx + half_w, cy - half_h, 0.0),
            Vec3::new(cx + half_w, cy + half_h, 0.0),
            Vec3::new(cx - half_w, cy + half_h, 0.0),
        ],
        color,
    );
}

/// Build the frame's vertex lists from the simulation snapshot.
pub fn build_scene(
    snap: &FrameSnapshot,
    view_proj: Mat4,
    config: &RenderConfig,
    surface_size: (u32, u32),
) -> SceneGeometry {
    let ground_color = srgb(17, 124, 19, 1.0);
    let plane_color = srgb(0x80, 0x80, 0x80, 0.5);
    let line_color = srgb(0xFF, 0xFF, 0xFF, 0.3);
    let white = srgb(0xFF, 0xFF, 0xFF, 1.0);
    let camera_color = srgb(0xA0, 0xA0, 0xFF, 1.0);
    let black = srgb(0x00, 0x00, 0x00, 1.0);
    let blue = srgb(0x00, 0x00, 0xFF, 1.0);

    let corners = snap.corners.map(|c| c.as_vec3());
    let centroid = snap.centroid.as_vec3();
    let camera = snap.camera_pos.as_vec3();
    let height = camera.y;

    let mut triangles = Vec::with_capacity(MAX_TRIANGLE_VERTS);
    push_quad(&mut triangles, corners, ground_color);

    // Image-plane proxy under the camera, spans scaled down from the patch
    let plane_y = height - IMAGE_PLANE_DROP * height;
    let half_x = IMAGE_PLANE_SCALE * snap.vert_span_m as f32;
    let half_z = IMAGE_PLANE_SCALE * snap.horz_span_m as f32;
    push_quad(
        &mut triangles,
        [
            Vec3::new(camera.x - half_x, plane_y, camera.z - half_z),
            Vec3::new(camera.x - half_x, plane_y, camera.z + half_z),
            Vec3::new(camera.x + half_x, plane_y, camera.z + half_z),
            Vec3::new(camera.x + half_x, plane_y, camera.z - half_z),
        ],
        plane_color,
    );

    // Centroid ray first, then frustum edges, all faint white
    let mut lines = Vec::with_capacity(MAX_LINE_VERTS);
    let gmp = centroid + Vec3::Y * GROUND_MARKER_LIFT_M;
    push_line(&mut lines, gmp, camera, line_color);
    for corner in corners {
        push_line(&mut lines, camera, corner, line_color);
    }

    let mut markers = Vec::with_capacity(MAX_MARKER_VERTS);
    let size_px = config.marker_size_px;
    let mark = |world: Vec3, color: [f32; 4], out: &mut Vec<ColorVertex>| {
        push_marker(out, world, view_proj, surface_size, size_px, color);
    };
    for corner in corners {
        mark(corner, white, &mut markers);
    }
    mark(gmp, white, &mut markers);
    mark(camera, camera_color, &mut markers);

    // Sample object: black inside the image plane, blue where the
    // planar estimate puts it on the ground
    let in_image = Vec3::new(
        camera.x + snap.sample_vertical_pct as f32 * half_x,
        height - IMAGE_MARKER_DROP * height,
        camera.z + snap.sample_horizontal_pct as f32 * half_z,
    );
    mark(in_image, black, &mut markers);
    let est = snap.sample_planar.as_vec3() + Vec3::Y * GROUND_MARKER_LIFT_M;
    mark(est, blue, &mut markers);

    let ext = config.horizon_extent_m;
    for cardinal in [
        Vec3::new(ext, 0.0, 0.0),
        Vec3::new(-ext, 0.0, 0.0),
        Vec3::new(0.0, 0.0, ext),
        Vec3::new(0.0, 0.0, -ext),
    ] {
        mark(cardinal, white, &mut markers);
    }

    SceneGeometry {
        triangles,
        lines,
        markers,
    }
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct RenderSystem {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    world_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    marker_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    triangle_buffer: wgpu::Buffer,
    line_buffer: wgpu::Buffer,
    marker_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    overlay_layout: wgpu::BindGroupLayout,
    overlay_sampler: wgpu::Sampler,
    overlay_texture: wgpu::Texture,
    overlay_bind_group: wgpu::BindGroup,
    window_size: (u32, u32),
}

impl RenderSystem {
    /// Create new rendering system
    pub async fn new(
        window: std::sync::Arc<winit::window::Window>,
    ) -> Result<Self, String> {
        let size = window.inner_size();
        let window_size = (size.width, size.height);

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance
            .create_surface(window)
            .map_err(|e| format!("Failed to create surface: {}", e))?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or("Failed to find suitable GPU adapter")?;

        // Request device
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| format!("Failed to request device: {}", e))?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Load shaders
        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        });

        let overlay_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("overlay.wgsl").into()),
        });

        // Create buffers at fixed maximum sizes, rewritten each frame
        let stride = std::mem::size_of::<ColorVertex>() as u64;
        let vertex_usage = wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST;
        let triangle_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Triangle Buffer"),
            size: MAX_TRIANGLE_VERTS as u64 * stride,
            usage: vertex_usage,
            mapped_at_creation: false,
        });
        let line_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Buffer"),
            size: MAX_LINE_VERTS as u64 * stride,
            usage: vertex_usage,
            mapped_at_creation: false,
        });
        let marker_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Marker Buffer"),
            size: MAX_MARKER_VERTS as u64 * stride,
            usage: vertex_usage,
            mapped_at_creation: false,
        });

        let uniforms = Uniforms {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        // One layout for all three scene pipelines
        let scene_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let world_pipeline = Self::create_scene_pipeline(
            &device,
            &scene_pipeline_layout,
            &scene_shader,
            "vs_world",
            wgpu::PrimitiveTopology::TriangleList,
            config.format,
            "World Pipeline",
        );
        let line_pipeline = Self::create_scene_pipeline(
            &device,
            &scene_pipeline_layout,
            &scene_shader,
            "vs_world",
            wgpu::PrimitiveTopology::LineList,
            config.format,
            "Line Pipeline",
        );
        let marker_pipeline = Self::create_scene_pipeline(
            &device,
            &scene_pipeline_layout,
            &scene_shader,
            "vs_screen",
            wgpu::PrimitiveTopology::TriangleList,
            config.format,
            "Marker Pipeline",
        );

        // HUD overlay: texture + sampler sampled by a fullscreen triangle
        let overlay_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let overlay_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Overlay Sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let (overlay_texture, overlay_bind_group) =
            Self::create_overlay_texture(&device, &overlay_layout, &overlay_sampler, window_size);

        let overlay_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Overlay Pipeline Layout"),
                bind_group_layouts: &[&overlay_layout],
                push_constant_ranges: &[],
            });

        let overlay_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Overlay Pipeline"),
            layout: Some(&overlay_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &overlay_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &overlay_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            world_pipeline,
            line_pipeline,
            marker_pipeline,
            overlay_pipeline,
            triangle_buffer,
            line_buffer,
            marker_buffer,
            uniform_buffer,
            uniform_bind_group,
            overlay_layout,
            overlay_sampler,
            overlay_texture,
            overlay_bind_group,
            window_size,
        })
    }

    fn create_scene_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        vs_entry: &str,
        topology: wgpu::PrimitiveTopology,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(vs_entry),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ColorVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3,
                        },
                        wgpu::VertexAttribute {
                            offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32x4,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // The patch is viewed from either side once edges cross
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_overlay_texture(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: (u32, u32),
    ) -> (wgpu::Texture, wgpu::BindGroup) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Overlay Texture"),
            size: wgpu::Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        (texture, bind_group)
    }

    /// Reconfigure the surface and overlay texture after a window resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.window_size = (width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        let (texture, bind_group) = Self::create_overlay_texture(
            &self.device,
            &self.overlay_layout,
            &self.overlay_sampler,
            self.window_size,
        );
        self.overlay_texture = texture;
        self.overlay_bind_group = bind_group;
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    /// Render a frame: upload the frame's vertices, uniform matrix and
    /// HUD pixels, then draw ground, image plane, lines, markers and
    /// the text overlay in painter's order.
    pub fn render(
        &self,
        scene: &SceneGeometry,
        view_proj: Mat4,
        hud_pixels: &[u8],
    ) -> Result<(), wgpu::SurfaceError> {
        let uniforms = Uniforms {
            view_proj: view_proj.to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
        self.queue
            .write_buffer(&self.triangle_buffer, 0, bytemuck::cast_slice(&scene.triangles));
        self.queue
            .write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(&scene.lines));
        self.queue
            .write_buffer(&self.marker_buffer, 0, bytemuck::cast_slice(&scene.markers));

        let (width, height) = self.window_size;
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.overlay_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            hud_pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        // 30% gray in sRGB terms
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.073,
                            g: 0.073,
                            b: 0.073,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.world_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.triangle_buffer.slice(..));
            render_pass.draw(0..scene.triangles.len() as u32, 0..1);

            render_pass.set_pipeline(&self.line_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.line_buffer.slice(..));
            render_pass.draw(0..scene.lines.len() as u32, 0..1);

            render_pass.set_pipeline(&self.marker_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.marker_buffer.slice(..));
            render_pass.draw(0..scene.markers.len() as u32, 0..1);

            render_pass.set_pipeline(&self.overlay_pipeline);
            render_pass.set_bind_group(0, &self.overlay_bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyStates;
    use crate::params::{ControlConfig, SimulationParams};
    use crate::sim::Simulation;

    #[test]
    fn test_scene_fits_fixed_buffers() {
        let mut sim = Simulation::new(SimulationParams::default(), ControlConfig::default());
        let snap = sim.step(&KeyStates::new(), 0, 0.01);

        let config = RenderConfig::default();
        let view_proj = observer_view_proj(&config);
        let scene = build_scene(&snap, view_proj, &config, (1280, 720));

        assert_eq!(scene.triangles.len(), MAX_TRIANGLE_VERTS);
        assert_eq!(scene.lines.len(), MAX_LINE_VERTS);
        // All twelve markers visible from the default observer
        assert_eq!(scene.markers.len(), MAX_MARKER_VERTS);
    }

    #[test]
    fn test_markers_behind_observer_are_skipped() {
        let mut out = Vec::new();
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
        let proj = Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0);

        push_marker(&mut out, Vec3::new(0.0, 0.0, 5.0), proj * view, (100, 100), 6.0, [1.0; 4]);
        assert!(out.is_empty());

        push_marker(&mut out, Vec3::new(0.0, 0.0, -5.0), proj * view, (100, 100), 6.0, [1.0; 4]);
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn test_srgb_endpoints() {
        assert_eq!(srgb(0, 0, 0, 1.0), [0.0, 0.0, 0.0, 1.0]);
        let white = srgb(255, 255, 255, 1.0);
        assert!((white[0] - 1.0).abs() < 1e-6);
    }
}
