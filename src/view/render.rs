use glam::Mat4;
use wgpu::*;

use crate::config::DonutConfig;
use crate::controller::GraphicsBackend;
use crate::error::{Error, Result};
use crate::model::Camera;
use crate::utils::{Mesh, MeshBuffer, Vertex};
use super::gpu_init::GpuContext;
use super::texture::DonutTexture;

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub world: [[f32; 4]; 4],
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

// Uniforms and texture share one bind group
pub struct SceneResources {
    pub camera_buffer: wgpu::Buffer,
    pub world_buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

pub fn create_scene_resources(device: &wgpu::Device, texture: &DonutTexture) -> SceneResources {
    let uniform_size = std::mem::size_of::<CameraUniform>() as wgpu::BufferAddress;
    let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("camera_buffer"),
        size: uniform_size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let world_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("world_buffer"),
        size: std::mem::size_of::<TransformUniform>() as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scene_bind_group_layout"),
        entries: &[
            uniform_entry(0),
            uniform_entry(1),
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scene_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: world_buffer.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&texture.view) },
            wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::Sampler(&texture.sampler) },
        ],
    });

    SceneResources { camera_buffer, world_buffer, bind_group_layout, bind_group }
}

/// Compile the donut shader and link it into a pipeline.
///
/// Validation errors are captured instead of hitting the device's uncaptured
/// error handler, so a bad shader surfaces as `Error::SetupFailure`.
pub async fn create_donut_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    bind_group_layout: &wgpu::BindGroupLayout,
) -> Result<wgpu::RenderPipeline> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("donut_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/donut.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("donut_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState { format, blend: Some(wgpu::BlendState::REPLACE), write_mask: wgpu::ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    });

    if let Some(err) = device.pop_error_scope().await {
        return Err(Error::setup(format!("donut pipeline rejected: {err}")));
    }

    Ok(pipeline)
}

///////////////////////////////////////////////////////////////////////////////

/// egui output waiting to be drawn on top of the next frame
pub struct Overlay {
    pub renderer: egui_wgpu::Renderer,
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// Owns the surface and every GPU resource the donut needs
pub struct Renderer {
    gpu: GpuContext,
    pipeline: RenderPipeline,
    scene: SceneResources,
    // kept alive for the bind group
    _texture: DonutTexture,
    depth_view: TextureView,
    camera: Camera,
    clear_color: Color,
    overlay: Option<Overlay>,
}

impl Renderer {
    pub async fn new(gpu: GpuContext, config: &DonutConfig, image: &image::RgbaImage) -> Result<Self> {
        let device = gpu.device.as_ref();
        let (width, height) = (gpu.config.width, gpu.config.height);

        let texture = DonutTexture::upload(device, gpu.queue.as_ref(), image);
        let scene = create_scene_resources(device, &texture);
        let pipeline = create_donut_pipeline(device, gpu.format, &scene.bind_group_layout).await?;
        let (_, depth_view) = create_depth_texture(device, width, height);
        let camera = Camera::new(width, height);

        let renderer = Self {
            gpu,
            pipeline,
            scene,
            _texture: texture,
            depth_view,
            camera,
            clear_color: config.clear_color,
            overlay: None,
        };
        renderer.write_camera();
        renderer.write_world(Mat4::IDENTITY);
        tracing::info!(width, height, format = ?renderer.gpu.format, "renderer ready");
        Ok(renderer)
    }

    /// Draw egui on top of every frame from now on
    pub fn enable_overlay(&mut self) {
        let renderer = egui_wgpu::Renderer::new(
            self.gpu.device.as_ref(),
            self.gpu.format,
            egui_wgpu::RendererOptions::default(),
        );
        self.overlay = Some(Overlay {
            renderer,
            primitives: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
            pixels_per_point: 1.0,
        });
    }

    pub fn stage_overlay(
        &mut self,
        primitives: Vec<egui::ClippedPrimitive>,
        textures_delta: egui::TexturesDelta,
        pixels_per_point: f32,
    ) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.primitives = primitives;
            overlay.textures_delta.append(textures_delta);
            overlay.pixels_per_point = pixels_per_point;
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.gpu.config.width, self.gpu.config.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.gpu.resize(width, height) {
            return;
        }
        let (_, depth_view) = create_depth_texture(self.gpu.device.as_ref(), width, height);
        self.depth_view = depth_view;
        self.camera.set_aspect(width, height);
        self.write_camera();
        tracing::debug!(width, height, "surface resized");
    }

    pub fn reconfigure(&self) {
        self.gpu.reconfigure();
    }

    fn write_camera(&self) {
        let uniform = CameraUniform { view_proj: self.camera.view_proj().to_cols_array_2d() };
        self.gpu.queue.write_buffer(&self.scene.camera_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    fn write_world(&self, world: Mat4) {
        let uniform = TransformUniform { world: world.to_cols_array_2d() };
        self.gpu.queue.write_buffer(&self.scene.world_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Present again with whatever world matrix was last uploaded
    pub fn present_held(&mut self, mesh: &MeshBuffer) -> std::result::Result<(), SurfaceError> {
        self.present(mesh, mesh.index_count)
    }

    fn present(&mut self, mesh: &MeshBuffer, index_count: u32) -> std::result::Result<(), SurfaceError> {
        let frame = self.gpu.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let device = self.gpu.device.as_ref();
        let queue = self.gpu.queue.as_ref();

        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("donut_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.pipeline);
            rp.set_bind_group(0, &self.scene.bind_group, &[]);
            rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            rp.set_index_buffer(mesh.index_buffer.slice(..), IndexFormat::Uint16);
            rp.draw_indexed(0..index_count, 0, 0..1);
        }

        let mut command_buffers = Vec::new();
        if let Some(overlay) = self.overlay.as_mut() {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.gpu.config.width, self.gpu.config.height],
                pixels_per_point: overlay.pixels_per_point,
            };
            let textures_delta = std::mem::take(&mut overlay.textures_delta);

            // Upload egui textures
            for (id, image_delta) in &textures_delta.set {
                overlay.renderer.update_texture(device, queue, *id, image_delta);
            }

            command_buffers = overlay.renderer.update_buffers(
                device,
                queue,
                &mut encoder,
                &overlay.primitives,
                &screen_descriptor,
            );

            {
                let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                    label: Some("egui_render_pass"),
                    color_attachments: &[Some(RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: Operations {
                            load: LoadOp::Load,
                            store: StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                overlay.renderer.render(&mut egui_pass.forget_lifetime(), &overlay.primitives, &screen_descriptor);
            }

            // Free egui textures
            for id in &textures_delta.free {
                overlay.renderer.free_texture(id);
            }
        }

        command_buffers.push(encoder.finish());
        queue.submit(command_buffers);
        frame.present();
        Ok(())
    }
}

impl GraphicsBackend for Renderer {
    type Mesh = MeshBuffer;
    type Error = SurfaceError;

    fn create_mesh(&mut self, mesh: &Mesh) -> MeshBuffer {
        mesh.upload(self.gpu.device.as_ref())
    }

    fn set_world_uniform(&mut self, world: Mat4) {
        self.write_world(world);
    }

    fn draw_indexed(&mut self, mesh: &MeshBuffer, index_count: u32) -> std::result::Result<(), SurfaceError> {
        self.present(mesh, index_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_are_one_mat4_each() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<TransformUniform>(), 64);
    }

    #[test]
    fn world_uniform_is_column_major() {
        let world = Mat4::from_translation(glam::Vec3::new(2.0, 3.0, 4.0));
        let uniform = TransformUniform { world: world.to_cols_array_2d() };
        assert_eq!(uniform.world[3], [2.0, 3.0, 4.0, 1.0]);
    }
}
