use std::path::Path;
use std::sync::Arc;

use glam::Mat4;
use winit::window::Window;

use crate::controller::frame_loop::{CameraUniform, ObjectUniform};
use crate::error::InitError;
use crate::model::GameObject;
use crate::utils::{Mesh, MeshBuffer};
use crate::view::gpu_init::GpuContext;
use crate::view::shader::{self, ShaderProgram, ShaderStage};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const CLEAR_COLOUR: wgpu::Color = wgpu::Color { r: 0.5, g: 0.8, b: 1.0, a: 1.0 };

/// The graphics collaborator: buffer upload, shader binding and draw submission.
pub trait Graphics {
    /// Per-mesh GPU handles, stored inside each `MeshRenderer`.
    type Buffers;
    type Program;

    fn create_program(&mut self, vertex: &Path, fragment: &Path) -> Result<Self::Program, InitError>;

    fn create_buffers(&mut self, mesh: &Mesh) -> Self::Buffers;

    fn destroy_buffers(&mut self, buffers: Self::Buffers);

    /// Upload the camera matrix and every object's model matrix and colour.
    fn bind_shader_data(&mut self, view_proj: Mat4, objects: &[GameObject<Self::Buffers>]);

    /// Record and submit one frame. The result is shown by `present`.
    fn draw(&mut self, program: &Self::Program, objects: &[GameObject<Self::Buffers>], viewport: (u32, u32));

    fn present(&mut self);

    fn resize(&mut self, width: u32, height: u32);
}

pub struct CameraResources {
    pub camera_buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub camera_bind_group: wgpu::BindGroup,
}

pub struct ObjectBuffers {
    pub mesh: MeshBuffer,
    pub uniform: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
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

pub(crate) fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
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
    })
}

pub fn create_camera_resources(device: &wgpu::Device) -> CameraResources {
    let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = uniform_layout(device, "camera_bind_group_layout");

    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() }],
    });

    CameraResources { camera_buffer, bind_group_layout, camera_bind_group }
}

/// wgpu implementation of [`Graphics`], drawing into the game window.
pub struct WgpuGraphics {
    gpu: GpuContext,
    depth_view: wgpu::TextureView,
    camera: CameraResources,
    object_layout: wgpu::BindGroupLayout,
    frame: Option<wgpu::SurfaceTexture>,
}

impl WgpuGraphics {
    pub fn new(window: Arc<Window>) -> Result<Self, InitError> {
        let size = window.inner_size();
        let gpu = pollster::block_on(GpuContext::new_native(window, size.width, size.height))?;
        let (_, depth_view) = create_depth_texture(&gpu.device, gpu.config.width, gpu.config.height);
        let camera = create_camera_resources(&gpu.device);
        let object_layout = uniform_layout(&gpu.device, "object_bind_group_layout");

        Ok(Self {
            gpu,
            depth_view,
            camera,
            object_layout,
            frame: None,
        })
    }
}

impl Graphics for WgpuGraphics {
    type Buffers = ObjectBuffers;
    type Program = ShaderProgram;

    fn create_program(&mut self, vertex: &Path, fragment: &Path) -> Result<ShaderProgram, InitError> {
        let device = &self.gpu.device;
        let vertex = shader::load(device, vertex, ShaderStage::Vertex)?;
        let fragment = shader::load(device, fragment, ShaderStage::Fragment)?;
        shader::bind(
            device,
            &vertex,
            &fragment,
            &[&self.camera.bind_group_layout, &self.object_layout],
            self.gpu.format,
            DEPTH_FORMAT,
        )
    }

    fn create_buffers(&mut self, mesh: &Mesh) -> ObjectBuffers {
        let device = &self.gpu.device;
        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object_buffer"),
            size: std::mem::size_of::<ObjectUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: uniform.as_entire_binding() }],
        });

        ObjectBuffers { mesh: mesh.upload(device), uniform, bind_group }
    }

    fn destroy_buffers(&mut self, buffers: ObjectBuffers) {
        buffers.mesh.destroy();
        buffers.uniform.destroy();
    }

    fn bind_shader_data(&mut self, view_proj: Mat4, objects: &[GameObject<ObjectBuffers>]) {
        let queue = &self.gpu.queue;
        queue.write_buffer(&self.camera.camera_buffer, 0, bytemuck::bytes_of(&CameraUniform::new(view_proj)));
        for object in objects {
            let data = ObjectUniform::new(object.transform.matrix(), object.renderer.colour);
            queue.write_buffer(&object.renderer.buffers.uniform, 0, bytemuck::bytes_of(&data));
        }
    }

    fn draw(&mut self, program: &ShaderProgram, objects: &[GameObject<ObjectBuffers>], viewport: (u32, u32)) {
        if viewport.0 == 0 || viewport.1 == 0 {
            return; // minimised
        }
        // Only one surface texture may be outstanding
        drop(self.frame.take());

        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost, reconfiguring");
                self.gpu.surface.configure(&self.gpu.device, &self.gpu.config);
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::debug!("surface timeout, skipping frame");
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOUR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
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
            });

            let width = viewport.0.min(self.gpu.config.width) as f32;
            let height = viewport.1.min(self.gpu.config.height) as f32;
            render_pass.set_viewport(0.0, 0.0, width, height, 0.0, 1.0);
            render_pass.set_pipeline(&program.pipeline);
            render_pass.set_bind_group(0, &self.camera.camera_bind_group, &[]);

            for object in objects {
                let buffers = &object.renderer.buffers;
                if buffers.mesh.index_count == 0 {
                    continue;
                }
                render_pass.set_bind_group(1, &buffers.bind_group, &[]);
                render_pass.set_vertex_buffer(0, buffers.mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(buffers.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..buffers.mesh.index_count, 0, 0..1);
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        self.frame = Some(frame);
    }

    fn present(&mut self) {
        if let Some(frame) = self.frame.take() {
            frame.present();
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        drop(self.frame.take());
        self.gpu.reconfigure(width, height);
        let (_, depth_view) = create_depth_texture(&self.gpu.device, width, height);
        self.depth_view = depth_view;
        tracing::debug!("resized surface to {}x{}", width, height);
    }
}
