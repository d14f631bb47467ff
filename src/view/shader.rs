use std::fs;
use std::path::{Path, PathBuf};

use crate::error::InitError;
use crate::utils::Vertex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main",
            ShaderStage::Fragment => "fs_main",
        }
    }

    fn attribute(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "@vertex",
            ShaderStage::Fragment => "@fragment",
        }
    }
}

/// A compiled WGSL module for one pipeline stage.
pub struct ShaderHandle {
    pub module: wgpu::ShaderModule,
    pub stage: ShaderStage,
    pub path: PathBuf,
}

/// A vertex and fragment stage linked into a render pipeline.
#[derive(Debug)]
pub struct ShaderProgram {
    pub pipeline: wgpu::RenderPipeline,
}

/// Read WGSL source for `stage`, rejecting files without the stage's entry point.
pub fn read_source(path: &Path, stage: ShaderStage) -> Result<String, InitError> {
    let source = fs::read_to_string(path).map_err(|source| InitError::ShaderIo {
        path: path.to_path_buf(),
        source,
    })?;

    let entry = format!("fn {}", stage.entry_point());
    if !source.contains(stage.attribute()) || !source.contains(&entry) {
        return Err(InitError::ShaderCompile {
            path: path.to_path_buf(),
            message: format!("expected a {} entry point named {}", stage.attribute(), stage.entry_point()),
        });
    }
    Ok(source)
}

pub fn load(device: &wgpu::Device, path: &Path, stage: ShaderStage) -> Result<ShaderHandle, InitError> {
    let source = read_source(path, stage)?;
    let label = path.display().to_string();

    // Turn WGSL errors into an InitError instead of the device's panic handler
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label.as_str()),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(InitError::ShaderCompile {
            path: path.to_path_buf(),
            message: err.to_string(),
        });
    }

    tracing::debug!("loaded {:?} shader from {}", stage, path.display());
    Ok(ShaderHandle { module, stage, path: path.to_path_buf() })
}

pub fn bind(
    device: &wgpu::Device,
    vertex: &ShaderHandle,
    fragment: &ShaderHandle,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
) -> Result<ShaderProgram, InitError> {
    debug_assert_eq!(vertex.stage, ShaderStage::Vertex);
    debug_assert_eq!(fragment.stage, ShaderStage::Fragment);

    // Stages that compile alone can still disagree on their interface
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pipeline_layout"),
        bind_group_layouts,
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("render_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &vertex.module,
            entry_point: Some(vertex.stage.entry_point()),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &fragment.module,
            entry_point: Some(fragment.stage.entry_point()),
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
            format: depth_format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(InitError::ShaderCompile {
            path: fragment.path.clone(),
            message: format!("cannot link with {}: {err}", vertex.path.display()),
        });
    }

    tracing::info!(
        "bound shader program {} + {}",
        vertex.path.display(),
        fragment.path.display()
    );
    Ok(ShaderProgram { pipeline })
}
