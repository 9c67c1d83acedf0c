use crate::backend::RenderBackend;
use crate::camera::CameraUniform;
use log::{trace, warn};
use std::borrow::Cow;
use std::sync::Arc;
use wgpu::{util::DeviceExt, PipelineCompilationOptions};

pub const DRAW_SHADER: &str = include_str!("shaders/draw.wgsl");

pub const BACKGROUND: wgpu::Color = wgpu::Color {
  r: 0.01,
  g: 0.01,
  b: 0.02,
  a: 1.0,
};

/// Draws the particle buffer as a point list. Each frame the caller hands
/// in a target view with [`WgpuRenderer::begin_frame`] and takes it back
/// with [`WgpuRenderer::end_frame`].
pub struct WgpuRenderer {
  device: Arc<wgpu::Device>,
  queue: Arc<wgpu::Queue>,
  render_pipeline: wgpu::RenderPipeline,
  camera_buffer: wgpu::Buffer,
  camera_bind_group: wgpu::BindGroup,
  particle_bind_group_layout: wgpu::BindGroupLayout,
  particle_bind_group: Option<(Arc<wgpu::Buffer>, wgpu::BindGroup)>,
  target: Option<wgpu::TextureView>,
  state_set: bool,
}

impl WgpuRenderer {
  #[must_use]
  pub fn init(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, format: wgpu::TextureFormat) -> Self {
    let draw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("Particle draw shader"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(DRAW_SHADER)),
    });

    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Camera Buffer"),
      contents: bytemuck::bytes_of(&CameraUniform::default()),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let camera_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
        label: Some("camera_bind_group_layout"),
      });
    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &camera_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: camera_buffer.as_entire_binding(),
      }],
      label: Some("camera_bind_group"),
    });

    let particle_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        }],
        label: Some("particle_bind_group_layout"),
      });

    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("render"),
      bind_group_layouts: &[&camera_bind_group_layout, &particle_bind_group_layout],
      push_constant_ranges: &[],
    });
    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Point Pipeline"),
      layout: Some(&render_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &draw_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[],
      },
      fragment: Some(wgpu::FragmentState {
        module: &draw_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(format.into())],
      }),
      primitive: wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::PointList,
        ..Default::default()
      },
      depth_stencil: None,
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    Self {
      device,
      queue,
      render_pipeline,
      camera_buffer,
      camera_bind_group,
      particle_bind_group_layout,
      particle_bind_group: None,
      target: None,
      state_set: false,
    }
  }

  pub fn update_camera(&self, uniform: &CameraUniform) {
    self
      .queue
      .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(uniform));
  }

  pub fn begin_frame(&mut self, view: wgpu::TextureView) {
    self.target = Some(view);
  }

  pub fn end_frame(&mut self) -> Option<wgpu::TextureView> {
    self.state_set = false;
    self.target.take()
  }
}

impl RenderBackend for WgpuRenderer {
  type Buffer = Arc<wgpu::Buffer>;

  fn bind_buffer(&mut self, name: &str, buffer: &Arc<wgpu::Buffer>) {
    if name != "inputBuffer" {
      warn!("draw shader has no buffer named '{name}'");
      return;
    }
    let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &self.particle_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: buffer.as_entire_binding(),
      }],
      label: Some("particle_bind_group"),
    });
    self.particle_bind_group = Some((Arc::clone(buffer), bind_group));
  }

  fn set_render_state(&mut self) {
    self.state_set = true;
  }

  fn draw_points(&mut self, buffer: &Arc<wgpu::Buffer>, count: u32) {
    let Some(view) = &self.target else {
      trace!("no render target this frame");
      return;
    };
    let Some((bound, particle_bind_group)) = &self.particle_bind_group else {
      warn!("draw skipped: no particle buffer bound");
      return;
    };
    if !Arc::ptr_eq(bound, buffer) {
      warn!("draw skipped: buffer is not the one bound as inputBuffer");
      return;
    }
    if !self.state_set {
      warn!("drawing without set_render_state");
    }

    let color_attachments = [Some(wgpu::RenderPassColorAttachment {
      view,
      resolve_target: None,
      ops: wgpu::Operations {
        load: wgpu::LoadOp::Clear(BACKGROUND),
        store: wgpu::StoreOp::Store,
      },
    })];
    let mut command_encoder = self
      .device
      .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut rpass = command_encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: None,
        color_attachments: &color_attachments,
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
      });
      rpass.set_pipeline(&self.render_pipeline);
      rpass.set_bind_group(0, &self.camera_bind_group, &[]);
      rpass.set_bind_group(1, particle_bind_group, &[]);
      rpass.draw(0..count, 0..1);
    }
    self.queue.submit(Some(command_encoder.finish()));
  }
}
