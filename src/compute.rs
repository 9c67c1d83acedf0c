use crate::backend::ComputeBackend;
use crate::error::BackendError;
use log::{trace, warn};
use std::borrow::Cow;
use std::sync::Arc;
use wgpu::{util::DeviceExt, PipelineCompilationOptions};

pub const COMPUTE_SHADER: &str = include_str!("shaders/compute.wgsl");

/// Uniform block `Params` in `shaders/compute.wgsl`. Named parameters set
/// through [`ComputeBackend`] land in these fields.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct KernelParams {
  pub left_controller: [f32; 4],
  pub right_controller: [f32; 4],
  pub damping: f32,
  pub particle_charge: f32,
  pub particle_mass: f32,
  pub softening_factor: f32,
}

impl KernelParams {
  /// Returns false if the kernel has no scalar called `name`.
  pub fn set_scalar(&mut self, name: &str, value: f32) -> bool {
    let slot = match name {
      "Damping" => &mut self.damping,
      "ParticleCharge" => &mut self.particle_charge,
      "ParticleMass" => &mut self.particle_mass,
      "SofteningFactor" => &mut self.softening_factor,
      _ => return false,
    };
    *slot = value;
    true
  }

  pub fn set_vector4(&mut self, name: &str, value: [f32; 4]) -> bool {
    let slot = match name {
      "LeftController" => &mut self.left_controller,
      "RightController" => &mut self.right_controller,
      _ => return false,
    };
    *slot = value;
    true
  }
}

/// Names of the `@compute` entry points declared in a WGSL source. A source
/// that does not parse has none.
pub fn compute_entry_points(source: &str) -> Vec<String> {
  match naga::front::wgsl::parse_str(source) {
    Ok(module) => module
      .entry_points
      .into_iter()
      .filter(|e| e.stage == naga::ShaderStage::Compute)
      .map(|e| e.name)
      .collect(),
    Err(e) => {
      warn!("compute shader does not parse: {}", e.emit_to_string(source));
      Vec::new()
    }
  }
}

/// Binding slot of a named storage buffer in the compute bind group.
fn buffer_binding(name: &str) -> Option<u32> {
  match name {
    "outputBuffer" => Some(1),
    _ => None,
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WgpuKernel(usize);

struct KernelSlot {
  name: String,
  pipeline: wgpu::ComputePipeline,
  bind_group: Option<wgpu::BindGroup>,
}

pub struct WgpuCompute {
  device: Arc<wgpu::Device>,
  queue: Arc<wgpu::Queue>,
  module: wgpu::ShaderModule,
  entry_points: Vec<String>,
  bind_group_layout: wgpu::BindGroupLayout,
  pipeline_layout: wgpu::PipelineLayout,
  kernels: Vec<KernelSlot>,
  params: KernelParams,
  params_buffer: wgpu::Buffer,
  params_dirty: bool,
}

impl WgpuCompute {
  pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
    Self::with_source(device, queue, COMPUTE_SHADER)
  }

  pub fn with_source(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, source: &str) -> Self {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("Particle compute shader"),
      source: wgpu::ShaderSource::Wgsl(Cow::Owned(source.to_owned())),
    });
    let params = KernelParams::default();
    let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Kernel Parameter Buffer"),
      contents: bytemuck::bytes_of(&params),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
      entries: &[
        wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::COMPUTE,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<KernelParams>() as _),
          },
          count: None,
        },
        wgpu::BindGroupLayoutEntry {
          binding: 1,
          visibility: wgpu::ShaderStages::COMPUTE,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        },
      ],
      label: Some("compute_bind_group_layout"),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("compute"),
      bind_group_layouts: &[&bind_group_layout],
      push_constant_ranges: &[],
    });

    Self {
      entry_points: compute_entry_points(source),
      device,
      queue,
      module,
      bind_group_layout,
      pipeline_layout,
      kernels: Vec::new(),
      params,
      params_buffer,
      params_dirty: false,
    }
  }
}

impl ComputeBackend for WgpuCompute {
  type Kernel = WgpuKernel;
  type Buffer = Arc<wgpu::Buffer>;

  fn find_kernel(&mut self, name: &str) -> Result<WgpuKernel, BackendError> {
    if let Some(i) = self.kernels.iter().position(|k| k.name == name) {
      return Ok(WgpuKernel(i));
    }
    if !self.entry_points.iter().any(|e| e == name) {
      return Err(BackendError::KernelNotFound(name.to_owned()));
    }
    let pipeline = self
      .device
      .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(name),
        layout: Some(&self.pipeline_layout),
        module: &self.module,
        entry_point: name,
        compilation_options: PipelineCompilationOptions::default(),
        cache: None,
      });
    self.kernels.push(KernelSlot {
      name: name.to_owned(),
      pipeline,
      bind_group: None,
    });
    Ok(WgpuKernel(self.kernels.len() - 1))
  }

  fn create_buffer(&mut self, count: u32, stride: usize) -> Arc<wgpu::Buffer> {
    Arc::new(self.device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Particle Buffer"),
      size: u64::from(count) * stride as u64,
      usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
      mapped_at_creation: false,
    }))
  }

  fn upload(&mut self, buffer: &Arc<wgpu::Buffer>, bytes: &[u8]) {
    self.queue.write_buffer(buffer, 0, bytes);
  }

  fn set_scalar(&mut self, name: &str, value: f32) {
    if self.params.set_scalar(name, value) {
      self.params_dirty = true;
    } else {
      trace!("kernel has no scalar '{name}'");
    }
  }

  fn set_vector4(&mut self, name: &str, value: [f32; 4]) {
    if self.params.set_vector4(name, value) {
      self.params_dirty = true;
    } else {
      trace!("kernel has no vector '{name}'");
    }
  }

  fn bind_buffer(&mut self, kernel: &WgpuKernel, name: &str, buffer: &Arc<wgpu::Buffer>) {
    let Some(binding) = buffer_binding(name) else {
      warn!("kernel has no buffer named '{name}'");
      return;
    };
    let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &self.bind_group_layout,
      entries: &[
        wgpu::BindGroupEntry {
          binding: 0,
          resource: self.params_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
          binding,
          resource: buffer.as_entire_binding(),
        },
      ],
      label: Some("compute_bind_group"),
    });
    self.kernels[kernel.0].bind_group = Some(bind_group);
  }

  fn dispatch(&mut self, kernel: &WgpuKernel, groups_x: u32, groups_y: u32, groups_z: u32) {
    let kernel = &self.kernels[kernel.0];
    let Some(bind_group) = &kernel.bind_group else {
      warn!("dispatch of '{}' skipped: no buffer bound", kernel.name);
      return;
    };
    if self.params_dirty {
      self
        .queue
        .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&self.params));
      self.params_dirty = false;
    }

    let mut command_encoder = self
      .device
      .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut cpass = command_encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: None,
        timestamp_writes: None,
      });
      cpass.set_pipeline(&kernel.pipeline);
      cpass.set_bind_group(0, bind_group, &[]);
      cpass.dispatch_workgroups(groups_x, groups_y, groups_z);
    }
    self.queue.submit(Some(command_encoder.finish()));
  }

  fn release_buffer(&mut self, buffer: Arc<wgpu::Buffer>) {
    for kernel in &mut self.kernels {
      kernel.bind_group = None;
    }
    buffer.destroy();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn finds_the_particle_kernel() {
    assert_eq!(compute_entry_points(COMPUTE_SHADER), vec!["ParticleFunction"]);
  }

  #[test]
  fn finds_several_entry_points() {
    let src = "@compute @workgroup_size(64)\nfn first() {}\nfn helper() {}\n@compute @workgroup_size(1) fn second_one(){}";
    assert_eq!(compute_entry_points(src), vec!["first", "second_one"]);
  }

  #[test]
  fn commented_out_kernels_are_not_entry_points() {
    let src = "// @compute @workgroup_size(64) fn ParticleFunction() {}\n@compute @workgroup_size(1)\nfn other() {}";
    assert_eq!(compute_entry_points(src), vec!["other"]);

    let src = "/* @compute @workgroup_size(64)\nfn ParticleFunction() {} */\nfn helper() {}";
    assert!(compute_entry_points(src).is_empty());
  }

  #[test]
  fn comments_mentioning_compute_do_not_tag_helpers() {
    let src = "// kernels are tagged @compute below\nfn helper() {}";
    assert!(compute_entry_points(src).is_empty());
  }

  #[test]
  fn only_compute_stage_entry_points_count() {
    let src = "@vertex fn vs() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }\n@compute @workgroup_size(1) fn cs() {}";
    assert_eq!(compute_entry_points(src), vec!["cs"]);
  }

  #[test]
  fn unparsable_source_has_no_entry_points() {
    assert!(compute_entry_points("@compute @workgroup_size(1) fn broken( {").is_empty());
  }

  #[test]
  fn params_match_the_uniform_block() {
    // two vec4 + four f32
    assert_eq!(std::mem::size_of::<KernelParams>(), 48);
  }

  #[test]
  fn named_parameters_land_in_their_slots() {
    let mut params = KernelParams::default();
    assert!(params.set_scalar("Damping", 0.01));
    assert!(params.set_scalar("SofteningFactor", 0.2));
    assert!(params.set_vector4("RightController", [1.0, 2.0, 3.0, -0.1]));
    assert!(!params.set_scalar("Gravity", 9.8));
    assert!(!params.set_vector4("Damping", [0.0; 4]));

    assert_eq!(params.damping, 0.01);
    assert_eq!(params.softening_factor, 0.2);
    assert_eq!(params.right_controller, [1.0, 2.0, 3.0, -0.1]);
    assert_eq!(params.left_controller, [0.0; 4]);
  }
}
