//! Seams between the simulation driver and the outside world.
//!
//! The driver never talks to wgpu or an input runtime directly. It goes
//! through these three traits, so tests can swap in recording fakes and the
//! binary can plug in the wgpu backends from [`crate::compute`],
//! [`crate::render`] and [`crate::input`].

use crate::error::{BackendError, LookupError};

/// Accepts named parameters and buffers, and runs compute kernels.
pub trait ComputeBackend {
  type Kernel;
  type Buffer;

  fn find_kernel(&mut self, name: &str) -> Result<Self::Kernel, BackendError>;

  /// Allocates room for `count` elements of `stride` bytes each.
  fn create_buffer(&mut self, count: u32, stride: usize) -> Self::Buffer;

  fn upload(&mut self, buffer: &Self::Buffer, bytes: &[u8]);

  fn set_scalar(&mut self, name: &str, value: f32);

  fn set_vector4(&mut self, name: &str, value: [f32; 4]);

  fn bind_buffer(&mut self, kernel: &Self::Kernel, name: &str, buffer: &Self::Buffer);

  /// Runs `kernel` over a `groups_x * groups_y * groups_z` grid of thread groups.
  fn dispatch(&mut self, kernel: &Self::Kernel, groups_x: u32, groups_y: u32, groups_z: u32);

  fn release_buffer(&mut self, buffer: Self::Buffer);
}

/// Draws a particle buffer produced by a [`ComputeBackend`].
pub trait RenderBackend {
  type Buffer;

  fn bind_buffer(&mut self, name: &str, buffer: &Self::Buffer);

  fn set_render_state(&mut self);

  fn draw_points(&mut self, buffer: &Self::Buffer, count: u32);
}

/// Tracked controllers. Devices may be unavailable until the runtime warms up.
pub trait InputSource {
  type Device: Copy;

  fn resolve_device(&mut self, index: u32) -> Result<Self::Device, LookupError>;

  fn position(&self, device: Self::Device) -> [f32; 3];

  /// Analog trigger in [0, 1].
  fn trigger_axis(&self, device: Self::Device) -> f32;
}
