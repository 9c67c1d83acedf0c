//! The per-frame simulation loop: push parameters and controller state to
//! the compute kernel, dispatch it, draw the result.

use crate::backend::{ComputeBackend, InputSource, RenderBackend};
use crate::controller::{Controller, ControllerSide};
use crate::error::ConfigError;
use crate::initialize::{create_cloud, seeded_rng, DEFAULT_SEED};
use crate::{Particle, SimParams, PARTICLE_STRIDE};
use log::{info, warn};
use rand::Rng;

pub const KERNEL_NAME: &str = "ParticleFunction";
pub const COMPUTE_BUFFER_NAME: &str = "outputBuffer";
pub const RENDER_BUFFER_NAME: &str = "inputBuffer";

/// Thread groups per dispatch. Not derived from the particle count.
pub const DISPATCH_GROUPS: [u32; 3] = [10, 10, 10];
/// Must match `@workgroup_size` in `shaders/compute.wgsl`.
pub const THREADS_PER_GROUP: u32 = 8 * 8 * 4;

/// Particles the fixed dispatch grid can reach. Anything past this index
/// never gets simulated.
pub const fn dispatch_capacity() -> u32 {
  DISPATCH_GROUPS[0] * DISPATCH_GROUPS[1] * DISPATCH_GROUPS[2] * THREADS_PER_GROUP
}

/// Tracked device indices of the two controllers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeviceIndices {
  pub left: u32,
  pub right: u32,
}

impl Default for DeviceIndices {
  fn default() -> Self {
    Self {
      left: crate::input::LEFT_DEVICE,
      right: crate::input::RIGHT_DEVICE,
    }
  }
}

enum Stage<K, B> {
  Created,
  Running { kernel: K, buffer: B },
  Released,
}

pub struct ParticleSimulationDriver<C, R, I>
where
  C: ComputeBackend,
  R: RenderBackend<Buffer = C::Buffer>,
  I: InputSource,
{
  params: SimParams,
  compute: C,
  render: R,
  input: I,
  left: Controller<I::Device>,
  right: Controller<I::Device>,
  particles: Vec<Particle>,
  stage: Stage<C::Kernel, C::Buffer>,
}

impl<C, R, I> ParticleSimulationDriver<C, R, I>
where
  C: ComputeBackend,
  R: RenderBackend<Buffer = C::Buffer>,
  I: InputSource,
{
  pub fn new(
    params: SimParams,
    devices: DeviceIndices,
    compute: C,
    render: R,
    input: I,
  ) -> Result<Self, ConfigError> {
    params.validate()?;
    Ok(Self {
      params,
      compute,
      render,
      input,
      left: Controller::new(ControllerSide::Left, devices.left),
      right: Controller::new(ControllerSide::Right, devices.right),
      particles: Vec::new(),
      stage: Stage::Created,
    })
  }

  /// Allocates and seeds the particle buffer using the default seed.
  pub fn start(&mut self) -> Result<(), ConfigError> {
    self.start_with_rng(&mut seeded_rng(DEFAULT_SEED))
  }

  pub fn start_with_rng<G: Rng + ?Sized>(&mut self, rng: &mut G) -> Result<(), ConfigError> {
    if !matches!(self.stage, Stage::Created) {
      return Err(ConfigError::AlreadyStarted);
    }
    let count = self.params.count;
    if count > dispatch_capacity() {
      warn!(
        "{} particles requested but the {:?} dispatch grid only reaches {}; the rest stay frozen",
        count,
        DISPATCH_GROUPS,
        dispatch_capacity()
      );
    }

    // Resolve the kernel first so a missing entry point leaks nothing.
    let kernel = self.compute.find_kernel(KERNEL_NAME)?;
    let buffer = self.compute.create_buffer(count, PARTICLE_STRIDE);

    self.particles = create_cloud(rng, count);
    self
      .compute
      .upload(&buffer, bytemuck::cast_slice(&self.particles));
    self.compute.bind_buffer(&kernel, COMPUTE_BUFFER_NAME, &buffer);
    self.render.bind_buffer(RENDER_BUFFER_NAME, &buffer);

    info!("Seeded {} particles ({} bytes each)", count, PARTICLE_STRIDE);
    self.stage = Stage::Running { kernel, buffer };
    Ok(())
  }

  /// One frame. Ticking a driver that is not running does nothing.
  pub fn tick(&mut self) {
    if !self.is_running() {
      warn!("tick ignored: simulation is not running");
      return;
    }

    self.push_parameters();
    let max_charge = self.params.controller_max_charge;
    for controller in [&mut self.left, &mut self.right] {
      if let Some(state) = controller.poll(&mut self.input, max_charge) {
        self
          .compute
          .set_vector4(controller.side().parameter_name(), state.to_vec4());
      }
    }

    if let Stage::Running { kernel, buffer } = &self.stage {
      let [x, y, z] = DISPATCH_GROUPS;
      self.compute.dispatch(kernel, x, y, z);
      self.render.set_render_state();
      self.render.draw_points(buffer, self.params.count);
    }
  }

  fn push_parameters(&mut self) {
    self.compute.set_scalar("Damping", self.params.damping);
    self.compute.set_scalar("ParticleCharge", self.params.particle_charge);
    self.compute.set_scalar("ParticleMass", self.params.particle_mass);
    self
      .compute
      .set_scalar("SofteningFactor", self.params.softening_factor);
  }

  /// Releases the particle buffer. Only the first call after `start` does
  /// anything.
  pub fn teardown(&mut self) {
    match std::mem::replace(&mut self.stage, Stage::Released) {
      Stage::Running { buffer, .. } => {
        self.compute.release_buffer(buffer);
        self.particles = Vec::new();
        info!("Released particle buffer");
      }
      Stage::Created => {
        warn!("teardown before start; nothing to release");
        self.stage = Stage::Created;
      }
      Stage::Released => warn!("particle buffer already released"),
    }
  }

  pub fn is_running(&self) -> bool {
    matches!(self.stage, Stage::Running { .. })
  }

  pub fn params(&self) -> &SimParams {
    &self.params
  }

  /// Replaces the physical parameters. They take effect on the next tick.
  /// The particle count cannot change once the simulation has started.
  pub fn set_params(&mut self, params: SimParams) -> Result<(), ConfigError> {
    params.validate()?;
    if !matches!(self.stage, Stage::Created) && params.count != self.params.count {
      return Err(ConfigError::CountLocked {
        current: self.params.count,
        requested: params.count,
      });
    }
    self.params = params;
    Ok(())
  }

  /// The particles as seeded. The GPU copy diverges from the first tick on.
  pub fn seeded_particles(&self) -> &[Particle] {
    &self.particles
  }

  pub fn controller_resolved(&self, side: ControllerSide) -> bool {
    match side {
      ControllerSide::Left => self.left.is_resolved(),
      ControllerSide::Right => self.right.is_resolved(),
    }
  }

  pub fn compute(&self) -> &C {
    &self.compute
  }

  pub fn render(&self) -> &R {
    &self.render
  }

  pub fn render_mut(&mut self) -> &mut R {
    &mut self.render
  }

  pub fn input(&self) -> &I {
    &self.input
  }

  pub fn input_mut(&mut self) -> &mut I {
    &mut self.input
  }
}
