pub mod backend;
pub mod camera;
pub mod compute;
pub mod controller;
pub mod driver;
pub mod error;
pub mod initialize;
pub mod input;
pub mod render;
pub mod state;

pub use backend::{ComputeBackend, InputSource, RenderBackend};
pub use driver::ParticleSimulationDriver;
pub use error::{BackendError, ConfigError, GpuError, LookupError};

pub const MAX_PARTICLES: u32 = 1_000_000;

const VECTOR3_STRIDE: usize = std::mem::size_of::<f32>() * 3;
const COLOR_STRIDE: usize = std::mem::size_of::<i32>() * 4;

/// Bytes per particle as seen by the shaders.
pub const PARTICLE_STRIDE: usize = VECTOR3_STRIDE * 2 + COLOR_STRIDE;

const _: () = assert!(PARTICLE_STRIDE == std::mem::size_of::<Particle>());

/// One particle, laid out exactly as `Particle` in `shaders/compute.wgsl`.
///
/// WGSL `vec3<f32>` has 16 byte alignment, so the shaders declare the
/// vectors as `array<f32, 3>` to keep the 40 byte stride.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Particle {
  pub pos: [f32; 3],
  pub velocity: [f32; 3],
  pub color: [f32; 4],
}

pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Physical parameters pushed to the compute kernel every frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimParams {
  /// Number of particles, fixed once the driver has started. 1..=1_000_000.
  pub count: u32,
  /// Charge (nC) of a controller with its trigger fully pressed. -0.5..=0.5.
  pub controller_max_charge: f32,
  /// Damping applied to velocities each frame. 0..=0.02.
  pub damping: f32,
  /// Charge (nC) of each particle. 0..=0.001.
  pub particle_charge: f32,
  /// Mass (kg) of each particle. 0..=10.
  pub particle_mass: f32,
  /// Softening factor limiting force amplitudes. 0..=1.
  pub softening_factor: f32,
}

impl Default for SimParams {
  fn default() -> Self {
    Self {
      count: 50_000,
      controller_max_charge: -0.1,
      damping: 0.005,
      particle_charge: 0.0001,
      particle_mass: 1.0,
      softening_factor: 0.1,
    }
  }
}

impl SimParams {
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.count == 0 || self.count > MAX_PARTICLES {
      return Err(ConfigError::InvalidParticleCount(i64::from(self.count)));
    }
    check_range("controller_max_charge", self.controller_max_charge, -0.5, 0.5)?;
    check_range("damping", self.damping, 0.0, 0.02)?;
    check_range("particle_charge", self.particle_charge, 0.0, 0.001)?;
    check_range("particle_mass", self.particle_mass, 0.0, 10.0)?;
    check_range("softening_factor", self.softening_factor, 0.0, 1.0)?;
    Ok(())
  }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
  // NaN fails the contains check too
  if (min..=max).contains(&value) {
    Ok(())
  } else {
    Err(ConfigError::ParameterOutOfRange {
      name,
      value,
      min,
      max,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn particle_stride_is_forty_bytes() {
    assert_eq!(PARTICLE_STRIDE, 40);
    assert_eq!(std::mem::size_of::<Particle>(), 40);
  }

  #[test]
  fn default_params_are_valid() {
    assert!(SimParams::default().validate().is_ok());
  }

  #[test]
  fn zero_count_is_rejected() {
    let params = SimParams {
      count: 0,
      ..Default::default()
    };
    assert!(matches!(
      params.validate(),
      Err(ConfigError::InvalidParticleCount(0))
    ));
  }

  #[test]
  fn count_above_maximum_is_rejected() {
    let params = SimParams {
      count: MAX_PARTICLES + 1,
      ..Default::default()
    };
    assert!(params.validate().is_err());
    let params = SimParams {
      count: MAX_PARTICLES,
      ..Default::default()
    };
    assert!(params.validate().is_ok());
  }

  #[test]
  fn out_of_range_scalars_are_named() {
    let params = SimParams {
      damping: 0.5,
      ..Default::default()
    };
    match params.validate() {
      Err(ConfigError::ParameterOutOfRange { name, .. }) => assert_eq!(name, "damping"),
      other => panic!("unexpected {other:?}"),
    }

    let params = SimParams {
      softening_factor: f32::NAN,
      ..Default::default()
    };
    assert!(params.validate().is_err());
  }
}
