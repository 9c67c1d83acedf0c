//! Error types for the simulation driver and its backends.

use std::fmt;

/// Fatal configuration errors raised while setting up the simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
  /// Particle count outside 1..=1_000_000.
  InvalidParticleCount(i64),
  /// A scalar parameter outside its documented range.
  ParameterOutOfRange {
    name: &'static str,
    value: f32,
    min: f32,
    max: f32,
  },
  /// The compute entry point could not be found.
  KernelNotFound(String),
  /// `start` was called on a driver that already started.
  AlreadyStarted,
  /// The particle count cannot change once the buffer exists.
  CountLocked { current: u32, requested: u32 },
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::InvalidParticleCount(n) => write!(
        f,
        "Invalid particle count {}: expected 1..={}",
        n,
        crate::MAX_PARTICLES
      ),
      ConfigError::ParameterOutOfRange {
        name,
        value,
        min,
        max,
      } => write!(f, "{} = {} is outside [{}, {}]", name, value, min, max),
      ConfigError::KernelNotFound(name) => write!(f, "Compute kernel '{}' not found", name),
      ConfigError::AlreadyStarted => write!(f, "Simulation already started; re-seeding is not supported"),
      ConfigError::CountLocked { current, requested } => write!(
        f,
        "Particle count is fixed at {} after start (requested {})",
        current, requested
      ),
    }
  }
}

impl std::error::Error for ConfigError {}

/// Errors reported by a backend at the trait seam.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
  KernelNotFound(String),
}

impl fmt::Display for BackendError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BackendError::KernelNotFound(name) => write!(f, "No compute entry point named '{}'", name),
    }
  }
}

impl std::error::Error for BackendError {}

impl From<BackendError> for ConfigError {
  fn from(e: BackendError) -> Self {
    match e {
      BackendError::KernelNotFound(name) => ConfigError::KernelNotFound(name),
    }
  }
}

/// A tracked device could not be looked up. Transient; retried next frame.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupError {
  DeviceUnavailable { index: u32, reason: String },
}

impl fmt::Display for LookupError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LookupError::DeviceUnavailable { index, reason } => {
        write!(f, "Device {} unavailable: {}", index, reason)
      }
    }
  }
}

impl std::error::Error for LookupError {}

/// Errors that can occur while bringing up wgpu.
#[derive(Debug)]
pub enum GpuError {
  SurfaceCreation(wgpu::CreateSurfaceError),
  NoAdapter,
  DeviceCreation(wgpu::RequestDeviceError),
  NoSurfaceConfig,
}

impl fmt::Display for GpuError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
      GpuError::NoAdapter => write!(f, "No compatible GPU adapter found"),
      GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
      GpuError::NoSurfaceConfig => write!(f, "Surface is not supported by the adapter"),
    }
  }
}

impl std::error::Error for GpuError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      GpuError::SurfaceCreation(e) => Some(e),
      GpuError::DeviceCreation(e) => Some(e),
      _ => None,
    }
  }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
  fn from(e: wgpu::CreateSurfaceError) -> Self {
    GpuError::SurfaceCreation(e)
  }
}

impl From<wgpu::RequestDeviceError> for GpuError {
  fn from(e: wgpu::RequestDeviceError) -> Self {
    GpuError::DeviceCreation(e)
  }
}

/// Top-level error for `state::run`.
#[derive(Debug)]
pub enum RunError {
  Config(ConfigError),
  Gpu(GpuError),
  EventLoop(winit::error::EventLoopError),
  Window(winit::error::OsError),
}

impl fmt::Display for RunError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunError::Config(e) => write!(f, "Configuration error: {}", e),
      RunError::Gpu(e) => write!(f, "GPU error: {}", e),
      RunError::EventLoop(e) => write!(f, "Event loop error: {}", e),
      RunError::Window(e) => write!(f, "Failed to create window: {}", e),
    }
  }
}

impl std::error::Error for RunError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RunError::Config(e) => Some(e),
      RunError::Gpu(e) => Some(e),
      RunError::EventLoop(e) => Some(e),
      RunError::Window(e) => Some(e),
    }
  }
}

impl From<ConfigError> for RunError {
  fn from(e: ConfigError) -> Self {
    RunError::Config(e)
  }
}

impl From<GpuError> for RunError {
  fn from(e: GpuError) -> Self {
    RunError::Gpu(e)
  }
}

impl From<winit::error::EventLoopError> for RunError {
  fn from(e: winit::error::EventLoopError) -> Self {
    RunError::EventLoop(e)
  }
}

impl From<winit::error::OsError> for RunError {
  fn from(e: winit::error::OsError) -> Self {
    RunError::Window(e)
  }
}
