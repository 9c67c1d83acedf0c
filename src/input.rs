//! Controller sources that stand in for tracked VR controllers.
//!
//! [`DesktopControllers`] turns the mouse into two controllers for windowed
//! runs. [`OrbitingControllers`] scripts them for headless runs.

use crate::backend::InputSource;
use crate::camera::Camera;
use crate::error::LookupError;
use std::f32::consts::PI;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Device index served by each side.
pub const LEFT_DEVICE: u32 = 1;
pub const RIGHT_DEVICE: u32 = 2;

fn unavailable(index: u32, reason: &str) -> LookupError {
  LookupError::DeviceUnavailable {
    index,
    reason: reason.to_owned(),
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DesktopDevice {
  Left,
  Right,
}

/// The left controller follows the cursor, the right one its mirror image
/// across the vertical center line. Mouse buttons are the triggers and the
/// wheel pushes both controllers further from the camera.
///
/// Devices only resolve once the cursor has entered the window.
pub struct DesktopControllers {
  cursor_seen: bool,
  window_size: [f32; 2],
  cursor: [f32; 2],
  depth: f32,
  left_pressed: bool,
  right_pressed: bool,
  left_position: [f32; 3],
  right_position: [f32; 3],
}

impl DesktopControllers {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      cursor_seen: false,
      window_size: [width.max(1) as f32, height.max(1) as f32],
      cursor: [0.0; 2],
      depth: 1.5,
      left_pressed: false,
      right_pressed: false,
      left_position: [0.0; 3],
      right_position: [0.0; 3],
    }
  }

  /// Cursor in normalized device coordinates, y up.
  pub fn cursor_ndc(&self) -> [f32; 2] {
    [
      self.cursor[0] / self.window_size[0] * 2.0 - 1.0,
      1.0 - self.cursor[1] / self.window_size[1] * 2.0,
    ]
  }

  pub fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::CursorEntered { .. } => {
        self.cursor_seen = true;
        false
      }
      WindowEvent::CursorMoved { position, .. } => {
        self.cursor_seen = true;
        self.cursor = [position.x as f32, position.y as f32];
        true
      }
      WindowEvent::Resized(size) => {
        self.window_size = [size.width.max(1) as f32, size.height.max(1) as f32];
        false
      }
      WindowEvent::MouseInput { state, button, .. } => {
        let pressed = *state == ElementState::Pressed;
        match button {
          MouseButton::Left => self.left_pressed = pressed,
          MouseButton::Right => self.right_pressed = pressed,
          _ => return false,
        }
        true
      }
      WindowEvent::MouseWheel { delta, .. } => {
        let lines = match delta {
          MouseScrollDelta::LineDelta(_, y) => *y,
          MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
        };
        self.depth = (self.depth - lines * 0.1).clamp(0.2, 10.0);
        true
      }
      _ => false,
    }
  }

  /// Re-projects both controllers through the current camera.
  pub fn update(&mut self, camera: &Camera) {
    let [x, y] = self.cursor_ndc();
    if let Some(p) = camera.point_along_ray([x, y], self.depth) {
      self.left_position = p.into();
    }
    if let Some(p) = camera.point_along_ray([-x, y], self.depth) {
      self.right_position = p.into();
    }
  }
}

impl InputSource for DesktopControllers {
  type Device = DesktopDevice;

  fn resolve_device(&mut self, index: u32) -> Result<DesktopDevice, LookupError> {
    let device = match index {
      LEFT_DEVICE => DesktopDevice::Left,
      RIGHT_DEVICE => DesktopDevice::Right,
      _ => return Err(unavailable(index, "no such device")),
    };
    if !self.cursor_seen {
      return Err(unavailable(index, "cursor has not entered the window yet"));
    }
    Ok(device)
  }

  fn position(&self, device: DesktopDevice) -> [f32; 3] {
    match device {
      DesktopDevice::Left => self.left_position,
      DesktopDevice::Right => self.right_position,
    }
  }

  fn trigger_axis(&self, device: DesktopDevice) -> f32 {
    let pressed = match device {
      DesktopDevice::Left => self.left_pressed,
      DesktopDevice::Right => self.right_pressed,
    };
    if pressed {
      1.0
    } else {
      0.0
    }
  }
}

/// Two controllers circling the particle cloud on opposite sides, their
/// triggers pulsing out of phase. The first `warmup` lookups fail.
pub struct OrbitingControllers {
  warmup: u32,
  time: f32,
  center: [f32; 3],
  radius: f32,
  angular_speed: f32,
}

impl OrbitingControllers {
  pub fn new(warmup: u32) -> Self {
    Self {
      warmup,
      time: 0.0,
      center: crate::initialize::CLOUD_CENTER,
      radius: 0.8,
      angular_speed: 0.5,
    }
  }

  pub fn advance(&mut self, dt: f32) {
    self.time += dt;
  }

  fn phase(device: u32) -> f32 {
    if device == LEFT_DEVICE {
      0.0
    } else {
      PI
    }
  }
}

impl InputSource for OrbitingControllers {
  type Device = u32;

  fn resolve_device(&mut self, index: u32) -> Result<u32, LookupError> {
    if index != LEFT_DEVICE && index != RIGHT_DEVICE {
      return Err(unavailable(index, "no such device"));
    }
    if self.warmup > 0 {
      self.warmup -= 1;
      return Err(unavailable(index, "tracking not ready"));
    }
    Ok(index)
  }

  fn position(&self, device: u32) -> [f32; 3] {
    let angle = self.time * self.angular_speed + Self::phase(device);
    [
      self.center[0] + self.radius * angle.cos(),
      self.center[1],
      self.center[2] + self.radius * angle.sin(),
    ]
  }

  fn trigger_axis(&self, device: u32) -> f32 {
    0.5 + 0.5 * (self.time + Self::phase(device)).sin()
  }
}
