use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};
use std::f32::consts::FRAC_PI_2;
use winit::{
  event::{ElementState, KeyEvent, WindowEvent},
  keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Camera orbiting `target` at `distance`, angles in radians.
pub struct Camera {
  pub target: Point3<f32>,
  pub distance: f32,
  pub yaw: f32,
  pub pitch: f32,
  pub aspect: f32,
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
}

impl Camera {
  pub fn looking_at_cloud(aspect: f32) -> Self {
    Self {
      target: Point3::new(0.0, 1.0, 0.0),
      distance: 2.0,
      yaw: 0.0,
      pitch: 0.2,
      aspect,
      fovy: 45.0,
      znear: 0.05,
      zfar: 100.0,
    }
  }

  pub fn eye(&self) -> Point3<f32> {
    let offset = Vector3::new(
      self.distance * self.pitch.cos() * self.yaw.sin(),
      self.distance * self.pitch.sin(),
      self.distance * self.pitch.cos() * self.yaw.cos(),
    );
    self.target + offset
  }

  pub fn build_view_projection_matrix(&self) -> Matrix4<f32> {
    let view = Matrix4::look_at_rh(self.eye(), self.target, Vector3::unit_y());
    let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);
    OPENGL_TO_WGPU_MATRIX * proj * view
  }

  /// World-space point `depth` units from the eye along the ray through
  /// normalized device coordinates `ndc`. None when looking straight up or
  /// down.
  pub fn point_along_ray(&self, ndc: [f32; 2], depth: f32) -> Option<Point3<f32>> {
    let eye = self.eye();
    let forward = (self.target - eye).normalize();
    let right = forward.cross(Vector3::unit_y());
    if right.magnitude2() < f32::EPSILON {
      return None;
    }
    let right = right.normalize();
    let up = right.cross(forward);

    let half_height = (self.fovy.to_radians() / 2.0).tan();
    let half_width = half_height * self.aspect;
    let direction = (forward + right * (ndc[0] * half_width) + up * (ndc[1] * half_height)).normalize();
    Some(eye + direction * depth)
  }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
  view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
  fn default() -> Self {
    Self {
      view_proj: Matrix4::identity().into(),
    }
  }
}

impl CameraUniform {
  pub fn from_camera(camera: &Camera) -> Self {
    Self {
      view_proj: camera.build_view_projection_matrix().into(),
    }
  }
}

/// WASD orbits and zooms, QE tilts.
pub struct CameraController {
  speed: f32,
  rotation_speed: f32,
  is_forward_pressed: bool,
  is_backward_pressed: bool,
  is_left_pressed: bool,
  is_right_pressed: bool,
  is_rotate_up_pressed: bool,
  is_rotate_down_pressed: bool,
}

impl CameraController {
  pub fn init(speed: f32, rotation_speed: f32) -> Self {
    Self {
      speed,
      rotation_speed,
      is_forward_pressed: false,
      is_backward_pressed: false,
      is_left_pressed: false,
      is_right_pressed: false,
      is_rotate_up_pressed: false,
      is_rotate_down_pressed: false,
    }
  }

  pub fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state,
            physical_key: PhysicalKey::Code(keycode),
            ..
          },
        ..
      } => {
        let is_pressed = *state == ElementState::Pressed;
        match keycode {
          KeyCode::KeyW | KeyCode::ArrowUp => {
            self.is_forward_pressed = is_pressed;
            true
          }
          KeyCode::KeyA | KeyCode::ArrowLeft => {
            self.is_left_pressed = is_pressed;
            true
          }
          KeyCode::KeyS | KeyCode::ArrowDown => {
            self.is_backward_pressed = is_pressed;
            true
          }
          KeyCode::KeyD | KeyCode::ArrowRight => {
            self.is_right_pressed = is_pressed;
            true
          }
          KeyCode::KeyQ => {
            self.is_rotate_up_pressed = is_pressed;
            true
          }
          KeyCode::KeyE => {
            self.is_rotate_down_pressed = is_pressed;
            true
          }
          _ => false,
        }
      }
      _ => false,
    }
  }

  pub fn update_camera(&self, camera: &mut Camera) {
    if self.is_forward_pressed && camera.distance > self.speed + camera.znear {
      camera.distance -= self.speed;
    }
    if self.is_backward_pressed {
      camera.distance += self.speed;
    }
    if self.is_right_pressed {
      camera.yaw += self.rotation_speed;
    }
    if self.is_left_pressed {
      camera.yaw -= self.rotation_speed;
    }

    // stop short of the poles so look_at keeps a valid up vector
    let limit = FRAC_PI_2 - 0.01;
    if self.is_rotate_up_pressed {
      camera.pitch = (camera.pitch + self.rotation_speed).min(limit);
    }
    if self.is_rotate_down_pressed {
      camera.pitch = (camera.pitch - self.rotation_speed).max(-limit);
    }
  }
}
