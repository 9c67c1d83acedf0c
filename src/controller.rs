use crate::backend::InputSource;
use log::{debug, info};
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControllerSide {
  Left,
  Right,
}

impl ControllerSide {
  /// Name of the vec4 uniform the compute kernel reads for this side.
  pub fn parameter_name(self) -> &'static str {
    match self {
      ControllerSide::Left => "LeftController",
      ControllerSide::Right => "RightController",
    }
  }
}

impl fmt::Display for ControllerSide {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ControllerSide::Left => write!(f, "left"),
      ControllerSide::Right => write!(f, "right"),
    }
  }
}

/// Position and charge of one controller for the current frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControllerState {
  pub position: [f32; 3],
  pub charge: f32,
}

impl ControllerState {
  /// xyz is the position, w the charge.
  pub fn to_vec4(self) -> [f32; 4] {
    [self.position[0], self.position[1], self.position[2], self.charge]
  }
}

/// Linear interpolation from 0 to `max_charge` by the trigger axis.
/// The axis is clamped to [0, 1]; a non-finite axis counts as released.
pub fn charge_from_trigger(max_charge: f32, axis: f32) -> f32 {
  let t = if axis.is_finite() { axis.clamp(0.0, 1.0) } else { 0.0 };
  max_charge * t
}

/// One tracked controller. Starts unresolved and stays resolved once the
/// input source hands out a device.
pub struct Controller<D> {
  side: ControllerSide,
  index: u32,
  device: Option<D>,
  attempts: u64,
}

impl<D: Copy> Controller<D> {
  pub fn new(side: ControllerSide, index: u32) -> Self {
    Self {
      side,
      index,
      device: None,
      attempts: 0,
    }
  }

  pub fn side(&self) -> ControllerSide {
    self.side
  }

  pub fn is_resolved(&self) -> bool {
    self.device.is_some()
  }

  /// Failed lookups so far.
  pub fn attempts(&self) -> u64 {
    self.attempts
  }

  /// Reads this frame's state. An unresolved controller instead tries to
  /// resolve its device and reports nothing this frame, whatever the outcome.
  pub fn poll<I>(&mut self, input: &mut I, max_charge: f32) -> Option<ControllerState>
  where
    I: InputSource<Device = D>,
  {
    match self.device {
      Some(device) => Some(ControllerState {
        position: input.position(device),
        charge: charge_from_trigger(max_charge, input.trigger_axis(device)),
      }),
      None => {
        match input.resolve_device(self.index) {
          Ok(device) => {
            info!(
              "Acquired {} controller (device {}) after {} failed attempts",
              self.side, self.index, self.attempts
            );
            self.device = Some(device);
          }
          Err(e) => {
            self.attempts += 1;
            debug!("Failed getting {} controller: {}", self.side, e);
          }
        }
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::LookupError;

  struct Flaky {
    failures_left: u32,
    axis: f32,
  }

  impl InputSource for Flaky {
    type Device = u32;

    fn resolve_device(&mut self, index: u32) -> Result<u32, LookupError> {
      if self.failures_left > 0 {
        self.failures_left -= 1;
        return Err(LookupError::DeviceUnavailable {
          index,
          reason: "warming up".into(),
        });
      }
      Ok(index)
    }

    fn position(&self, device: u32) -> [f32; 3] {
      [device as f32, 1.0, 2.0]
    }

    fn trigger_axis(&self, _device: u32) -> f32 {
      self.axis
    }
  }

  #[test]
  fn charge_endpoints() {
    assert_eq!(charge_from_trigger(-0.1, 0.0), 0.0);
    assert_eq!(charge_from_trigger(-0.1, 1.0), -0.1);
    assert_eq!(charge_from_trigger(0.3, 1.0), 0.3);
  }

  #[test]
  fn half_trigger_halves_the_charge() {
    assert!((charge_from_trigger(-0.1, 0.5) - -0.05).abs() < 1e-7);
  }

  #[test]
  fn charge_is_monotonic_in_axis() {
    let mut last = charge_from_trigger(0.4, 0.0);
    for i in 1..=100 {
      let charge = charge_from_trigger(0.4, i as f32 / 100.0);
      assert!(charge >= last);
      last = charge;
    }
  }

  #[test]
  fn axis_outside_unit_range_is_clamped() {
    assert_eq!(charge_from_trigger(-0.2, 3.0), -0.2);
    assert_eq!(charge_from_trigger(-0.2, -1.0), 0.0);
    assert_eq!(charge_from_trigger(-0.2, f32::NAN), 0.0);
  }

  #[test]
  fn unresolved_controller_retries_every_poll() {
    let mut input = Flaky {
      failures_left: 3,
      axis: 1.0,
    };
    let mut controller = Controller::new(ControllerSide::Left, 5);
    for _ in 0..3 {
      assert_eq!(controller.poll(&mut input, -0.1), None);
      assert!(!controller.is_resolved());
    }
    assert_eq!(controller.attempts(), 3);

    // resolves, but reports nothing on the resolving frame
    assert_eq!(controller.poll(&mut input, -0.1), None);
    assert!(controller.is_resolved());

    let state = controller.poll(&mut input, -0.1).unwrap();
    assert_eq!(state.position, [5.0, 1.0, 2.0]);
    assert_eq!(state.to_vec4(), [5.0, 1.0, 2.0, -0.1]);
  }

  #[test]
  fn parameter_names_match_the_kernel() {
    assert_eq!(ControllerSide::Left.parameter_name(), "LeftController");
    assert_eq!(ControllerSide::Right.parameter_name(), "RightController");
  }
}
