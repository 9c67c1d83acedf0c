use crate::{Particle, WHITE};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rand_distr::{Distribution, UnitBall};

pub const DEFAULT_SEED: u64 = 42;
pub const CLOUD_CENTER: [f32; 3] = [0.0, 1.0, 0.0];
pub const CLOUD_RADIUS: f32 = 0.5;

#[must_use]
pub fn seeded_rng(seed: u64) -> SmallRng {
  SmallRng::seed_from_u64(seed)
}

/// White, motionless particles spread uniformly through a ball of radius
/// 0.5 hovering 1m off the ground.
#[must_use]
pub fn create_cloud<R: Rng + ?Sized>(rng: &mut R, count: u32) -> Vec<Particle> {
  let mut particles = Vec::with_capacity(count as usize);
  for _ in 0..count {
    let [x, y, z]: [f32; 3] = UnitBall.sample(rng);
    particles.push(Particle {
      pos: [
        x * CLOUD_RADIUS + CLOUD_CENTER[0],
        y * CLOUD_RADIUS + CLOUD_CENTER[1],
        z * CLOUD_RADIUS + CLOUD_CENTER[2],
      ],
      velocity: [0.0; 3],
      color: WHITE,
    });
  }
  particles
}

#[cfg(test)]
mod tests {
  use super::*;

  fn distance_from_center(p: &Particle) -> f32 {
    p.pos
      .iter()
      .zip(CLOUD_CENTER.iter())
      .map(|(a, b)| (a - b) * (a - b))
      .sum::<f32>()
      .sqrt()
  }

  #[test]
  fn four_particles_are_finite_and_white() {
    let particles = create_cloud(&mut seeded_rng(7), 4);
    assert_eq!(particles.len(), 4);
    for p in &particles {
      assert!(p.pos.iter().chain(p.velocity.iter()).all(|v| v.is_finite()));
      assert_eq!(p.color, WHITE);
    }
  }

  #[test]
  fn particles_stay_inside_the_ball_at_rest() {
    let particles = create_cloud(&mut seeded_rng(DEFAULT_SEED), 2_000);
    for p in &particles {
      assert!(distance_from_center(p) <= CLOUD_RADIUS + 1e-5);
      assert_eq!(p.velocity, [0.0; 3]);
    }
  }

  #[test]
  fn same_seed_gives_same_cloud() {
    let a = create_cloud(&mut seeded_rng(3), 64);
    let b = create_cloud(&mut seeded_rng(3), 64);
    assert_eq!(a, b);
  }

  #[test]
  fn cloud_fills_the_ball() {
    // A uniform ball puts 1/8 of its volume inside half the radius.
    let particles = create_cloud(&mut seeded_rng(DEFAULT_SEED), 8_000);
    let inner = particles
      .iter()
      .filter(|p| distance_from_center(p) < CLOUD_RADIUS * 0.5)
      .count();
    assert!((700..1_300).contains(&inner), "inner = {inner}");
  }
}
