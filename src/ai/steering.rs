//! Planar steering for path legs
//!
//! The sandbox navigation service moves agents on the XZ plane with these
//! behaviors. A behavior turns the agent's current motion into a desired
//! acceleration, bounded by the agent's [`MovementProfile`].

use glam::Vec3;

use crate::navigation::MovementProfile;

/// Seconds over which `Arrive` tries to reach its desired velocity
const TIME_TO_TARGET: f32 = 0.1;

/// Where an agent is and how it is moving, flattened onto the ground plane
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Motion {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl Motion {
    /// Flatten a world-space position and velocity
    #[must_use]
    pub fn planar(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position: position.with_y(0.0),
            velocity: velocity.with_y(0.0),
        }
    }
}

/// Acceleration requested by a behavior
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringOutput {
    pub linear: Vec3,
}

impl SteeringOutput {
    pub const ZERO: Self = Self { linear: Vec3::ZERO };

    /// Apply the acceleration for `dt` and cap the result at `max_speed`
    #[must_use]
    pub fn integrate(self, velocity: Vec3, dt: f32, max_speed: f32) -> Vec3 {
        (velocity + self.linear * dt).clamp_length_max(max_speed.max(0.0))
    }
}

/// A way of moving toward a leg's end point
pub trait SteeringBehavior {
    fn steer(&self, motion: Motion) -> SteeringOutput;
}

/// Full acceleration toward an intermediate corner of the path.
///
/// Velocity across the line to the goal is bled off so the agent does not
/// swing wide around corners.
#[derive(Debug, Clone, Copy)]
pub struct Seek {
    goal: Vec3,
    max_acceleration: f32,
}

impl Seek {
    #[must_use]
    pub fn toward(goal: Vec3, profile: &MovementProfile) -> Self {
        Self {
            goal: goal.with_y(0.0),
            max_acceleration: profile.acceleration,
        }
    }
}

impl SteeringBehavior for Seek {
    fn steer(&self, motion: Motion) -> SteeringOutput {
        let heading = (self.goal - motion.position).normalize_or_zero();
        if heading == Vec3::ZERO {
            return SteeringOutput::ZERO;
        }
        let drift = motion.velocity - heading * motion.velocity.dot(heading);
        SteeringOutput {
            linear: (heading * self.max_acceleration - drift).clamp_length_max(self.max_acceleration),
        }
    }
}

/// Decelerating approach to the last point of a path
#[derive(Debug, Clone, Copy)]
pub struct Arrive {
    goal: Vec3,
    max_acceleration: f32,
    max_speed: f32,
    /// Inside this distance the desired speed falls off linearly
    slow_radius: f32,
    /// Inside this distance the agent only brakes
    settle_radius: f32,
}

impl Arrive {
    /// Approach `goal` with the profile's limits.
    ///
    /// The profile's stopping distance widens the slow-down zone; it never
    /// shrinks below one unit.
    #[must_use]
    pub fn toward(goal: Vec3, profile: &MovementProfile) -> Self {
        Self {
            goal: goal.with_y(0.0),
            max_acceleration: profile.acceleration,
            max_speed: profile.speed,
            slow_radius: profile.stopping_distance.max(1.0),
            settle_radius: 0.05,
        }
    }
}

impl SteeringBehavior for Arrive {
    fn steer(&self, motion: Motion) -> SteeringOutput {
        let offset = self.goal - motion.position;
        let distance = offset.length();

        let desired = if distance <= self.settle_radius {
            Vec3::ZERO
        } else {
            let speed = self.max_speed * (distance / self.slow_radius).min(1.0);
            offset / distance * speed
        };

        SteeringOutput {
            linear: ((desired - motion.velocity) / TIME_TO_TARGET)
                .clamp_length_max(self.max_acceleration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> MovementProfile {
        MovementProfile {
            speed: 4.0,
            acceleration: 6.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_motion_is_flattened() {
        let motion = Motion::planar(Vec3::new(1.0, 4.0, 2.0), Vec3::new(0.0, -3.0, 1.0));

        assert_eq!(motion.position, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(motion.velocity, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_seek_uses_full_acceleration() {
        let seek = Seek::toward(Vec3::new(0.0, 7.0, -10.0), &profile());
        let output = seek.steer(Motion::default());

        assert!(output.linear.z < 0.0);
        assert_eq!(output.linear.y, 0.0);
        assert!((output.linear.length() - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_seek_bleeds_off_drift() {
        let seek = Seek::toward(Vec3::new(10.0, 0.0, 0.0), &profile());
        let output = seek.steer(Motion::planar(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0)));

        assert!(output.linear.z < 0.0);
        assert!(output.linear.length() <= 6.0 + 1e-4);
    }

    #[test]
    fn test_seek_at_goal_is_idle() {
        let seek = Seek::toward(Vec3::ZERO, &profile());
        assert_eq!(seek.steer(Motion::default()), SteeringOutput::ZERO);
    }

    #[test]
    fn test_arrive_slows_near_goal() {
        let arrive = Arrive::toward(Vec3::new(0.5, 0.0, 0.0), &profile());
        // Already moving at top speed half a unit out: must brake
        let output = arrive.steer(Motion::planar(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)));

        assert!(output.linear.x < 0.0);
    }

    #[test]
    fn test_arrive_brakes_when_settled() {
        let arrive = Arrive::toward(Vec3::ZERO, &profile());
        let output = arrive.steer(Motion::planar(Vec3::new(0.01, 0.0, 0.0), Vec3::X));

        assert!(output.linear.x < 0.0);
    }

    #[test]
    fn test_integrate_caps_speed() {
        let output = SteeringOutput {
            linear: Vec3::X * 100.0,
        };
        let velocity = output.integrate(Vec3::ZERO, 1.0, 3.0);

        assert!((velocity.length() - 3.0).abs() < 1e-4);
    }
}
