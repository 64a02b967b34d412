//! The movement provider contract and a headless simulated robot.

mod sim;

pub use sim::SimRobot;

use crate::error::RobotError;
use crate::geometry::Vec2;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Movement tuning for a robot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// World units covered by one `move_forward(1.0)`.
    pub move_distance: f64,
    /// World units per second while moving.
    pub move_speed: f64,
    /// Degrees rotated by one turn command.
    pub turn_angle: f64,
    /// Degrees per second while turning.
    pub turn_speed: f64,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            move_distance: 1.0,
            move_speed: 2.0,
            turn_angle: 90.0,
            turn_speed: 180.0,
        }
    }
}

/// A robot pose on the ground plane. Heading is in degrees, `0.0` facing
/// `+y`; turning right increases it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    pub heading: f64,
}

impl Pose {
    /// Unit vector in the facing direction.
    pub fn forward(&self) -> Vec2 {
        let radians = self.heading.to_radians();
        Vec2::new(radians.sin() as f32, radians.cos() as f32)
    }
}

/// The movement collaborator the execution engine drives.
///
/// Every movement method rejects with [`RobotError::Busy`] while an action
/// is in flight. `stop` aborts the in-flight action immediately without
/// rolling the pose back; `reset` is the explicit restore of the recorded
/// starting pose.
#[async_trait]
pub trait RobotController: Send + Sync {
    fn pose(&self) -> Pose;

    fn is_executing(&self) -> bool;

    async fn move_forward(&self, units: f64) -> Result<(), RobotError>;

    async fn move_backward(&self, units: f64) -> Result<(), RobotError>;

    async fn turn_left(&self) -> Result<(), RobotError>;

    async fn turn_right(&self) -> Result<(), RobotError>;

    fn reset(&self);

    fn stop(&self);
}
