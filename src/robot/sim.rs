use super::{Pose, RobotConfig, RobotController};
use crate::error::RobotError;
use crate::timers::{Timers, WaitId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Headless movement provider: drives a 2D pose through timed interpolation
/// on the injected [`Timers`], one action at a time.
///
/// Cancellation (`stop`) leaves the pose wherever the interpolation got to;
/// `reset` restores the pose the robot was created with.
pub struct SimRobot {
    config: RobotConfig,
    timers: Arc<dyn Timers>,
    pose: Arc<Mutex<Pose>>,
    start_pose: Pose,
    executing: AtomicBool,
    active_wait: Mutex<Option<WaitId>>,
}

impl SimRobot {
    pub fn new(timers: Arc<dyn Timers>) -> Self {
        Self::with_config(timers, RobotConfig::default())
    }

    pub fn with_config(timers: Arc<dyn Timers>, config: RobotConfig) -> Self {
        Self::with_start_pose(timers, config, Pose::default())
    }

    pub fn with_start_pose(timers: Arc<dyn Timers>, config: RobotConfig, pose: Pose) -> Self {
        Self {
            config,
            timers,
            pose: Arc::new(Mutex::new(pose)),
            start_pose: pose,
            executing: AtomicBool::new(false),
            active_wait: Mutex::new(None),
        }
    }

    pub fn config(&self) -> RobotConfig {
        self.config
    }

    fn begin(&self) -> Result<(), RobotError> {
        if self.executing.swap(true, Ordering::SeqCst) {
            return Err(RobotError::Busy);
        }
        Ok(())
    }

    /// Runs one timed interpolation and clears the busy flag afterwards,
    /// whether it completed or was cancelled.
    async fn animate(
        &self,
        duration: f64,
        apply: impl FnMut(f32) + Send + 'static,
    ) -> Result<(), RobotError> {
        let handle = self.timers.wait(duration.max(0.0), Some(Box::new(apply)));
        *self.active_wait.lock() = Some(handle.id());
        let result = handle.await;
        *self.active_wait.lock() = None;
        self.executing.store(false, Ordering::SeqCst);
        result.map_err(|_| RobotError::Interrupted)
    }

    async fn translate(&self, units: f64) -> Result<(), RobotError> {
        self.begin()?;
        let start = *self.pose.lock();
        let distance = units * self.config.move_distance;
        let target = start.position + start.forward() * distance as f32;
        let duration = distance.abs() / self.config.move_speed;

        let pose = Arc::clone(&self.pose);
        let result = self
            .animate(duration, move |fraction| {
                pose.lock().position = start.position.lerp(target, fraction);
            })
            .await;
        if result.is_ok() {
            self.pose.lock().position = target;
        }
        result
    }

    async fn rotate(&self, sign: f64) -> Result<(), RobotError> {
        self.begin()?;
        let start = *self.pose.lock();
        let target_heading = start.heading + sign * self.config.turn_angle;
        let duration = self.config.turn_angle.abs() / self.config.turn_speed;

        let pose = Arc::clone(&self.pose);
        let result = self
            .animate(duration, move |fraction| {
                pose.lock().heading =
                    start.heading + (target_heading - start.heading) * fraction as f64;
            })
            .await;
        if result.is_ok() {
            self.pose.lock().heading = target_heading;
        }
        result
    }
}

#[async_trait]
impl RobotController for SimRobot {
    fn pose(&self) -> Pose {
        *self.pose.lock()
    }

    fn is_executing(&self) -> bool {
        self.executing.load(Ordering::SeqCst)
    }

    async fn move_forward(&self, units: f64) -> Result<(), RobotError> {
        self.translate(units).await
    }

    async fn move_backward(&self, units: f64) -> Result<(), RobotError> {
        self.translate(-units).await
    }

    async fn turn_left(&self) -> Result<(), RobotError> {
        self.rotate(-1.0).await
    }

    async fn turn_right(&self) -> Result<(), RobotError> {
        self.rotate(1.0).await
    }

    fn reset(&self) {
        *self.pose.lock() = self.start_pose;
        debug!("robot pose reset");
    }

    fn stop(&self) {
        if let Some(id) = self.active_wait.lock().take() {
            self.timers.stop(id);
        }
        self.executing.store(false, Ordering::SeqCst);
    }
}
