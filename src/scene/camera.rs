use std::time::Duration;

use super::Vec3;
use crate::config::SceneConfig;

/// Orbit camera around the graph.
///
/// Pan, zoom and rotate respond to user input at all times. The idle
/// auto-rotation only advances while the scene is not live - the moment the
/// stream delivers active state, rotation is suspended so the camera never
/// fights the user over moving content.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Point the camera looks at.
    pub target: Vec3,
    /// Horizontal orbit angle, radians.
    pub yaw: f32,
    /// Vertical orbit angle, radians, clamped short of the poles.
    pub pitch: f32,
    /// Distance from target.
    pub distance: f32,
    auto_rotate_speed: f32,
}

const MIN_DISTANCE: f32 = 2.0;
const MAX_DISTANCE: f32 = 200.0;
const MAX_PITCH: f32 = 1.55; // just short of +-pi/2 to keep the up vector sane

impl OrbitCamera {
    /// Default viewpoint: slightly elevated, looking at the origin.
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.45,
            distance: 30.0,
            auto_rotate_speed: config.auto_rotate_speed,
        }
    }

    /// Rotate by the given angular deltas (user drag).
    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw = (self.yaw + d_yaw).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + d_pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Move the look-at target in the camera's screen plane (user drag).
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = self.target.sub(self.eye()).normalized();
        let up = Vec3::new(0.0, 1.0, 0.0);
        let right = forward.cross(up).normalized();
        let screen_up = right.cross(forward).normalized();
        // Pan distance tracks zoom so dragging feels constant on screen.
        let step = self.distance * 0.05;
        self.target = self
            .target
            .add(right.scale(-dx * step))
            .add(screen_up.scale(dy * step));
    }

    /// Zoom by a multiplicative factor (>1 zooms out).
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        }
    }

    /// Advance the idle auto-rotation; no-op while the scene is live.
    pub fn tick(&mut self, dt: Duration, scene_live: bool) {
        if !scene_live {
            self.yaw = (self.yaw + self.auto_rotate_speed * dt.as_secs_f32())
                .rem_euclid(std::f32::consts::TAU);
        }
    }

    /// World-space camera position.
    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target.add(Vec3::new(
            self.distance * cp * sy,
            self.distance * sp,
            self.distance * cp * cy,
        ))
    }
}
