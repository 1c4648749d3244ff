//! Runtime configuration consumed by the core.
//!
//! The orchestrator owns a [`Config`] and passes the relevant section by
//! reference when it builds the world, a vehicle or the track field. Nothing
//! here is global; live tuning goes through the setters on
//! [`crate::vehicle::Vehicle`] and [`crate::field::TrackField`].
//!
//! Every struct is `#[serde(default)]`, so a partial JSON document only
//! overrides the fields it names.

use serde::{Deserialize, Serialize};

use crate::constants::*;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub physics: PhysicsConfig,
    pub vehicle: VehicleConfig,
    pub field: FieldConfig,
    pub ai: AiConfig,
    pub bounds: BoundsConfig,
}

/// Contact override for a pair of surface materials.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactRuleConfig {
    pub friction: f32,
    pub restitution: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: [f32; 3],
    pub time_step: f32,
    pub max_sub_steps: u32,
    pub solver_iterations: usize,
    /// Edge length of the default flat ground box.
    pub ground_size: f32,
    pub ground_thickness: f32,
    /// Wheel material against ground material.
    pub wheel_ground: ContactRuleConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, GRAVITY_Y, 0.0],
            time_step: TIME_STEP,
            max_sub_steps: MAX_SUB_STEPS,
            solver_iterations: SOLVER_ITERATIONS,
            ground_size: DEFAULT_GROUND_SIZE,
            ground_thickness: DEFAULT_GROUND_THICKNESS,
            wheel_ground: ContactRuleConfig {
                friction: WHEEL_GROUND_FRICTION,
                restitution: WHEEL_GROUND_RESTITUTION,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub radius: f32,
    pub width: f32,
    pub suspension_stiffness: f32,
    pub suspension_damping: f32,
    pub suspension_compression: f32,
    pub suspension_rest_length: f32,
    pub max_suspension_travel: f32,
    pub max_suspension_force: f32,
    pub friction_slip: f32,
    pub front_friction_slip: f32,
    pub rear_friction_slip: f32,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            radius: WHEEL_RADIUS,
            width: WHEEL_WIDTH,
            suspension_stiffness: SUSPENSION_STIFFNESS,
            suspension_damping: SUSPENSION_DAMPING,
            suspension_compression: SUSPENSION_COMPRESSION,
            suspension_rest_length: SUSPENSION_REST_LENGTH,
            max_suspension_travel: MAX_SUSPENSION_TRAVEL,
            max_suspension_force: MAX_SUSPENSION_FORCE,
            friction_slip: FRICTION_SLIP,
            front_friction_slip: FRONT_FRICTION_SLIP,
            rear_friction_slip: REAR_FRICTION_SLIP,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizationConfig {
    pub angular_damping: f32,
    pub linear_damping: f32,
    pub down_force: f32,
}

impl Default for StabilizationConfig {
    fn default() -> Self {
        Self {
            angular_damping: ANGULAR_DAMPING,
            linear_damping: LINEAR_DAMPING,
            down_force: DOWN_FORCE,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub mass: f32,
    pub max_speed_kmh: f32,
    pub engine_force: f32,
    pub turbo_multiplier: f32,
    pub brake_force: f32,
    pub steering_increment: f32,
    pub max_steering: f32,
    pub steering_decay: f32,
    pub wheel: WheelConfig,
    /// Fallback chassis box, full extents `[width, height, length]`.
    pub chassis_size: [f32; 3],
    pub wheel_track_fraction: f32,
    pub wheel_base_fraction: f32,
    pub stabilization: StabilizationConfig,
    /// Sub-meshes whose name contains this tag build the chassis compound.
    pub collision_tag: String,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            mass: VEHICLE_MASS,
            max_speed_kmh: MAX_SPEED_KMH,
            engine_force: ENGINE_FORCE,
            turbo_multiplier: TURBO_MULTIPLIER,
            brake_force: BRAKE_FORCE,
            steering_increment: STEERING_INCREMENT,
            max_steering: MAX_STEERING_VALUE,
            steering_decay: STEERING_DECAY,
            wheel: WheelConfig::default(),
            chassis_size: CHASSIS_SIZE,
            wheel_track_fraction: WHEEL_TRACK_FRACTION,
            wheel_base_fraction: WHEEL_BASE_FRACTION,
            stabilization: StabilizationConfig::default(),
            collision_tag: CHASSIS_COLLISION_TAG.to_owned(),
        }
    }
}

impl VehicleConfig {
    /// Forward speed cap in m/s.
    #[inline]
    pub fn max_speed_mps(&self) -> f32 {
        self.max_speed_kmh / MPS_TO_KMH
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PillarConfig {
    pub hints: Vec<String>,
    pub height_ratio: f32,
    pub max_diameter: f32,
    pub collider_shrink: f32,
}

impl Default for PillarConfig {
    fn default() -> Self {
        Self {
            hints: owned(PILLAR_NAME_HINTS),
            height_ratio: PILLAR_HEIGHT_RATIO,
            max_diameter: PILLAR_MAX_DIAMETER,
            collider_shrink: PILLAR_COLLIDER_SHRINK,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorFallbackConfig {
    pub hints: Vec<String>,
    pub wide_thin_max_height: f32,
    pub wide_thin_min_span: f32,
    pub box_shrink: f32,
}

impl Default for FloorFallbackConfig {
    fn default() -> Self {
        Self {
            hints: owned(FLOOR_FALLBACK_HINTS),
            wide_thin_max_height: WIDE_THIN_MAX_HEIGHT,
            wide_thin_min_span: WIDE_THIN_MIN_SPAN,
            box_shrink: FLOOR_BOX_SHRINK,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub hints: Vec<String>,
    pub position_offset: [f32; 3],
    pub ai_offset: [f32; 3],
    pub yaw_deg: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            hints: owned(SPAWN_NAME_HINTS),
            position_offset: SPAWN_POSITION_OFFSET,
            ai_offset: SPAWN_AI_OFFSET,
            yaw_deg: 0.0,
        }
    }
}

/// Placement of the track model in the world.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackTransform {
    pub scale: f32,
    pub yaw_deg: f32,
    pub position: [f32; 3],
}

impl Default for TrackTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            yaw_deg: 0.0,
            position: [0.0; 3],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub transform: TrackTransform,
    /// Replace the default flat ground once the track provides a floor.
    pub use_as_ground: bool,
    pub ground_hints: Vec<String>,
    pub sidewall_hints: Vec<String>,
    pub floor_fallback: FloorFallbackConfig,
    pub spawn: SpawnConfig,
    pub pillar: PillarConfig,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            transform: TrackTransform::default(),
            use_as_ground: true,
            ground_hints: owned(GROUND_NAME_HINTS),
            sidewall_hints: owned(SIDEWALL_NAME_HINTS),
            floor_fallback: FloorFallbackConfig::default(),
            spawn: SpawnConfig::default(),
            pillar: PillarConfig::default(),
        }
    }
}

/// Pursuit driver gains and distance bands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub steering_kp: f32,
    pub steering_clamp: f32,
    pub steering_smoothing: f32,
    pub desired_dist: f32,
    pub accel_dist: f32,
    pub brake_dist: f32,
    pub max_throttle: f32,
    pub min_throttle: f32,
    pub use_turbo: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            steering_kp: AI_STEERING_KP,
            steering_clamp: AI_STEERING_CLAMP,
            steering_smoothing: AI_STEERING_SMOOTHING,
            desired_dist: AI_DESIRED_DIST,
            accel_dist: AI_ACCEL_DIST,
            brake_dist: AI_BRAKE_DIST,
            max_throttle: AI_MAX_THROTTLE,
            min_throttle: AI_MIN_THROTTLE,
            use_turbo: false,
        }
    }
}

/// Playable area on X/Z before the track scale is applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    pub half_width: f32,
    pub half_depth: f32,
    pub margin: f32,
    pub fall_depth: f32,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            half_width: MAP_HALF_WIDTH,
            half_depth: MAP_HALF_DEPTH,
            margin: MAP_BOUNDS_MARGIN,
            fall_depth: FALL_DEPTH,
        }
    }
}

impl BoundsConfig {
    /// Whether `(x, z)` is inside the scaled area shrunk by the margin, and
    /// `y` is above `floor_y - fall_depth`.
    pub fn contains(&self, x: f32, y: f32, z: f32, scale: f32, floor_y: f32) -> bool {
        let hx = ((self.half_width - self.margin) * scale).max(0.0);
        let hz = ((self.half_depth - self.margin) * scale).max(0.0);
        x.abs() <= hx && z.abs() <= hz && y >= floor_y - self.fall_depth
    }
}

fn owned(hints: &[&str]) -> Vec<String> {
    hints.iter().map(|h| (*h).to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_speed_converts_kmh_to_mps() {
        let cfg = VehicleConfig::default();
        assert!((cfg.max_speed_mps() - 20.0).abs() < 1.0e-5);
    }

    #[test]
    fn defaults_keep_front_grip_above_rear() {
        let wheel = WheelConfig::default();
        assert!(wheel.front_friction_slip > wheel.rear_friction_slip);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg: Config = serde_json::from_str(
            r#"{
                "vehicle": { "mass": 900.0, "wheel": { "radius": 0.4 } },
                "field": { "transform": { "scale": 2.0 } }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.vehicle.mass, 900.0);
        assert_eq!(cfg.vehicle.wheel.radius, 0.4);
        assert_eq!(cfg.vehicle.wheel.width, WHEEL_WIDTH);
        assert_eq!(cfg.vehicle.engine_force, ENGINE_FORCE);
        assert_eq!(cfg.field.transform.scale, 2.0);
        assert_eq!(cfg.field.ground_hints, vec!["ground".to_owned()]);
        assert_eq!(cfg.ai, AiConfig::default());
    }

    #[test]
    fn bounds_shrink_by_margin_and_scale() {
        let b = BoundsConfig::default();
        assert!(b.contains(114.9, 0.0, 0.0, 1.0, 0.0));
        assert!(!b.contains(115.1, 0.0, 0.0, 1.0, 0.0));
        assert!(b.contains(0.0, 0.0, -64.0, 1.0, 0.0));
        assert!(!b.contains(0.0, 0.0, -66.0, 1.0, 0.0));
        assert!(b.contains(200.0, 0.0, 0.0, 2.0, 0.0));
        assert!(!b.contains(0.0, -20.5, 0.0, 1.0, 0.0));
        assert!(b.contains(0.0, -19.5, 0.0, 1.0, 0.0));
    }
}
