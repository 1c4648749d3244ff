//! Default tuning values for the simulation world, the vehicle and the track
//! collider builder.
//!
//! These feed the `Default` impls in [`crate::config`]. Keep them together so a
//! tuning pass only has to look in one place.
//!
//! Notes
//! - Distances are in meters, time in seconds, mass in kilograms.
//! - Speeds exposed to humans (HUD, config) are km/h; the solver works in m/s.

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Gravity along Y in meters per second squared (negative = down).
///
/// Stronger than earth gravity; the cars feel floaty at -9.81.
pub const GRAVITY_Y: f32 = -20.0;

/// Fixed integration step (seconds).
pub const TIME_STEP: f32 = 1.0 / 60.0;

/// Maximum number of fixed steps run for a single wall-clock delta.
pub const MAX_SUB_STEPS: u32 = 3;

/// Solver iterations per step.
pub const SOLVER_ITERATIONS: usize = 10;

/// Edge length of the default flat ground box (meters). Larger than any map.
pub const DEFAULT_GROUND_SIZE: f32 = 300.0;

/// Thickness of the default ground box. Its top face sits at Y = 0.
pub const DEFAULT_GROUND_THICKNESS: f32 = 1.0;

/// Friction used between the vehicle contact material and the ground.
pub const WHEEL_GROUND_FRICTION: f32 = 0.4;

/// Restitution used between the vehicle contact material and the ground.
pub const WHEEL_GROUND_RESTITUTION: f32 = 0.3;

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

/// Chassis mass (kg).
pub const VEHICLE_MASS: f32 = 500.0;

/// Forward speed cap (km/h). Engine force is gated above this.
pub const MAX_SPEED_KMH: f32 = 72.0;

/// Engine force applied per wheel at full throttle.
pub const ENGINE_FORCE: f32 = 1400.0;

/// Engine force multiplier while turbo is held.
pub const TURBO_MULTIPLIER: f32 = 3.0;

/// Brake applied to every wheel while braking.
pub const BRAKE_FORCE: f32 = 35.0;

/// Steering angle added per step at full steering input (radians).
pub const STEERING_INCREMENT: f32 = 0.1;

/// Steering angle limit (radians).
pub const MAX_STEERING_VALUE: f32 = 1.0;

/// Per-step multiplier applied to the steering angle when there is no input.
pub const STEERING_DECAY: f32 = 0.9;

/// Conversion factor from m/s to km/h.
pub const MPS_TO_KMH: f32 = 3.6;

pub const WHEEL_RADIUS: f32 = 0.3;
pub const WHEEL_WIDTH: f32 = 0.25;
pub const SUSPENSION_STIFFNESS: f32 = 100.0;
/// Relaxation damping of the suspension.
pub const SUSPENSION_DAMPING: f32 = 8.0;
/// Compression damping of the suspension.
pub const SUSPENSION_COMPRESSION: f32 = 4.4;
pub const SUSPENSION_REST_LENGTH: f32 = 0.4;
pub const MAX_SUSPENSION_TRAVEL: f32 = 0.4;
pub const MAX_SUSPENSION_FORCE: f32 = 100_000.0;

/// Friction slip used when a single value is pushed to all four wheels.
pub const FRICTION_SLIP: f32 = 8.0;
pub const FRONT_FRICTION_SLIP: f32 = 20.0;
pub const REAR_FRICTION_SLIP: f32 = 15.0;

/// Fallback chassis box size (full extents, x = width, y = height, z = length).
pub const CHASSIS_SIZE: [f32; 3] = [1.3, 0.75, 2.8];

/// Wheel X offset as a fraction of the chassis width.
pub const WHEEL_TRACK_FRACTION: f32 = 0.42;

/// Wheel Z offset as a fraction of the chassis length.
pub const WHEEL_BASE_FRACTION: f32 = 0.4;

pub const ANGULAR_DAMPING: f32 = 0.4;
pub const LINEAR_DAMPING: f32 = 0.1;

/// Downforce gain. Applied force is `DOWN_FORCE * speed_mps * DOWN_FORCE_SPEED_SCALE`.
pub const DOWN_FORCE: f32 = 100.0;
pub const DOWN_FORCE_SPEED_SCALE: f32 = 0.1;

/// Name fragment marking collision-only sub-meshes of a car model.
pub const CHASSIS_COLLISION_TAG: &str = "CollisionBox";

// ---------------------------------------------------------------------------
// Track field
// ---------------------------------------------------------------------------

pub const GROUND_NAME_HINTS: &[&str] = &["ground"];
pub const SIDEWALL_NAME_HINTS: &[&str] = &["sidewall"];
pub const SPAWN_NAME_HINTS: &[&str] = &["start", "startline"];
pub const PILLAR_NAME_HINTS: &[&str] = &["pillar", "pole", "column", "柱"];

/// Substring hints tried by the floor fallback when no named ground matched.
pub const FLOOR_FALLBACK_HINTS: &[&str] =
    &["floor", "ground", "road", "track", "asphalt", "地面", "路面"];

/// A pillar is taller than `PILLAR_HEIGHT_RATIO * min(width, depth)`.
pub const PILLAR_HEIGHT_RATIO: f32 = 3.0;

/// A pillar's larger horizontal side is at most this wide (meters).
pub const PILLAR_MAX_DIAMETER: f32 = 3.0;

/// Pillar boxes are shrunk by this factor so cars can brush past.
pub const PILLAR_COLLIDER_SHRINK: f32 = 0.9;

/// Smallest half-extent a pillar box may have.
pub const PILLAR_MIN_HALF_EXTENT: f32 = 0.01;

pub const PILLAR_FRICTION: f32 = 0.7;
pub const PILLAR_RESTITUTION: f32 = 0.1;

/// Thin-and-wide floor heuristic: maximum height (meters).
pub const WIDE_THIN_MAX_HEIGHT: f32 = 1.0;

/// Thin-and-wide floor heuristic: minimum width and depth (meters).
pub const WIDE_THIN_MIN_SPAN: f32 = 5.0;

/// Fallback floor boxes are shrunk slightly on X/Z.
pub const FLOOR_BOX_SHRINK: f32 = 0.98;

/// Fallback floor boxes are at least this wide on X and Z.
pub const FLOOR_BOX_MIN_SPAN: f32 = 1.0;

/// Thickness used when the source mesh has no height.
pub const FLOOR_BOX_DEFAULT_THICKNESS: f32 = 0.4;
pub const FLOOR_BOX_MIN_THICKNESS: f32 = 0.2;
pub const FLOOR_BOX_MAX_THICKNESS: f32 = 1.0;

/// Player spawn offset from the spawn base (meters).
pub const SPAWN_POSITION_OFFSET: [f32; 3] = [0.0, 2.0, 0.0];

/// AI spawn offset from the player spawn (meters).
pub const SPAWN_AI_OFFSET: [f32; 3] = [-4.0, 0.0, -6.0];

// ---------------------------------------------------------------------------
// AI pursuit driver
// ---------------------------------------------------------------------------

pub const AI_STEERING_KP: f32 = 1.2;
pub const AI_STEERING_CLAMP: f32 = 1.0;

/// Steering smoothing rate; the blend factor is `min(1, dt * rate)`.
pub const AI_STEERING_SMOOTHING: f32 = 10.0;

/// Follow distance (meters). Between this and `AI_ACCEL_DIST` throttle ramps.
pub const AI_DESIRED_DIST: f32 = 8.0;
pub const AI_ACCEL_DIST: f32 = 14.0;
pub const AI_BRAKE_DIST: f32 = 5.0;
pub const AI_MAX_THROTTLE: f32 = 1.0;
pub const AI_MIN_THROTTLE: f32 = 0.2;

/// Throttle factor inside the follow band.
pub const AI_CRUISE_FACTOR: f32 = 0.6;

/// Above this heading error (fraction of PI) throttle is scaled down.
pub const AI_TURN_SLOWDOWN_ANGLE: f32 = 0.45;
pub const AI_TURN_SLOWDOWN_FACTOR: f32 = 0.4;

// ---------------------------------------------------------------------------
// Map bounds (orchestrator recovery)
// ---------------------------------------------------------------------------

pub const MAP_HALF_WIDTH: f32 = 125.0;
pub const MAP_HALF_DEPTH: f32 = 75.0;
pub const MAP_BOUNDS_MARGIN: f32 = 10.0;

/// A vehicle this far below the floor surface is considered fallen through.
pub const FALL_DEPTH: f32 = 20.0;
