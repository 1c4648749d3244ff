pub mod ai;
pub mod collider;
pub mod config;
pub mod constants;
pub mod error;
pub mod field;
pub mod loader;
pub mod materials;
pub mod mesh;
pub mod utils;
pub mod vehicle;
pub mod world;

pub use ai::AiDriver;
pub use collider::{StaticColliderDef, StaticShapeDef, collider_from_def};
pub use config::{
    AiConfig, BoundsConfig, Config, FieldConfig, PhysicsConfig, TrackTransform, VehicleConfig,
};
pub use error::{Error, Result};
pub use field::{ColliderRole, FloorInfo, SpawnInfo, TrackBuild, TrackField, build_track};
pub use loader::{LoadMessage, LoadTarget, LoadedModel, MeshLoader, MeshSource};
pub use materials::{MaterialTable, SurfaceMaterial};
pub use mesh::MeshNode;
pub use utils::{planar_distance_sq, to_planar, wrap_angle, yaw_from_forward, yaw_rotation};
pub use vehicle::{ControlInput, Telemetry, Vehicle, VehicleParam, WheelVisual};
pub use world::{FixedTimestep, PhysicsWorld, QueryWorld, SubstepHook};
