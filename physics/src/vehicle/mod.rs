//! Four-wheel raycast vehicle.
//!
//! A [`Vehicle`] owns a handle to its chassis body (the world owns the body)
//! and a rapier [`DynamicRayCastVehicleController`] for the suspensions. Each
//! frame the orchestrator calls [`Vehicle::update`] with the driver input and
//! then steps the world with the vehicle as a [`SubstepHook`], so the
//! suspension raycasts run once per fixed step.
//!
//! Wheels 0 and 1 are the front pair (+Z), wheels 2 and 3 the rear pair; even
//! indices sit on -X.

mod compound;
mod drive;
mod input;
mod steering;
mod tuning;

pub use compound::{ChassisPart, CompoundShape, ShapeSource, build_compound, collision_sources};
pub use drive::{DriveCommand, drive_command};
pub use input::ControlInput;
pub use steering::SteeringState;
pub use tuning::VehicleParam;

use log::{debug, info, warn};
use rapier3d::{
    control::{DynamicRayCastVehicleController, WheelTuning},
    na::{Point3, UnitQuaternion, Vector3},
    prelude::*,
};

use crate::{
    config::VehicleConfig,
    constants::{DOWN_FORCE_SPEED_SCALE, MPS_TO_KMH},
    error::{Error, Result},
    mesh::MeshNode,
    utils::{yaw_from_forward, yaw_rotation},
    world::{PhysicsWorld, QueryWorld, SubstepHook},
};

pub const WHEEL_COUNT: usize = 4;

/// Render-side wheel geometry. `revision` bumps whenever radius or width
/// change so a renderer knows to rebuild its wheel meshes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelVisual {
    pub radius: f32,
    pub width: f32,
    pub revision: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelState {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub suspension_length: f32,
    pub in_contact: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Telemetry {
    pub position: Point3<f32>,
    /// `atan2(forward.x, forward.z)` of the chassis +Z axis.
    pub yaw: f32,
    pub speed_kmh: f32,
    pub steering: f32,
    pub wheels: [WheelState; WHEEL_COUNT],
}

/// Connection points for a chassis of the given full width and length.
pub fn wheel_layout(
    width: f32,
    length: f32,
    track_fraction: f32,
    base_fraction: f32,
) -> [Point3<f32>; WHEEL_COUNT] {
    let x = width * track_fraction;
    let z = length * base_fraction;
    [
        Point3::new(-x, 0.0, z),
        Point3::new(x, 0.0, z),
        Point3::new(-x, 0.0, -z),
        Point3::new(x, 0.0, -z),
    ]
}

#[inline]
fn is_front(index: usize) -> bool {
    index < 2
}

pub struct Vehicle {
    name: String,
    cfg: VehicleConfig,
    chassis: RigidBodyHandle,
    controller: DynamicRayCastVehicleController,
    steering: SteeringState,
    compound: CompoundShape,
    using_fallback: bool,
    command: DriveCommand,
    speed_mps: f32,
    wheel_visual: WheelVisual,
}

impl Vehicle {
    /// Build the chassis with the fallback box and four wheels.
    pub fn new(
        world: &mut PhysicsWorld,
        name: impl Into<String>,
        cfg: &VehicleConfig,
        position: Point3<f32>,
        yaw: f32,
    ) -> Result<Self> {
        let name = name.into();
        let compound = CompoundShape::single_box(cfg.chassis_size);

        let body = RigidBodyBuilder::dynamic()
            .pose(Isometry::from_parts(position.coords.into(), yaw_rotation(yaw)))
            .linear_damping(cfg.stabilization.linear_damping)
            .angular_damping(cfg.stabilization.angular_damping)
            .can_sleep(false)
            .build();
        let chassis = world.add_dynamic_body(&name, body, compound.colliders(cfg.mass))?;

        let mut controller = DynamicRayCastVehicleController::new(chassis);
        controller.index_up_axis = 1;
        controller.index_forward_axis = 2;

        let tuning = WheelTuning {
            suspension_stiffness: cfg.wheel.suspension_stiffness,
            suspension_compression: cfg.wheel.suspension_compression,
            suspension_damping: cfg.wheel.suspension_damping,
            max_suspension_travel: cfg
                .wheel
                .max_suspension_travel
                .min(cfg.wheel.suspension_rest_length),
            friction_slip: cfg.wheel.friction_slip,
            max_suspension_force: cfg.wheel.max_suspension_force,
            ..WheelTuning::default()
        };
        let [width, _, length] = cfg.chassis_size;
        let points = wheel_layout(
            width,
            length,
            cfg.wheel_track_fraction,
            cfg.wheel_base_fraction,
        );
        for point in points {
            controller.add_wheel(
                point,
                -Vector::y(),
                Vector::x(),
                cfg.wheel.suspension_rest_length,
                cfg.wheel.radius,
                &tuning,
            );
        }

        let mut vehicle = Self {
            name,
            cfg: cfg.clone(),
            chassis,
            controller,
            steering: SteeringState::default(),
            compound,
            using_fallback: true,
            command: DriveCommand::default(),
            speed_mps: 0.0,
            wheel_visual: WheelVisual {
                radius: cfg.wheel.radius,
                width: cfg.wheel.width,
                revision: 0,
            },
        };
        vehicle.push_axle_friction();
        info!("vehicle `{}` created with fallback chassis", vehicle.name);
        Ok(vehicle)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn chassis(&self) -> RigidBodyHandle {
        self.chassis
    }

    #[inline]
    pub fn config(&self) -> &VehicleConfig {
        &self.cfg
    }

    #[inline]
    pub fn compound(&self) -> &CompoundShape {
        &self.compound
    }

    #[inline]
    pub fn using_fallback_chassis(&self) -> bool {
        self.using_fallback
    }

    #[inline]
    pub fn steering_angle(&self) -> f32 {
        self.steering.angle()
    }

    #[inline]
    pub fn last_command(&self) -> DriveCommand {
        self.command
    }

    #[inline]
    pub fn wheel_visual(&self) -> WheelVisual {
        self.wheel_visual
    }

    pub fn wheel_connection_points(&self) -> [Point3<f32>; WHEEL_COUNT] {
        let mut out = [Point3::origin(); WHEEL_COUNT];
        for (slot, wheel) in out.iter_mut().zip(self.controller.wheels()) {
            *slot = wheel.chassis_connection_point_cs;
        }
        out
    }

    /// Last raycast suspension length of each wheel.
    pub fn suspension_lengths(&self) -> [f32; WHEEL_COUNT] {
        let mut out = [0.0; WHEEL_COUNT];
        for (slot, wheel) in out.iter_mut().zip(self.controller.wheels()) {
            *slot = wheel.raycast_info().suspension_length;
        }
        out
    }

    /// Replace the chassis shape with boxes from collision-tagged model nodes.
    ///
    /// Without tagged nodes the current shape stays and `Ok(false)` is
    /// returned.
    pub fn install_model(&mut self, world: &mut PhysicsWorld, nodes: &[MeshNode]) -> Result<bool> {
        let sources = collision_sources(nodes, &self.cfg.collision_tag);
        self.install_chassis(world, &sources)
    }

    pub fn install_chassis(
        &mut self,
        world: &mut PhysicsWorld,
        sources: &[ShapeSource],
    ) -> Result<bool> {
        let Some(compound) = build_compound(sources) else {
            warn!(
                "vehicle `{}`: no `{}` meshes, keeping fallback chassis",
                self.name, self.cfg.collision_tag
            );
            return Ok(false);
        };

        world.replace_colliders(&self.name, self.chassis, compound.colliders(self.cfg.mass))?;
        let extents = compound.extents;
        info!(
            "vehicle `{}`: compound chassis installed, {} boxes, extents {:.2}x{:.2}x{:.2}",
            self.name,
            compound.parts.len(),
            extents.x,
            extents.y,
            extents.z
        );
        self.compound = compound;
        self.using_fallback = false;
        self.layout_wheels(extents.x, extents.z);
        Ok(true)
    }

    fn layout_wheels(&mut self, width: f32, length: f32) {
        let points = wheel_layout(
            width,
            length,
            self.cfg.wheel_track_fraction,
            self.cfg.wheel_base_fraction,
        );
        for (wheel, point) in self.controller.wheels_mut().iter_mut().zip(points) {
            wheel.chassis_connection_point_cs = point;
        }
    }

    fn push_axle_friction(&mut self) {
        let (front, rear) = (self.cfg.wheel.front_friction_slip, self.cfg.wheel.rear_friction_slip);
        for (i, wheel) in self.controller.wheels_mut().iter_mut().enumerate() {
            wheel.friction_slip = if is_front(i) { front } else { rear };
        }
    }

    fn for_each_wheel(&mut self, mut f: impl FnMut(usize, &mut rapier3d::control::Wheel)) {
        for (i, wheel) in self.controller.wheels_mut().iter_mut().enumerate() {
            f(i, wheel);
        }
    }

    /// Per-frame control: steering smoothing, drivetrain, downforce.
    pub fn update(&mut self, world: &mut PhysicsWorld, input: &ControlInput) -> Result<()> {
        let input = input.sanitized();
        let body = world.body_mut(self.chassis).ok_or(Error::MissingBody)?;
        self.speed_mps = body.linvel().norm();

        let steer = self.steering.update(
            input.steering,
            self.cfg.steering_increment,
            self.cfg.max_steering,
            self.cfg.steering_decay,
        );
        let command = drive_command(&input, self.speed_mps, &self.cfg);

        let down_force =
            self.cfg.stabilization.down_force * self.speed_mps * DOWN_FORCE_SPEED_SCALE;
        body.reset_forces(true);
        body.add_force(Vector::new(0.0, -down_force, 0.0), true);

        self.for_each_wheel(|i, wheel| {
            wheel.steering = if is_front(i) { steer } else { 0.0 };
            wheel.engine_force = command.engine_force;
            wheel.brake = command.brake;
        });
        self.command = command;
        Ok(())
    }

    /// Teleport to `position` facing `yaw` with zero velocity. Shape and
    /// inertia are untouched.
    pub fn reset(
        &mut self,
        world: &mut PhysicsWorld,
        position: Point3<f32>,
        yaw: f32,
    ) -> Result<()> {
        let body = world.body_mut(self.chassis).ok_or(Error::MissingBody)?;
        body.set_translation(position.coords, true);
        body.set_rotation(yaw_rotation(yaw), true);
        body.set_linvel(Vector::zeros(), true);
        body.set_angvel(Vector::zeros(), true);
        body.reset_forces(true);
        body.reset_torques(true);

        self.steering.reset();
        self.command = DriveCommand::default();
        self.speed_mps = 0.0;
        self.for_each_wheel(|_, wheel| {
            wheel.steering = 0.0;
            wheel.engine_force = 0.0;
            wheel.brake = 0.0;
        });
        debug!("vehicle `{}` reset to {position} yaw {yaw:.3}", self.name);
        Ok(())
    }

    pub fn telemetry(&self, world: &PhysicsWorld) -> Result<Telemetry> {
        let body = world.body(self.chassis).ok_or(Error::MissingBody)?;
        let pose = body.position();
        let forward = pose.rotation * Vector3::z();

        let mut wheels = [WheelState {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
            suspension_length: 0.0,
            in_contact: false,
        }; WHEEL_COUNT];
        for (slot, wheel) in wheels.iter_mut().zip(self.controller.wheels()) {
            let info = wheel.raycast_info();
            let local = wheel.chassis_connection_point_cs + -Vector3::y() * info.suspension_length;
            let steer = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), wheel.steering);
            let spin = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), wheel.rotation);
            *slot = WheelState {
                position: pose * local,
                rotation: pose.rotation * steer * spin,
                suspension_length: info.suspension_length,
                in_contact: info.is_in_contact,
            };
        }

        Ok(Telemetry {
            position: pose.translation.vector.into(),
            yaw: yaw_from_forward(&forward),
            speed_kmh: body.linvel().norm() * MPS_TO_KMH,
            steering: self.steering.angle(),
            wheels,
        })
    }

    // ---------------------------------------------------------------------
    // Live tuning. Each setter updates the owned config and pushes the value
    // into the running simulation.
    // ---------------------------------------------------------------------

    pub fn apply(&mut self, world: &mut PhysicsWorld, param: VehicleParam) -> Result<()> {
        use VehicleParam::*;
        match param {
            Mass(v) => return self.set_mass(world, v),
            MaxSpeedKmh(v) => self.cfg.max_speed_kmh = v,
            EngineForce(v) => self.cfg.engine_force = v,
            TurboMultiplier(v) => self.cfg.turbo_multiplier = v,
            BrakeForce(v) => self.cfg.brake_force = v,
            SteeringIncrement(v) => self.cfg.steering_increment = v,
            MaxSteering(v) => self.set_max_steering(v),
            WheelRadius(v) => self.set_wheel_radius(v),
            WheelWidth(v) => self.set_wheel_width(v),
            SuspensionStiffness(v) => self.set_suspension_stiffness(v),
            SuspensionDamping(v) => self.set_suspension_damping(v),
            SuspensionCompression(v) => self.set_suspension_compression(v),
            SuspensionRestLength(v) => self.set_suspension_rest_length(v),
            MaxSuspensionTravel(v) => self.set_max_suspension_travel(v),
            MaxSuspensionForce(v) => self.set_max_suspension_force(v),
            FrictionSlip(v) => self.set_friction_slip(v),
            FrontFrictionSlip(v) => self.set_front_friction_slip(v),
            RearFrictionSlip(v) => self.set_rear_friction_slip(v),
            ChassisWidth(v) => return self.set_chassis_width(world, v),
            ChassisHeight(v) => return self.set_chassis_height(world, v),
            ChassisLength(v) => return self.set_chassis_length(world, v),
            DownForce(v) => self.cfg.stabilization.down_force = v,
            AngularDamping(v) => return self.set_angular_damping(world, v),
            LinearDamping(v) => return self.set_linear_damping(world, v),
        }
        debug!("vehicle `{}`: {param}", self.name);
        Ok(())
    }

    /// Spread the new mass over the chassis boxes by volume and recompute
    /// inertia.
    pub fn set_mass(&mut self, world: &mut PhysicsWorld, mass: f32) -> Result<()> {
        self.cfg.mass = mass;
        let handles: Vec<ColliderHandle> = world
            .body(self.chassis)
            .ok_or(Error::MissingBody)?
            .colliders()
            .to_vec();

        let volume = |c: &Collider| {
            c.shape()
                .as_cuboid()
                .map_or(1.0, |b| 8.0 * b.half_extents.x * b.half_extents.y * b.half_extents.z)
        };
        let total: f32 = handles
            .iter()
            .filter_map(|h| world.sets.colliders.get(*h))
            .map(volume)
            .sum();

        for h in &handles {
            if let Some(collider) = world.sets.colliders.get_mut(*h) {
                let share = if total > 0.0 {
                    volume(collider) / total
                } else {
                    1.0 / handles.len() as f32
                };
                collider.set_mass(mass * share);
            }
        }

        let sets = &mut world.sets;
        let body = sets.bodies.get_mut(self.chassis).ok_or(Error::MissingBody)?;
        body.recompute_mass_properties_from_colliders(&sets.colliders);
        debug!("vehicle `{}`: mass={mass}", self.name);
        Ok(())
    }

    pub fn set_max_speed_kmh(&mut self, v: f32) {
        self.cfg.max_speed_kmh = v;
    }

    pub fn set_engine_force(&mut self, v: f32) {
        self.cfg.engine_force = v;
    }

    pub fn set_turbo_multiplier(&mut self, v: f32) {
        self.cfg.turbo_multiplier = v;
    }

    pub fn set_brake_force(&mut self, v: f32) {
        self.cfg.brake_force = v;
    }

    pub fn set_steering_increment(&mut self, v: f32) {
        self.cfg.steering_increment = v;
    }

    pub fn set_max_steering(&mut self, v: f32) {
        self.cfg.max_steering = v;
        self.steering.clamp_to(v);
    }

    pub fn set_wheel_radius(&mut self, v: f32) {
        self.cfg.wheel.radius = v;
        self.for_each_wheel(|_, w| w.radius = v);
        self.wheel_visual.radius = v;
        self.wheel_visual.revision += 1;
    }

    pub fn set_wheel_width(&mut self, v: f32) {
        self.cfg.wheel.width = v;
        self.wheel_visual.width = v;
        self.wheel_visual.revision += 1;
    }

    pub fn set_suspension_stiffness(&mut self, v: f32) {
        self.cfg.wheel.suspension_stiffness = v;
        self.for_each_wheel(|_, w| w.suspension_stiffness = v);
    }

    /// Relaxation damping.
    pub fn set_suspension_damping(&mut self, v: f32) {
        self.cfg.wheel.suspension_damping = v;
        self.for_each_wheel(|_, w| w.damping_relaxation = v);
    }

    pub fn set_suspension_compression(&mut self, v: f32) {
        self.cfg.wheel.suspension_compression = v;
        self.for_each_wheel(|_, w| w.damping_compression = v);
    }

    pub fn set_suspension_rest_length(&mut self, v: f32) {
        self.cfg.wheel.suspension_rest_length = v;
        self.push_travel();
    }

    pub fn set_max_suspension_travel(&mut self, v: f32) {
        self.cfg.wheel.max_suspension_travel = v;
        self.push_travel();
    }

    /// Travel never exceeds the rest length, so the shortest suspension
    /// (`rest - travel`) stays non-negative.
    fn push_travel(&mut self) {
        let rest = self.cfg.wheel.suspension_rest_length;
        let travel = self.cfg.wheel.max_suspension_travel.min(rest);
        self.for_each_wheel(|_, w| {
            w.suspension_rest_length = rest;
            w.max_suspension_travel = travel;
        });
    }

    pub fn set_max_suspension_force(&mut self, v: f32) {
        self.cfg.wheel.max_suspension_force = v;
        self.for_each_wheel(|_, w| w.max_suspension_force = v);
    }

    /// Same grip on all four wheels.
    pub fn set_friction_slip(&mut self, v: f32) {
        self.cfg.wheel.friction_slip = v;
        self.cfg.wheel.front_friction_slip = v;
        self.cfg.wheel.rear_friction_slip = v;
        self.for_each_wheel(|_, w| w.friction_slip = v);
    }

    pub fn set_front_friction_slip(&mut self, v: f32) {
        self.cfg.wheel.front_friction_slip = v;
        self.push_axle_friction();
    }

    pub fn set_rear_friction_slip(&mut self, v: f32) {
        self.cfg.wheel.rear_friction_slip = v;
        self.push_axle_friction();
    }

    pub fn set_chassis_width(&mut self, world: &mut PhysicsWorld, v: f32) -> Result<()> {
        self.cfg.chassis_size[0] = v;
        self.resize_chassis(world)
    }

    pub fn set_chassis_height(&mut self, world: &mut PhysicsWorld, v: f32) -> Result<()> {
        self.cfg.chassis_size[1] = v;
        self.resize_chassis(world)
    }

    pub fn set_chassis_length(&mut self, world: &mut PhysicsWorld, v: f32) -> Result<()> {
        self.cfg.chassis_size[2] = v;
        self.resize_chassis(world)
    }

    /// Move the wheels to the configured size; the fallback box follows too.
    fn resize_chassis(&mut self, world: &mut PhysicsWorld) -> Result<()> {
        let [width, _, length] = self.cfg.chassis_size;
        self.layout_wheels(width, length);
        if self.using_fallback {
            let compound = CompoundShape::single_box(self.cfg.chassis_size);
            world.replace_colliders(&self.name, self.chassis, compound.colliders(self.cfg.mass))?;
            self.compound = compound;
        }
        Ok(())
    }

    pub fn set_down_force(&mut self, v: f32) {
        self.cfg.stabilization.down_force = v;
    }

    pub fn set_angular_damping(&mut self, world: &mut PhysicsWorld, v: f32) -> Result<()> {
        self.cfg.stabilization.angular_damping = v;
        world
            .body_mut(self.chassis)
            .ok_or(Error::MissingBody)?
            .set_angular_damping(v);
        Ok(())
    }

    pub fn set_linear_damping(&mut self, world: &mut PhysicsWorld, v: f32) -> Result<()> {
        self.cfg.stabilization.linear_damping = v;
        world
            .body_mut(self.chassis)
            .ok_or(Error::MissingBody)?
            .set_linear_damping(v);
        Ok(())
    }
}

impl SubstepHook for Vehicle {
    fn before_substep(&mut self, dt: f32, world: &mut QueryWorld) {
        let Some(body) = world.bodies.get(self.chassis) else {
            return;
        };
        // Forward drive (negative force) stops at the cap on every substep,
        // not only when the frame's command was computed.
        let capped = body.linvel().norm() >= self.cfg.max_speed_mps();
        let engine_force = if capped && self.command.engine_force < 0.0 {
            0.0
        } else {
            self.command.engine_force
        };
        self.for_each_wheel(|_, wheel| wheel.engine_force = engine_force);

        let filter = QueryFilter::exclude_dynamic().exclude_rigid_body(self.chassis);
        self.controller
            .update_vehicle(dt, world.query_pipeline_mut(filter));
    }
}
