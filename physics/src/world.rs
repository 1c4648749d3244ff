//! Rapier-backed simulation world.
//!
//! Owns every rigid body and collider, steps them on a fixed clock and keeps
//! the default flat ground around until a track provides its own floor.
//!
//! Design goals
//! - Deterministic: static sets are inserted in `id` order.
//! - Bounded catch-up: a long frame runs at most `max_sub_steps` fixed steps.
//! - Atomic ground swap: removing the default ground and installing a track
//!   floor happen inside one call, between two steps.

use rapier3d::prelude::*;

use log::{debug, info, warn};

use crate::{
    collider::{StaticColliderDef, collider_from_def},
    config::PhysicsConfig,
    constants::TIME_STEP,
    error::{Error, Result},
    field::ColliderRole,
    materials::{MaterialTable, SurfaceMaterial},
    utils::vec3,
};

/// Collision-side rapier sets, borrowed as a unit for scene queries.
///
/// Controllers that raycast against the world during a step (the wheel
/// suspensions) receive this instead of the whole [`PhysicsWorld`].
pub struct QueryWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
}

impl QueryWorld {
    fn new() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
        }
    }

    /// Borrowed read-only `QueryPipeline` view.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Borrowed pipeline that may also move bodies (used by the raycast vehicle).
    pub fn query_pipeline_mut<'a>(&'a mut self, filter: QueryFilter<'a>) -> QueryPipelineMut<'a> {
        self.broad_phase.as_query_pipeline_mut(
            self.narrow_phase.query_dispatcher(),
            &mut self.bodies,
            &mut self.colliders,
            filter,
        )
    }

    /// Distance from `origin` straight down to the first static surface.
    pub fn cast_down(&self, origin: Point<f32>, max_toi: f32) -> Option<f32> {
        let ray = Ray::new(origin, -Vector::y());
        self.query_pipeline(QueryFilter::only_fixed())
            .cast_ray(&ray, max_toi, true)
            .map(|(_, toi)| toi)
    }
}

/// Fixed-step accumulator.
///
/// `advance` turns a wall-clock delta into a whole number of fixed steps.
/// Leftover time is carried to the next call unless the step cap was hit, in
/// which case whole surplus steps are discarded and only the fraction is kept.
#[derive(Clone, Copy, Debug)]
pub struct FixedTimestep {
    dt: f32,
    max_sub_steps: u32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(dt: f32, max_sub_steps: u32) -> Self {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { TIME_STEP };
        Self {
            dt,
            max_sub_steps: max_sub_steps.max(1),
            accumulator: 0.0,
        }
    }

    #[inline]
    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn advance(&mut self, delta: f32) -> u32 {
        if delta.is_finite() && delta > 0.0 {
            self.accumulator += delta;
        }

        let mut steps = 0;
        while self.accumulator >= self.dt && steps < self.max_sub_steps {
            self.accumulator -= self.dt;
            steps += 1;
        }
        if self.accumulator >= self.dt {
            self.accumulator %= self.dt;
        }
        steps
    }

    /// Leftover fraction of a step, in `[0, 1)`.
    #[inline]
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.dt).clamp(0.0, 1.0)
    }
}

/// Anything that must run right before each fixed step (vehicle controllers).
pub trait SubstepHook {
    fn before_substep(&mut self, dt: f32, world: &mut QueryWorld);
}

pub struct PhysicsWorld {
    pub sets: QueryWorld,
    islands: IslandManager,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    pipeline: PhysicsPipeline,
    params: IntegrationParameters,
    gravity: Vector<f32>,
    clock: FixedTimestep,
    materials: MaterialTable,
    ground_def: StaticColliderDef,
    default_ground: Option<RigidBodyHandle>,
}

impl PhysicsWorld {
    pub fn new(cfg: &PhysicsConfig) -> Self {
        let clock = FixedTimestep::new(cfg.time_step, cfg.max_sub_steps);

        let mut params = IntegrationParameters {
            dt: clock.dt(),
            ..IntegrationParameters::default()
        };
        if let Ok(iterations) = cfg.solver_iterations.max(1).try_into() {
            params.num_solver_iterations = iterations;
        }

        let half = cfg.ground_size * 0.5;
        let half_thickness = cfg.ground_thickness * 0.5;
        let ground_def = StaticColliderDef::cuboid(
            0,
            "default_ground",
            ColliderRole::Ground,
            Vector::new(0.0, -half_thickness, 0.0),
            Vector::new(half, half_thickness, half),
        );

        let mut world = Self {
            sets: QueryWorld::new(),
            islands: IslandManager::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            pipeline: PhysicsPipeline::new(),
            params,
            gravity: vec3(cfg.gravity),
            clock,
            materials: MaterialTable::from_config(cfg),
            ground_def,
            default_ground: None,
        };
        world.install_default_ground();
        world
    }

    #[inline]
    pub fn dt(&self) -> f32 {
        self.params.dt
    }

    #[inline]
    pub fn clock(&self) -> &FixedTimestep {
        &self.clock
    }

    #[inline]
    pub fn has_default_ground(&self) -> bool {
        self.default_ground.is_some()
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.sets.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.sets.bodies.get_mut(handle)
    }

    #[inline]
    pub fn body_count(&self) -> usize {
        self.sets.bodies.len()
    }

    /// Insert a dynamic body with its compound shape.
    ///
    /// A body without colliders is rejected with [`Error::EmptyBody`].
    pub fn add_dynamic_body(
        &mut self,
        name: &str,
        body: RigidBody,
        colliders: Vec<Collider>,
    ) -> Result<RigidBodyHandle> {
        if colliders.is_empty() {
            return Err(Error::EmptyBody(name.to_owned()));
        }
        let handle = self.sets.bodies.insert(body);
        for collider in colliders {
            self.sets
                .colliders
                .insert_with_parent(collider, handle, &mut self.sets.bodies);
        }
        if let Some(body) = self.sets.bodies.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.sets.colliders);
        }
        debug!("added dynamic body `{name}`");
        Ok(handle)
    }

    /// Swap the whole collider list of a body and recompute its inertia once.
    pub fn replace_colliders(
        &mut self,
        name: &str,
        handle: RigidBodyHandle,
        colliders: Vec<Collider>,
    ) -> Result<()> {
        if colliders.is_empty() {
            return Err(Error::EmptyBody(name.to_owned()));
        }
        let old: Vec<ColliderHandle> = self
            .sets
            .bodies
            .get(handle)
            .ok_or(Error::MissingBody)?
            .colliders()
            .to_vec();
        for h in old {
            self.sets
                .colliders
                .remove(h, &mut self.islands, &mut self.sets.bodies, true);
        }
        for collider in colliders {
            self.sets
                .colliders
                .insert_with_parent(collider, handle, &mut self.sets.bodies);
        }
        let body = self.sets.bodies.get_mut(handle).ok_or(Error::MissingBody)?;
        body.recompute_mass_properties_from_colliders(&self.sets.colliders);
        Ok(())
    }

    /// Remove a body and its colliders. Contacts it was part of are dropped
    /// on the next step.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.sets
            .bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.sets.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    fn insert_static(&mut self, def: &StaticColliderDef) -> Result<RigidBodyHandle> {
        let collider = collider_from_def(def)?;
        let body = RigidBodyBuilder::fixed().pose(def.pose()).build();
        let handle = self.sets.bodies.insert(body);
        self.sets
            .colliders
            .insert_with_parent(collider, handle, &mut self.sets.bodies);
        Ok(handle)
    }

    fn install_default_ground(&mut self) {
        if self.default_ground.is_some() {
            return;
        }
        let def = self.ground_def.clone();
        match self.insert_static(&def) {
            Ok(handle) => self.default_ground = Some(handle),
            Err(e) => warn!("default ground not installed: {e}"),
        }
    }

    /// Replace one static set with another in a single call.
    ///
    /// `previous` is removed, `defs` are inserted in `id` order (degenerate
    /// ones are skipped with a warning), and the default ground is removed when
    /// `floor_ready` or restored when not. Returns the new handles.
    pub fn replace_static_set(
        &mut self,
        previous: &[RigidBodyHandle],
        defs: &[StaticColliderDef],
        floor_ready: bool,
    ) -> Vec<RigidBodyHandle> {
        for &handle in previous {
            self.remove_body(handle);
        }

        let mut ordered: Vec<&StaticColliderDef> = defs.iter().collect();
        ordered.sort_by_key(|d| d.id);

        let mut handles = Vec::with_capacity(ordered.len());
        for def in ordered {
            match self.insert_static(def) {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!("skipping collider: {e}"),
            }
        }

        match (floor_ready, self.default_ground) {
            (true, Some(ground)) => {
                self.remove_body(ground);
                self.default_ground = None;
                info!("default ground replaced by track floor");
            }
            (false, None) => {
                self.install_default_ground();
                info!("default ground restored");
            }
            _ => {}
        }

        handles
    }

    /// World bounds of every collider attached to `handles`, in order.
    pub fn static_aabbs(&self, handles: &[RigidBodyHandle]) -> Vec<Aabb> {
        handles
            .iter()
            .filter_map(|h| self.sets.bodies.get(*h))
            .flat_map(|body| body.colliders().iter())
            .filter_map(|c| self.sets.colliders.get(*c))
            .map(|c| c.compute_aabb())
            .collect()
    }

    /// Advance by a wall-clock delta. Each fixed step first runs every hook,
    /// then the solver. Returns the number of fixed steps taken.
    pub fn step(&mut self, delta: f32, hooks: &mut [&mut dyn SubstepHook]) -> u32 {
        let steps = self.clock.advance(delta);
        for _ in 0..steps {
            for hook in hooks.iter_mut() {
                hook.before_substep(self.params.dt, &mut self.sets);
            }
            self.step_once();
        }
        steps
    }

    fn step_once(&mut self) {
        let events = ();
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.sets.broad_phase,
            &mut self.sets.narrow_phase,
            &mut self.sets.bodies,
            &mut self.sets.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &self.materials,
            &events,
        );
    }
}

/// Collider for a dynamic compound part, tagged with its surface material.
pub fn tagged_collider(builder: ColliderBuilder, material: SurfaceMaterial) -> Collider {
    builder
        .user_data(material.user_data())
        .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
        .build()
}
