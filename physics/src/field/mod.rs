//! Track collider builder.
//!
//! [`build_track`] is the pure part: mesh nodes and a [`FieldConfig`] in,
//! collider definitions plus floor, spawn and diagnostics out. [`TrackField`]
//! keeps the loaded nodes and the handles it registered so it can rebuild
//! from scratch whenever the track transform changes.

mod classify;
mod floor;
mod hints;
mod spawn;

pub use classify::{
    Classification, Classifier, ClassifierChain, ColliderRole, MatchMethod, MeshFacts,
    NameHintClassifier, PillarShapeClassifier,
};
pub use floor::{FloorBox, FloorInfo, FloorMethod, fallback_floor, floor_box};
pub use hints::{HintMode, find_hint, substring_match, word_match};
pub use spawn::{SpawnInfo, detect_spawn};

use log::{debug, info, warn};
use nalgebra::{Matrix4, Vector3};
use rapier3d::{parry::bounding_volume::Aabb, prelude::RigidBodyHandle};

use crate::{
    collider::StaticColliderDef,
    config::{FieldConfig, TrackTransform},
    constants::{PILLAR_FRICTION, PILLAR_MIN_HALF_EXTENT, PILLAR_RESTITUTION},
    error::Result,
    materials::SurfaceMaterial,
    mesh::{MeshNode, track_root_matrix, union},
    world::PhysicsWorld,
};

/// Which strategy claimed a mesh, and whether it produced a collider.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationRecord {
    pub mesh: String,
    pub role: ColliderRole,
    pub method: Option<MatchMethod>,
    pub built: bool,
    /// The fallback floor box was derived from this mesh.
    pub floor_source: bool,
}

#[derive(Clone, Debug)]
pub struct TrackBuild {
    pub colliders: Vec<StaticColliderDef>,
    pub floor: Option<FloorInfo>,
    pub spawn: SpawnInfo,
    pub diagnostics: Vec<ClassificationRecord>,
}

impl TrackBuild {
    pub fn count(&self, role: ColliderRole) -> usize {
        self.colliders.iter().filter(|c| c.role == role).count()
    }
}

fn trimesh_def(
    id: u32,
    role: ColliderRole,
    node: &MeshNode,
    world: &Matrix4<f32>,
) -> Result<StaticColliderDef> {
    let triangles = node.triangles()?;
    let vertices = node.world_positions(world);
    Ok(StaticColliderDef::trimesh(id, &node.name, role, vertices, triangles))
}

fn pillar_def(id: u32, name: &str, aabb: &Aabb, shrink: f32) -> StaticColliderDef {
    let half = (aabb.extents() * shrink * 0.5).map(|v| v.max(PILLAR_MIN_HALF_EXTENT));
    StaticColliderDef::cuboid(id, name, ColliderRole::Pillar, aabb.center().coords, half)
        .with_material(SurfaceMaterial::Default)
        .with_contact(PILLAR_FRICTION, PILLAR_RESTITUTION)
}

/// Classify every node and derive colliders, floor and spawn.
pub fn build_track(nodes: &[MeshNode], cfg: &FieldConfig) -> TrackBuild {
    let root = track_root_matrix(&cfg.transform);
    let chain = ClassifierChain::from_config(cfg);
    let facts: Vec<MeshFacts<'_>> = nodes
        .iter()
        .map(|node| MeshFacts {
            node,
            world_aabb: node.world_aabb(&root),
        })
        .collect();

    let mut colliders = Vec::new();
    let mut diagnostics = Vec::with_capacity(facts.len());
    let mut ground_bounds: Option<Aabb> = None;
    let mut ground_count = 0;
    let mut next_id = 0u32;

    for mesh in &facts {
        let node = mesh.node;
        let class = chain.classify(mesh);
        let role = class.as_ref().map_or(ColliderRole::Unclassified, |c| c.role);

        let built = match role {
            ColliderRole::Ground | ColliderRole::Sidewall => {
                let world = root * node.transform;
                match trimesh_def(next_id, role, node, &world) {
                    Ok(def) => {
                        if role == ColliderRole::Ground {
                            if let Some(aabb) = mesh.world_aabb {
                                ground_bounds = Some(union(ground_bounds, &aabb));
                            }
                            ground_count += 1;
                        }
                        colliders.push(def);
                        true
                    }
                    Err(e) => {
                        warn!("skipping {role} mesh: {e}");
                        false
                    }
                }
            }
            ColliderRole::Pillar => match mesh.world_aabb {
                Some(aabb) => {
                    let shrink = cfg.pillar.collider_shrink;
                    colliders.push(pillar_def(next_id, &node.name, &aabb, shrink));
                    true
                }
                None => false,
            },
            ColliderRole::Unclassified => false,
        };
        if built {
            next_id += 1;
        }

        debug!("mesh `{}` -> {role} (built: {built})", node.name);
        diagnostics.push(ClassificationRecord {
            mesh: node.name.clone(),
            role,
            method: class.map(|c| c.method),
            built,
            floor_source: false,
        });
    }

    let floor = match ground_bounds {
        Some(aabb) if ground_count > 0 => Some(FloorInfo::named(aabb, ground_count)),
        _ => fallback_floor(&facts, &cfg.floor_fallback).map(|(info, fb)| {
            colliders.push(StaticColliderDef::cuboid(
                next_id,
                info.source.as_deref().unwrap_or("floor"),
                ColliderRole::Ground,
                fb.center,
                fb.half_extents,
            ));
            if let Some(record) = info.source_index.and_then(|i| diagnostics.get_mut(i)) {
                debug!("mesh `{}` is the fallback floor source", record.mesh);
                record.built = true;
                record.floor_source = true;
            }
            info
        }),
    };

    let spawn = detect_spawn(&facts, floor.as_ref(), &cfg.spawn);

    TrackBuild {
        colliders,
        floor,
        spawn,
        diagnostics,
    }
}

/// A loaded track and the static bodies it registered in the world.
pub struct TrackField {
    cfg: FieldConfig,
    nodes: Option<Vec<MeshNode>>,
    handles: Vec<RigidBodyHandle>,
    build: Option<TrackBuild>,
}

impl TrackField {
    pub fn new(cfg: FieldConfig) -> Self {
        Self {
            cfg,
            nodes: None,
            handles: Vec::new(),
            build: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &FieldConfig {
        &self.cfg
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.nodes.is_some()
    }

    #[inline]
    pub fn transform(&self) -> TrackTransform {
        self.cfg.transform
    }

    pub fn handles(&self) -> &[RigidBodyHandle] {
        &self.handles
    }

    pub fn last_build(&self) -> Option<&TrackBuild> {
        self.build.as_ref()
    }

    pub fn floor(&self) -> Option<&FloorInfo> {
        self.build.as_ref().and_then(|b| b.floor.as_ref())
    }

    pub fn surface_y(&self) -> Option<f32> {
        self.floor().map(|f| f.surface_y)
    }

    pub fn spawn(&self) -> Option<&SpawnInfo> {
        self.build.as_ref().map(|b| &b.spawn)
    }

    pub fn diagnostics(&self) -> &[ClassificationRecord] {
        self.build.as_ref().map_or(&[][..], |b| b.diagnostics.as_slice())
    }

    /// Install a freshly loaded track, replacing any previous one.
    pub fn load(&mut self, world: &mut PhysicsWorld, nodes: Vec<MeshNode>) {
        info!("track loaded: {} meshes", nodes.len());
        self.nodes = Some(nodes);
        self.rebuild(world);
    }

    /// Drop every collider this field created and derive them again.
    pub fn rebuild(&mut self, world: &mut PhysicsWorld) {
        let Some(nodes) = self.nodes.as_deref() else {
            return;
        };
        let build = build_track(nodes, &self.cfg);
        let floor_ready = self.cfg.use_as_ground && build.floor.is_some();
        self.handles = world.replace_static_set(&self.handles, &build.colliders, floor_ready);

        info!(
            "track colliders rebuilt: {} ground, {} sidewall, {} pillar, floor {:?}",
            build.count(ColliderRole::Ground),
            build.count(ColliderRole::Sidewall),
            build.count(ColliderRole::Pillar),
            build.floor.as_ref().map(|f| (f.method, f.surface_y)),
        );
        if build.floor.is_none() {
            warn!("track has no floor geometry; spawning at origin");
        }
        self.build = Some(build);
    }

    /// Remove the track and restore the default ground.
    pub fn clear(&mut self, world: &mut PhysicsWorld) {
        world.replace_static_set(&self.handles, &[], false);
        self.handles.clear();
        self.nodes = None;
        self.build = None;
    }

    pub fn set_transform(&mut self, world: &mut PhysicsWorld, transform: TrackTransform) {
        if self.cfg.transform == transform {
            return;
        }
        self.cfg.transform = transform;
        self.rebuild(world);
    }

    pub fn set_scale(&mut self, world: &mut PhysicsWorld, scale: f32) {
        self.set_transform(world, TrackTransform { scale, ..self.cfg.transform });
    }

    pub fn set_yaw_deg(&mut self, world: &mut PhysicsWorld, yaw_deg: f32) {
        self.set_transform(world, TrackTransform { yaw_deg, ..self.cfg.transform });
    }

    pub fn set_position(&mut self, world: &mut PhysicsWorld, position: Vector3<f32>) {
        self.set_transform(
            world,
            TrackTransform {
                position: position.into(),
                ..self.cfg.transform
            },
        );
    }
}
