use rapier3d::{na::UnitQuaternion, prelude::*};

use crate::{
    error::{Error, Result},
    field::ColliderRole,
    materials::SurfaceMaterial,
};

/// Schema-agnostic definition of a static track collider.
///
/// The collider builder emits these; [`crate::world::PhysicsWorld`] turns them
/// into fixed bodies. Keeping them as plain data lets a rebuild be compared
/// against the previous one without touching the solver.
///
/// Conventions
/// - Units are meters.
/// - Trimesh vertices are already in world space, so their pose is identity.
/// - Boxes carry their center in `translation`.
#[derive(Clone, Debug)]
pub struct StaticColliderDef {
    /// Insertion order; equal inputs produce equal ids.
    pub id: u32,
    /// Source mesh name, for diagnostics.
    pub name: String,
    pub role: ColliderRole,
    pub material: SurfaceMaterial,
    pub translation: Vector<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub shape: StaticShapeDef,
    /// Explicit contact values. `None` keeps the rapier defaults and leaves
    /// the material table in charge.
    pub friction: Option<f32>,
    pub restitution: Option<f32>,
}

#[derive(Clone, Debug)]
pub enum StaticShapeDef {
    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vector<f32> },

    /// Triangle soup in world space.
    TriMesh {
        vertices: Vec<Point<f32>>,
        indices: Vec<[u32; 3]>,
    },
}

impl StaticColliderDef {
    pub fn cuboid(
        id: u32,
        name: impl Into<String>,
        role: ColliderRole,
        center: Vector<f32>,
        half_extents: Vector<f32>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            material: SurfaceMaterial::Ground,
            translation: center,
            rotation: UnitQuaternion::identity(),
            shape: StaticShapeDef::Cuboid { half_extents },
            friction: None,
            restitution: None,
        }
    }

    pub fn trimesh(
        id: u32,
        name: impl Into<String>,
        role: ColliderRole,
        vertices: Vec<Point<f32>>,
        indices: Vec<[u32; 3]>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            material: SurfaceMaterial::Ground,
            translation: Vector::zeros(),
            rotation: UnitQuaternion::identity(),
            shape: StaticShapeDef::TriMesh { vertices, indices },
            friction: None,
            restitution: None,
        }
    }

    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.material = material;
        self
    }

    pub fn with_contact(mut self, friction: f32, restitution: f32) -> Self {
        self.friction = Some(friction);
        self.restitution = Some(restitution);
        self
    }

    #[inline]
    pub fn pose(&self) -> Isometry<f32> {
        Isometry::from_parts(self.translation.into(), self.rotation)
    }
}

/// Build a rapier collider from a [`StaticColliderDef`].
///
/// The pose lives on the parent body, so the collider has identity local
/// transform. Trimeshes rapier refuses (all triangles degenerate, etc.) come
/// back as [`Error::DegenerateMesh`].
pub fn collider_from_def(def: &StaticColliderDef) -> Result<Collider> {
    let builder = match &def.shape {
        StaticShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        StaticShapeDef::TriMesh { vertices, indices } => {
            if vertices.is_empty() || indices.is_empty() {
                return Err(Error::degenerate(&def.name, "empty triangle buffer"));
            }
            ColliderBuilder::trimesh(vertices.clone(), indices.clone())
                .map_err(|e| Error::degenerate(&def.name, format!("{e:?}")))?
        }
    };

    let mut builder = builder
        .user_data(def.material.user_data())
        .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS);
    if let Some(friction) = def.friction {
        builder = builder.friction(friction);
    }
    if let Some(restitution) = def.restitution {
        builder = builder.restitution(restitution);
    }
    Ok(builder.build())
}
