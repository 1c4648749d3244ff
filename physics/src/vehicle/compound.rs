//! Chassis compound shape from collision-tagged sub-meshes.
//!
//! Pure: takes `(local bounds, model-space transform)` pairs and returns box
//! descriptors relative to the combined bounds center, which becomes the
//! chassis body origin.

use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};
use rapier3d::{parry::bounding_volume::Aabb, prelude::*};

use crate::{
    materials::SurfaceMaterial,
    mesh::{MeshNode, decompose, transform_aabb, union},
    world::tagged_collider,
};

/// One collision sub-mesh as seen by the builder.
#[derive(Clone, Debug)]
pub struct ShapeSource {
    pub name: String,
    pub local_aabb: Aabb,
    /// Local to model space.
    pub world: Matrix4<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChassisPart {
    pub half_extents: Vector3<f32>,
    /// Box center relative to the body origin.
    pub offset: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl ChassisPart {
    #[inline]
    pub fn volume(&self) -> f32 {
        8.0 * self.half_extents.x * self.half_extents.y * self.half_extents.z
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompoundShape {
    pub parts: Vec<ChassisPart>,
    /// Combined bounds center in model space.
    pub center: Point3<f32>,
    /// Combined full extents; x is the width, z the length.
    pub extents: Vector3<f32>,
}

impl CompoundShape {
    /// Single box of full size `[width, height, length]`.
    pub fn single_box(size: [f32; 3]) -> Self {
        let extents = Vector3::new(size[0], size[1], size[2]);
        Self {
            parts: vec![ChassisPart {
                half_extents: extents * 0.5,
                offset: Vector3::zeros(),
                rotation: UnitQuaternion::identity(),
            }],
            center: Point3::origin(),
            extents,
        }
    }

    /// Rapier colliders with `mass` split by box volume.
    pub fn colliders(&self, mass: f32) -> Vec<Collider> {
        let total: f32 = self.parts.iter().map(ChassisPart::volume).sum();
        let count = self.parts.len().max(1) as f32;
        self.parts
            .iter()
            .map(|part| {
                let share = if total > 0.0 {
                    part.volume() / total
                } else {
                    1.0 / count
                };
                let h = part.half_extents;
                let builder = ColliderBuilder::cuboid(h.x, h.y, h.z)
                    .translation(part.offset)
                    .rotation(part.rotation.scaled_axis())
                    .mass(mass * share);
                tagged_collider(builder, SurfaceMaterial::Wheel)
            })
            .collect()
    }
}

/// Collect sources from model nodes whose name contains `tag`.
pub fn collision_sources(nodes: &[MeshNode], tag: &str) -> Vec<ShapeSource> {
    nodes
        .iter()
        .filter(|n| n.name.contains(tag))
        .filter_map(|n| {
            Some(ShapeSource {
                name: n.name.clone(),
                local_aabb: n.local_aabb()?,
                world: n.transform,
            })
        })
        .collect()
}

/// Boxes for each source: half-extents from local bounds times world scale,
/// offset from the combined center, rotation from the world transform.
/// `None` without sources.
pub fn build_compound(sources: &[ShapeSource]) -> Option<CompoundShape> {
    let bounds = sources
        .iter()
        .fold(None, |acc, s| Some(union(acc, &transform_aabb(&s.local_aabb, &s.world))))?;
    let center = bounds.center();

    let parts = sources
        .iter()
        .map(|s| {
            let d = decompose(&s.world);
            let local_center = s.local_aabb.center();
            let world_center = s.world.transform_point(&local_center);
            ChassisPart {
                half_extents: s.local_aabb.extents().component_mul(&d.scale) * 0.5,
                offset: world_center - center,
                rotation: d.rotation,
            }
        })
        .collect();

    Some(CompoundShape {
        parts,
        center,
        extents: bounds.extents(),
    })
}
