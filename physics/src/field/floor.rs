//! Floor surface detection.
//!
//! Named ground meshes define the floor directly. Without them, the largest
//! hinted or thin-and-wide mesh becomes a box floor, and as a last resort the
//! bounds of the whole track do.

use nalgebra::Vector3;
use rapier3d::parry::bounding_volume::Aabb;

use super::{
    classify::MeshFacts,
    hints::{HintMode, matches},
};
use crate::{
    config::FloorFallbackConfig,
    constants::{
        FLOOR_BOX_DEFAULT_THICKNESS, FLOOR_BOX_MAX_THICKNESS, FLOOR_BOX_MIN_SPAN,
        FLOOR_BOX_MIN_THICKNESS,
    },
    mesh::{horizontal_area, union},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloorMethod {
    /// Trimeshes of meshes matching the ground hints.
    NamedMeshes,
    FallbackHint,
    WideThin,
    WorldAabb,
}

#[derive(Clone, Debug)]
pub struct FloorInfo {
    /// Top of the floor geometry.
    pub surface_y: f32,
    pub method: FloorMethod,
    /// Mesh the fallback box was derived from.
    pub source: Option<String>,
    /// Position of that mesh in the input list. `None` for the world bounds.
    pub source_index: Option<usize>,
    pub mesh_count: usize,
    pub aabb: Aabb,
    /// Full extents of the fallback box, if one was built.
    pub box_size: Option<Vector3<f32>>,
}

impl FloorInfo {
    pub fn named(aabb: Aabb, mesh_count: usize) -> Self {
        Self {
            surface_y: aabb.maxs.y,
            method: FloorMethod::NamedMeshes,
            source: None,
            source_index: None,
            mesh_count,
            aabb,
            box_size: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloorBox {
    pub center: Vector3<f32>,
    pub half_extents: Vector3<f32>,
}

/// Box standing on `aabb.mins.y`, slightly narrower than the source.
pub fn floor_box(aabb: &Aabb, shrink: f32) -> FloorBox {
    let size = aabb.extents();
    let center = aabb.center();

    let width = (size.x * shrink).max(FLOOR_BOX_MIN_SPAN);
    let depth = (size.z * shrink).max(FLOOR_BOX_MIN_SPAN);
    let thickness = if size.y > 0.0 {
        size.y
    } else {
        FLOOR_BOX_DEFAULT_THICKNESS
    }
    .clamp(FLOOR_BOX_MIN_THICKNESS, FLOOR_BOX_MAX_THICKNESS);

    let half = Vector3::new(width, thickness, depth) * 0.5;
    FloorBox {
        center: Vector3::new(center.x, aabb.mins.y + half.y, center.z),
        half_extents: half,
    }
}

fn is_wide_thin(aabb: &Aabb, cfg: &FloorFallbackConfig) -> bool {
    let size = aabb.extents();
    size.y < cfg.wide_thin_max_height
        && size.x > cfg.wide_thin_min_span
        && size.z > cfg.wide_thin_min_span
}

/// Pick the fallback floor among `meshes`.
///
/// Candidates carry a fallback hint in their own or their parent's name, or
/// are thin and wide; the largest X×Z footprint wins. With no candidate the
/// union of every mesh is used. `None` only when no mesh has vertices.
pub fn fallback_floor(
    meshes: &[MeshFacts<'_>],
    cfg: &FloorFallbackConfig,
) -> Option<(FloorInfo, FloorBox)> {
    let mut best: Option<(f32, FloorMethod, usize, Aabb)> = None;
    let mut whole: Option<Aabb> = None;

    for (index, mesh) in meshes.iter().enumerate() {
        let Some(aabb) = mesh.world_aabb else { continue };
        whole = Some(union(whole, &aabb));

        let node = mesh.node;
        let hinted = cfg.hints.iter().any(|h| {
            matches(&node.name, h, HintMode::Substring)
                || node
                    .parent_name()
                    .is_some_and(|p| matches(p, h, HintMode::Substring))
        });
        let method = if hinted {
            FloorMethod::FallbackHint
        } else if is_wide_thin(&aabb, cfg) {
            FloorMethod::WideThin
        } else {
            continue;
        };

        let area = horizontal_area(&aabb);
        if best.as_ref().is_none_or(|(a, ..)| area > *a) {
            best = Some((area, method, index, aabb));
        }
    }

    let (method, source, source_index, aabb) = match best {
        Some((_, method, index, aabb)) => {
            (method, meshes[index].node.name.clone(), Some(index), aabb)
        }
        None => (FloorMethod::WorldAabb, "WORLD_AABB".to_owned(), None, whole?),
    };

    let fb = floor_box(&aabb, cfg.box_shrink);
    let info = FloorInfo {
        surface_y: aabb.maxs.y,
        method,
        source: Some(source),
        source_index,
        mesh_count: 1,
        aabb,
        box_size: Some(fb.half_extents * 2.0),
    };
    Some((info, fb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshNode;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Point3};

    fn facts(node: &MeshNode) -> MeshFacts<'_> {
        MeshFacts {
            node,
            world_aabb: node.world_aabb(&Matrix4::identity()),
        }
    }

    #[test]
    fn floor_box_sits_on_source_bottom() {
        let aabb = Aabb::new(Point3::new(-10.0, 2.0, -20.0), Point3::new(10.0, 2.5, 20.0));
        let fb = floor_box(&aabb, 0.98);
        assert_relative_eq!(fb.half_extents, Vector3::new(9.8, 0.25, 19.6), epsilon = 1.0e-5);
        assert_relative_eq!(fb.center, Vector3::new(0.0, 2.25, 0.0), epsilon = 1.0e-5);
    }

    #[test]
    fn floor_box_clamps_thickness_and_span() {
        let flat = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.5, 0.0, 0.5));
        let fb = floor_box(&flat, 0.98);
        assert_relative_eq!(fb.half_extents, Vector3::new(0.5, 0.2, 0.5), epsilon = 1.0e-6);

        let thick = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 5.0, 10.0));
        assert_relative_eq!(floor_box(&thick, 1.0).half_extents.y, 0.5);
    }

    #[test]
    fn largest_hinted_or_wide_thin_mesh_wins() {
        let small_road = MeshNode::cuboid("Road_A", Vector3::new(3.0, 0.1, 3.0));
        let big_plate = MeshNode::cuboid("Plate", Vector3::new(20.0, 0.1, 20.0));
        let tower = MeshNode::cuboid("Tower", Vector3::new(1.0, 30.0, 1.0));
        let meshes = [facts(&small_road), facts(&big_plate), facts(&tower)];

        let (info, _) = fallback_floor(&meshes, &FloorFallbackConfig::default()).unwrap();
        assert_eq!(info.method, FloorMethod::WideThin);
        assert_eq!(info.source.as_deref(), Some("Plate"));
        assert_relative_eq!(info.surface_y, 0.1);
    }

    #[test]
    fn parent_hint_counts_for_fallback() {
        let tile =
            MeshNode::cuboid("Tile", Vector3::new(2.0, 2.0, 2.0)).with_ancestors(["Asphalt"]);
        let (info, _) = fallback_floor(&[facts(&tile)], &FloorFallbackConfig::default()).unwrap();
        assert_eq!(info.method, FloorMethod::FallbackHint);
    }

    #[test]
    fn without_candidates_the_whole_track_is_used() {
        let a = MeshNode::cuboid("A", Vector3::new(1.0, 2.0, 1.0))
            .with_transform(Matrix4::new_translation(&Vector3::new(-10.0, 2.0, 0.0)));
        let b = MeshNode::cuboid("B", Vector3::new(1.0, 1.0, 1.0))
            .with_transform(Matrix4::new_translation(&Vector3::new(10.0, 1.0, 4.0)));
        let (info, fb) =
            fallback_floor(&[facts(&a), facts(&b)], &FloorFallbackConfig::default()).unwrap();

        assert_eq!(info.method, FloorMethod::WorldAabb);
        assert_relative_eq!(info.surface_y, 4.0);
        assert_relative_eq!(fb.center.x, 0.0);
        assert_relative_eq!(fb.center.z, 2.0);
    }

    #[test]
    fn no_geometry_means_no_floor() {
        let empty = MeshNode::new("Empty");
        assert!(fallback_floor(&[facts(&empty)], &FloorFallbackConfig::default()).is_none());
        assert!(fallback_floor(&[], &FloorFallbackConfig::default()).is_none());
    }
}
