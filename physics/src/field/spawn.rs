use nalgebra::{Point3, Vector3};

use super::{
    classify::MeshFacts,
    floor::FloorInfo,
    hints::{HintMode, find_hint},
};
use crate::{config::SpawnConfig, mesh::horizontal_area, utils::vec3};

/// Where the player and the AI car start.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnInfo {
    pub anchor_name: Option<String>,
    pub anchor_size: Option<Vector3<f32>>,
    pub base_position: Point3<f32>,
    pub position: Point3<f32>,
    pub ai_position: Point3<f32>,
    pub yaw_deg: f32,
    pub yaw_rad: f32,
}

/// Base from the largest spawn anchor (center X/Z, top Y), else the floor
/// bounds, else the origin. Height comes from the floor surface when known.
pub fn detect_spawn(
    meshes: &[MeshFacts<'_>],
    floor: Option<&FloorInfo>,
    cfg: &SpawnConfig,
) -> SpawnInfo {
    let anchor = meshes
        .iter()
        .filter(|m| find_hint(m.node.name_chain(), &cfg.hints, HintMode::WordBoundary).is_some())
        .filter_map(|m| m.world_aabb.map(|aabb| (m.node.name.as_str(), aabb)))
        .fold(None, |best: Option<(&str, _)>, (name, aabb)| match best {
            Some((_, b)) if horizontal_area(&b) >= horizontal_area(&aabb) => best,
            _ => Some((name, aabb)),
        });

    let base_position = match (anchor, floor) {
        (Some((_, aabb)), _) => {
            let c = aabb.center();
            Point3::new(c.x, aabb.maxs.y, c.z)
        }
        (None, Some(floor)) => {
            let c = floor.aabb.center();
            Point3::new(c.x, floor.aabb.maxs.y, c.z)
        }
        (None, None) => Point3::origin(),
    };

    let offset = vec3(cfg.position_offset);
    let surface_y = floor.map_or(base_position.y, |f| f.surface_y);
    let position = Point3::new(
        base_position.x + offset.x,
        surface_y + offset.y,
        base_position.z + offset.z,
    );
    let ai_position = position + vec3(cfg.ai_offset);

    SpawnInfo {
        anchor_name: anchor.map(|(name, _)| name.to_owned()),
        anchor_size: anchor.map(|(_, aabb)| aabb.extents()),
        base_position,
        position,
        ai_position,
        yaw_deg: cfg.yaw_deg,
        yaw_rad: cfg.yaw_deg.to_radians(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field::floor::FloorMethod, mesh::MeshNode};
    use approx::assert_relative_eq;
    use nalgebra::Matrix4;
    use rapier3d::parry::bounding_volume::Aabb;

    fn facts(node: &MeshNode) -> MeshFacts<'_> {
        MeshFacts {
            node,
            world_aabb: node.world_aabb(&Matrix4::identity()),
        }
    }

    fn floor_at(y: f32) -> FloorInfo {
        FloorInfo::named(
            Aabb::new(Point3::new(-50.0, y - 1.0, -10.0), Point3::new(30.0, y, 30.0)),
            1,
        )
    }

    #[test]
    fn largest_anchor_sets_base_and_floor_sets_height() {
        let small = MeshNode::cuboid("Start", Vector3::new(1.0, 0.5, 1.0));
        let big = MeshNode::cuboid("start_line", Vector3::new(6.0, 0.5, 2.0))
            .with_transform(Matrix4::new_translation(&Vector3::new(10.0, 0.0, 5.0)));
        let floor = floor_at(0.2);

        let spawn = detect_spawn(
            &[facts(&small), facts(&big)],
            Some(&floor),
            &SpawnConfig::default(),
        );
        assert_eq!(spawn.anchor_name.as_deref(), Some("start_line"));
        assert_relative_eq!(spawn.base_position, Point3::new(10.0, 0.5, 5.0));
        assert_relative_eq!(spawn.position, Point3::new(10.0, 2.2, 5.0), epsilon = 1.0e-5);
        assert_relative_eq!(spawn.ai_position, Point3::new(6.0, 2.2, -1.0), epsilon = 1.0e-5);
    }

    #[test]
    fn floor_center_is_used_without_anchor() {
        let floor = floor_at(1.0);
        let spawn = detect_spawn(&[], Some(&floor), &SpawnConfig::default());
        assert!(spawn.anchor_name.is_none());
        assert_relative_eq!(spawn.base_position, Point3::new(-10.0, 1.0, 10.0));
        assert_relative_eq!(spawn.position.y, 3.0);
        assert_eq!(floor.method, FloorMethod::NamedMeshes);
    }

    #[test]
    fn origin_without_anchor_or_floor() {
        let cfg = SpawnConfig {
            yaw_deg: 90.0,
            ..SpawnConfig::default()
        };
        let spawn = detect_spawn(&[], None, &cfg);
        assert_relative_eq!(spawn.position, Point3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(spawn.yaw_rad, std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn restart_sign_is_not_an_anchor() {
        let sign = MeshNode::cuboid("RestartSign", Vector3::new(1.0, 1.0, 1.0));
        let spawn = detect_spawn(&[facts(&sign)], None, &SpawnConfig::default());
        assert!(spawn.anchor_name.is_none());
    }
}
