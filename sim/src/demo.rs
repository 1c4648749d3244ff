//! Procedural stand-ins for the track and car models, so the simulator runs
//! without any asset on disk.

use nalgebra::{Matrix4, Vector3};
use physics::MeshNode;

fn boxed(name: &str, parent: &str, half: [f32; 3], at: [f32; 3]) -> MeshNode {
    MeshNode::cuboid(name, Vector3::from(half))
        .with_ancestors([parent])
        .with_transform(Matrix4::new_translation(&Vector3::from(at)))
}

/// Flat 240 x 140 field with walls, a few posts and a start line.
pub fn track() -> Vec<MeshNode> {
    let mut nodes = vec![
        boxed("Ground", "Track", [120.0, 0.5, 70.0], [0.0, -0.5, 0.0]),
        boxed("Sidewall_North", "Walls", [120.0, 1.0, 0.5], [0.0, 1.0, 70.5]),
        boxed("Sidewall_South", "Walls", [120.0, 1.0, 0.5], [0.0, 1.0, -70.5]),
        boxed("Sidewall_East", "Walls", [0.5, 1.0, 70.0], [120.5, 1.0, 0.0]),
        boxed("Sidewall_West", "Walls", [0.5, 1.0, 70.0], [-120.5, 1.0, 0.0]),
        boxed("StartLine", "Track", [6.0, 0.01, 0.5], [0.0, 0.0, -40.0]),
        boxed("Grandstand", "Props", [20.0, 4.0, 5.0], [0.0, 4.0, -80.0]),
    ];
    for (i, (x, z)) in [(-30.0, 0.0), (30.0, 0.0), (0.0, 25.0)].into_iter().enumerate() {
        nodes.push(boxed(&format!("Pillar_{i}"), "Props", [0.4, 4.0, 0.4], [x, 4.0, z]));
    }
    nodes
}

/// Visual body plus two collision boxes.
pub fn car() -> Vec<MeshNode> {
    vec![
        boxed("Body", "Car", [0.75, 0.45, 1.6], [0.0, 0.1, 0.0]),
        boxed("CollisionBox_Lower", "Car", [0.7, 0.3, 1.5], [0.0, 0.0, 0.0]),
        boxed("CollisionBox_Cabin", "Car", [0.55, 0.25, 0.8], [0.0, 0.55, -0.2]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use physics::{ColliderRole, FieldConfig, build_track, vehicle::collision_sources};

    #[test]
    fn demo_track_has_floor_walls_and_posts() {
        let build = build_track(&track(), &FieldConfig::default());
        assert_eq!(build.count(ColliderRole::Ground), 1);
        assert_eq!(build.count(ColliderRole::Sidewall), 4);
        assert_eq!(build.count(ColliderRole::Pillar), 3);
        assert_eq!(build.spawn.anchor_name.as_deref(), Some("StartLine"));
    }

    #[test]
    fn demo_car_has_two_collision_boxes() {
        assert_eq!(collision_sources(&car(), "CollisionBox").len(), 2);
    }
}
