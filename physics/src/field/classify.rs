//! Role classification for track sub-meshes.
//!
//! A [`ClassifierChain`] holds strategies in priority order; the first one
//! that returns a classification wins. Meshes no strategy claims are
//! [`ColliderRole::Unclassified`] and get no collider.

use std::fmt;

use rapier3d::parry::bounding_volume::Aabb;

use super::hints::{HintMode, find_hint};
use crate::{config::FieldConfig, mesh::MeshNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColliderRole {
    Ground,
    Sidewall,
    Pillar,
    Unclassified,
}

impl fmt::Display for ColliderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ground => "ground",
            Self::Sidewall => "sidewall",
            Self::Pillar => "pillar",
            Self::Unclassified => "unclassified",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MatchMethod {
    /// Matched the named hint.
    NameHint(String),
    /// Tall-and-thin bounds.
    TallThin,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub role: ColliderRole,
    pub method: MatchMethod,
}

/// A mesh plus the world bounds computed once per rebuild.
#[derive(Clone, Copy, Debug)]
pub struct MeshFacts<'a> {
    pub node: &'a MeshNode,
    pub world_aabb: Option<Aabb>,
}

pub trait Classifier {
    fn try_classify(&self, mesh: &MeshFacts<'_>) -> Option<Classification>;
}

/// Role from name hints.
///
/// Word-boundary mode searches the node and all its ancestors; substring mode
/// only looks at the node and its direct parent.
pub struct NameHintClassifier {
    pub role: ColliderRole,
    pub hints: Vec<String>,
    pub mode: HintMode,
}

impl Classifier for NameHintClassifier {
    fn try_classify(&self, mesh: &MeshFacts<'_>) -> Option<Classification> {
        let node = mesh.node;
        let hit = match self.mode {
            HintMode::WordBoundary => find_hint(node.name_chain(), &self.hints, self.mode),
            HintMode::Substring => {
                let names = std::iter::once(node.name.as_str()).chain(node.parent_name());
                find_hint(names, &self.hints, self.mode)
            }
        }?;
        Some(Classification {
            role: self.role,
            method: MatchMethod::NameHint(hit.to_owned()),
        })
    }
}

/// Pillar from shape: `H > ratio * min(W, D)` and `max(W, D) <= max_diameter`.
pub struct PillarShapeClassifier {
    pub height_ratio: f32,
    pub max_diameter: f32,
}

impl PillarShapeClassifier {
    pub fn is_pillar(&self, width: f32, height: f32, depth: f32) -> bool {
        let is_tall = height > self.height_ratio * width.min(depth).max(1.0e-4);
        let is_thin = width.max(depth) <= self.max_diameter;
        is_tall && is_thin
    }
}

impl Classifier for PillarShapeClassifier {
    fn try_classify(&self, mesh: &MeshFacts<'_>) -> Option<Classification> {
        let size = mesh.world_aabb?.extents();
        self.is_pillar(size.x, size.y, size.z).then(|| Classification {
            role: ColliderRole::Pillar,
            method: MatchMethod::TallThin,
        })
    }
}

pub struct ClassifierChain {
    strategies: Vec<Box<dyn Classifier>>,
}

impl ClassifierChain {
    pub fn new(strategies: Vec<Box<dyn Classifier>>) -> Self {
        Self { strategies }
    }

    /// Ground, sidewall, pillar by name, pillar by shape.
    pub fn from_config(cfg: &FieldConfig) -> Self {
        Self::new(vec![
            Box::new(NameHintClassifier {
                role: ColliderRole::Ground,
                hints: cfg.ground_hints.clone(),
                mode: HintMode::WordBoundary,
            }),
            Box::new(NameHintClassifier {
                role: ColliderRole::Sidewall,
                hints: cfg.sidewall_hints.clone(),
                mode: HintMode::WordBoundary,
            }),
            Box::new(NameHintClassifier {
                role: ColliderRole::Pillar,
                hints: cfg.pillar.hints.clone(),
                mode: HintMode::Substring,
            }),
            Box::new(PillarShapeClassifier {
                height_ratio: cfg.pillar.height_ratio,
                max_diameter: cfg.pillar.max_diameter,
            }),
        ])
    }

    pub fn classify(&self, mesh: &MeshFacts<'_>) -> Option<Classification> {
        self.strategies.iter().find_map(|s| s.try_classify(mesh))
    }

    pub fn role_of(&self, mesh: &MeshFacts<'_>) -> ColliderRole {
        self.classify(mesh)
            .map_or(ColliderRole::Unclassified, |c| c.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix4, Vector3};

    fn facts(node: &MeshNode) -> MeshFacts<'_> {
        MeshFacts {
            node,
            world_aabb: node.world_aabb(&Matrix4::identity()),
        }
    }

    #[test]
    fn tall_thin_mesh_is_pillar() {
        let shape = PillarShapeClassifier {
            height_ratio: 3.0,
            max_diameter: 3.0,
        };
        assert!(shape.is_pillar(1.0, 10.0, 1.0));
        assert!(!shape.is_pillar(4.0, 10.0, 4.0));
    }

    #[test]
    fn chain_prefers_ground_hint_over_shape() {
        let chain = ClassifierChain::from_config(&FieldConfig::default());
        let post = MeshNode::cuboid("Post", Vector3::new(0.5, 5.0, 0.5));
        assert_eq!(chain.role_of(&facts(&post)), ColliderRole::Pillar);
        assert_eq!(
            chain.classify(&facts(&post)).map(|c| c.method),
            Some(MatchMethod::TallThin)
        );

        let tall_ground =
            MeshNode::cuboid("Mesh.12", Vector3::new(0.5, 5.0, 0.5)).with_ancestors(["Ground"]);
        assert_eq!(chain.role_of(&facts(&tall_ground)), ColliderRole::Ground);
    }

    #[test]
    fn underground_pipe_is_not_ground() {
        let chain = ClassifierChain::from_config(&FieldConfig::default());
        let pipe = MeshNode::cuboid("UndergroundPipe", Vector3::new(5.0, 0.5, 5.0));
        assert_eq!(chain.role_of(&facts(&pipe)), ColliderRole::Unclassified);
    }

    #[test]
    fn pillar_hint_checks_parent_but_not_grandparent() {
        let chain = ClassifierChain::from_config(&FieldConfig::default());
        let flat = Vector3::new(5.0, 0.5, 5.0);

        let child = MeshNode::cuboid("Mesh", flat).with_ancestors(["StonePillars", "Scene"]);
        assert_eq!(chain.role_of(&facts(&child)), ColliderRole::Pillar);

        let grandchild =
            MeshNode::cuboid("Mesh", flat).with_ancestors(["Group", "StonePillars"]);
        assert_eq!(chain.role_of(&facts(&grandchild)), ColliderRole::Unclassified);
    }

    #[test]
    fn sidewall_and_ground_use_their_own_hints() {
        let chain = ClassifierChain::from_config(&FieldConfig::default());
        let wall = MeshNode::cuboid("SideWall_L", Vector3::new(50.0, 1.0, 0.2));
        assert_eq!(chain.role_of(&facts(&wall)), ColliderRole::Sidewall);
    }

    #[test]
    fn mesh_without_vertices_is_not_a_shape_pillar() {
        let chain = ClassifierChain::from_config(&FieldConfig::default());
        let empty = MeshNode::new("Empty");
        assert_eq!(chain.role_of(&facts(&empty)), ColliderRole::Unclassified);
    }
}
