/*!
Static mesh data handed to the core by the asset loader.

A [`MeshNode`] is one named piece of triangle geometry together with its
transform relative to the model root and the names of the nodes enclosing it.
Nodes are never mutated after loading; the collider builder and the chassis
builder derive everything they need (world vertices, world bounds, scale and
rotation) from them on demand.

Conventions
- Positions are in the node's local space.
- `transform` maps local space to model-root space (a general affine matrix;
  scale may be non-uniform).
- `ancestors` lists enclosing node names, nearest parent first.
*/

use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, UnitQuaternion, Vector3};
use rapier3d::parry::bounding_volume::Aabb;

use crate::{
    config::TrackTransform,
    error::{Error, Result},
    utils::vec3,
};

#[derive(Clone, Debug)]
pub struct MeshNode {
    pub name: String,
    pub ancestors: Vec<String>,
    pub transform: Matrix4<f32>,
    pub positions: Vec<Point3<f32>>,
    pub indices: Vec<u32>,
}

impl MeshNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ancestors: Vec::new(),
            transform: Matrix4::identity(),
            positions: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn with_ancestors<I, S>(mut self, ancestors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ancestors = ancestors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_geometry(mut self, positions: Vec<Point3<f32>>, indices: Vec<u32>) -> Self {
        self.positions = positions;
        self.indices = indices;
        self
    }

    /// Axis-aligned box of `half_extents` centered on the local origin.
    ///
    /// Handy for synthetic tracks and cars; 8 vertices, 12 triangles.
    pub fn cuboid(name: impl Into<String>, half_extents: Vector3<f32>) -> Self {
        let (x, y, z) = (half_extents.x, half_extents.y, half_extents.z);
        let positions = vec![
            Point3::new(-x, -y, -z),
            Point3::new(x, -y, -z),
            Point3::new(x, y, -z),
            Point3::new(-x, y, -z),
            Point3::new(-x, -y, z),
            Point3::new(x, -y, z),
            Point3::new(x, y, z),
            Point3::new(-x, y, z),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // -z
            4, 5, 6, 4, 6, 7, // +z
            0, 1, 5, 0, 5, 4, // -y
            3, 7, 6, 3, 6, 2, // +y
            0, 4, 7, 0, 7, 3, // -x
            1, 2, 6, 1, 6, 5, // +x
        ];
        Self::new(name).with_geometry(positions, indices)
    }

    #[inline]
    pub fn parent_name(&self) -> Option<&str> {
        self.ancestors.first().map(String::as_str)
    }

    /// The node's own name followed by every ancestor name.
    pub fn name_chain(&self) -> impl Iterator<Item = &str> + Clone {
        std::iter::once(self.name.as_str()).chain(self.ancestors.iter().map(String::as_str))
    }

    /// Bounds of the raw vertex positions, or `None` without vertices.
    pub fn local_aabb(&self) -> Option<Aabb> {
        let (first, rest) = self.positions.split_first()?;
        let (mut mins, mut maxs) = (*first, *first);
        for p in rest {
            mins = mins.inf(p);
            maxs = maxs.sup(p);
        }
        Some(Aabb::new(mins, maxs))
    }

    /// World bounds of the local box under `root * transform`.
    pub fn world_aabb(&self, root: &Matrix4<f32>) -> Option<Aabb> {
        let world = root * self.transform;
        self.local_aabb().map(|aabb| transform_aabb(&aabb, &world))
    }

    pub fn world_positions(&self, world: &Matrix4<f32>) -> Vec<Point3<f32>> {
        self.positions
            .iter()
            .map(|p| world.transform_point(p))
            .collect()
    }

    /// Triangle list, validated against the vertex count.
    ///
    /// Non-indexed meshes use sequential indices. A trailing partial triangle
    /// is dropped.
    pub fn triangles(&self) -> Result<Vec<[u32; 3]>> {
        if self.positions.is_empty() {
            return Err(Error::degenerate(&self.name, "no position data"));
        }

        let sequential: Vec<u32>;
        let indices = if self.indices.is_empty() {
            sequential = (0..self.positions.len() as u32).collect();
            &sequential
        } else {
            &self.indices
        };

        if indices.len() < 3 {
            return Err(Error::degenerate(
                &self.name,
                format!("{} indices, need at least 3", indices.len()),
            ));
        }

        let vertex_count = self.positions.len() as u32;
        if let Some(bad) = indices.iter().find(|&&i| i >= vertex_count) {
            return Err(Error::degenerate(
                &self.name,
                format!("index {bad} out of range for {vertex_count} vertices"),
            ));
        }

        Ok(indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect())
    }
}

/// Bounds of the eight transformed corners of `aabb`.
pub fn transform_aabb(aabb: &Aabb, m: &Matrix4<f32>) -> Aabb {
    let (lo, hi) = (aabb.mins, aabb.maxs);
    let mut out: Option<Aabb> = None;
    for i in 0..8 {
        let corner = Point3::new(
            if i & 1 == 0 { lo.x } else { hi.x },
            if i & 2 == 0 { lo.y } else { hi.y },
            if i & 4 == 0 { lo.z } else { hi.z },
        );
        let p = m.transform_point(&corner);
        out = Some(union(out, &Aabb::new(p, p)));
    }
    out.unwrap_or(*aabb)
}

/// Union of an optional accumulator with another box.
#[inline]
pub fn union(acc: Option<Aabb>, other: &Aabb) -> Aabb {
    match acc {
        Some(a) => Aabb::new(a.mins.inf(&other.mins), a.maxs.sup(&other.maxs)),
        None => *other,
    }
}

/// X×Z footprint of a box.
#[inline]
pub fn horizontal_area(aabb: &Aabb) -> f32 {
    let e = aabb.extents();
    (e.x * e.z).abs()
}

/// Translation, rotation and per-axis scale of an affine matrix.
#[derive(Clone, Copy, Debug)]
pub struct Decomposed {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

pub fn decompose(m: &Matrix4<f32>) -> Decomposed {
    let translation = Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
    let linear: Matrix3<f32> = m.fixed_view::<3, 3>(0, 0).into_owned();
    let scale = Vector3::new(
        linear.column(0).norm(),
        linear.column(1).norm(),
        linear.column(2).norm(),
    );

    let rotation = if scale.iter().any(|s| *s <= f32::EPSILON) {
        UnitQuaternion::identity()
    } else {
        let mut basis = linear;
        for c in 0..3 {
            let s = scale[c];
            basis.column_mut(c).unscale_mut(s);
        }
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix(&basis))
    };

    Decomposed {
        translation,
        rotation,
        scale,
    }
}

/// Root matrix of a placed track: translate, then yaw, then uniform scale.
pub fn track_root_matrix(t: &TrackTransform) -> Matrix4<f32> {
    let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), t.yaw_deg.to_radians());
    Matrix4::new_translation(&vec3(t.position))
        * rotation.to_homogeneous()
        * Matrix4::new_scaling(t.scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn local_aabb_is_none_without_vertices() {
        assert!(MeshNode::new("empty").local_aabb().is_none());
    }

    #[test]
    fn world_aabb_follows_root_scale_and_offset() {
        let node = MeshNode::cuboid("box", Vector3::new(1.0, 2.0, 3.0))
            .with_transform(Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0)));
        let root = track_root_matrix(&TrackTransform {
            scale: 2.0,
            yaw_deg: 0.0,
            position: [0.0, 5.0, 0.0],
        });

        let aabb = node.world_aabb(&root).unwrap();
        assert_relative_eq!(aabb.mins, Point3::new(18.0, 1.0, -6.0), epsilon = 1.0e-4);
        assert_relative_eq!(aabb.maxs, Point3::new(22.0, 9.0, 6.0), epsilon = 1.0e-4);
    }

    #[test]
    fn yawed_root_swaps_horizontal_extents() {
        let node = MeshNode::cuboid("wall", Vector3::new(4.0, 1.0, 0.5));
        let root = track_root_matrix(&TrackTransform {
            yaw_deg: 90.0,
            ..TrackTransform::default()
        });
        let e = node.world_aabb(&root).unwrap().extents();
        assert_relative_eq!(e, Vector3::new(1.0, 2.0, 8.0), epsilon = 1.0e-4);
    }

    #[test]
    fn decompose_recovers_scale_and_rotation() {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);
        let m = Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0))
            * rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 3.0, 4.0));

        let d = decompose(&m);
        assert_relative_eq!(d.translation, Vector3::new(1.0, 2.0, 3.0), epsilon = 1.0e-5);
        assert_relative_eq!(d.scale, Vector3::new(2.0, 3.0, 4.0), epsilon = 1.0e-5);
        assert!(d.rotation.angle_to(&rotation) < 1.0e-4);
    }

    #[test]
    fn triangles_fill_in_sequential_indices() {
        let node = MeshNode::new("tri").with_geometry(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)],
            Vec::new(),
        );
        assert_eq!(node.triangles().unwrap(), vec![[0, 1, 2]]);
    }

    #[test]
    fn triangles_reject_short_and_out_of_range_buffers() {
        let pts = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        let short = MeshNode::new("short").with_geometry(pts.clone(), vec![0, 1]);
        assert!(matches!(short.triangles(), Err(Error::DegenerateMesh { .. })));

        let bad = MeshNode::new("bad").with_geometry(pts, vec![0, 1, 7]);
        assert!(matches!(bad.triangles(), Err(Error::DegenerateMesh { .. })));

        assert!(MeshNode::new("none").triangles().is_err());
    }
}
