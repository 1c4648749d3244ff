//! Mesh source used by the simulator: `demo:track` / `demo:car` build
//! procedural meshes, anything else is read as glTF.

use std::path::Path;

use log::debug;
use nalgebra::{Matrix4, Point3};
use physics::{Error, LoadedModel, MeshNode, MeshSource, Result};

use crate::demo;

pub const DEMO_TRACK: &str = "demo:track";
pub const DEMO_CAR: &str = "demo:car";

pub struct SimSource;

impl MeshSource for SimSource {
    fn load(&self, path: &Path) -> Result<LoadedModel> {
        match path.to_str() {
            Some(DEMO_TRACK) => Ok(LoadedModel::new(demo::track())),
            Some(DEMO_CAR) => Ok(LoadedModel::new(demo::car())),
            _ => load_gltf(path),
        }
    }
}

fn load_error(path: &Path, reason: impl ToString) -> Error {
    Error::Load {
        path: path.to_owned(),
        reason: reason.to_string(),
    }
}

/// Flatten every mesh primitive of the default scene into [`MeshNode`]s with
/// model-space transforms and the node ancestor names.
pub fn load_gltf(path: &Path) -> Result<LoadedModel> {
    let (document, buffers, _images) = gltf::import(path).map_err(|e| load_error(path, e))?;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| load_error(path, "file has no scene"))?;

    let mut nodes = Vec::new();
    let mut ancestors = Vec::new();
    for node in scene.nodes() {
        visit(&node, &Matrix4::identity(), &mut ancestors, &buffers, &mut nodes);
    }
    debug!("{}: {} mesh primitives", path.display(), nodes.len());
    Ok(LoadedModel::new(nodes))
}

fn visit(
    node: &gltf::Node,
    parent: &Matrix4<f32>,
    ancestors: &mut Vec<String>,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshNode>,
) {
    let world = parent * Matrix4::from(node.transform().matrix());
    let name = node
        .name()
        .or_else(|| node.mesh().and_then(|m| m.name()))
        .unwrap_or("unnamed")
        .to_owned();

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| &d.0[..]));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<Point3<f32>> = positions.map(Point3::from).collect();
            let indices: Vec<u32> = reader
                .read_indices()
                .map(|i| i.into_u32().collect())
                .unwrap_or_default();

            out.push(
                MeshNode::new(name.clone())
                    .with_ancestors(ancestors.iter().rev())
                    .with_transform(world)
                    .with_geometry(positions, indices),
            );
        }
    }

    ancestors.push(name);
    for child in node.children() {
        visit(&child, &world, ancestors, buffers, out);
    }
    ancestors.pop();
}
