//! GLTF decoding into plain vertex data.
//!
//! Only what the scenes consume is kept: positions, normals and indices of
//! every triangle primitive, plus the node's name and local transform.
//! Materials, textures and animations in the file are ignored.

use crate::{data_structures::instance::Instance, resources::texture::load_binary};

#[derive(Clone, Debug, PartialEq)]
pub struct ModelMesh {
    pub name: String,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Option<Vec<u32>>,
    pub translation: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    /// Direct child of the GLTF scene root.
    pub root: bool,
}

impl ModelMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn local(&self) -> Instance {
        let [x, y, z, w] = self.rotation;
        Instance {
            position: self.translation.into(),
            rotation: cgmath::Quaternion::new(w, x, y, z),
            scale: self.scale.into(),
        }
    }
}

/// Decodes a `.glb`/`.gltf` document. External buffers are fetched relative
/// to the asset root.
pub async fn load_model_gltf(bytes: &[u8]) -> anyhow::Result<Vec<ModelMesh>> {
    let gltf = gltf::Gltf::from_slice(bytes)?;

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("glb binary chunk missing"))?;
                buffer_data.push(blob.into());
            }
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(load_binary(uri).await?);
            }
        }
    }

    let mut meshes = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            collect_node(&node, true, &buffer_data, &mut meshes);
        }
    }
    Ok(meshes)
}

fn collect_node(node: &gltf::Node, root: bool, buffers: &[Vec<u8>], out: &mut Vec<ModelMesh>) {
    if let Some(mesh) = node.mesh() {
        let (translation, rotation, scale) = node.transform().decomposed();
        let name = node
            .name()
            .or(mesh.name())
            .unwrap_or_default()
            .to_string();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("skipping non-triangle primitive in {}", name);
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let positions: Vec<f32> = match reader.read_positions() {
                Some(positions) => positions.flatten().collect(),
                None => continue,
            };
            let normals = reader
                .read_normals()
                .map(|normals| normals.flatten().collect())
                .unwrap_or_default();
            let indices = reader
                .read_indices()
                .map(|indices| indices.into_u32().collect());
            out.push(ModelMesh {
                name: name.clone(),
                positions,
                normals,
                indices,
                translation,
                rotation,
                scale,
                root,
            });
        }
    }
    for child in node.children() {
        collect_node(&child, false, buffers, out);
    }
}
