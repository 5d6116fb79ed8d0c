//! Scene data: geometry, materials, transforms, the scene graph that ties
//! them together and the GPU textures they end up in.
//!
//! - `geometry` holds named vertex attributes and plane construction
//! - `material` pairs a shader program with its uniforms and raster state
//! - `instance` is the local/world transform of groups and meshes
//! - `scene_graph` owns everything a single hero scene draws
//! - `texture` wraps GPU textures and the offscreen render target

pub mod geometry;
pub mod instance;
pub mod material;
pub mod scene_graph;
pub mod texture;
