//! hero-ngin
//!
//! Animated hero scenes and page transitions for a portfolio site, running
//! natively and on the web through wgpu. Each page mounts one scene: a line
//! field displaced by a depth pre-pass, a morphing point cloud or an image
//! gallery. Navigation between pages hides behind an animated cover.
//!
//! High-level modules
//! - `scenes`: the three hero scenes
//! - `data_structures`: scene graph, geometry, materials, GPU textures
//! - `uniforms`: named shader parameters and colour helpers
//! - `driver`: per-frame time accumulation and render passes
//! - `input`, `raycast`: pointer mapping, hover tracking and picking
//! - `transition`, `tween`: the page transition state machine and its tweens
//! - `lifecycle`, `resources`: teardown bookkeeping and async asset loading
//! - `context`, `render`, `pipelines`: wgpu setup, scene upload and drawing
//! - `flow`, `platform`, `site`: event loop, host collaborators and routes
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod driver;
pub mod error;
pub mod flow;
pub mod input;
pub mod lifecycle;
pub mod pipelines;
pub mod platform;
pub mod raycast;
pub mod render;
pub mod resources;
pub mod scenes;
pub mod site;
pub mod transition;
pub mod tween;
pub mod uniforms;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use error::{SceneError, SceneResult};
pub use wgpu;
pub use winit::window::CursorIcon;
