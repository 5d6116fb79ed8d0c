//! The hero scenes. Each one builds its scene graph, drives its uniforms and
//! implements [`crate::flow::HeroFlow`] so it can be mounted on a route.

pub mod gallery;
pub mod lines;
pub mod morph;
