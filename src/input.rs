//! Pointer normalisation and hover bookkeeping.
//!
//! Pixel positions are mapped into normalized device coordinates with y up,
//! optionally rescaled into a shader's own domain. Hover tracking turns the
//! raw intersection list of every pointer move into start/end notifications.

use std::collections::BTreeMap;

use cgmath::Vector2;
use winit::window::CursorIcon;

use crate::{data_structures::scene_graph::MeshId, raycast::Intersection};

/// Canvas bounds in client (CSS) pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl CanvasRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn contains(&self, point: [f32; 2]) -> bool {
        point[0] >= self.left
            && point[0] <= self.left + self.width
            && point[1] >= self.top
            && point[1] <= self.top + self.height
    }

    pub fn centre(&self) -> [f32; 2] {
        [
            self.left + self.width * 0.5,
            self.top + self.height * 0.5,
        ]
    }
}

pub fn to_ndc(client: [f32; 2], rect: &CanvasRect) -> Vector2<f32> {
    let x = (client[0] - rect.left) / rect.width.max(f32::EPSILON);
    let y = (client[1] - rect.top) / rect.height.max(f32::EPSILON);
    Vector2::new(x * 2.0 - 1.0, -y * 2.0 + 1.0)
}

pub fn from_ndc(ndc: Vector2<f32>, rect: &CanvasRect) -> [f32; 2] {
    [
        rect.left + (ndc.x + 1.0) * 0.5 * rect.width,
        rect.top + (1.0 - ndc.y) * 0.5 * rect.height,
    ]
}

/// Linear map from device coordinates into a shader's pointer domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShaderDomain {
    pub scale: f32,
    pub shift: f32,
}

impl ShaderDomain {
    pub const IDENTITY: ShaderDomain = ShaderDomain {
        scale: 1.0,
        shift: 0.0,
    };
    pub const MORPH: ShaderDomain = ShaderDomain {
        scale: 4.5,
        shift: 0.5,
    };

    pub fn apply(&self, ndc: Vector2<f32>) -> Vector2<f32> {
        Vector2::new(ndc.x * self.scale + self.shift, ndc.y * self.scale + self.shift)
    }
}

/// Navigation chrome drawn over the canvas. Pointer input over it must not
/// reach the scenes.
pub trait Chrome {
    fn contains(&self, point: [f32; 2]) -> bool;
}

#[derive(Clone, Debug, Default)]
pub struct ChromeRegions(pub Vec<CanvasRect>);

impl Chrome for ChromeRegions {
    fn contains(&self, point: [f32; 2]) -> bool {
        self.0.iter().any(|rect| rect.contains(point))
    }
}

/// One pointer sample as the scenes see it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub client: [f32; 2],
    pub rect: CanvasRect,
    pub over_chrome: bool,
}

impl PointerEvent {
    pub fn new(client: [f32; 2], rect: CanvasRect) -> Self {
        Self {
            client,
            rect,
            over_chrome: false,
        }
    }

    pub fn over_chrome(mut self, over: bool) -> Self {
        self.over_chrome = over;
        self
    }

    pub fn ndc(&self) -> Vector2<f32> {
        to_ndc(self.client, &self.rect)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HoverUpdate {
    pub started: Vec<MeshId>,
    pub ended: Vec<MeshId>,
    pub cursor: Option<CursorIcon>,
}

/// Per-mesh hover episodes keyed by a stable id.
#[derive(Clone, Debug, Default)]
pub struct HoverTracker {
    hovered: BTreeMap<MeshId, Intersection>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the hits of one pointer move.
    ///
    /// Meshes that dropped out of `hits` end their episode, except while the
    /// pointer sits over chrome: then the entry is kept so the end is reported
    /// once the pointer leaves the chrome.
    pub fn update(&mut self, hits: &[Intersection], over_chrome: bool) -> HoverUpdate {
        let mut update = HoverUpdate::default();

        let gone: Vec<MeshId> = self
            .hovered
            .keys()
            .filter(|id| !hits.iter().any(|hit| hit.mesh == **id))
            .copied()
            .collect();
        if !gone.is_empty() {
            update.cursor = Some(CursorIcon::Default);
        }
        if !over_chrome {
            for id in gone {
                self.hovered.remove(&id);
                update.ended.push(id);
            }
        }

        for hit in hits {
            update.cursor = Some(CursorIcon::Pointer);
            if !self.hovered.contains_key(&hit.mesh) {
                update.started.push(hit.mesh);
            }
            self.hovered.insert(hit.mesh, hit.clone());
        }
        update
    }

    pub fn is_hovered(&self, id: MeshId) -> bool {
        self.hovered.contains_key(&id)
    }

    pub fn last_hit(&self, id: MeshId) -> Option<&Intersection> {
        self.hovered.get(&id)
    }

    /// Forgets every episode without reporting it.
    pub fn clear(&mut self) -> usize {
        let cleared = self.hovered.len();
        self.hovered.clear();
        cleared
    }

    pub fn len(&self) -> usize {
        self.hovered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hovered.is_empty()
    }
}
