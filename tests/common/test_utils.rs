use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use hero_ngin::{
    camera::PerspectiveCamera,
    data_structures::scene_graph::Scene,
    driver::{Animate, FramePass, FrameSink},
    error::SceneResult,
    flow::{HeroFlow, Out},
    input::PointerEvent,
    lifecycle::{DisposeReport, EventKind, Listeners},
    resources::{AssetLoader, AssetSource},
    transition::{CoverStyle, CoverSurface, Navigator, TitleMarkers},
};

/// One recorded pass: label and how many meshes it would draw.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub label: &'static str,
    pub meshes: usize,
}

/// Frame sink that only counts what each pass would draw.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<DrawCall>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.calls.iter().map(|call| call.label).collect()
    }
}

impl FrameSink for RecordingSink {
    fn draw(&mut self, scene: &Scene, pass: &FramePass) -> SceneResult<()> {
        let meshes = scene
            .meshes()
            .filter(|mesh| mesh.visible && mesh.layers.intersects(pass.layers))
            .count();
        self.calls.push(DrawCall {
            label: pass.label,
            meshes,
        });
        Ok(())
    }
}

/// Shared view into what the fake collaborators saw.
#[derive(Debug, Default)]
pub struct Recorded {
    pub styles: Vec<CoverStyle>,
    pub visits: Vec<String>,
    pub hovered: Vec<bool>,
}

pub type Record = Rc<RefCell<Recorded>>;

pub struct FakeCover {
    pub record: Record,
    pub mounted: bool,
}

impl CoverSurface for FakeCover {
    fn exists(&self) -> bool {
        self.mounted
    }

    fn apply(&mut self, style: &CoverStyle) {
        self.record.borrow_mut().styles.push(*style);
    }
}

pub struct FakeNavigator {
    pub record: Record,
}

impl Navigator for FakeNavigator {
    fn navigate(&mut self, destination: &str) {
        self.record.borrow_mut().visits.push(destination.to_string());
    }
}

pub struct FakeTitles {
    pub record: Record,
}

impl TitleMarkers for FakeTitles {
    fn set_hover(&mut self, hovered: bool) {
        self.record.borrow_mut().hovered.push(hovered);
    }
}

pub fn fakes() -> (Record, FakeCover, FakeNavigator, FakeTitles) {
    let record = Record::default();
    (
        record.clone(),
        FakeCover {
            record: record.clone(),
            mounted: true,
        },
        FakeNavigator {
            record: record.clone(),
        },
        FakeTitles { record },
    )
}

/// Minimal flow that counts what happens to it.
pub struct TestFlow {
    pub name: &'static str,
    pub scene: Scene,
    pub links: Vec<String>,
    pub clicks: Rc<Cell<u32>>,
    pub teardowns: Rc<Cell<u32>>,
    listeners: Listeners,
}

impl TestFlow {
    pub fn new(name: &'static str, teardowns: Rc<Cell<u32>>) -> Self {
        Self {
            name,
            scene: Scene::new(PerspectiveCamera::new(50.0, 1.0, 0.1, 10.0)),
            links: Vec::new(),
            clicks: Rc::default(),
            teardowns,
            listeners: Listeners::with(&[EventKind::Click, EventKind::PointerMove]),
        }
    }

    pub fn with_link(mut self, path: &str) -> Self {
        self.links.push(path.to_string());
        self
    }
}

impl Animate for TestFlow {
    fn time_step(&self) -> f32 {
        0.01
    }

    fn time_uniforms(&self) -> &'static [&'static str] {
        &[]
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn advance(&mut self, _time: f32, _dt: f32) -> SceneResult<()> {
        Ok(())
    }
}

impl HeroFlow for TestFlow {
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_click(&mut self, _event: &PointerEvent) -> SceneResult<Out> {
        self.clicks.set(self.clicks.get() + 1);
        Ok(Out::Open(0))
    }

    fn link(&self, index: usize) -> Option<String> {
        self.links.get(index).cloned()
    }

    fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    fn teardown(&mut self) -> DisposeReport {
        self.teardowns.set(self.teardowns.get() + 1);
        let report = DisposeReport {
            listeners: self.listeners.remove_all(),
            ..Default::default()
        };
        report.merge(self.scene.dispose())
    }
}

pub fn memory_loader(files: Vec<(&str, Vec<u8>)>) -> AssetLoader {
    AssetLoader::in_memory(AssetSource::memory(files))
}

/// A `.glb` with one root node per `(name, positions)` pair. Positions are
/// flat xyz triples; each node gets its own triangle-list mesh.
pub fn glb(nodes: &[(&str, &[f32])]) -> Vec<u8> {
    let mut bin: Vec<u8> = Vec::new();
    let mut json_nodes = Vec::new();
    let mut meshes = Vec::new();
    let mut views = Vec::new();
    let mut accessors = Vec::new();

    for (index, (name, positions)) in nodes.iter().enumerate() {
        let offset = bin.len();
        for value in positions.iter() {
            bin.extend_from_slice(&value.to_le_bytes());
        }
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for vertex in positions.chunks_exact(3) {
            for axis in 0..3 {
                min[axis] = min[axis].min(vertex[axis]);
                max[axis] = max[axis].max(vertex[axis]);
            }
        }
        json_nodes.push(serde_json::json!({ "name": name, "mesh": index }));
        meshes.push(serde_json::json!({
            "primitives": [{ "attributes": { "POSITION": index } }]
        }));
        views.push(serde_json::json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": positions.len() * 4,
        }));
        accessors.push(serde_json::json!({
            "bufferView": index,
            "componentType": 5126,
            "count": positions.len() / 3,
            "type": "VEC3",
            "min": min,
            "max": max,
        }));
    }

    let document = serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": (0..nodes.len()).collect::<Vec<_>>() }],
        "nodes": json_nodes,
        "meshes": meshes,
        "buffers": [{ "byteLength": bin.len() }],
        "bufferViews": views,
        "accessors": accessors,
    });
    let mut json = serde_json::to_vec(&document).unwrap();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(&bin);
    out
}

/// A single triangle's worth of positions, shifted by `x`.
pub fn triangle(x: f32) -> Vec<f32> {
    vec![x, 0.0, 0.0, x + 1.0, 0.0, 0.0, x, 1.0, 0.0]
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height))
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
