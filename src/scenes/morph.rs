//! Morphing point cloud.
//!
//! Each root mesh of the models file contributes one position set. The sets
//! are padded to a common length and cached; the points geometry references
//! two of them at a time (`position` and `aPositionTarget`) and the shader
//! interpolates by `uProgress`.

use cgmath::Vector2;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    camera::PerspectiveCamera,
    config::{MorphConfig, Viewport},
    data_structures::{
        geometry::{Attribute, Geometry},
        material::{Program, ShaderMaterial},
        scene_graph::{GeometryId, MaterialId, Mesh, MeshId, Scene},
    },
    driver::Animate,
    error::{SceneError, SceneResult},
    flow::{HeroFlow, Out},
    input::PointerEvent,
    lifecycle::{DisposeReport, EventKind, Listeners},
    resources::{Asset, AssetKind, AssetLoader, LoadId, mesh::ModelMesh},
    uniforms::{UniformSet, UniformValue, colour_from_hex},
};

/// Pads every set to the longest one by wrapping around its own vertices.
/// Empty sets are dropped. Returns the common vertex count and the sets.
pub fn pad_positions(sets: &[&[f32]]) -> (usize, Vec<Vec<f32>>) {
    let usable: Vec<&[f32]> = sets
        .iter()
        .copied()
        .filter(|set| set.len() >= 3)
        .collect();
    let max_count = usable.iter().map(|set| set.len() / 3).max().unwrap_or(0);
    let padded = usable
        .into_iter()
        .map(|original| {
            let len = original.len() - original.len() % 3;
            let mut out = vec![0.0; max_count * 3];
            for i in 0..max_count {
                let i3 = i * 3;
                let src = i3 % len;
                out[i3..i3 + 3].copy_from_slice(&original[src..src + 3]);
            }
            out
        })
        .collect();
    (max_count, padded)
}

/// Tunables, clamped to the ranges the debug panel allowed.
#[derive(Clone, Debug, PartialEq)]
pub struct MorphParams {
    pub progress: f32,
    pub size: f32,
    pub morph_duration: f32,
    pub morph_merge_size: f32,
    pub color1: [f32; 3],
    pub color2: [f32; 3],
}

pub struct MorphScene {
    config: MorphConfig,
    viewport: Viewport,
    scene: Scene,
    loader: AssetLoader,
    models_load: Option<LoadId>,
    rng: StdRng,
    params: MorphParams,
    positions: Vec<Attribute>,
    max_count: usize,
    index: usize,
    target_index: usize,
    mouse: Vector2<f32>,
    points: Option<MeshId>,
    geometry: Option<GeometryId>,
    material: Option<MaterialId>,
    listeners: Listeners,
}

impl MorphScene {
    pub fn new(config: MorphConfig, viewport: Viewport, mut loader: AssetLoader) -> SceneResult<Self> {
        let params = MorphParams {
            progress: config.progress.clamp(0.0, 1.0),
            size: config.size.clamp(0.1, 5.0),
            morph_duration: config.morph_duration.clamp(0.1, 1.0),
            morph_merge_size: config.morph_merge_size.clamp(0.01, 1.0),
            color1: colour_from_hex(&config.color1)?,
            color2: colour_from_hex(&config.color2)?,
        };
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let scene = Scene::new(PerspectiveCamera::from_config(&config.camera, viewport.aspect()));
        let models_load = Some(loader.load(&config.models_path, AssetKind::Model));

        Ok(Self {
            index: config.index,
            target_index: config.target_index,
            config,
            viewport,
            scene,
            loader,
            models_load,
            rng,
            params,
            positions: Vec::new(),
            max_count: 0,
            mouse: Vector2::new(0.0, 0.0),
            points: None,
            geometry: None,
            material: None,
            listeners: Listeners::with(&[EventKind::PointerMove, EventKind::Click, EventKind::Resize]),
        })
    }

    pub fn params(&self) -> &MorphParams {
        &self.params
    }

    pub fn indices(&self) -> (usize, usize) {
        (self.index, self.target_index)
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    pub fn position_sets(&self) -> &[Attribute] {
        &self.positions
    }

    pub fn points(&self) -> Option<MeshId> {
        self.points
    }

    pub fn material(&self) -> Option<MaterialId> {
        self.material
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.and_then(|id| self.scene.geometry(id))
    }

    pub fn is_loaded(&self) -> bool {
        self.points.is_some()
    }

    /// Builds the points from the root meshes of a decoded models file.
    pub fn on_model(&mut self, meshes: &[ModelMesh]) {
        let sets: Vec<&[f32]> = meshes
            .iter()
            .filter(|mesh| mesh.root)
            .map(|mesh| mesh.positions.as_slice())
            .collect();
        self.set_position_sets(&sets);
    }

    pub fn set_position_sets(&mut self, sets: &[&[f32]]) {
        if self.points.is_some() {
            log::warn!("morph positions already loaded, ignoring a second set");
            return;
        }
        let (max_count, padded) = pad_positions(sets);
        if padded.is_empty() {
            log::warn!("{} holds no position sets, morph scene stays empty", self.config.models_path);
            return;
        }
        self.max_count = max_count;
        self.positions = padded
            .into_iter()
            .map(|set| Attribute::from_vec(set, 3))
            .collect();

        let last = self.positions.len() - 1;
        if self.index > last || self.target_index > last {
            log::warn!(
                "morph indices ({}, {}) exceed {} position sets, clamping",
                self.index,
                self.target_index,
                self.positions.len()
            );
        }
        self.index = self.index.min(last);
        self.target_index = self.target_index.min(last);

        let sizes: Vec<f32> = (0..max_count).map(|_| self.rng.r#gen::<f32>()).collect();
        let mut geometry = Geometry::new();
        geometry.set_attribute("position", self.positions[self.index].clone());
        geometry.set_attribute("aPositionTarget", self.positions[self.target_index].clone());
        geometry.set_attribute("aSize", Attribute::from_vec(sizes, 1));

        let resolution = [
            self.viewport.width * self.viewport.pixel_ratio,
            self.viewport.height * self.viewport.pixel_ratio,
        ];
        let uniforms = UniformSet::new()
            .with("uProgress", UniformValue::Float(self.params.progress))
            .with("uSize", UniformValue::Float(self.params.size))
            .with("uResolution", UniformValue::Vec2(resolution))
            .with("uMorphMergeSize", UniformValue::Float(self.params.morph_merge_size))
            .with("uMorphDuration", UniformValue::Float(self.params.morph_duration))
            .with("uMouse", UniformValue::Vec2(self.mouse.into()))
            .with("uTime", UniformValue::Float(0.0))
            .with("uColor1", UniformValue::Vec3(self.params.color1))
            .with("uColor2", UniformValue::Vec3(self.params.color2));
        let material = ShaderMaterial::new(Program::MorphPoints, uniforms)
            .additive()
            .without_depth_test();

        let geometry = self.scene.add_geometry(geometry);
        let material = self.scene.add_material(material);
        let mut mesh = Mesh::new("points", geometry, material).points();
        mesh.frustum_culled = false;
        self.points = Some(self.scene.add_mesh(mesh));
        self.geometry = Some(geometry);
        self.material = Some(material);
        log::debug!(
            "morph points built: {} sets of {} vertices",
            self.positions.len(),
            max_count
        );
    }

    /// Points the geometry at other cached position sets. Indices are
    /// checked once the sets are loaded; before that they are remembered and
    /// clamped at load time.
    pub fn morph(&mut self, index: Option<usize>, target_index: Option<usize>) -> SceneResult<()> {
        if !self.positions.is_empty() {
            let len = self.positions.len();
            for requested in [index, target_index].into_iter().flatten() {
                if requested >= len {
                    return Err(SceneError::MorphIndexOutOfRange {
                        index: requested,
                        len,
                    });
                }
            }
        }
        if let Some(index) = index {
            self.index = index;
        }
        if let Some(target_index) = target_index {
            self.target_index = target_index;
        }

        let (Some(id), false) = (self.geometry, self.positions.is_empty()) else {
            return Ok(());
        };
        let position = self.positions[self.index].clone();
        let target = self.positions[self.target_index].clone();
        if let Some(geometry) = self.scene.geometry_mut(id) {
            geometry.set_attribute("position", position);
            geometry.set_attribute("aPositionTarget", target);
        }
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> SceneResult<()> {
        if let Some(material) = self.material.and_then(|id| self.scene.material_mut(id)) {
            material.uniforms.set(name, value)?;
        }
        Ok(())
    }

    pub fn set_progress(&mut self, progress: f32) -> SceneResult<()> {
        self.params.progress = progress.clamp(0.0, 1.0);
        self.set_uniform("uProgress", UniformValue::Float(self.params.progress))
    }

    pub fn set_size(&mut self, size: f32) -> SceneResult<()> {
        self.params.size = size.clamp(0.1, 5.0);
        self.set_uniform("uSize", UniformValue::Float(self.params.size))
    }

    pub fn set_morph_duration(&mut self, duration: f32) -> SceneResult<()> {
        self.params.morph_duration = duration.clamp(0.1, 1.0);
        self.set_uniform("uMorphDuration", UniformValue::Float(self.params.morph_duration))
    }

    pub fn set_morph_merge_size(&mut self, merge: f32) -> SceneResult<()> {
        self.params.morph_merge_size = merge.clamp(0.01, 1.0);
        self.set_uniform("uMorphMergeSize", UniformValue::Float(self.params.morph_merge_size))
    }

    pub fn set_colors(&mut self, color1: &str, color2: &str) -> SceneResult<()> {
        let (color1, color2) = (colour_from_hex(color1)?, colour_from_hex(color2)?);
        self.params.color1 = color1;
        self.params.color2 = color2;
        self.set_uniform("uColor1", UniformValue::Vec3(color1))?;
        self.set_uniform("uColor2", UniformValue::Vec3(color2))
    }

    pub fn clear_colour(&self) -> SceneResult<wgpu::Color> {
        let [r, g, b] = colour_from_hex(&self.config.clear_color)?;
        Ok(wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: self.config.clear_alpha.clamp(0.0, 1.0) as f64,
        })
    }

    /// Clear colour of the canvas, applied through the context.
    pub fn set_clear_color(&mut self, hex: &str) -> SceneResult<Out> {
        colour_from_hex(hex)?;
        self.config.clear_color = hex.to_string();
        let colour = self.clear_colour()?;
        Ok(Out::Configure(Box::new(move |ctx| ctx.clear_colour = colour)))
    }

    fn drain_loads(&mut self) {
        for loaded in self.loader.drain() {
            if Some(loaded.id) != self.models_load {
                continue;
            }
            self.models_load = None;
            match loaded.result {
                Ok(Asset::Model(meshes)) => self.on_model(&meshes),
                Ok(_) => log::warn!("{} is not a model", loaded.path),
                Err(err) => log::warn!(
                    "could not load {}: {:#}, morph scene stays empty",
                    loaded.path,
                    err
                ),
            }
        }
    }
}

impl Animate for MorphScene {
    fn time_step(&self) -> f32 {
        self.config.time_step
    }

    fn time_uniforms(&self) -> &'static [&'static str] {
        &["uTime"]
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn advance(&mut self, time: f32, _dt: f32) -> SceneResult<()> {
        self.drain_loads();
        if let Some(points) = self.points.and_then(|id| self.scene.mesh_mut(id)) {
            points.local.set_euler(0.0, (time * 0.1).sin() * 0.5, 0.0);
        }
        Ok(())
    }
}

impl HeroFlow for MorphScene {
    fn name(&self) -> &'static str {
        "morphing"
    }

    fn on_init(&mut self) -> SceneResult<Out> {
        let clear = self.config.clear_color.clone();
        self.set_clear_color(&clear)
    }

    fn on_pointer_move(&mut self, event: &PointerEvent) -> SceneResult<Out> {
        self.mouse = self.config.domain.apply(event.ndc());
        self.set_uniform("uMouse", UniformValue::Vec2(self.mouse.into()))?;
        Ok(Out::Empty)
    }

    fn on_resize(&mut self, viewport: Viewport) -> SceneResult<Out> {
        self.viewport = viewport;
        self.set_uniform(
            "uResolution",
            UniformValue::Vec2([
                viewport.width * viewport.pixel_ratio,
                viewport.height * viewport.pixel_ratio,
            ]),
        )?;
        self.scene.camera.resize(viewport.width, viewport.height);
        Ok(Out::Empty)
    }

    fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    fn teardown(&mut self) -> DisposeReport {
        let report = DisposeReport {
            listeners: self.listeners.remove_all(),
            cancelled_loads: self.loader.cancel_all(),
            ..Default::default()
        };
        self.models_load = None;
        self.points = None;
        self.geometry = None;
        self.material = None;
        self.positions.clear();
        report.merge(self.scene.dispose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_wraps_shorter_sets() {
        let long = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
        let short = [5.0, 6.0, 7.0];
        let (count, padded) = pad_positions(&[&long, &short, &[]]);
        assert_eq!(count, 3);
        assert_eq!(padded.len(), 2);
        assert_eq!(padded[0], long.to_vec());
        assert_eq!(padded[1], vec![5.0, 6.0, 7.0, 5.0, 6.0, 7.0, 5.0, 6.0, 7.0]);
    }
}
