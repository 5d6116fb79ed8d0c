//! Line field hero: 150 thin strips displaced by the depth of a skull.
//!
//! Every frame the skull is rendered from a close depth camera into an
//! offscreen target; the strip shader samples that depth texture to bend the
//! lines around the silhouette. Pointer motion turns the skull and the strip
//! group, clicks pulse a noise term and the wheel pushes the skull away.

use cgmath::{Point3, Vector2};

use crate::{
    camera::PerspectiveCamera,
    config::{LinesConfig, Viewport},
    data_structures::{
        geometry::{Attribute, Geometry},
        instance::Instance,
        material::{Program, ShaderMaterial},
        scene_graph::{GroupId, Layers, Light, MaterialId, Mesh, MeshId, Scene},
    },
    driver::{Animate, FramePass},
    error::SceneResult,
    flow::{HeroFlow, Out},
    input::PointerEvent,
    lifecycle::{DisposeReport, EventKind, Listeners},
    resources::{Asset, AssetKind, AssetLoader, LoadId, mesh::ModelMesh},
    tween::{Ease, Tweens},
    uniforms::{TextureSlot, UniformSet, UniformValue, colour_from_hex},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineProp {
    SkullX,
    SkullY,
    GroupX,
    GroupY,
    Noise,
}

pub struct LinesScene {
    config: LinesConfig,
    viewport: Viewport,
    scene: Scene,
    loader: AssetLoader,
    skull_load: Option<LoadId>,
    skull: Option<MeshId>,
    group: Option<GroupId>,
    material: Option<MaterialId>,
    strips: Vec<MeshId>,
    mouse: Vector2<f32>,
    skull_rotation: [f32; 3],
    group_rotation: [f32; 2],
    tweens: Tweens<LineProp>,
    listeners: Listeners,
}

impl LinesScene {
    pub fn new(config: LinesConfig, viewport: Viewport, mut loader: AssetLoader) -> Self {
        let mut scene = Scene::new(PerspectiveCamera::from_config(&config.camera, viewport.aspect()));
        scene.depth_camera = Some(PerspectiveCamera::from_config(
            &config.depth_camera,
            viewport.aspect(),
        ));
        scene.request_depth_target();
        scene.lights = vec![
            Light::Ambient {
                color: [1.0, 1.0, 1.0],
                intensity: 0.1,
                position: [0.0, 0.0, -1.0],
            },
            Light::Directional {
                color: [1.0, 1.0, 1.0],
                intensity: 1.0,
                position: [0.0, 0.0, 1.0],
            },
        ];
        let skull_load = Some(loader.load(&config.skull_path, AssetKind::Model));

        Self {
            config,
            viewport,
            scene,
            loader,
            skull_load,
            skull: None,
            group: None,
            material: None,
            strips: Vec::new(),
            mouse: Vector2::new(0.0, 0.0),
            skull_rotation: [0.0, 0.0, 0.0],
            group_rotation: [0.0, 0.0],
            tweens: Tweens::new(),
            listeners: Listeners::with(&[
                EventKind::PointerMove,
                EventKind::Click,
                EventKind::Wheel,
                EventKind::Resize,
            ]),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn skull(&self) -> Option<MeshId> {
        self.skull
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub fn material(&self) -> Option<MaterialId> {
        self.material
    }

    pub fn strips(&self) -> &[MeshId] {
        &self.strips
    }

    pub fn mouse(&self) -> Vector2<f32> {
        self.mouse
    }

    pub fn is_tweening(&self) -> bool {
        !self.tweens.is_empty()
    }

    /// Adds the skull from the decoded model, when it holds the configured
    /// node, and then the strips. Without a skull the strips still appear.
    pub fn on_model(&mut self, meshes: &[ModelMesh]) -> SceneResult<()> {
        match meshes.iter().find(|m| m.name == self.config.skull_node) {
            Some(model) => self.add_skull(model)?,
            None => log::warn!(
                "{} has no node named {}, showing the lines alone",
                self.config.skull_path,
                self.config.skull_node
            ),
        }
        self.add_lines();
        Ok(())
    }

    fn add_skull(&mut self, model: &ModelMesh) -> SceneResult<()> {
        let mut geometry = Geometry::new();
        let normals = if model.normals.len() == model.positions.len() {
            model.normals.clone()
        } else {
            [0.0, 0.0, 1.0].repeat(model.vertex_count())
        };
        geometry.set_attribute("position", Attribute::from_vec(model.positions.clone(), 3));
        geometry.set_attribute("normal", Attribute::from_vec(normals, 3));
        if let Some(indices) = &model.indices {
            geometry.set_index(indices.clone());
        }

        let uniforms = UniformSet::new()
            .with("color", UniformValue::Vec3(colour_from_hex("#000000")?))
            .with("roughness", UniformValue::Float(0.5))
            .with("metalness", UniformValue::Float(1.0))
            .with("clearcoat", UniformValue::Float(1.0))
            .with("clearcoatRoughness", UniformValue::Float(1.0))
            .with("reflectivity", UniformValue::Float(1.0))
            .with("opacity", UniformValue::Float(1.0));
        let material = ShaderMaterial::new(Program::Physical, uniforms).transparent();

        let mut local = model.local();
        local.position.y = self.config.skull_position[1];
        local.position.z = self.config.skull_position[2];
        let euler = cgmath::Euler::from(local.rotation);
        self.skull_rotation = [euler.x.0, euler.y.0, euler.z.0];

        let geometry = self.scene.add_geometry(geometry);
        let material = self.scene.add_material(material);
        let skull = self.scene.add_mesh(
            Mesh::new(model.name.clone(), geometry, material)
                .at(local)
                .on_layers(Layers::MAIN.with(Layers::DEPTH)),
        );
        self.skull = Some(skull);
        Ok(())
    }

    fn add_lines(&mut self) {
        if self.group.is_some() {
            return;
        }
        let depth = self.scene.depth_camera.as_ref().unwrap_or(&self.scene.camera);
        let uniforms = UniformSet::new()
            .with("uTime", UniformValue::Float(0.0))
            .with("uMouse", UniformValue::Vec2(self.mouse.into()))
            .with("uDepths", UniformValue::Texture(Some(TextureSlot::DepthTarget)))
            .with("uCameraNear", UniformValue::Float(depth.near))
            .with("uCameraFar", UniformValue::Float(depth.far))
            .with("uNoise", UniformValue::Float(0.0));
        let material = self.scene.add_material(
            ShaderMaterial::new(Program::LineField, uniforms)
                .transparent()
                .double_sided(),
        );

        let group = self
            .scene
            .add_group(Instance::new().with_scale(1.0, -1.0, 1.0));
        let count = self.config.line_count;
        for i in 0..count {
            let row = i as f32 / count as f32;
            let mut geometry = Geometry::plane(
                self.config.line_width,
                self.config.line_height,
                self.config.width_segments,
                1,
            );
            let vertices = geometry.vertex_count();
            geometry.set_attribute("y", Attribute::from_vec(vec![row; vertices], 1));
            let geometry = self.scene.add_geometry(geometry);
            let y = self.config.spread * 0.5 - row * self.config.spread;
            let strip = self.scene.add_mesh(
                Mesh::new(format!("line {}", i), geometry, material)
                    .in_group(group)
                    .at(Instance::at(0.0, y, 0.0)),
            );
            self.strips.push(strip);
        }
        self.group = Some(group);
        self.material = Some(material);
        log::debug!("line field built with {} strips", count);
    }

    fn drain_loads(&mut self) -> SceneResult<()> {
        for loaded in self.loader.drain() {
            if Some(loaded.id) != self.skull_load {
                continue;
            }
            self.skull_load = None;
            match loaded.result {
                Ok(Asset::Model(meshes)) => self.on_model(&meshes)?,
                Ok(_) => log::warn!("{} is not a model", loaded.path),
                Err(err) => {
                    log::warn!("could not load {}: {:#}, showing the lines alone", loaded.path, err);
                    self.add_lines();
                }
            }
        }
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> SceneResult<()> {
        if let Some(material) = self.material.and_then(|id| self.scene.material_mut(id)) {
            material.uniforms.set(name, value)?;
        }
        Ok(())
    }

    fn apply_rotations(&mut self) {
        let [sx, sy, sz] = self.skull_rotation;
        if let Some(skull) = self.skull.and_then(|id| self.scene.mesh_mut(id)) {
            skull.local.set_euler(sx, sy, sz);
        }
        let [gx, gy] = self.group_rotation;
        if let Some(group) = self.group.and_then(|id| self.scene.group_mut(id)) {
            group.local.set_euler(gx, gy, 0.0);
        }
    }

    /// Eases the camera towards the pointer and keeps it on the skull.
    fn follow_pointer(&mut self) {
        let Some(skull) = self.skull.and_then(|id| self.scene.mesh(id)) else {
            return;
        };
        let target = Point3::new(
            skull.local.position.x,
            skull.local.position.y,
            skull.local.position.z,
        );
        let [fx, fy] = self.config.follow;
        let rate = self.config.follow_rate;
        let camera = &mut self.scene.camera;
        camera.position.x += (self.mouse.x * fx - camera.position.x) * rate;
        camera.position.y += (self.mouse.y * fy - camera.position.y) * rate;
        camera.look_at(target);
    }
}

impl Animate for LinesScene {
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

    fn advance(&mut self, _time: f32, dt: f32) -> SceneResult<()> {
        self.drain_loads()?;

        let mut noise = None;
        let (skull, group) = (&mut self.skull_rotation, &mut self.group_rotation);
        self.tweens.tick(dt, |prop, value| match prop {
            LineProp::SkullX => skull[0] = value,
            LineProp::SkullY => skull[1] = value,
            LineProp::GroupX => group[0] = value,
            LineProp::GroupY => group[1] = value,
            LineProp::Noise => noise = Some(value),
        });
        if let Some(noise) = noise {
            self.set_uniform("uNoise", UniformValue::Float(noise))?;
        }
        self.apply_rotations();
        self.follow_pointer();
        Ok(())
    }

    fn passes(&self) -> Vec<FramePass> {
        vec![FramePass::DEPTH_PREPASS, FramePass::SCREEN]
    }
}

impl HeroFlow for LinesScene {
    fn name(&self) -> &'static str {
        "lines"
    }

    fn on_pointer_move(&mut self, event: &PointerEvent) -> SceneResult<Out> {
        self.mouse = event.ndc();
        self.set_uniform("uMouse", UniformValue::Vec2(self.mouse.into()))?;
        let duration = self.config.rotate_duration;
        if self.skull.is_some() {
            let [x, y, _] = self.skull_rotation;
            self.tweens.start(
                [
                    (LineProp::SkullX, x, -self.mouse.y),
                    (LineProp::SkullY, y, self.mouse.x),
                ],
                duration,
                Ease::default(),
            );
        }
        if self.group.is_some() {
            let [x, y] = self.group_rotation;
            self.tweens.start(
                [
                    (LineProp::GroupX, x, -self.mouse.y * 0.5),
                    (LineProp::GroupY, y, self.mouse.x * 0.5),
                ],
                duration,
                Ease::default(),
            );
        }
        Ok(Out::Empty)
    }

    fn on_click(&mut self, _event: &PointerEvent) -> SceneResult<Out> {
        if self.material.is_some() {
            let pulse = self.config.noise_pulse;
            self.set_uniform("uNoise", UniformValue::Float(pulse))?;
            self.tweens.start(
                [(LineProp::Noise, pulse, 0.0)],
                self.config.noise_duration,
                Ease::Power4InOut,
            );
        }
        Ok(Out::Empty)
    }

    fn on_wheel(&mut self, delta_y: f32) -> SceneResult<Out> {
        let factor = self.config.wheel_factor;
        if let Some(skull) = self.skull.and_then(|id| self.scene.mesh_mut(id)) {
            skull.local.position.z += delta_y * factor;
        }
        Ok(Out::Empty)
    }

    fn on_resize(&mut self, viewport: Viewport) -> SceneResult<Out> {
        self.viewport = viewport;
        self.scene.camera.resize(viewport.width, viewport.height);
        if let Some(depth) = self.scene.depth_camera.as_mut() {
            depth.resize(viewport.width, viewport.height);
        }
        Ok(Out::Empty)
    }

    fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    fn teardown(&mut self) -> DisposeReport {
        let report = DisposeReport {
            listeners: self.listeners.remove_all(),
            cancelled_loads: self.loader.cancel_all(),
            cancelled_tweens: self.tweens.cancel_all(),
            ..Default::default()
        };
        self.skull_load = None;
        self.strips.clear();
        self.skull = None;
        self.group = None;
        self.material = None;
        report.merge(self.scene.dispose())
    }
}
