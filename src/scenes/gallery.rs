//! Image gallery: one tilted plane per post, textured with the post's
//! background image. Planes react to hover and click through raycasting.

use cgmath::{Point3, Vector2};
use image::RgbaImage;
use std::collections::BTreeMap;

use crate::{
    camera::PerspectiveCamera,
    config::{GalleryConfig, Viewport},
    data_structures::{
        geometry::Geometry,
        instance::Instance,
        material::{Program, ShaderMaterial},
        scene_graph::{GeometryId, GroupId, MaterialId, Mesh, MeshId, Scene, TextureId, TextureSource},
    },
    driver::Animate,
    error::SceneResult,
    flow::{HeroFlow, Out},
    input::{CanvasRect, HoverTracker, PointerEvent},
    lifecycle::{DisposeReport, EventKind, Listeners},
    raycast::{Intersection, Raycaster},
    resources::{Asset, AssetKind, AssetLoader, LoadId, posts::Post, texture::white_pixel},
    uniforms::{TextureSlot, UniformSet, UniformValue},
};

pub fn layout_euler(narrow: bool) -> [f32; 3] {
    if narrow { [0.0, 0.0, 0.0] } else { [-0.1, -0.7, -0.2] }
}

pub fn layout_position(viewport: &Viewport) -> [f32; 3] {
    if viewport.is_narrow() {
        [0.0, -0.02, -1.0]
    } else {
        [viewport.width * 0.0012, 0.0, 0.0]
    }
}

pub fn plane_size(viewport: &Viewport) -> (f32, f32) {
    if viewport.is_narrow() {
        (0.58, 1.05)
    } else {
        (viewport.width * 0.0016, viewport.width * 0.0014)
    }
}

/// Height of the canvas: narrow viewports keep a strip at the top.
pub fn canvas_height(viewport: &Viewport, config: &GalleryConfig) -> f32 {
    if viewport.is_narrow() {
        viewport.height * config.narrow_height
    } else {
        viewport.height
    }
}

/// Horizontal cover fit of an image on the viewport: `(repeat, offset)`.
pub fn fit_background(viewport_aspect: f32, image_width: u32, image_height: u32) -> ([f32; 2], [f32; 2]) {
    let image_aspect = image_width as f32 / image_height.max(1) as f32;
    let ratio = viewport_aspect / image_aspect;
    ([ratio, 1.0], [0.5 * (1.0 - ratio), 0.0])
}

#[derive(Clone, Debug)]
pub struct GalleryItem {
    pub post: Post,
    pub group: GroupId,
    pub mesh: MeshId,
    pub material: MaterialId,
    pub texture: TextureId,
}

type IndexCallback = Box<dyn FnMut(usize)>;
type PostCallback = Box<dyn FnMut(&Post)>;
type Callback = Box<dyn FnMut()>;

pub struct GalleryScene {
    config: GalleryConfig,
    viewport: Viewport,
    is_mobile: bool,
    scene: Scene,
    loader: AssetLoader,
    posts_load: Option<LoadId>,
    image_loads: BTreeMap<LoadId, usize>,
    template: ShaderMaterial,
    geometry: GeometryId,
    items: Vec<GalleryItem>,
    raycaster: Raycaster,
    hover: HoverTracker,
    intersected: Vec<Intersection>,
    mouse: Vector2<f32>,
    on_click_event: Option<IndexCallback>,
    handle_hover_in: Option<PostCallback>,
    handle_hover_out: Option<Callback>,
    listeners: Listeners,
}

impl GalleryScene {
    pub fn new(config: GalleryConfig, viewport: Viewport, loader: AssetLoader) -> Self {
        let is_mobile = viewport.is_narrow();
        let height = canvas_height(&viewport, &config);
        let mut camera = PerspectiveCamera::from_config(&config.camera, viewport.width / height.max(1.0));
        camera.set_position(Point3::new(0.0, 0.0, if is_mobile { 0.0 } else { config.camera.position[2] }));
        let mut scene = Scene::new(camera);

        let uniforms = UniformSet::new()
            .with("time", UniformValue::Float(0.0))
            .with("texture1", UniformValue::Texture(None))
            .with("resolutions", UniformValue::Vec4([0.0; 4]))
            .with("distanceFromCenter", UniformValue::Float(0.0))
            .with("pixels", UniformValue::Vec2([1.0, 1.0]))
            .with("mouse", UniformValue::Vec2([0.0, 0.0]))
            .with("iResolution", UniformValue::Vec3([1.0, 1.0, 1.0]))
            .with("u_resolution", UniformValue::Vec3([1.0, 1.0, 1.0]))
            .with("u_mouse", UniformValue::Vec2([0.0, 0.0]))
            .with("u_time", UniformValue::Float(0.0))
            .with("isMobile", UniformValue::Bool(is_mobile))
            .with("uvTransform", UniformValue::Vec4([1.0, 1.0, 0.0, 0.0]));
        let template = ShaderMaterial::new(Program::Gallery, uniforms)
            .transparent()
            .double_sided();

        let (width, height) = plane_size(&viewport);
        let geometry = scene.add_geometry(Geometry::plane(width, height, config.segments, config.segments));

        Self {
            config,
            viewport,
            is_mobile,
            scene,
            loader,
            posts_load: None,
            image_loads: BTreeMap::new(),
            template,
            geometry,
            items: Vec::new(),
            raycaster: Raycaster::default(),
            hover: HoverTracker::new(),
            intersected: Vec::new(),
            mouse: Vector2::new(0.0, 0.0),
            on_click_event: None,
            handle_hover_in: None,
            handle_hover_out: None,
            listeners: Listeners::with(&[EventKind::PointerMove, EventKind::Click, EventKind::Resize]),
        }
    }

    pub fn set_on_click_event(&mut self, callback: impl FnMut(usize) + 'static) {
        self.on_click_event = Some(Box::new(callback));
    }

    /// Called with the post of every plane the pointer starts hovering.
    pub fn set_handle_hover_in(&mut self, callback: impl FnMut(&Post) + 'static) {
        self.handle_hover_in = Some(Box::new(callback));
    }

    pub fn set_handle_hover_out(&mut self, callback: impl FnMut() + 'static) {
        self.handle_hover_out = Some(Box::new(callback));
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn meshes(&self) -> impl Iterator<Item = MeshId> + '_ {
        self.items.iter().map(|item| item.mesh)
    }

    pub fn materials(&self) -> impl Iterator<Item = MaterialId> + '_ {
        self.items.iter().map(|item| item.material)
    }

    pub fn geometry(&self) -> GeometryId {
        self.geometry
    }

    pub fn is_mobile(&self) -> bool {
        self.is_mobile
    }

    pub fn mouse(&self) -> Vector2<f32> {
        self.mouse
    }

    pub fn hover(&self) -> &HoverTracker {
        &self.hover
    }

    pub fn canvas_height(&self) -> f32 {
        canvas_height(&self.viewport, &self.config)
    }

    /// Requests the posts file; the gallery is built when it arrives.
    pub fn load_posts(&mut self) -> LoadId {
        let id = self.loader.load(&self.config.posts_path, AssetKind::Posts);
        self.posts_load = Some(id);
        id
    }

    /// Adds one plane per post and starts loading their images.
    pub fn add_gallery(&mut self, posts: &[Post]) {
        let euler = layout_euler(self.is_mobile);
        let position = layout_position(&self.viewport);
        for post in posts {
            let index = self.items.len();
            let texture = self.scene.add_texture(TextureSource::pending(post.image_url()));
            let load = self.loader.load(post.image_url(), AssetKind::Image);
            self.image_loads.insert(load, index);

            let mut material = self.template.clone();
            material.uniforms.declare("texture1", UniformValue::Texture(Some(TextureSlot::Image(texture))));
            material.uniforms.declare(
                "u_resolution",
                UniformValue::Vec3([self.viewport.width, self.viewport.height, 1.0]),
            );
            let material = self.scene.add_material(material);

            let group = self
                .scene
                .add_group(Instance::new().with_euler(euler[0], euler[1], euler[2]));
            let mesh = self.scene.add_mesh(
                Mesh::new(post.title.clone(), self.geometry, material)
                    .in_group(group)
                    .at(Instance::at(position[0], position[1], position[2])),
            );
            self.items.push(GalleryItem {
                post: post.clone(),
                group,
                mesh,
                material,
                texture,
            });
        }
        log::debug!("gallery holds {} planes", self.items.len());
    }

    /// Stores the decoded image of item `index` and fits it to the viewport.
    pub fn set_background(&mut self, index: usize, image: RgbaImage) -> SceneResult<()> {
        let Some(item) = self.items.get(index) else {
            log::warn!("no gallery item {} for a background", index);
            return Ok(());
        };
        let (material, texture) = (item.material, item.texture);
        let (repeat, offset) = fit_background(self.viewport.aspect(), image.width(), image.height());
        if let Some(source) = self.scene.texture_mut(texture) {
            source.repeat = repeat;
            source.offset = offset;
            source.set_pixels(image);
        }
        if let Some(material) = self.scene.material_mut(material) {
            material
                .uniforms
                .set("uvTransform", UniformValue::Vec4([repeat[0], repeat[1], offset[0], offset[1]]))?;
        }
        Ok(())
    }

    fn drain_loads(&mut self) -> SceneResult<()> {
        for loaded in self.loader.drain() {
            if Some(loaded.id) == self.posts_load {
                self.posts_load = None;
                match loaded.result {
                    Ok(Asset::Posts(posts)) => self.add_gallery(&posts),
                    Ok(_) => log::warn!("{} holds no posts", loaded.path),
                    Err(err) => log::warn!("could not load {}: {:#}", loaded.path, err),
                }
                continue;
            }
            let Some(index) = self.image_loads.remove(&loaded.id) else {
                continue;
            };
            match loaded.result {
                Ok(Asset::Image(image)) => self.set_background(index, image)?,
                other => {
                    if let Err(err) = other {
                        log::warn!("could not load `{}`: {:#}, using a blank plane", loaded.path, err);
                    }
                    if let Some(texture) = self.items.get(index).map(|item| item.texture)
                        && let Some(source) = self.scene.texture_mut(texture)
                    {
                        source.set_pixels(white_pixel());
                    }
                }
            }
        }
        Ok(())
    }

    fn item_of(&self, mesh: MeshId) -> Option<usize> {
        self.items.iter().position(|item| item.mesh == mesh)
    }
}

impl Animate for GalleryScene {
    fn time_step(&self) -> f32 {
        self.config.time_step
    }

    fn time_uniforms(&self) -> &'static [&'static str] {
        &["time", "u_time"]
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn advance(&mut self, _time: f32, _dt: f32) -> SceneResult<()> {
        self.drain_loads()
    }
}

impl HeroFlow for GalleryScene {
    fn name(&self) -> &'static str {
        "gallery"
    }

    fn on_init(&mut self) -> SceneResult<Out> {
        if self.items.is_empty() && self.posts_load.is_none() {
            self.load_posts();
        }
        Ok(Out::Empty)
    }

    fn on_pointer_move(&mut self, event: &PointerEvent) -> SceneResult<Out> {
        let rect = CanvasRect::sized(self.viewport.width, self.canvas_height());
        self.mouse = PointerEvent::new(event.client, rect).ndc();
        self.intersected = match self.scene.camera.ray_from_ndc(self.mouse) {
            Some(ray) => self.raycaster.intersect_scene(&ray, &self.scene),
            None => Vec::new(),
        };

        let update = self.hover.update(&self.intersected, event.over_chrome);
        for _ in &update.ended {
            if let Some(callback) = self.handle_hover_out.as_mut() {
                callback();
            }
        }
        for mesh in &update.started {
            let post = self.items.iter().find(|item| item.mesh == *mesh).map(|item| &item.post);
            if let (Some(callback), Some(post)) = (self.handle_hover_in.as_mut(), post) {
                callback(post);
            }
        }

        let mouse: [f32; 2] = self.mouse.into();
        let hit_materials: Vec<MaterialId> = self
            .intersected
            .iter()
            .filter_map(|hit| self.scene.mesh(hit.mesh).map(|mesh| mesh.material))
            .collect();
        for id in hit_materials {
            if let Some(material) = self.scene.material_mut(id) {
                material.uniforms.set("mouse", UniformValue::Vec2(mouse))?;
                material.uniforms.set("u_mouse", UniformValue::Vec2(mouse))?;
            }
        }

        Ok(update.cursor.map_or(Out::Empty, Out::Cursor))
    }

    fn on_click(&mut self, event: &PointerEvent) -> SceneResult<Out> {
        if event.over_chrome {
            return Ok(Out::Empty);
        }
        let indices: Vec<usize> = self
            .intersected
            .iter()
            .filter_map(|hit| self.item_of(hit.mesh))
            .collect();
        if let Some(callback) = self.on_click_event.as_mut() {
            for index in indices {
                callback(index);
            }
        }
        Ok(Out::Empty)
    }

    fn on_resize(&mut self, viewport: Viewport) -> SceneResult<Out> {
        self.viewport = viewport;
        self.is_mobile = viewport.is_narrow();
        let height = self.canvas_height();
        self.scene.camera.resize(viewport.width, height);

        let (width, plane_height) = plane_size(&viewport);
        let segments = self.config.segments;
        let replacement = self
            .scene
            .add_geometry(Geometry::plane(width, plane_height, segments, segments));
        let euler = layout_euler(self.is_mobile);
        let position = layout_position(&viewport);
        for item in &self.items {
            if let Some(group) = self.scene.group_mut(item.group) {
                group.local.set_euler(euler[0], euler[1], euler[2]);
            }
            if let Some(mesh) = self.scene.mesh_mut(item.mesh) {
                mesh.local.position = position.into();
                mesh.geometry = replacement;
            }
        }
        let previous = std::mem::replace(&mut self.geometry, replacement);
        self.scene.remove_geometry(previous);
        self.scene.update_world_transforms();
        Ok(Out::Empty)
    }

    fn link(&self, index: usize) -> Option<String> {
        self.items.get(index).map(|item| item.post.path())
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
        self.posts_load = None;
        self.image_loads.clear();
        self.hover.clear();
        self.intersected.clear();
        self.on_click_event = None;
        self.handle_hover_in = None;
        self.handle_hover_out = None;
        self.items.clear();
        self.template.dispose();
        report.merge(self.scene.dispose())
    }
}
