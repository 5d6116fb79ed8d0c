//! Scene graph of a single hero scene.
//!
//! A [`Scene`] owns its cameras, lights, groups, meshes and the geometries,
//! materials and textures those meshes reference. Everything is addressed by
//! a typed id handed out on insertion. Groups are one level deep: a mesh
//! either hangs off a group or sits at the root, and its world transform is
//! `group.local * mesh.local`.

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    camera::PerspectiveCamera,
    data_structures::{geometry::Geometry, instance::Instance, material::ShaderMaterial},
    lifecycle::DisposeReport,
};

macro_rules! scene_id {
    ($($name:ident),*) => {
        $(
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);
        )*
    };
}

scene_id!(MeshId, GroupId, GeometryId, MaterialId, TextureId);

/// Render layer mask. A pass draws the meshes whose mask intersects its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layers(u32);

impl Layers {
    pub const MAIN: Layers = Layers(1);
    pub const DEPTH: Layers = Layers(1 << 1);

    pub fn intersects(self, other: Layers) -> bool {
        self.0 & other.0 != 0
    }

    pub fn with(self, other: Layers) -> Layers {
        Layers(self.0 | other.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    Points,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    Ambient {
        color: [f32; 3],
        intensity: f32,
        position: [f32; 3],
    },
    Directional {
        color: [f32; 3],
        intensity: f32,
        position: [f32; 3],
    },
}

#[derive(Clone, Debug, Default)]
pub struct Group {
    pub local: Instance,
    pub world: Instance,
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub id: MeshId,
    pub name: String,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub parent: Option<GroupId>,
    pub local: Instance,
    pub world: Instance,
    pub primitive: Primitive,
    pub layers: Layers,
    pub frustum_culled: bool,
    pub visible: bool,
}

impl Mesh {
    /// Unattached mesh; [`Scene::add_mesh`] assigns the id.
    pub fn new(name: impl Into<String>, geometry: GeometryId, material: MaterialId) -> Self {
        Self {
            id: MeshId(u32::MAX),
            name: name.into(),
            geometry,
            material,
            parent: None,
            local: Instance::default(),
            world: Instance::default(),
            primitive: Primitive::Triangles,
            layers: Layers::MAIN,
            frustum_culled: true,
            visible: true,
        }
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.parent = Some(group);
        self
    }

    pub fn at(mut self, local: Instance) -> Self {
        self.local = local;
        self
    }

    pub fn points(mut self) -> Self {
        self.primitive = Primitive::Points;
        self
    }

    pub fn on_layers(mut self, layers: Layers) -> Self {
        self.layers = layers;
        self
    }
}

/// A texture referenced by materials. Pixels arrive asynchronously.
#[derive(Clone, Debug)]
pub struct TextureSource {
    pub url: String,
    pub pixels: Option<Arc<image::RgbaImage>>,
    pub repeat: [f32; 2],
    pub offset: [f32; 2],
    version: u64,
}

impl TextureSource {
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pixels: None,
            repeat: [1.0, 1.0],
            offset: [0.0, 0.0],
            version: 0,
        }
    }

    pub fn set_pixels(&mut self, pixels: image::RgbaImage) {
        self.pixels = Some(Arc::new(pixels));
        self.version += 1;
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.pixels.as_ref().map(|p| p.dimensions())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// `[repeat.x, repeat.y, offset.x, offset.y]`
    pub fn uv_transform(&self) -> [f32; 4] {
        [self.repeat[0], self.repeat[1], self.offset[0], self.offset[1]]
    }
}

#[derive(Debug)]
pub struct Scene {
    pub camera: PerspectiveCamera,
    pub depth_camera: Option<PerspectiveCamera>,
    pub lights: Vec<Light>,
    groups: BTreeMap<GroupId, Group>,
    meshes: BTreeMap<MeshId, Mesh>,
    geometries: BTreeMap<GeometryId, Geometry>,
    materials: BTreeMap<MaterialId, ShaderMaterial>,
    textures: BTreeMap<TextureId, TextureSource>,
    depth_target: bool,
    next_id: u32,
    disposed: bool,
}

impl Scene {
    pub fn new(camera: PerspectiveCamera) -> Self {
        Self {
            camera,
            depth_camera: None,
            lights: Vec::new(),
            groups: BTreeMap::new(),
            meshes: BTreeMap::new(),
            geometries: BTreeMap::new(),
            materials: BTreeMap::new(),
            textures: BTreeMap::new(),
            depth_target: false,
            next_id: 0,
            disposed: false,
        }
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_group(&mut self, local: Instance) -> GroupId {
        let id = GroupId(self.next());
        self.groups.insert(
            id,
            Group {
                world: local.clone(),
                local,
            },
        );
        id
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(&id)
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        let id = GeometryId(self.next());
        self.geometries.insert(id, geometry);
        id
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(&id)
    }

    pub fn geometry_mut(&mut self, id: GeometryId) -> Option<&mut Geometry> {
        self.geometries.get_mut(&id)
    }

    /// Disposes and forgets a geometry no mesh references any more.
    pub fn remove_geometry(&mut self, id: GeometryId) -> bool {
        if self.meshes.values().any(|mesh| mesh.geometry == id) {
            return false;
        }
        match self.geometries.remove(&id) {
            Some(mut geometry) => {
                geometry.dispose();
                true
            }
            None => false,
        }
    }

    pub fn geometry_ids(&self) -> impl Iterator<Item = GeometryId> + '_ {
        self.geometries.keys().copied()
    }

    pub fn add_material(&mut self, material: ShaderMaterial) -> MaterialId {
        let id = MaterialId(self.next());
        self.materials.insert(id, material);
        id
    }

    pub fn material(&self, id: MaterialId) -> Option<&ShaderMaterial> {
        self.materials.get(&id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut ShaderMaterial> {
        self.materials.get_mut(&id)
    }

    pub fn materials_mut(&mut self) -> impl Iterator<Item = (MaterialId, &mut ShaderMaterial)> {
        self.materials.iter_mut().map(|(id, m)| (*id, m))
    }

    pub fn material_ids(&self) -> impl Iterator<Item = MaterialId> + '_ {
        self.materials.keys().copied()
    }

    pub fn add_texture(&mut self, texture: TextureSource) -> TextureId {
        let id = TextureId(self.next());
        self.textures.insert(id, texture);
        id
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureSource> {
        self.textures.get(&id)
    }

    pub fn texture_mut(&mut self, id: TextureId) -> Option<&mut TextureSource> {
        self.textures.get_mut(&id)
    }

    pub fn texture_ids(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.textures.keys().copied()
    }

    pub fn add_mesh(&mut self, mut mesh: Mesh) -> MeshId {
        let id = MeshId(self.next());
        mesh.id = id;
        mesh.world = self.world_of(mesh.parent, &mesh.local);
        self.meshes.insert(id, mesh);
        id
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(&id)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(&id)
    }

    /// Meshes in insertion order.
    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.meshes.values()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn world_of(&self, parent: Option<GroupId>, local: &Instance) -> Instance {
        match parent.and_then(|id| self.groups.get(&id)) {
            Some(group) => &group.local * local,
            None => local.clone(),
        }
    }

    /// Recomputes every group and mesh world transform from the locals.
    pub fn update_world_transforms(&mut self) {
        for group in self.groups.values_mut() {
            group.world = group.local.clone();
        }
        let groups = &self.groups;
        for mesh in self.meshes.values_mut() {
            mesh.world = match mesh.parent.and_then(|id| groups.get(&id)) {
                Some(group) => &group.world * &mesh.local,
                None => mesh.local.clone(),
            };
        }
    }

    /// Releases every mesh, geometry, material and texture. Further calls
    /// release nothing.
    pub fn dispose(&mut self) -> DisposeReport {
        if self.disposed {
            return DisposeReport::default();
        }
        self.disposed = true;
        let report = DisposeReport {
            meshes: self.meshes.len(),
            groups: self.groups.len(),
            geometries: self
                .geometries
                .values_mut()
                .filter_map(|g| g.dispose().then_some(()))
                .count(),
            materials: self
                .materials
                .values_mut()
                .filter_map(|m| m.dispose().then_some(()))
                .count(),
            textures: self.textures.len(),
            render_targets: usize::from(std::mem::take(&mut self.depth_target)),
            ..Default::default()
        };
        self.meshes.clear();
        self.groups.clear();
        self.geometries.clear();
        self.materials.clear();
        self.textures.clear();
        self.lights.clear();
        log::debug!("scene disposed: {:?}", report);
        report
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Asks the renderer for an offscreen target the depth pre-pass draws
    /// into. It lives until the scene is disposed.
    pub fn request_depth_target(&mut self) {
        if !self.disposed {
            self.depth_target = true;
        }
    }

    pub fn has_depth_target(&self) -> bool {
        self.depth_target
    }
}
