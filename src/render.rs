//! GPU side of a mounted scene.
//!
//! The [`Renderer`] mirrors the CPU [`Scene`] into wgpu buffers, textures and
//! bind groups, re-uploading whatever changed version since the last frame,
//! and records the passes the animation driver asks for. A [`Frame`] borrows
//! the renderer together with one surface texture and is the driver's
//! [`FrameSink`].
//!
//! # Key types
//!
//! - [`Renderer`] owns pipelines and the per-scene GPU caches
//! - [`Frame`] records the passes of one frame into a command encoder

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        material::{Blending, Program},
        scene_graph::{GeometryId, MaterialId, Mesh, MeshId, Scene, TextureId},
        texture::{RenderTarget, Texture},
    },
    driver::{CameraSlot, FramePass, FrameSink, PassTarget},
    error::{SceneError, SceneResult},
    transition::CoverStyle,
    pipelines::{
        cover::{CoverPipeline, CoverUniform},
        shader::{LightsUniform, PipelineKey, ScenePipelines, texture_bindings},
    },
    uniforms::TextureSlot,
};

/// A uniform buffer with its bind group.
#[derive(Debug)]
struct GpuUniform {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuUniform {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, contents: &[u8], label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

#[derive(Debug)]
struct GpuGeometry {
    version: u64,
    /// One buffer per program attribute, in shader location order.
    buffers: Vec<wgpu::Buffer>,
    index: Option<(wgpu::Buffer, u32)>,
    count: u32,
}

/// What a material bind group was built from.
#[derive(Clone, Debug, PartialEq, Eq)]
struct BindingSources {
    textures: Vec<(Option<TextureSlot>, u64)>,
    target_generation: u64,
}

#[derive(Debug)]
struct GpuMaterial {
    uniform_version: u64,
    buffer: wgpu::Buffer,
    sources: BindingSources,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
struct GpuTexture {
    version: u64,
    texture: Texture,
}

#[derive(Debug)]
pub struct Renderer {
    format: wgpu::TextureFormat,
    pipelines: ScenePipelines,
    cover: CoverPipeline,
    white: Texture,
    target: Option<RenderTarget>,
    target_generation: u64,
    cameras: [Option<GpuUniform>; 2],
    lights: Option<GpuUniform>,
    geometries: HashMap<(GeometryId, Program), GpuGeometry>,
    materials: HashMap<MaterialId, GpuMaterial>,
    textures: HashMap<TextureId, GpuTexture>,
    objects: HashMap<MeshId, GpuUniform>,
}

impl Renderer {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        Self {
            format,
            pipelines: ScenePipelines::new(device),
            cover: CoverPipeline::new(device, format),
            white: Texture::white(device, queue),
            target: None,
            target_generation: 0,
            cameras: [None, None],
            lights: None,
            geometries: HashMap::new(),
            materials: HashMap::new(),
            textures: HashMap::new(),
            objects: HashMap::new(),
        }
    }

    /// Drops every GPU resource of the previous scene. Pipelines survive.
    pub fn release(&mut self) -> usize {
        let released = self.geometries.len()
            + self.materials.len()
            + self.textures.len()
            + self.objects.len()
            + usize::from(self.target.is_some());
        self.target = None;
        self.cameras = [None, None];
        self.lights = None;
        self.geometries.clear();
        self.materials.clear();
        self.textures.clear();
        self.objects.clear();
        log::debug!("released {} scene resources", released);
        released
    }

    #[allow(clippy::too_many_arguments)]
    pub fn frame<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        encoder: &'a mut wgpu::CommandEncoder,
        view: &'a wgpu::TextureView,
        depth: &'a wgpu::TextureView,
        size: [u32; 2],
        clear: wgpu::Color,
    ) -> Frame<'a> {
        Frame {
            renderer: self,
            device,
            queue,
            encoder,
            view,
            depth,
            size,
            clear,
            synced: false,
            drew_screen: false,
        }
    }

    fn ensure_target(&mut self, device: &wgpu::Device, size: [u32; 2]) {
        let stale = self.target.as_ref().is_none_or(|target| target.size != size);
        if stale {
            self.target = Some(RenderTarget::new(device, size));
            self.target_generation += 1;
        }
    }

    fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene, size: [u32; 2]) {
        let needs_target = scene.has_depth_target()
            || scene.material_ids().any(|id| {
                scene.material(id).is_some_and(|m| {
                    m.uniforms
                        .textures()
                        .any(|(_, slot)| slot == Some(TextureSlot::DepthTarget))
                })
            });
        if needs_target {
            self.ensure_target(device, size);
        }

        self.sync_textures(device, queue, scene);
        self.sync_geometries(device, scene);
        self.sync_materials(device, queue, scene);
        self.sync_objects(device, queue, scene);

        let lights = LightsUniform::from_lights(&scene.lights);
        match &self.lights {
            Some(gpu) => queue.write_buffer(&gpu.buffer, 0, bytemuck::bytes_of(&lights)),
            None => {
                self.lights = Some(GpuUniform::new(
                    device,
                    &self.pipelines.layouts().lights,
                    bytemuck::bytes_of(&lights),
                    "lights",
                ))
            }
        }
    }

    fn sync_textures(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        self.textures.retain(|id, _| scene.texture(*id).is_some());
        for id in scene.texture_ids() {
            let Some(source) = scene.texture(id) else {
                continue;
            };
            let Some(pixels) = source.pixels.as_ref() else {
                continue;
            };
            let current = self.textures.get(&id).map(|t| t.version);
            if current != Some(source.version()) {
                let texture = Texture::from_rgba(device, queue, pixels, &source.url);
                self.textures.insert(
                    id,
                    GpuTexture {
                        version: source.version(),
                        texture,
                    },
                );
            }
        }
    }

    fn sync_geometries(&mut self, device: &wgpu::Device, scene: &Scene) {
        let mut wanted: Vec<(GeometryId, Program)> = scene
            .meshes()
            .filter_map(|mesh| Some((mesh.geometry, scene.material(mesh.material)?.program)))
            .collect();
        wanted.sort();
        wanted.dedup();
        self.geometries.retain(|key, _| wanted.contains(key));

        for (id, program) in wanted {
            let Some(geometry) = scene.geometry(id) else {
                continue;
            };
            if self
                .geometries
                .get(&(id, program))
                .is_some_and(|gpu| gpu.version == geometry.version())
            {
                continue;
            }
            let mut buffers = Vec::new();
            let mut count = usize::MAX;
            for (name, size) in program.attributes() {
                let Some(attribute) = geometry.attribute(name).filter(|a| a.item_size == *size) else {
                    log::warn!("{} geometry lacks a {}-component `{}`", program.label(), size, name);
                    buffers.clear();
                    break;
                };
                count = count.min(attribute.count());
                buffers.push(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(name),
                    contents: bytemuck::cast_slice(&attribute.data),
                    usage: wgpu::BufferUsages::VERTEX,
                }));
            }
            if buffers.is_empty() {
                self.geometries.remove(&(id, program));
                continue;
            }
            let index = geometry.index().filter(|i| !i.is_empty()).map(|indices| {
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("index buffer"),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                (buffer, indices.len() as u32)
            });
            self.geometries.insert(
                (id, program),
                GpuGeometry {
                    version: geometry.version(),
                    buffers,
                    index,
                    count: count as u32,
                },
            );
        }
    }

    fn texture_view(&self, slot: Option<TextureSlot>) -> &wgpu::TextureView {
        match slot {
            Some(TextureSlot::Image(id)) => self
                .textures
                .get(&id)
                .map_or(&self.white.view, |t| &t.texture.view),
            Some(TextureSlot::DepthTarget) => self
                .target
                .as_ref()
                .map_or(&self.white.view, |t| &t.depth.view),
            None => &self.white.view,
        }
    }

    fn sync_materials(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        self.materials.retain(|id, _| scene.material(*id).is_some());
        for id in scene.material_ids() {
            let Some(material) = scene.material(id) else {
                continue;
            };
            let bindings = texture_bindings(material.program);
            let sources = BindingSources {
                textures: bindings
                    .iter()
                    .map(|binding| {
                        let slot = material.uniforms.texture(binding.name);
                        let version = match slot {
                            Some(TextureSlot::Image(texture)) => {
                                self.textures.get(&texture).map_or(0, |t| t.version)
                            }
                            _ => 0,
                        };
                        (slot, version)
                    })
                    .collect(),
                target_generation: self.target_generation,
            };

            if let Some(gpu) = self.materials.get_mut(&id) {
                if gpu.uniform_version != material.uniforms.version() {
                    queue.write_buffer(&gpu.buffer, 0, &material.uniforms.pack());
                    gpu.uniform_version = material.uniforms.version();
                }
                if gpu.sources == sources {
                    continue;
                }
            }

            let buffer = match self.materials.remove(&id) {
                Some(gpu) => gpu.buffer,
                None => device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(material.program.label()),
                    contents: &material.uniforms.pack(),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                }),
            };
            let mut entries = vec![wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }];
            let sampler = self.white.sampler.as_ref();
            for (binding, (slot, _)) in bindings.iter().zip(&sources.textures) {
                entries.push(wgpu::BindGroupEntry {
                    binding: binding.texture,
                    resource: wgpu::BindingResource::TextureView(self.texture_view(*slot)),
                });
                if let (Some(index), Some(sampler)) = (binding.sampler, sampler) {
                    entries.push(wgpu::BindGroupEntry {
                        binding: index,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    });
                }
            }
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(material.program.label()),
                layout: self.pipelines.layouts().material(material.program),
                entries: &entries,
            });
            self.materials.insert(
                id,
                GpuMaterial {
                    uniform_version: material.uniforms.version(),
                    buffer,
                    sources,
                    bind_group,
                },
            );
        }
    }

    fn sync_objects(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        self.objects.retain(|id, _| scene.mesh(*id).is_some());
        for mesh in scene.meshes() {
            let raw = mesh.world.to_raw();
            match self.objects.get(&mesh.id) {
                Some(gpu) => queue.write_buffer(&gpu.buffer, 0, bytemuck::bytes_of(&raw)),
                None => {
                    let gpu = GpuUniform::new(
                        device,
                        &self.pipelines.layouts().object,
                        bytemuck::bytes_of(&raw),
                        &mesh.name,
                    );
                    self.objects.insert(mesh.id, gpu);
                }
            }
        }
    }

    fn write_camera(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene, slot: CameraSlot) -> usize {
        let camera = match slot {
            CameraSlot::Main => &scene.camera,
            CameraSlot::Depth => scene.depth_camera.as_ref().unwrap_or(&scene.camera),
        };
        let uniform = camera.uniform();
        let index = match slot {
            CameraSlot::Main => 0,
            CameraSlot::Depth => 1,
        };
        match &self.cameras[index] {
            Some(gpu) => queue.write_buffer(&gpu.buffer, 0, bytemuck::bytes_of(&uniform)),
            None => {
                self.cameras[index] = Some(GpuUniform::new(
                    device,
                    &self.pipelines.layouts().camera,
                    bytemuck::bytes_of(&uniform),
                    "camera",
                ))
            }
        }
        index
    }
}

/// The passes of one frame.
pub struct Frame<'a> {
    renderer: &'a mut Renderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    encoder: &'a mut wgpu::CommandEncoder,
    view: &'a wgpu::TextureView,
    depth: &'a wgpu::TextureView,
    size: [u32; 2],
    clear: wgpu::Color,
    synced: bool,
    drew_screen: bool,
}

impl Frame<'_> {
    pub fn drew_screen(&self) -> bool {
        self.drew_screen
    }

    /// Draws the transition cover last, if any. Clears the surface first
    /// when no scene pass reached it this frame.
    pub fn draw_cover(self, cover: Option<&CoverUniform>) {
        let clear = (!self.drew_screen).then_some(self.clear);
        let hidden;
        let cover = match cover {
            Some(cover) => cover,
            None => {
                hidden = CoverUniform::from_style(&CoverStyle::default(), self.size, 1.0);
                &hidden
            }
        };
        self.renderer
            .cover
            .draw(self.queue, self.encoder, self.view, cover, clear);
    }
}

/// Opaque meshes first, then blended ones in insertion order.
fn draw_order<'s>(scene: &'s Scene, pass: &FramePass) -> Vec<&'s Mesh> {
    let mut meshes: Vec<&Mesh> = scene
        .meshes()
        .filter(|mesh| mesh.visible && mesh.layers.intersects(pass.layers))
        .collect();
    meshes.sort_by_key(|mesh| {
        scene
            .material(mesh.material)
            .is_some_and(|m| m.blending != Blending::Opaque)
    });
    meshes
}

impl FrameSink for Frame<'_> {
    fn draw(&mut self, scene: &Scene, pass: &FramePass) -> SceneResult<()> {
        if scene.is_disposed() {
            return Err(SceneError::Disposed);
        }
        let renderer = &mut *self.renderer;
        if !self.synced {
            renderer.sync(self.device, self.queue, scene, self.size);
            self.synced = true;
        }
        if pass.target == PassTarget::DepthTarget {
            renderer.ensure_target(self.device, self.size);
        }
        let camera = renderer.write_camera(self.device, self.queue, scene, pass.camera);

        // Pipelines are built before the pass borrows the renderer.
        let colour_format = match pass.target {
            PassTarget::DepthTarget => RenderTarget::COLOUR_FORMAT,
            PassTarget::Screen => renderer.format,
        };
        let meshes = draw_order(scene, pass);
        let mut keys = Vec::with_capacity(meshes.len());
        for mesh in &meshes {
            let material = scene.material(mesh.material).ok_or_else(|| {
                SceneError::Other(anyhow::anyhow!("mesh `{}` has no material", mesh.name))
            })?;
            let key = PipelineKey::of(material, colour_format);
            renderer.pipelines.get(self.device, key);
            keys.push(key);
        }

        let renderer = &*renderer;
        let (view, depth, clear) = match pass.target {
            PassTarget::DepthTarget => {
                let target = renderer
                    .target
                    .as_ref()
                    .ok_or_else(|| SceneError::Other(anyhow::anyhow!("no render target")))?;
                (&target.colour.view, &target.depth.view, wgpu::Color::TRANSPARENT)
            }
            PassTarget::Screen => (self.view, self.depth, self.clear),
        };
        let mut render_pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
            multiview_mask: None,
        });

        let Some(camera) = renderer.cameras[camera].as_ref() else {
            return Ok(());
        };
        render_pass.set_bind_group(0, &camera.bind_group, &[]);
        for (mesh, key) in meshes.into_iter().zip(keys) {
            let (Some(material), Some(object), Some(geometry)) = (
                renderer.materials.get(&mesh.material),
                renderer.objects.get(&mesh.id),
                renderer.geometries.get(&(mesh.geometry, key.program)),
            ) else {
                continue;
            };
            let Some(pipeline) = renderer.pipelines.cached(&key) else {
                continue;
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(1, &material.bind_group, &[]);
            render_pass.set_bind_group(2, &object.bind_group, &[]);
            if key.program.uses_lights()
                && let Some(lights) = renderer.lights.as_ref()
            {
                render_pass.set_bind_group(3, &lights.bind_group, &[]);
            }
            for (slot, buffer) in geometry.buffers.iter().enumerate() {
                render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
            }
            if key.program.is_instanced() {
                render_pass.draw(0..6, 0..geometry.count);
            } else if let Some((index, count)) = &geometry.index {
                render_pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..*count, 0, 0..1);
            } else {
                render_pass.draw(0..geometry.count, 0..1);
            }
        }
        drop(render_pass);

        if pass.target == PassTarget::Screen {
            self.drew_screen = true;
        }
        Ok(())
    }
}
