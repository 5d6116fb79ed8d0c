//! Pipelines of the scene shader programs, built lazily per raster state.

use std::collections::HashMap;

use crate::{
    data_structures::{
        material::{Blending, Program, ShaderMaterial, Side, TextureKind},
        scene_graph::Light,
    },
    pipelines::{PipelineDesc, mk_render_pipeline},
};

const COMMON: &str = include_str!("shaders/common.wgsl");

fn program_source(program: Program) -> &'static str {
    match program {
        Program::LineField => include_str!("shaders/lines.wgsl"),
        Program::MorphPoints => include_str!("shaders/morph.wgsl"),
        Program::Gallery => include_str!("shaders/gallery.wgsl"),
        Program::Physical => include_str!("shaders/physical.wgsl"),
    }
}

/// Raster state that selects a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub program: Program,
    pub blending: Blending,
    pub side: Side,
    pub depth_test: bool,
    pub depth_write: bool,
    pub colour_format: wgpu::TextureFormat,
}

impl PipelineKey {
    pub fn of(material: &ShaderMaterial, colour_format: wgpu::TextureFormat) -> Self {
        Self {
            program: material.program,
            blending: material.blending,
            side: material.side,
            depth_test: material.depth_test,
            depth_write: material.depth_write,
            colour_format,
        }
    }
}

/// A texture uniform with its binding slots in group 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureBinding {
    pub name: &'static str,
    pub kind: TextureKind,
    pub texture: u32,
    /// Only image textures carry a sampler.
    pub sampler: Option<u32>,
}

/// Binding 0 holds the uniform block; textures follow in declaration order.
pub fn texture_bindings(program: Program) -> Vec<TextureBinding> {
    let mut next = 1;
    program
        .textures()
        .iter()
        .map(|(name, kind)| {
            let texture = next;
            let sampler = match kind {
                TextureKind::Image => Some(texture + 1),
                TextureKind::Depth => None,
            };
            next += if sampler.is_some() { 2 } else { 1 };
            TextureBinding {
                name,
                kind: *kind,
                texture,
                sampler,
            }
        })
        .collect()
}

pub fn float_format(size: usize) -> wgpu::VertexFormat {
    match size {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

pub fn blend_state(blending: Blending) -> Option<wgpu::BlendState> {
    match blending {
        Blending::Opaque => Some(wgpu::BlendState::REPLACE),
        Blending::Normal => Some(wgpu::BlendState::ALPHA_BLENDING),
        Blending::Additive => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        }),
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    pub ambient: [f32; 4],
    pub directional_colour: [f32; 4],
    pub directional_position: [f32; 4],
}

impl LightsUniform {
    /// Sums the ambient lights; the last directional light wins.
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut uniform = Self::default();
        for light in lights {
            match *light {
                Light::Ambient { color, intensity, .. } => {
                    for (channel, c) in uniform.ambient.iter_mut().zip(color) {
                        *channel += c * intensity;
                    }
                }
                Light::Directional {
                    color,
                    intensity,
                    position,
                } => {
                    uniform.directional_colour = [color[0] * intensity, color[1] * intensity, color[2] * intensity, 1.0];
                    uniform.directional_position = [position[0], position[1], position[2], 0.0];
                }
            }
        }
        uniform.ambient[3] = 1.0;
        uniform
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[uniform_entry(0)],
    })
}

fn material_layout(device: &wgpu::Device, program: Program) -> wgpu::BindGroupLayout {
    let mut entries = vec![uniform_entry(0)];
    for binding in texture_bindings(program) {
        let sample_type = match binding.kind {
            TextureKind::Image => wgpu::TextureSampleType::Float { filterable: true },
            TextureKind::Depth => wgpu::TextureSampleType::Depth,
        };
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: binding.texture,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type,
            },
            count: None,
        });
        if let Some(sampler) = binding.sampler {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: sampler,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(program.label()),
        entries: &entries,
    })
}

#[derive(Debug)]
pub struct Layouts {
    pub camera: wgpu::BindGroupLayout,
    pub object: wgpu::BindGroupLayout,
    pub lights: wgpu::BindGroupLayout,
    materials: HashMap<Program, wgpu::BindGroupLayout>,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let materials = [
            Program::LineField,
            Program::MorphPoints,
            Program::Gallery,
            Program::Physical,
        ]
        .into_iter()
        .map(|program| (program, material_layout(device, program)))
        .collect();
        Self {
            camera: uniform_layout(device, "camera_bind_group_layout"),
            object: uniform_layout(device, "object_bind_group_layout"),
            lights: uniform_layout(device, "lights_bind_group_layout"),
            materials,
        }
    }

    pub fn material(&self, program: Program) -> &wgpu::BindGroupLayout {
        &self.materials[&program]
    }
}

#[derive(Debug)]
pub struct ScenePipelines {
    layouts: Layouts,
    cache: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl ScenePipelines {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            layouts: Layouts::new(device),
            cache: HashMap::new(),
        }
    }

    pub fn layouts(&self) -> &Layouts {
        &self.layouts
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn cached(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.cache.get(key)
    }

    pub fn get(&mut self, device: &wgpu::Device, key: PipelineKey) -> &wgpu::RenderPipeline {
        let layouts = &self.layouts;
        self.cache.entry(key).or_insert_with(|| {
            log::debug!("building pipeline {:?}", key);
            build(device, layouts, key)
        })
    }
}

fn build(device: &wgpu::Device, layouts: &Layouts, key: PipelineKey) -> wgpu::RenderPipeline {
    let program = key.program;
    let mut groups = vec![
        Some(&layouts.camera),
        Some(layouts.material(program)),
        Some(&layouts.object),
    ];
    if program.uses_lights() {
        groups.push(Some(&layouts.lights));
    }
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(program.label()),
        bind_group_layouts: &groups,
        immediate_size: 0,
    });

    let step_mode = if program.is_instanced() {
        wgpu::VertexStepMode::Instance
    } else {
        wgpu::VertexStepMode::Vertex
    };
    let attributes: Vec<[wgpu::VertexAttribute; 1]> = program
        .attributes()
        .iter()
        .enumerate()
        .map(|(location, (_, size))| {
            [wgpu::VertexAttribute {
                format: float_format(*size),
                offset: 0,
                shader_location: location as u32,
            }]
        })
        .collect();
    let vertex_layouts: Vec<wgpu::VertexBufferLayout> = attributes
        .iter()
        .zip(program.attributes())
        .map(|(attribute, (_, size))| wgpu::VertexBufferLayout {
            array_stride: (*size * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
            step_mode,
            attributes: attribute,
        })
        .collect();

    let source = format!("{}\n{}", COMMON, program_source(program));
    mk_render_pipeline(
        device,
        PipelineDesc {
            label: program.label(),
            layout: &layout,
            colour_format: key.colour_format,
            blend: blend_state(key.blending),
            cull_mode: match key.side {
                Side::Front => Some(wgpu::Face::Back),
                Side::Double => None,
            },
            depth: Some((
                key.depth_write,
                if key.depth_test {
                    wgpu::CompareFunction::LessEqual
                } else {
                    wgpu::CompareFunction::Always
                },
            )),
            vertex_layouts: &vertex_layouts,
            shader: wgpu::ShaderModuleDescriptor {
                label: Some(program.label()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            },
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_textures_take_a_sampler_slot() {
        let gallery = texture_bindings(Program::Gallery);
        assert_eq!(gallery.len(), 1);
        assert_eq!((gallery[0].texture, gallery[0].sampler), (1, Some(2)));
        let lines = texture_bindings(Program::LineField);
        assert_eq!((lines[0].texture, lines[0].sampler), (1, None));
        assert!(texture_bindings(Program::MorphPoints).is_empty());
    }

    #[test]
    fn lights_fold_into_one_block() {
        let uniform = LightsUniform::from_lights(&[
            Light::Ambient {
                color: [1.0, 1.0, 1.0],
                intensity: 0.1,
                position: [0.0, 0.0, -1.0],
            },
            Light::Directional {
                color: [1.0, 0.5, 1.0],
                intensity: 2.0,
                position: [0.0, 0.0, 1.0],
            },
        ]);
        assert!((uniform.ambient[0] - 0.1).abs() < 1e-6);
        assert_eq!(uniform.directional_colour, [2.0, 1.0, 2.0, 1.0]);
        assert_eq!(uniform.directional_position, [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn additive_blending_adds_onto_the_target() {
        let blend = blend_state(Blending::Additive).unwrap();
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(blend_state(Blending::Opaque), Some(wgpu::BlendState::REPLACE));
    }
}
