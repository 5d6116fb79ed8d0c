//! Screen-space overlay that draws the transition cover natively.

use wgpu::util::DeviceExt;

use crate::{
    pipelines::{PipelineDesc, mk_render_pipeline},
    transition::CoverStyle,
    uniforms::srgb_to_linear,
};

/// Root font size the cover radius is expressed in.
const REM_PX: f32 = 16.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CoverUniform {
    pub rect: [f32; 4],
    pub colour: [f32; 4],
    pub params: [f32; 4],
}

impl CoverUniform {
    /// The cover spans the whole surface, shifted by `x_percent` of its width.
    pub fn from_style(style: &CoverStyle, size: [u32; 2], pixel_ratio: f32) -> Self {
        let [width, height] = [size[0] as f32, size[1] as f32];
        let left = width * style.x_percent / 100.0;
        let [r, g, b, a] = style.background;
        Self {
            rect: [left, 0.0, left + width, height],
            colour: [
                srgb_to_linear(r),
                srgb_to_linear(g),
                srgb_to_linear(b),
                a * style.opacity,
            ],
            params: [
                style.radius_rem * REM_PX * pixel_ratio,
                style.blur * pixel_ratio,
                width,
                height,
            ],
        }
    }

    /// True when nothing of the cover reaches the surface.
    pub fn is_offscreen(&self) -> bool {
        self.rect[2] <= 0.0 || self.rect[0] >= self.params[2] || self.colour[3] <= 0.0
    }
}

#[derive(Debug)]
pub struct CoverPipeline {
    pipeline: wgpu::RenderPipeline,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl CoverPipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cover_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cover buffer"),
            contents: bytemuck::bytes_of(&CoverUniform::from_style(&CoverStyle::default(), [1, 1], 1.0)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cover_bind_group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cover pipeline layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });
        let pipeline = mk_render_pipeline(
            device,
            PipelineDesc {
                label: "cover",
                layout: &pipeline_layout,
                colour_format: format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                cull_mode: None,
                depth: None,
                vertex_layouts: &[],
                shader: wgpu::ShaderModuleDescriptor {
                    label: Some("cover shader"),
                    source: wgpu::ShaderSource::Wgsl(include_str!("shaders/cover.wgsl").into()),
                },
            },
        );
        Self {
            pipeline,
            buffer,
            bind_group,
        }
    }

    /// Draws the cover over `view`, or clears it to `clear` when the scene
    /// did not draw this frame.
    pub fn draw(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        uniform: &CoverUniform,
        clear: Option<wgpu::Color>,
    ) {
        if uniform.is_offscreen() && clear.is_none() {
            return;
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniform));
        let load = match clear {
            Some(colour) => wgpu::LoadOp::Clear(colour),
            None => wgpu::LoadOp::Load,
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("cover pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        if !uniform.is_offscreen() {
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resting_cover_is_offscreen() {
        let uniform = CoverUniform::from_style(&CoverStyle::default(), [800, 600], 1.0);
        assert_eq!(uniform.rect, [-800.0, 0.0, 0.0, 600.0]);
        assert!(uniform.is_offscreen());
    }

    #[test]
    fn hover_peek_shows_a_sliver() {
        let style = CoverStyle {
            x_percent: -98.5,
            radius_rem: 0.5,
            ..CoverStyle::default()
        };
        let uniform = CoverUniform::from_style(&style, [1000, 600], 2.0);
        assert!(!uniform.is_offscreen());
        assert!((uniform.rect[2] - 15.0).abs() < 1e-3);
        assert_eq!(uniform.params[0], 16.0);
    }
}
