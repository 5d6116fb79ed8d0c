//! Named shader parameters.
//!
//! A [`UniformSet`] is declared once when a material is built and only ever
//! updated afterwards: setting an undeclared name or changing a value's type
//! is an error. Scalar and vector entries pack into a std140 block in
//! declaration order; textures are bound separately and take no space.

use crate::{
    data_structures::scene_graph::TextureId,
    error::{SceneError, SceneResult},
};

/// Where a texture uniform reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Image(TextureId),
    /// Depth attachment of the scene's offscreen render target.
    DepthTarget,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Bool(bool),
    Texture(Option<TextureSlot>),
}

impl UniformValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Bool(_) => "bool",
            Self::Texture(_) => "texture",
        }
    }

    /// (size, alignment) in bytes under std140. Textures occupy nothing.
    fn layout(&self) -> (usize, usize) {
        match self {
            Self::Float(_) | Self::Bool(_) => (4, 4),
            Self::Vec2(_) => (8, 8),
            Self::Vec3(_) => (12, 16),
            Self::Vec4(_) => (16, 16),
            Self::Texture(_) => (0, 1),
        }
    }

    fn write(&self, out: &mut [u8]) {
        let floats: &[f32] = match self {
            Self::Float(v) => std::slice::from_ref(v),
            Self::Vec2(v) => v,
            Self::Vec3(v) => v,
            Self::Vec4(v) => v,
            Self::Bool(b) => {
                out[..4].copy_from_slice(bytemuck::bytes_of(&(*b as u32)));
                return;
            }
            Self::Texture(_) => return,
        };
        out[..floats.len() * 4].copy_from_slice(bytemuck::cast_slice(floats));
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UniformSet {
    entries: Vec<(String, UniformValue)>,
    version: u64,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`declare`](Self::declare).
    pub fn with(mut self, name: &str, value: UniformValue) -> Self {
        self.declare(name, value);
        self
    }

    /// Adds `name`, or replaces its value outright when it already exists.
    pub fn declare(&mut self, name: &str, value: UniformValue) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name.to_string(), value)),
        }
        self.version += 1;
    }

    pub fn set(&mut self, name: &str, value: UniformValue) -> SceneResult<()> {
        let (_, existing) = self
            .entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| SceneError::UnknownUniform(name.to_string()))?;
        if std::mem::discriminant(existing) != std::mem::discriminant(&value) {
            return Err(SceneError::type_mismatch(
                name,
                existing.kind(),
                value.kind(),
            ));
        }
        if *existing != value {
            *existing = value;
            self.version += 1;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(UniformValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn vec2(&self, name: &str) -> Option<[f32; 2]> {
        match self.get(name) {
            Some(UniformValue::Vec2(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn texture(&self, name: &str) -> Option<TextureSlot> {
        match self.get(name) {
            Some(UniformValue::Texture(slot)) => *slot,
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Texture entries in declaration order.
    pub fn textures(&self) -> impl Iterator<Item = (&str, Option<TextureSlot>)> {
        self.entries.iter().filter_map(|(n, v)| match v {
            UniformValue::Texture(slot) => Some((n.as_str(), *slot)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped on every change, used to skip redundant GPU uploads.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Byte offset of every non-texture entry.
    pub fn layout(&self) -> Vec<(&str, usize)> {
        let mut offset = 0;
        let mut layout = Vec::new();
        for (name, value) in &self.entries {
            if let UniformValue::Texture(_) = value {
                continue;
            }
            let (size, align) = value.layout();
            offset = align_up(offset, align);
            layout.push((name.as_str(), offset));
            offset += size;
        }
        layout
    }

    /// Packs the block; the result is padded to a multiple of 16 bytes and is
    /// never empty.
    pub fn pack(&self) -> Vec<u8> {
        let mut offset = 0;
        for (_, value) in &self.entries {
            let (size, align) = value.layout();
            if size > 0 {
                offset = align_up(offset, align) + size;
            }
        }
        let mut bytes = vec![0u8; align_up(offset.max(1), 16)];
        let mut offset = 0;
        for (_, value) in &self.entries {
            let (size, align) = value.layout();
            if size == 0 {
                continue;
            }
            offset = align_up(offset, align);
            value.write(&mut bytes[offset..offset + size]);
            offset += size;
        }
        bytes
    }
}

/// Parses `#rgb` / `#rrggbb` into sRGB components in `[0, 1]`.
pub fn parse_hex(hex: &str) -> SceneResult<[f32; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    if !digits.is_ascii() {
        return Err(SceneError::InvalidColour(hex.to_string()));
    }
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return Err(SceneError::InvalidColour(hex.to_string())),
    };
    let channel = |i: usize| {
        u8::from_str_radix(&expanded[i..i + 2], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| SceneError::InvalidColour(hex.to_string()))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Hex colour converted to the linear working space shaders expect.
pub fn colour_from_hex(hex: &str) -> SceneResult<[f32; 3]> {
    Ok(parse_hex(hex)?.map(srgb_to_linear))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gallery_like() -> UniformSet {
        UniformSet::new()
            .with("time", UniformValue::Float(0.0))
            .with("texture1", UniformValue::Texture(None))
            .with("resolutions", UniformValue::Vec4([0.0; 4]))
            .with("distanceFromCenter", UniformValue::Float(0.0))
            .with("pixels", UniformValue::Vec2([1.0, 1.0]))
            .with("iResolution", UniformValue::Vec3([1.0, 1.0, 1.0]))
            .with("u_time", UniformValue::Float(0.0))
            .with("isMobile", UniformValue::Bool(true))
    }

    #[test]
    fn layout_follows_std140() {
        let set = gallery_like();
        assert_eq!(
            set.layout(),
            vec![
                ("time", 0),
                ("resolutions", 16),
                ("distanceFromCenter", 32),
                ("pixels", 40),
                ("iResolution", 48),
                ("u_time", 60),
                ("isMobile", 64),
            ]
        );
        assert_eq!(set.pack().len(), 80);
    }

    #[test]
    fn pack_writes_values_at_their_offsets() {
        let mut set = gallery_like();
        set.set("u_time", UniformValue::Float(2.5)).unwrap();
        let bytes = set.pack();
        let u_time: f32 = bytemuck::pod_read_unaligned(&bytes[60..64]);
        let is_mobile: u32 = bytemuck::pod_read_unaligned(&bytes[64..68]);
        assert_eq!(u_time, 2.5);
        assert_eq!(is_mobile, 1);
    }

    #[test]
    fn unknown_names_and_type_changes_are_rejected() {
        let mut set = gallery_like();
        assert!(matches!(
            set.set("uNope", UniformValue::Float(1.0)),
            Err(SceneError::UnknownUniform(_))
        ));
        assert!(matches!(
            set.set("time", UniformValue::Vec2([0.0, 0.0])),
            Err(SceneError::UniformTypeMismatch { .. })
        ));
        assert_eq!(set.float("time"), Some(0.0));
    }

    #[test]
    fn version_only_moves_on_change() {
        let mut set = gallery_like();
        let before = set.version();
        set.set("time", UniformValue::Float(0.0)).unwrap();
        assert_eq!(set.version(), before);
        set.set("time", UniformValue::Float(0.05)).unwrap();
        assert_eq!(set.version(), before + 1);
    }

    #[test]
    fn textures_are_listed_in_order() {
        let set = gallery_like();
        let names: Vec<_> = set.textures().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["texture1"]);
    }

    #[test]
    fn hex_colours_parse_and_linearise() {
        assert_eq!(parse_hex("#fff").unwrap(), [1.0, 1.0, 1.0]);
        let [r, g, b] = parse_hex("#50c8fc").unwrap();
        assert!((r - 80.0 / 255.0).abs() < 1e-6);
        assert!((g - 200.0 / 255.0).abs() < 1e-6);
        assert!((b - 252.0 / 255.0).abs() < 1e-6);
        let linear = colour_from_hex("#808080").unwrap();
        assert!((linear[0] - 0.2158605).abs() < 1e-4);
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#gggggg").is_err());
    }
}
