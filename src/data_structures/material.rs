//! Shader materials: a program plus the uniform set and raster state it is
//! drawn with.

use crate::uniforms::UniformSet;

/// How a program reads a texture uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// Filterable colour texture with a sampler.
    Image,
    /// Depth texture read with `textureLoad`.
    Depth,
}

/// The shader programs the scenes are built from.
///
/// Each program fixes the per-vertex attributes it consumes (name and
/// component count, in shader location order) and the texture uniforms it
/// binds. Scenes must declare matching data; the WGSL sources mirror it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Program {
    LineField,
    MorphPoints,
    Gallery,
    Physical,
}

impl Program {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LineField => "line field",
            Self::MorphPoints => "morph points",
            Self::Gallery => "gallery",
            Self::Physical => "physical",
        }
    }

    pub fn attributes(&self) -> &'static [(&'static str, usize)] {
        match self {
            Self::LineField => &[("position", 3), ("y", 1)],
            Self::MorphPoints => &[("position", 3), ("aPositionTarget", 3), ("aSize", 1)],
            Self::Gallery => &[("position", 3), ("uv", 2)],
            Self::Physical => &[("position", 3), ("normal", 3)],
        }
    }

    pub fn textures(&self) -> &'static [(&'static str, TextureKind)] {
        match self {
            Self::LineField => &[("uDepths", TextureKind::Depth)],
            Self::Gallery => &[("texture1", TextureKind::Image)],
            Self::MorphPoints | Self::Physical => &[],
        }
    }

    /// Point clouds are drawn as one camera-facing quad per vertex, so their
    /// attributes advance per instance.
    pub fn is_instanced(&self) -> bool {
        matches!(self, Self::MorphPoints)
    }

    pub fn uses_lights(&self) -> bool {
        matches!(self, Self::Physical)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Blending {
    Opaque,
    Normal,
    Additive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Front,
    Double,
}

#[derive(Clone, Debug)]
pub struct ShaderMaterial {
    pub program: Program,
    pub uniforms: UniformSet,
    pub blending: Blending,
    pub side: Side,
    pub depth_test: bool,
    pub depth_write: bool,
    disposed: bool,
}

impl ShaderMaterial {
    pub fn new(program: Program, uniforms: UniformSet) -> Self {
        Self {
            program,
            uniforms,
            blending: Blending::Opaque,
            side: Side::Front,
            depth_test: true,
            depth_write: true,
            disposed: false,
        }
    }

    pub fn transparent(mut self) -> Self {
        self.blending = Blending::Normal;
        self
    }

    pub fn additive(mut self) -> Self {
        self.blending = Blending::Additive;
        self.depth_write = false;
        self
    }

    pub fn double_sided(mut self) -> Self {
        self.side = Side::Double;
        self
    }

    pub fn without_depth_test(mut self) -> Self {
        self.depth_test = false;
        self
    }

    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
