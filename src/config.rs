//! Scene configuration.
//!
//! Every tunable the scenes use lives in one of the structs below. `Default`
//! carries the values the site ships with; tests and embedders override
//! single fields with struct update syntax.

use crate::input::ShaderDomain;

/// Viewports narrower than this use the stacked mobile layout.
pub const NARROW_BREAKPOINT: f32 = 768.0;

/// Logical viewport size plus the device pixel ratio the renderer uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    /// Device pixel ratio is capped at 2 to keep fill rate sane on dense screens.
    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = ratio.clamp(1.0, 2.0);
        self
    }

    pub fn is_narrow(&self) -> bool {
        self.width < NARROW_BREAKPOINT
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

#[derive(Clone, Debug)]
pub struct LinesConfig {
    pub camera: CameraConfig,
    pub depth_camera: CameraConfig,
    pub line_count: usize,
    pub line_width: f32,
    pub line_height: f32,
    pub width_segments: u32,
    pub spread: f32,
    pub time_step: f32,
    pub skull_path: String,
    pub skull_node: String,
    pub skull_position: [f32; 3],
    /// How far the camera drifts towards the pointer, per axis.
    pub follow: [f32; 2],
    pub follow_rate: f32,
    pub wheel_factor: f32,
    pub rotate_duration: f32,
    pub noise_pulse: f32,
    pub noise_duration: f32,
}

impl Default for LinesConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                fov: 75.0,
                near: 0.01,
                far: 20.0,
                position: [0.0, 0.0, 1.4],
            },
            depth_camera: CameraConfig {
                fov: 75.0,
                near: 0.01,
                far: 1.0,
                position: [0.0, 0.0, 0.5],
            },
            line_count: 150,
            line_width: 6.0,
            line_height: 0.003,
            width_segments: 200,
            spread: 3.0,
            time_step: 0.01,
            skull_path: "Skull.glb".to_string(),
            skull_node: "Prop_Skull".to_string(),
            skull_position: [0.0, -0.2, -0.2],
            follow: [1.2, 1.5],
            follow_rate: 0.01,
            wheel_factor: 0.0001,
            rotate_duration: 1.0,
            noise_pulse: 0.5,
            noise_duration: 3.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MorphConfig {
    pub camera: CameraConfig,
    pub models_path: String,
    pub time_step: f32,
    pub index: usize,
    pub target_index: usize,
    pub progress: f32,
    pub size: f32,
    pub morph_duration: f32,
    pub morph_merge_size: f32,
    pub color1: String,
    pub color2: String,
    pub clear_color: String,
    /// 0 lets the page behind the canvas show through.
    pub clear_alpha: f32,
    pub domain: ShaderDomain,
    pub seed: Option<u64>,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                fov: 35.0,
                near: 0.1,
                far: 100.0,
                position: [0.0, 0.0, 20.0],
            },
            models_path: "models.glb".to_string(),
            time_step: 0.01,
            index: 1,
            target_index: 0,
            progress: 0.0,
            size: 0.4,
            morph_duration: 0.5,
            morph_merge_size: 0.1,
            color1: "#50c8fc".to_string(),
            color2: "#0576f0".to_string(),
            clear_color: "#160920".to_string(),
            clear_alpha: 0.0,
            domain: ShaderDomain::MORPH,
            seed: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GalleryConfig {
    pub camera: CameraConfig,
    pub segments: u32,
    pub time_step: f32,
    pub posts_path: String,
    /// Share of the window height the canvas keeps on narrow viewports.
    pub narrow_height: f32,
    pub hover_colour: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                fov: 55.0,
                near: 0.1,
                far: 1000.0,
                position: [0.0, 0.0, 4.0],
            },
            segments: 10,
            time_step: 0.05,
            posts_path: "posts.json".to_string(),
            narrow_height: 0.35,
            hover_colour: "#1d1d1f".to_string(),
        }
    }
}
