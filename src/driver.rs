//! Per-frame animation loop.
//!
//! The driver owns the time accumulator of one mounted scene and the
//! [`CancellationToken`] that ends its loop. Every [`tick`](AnimationDriver::tick)
//! advances time by the scene's fixed step, feeds it into the scene's uniform
//! sets, lets the scene update itself and then issues the scene's passes to a
//! [`FrameSink`]. Any error is fatal: the token is cancelled and every later
//! tick reports [`Tick::Stopped`].

use instant::Duration;

use crate::{
    data_structures::scene_graph::{Layers, Scene},
    error::{SceneError, SceneResult},
    lifecycle::CancellationToken,
    uniforms::UniformValue,
};

/// Fixed-step time accumulator. The step is applied once per tick, so effect
/// speed follows the display refresh rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameClock {
    time: f32,
    step: f32,
}

impl FrameClock {
    pub fn new(step: f32) -> Self {
        Self { time: 0.0, step }
    }

    pub fn advance(&mut self) -> f32 {
        self.time += self.step;
        self.time
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn step(&self) -> f32 {
        self.step
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassTarget {
    /// The scene's offscreen colour + depth target.
    DepthTarget,
    Screen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraSlot {
    Main,
    Depth,
}

/// One render of the scene from a camera into a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePass {
    pub label: &'static str,
    pub target: PassTarget,
    pub camera: CameraSlot,
    pub layers: Layers,
}

impl FramePass {
    pub const SCREEN: FramePass = FramePass {
        label: "screen",
        target: PassTarget::Screen,
        camera: CameraSlot::Main,
        layers: Layers::MAIN,
    };

    pub const DEPTH_PREPASS: FramePass = FramePass {
        label: "depth prepass",
        target: PassTarget::DepthTarget,
        camera: CameraSlot::Depth,
        layers: Layers::DEPTH,
    };
}

/// A scene the driver can animate.
pub trait Animate {
    /// Time added per tick.
    fn time_step(&self) -> f32;

    /// Uniform names that receive the accumulated time.
    fn time_uniforms(&self) -> &'static [&'static str];

    fn scene(&self) -> &Scene;

    fn scene_mut(&mut self) -> &mut Scene;

    /// Scene specific update: asset completions, tweens, camera motion.
    /// `dt` is the wall-clock time since the previous tick and only drives
    /// tweens.
    fn advance(&mut self, time: f32, dt: f32) -> SceneResult<()>;

    fn passes(&self) -> Vec<FramePass> {
        vec![FramePass::SCREEN]
    }
}

/// Receiver of the passes of a frame.
pub trait FrameSink {
    fn draw(&mut self, scene: &Scene, pass: &FramePass) -> SceneResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tick {
    Rendered { time: f32 },
    Stopped,
}

#[derive(Debug)]
pub struct AnimationDriver {
    clock: FrameClock,
    token: CancellationToken,
    frames: u64,
}

impl AnimationDriver {
    pub fn new(step: f32) -> Self {
        Self::with_token(step, CancellationToken::new())
    }

    pub fn with_token(step: f32, token: CancellationToken) -> Self {
        Self {
            clock: FrameClock::new(step),
            token,
            frames: 0,
        }
    }

    /// Driver for `scene`, stepping by its own time step.
    pub fn for_scene<A: Animate + ?Sized>(scene: &A) -> Self {
        Self::new(scene.time_step())
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn time(&self) -> f32 {
        self.clock.time()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick<A, S>(&mut self, scene: &mut A, sink: &mut S, dt: Duration) -> SceneResult<Tick>
    where
        A: Animate + ?Sized,
        S: FrameSink + ?Sized,
    {
        if self.token.is_cancelled() {
            return Ok(Tick::Stopped);
        }
        match self.frame(scene, sink, dt) {
            Ok(time) => {
                self.frames += 1;
                Ok(Tick::Rendered { time })
            }
            Err(err) => {
                log::error!("animation loop stopped after {} frames: {}", self.frames, err);
                self.token.cancel();
                Err(err)
            }
        }
    }

    fn frame<A, S>(&mut self, scene: &mut A, sink: &mut S, dt: Duration) -> SceneResult<f32>
    where
        A: Animate + ?Sized,
        S: FrameSink + ?Sized,
    {
        if scene.scene().is_disposed() {
            return Err(SceneError::Disposed);
        }
        let time = self.clock.advance();
        let names = scene.time_uniforms();
        for (_, material) in scene.scene_mut().materials_mut() {
            for name in names {
                if material.uniforms.contains(name) {
                    material.uniforms.set(name, UniformValue::Float(time))?;
                }
            }
        }
        scene.advance(time, dt.as_secs_f32())?;
        scene.scene_mut().update_world_transforms();
        for pass in scene.passes() {
            sink.draw(scene.scene(), &pass)?;
        }
        Ok(time)
    }
}
