//! Flow control and application event loop.
//!
//! A "flow" is one mounted hero scene together with its input hooks. The
//! [`Shell`] owns the mounted flow, the route table and the transition
//! controller; it runs without a GPU so the routing logic can be tested on
//! its own. [`App`] wraps a shell in the winit event loop, forwards window
//! input to the flow and renders it every frame.
//!
//! # User-facing types
//!
//! - [`HeroFlow`] is the trait for scenes that handle input
//! - [`Out`] is what a hook hands back to the shell
//! - [`Router`] maps paths to flow constructors
//!
//! # Lifecycle Flow
//!
//! Each frame:
//! 1. Advance the transition cover tweens
//! 2. Tick the animation driver of the mounted flow into the renderer
//! 3. Draw the cover overlay and present
//! 4. Drain the outbox: navigation, mounts, hover colours, cursor changes

use std::{cell::RefCell, collections::VecDeque, fmt::Debug, iter, rc::Rc, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{CursorIcon, Window},
};

use crate::{
    config::Viewport,
    context::Context,
    driver::{Animate, AnimationDriver},
    error::{SceneError, SceneResult},
    input::PointerEvent,
    lifecycle::{CancellationToken, DisposeReport, EventKind, Listeners},
    pipelines::cover::CoverUniform,
    platform::Platform,
    render::Renderer,
    resources::{AssetLoader, AssetSource, Spawner},
    transition::{CoverSurface, Navigator, TitleMarkers, TransitionController},
};

/// Pixels one wheel line scrolls, as browsers report it.
const LINE_PX: f32 = 100.0;

///
/// This is the Output Type for every hook of a flow.
///
/// `Out::Navigate` starts a page transition to a path; the new route is
/// mounted behind the cover once it closes. `Out::Open` does the same for
/// the link a flow exposes at an index.
///
/// `Out::Mount` swaps the mounted flow immediately. The navigator issues it
/// once the cover is closed.
///
/// `Out::Configure` can be used to modify the Context during runtime, for
/// instance to change the clear colour.
///
/// `Empty` is the default output used when nothing needs to be handled.
///
pub enum Out {
    Navigate(String),
    Open(usize),
    Mount(String),
    HoverIn(String),
    HoverOut,
    Cursor(CursorIcon),
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl Default for Out {
    fn default() -> Self {
        Self::Empty
    }
}

impl Debug for Out {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Navigate(path) => f.debug_tuple("Navigate").field(path).finish(),
            Self::Open(index) => f.debug_tuple("Open").field(index).finish(),
            Self::Mount(path) => f.debug_tuple("Mount").field(path).finish(),
            Self::HoverIn(colour) => f.debug_tuple("HoverIn").field(colour).finish(),
            Self::HoverOut => f.write_str("HoverOut"),
            Self::Cursor(icon) => f.debug_tuple("Cursor").field(icon).finish(),
            Self::Configure(_) => f.write_str("Configure(|&mut Context| -> {...})"),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

/// Outputs queued by callbacks that cannot return them directly.
pub type Outbox = Rc<RefCell<VecDeque<Out>>>;

/// A mounted hero scene.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once right after the flow is constructed
/// 2. the input hooks are called for every event kind the flow listens to
/// 3. the animation driver ticks it every frame through [`Animate`]
/// 4. `teardown()` is called once when another route is mounted
///
pub trait HeroFlow: Animate {
    fn name(&self) -> &'static str;

    fn on_init(&mut self) -> SceneResult<Out> {
        Ok(Out::Empty)
    }

    fn on_pointer_move(&mut self, _event: &PointerEvent) -> SceneResult<Out> {
        Ok(Out::Empty)
    }

    fn on_click(&mut self, _event: &PointerEvent) -> SceneResult<Out> {
        Ok(Out::Empty)
    }

    /// `delta_y` in pixels, positive when scrolling down.
    fn on_wheel(&mut self, _delta_y: f32) -> SceneResult<Out> {
        Ok(Out::Empty)
    }

    fn on_resize(&mut self, _viewport: Viewport) -> SceneResult<Out> {
        Ok(Out::Empty)
    }

    /// Destination of the link at `index`, for flows that show links.
    fn link(&self, _index: usize) -> Option<String> {
        None
    }

    fn listeners(&self) -> &Listeners;

    /// Cancels outstanding work and releases the scene.
    fn teardown(&mut self) -> DisposeReport;
}

impl Debug for dyn HeroFlow + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HeroFlow").field(&self.name()).finish()
    }
}

/// What a flow constructor gets to build its scene.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub viewport: Viewport,
    pub outbox: Outbox,
    pub spawner: Spawner,
    pub source: AssetSource,
    /// Cancelled when the flow is unmounted.
    pub token: CancellationToken,
}

impl InitContext {
    pub fn loader(&self) -> AssetLoader {
        AssetLoader::with_token(self.spawner.clone(), self.source.clone(), self.token.clone())
    }

    pub fn emit(&self, out: Out) {
        self.outbox.borrow_mut().push_back(out);
    }
}

/// Type alias for a flow constructor (factory function).
pub type FlowConstructor = Box<dyn Fn(InitContext) -> SceneResult<Box<dyn HeroFlow>>>;

#[derive(Default)]
pub struct Router {
    routes: Vec<(String, FlowConstructor)>,
}

impl Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.paths()).finish()
    }
}

/// `/lines/` and `lines` both name `/lines`.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    format!("/{}", trimmed)
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route; a later route for the same path replaces the earlier one.
    pub fn route<F>(mut self, path: &str, constructor: F) -> Self
    where
        F: Fn(InitContext) -> SceneResult<Box<dyn HeroFlow>> + 'static,
    {
        let path = normalize_path(path);
        self.routes.retain(|(existing, _)| *existing != path);
        self.routes.push((path, Box::new(constructor)));
        self
    }

    pub fn resolve(&self, path: &str) -> SceneResult<&FlowConstructor> {
        let path = normalize_path(path);
        self.routes
            .iter()
            .find(|(route, _)| *route == path)
            .map(|(_, constructor)| constructor)
            .ok_or(SceneError::UnknownRoute(path))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|(path, _)| path.as_str())
    }
}

/// Navigates through the platform, then asks the shell to mount the
/// destination.
#[derive(Debug)]
pub struct MountingNavigator<N> {
    inner: N,
    outbox: Outbox,
}

impl<N: Navigator> MountingNavigator<N> {
    pub fn new(inner: N, outbox: Outbox) -> Self {
        Self { inner, outbox }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }
}

impl<N: Navigator> Navigator for MountingNavigator<N> {
    fn navigate(&mut self, destination: &str) {
        self.inner.navigate(destination);
        self.outbox
            .borrow_mut()
            .push_back(Out::Mount(destination.to_string()));
    }
}

#[derive(Debug)]
pub struct Mounted {
    pub path: String,
    pub flow: Box<dyn HeroFlow>,
    pub driver: AnimationDriver,
}

/// Outputs the shell could not handle on its own.
#[derive(Debug, Default)]
pub struct Drained {
    /// Cursor and context changes for the window.
    pub platform: Vec<Out>,
    /// The previous flow was torn down; its GPU resources can go.
    pub remounted: bool,
}

/// Routing, transitions and the mounted flow, without a window.
pub struct Shell<C, N, T> {
    router: Router,
    controller: TransitionController<C, MountingNavigator<N>, T>,
    outbox: Outbox,
    mounted: Option<Mounted>,
    viewport: Viewport,
    spawner: Spawner,
    source: AssetSource,
}

impl<C, N, T> Shell<C, N, T>
where
    C: CoverSurface,
    N: Navigator,
    T: TitleMarkers,
{
    pub fn new(router: Router, cover: C, navigator: N, titles: T, spawner: Spawner, source: AssetSource) -> Self {
        let outbox = Outbox::default();
        let navigator = MountingNavigator::new(navigator, outbox.clone());
        Self {
            router,
            controller: TransitionController::new(cover, navigator, titles),
            outbox,
            mounted: None,
            viewport: Viewport::default(),
            spawner,
            source,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn controller(&self) -> &TransitionController<C, MountingNavigator<N>, T> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TransitionController<C, MountingNavigator<N>, T> {
        &mut self.controller
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn mounted(&self) -> Option<&Mounted> {
        self.mounted.as_ref()
    }

    pub fn mounted_mut(&mut self) -> Option<&mut Mounted> {
        self.mounted.as_mut()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// True while something on screen still moves.
    pub fn is_animating(&self) -> bool {
        self.controller.is_animating() || self.mounted.as_ref().is_some_and(|m| m.driver.is_running())
    }

    /// Builds the flow of `path` and swaps it in for the mounted one, which
    /// is then torn down. An unknown path or a failing constructor leaves the
    /// mounted flow in place.
    pub fn mount(&mut self, path: &str) -> SceneResult<DisposeReport> {
        let constructor = self.router.resolve(path)?;
        let token = CancellationToken::new();
        let init = InitContext {
            viewport: self.viewport,
            outbox: self.outbox.clone(),
            spawner: self.spawner.clone(),
            source: self.source.clone(),
            token: token.clone(),
        };
        let mut flow = constructor(init)?;
        let report = unmount_slot(&mut self.mounted);
        let driver = AnimationDriver::with_token(flow.time_step(), token);
        log::info!("mounted {} at {}", flow.name(), normalize_path(path));
        match flow.on_init() {
            Ok(out) => self.outbox.borrow_mut().push_back(out),
            Err(err) => log::warn!("{} failed to initialize: {}", flow.name(), err),
        }
        self.mounted = Some(Mounted {
            path: normalize_path(path),
            flow,
            driver,
        });
        Ok(report)
    }

    /// Stops and releases the mounted flow.
    pub fn unmount(&mut self) -> DisposeReport {
        unmount_slot(&mut self.mounted)
    }

    /// Runs `hook` on the mounted flow if it listens to `kind` and queues
    /// what it returns.
    pub fn dispatch<F>(&mut self, kind: EventKind, hook: F)
    where
        F: FnOnce(&mut dyn HeroFlow) -> SceneResult<Out>,
    {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        if !mounted.flow.listeners().is_listening(kind) {
            return;
        }
        match hook(mounted.flow.as_mut()) {
            Ok(out) => self.outbox.borrow_mut().push_back(out),
            Err(err) => log::warn!("{} ignored {:?}: {}", mounted.flow.name(), kind, err),
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.dispatch(EventKind::Resize, |flow| flow.on_resize(viewport));
    }

    /// Advances the cover and handles whatever it queued.
    pub fn tick(&mut self, dt: f32) -> Drained {
        self.controller.tick(dt);
        self.drain()
    }

    /// Handles queued outputs until the outbox is empty.
    pub fn drain(&mut self) -> Drained {
        let mut drained = Drained::default();
        loop {
            // The borrow must end before handling: mounts queue more outputs.
            let next = self.outbox.borrow_mut().pop_front();
            let Some(out) = next else {
                break;
            };
            match out {
                Out::Navigate(path) => self.navigate(&path),
                Out::Open(index) => {
                    match self.mounted.as_ref().and_then(|m| m.flow.link(index)) {
                        Some(path) => self.navigate(&path),
                        None => log::warn!("no link at index {}", index),
                    }
                }
                Out::Mount(path) => {
                    match self.mount(&path) {
                        Ok(report) => {
                            log::debug!("released {:?}", report);
                            drained.remounted = true;
                        }
                        Err(err) => log::error!("could not mount {}: {}", path, err),
                    }
                    self.controller.transition_out();
                }
                Out::HoverIn(colour) => self.controller.hover_in(&colour),
                Out::HoverOut => self.controller.hover_out(),
                Out::Empty => (),
                platform @ (Out::Cursor(_) | Out::Configure(_)) => drained.platform.push(platform),
            }
        }
        drained
    }

    fn navigate(&mut self, path: &str) {
        let path = normalize_path(path);
        if let Err(err) = self.controller.transition_in(&path) {
            log::warn!("{}", err);
        }
    }
}

fn unmount_slot(slot: &mut Option<Mounted>) -> DisposeReport {
    match slot.take() {
        Some(mut mounted) => {
            mounted.driver.stop();
            let report = mounted.flow.teardown();
            log::debug!("unmounted {}: {:?}", mounted.path, report);
            report
        }
        None => DisposeReport::default(),
    }
}

type DynShell = Shell<Box<dyn CoverSurface>, Box<dyn Navigator>, Box<dyn TitleMarkers>>;

/// Window, GPU and shell once the surface exists.
pub struct AppState {
    pub(crate) ctx: Context,
    renderer: Renderer,
    shell: DynShell,
    /// Draws the cover on the canvas; on the web the DOM element does it.
    overlay: bool,
    pointer: Option<PointerEvent>,
    is_surface_configured: bool,
}

impl AppState {
    fn new(mut ctx: Context, router: Router, platform: Platform, spawner: Spawner) -> Self {
        let renderer = Renderer::new(&ctx.device, &ctx.queue, ctx.config.format);
        let shell = Shell::new(
            router,
            platform.cover,
            platform.navigator,
            platform.titles,
            spawner,
            AssetSource::Assets,
        )
        .with_viewport(ctx.viewport);
        ctx.chrome = platform.chrome;
        Self {
            ctx,
            renderer,
            shell,
            overlay: platform.overlay,
            pointer: None,
            is_surface_configured: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
            self.shell.resize(self.ctx.viewport);
        }
    }

    fn mount_initial(&mut self, path: &str) {
        match self.shell.mount(path) {
            Ok(_) => (),
            Err(SceneError::UnknownRoute(route)) => {
                log::warn!("unknown route {}, showing /", route);
                if let Err(err) = self.shell.mount("/") {
                    log::error!("could not mount /: {}", err);
                }
            }
            Err(err) => log::error!("could not mount {}: {}", path, err),
        }
        self.apply(Drained::default());
    }

    /// Handles `drained`, then whatever is still in the shell's outbox.
    fn apply(&mut self, drained: Drained) {
        self.handle(drained);
        let rest = self.shell.drain();
        self.handle(rest);
    }

    fn handle(&mut self, drained: Drained) {
        // The new flow's Configure outputs follow in `platform`.
        if drained.remounted {
            self.ctx.clear_colour = wgpu::Color::TRANSPARENT;
            self.renderer.release();
        }
        for out in drained.platform {
            match out {
                Out::Cursor(icon) => self.ctx.window.set_cursor(icon),
                Out::Configure(f) => f(&mut self.ctx),
                other => log::warn!("unhandled {:?}", other),
            }
        }
    }

    fn render(&mut self, dt: instant::Duration) -> SceneResult<()> {
        let drained = self.shell.tick(dt.as_secs_f32());
        self.apply(drained);

        if !self.is_surface_configured {
            return Ok(());
        }

        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(texture) | wgpu::CurrentSurfaceTexture::Suboptimal(texture) => texture,
            wgpu::CurrentSurfaceTexture::Timeout | wgpu::CurrentSurfaceTexture::Occluded => return Ok(()),
            wgpu::CurrentSurfaceTexture::Outdated | wgpu::CurrentSurfaceTexture::Lost => {
                return Err(SceneError::Surface("lost or outdated".to_string()));
            }
            wgpu::CurrentSurfaceTexture::Validation => {
                return Err(SceneError::Surface("validation error".to_string()));
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let size = self.ctx.size();
        let cover = CoverUniform::from_style(
            self.shell.controller().style(),
            size,
            self.ctx.viewport.pixel_ratio,
        );
        {
            let mut frame = self.renderer.frame(
                &self.ctx.device,
                &self.ctx.queue,
                &mut encoder,
                &view,
                &self.ctx.depth_texture.view,
                size,
                self.ctx.clear_colour,
            );
            if let Some(mounted) = self.shell.mounted_mut()
                && let Err(err) = mounted.driver.tick(mounted.flow.as_mut(), &mut frame, dt)
            {
                log::error!("{} stopped: {}", mounted.flow.name(), err);
            }
            frame.draw_cover(self.overlay.then_some(&cover));
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn pointer_moved(&mut self, physical: [f64; 2]) {
        let event = self.ctx.pointer(physical);
        self.pointer = Some(event);
        self.shell
            .dispatch(EventKind::PointerMove, |flow| flow.on_pointer_move(&event));
    }

    fn clicked(&mut self) {
        if let Some(event) = self.pointer {
            self.shell.dispatch(EventKind::Click, |flow| flow.on_click(&event));
        }
    }

    fn wheel(&mut self, delta: MouseScrollDelta) {
        // Browsers report a positive delta when scrolling down, winit the
        // opposite.
        let delta_y = match delta {
            MouseScrollDelta::LineDelta(_, y) => -y * LINE_PX,
            MouseScrollDelta::PixelDelta(position) => -(position.y as f32),
        };
        self.shell.dispatch(EventKind::Wheel, |flow| flow.on_wheel(delta_y));
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized(Box<Context>),
    #[allow(dead_code)]
    Exit,
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(ctx) => f.debug_tuple("Initialized").field(ctx).finish(),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    state: Option<AppState>,
    // Taken once the context exists.
    router: Option<Router>,
    initial_path: String,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, router: Router, initial_path: String) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            router: Some(router),
            initial_path,
            last_time: Instant::now(),
        })
    }

    fn spawner(&self) -> Spawner {
        #[cfg(not(target_arch = "wasm32"))]
        {
            Spawner::Tokio(self.async_runtime.handle().clone())
        }
        #[cfg(target_arch = "wasm32")]
        {
            Spawner::Local
        }
    }

    fn initialized(&mut self, ctx: Context) {
        let Some(router) = self.router.take() else {
            log::warn!("context initialized twice");
            return;
        };
        let mut state = AppState::new(ctx, router, crate::platform::collaborators(), self.spawner());
        let size = state.ctx.window.inner_size();
        state.resize(size.width, size.height);
        state.mount_initial(&self.initial_path);
        state.ctx.window.request_redraw();
        self.last_time = Instant::now();
        self.state = Some(state);
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.router.is_none() {
            return;
        }
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("hero-ngin");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = wgpu::web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID))
                .and_then(|canvas| canvas.dyn_into::<web_sys::HtmlCanvasElement>().ok());
            if canvas.is_none() {
                log::warn!("no #{} element, winit creates its own canvas", CANVAS_ID);
            }
            window_attributes = window_attributes.with_canvas(canvas);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("could not create a window: {}", err);
                event_loop.exit();
                return;
            }
        };

        let init_future = Context::new(window);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(ctx) => self.initialized(ctx),
                Err(err) => {
                    log::error!("cannot create the main context: {:#}", err);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(ctx) => FlowEvent::Initialized(Box::new(ctx)),
                    Err(err) => {
                        log::error!("cannot create the main context: {:#}", err);
                        FlowEvent::Exit
                    }
                };
                if proxy.send_event(event).is_err() {
                    log::error!("event loop closed before the context was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            FlowEvent::Initialized(ctx) => self.initialized(*ctx),
            FlowEvent::Exit => event_loop.exit(),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                let report = state.shell.unmount();
                log::info!("closing: {:?}", report);
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::CursorMoved { position, .. } => state.pointer_moved([position.x, position.y]),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => state.clicked(),
            WindowEvent::MouseWheel { delta, .. } => state.wheel(delta),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                match state.render(dt) {
                    Ok(()) => (),
                    // Reconfigure the surface if it's lost or outdated
                    Err(SceneError::Surface(reason)) => {
                        log::debug!("surface {}, reconfiguring", reason);
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => log::error!("Unable to render {}", e),
                }
                if state.shell.is_animating() {
                    state.ctx.window.request_redraw();
                }
            }
            _ => {}
        }
        // Input may have started a transition on a stopped scene.
        let drained = state.shell.drain();
        state.apply(drained);
        if state.shell.controller().is_animating() {
            state.ctx.window.request_redraw();
        }
    }
}

/// Opens the window and runs `router`, starting at `initial_path`.
pub fn run(router: Router, initial_path: &str) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info)?;
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, router, initial_path.to_string())?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
