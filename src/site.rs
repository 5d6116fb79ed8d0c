//! The portfolio site: which hero scene each path shows.

use crate::{
    config::{GalleryConfig, LinesConfig, MorphConfig},
    flow::{HeroFlow, InitContext, Out, Router},
    scenes::{gallery::GalleryScene, lines::LinesScene, morph::MorphScene},
};

pub const GALLERY_PATH: &str = "/";
pub const LINES_PATH: &str = "/lines";
pub const MORPH_PATH: &str = "/morphing";

#[derive(Clone, Debug, Default)]
pub struct SiteConfig {
    pub lines: LinesConfig,
    pub morph: MorphConfig,
    pub gallery: GalleryConfig,
}

/// Gallery with its clicks and hovers wired to the transition controller.
pub fn gallery(config: &GalleryConfig, init: InitContext) -> GalleryScene {
    let mut gallery = GalleryScene::new(config.clone(), init.viewport, init.loader());

    let outbox = init.outbox.clone();
    gallery.set_on_click_event(move |index| outbox.borrow_mut().push_back(Out::Open(index)));
    let outbox = init.outbox.clone();
    let fallback = config.hover_colour.clone();
    gallery.set_handle_hover_in(move |post| {
        let colour = post.background_color.clone().unwrap_or_else(|| fallback.clone());
        outbox.borrow_mut().push_back(Out::HoverIn(colour));
    });
    let outbox = init.outbox;
    gallery.set_handle_hover_out(move || outbox.borrow_mut().push_back(Out::HoverOut));
    gallery
}

pub fn router(config: SiteConfig) -> Router {
    let SiteConfig { lines, morph, gallery: gallery_config } = config;
    Router::new()
        .route(GALLERY_PATH, move |init| {
            Ok(Box::new(gallery(&gallery_config, init)) as Box<dyn HeroFlow>)
        })
        .route(LINES_PATH, move |init| {
            let loader = init.loader();
            Ok(Box::new(LinesScene::new(lines.clone(), init.viewport, loader)) as Box<dyn HeroFlow>)
        })
        .route(MORPH_PATH, move |init| {
            let loader = init.loader();
            Ok(Box::new(MorphScene::new(morph.clone(), init.viewport, loader)?) as Box<dyn HeroFlow>)
        })
}

/// Runs the site natively, starting at `path`.
#[cfg(not(target_arch = "wasm32"))]
pub fn start(path: &str) -> anyhow::Result<()> {
    crate::flow::run(router(SiteConfig::default()), path)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() -> Result<(), wasm_bindgen::JsValue> {
    let path = crate::platform::web::current_path();
    crate::flow::run(router(SiteConfig::default()), &path)
        .map_err(|err| wasm_bindgen::JsValue::from_str(&format!("{:#}", err)))
}
