//! Platform collaborators of the transition controller.
//!
//! Natively the cover is drawn by the renderer as a canvas overlay and
//! navigation only changes the mounted route. On the web the cover and the
//! post titles are DOM elements and navigation goes through the history API.

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::{
    input::{Chrome, ChromeRegions},
    transition::{CoverStyle, CoverSurface, Navigator, TitleMarkers},
};

/// CSS selector matching every element flagged with `id`. Pages may repeat
/// the id, so lookups go through `querySelectorAll` rather than by id.
pub fn title_selector(id: &str) -> String {
    format!("[id=\"{}\"]", id)
}

/// Everything the app needs from the host besides the window.
pub struct Platform {
    pub cover: Box<dyn CoverSurface>,
    pub navigator: Box<dyn Navigator>,
    pub titles: Box<dyn TitleMarkers>,
    pub chrome: Box<dyn Chrome>,
    /// True when the renderer has to draw the cover itself.
    pub overlay: bool,
}

/// Cover drawn on the canvas. It only remembers the last style it was given.
#[derive(Clone, Debug, Default)]
pub struct OverlayCover {
    style: CoverStyle,
}

impl OverlayCover {
    pub fn style(&self) -> &CoverStyle {
        &self.style
    }
}

impl CoverSurface for OverlayCover {
    fn exists(&self) -> bool {
        true
    }

    fn apply(&mut self, style: &CoverStyle) {
        self.style = *style;
    }
}

/// Keeps the visited paths; there is no address bar to update natively.
#[derive(Clone, Debug, Default)]
pub struct HistoryLog {
    visited: Vec<String>,
}

impl HistoryLog {
    pub fn visited(&self) -> &[String] {
        &self.visited
    }
}

impl Navigator for HistoryLog {
    fn navigate(&mut self, destination: &str) {
        log::info!("navigate {}", destination);
        self.visited.push(destination.to_string());
    }
}

/// Hover state of titles that are not drawn.
#[derive(Clone, Copy, Debug, Default)]
pub struct TitleState {
    pub hovered: bool,
}

impl TitleMarkers for TitleState {
    fn set_hover(&mut self, hovered: bool) {
        self.hovered = hovered;
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn collaborators() -> Platform {
    Platform {
        cover: Box::new(OverlayCover::default()),
        navigator: Box::new(HistoryLog::default()),
        titles: Box::new(TitleState::default()),
        chrome: Box::new(ChromeRegions::default()),
        overlay: true,
    }
}

#[cfg(target_arch = "wasm32")]
pub fn collaborators() -> Platform {
    Platform {
        cover: Box::new(web::DomCover::new(web::COVER_ID)),
        navigator: Box::new(web::BrowserHistory),
        titles: Box::new(web::DomTitleMarkers::new(web::TITLE_ID)),
        chrome: Box::new(web::DomChrome::new(web::CHROME_SELECTOR)),
        overlay: false,
    }
}
