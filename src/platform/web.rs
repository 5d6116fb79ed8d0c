//! DOM collaborators. Missing elements are skipped with a log line.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use crate::{
    input::Chrome,
    platform::title_selector,
    transition::{CoverStyle, CoverSurface, Navigator, TitleMarkers},
};

pub const COVER_ID: &str = "transition";
pub const TITLE_ID: &str = "postTitle";
pub const CHROME_SELECTOR: &str = "nav";

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn element(id: &str) -> Option<HtmlElement> {
    document()?.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
}

/// CSS declarations for `style`.
pub fn css(style: &CoverStyle) -> [(&'static str, String); 5] {
    let [r, g, b, a] = style.background;
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [
        ("transform", format!("translateX({}%)", style.x_percent)),
        ("opacity", style.opacity.to_string()),
        ("filter", format!("blur({}px)", style.blur)),
        ("border-radius", format!("{}rem", style.radius_rem)),
        (
            "background-color",
            format!("rgba({}, {}, {}, {})", channel(r), channel(g), channel(b), a),
        ),
    ]
}

#[derive(Clone, Debug)]
pub struct DomCover {
    id: &'static str,
}

impl DomCover {
    pub fn new(id: &'static str) -> Self {
        Self { id }
    }
}

impl CoverSurface for DomCover {
    fn exists(&self) -> bool {
        element(self.id).is_some()
    }

    fn apply(&mut self, style: &CoverStyle) {
        let Some(cover) = element(self.id) else {
            return;
        };
        let declarations = cover.style();
        for (property, value) in css(style) {
            if let Err(err) = declarations.set_property(property, &value) {
                log::warn!("could not set {} on #{}: {:?}", property, self.id, err);
            }
        }
    }
}

/// Client-side navigation through `history.pushState`.
#[derive(Clone, Copy, Debug)]
pub struct BrowserHistory;

impl Navigator for BrowserHistory {
    fn navigate(&mut self, destination: &str) {
        let pushed = web_sys::window()
            .and_then(|window| window.history().ok())
            .map(|history| history.push_state_with_url(&JsValue::NULL, "", Some(destination)));
        match pushed {
            Some(Ok(())) => (),
            Some(Err(err)) => log::warn!("pushState to {} failed: {:?}", destination, err),
            None => log::warn!("no history to push {} onto", destination),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DomTitleMarkers {
    id: &'static str,
}

impl DomTitleMarkers {
    pub fn new(id: &'static str) -> Self {
        Self { id }
    }
}

fn elements(selector: &str) -> Vec<Element> {
    let Some(nodes) = document().and_then(|document| document.query_selector_all(selector).ok()) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|index| nodes.get(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl TitleMarkers for DomTitleMarkers {
    fn set_hover(&mut self, hovered: bool) {
        for title in elements(&title_selector(self.id)) {
            if let Err(err) = title.class_list().toggle_with_force("hover", hovered) {
                log::warn!("could not mark #{}: {:?}", self.id, err);
            }
        }
    }
}

/// Pointer positions over an element matching `selector` belong to the
/// page navigation.
#[derive(Clone, Debug)]
pub struct DomChrome {
    selector: &'static str,
}

impl DomChrome {
    pub fn new(selector: &'static str) -> Self {
        Self { selector }
    }
}

impl Chrome for DomChrome {
    fn contains(&self, point: [f32; 2]) -> bool {
        document()
            .and_then(|document| document.element_from_point(point[0], point[1]))
            .and_then(|element| element.closest(self.selector).ok().flatten())
            .is_some()
    }
}

/// Path of the current page, `/` when unavailable.
pub fn current_path() -> String {
    web_sys::window()
        .and_then(|window| window.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}
