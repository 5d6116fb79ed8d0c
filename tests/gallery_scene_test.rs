mod common;

use common::test_utils::{RecordingSink, png};
use hero_ngin::{
    CursorIcon,
    config::{GalleryConfig, Viewport},
    driver::{AnimationDriver, Animate},
    flow::{HeroFlow, InitContext, Out, Outbox},
    input::{CanvasRect, PointerEvent},
    lifecycle::CancellationToken,
    resources::{AssetSource, Spawner},
    scenes::gallery::GalleryScene,
    site,
    uniforms::{TextureSlot, UniformValue},
};
use instant::Duration;

const TWO_POSTS: &str = r#"[
    {"title": "Lines", "slug": "lines", "backgroundImage": {"url": "images/lines.png"}},
    {"title": "Morphing", "slug": "morphing", "backgroundImage": {"url": "images/morphing.png"}}
]"#;

const THREE_POSTS: &str = r#"[
    {"title": "Square", "slug": "square", "backgroundImage": {"url": "images/square.png"}},
    {"title": "Wide", "slug": "wide", "backgroundImage": {"url": "images/wide.png"}},
    {"title": "Tall", "slug": "tall", "backgroundImage": {"url": "images/tall.png"}}
]"#;

const TINTED_POST: &str = r##"[
    {"title": "Lines", "slug": "lines", "backgroundColor": "#50c8fc",
     "backgroundImage": {"url": "images/lines.png"}}
]"##;

const ONE_POST: &str = r#"[
    {"title": "Lines", "slug": "lines", "backgroundImage": {"url": "images/lines.png"}}
]"#;

struct Harness {
    gallery: GalleryScene,
    driver: AnimationDriver,
    sink: RecordingSink,
    outbox: Outbox,
}

impl Harness {
    fn new(posts: &str, viewport: Viewport) -> Self {
        Self::with_images(posts, viewport, vec![("images/lines.png", png(4, 2))])
    }

    fn with_images<'a>(posts: &'a str, viewport: Viewport, images: Vec<(&'a str, Vec<u8>)>) -> Self {
        let files = images
            .into_iter()
            .chain([("posts.json", posts.as_bytes().to_vec())]);
        let outbox = Outbox::default();
        let init = InitContext {
            viewport,
            outbox: outbox.clone(),
            spawner: Spawner::Inline,
            source: AssetSource::memory(files),
            token: CancellationToken::new(),
        };
        let mut gallery = site::gallery(&GalleryConfig::default(), init);
        gallery.on_init().unwrap();
        let driver = AnimationDriver::for_scene(&gallery);
        Self {
            gallery,
            driver,
            sink: RecordingSink::new(),
            outbox,
        }
    }

    fn narrow(posts: &str) -> Self {
        Self::new(posts, Viewport::new(400.0, 800.0))
    }

    fn tick(&mut self) {
        self.driver
            .tick(&mut self.gallery, &mut self.sink, Duration::from_millis(16))
            .unwrap();
    }

    fn pointer(&self, client: [f32; 2]) -> PointerEvent {
        PointerEvent::new(client, CanvasRect::sized(400.0, 280.0))
    }

    fn take(&self) -> Vec<Out> {
        self.outbox.borrow_mut().drain(..).collect()
    }
}

#[test]
fn one_plane_and_material_per_post() {
    let mut harness = Harness::narrow(TWO_POSTS);
    assert!(harness.gallery.items().is_empty());

    harness.tick();
    let gallery = &harness.gallery;
    assert_eq!(gallery.items().len(), 2);
    assert_eq!(gallery.scene().material_count(), gallery.items().len());
    assert_eq!(gallery.scene().texture_count(), 2);
    assert_eq!(gallery.scene().geometry_count(), 1);
    assert_eq!(harness.sink.calls.last().unwrap().meshes, 2);

    // Every plane shares the geometry and samples its own image.
    for item in gallery.items() {
        let mesh = gallery.scene().mesh(item.mesh).unwrap();
        assert_eq!(mesh.geometry, gallery.geometry());
        let material = gallery.scene().material(item.material).unwrap();
        assert_eq!(
            material.uniforms.texture("texture1"),
            Some(TextureSlot::Image(item.texture))
        );
    }
}

#[test]
fn images_arrive_and_are_fitted_to_the_viewport() {
    let mut harness = Harness::narrow(TWO_POSTS);
    harness.tick();
    harness.tick();

    let gallery = &harness.gallery;
    let first = &gallery.items()[0];
    assert_eq!(gallery.scene().texture(first.texture).unwrap().dimensions(), Some((4, 2)));
    let material = gallery.scene().material(first.material).unwrap();
    assert_eq!(
        material.uniforms.get("uvTransform"),
        Some(&UniformValue::Vec4([0.25, 1.0, 0.375, 0.0]))
    );

    // The second image is missing and falls back to a blank pixel.
    let second = &gallery.items()[1];
    assert_eq!(gallery.scene().texture(second.texture).unwrap().dimensions(), Some((1, 1)));
}

#[test]
fn narrow_layout_keeps_a_strip_of_the_window() {
    let harness = Harness::narrow(ONE_POST);
    assert!(harness.gallery.is_mobile());
    assert!((harness.gallery.canvas_height() - 280.0).abs() < 1e-3);
    let camera = &harness.gallery.scene().camera;
    assert_eq!(camera.position, cgmath::Point3::new(0.0, 0.0, 0.0));
}

#[test]
fn hover_reports_once_per_episode() {
    let mut harness = Harness::narrow(ONE_POST);
    harness.tick();

    let out = harness.gallery.on_pointer_move(&harness.pointer([200.0, 140.0])).unwrap();
    assert!(matches!(out, Out::Cursor(CursorIcon::Pointer)));
    let pushed = harness.take();
    assert_eq!(pushed.len(), 1);
    assert!(matches!(&pushed[0], Out::HoverIn(colour) if colour == "#1d1d1f"));

    harness.gallery.on_pointer_move(&harness.pointer([201.0, 141.0])).unwrap();
    assert!(harness.take().is_empty());

    let out = harness.gallery.on_pointer_move(&harness.pointer([5.0, 5.0])).unwrap();
    assert!(matches!(out, Out::Cursor(CursorIcon::Default)));
    let pushed = harness.take();
    assert_eq!(pushed.len(), 1);
    assert!(matches!(pushed[0], Out::HoverOut));
}

#[test]
fn hovered_planes_receive_the_mouse() {
    let mut harness = Harness::narrow(ONE_POST);
    harness.tick();
    harness.gallery.on_pointer_move(&harness.pointer([200.0, 140.0])).unwrap();

    let item = &harness.gallery.items()[0];
    let material = harness.gallery.scene().material(item.material).unwrap();
    assert_eq!(material.uniforms.vec2("mouse"), Some([0.0, 0.0]));
    assert_eq!(material.uniforms.vec2("u_mouse"), Some([0.0, 0.0]));
}

#[test]
fn click_on_a_plane_opens_its_post() {
    let mut harness = Harness::narrow(ONE_POST);
    harness.tick();
    let event = harness.pointer([200.0, 140.0]);
    harness.gallery.on_pointer_move(&event).unwrap();
    harness.take();

    harness.gallery.on_click(&event).unwrap();
    let pushed = harness.take();
    assert_eq!(pushed.len(), 1);
    assert!(matches!(pushed[0], Out::Open(0)));
    assert_eq!(harness.gallery.link(0).as_deref(), Some("/lines"));
    assert_eq!(harness.gallery.link(3), None);
}

#[test]
fn clicks_over_the_chrome_are_ignored() {
    let mut harness = Harness::narrow(ONE_POST);
    harness.tick();
    let event = harness.pointer([200.0, 140.0]);
    harness.gallery.on_pointer_move(&event).unwrap();
    harness.take();

    harness.gallery.on_click(&event.over_chrome(true)).unwrap();
    assert!(harness.take().is_empty());
}

#[test]
fn click_off_every_plane_does_nothing() {
    let mut harness = Harness::narrow(ONE_POST);
    harness.tick();
    let event = harness.pointer([5.0, 5.0]);
    harness.gallery.on_pointer_move(&event).unwrap();
    harness.gallery.on_click(&event).unwrap();
    assert!(harness.take().is_empty());
}

#[test]
fn resize_swaps_the_shared_geometry() {
    let mut harness = Harness::narrow(TWO_POSTS);
    harness.tick();
    let before = harness.gallery.geometry();

    harness.gallery.on_resize(Viewport::new(1200.0, 800.0)).unwrap();
    let gallery = &harness.gallery;
    assert!(!gallery.is_mobile());
    assert_ne!(gallery.geometry(), before);
    assert_eq!(gallery.scene().geometry_count(), 1);
    for item in gallery.items() {
        assert_eq!(gallery.scene().mesh(item.mesh).unwrap().geometry, gallery.geometry());
    }
    assert!((gallery.scene().camera.aspect - 1.5).abs() < 1e-6);
}

#[test]
fn teardown_drops_callbacks_and_scene() {
    let mut harness = Harness::narrow(TWO_POSTS);
    harness.tick();
    let report = harness.gallery.teardown();
    assert_eq!(report.meshes, 2);
    assert_eq!(report.materials, 2);
    assert_eq!(report.textures, 2);
    assert_eq!(report.listeners, 3);
    // Image loads were still queued.
    assert_eq!(report.cancelled_loads, 2);
    assert!(harness.gallery.items().is_empty());
    assert!(harness.gallery.scene().is_disposed());
}

#[test]
fn hover_reports_the_colour_of_the_hovered_post() {
    let mut harness = Harness::narrow(TINTED_POST);
    harness.tick();

    harness.gallery.on_pointer_move(&harness.pointer([200.0, 140.0])).unwrap();
    let pushed = harness.take();
    assert_eq!(pushed.len(), 1);
    assert!(matches!(&pushed[0], Out::HoverIn(colour) if colour == "#50c8fc"));
}

#[test]
fn three_posts_build_three_independent_planes() {
    let mut harness = Harness::with_images(
        THREE_POSTS,
        Viewport::new(400.0, 800.0),
        vec![
            ("images/square.png", png(2, 2)),
            ("images/wide.png", png(4, 2)),
            ("images/tall.png", png(2, 4)),
        ],
    );
    harness.tick();
    harness.tick();

    let gallery = &harness.gallery;
    assert_eq!(gallery.scene().mesh_count(), 3);
    assert_eq!(gallery.scene().material_count(), 3);
    assert_eq!(gallery.scene().group_count(), 3);
    assert_eq!(gallery.scene().geometry_count(), 1);

    // Each material samples the image of its own post.
    let expected = [(2, 2), (4, 2), (2, 4)];
    for (item, dims) in gallery.items().iter().zip(expected) {
        let material = gallery.scene().material(item.material).unwrap();
        assert_eq!(
            material.uniforms.texture("texture1"),
            Some(TextureSlot::Image(item.texture))
        );
        assert_eq!(gallery.scene().texture(item.texture).unwrap().dimensions(), Some(dims));
    }

    let before = gallery.geometry();
    harness.gallery.on_resize(Viewport::new(1200.0, 800.0)).unwrap();
    let gallery = &harness.gallery;
    assert_eq!(gallery.scene().mesh_count(), 3);
    assert_eq!(gallery.scene().geometry_count(), 1);
    assert_ne!(gallery.geometry(), before);

    let report = harness.gallery.teardown();
    assert_eq!((report.meshes, report.groups, report.materials, report.textures), (3, 3, 3, 3));
    assert_eq!(report.geometries, 1);
    assert!(
        harness
            .driver
            .tick(&mut harness.gallery, &mut harness.sink, Duration::ZERO)
            .is_err()
    );
}
