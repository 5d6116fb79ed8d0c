mod common;

use std::{cell::Cell, rc::Rc};

use common::test_utils::{RecordingSink, TestFlow};
use hero_ngin::{
    config::{GalleryConfig, Viewport},
    driver::{AnimationDriver, Animate, FrameClock, Tick},
    flow::HeroFlow,
    lifecycle::CancellationToken,
    resources::{AssetLoader, AssetSource},
    scenes::gallery::GalleryScene,
};
use instant::Duration;

#[test]
fn clock_accumulates_its_step() {
    let mut clock = FrameClock::new(0.25);
    assert_eq!(clock.time(), 0.0);
    clock.advance();
    clock.advance();
    assert_eq!(clock.time(), 0.5);
    assert_eq!(clock.step(), 0.25);
}

#[test]
fn wall_clock_does_not_change_the_step() {
    let mut flow = TestFlow::new("steady", Rc::new(Cell::new(0)));
    let mut driver = AnimationDriver::for_scene(&flow);
    let mut sink = RecordingSink::new();

    driver.tick(&mut flow, &mut sink, Duration::from_millis(4)).unwrap();
    driver.tick(&mut flow, &mut sink, Duration::from_secs(2)).unwrap();
    assert!((driver.time() - 0.02).abs() < 1e-6);
    assert_eq!(sink.labels(), vec!["screen", "screen"]);
}

#[test]
fn a_cancelled_token_stops_drawing() {
    let mut flow = TestFlow::new("cancelled", Rc::new(Cell::new(0)));
    let token = CancellationToken::new();
    let mut driver = AnimationDriver::with_token(0.01, token.clone());
    let mut sink = RecordingSink::new();

    assert!(matches!(
        driver.tick(&mut flow, &mut sink, Duration::ZERO).unwrap(),
        Tick::Rendered { .. }
    ));
    token.cancel();
    assert_eq!(driver.tick(&mut flow, &mut sink, Duration::ZERO).unwrap(), Tick::Stopped);
    assert_eq!(driver.frames(), 1);
    assert_eq!(sink.calls.len(), 1);
}

#[test]
fn gallery_time_reaches_both_time_uniforms() {
    let source = AssetSource::memory([("posts.json", br#"[{"title": "A", "slug": "a"}]"#.to_vec())]);
    let mut gallery = GalleryScene::new(
        GalleryConfig::default(),
        Viewport::new(1200.0, 800.0),
        AssetLoader::in_memory(source),
    );
    gallery.on_init().unwrap();
    let mut driver = AnimationDriver::for_scene(&gallery);
    let mut sink = RecordingSink::new();
    for _ in 0..3 {
        driver.tick(&mut gallery, &mut sink, Duration::ZERO).unwrap();
    }

    let material = gallery.items()[0].material;
    let uniforms = &gallery.scene().material(material).unwrap().uniforms;
    assert!((uniforms.float("time").unwrap() - 0.15).abs() < 1e-5);
    assert_eq!(uniforms.float("time"), uniforms.float("u_time"));
}

#[test]
fn stopping_the_driver_is_final() {
    let mut flow = TestFlow::new("stopped", Rc::new(Cell::new(0)));
    let mut driver = AnimationDriver::for_scene(&flow);
    driver.stop();
    assert!(!driver.is_running());
    assert_eq!(
        driver
            .tick(&mut flow, &mut RecordingSink::new(), Duration::ZERO)
            .unwrap(),
        Tick::Stopped
    );
    assert_eq!(driver.time(), 0.0);
}
