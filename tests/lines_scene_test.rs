mod common;

use common::test_utils::{RecordingSink, glb, memory_loader, triangle};
use hero_ngin::{
    SceneError,
    config::{LinesConfig, Viewport},
    driver::{AnimationDriver, Animate, Tick},
    flow::HeroFlow,
    input::{CanvasRect, PointerEvent},
    scenes::lines::LinesScene,
    uniforms::TextureSlot,
};
use instant::Duration;

fn skull_scene() -> LinesScene {
    let skull = triangle(0.0);
    let loader = memory_loader(vec![(
        "Skull.glb",
        glb(&[("Prop_Skull", &skull), ("Stand", &triangle(3.0))]),
    )]);
    LinesScene::new(LinesConfig::default(), Viewport::new(800.0, 600.0), loader)
}

fn tick(scene: &mut LinesScene, driver: &mut AnimationDriver, sink: &mut RecordingSink, dt: f32) {
    let result = driver.tick(scene, sink, Duration::from_secs_f32(dt)).unwrap();
    assert!(matches!(result, Tick::Rendered { .. }));
}

#[test]
fn skull_and_strips_appear_after_the_model_loads() {
    let mut scene = skull_scene();
    assert!(scene.skull().is_none());
    assert!(scene.strips().is_empty());

    let mut driver = AnimationDriver::for_scene(&scene);
    let mut sink = RecordingSink::new();
    tick(&mut scene, &mut driver, &mut sink, 0.016);

    assert!(scene.skull().is_some());
    assert_eq!(scene.strips().len(), 150);
    assert_eq!(scene.scene().mesh_count(), 151);
    assert_eq!(sink.labels(), vec!["depth prepass", "screen"]);
    // Only the skull writes into the depth target.
    assert_eq!(sink.calls[0].meshes, 1);
    assert_eq!(sink.calls[1].meshes, 151);
}

#[test]
fn strip_material_samples_the_depth_target() {
    let mut scene = skull_scene();
    let mut driver = AnimationDriver::for_scene(&scene);
    let mut sink = RecordingSink::new();
    tick(&mut scene, &mut driver, &mut sink, 0.016);

    let material = scene
        .scene()
        .material(scene.material().unwrap())
        .unwrap();
    assert_eq!(material.uniforms.texture("uDepths"), Some(TextureSlot::DepthTarget));
    assert_eq!(material.uniforms.float("uCameraFar"), Some(1.0));
    assert_eq!(material.uniforms.float("uNoise"), Some(0.0));
}

#[test]
fn missing_skull_still_shows_the_lines() {
    let loader = memory_loader(vec![]);
    let mut scene = LinesScene::new(LinesConfig::default(), Viewport::new(800.0, 600.0), loader);
    let mut driver = AnimationDriver::for_scene(&scene);
    let mut sink = RecordingSink::new();
    tick(&mut scene, &mut driver, &mut sink, 0.016);

    assert!(scene.skull().is_none());
    assert_eq!(scene.strips().len(), 150);
    assert_eq!(sink.calls[0].meshes, 0);
}

#[test]
fn time_advances_by_a_fixed_step_per_frame() {
    let mut scene = skull_scene();
    let mut driver = AnimationDriver::for_scene(&scene);
    let mut sink = RecordingSink::new();
    for _ in 0..5 {
        tick(&mut scene, &mut driver, &mut sink, 0.5);
    }
    assert_eq!(driver.frames(), 5);
    assert!((driver.time() - 0.05).abs() < 1e-6);

    let material = scene
        .scene()
        .material(scene.material().unwrap())
        .unwrap();
    assert!((material.uniforms.float("uTime").unwrap() - 0.05).abs() < 1e-6);
}

#[test]
fn pointer_move_updates_the_mouse_uniform() {
    let mut scene = skull_scene();
    let mut driver = AnimationDriver::for_scene(&scene);
    let mut sink = RecordingSink::new();
    tick(&mut scene, &mut driver, &mut sink, 0.016);

    let event = PointerEvent::new([0.0, 0.0], CanvasRect::sized(200.0, 100.0));
    scene.on_pointer_move(&event).unwrap();

    let mouse = event.ndc();
    assert_eq!(scene.mouse(), mouse);
    let material = scene
        .scene()
        .material(scene.material().unwrap())
        .unwrap();
    assert_eq!(material.uniforms.vec2("uMouse"), Some([mouse.x, mouse.y]));
    assert!(scene.is_tweening());
}

#[test]
fn click_pulses_noise_back_to_zero() {
    let mut scene = skull_scene();
    let mut driver = AnimationDriver::for_scene(&scene);
    let mut sink = RecordingSink::new();
    tick(&mut scene, &mut driver, &mut sink, 0.016);

    let event = PointerEvent::new([10.0, 10.0], CanvasRect::sized(100.0, 100.0));
    scene.on_click(&event).unwrap();
    let noise = |scene: &LinesScene| {
        scene
            .scene()
            .material(scene.material().unwrap())
            .unwrap()
            .uniforms
            .float("uNoise")
            .unwrap()
    };
    assert_eq!(noise(&scene), 0.5);

    tick(&mut scene, &mut driver, &mut sink, 1.5);
    let halfway = noise(&scene);
    assert!(halfway > 0.0 && halfway < 0.5);

    tick(&mut scene, &mut driver, &mut sink, 2.0);
    assert_eq!(noise(&scene), 0.0);
    assert!(!scene.is_tweening());
}

#[test]
fn wheel_pushes_the_skull_along_z() {
    let mut scene = skull_scene();
    let mut driver = AnimationDriver::for_scene(&scene);
    let mut sink = RecordingSink::new();
    tick(&mut scene, &mut driver, &mut sink, 0.016);

    let skull = scene.skull().unwrap();
    let before = scene.scene().mesh(skull).unwrap().local.position.z;
    scene.on_wheel(1000.0).unwrap();
    let after = scene.scene().mesh(skull).unwrap().local.position.z;
    assert!((after - before - 0.1).abs() < 1e-5);
}

#[test]
fn resize_keeps_both_cameras_in_step() {
    let mut scene = skull_scene();
    scene.on_resize(Viewport::new(400.0, 800.0)).unwrap();
    assert_eq!(scene.viewport(), Viewport::new(400.0, 800.0));
    assert!((scene.scene().camera.aspect - 0.5).abs() < 1e-6);
    assert!((scene.scene().depth_camera.as_ref().unwrap().aspect - 0.5).abs() < 1e-6);
}

#[test]
fn teardown_releases_everything_and_stops_the_loop() {
    let mut scene = skull_scene();
    let mut driver = AnimationDriver::for_scene(&scene);
    let mut sink = RecordingSink::new();
    tick(&mut scene, &mut driver, &mut sink, 0.016);
    assert!(scene.scene().has_depth_target());

    let report = scene.teardown();
    assert!(!scene.scene().has_depth_target());
    assert_eq!(report.meshes, 151);
    assert_eq!(report.listeners, 4);
    assert_eq!(report.render_targets, 1);
    assert!(scene.scene().is_disposed());
    assert!(scene.listeners().is_empty());

    assert!(matches!(
        driver.tick(&mut scene, &mut sink, Duration::ZERO),
        Err(SceneError::Disposed)
    ));
    assert!(!driver.is_running());

    // A second teardown has nothing left to release.
    let again = scene.teardown();
    assert_eq!(again.meshes, 0);
    assert_eq!(again.render_targets, 0);
}
