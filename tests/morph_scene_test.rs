mod common;

use common::test_utils::{RecordingSink, glb, memory_loader, triangle};
use hero_ngin::{
    SceneError,
    config::{MorphConfig, Viewport},
    driver::{AnimationDriver, Animate},
    flow::{HeroFlow, Out},
    input::{CanvasRect, PointerEvent, ShaderDomain},
    scenes::morph::MorphScene,
};
use instant::Duration;

fn models() -> Vec<u8> {
    let mut quad = triangle(0.0);
    quad.extend(triangle(5.0));
    glb(&[("Torus", &triangle(-2.0)), ("Text", &quad), ("Sphere", &triangle(9.0))])
}

fn config() -> MorphConfig {
    MorphConfig {
        seed: Some(7),
        ..MorphConfig::default()
    }
}

fn loaded_scene() -> MorphScene {
    let loader = memory_loader(vec![("models.glb", models())]);
    let mut scene = MorphScene::new(config(), Viewport::new(1000.0, 500.0), loader).unwrap();
    let mut driver = AnimationDriver::for_scene(&scene);
    driver
        .tick(&mut scene, &mut RecordingSink::new(), Duration::ZERO)
        .unwrap();
    scene
}

#[test]
fn every_root_mesh_becomes_a_padded_position_set() {
    let scene = loaded_scene();
    assert!(scene.is_loaded());
    assert_eq!(scene.position_sets().len(), 3);
    assert_eq!(scene.max_count(), 6);
    for set in scene.position_sets() {
        assert_eq!(set.count(), 6);
    }

    let geometry = scene.geometry().unwrap();
    assert_eq!(geometry.attribute("aSize").unwrap().count(), 6);
    let (index, target) = scene.indices();
    assert_eq!((index, target), (1, 0));
    assert!(geometry
        .attribute("position")
        .unwrap()
        .shares(&scene.position_sets()[1]));
    assert!(geometry
        .attribute("aPositionTarget")
        .unwrap()
        .shares(&scene.position_sets()[0]));
}

#[test]
fn sizes_are_reproducible_with_a_seed() {
    let sizes = |scene: &MorphScene| scene.geometry().unwrap().attribute("aSize").unwrap().data.to_vec();
    let a = loaded_scene();
    let b = loaded_scene();
    assert_eq!(sizes(&a), sizes(&b));
    assert!(sizes(&a).iter().all(|size| (0.0..1.0).contains(size)));
}

#[test]
fn morph_swaps_the_referenced_sets() {
    let mut scene = loaded_scene();
    scene.morph(Some(2), Some(1)).unwrap();
    assert_eq!(scene.indices(), (2, 1));

    let geometry = scene.geometry().unwrap();
    assert!(geometry
        .attribute("position")
        .unwrap()
        .shares(&scene.position_sets()[2]));
    assert!(geometry
        .attribute("aPositionTarget")
        .unwrap()
        .shares(&scene.position_sets()[1]));

    scene.morph(None, Some(0)).unwrap();
    assert_eq!(scene.indices(), (2, 0));
}

#[test]
fn morph_rejects_indices_past_the_sets() {
    let mut scene = loaded_scene();
    let err = scene.morph(Some(3), None).unwrap_err();
    assert!(matches!(err, SceneError::MorphIndexOutOfRange { index: 3, len: 3 }));
    assert_eq!(scene.indices(), (1, 0));
}

#[test]
fn swapping_source_and_target_leaves_the_cache_untouched() {
    let mut scene = loaded_scene();
    assert_eq!(scene.indices(), (1, 0));
    let cached: Vec<Vec<f32>> = scene.position_sets().iter().map(|set| set.data.to_vec()).collect();

    scene.morph(Some(0), Some(1)).unwrap();
    assert_eq!(scene.indices(), (0, 1));
    let after: Vec<Vec<f32>> = scene.position_sets().iter().map(|set| set.data.to_vec()).collect();
    assert_eq!(after, cached);

    let geometry = scene.geometry().unwrap();
    assert!(geometry
        .attribute("position")
        .unwrap()
        .shares(&scene.position_sets()[0]));
    assert!(geometry
        .attribute("aPositionTarget")
        .unwrap()
        .shares(&scene.position_sets()[1]));
}

#[test]
fn morph_checks_both_indices() {
    let mut scene = loaded_scene();
    assert!(matches!(
        scene.morph(None, Some(5)),
        Err(SceneError::MorphIndexOutOfRange { index: 5, len: 3 })
    ));
    assert!(matches!(
        scene.morph(Some(0), Some(3)),
        Err(SceneError::MorphIndexOutOfRange { index: 3, len: 3 })
    ));
    // A rejected request changes neither index.
    assert_eq!(scene.indices(), (1, 0));
}

#[test]
fn clear_colour_is_transparent() {
    let mut scene = loaded_scene();
    let colour = scene.clear_colour().unwrap();
    assert_eq!(colour.a, 0.0);
    assert!(colour.r > 0.0 && colour.b > colour.g);

    assert!(matches!(scene.set_clear_color("#ffffff").unwrap(), Out::Configure(_)));
    assert_eq!(scene.clear_colour().unwrap().a, 0.0);
    assert!(matches!(scene.set_clear_color("nope"), Err(SceneError::InvalidColour(_))));
}

#[test]
fn indices_beyond_a_small_file_are_clamped_at_load() {
    let loader = memory_loader(vec![("models.glb", glb(&[("Only", &triangle(0.0))]))]);
    let config = MorphConfig {
        index: 4,
        target_index: 2,
        ..config()
    };
    let mut scene = MorphScene::new(config, Viewport::new(800.0, 600.0), loader).unwrap();
    let mut driver = AnimationDriver::for_scene(&scene);
    driver
        .tick(&mut scene, &mut RecordingSink::new(), Duration::ZERO)
        .unwrap();
    assert_eq!(scene.indices(), (0, 0));
}

#[test]
fn missing_models_leave_the_scene_empty() {
    let loader = memory_loader(vec![]);
    let mut scene = MorphScene::new(config(), Viewport::new(800.0, 600.0), loader).unwrap();
    let mut driver = AnimationDriver::for_scene(&scene);
    let mut sink = RecordingSink::new();
    driver.tick(&mut scene, &mut sink, Duration::ZERO).unwrap();

    assert!(!scene.is_loaded());
    assert_eq!(sink.calls[0].meshes, 0);
    // Before any sets exist a morph is only remembered.
    scene.morph(Some(9), None).unwrap();
    assert_eq!(scene.indices().0, 9);
}

#[test]
fn parameters_are_clamped() {
    let mut scene = loaded_scene();
    scene.set_progress(4.0).unwrap();
    scene.set_size(0.0).unwrap();
    scene.set_morph_duration(2.0).unwrap();
    scene.set_morph_merge_size(-1.0).unwrap();

    let params = scene.params();
    assert_eq!(params.progress, 1.0);
    assert_eq!(params.size, 0.1);
    assert_eq!(params.morph_duration, 1.0);
    assert_eq!(params.morph_merge_size, 0.01);

    let material = scene.scene().material(scene.material().unwrap()).unwrap();
    assert_eq!(material.uniforms.float("uProgress"), Some(1.0));
    assert_eq!(material.uniforms.float("uSize"), Some(0.1));
}

#[test]
fn bad_colours_are_rejected() {
    let mut scene = loaded_scene();
    assert!(matches!(
        scene.set_colors("#zzzzzz", "#000000"),
        Err(SceneError::InvalidColour(_))
    ));
    assert!(scene.set_colors("#ff0000", "#00ff00").is_ok());
    assert_eq!(scene.params().color1, [1.0, 0.0, 0.0]);
}

#[test]
fn init_asks_the_context_for_the_clear_colour() {
    let mut scene = loaded_scene();
    assert!(matches!(scene.on_init().unwrap(), Out::Configure(_)));
}

#[test]
fn pointer_lands_in_the_shader_domain() {
    let mut scene = loaded_scene();
    let event = PointerEvent::new([1000.0, 0.0], CanvasRect::sized(1000.0, 500.0));
    scene.on_pointer_move(&event).unwrap();

    let expected = ShaderDomain::MORPH.apply(event.ndc());
    let material = scene.scene().material(scene.material().unwrap()).unwrap();
    assert_eq!(material.uniforms.vec2("uMouse"), Some([expected.x, expected.y]));
}

#[test]
fn resize_updates_the_resolution_in_device_pixels() {
    let mut scene = loaded_scene();
    scene
        .on_resize(Viewport::new(640.0, 480.0).with_pixel_ratio(2.0))
        .unwrap();
    let material = scene.scene().material(scene.material().unwrap()).unwrap();
    assert_eq!(material.uniforms.vec2("uResolution"), Some([1280.0, 960.0]));
}

#[test]
fn teardown_disposes_the_points() {
    let mut scene = loaded_scene();
    let report = scene.teardown();
    assert_eq!(report.meshes, 1);
    assert_eq!(report.materials, 1);
    assert_eq!(report.listeners, 3);
    assert!(!scene.is_loaded());
    assert!(scene.scene().is_disposed());
}
