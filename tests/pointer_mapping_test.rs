use hero_ngin::{
    cgmath::Vector2,
    input::{CanvasRect, PointerEvent, ShaderDomain, from_ndc, to_ndc},
};
use proptest::prelude::*;

fn rect() -> impl Strategy<Value = CanvasRect> {
    (0.0f32..500.0, 0.0f32..500.0, 50.0f32..2000.0, 50.0f32..2000.0)
        .prop_map(|(left, top, width, height)| CanvasRect::new(left, top, width, height))
}

proptest! {
    #[test]
    fn points_inside_the_canvas_land_in_the_unit_square(
        rect in rect(),
        fx in 0.0f32..=1.0,
        fy in 0.0f32..=1.0,
    ) {
        let client = [rect.left + fx * rect.width, rect.top + fy * rect.height];
        let ndc = to_ndc(client, &rect);
        prop_assert!(ndc.x >= -1.0 - 1e-4 && ndc.x <= 1.0 + 1e-4);
        prop_assert!(ndc.y >= -1.0 - 1e-4 && ndc.y <= 1.0 + 1e-4);
        // y grows upwards.
        prop_assert!((ndc.y - (1.0 - 2.0 * fy)).abs() < 1e-3);
    }

    #[test]
    fn mapping_back_recovers_the_client_point(
        rect in rect(),
        fx in 0.0f32..=1.0,
        fy in 0.0f32..=1.0,
    ) {
        let client = [rect.left + fx * rect.width, rect.top + fy * rect.height];
        let back = from_ndc(to_ndc(client, &rect), &rect);
        prop_assert!((back[0] - client[0]).abs() < 0.05);
        prop_assert!((back[1] - client[1]).abs() < 0.05);
    }

    #[test]
    fn morph_domain_is_an_affine_rescale(x in -1.0f32..=1.0, y in -1.0f32..=1.0) {
        let mapped = ShaderDomain::MORPH.apply(Vector2::new(x, y));
        prop_assert!((mapped.x - (x * 4.5 + 0.5)).abs() < 1e-5);
        prop_assert!((mapped.y - (y * 4.5 + 0.5)).abs() < 1e-5);
        prop_assert_eq!(ShaderDomain::IDENTITY.apply(Vector2::new(x, y)), Vector2::new(x, y));
    }
}

#[test]
fn chrome_flag_travels_with_the_event() {
    let rect = CanvasRect::sized(800.0, 600.0);
    let event = PointerEvent::new(rect.centre(), rect);
    assert!(!event.over_chrome);
    assert!(event.over_chrome(true).over_chrome);
    assert_eq!(event.ndc(), Vector2::new(0.0, 0.0));
}
