use donut::controller::transform::{rotation_angle, world_matrix_at};
use donut::controller::InputState;
use donut::model::TorusParameters;
use donut::Error;
use glam::Vec3;
use proptest::prelude::*;

fn torus_params() -> impl Strategy<Value = TorusParameters> {
    (3u32..48, 3u32..48, 0.5f32..4.0, 0.05f32..0.5).prop_map(|(rings, sides, donut_radius, tube_radius)| {
        TorusParameters { rings, sides, donut_radius, tube_radius }
    })
}

proptest! {
    #[test]
    fn counts_match_ring_and_side_counts(params in torus_params()) {
        let mesh = params.generate().unwrap();
        let (r, s) = (params.rings as usize, params.sides as usize);

        prop_assert_eq!(mesh.vertices.len(), (r + 1) * s);
        prop_assert_eq!(mesh.indices.len(), 6 * r * s);
        prop_assert_eq!(mesh.indices.len() % 3, 0);
    }

    #[test]
    fn indices_stay_in_bounds(params in torus_params()) {
        let mesh = params.generate().unwrap();
        let count = mesh.vertices.len();
        prop_assert!(mesh.indices.iter().all(|&i| (i as usize) < count));
    }

    #[test]
    fn no_degenerate_triangles(params in torus_params()) {
        let mesh = params.generate().unwrap();
        for [a, b, c] in mesh.triangles() {
            prop_assert!(a != b && b != c && a != c);
        }
    }

    #[test]
    fn seam_closes_geometrically(params in torus_params()) {
        let mesh = params.generate().unwrap();
        let sides = params.sides as usize;
        let last = params.rings as usize * sides;

        for side in 0..sides {
            let (first, seam) = (mesh.vertices[side], mesh.vertices[last + side]);
            prop_assert!(Vec3::from(first.pos).abs_diff_eq(Vec3::from(seam.pos), 1e-4));
            prop_assert_eq!(first.uv[1], 0.0);
            prop_assert_eq!(seam.uv[1], 1.0);
        }
    }

    #[test]
    fn texcoords_in_unit_square(params in torus_params()) {
        let mesh = params.generate().unwrap();
        for v in &mesh.vertices {
            prop_assert!((0.0..=1.0).contains(&v.uv[0]) && (0.0..=1.0).contains(&v.uv[1]));
        }
    }

    #[test]
    fn generation_is_deterministic(params in torus_params()) {
        prop_assert_eq!(params.generate().unwrap(), params.generate().unwrap());
    }

    #[test]
    fn too_few_rings_or_sides_rejected(rings in 0u32..3, sides in 0u32..64) {
        let by_rings = TorusParameters { rings, sides: sides.max(3), ..Default::default() };
        let by_sides = TorusParameters { rings: sides.max(3), sides: rings, ..Default::default() };
        let rings_rejected = matches!(by_rings.generate(), Err(Error::InvalidParameter { parameter: "rings", .. }));
        let sides_rejected = matches!(by_sides.generate(), Err(Error::InvalidParameter { parameter: "sides", .. }));
        prop_assert!(rings_rejected);
        prop_assert!(sides_rejected);
    }

    #[test]
    fn angle_monotonic(a in 0.0f64..10_000.0, b in 0.0f64..10_000.0) {
        let (early, late) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(rotation_angle(early, 6.0) <= rotation_angle(late, 6.0));
    }

    #[test]
    fn translation_is_applied_after_rotation(x in -5.0f32..5.0, y in -5.0f32..5.0, z in -5.0f32..5.0, t in 0.0f64..60.0) {
        let input = InputState { translation: Vec3::new(x, y, z), paused: false };
        let world = world_matrix_at(t, 6.0, &input);
        // the object origin lands exactly on the slider offset
        prop_assert!(world.transform_point3(Vec3::ZERO).abs_diff_eq(input.translation, 1e-5));
        // rotation about Y never moves points along Y
        let p = world.transform_point3(Vec3::new(1.0, 2.0, 3.0));
        prop_assert!((p.y - (2.0 + y)).abs() < 1e-4);
    }
}

#[test]
fn reference_donut() {
    let mesh = TorusParameters { rings: 16, sides: 32, donut_radius: 1.75, tube_radius: 0.75 }
        .generate()
        .unwrap();
    assert_eq!(mesh.vertices.len(), 544);
    assert_eq!(mesh.triangle_count(), 1024);
    assert_eq!(mesh.indices.len(), 3072);
    assert!(mesh.indices.iter().all(|&i| i < 544));
}
