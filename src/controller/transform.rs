use std::f64::consts::TAU;

use glam::Mat4;

use super::input::InputState;

/// Rotation about Y after `elapsed` seconds, one revolution per `period`.
///
/// Unwrapped, so it never decreases as time moves forward.
pub fn rotation_angle(elapsed: f64, period: f64) -> f64 {
    elapsed / period * TAU
}

/// Identity, then translate by the slider offsets, then rotate about Y.
pub fn world_matrix(angle: f64, input: &InputState) -> Mat4 {
    // Reduce in f64 so long sessions keep full f32 precision in the matrix
    let angle = angle.rem_euclid(TAU) as f32;
    Mat4::from_translation(input.translation) * Mat4::from_rotation_y(angle)
}

/// `world_matrix` at the angle reached after `elapsed` seconds
pub fn world_matrix_at(elapsed: f64, period: f64, input: &InputState) -> Mat4 {
    world_matrix(rotation_angle(elapsed, period), input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::f64::consts::PI;

    #[test]
    fn angle_starts_at_zero_and_wraps_every_period() {
        assert_eq!(rotation_angle(0.0, 6.0), 0.0);
        assert!((rotation_angle(6.0, 6.0) - TAU).abs() < 1e-12);
        assert!((rotation_angle(3.0, 6.0) - PI).abs() < 1e-12);

        let input = InputState::default();
        let full_turn = world_matrix_at(6.0, 6.0, &input);
        assert!(full_turn.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn angle_is_monotonic() {
        let mut last = rotation_angle(0.0, 6.0);
        for step in 1..1000 {
            let angle = rotation_angle(step as f64 * 0.016, 6.0);
            assert!(angle >= last);
            last = angle;
        }
    }

    #[test]
    fn translate_then_rotate_half_turn() {
        let input = InputState { translation: Vec3::new(2.0, 0.0, 0.0), paused: false };
        let world = world_matrix_at(3.0, 6.0, &input);

        let expected = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))
            * Mat4::from_rotation_y(std::f32::consts::PI);
        assert!(world.abs_diff_eq(expected, 1e-6));

        // Rotation happens in object space, the offset is applied last
        let moved = world.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!(moved.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
        assert!(world.transform_point3(Vec3::ZERO).abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn large_elapsed_time_stays_precise() {
        let input = InputState::default();
        // one hour and 1.5 s: exactly a quarter turn past a whole revolution count
        let world = world_matrix_at(3601.5, 6.0, &input);
        let expected = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        assert!(world.abs_diff_eq(expected, 1e-5));
    }
}
