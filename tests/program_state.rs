//! Integration tests for program state persistence

use glam::Vec3;
use hollow_night::scene::ProgramState;

#[test]
fn test_saved_state_loads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("program_state.txt");

    let mut state = ProgramState::default();
    state.clear_color = Vec3::new(0.1, 0.2, 0.3);
    state.ui_enabled = true;
    state.camera.position = Vec3::new(4.0, -2.5, 9.0);
    state.camera.set_front(Vec3::new(1.0, 0.0, 0.0));
    state.save(&path).expect("save");

    let loaded = ProgramState::load(&path);
    assert_eq!(loaded.clear_color, state.clear_color);
    assert!(loaded.ui_enabled);
    assert_eq!(loaded.camera.position, state.camera.position);
    assert!((loaded.camera.front - Vec3::X).length() < 1e-6);
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = ProgramState::load(dir.path().join("absent.txt"));
    let defaults = ProgramState::default();

    assert_eq!(loaded.clear_color, defaults.clear_color);
    assert_eq!(loaded.ui_enabled, defaults.ui_enabled);
    assert_eq!(loaded.camera.position, defaults.camera.position);
}

#[test]
fn test_save_to_missing_directory_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("no_such_dir").join("state.txt");

    assert!(ProgramState::default().save(&path).is_err());
}

fn round_trip(state: &ProgramState) -> ProgramState {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("program_state.txt");
    state.save(&path).expect("save");
    ProgramState::load(&path)
}

#[test]
fn test_round_trip_is_exact_for_awkward_values() {
    let cases = [
        (
            Vec3::new(0.1 * 3.0, f32::MIN_POSITIVE, 1.0 / 3.0),
            false,
            Vec3::new(-12.5, 1e-7, -0.0),
            Vec3::new(3.0, -4.0, 12.0),
        ),
        (
            Vec3::new(-1.0, 2.5, 1e30),
            true,
            Vec3::new(f32::MAX, -f32::MAX, 123_456.79),
            Vec3::new(-0.2, 0.7, 0.1),
        ),
        (
            Vec3::ZERO,
            false,
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::new(0.0, 0.0, -1.0),
        ),
    ];

    for (clear_color, ui_enabled, position, front) in cases {
        let mut state = ProgramState::default();
        state.clear_color = clear_color;
        state.ui_enabled = ui_enabled;
        state.camera.position = position;
        state.camera.set_front(front);

        let loaded = round_trip(&state);
        assert_eq!(loaded.clear_color.to_array(), clear_color.to_array());
        assert_eq!(loaded.ui_enabled, ui_enabled);
        assert_eq!(loaded.camera.position.to_array(), position.to_array());
        // Stored as written, not normalized
        assert_eq!(loaded.camera.front.to_array(), front.to_array());
        assert!((loaded.camera.yaw - state.camera.yaw).abs() < 1e-4);
        assert!((loaded.camera.pitch - state.camera.pitch).abs() < 1e-4);
    }
}
