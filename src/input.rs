use crate::mover::{self, HorizontalAxis};
use crate::sim::{AppState, GameSettings, ResetEvent};
use bevy::prelude::*;

#[derive(Resource)]
pub struct Keybinds {
    pub left: KeyCode,
    pub right: KeyCode,
    pub alt_left: KeyCode,
    pub alt_right: KeyCode,
    pub reset: KeyCode,
    pub help: KeyCode,
}

impl Default for Keybinds {
    fn default() -> Self {
        Self {
            left: KeyCode::ArrowLeft,
            right: KeyCode::ArrowRight,
            alt_left: KeyCode::KeyA,
            alt_right: KeyCode::KeyD,
            reset: KeyCode::KeyR,
            help: KeyCode::KeyH,
        }
    }
}

/// How the horizontal axis chases the keys: `sensitivity` units/s toward the
/// pressed direction, `gravity` units/s back to rest.
#[derive(Resource, Clone, Copy, Debug)]
pub struct AxisSmoothing {
    pub sensitivity: f32,
    pub gravity: f32,
    /// Jump straight to 0 when the pressed direction flips.
    pub snap: bool,
}

impl Default for AxisSmoothing {
    fn default() -> Self {
        Self {
            sensitivity: 3.0,
            gravity: 3.0,
            snap: true,
        }
    }
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + diff.signum() * max_delta
    }
}

impl AxisSmoothing {
    pub fn step(&self, current: f32, target: f32, dt: f32) -> f32 {
        let target = target.clamp(-1.0, 1.0);
        let next = if target == 0.0 {
            move_towards(current, 0.0, self.gravity * dt)
        } else {
            let from = if self.snap && current != 0.0 && current.signum() != target.signum() {
                0.0
            } else {
                current
            };
            move_towards(from, target, self.sensitivity * dt)
        };
        next.clamp(-1.0, 1.0)
    }
}

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Keybinds>()
            .init_resource::<AxisSmoothing>()
            .add_systems(
                Update,
                horizontal_axis
                    .before(mover::move_player)
                    .run_if(in_state(AppState::Playing)),
            )
            .add_systems(Update, (reset_trigger, help_toggle));
    }
}

fn horizontal_axis(
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    binds: Res<Keybinds>,
    smoothing: Res<AxisSmoothing>,
    mut axis: ResMut<HorizontalAxis>,
) {
    let mut target = 0.0;
    if keys.any_pressed([binds.left, binds.alt_left]) {
        target -= 1.0;
    }
    if keys.any_pressed([binds.right, binds.alt_right]) {
        target += 1.0;
    }

    let next = smoothing.step(axis.0, target, time.delta_seconds());
    if next != axis.0 {
        axis.0 = next;
    }
}

fn reset_trigger(
    mut ev_reset: EventWriter<ResetEvent>,
    keys: Res<ButtonInput<KeyCode>>,
    binds: Res<Keybinds>,
) {
    if keys.just_pressed(binds.reset) {
        ev_reset.send(ResetEvent);
    }
}

fn help_toggle(
    mut settings: ResMut<GameSettings>,
    keys: Res<ButtonInput<KeyCode>>,
    binds: Res<Keybinds>,
) {
    if keys.just_pressed(binds.help) {
        settings.show_help = !settings.show_help;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_ramps_up_at_sensitivity() {
        let s = AxisSmoothing::default();
        let v = s.step(0.0, 1.0, 0.1);
        assert!((v - 0.3).abs() < 1e-6);
        let v = s.step(v, 1.0, 1.0);
        assert_eq!(v, 1.0);
    }

    #[test]
    fn axis_falls_back_at_gravity() {
        let s = AxisSmoothing::default();
        let v = s.step(1.0, 0.0, 0.1);
        assert!((v - 0.7).abs() < 1e-6);
        assert_eq!(s.step(0.1, 0.0, 0.1), 0.0);
    }

    #[test]
    fn reversing_snaps_through_zero() {
        let snapping = AxisSmoothing::default();
        let v = snapping.step(0.8, -1.0, 0.1);
        assert!((v + 0.3).abs() < 1e-6);

        let smooth = AxisSmoothing {
            snap: false,
            ..default()
        };
        let v = smooth.step(0.8, -1.0, 0.1);
        assert!((v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn axis_never_leaves_unit_range() {
        let s = AxisSmoothing {
            sensitivity: 100.0,
            ..default()
        };
        assert_eq!(s.step(0.0, 5.0, 1.0), 1.0);
        assert_eq!(s.step(0.0, -5.0, 1.0), -1.0);
    }
}
