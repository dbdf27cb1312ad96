use bevy::prelude::*;

use crate::contact::{Collider, TriggerEntered};
use crate::sim::{AppState, GameSettings, Viewport};
use crate::MainCamera;

#[derive(Component)]
pub struct Player;

/// Horizontal-only kinematic movement, kept inside the visible area.
#[derive(Component, Clone, Copy, Debug)]
pub struct Mover {
    pub speed: f32,
    pub edge_margin: f32,
}

/// Smoothed horizontal input in [-1, 1], written by the input plugin.
#[derive(Resource, Default, Clone, Copy, Debug, PartialEq)]
pub struct HorizontalAxis(pub f32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveBounds {
    pub min_x: f32,
    pub max_x: f32,
}

impl MoveBounds {
    /// Visible half-width minus `margin` on each side of `center_x`. Collapses
    /// to `center_x` when the margin is wider than the view.
    pub fn from_viewport(viewport: &Viewport, center_x: f32, margin: f32) -> Self {
        let reach = (viewport.half_width() - margin).max(0.0);
        Self {
            min_x: center_x - reach,
            max_x: center_x + reach,
        }
    }

    pub fn clamp(&self, x: f32) -> f32 {
        x.clamp(self.min_x, self.max_x)
    }

    pub fn contains(&self, x: f32) -> bool {
        (self.min_x..=self.max_x).contains(&x)
    }
}

pub fn displacement(axis: f32, speed: f32, dt: f32) -> f32 {
    if axis.is_nan() {
        return 0.0;
    }
    axis.clamp(-1.0, 1.0) * speed * dt
}

impl Mover {
    pub fn step(&self, x: f32, axis: f32, dt: f32, bounds: &MoveBounds) -> f32 {
        bounds.clamp(x + displacement(axis, self.speed, dt))
    }
}

pub fn is_hazard(tag: &str, hazard_tag: &str) -> bool {
    tag == hazard_tag
}

pub fn spawn_player(mut commands: Commands, settings: Res<GameSettings>) {
    commands.spawn((
        Player,
        Mover {
            speed: settings.move_speed,
            edge_margin: settings.edge_margin,
        },
        Collider::new(settings.player_size * 0.5),
        SpriteBundle {
            sprite: Sprite {
                color: Color::srgb(0.9, 1.0, 0.9),
                custom_size: Some(settings.player_size),
                ..default()
            },
            transform: Transform::from_translation(settings.player_start),
            ..default()
        },
    ));
}

pub fn move_player(
    time: Res<Time>,
    axis: Res<HorizontalAxis>,
    viewport: Res<Viewport>,
    q_cam: Query<&Transform, (With<MainCamera>, Without<Mover>)>,
    mut movers: Query<(&Mover, &mut Transform)>,
) {
    let dt = time.delta_seconds();
    let center_x = q_cam.get_single().map_or(0.0, |t| t.translation.x);

    for (mover, mut t) in &mut movers {
        let bounds = MoveBounds::from_viewport(&viewport, center_x, mover.edge_margin);
        let x = mover.step(t.translation.x, axis.0, dt, &bounds);
        debug_assert!(bounds.contains(x));
        if x != t.translation.x {
            t.translation.x = x;
        }
    }
}

pub fn hazard_contact(
    mut triggers: EventReader<TriggerEntered>,
    players: Query<(), With<Player>>,
    settings: Res<GameSettings>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let mut hit = None;
    for ev in triggers.read() {
        if hit.is_none() && players.contains(ev.entity) && is_hazard(&ev.tag, &settings.hazard_tag) {
            hit = Some(ev.other);
        }
    }

    if let Some(other) = hit {
        info!("game over: player touched {:?} ({})", other, settings.hazard_tag);
        next_state.set(AppState::GameOver);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            half_height: 5.0,
            aspect: 16.0 / 9.0,
        }
    }

    #[test]
    fn step_before_clamp() {
        assert!((displacement(1.0, 7.0, 0.1) - 0.7).abs() < 1e-6);

        let mover = Mover {
            speed: 7.0,
            edge_margin: 0.5,
        };
        let x = mover.step(0.0, 1.0, 0.1, &MoveBounds::from_viewport(&viewport(), 0.0, 0.5));
        assert!((x - 0.7).abs() < 1e-6);
    }

    #[test]
    fn bounds_follow_viewport() {
        let bounds = MoveBounds::from_viewport(&viewport(), 0.0, 0.5);
        let half = 16.0 / 9.0 * 5.0 - 0.5;
        assert!((bounds.max_x - half).abs() < 1e-5);
        assert!((bounds.min_x + half).abs() < 1e-5);
        assert_eq!(bounds.clamp(100.0), bounds.max_x);
        assert_eq!(bounds.clamp(-100.0), bounds.min_x);
    }

    #[test]
    fn bounds_collapse_when_margin_too_wide() {
        let bounds = MoveBounds::from_viewport(&viewport(), 2.0, 50.0);
        assert_eq!(bounds, MoveBounds { min_x: 2.0, max_x: 2.0 });
        assert_eq!(bounds.clamp(-3.0), 2.0);
    }

    #[test]
    fn axis_is_clamped_and_nan_ignored() {
        assert_eq!(displacement(5.0, 2.0, 1.0), 2.0);
        assert_eq!(displacement(-5.0, 2.0, 1.0), -2.0);
        assert_eq!(displacement(f32::NAN, 2.0, 1.0), 0.0);
    }

    #[test]
    fn hazard_tag_must_match_exactly() {
        assert!(is_hazard("Hazzard", "Hazzard"));
        assert!(!is_hazard("Hazard", "Hazzard"));
        assert!(!is_hazard("", "Hazzard"));
    }

    proptest! {
        #[test]
        fn stepped_x_stays_in_bounds(
            x in -1000.0f32..1000.0,
            axis in -10.0f32..10.0,
            dt in 0.0f32..1.0,
            speed in 0.0f32..100.0,
            aspect in 0.1f32..4.0,
            margin in 0.0f32..20.0,
        ) {
            let viewport = Viewport { half_height: 5.0, aspect };
            let bounds = MoveBounds::from_viewport(&viewport, 0.0, margin);
            let mover = Mover { speed, edge_margin: margin };
            let stepped = mover.step(x, axis, dt, &bounds);
            prop_assert!(bounds.contains(stepped));
        }
    }
}
