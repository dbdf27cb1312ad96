use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::contact::{self, TriggerEntered};
use crate::mover::{self, HorizontalAxis, Mover, Player};
use crate::spawner::{self, LevelAnchor};

/// Aspect used until a primary window reports its size.
pub const DEFAULT_ASPECT: f32 = 16.0 / 9.0;

#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AppState {
    #[default]
    Playing,
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Difficulty {
    Calm,
    #[default]
    Classic,
    Frantic,
}

#[derive(Resource)]
pub struct SeededRng(pub StdRng);

impl SeededRng {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(StdRng::seed_from_u64(seed)),
            None => Self(StdRng::from_entropy()),
        }
    }
}

#[derive(Event, Default)]
pub struct ResetEvent;

#[derive(Resource, Default, Debug)]
pub struct SimStats {
    pub platforms: usize,
    pub recycled: u64,
    /// How far the level anchor has scrolled up since the last reset.
    pub depth: f32,
}

/// Orthographic view extents. `half_height` is the distance from the camera
/// centre to the top edge of the screen, in world units.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub half_height: f32,
    pub aspect: f32,
}

impl Viewport {
    pub fn new(half_height: f32) -> Self {
        Self {
            half_height,
            aspect: DEFAULT_ASPECT,
        }
    }

    pub fn half_width(&self) -> f32 {
        self.aspect * self.half_height
    }

    pub fn upper_bound(&self, camera_y: f32) -> f32 {
        camera_y + self.half_height
    }

    pub fn recycle_threshold(&self, camera_y: f32, margin: f32) -> f32 {
        self.upper_bound(camera_y) + margin
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error("vertical gap must be positive, got {0}")]
    NonPositiveGap(f32),
    #[error("gap jitter must not be negative, got {0}")]
    NegativeJitter(f32),
    #[error("platform spawn range is inverted: [{min}, {max}]")]
    InvertedSpawnRange { min: f32, max: f32 },
    #[error("view half-height must be positive, got {0}")]
    NonPositiveViewHeight(f32),
    #[error("{name} must be finite and non-negative, got {value}")]
    BadSpeed { name: &'static str, value: f32 },
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f32 },
    #[error("platform spawn range is too wide to sample: [{min}, {max}]")]
    SpawnRangeTooWide { min: f32, max: f32 },
}

#[derive(Resource, Clone, Debug, PartialEq)]
pub struct GameSettings {
    pub difficulty: Difficulty,
    // Level
    pub scroll_speed: f32,
    pub vertical_gap: f32,
    pub gap_jitter: f32,
    pub spawn_x_range: Vec2, // min, max
    pub initial_platforms: usize,
    pub spawn_margin: f32,
    pub recycle_margin: f32,
    pub platform_size: Vec2,
    pub platform_tag: String,
    // Player
    pub move_speed: f32,
    pub edge_margin: f32,
    pub player_size: Vec2,
    pub player_start: Vec3,
    pub hazard_tag: String,
    // View
    pub view_half_height: f32,
    pub seed: Option<u64>,
    pub show_help: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Classic,
            scroll_speed: 2.0,
            vertical_gap: 3.0,
            gap_jitter: 2.0,
            spawn_x_range: Vec2::new(-5.0, 5.0),
            initial_platforms: 10,
            spawn_margin: 5.0,
            recycle_margin: 5.0,
            platform_size: Vec2::new(2.5, 0.5),
            // Spelling matches the tag the level prefabs have always used.
            platform_tag: "Hazzard".into(),
            move_speed: 7.0,
            edge_margin: 0.5,
            player_size: Vec2::new(1.0, 1.0),
            player_start: Vec3::new(0.0, 0.0, 1.0),
            hazard_tag: "Hazzard".into(),
            view_half_height: 5.0,
            seed: None,
            show_help: true,
        }
    }
}

impl GameSettings {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let mut settings = GameSettings::default();
        settings.difficulty = difficulty;
        match difficulty {
            Difficulty::Calm => {
                settings.scroll_speed = 1.25;
                settings.vertical_gap = 4.0;
                settings.gap_jitter = 2.0;
                settings.move_speed = 7.0;
            }
            Difficulty::Classic => {}
            Difficulty::Frantic => {
                settings.scroll_speed = 3.5;
                settings.vertical_gap = 2.0;
                settings.gap_jitter = 1.0;
                settings.move_speed = 9.0;
                settings.initial_platforms = 14;
            }
        }
        settings
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        for (name, value) in [
            ("vertical gap", self.vertical_gap),
            ("gap jitter", self.gap_jitter),
            ("spawn range min", self.spawn_x_range.x),
            ("spawn range max", self.spawn_x_range.y),
            ("spawn margin", self.spawn_margin),
            ("recycle margin", self.recycle_margin),
            ("edge margin", self.edge_margin),
            ("view half-height", self.view_half_height),
        ] {
            if !value.is_finite() {
                return Err(SettingsError::NonFinite { name, value });
            }
        }
        if !(self.vertical_gap > 0.0) {
            return Err(SettingsError::NonPositiveGap(self.vertical_gap));
        }
        if !(self.gap_jitter >= 0.0) {
            return Err(SettingsError::NegativeJitter(self.gap_jitter));
        }
        let (min, max) = (self.spawn_x_range.x, self.spawn_x_range.y);
        if !(min <= max) {
            return Err(SettingsError::InvertedSpawnRange { min, max });
        }
        // Uniform sampling needs a finite width, not just finite ends.
        if !(max - min).is_finite() {
            return Err(SettingsError::SpawnRangeTooWide { min, max });
        }
        if !(self.view_half_height > 0.0) {
            return Err(SettingsError::NonPositiveViewHeight(self.view_half_height));
        }
        for (name, value) in [
            ("scroll speed", self.scroll_speed),
            ("move speed", self.move_speed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::BadSpeed { name, value });
            }
        }
        Ok(())
    }

    pub fn validated_or_default(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(err) => {
                warn!("rejecting game settings ({err}), using defaults");
                GameSettings {
                    seed: self.seed,
                    ..GameSettings::default()
                }
            }
        }
    }
}

pub struct SimPlugin;
impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        let settings = app
            .world()
            .get_resource::<GameSettings>()
            .cloned()
            .unwrap_or_default()
            .validated_or_default();

        app.init_state::<AppState>()
            .insert_resource(SeededRng::new(settings.seed))
            .insert_resource(Viewport::new(settings.view_half_height))
            .insert_resource(settings)
            .init_resource::<SimStats>()
            .init_resource::<HorizontalAxis>()
            .add_event::<ResetEvent>()
            .add_event::<TriggerEntered>()
            .add_systems(Startup, (spawner::spawn_level, mover::spawn_player))
            .add_systems(Update, (sync_viewport, handle_reset).chain())
            .add_systems(
                Update,
                (
                    mover::move_player,
                    spawner::scroll_level,
                    contact::detect_contacts,
                    mover::hazard_contact,
                )
                    .chain()
                    .after(handle_reset)
                    .run_if(in_state(AppState::Playing)),
            );
    }
}

fn sync_viewport(mut viewport: ResMut<Viewport>, windows: Query<&Window, With<PrimaryWindow>>) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let height = window.height();
    if height <= 0.0 {
        return;
    }
    let aspect = window.width() / height;
    if (viewport.aspect - aspect).abs() > f32::EPSILON {
        viewport.aspect = aspect;
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_reset(
    mut commands: Commands,
    mut ev_reset: EventReader<ResetEvent>,
    anchors: Query<Entity, With<LevelAnchor>>,
    mut players: Query<(&mut Transform, &mut Mover), With<Player>>,
    mut stats: ResMut<SimStats>,
    mut settings: ResMut<GameSettings>,
    mut rng: ResMut<SeededRng>,
    mut axis: ResMut<HorizontalAxis>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if ev_reset.is_empty() {
        return;
    }
    ev_reset.clear();

    for e in &anchors {
        commands.entity(e).despawn_recursive();
    }
    *stats = SimStats::default();

    *settings = GameSettings {
        seed: settings.seed,
        show_help: settings.show_help,
        ..GameSettings::from_difficulty(settings.difficulty)
    };
    *rng = SeededRng::new(settings.seed);
    spawner::spawn_level_inner(&mut commands, &settings, &mut rng.0, &mut stats);

    for (mut t, mut mover) in &mut players {
        t.translation = settings.player_start;
        mover.speed = settings.move_speed;
        mover.edge_margin = settings.edge_margin;
    }
    axis.0 = 0.0;

    next_state.set(AppState::Playing);
    info!("run reset ({:?})", settings.difficulty);
}
