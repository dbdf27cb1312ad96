use std::collections::VecDeque;

use bevy::prelude::*;
use rand::Rng;

use crate::contact::{Collider, Tag};
use crate::sim::{GameSettings, SeededRng, SimStats, Viewport};
use crate::MainCamera;

/// Root of the level. Scrolls upward every tick; platforms are its children.
#[derive(Component)]
pub struct LevelAnchor;

#[derive(Component)]
pub struct Platform;

/// A platform as the spawner tracks it: its entity and its position relative
/// to the anchor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PooledPlatform {
    pub entity: Entity,
    pub local: Vec2,
}

/// Active platforms in spawn order. The front is always the oldest (highest)
/// platform, the back the newest (lowest).
#[derive(Default, Debug)]
pub struct PlatformPool {
    platforms: VecDeque<PooledPlatform>,
}

impl PlatformPool {
    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub fn oldest(&self) -> Option<&PooledPlatform> {
        self.platforms.front()
    }

    pub fn newest(&self) -> Option<&PooledPlatform> {
        self.platforms.back()
    }

    fn push_newest(&mut self, platform: PooledPlatform) {
        self.platforms.push_back(platform);
    }

    fn pop_oldest(&mut self) -> Option<PooledPlatform> {
        self.platforms.pop_front()
    }
}

/// Spawn cursor: the local y of the next platform. Only ever moves down.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollState {
    pub next_spawn_y: f32,
}

impl ScrollState {
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, gap: f32, jitter: f32) -> f32 {
        let extra = if jitter > 0.0 {
            rng.gen_range(0.0..=jitter)
        } else {
            0.0
        };
        self.next_spawn_y -= gap + extra;
        self.next_spawn_y
    }
}

fn sample_x<R: Rng + ?Sized>(rng: &mut R, range: Vec2) -> f32 {
    if range.y > range.x {
        rng.gen_range(range.x..=range.y)
    } else {
        range.x
    }
}

/// What a single [`Spawner::tick`] did.
#[derive(Debug, Default, PartialEq)]
pub struct TickReport {
    pub spawned: Option<PooledPlatform>,
    pub recycled: Option<PooledPlatform>,
}

#[derive(Component, Default, Debug)]
pub struct Spawner {
    pub pool: PlatformPool,
    pub cursor: ScrollState,
}

impl Spawner {
    /// True when the pool is empty or the newest platform has risen above
    /// `upper_bound - margin`.
    pub fn needs_spawn(&self, anchor_y: f32, upper_bound: f32, margin: f32) -> bool {
        match self.pool.newest() {
            None => true,
            Some(p) => anchor_y + p.local.y > upper_bound - margin,
        }
    }

    pub fn needs_recycle(&self, anchor_y: f32, threshold: f32) -> bool {
        self.pool
            .oldest()
            .is_some_and(|p| anchor_y + p.local.y > threshold)
    }

    /// Places `entity` below the current cursor and appends it to the pool.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        entity: Entity,
        rng: &mut R,
        settings: &GameSettings,
    ) -> PooledPlatform {
        let x = sample_x(rng, settings.spawn_x_range);
        let y = self
            .cursor
            .advance(rng, settings.vertical_gap, settings.gap_jitter);
        let platform = PooledPlatform {
            entity,
            local: Vec2::new(x, y),
        };
        self.pool.push_newest(platform);
        platform
    }

    /// Moves the oldest platform below the cursor; it becomes the newest.
    pub fn recycle<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        settings: &GameSettings,
    ) -> Option<PooledPlatform> {
        let mut platform = self.pool.pop_oldest()?;
        let y = self
            .cursor
            .advance(rng, settings.vertical_gap, settings.gap_jitter);
        platform.local = Vec2::new(sample_x(rng, settings.spawn_x_range), y);
        self.pool.push_newest(platform);
        Some(platform)
    }

    /// One frame of scrolling. `alloc` is only called when a new platform is
    /// needed.
    #[allow(clippy::too_many_arguments)]
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        anchor_y: &mut f32,
        dt: f32,
        camera_y: f32,
        viewport: &Viewport,
        settings: &GameSettings,
        rng: &mut R,
        alloc: impl FnOnce() -> Entity,
    ) -> TickReport {
        *anchor_y += settings.scroll_speed * dt;

        let mut report = TickReport::default();
        let upper = viewport.upper_bound(camera_y);
        if self.needs_spawn(*anchor_y, upper, settings.spawn_margin) {
            report.spawned = Some(self.spawn(alloc(), rng, settings));
        }

        let threshold = viewport.recycle_threshold(camera_y, settings.recycle_margin);
        if self.needs_recycle(*anchor_y, threshold) {
            report.recycled = self.recycle(rng, settings);
        }
        report
    }
}

fn platform_bundle(local: Vec2, settings: &GameSettings) -> impl Bundle {
    (
        Platform,
        Tag(settings.platform_tag.clone()),
        Collider::new(settings.platform_size * 0.5),
        SpriteBundle {
            sprite: Sprite {
                color: Color::srgb(0.85, 0.35, 0.3),
                custom_size: Some(settings.platform_size),
                ..default()
            },
            transform: Transform::from_translation(local.extend(0.0)),
            ..default()
        },
    )
}

pub fn spawn_level_inner<R: Rng + ?Sized>(
    commands: &mut Commands,
    settings: &GameSettings,
    rng: &mut R,
    stats: &mut SimStats,
) {
    let anchor = commands
        .spawn((LevelAnchor, SpatialBundle::default()))
        .id();

    let mut spawner = Spawner::default();
    for _ in 0..settings.initial_platforms {
        let entity = commands.spawn_empty().id();
        let placed = spawner.spawn(entity, rng, settings);
        commands
            .entity(entity)
            .insert(platform_bundle(placed.local, settings))
            .set_parent(anchor);
    }

    stats.platforms = spawner.pool.len();
    if spawner.pool.is_empty() {
        warn!("level built without platforms, they will appear as it scrolls");
    }
    info!(
        "level built: {} platforms down to y={:.1}",
        spawner.pool.len(),
        spawner.cursor.next_spawn_y
    );
    commands.entity(anchor).insert(spawner);
}

pub fn spawn_level(
    mut commands: Commands,
    settings: Res<GameSettings>,
    mut rng: ResMut<SeededRng>,
    mut stats: ResMut<SimStats>,
) {
    spawn_level_inner(&mut commands, &settings, &mut rng.0, &mut stats);
}

#[allow(clippy::too_many_arguments)]
pub fn scroll_level(
    mut commands: Commands,
    time: Res<Time>,
    settings: Res<GameSettings>,
    viewport: Res<Viewport>,
    mut rng: ResMut<SeededRng>,
    mut stats: ResMut<SimStats>,
    q_cam: Query<&Transform, (With<MainCamera>, Without<LevelAnchor>, Without<Platform>)>,
    mut anchors: Query<(Entity, &mut Transform, &mut Spawner), With<LevelAnchor>>,
    mut platforms: Query<&mut Transform, (With<Platform>, Without<LevelAnchor>)>,
) {
    let dt = time.delta_seconds();
    let camera_y = q_cam.get_single().map_or(0.0, |t| t.translation.y);

    for (anchor, mut transform, mut spawner) in &mut anchors {
        let mut anchor_y = transform.translation.y;
        let report = spawner.tick(
            &mut anchor_y,
            dt,
            camera_y,
            &viewport,
            &settings,
            &mut rng.0,
            || commands.spawn_empty().id(),
        );
        transform.translation.y = anchor_y;

        if let Some(placed) = report.spawned {
            commands
                .entity(placed.entity)
                .insert(platform_bundle(placed.local, &settings))
                .set_parent(anchor);
        }

        if let Some(moved) = report.recycled {
            if let Ok(mut t) = platforms.get_mut(moved.entity) {
                t.translation.x = moved.local.x;
                t.translation.y = moved.local.y;
            }
            stats.recycled += 1;
            debug!(
                "recycled {:?} to ({:.2}, {:.2})",
                moved.entity, moved.local.x, moved.local.y
            );
        }

        stats.platforms = spawner.pool.len();
        stats.depth = anchor_y;
    }
}
