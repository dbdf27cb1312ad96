use bevy::prelude::*;
use bevy::utils::HashSet;

use crate::mover::Mover;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}
impl Aabb {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self { Self { center, half_extents } }
    /// Touching edges count as an overlap.
    pub fn intersects(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        d.x <= reach.x && d.y <= reach.y
    }
}

#[derive(Component, Clone, Copy, Debug)]
pub struct Collider {
    pub half_extents: Vec2,
}
impl Collider {
    pub fn new(half_extents: Vec2) -> Self { Self { half_extents } }
    pub fn aabb_at(&self, center: Vec2) -> Aabb { Aabb::new(center, self.half_extents) }
}

/// Contact tag, compared against the hazard tag on contact.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct Tag(pub String);

/// Sent on the first frame a mover overlaps a tagged collider.
#[derive(Event, Clone, Debug)]
pub struct TriggerEntered {
    pub entity: Entity,
    pub other: Entity,
    pub tag: String,
}

// Colliders are either roots or direct children of a root (platforms under the
// level anchor), translation only. GlobalTransform is a frame stale for
// entities spawned this frame, so positions come from local transforms.
fn world_center(
    transform: &Transform,
    parent: Option<&Parent>,
    roots: &Query<&Transform, Without<Collider>>,
) -> Vec2 {
    let local = transform.translation.truncate();
    match parent.and_then(|p| roots.get(p.get()).ok()) {
        Some(root) => root.translation.truncate() + local,
        None => local,
    }
}

pub fn detect_contacts(
    mut overlaps: Local<HashSet<(Entity, Entity)>>,
    movers: Query<(Entity, &Transform, &Collider, Option<&Parent>), With<Mover>>,
    others: Query<(Entity, &Transform, &Collider, &Tag, Option<&Parent>), Without<Mover>>,
    roots: Query<&Transform, Without<Collider>>,
    mut ev_trigger: EventWriter<TriggerEntered>,
) {
    let mut current = HashSet::default();

    for (mover, t, collider, parent) in &movers {
        let a = collider.aabb_at(world_center(t, parent, &roots));
        for (other, ot, oc, tag, op) in &others {
            let b = oc.aabb_at(world_center(ot, op, &roots));
            if !a.intersects(&b) {
                continue;
            }
            current.insert((mover, other));
            if !overlaps.contains(&(mover, other)) {
                ev_trigger.send(TriggerEntered {
                    entity: mover,
                    other,
                    tag: tag.0.clone(),
                });
            }
        }
    }

    *overlaps = current;
}

#[cfg(test)]
mod tests {
    use bevy::ecs::event::ManualEventReader;

    use super::*;

    #[test]
    fn aabb_intersects() {
        let a = Aabb::new(Vec2::ZERO, Vec2::new(1.0, 0.5));

        let touching = Aabb::new(Vec2::new(2.0, 0.0), Vec2::new(1.0, 0.5));
        let apart = Aabb::new(Vec2::new(0.0, 1.5), Vec2::new(1.0, 0.4));
        assert!(a.intersects(&touching));
        assert!(touching.intersects(&a));
        assert!(!a.intersects(&apart));
    }

    fn contact_app() -> App {
        let mut app = App::new();
        app.add_event::<TriggerEntered>()
            .add_systems(Update, detect_contacts);
        app
    }

    fn drain(app: &App, reader: &mut ManualEventReader<TriggerEntered>) -> Vec<TriggerEntered> {
        let events = app.world().resource::<Events<TriggerEntered>>();
        reader.read(events).cloned().collect()
    }

    #[test]
    fn trigger_fires_once_per_overlap() {
        let mut app = contact_app();
        let player = app
            .world_mut()
            .spawn((
                Mover { speed: 7.0, edge_margin: 0.5 },
                Collider::new(Vec2::splat(0.5)),
                Transform::default(),
            ))
            .id();
        let block = app
            .world_mut()
            .spawn((
                Collider::new(Vec2::new(1.25, 0.25)),
                Tag("Hazzard".into()),
                Transform::from_xyz(0.5, 0.6, 0.0),
            ))
            .id();
        let mut reader = app
            .world()
            .resource::<Events<TriggerEntered>>()
            .get_reader();

        app.update();
        let fired = drain(&app, &mut reader);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].entity, player);
        assert_eq!(fired[0].other, block);
        assert_eq!(fired[0].tag, "Hazzard");

        app.update();
        assert!(drain(&app, &mut reader).is_empty());

        app.world_mut()
            .entity_mut(block)
            .insert(Transform::from_xyz(0.0, 10.0, 0.0));
        app.update();
        assert!(drain(&app, &mut reader).is_empty());

        app.world_mut()
            .entity_mut(block)
            .insert(Transform::from_xyz(0.0, -0.5, 0.0));
        app.update();
        assert_eq!(drain(&app, &mut reader).len(), 1);
    }

    #[test]
    fn child_colliders_use_parent_offset() {
        let mut app = contact_app();
        app.world_mut().spawn((
            Mover { speed: 7.0, edge_margin: 0.5 },
            Collider::new(Vec2::splat(0.5)),
            Transform::default(),
        ));
        let anchor = app.world_mut().spawn(Transform::from_xyz(0.0, 4.0, 0.0)).id();
        app.world_mut()
            .spawn((
                Collider::new(Vec2::new(1.25, 0.25)),
                Tag("Hazzard".into()),
                Transform::from_xyz(0.0, -4.0, 0.0),
            ))
            .set_parent(anchor);
        let mut reader = app
            .world()
            .resource::<Events<TriggerEntered>>()
            .get_reader();

        app.update();
        assert_eq!(drain(&app, &mut reader).len(), 1);
    }
}
