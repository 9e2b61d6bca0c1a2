//! Obstruction world using rapier3d
//!
//! Nothing here is simulated. Level geometry and actor capsules are plain
//! colliders; scripts move actors directly and [`Physics::sync`] rebuilds the
//! query structures so ray casts see the new poses.

use glam::Vec3;
use rapier3d::prelude::*;
use rustc_hash::FxHashMap;

use super::query::{BodyId, ObstructionQuery, RaycastHit};

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

/// Collider set plus the query pipeline that answers rays against it
pub struct Physics {
    colliders: ColliderSet,
    /// Colliders here have no parent body; the set is only needed for removal
    bodies: RigidBodySet,
    islands: IslandManager,
    queries: QueryPipeline,
    handles: FxHashMap<BodyId, ColliderHandle>,
    next_id: u64,
    /// Poses changed since the last sync
    dirty: bool,
}

impl Physics {
    pub fn new() -> Self {
        Self {
            colliders: ColliderSet::new(),
            bodies: RigidBodySet::new(),
            islands: IslandManager::new(),
            queries: QueryPipeline::new(),
            handles: FxHashMap::default(),
            next_id: 1,
            dirty: false,
        }
    }

    /// Rebuild the query pipeline if anything moved, was added or removed
    pub fn sync(&mut self) {
        if self.dirty {
            self.queries.update(&self.colliders);
            self.dirty = false;
        }
    }

    fn insert(&mut self, collider: Collider) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;

        let mut collider = collider;
        collider.user_data = u128::from(id.0);
        let handle = self.colliders.insert(collider);
        self.handles.insert(id, handle);
        self.dirty = true;
        id
    }

    /// Layer bits become both membership and filter, so every layer can see
    /// every other and rays do the filtering.
    fn groups(layers: u32) -> InteractionGroups {
        InteractionGroups::new(Group::from_bits_truncate(layers), Group::ALL)
    }

    /// Add a static box (wall, floor slab) centered at `center`
    pub fn add_static_box(&mut self, center: Vec3, half_extents: Vec3, layers: u32) -> BodyId {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(to_vector(center))
            .collision_groups(Self::groups(layers))
            .build();
        self.insert(collider)
    }

    /// Add an upright capsule whose bottom touches `feet`
    pub fn add_actor(&mut self, feet: Vec3, half_height: f32, radius: f32, layers: u32) -> BodyId {
        let collider = ColliderBuilder::capsule_y(half_height, radius)
            .translation(to_vector(Self::capsule_center(feet, half_height, radius)))
            .collision_groups(Self::groups(layers))
            .build();
        self.insert(collider)
    }

    fn capsule_center(feet: Vec3, half_height: f32, radius: f32) -> Vec3 {
        feet + Vec3::Y * (half_height + radius)
    }

    /// Move an actor so its feet are at `feet`; visible to rays after [`Self::sync`]
    pub fn set_kinematic_position(&mut self, body: BodyId, feet: Vec3) {
        let Some(collider) = self
            .handles
            .get(&body)
            .and_then(|handle| self.colliders.get_mut(*handle))
        else {
            log::warn!("set_kinematic_position: unknown body {body:?}");
            return;
        };

        let center = match collider.shape().as_capsule() {
            Some(capsule) => Self::capsule_center(feet, capsule.half_height(), capsule.radius),
            None => feet,
        };
        collider.set_translation(to_vector(center));
        self.dirty = true;
    }

    /// Center of a body's collider
    pub fn position(&self, body: BodyId) -> Option<Vec3> {
        let handle = self.handles.get(&body)?;
        self.colliders.get(*handle).map(|collider| {
            let t = collider.translation();
            Vec3::new(t.x, t.y, t.z)
        })
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.handles.len()
    }

    /// Remove a body; rays stop hitting it after the next sync
    pub fn remove_body(&mut self, body: BodyId) {
        let Some(handle) = self.handles.remove(&body) else {
            return;
        };
        self.colliders
            .remove(handle, &mut self.islands, &mut self.bodies, false);
        self.dirty = true;
    }
}

impl ObstructionQuery for Physics {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: u32,
    ) -> Option<RaycastHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }

        let ray = Ray::new(point![origin.x, origin.y, origin.z], to_vector(direction));
        let filter = QueryFilter::default().groups(InteractionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(mask),
        ));

        let (handle, distance) =
            self.queries
                .cast_ray(&self.bodies, &self.colliders, &ray, max_distance, true, filter)?;

        let body = self
            .colliders
            .get(handle)
            .and_then(|collider| u64::try_from(collider.user_data).ok())
            .map(BodyId);
        let hit = ray.point_at(distance);
        Some(RaycastHit {
            body,
            point: Vec3::new(hit.x, hit.y, hit.z),
            distance,
        })
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::layers;

    fn world_with_wall() -> (Physics, BodyId) {
        let mut physics = Physics::new();
        let wall = physics.add_static_box(
            Vec3::new(0.0, 1.0, -5.0),
            Vec3::new(2.0, 1.0, 0.1),
            layers::ENVIRONMENT,
        );
        physics.sync();
        (physics, wall)
    }

    #[test]
    fn test_raycast_hits_wall() {
        let (physics, wall) = world_with_wall();

        let hit = physics
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z, 20.0, layers::ENVIRONMENT)
            .expect("ray should hit the wall");

        assert_eq!(hit.body, Some(wall));
        assert!((hit.distance - 4.9).abs() < 0.01);
        assert!((hit.point.z + 4.9).abs() < 0.01);
    }

    #[test]
    fn test_raycast_respects_mask() {
        let (physics, _) = world_with_wall();

        let hit = physics.raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z, 20.0, layers::ACTORS);
        assert!(hit.is_none());
    }

    #[test]
    fn test_raycast_respects_max_distance() {
        let (physics, _) = world_with_wall();

        let hit = physics.raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z, 3.0, layers::ENVIRONMENT);
        assert!(hit.is_none());
    }

    #[test]
    fn test_moved_actor_is_seen_after_sync() {
        let mut physics = Physics::new();
        let actor = physics.add_actor(Vec3::new(0.0, 0.0, -6.0), 0.5, 0.4, layers::ACTORS);
        physics.sync();

        let eye = Vec3::new(0.0, 1.0, 0.0);
        let hit = physics
            .raycast(eye, Vec3::NEG_Z, 10.0, layers::ACTORS)
            .expect("ray should hit the capsule");
        assert_eq!(hit.body, Some(actor));

        physics.set_kinematic_position(actor, Vec3::new(5.0, 0.0, -6.0));
        physics.sync();
        assert!(physics.raycast(eye, Vec3::NEG_Z, 10.0, layers::ACTORS).is_none());

        let center = physics.position(actor).unwrap();
        assert!((center.y - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_remove_body() {
        let (mut physics, wall) = world_with_wall();
        assert_eq!(physics.body_count(), 1);

        physics.remove_body(wall);
        physics.sync();

        assert_eq!(physics.body_count(), 0);
        assert!(physics.position(wall).is_none());
        let hit = physics.raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z, 20.0, layers::ENVIRONMENT);
        assert!(hit.is_none());
    }
}
