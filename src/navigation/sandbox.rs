//! Flat-island navigation for headless runs
//!
//! A stand-in for a host navigation system. Walkable space is a set of
//! axis-aligned rectangles at fixed heights ("islands"); links connect
//! islands. Paths are straight walking legs on an island separated by link
//! legs, found by a breadth-first search over the island graph. There is no
//! polygon search: an island is assumed convex and obstacle-free.
//!
//! Links are never crossed automatically. When the agent reaches a link leg
//! it reports [`NavAgent::is_on_link`] and waits for a link traversal
//! controller to move it and call [`NavAgent::complete_link_traversal`].
//! A destination placed on a link's entry asks for that link to be taken.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::{LinkData, MovementProfile, NavAgent, PathStatus};
use crate::ai::levels::horizontal_distance;
use crate::ai::steering::{Arrive, Motion, Seek, SteeringBehavior};
use crate::ecs::Transform;

/// How far above or below an island's height a point still counts as on it
const VERTICAL_TOLERANCE: f32 = 1.5;

/// Distance at which a walking leg counts as reached
const LEG_EPSILON: f32 = 0.05;

/// Horizontal distance from a link end at which a destination means "take the link"
const LINK_ENTRY_RADIUS: f32 = 0.1;

/// One walkable rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavSurface {
    /// Minimum corner on the XZ plane
    pub min: Vec2,
    /// Maximum corner on the XZ plane
    pub max: Vec2,
    /// Ground height
    pub height: f32,
}

impl NavSurface {
    /// Create a surface from two XZ corners in any order
    #[must_use]
    pub fn new(a: Vec2, b: Vec2, height: f32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
            height,
        }
    }

    /// The XZ footprint contains `point`
    #[must_use]
    pub fn contains_xz(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.z >= self.min.y && point.z <= self.max.y
    }

    /// `point` stands on this surface
    #[must_use]
    pub fn supports(&self, point: Vec3) -> bool {
        self.contains_xz(point) && (point.y - self.height).abs() <= VERTICAL_TOLERANCE
    }

    /// Closest point on the surface
    #[must_use]
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min.x, self.max.x),
            self.height,
            point.z.clamp(self.min.y, self.max.y),
        )
    }
}

/// Shared walkable geometry: islands and the links between them
#[derive(Debug, Clone, Default)]
pub struct NavMesh {
    surfaces: Vec<NavSurface>,
    links: Vec<LinkData>,
    /// Island index under each link's start and end
    link_islands: Vec<Option<(usize, usize)>>,
}

impl NavMesh {
    /// Build a mesh; links whose ends are not on an island are kept but unusable
    #[must_use]
    pub fn new(surfaces: Vec<NavSurface>, links: Vec<LinkData>) -> Self {
        let mut mesh = Self {
            surfaces,
            links,
            link_islands: Vec::new(),
        };
        let link_islands = mesh
            .links
            .iter()
            .map(|link| Some((mesh.surface_under(link.start)?, mesh.surface_under(link.end)?)))
            .collect();
        mesh.link_islands = link_islands;

        for (link, islands) in mesh.links.iter().zip(&mesh.link_islands) {
            if islands.is_none() {
                log::warn!("link {} -> {} does not touch two islands", link.start, link.end);
            }
        }
        mesh
    }

    /// Walkable surfaces
    #[must_use]
    pub fn surfaces(&self) -> &[NavSurface] {
        &self.surfaces
    }

    /// Links between surfaces
    #[must_use]
    pub fn links(&self) -> &[LinkData] {
        &self.links
    }

    /// Island supporting `point`, preferring the one closest in height
    #[must_use]
    pub fn surface_under(&self, point: Vec3) -> Option<usize> {
        self.surfaces
            .iter()
            .enumerate()
            .filter(|(_, s)| s.supports(point))
            .min_by(|(_, a), (_, b)| {
                (point.y - a.height)
                    .abs()
                    .total_cmp(&(point.y - b.height).abs())
            })
            .map(|(i, _)| i)
    }

    /// Nearest walkable point within `max_radius`
    #[must_use]
    pub fn nearest_point(&self, point: Vec3, max_radius: f32) -> Option<(usize, Vec3)> {
        self.surfaces
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.closest_point(point)))
            .filter(|(_, p)| p.distance(point) <= max_radius)
            .min_by(|(_, a), (_, b)| a.distance(point).total_cmp(&b.distance(point)))
    }

    /// Links to cross, in order and oriented, to get from one island to another
    fn island_route(&self, from: usize, to: usize) -> Option<Vec<LinkData>> {
        if from == to {
            return Some(Vec::new());
        }

        // Breadth-first over islands; remember the oriented link used to arrive
        let mut came_from: Vec<Option<(usize, LinkData)>> = vec![None; self.surfaces.len()];
        let mut visited = vec![false; self.surfaces.len()];
        let mut queue = VecDeque::from([from]);
        visited[from] = true;

        while let Some(island) = queue.pop_front() {
            if island == to {
                break;
            }
            for (link, ends) in self.links.iter().zip(&self.link_islands) {
                let Some((a, b)) = *ends else { continue };
                let step = if a == island {
                    Some((b, *link))
                } else if b == island {
                    Some((a, link.reversed()))
                } else {
                    None
                };
                if let Some((next, oriented)) = step
                    && !visited[next]
                {
                    visited[next] = true;
                    came_from[next] = Some((island, oriented));
                    queue.push_back(next);
                }
            }
        }

        if !visited[to] {
            return None;
        }

        let mut route = Vec::new();
        let mut current = to;
        while let Some((previous, link)) = came_from[current] {
            route.push(link);
            current = previous;
        }
        route.reverse();
        Some(route)
    }

    /// Usable link with an end on `island` at `point`, oriented to start there
    fn link_entry(&self, island: usize, point: Vec3) -> Option<LinkData> {
        self.links
            .iter()
            .zip(&self.link_islands)
            .find_map(|(link, ends)| {
                let (a, b) = (*ends)?;
                if a == island && horizontal_distance(link.start, point) <= LINK_ENTRY_RADIUS {
                    Some(*link)
                } else if b == island && horizontal_distance(link.end, point) <= LINK_ENTRY_RADIUS {
                    Some(link.reversed())
                } else {
                    None
                }
            })
    }
}

/// One step of a planned path
#[derive(Debug, Clone, Copy, PartialEq)]
enum Leg {
    Walk(Vec3),
    Cross(LinkData),
}

impl Leg {
    fn end(&self) -> Vec3 {
        match self {
            Self::Walk(point) => *point,
            Self::Cross(link) => link.end,
        }
    }
}

/// A navigation agent moving over a [`NavMesh`]
#[derive(Debug, Clone)]
pub struct SandboxAgent {
    mesh: Arc<NavMesh>,
    profile: MovementProfile,
    /// Agent position as last seen by the service
    position: Vec3,
    velocity: Vec3,
    /// Requested destination awaiting planning
    pending: Option<Vec3>,
    legs: VecDeque<Leg>,
    status: PathStatus,
    /// Link the agent is waiting on
    link: Option<LinkData>,
    stopped: bool,
    update_position: bool,
}

impl SandboxAgent {
    /// Place an agent on the mesh
    #[must_use]
    pub fn new(mesh: Arc<NavMesh>, profile: MovementProfile, position: Vec3) -> Self {
        Self {
            mesh,
            profile,
            position,
            velocity: Vec3::ZERO,
            pending: None,
            legs: VecDeque::new(),
            status: PathStatus::Complete,
            link: None,
            stopped: false,
            update_position: true,
        }
    }

    /// Current movement profile
    #[must_use]
    pub fn profile(&self) -> &MovementProfile {
        &self.profile
    }

    /// Plan a path from the current position to `destination`
    fn plan(&mut self, destination: Vec3) {
        self.legs.clear();

        let Some(from) = self.mesh.surface_under(self.position) else {
            self.status = PathStatus::Invalid;
            return;
        };

        let (goal_island, goal, off_mesh) = match self.mesh.surface_under(destination) {
            Some(island) => (
                island,
                self.mesh.surfaces[island].closest_point(destination),
                false,
            ),
            None => match self.mesh.nearest_point(destination, f32::INFINITY) {
                Some((island, point)) => (island, point, true),
                None => {
                    self.status = PathStatus::Invalid;
                    return;
                }
            },
        };

        match self.mesh.island_route(from, goal_island) {
            Some(route) => {
                let arrival = route.last().copied();
                for link in route {
                    self.legs.push_back(Leg::Walk(link.start));
                    self.legs.push_back(Leg::Cross(link));
                }
                // Never climb straight back up the link just descended
                match self.mesh.link_entry(goal_island, goal) {
                    Some(entry) if arrival.is_none_or(|last| last != entry.reversed()) => {
                        self.legs.push_back(Leg::Walk(entry.start));
                        self.legs.push_back(Leg::Cross(entry));
                    }
                    _ => self.legs.push_back(Leg::Walk(goal)),
                }
                self.status = if off_mesh {
                    PathStatus::Partial
                } else {
                    PathStatus::Complete
                };
            }
            None => {
                let closest = self.mesh.surfaces[from].closest_point(destination);
                self.legs.push_back(Leg::Walk(closest));
                self.status = PathStatus::Partial;
            }
        }

        log::trace!(
            "planned {} legs to {destination} ({:?})",
            self.legs.len(),
            self.status
        );
    }

    /// Advance one tick: finish pending plans and move along the path.
    ///
    /// Writes the new position into `transform` unless position updates are
    /// disabled.
    pub fn advance(&mut self, transform: &mut Transform, dt: f32) {
        self.position = transform.position;

        if self.link.is_some() {
            // A controller owns the agent until the crossing completes
            self.velocity = Vec3::ZERO;
            return;
        }

        if let Some(destination) = self.pending.take() {
            self.plan(destination);
        }

        if self.stopped || dt <= 0.0 {
            self.velocity = Vec3::ZERO;
            return;
        }

        let target = match self.legs.front() {
            Some(Leg::Walk(point)) => *point,
            Some(Leg::Cross(link)) => {
                self.link = Some(*link);
                self.velocity = Vec3::ZERO;
                return;
            }
            None => {
                self.velocity = Vec3::ZERO;
                return;
            }
        };

        let motion = Motion::planar(self.position, self.velocity);
        let flat_position = motion.position;
        let flat_target = target.with_y(0.0);

        let steering = if self.legs.len() == 1 {
            Arrive::toward(target, &self.profile).steer(motion)
        } else {
            Seek::toward(target, &self.profile).steer(motion)
        };
        self.velocity = steering.integrate(self.velocity, dt, self.profile.speed);

        let step = self.velocity * dt;
        let distance = flat_position.distance(flat_target);
        if distance <= LEG_EPSILON || distance <= step.length() {
            self.position = target;
            self.legs.pop_front();
            match self.legs.front() {
                Some(Leg::Cross(link)) => {
                    self.link = Some(*link);
                    self.velocity = Vec3::ZERO;
                }
                None => self.velocity = Vec3::ZERO,
                Some(Leg::Walk(_)) => {}
            }
        } else {
            self.position += step;
            if let Some(island) = self.mesh.surface_under(self.position) {
                self.position.y = self.mesh.surfaces[island].height;
            }
        }

        if self.update_position {
            transform.position = self.position;
            let max_turn = self.profile.angular_speed.to_radians() * dt;
            transform.turn_towards(flat_target - flat_position, max_turn);
        }
    }
}

impl NavAgent for SandboxAgent {
    fn set_destination(&mut self, point: Vec3) -> bool {
        if !self.is_on_navmesh() {
            return false;
        }
        self.pending = Some(point);
        true
    }

    fn reset_path(&mut self) {
        self.pending = None;
        self.legs.clear();
        self.status = PathStatus::Complete;
        self.velocity = Vec3::ZERO;
    }

    fn has_pending_path(&self) -> bool {
        self.pending.is_some()
    }

    fn remaining_distance(&self) -> f32 {
        let mut from = self.position;
        let mut total = 0.0;
        for leg in &self.legs {
            let end = leg.end();
            total += from.distance(end);
            from = end;
        }
        total
    }

    fn path_status(&self) -> PathStatus {
        self.status
    }

    fn is_on_link(&self) -> bool {
        self.link.is_some()
    }

    fn current_link(&self) -> Option<LinkData> {
        self.link
    }

    fn complete_link_traversal(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };
        if matches!(self.legs.front(), Some(Leg::Cross(_))) {
            self.legs.pop_front();
        }
        self.position = link.end;
    }

    fn sample_point(&self, near: Vec3, max_radius: f32) -> Option<Vec3> {
        self.mesh
            .nearest_point(near, max_radius)
            .map(|(_, point)| point)
    }

    fn set_update_position(&mut self, enabled: bool) {
        self.update_position = enabled;
    }

    fn set_stopped(&mut self, stopped: bool) {
        self.stopped = stopped;
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn is_on_navmesh(&self) -> bool {
        self.link.is_some() || self.mesh.surface_under(self.position).is_some()
    }

    fn set_speed(&mut self, speed: f32) {
        self.profile.speed = speed.max(0.0);
    }

    fn apply_profile(&mut self, profile: &MovementProfile) {
        self.profile = *profile;
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }
}
