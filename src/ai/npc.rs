//! Patrol / chase / search state machine
//!
//! An NPC patrols its waypoints until it sees the target, chases while it
//! keeps sight, then searches the last place it saw the target before giving
//! up and patrolling again.
//!
//! ```text
//!            sees target              loses sight
//!   Patrol ─────────────────> Chase ─────────────> Search
//!     ^                         ^                    │
//!     │                         └──── sees target ───┤
//!     └──── countdown expired / reached last-known ──┘
//! ```
//!
//! All timers are cooperative and advanced by [`Npc::tick`]. Blocked paths
//! are retried toward a per-state target, at most once per cooldown.

use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use super::context::{AgentContext, nav_is_moving};
use super::patrol::{PatrolRoute, WaypointPolicy};
use super::perception::Perception;
use super::task::{Cadence, Cooldown, Countdown, Dwell};
use super::traversal::{LinkTraversal, TraversalStatus};
use crate::core::events::AgentEvent;
use crate::ecs::Transform;
use crate::navigation::{MovementProfile, NavAgent, request_path};

// ============================================================================
// State
// ============================================================================

/// Pursuit state of an NPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PursuitState {
    /// Walking the waypoint route
    #[default]
    Patrol,
    /// Pursuing a visible target
    Chase,
    /// Looking for the target at its last known position
    Search,
}

impl fmt::Display for PursuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Patrol => "Patrol",
            Self::Chase => "Chase",
            Self::Search => "Search",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// NPC tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    /// Speed while patrolling
    pub patrol_speed: f32,
    /// Speed while chasing and searching
    pub chase_speed: f32,
    /// Maximum acceleration
    pub acceleration: f32,
    /// Turn rate in degrees per second
    pub angular_speed: f32,
    /// Sight settings
    pub perception: Perception,
    /// Distance at which the NPC stops to attack
    pub attack_range: f32,
    /// Remaining path distance that counts as arrived
    pub stop_tolerance: f32,
    /// Wait at each waypoint; zero moves on immediately
    pub dwell_time: f32,
    /// Waypoint selection
    pub waypoint_policy: WaypointPolicy,
    /// Seconds between path requests while chasing
    pub chase_repath_interval: f32,
    /// Seconds spent searching before giving up
    pub search_duration: f32,
    /// Grace period before giving up on a lost target. Not consulted: sight
    /// loss switches to search at once.
    pub lose_sight_grace: f32,
    /// Minimum seconds between path requests when retrying a blocked path
    pub path_retry_cooldown: f32,
    /// Link crossing speed
    pub link_speed: f32,
    /// Peak height of the link crossing arc
    pub link_arc_height: f32,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            patrol_speed: 2.0,
            chase_speed: 4.5,
            acceleration: 8.0,
            angular_speed: 120.0,
            perception: Perception::default(),
            attack_range: 1.8,
            stop_tolerance: 0.5,
            dwell_time: 0.0,
            waypoint_policy: WaypointPolicy::Loop,
            chase_repath_interval: 0.25,
            search_duration: 5.0,
            lose_sight_grace: 1.0,
            path_retry_cooldown: 1.0,
            link_speed: 4.0,
            link_arc_height: 1.0,
        }
    }
}

impl NpcConfig {
    /// Movement profile at `speed`
    #[must_use]
    pub fn movement(&self, speed: f32) -> MovementProfile {
        MovementProfile {
            speed,
            acceleration: self.acceleration,
            angular_speed: self.angular_speed,
            stopping_distance: 0.0,
        }
    }
}

// ============================================================================
// NPC
// ============================================================================

/// Per-agent pursuit state
#[derive(Debug, Clone)]
pub struct Npc {
    config: NpcConfig,
    state: PursuitState,
    route: PatrolRoute,
    rng: SmallRng,
    last_known: Option<Vec3>,
    search: Countdown,
    retry: Cooldown,
    repath: Cadence,
    dwell: Option<Dwell>,
    traversal: LinkTraversal,
    moving: bool,
    started: bool,
}

impl Npc {
    /// Create an NPC patrolling `waypoints`, seeded for random waypoint picks
    #[must_use]
    pub fn new(config: NpcConfig, waypoints: Arc<[Vec3]>, seed: u64) -> Self {
        Self {
            route: PatrolRoute::new(waypoints, config.waypoint_policy),
            rng: SmallRng::seed_from_u64(seed),
            state: PursuitState::Patrol,
            last_known: None,
            search: Countdown::new(config.search_duration),
            retry: Cooldown::new(config.path_retry_cooldown),
            repath: Cadence::new(config.chase_repath_interval),
            dwell: None,
            traversal: LinkTraversal::new(),
            moving: false,
            started: false,
            config,
        }
    }

    /// Tuning
    #[must_use]
    pub fn config(&self) -> &NpcConfig {
        &self.config
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> PursuitState {
        self.state
    }

    /// Where the target was last seen
    #[must_use]
    pub fn last_known_position(&self) -> Option<Vec3> {
        self.last_known
    }

    /// The animation flag from the last tick
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Index of the current patrol waypoint
    #[must_use]
    pub fn waypoint_index(&self) -> usize {
        self.route.index()
    }

    /// Waiting at a waypoint
    #[must_use]
    pub fn is_dwelling(&self) -> bool {
        self.dwell.is_some()
    }

    /// Seconds left before a search gives up
    #[must_use]
    pub fn search_remaining(&self) -> f32 {
        self.search.remaining()
    }

    /// Put the NPC in `state` without running transition side effects.
    ///
    /// Used by scripted scenes. Resets the search countdown and cancels any
    /// waypoint wait.
    pub fn force_state(&mut self, state: PursuitState, last_known: Option<Vec3>) {
        log::debug!("forcing {} -> {state}", self.state);
        self.state = state;
        self.last_known = last_known;
        self.search.reset();
        self.dwell = None;
    }

    /// Run one tick
    pub fn tick<N: NavAgent + ?Sized>(
        &mut self,
        transform: &mut Transform,
        nav: &mut N,
        ctx: &mut AgentContext<'_>,
    ) {
        if !self.started {
            self.started = true;
            let speed = match self.state {
                PursuitState::Patrol => self.config.patrol_speed,
                PursuitState::Chase | PursuitState::Search => self.config.chase_speed,
            };
            nav.apply_profile(&self.config.movement(speed));
            if self.state == PursuitState::Patrol
                && let Some(waypoint) = self.route.current()
            {
                self.request(nav, ctx.now, waypoint);
            }
        }

        if self.run_traversal(transform, nav, ctx) {
            self.moving = true;
            return;
        }

        let sees = ctx.target.is_some_and(|target| {
            self.config
                .perception
                .has_line_of_sight(transform, &target, ctx.obstructions)
        });

        match self.state {
            PursuitState::Patrol => self.patrol(nav, ctx, sees),
            PursuitState::Chase => self.chase(transform, nav, ctx, sees),
            PursuitState::Search => self.search(nav, ctx, sees),
        }

        self.recover_blocked(nav, ctx);
        self.moving = nav_is_moving(nav);
    }

    /// Retry a blocked or invalid path toward the current state's retry
    /// target, at most once per cooldown. Returns true if a retry was issued.
    pub fn recover_blocked<N: NavAgent + ?Sized>(
        &mut self,
        nav: &mut N,
        ctx: &mut AgentContext<'_>,
    ) -> bool {
        if nav.has_pending_path() || !nav.path_status().is_blocked() {
            return false;
        }
        if !self.retry.is_ready(ctx.now) {
            return false;
        }

        let destination = match self.state {
            PursuitState::Patrol => self.route.current(),
            PursuitState::Chase => self.last_known.or(ctx.target_position()),
            PursuitState::Search => self.last_known,
        };
        let Some(destination) = destination else {
            return false;
        };

        log::debug!(
            "{:?} path is {:?} in {}, retrying toward {destination}",
            ctx.entity,
            nav.path_status(),
            self.state
        );
        ctx.events.push(AgentEvent::PathRetried {
            agent: ctx.entity,
            destination,
        });
        self.request(nav, ctx.now, destination);
        true
    }

    // ------------------------------------------------------------------------
    // States
    // ------------------------------------------------------------------------

    fn patrol<N: NavAgent + ?Sized>(&mut self, nav: &mut N, ctx: &mut AgentContext<'_>, sees: bool) {
        if sees && let Some(position) = ctx.target_position() {
            self.enter_chase(position, nav, ctx);
            return;
        }

        if self.route.is_empty() {
            return;
        }

        if let Some(dwell) = self.dwell.as_mut() {
            if dwell.tick(ctx.dt) {
                self.dwell = None;
                nav.set_stopped(false);
                self.next_waypoint(nav, ctx);
            }
            return;
        }

        if self.arrived(nav) {
            ctx.events.push(AgentEvent::WaypointReached {
                agent: ctx.entity,
                index: self.route.index(),
            });
            if self.config.dwell_time > 0.0 {
                nav.set_stopped(true);
                self.dwell = Some(Dwell::new(self.config.dwell_time));
            } else {
                self.next_waypoint(nav, ctx);
            }
        }
    }

    fn chase<N: NavAgent + ?Sized>(
        &mut self,
        transform: &Transform,
        nav: &mut N,
        ctx: &mut AgentContext<'_>,
        sees: bool,
    ) {
        let target = match ctx.target_position() {
            Some(position) if sees => position,
            _ => {
                self.enter_search(nav, ctx);
                return;
            }
        };

        self.last_known = Some(target);
        if self.repath.tick(ctx.dt) {
            self.request(nav, ctx.now, target);
        }

        let in_range = transform.position.distance(target) <= self.config.attack_range;
        nav.set_stopped(in_range);
    }

    fn search<N: NavAgent + ?Sized>(&mut self, nav: &mut N, ctx: &mut AgentContext<'_>, sees: bool) {
        if sees && let Some(position) = ctx.target_position() {
            self.enter_chase(position, nav, ctx);
            return;
        }

        if self.last_known.is_none() {
            self.return_to_patrol(nav, ctx);
            return;
        }

        if self.search.tick(ctx.dt) {
            log::debug!("{:?} gave up searching", ctx.entity);
            self.return_to_patrol(nav, ctx);
            return;
        }

        if self.arrived(nav) {
            log::debug!("{:?} reached last known position", ctx.entity);
            self.return_to_patrol(nav, ctx);
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn enter_chase<N: NavAgent + ?Sized>(
        &mut self,
        target: Vec3,
        nav: &mut N,
        ctx: &mut AgentContext<'_>,
    ) {
        self.set_state(PursuitState::Chase, ctx);
        ctx.events.push(AgentEvent::TargetSighted {
            agent: ctx.entity,
            position: target,
        });

        self.dwell = None;
        self.last_known = Some(target);
        nav.set_speed(self.config.chase_speed);
        nav.set_stopped(false);
        self.request(nav, ctx.now, target);
        self.repath.restart();
    }

    fn enter_search<N: NavAgent + ?Sized>(&mut self, nav: &mut N, ctx: &mut AgentContext<'_>) {
        self.set_state(PursuitState::Search, ctx);
        ctx.events.push(AgentEvent::TargetLost {
            agent: ctx.entity,
            last_known: self.last_known,
        });

        self.search.reset();
        nav.set_stopped(false);
        if let Some(last_known) = self.last_known {
            self.request(nav, ctx.now, last_known);
        }
    }

    fn return_to_patrol<N: NavAgent + ?Sized>(&mut self, nav: &mut N, ctx: &mut AgentContext<'_>) {
        self.set_state(PursuitState::Patrol, ctx);

        self.last_known = None;
        self.search.reset();
        self.dwell = None;
        nav.set_speed(self.config.patrol_speed);
        nav.set_stopped(false);
        if let Some(waypoint) = self.route.current() {
            self.request(nav, ctx.now, waypoint);
        }
    }

    fn set_state(&mut self, to: PursuitState, ctx: &mut AgentContext<'_>) {
        let from = self.state;
        self.state = to;
        log::debug!("{:?}: {from} -> {to}", ctx.entity);
        ctx.events.push(AgentEvent::StateChanged {
            agent: ctx.entity,
            from,
            to,
        });
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn next_waypoint<N: NavAgent + ?Sized>(&mut self, nav: &mut N, ctx: &AgentContext<'_>) {
        self.route.advance(&mut self.rng);
        if let Some(waypoint) = self.route.current() {
            self.request(nav, ctx.now, waypoint);
        }
    }

    fn arrived<N: NavAgent + ?Sized>(&self, nav: &N) -> bool {
        !nav.has_pending_path() && nav.remaining_distance() <= self.config.stop_tolerance
    }

    /// Every path request goes through here so the retry cooldown sees it
    fn request<N: NavAgent + ?Sized>(&mut self, nav: &mut N, now: f64, point: Vec3) {
        self.retry.mark(now);
        request_path(nav, point);
    }

    /// Start or continue a link crossing. True while the crossing owns the tick.
    fn run_traversal<N: NavAgent + ?Sized>(
        &mut self,
        transform: &mut Transform,
        nav: &mut N,
        ctx: &mut AgentContext<'_>,
    ) -> bool {
        if !self.traversal.is_active()
            && nav.is_on_link()
            && let Some(link) = nav.current_link()
            && self
                .traversal
                .begin(link, self.config.link_speed, self.config.link_arc_height, nav)
        {
            ctx.events.push(AgentEvent::LinkTraversalStarted {
                agent: ctx.entity,
                start: link.start,
                end: link.end,
            });
        }

        match self.traversal.advance(ctx.dt, transform, nav) {
            TraversalStatus::Idle => false,
            TraversalStatus::Running => true,
            TraversalStatus::Completed => {
                ctx.events.push(AgentEvent::LinkTraversalCompleted {
                    agent: ctx.entity,
                    position: transform.position,
                });
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Target;
    use crate::core::events::EventQueue;
    use crate::navigation::fake::FakeNav;
    use crate::core::Scene;
    use crate::navigation::{LinkData, NavMesh, PathStatus, SandboxAgent};
    use crate::physics::{BodyId, EmptySpace, ObstructionQuery, RaycastHit};

    /// Blocks every ray at one unit
    struct Blocked;

    impl ObstructionQuery for Blocked {
        fn raycast(&self, origin: Vec3, direction: Vec3, _: f32, _: u32) -> Option<RaycastHit> {
            Some(RaycastHit {
                body: Some(BodyId(99)),
                point: origin + direction,
                distance: 1.0,
            })
        }
    }

    struct Harness {
        npc: Npc,
        nav: FakeNav,
        transform: Transform,
        events: EventQueue,
        entity: hecs::Entity,
        now: f64,
    }

    impl Harness {
        fn new(config: NpcConfig) -> Self {
            let waypoints: Vec<Vec3> = vec![
                Vec3::new(0.0, 0.0, 20.0),
                Vec3::new(20.0, 0.0, 20.0),
                Vec3::new(20.0, 0.0, 0.0),
            ];
            let mut world = hecs::World::new();
            Self {
                npc: Npc::new(config, waypoints.into(), 7),
                nav: FakeNav::new(),
                // Facing -Z
                transform: Transform::from_position(Vec3::ZERO),
                events: EventQueue::new(),
                entity: world.spawn(()),
                now: 0.0,
            }
        }

        fn tick_with(&mut self, dt: f32, target: Option<Vec3>, query: &dyn ObstructionQuery) {
            let mut ctx = AgentContext::new(self.entity, dt, self.now, query, &mut self.events)
                .with_target(target.map(Target::at));
            self.npc.tick(&mut self.transform, &mut self.nav, &mut ctx);
            self.now += f64::from(dt);
        }

        fn tick(&mut self, target: Option<Vec3>) {
            self.tick_with(0.1, target, &EmptySpace);
        }

        fn recover(&mut self) -> bool {
            let mut ctx = AgentContext::new(self.entity, 0.1, self.now, &EmptySpace, &mut self.events);
            self.npc.recover_blocked(&mut self.nav, &mut ctx)
        }

        fn state_changes(&self) -> Vec<(PursuitState, PursuitState)> {
            self.events
                .pending()
                .filter_map(|event| match event {
                    AgentEvent::StateChanged { from, to, .. } => Some((*from, *to)),
                    _ => None,
                })
                .collect()
        }
    }

    const IN_VIEW: Vec3 = Vec3::new(0.0, 0.0, -6.0);

    #[test]
    fn test_first_tick_patrols_at_patrol_speed() {
        let mut h = Harness::new(NpcConfig::default());
        h.tick(None);

        assert_eq!(h.npc.state(), PursuitState::Patrol);
        assert_eq!(h.nav.last_destination(), Some(Vec3::new(0.0, 0.0, 20.0)));
        assert!((h.nav.speed - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_first_tick_after_forced_chase_uses_chase_speed() {
        let mut h = Harness::new(NpcConfig::default());
        h.npc.force_state(PursuitState::Chase, Some(IN_VIEW));
        h.tick(Some(IN_VIEW));

        assert_eq!(h.npc.state(), PursuitState::Chase);
        assert!((h.nav.speed - 4.5).abs() < 1e-6);
        assert_eq!(h.nav.last_destination(), Some(IN_VIEW));
    }

    #[test]
    fn test_out_of_range_never_chases() {
        let mut h = Harness::new(NpcConfig::default());
        for _ in 0..50 {
            h.tick(Some(Vec3::new(0.0, 0.0, -40.0)));
        }

        assert_eq!(h.npc.state(), PursuitState::Patrol);
        assert!(h.state_changes().is_empty());
    }

    #[test]
    fn test_sighting_chases_in_one_tick() {
        let mut h = Harness::new(NpcConfig::default());
        h.tick(Some(IN_VIEW));

        assert_eq!(h.npc.state(), PursuitState::Chase);
        assert_eq!(h.npc.last_known_position(), Some(IN_VIEW));
        assert_eq!(h.nav.last_destination(), Some(IN_VIEW));
        assert!((h.nav.speed - 4.5).abs() < 1e-6);
        assert_eq!(h.state_changes(), vec![(PursuitState::Patrol, PursuitState::Chase)]);
    }

    #[test]
    fn test_obstructed_target_is_not_chased() {
        let mut h = Harness::new(NpcConfig::default());
        h.tick_with(0.1, Some(IN_VIEW), &Blocked);

        assert_eq!(h.npc.state(), PursuitState::Patrol);
    }

    #[test]
    fn test_chase_refreshes_last_known_and_repaths_on_cadence() {
        let mut h = Harness::new(NpcConfig {
            chase_repath_interval: 0.5,
            ..Default::default()
        });
        h.tick(Some(IN_VIEW));
        let requests = h.nav.destinations.len();

        let moved = Vec3::new(1.0, 0.0, -7.0);
        for _ in 0..3 {
            h.tick(Some(moved));
        }

        assert_eq!(h.npc.last_known_position(), Some(moved));
        assert_eq!(h.nav.destinations.len(), requests);

        for _ in 0..4 {
            h.tick(Some(moved));
        }
        assert_eq!(h.nav.destinations.len(), requests + 1);
        assert_eq!(h.nav.last_destination(), Some(moved));
    }

    #[test]
    fn test_losing_sight_searches_same_tick() {
        let mut h = Harness::new(NpcConfig::default());
        h.tick(Some(IN_VIEW));
        let last_seen = Vec3::new(2.0, 0.0, -6.0);
        h.tick(Some(last_seen));

        h.tick_with(0.1, Some(Vec3::new(2.0, 0.0, -8.0)), &Blocked);

        assert_eq!(h.npc.state(), PursuitState::Search);
        assert_eq!(h.nav.last_destination(), Some(last_seen));
        assert_eq!(h.npc.last_known_position(), Some(last_seen));
        assert!(
            h.events
                .pending()
                .any(|e| matches!(e, AgentEvent::TargetLost { last_known: Some(p), .. } if *p == last_seen))
        );
    }

    #[test]
    fn test_missing_target_in_chase_searches() {
        let mut h = Harness::new(NpcConfig::default());
        h.tick(Some(IN_VIEW));
        h.tick(None);

        assert_eq!(h.npc.state(), PursuitState::Search);
    }

    #[test]
    fn test_search_countdown_returns_to_patrol() {
        let mut h = Harness::new(NpcConfig {
            search_duration: 3.0,
            ..Default::default()
        });
        h.tick(Some(IN_VIEW));
        h.tick_with(1.0, None, &EmptySpace);
        assert_eq!(h.npc.state(), PursuitState::Search);

        h.tick_with(1.0, None, &EmptySpace);
        h.tick_with(1.0, None, &EmptySpace);
        assert_eq!(h.npc.state(), PursuitState::Search);

        h.tick_with(1.0, None, &EmptySpace);
        assert_eq!(h.npc.state(), PursuitState::Patrol);
        assert_eq!(h.npc.last_known_position(), None);
        assert_eq!(h.nav.last_destination(), Some(Vec3::new(0.0, 0.0, 20.0)));
        assert!((h.nav.speed - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_search_reaching_last_known_returns_to_patrol() {
        let mut h = Harness::new(NpcConfig::default());
        h.tick(Some(IN_VIEW));
        h.tick(None);
        assert_eq!(h.npc.state(), PursuitState::Search);

        h.nav.remaining = 0.2;
        h.tick(None);

        assert_eq!(h.npc.state(), PursuitState::Patrol);
        assert_eq!(h.npc.last_known_position(), None);
    }

    #[test]
    fn test_search_reacquires_target() {
        let mut h = Harness::new(NpcConfig::default());
        h.tick(Some(IN_VIEW));
        h.tick(None);
        h.tick(Some(IN_VIEW));

        assert_eq!(h.npc.state(), PursuitState::Chase);
        assert_eq!(
            h.state_changes(),
            vec![
                (PursuitState::Patrol, PursuitState::Chase),
                (PursuitState::Chase, PursuitState::Search),
                (PursuitState::Search, PursuitState::Chase),
            ]
        );
    }

    #[test]
    fn test_forced_search_without_last_known_patrols() {
        let mut h = Harness::new(NpcConfig::default());
        h.npc.force_state(PursuitState::Search, None);
        h.tick(None);

        assert_eq!(h.npc.state(), PursuitState::Patrol);
    }

    #[test]
    fn test_attack_range_halts() {
        let mut h = Harness::new(NpcConfig::default());
        h.tick(Some(IN_VIEW));
        assert!(!h.nav.stopped);

        h.tick(Some(Vec3::new(0.0, 0.0, -1.5)));
        assert_eq!(h.npc.state(), PursuitState::Chase);
        assert!(h.nav.stopped);

        h.tick(Some(IN_VIEW));
        assert!(!h.nav.stopped);
    }

    #[test]
    fn test_waypoints_advance_on_arrival() {
        let mut h = Harness::new(NpcConfig::default());
        h.tick(None);
        h.nav.remaining = 0.1;
        h.tick(None);
        h.tick(None);

        assert_eq!(h.npc.waypoint_index(), 2);
        assert_eq!(h.nav.last_destination(), Some(Vec3::new(20.0, 0.0, 0.0)));
    }

    #[test]
    fn test_pending_path_is_not_arrival() {
        let mut h = Harness::new(NpcConfig::default());
        h.nav.pending = true;
        h.nav.remaining = 0.0;
        h.tick(None);
        h.tick(None);

        assert_eq!(h.npc.waypoint_index(), 0);
    }

    #[test]
    fn test_dwell_waits_then_advances() {
        let mut h = Harness::new(NpcConfig {
            dwell_time: 0.25,
            ..Default::default()
        });
        h.tick(None);
        h.nav.remaining = 0.0;
        h.tick(None);

        assert!(h.npc.is_dwelling());
        assert!(h.nav.stopped);
        assert_eq!(h.npc.waypoint_index(), 0);

        for _ in 0..3 {
            h.tick(None);
        }
        assert!(!h.npc.is_dwelling());
        assert!(!h.nav.stopped);
        assert_eq!(h.npc.waypoint_index(), 1);
    }

    #[test]
    fn test_sighting_cancels_dwell() {
        let mut h = Harness::new(NpcConfig {
            dwell_time: 5.0,
            ..Default::default()
        });
        h.tick(None);
        h.nav.remaining = 0.0;
        h.tick(None);
        assert!(h.npc.is_dwelling());

        h.tick(Some(IN_VIEW));
        assert!(!h.npc.is_dwelling());
        assert!(!h.nav.stopped);
        assert_eq!(h.npc.state(), PursuitState::Chase);
    }

    #[test]
    fn test_blocked_retry_once_per_cooldown() {
        let mut h = Harness::new(NpcConfig {
            path_retry_cooldown: 1.0,
            ..Default::default()
        });
        h.tick(None);
        h.nav.status = PathStatus::Partial;
        let before = h.nav.destinations.len();

        // Within a second of the first request
        h.now = 0.5;
        for _ in 0..20 {
            assert!(!h.recover());
        }

        h.now = 1.2;
        assert!(h.recover());
        for _ in 0..20 {
            assert!(!h.recover());
        }
        h.now = 2.0;
        assert!(!h.recover());

        h.now = 2.3;
        assert!(h.recover());

        assert_eq!(h.nav.destinations.len(), before + 2);
        assert_eq!(h.nav.last_destination(), Some(Vec3::new(0.0, 0.0, 20.0)));
    }

    #[test]
    fn test_blocked_retry_in_chase_prefers_last_known() {
        let mut h = Harness::new(NpcConfig {
            chase_repath_interval: 100.0,
            ..Default::default()
        });
        h.tick(Some(IN_VIEW));
        h.nav.status = PathStatus::Invalid;
        h.now = 5.0;

        assert!(h.recover());
        assert_eq!(h.nav.last_destination(), Some(IN_VIEW));
    }

    #[test]
    fn test_no_retry_while_path_pending() {
        let mut h = Harness::new(NpcConfig::default());
        h.tick(None);
        h.nav.status = PathStatus::Partial;
        h.nav.pending = true;
        h.now = 10.0;

        assert!(!h.recover());
        h.nav.pending = false;
        assert!(h.recover());
    }

    #[test]
    fn test_off_mesh_requests_are_skipped() {
        let mut h = Harness::new(NpcConfig::default());
        h.nav.off_mesh = true;
        h.tick(Some(IN_VIEW));

        assert_eq!(h.npc.state(), PursuitState::Chase);
        assert!(h.nav.destinations.is_empty());
    }

    #[test]
    fn test_link_crossing_owns_the_tick() {
        let mut h = Harness::new(NpcConfig {
            link_speed: 10.0,
            ..Default::default()
        });
        let link = LinkData::new(Vec3::ZERO, Vec3::new(0.0, 2.0, -2.0));
        h.nav.link = Some(link);

        h.tick(Some(IN_VIEW));
        assert_eq!(h.npc.state(), PursuitState::Patrol);
        assert!(h.npc.is_moving());

        for _ in 0..3 {
            h.tick(None);
        }
        assert_eq!(h.transform.position, link.end);
        assert_eq!(h.nav.link_completions, 1);
        assert!(h.nav.update_position);
    }

    #[test]
    fn test_demo_guard_patrols_on_sandbox() {
        let scene = Scene::demo();
        let spawn = &scene.npcs[0];
        let links = scene.levels.links.iter().map(|&link| LinkData::from(link)).collect();
        let mesh = Arc::new(NavMesh::new(scene.surfaces.clone(), links));

        let mut npc = Npc::new(spawn.config, spawn.waypoints.clone().into(), scene.seed);
        let mut nav = SandboxAgent::new(mesh, spawn.config.movement(spawn.config.patrol_speed), spawn.position);
        let mut transform = Transform::from_position(spawn.position);
        let mut events = EventQueue::new();
        let entity = hecs::World::new().spawn(());
        let dt = 1.0 / 60.0;
        let mut walking_ticks = 0;

        // 30 s covers three 16 unit legs at patrol speed plus the waits
        for _ in 0..1800 {
            let mut ctx = AgentContext::new(entity, dt, 0.0, &EmptySpace, &mut events);
            npc.tick(&mut transform, &mut nav, &mut ctx);
            nav.advance(&mut transform, dt);

            if npc.is_moving() {
                walking_ticks += 1;
                assert!(!npc.is_dwelling());
            }
        }

        let reached: Vec<usize> = events
            .pending()
            .filter_map(|event| match event {
                AgentEvent::WaypointReached { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert!(reached.len() >= 3, "reached {reached:?}");
        assert_eq!(&reached[..3], &[0, 1, 2]);
        assert!(walking_ticks > 600);
        assert_eq!(npc.state(), PursuitState::Patrol);
        assert!(transform.position.y.abs() < 1e-4);
    }
}
