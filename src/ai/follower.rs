//! Follower controller
//!
//! Follows the target across levels. On a fixed cadence it asks the router
//! for the next point, stops short of the target, and hands control to a
//! link traversal whenever the navigation service parks it on a link.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::context::{AgentContext, nav_is_moving};
use super::levels::{LevelMap, horizontal_distance};
use super::routing::{Router, SnapTolerances};
use super::task::Cadence;
use super::traversal::{LinkTraversal, TraversalStatus};
use crate::core::events::AgentEvent;
use crate::ecs::Transform;
use crate::navigation::{MovementProfile, NavAgent, request_path};

/// Follower tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Movement handed to the navigation service
    pub movement: MovementProfile,
    /// Seconds between route updates
    pub repath_interval: f32,
    /// Horizontal distance to the route point at which the follower halts
    pub stop_distance: f32,
    /// Link crossing speed
    pub link_speed: f32,
    /// Peak height of the link crossing arc
    pub link_arc_height: f32,
    /// Route point snap radii
    pub tolerances: SnapTolerances,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            movement: MovementProfile::default(),
            repath_interval: 0.25,
            stop_distance: 1.5,
            link_speed: 4.0,
            link_arc_height: 1.0,
            tolerances: SnapTolerances::default(),
        }
    }
}

/// Per-agent follower state
#[derive(Debug, Clone)]
pub struct Follower {
    config: FollowerConfig,
    router: Router,
    cadence: Cadence,
    traversal: LinkTraversal,
    moving: bool,
    configured: bool,
}

impl Follower {
    /// Create a follower routing over `map`
    #[must_use]
    pub fn new(config: FollowerConfig, map: Arc<LevelMap>) -> Self {
        Self {
            router: Router::new(map).with_tolerances(config.tolerances),
            cadence: Cadence::new(config.repath_interval),
            traversal: LinkTraversal::new(),
            moving: false,
            configured: false,
            config,
        }
    }

    /// Tuning
    #[must_use]
    pub fn config(&self) -> &FollowerConfig {
        &self.config
    }

    /// The animation flag from the last tick
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// A link crossing is running
    #[must_use]
    pub fn is_traversing(&self) -> bool {
        self.traversal.is_active()
    }

    /// Run one tick
    pub fn tick<N: NavAgent + ?Sized>(
        &mut self,
        transform: &mut Transform,
        nav: &mut N,
        ctx: &mut AgentContext<'_>,
    ) {
        if !self.configured {
            nav.apply_profile(&self.config.movement);
            self.configured = true;
        }

        if !self.traversal.is_active()
            && nav.is_on_link()
            && let Some(link) = nav.current_link()
            && self.traversal.begin(link, self.config.link_speed, self.config.link_arc_height, nav)
        {
            ctx.events.push(AgentEvent::LinkTraversalStarted {
                agent: ctx.entity,
                start: link.start,
                end: link.end,
            });
        }

        if self.traversal.is_active() {
            if self.traversal.advance(ctx.dt, transform, nav) == TraversalStatus::Completed {
                ctx.events.push(AgentEvent::LinkTraversalCompleted {
                    agent: ctx.entity,
                    position: transform.position,
                });
            }
            self.moving = true;
            return;
        }

        let Some(target) = ctx.target else {
            self.moving = false;
            return;
        };

        if self.cadence.tick(ctx.dt) {
            let route = self.router.route(transform.position, target.position, nav);

            // Walk onto a link foot however close it is
            if !route.link_entry
                && horizontal_distance(transform.position, route.point) <= self.config.stop_distance
            {
                nav.set_stopped(true);
                nav.reset_path();
            } else {
                nav.set_stopped(false);
                request_path(nav, route.point);
            }
        }

        self.moving = nav_is_moving(nav);
    }
}
