//! Agent events
//!
//! Controllers report what happened to their agent (state changes, sightings,
//! link crossings) without knowing who listens. Events pushed during tick N
//! become readable after the host swaps the queue at the start of tick N+1.
//!
//! # Example
//!
//! ```ignore
//! // In an agent tick
//! ctx.events.push(AgentEvent::TargetSighted { agent, position });
//!
//! // In the host loop, next tick
//! events.swap();
//! for event in events.iter() {
//!     log::info!("{event:?}");
//! }
//! ```

use glam::Vec3;
use hecs::Entity;

use crate::ai::PursuitState;

// ============================================================================
// Event Types
// ============================================================================

/// Something that happened to an agent this tick.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AgentEvent {
    /// The pursuit state machine changed state.
    StateChanged {
        /// The agent
        agent: Entity,
        /// State left
        from: PursuitState,
        /// State entered
        to: PursuitState,
    },

    /// Line of sight to the target was acquired.
    TargetSighted {
        /// The observer
        agent: Entity,
        /// Where the target was seen
        position: Vec3,
    },

    /// Line of sight to the target was lost.
    TargetLost {
        /// The observer
        agent: Entity,
        /// Last place the target was seen, if any
        last_known: Option<Vec3>,
    },

    /// A patrol waypoint was reached.
    WaypointReached {
        /// The agent
        agent: Entity,
        /// Index into the waypoint set
        index: usize,
    },

    /// A blocked or invalid path was re-requested after the cooldown.
    PathRetried {
        /// The agent
        agent: Entity,
        /// Retry destination
        destination: Vec3,
    },

    /// The agent started crossing a navigation link.
    LinkTraversalStarted {
        /// The agent
        agent: Entity,
        /// Link start
        start: Vec3,
        /// Link end
        end: Vec3,
    },

    /// The agent finished crossing a navigation link.
    LinkTraversalCompleted {
        /// The agent
        agent: Entity,
        /// Where it landed
        position: Vec3,
    },
}

impl AgentEvent {
    /// The agent this event is about
    #[must_use]
    pub fn agent(&self) -> Entity {
        match self {
            Self::StateChanged { agent, .. }
            | Self::TargetSighted { agent, .. }
            | Self::TargetLost { agent, .. }
            | Self::WaypointReached { agent, .. }
            | Self::PathRetried { agent, .. }
            | Self::LinkTraversalStarted { agent, .. }
            | Self::LinkTraversalCompleted { agent, .. } => *agent,
        }
    }
}

// ============================================================================
// Event Queue
// ============================================================================

/// Two-slot event buffer.
///
/// Controllers write into the current tick's slot while the host reads the
/// previous tick's slot, so no reader ever sees a half-finished tick.
#[derive(Debug, Default)]
pub struct EventQueue {
    writing: Vec<AgentEvent>,
    readable: Vec<AgentEvent>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event for the current tick
    pub fn push(&mut self, event: AgentEvent) {
        self.writing.push(event);
    }

    /// Close the current tick: its events become readable and whatever was
    /// readable before is discarded.
    pub fn swap(&mut self) {
        self.readable.clear();
        std::mem::swap(&mut self.writing, &mut self.readable);
    }

    /// Events of the last closed tick
    pub fn iter(&self) -> std::slice::Iter<'_, AgentEvent> {
        self.readable.iter()
    }

    /// Take the events of the last closed tick
    pub fn drain(&mut self) -> std::vec::Drain<'_, AgentEvent> {
        self.readable.drain(..)
    }

    /// Events written so far in the current tick
    pub fn pending(&self) -> std::slice::Iter<'_, AgentEvent> {
        self.writing.iter()
    }

    /// Readable events concerning one agent
    pub fn for_agent(&self, agent: Entity) -> impl Iterator<Item = &AgentEvent> + '_ {
        self.readable.iter().filter(move |event| event.agent() == agent)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readable.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.readable.len()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.writing.len()
    }

    pub fn clear(&mut self) {
        self.writing.clear();
        self.readable.clear();
    }
}
