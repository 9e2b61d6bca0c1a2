//! Height levels and the links between them
//!
//! A world is split into discrete levels by a set of anchor heights. Any
//! position belongs to the level whose anchor height is nearest. Links join
//! walkable regions on different levels and are looked up by level pair.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::navigation::LinkData;

// ============================================================================
// Level Anchors
// ============================================================================

/// Reference heights, one per level, sorted ascending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f32>", into = "Vec<f32>")]
pub struct LevelAnchors {
    heights: Vec<f32>,
}

impl LevelAnchors {
    /// Build from heights in any order
    #[must_use]
    pub fn new(mut heights: Vec<f32>) -> Self {
        heights.sort_by(f32::total_cmp);
        Self { heights }
    }

    /// Build from anchor points; only their heights matter
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Self {
        Self::new(points.iter().map(|p| p.y).collect())
    }

    /// Level index for a world position.
    ///
    /// The anchor with the closest height wins; on a tie the lower anchor
    /// wins. A world without anchors is a single level 0.
    #[must_use]
    pub fn level_of(&self, position: Vec3) -> usize {
        let mut best = 0;
        let mut best_distance = f32::INFINITY;
        for (index, height) in self.heights.iter().enumerate() {
            let distance = (position.y - height).abs();
            if distance < best_distance {
                best = index;
                best_distance = distance;
            }
        }
        best
    }

    /// Anchor height of a level
    #[must_use]
    pub fn height_of(&self, level: usize) -> Option<f32> {
        self.heights.get(level).copied()
    }

    /// Number of levels
    #[must_use]
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// No anchors configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Sorted anchor heights
    #[must_use]
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }
}

impl From<Vec<f32>> for LevelAnchors {
    fn from(heights: Vec<f32>) -> Self {
        Self::new(heights)
    }
}

impl From<LevelAnchors> for Vec<f32> {
    fn from(anchors: LevelAnchors) -> Self {
        anchors.heights
    }
}

// ============================================================================
// Links
// ============================================================================

/// A scene link between two levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavLink {
    /// First endpoint
    pub start: Vec3,
    /// Second endpoint
    pub end: Vec3,
}

impl NavLink {
    /// Create a link
    #[must_use]
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Levels of both endpoints
    #[must_use]
    pub fn levels(&self, anchors: &LevelAnchors) -> (usize, usize) {
        (anchors.level_of(self.start), anchors.level_of(self.end))
    }

    /// The endpoint lying on `level`, if either does
    #[must_use]
    pub fn endpoint_on(&self, level: usize, anchors: &LevelAnchors) -> Option<Vec3> {
        let (a, b) = self.levels(anchors);
        if a == level {
            Some(self.start)
        } else if b == level {
            Some(self.end)
        } else {
            None
        }
    }

    /// Connects `from` and `to`, in either direction
    #[must_use]
    pub fn connects(&self, from: usize, to: usize, anchors: &LevelAnchors) -> bool {
        let (a, b) = self.levels(anchors);
        (a == from && b == to) || (a == to && b == from)
    }
}

impl From<NavLink> for LinkData {
    fn from(link: NavLink) -> Self {
        LinkData::new(link.start, link.end)
    }
}

/// Level anchors and scene links, shared read-only by every agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelMap {
    /// Level anchor heights
    pub anchors: LevelAnchors,
    /// All scene links
    pub links: Vec<NavLink>,
}

impl LevelMap {
    /// Create a level map
    #[must_use]
    pub fn new(anchors: LevelAnchors, links: Vec<NavLink>) -> Self {
        Self { anchors, links }
    }

    /// Level index for a world position
    #[must_use]
    pub fn level_of(&self, position: Vec3) -> usize {
        self.anchors.level_of(position)
    }

    /// Link joining `from` and `to` whose `from` end is horizontally nearest
    /// the agent
    #[must_use]
    pub fn find_link(&self, from: usize, to: usize, agent_position: Vec3) -> Option<&NavLink> {
        self.links
            .iter()
            .filter(|link| link.connects(from, to, &self.anchors))
            .filter_map(|link| {
                let endpoint = link.endpoint_on(from, &self.anchors)?;
                Some((link, horizontal_distance(endpoint, agent_position)))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(link, _)| link)
    }
}

/// Distance on the XZ plane
#[must_use]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    (a.x - b.x).hypot(a.z - b.z)
}
