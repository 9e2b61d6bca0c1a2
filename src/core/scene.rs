//! Scene description, serialization and validation
//!
//! A scene lists everything a pursuit run needs: level anchors and links,
//! walkable surfaces, sight-blocking walls, the player, and the NPC and
//! follower spawns. Scenes load from RON or JSON.

use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{FollowerConfig, LevelAnchors, LevelMap, NavLink, NpcConfig};
use crate::navigation::NavSurface;
use crate::player::{InputScript, InputStep, PlayerConfig};

/// Errors that can occur during scene operations
#[derive(Debug, Error)]
pub enum SceneError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// RON output failed
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),
    /// RON input failed to parse
    #[error("RON deserialization error: {0}")]
    RonDeserialize(#[from] ron::error::SpannedError),
    /// JSON input or output failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// File extension is neither `ron` nor `json`
    #[error("unsupported scene format: {0:?}")]
    UnsupportedFormat(String),
    /// A tuning value or position is out of range
    #[error("{owner}: {field} must be finite and non-negative, got {value}")]
    InvalidValue {
        /// Spawn the value belongs to
        owner: String,
        /// Field name
        field: &'static str,
        /// Offending value
        value: f32,
    },
    /// Both ends of a link sit on the same level
    #[error("link {index} starts and ends on level {level}")]
    DegenerateLink {
        /// Index into the link list
        index: usize,
        /// Level of both endpoints
        level: usize,
    },
}

/// A static box that blocks sight and supports the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallDef {
    /// Box center
    pub center: Vec3,
    /// Half size on each axis
    pub half_extents: Vec3,
}

/// Where the player starts and how it moves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSpawn {
    /// Feet position
    pub position: Vec3,
    /// Movement tuning
    pub config: PlayerConfig,
    /// Looping scripted input
    pub script: InputScript,
}

impl Default for PlayerSpawn {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            config: PlayerConfig::default(),
            script: InputScript::default(),
        }
    }
}

/// An NPC with its patrol route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcSpawn {
    /// Entity name
    pub name: String,
    /// Feet position
    pub position: Vec3,
    /// Initial heading in radians, zero faces -Z
    #[serde(default)]
    pub yaw: f32,
    /// Patrol waypoints; empty means standing guard
    #[serde(default)]
    pub waypoints: Vec<Vec3>,
    /// Tuning
    #[serde(default)]
    pub config: NpcConfig,
}

/// A follower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowerSpawn {
    /// Entity name
    pub name: String,
    /// Feet position
    pub position: Vec3,
    /// Tuning
    #[serde(default)]
    pub config: FollowerConfig,
}

/// A serializable pursuit scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Scene name
    pub name: String,
    /// Scene version for compatibility
    pub version: u32,
    /// Base seed for per-NPC random streams
    pub seed: u64,
    /// Level anchors and links
    pub levels: LevelMap,
    /// Walkable surfaces for the sandbox navigation service
    pub surfaces: Vec<NavSurface>,
    /// Level geometry
    pub walls: Vec<WallDef>,
    /// The pursued player
    pub player: PlayerSpawn,
    /// Patrolling NPCs
    pub npcs: Vec<NpcSpawn>,
    /// Followers
    pub followers: Vec<FollowerSpawn>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl Scene {
    /// Create a new empty scene
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            seed: 0,
            levels: LevelMap::default(),
            surfaces: Vec::new(),
            walls: Vec::new(),
            player: PlayerSpawn::default(),
            npcs: Vec::new(),
            followers: Vec::new(),
        }
    }

    /// Number of AI agents
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.npcs.len() + self.followers.len()
    }

    /// Check tuning values and links
    ///
    /// # Errors
    ///
    /// Returns the first negative or non-finite value, or the first link whose
    /// endpoints classify to the same level.
    pub fn validate(&self) -> Result<(), SceneError> {
        for npc in &self.npcs {
            let c = &npc.config;
            let p = &c.perception;
            check_all(
                &npc.name,
                &[
                    ("patrol_speed", c.patrol_speed),
                    ("chase_speed", c.chase_speed),
                    ("acceleration", c.acceleration),
                    ("angular_speed", c.angular_speed),
                    ("detection_radius", p.detection_radius),
                    ("fov_degrees", p.fov_degrees),
                    ("eye_height", p.eye_height),
                    ("attack_range", c.attack_range),
                    ("stop_tolerance", c.stop_tolerance),
                    ("dwell_time", c.dwell_time),
                    ("chase_repath_interval", c.chase_repath_interval),
                    ("search_duration", c.search_duration),
                    ("lose_sight_grace", c.lose_sight_grace),
                    ("path_retry_cooldown", c.path_retry_cooldown),
                    ("link_speed", c.link_speed),
                    ("link_arc_height", c.link_arc_height),
                ],
            )?;
            check_point(&npc.name, "position", npc.position)?;
            for waypoint in &npc.waypoints {
                check_point(&npc.name, "waypoint", *waypoint)?;
            }
        }

        for follower in &self.followers {
            let c = &follower.config;
            check_all(
                &follower.name,
                &[
                    ("speed", c.movement.speed),
                    ("acceleration", c.movement.acceleration),
                    ("angular_speed", c.movement.angular_speed),
                    ("repath_interval", c.repath_interval),
                    ("stop_distance", c.stop_distance),
                    ("link_speed", c.link_speed),
                    ("link_arc_height", c.link_arc_height),
                    ("tolerances.link", c.tolerances.link),
                    ("tolerances.target", c.tolerances.target),
                    ("tolerances.climb", c.tolerances.climb),
                ],
            )?;
            check_point(&follower.name, "position", follower.position)?;
        }

        check_all(
            "player",
            &[
                ("move_speed", self.player.config.move_speed),
                ("jump_height", self.player.config.jump_height),
                ("ground_snap", self.player.config.ground_snap),
            ],
        )?;

        for (index, link) in self.levels.links.iter().enumerate() {
            let (a, b) = link.levels(&self.levels.anchors);
            if a == b {
                return Err(SceneError::DegenerateLink { index, level: a });
            }
        }

        Ok(())
    }

    /// Parse a RON scene
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid scene
    pub fn from_ron_str(text: &str) -> Result<Self, SceneError> {
        Ok(ron::from_str(text)?)
    }

    /// Render as pretty RON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_ron_string(&self) -> Result<String, SceneError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Save the scene to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Load a scene from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Save the scene to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load a scene from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load by file extension and validate
    ///
    /// # Errors
    ///
    /// Returns an error for unknown extensions, unreadable files, or scenes
    /// that fail [`Scene::validate`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let scene = match extension.as_str() {
            "ron" => Self::load_ron(path)?,
            "json" => Self::load_json(path)?,
            other => return Err(SceneError::UnsupportedFormat(other.to_string())),
        };
        scene.validate()?;
        log::info!(
            "Loaded scene '{}' from {}: {} agents, {} links",
            scene.name,
            path.display(),
            scene.agent_count(),
            scene.levels.links.len()
        );
        Ok(scene)
    }

    /// Built-in two-level tower.
    ///
    /// A walled courtyard on level 0 and a balcony on level 1 reached by a
    /// ladder link. The player paces the balcony; one guard patrols the
    /// courtyard and one follower has to climb the ladder to keep up.
    #[must_use]
    pub fn demo() -> Self {
        let ground = 0.0;
        let balcony = 4.0;

        let mut scene = Self::new("Tower");
        scene.seed = 42;
        scene.levels = LevelMap::new(
            LevelAnchors::new(vec![ground, balcony]),
            vec![NavLink::new(
                Vec3::new(12.0, ground, 0.0),
                Vec3::new(16.0, balcony, 0.0),
            )],
        );
        scene.surfaces = vec![
            NavSurface::new(Vec2::new(-12.0, -12.0), Vec2::new(12.0, 12.0), ground),
            NavSurface::new(Vec2::new(16.0, -5.0), Vec2::new(24.0, 5.0), balcony),
        ];
        scene.walls = vec![
            // Courtyard floor and balcony slab
            WallDef {
                center: Vec3::new(0.0, ground - 0.5, 0.0),
                half_extents: Vec3::new(12.0, 0.5, 12.0),
            },
            WallDef {
                center: Vec3::new(20.0, balcony - 0.5, 0.0),
                half_extents: Vec3::new(4.0, 0.5, 5.0),
            },
            // Sight blocker in the courtyard
            WallDef {
                center: Vec3::new(0.0, 1.5, -4.0),
                half_extents: Vec3::new(3.0, 1.5, 0.5),
            },
        ];
        scene.player = PlayerSpawn {
            position: Vec3::new(20.0, balcony, 0.0),
            config: PlayerConfig::default(),
            script: InputScript::new(vec![
                InputStep::walk(1.0, Vec2::new(0.0, 0.6)),
                InputStep::walk(1.0, Vec2::new(0.0, -0.6)),
                InputStep::walk(0.5, Vec2::ZERO),
                InputStep::jump(0.1),
                InputStep::walk(1.4, Vec2::ZERO),
            ]),
        };
        scene.npcs = vec![NpcSpawn {
            name: "Guard".to_string(),
            position: Vec3::new(-8.0, ground, 8.0),
            yaw: 0.0,
            waypoints: vec![
                Vec3::new(-8.0, ground, 8.0),
                Vec3::new(8.0, ground, 8.0),
                Vec3::new(8.0, ground, -8.0),
                Vec3::new(-8.0, ground, -8.0),
            ],
            config: NpcConfig {
                dwell_time: 1.0,
                ..Default::default()
            },
        }];
        scene.followers = vec![FollowerSpawn {
            name: "Hound".to_string(),
            position: Vec3::new(-4.0, ground, 0.0),
            config: FollowerConfig::default(),
        }];
        scene
    }
}

fn check_all(owner: &str, values: &[(&'static str, f32)]) -> Result<(), SceneError> {
    for &(field, value) in values {
        if !value.is_finite() || value < 0.0 {
            return Err(SceneError::InvalidValue {
                owner: owner.to_string(),
                field,
                value,
            });
        }
    }
    Ok(())
}

fn check_point(owner: &str, field: &'static str, point: Vec3) -> Result<(), SceneError> {
    match [point.x, point.y, point.z].into_iter().find(|v| !v.is_finite()) {
        Some(value) => Err(SceneError::InvalidValue {
            owner: owner.to_string(),
            field,
            value,
        }),
        None => Ok(()),
    }
}
