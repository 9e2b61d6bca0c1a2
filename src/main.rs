//! Headless pursuit demo
//!
//! Loads a scene (or the built-in tower), moves the player from its input
//! script and lets guards and followers pursue it. Agent events are logged;
//! run with `RUST_LOG=info` or `RUST_LOG=pursuit=debug` to see them.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use pursuit::prelude::*;

/// Height above the player's feet that agents look and path at
const AIM_HEIGHT: f32 = 1.0;

/// Player capsule size
const PLAYER_HALF_HEIGHT: f32 = 0.5;
const PLAYER_RADIUS: f32 = 0.4;

/// Command line options
#[derive(Debug, Parser)]
#[command(version, about = "Run a headless pursuit scene")]
struct Args {
    /// Scene file (.ron or .json); the built-in tower when omitted
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 1800)]
    ticks: u64,

    /// Simulation ticks per second
    #[arg(long, default_value_t = 60)]
    tick_rate: u32,

    /// Override the scene's random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write the scene as RON to this path and exit
    #[arg(long)]
    export: Option<PathBuf>,
}

/// The scripted player
struct Player {
    controller: PlayerController,
    script: InputScript,
    body: BodyId,
}

/// Demo game wiring the scene into the world
struct PursuitDemo {
    scene: Scene,
    physics: Physics,
}

impl PursuitDemo {
    fn new(scene: Scene) -> Self {
        Self {
            scene,
            physics: Physics::new(),
        }
    }

    /// Move the player and return the target snapshot for this tick
    fn update_player(&mut self, world: &mut World, dt: f32, now: f64) -> Option<Target> {
        let mut target = None;
        for (_, (transform, player, locomotion)) in
            world.query_mut::<(&mut Transform, &mut Player, &mut Locomotion)>()
        {
            let (input, camera_yaw) = player.script.sample(now);
            locomotion.moving =
                player
                    .controller
                    .update(transform, input, camera_yaw, &self.physics, dt);
            self.physics
                .set_kinematic_position(player.body, transform.position);
            target = Some(
                Target::at(transform.position + Vec3::Y * AIM_HEIGHT).with_body(player.body),
            );
        }
        target
    }
}

impl Game for PursuitDemo {
    fn init(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        log::info!("Initializing scene '{}'", self.scene.name);

        for wall in &self.scene.walls {
            self.physics
                .add_static_box(wall.center, wall.half_extents, layers::ENVIRONMENT);
        }

        let links = self
            .scene
            .levels
            .links
            .iter()
            .map(|&link| LinkData::from(link))
            .collect();
        let mesh = Arc::new(NavMesh::new(self.scene.surfaces.clone(), links));
        let levels = Arc::new(self.scene.levels.clone());

        let spawn = &self.scene.player;
        let body = self.physics.add_actor(
            spawn.position,
            PLAYER_HALF_HEIGHT,
            PLAYER_RADIUS,
            layers::ACTORS,
        );
        ctx.world.spawn_agent(
            "Player",
            Transform::from_position(spawn.position),
            (Player {
                controller: PlayerController::new(spawn.config),
                script: spawn.script.clone(),
                body,
            },),
        );

        for (index, spawn) in self.scene.npcs.iter().enumerate() {
            let config = spawn.config;
            let npc = Npc::new(
                config,
                spawn.waypoints.clone().into(),
                self.scene.seed.wrapping_add(index as u64),
            );
            let nav = SandboxAgent::new(
                Arc::clone(&mesh),
                config.movement(config.patrol_speed),
                spawn.position,
            );
            ctx.world.spawn_agent(
                spawn.name.clone(),
                Transform::from_position_yaw(spawn.position, spawn.yaw),
                (npc, nav),
            );
        }

        for spawn in &self.scene.followers {
            let follower = Follower::new(spawn.config, Arc::clone(&levels));
            let nav = SandboxAgent::new(Arc::clone(&mesh), spawn.config.movement, spawn.position);
            ctx.world.spawn_agent(
                spawn.name.clone(),
                Transform::from_position(spawn.position),
                (follower, nav),
            );
        }

        // Build the query pipeline so the first tick can cast rays
        self.physics.sync();

        log::info!(
            "Spawned {} agents, {} colliders",
            self.scene.agent_count(),
            self.physics.body_count()
        );
        Ok(())
    }

    fn update(&mut self, ctx: &mut EngineContext) {
        let dt = ctx.time.delta_seconds();
        let now = ctx.time.elapsed_seconds();

        for event in ctx.events.drain() {
            log::info!(
                "[{now:6.2}s] {}: {event:?}",
                ctx.world.display_name(event.agent())
            );
        }

        let target = self.update_player(&mut ctx.world, dt, now);
        self.physics.sync();

        let obstructions: &dyn ObstructionQuery = &self.physics;

        for (entity, (transform, npc, nav, locomotion)) in ctx
            .world
            .query_mut::<(&mut Transform, &mut Npc, &mut SandboxAgent, &mut Locomotion)>()
        {
            let mut agent = AgentContext::new(entity, dt, now, obstructions, &mut ctx.events)
                .with_target(target);
            npc.tick(transform, nav, &mut agent);
            nav.advance(transform, dt);
            locomotion.moving = npc.is_moving();
        }

        for (entity, (transform, follower, nav, locomotion)) in ctx
            .world
            .query_mut::<(&mut Transform, &mut Follower, &mut SandboxAgent, &mut Locomotion)>()
        {
            let mut agent = AgentContext::new(entity, dt, now, obstructions, &mut ctx.events)
                .with_target(target);
            follower.tick(transform, nav, &mut agent);
            nav.advance(transform, dt);
            locomotion.moving = follower.is_moving();
        }
    }

    fn shutdown(&mut self, ctx: &mut EngineContext) {
        for (_, (name, npc, transform)) in ctx.world.query_mut::<(&Name, &Npc, &Transform)>() {
            log::info!(
                "{name}: {} at {:.2}, last known {:?}",
                npc.state(),
                transform.position,
                npc.last_known_position()
            );
        }
        for (_, (name, follower, transform)) in
            ctx.world.query_mut::<(&Name, &Follower, &Transform)>()
        {
            log::info!(
                "{name}: at {:.2}, moving {}",
                transform.position,
                follower.is_moving()
            );
        }
    }
}

fn load_scene(args: &Args) -> Result<Scene, SceneError> {
    let mut scene = match &args.scene {
        Some(path) => Scene::load(path)?,
        None => {
            let scene = Scene::demo();
            scene.validate()?;
            scene
        }
    };
    if let Some(seed) = args.seed {
        scene.seed = seed;
    }
    Ok(scene)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let scene = match load_scene(&args) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Scene error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.export {
        if let Err(e) = scene.save_ron(path) {
            eprintln!("Scene error: {e}");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    let config = EngineConfig::default()
        .with_title(format!("Pursuit: {}", scene.name))
        .with_tick_rate(args.tick_rate)
        .with_max_ticks(args.ticks);

    let engine = Engine::new(config, PursuitDemo::new(scene));
    if let Err(e) = engine.run() {
        eprintln!("Engine error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
