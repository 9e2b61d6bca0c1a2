//! Core Engine struct and fixed-step simulation loop

use thiserror::Error;

use crate::core::Time;
use crate::core::events::EventQueue;
use crate::ecs::World;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name used in logs
    pub title: String,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Stop after this many ticks (`None` runs until the game quits)
    pub max_ticks: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: String::from("Pursuit"),
            tick_rate: 60,
            max_ticks: None,
        }
    }
}

impl EngineConfig {
    /// Create a new config with a title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the tick rate
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Stop after `ticks` ticks
    #[must_use]
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }
}

/// Errors that stop the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// A tick rate of zero cannot drive a fixed step
    #[error("tick rate must be positive")]
    ZeroTickRate,
    /// Game setup failed
    #[error("game initialization failed: {0}")]
    Init(String),
}

/// Game trait that users implement
pub trait Game: 'static {
    /// Called once before the first tick
    ///
    /// # Errors
    ///
    /// Returning an error aborts the run before any tick.
    fn init(&mut self, engine: &mut EngineContext) -> Result<(), EngineError>;

    /// Called every tick for game logic updates
    fn update(&mut self, engine: &mut EngineContext);

    /// Called when the run ends
    fn shutdown(&mut self, _engine: &mut EngineContext) {}
}

/// Context passed to game callbacks
pub struct EngineContext {
    /// Simulation clock
    pub time: Time,
    /// ECS world
    pub world: World,
    /// Agent events; the engine swaps buffers before each update
    pub events: EventQueue,
    /// Should the engine quit
    should_quit: bool,
}

impl EngineContext {
    fn new(tick_rate: u32) -> Self {
        Self {
            time: Time::new(tick_rate),
            world: World::new(),
            events: EventQueue::new(),
            should_quit: false,
        }
    }

    /// Request engine shutdown after the current tick
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Check if engine should quit
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

/// Main engine struct
pub struct Engine<G: Game> {
    config: EngineConfig,
    game: G,
    context: EngineContext,
    initialized: bool,
}

impl<G: Game> Engine<G> {
    /// Create a new engine with the given game
    pub fn new(config: EngineConfig, game: G) -> Self {
        let context = EngineContext::new(config.tick_rate);
        Self {
            config,
            game,
            context,
            initialized: false,
        }
    }

    /// Initialize logging and run until the game quits or the tick limit
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid config or a failed game init.
    pub fn run(mut self) -> Result<(), EngineError> {
        env_logger::init();
        log::info!("Starting engine: {}", self.config.title);

        self.initialize()?;
        while !self.finished() {
            self.tick();
        }

        log::info!(
            "Stopping after {} ticks ({:.2}s simulated)",
            self.context.time.ticks(),
            self.context.time.elapsed_seconds()
        );
        self.game.shutdown(&mut self.context);
        Ok(())
    }

    /// Run game init once
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid config or a failed game init.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        if self.initialized {
            return Ok(());
        }
        if self.config.tick_rate == 0 {
            return Err(EngineError::ZeroTickRate);
        }

        self.game.init(&mut self.context)?;
        self.initialized = true;
        log::info!("Engine initialized successfully");
        Ok(())
    }

    /// Advance the simulation by one fixed tick
    pub fn tick(&mut self) {
        self.context.events.swap();
        self.game.update(&mut self.context);
        self.context.time.advance();
    }

    /// The game asked to quit or the tick limit was reached
    #[must_use]
    pub fn finished(&self) -> bool {
        self.context.should_quit()
            || self
                .config
                .max_ticks
                .is_some_and(|max| self.context.time.ticks() >= max)
    }

    /// Engine context
    #[must_use]
    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    /// The running game
    #[must_use]
    pub fn game(&self) -> &G {
        &self.game
    }
}
