use crate::config::Config;
use crate::engine::EngineOverride;
use crate::host::{Clock, Host, InputSource, PhoneSurface, SceneSource, World};
use crate::keys::Key;
use crate::repair::RepairPipeline;
use serde_json::{json, Value};
use tracing::trace;

/// A state machine ticked once per host frame.
pub trait FrameController<H: ?Sized> {
    fn name(&self) -> &'static str;

    fn on_frame(&mut self, host: &mut H, now: u64);

    fn on_key_up(&mut self, _host: &mut H, _key: Key, _now: u64) {}

    /// Current state and counters, for status output.
    fn snapshot(&self) -> Value;
}

impl<H> FrameController<H> for RepairPipeline
where
    H: InputSource + SceneSource + PhoneSurface + ?Sized,
{
    fn name(&self) -> &'static str {
        "phone-repair"
    }

    fn on_frame(&mut self, host: &mut H, now: u64) {
        RepairPipeline::on_frame(self, host, now);
    }

    fn snapshot(&self) -> Value {
        json!({
            "state": self.state(),
            "next_periodic_at": self.schedule().next_fire_at,
            "stats": self.stats(),
        })
    }
}

impl<H> FrameController<H> for EngineOverride
where
    H: InputSource + World + ?Sized,
{
    fn name(&self) -> &'static str {
        "engine-override"
    }

    fn on_frame(&mut self, host: &mut H, now: u64) {
        EngineOverride::on_frame(self, host, now);
    }

    fn on_key_up(&mut self, host: &mut H, key: Key, now: u64) {
        EngineOverride::on_key_up(self, host, key, now);
    }

    fn snapshot(&self) -> Value {
        json!({
            "state": self.state(),
            "target": self.target(),
            "block_restart_until": self.block_restart_until(),
            "stats": self.stats(),
        })
    }
}

/// Forwards host frames and key events to every registered controller, in
/// registration order.
pub struct FrameDriver<H: ?Sized> {
    controllers: Vec<Box<dyn FrameController<H>>>,
    frame_count: u64,
}

impl<H: Clock + ?Sized> FrameDriver<H> {
    pub fn new() -> Self {
        Self {
            controllers: Vec::new(),
            frame_count: 0,
        }
    }

    pub fn register(&mut self, controller: Box<dyn FrameController<H>>) {
        self.controllers.push(controller);
    }

    pub fn tick(&mut self, host: &mut H) {
        let now = host.now_ms();
        for controller in &mut self.controllers {
            controller.on_frame(host, now);
        }
        self.frame_count += 1;
        trace!(frame = self.frame_count, now, "frame");
    }

    pub fn key_up(&mut self, host: &mut H, key: Key) {
        let now = host.now_ms();
        for controller in &mut self.controllers {
            controller.on_key_up(host, key, now);
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn controller_names(&self) -> Vec<&'static str> {
        self.controllers.iter().map(|c| c.name()).collect()
    }

    pub fn snapshot(&self) -> Value {
        let mut map = serde_json::Map::new();
        for controller in &self.controllers {
            map.insert(controller.name().to_string(), controller.snapshot());
        }
        Value::Object(map)
    }
}

impl<H: Host + ?Sized> FrameDriver<H> {
    /// Driver with both controllers registered, timers starting at `start_ms`.
    pub fn from_config(config: &Config, start_ms: u64) -> Self {
        let mut driver = Self::new();
        driver.register(Box::new(RepairPipeline::new(&config.repair, start_ms)));
        driver.register(Box::new(EngineOverride::new(&config.engine)));
        driver
    }
}

impl<H: Clock + ?Sized> Default for FrameDriver<H> {
    fn default() -> Self {
        Self::new()
    }
}
