//! Engine on/off override for the player's current vehicle.
//!
//! The host keeps resetting the engine flag on its own schedule, so a toggle
//! installs an override that is re-asserted every frame. The override yields
//! to reality: it is dropped as soon as the player leaves or swaps the
//! vehicle, or the engine is restarted natively while forced off.

pub mod animation;

pub use animation::{AnimOutcome, PendingAnimation};

use crate::config::EngineConfig;
use crate::host::{InputSource, VehicleHandle, World};
use crate::keys::Key;
use heapless::Vec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Window after forcing the engine off in which re-assertion is suppressed.
pub const BLOCK_RESTART_MS: u64 = 500;

const MAX_CANCEL_HISTORY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverrideState {
    #[default]
    None,
    ForceOn,
    ForceOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    PlayerInvalid,
    LeftVehicle,
    VehicleInvalid,
    SwitchedVehicles,
    EngineStartedNatively,
    Disabled,
}

impl CancelReason {
    pub fn describe(self) -> &'static str {
        match self {
            CancelReason::PlayerInvalid => "player ped invalid",
            CancelReason::LeftVehicle => "player left vehicle",
            CancelReason::VehicleInvalid => "current vehicle invalid",
            CancelReason::SwitchedVehicles => "switched vehicles",
            CancelReason::EngineStartedNatively => "engine started natively",
            CancelReason::Disabled => "feature disabled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRecord {
    pub reason: CancelReason,
    pub state: OverrideState,
    pub vehicle: VehicleHandle,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct ActiveOverride {
    state: OverrideState,
    target: VehicleHandle,
    block_restart_until: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideStats {
    pub toggles: u32,
    pub reassertions: u32,
    pub cancellations: u32,
    pub animations_played: u32,
    pub animations_dropped: u32,
}

#[derive(Debug)]
pub struct EngineOverride {
    enabled: bool,
    animations_enabled: bool,
    toggle_key: Key,
    active: Option<ActiveOverride>,
    pending_anim: PendingAnimation,
    stats: OverrideStats,
    cancel_history: Vec<CancelRecord, MAX_CANCEL_HISTORY>,
}

impl EngineOverride {
    pub fn new(config: &EngineConfig) -> Self {
        info!(
            enabled = config.enabled,
            key = %config.toggle_key,
            animations = config.animations,
            "engine override loaded"
        );

        Self {
            enabled: config.enabled,
            animations_enabled: config.animations,
            toggle_key: config.toggle_key,
            active: None,
            pending_anim: PendingAnimation::default(),
            stats: OverrideStats::default(),
            cancel_history: Vec::new(),
        }
    }

    /// Per-frame entry point.
    pub fn on_frame<W: World + ?Sized>(&mut self, world: &mut W, now: u64) {
        if !self.enabled {
            if self.active.is_some() {
                self.clear_override(CancelReason::Disabled, now);
            }
            self.pending_anim.clear();
            return;
        }

        if self.animations_enabled {
            self.process_pending_animation(world, now);
        }

        self.enforce(world, now);
    }

    /// Key-release entry point; only the configured key does anything.
    pub fn on_key_up<H>(&mut self, host: &mut H, key: Key, now: u64)
    where
        H: InputSource + World + ?Sized,
    {
        if !self.enabled || key != self.toggle_key {
            return;
        }

        if is_blocked_by_ui(&*host) {
            debug!("toggle ignored, UI owns input");
            return;
        }

        self.on_toggle_requested(host, now);
    }

    /// Flips the engine of the player's current vehicle and starts enforcing
    /// the new state. No-op when the player is not in a vehicle.
    pub fn on_toggle_requested<W: World + ?Sized>(&mut self, world: &mut W, now: u64) {
        let Some(ped) = world.player_ped() else {
            return;
        };
        let Some(vehicle) = world.current_vehicle(ped) else {
            return;
        };

        let running = world.is_engine_running(vehicle);

        if self.animations_enabled {
            self.pending_anim.queue(world, ped, running, now);
        }

        let active = if running {
            ActiveOverride {
                state: OverrideState::ForceOff,
                target: vehicle,
                block_restart_until: now.saturating_add(BLOCK_RESTART_MS),
            }
        } else {
            ActiveOverride {
                state: OverrideState::ForceOn,
                target: vehicle,
                block_restart_until: 0,
            }
        };

        self.active = Some(active);
        self.stats.toggles += 1;
        apply(world, &active);

        info!(vehicle = vehicle.0, was_running = running, state = ?active.state, "engine toggled");
    }

    fn enforce<W: World + ?Sized>(&mut self, world: &mut W, now: u64) {
        let Some(active) = self.active else {
            return;
        };

        let Some(ped) = world.player_ped() else {
            self.clear_override(CancelReason::PlayerInvalid, now);
            return;
        };

        if !world.is_in_vehicle(ped) {
            self.clear_override(CancelReason::LeftVehicle, now);
            return;
        }

        let Some(current) = world.current_vehicle(ped) else {
            self.clear_override(CancelReason::VehicleInvalid, now);
            return;
        };

        if current != active.target {
            self.clear_override(CancelReason::SwitchedVehicles, now);
            return;
        }

        if active.state == OverrideState::ForceOff {
            if world.is_engine_running(current) {
                self.clear_override(CancelReason::EngineStartedNatively, now);
                return;
            }

            if now < active.block_restart_until {
                return;
            }
        }

        apply(world, &active);
        self.stats.reassertions += 1;
    }

    fn process_pending_animation<W: World + ?Sized>(&mut self, world: &mut W, now: u64) {
        match self.pending_anim.process(world, now) {
            Some(AnimOutcome::Played) => self.stats.animations_played += 1,
            Some(AnimOutcome::OwnerChanged | AnimOutcome::TimedOut) => self.stats.animations_dropped += 1,
            None => {}
        }
    }

    fn clear_override(&mut self, reason: CancelReason, now: u64) {
        let Some(active) = self.active.take() else {
            return;
        };

        info!(reason = reason.describe(), vehicle = active.target.0, "engine override cleared");

        if self.cancel_history.is_full() {
            self.cancel_history.remove(0);
        }
        let _ = self.cancel_history.push(CancelRecord {
            reason,
            state: active.state,
            vehicle: active.target,
            timestamp: now,
        });
        self.stats.cancellations += 1;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> OverrideState {
        self.active.map_or(OverrideState::None, |a| a.state)
    }

    pub fn target(&self) -> Option<VehicleHandle> {
        self.active.map(|a| a.target)
    }

    /// End of the forced-off grace window, 0 when none is armed.
    pub fn block_restart_until(&self) -> u64 {
        self.active.map_or(0, |a| a.block_restart_until)
    }

    pub fn pending_animation(&self) -> &PendingAnimation {
        &self.pending_anim
    }

    pub fn stats(&self) -> &OverrideStats {
        &self.stats
    }

    pub fn cancel_history(&self) -> &[CancelRecord] {
        &self.cancel_history
    }
}

fn apply<W: World + ?Sized>(world: &mut W, active: &ActiveOverride) {
    match active.state {
        OverrideState::ForceOn => world.set_engine_on(active.target, true),
        OverrideState::ForceOff => world.set_engine_on(active.target, false),
        OverrideState::None => {}
    }
}

fn is_blocked_by_ui<I: InputSource + ?Sized>(input: &I) -> bool {
    input.is_paused() || input.is_pause_menu_active() || input.keyboard_state().occupies_input()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{KeyboardState, PedHandle};
    use crate::sim::{HostCall, SimHost};

    fn seated_host(engine_running: bool) -> SimHost {
        let mut host = SimHost::new();
        host.set_player(Some(PedHandle(1)));
        host.set_vehicle(Some(VehicleHandle(100)));
        host.set_engine_running(VehicleHandle(100), engine_running);
        host
    }

    fn no_anim() -> EngineConfig {
        EngineConfig {
            animations: false,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_toggle_on_foot_is_noop() {
        let mut host = SimHost::new();
        host.set_player(Some(PedHandle(1)));
        let mut ctl = EngineOverride::new(&EngineConfig::default());
        ctl.on_toggle_requested(&mut host, 0);
        assert_eq!(ctl.state(), OverrideState::None);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_toggle_running_engine_forces_off() {
        let mut host = seated_host(true);
        let mut ctl = EngineOverride::new(&no_anim());
        ctl.on_toggle_requested(&mut host, 1000);

        assert_eq!(ctl.state(), OverrideState::ForceOff);
        assert_eq!(ctl.target(), Some(VehicleHandle(100)));
        assert_eq!(ctl.block_restart_until(), 1500);
        assert_eq!(host.calls(), &[HostCall::SetEngineOn(VehicleHandle(100), false)]);
    }

    #[test]
    fn test_force_on_reasserts_every_frame() {
        let mut host = seated_host(false);
        let mut ctl = EngineOverride::new(&no_anim());
        ctl.on_toggle_requested(&mut host, 0);
        assert_eq!(ctl.state(), OverrideState::ForceOn);
        assert_eq!(ctl.block_restart_until(), 0);

        for frame in 1..=5 {
            ctl.on_frame(&mut host, frame * 16);
        }
        assert_eq!(host.count(|c| *c == HostCall::SetEngineOn(VehicleHandle(100), true)), 6);
    }

    #[test]
    fn test_blocked_by_keyboard() {
        let mut host = seated_host(true);
        host.set_keyboard(KeyboardState::Editing);
        let mut ctl = EngineOverride::new(&no_anim());
        ctl.on_key_up(&mut host, Key::Letter('N'), 0);
        assert_eq!(ctl.state(), OverrideState::None);

        host.set_keyboard(KeyboardState::Cancelled);
        ctl.on_key_up(&mut host, Key::Letter('N'), 0);
        assert_eq!(ctl.state(), OverrideState::ForceOff);
    }

    #[test]
    fn test_other_key_ignored() {
        let mut host = seated_host(true);
        let mut ctl = EngineOverride::new(&no_anim());
        ctl.on_key_up(&mut host, Key::Letter('M'), 0);
        assert_eq!(ctl.state(), OverrideState::None);
    }

    #[test]
    fn test_grace_deadline_saturates() {
        let mut host = seated_host(true);
        let mut ctl = EngineOverride::new(&EngineConfig::default());
        ctl.on_toggle_requested(&mut host, u64::MAX - 10);
        assert_eq!(ctl.block_restart_until(), u64::MAX);
        assert_eq!(ctl.pending_animation().expire_at, u64::MAX);
    }

    #[test]
    fn test_disable_clears_override() {
        let mut host = seated_host(false);
        let mut ctl = EngineOverride::new(&EngineConfig::default());
        ctl.on_toggle_requested(&mut host, 0);
        assert!(ctl.pending_animation().active);

        assert!(ctl.is_enabled());
        ctl.set_enabled(false);
        assert!(!ctl.is_enabled());
        ctl.on_frame(&mut host, 16);
        assert_eq!(ctl.state(), OverrideState::None);
        assert!(!ctl.pending_animation().active);
        assert_eq!(ctl.cancel_history()[0].reason, CancelReason::Disabled);
    }
}
