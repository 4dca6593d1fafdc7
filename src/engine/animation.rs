use crate::host::{AnimDict, AnimRequest, PedHandle, World};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const TOGGLE_ANIM_DICT: AnimDict = AnimDict::VehicleDriverBase;
pub const TOGGLE_ANIM_CLIP: &str = "change_station";

pub const TURN_OFF_DURATION_MS: u32 = 600;
pub const TURN_ON_DURATION_MS: u32 = 650;

/// How long the dictionary may take to load before the animation is dropped.
pub const ANIM_LOAD_WINDOW_MS: u64 = 500;

const BLEND_IN: f32 = 8.0;
const BLEND_OUT: f32 = 1.0;
// upper body + secondary task
const ANIM_FLAGS: u32 = 48;
const PLAYBACK_RATE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimOutcome {
    Played,
    OwnerChanged,
    TimedOut,
}

/// Animation queued by a toggle, waiting for its dictionary to load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingAnimation {
    pub active: bool,
    pub owner: Option<PedHandle>,
    pub duration_ms: u32,
    pub expire_at: u64,
}

impl PendingAnimation {
    /// Queues feedback for `owner` and issues the first load request.
    pub fn queue<W: World + ?Sized>(&mut self, world: &mut W, owner: PedHandle, turning_off: bool, now: u64) {
        world.request_anim_dict(TOGGLE_ANIM_DICT);

        self.active = true;
        self.owner = Some(owner);
        self.duration_ms = if turning_off {
            TURN_OFF_DURATION_MS
        } else {
            TURN_ON_DURATION_MS
        };
        self.expire_at = now.saturating_add(ANIM_LOAD_WINDOW_MS);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Per-frame step. Returns an outcome once the animation resolves.
    pub fn process<W: World + ?Sized>(&mut self, world: &mut W, now: u64) -> Option<AnimOutcome> {
        if !self.active {
            return None;
        }

        let Some(owner) = self.owner.filter(|owner| world.player_ped() == Some(*owner)) else {
            self.clear();
            debug!("animation dropped, owner changed");
            return Some(AnimOutcome::OwnerChanged);
        };

        if !world.has_anim_dict_loaded(TOGGLE_ANIM_DICT) {
            if now <= self.expire_at {
                world.request_anim_dict(TOGGLE_ANIM_DICT);
                return None;
            }

            self.clear();
            debug!("animation dropped, dictionary never loaded");
            return Some(AnimOutcome::TimedOut);
        }

        let request = AnimRequest {
            dict: TOGGLE_ANIM_DICT,
            clip: TOGGLE_ANIM_CLIP,
            blend_in: BLEND_IN,
            blend_out: BLEND_OUT,
            duration_ms: self.duration_ms,
            flags: ANIM_FLAGS,
            playback_rate: PLAYBACK_RATE,
        };
        world.play_anim(owner, &request);
        self.clear();
        Some(AnimOutcome::Played)
    }
}
