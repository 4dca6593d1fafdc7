//! Capabilities the host simulation exposes to the controllers.
//!
//! Every call the controllers make against the host goes through one of the
//! traits below. Names the host understands (script names, streamed assets,
//! animation dictionaries) are modelled as enums so the state machines never
//! handle raw strings.

use serde::{Deserialize, Serialize};

/// Stack size the phone scripts are launched with.
pub const PHONE_SCRIPT_STACK_SIZE: u32 = 1424;

/// Opaque handle of a pedestrian (actor) in the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PedHandle(pub i32);

/// Opaque handle of a vehicle in the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleHandle(pub i32);

/// Background scripts that own the phone UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptName {
    CellphoneController,
    CellphoneFlashhand,
}

impl ScriptName {
    pub const fn as_str(self) -> &'static str {
        match self {
            ScriptName::CellphoneController => "cellphone_controller",
            ScriptName::CellphoneFlashhand => "cellphone_flashhand",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureDict {
    CellphoneIfruit,
}

impl TextureDict {
    pub const fn as_str(self) -> &'static str {
        match self {
            TextureDict::CellphoneIfruit => "cellphone_ifruit",
        }
    }
}

/// Overlay movies drawn by the phone UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Movie {
    CellphoneIfruit,
    CellphoneIfruit2,
}

impl Movie {
    pub const fn as_str(self) -> &'static str {
        match self {
            Movie::CellphoneIfruit => "cellphone_ifruit",
            Movie::CellphoneIfruit2 => "cellphone_ifruit_2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimDict {
    /// Seated driver base set, holds the radio/ignition reach clip.
    VehicleDriverBase,
}

impl AnimDict {
    pub const fn as_str(self) -> &'static str {
        match self {
            AnimDict::VehicleDriverBase => "veh@std@ds@base",
        }
    }
}

/// Input actions the controllers may enable for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    Phone,
}

impl Control {
    /// Host-side control index.
    pub const fn index(self) -> i32 {
        match self {
            Control::Phone => 27,
        }
    }
}

/// Phone model passed to the host when the backing object is recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PhoneModel {
    #[default]
    Ifruit,
}

/// Status of the on-screen keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyboardState {
    #[default]
    NotDisplayed,
    Editing,
    Finished,
    Cancelled,
}

impl KeyboardState {
    /// True while the keyboard still owns the input.
    pub fn occupies_input(self) -> bool {
        matches!(self, KeyboardState::Editing | KeyboardState::Finished)
    }
}

/// Parameters of a one-shot animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimRequest {
    pub dict: AnimDict,
    pub clip: &'static str,
    pub blend_in: f32,
    pub blend_out: f32,
    pub duration_ms: u32,
    pub flags: u32,
    pub playback_rate: f32,
}

/// Hash the host uses to identify a typed phrase.
///
/// Jenkins one-at-a-time over the lowercased bytes, matching the host's own
/// key hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhraseHash(pub u32);

impl PhraseHash {
    pub fn of(phrase: &str) -> Self {
        let mut hash: u32 = 0;
        for byte in phrase.bytes() {
            hash = hash.wrapping_add(u32::from(byte.to_ascii_lowercase()));
            hash = hash.wrapping_add(hash << 10);
            hash ^= hash >> 6;
        }
        hash = hash.wrapping_add(hash << 3);
        hash ^= hash >> 11;
        hash = hash.wrapping_add(hash << 15);
        Self(hash)
    }
}

pub trait Clock {
    /// Monotonic host time in milliseconds.
    fn now_ms(&self) -> u64;
}

pub trait InputSource {
    /// Edge-triggered: true only on the frame the phrase was completed.
    fn phrase_just_entered(&mut self, phrase: PhraseHash) -> bool;
    fn is_paused(&self) -> bool;
    fn is_pause_menu_active(&self) -> bool;
    fn keyboard_state(&self) -> KeyboardState;
    /// Enables the control for the current frame only.
    fn enable_control(&mut self, control: Control);
}

pub trait SceneSource {
    fn is_cutscene_active(&self) -> bool;
    fn is_cutscene_playing(&self) -> bool;
}

/// Control surface of the phone UI subsystem. All commands are idempotent
/// and fire-and-forget.
pub trait PhoneSurface {
    fn is_phone_open(&self) -> bool;
    /// Backs out of the phone, cell camera and any frontend menu.
    fn close_phone(&mut self);
    fn terminate_script(&mut self, script: ScriptName);
    fn request_script(&mut self, script: ScriptName);
    fn has_script_loaded(&self, script: ScriptName) -> bool;
    fn start_script(&mut self, script: ScriptName, stack_size: u32);
    fn release_script(&mut self, script: ScriptName);
    fn destroy_phone(&mut self);
    fn create_phone(&mut self, model: PhoneModel);
    fn request_texture_dict(&mut self, dict: TextureDict);
    fn request_movie(&mut self, movie: Movie);
    fn show_notice(&mut self, text: &str);
}

pub trait World {
    /// The controlling actor, if it currently exists.
    fn player_ped(&self) -> Option<PedHandle>;
    /// Whether the actor is seated in any vehicle.
    fn is_in_vehicle(&self, ped: PedHandle) -> bool;
    /// The vehicle the actor sits in, if it still exists.
    fn current_vehicle(&self, ped: PedHandle) -> Option<VehicleHandle>;
    fn is_engine_running(&self, vehicle: VehicleHandle) -> bool;
    fn set_engine_on(&mut self, vehicle: VehicleHandle, on: bool);
    fn request_anim_dict(&mut self, dict: AnimDict);
    fn has_anim_dict_loaded(&self, dict: AnimDict) -> bool;
    fn play_anim(&mut self, ped: PedHandle, request: &AnimRequest);
}

/// Everything a full host offers.
pub trait Host: Clock + InputSource + SceneSource + PhoneSurface + World {}

impl<T> Host for T where T: Clock + InputSource + SceneSource + PhoneSurface + World {}
