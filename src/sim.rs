//! In-memory host used by the tests and the simulator binary.
//!
//! `SimHost` answers every capability query from plain fields and records
//! every command it receives, so a run can be checked call by call.

use crate::host::{
    AnimDict, AnimRequest, Clock, Control, InputSource, KeyboardState, Movie, PedHandle, PhoneModel, PhoneSurface,
    PhraseHash, SceneSource, ScriptName, TextureDict, VehicleHandle, World,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// How a streamed resource responds to load checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBehavior {
    Immediate,
    /// Reports loaded on the n-th check.
    AfterChecks(u16),
    Never,
}

impl LoadBehavior {
    fn loaded_after(self, checks: u16) -> bool {
        match self {
            LoadBehavior::Immediate => true,
            LoadBehavior::AfterChecks(n) => checks >= n,
            LoadBehavior::Never => false,
        }
    }
}

/// A command the host received.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    ClosePhone,
    TerminateScript(ScriptName),
    RequestScript(ScriptName),
    StartScript(ScriptName, u32),
    ReleaseScript(ScriptName),
    DestroyPhone,
    CreatePhone(PhoneModel),
    RequestTextureDict(TextureDict),
    RequestMovie(Movie),
    ShowNotice(String),
    EnableControl(Control),
    SetEngineOn(VehicleHandle, bool),
    RequestAnimDict(AnimDict),
    PlayAnim(PedHandle, AnimRequest),
}

#[derive(Debug, Default)]
pub struct SimHost {
    now: u64,
    paused: bool,
    pause_menu: bool,
    keyboard: KeyboardState,
    cutscene_active: bool,
    cutscene_playing: bool,
    phone_open: bool,
    entered_phrase: Option<PhraseHash>,

    player: Option<PedHandle>,
    vehicle: Option<VehicleHandle>,
    vehicle_destroyed: bool,
    engines: HashMap<VehicleHandle, bool>,

    script_load: HashMap<ScriptName, LoadBehavior>,
    script_checks: RefCell<HashMap<ScriptName, u16>>,
    anim_load: Option<LoadBehavior>,
    anim_checks: Cell<u16>,

    calls: Vec<HostCall>,
}

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_now(&mut self, now: u64) {
        self.now = now;
    }

    /// Moves to the next frame. A phrase entered on the previous frame is
    /// no longer reported.
    pub fn advance(&mut self, dt_ms: u64) {
        self.now += dt_ms;
        self.entered_phrase = None;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_pause_menu(&mut self, active: bool) {
        self.pause_menu = active;
    }

    pub fn set_keyboard(&mut self, state: KeyboardState) {
        self.keyboard = state;
    }

    pub fn set_cutscene(&mut self, active: bool, playing: bool) {
        self.cutscene_active = active;
        self.cutscene_playing = playing;
    }

    pub fn set_phone_open(&mut self, open: bool) {
        self.phone_open = open;
    }

    /// The phrase is reported once, on the current frame.
    pub fn enter_phrase(&mut self, phrase: &str) {
        self.entered_phrase = Some(PhraseHash::of(phrase));
    }

    pub fn set_player(&mut self, ped: Option<PedHandle>) {
        self.player = ped;
    }

    pub fn set_vehicle(&mut self, vehicle: Option<VehicleHandle>) {
        self.vehicle = vehicle;
        self.vehicle_destroyed = false;
    }

    /// Player stays seated but the vehicle handle no longer resolves.
    pub fn set_vehicle_destroyed(&mut self, destroyed: bool) {
        self.vehicle_destroyed = destroyed;
    }

    /// Changes engine state behind the controllers' back.
    pub fn set_engine_running(&mut self, vehicle: VehicleHandle, running: bool) {
        self.engines.insert(vehicle, running);
    }

    pub fn set_script_load(&mut self, script: ScriptName, behavior: LoadBehavior) {
        self.script_load.insert(script, behavior);
    }

    pub fn set_anim_load(&mut self, behavior: LoadBehavior) {
        self.anim_load = Some(behavior);
    }

    pub fn phone_open(&self) -> bool {
        self.phone_open
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn count(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn notices(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::ShowNotice(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn take_calls(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.calls)
    }
}

impl Clock for SimHost {
    fn now_ms(&self) -> u64 {
        self.now
    }
}

impl InputSource for SimHost {
    // Consumed on match so repeated polling within one frame cannot re-fire.
    fn phrase_just_entered(&mut self, phrase: PhraseHash) -> bool {
        if self.entered_phrase == Some(phrase) {
            self.entered_phrase = None;
            true
        } else {
            false
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_pause_menu_active(&self) -> bool {
        self.pause_menu
    }

    fn keyboard_state(&self) -> KeyboardState {
        self.keyboard
    }

    fn enable_control(&mut self, control: Control) {
        self.calls.push(HostCall::EnableControl(control));
    }
}

impl SceneSource for SimHost {
    fn is_cutscene_active(&self) -> bool {
        self.cutscene_active
    }

    fn is_cutscene_playing(&self) -> bool {
        self.cutscene_playing
    }
}

impl PhoneSurface for SimHost {
    fn is_phone_open(&self) -> bool {
        self.phone_open
    }

    fn close_phone(&mut self) {
        self.phone_open = false;
        self.calls.push(HostCall::ClosePhone);
    }

    fn terminate_script(&mut self, script: ScriptName) {
        self.calls.push(HostCall::TerminateScript(script));
    }

    fn request_script(&mut self, script: ScriptName) {
        self.calls.push(HostCall::RequestScript(script));
    }

    fn has_script_loaded(&self, script: ScriptName) -> bool {
        let mut checks = self.script_checks.borrow_mut();
        let count = checks.entry(script).or_insert(0);
        *count = count.saturating_add(1);
        self.script_load
            .get(&script)
            .copied()
            .unwrap_or(LoadBehavior::Immediate)
            .loaded_after(*count)
    }

    fn start_script(&mut self, script: ScriptName, stack_size: u32) {
        self.calls.push(HostCall::StartScript(script, stack_size));
    }

    fn release_script(&mut self, script: ScriptName) {
        self.calls.push(HostCall::ReleaseScript(script));
    }

    fn destroy_phone(&mut self) {
        self.calls.push(HostCall::DestroyPhone);
    }

    fn create_phone(&mut self, model: PhoneModel) {
        self.calls.push(HostCall::CreatePhone(model));
    }

    fn request_texture_dict(&mut self, dict: TextureDict) {
        self.calls.push(HostCall::RequestTextureDict(dict));
    }

    fn request_movie(&mut self, movie: Movie) {
        self.calls.push(HostCall::RequestMovie(movie));
    }

    fn show_notice(&mut self, text: &str) {
        self.calls.push(HostCall::ShowNotice(text.to_string()));
    }
}

impl World for SimHost {
    fn player_ped(&self) -> Option<PedHandle> {
        self.player
    }

    fn is_in_vehicle(&self, ped: PedHandle) -> bool {
        self.player == Some(ped) && self.vehicle.is_some()
    }

    fn current_vehicle(&self, ped: PedHandle) -> Option<VehicleHandle> {
        if self.is_in_vehicle(ped) && !self.vehicle_destroyed {
            self.vehicle
        } else {
            None
        }
    }

    fn is_engine_running(&self, vehicle: VehicleHandle) -> bool {
        self.engines.get(&vehicle).copied().unwrap_or(false)
    }

    fn set_engine_on(&mut self, vehicle: VehicleHandle, on: bool) {
        self.engines.insert(vehicle, on);
        self.calls.push(HostCall::SetEngineOn(vehicle, on));
    }

    fn request_anim_dict(&mut self, dict: AnimDict) {
        self.calls.push(HostCall::RequestAnimDict(dict));
    }

    fn has_anim_dict_loaded(&self, _dict: AnimDict) -> bool {
        let checks = self.anim_checks.get().saturating_add(1);
        self.anim_checks.set(checks);
        self.anim_load.unwrap_or(LoadBehavior::Immediate).loaded_after(checks)
    }

    fn play_anim(&mut self, ped: PedHandle, request: &AnimRequest) {
        self.calls.push(HostCall::PlayAnim(ped, request.clone()));
    }
}
