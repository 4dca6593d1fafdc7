//! Staged teardown and rebuild of the phone UI.
//!
//! A run walks six stages, each held for a minimum number of frames because
//! the host gives no "teardown finished" signal. Runs start from a typed
//! phrase (manual) or from a timer (periodic); at most one run is active.

pub mod launch;
pub mod schedule;

pub use launch::{LaunchEvent, LaunchState, ScriptLauncher, MAX_LOAD_CHECKS};
pub use schedule::PeriodicSchedule;

use crate::config::{PeriodicGuard, RepairConfig};
use crate::host::{
    Control, InputSource, Movie, PhoneModel, PhoneSurface, PhraseHash, SceneSource, ScriptName, TextureDict,
};
use heapless::Vec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const MAX_RUN_HISTORY: usize = 16;

pub const NOTICE_REPAIR_STARTED: &str = "Repairing phone UI...";
pub const NOTICE_REPAIR_COMPLETE: &str = "Phone UI refresh complete";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum RepairStage {
    #[default]
    Idle,
    ClosePhone,
    KillScripts,
    RecreatePhone,
    ReloadAssets,
    RestartScripts,
    Finish,
}

impl RepairStage {
    /// Stage number, 0 while idle.
    pub fn step(self) -> u8 {
        self as u8
    }

    /// Frames a stage must have run for before it may advance.
    pub fn min_frames(self) -> u32 {
        match self {
            RepairStage::ClosePhone => 10,
            RepairStage::KillScripts => 5,
            RepairStage::RecreatePhone => 2,
            RepairStage::ReloadAssets => 30,
            RepairStage::RestartScripts => 20,
            RepairStage::Idle | RepairStage::Finish => 0,
        }
    }

    fn next(self) -> Self {
        match self {
            RepairStage::Idle => RepairStage::ClosePhone,
            RepairStage::ClosePhone => RepairStage::KillScripts,
            RepairStage::KillScripts => RepairStage::RecreatePhone,
            RepairStage::RecreatePhone => RepairStage::ReloadAssets,
            RepairStage::ReloadAssets => RepairStage::RestartScripts,
            RepairStage::RestartScripts => RepairStage::Finish,
            RepairStage::Finish => RepairStage::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerSource {
    Manual,
    Periodic,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub stage: RepairStage,
    pub step_timer: u32,
    pub reopen_after_fix: bool,
    pub user_initiated: bool,
}

impl PipelineState {
    pub fn step(&self) -> u8 {
        self.stage.step()
    }

    pub fn is_idle(&self) -> bool {
        self.stage == RepairStage::Idle
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairStats {
    pub manual_runs: u32,
    pub periodic_runs: u32,
    pub periodic_fires: u32,
    pub periodic_skipped: u32,
    pub ignored_triggers: u32,
    pub completed_runs: u32,
    pub scripts_started: u32,
    pub scripts_abandoned: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub source: TriggerSource,
    pub started_at: u64,
    pub finished_at: u64,
    pub frames: u32,
    pub scripts_abandoned: u8,
}

#[derive(Debug)]
pub struct RepairPipeline {
    trigger: PhraseHash,
    guards: std::vec::Vec<PeriodicGuard>,
    schedule: PeriodicSchedule,
    state: PipelineState,
    launcher: ScriptLauncher,
    stats: RepairStats,
    history: Vec<RunRecord, MAX_RUN_HISTORY>,

    // Current run bookkeeping
    run_source: TriggerSource,
    run_started_at: u64,
    run_frames: u32,
    run_abandoned: u8,
}

impl RepairPipeline {
    pub fn new(config: &RepairConfig, start_ms: u64) -> Self {
        Self {
            trigger: config.trigger_hash(),
            guards: config.periodic_guards.clone(),
            schedule: PeriodicSchedule::new(config, start_ms),
            state: PipelineState::default(),
            launcher: ScriptLauncher::new(),
            stats: RepairStats::default(),
            history: Vec::new(),
            run_source: TriggerSource::Manual,
            run_started_at: 0,
            run_frames: 0,
            run_abandoned: 0,
        }
    }

    /// Per-frame entry point. Safe to call unconditionally.
    pub fn on_frame<H>(&mut self, host: &mut H, now: u64)
    where
        H: InputSource + SceneSource + PhoneSurface + ?Sized,
    {
        if host.phrase_just_entered(self.trigger) {
            self.trigger_manual(host, now);
        }

        if self.state.is_idle() && self.schedule.poll(now) {
            self.stats.periodic_fires += 1;
            if self.periodic_allowed(&*host) {
                self.start(host, TriggerSource::Periodic, false, now);
            } else {
                self.stats.periodic_skipped += 1;
                debug!(now, next_fire_at = self.schedule.next_fire_at, "periodic repair skipped by guard");
            }
        }

        if !self.state.is_idle() {
            self.run_stage(host, now);
        }
    }

    /// Starts a user-initiated run, remembering whether the phone was open.
    /// Returns false if a run is already active.
    pub fn trigger_manual<H>(&mut self, host: &mut H, now: u64) -> bool
    where
        H: PhoneSurface + ?Sized,
    {
        let phone_open = host.is_phone_open();
        self.start(host, TriggerSource::Manual, phone_open, now)
    }

    fn periodic_allowed<H>(&self, host: &H) -> bool
    where
        H: InputSource + SceneSource + PhoneSurface + ?Sized,
    {
        let guards_hold = self.guards.iter().all(|guard| match guard {
            PeriodicGuard::NoCutscene => !host.is_cutscene_active() && !host.is_cutscene_playing(),
            PeriodicGuard::NotPaused => !host.is_paused(),
            PeriodicGuard::NoPauseMenu => !host.is_pause_menu_active(),
        });

        guards_hold && !(self.schedule.only_when_closed && host.is_phone_open())
    }

    fn start<H>(&mut self, host: &mut H, source: TriggerSource, reopen_after_fix: bool, now: u64) -> bool
    where
        H: PhoneSurface + ?Sized,
    {
        if !self.state.is_idle() {
            self.stats.ignored_triggers += 1;
            debug!(?source, step = self.state.step(), "repair already running, trigger ignored");
            return false;
        }

        let user_initiated = source == TriggerSource::Manual;
        self.state = PipelineState {
            stage: RepairStage::ClosePhone,
            step_timer: 0,
            reopen_after_fix,
            user_initiated,
        };
        self.launcher.reset();
        self.run_source = source;
        self.run_started_at = now;
        self.run_frames = 0;
        self.run_abandoned = 0;

        match source {
            TriggerSource::Manual => self.stats.manual_runs += 1,
            TriggerSource::Periodic => self.stats.periodic_runs += 1,
        }

        if user_initiated {
            host.show_notice(NOTICE_REPAIR_STARTED);
        }

        info!(?source, reopen_after_fix, "phone UI repair started");
        true
    }

    fn run_stage<H>(&mut self, host: &mut H, now: u64)
    where
        H: InputSource + PhoneSurface + ?Sized,
    {
        self.state.step_timer += 1;
        self.run_frames += 1;
        let stage = self.state.stage;
        let dwell_done = self.state.step_timer > stage.min_frames();

        match stage {
            RepairStage::Idle => {}

            RepairStage::ClosePhone => {
                host.close_phone();
                if dwell_done {
                    self.next_stage();
                }
            }

            RepairStage::KillScripts => {
                host.terminate_script(ScriptName::CellphoneFlashhand);
                host.terminate_script(ScriptName::CellphoneController);
                if dwell_done {
                    self.next_stage();
                }
            }

            RepairStage::RecreatePhone => {
                host.destroy_phone();
                if dwell_done {
                    host.create_phone(PhoneModel::default());
                    self.next_stage();
                }
            }

            RepairStage::ReloadAssets => {
                host.request_texture_dict(TextureDict::CellphoneIfruit);
                host.request_movie(Movie::CellphoneIfruit);
                host.request_movie(Movie::CellphoneIfruit2);
                if dwell_done {
                    self.next_stage();
                }
            }

            RepairStage::RestartScripts => {
                match self.launcher.step(host) {
                    Some(LaunchEvent::Started(_)) => self.stats.scripts_started += 1,
                    Some(LaunchEvent::Abandoned(_)) => {
                        self.stats.scripts_abandoned += 1;
                        self.run_abandoned += 1;
                    }
                    None => {}
                }
                if dwell_done && self.launcher.is_finished() {
                    self.next_stage();
                }
            }

            RepairStage::Finish => self.finish(host, now),
        }
    }

    fn next_stage(&mut self) {
        let next = self.state.stage.next();
        debug!(from = ?self.state.stage, to = ?next, frames = self.state.step_timer, "repair stage advanced");
        self.state.stage = next;
        self.state.step_timer = 0;
    }

    fn finish<H>(&mut self, host: &mut H, now: u64)
    where
        H: InputSource + PhoneSurface + ?Sized,
    {
        if self.state.reopen_after_fix {
            host.enable_control(Control::Phone);
        }

        if self.state.user_initiated {
            host.show_notice(NOTICE_REPAIR_COMPLETE);
        }

        let record = RunRecord {
            source: self.run_source,
            started_at: self.run_started_at,
            finished_at: now,
            frames: self.run_frames,
            scripts_abandoned: self.run_abandoned,
        };

        if self.history.is_full() {
            self.history.remove(0);
        }
        let _ = self.history.push(record);

        self.stats.completed_runs += 1;
        info!(
            source = ?self.run_source,
            frames = self.run_frames,
            scripts_abandoned = self.run_abandoned,
            "phone UI repair complete"
        );

        self.state = PipelineState::default();
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn schedule(&self) -> &PeriodicSchedule {
        &self.schedule
    }

    pub fn launcher(&self) -> &ScriptLauncher {
        &self.launcher
    }

    pub fn stats(&self) -> &RepairStats {
        &self.stats
    }

    pub fn history(&self) -> &[RunRecord] {
        &self.history
    }
}
