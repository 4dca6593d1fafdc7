use crate::host::{PhoneSurface, ScriptName, PHONE_SCRIPT_STACK_SIZE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Failed load checks after which a script is given up on.
pub const MAX_LOAD_CHECKS: u16 = 120;

/// Order the phone scripts are brought back up in.
pub const LAUNCH_ORDER: [ScriptName; 2] = [ScriptName::CellphoneController, ScriptName::CellphoneFlashhand];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchState {
    Pending,
    Requesting { failed_checks: u16 },
    Started,
    Abandoned,
}

impl LaunchState {
    pub fn is_resolved(self) -> bool {
        matches!(self, LaunchState::Started | LaunchState::Abandoned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchEvent {
    Started(ScriptName),
    Abandoned(ScriptName),
}

/// Restarts the phone scripts one at a time, one load check per frame.
#[derive(Debug, Clone)]
pub struct ScriptLauncher {
    slots: [(ScriptName, LaunchState); 2],
}

impl ScriptLauncher {
    pub fn new() -> Self {
        Self {
            slots: LAUNCH_ORDER.map(|script| (script, LaunchState::Pending)),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advances the first unresolved script by one load check.
    pub fn step<P: PhoneSurface + ?Sized>(&mut self, phone: &mut P) -> Option<LaunchEvent> {
        let (script, state) = self.slots.iter_mut().find(|(_, state)| !state.is_resolved())?;
        let script = *script;

        let failed_checks = match *state {
            LaunchState::Pending => {
                phone.request_script(script);
                0
            }
            LaunchState::Requesting { failed_checks } => failed_checks,
            LaunchState::Started | LaunchState::Abandoned => return None,
        };

        if phone.has_script_loaded(script) {
            phone.start_script(script, PHONE_SCRIPT_STACK_SIZE);
            phone.release_script(script);
            *state = LaunchState::Started;
            debug!(script = script.as_str(), "script restarted");
            return Some(LaunchEvent::Started(script));
        }

        let failed_checks = failed_checks + 1;
        if failed_checks >= MAX_LOAD_CHECKS {
            *state = LaunchState::Abandoned;
            warn!(script = script.as_str(), failed_checks, "script never loaded, skipping");
            return Some(LaunchEvent::Abandoned(script));
        }

        *state = LaunchState::Requesting { failed_checks };
        None
    }

    pub fn is_finished(&self) -> bool {
        self.slots.iter().all(|(_, state)| state.is_resolved())
    }

    pub fn state_of(&self, script: ScriptName) -> Option<LaunchState> {
        self.slots
            .iter()
            .find(|(name, _)| *name == script)
            .map(|(_, state)| *state)
    }
}

impl Default for ScriptLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{HostCall, LoadBehavior, SimHost};

    #[test]
    fn test_loaded_scripts_start_in_order() {
        let mut host = SimHost::new();
        let mut launcher = ScriptLauncher::new();

        assert_eq!(
            launcher.step(&mut host),
            Some(LaunchEvent::Started(ScriptName::CellphoneController))
        );
        assert!(!launcher.is_finished());
        assert_eq!(
            launcher.step(&mut host),
            Some(LaunchEvent::Started(ScriptName::CellphoneFlashhand))
        );
        assert!(launcher.is_finished());
        assert_eq!(launcher.step(&mut host), None);

        assert_eq!(host.count(|c| matches!(c, HostCall::StartScript(_, PHONE_SCRIPT_STACK_SIZE))), 2);
        assert_eq!(host.count(|c| matches!(c, HostCall::ReleaseScript(_))), 2);
    }

    #[test]
    fn test_waits_for_slow_script() {
        let mut host = SimHost::new();
        host.set_script_load(ScriptName::CellphoneController, LoadBehavior::AfterChecks(3));
        let mut launcher = ScriptLauncher::new();

        assert_eq!(launcher.step(&mut host), None);
        assert_eq!(launcher.step(&mut host), None);
        assert_eq!(
            launcher.state_of(ScriptName::CellphoneController),
            Some(LaunchState::Requesting { failed_checks: 2 })
        );
        assert_eq!(
            launcher.step(&mut host),
            Some(LaunchEvent::Started(ScriptName::CellphoneController))
        );
        assert_eq!(host.count(|c| matches!(c, HostCall::RequestScript(_))), 1);
    }

    #[test]
    fn test_abandons_after_max_checks() {
        let mut host = SimHost::new();
        host.set_script_load(ScriptName::CellphoneController, LoadBehavior::Never);
        let mut launcher = ScriptLauncher::new();

        for _ in 0..MAX_LOAD_CHECKS - 1 {
            assert_eq!(launcher.step(&mut host), None);
        }
        assert_eq!(
            launcher.step(&mut host),
            Some(LaunchEvent::Abandoned(ScriptName::CellphoneController))
        );
        assert_eq!(
            launcher.step(&mut host),
            Some(LaunchEvent::Started(ScriptName::CellphoneFlashhand))
        );
        assert!(launcher.is_finished());
        assert!(!host.calls().contains(&HostCall::StartScript(
            ScriptName::CellphoneController,
            PHONE_SCRIPT_STACK_SIZE
        )));
    }
}
