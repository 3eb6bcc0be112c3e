use serde::{Deserialize, Serialize};

/// One phase of the brew cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Steeping,
    /// Gate between the two countdowns; waits for the user to continue.
    Stir,
    Brewing,
    Complete,
}

impl Stage {
    /// Whether this stage counts down.
    pub fn is_timed(self) -> bool {
        matches!(self, Stage::Steeping | Stage::Brewing)
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Idle => "Ready to Start",
            Stage::Steeping => "Steeping",
            Stage::Stir => "Stir Coffee",
            Stage::Brewing => "Final Brewing",
            Stage::Complete => "Ready to Pour!",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Stage::Idle => "Press start to begin brewing",
            Stage::Steeping => "Let the coffee steep...",
            Stage::Stir => "Give the coffee a gentle stir, then continue",
            Stage::Brewing => "Almost ready...",
            Stage::Complete => "Your coffee is ready to enjoy",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Steeping => "steeping",
            Stage::Stir => "stir",
            Stage::Brewing => "brewing",
            Stage::Complete => "complete",
        }
    }
}

/// Countdown state for the current stage.
///
/// `running` is only ever true in `Steeping` and `Brewing`. `total_secs` is
/// fixed while a stage lasts and is the denominator for progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageState {
    pub stage: Stage,
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub running: bool,
}

impl StageState {
    pub const IDLE: StageState = StageState {
        stage: Stage::Idle,
        remaining_secs: 0,
        total_secs: 0,
        running: false,
    };

    /// Fresh countdown for a timed stage.
    pub fn countdown(stage: Stage, secs: u32) -> Self {
        Self {
            stage,
            remaining_secs: secs,
            total_secs: secs,
            running: true,
        }
    }

    /// 0.0 .. 1.0 progress within the current stage.
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        let elapsed = self.total_secs.saturating_sub(self.remaining_secs);
        (elapsed as f64 / self.total_secs as f64).clamp(0.0, 1.0)
    }
}

impl Default for StageState {
    fn default() -> Self {
        Self::IDLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_countdown_stages_are_timed() {
        assert!(Stage::Steeping.is_timed());
        assert!(Stage::Brewing.is_timed());
        assert!(!Stage::Idle.is_timed());
        assert!(!Stage::Stir.is_timed());
        assert!(!Stage::Complete.is_timed());
    }

    #[test]
    fn progress_is_elapsed_over_total() {
        let mut state = StageState::countdown(Stage::Steeping, 100);
        assert_eq!(state.progress(), 0.0);
        state.remaining_secs = 25;
        assert_eq!(state.progress(), 0.75);
        assert_eq!(StageState::IDLE.progress(), 0.0);
    }

    #[test]
    fn stage_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Stage::Stir).unwrap(), "\"stir\"");
    }
}
