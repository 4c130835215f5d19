use crate::project::Project;
use std::fmt;

/// Phases of one orchestrator run.
///
/// `Idle → Preparing → Executing → PostProcessing → Done`, or `Failed` from
/// any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupState {
    Idle,
    Preparing,
    Executing,
    PostProcessing,
    Done,
    Failed,
}

impl SetupState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SetupState::Done | SetupState::Failed)
    }

    fn can_enter(self, next: SetupState) -> bool {
        use SetupState::*;
        match (self, next) {
            (_, Failed) => !self.is_terminal(),
            (Idle, Preparing) | (Preparing, Executing) => true,
            (Executing, PostProcessing) | (PostProcessing, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SetupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupState::Idle => "idle",
            SetupState::Preparing => "preparing",
            SetupState::Executing => "executing",
            SetupState::PostProcessing => "post-processing",
            SetupState::Done => "done",
            SetupState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Records and logs the transitions of one run.
#[derive(Debug)]
pub(crate) struct StateTracker<'a> {
    project: &'a Project,
    history: Vec<SetupState>,
}

impl<'a> StateTracker<'a> {
    pub(crate) fn new(project: &'a Project) -> Self {
        Self {
            project,
            history: vec![SetupState::Idle],
        }
    }

    pub(crate) fn current(&self) -> SetupState {
        self.history.last().copied().unwrap_or(SetupState::Idle)
    }

    pub(crate) fn enter(&mut self, next: SetupState) {
        let current = self.current();
        debug_assert!(current.can_enter(next), "{current} -> {next}");
        log::debug!("{}: {} -> {}", self.project, current, next);
        self.history.push(next);
    }

    pub(crate) fn into_history(self) -> Vec<SetupState> {
        self.history
    }

    /// End the run in [`SetupState::Failed`]. A failed run has no outcome to
    /// carry a history, so only the state it failed in is returned.
    pub(crate) fn fail(self) -> SetupState {
        let current = self.current();
        debug_assert!(current.can_enter(SetupState::Failed), "{current} -> failed");
        log::debug!("{}: {} -> {}", self.project, current, SetupState::Failed);
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(SetupState::Idle.can_enter(SetupState::Preparing));
        assert!(SetupState::Preparing.can_enter(SetupState::Executing));
        assert!(SetupState::Executing.can_enter(SetupState::PostProcessing));
        assert!(SetupState::PostProcessing.can_enter(SetupState::Done));
    }

    #[test]
    fn test_no_skipping_or_leaving_terminal_states() {
        assert!(!SetupState::Preparing.can_enter(SetupState::Done));
        assert!(!SetupState::Idle.can_enter(SetupState::Executing));
        assert!(!SetupState::Done.can_enter(SetupState::Failed));
        assert!(!SetupState::Failed.can_enter(SetupState::Preparing));
        assert!(SetupState::Executing.can_enter(SetupState::Failed));
        assert!(SetupState::Idle.can_enter(SetupState::Failed));
    }

    #[test]
    fn test_tracker_history() {
        let project = Project::new("demo", "/tmp/demo");
        let mut tracker = StateTracker::new(&project);
        tracker.enter(SetupState::Preparing);
        tracker.enter(SetupState::Executing);
        assert_eq!(tracker.current(), SetupState::Executing);
        assert_eq!(
            tracker.into_history(),
            vec![SetupState::Idle, SetupState::Preparing, SetupState::Executing]
        );
    }

    #[test]
    fn test_fail_reports_the_state_it_failed_in() {
        let project = Project::new("demo", "/tmp/demo");
        let mut tracker = StateTracker::new(&project);
        tracker.enter(SetupState::Preparing);
        assert_eq!(tracker.fail(), SetupState::Preparing);
    }
}
