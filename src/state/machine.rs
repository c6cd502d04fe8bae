use super::error::{StateError, StateResult};
use super::{StateTransition, TriggerEvent, TriggerState};

#[derive(Debug)]
pub struct StateMachine {
    state: TriggerState,
    last_transition: Option<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: TriggerState::default(),
            last_transition: None,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn last_transition(&self) -> Option<StateTransition> {
        self.last_transition
    }

    pub fn can_transition(&self, event: TriggerEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: TriggerEvent) -> Option<TriggerState> {
        use TriggerEvent::*;
        match (self.state, event) {
            (_, ToggleOff) => Some(TriggerState::Idle),
            (TriggerState::Idle, Changed) => Some(TriggerState::ArmedPending),
            (TriggerState::ArmedPending, Changed) => Some(TriggerState::ArmedPending),
            (TriggerState::ArmedPending, QuietElapsed) => Some(TriggerState::Suppressed),
            (TriggerState::Suppressed, Changed) => Some(TriggerState::Suppressed),
            (TriggerState::Suppressed, PassCompleted) => Some(TriggerState::Idle),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: TriggerEvent) -> StateResult<TriggerState> {
        tracing::trace!(from = ?self.state, event = ?event, "request state transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid state transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        self.last_transition = Some(StateTransition::new(self.state, event, next));
        self.state = next;

        Ok(self.state)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TriggerState::{:?}", self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_transition_tracks_valid_and_invalid_events() {
        let mut machine = StateMachine::new();
        assert!(machine.can_transition(TriggerEvent::Changed));
        assert!(machine.can_transition(TriggerEvent::ToggleOff));
        assert!(!machine.can_transition(TriggerEvent::QuietElapsed));
        assert!(!machine.can_transition(TriggerEvent::PassCompleted));

        let _ = machine
            .transition(TriggerEvent::Changed)
            .expect("idle -> armed should transition");

        assert!(machine.can_transition(TriggerEvent::Changed));
        assert!(machine.can_transition(TriggerEvent::QuietElapsed));
        assert!(!machine.can_transition(TriggerEvent::PassCompleted));
    }

    #[test]
    fn full_cycle_returns_to_idle() {
        let mut machine = StateMachine::new();
        for (event, expected) in [
            (TriggerEvent::Changed, TriggerState::ArmedPending),
            (TriggerEvent::Changed, TriggerState::ArmedPending),
            (TriggerEvent::QuietElapsed, TriggerState::Suppressed),
            (TriggerEvent::Changed, TriggerState::Suppressed),
            (TriggerEvent::PassCompleted, TriggerState::Idle),
        ] {
            let state = machine.transition(event).expect("cycle transition");
            assert_eq!(state, expected);
        }

        assert_eq!(
            machine.last_transition(),
            Some(StateTransition::new(
                TriggerState::Suppressed,
                TriggerEvent::PassCompleted,
                TriggerState::Idle
            ))
        );
    }

    #[test]
    fn toggle_off_resets_from_any_state() {
        let mut machine = StateMachine::new();
        machine.transition(TriggerEvent::Changed).expect("arm");
        machine.transition(TriggerEvent::QuietElapsed).expect("fire");

        assert_eq!(
            machine.transition(TriggerEvent::ToggleOff).expect("toggle off"),
            TriggerState::Idle
        );
        assert_eq!(
            machine.transition(TriggerEvent::ToggleOff).expect("toggle off twice"),
            TriggerState::Idle
        );
    }

    #[test]
    fn invalid_transition_returns_error_without_mutating_state() {
        let mut machine = StateMachine::new();

        let err = machine
            .transition(TriggerEvent::PassCompleted)
            .expect_err("idle -> pass completed should fail");
        assert!(matches!(
            err,
            StateError::InvalidStateTransition {
                from: TriggerState::Idle,
                event: TriggerEvent::PassCompleted
            }
        ));
        assert_eq!(machine.state(), TriggerState::Idle);
        assert_eq!(machine.last_transition(), None);
        assert_eq!(machine.to_string(), "TriggerState::Idle");
    }
}
