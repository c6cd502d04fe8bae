use super::model::TriggerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Changed,
    QuietElapsed,
    PassCompleted,
    ToggleOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: TriggerState,
    pub event: TriggerEvent,
    pub to: TriggerState,
}

impl StateTransition {
    pub const fn new(from: TriggerState, event: TriggerEvent, to: TriggerState) -> Self {
        Self { from, event, to }
    }
}
