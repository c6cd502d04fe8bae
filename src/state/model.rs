/// Where the trigger scheduler is in its debounce cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerState {
    #[default]
    Idle,
    /// A change was seen; waiting for the quiet period to elapse.
    ArmedPending,
    /// A pass is in flight on the UI thread.
    Suppressed,
}
