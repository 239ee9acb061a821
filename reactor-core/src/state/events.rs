//! Events that trigger sequencer transitions

/// Events that can trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Activation events
    /// Step activated with its countdown running (Run mode, or threshold
    /// already met)
    CountdownArmed,
    /// Wait-mode step activated below its threshold
    ThresholdArmed,

    // Sensor events
    /// Latest sample satisfied the active step's threshold
    ThresholdReached,

    // Completion events
    /// Last pending step finished
    RunComplete,
    /// Step finished with auto mode off
    RunHalted,

    // Operator events
    /// Stop or reset requested
    Reset,
}
