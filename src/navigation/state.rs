//! Navigation state.

use std::fmt;

/// Phase of the navigation state machine.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    Uninitialized = 0,
    Idle = 1,
    Validating = 2,
    SwitchingSpec = 3,
    Refreshing = 4,
    /// Terminal: a full page load was requested.
    Unloading = 5,
}

impl From<u8> for NavigationState {
    fn from(val: u8) -> Self {
        match val {
            1 => NavigationState::Idle,
            2 => NavigationState::Validating,
            3 => NavigationState::SwitchingSpec,
            4 => NavigationState::Refreshing,
            5 => NavigationState::Unloading,
            _ => NavigationState::Uninitialized,
        }
    }
}

impl fmt::Display for NavigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NavigationState::Uninitialized => "UNINITIALIZED",
            NavigationState::Idle => "IDLE",
            NavigationState::Validating => "VALIDATING",
            NavigationState::SwitchingSpec => "SWITCHING_SPEC",
            NavigationState::Refreshing => "REFRESHING",
            NavigationState::Unloading => "UNLOADING",
        };
        f.write_str(name)
    }
}
