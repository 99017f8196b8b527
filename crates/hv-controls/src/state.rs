//! Operating mode, fan speed and equipment run state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Desired operating mode, chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Cool,
    Heat,
    #[default]
    Auto,
    FanOnly,
}

impl Mode {
    /// Map a front-end integer code. Unknown codes fall back to fan-only,
    /// which never energizes a compressor or heater.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Cool,
            1 => Self::Heat,
            2 => Self::Auto,
            _ => Self::FanOnly,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Cool => 0,
            Self::Heat => 1,
            Self::Auto => 2,
            Self::FanOnly => 3,
        }
    }

    pub fn allows_cooling(self) -> bool {
        matches!(self, Self::Cool | Self::Auto)
    }

    pub fn allows_heating(self) -> bool {
        matches!(self, Self::Heat | Self::Auto)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cool => "COOL",
            Self::Heat => "HEAT",
            Self::Auto => "AUTO",
            Self::FanOnly => "FAN_ONLY",
        };
        f.write_str(name)
    }
}

/// Requested fan speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FanSpeed {
    #[default]
    Low,
    High,
    Auto,
}

impl FanSpeed {
    /// Map a front-end integer code. Unknown codes fall back to low speed.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::High,
            2 => Self::Auto,
            _ => Self::Low,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Low => 0,
            Self::High => 1,
            Self::Auto => 2,
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "LOW",
            Self::High => "HIGH",
            Self::Auto => "AUTO",
        };
        f.write_str(name)
    }
}

/// Actual equipment state, owned by the control engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    #[default]
    Disabled,
    Idle,
    Heating,
    Cooling,
    FanOnly,
    /// A relay sequence is in flight; only its outcome moves the state on.
    Transition,
    /// One-cycle marker written by a completed stop sequence.
    Shutdown,
}

impl RunState {
    /// Numeric code used by persistence records and status payloads.
    pub fn code(self) -> i64 {
        match self {
            Self::Disabled => -1,
            Self::Idle => 0,
            Self::Heating => 1,
            Self::Cooling => 2,
            Self::FanOnly => 3,
            Self::Shutdown => 4,
            Self::Transition => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Self::Disabled),
            0 => Some(Self::Idle),
            1 => Some(Self::Heating),
            2 => Some(Self::Cooling),
            3 => Some(Self::FanOnly),
            4 => Some(Self::Shutdown),
            5 => Some(Self::Transition),
            _ => None,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disabled => "DISABLED",
            Self::Idle => "IDLE",
            Self::Heating => "HEATING",
            Self::Cooling => "COOLING",
            Self::FanOnly => "FAN_ONLY",
            Self::Transition => "TRANSITION",
            Self::Shutdown => "SHUTDOWN",
        };
        f.write_str(name)
    }
}
