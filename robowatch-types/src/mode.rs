//! Controller run modes and match alliances.

/// Run mode of the remote controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    /// Autonomous program running.
    Auto,
    /// Driver-controlled program running.
    Teleop,
    /// No program running.
    #[default]
    Idle,
    /// Emergency stop requested.
    EStop,
}

impl Mode {
    /// The executor method name that requests this mode.
    pub fn method(&self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::Teleop => "teleop",
            Mode::Idle => "idle",
            Mode::EStop => "estop",
        }
    }

    /// Returns true if a student program runs in this mode.
    pub fn is_active(&self) -> bool {
        matches!(self, Mode::Auto | Mode::Teleop)
    }

    /// Returns the display label for this mode.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Auto => "Autonomous",
            Mode::Teleop => "Teleop",
            Mode::Idle => "Idle",
            Mode::EStop => "E-Stop",
        }
    }
}

/// The alliances that compete in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Alliance {
    Blue,
    Gold,
}

impl Alliance {
    /// Returns the display label for this alliance.
    pub fn label(&self) -> &'static str {
        match self {
            Alliance::Blue => "Blue",
            Alliance::Gold => "Gold",
        }
    }
}
