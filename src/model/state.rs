// Lifecycle states reported by and requested from the cluster manager.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// State a caller may ask the manager to drive a resource into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DesiredState {
    /// Present on its host but not running.
    Installed,
    /// Running.
    Started,
}

impl DesiredState {
    /// Wire representation used in request bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            DesiredState::Installed => "INSTALLED",
            DesiredState::Started => "STARTED",
        }
    }

    /// Verb used for context notes and log lines.
    pub fn verb(self) -> &'static str {
        match self {
            DesiredState::Installed => "Stopping",
            DesiredState::Started => "Starting",
        }
    }

    /// Whether `observed` is a state the manager legitimately passes through
    /// on its way to `self`.
    pub fn tolerates(self, observed: ObservedState) -> bool {
        use ObservedState::*;
        match self {
            DesiredState::Installed => matches!(observed, Stopping | Started | Installing),
            DesiredState::Started => matches!(observed, Starting | Installed),
        }
    }
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesiredState {
    type Err = UnrecognizedState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INSTALLED" | "STOPPED" => Ok(DesiredState::Installed),
            "STARTED" | "RUNNING" => Ok(DesiredState::Started),
            _ => Err(UnrecognizedState(s.to_string())),
        }
    }
}

/// State last reported by the manager for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObservedState {
    Init,
    Installing,
    InstallFailed,
    Installed,
    Starting,
    Started,
    Stopping,
    Uninstalling,
    Uninstalled,
    WipingOut,
    Upgrading,
    Disabled,
    Unknown,
}

impl ObservedState {
    pub fn as_str(self) -> &'static str {
        match self {
            ObservedState::Init => "INIT",
            ObservedState::Installing => "INSTALLING",
            ObservedState::InstallFailed => "INSTALL_FAILED",
            ObservedState::Installed => "INSTALLED",
            ObservedState::Starting => "STARTING",
            ObservedState::Started => "STARTED",
            ObservedState::Stopping => "STOPPING",
            ObservedState::Uninstalling => "UNINSTALLING",
            ObservedState::Uninstalled => "UNINSTALLED",
            ObservedState::WipingOut => "WIPING_OUT",
            ObservedState::Upgrading => "UPGRADING",
            ObservedState::Disabled => "DISABLED",
            ObservedState::Unknown => "UNKNOWN",
        }
    }

    /// Returns true when the observed state is the one that was requested.
    pub fn satisfies(self, desired: DesiredState) -> bool {
        matches!(
            (self, desired),
            (ObservedState::Installed, DesiredState::Installed)
                | (ObservedState::Started, DesiredState::Started)
        )
    }
}

impl fmt::Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObservedState {
    type Err = UnrecognizedState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let state = match s {
            "INIT" => ObservedState::Init,
            "INSTALLING" => ObservedState::Installing,
            "INSTALL_FAILED" => ObservedState::InstallFailed,
            "INSTALLED" => ObservedState::Installed,
            "STARTING" => ObservedState::Starting,
            "STARTED" => ObservedState::Started,
            "STOPPING" => ObservedState::Stopping,
            "UNINSTALLING" => ObservedState::Uninstalling,
            "UNINSTALLED" => ObservedState::Uninstalled,
            "WIPING_OUT" => ObservedState::WipingOut,
            "UPGRADING" => ObservedState::Upgrading,
            "DISABLED" => ObservedState::Disabled,
            "UNKNOWN" => ObservedState::Unknown,
            _ => return Err(UnrecognizedState(s.to_string())),
        };
        Ok(state)
    }
}

/// A state string outside the known lifecycle vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized lifecycle state {0:?}")]
pub struct UnrecognizedState(pub String);
