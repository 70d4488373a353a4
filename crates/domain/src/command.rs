//! Abstract commands and queued command records.
//!
//! The abstract command vocabulary is the contract boundary between button
//! resolution and vendor specifics: resolvers produce them, adapters
//! translate them into wire payloads.

use serde::{Deserialize, Serialize};

use crate::device::{Brand, PowerState};
use crate::error::{LumeqError, ValidationError};
use crate::id::{CommandId, DeviceId};
use crate::time::{self, Timestamp};

/// A vendor-neutral instruction, serialized as `{"name": ..., "value": ...}`.
///
/// `toggle` is only valid as a mapping template: the resolver replaces it
/// with a concrete `turn` or `brightness` before anything is enqueued for a
/// vendor adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "lowercase")]
pub enum AbstractCommand {
    /// Set brightness (1–100); implies power-on on every supported bridge.
    Brightness(i64),
    /// Switch the device on or off.
    Turn(PowerState),
    /// Template: flip the target based on sampled state, using the carried
    /// brightness when turning on.
    Toggle(i64),
}

impl AbstractCommand {
    /// The `name` half of the wire form.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Brightness(_) => "brightness",
            Self::Turn(_) => "turn",
            Self::Toggle(_) => "toggle",
        }
    }

    /// Whether this command is the unresolved `toggle` template.
    #[must_use]
    pub fn is_toggle(&self) -> bool {
        matches!(self, Self::Toggle(_))
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LumeqError::Validation`] when a brightness value falls
    /// outside `1..=100`.
    pub fn validate(&self) -> Result<(), LumeqError> {
        match self {
            Self::Brightness(value) | Self::Toggle(value) => {
                if !(1..=100).contains(value) {
                    return Err(ValidationError::BrightnessOutOfRange(*value).into());
                }
                Ok(())
            }
            Self::Turn(_) => Ok(()),
        }
    }
}

/// Lifecycle status of a [`CommandRecord`].
///
/// Legal transitions: `pending → processing → {completed, failed}`, plus
/// `processing → pending` when a stale claim is reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl CommandStatus {
    /// Lowercase string form used in the store.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the record has reached a final state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommandStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// A command awaiting enqueue.
#[derive(Debug, Clone)]
pub struct NewCommand {
    pub device: DeviceId,
    pub model: String,
    pub brand: Brand,
    pub command: AbstractCommand,
}

/// A queued work item, owned exclusively by the queue store and mutated only
/// through the claim/complete protocol.
#[derive(Debug, Clone)]
pub struct CommandRecord {
    pub id: CommandId,
    pub device: DeviceId,
    pub model: String,
    pub brand: Brand,
    pub command: AbstractCommand,
    pub status: CommandStatus,
    pub created_at: Timestamp,
    pub processed_at: Option<Timestamp>,
    pub error_message: Option<String>,
}

impl CommandRecord {
    /// Build a fresh `pending` record from a [`NewCommand`].
    #[must_use]
    pub fn new(command: NewCommand) -> Self {
        Self {
            id: CommandId::new(),
            device: command.device,
            model: command.model,
            brand: command.brand,
            command: command.command,
            status: CommandStatus::Pending,
            created_at: time::now(),
            processed_at: None,
            error_message: None,
        }
    }
}

/// Final outcome of dispatching one command, fed into `mark_complete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed,
    Failed(String),
}

impl CompletionOutcome {
    /// The terminal status this outcome maps to.
    #[must_use]
    pub fn status(&self) -> CommandStatus {
        match self {
            Self::Completed => CommandStatus::Completed,
            Self::Failed(_) => CommandStatus::Failed,
        }
    }

    /// The error message to record, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Completed => None,
            Self::Failed(message) => Some(message),
        }
    }
}
