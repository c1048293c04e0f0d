// Lifecycle states and failure classification

use serde::{Deserialize, Serialize};

use crate::models::GenerationResult;
use crate::services::gateway::GatewayError;
use crate::services::recording::CaptureError;
use crate::utils::polling::PollPolicy;

pub const CREDENTIAL_REQUIRED_MESSAGE: &str =
    "A studio key is required for this feature. Select a key to continue.";

pub const GENERIC_FAILURE_MESSAGE: &str =
    "Uh oh, the creative wires got crossed. Try again or contact our human directors!";

/// State of one controller
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Submitting,
    /// Waiting on a long-running operation; `attempts` status checks so far
    Polling {
        attempts: u32,
    },
    Succeeded(GenerationResult),
    Failed(GenerationFailure),
}

impl LifecycleState {
    /// A gateway exchange is outstanding
    pub fn is_pending(&self) -> bool {
        matches!(self, LifecycleState::Submitting | LifecycleState::Polling { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Succeeded(_) | LifecycleState::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Submitting => "submitting",
            LifecycleState::Polling { .. } => "polling",
            LifecycleState::Succeeded(_) => "succeeded",
            LifecycleState::Failed(_) => "failed",
        }
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        match self {
            LifecycleState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&GenerationFailure> {
        match self {
            LifecycleState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Studio key missing or unusable
    CredentialRequired,
    /// Any other gateway failure
    Generic,
    /// Local device or permission problem, never reached the gateway
    LocalResource,
    /// Polling budget exhausted
    TimedOut,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::CredentialRequired => "CREDENTIAL_REQUIRED",
            FailureKind::Generic => "GENERATION_FAILED",
            FailureKind::LocalResource => "LOCAL_RESOURCE",
            FailureKind::TimedOut => "GENERATION_TIMED_OUT",
        }
    }
}

/// Classified, user-facing failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Underlying error text, for logs only
    pub detail: Option<String>,
}

impl GenerationFailure {
    /// Classify a gateway error, using `generic_message` for non-credential failures
    pub fn from_gateway_error(err: &GatewayError, generic_message: &str) -> Self {
        if err.is_credential_error() {
            Self {
                kind: FailureKind::CredentialRequired,
                message: CREDENTIAL_REQUIRED_MESSAGE.to_string(),
                detail: Some(err.to_string()),
            }
        } else {
            Self {
                kind: FailureKind::Generic,
                message: generic_message.to_string(),
                detail: Some(err.to_string()),
            }
        }
    }

    pub fn generic(generic_message: &str, detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Generic,
            message: generic_message.to_string(),
            detail: Some(detail.into()),
        }
    }

    pub fn timed_out(policy: &PollPolicy) -> Self {
        Self {
            kind: FailureKind::TimedOut,
            message: format!(
                "Generation timed out after {} seconds. Please try again.",
                policy.budget().as_secs()
            ),
            detail: Some(format!("{} poll attempts exhausted", policy.max_attempts)),
        }
    }

    pub fn local_resource(err: &CaptureError) -> Self {
        Self {
            kind: FailureKind::LocalResource,
            message: err.user_message().to_string(),
            detail: Some(err.to_string()),
        }
    }

    pub fn is_credential_required(&self) -> bool {
        self.kind == FailureKind::CredentialRequired
    }
}
