// Services module
// Generation lifecycle, gateway, credential gate and the panels built on them

pub mod credential;
pub mod crypto;
pub mod gateway;
pub mod inquiry;
pub mod lifecycle;
pub mod panels;
pub mod recording;
pub mod studio;

#[cfg(test)]
pub(crate) mod test_support;

pub use credential::{CredentialError, CredentialGate, CredentialHost, CredentialPrompt};
pub use gateway::{create_gateway, GatewayError, GenerationGateway, SharedGateway};
pub use inquiry::{InquiryDesk, InquiryError, InquiryReceipt};
pub use lifecycle::{
    present, FailureKind, GenerationController, GenerationFailure, LifecycleState, ResultView,
    SubmitOutcome,
};
pub use panels::{GenerationPanel, PanelConfig, PanelOutcome};
pub use recording::{AudioCapture, CaptureError, VoiceBriefRecorder};
pub use studio::Studio;
