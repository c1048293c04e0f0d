// Generation Panels
//
// Each AI feature on the services page is one panel: a config (kind, model
// options, prompt template, error copy) wired to its own lifecycle controller
// and the shared credential gate.

use std::sync::Arc;

use crate::models::{GenerationKind, GenerationRequest, ModelOptions};
use crate::services::credential::CredentialGate;
use crate::services::gateway::SharedGateway;
use crate::services::lifecycle::{
    present, GenerationController, GenerationFailure, LifecycleState, ResultView, SubmitOutcome,
    GENERIC_FAILURE_MESSAGE,
};
use crate::services::recording::{AudioCapture, VoiceBriefRecorder};
use crate::utils::polling::PollPolicy;

const PROMPT_PLACEHOLDER: &str = "{prompt}";

const CONCEPT_TEMPLATE: &str = "You are a creative director at Pigeon Studio, an animation agency. \
A client wants a creative concept for: \"{prompt}\". \
Provide a short, punchy 3-step animation concept (Hook, Story, Visual Style) \
that uses modern motion design trends.";

const KEYFRAME_TEMPLATE: &str = "A cinematic keyframe for an animated brand film: {prompt}. \
Bold shapes, rich lighting, contemporary motion design style.";

const NARRATION_TEMPLATE: &str = "Say with warm, confident energy: {prompt}";

const REEL_TEMPLATE: &str = "A short animated brand reel: {prompt}. \
Smooth camera moves, playful character animation, clean modern look.";

const TREND_TEMPLATE: &str = "What are the latest animation and motion design trends for {prompt}? \
Summarize the three most relevant ones in a sentence each.";

/// Static description of one panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    pub id: String,
    pub title: String,
    pub kind: GenerationKind,
    pub options: ModelOptions,
    /// `{prompt}` is replaced with the user's input; None sends it verbatim
    pub prompt_template: Option<String>,
    pub generic_error: String,
    /// Checked against the credential gate before any gateway call
    pub requires_credential: bool,
}

impl PanelConfig {
    fn new(id: &str, title: &str, kind: GenerationKind) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind,
            options: ModelOptions::default(),
            prompt_template: None,
            generic_error: GENERIC_FAILURE_MESSAGE.to_string(),
            requires_credential: kind.is_premium(),
        }
    }

    fn template(mut self, template: &str) -> Self {
        self.prompt_template = Some(template.to_string());
        self
    }

    fn options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    fn generic_error(mut self, message: &str) -> Self {
        self.generic_error = message.to_string();
        self
    }

    /// Creative concept brief
    pub fn concept_lab() -> Self {
        Self::new("concept_lab", "AI Concept Lab", GenerationKind::Text)
            .template(CONCEPT_TEMPLATE)
            .options(ModelOptions {
                temperature: Some(0.8),
                ..Default::default()
            })
    }

    pub fn keyframe_studio() -> Self {
        Self::new("keyframe_studio", "Keyframe Studio", GenerationKind::Image)
            .template(KEYFRAME_TEMPLATE)
            .options(ModelOptions {
                aspect_ratio: Some("16:9".to_string()),
                ..Default::default()
            })
            .generic_error("The keyframe didn't render. Try a different description.")
    }

    pub fn voice_narration() -> Self {
        Self::new("voice_narration", "Voice Narration", GenerationKind::Audio)
            .template(NARRATION_TEMPLATE)
            .options(ModelOptions {
                voice: Some("Kore".to_string()),
                ..Default::default()
            })
    }

    pub fn motion_reel() -> Self {
        Self::new("motion_reel", "Motion Reel", GenerationKind::Video)
            .template(REEL_TEMPLATE)
            .options(ModelOptions {
                aspect_ratio: Some("16:9".to_string()),
                resolution: Some("720p".to_string()),
                ..Default::default()
            })
            .generic_error("The reel didn't make it out of the render farm. Please try again.")
    }

    pub fn trend_radar() -> Self {
        Self::new("trend_radar", "Trend Radar", GenerationKind::SearchGrounded)
            .template(TREND_TEMPLATE)
    }

    pub fn voice_brief() -> Self {
        Self::new("voice_brief", "Voice Brief", GenerationKind::Transcription)
            .generic_error("We couldn't make out that brief. Try recording it again.")
    }

    pub fn builtins() -> Vec<PanelConfig> {
        vec![
            Self::concept_lab(),
            Self::keyframe_studio(),
            Self::voice_narration(),
            Self::motion_reel(),
            Self::trend_radar(),
            Self::voice_brief(),
        ]
    }

    pub fn by_id(id: &str) -> Option<PanelConfig> {
        Self::builtins().into_iter().find(|config| config.id == id)
    }

    /// Fill the template with the user's input
    pub fn render_prompt(&self, input: &str) -> String {
        match &self.prompt_template {
            Some(template) => template.replace(PROMPT_PLACEHOLDER, input.trim()),
            None => input.trim().to_string(),
        }
    }

    pub fn build_request(&self, input: &str) -> GenerationRequest {
        GenerationRequest::from_prompt(self.kind, self.render_prompt(input))
            .with_options(self.options.clone())
    }
}

/// What a trigger did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelOutcome {
    /// The request ran; `view()` shows where it ended up
    Started,
    /// A request is already in flight
    Busy,
    /// Nothing to send
    Blank,
    /// No studio key; the gateway was not called
    CredentialRequired,
    /// The recording device failed; the gateway was not called
    LocalFailure,
}

pub struct GenerationPanel {
    config: PanelConfig,
    controller: Arc<GenerationController>,
    gate: CredentialGate,
}

impl GenerationPanel {
    pub fn new(
        config: PanelConfig,
        gateway: SharedGateway,
        policy: PollPolicy,
        gate: CredentialGate,
    ) -> Self {
        let controller = GenerationController::new(gateway, policy)
            .with_generic_message(config.generic_error.clone());
        Self {
            config,
            controller: Arc::new(controller),
            gate,
        }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn controller(&self) -> &Arc<GenerationController> {
        &self.controller
    }

    pub async fn view(&self) -> ResultView {
        present(&self.controller.state().await)
    }

    /// Validate, gate, submit and drive the request to a terminal state
    pub async fn trigger(&self, input: &str) -> PanelOutcome {
        if input.trim().is_empty() {
            return PanelOutcome::Blank;
        }
        self.run(self.config.build_request(input)).await
    }

    async fn run(&self, request: GenerationRequest) -> PanelOutcome {
        if self.controller.state().await.is_pending() {
            return PanelOutcome::Busy;
        }
        if self.config.requires_credential && !self.gate.has_credential().await {
            log::info!("[panel:{}] blocked, no studio key selected", self.config.id);
            return PanelOutcome::CredentialRequired;
        }

        match self.controller.submit(request).await {
            SubmitOutcome::Accepted => {}
            SubmitOutcome::Busy => return PanelOutcome::Busy,
            SubmitOutcome::Blank => return PanelOutcome::Blank,
        }

        let state = self.controller.await_completion().await;
        if let LifecycleState::Failed(failure) = &state {
            if failure.is_credential_required() {
                self.gate.invalidate().await;
            }
        }
        PanelOutcome::Started
    }

    /// Start capturing a voice brief
    pub async fn begin_voice_brief<C: AudioCapture>(
        &self,
        recorder: &mut VoiceBriefRecorder<C>,
    ) -> PanelOutcome {
        if self.controller.state().await.is_pending() {
            return PanelOutcome::Busy;
        }
        match recorder.start() {
            Ok(()) => {
                self.controller.reset().await;
                PanelOutcome::Started
            }
            Err(err) => {
                self.controller
                    .fail_locally(GenerationFailure::local_resource(&err))
                    .await;
                PanelOutcome::LocalFailure
            }
        }
    }

    /// Stop the recording and send it for transcription
    pub async fn record_and_transcribe<C: AudioCapture>(
        &self,
        recorder: &mut VoiceBriefRecorder<C>,
    ) -> PanelOutcome {
        let clip = match recorder.stop() {
            Ok(clip) => clip,
            Err(err) => {
                self.controller
                    .fail_locally(GenerationFailure::local_resource(&err))
                    .await;
                return PanelOutcome::LocalFailure;
            }
        };

        let request = GenerationRequest::transcription(clip).with_options(self.config.options.clone());
        if request.is_blank() {
            return PanelOutcome::Blank;
        }
        self.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenerationInput, GenerationResult};
    use crate::services::credential::tests::FakeHost;
    use crate::services::gateway::GatewayError;
    use crate::services::lifecycle::{FailureKind, CREDENTIAL_REQUIRED_MESSAGE};
    use crate::services::recording::tests::FakeCapture;
    use crate::services::recording::CaptureError;
    use crate::services::test_support::FakeGateway;
    use std::sync::atomic::Ordering;

    async fn gate_with_key(selected: bool) -> CredentialGate {
        let host = if selected { FakeHost::with_key() } else { FakeHost::default() };
        let gate = CredentialGate::new(Arc::new(host));
        gate.initialize().await;
        gate
    }

    fn panel(config: PanelConfig, gateway: Arc<FakeGateway>, gate: CredentialGate) -> GenerationPanel {
        GenerationPanel::new(config, gateway, PollPolicy::default(), gate)
    }

    #[test]
    fn test_builtin_ids_are_unique() {
        let configs = PanelConfig::builtins();
        let mut ids: Vec<_> = configs.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), configs.len());
        assert_eq!(PanelConfig::by_id("motion_reel").unwrap().kind, GenerationKind::Video);
        assert!(PanelConfig::by_id("nope").is_none());
    }

    #[test]
    fn test_premium_panels_require_credential() {
        assert!(PanelConfig::keyframe_studio().requires_credential);
        assert!(PanelConfig::motion_reel().requires_credential);
        assert!(!PanelConfig::concept_lab().requires_credential);
        assert!(!PanelConfig::voice_brief().requires_credential);
    }

    #[test]
    fn test_concept_prompt_template() {
        let config = PanelConfig::concept_lab();
        let request = config.build_request("  A fintech rebrand ");
        let prompt = request.prompt().unwrap();
        assert!(prompt.starts_with("You are a creative director at Pigeon Studio"));
        assert!(prompt.contains("\"A fintech rebrand\""));
        assert_eq!(request.options().temperature, Some(0.8));
    }

    #[tokio::test]
    async fn test_concept_lab_renders_text() {
        let gateway = Arc::new(FakeGateway::completing(GenerationResult::text(
            "Hook: coins take flight.",
        )));
        let panel = panel(PanelConfig::concept_lab(), gateway.clone(), gate_with_key(false).await);

        assert_eq!(panel.trigger("A fintech rebrand").await, PanelOutcome::Started);
        assert_eq!(
            panel.view().await,
            ResultView::Text {
                text: "Hook: coins take flight.".to_string(),
                sources: vec![],
            }
        );
        assert_eq!(gateway.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let gateway = Arc::new(FakeGateway::completing(GenerationResult::text("unused")));
        let panel = panel(PanelConfig::concept_lab(), gateway.clone(), gate_with_key(true).await);

        assert_eq!(panel.trigger("   ").await, PanelOutcome::Blank);
        assert_eq!(gateway.submit_calls(), 0);
        assert_eq!(panel.view().await, ResultView::Nothing);
    }

    #[tokio::test]
    async fn test_premium_panel_without_key_skips_gateway() {
        let gateway = Arc::new(FakeGateway::pending("operations/reel"));
        let panel = panel(PanelConfig::motion_reel(), gateway.clone(), gate_with_key(false).await);

        assert_eq!(panel.trigger("neon city").await, PanelOutcome::CredentialRequired);
        assert_eq!(gateway.submit_calls(), 0);
    }

    #[tokio::test]
    async fn test_not_found_invalidates_gate() {
        let gateway = Arc::new(FakeGateway::failing(|| {
            GatewayError::NotFound("Requested entity was not found.".to_string())
        }));
        let gate = gate_with_key(true).await;
        let panel = panel(PanelConfig::keyframe_studio(), gateway, gate.clone());

        assert_eq!(panel.trigger("a pigeon in a trench coat").await, PanelOutcome::Started);
        assert!(!gate.has_credential().await);
        let ResultView::Error { prompt_for_credential, .. } = panel.view().await else {
            panic!("expected error view");
        };
        assert!(prompt_for_credential);
    }

    #[tokio::test]
    async fn test_panel_generic_error_copy() {
        let gateway = Arc::new(FakeGateway::failing(|| GatewayError::RateLimited("quota".into())));
        let panel = panel(PanelConfig::keyframe_studio(), gateway, gate_with_key(true).await);

        panel.trigger("a pigeon").await;
        let ResultView::Error { message, kind, .. } = panel.view().await else {
            panic!("expected error view");
        };
        assert_eq!(kind, FailureKind::Generic);
        assert_eq!(message, "The keyframe didn't render. Try a different description.");
    }

    #[tokio::test]
    async fn test_voice_brief_not_found_requires_credential() {
        let gateway = Arc::new(FakeGateway::failing(|| {
            GatewayError::NotFound("Requested entity was not found.".to_string())
        }));
        let panel = panel(PanelConfig::voice_brief(), gateway.clone(), gate_with_key(true).await);
        let capture = FakeCapture::default();
        let held = capture.held.clone();
        let mut recorder = VoiceBriefRecorder::new(capture);

        assert_eq!(panel.begin_voice_brief(&mut recorder).await, PanelOutcome::Started);
        assert!(recorder.is_recording());
        assert_eq!(panel.record_and_transcribe(&mut recorder).await, PanelOutcome::Started);
        assert!(!held.load(Ordering::SeqCst));

        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        assert!(matches!(requests[0].input(), GenerationInput::Recording(_)));

        let ResultView::Error { message, .. } = panel.view().await else {
            panic!("expected error view");
        };
        assert_eq!(message, CREDENTIAL_REQUIRED_MESSAGE);
    }

    #[tokio::test]
    async fn test_denied_microphone_never_reaches_gateway() {
        let gateway = Arc::new(FakeGateway::completing(GenerationResult::text("unused")));
        let panel = panel(PanelConfig::voice_brief(), gateway.clone(), gate_with_key(true).await);
        let mut recorder = VoiceBriefRecorder::new(FakeCapture {
            start_error: Some(CaptureError::PermissionDenied),
            ..Default::default()
        });

        assert_eq!(panel.begin_voice_brief(&mut recorder).await, PanelOutcome::LocalFailure);
        assert_eq!(gateway.submit_calls(), 0);
        let ResultView::Error { kind, message, .. } = panel.view().await else {
            panic!("expected error view");
        };
        assert_eq!(kind, FailureKind::LocalResource);
        assert!(message.contains("microphone"));
    }

    #[tokio::test]
    async fn test_stop_without_recording_is_local_failure() {
        let gateway = Arc::new(FakeGateway::completing(GenerationResult::text("unused")));
        let panel = panel(PanelConfig::voice_brief(), gateway.clone(), gate_with_key(true).await);
        let mut recorder = VoiceBriefRecorder::new(FakeCapture::default());

        assert_eq!(panel.record_and_transcribe(&mut recorder).await, PanelOutcome::LocalFailure);
        assert_eq!(gateway.submit_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_motion_reel_with_key_polls_to_video() {
        use crate::models::ResultRef;
        use crate::services::gateway::OperationStatus;

        let gateway = Arc::new(
            FakeGateway::pending("operations/reel")
                .with_statuses(vec![OperationStatus::finished(ResultRef(
                    "https://cdn.example/reel.mp4".to_string(),
                ))])
                .with_resolved_bytes(vec![1, 2, 3]),
        );
        let panel = panel(PanelConfig::motion_reel(), gateway.clone(), gate_with_key(true).await);

        assert_eq!(panel.trigger("neon city").await, PanelOutcome::Started);
        let view = panel.view().await;
        assert!(matches!(view, ResultView::Video { .. }));
        let sent = gateway.requests();
        assert_eq!(sent[0].options().resolution.as_deref(), Some("720p"));
    }
}
