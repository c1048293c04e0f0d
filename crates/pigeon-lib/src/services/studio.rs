// Studio session
// Wires one gateway and one credential gate into the built-in panels

use std::sync::Arc;

use crate::services::credential::{CredentialGate, CredentialHost};
use crate::services::gateway::{create_gateway, GatewayResult, SharedGateway};
use crate::services::panels::{GenerationPanel, PanelConfig};
use crate::utils::config::StudioConfig;

/// All panels of one page visit. Panels are independent of each other and
/// share only the credential gate.
pub struct Studio {
    gate: CredentialGate,
    panels: Vec<GenerationPanel>,
}

impl Studio {
    pub fn new(config: &StudioConfig, gateway: SharedGateway, host: Arc<dyn CredentialHost>) -> Self {
        let gate = CredentialGate::new(host);
        let panels = PanelConfig::builtins()
            .into_iter()
            .map(|panel| GenerationPanel::new(panel, gateway.clone(), config.poll, gate.clone()))
            .collect();
        Self { gate, panels }
    }

    /// Build the hosted gateway from config and the configured studio key
    pub fn connect(config: &StudioConfig, host: Arc<dyn CredentialHost>) -> GatewayResult<Self> {
        let gateway = create_gateway(config.gateway.clone(), config.api_key().map(str::to_string))?;
        log::info!(
            "[studio] connected to {} at {}",
            gateway.name(),
            config.gateway.endpoint
        );
        Ok(Self::new(config, gateway, host))
    }

    /// Query the host for a key once at session start
    pub async fn start(&self) -> bool {
        self.gate.initialize().await
    }

    pub fn gate(&self) -> &CredentialGate {
        &self.gate
    }

    pub fn panels(&self) -> &[GenerationPanel] {
        &self.panels
    }

    pub fn panel(&self, id: &str) -> Option<&GenerationPanel> {
        self.panels.iter().find(|panel| panel.config().id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationResult;
    use crate::services::credential::tests::FakeHost;
    use crate::services::credential::CredentialPrompt;
    use crate::services::gateway::GatewayError;
    use crate::services::lifecycle::LifecycleState;
    use crate::services::panels::PanelOutcome;
    use crate::services::test_support::FakeGateway;

    #[tokio::test]
    async fn test_panels_share_gate_but_not_state() {
        let gateway = Arc::new(FakeGateway::completing(GenerationResult::text("concept")));
        let studio = Studio::new(&StudioConfig::default(), gateway, Arc::new(FakeHost::default()));

        assert!(!studio.start().await);
        assert_eq!(studio.gate().prompt().await, Some(CredentialPrompt::Blocking));
        assert_eq!(studio.panels().len(), PanelConfig::builtins().len());

        let concept = studio.panel("concept_lab").unwrap();
        assert_eq!(concept.trigger("A fintech rebrand").await, PanelOutcome::Started);

        let reel = studio.panel("motion_reel").unwrap();
        assert_eq!(reel.trigger("neon city").await, PanelOutcome::CredentialRequired);
        assert_eq!(reel.controller().state().await, LifecycleState::Idle);

        studio.gate().request_credential_selection().await.unwrap();
        assert!(studio.gate().has_credential().await);
    }

    #[test]
    fn test_connect_requires_key() {
        let result = Studio::connect(&StudioConfig::default(), Arc::new(FakeHost::default()));
        assert!(matches!(result, Err(GatewayError::MissingCredential)));

        let config = StudioConfig::default().with_api_key("studio-key");
        let studio = Studio::connect(&config, Arc::new(FakeHost::default())).unwrap();
        assert!(studio.panel("trend_radar").is_some());
    }
}
