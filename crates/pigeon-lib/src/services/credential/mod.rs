// Credential Gate
//
// Reflects whether a studio key is selected and drives the host's selection
// flow. Premium panels check the gate before submitting; the gate itself never
// blocks gateway calls.

pub mod key_store;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

pub use key_store::{EnvKeyPrompt, KeyPrompt, KeyStore, KeyStoreHost};

use crate::services::crypto::CryptoError;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Key selection failed: {0}")]
    SelectionFailed(String),

    #[error("Key storage error: {0}")]
    Storage(String),

    #[error("Key sealing error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CredentialResult<T> = Result<T, CredentialError>;

/// Host environment that owns key selection
#[async_trait]
pub trait CredentialHost: Send + Sync {
    async fn has_selected_key(&self) -> bool;

    /// Open the host's selection flow. Returning Ok does not guarantee that
    /// a key was actually chosen.
    async fn open_select_key(&self) -> CredentialResult<()>;
}

/// How the missing-key prompt is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPrompt {
    /// First load without a key
    Blocking,
    Dismissible,
}

#[derive(Debug, Default)]
struct GateState {
    initialized: bool,
    has_key: bool,
    prompt: Option<CredentialPrompt>,
}

struct GateInner {
    host: Arc<dyn CredentialHost>,
    state: RwLock<GateState>,
}

/// Shared handle to the session's credential state
#[derive(Clone)]
pub struct CredentialGate {
    inner: Arc<GateInner>,
}

impl CredentialGate {
    pub fn new(host: Arc<dyn CredentialHost>) -> Self {
        Self {
            inner: Arc::new(GateInner {
                host,
                state: RwLock::new(GateState::default()),
            }),
        }
    }

    /// Query the host once per session
    pub async fn initialize(&self) -> bool {
        let mut state = self.inner.state.write().await;
        if state.initialized {
            return state.has_key;
        }
        state.initialized = true;
        state.has_key = self.inner.host.has_selected_key().await;
        state.prompt = (!state.has_key).then_some(CredentialPrompt::Blocking);

        log::info!("[credential] session start, key selected: {}", state.has_key);
        state.has_key
    }

    pub async fn has_credential(&self) -> bool {
        self.inner.state.read().await.has_key
    }

    pub async fn prompt(&self) -> Option<CredentialPrompt> {
        self.inner.state.read().await.prompt
    }

    /// Hide a dismissible prompt. A blocking prompt stays.
    pub async fn dismiss_prompt(&self) {
        let mut state = self.inner.state.write().await;
        if state.prompt == Some(CredentialPrompt::Dismissible) {
            state.prompt = None;
        }
    }

    /// Run the host selection flow, then treat the key as present without
    /// re-checking. The host's own confirmation can lag behind its return.
    pub async fn request_credential_selection(&self) -> CredentialResult<()> {
        if let Err(e) = self.inner.host.open_select_key().await {
            log::warn!("[credential] key selection failed: {}", e);
            return Err(e);
        }

        let mut state = self.inner.state.write().await;
        state.initialized = true;
        state.has_key = true;
        state.prompt = None;
        Ok(())
    }

    /// Called when a request comes back as credential-required
    pub async fn invalidate(&self) {
        let mut state = self.inner.state.write().await;
        state.has_key = false;
        state.prompt = Some(CredentialPrompt::Dismissible);
        log::info!("[credential] studio key invalidated");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Host double with a switchable answer
    #[derive(Default)]
    pub(crate) struct FakeHost {
        pub selected: AtomicBool,
        pub queries: AtomicUsize,
        pub selections: AtomicUsize,
        pub fail_selection: bool,
        /// Host confirmation lags, so selecting does not flip `selected`
        pub lagging: bool,
    }

    impl FakeHost {
        pub fn with_key() -> Self {
            Self {
                selected: AtomicBool::new(true),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl CredentialHost for FakeHost {
        async fn has_selected_key(&self) -> bool {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.selected.load(Ordering::SeqCst)
        }

        async fn open_select_key(&self) -> CredentialResult<()> {
            self.selections.fetch_add(1, Ordering::SeqCst);
            if self.fail_selection {
                return Err(CredentialError::SelectionFailed("dialog crashed".to_string()));
            }
            if !self.lagging {
                self.selected.store(true, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_missing_key_on_first_load_blocks() {
        let gate = CredentialGate::new(Arc::new(FakeHost::default()));
        assert!(!gate.initialize().await);
        assert!(!gate.has_credential().await);
        assert_eq!(gate.prompt().await, Some(CredentialPrompt::Blocking));

        gate.dismiss_prompt().await;
        assert_eq!(gate.prompt().await, Some(CredentialPrompt::Blocking));
    }

    #[tokio::test]
    async fn test_initialize_queries_host_once() {
        let host = Arc::new(FakeHost::with_key());
        let gate = CredentialGate::new(host.clone());
        assert!(gate.initialize().await);
        assert!(gate.initialize().await);
        assert_eq!(host.queries.load(Ordering::SeqCst), 1);
        assert_eq!(gate.prompt().await, None);
    }

    #[tokio::test]
    async fn test_selection_is_optimistic_even_when_host_lags() {
        let host = Arc::new(FakeHost {
            lagging: true,
            ..Default::default()
        });
        let gate = CredentialGate::new(host.clone());
        gate.initialize().await;

        gate.request_credential_selection().await.unwrap();
        assert!(gate.has_credential().await);
        assert_eq!(gate.prompt().await, None);
        assert!(!host.selected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failed_selection_leaves_state() {
        let gate = CredentialGate::new(Arc::new(FakeHost {
            fail_selection: true,
            ..Default::default()
        }));
        gate.initialize().await;

        assert!(gate.request_credential_selection().await.is_err());
        assert!(!gate.has_credential().await);
        assert_eq!(gate.prompt().await, Some(CredentialPrompt::Blocking));
    }

    #[tokio::test]
    async fn test_invalidate_makes_prompt_dismissible() {
        let gate = CredentialGate::new(Arc::new(FakeHost::with_key()));
        gate.initialize().await;

        gate.invalidate().await;
        assert!(!gate.has_credential().await);
        assert_eq!(gate.prompt().await, Some(CredentialPrompt::Dismissible));

        gate.dismiss_prompt().await;
        assert_eq!(gate.prompt().await, None);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let gate = CredentialGate::new(Arc::new(FakeHost::default()));
        let panel_view = gate.clone();
        gate.initialize().await;
        gate.request_credential_selection().await.unwrap();
        assert!(panel_view.has_credential().await);
    }
}
