// Request Lifecycle Controller
//
// Drives one generation request from submission to a terminal state:
//   Idle -> Submitting -> Polling* -> Succeeded | Failed
// At most one gateway exchange is outstanding per controller. Cancellation is
// client-side only: the network call keeps running and its answer is dropped.

pub mod presenter;
pub mod state;

use std::convert::Infallible;

use tokio::sync::Mutex;

pub use presenter::{present, ProgressStage, ResultView, ViewAffordance};
pub use state::{
    FailureKind, GenerationFailure, LifecycleState, CREDENTIAL_REQUIRED_MESSAGE,
    GENERIC_FAILURE_MESSAGE,
};

use crate::models::{
    AudioBuffer, GenerationKind, GenerationOperation, GenerationRequest, GenerationResult,
    ImageData, ResultRef, VideoBlob,
};
use crate::services::gateway::{GatewayResponse, SharedGateway};
use crate::utils::polling::{poll_until, PollOutcome, PollPolicy, PollStep};

const VIDEO_MIME_TYPE: &str = "video/mp4";

/// Answer to a `submit` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Request went to the gateway
    Accepted,
    /// Another request is still in flight; nothing changed
    Busy,
    /// Empty prompt or recording; nothing changed
    Blank,
}

#[derive(Debug, Default)]
struct ControllerInner {
    state: LifecycleState,
    operation: Option<GenerationOperation>,
    request: Option<GenerationRequest>,
    /// Bumped on every submit and cancel; responses tagged with an older
    /// epoch are stale and ignored
    epoch: u64,
}

impl ControllerInner {
    fn finish(&mut self, state: LifecycleState) {
        self.state = state;
        self.operation = None;
    }
}

/// Outcome of one status check, computed without holding the lock
enum Tick {
    Pending,
    Done(GenerationResult),
    Failed(GenerationFailure),
}

/// Lifecycle controller for one panel
pub struct GenerationController {
    gateway: SharedGateway,
    policy: PollPolicy,
    generic_message: String,
    inner: Mutex<ControllerInner>,
}

impl GenerationController {
    pub fn new(gateway: SharedGateway, policy: PollPolicy) -> Self {
        Self {
            gateway,
            policy,
            generic_message: GENERIC_FAILURE_MESSAGE.to_string(),
            inner: Mutex::new(ControllerInner::default()),
        }
    }

    /// Override the message shown for non-credential gateway failures
    pub fn with_generic_message(mut self, message: impl Into<String>) -> Self {
        self.generic_message = message.into();
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub async fn state(&self) -> LifecycleState {
        self.inner.lock().await.state.clone()
    }

    /// In-flight long-running operation, if any
    pub async fn operation(&self) -> Option<GenerationOperation> {
        self.inner.lock().await.operation.clone()
    }

    pub async fn current_request(&self) -> Option<GenerationRequest> {
        self.inner.lock().await.request.clone()
    }

    /// Submit a request. Valid from Idle or a terminal state; while a request
    /// is Submitting or Polling this returns `Busy` and changes nothing.
    pub async fn submit(&self, request: GenerationRequest) -> SubmitOutcome {
        let epoch = {
            let mut inner = self.inner.lock().await;
            if inner.state.is_pending() {
                log::debug!("[lifecycle] submit ignored, request already {}", inner.state.label());
                return SubmitOutcome::Busy;
            }
            if request.is_blank() {
                return SubmitOutcome::Blank;
            }
            inner.epoch += 1;
            inner.state = LifecycleState::Submitting;
            inner.operation = None;
            inner.request = Some(request.clone());
            inner.epoch
        };

        log::info!(
            "[lifecycle] submitting {} request {} via {}",
            request.kind(),
            request.id(),
            self.gateway.name()
        );
        let response = self.gateway.generate_content(&request).await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            log::debug!("[lifecycle] dropping stale response for request {}", request.id());
            return SubmitOutcome::Accepted;
        }

        match response {
            Ok(GatewayResponse::Completed(result)) => {
                log::info!("[lifecycle] {} request {} succeeded", request.kind(), request.id());
                inner.finish(LifecycleState::Succeeded(result));
            }
            Ok(GatewayResponse::Pending(handle)) => {
                log::info!("[lifecycle] request {} queued as {}", request.id(), handle.as_str());
                inner.operation = Some(GenerationOperation::pending(handle));
                inner.state = LifecycleState::Polling { attempts: 0 };
            }
            Err(err) => {
                log::warn!("[lifecycle] request {} failed: {}", request.id(), err);
                let failure = GenerationFailure::from_gateway_error(&err, &self.generic_message);
                inner.finish(LifecycleState::Failed(failure));
            }
        }
        SubmitOutcome::Accepted
    }

    /// One polling tick: a single status query, plus the download when the
    /// operation is done. Outside Polling this does nothing.
    pub async fn poll(&self) -> LifecycleState {
        let (epoch, handle, kind) = {
            let inner = self.inner.lock().await;
            let (LifecycleState::Polling { .. }, Some(operation)) = (&inner.state, &inner.operation)
            else {
                return inner.state.clone();
            };
            let kind = inner
                .request
                .as_ref()
                .map(|r| r.kind())
                .unwrap_or(GenerationKind::Video);
            (inner.epoch, operation.handle.clone(), kind)
        };

        let tick = match self.gateway.get_operation_status(&handle).await {
            Err(err) => {
                log::warn!("[lifecycle] status check for {} failed: {}", handle.as_str(), err);
                Tick::Failed(GenerationFailure::from_gateway_error(&err, &self.generic_message))
            }
            Ok(status) if !status.done => Tick::Pending,
            Ok(status) => match (status.error, status.result_ref) {
                (Some(error), _) => Tick::Failed(GenerationFailure::generic(&self.generic_message, error)),
                (None, Some(result_ref)) => self.resolve(epoch, kind, result_ref).await,
                (None, None) => Tick::Failed(GenerationFailure::generic(
                    &self.generic_message,
                    "operation finished without a result",
                )),
            },
        };

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            log::debug!("[lifecycle] dropping stale status for {}", handle.as_str());
            return inner.state.clone();
        }

        match tick {
            Tick::Pending => {
                let attempts = match inner.state {
                    LifecycleState::Polling { attempts } => attempts + 1,
                    _ => 1,
                };
                if attempts >= self.policy.max_attempts {
                    log::warn!(
                        "[lifecycle] {} still running after {} checks, giving up",
                        handle.as_str(),
                        attempts
                    );
                    inner.finish(LifecycleState::Failed(GenerationFailure::timed_out(&self.policy)));
                } else {
                    inner.state = LifecycleState::Polling { attempts };
                }
            }
            Tick::Done(result) => {
                log::info!("[lifecycle] {} resolved", handle.as_str());
                inner.finish(LifecycleState::Succeeded(result));
            }
            Tick::Failed(failure) => inner.finish(LifecycleState::Failed(failure)),
        }
        inner.state.clone()
    }

    /// Mark the operation done and download its payload
    async fn resolve(&self, epoch: u64, kind: GenerationKind, result_ref: ResultRef) -> Tick {
        {
            let mut inner = self.inner.lock().await;
            if inner.epoch != epoch {
                return Tick::Pending;
            }
            if let Some(operation) = inner.operation.as_mut() {
                operation.done = true;
                operation.result_ref = Some(result_ref.clone());
            }
        }

        match self.gateway.resolve_result(&result_ref).await {
            Ok(bytes) => Tick::Done(result_from_bytes(kind, bytes, &result_ref)),
            Err(err) => {
                log::warn!("[lifecycle] download of {} failed: {}", result_ref.as_str(), err);
                Tick::Failed(GenerationFailure::from_gateway_error(&err, &self.generic_message))
            }
        }
    }

    /// Abandon the in-flight request. Returns false when nothing was pending.
    pub async fn cancel(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.state.is_pending() {
            return false;
        }
        inner.epoch += 1;
        inner.state = LifecycleState::Idle;
        inner.operation = None;
        inner.request = None;
        log::info!("[lifecycle] request cancelled");
        true
    }

    /// Record a failure that happened before any gateway call, such as a
    /// denied microphone. Ignored while a request is pending.
    pub async fn fail_locally(&self, failure: GenerationFailure) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state.is_pending() {
            return false;
        }
        log::warn!("[lifecycle] local failure: {}", failure.message);
        inner.request = None;
        inner.finish(LifecycleState::Failed(failure));
        true
    }

    /// Release a terminal result and go back to Idle
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state.is_terminal() {
            inner.state = LifecycleState::Idle;
            inner.request = None;
        }
    }

    /// Submit and keep polling on the policy interval until a terminal state
    /// (or a cancel) is reached.
    pub async fn run(&self, request: GenerationRequest) -> LifecycleState {
        if self.submit(request).await != SubmitOutcome::Accepted {
            return self.state().await;
        }
        self.await_completion().await
    }

    /// Drive an already submitted request through its polling phase
    pub async fn await_completion(&self) -> LifecycleState {
        let epoch = {
            let inner = self.inner.lock().await;
            if !matches!(inner.state, LifecycleState::Polling { .. }) {
                return inner.state.clone();
            }
            inner.epoch
        };

        let outcome = poll_until(&self.policy, move |_| async move {
            if self.inner.lock().await.epoch != epoch {
                return Ok::<_, Infallible>(PollStep::Ready(self.state().await));
            }
            match self.poll().await {
                LifecycleState::Polling { .. } => Ok(PollStep::Pending),
                state => Ok(PollStep::Ready(state)),
            }
        })
        .await;

        match outcome {
            PollOutcome::Ready(state) => state,
            PollOutcome::Failed(never) => match never {},
            PollOutcome::Exhausted { .. } => self.state().await,
        }
    }
}

fn result_from_bytes(kind: GenerationKind, bytes: Vec<u8>, result_ref: &ResultRef) -> GenerationResult {
    match kind {
        GenerationKind::Image => GenerationResult::Image(ImageData {
            mime_type: "image/png".to_string(),
            bytes,
        }),
        GenerationKind::Audio => GenerationResult::Audio(AudioBuffer::from_pcm16_le(&bytes, 24_000, 1)),
        GenerationKind::Text | GenerationKind::SearchGrounded | GenerationKind::Transcription => {
            GenerationResult::text(String::from_utf8_lossy(&bytes).into_owned())
        }
        GenerationKind::Video => GenerationResult::Video(VideoBlob {
            mime_type: VIDEO_MIME_TYPE.to_string(),
            bytes,
            source_uri: result_ref.as_str().to_string(),
        }),
    }
}
