// Scripted gateway shared by the service tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::models::{GenerationRequest, GenerationResult, OperationHandle, ResultRef};
use crate::services::gateway::{
    GatewayError, GatewayResponse, GatewayResult, GenerationGateway, OperationStatus,
};

pub enum SubmitScript {
    Complete(GenerationResult),
    Pending(String),
    Fail(fn() -> GatewayError),
}

pub struct FakeGateway {
    submit: SubmitScript,
    statuses: Mutex<VecDeque<OperationStatus>>,
    resolved_bytes: Vec<u8>,
    submit_gate: Option<Arc<Notify>>,
    status_gate: Option<Arc<Notify>>,
    requests: Mutex<Vec<GenerationRequest>>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new(submit: SubmitScript) -> Self {
        Self {
            submit,
            statuses: Mutex::new(VecDeque::new()),
            resolved_bytes: Vec::new(),
            submit_gate: None,
            status_gate: None,
            requests: Mutex::new(Vec::new()),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            resolve_calls: AtomicUsize::new(0),
        }
    }

    pub fn completing(result: GenerationResult) -> Self {
        Self::new(SubmitScript::Complete(result))
    }

    /// Every status check reports not-done unless scripted otherwise
    pub fn pending(handle: &str) -> Self {
        Self::new(SubmitScript::Pending(handle.to_string()))
    }

    pub fn failing(error: fn() -> GatewayError) -> Self {
        Self::new(SubmitScript::Fail(error))
    }

    pub fn with_statuses(self, statuses: Vec<OperationStatus>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_resolved_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.resolved_bytes = bytes;
        self
    }

    /// Hold `generate_content` until `release_submit`
    pub fn with_submit_gate(mut self) -> Self {
        self.submit_gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Hold `get_operation_status` until `release_status`
    pub fn with_status_gate(mut self) -> Self {
        self.status_gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn release_submit(&self) {
        if let Some(gate) = &self.submit_gate {
            gate.notify_one();
        }
    }

    pub fn release_status(&self) {
        if let Some(gate) = &self.status_gate {
            gate.notify_one();
        }
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationGateway for FakeGateway {
    fn name(&self) -> &str {
        "Fake"
    }

    async fn generate_content(&self, request: &GenerationRequest) -> GatewayResult<GatewayResponse> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }
        match &self.submit {
            SubmitScript::Complete(result) => Ok(GatewayResponse::Completed(result.clone())),
            SubmitScript::Pending(handle) => Ok(GatewayResponse::Pending(OperationHandle(handle.clone()))),
            SubmitScript::Fail(error) => Err(error()),
        }
    }

    async fn get_operation_status(&self, _handle: &OperationHandle) -> GatewayResult<OperationStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.status_gate {
            gate.notified().await;
        }
        let next = self.statuses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(OperationStatus::pending))
    }

    async fn resolve_result(&self, _result_ref: &ResultRef) -> GatewayResult<Vec<u8>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.resolved_bytes.clone())
    }
}
