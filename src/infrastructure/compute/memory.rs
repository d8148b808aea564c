//! Scripted processing backend for tests.

use super::{ProcessingBackend, ProcessingOutcome, ProcessingRequest, ProcessingStatus};
use crate::common::error::{DeepSeaError, Result};
use crate::modules::jobs::model::JobStatus;
use crate::modules::jobs::service::JobCache;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct ScriptedBackend {
    outcome: std::result::Result<ProcessingOutcome, String>,
    requests: Arc<Mutex<Vec<ProcessingRequest>>>,
    observer: Option<(JobCache, String)>,
    observed: Arc<Mutex<Option<JobStatus>>>,
}

impl ScriptedBackend {
    pub fn succeeding() -> Self {
        Self::with_outcome(ProcessingOutcome {
            status: ProcessingStatus::Completed,
            failure_reason: None,
        })
    }

    pub fn failing(reason: &str) -> Self {
        Self::with_outcome(ProcessingOutcome {
            status: ProcessingStatus::Failed,
            failure_reason: Some(reason.to_string()),
        })
    }

    /// The run itself errors before any terminal status is seen.
    pub fn erroring(message: &str) -> Self {
        Self::with(Err(message.to_string()))
    }

    fn with_outcome(outcome: ProcessingOutcome) -> Self {
        Self::with(Ok(outcome))
    }

    fn with(outcome: std::result::Result<ProcessingOutcome, String>) -> Self {
        Self {
            outcome,
            requests: Arc::default(),
            observer: None,
            observed: Arc::default(),
        }
    }

    /// Records the cached status of `job` at the moment the run starts.
    pub fn observing(mut self, cache: JobCache, job: &str) -> Self {
        self.observer = Some((cache, job.to_string()));
        self
    }

    pub fn observed(&self) -> Option<JobStatus> {
        *self.observed.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<ProcessingRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessingBackend for ScriptedBackend {
    async fn run(&self, request: &ProcessingRequest) -> Result<ProcessingOutcome> {
        if let Some((cache, job)) = &self.observer {
            let status = cache.get_job(job).await?.map(|j| j.status);
            *self.observed.lock().unwrap() = status;
        }
        self.requests.lock().unwrap().push(request.clone());
        self.outcome.clone().map_err(DeepSeaError::Compute)
    }
}
