use serde::Deserialize;
use url::Url;

use crate::{
    app_constants::RENDERER_CRASH_MESSAGE, origin_policy, surfaces::SurfaceTarget,
    task::TaskRequest,
};

/// A failed navigation reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoadFailure {
    pub url: String,
    pub code: i32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryPlan {
    /// Not ours (e.g. a third-party subresource); leave the window alone.
    Ignore,
    ShowOffline { log: TaskRequest },
}

/// Decides what a load failure, retry or crash does to the main window.
#[derive(Debug)]
pub struct OfflineRecoveryController {
    trusted_origin: Url,
    retry_attempts: u32,
}

impl OfflineRecoveryController {
    pub fn new(trusted_origin: Url) -> Self {
        Self {
            trusted_origin,
            retry_attempts: 0,
        }
    }

    pub fn trusted_origin(&self) -> &Url {
        &self.trusted_origin
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    pub fn plan_for_load_failure(&self, failure: &LoadFailure) -> RecoveryPlan {
        if !origin_policy::is_trusted_url(&failure.url, &self.trusted_origin) {
            return RecoveryPlan::Ignore;
        }

        RecoveryPlan::ShowOffline {
            log: TaskRequest::log_error(
                format!("Page load failed: {}", failure.url),
                format!("Code: {}, Desc: {}", failure.code, failure.description),
            ),
        }
    }

    /// Where a user-initiated retry goes. Safe to call any number of times.
    pub fn retry_target(&mut self) -> SurfaceTarget {
        self.retry_attempts = self.retry_attempts.saturating_add(1);
        SurfaceTarget::Remote(self.trusted_origin.clone())
    }

    pub fn crash_log_request(&self) -> TaskRequest {
        TaskRequest::log_error(RENDERER_CRASH_MESSAGE, "")
    }
}
