//! The `[lyyti-participant-count]` shortcode.

use crate::cache::CountCache;
use crate::client::{self, Credentials, LyytiClient};
use crate::settings::{Setting, Settings};
use async_trait::async_trait;
use lyyti_host::{ShortcodeAttributes, ShortcodeHandler};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a participant count could not be resolved.
///
/// The display form of each variant is the sentinel string rendered in
/// place of the shortcode.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("ERROR_LYYTI_EID_UNDEFINED")]
    EventIdUndefined,

    #[error("ERROR_LYYTI_STATUS_UNDEFINED")]
    StatusUndefined,

    #[error("ERROR_LYYTI_API_CREDENTIALS_MISSING")]
    CredentialsMissing,

    #[error("ERROR_LYYTI_UNEXPECTED_API_RESPONSE")]
    UnexpectedApiResponse,
}

/// Resolves participant counts, cache first.
#[derive(Clone)]
pub struct ParticipantCountShortcode {
    settings: Settings,
    cache: CountCache,
    client: LyytiClient,
}

impl ParticipantCountShortcode {
    pub fn new(settings: Settings, cache: CountCache, client: LyytiClient) -> Self {
        Self {
            settings,
            cache,
            client,
        }
    }

    /// Effective `(eid, status)` after applying configured defaults.
    pub fn effective_parameters(&self, attributes: &ShortcodeAttributes) -> (String, String) {
        let mut merged = attributes.with_defaults([
            ("eid", self.settings.get(Setting::DefaultEventId)),
            ("status", self.settings.get(Setting::DefaultStatusFilter)),
        ]);
        (
            merged.remove("eid").unwrap_or_default(),
            merged.remove("status").unwrap_or_default(),
        )
    }

    /// Resolve the participant count for the given attributes.
    pub async fn resolve(&self, attributes: &ShortcodeAttributes) -> Result<u64, ResolveError> {
        let (eid, status) = self.effective_parameters(attributes);
        if eid.is_empty() {
            return Err(ResolveError::EventIdUndefined);
        }
        if status.is_empty() {
            return Err(ResolveError::StatusUndefined);
        }

        if let Some(count) = self.cache.get(&eid, &status).await {
            debug!(eid = %eid, status = %status, count, "Participant count served from cache");
            return Ok(count);
        }

        let credentials = Credentials::new(
            self.settings.get(Setting::ApiPublicKey),
            self.settings.get(Setting::ApiPrivateKey),
        );
        if !credentials.is_complete() {
            return Err(ResolveError::CredentialsMissing);
        }

        let body = self
            .client
            .get(&credentials, &client::participants_path(&eid, &status))
            .await
            .map_err(|e| {
                warn!(eid = %eid, status = %status, error = %e, "Lyyti API request failed");
                ResolveError::UnexpectedApiResponse
            })?;

        let count = client::results_count(&body).ok_or_else(|| {
            warn!(eid = %eid, status = %status, "Lyyti API response has no usable results_count");
            ResolveError::UnexpectedApiResponse
        })?;

        self.cache
            .set(&eid, &status, count, self.settings.cache_lifetime())
            .await;
        Ok(count)
    }
}

#[async_trait]
impl ShortcodeHandler for ParticipantCountShortcode {
    async fn render(&self, attributes: &ShortcodeAttributes) -> String {
        match self.resolve(attributes).await {
            Ok(count) => count.to_string(),
            Err(e) => e.to_string(),
        }
    }
}
