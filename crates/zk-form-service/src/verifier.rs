//! Client for the external proof verification service

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use zkform_common::{AuthRequest, ClaimRequest, VerifiedResult, ZkFormApp};

use crate::config::EnvFlags;

/// App id every development build verifies against
pub const DEV_APP_ID: &str = "0x4c40e70b081752680ce258ad321f9e58";

/// Why a response could not be verified
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    #[error("Proof does not satisfy the app requirements: {0}")]
    RequirementMismatch(String),

    #[error("Verifier unavailable: {0}")]
    VerifierUnavailable(String),
}

/// Verification settings sent along with each response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationConfig {
    pub app_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault: Option<VaultConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultConfig {
    /// Identities accepted without a real vault proof
    pub impersonate: Vec<String>,
}

impl VerificationConfig {
    pub fn for_app(app: &ZkFormApp, flags: EnvFlags) -> Self {
        let app_id = if flags.is_dev {
            DEV_APP_ID.to_string()
        } else {
            app.app_id.clone()
        };

        let vault = flags.is_demo.then(|| VaultConfig {
            impersonate: app.impersonate_addresses.clone(),
        });

        Self { app_id, vault }
    }
}

/// Verifies a proof response against an app's requirements
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    async fn verify(
        &self,
        app: &ZkFormApp,
        response: &serde_json::Value,
    ) -> Result<VerifiedResult, VerifyError>;
}

#[derive(Serialize)]
struct VerifyPayload<'a> {
    config: VerificationConfig,
    response: &'a serde_json::Value,
    claims: &'a [ClaimRequest],
    auths: &'a [AuthRequest],
}

/// HTTP client for the verification service
pub struct HttpProofVerifier {
    base_url: String,
    client: reqwest::Client,
    flags: EnvFlags,
}

impl HttpProofVerifier {
    /// Create a new verifier client
    pub fn new(base_url: String, timeout: Duration, flags: EnvFlags) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            flags,
        })
    }

    async fn call(
        &self,
        app: &ZkFormApp,
        response: &serde_json::Value,
    ) -> Result<VerifiedResult, VerifyError> {
        let url = format!("{}/verify", self.base_url);
        let payload = VerifyPayload {
            config: VerificationConfig::for_app(app, self.flags),
            response,
            claims: &app.claim_requests,
            auths: &app.auth_requests,
        };

        debug!("Verifying response for app {} at {}", app.slug, url);

        let reply = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| VerifyError::VerifierUnavailable(e.to_string()))?;

        let status = reply.status();
        if status.is_success() {
            return reply
                .json::<VerifiedResult>()
                .await
                .map_err(|e| VerifyError::MalformedProof(format!("unreadable verifier result: {}", e)));
        }

        let reason = reply.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::BAD_REQUEST => VerifyError::MalformedProof(reason),
            StatusCode::UNPROCESSABLE_ENTITY => VerifyError::RequirementMismatch(reason),
            other => VerifyError::VerifierUnavailable(format!("{} {}", other, reason)),
        })
    }
}

#[async_trait]
impl ProofVerifier for HttpProofVerifier {
    async fn verify(
        &self,
        app: &ZkFormApp,
        response: &serde_json::Value,
    ) -> Result<VerifiedResult, VerifyError> {
        let result = self.call(app, response).await;
        if let Err(e) = &result {
            warn!("Proof verification failed for app {}: {}", app.slug, e);
        }
        result
    }
}
