//! Submission processing: verify, deduplicate, record
//!
//! The verification flow is:
//! 1. Resolve the zkForm app from its space
//! 2. Open the app's store, writing its header row on first use
//! 3. Verify the proof response with the external verifier
//! 4. Collect vault, auth and claim fields per app configuration,
//!    stopping early when the vault id was already recorded
//! 5. Append submitted and derived fields as one row

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use zkform_common::{AppConfig, AuthType, SubmissionField, VerifiedResult, ZkFormApp};

use crate::config::EnvFlags;
use crate::registry::SpaceRegistry;
use crate::store::{RecordStore, StoreError, StoreInitRegistry, StoreProvider};
use crate::verifier::{ProofVerifier, VerifyError};

/// A form submission as posted by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub fields: Vec<SubmissionField>,

    /// Opaque proof response, forwarded to the verifier as is
    pub response: serde_json::Value,

    pub space_slug: String,

    pub app_slug: String,
}

/// Outcome of an accepted submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionStatus {
    Subscribed,
    AlreadySubscribed,
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Space not found: {0}")]
    SpaceNotFound(String),

    #[error("App not found: {0}")]
    AppNotFound(String),

    #[error("Verify not available for other apps than zkForm")]
    UnsupportedAppType(&'static str),

    #[error(transparent)]
    Verification(#[from] VerifyError),

    #[error("No Vault Id")]
    MissingVaultId,

    #[error("No {0} Id")]
    MissingUserId(AuthType),

    #[error("No matching claim for group {0}")]
    UnmatchedClaim(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives one submission through verification and storage
pub struct SubmissionProcessor {
    registry: Arc<dyn SpaceRegistry>,
    verifier: Arc<dyn ProofVerifier>,
    stores: Arc<dyn StoreProvider>,
    init_state: StoreInitRegistry,
    flags: EnvFlags,
}

impl SubmissionProcessor {
    pub fn new(
        registry: Arc<dyn SpaceRegistry>,
        verifier: Arc<dyn ProofVerifier>,
        stores: Arc<dyn StoreProvider>,
        flags: EnvFlags,
    ) -> Self {
        Self {
            registry,
            verifier,
            stores,
            init_state: StoreInitRegistry::new(),
            flags,
        }
    }

    /// Process a submission end to end
    pub async fn process(&self, submission: Submission) -> Result<SubmissionStatus, ProcessError> {
        let app = self.resolve_app(&submission.space_slug, &submission.app_slug)?;

        let store = self.stores.open(&app.spreadsheet_id, app.columns());
        self.init_state.ensure_initialized(store.as_ref()).await?;

        let result = self.verifier.verify(&app, &submission.response).await?;
        debug!("Response verified for app {}", app.slug);

        let mut fields = submission.fields;
        match self.collect_fields(&app, &result, store.as_ref()).await? {
            Collected::Duplicate(vault_id) => {
                info!("Vault {} already subscribed to {}", vault_id, app.slug);
                return Ok(SubmissionStatus::AlreadySubscribed);
            }
            Collected::Fields(derived) => fields.extend(derived),
        }

        store.add(&fields).await?;
        info!("Submission recorded for app {}", app.slug);

        Ok(SubmissionStatus::Subscribed)
    }

    fn resolve_app(&self, space_slug: &str, app_slug: &str) -> Result<ZkFormApp, ProcessError> {
        let space = self
            .registry
            .get_space(space_slug)
            .ok_or_else(|| ProcessError::SpaceNotFound(space_slug.to_string()))?;

        match space.find_app(app_slug) {
            Some(AppConfig::ZkForm(app)) => Ok(app.clone()),
            Some(other) => {
                warn!("Verify requested for {} app {}", other.kind(), app_slug);
                Err(ProcessError::UnsupportedAppType(other.kind()))
            }
            None => Err(ProcessError::AppNotFound(app_slug.to_string())),
        }
    }

    /// Derive the auth and claim fields to persist
    async fn collect_fields(
        &self,
        app: &ZkFormApp,
        result: &VerifiedResult,
        store: &dyn RecordStore,
    ) -> Result<Collected, ProcessError> {
        let mut fields = Vec::new();

        if !app.save_auths && app.needs_vault_auth() {
            let vault_id = result
                .user_id(AuthType::Vault)
                .ok_or(ProcessError::MissingVaultId)?;

            if self.is_duplicate(store, vault_id).await? {
                return Ok(Collected::Duplicate(vault_id.to_string()));
            }
            fields.push(SubmissionField::new(AuthType::Vault.column_name(), vault_id));
        }

        if app.save_auths {
            for request in &app.auth_requests {
                let user_id = result.user_id(request.auth_type);
                if user_id.is_none() && !request.is_optional {
                    return Err(ProcessError::MissingUserId(request.auth_type));
                }

                if let (AuthType::Vault, Some(vault_id)) = (request.auth_type, user_id) {
                    if self.is_duplicate(store, vault_id).await? {
                        return Ok(Collected::Duplicate(vault_id.to_string()));
                    }
                }

                fields.push(SubmissionField::new(
                    request.auth_type.column_name(),
                    user_id.unwrap_or_default(),
                ));
            }
        }

        if app.save_claims {
            for request in &app.claim_requests {
                let claim = result
                    .find_claim(request)
                    .ok_or_else(|| ProcessError::UnmatchedClaim(request.group_id.clone()))?;
                fields.push(SubmissionField::new(&claim.group_id, &claim.value));
            }
        }

        Ok(Collected::Fields(fields))
    }

    /// Whether `vault_id` already has a row; always false in demo mode
    async fn is_duplicate(&self, store: &dyn RecordStore, vault_id: &str) -> Result<bool, ProcessError> {
        if self.flags.is_demo {
            return Ok(false);
        }

        let row = store.get(AuthType::Vault.column_name(), vault_id).await?;
        Ok(row.is_some())
    }
}

enum Collected {
    Fields(Vec<SubmissionField>),
    Duplicate(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticSpaceRegistry;
    use crate::store::MemoryStoreProvider;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use zkform_common::{ClaimType, GroupTimestamp, Space, VerifiedClaim};

    struct FixedVerifier(Result<VerifiedResult, VerifyError>);

    #[async_trait]
    impl ProofVerifier for FixedVerifier {
        async fn verify(
            &self,
            _app: &ZkFormApp,
            _response: &serde_json::Value,
        ) -> Result<VerifiedResult, VerifyError> {
            self.0.clone()
        }
    }

    fn verified(user_ids: &[(AuthType, &str)], claims: Vec<VerifiedClaim>) -> VerifiedResult {
        VerifiedResult {
            user_ids: user_ids
                .iter()
                .map(|(t, id)| (*t, id.to_string()))
                .collect::<HashMap<_, _>>(),
            claims,
        }
    }

    fn claim(group_id: &str, value: &str) -> VerifiedClaim {
        VerifiedClaim {
            group_id: group_id.to_string(),
            claim_type: ClaimType::Gte,
            group_timestamp: GroupTimestamp::At(0),
            is_selectable_by_user: false,
            value: value.to_string(),
        }
    }

    fn registry(app: serde_json::Value) -> Arc<dyn SpaceRegistry> {
        let space: Space = serde_json::from_value(json!({
            "slug": "sismo",
            "apps": [
                app,
                { "type": "zkBadge", "slug": "badge", "appId": "0x02" }
            ]
        }))
        .unwrap();
        Arc::new(StaticSpaceRegistry::new(vec![space]).unwrap())
    }

    fn processor(
        app: serde_json::Value,
        result: Result<VerifiedResult, VerifyError>,
        stores: &MemoryStoreProvider,
        flags: EnvFlags,
    ) -> SubmissionProcessor {
        SubmissionProcessor::new(
            registry(app),
            Arc::new(FixedVerifier(result)),
            Arc::new(stores.clone()),
            flags,
        )
    }

    fn submission(app_slug: &str) -> Submission {
        Submission {
            fields: vec![SubmissionField::new("Email", "a@b.c")],
            response: json!({ "proofs": [] }),
            space_slug: "sismo".to_string(),
            app_slug: app_slug.to_string(),
        }
    }

    fn legacy_app() -> serde_json::Value {
        json!({
            "type": "zkForm",
            "slug": "newsletter",
            "appId": "0xapp",
            "spreadsheetId": "sheet-legacy",
            "authRequests": [{ "authType": "vault" }],
            "fields": [{ "label": "Email" }]
        })
    }

    #[tokio::test]
    async fn test_legacy_vault_subscribes_then_dedups() {
        let stores = MemoryStoreProvider::new();
        let result = verified(&[(AuthType::Vault, "0xvault")], vec![]);
        let processor = processor(legacy_app(), Ok(result), &stores, EnvFlags::default());

        let first = processor.process(submission("newsletter")).await.unwrap();
        assert_eq!(first, SubmissionStatus::Subscribed);

        let second = processor.process(submission("newsletter")).await.unwrap();
        assert_eq!(second, SubmissionStatus::AlreadySubscribed);

        let rows = stores.rows("sheet-legacy").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["VaultId"], "0xvault");
        assert_eq!(rows[0]["Email"], "a@b.c");
    }

    #[tokio::test]
    async fn test_demo_mode_skips_dedup() {
        let stores = MemoryStoreProvider::new();
        let result = verified(&[(AuthType::Vault, "0xvault")], vec![]);
        let flags = EnvFlags {
            is_dev: false,
            is_demo: true,
        };
        let processor = processor(legacy_app(), Ok(result), &stores, flags);

        for _ in 0..2 {
            let status = processor.process(submission("newsletter")).await.unwrap();
            assert_eq!(status, SubmissionStatus::Subscribed);
        }
        assert_eq!(stores.rows("sheet-legacy").await.len(), 2);
    }

    #[tokio::test]
    async fn test_legacy_missing_vault_id() {
        let stores = MemoryStoreProvider::new();
        let processor = processor(legacy_app(), Ok(verified(&[], vec![])), &stores, EnvFlags::default());

        let err = processor.process(submission("newsletter")).await.unwrap_err();
        assert!(matches!(err, ProcessError::MissingVaultId));
        assert!(stores.rows("sheet-legacy").await.is_empty());
    }

    #[tokio::test]
    async fn test_save_auths_requires_non_optional_ids() {
        let app = json!({
            "type": "zkForm",
            "slug": "multi",
            "appId": "0xapp",
            "spreadsheetId": "sheet-multi",
            "saveAuths": true,
            "authRequests": [
                { "authType": "vault" },
                { "authType": "twitter", "isOptional": true },
                { "authType": "github" }
            ]
        });
        let stores = MemoryStoreProvider::new();
        let result = verified(&[(AuthType::Vault, "0xvault")], vec![]);
        let processor = processor(app, Ok(result), &stores, EnvFlags::default());

        let err = processor.process(submission("multi")).await.unwrap_err();
        assert!(matches!(err, ProcessError::MissingUserId(AuthType::Github)));
        assert_eq!(err.to_string(), "No github Id");
        assert!(stores.rows("sheet-multi").await.is_empty());
    }

    #[tokio::test]
    async fn test_save_auths_records_mapped_columns() {
        let app = json!({
            "type": "zkForm",
            "slug": "multi",
            "appId": "0xapp",
            "spreadsheetId": "sheet-multi",
            "saveAuths": true,
            "authRequests": [
                { "authType": "vault" },
                { "authType": "twitter", "isOptional": true },
                { "authType": "github" }
            ]
        });
        let stores = MemoryStoreProvider::new();
        let result = verified(&[(AuthType::Vault, "0xvault"), (AuthType::Github, "1234")], vec![]);
        let processor = processor(app, Ok(result), &stores, EnvFlags::default());

        assert_eq!(
            processor.process(submission("multi")).await.unwrap(),
            SubmissionStatus::Subscribed
        );
        assert_eq!(
            processor.process(submission("multi")).await.unwrap(),
            SubmissionStatus::AlreadySubscribed
        );

        let rows = stores.rows("sheet-multi").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["VaultId"], "0xvault");
        assert_eq!(rows[0]["GithubId"], "1234");
        assert_eq!(rows[0]["TwitterId"], "");
    }

    #[tokio::test]
    async fn test_claim_value_recorded() {
        let app = json!({
            "type": "zkForm",
            "slug": "claims",
            "appId": "0xapp",
            "spreadsheetId": "sheet-claims",
            "saveClaims": true,
            "claimRequests": [
                { "groupId": "g1", "claimType": "gte", "groupTimestamp": 0, "isSelectableByUser": false }
            ]
        });
        let stores = MemoryStoreProvider::new();
        let result = verified(&[], vec![claim("g0", "7"), claim("g1", "42")]);
        let processor = processor(app, Ok(result), &stores, EnvFlags::default());

        let status = processor.process(submission("claims")).await.unwrap();
        assert_eq!(status, SubmissionStatus::Subscribed);

        let rows = stores.rows("sheet-claims").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["g1"], "42");
    }

    #[tokio::test]
    async fn test_unmatched_claim_fails_without_row() {
        let app = json!({
            "type": "zkForm",
            "slug": "claims",
            "appId": "0xapp",
            "spreadsheetId": "sheet-claims",
            "saveClaims": true,
            "claimRequests": [{ "groupId": "g1", "groupTimestamp": 0, "isSelectableByUser": true }]
        });
        let stores = MemoryStoreProvider::new();
        let result = verified(&[], vec![claim("g1", "42")]);
        let processor = processor(app, Ok(result), &stores, EnvFlags::default());

        let err = processor.process(submission("claims")).await.unwrap_err();
        assert!(matches!(err, ProcessError::UnmatchedClaim(ref g) if g == "g1"));
        assert!(stores.rows("sheet-claims").await.is_empty());
    }

    #[tokio::test]
    async fn test_verification_failure() {
        let stores = MemoryStoreProvider::new();
        let failure = Err(VerifyError::MalformedProof("bad signature".to_string()));
        let processor = processor(legacy_app(), failure, &stores, EnvFlags::default());

        let err = processor.process(submission("newsletter")).await.unwrap_err();
        assert!(matches!(err, ProcessError::Verification(VerifyError::MalformedProof(_))));
        assert!(stores.rows("sheet-legacy").await.is_empty());
    }

    #[tokio::test]
    async fn test_app_resolution_errors() {
        let stores = MemoryStoreProvider::new();
        let processor = processor(legacy_app(), Ok(VerifiedResult::default()), &stores, EnvFlags::default());

        let err = processor.process(submission("badge")).await.unwrap_err();
        assert!(matches!(err, ProcessError::UnsupportedAppType("zkBadge")));

        let err = processor.process(submission("missing")).await.unwrap_err();
        assert!(matches!(err, ProcessError::AppNotFound(_)));

        let mut other_space = submission("newsletter");
        other_space.space_slug = "other".to_string();
        let err = processor.process(other_space).await.unwrap_err();
        assert!(matches!(err, ProcessError::SpaceNotFound(_)));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(SubmissionStatus::AlreadySubscribed).unwrap(),
            json!("already-subscribed")
        );
        assert_eq!(
            serde_json::to_value(SubmissionStatus::Subscribed).unwrap(),
            json!("subscribed")
        );
    }
}
