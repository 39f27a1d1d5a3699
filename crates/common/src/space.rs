//! Spaces and the apps they host

use serde::{Deserialize, Serialize};

use crate::requests::{AuthRequest, AuthType, ClaimRequest};

/// A space groups the apps of one organisation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub slug: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub apps: Vec<AppConfig>,
}

impl Space {
    /// Find an app of this space by slug
    pub fn find_app(&self, slug: &str) -> Option<&AppConfig> {
        self.apps.iter().find(|app| app.slug() == slug)
    }
}

/// App configuration, discriminated by its `type` field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AppConfig {
    ZkForm(ZkFormApp),
    ZkDrop(ZkDropApp),
    ZkBadge(ZkBadgeApp),
}

impl AppConfig {
    pub fn slug(&self) -> &str {
        match self {
            AppConfig::ZkForm(app) => &app.slug,
            AppConfig::ZkDrop(app) => &app.slug,
            AppConfig::ZkBadge(app) => &app.slug,
        }
    }

    /// Wire name of the app type
    pub fn kind(&self) -> &'static str {
        match self {
            AppConfig::ZkForm(_) => "zkForm",
            AppConfig::ZkDrop(_) => "zkDrop",
            AppConfig::ZkBadge(_) => "zkBadge",
        }
    }
}

/// A user-supplied form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub label: String,

    #[serde(default)]
    pub is_required: bool,
}

/// A form whose submissions are gated by a zero-knowledge proof
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkFormApp {
    pub slug: String,

    #[serde(default)]
    pub name: String,

    /// Proof-system app identifier
    pub app_id: String,

    #[serde(default)]
    pub save_auths: bool,

    #[serde(default)]
    pub save_claims: bool,

    #[serde(default)]
    pub auth_requests: Vec<AuthRequest>,

    #[serde(default)]
    pub claim_requests: Vec<ClaimRequest>,

    #[serde(default)]
    pub fields: Vec<FormField>,

    pub spreadsheet_id: String,

    /// Identities the verifier accepts without a real proof in demo mode
    #[serde(default)]
    pub impersonate_addresses: Vec<String>,
}

impl ZkFormApp {
    /// Whether the app asks users to prove a vault
    pub fn needs_vault_auth(&self) -> bool {
        self.auth_requests
            .iter()
            .any(|req| req.auth_type == AuthType::Vault)
    }

    /// Store columns: auth columns, then claim columns, then form field labels
    pub fn columns(&self) -> Vec<String> {
        let auth_columns: Vec<String> = if self.save_auths {
            self.auth_requests
                .iter()
                .map(|req| req.auth_type.column_name().to_string())
                .collect()
        } else if self.needs_vault_auth() {
            vec![AuthType::Vault.column_name().to_string()]
        } else {
            Vec::new()
        };

        let claim_columns = if self.save_claims {
            self.claim_requests
                .iter()
                .map(|req| req.group_id.clone())
                .collect()
        } else {
            Vec::new()
        };

        let field_columns = self.fields.iter().map(|field| field.label.clone());

        auth_columns
            .into_iter()
            .chain(claim_columns)
            .chain(field_columns)
            .collect()
    }
}

/// Token drop gated by group membership
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkDropApp {
    pub slug: String,

    #[serde(default)]
    pub name: String,

    pub app_id: String,

    #[serde(default)]
    pub auth_requests: Vec<AuthRequest>,

    #[serde(default)]
    pub claim_requests: Vec<ClaimRequest>,

    #[serde(default)]
    pub contract_address: Option<String>,

    #[serde(default)]
    pub impersonate_addresses: Vec<String>,
}

/// Badge minted to group members
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkBadgeApp {
    pub slug: String,

    #[serde(default)]
    pub name: String,

    pub app_id: String,

    #[serde(default)]
    pub badge_id: Option<String>,

    #[serde(default)]
    pub impersonate_addresses: Vec<String>,
}
