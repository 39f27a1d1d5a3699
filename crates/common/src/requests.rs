//! Auth and claim requirements declared by an app

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of account a user can prove ownership of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthType {
    Vault,
    Github,
    Twitter,
    EvmAccount,
    Telegram,
}

impl AuthType {
    /// Store column holding identifiers of this auth type
    pub fn column_name(&self) -> &'static str {
        match self {
            AuthType::Vault => "VaultId",
            AuthType::Github => "GithubId",
            AuthType::Twitter => "TwitterId",
            AuthType::EvmAccount => "EVMAccount",
            AuthType::Telegram => "TelegramId",
        }
    }

    /// Wire name, as used in app configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::Vault => "vault",
            AuthType::Github => "github",
            AuthType::Twitter => "twitter",
            AuthType::EvmAccount => "evmAccount",
            AuthType::Telegram => "telegram",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison a group claim is checked with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClaimType {
    #[default]
    Gte,
    Gt,
    Eq,
    Lt,
    Lte,
}

/// Snapshot of a group a claim refers to
///
/// Serialized as the string `"latest"` or as a unix timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimestamp", into = "RawTimestamp")]
pub enum GroupTimestamp {
    #[default]
    Latest,
    At(u64),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    At(u64),
    Named(String),
}

impl TryFrom<RawTimestamp> for GroupTimestamp {
    type Error = String;

    fn try_from(raw: RawTimestamp) -> Result<Self, Self::Error> {
        match raw {
            RawTimestamp::At(ts) => Ok(GroupTimestamp::At(ts)),
            RawTimestamp::Named(name) if name == "latest" => Ok(GroupTimestamp::Latest),
            RawTimestamp::Named(name) => Err(format!("invalid group timestamp: {}", name)),
        }
    }
}

impl From<GroupTimestamp> for RawTimestamp {
    fn from(ts: GroupTimestamp) -> Self {
        match ts {
            GroupTimestamp::Latest => RawTimestamp::Named("latest".to_string()),
            GroupTimestamp::At(ts) => RawTimestamp::At(ts),
        }
    }
}

/// An account the user must (or may) prove ownership of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub auth_type: AuthType,

    #[serde(default)]
    pub is_optional: bool,
}

/// A group membership the user must prove
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub group_id: String,

    #[serde(default)]
    pub claim_type: ClaimType,

    #[serde(default)]
    pub group_timestamp: GroupTimestamp,

    /// Unset means the user cannot pick the claimed value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_selectable_by_user: Option<bool>,
}

impl ClaimRequest {
    pub fn is_selectable_by_user(&self) -> bool {
        self.is_selectable_by_user.unwrap_or(false)
    }
}
