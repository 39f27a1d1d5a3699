//! Submitted form data and the outcome of proof verification

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::requests::{AuthType, ClaimRequest, ClaimType, GroupTimestamp};

/// One column of a submission row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionField {
    pub name: String,
    pub value: String,
}

impl SubmissionField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A group claim the verifier accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedClaim {
    pub group_id: String,

    #[serde(default)]
    pub claim_type: ClaimType,

    #[serde(default)]
    pub group_timestamp: GroupTimestamp,

    #[serde(default)]
    pub is_selectable_by_user: bool,

    /// Claimed value; verifiers report it as a number or a decimal string
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
}

impl VerifiedClaim {
    /// Exact match on group, claim type, timestamp and selectable flag
    pub fn matches(&self, request: &ClaimRequest) -> bool {
        self.group_id == request.group_id
            && self.claim_type == request.claim_type
            && self.group_timestamp == request.group_timestamp
            && self.is_selectable_by_user == request.is_selectable_by_user()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Value {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Value::deserialize(deserializer)? {
        Value::Text(s) => s,
        Value::Number(n) => n.to_string(),
    })
}

/// Keeps identifiers of known auth types; `null` entries count as absent
fn present_user_ids<'de, D>(deserializer: D) -> Result<HashMap<AuthType, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, Option<String>> = HashMap::deserialize(deserializer)?;

    Ok(raw
        .into_iter()
        .filter_map(|(key, id)| {
            let auth_type = serde_json::from_value(serde_json::Value::String(key)).ok()?;
            Some((auth_type, id?))
        })
        .collect())
}

/// Identifiers and claims proven by one response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedResult {
    #[serde(default, deserialize_with = "present_user_ids")]
    pub user_ids: HashMap<AuthType, String>,

    #[serde(default)]
    pub claims: Vec<VerifiedClaim>,
}

impl VerifiedResult {
    /// Identifier proven for `auth_type`, if any
    pub fn user_id(&self, auth_type: AuthType) -> Option<&str> {
        self.user_ids
            .get(&auth_type)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    /// First verified claim satisfying `request`
    pub fn find_claim(&self, request: &ClaimRequest) -> Option<&VerifiedClaim> {
        self.claims.iter().find(|claim| claim.matches(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_verified_result_from_json() {
        let result: VerifiedResult = serde_json::from_value(json!({
            "userIds": { "vault": "0xvault", "github": "" },
            "claims": [
                { "groupId": "g1", "claimType": "gte", "groupTimestamp": 0, "value": 42 }
            ]
        }))
        .unwrap();

        assert_eq!(result.user_id(AuthType::Vault), Some("0xvault"));
        assert_eq!(result.user_id(AuthType::Github), None);
        assert_eq!(result.user_id(AuthType::Twitter), None);
        assert_eq!(result.claims[0].value, "42");
    }

    #[test]
    fn test_null_and_unknown_user_ids_are_absent() {
        let result: VerifiedResult = serde_json::from_value(json!({
            "userIds": { "vault": "0xvault", "github": null, "discord": "d1" },
            "claims": []
        }))
        .unwrap();

        assert_eq!(result.user_id(AuthType::Vault), Some("0xvault"));
        assert_eq!(result.user_id(AuthType::Github), None);
        assert_eq!(result.user_ids.len(), 1);
    }

    #[test]
    fn test_find_claim_requires_exact_match() {
        let result = VerifiedResult {
            user_ids: HashMap::new(),
            claims: vec![VerifiedClaim {
                group_id: "g1".to_string(),
                claim_type: ClaimType::Gte,
                group_timestamp: GroupTimestamp::At(0),
                is_selectable_by_user: false,
                value: "42".to_string(),
            }],
        };

        let mut request = ClaimRequest {
            group_id: "g1".to_string(),
            claim_type: ClaimType::Gte,
            group_timestamp: GroupTimestamp::At(0),
            is_selectable_by_user: None,
        };
        assert_eq!(result.find_claim(&request).map(|c| c.value.as_str()), Some("42"));

        request.is_selectable_by_user = Some(true);
        assert!(result.find_claim(&request).is_none());

        request.is_selectable_by_user = Some(false);
        request.group_timestamp = GroupTimestamp::Latest;
        assert!(result.find_claim(&request).is_none());
    }
}
