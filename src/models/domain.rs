use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Account document as stored in the account collection
///
/// Only the fields the intimacy engine reads are modelled; profile fields
/// written by the registration flow are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "phoneNumber", default)]
    pub phone_number: String,
    #[serde(rename = "macAddress", default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    /// Relationship ledger. `None` means the document has no ledger at all,
    /// which is a malformed record rather than an empty ledger.
    #[serde(rename = "friends", default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Vec<Relationship>>,
    #[serde(rename = "likeList", default)]
    pub like_list: Vec<String>,
    #[serde(rename = "matchingList", default)]
    pub matching_list: Vec<String>,
    #[serde(rename = "blockList", default)]
    pub block_list: BTreeSet<String>,
    #[serde(rename = "score", default)]
    pub scores: Vec<f64>,
}

impl Account {
    /// Create an account with an empty ledger and empty reference lists
    pub fn new(id: impl Into<String>, name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone_number: phone_number.into(),
            mac_address: None,
            relationships: Some(Vec::new()),
            like_list: Vec::new(),
            matching_list: Vec::new(),
            block_list: BTreeSet::new(),
            scores: Vec::new(),
        }
    }

    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.get_or_insert_with(Vec::new).push(relationship);
        self
    }

    pub fn with_matches<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matching_list.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_likes<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.like_list.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_mac_address(mut self, mac_address: impl Into<String>) -> Self {
        self.mac_address = Some(mac_address.into());
        self
    }

    /// The headline ("star") score is the first entry of `scores`
    pub fn headline_score(&self) -> Option<f64> {
        self.scores.first().copied()
    }
}

/// Per-counterpart ledger of contact events owned by one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "friendID")]
    pub counterpart_id: String,
    #[serde(rename = "contactInfo", default)]
    pub contact_events: Vec<ContactEvent>,
}

impl Relationship {
    pub fn new<I>(counterpart_id: impl Into<String>, deltas: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self {
            counterpart_id: counterpart_id.into(),
            contact_events: deltas.into_iter().map(ContactEvent::new).collect(),
        }
    }
}

/// A single contact event contributing to intimacy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    #[serde(rename = "intimacyScore")]
    pub intimacy_delta: f64,
}

impl ContactEvent {
    pub fn new(intimacy_delta: f64) -> Self {
        Self { intimacy_delta }
    }
}

/// Match candidate enriched with the requester's intimacy toward it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    #[serde(rename = "candidateId")]
    pub candidate_id: String,
    pub name: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(rename = "intimacyScore")]
    pub intimacy_score: f64,
}

/// Liked accounts as two index-aligned lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LikedAccounts {
    pub ids: Vec<String>,
    pub names: Vec<String>,
}

impl LikedAccounts {
    pub fn push(&mut self, id: String, name: String) {
        self.ids.push(id);
        self.names.push(name);
    }
}

/// Result of a full-population intimacy scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalIntimacyReport {
    #[serde(rename = "reportId")]
    pub report_id: uuid::Uuid,
    #[serde(rename = "totalIntimacy")]
    pub total_intimacy: f64,
    #[serde(rename = "accountsScanned")]
    pub accounts_scanned: usize,
    /// Accounts left out of the total because their ledger is malformed
    #[serde(rename = "skippedAccounts")]
    pub skipped_accounts: Vec<String>,
    #[serde(rename = "computedAt")]
    pub computed_at: chrono::DateTime<chrono::Utc>,
}

/// Secondary lookup keys supported by the account store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryKey {
    MacAddress,
}

impl SecondaryKey {
    /// Document attribute holding the key
    pub fn field_name(&self) -> &'static str {
        match self {
            SecondaryKey::MacAddress => "macAddress",
        }
    }

    pub fn value_of<'a>(&self, account: &'a Account) -> Option<&'a str> {
        match self {
            SecondaryKey::MacAddress => account.mac_address.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_document_parsing() {
        let doc = serde_json::json!({
            "id": "alice",
            "name": "Alice",
            "phoneNumber": "010-1234-5678",
            "password": "ignored",
            "friends": [
                { "friendID": "bob", "contactInfo": [{ "intimacyScore": 3 }, { "intimacyScore": 4.5 }] }
            ],
            "likeList": ["bob"],
            "matchingList": ["bob"],
            "blockList": ["carol", "carol"],
            "score": [4.0, 2.0]
        });

        let account: Account = serde_json::from_value(doc).unwrap();

        assert_eq!(account.phone_number, "010-1234-5678");
        let ledger = account.relationships.as_ref().unwrap();
        assert_eq!(ledger[0].counterpart_id, "bob");
        assert_eq!(ledger[0].contact_events[1].intimacy_delta, 4.5);
        assert!(account.block_list.contains("carol"));
        assert_eq!(account.block_list.len(), 1);
        assert_eq!(account.headline_score(), Some(4.0));
    }

    #[test]
    fn test_missing_ledger_is_distinct_from_empty() {
        let missing: Account = serde_json::from_value(serde_json::json!({ "id": "a" })).unwrap();
        let empty: Account =
            serde_json::from_value(serde_json::json!({ "id": "b", "friends": [] })).unwrap();

        assert!(missing.relationships.is_none());
        assert_eq!(empty.relationships, Some(vec![]));
        assert_eq!(missing.headline_score(), None);
    }

    #[test]
    fn test_secondary_key_lookup_value() {
        let account = Account::new("a", "A", "1").with_mac_address("aa:bb:cc");
        assert_eq!(SecondaryKey::MacAddress.field_name(), "macAddress");
        assert_eq!(SecondaryKey::MacAddress.value_of(&account), Some("aa:bb:cc"));
    }
}
