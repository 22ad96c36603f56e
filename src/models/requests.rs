use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query addressing a single account
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AccountQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "userId")]
    pub id: String,
}

/// Query resolving an account by its device address
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindAccountQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "mac_address", rename = "macAddress")]
    pub mac_address: String,
}

/// Query addressing one relationship in an account's ledger
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RelationshipQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "userId")]
    pub id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "friend_id", rename = "friendId")]
    pub friend_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_id_rejected() {
        let query = AccountQuery { id: String::new() };
        assert!(query.validate().is_err());

        let query = AccountQuery { id: "alice".to_string() };
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_relationship_query_aliases() {
        let query: RelationshipQuery =
            serde_json::from_value(serde_json::json!({ "userId": "a", "friend_id": "b" })).unwrap();
        assert_eq!(query.id, "a");
        assert_eq!(query.friend_id, "b");
    }
}
