//! Stable identity for heterogeneously-labeled graph entities.
//!
//! Cloud resources carry no common identity field across types, so the
//! resolver walks a fixed list of candidate properties. The same order is used
//! for primary nodes and edge endpoints, which keeps an entity's id independent
//! of the query path that discovered it.

use serde_json::Value;

use cloudatlas_core::types::Meta;

/// Candidate order for the external id. Service-specific natural keys follow
/// the generic id, name and arn.
pub const ID_CANDIDATES: &[&str] = &[
    "id",
    "name",
    "arn",
    "db_instance_arn",
    "vpc_id",
    "subnet_id",
    "security_group_id",
    "internet_gateway_id",
    "nat_gateway_id",
    "route_table_id",
];

/// Candidate order for the display label: name before id.
pub const LABEL_CANDIDATES: &[&str] = &[
    "name",
    "id",
    "arn",
    "db_instance_arn",
    "vpc_id",
    "subnet_id",
    "security_group_id",
    "internet_gateway_id",
    "nat_gateway_id",
    "route_table_id",
];

/// A resolved entity identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub label: String,
    /// Primary classification label of the entity.
    pub kind: String,
}

/// Resolve the external id and display label of an entity.
///
/// `internal_id` is the database row identifier, used only when no candidate
/// property is present. Returns `None` when the entity is unresolvable.
pub fn resolve(kind: &str, properties: &Meta, internal_id: Option<i64>) -> Option<Identity> {
    let fallback = internal_id.map(|i| i.to_string());

    let id = first_candidate(properties, ID_CANDIDATES).or_else(|| fallback.clone())?;
    let label = first_candidate(properties, LABEL_CANDIDATES)
        .or(fallback)
        .unwrap_or_else(|| id.clone());

    Some(Identity {
        id,
        label,
        kind: kind.to_string(),
    })
}

fn first_candidate(properties: &Meta, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|key| properties.get(*key).and_then(scalar_key))
}

/// Strings are used verbatim, empty ones included; numbers are stringified.
/// Nulls and compound values never identify an entity.
fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Meta {
        match value {
            Value::Object(map) => map,
            _ => Meta::new(),
        }
    }

    #[test]
    fn test_explicit_id_wins_regardless_of_label() {
        let p = props(json!({
            "id": "i-0abc123",
            "name": "web-01",
            "arn": "arn:aws:ec2:us-east-1:111:instance/i-0abc123"
        }));
        for kind in ["EC2Instance", "S3Bucket", "AnythingElse"] {
            let identity = resolve(kind, &p, Some(7)).unwrap();
            assert_eq!(identity.id, "i-0abc123");
            assert_eq!(identity.label, "web-01");
            assert_eq!(identity.kind, kind);
        }
    }

    #[test]
    fn test_name_then_arn_precedence() {
        let named = props(json!({"name": "logs-bucket", "arn": "arn:aws:s3:::logs-bucket"}));
        assert_eq!(resolve("S3Bucket", &named, None).unwrap().id, "logs-bucket");

        let arn_only = props(json!({"arn": "arn:aws:iam::111:role/admin"}));
        let identity = resolve("IAMRole", &arn_only, None).unwrap();
        assert_eq!(identity.id, "arn:aws:iam::111:role/admin");
        assert_eq!(identity.label, "arn:aws:iam::111:role/admin");
    }

    #[test]
    fn test_natural_keys_follow_declared_order() {
        let p = props(json!({
            "route_table_id": "rtb-1",
            "subnet_id": "subnet-1",
            "vpc_id": "vpc-1"
        }));
        assert_eq!(resolve("EC2Subnet", &p, None).unwrap().id, "vpc-1");

        let p = props(json!({"nat_gateway_id": "nat-1", "security_group_id": "sg-1"}));
        assert_eq!(resolve("Unknown", &p, None).unwrap().id, "sg-1");
    }

    #[test]
    fn test_label_candidates_only_swap_name_and_id() {
        assert_eq!(&LABEL_CANDIDATES[..2], &["name", "id"]);
        assert_eq!(&ID_CANDIDATES[..2], &["id", "name"]);
        assert_eq!(&LABEL_CANDIDATES[2..], &ID_CANDIDATES[2..]);
    }

    #[test]
    fn test_internal_id_is_last_resort() {
        let p = props(json!({"region": "us-east-1"}));
        let identity = resolve("Region", &p, Some(1234)).unwrap();
        assert_eq!(identity.id, "1234");
        assert_eq!(identity.label, "1234");
    }

    #[test]
    fn test_unresolvable_without_candidates_or_internal_id() {
        let p = props(json!({"region": "us-east-1", "tags": ["a"]}));
        assert!(resolve("Region", &p, None).is_none());
    }

    #[test]
    fn test_null_candidates_are_skipped() {
        let p = props(json!({"id": null, "name": null, "arn": "arn:aws:s3:::b"}));
        assert_eq!(resolve("S3Bucket", &p, None).unwrap().id, "arn:aws:s3:::b");
    }

    #[test]
    fn test_empty_string_id_is_returned_verbatim() {
        let p = props(json!({"id": "", "name": "web-01"}));
        let identity = resolve("EC2Instance", &p, Some(9)).unwrap();
        assert_eq!(identity.id, "");
        assert_eq!(identity.label, "web-01");
    }

    #[test]
    fn test_numeric_identifiers_are_stringified() {
        let p = props(json!({"id": 123456789012_i64}));
        assert_eq!(resolve("AWSAccount", &p, None).unwrap().id, "123456789012");
    }
}
