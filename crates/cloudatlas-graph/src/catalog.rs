//! Fixed catalog of security queries over the infrastructure graph.
//!
//! Every predicate is evaluated by Cypher. Optional relationships are
//! aggregated before filtering, so a resource without security groups,
//! policies or ACLs is still considered (and reported as not exposed) instead
//! of being dropped by the join.
//!
//! Rows whose identifying property is missing are skipped by the queries
//! themselves.

use serde::Serialize;

use cloudatlas_core::{Ec2Instance, ExposedResource, IamRole, QueryResult, RiskLevel, S3Bucket};

use crate::client::GraphError;
use crate::query::{execute_query, CypherQuery, QueryParam, QueryRunner};

const OPEN_CIDR: &str = "0.0.0.0/0";
const PUBLIC_GRANTEES: &[&str] = &["AllUsers", "AuthenticatedUsers"];
const ALLOW_STATEMENT: &str = r#""Effect": "Allow""#;
const PUBLIC_PRINCIPALS: &[&str] = &[
    r#""Principal": "*""#,
    r#""Principal":"*""#,
    r#""Principal":{"AWS":"*"}"#,
    r#""Principal":{"AWS":["*"]}"#,
];

/// A risky IAM policy pattern: matched when any of `any_of` occurs in the
/// combined policy documents, and `requires` too when set.
struct RiskyPattern {
    label: &'static str,
    any_of: &'static [&'static str],
    requires: Option<&'static str>,
}

const RISKY_PATTERNS: &[RiskyPattern] = &[
    RiskyPattern {
        label: "Wildcard Actions",
        any_of: &[r#""Action": "*""#, r#""Action": ["*"]"#, r#""Action": ["*","*"#],
        requires: None,
    },
    RiskyPattern {
        label: "Wildcard Resources",
        any_of: &[
            r#""Resource": "*""#,
            r#""Resource": ["*"]"#,
            r#""Resource": ["*","*"#,
        ],
        requires: None,
    },
    RiskyPattern {
        label: "Wildcard NotResource",
        any_of: &[r#""NotResource": "*""#],
        requires: None,
    },
    RiskyPattern {
        label: "IAM Full Access",
        any_of: &["iam:*"],
        requires: None,
    },
    RiskyPattern {
        label: "Administrator Access",
        any_of: &["AdministratorAccess"],
        requires: Some(ALLOW_STATEMENT),
    },
];

const EC2_COLUMNS: &[&str] = &["id", "region", "publicIp", "instanceType", "state", "isPublic"];
const S3_COLUMNS: &[&str] = &["name", "region", "creationDate", "versioningStatus", "isPublic"];
const IAM_COLUMNS: &[&str] = &[
    "name",
    "arn",
    "createDate",
    "maxSessionDuration",
    "isOverprivileged",
    "riskyPolicies",
];
const EXPOSED_COLUMNS: &[&str] = &["id", "type", "region", "exposureType", "riskLevel"];

// ── Registry ──────────────────────────────────────────────────────

/// Every query in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogQuery {
    ListEc2Instances,
    FindPublicEc2Instances,
    ListS3Buckets,
    FindPublicS3Buckets,
    ListIamRoles,
    FindOverprivilegedIamRoles,
    FindInternetExposedResources,
}

impl CatalogQuery {
    pub const ALL: [CatalogQuery; 7] = [
        Self::ListEc2Instances,
        Self::FindPublicEc2Instances,
        Self::ListS3Buckets,
        Self::FindPublicS3Buckets,
        Self::ListIamRoles,
        Self::FindOverprivilegedIamRoles,
        Self::FindInternetExposedResources,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListEc2Instances => "list_ec2_instances",
            Self::FindPublicEc2Instances => "find_public_ec2_instances",
            Self::ListS3Buckets => "list_s3_buckets",
            Self::FindPublicS3Buckets => "find_public_s3_buckets",
            Self::ListIamRoles => "list_iam_roles",
            Self::FindOverprivilegedIamRoles => "find_overprivileged_iam_roles",
            Self::FindInternetExposedResources => "find_internet_exposed_resources",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.name() == name)
    }

    /// Human-readable summary attached to the result.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::ListEc2Instances => "All EC2 instances discovered in AWS",
            Self::FindPublicEc2Instances => "EC2 instances exposed to the public internet",
            Self::ListS3Buckets => "All S3 buckets in the account",
            Self::FindPublicS3Buckets => "Publicly accessible S3 buckets",
            Self::ListIamRoles => "IAM roles detected in the environment",
            Self::FindOverprivilegedIamRoles => "IAM roles with overly permissive policies",
            Self::FindInternetExposedResources => "Resources exposed to the internet",
        }
    }

    /// Fixed risk level of the result set. Inventory listings carry none.
    pub fn risk_level(&self) -> Option<RiskLevel> {
        match self {
            Self::ListEc2Instances | Self::ListS3Buckets | Self::ListIamRoles => None,
            Self::FindPublicEc2Instances
            | Self::FindOverprivilegedIamRoles
            | Self::FindInternetExposedResources => Some(RiskLevel::High),
            Self::FindPublicS3Buckets => Some(RiskLevel::Critical),
        }
    }

    pub fn query(&self) -> CypherQuery {
        match self {
            Self::ListEc2Instances => list_ec2_instances_query(),
            Self::FindPublicEc2Instances => find_public_ec2_instances_query(),
            Self::ListS3Buckets => list_s3_buckets_query(),
            Self::FindPublicS3Buckets => find_public_s3_buckets_query(),
            Self::ListIamRoles => list_iam_roles_query(),
            Self::FindOverprivilegedIamRoles => find_overprivileged_iam_roles_query(),
            Self::FindInternetExposedResources => find_internet_exposed_resources_query(),
        }
    }

    /// Run the query and serialize its typed result.
    pub async fn run_json<R>(&self, runner: &R) -> Result<serde_json::Value, GraphError>
    where
        R: QueryRunner + ?Sized,
    {
        match self {
            Self::ListEc2Instances => to_json(list_ec2_instances(runner).await?),
            Self::FindPublicEc2Instances => to_json(find_public_ec2_instances(runner).await?),
            Self::ListS3Buckets => to_json(list_s3_buckets(runner).await?),
            Self::FindPublicS3Buckets => to_json(find_public_s3_buckets(runner).await?),
            Self::ListIamRoles => to_json(list_iam_roles(runner).await?),
            Self::FindOverprivilegedIamRoles => {
                to_json(find_overprivileged_iam_roles(runner).await?)
            }
            Self::FindInternetExposedResources => {
                to_json(find_internet_exposed_resources(runner).await?)
            }
        }
    }
}

fn to_json<T: Serialize>(result: QueryResult<T>) -> Result<serde_json::Value, GraphError> {
    serde_json::to_value(result).map_err(|e| GraphError::Serialization(e.to_string()))
}

async fn run<T, R>(runner: &R, entry: CatalogQuery) -> Result<QueryResult<T>, GraphError>
where
    T: serde::de::DeserializeOwned,
    R: QueryRunner + ?Sized,
{
    execute_query(runner, &entry.query(), entry.summary(), entry.risk_level()).await
}

// ── EC2 ───────────────────────────────────────────────────────────

const EC2_RETURN: &str = "RETURN ec2.id AS id,
                coalesce(region_name, 'unknown') AS region,
                ec2.public_ip_address AS publicIp,
                ec2.instance_type AS instanceType,
                ec2.state AS state,
                ec2.public_ip_address IS NOT NULL AS isPublic
         ORDER BY id";

fn list_ec2_instances_query() -> CypherQuery {
    let text = format!(
        "MATCH (ec2:EC2Instance) WHERE ec2.id IS NOT NULL
         OPTIONAL MATCH (ec2)-[:IN_REGION]->(region:Region)
         WITH ec2, head(collect(region.name)) AS region_name
         {EC2_RETURN}"
    );
    CypherQuery::new(text, EC2_COLUMNS)
}

fn find_public_ec2_instances_query() -> CypherQuery {
    let text = format!(
        "MATCH (ec2:EC2Instance) WHERE ec2.id IS NOT NULL
         OPTIONAL MATCH (ec2)-[:IN_REGION]->(region:Region)
         OPTIONAL MATCH (ec2)-[:MEMBER_OF_EC2_SECURITY_GROUP]->(:EC2SecurityGroup)
                        -[:HAS_INGRESS_RULE]->(rule:EC2SecurityGroupIngressRule)
         WITH ec2, head(collect(DISTINCT region.name)) AS region_name,
              any(r IN collect(rule) WHERE r.cidr_blocks CONTAINS $open_cidr
                                        OR r.ipv4_ranges CONTAINS $open_cidr) AS open_ingress
         WHERE ec2.public_ip_address IS NOT NULL OR open_ingress
         {EC2_RETURN}"
    );
    CypherQuery::new(text, EC2_COLUMNS).param("open_cidr", QueryParam::Str(OPEN_CIDR.into()))
}

/// All EC2 instances with their region and public address.
pub async fn list_ec2_instances<R>(runner: &R) -> Result<QueryResult<Ec2Instance>, GraphError>
where
    R: QueryRunner + ?Sized,
{
    run(runner, CatalogQuery::ListEc2Instances).await
}

/// EC2 instances with a public address or an ingress rule open to `0.0.0.0/0`.
pub async fn find_public_ec2_instances<R>(
    runner: &R,
) -> Result<QueryResult<Ec2Instance>, GraphError>
where
    R: QueryRunner + ?Sized,
{
    run(runner, CatalogQuery::FindPublicEc2Instances).await
}

// ── S3 ────────────────────────────────────────────────────────────

fn s3_return(is_public: bool) -> String {
    format!(
        "RETURN bucket.name AS name,
                coalesce(region_name, 'unknown') AS region,
                toString(bucket.creation_date) AS creationDate,
                bucket.versioning_status AS versioningStatus,
                {is_public} AS isPublic
         ORDER BY name"
    )
}

fn list_s3_buckets_query() -> CypherQuery {
    let text = format!(
        "MATCH (bucket:S3Bucket) WHERE bucket.name IS NOT NULL
         OPTIONAL MATCH (bucket)-[:IN_REGION]->(region:Region)
         WITH bucket, head(collect(region.name)) AS region_name
         {}",
        s3_return(false)
    );
    CypherQuery::new(text, S3_COLUMNS)
}

/// Aggregates a bucket's ACLs and policies into `public_acl` / `public_policy`.
const S3_EXPOSURE: &str = "OPTIONAL MATCH (bucket)-[:IN_REGION]->(region:Region)
         OPTIONAL MATCH (bucket)-[:HAS_BUCKET_POLICY]->(policy:BucketPolicy)
         OPTIONAL MATCH (bucket)-[:HAS_BUCKET_ACL]->(acl:AccessControlList)
         WITH bucket, head(collect(DISTINCT region.name)) AS region_name,
              any(a IN collect(acl) WHERE a.grantee IN $public_grantees) AS public_acl,
              any(p IN collect(policy)
                  WHERE p.policy_document CONTAINS $allow_statement
                    AND any(principal IN $public_principals
                            WHERE p.policy_document CONTAINS principal)) AS public_policy
         WHERE public_acl OR public_policy OR bucket.public_access_blocked = false";

fn with_s3_exposure_params(query: CypherQuery) -> CypherQuery {
    query
        .param("public_grantees", QueryParam::str_list(PUBLIC_GRANTEES))
        .param("allow_statement", QueryParam::Str(ALLOW_STATEMENT.into()))
        .param("public_principals", QueryParam::str_list(PUBLIC_PRINCIPALS))
}

fn find_public_s3_buckets_query() -> CypherQuery {
    let text = format!(
        "MATCH (bucket:S3Bucket) WHERE bucket.name IS NOT NULL
         {S3_EXPOSURE}
         {}",
        s3_return(true)
    );
    with_s3_exposure_params(CypherQuery::new(text, S3_COLUMNS))
}

/// All S3 buckets with their region.
pub async fn list_s3_buckets<R>(runner: &R) -> Result<QueryResult<S3Bucket>, GraphError>
where
    R: QueryRunner + ?Sized,
{
    run(runner, CatalogQuery::ListS3Buckets).await
}

/// Buckets granted to everyone by ACL or policy, or with public access
/// blocking explicitly disabled.
pub async fn find_public_s3_buckets<R>(runner: &R) -> Result<QueryResult<S3Bucket>, GraphError>
where
    R: QueryRunner + ?Sized,
{
    run(runner, CatalogQuery::FindPublicS3Buckets).await
}

// ── IAM ───────────────────────────────────────────────────────────

const IAM_PROJECTION: &str = "role.name AS name,
                role.arn AS arn,
                toString(role.create_date) AS createDate,
                role.max_session_duration AS maxSessionDuration";

fn list_iam_roles_query() -> CypherQuery {
    let text = format!(
        "MATCH (role:IAMRole) WHERE role.name IS NOT NULL
         RETURN {IAM_PROJECTION},
                false AS isOverprivileged,
                null AS riskyPolicies
         ORDER BY name"
    );
    CypherQuery::new(text, IAM_COLUMNS)
}

fn find_overprivileged_iam_roles_query() -> CypherQuery {
    let checks: Vec<String> = RISKY_PATTERNS
        .iter()
        .enumerate()
        .map(|(i, pattern)| {
            let required = match pattern.requires {
                Some(_) => format!(" AND documents CONTAINS $risk_{i}_requires"),
                None => String::new(),
            };
            format!(
                "CASE WHEN any(p IN $risk_{i} WHERE documents CONTAINS p){required} THEN '{}' END",
                pattern.label
            )
        })
        .collect();

    let text = format!(
        "MATCH (role:IAMRole) WHERE role.name IS NOT NULL
         OPTIONAL MATCH (role)-[:ASSUMES_ROLE_POLICY|HAS_INLINE_POLICY|ATTACHES_MANAGED_POLICY]->(policy)
         WHERE policy:IAMPolicy OR policy:IAMInlinePolicy OR policy:IAMManagedPolicy
         WITH role, reduce(acc = '', p IN collect(policy) | acc + coalesce(p.policy_document, '')) AS documents
         WITH role, [flag IN [{}] WHERE flag IS NOT NULL] AS risky
         WHERE size(risky) > 0
         RETURN {IAM_PROJECTION},
                true AS isOverprivileged,
                risky AS riskyPolicies
         ORDER BY name",
        checks.join(",\n                              ")
    );

    RISKY_PATTERNS
        .iter()
        .enumerate()
        .fold(CypherQuery::new(text, IAM_COLUMNS), |query, (i, pattern)| {
            let query = query.param(&format!("risk_{i}"), QueryParam::str_list(pattern.any_of));
            match pattern.requires {
                Some(required) => {
                    query.param(&format!("risk_{i}_requires"), QueryParam::Str(required.into()))
                }
                None => query,
            }
        })
}

/// All IAM roles.
pub async fn list_iam_roles<R>(runner: &R) -> Result<QueryResult<IamRole>, GraphError>
where
    R: QueryRunner + ?Sized,
{
    run(runner, CatalogQuery::ListIamRoles).await
}

/// Roles whose attached policies match at least one risky pattern. Every
/// matched pattern is reported in `riskyPolicies`.
pub async fn find_overprivileged_iam_roles<R>(
    runner: &R,
) -> Result<QueryResult<IamRole>, GraphError>
where
    R: QueryRunner + ?Sized,
{
    run(runner, CatalogQuery::FindOverprivilegedIamRoles).await
}

// ── Cross-service exposure ────────────────────────────────────────

fn find_internet_exposed_resources_query() -> CypherQuery {
    let text = format!(
        "MATCH (ec2:EC2Instance) WHERE ec2.id IS NOT NULL
         OPTIONAL MATCH (ec2)-[:IN_REGION]->(region:Region)
         OPTIONAL MATCH (ec2)-[:MEMBER_OF_EC2_SECURITY_GROUP]->(:EC2SecurityGroup)
                        -[:HAS_INGRESS_RULE]->(rule:EC2SecurityGroupIngressRule)
         WITH ec2, head(collect(DISTINCT region.name)) AS region_name,
              any(r IN collect(rule) WHERE r.cidr_blocks CONTAINS $open_cidr
                                        OR r.ipv4_ranges CONTAINS $open_cidr) AS open_ingress
         WHERE ec2.public_ip_address IS NOT NULL OR open_ingress
         RETURN ec2.id AS id, 'EC2Instance' AS type,
                coalesce(region_name, 'unknown') AS region,
                CASE WHEN ec2.public_ip_address IS NOT NULL THEN 'Public IP'
                     ELSE 'Open Security Group' END AS exposureType,
                'HIGH' AS riskLevel
         UNION ALL
         MATCH (bucket:S3Bucket) WHERE bucket.name IS NOT NULL
         {S3_EXPOSURE}
         RETURN bucket.name AS id, 'S3Bucket' AS type,
                coalesce(region_name, 'unknown') AS region,
                'Public Bucket Policy/ACL' AS exposureType,
                'CRITICAL' AS riskLevel
         UNION ALL
         MATCH (lb:LoadBalancer) WHERE lb.arn IS NOT NULL AND lb.scheme = 'internet-facing'
         OPTIONAL MATCH (lb)-[:IN_REGION]->(region:Region)
         WITH lb, head(collect(region.name)) AS region_name
         RETURN lb.arn AS id, 'LoadBalancer' AS type,
                coalesce(region_name, 'unknown') AS region,
                'Internet-facing Load Balancer' AS exposureType,
                'HIGH' AS riskLevel
         UNION ALL
         MATCH (rds:RDSInstance) WHERE rds.db_instance_arn IS NOT NULL
         OPTIONAL MATCH (rds)-[:IN_REGION]->(region:Region)
         OPTIONAL MATCH (rds)-[:MEMBER_OF_DB_SECURITY_GROUP]->(:DBSecurityGroup)
                        -[:HAS_INGRESS_RULE]->(rule:DBSecurityGroupIngressRule)
         WITH rds, head(collect(DISTINCT region.name)) AS region_name,
              any(r IN collect(rule) WHERE r.cidr_blocks CONTAINS $open_cidr) AS open_ingress
         WHERE rds.publicly_accessible = true OR open_ingress
         RETURN rds.db_instance_arn AS id, 'RDSInstance' AS type,
                coalesce(region_name, 'unknown') AS region,
                CASE WHEN rds.publicly_accessible = true THEN 'Public RDS Instance'
                     ELSE 'Open Security Group' END AS exposureType,
                'CRITICAL' AS riskLevel"
    );

    with_s3_exposure_params(CypherQuery::new(text, EXPOSED_COLUMNS))
        .param("open_cidr", QueryParam::Str(OPEN_CIDR.into()))
}

/// EC2 instances, S3 buckets, load balancers and RDS instances reachable from
/// the internet, most severe first, then by type and id.
pub async fn find_internet_exposed_resources<R>(
    runner: &R,
) -> Result<QueryResult<ExposedResource>, GraphError>
where
    R: QueryRunner + ?Sized,
{
    let mut result: QueryResult<ExposedResource> =
        run(runner, CatalogQuery::FindInternetExposedResources).await?;
    sort_exposed(&mut result.data);
    Ok(result)
}

fn sort_exposed(resources: &mut [ExposedResource]) {
    resources.sort_by(|a, b| {
        b.risk_level
            .cmp(&a.risk_level)
            .then_with(|| a.resource_type.cmp(&b.resource_type))
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Record;
    use async_trait::async_trait;
    use cloudatlas_core::ExposedResourceType;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct StubRunner {
        rows: Vec<Value>,
        seen: Mutex<Vec<CypherQuery>>,
    }

    impl StubRunner {
        fn new(rows: Vec<Value>) -> Self {
            Self {
                rows,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last_query(&self) -> CypherQuery {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl QueryRunner for StubRunner {
        async fn fetch_records(&self, query: &CypherQuery) -> Result<Vec<Record>, GraphError> {
            self.seen.lock().unwrap().push(query.clone());
            Ok(self
                .rows
                .iter()
                .filter_map(|row| row.as_object().cloned())
                .collect())
        }
    }

    #[test]
    fn test_catalog_names_round_trip() {
        for entry in CatalogQuery::ALL {
            assert_eq!(CatalogQuery::from_name(entry.name()), Some(entry));
        }
        assert_eq!(CatalogQuery::from_name("drop_everything"), None);
    }

    #[test]
    fn test_risk_levels() {
        use CatalogQuery::*;
        assert_eq!(FindPublicEc2Instances.risk_level(), Some(RiskLevel::High));
        assert_eq!(FindPublicS3Buckets.risk_level(), Some(RiskLevel::Critical));
        assert_eq!(FindOverprivilegedIamRoles.risk_level(), Some(RiskLevel::High));
        assert_eq!(FindInternetExposedResources.risk_level(), Some(RiskLevel::High));
        for listing in [ListEc2Instances, ListS3Buckets, ListIamRoles] {
            assert_eq!(listing.risk_level(), None);
        }
    }

    #[test]
    fn test_every_query_binds_the_params_it_references() {
        for entry in CatalogQuery::ALL {
            let query = entry.query();
            for (key, _) in &query.params {
                assert!(
                    query.text.contains(&format!("${key}")),
                    "{} binds unused param {key}",
                    entry.name()
                );
            }
            for key in ["open_cidr", "public_grantees", "public_principals", "allow_statement"] {
                if query.text.contains(&format!("${key}")) {
                    assert!(query.param_value(key).is_some(), "{} misses {key}", entry.name());
                }
            }
        }
    }

    #[test]
    fn test_optional_relationships_are_aggregated_before_filtering() {
        for entry in [
            CatalogQuery::FindPublicEc2Instances,
            CatalogQuery::FindPublicS3Buckets,
        ] {
            let text = entry.query().text;
            let optional = text.find("OPTIONAL MATCH").unwrap();
            let aggregate = text.find("collect(").unwrap();
            let filter = text.rfind("WHERE ").unwrap();
            assert!(optional < aggregate && aggregate < filter, "{}", entry.name());
        }
    }

    #[test]
    fn test_overprivileged_query_checks_every_pattern() {
        let query = CatalogQuery::FindOverprivilegedIamRoles.query();
        for (i, pattern) in RISKY_PATTERNS.iter().enumerate() {
            assert!(query.text.contains(pattern.label));
            assert_eq!(
                query.param_value(&format!("risk_{i}")),
                Some(&QueryParam::str_list(pattern.any_of))
            );
        }
        assert_eq!(
            query.param_value("risk_4_requires"),
            Some(&QueryParam::Str(ALLOW_STATEMENT.to_string()))
        );
    }

    #[tokio::test]
    async fn test_public_ec2_instances_are_tagged_high() {
        let runner = StubRunner::new(vec![json!({
            "id": "i-public",
            "region": "us-east-1",
            "publicIp": "54.1.2.3",
            "instanceType": "t3.micro",
            "state": "running",
            "isPublic": true
        })]);

        let result = find_public_ec2_instances(&runner).await.unwrap();
        assert_eq!(result.risk_level, Some(RiskLevel::High));
        assert_eq!(result.summary, "EC2 instances exposed to the public internet");
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].public_ip.as_deref(), Some("54.1.2.3"));
        assert_eq!(
            runner.last_query().param_value("open_cidr"),
            Some(&QueryParam::Str("0.0.0.0/0".to_string()))
        );
    }

    #[tokio::test]
    async fn test_overprivileged_roles_report_all_patterns() {
        let runner = StubRunner::new(vec![json!({
            "name": "admin",
            "arn": "arn:aws:iam::111:role/admin",
            "createDate": "2024-01-01T00:00:00Z",
            "maxSessionDuration": 3600,
            "isOverprivileged": true,
            "riskyPolicies": ["Wildcard Actions", "Wildcard Resources"]
        })]);

        let result = find_overprivileged_iam_roles(&runner).await.unwrap();
        let role = &result.data[0];
        assert!(role.is_overprivileged);
        assert_eq!(
            role.risky_policies.as_deref(),
            Some(&["Wildcard Actions".to_string(), "Wildcard Resources".to_string()][..])
        );
        assert_eq!(role.max_session_duration, Some(3600));
    }

    #[tokio::test]
    async fn test_exposed_resources_sorted_by_risk_type_then_id() {
        let row = |id: &str, kind: &str, risk: &str| {
            json!({"id": id, "type": kind, "region": "unknown", "exposureType": "x", "riskLevel": risk})
        };
        let runner = StubRunner::new(vec![
            row("i-2", "EC2Instance", "HIGH"),
            row("lb-1", "LoadBalancer", "HIGH"),
            row("bucket-b", "S3Bucket", "CRITICAL"),
            row("i-1", "EC2Instance", "HIGH"),
            row("db-1", "RDSInstance", "CRITICAL"),
            row("bucket-a", "S3Bucket", "CRITICAL"),
        ]);

        let result = find_internet_exposed_resources(&runner).await.unwrap();
        let order: Vec<(&str, ExposedResourceType)> = result
            .data
            .iter()
            .map(|r| (r.id.as_str(), r.resource_type))
            .collect();
        assert_eq!(
            order,
            vec![
                ("db-1", ExposedResourceType::RdsInstance),
                ("bucket-a", ExposedResourceType::S3Bucket),
                ("bucket-b", ExposedResourceType::S3Bucket),
                ("i-1", ExposedResourceType::Ec2Instance),
                ("i-2", ExposedResourceType::Ec2Instance),
                ("lb-1", ExposedResourceType::LoadBalancer),
            ]
        );
        assert_eq!(result.risk_level, Some(RiskLevel::High));
    }

    #[tokio::test]
    async fn test_run_json_uses_wire_shape() {
        let runner = StubRunner::new(vec![json!({
            "name": "logs",
            "region": "unknown",
            "creationDate": null,
            "versioningStatus": null,
            "isPublic": false
        })]);

        let value = CatalogQuery::ListS3Buckets.run_json(&runner).await.unwrap();
        assert_eq!(value["summary"], "All S3 buckets in the account");
        assert!(value.get("riskLevel").is_none());
        assert_eq!(value["data"][0]["isPublic"], false);
        assert!(value["data"][0].get("creationDate").is_none());
    }
}
