use serde::Deserialize;
use serde_json::Value;

/// A finding as returned by `GetFindings` (`AwsSecurityFinding`).
///
/// Scalar attributes are typed; nested structures stay as raw JSON so they
/// can be surfaced verbatim in JSON columns.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Finding {
    pub schema_version: Option<String>,
    pub id: Option<String>,
    pub product_arn: Option<String>,
    pub product_name: Option<String>,
    pub company_name: Option<String>,
    pub region: Option<String>,
    pub generator_id: Option<String>,
    pub aws_account_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub first_observed_at: Option<String>,
    pub last_observed_at: Option<String>,
    pub confidence: Option<i64>,
    pub criticality: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub verification_state: Option<String>,
    pub workflow_state: Option<String>,
    pub record_state: Option<String>,
    pub compliance: Option<Value>,
    pub action: Option<Value>,
    pub finding_provider_fields: Option<Value>,
    pub malware: Option<Value>,
    pub network: Option<Value>,
    pub network_path: Option<Value>,
    pub note: Option<Value>,
    pub patch_summary: Option<Value>,
    pub process: Option<Value>,
    pub product_fields: Option<Value>,
    pub related_findings: Option<Value>,
    pub remediation: Option<Value>,
    pub resources: Option<Value>,
    pub severity: Option<Value>,
    pub threat_intel_indicators: Option<Value>,
    pub user_defined_fields: Option<Value>,
    pub vulnerabilities: Option<Value>,
}

impl Finding {
    /// `Compliance.Status`, when the finding came from a standards check.
    pub fn compliance_status(&self) -> Option<&str> {
        self.compliance
            .as_ref()?
            .get("Status")
            .and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_wire_names() {
        let finding: Finding = serde_json::from_value(json!({
            "SchemaVersion": "2018-10-08",
            "Id": "finding-1",
            "AwsAccountId": "123456789012",
            "SourceUrl": "https://example.com",
            "Confidence": 80,
            "Compliance": {"Status": "FAILED", "RelatedRequirements": ["CIS 1.1"]},
            "ProductFields": {"StandardsArn": "arn:aws:securityhub:::standards/cis"},
            "Types": ["Software and Configuration Checks"]
        }))
        .expect("finding should decode");

        assert_eq!(finding.id.as_deref(), Some("finding-1"));
        assert_eq!(finding.aws_account_id.as_deref(), Some("123456789012"));
        assert_eq!(finding.source_url.as_deref(), Some("https://example.com"));
        assert_eq!(finding.confidence, Some(80));
        assert_eq!(finding.compliance_status(), Some("FAILED"));
        assert!(finding.criticality.is_none());
    }

    #[test]
    fn compliance_status_is_absent_without_compliance() {
        assert_eq!(Finding::default().compliance_status(), None);
    }
}
