use securityhub_core::api::GetFindingsResponse;
use securityhub_core::finding::Finding;
use serde_json::json;

pub const ACCOUNT_ID: &str = "123456789012";

pub fn finding_id(index: usize) -> String {
    format!(
        "arn:aws:securityhub:us-east-1:{ACCOUNT_ID}:subscription/cis-aws-foundations-benchmark/v/1.2.0/1.{index}/finding/{index:08x}"
    )
}

pub fn finding(index: usize) -> Finding {
    serde_json::from_value(json!({
        "SchemaVersion": "2018-10-08",
        "Id": finding_id(index),
        "ProductArn": "arn:aws:securityhub:us-east-1::product/aws/securityhub",
        "ProductName": "Security Hub",
        "CompanyName": "AWS",
        "Region": "us-east-1",
        "AwsAccountId": ACCOUNT_ID,
        "GeneratorId": format!("cis-aws-foundations-benchmark/v/1.2.0/1.{index}"),
        "CreatedAt": "2024-03-01T10:00:00.000Z",
        "UpdatedAt": "2024-03-02T10:00:00.000Z",
        "Confidence": 90,
        "Title": format!("CIS control 1.{index}"),
        "Compliance": {"Status": "FAILED"},
        "Severity": {"Label": "LOW", "Normalized": 1},
        "RecordState": "ACTIVE",
        "Workflow": {"Status": "NEW"}
    }))
    .expect("fixture finding should decode")
}

/// Page holding findings `start..start + count`.
pub fn page(start: usize, count: usize, next_token: Option<&str>) -> GetFindingsResponse {
    GetFindingsResponse {
        findings: (start..start + count).map(finding).collect(),
        next_token: next_token.map(str::to_string),
    }
}
