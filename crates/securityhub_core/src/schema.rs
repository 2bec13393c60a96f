//! Column declarations for the `aws_securityhub_finding` table.
//!
//! Every column carries its own projection so rows are built from a static
//! table rather than looked up by field path.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::finding::Finding;
use crate::query::Operator;
use crate::row::{CellValue, Row};
use crate::transform::{arn_partition, standards_control_arn};

pub const TABLE_NAME: &str = "aws_securityhub_finding";
pub const TABLE_DESCRIPTION: &str = "AWS Security Hub Finding";

/// Key column accepted by the single-finding lookup.
pub const GET_KEY_COLUMN: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Int,
    Timestamp,
    Json,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Json => "json",
        }
    }
}

pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub description: &'static str,
    project: fn(&Finding) -> CellValue,
}

impl ColumnDef {
    pub fn project(&self, finding: &Finding) -> CellValue {
        (self.project)(finding)
    }
}

impl std::fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnDef")
            .field("name", &self.name)
            .field("column_type", &self.column_type)
            .finish()
    }
}

/// Operators a column accepts for pushdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumn {
    pub name: &'static str,
    pub operators: &'static [Operator],
}

const STRING_OPERATORS: &[Operator] = &[Operator::Eq, Operator::Ne];
const NUMERIC_OPERATORS: &[Operator] = &[Operator::Eq, Operator::Ge, Operator::Le];

const fn string_key(name: &'static str) -> KeyColumn {
    KeyColumn {
        name,
        operators: STRING_OPERATORS,
    }
}

const fn numeric_key(name: &'static str) -> KeyColumn {
    KeyColumn {
        name,
        operators: NUMERIC_OPERATORS,
    }
}

pub static LIST_KEY_COLUMNS: &[KeyColumn] = &[
    string_key("company_name"),
    string_key("compliance_status"),
    numeric_key("confidence"),
    numeric_key("criticality"),
    string_key("generator_id"),
    string_key("product_arn"),
    string_key("product_name"),
    string_key("record_state"),
    string_key("title"),
    string_key("verification_state"),
    string_key("workflow_state"),
];

pub fn key_column(name: &str) -> Option<&'static KeyColumn> {
    LIST_KEY_COLUMNS.iter().find(|key| key.name == name)
}

fn string(value: &Option<String>) -> CellValue {
    value
        .as_ref()
        .map_or(CellValue::Null, |value| CellValue::String(value.clone()))
}

fn int(value: Option<i64>) -> CellValue {
    value.map_or(CellValue::Null, CellValue::Int)
}

fn timestamp(value: &Option<String>) -> CellValue {
    let Some(raw) = value.as_deref() else {
        return CellValue::Null;
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => CellValue::Timestamp(parsed.with_timezone(&Utc)),
        Err(error) => {
            tracing::debug!(value = raw, %error, "unparseable finding timestamp");
            CellValue::Null
        }
    }
}

fn json(value: &Option<Value>) -> CellValue {
    value
        .as_ref()
        .map_or(CellValue::Null, |value| CellValue::Json(value.clone()))
}

fn opt_string(value: Option<impl Into<String>>) -> CellValue {
    value.map_or(CellValue::Null, |value| CellValue::String(value.into()))
}

pub static COLUMNS: &[ColumnDef] = &[
    ColumnDef {
        name: "id",
        column_type: ColumnType::String,
        description: "The security findings provider-specific identifier for a finding.",
        project: |f| string(&f.id),
    },
    ColumnDef {
        name: "arn",
        column_type: ColumnType::String,
        description: "The Amazon Resource Name (ARN) for the finding.",
        project: |f| string(&f.id),
    },
    ColumnDef {
        name: "company_name",
        column_type: ColumnType::String,
        description: "The name of the company for the product that generated the finding.",
        project: |f| string(&f.company_name),
    },
    ColumnDef {
        name: "confidence",
        column_type: ColumnType::Int,
        description: "A finding's confidence. Confidence is defined as the likelihood that a finding accurately identifies the behavior or issue that it was intended to identify.",
        project: |f| int(f.confidence),
    },
    ColumnDef {
        name: "created_at",
        column_type: ColumnType::Timestamp,
        description: "Indicates when the security-findings provider created the potential security issue that a finding captured.",
        project: |f| timestamp(&f.created_at),
    },
    ColumnDef {
        name: "compliance_status",
        column_type: ColumnType::String,
        description: "The result of a compliance standards check.",
        project: |f| opt_string(f.compliance_status()),
    },
    ColumnDef {
        name: "updated_at",
        column_type: ColumnType::Timestamp,
        description: "Indicates when the security-findings provider last updated the finding record.",
        project: |f| timestamp(&f.updated_at),
    },
    ColumnDef {
        name: "criticality",
        column_type: ColumnType::Int,
        description: "The level of importance assigned to the resources associated with the finding.",
        project: |f| int(f.criticality),
    },
    ColumnDef {
        name: "description",
        column_type: ColumnType::String,
        description: "A finding's description.",
        project: |f| string(&f.description),
    },
    ColumnDef {
        name: "first_observed_at",
        column_type: ColumnType::Timestamp,
        description: "Indicates when the security-findings provider first observed the potential security issue that a finding captured.",
        project: |f| timestamp(&f.first_observed_at),
    },
    ColumnDef {
        name: "generator_id",
        column_type: ColumnType::String,
        description: "The identifier for the solution-specific component (a discrete unit of logic) that generated a finding.",
        project: |f| string(&f.generator_id),
    },
    ColumnDef {
        name: "last_observed_at",
        column_type: ColumnType::Timestamp,
        description: "Indicates when the security-findings provider most recently observed the potential security issue that a finding captured.",
        project: |f| timestamp(&f.last_observed_at),
    },
    ColumnDef {
        name: "product_arn",
        column_type: ColumnType::String,
        description: "The ARN generated by Security Hub that uniquely identifies a product that generates findings.",
        project: |f| string(&f.product_arn),
    },
    ColumnDef {
        name: "product_name",
        column_type: ColumnType::String,
        description: "The name of the product that generated the finding.",
        project: |f| string(&f.product_name),
    },
    ColumnDef {
        name: "record_state",
        column_type: ColumnType::String,
        description: "The record state of a finding.",
        project: |f| string(&f.record_state),
    },
    ColumnDef {
        name: "schema_version",
        column_type: ColumnType::String,
        description: "The schema version that a finding is formatted for.",
        project: |f| string(&f.schema_version),
    },
    ColumnDef {
        name: "source_url",
        column_type: ColumnType::String,
        description: "A URL that links to a page about the current finding in the security-findings provider's solution.",
        project: |f| string(&f.source_url),
    },
    ColumnDef {
        name: "verification_state",
        column_type: ColumnType::String,
        description: "Indicates the veracity of a finding.",
        project: |f| string(&f.verification_state),
    },
    ColumnDef {
        name: "workflow_state",
        column_type: ColumnType::String,
        description: "The workflow state of a finding.",
        project: |f| string(&f.workflow_state),
    },
    ColumnDef {
        name: "standards_control_arn",
        column_type: ColumnType::String,
        description: "The ARN of the security standard control.",
        project: |f| opt_string(f.id.as_deref().and_then(standards_control_arn)),
    },
    ColumnDef {
        name: "action",
        column_type: ColumnType::Json,
        description: "Provides details about an action that affects or that was taken on a resource.",
        project: |f| json(&f.action),
    },
    ColumnDef {
        name: "compliance",
        column_type: ColumnType::Json,
        description: "This data type is exclusive to findings that are generated as the result of a check run against a specific rule in a supported security standard, such as CIS Amazon Web Services Foundations.",
        project: |f| json(&f.compliance),
    },
    ColumnDef {
        name: "finding_provider_fields",
        column_type: ColumnType::Json,
        description: "In a BatchImportFindings request, finding providers use FindingProviderFields to provide and update their own values for confidence, criticality, related findings, severity, and types.",
        project: |f| json(&f.finding_provider_fields),
    },
    ColumnDef {
        name: "malware",
        column_type: ColumnType::Json,
        description: "A list of malware related to a finding.",
        project: |f| json(&f.malware),
    },
    ColumnDef {
        name: "network",
        column_type: ColumnType::Json,
        description: "The details of network-related information about a finding.",
        project: |f| json(&f.network),
    },
    ColumnDef {
        name: "network_path",
        column_type: ColumnType::Json,
        description: "Provides information about a network path that is relevant to a finding. Each entry under NetworkPath represents a component of that path.",
        project: |f| json(&f.network_path),
    },
    ColumnDef {
        name: "note",
        column_type: ColumnType::Json,
        description: "A user-defined note added to a finding.",
        project: |f| json(&f.note),
    },
    ColumnDef {
        name: "patch_summary",
        column_type: ColumnType::Json,
        description: "Provides an overview of the patch compliance status for an instance against a selected compliance standard.",
        project: |f| json(&f.patch_summary),
    },
    ColumnDef {
        name: "process",
        column_type: ColumnType::Json,
        description: "The details of process-related information about a finding.",
        project: |f| json(&f.process),
    },
    ColumnDef {
        name: "product_fields",
        column_type: ColumnType::Json,
        description: "A data type where security-findings providers can include additional solution-specific details that aren't part of the defined AwsSecurityFinding format.",
        project: |f| json(&f.product_fields),
    },
    ColumnDef {
        name: "related_findings",
        column_type: ColumnType::Json,
        description: "A list of related findings.",
        project: |f| json(&f.related_findings),
    },
    ColumnDef {
        name: "remediation",
        column_type: ColumnType::Json,
        description: "A data type that describes the remediation options for a finding.",
        project: |f| json(&f.remediation),
    },
    ColumnDef {
        name: "resources",
        column_type: ColumnType::Json,
        description: "A set of resource data types that describe the resources that the finding refers to.",
        project: |f| json(&f.resources),
    },
    ColumnDef {
        name: "severity",
        column_type: ColumnType::Json,
        description: "A finding's severity.",
        project: |f| json(&f.severity),
    },
    ColumnDef {
        name: "threat_intel_indicators",
        column_type: ColumnType::Json,
        description: "Threat intelligence details related to a finding.",
        project: |f| json(&f.threat_intel_indicators),
    },
    ColumnDef {
        name: "user_defined_fields",
        column_type: ColumnType::Json,
        description: "A list of name/value string pairs associated with the finding.",
        project: |f| json(&f.user_defined_fields),
    },
    ColumnDef {
        name: "vulnerabilities",
        column_type: ColumnType::Json,
        description: "Provides a list of vulnerabilities associated with the findings.",
        project: |f| json(&f.vulnerabilities),
    },
    ColumnDef {
        name: "title",
        column_type: ColumnType::String,
        description: "A finding's title.",
        project: |f| string(&f.title),
    },
    ColumnDef {
        name: "partition",
        column_type: ColumnType::String,
        description: "The AWS partition in which the resource is located (aws, aws-cn, or aws-us-gov).",
        project: |f| opt_string(f.id.as_deref().and_then(arn_partition)),
    },
    ColumnDef {
        name: "region",
        column_type: ColumnType::String,
        description: "The AWS Region in which the resource is located.",
        project: |f| string(&f.region),
    },
    ColumnDef {
        name: "account_id",
        column_type: ColumnType::String,
        description: "The AWS Account ID in which the resource is located.",
        project: |f| string(&f.aws_account_id),
    },
];

pub fn column(name: &str) -> Option<&'static ColumnDef> {
    COLUMNS.iter().find(|column| column.name == name)
}

/// Project `finding` into a row holding `columns`, in the given order.
pub fn project_row(finding: &Finding, columns: &[&'static ColumnDef]) -> Row {
    let mut row = Row::default();
    for column in columns {
        row.push(column.name, column.project(finding));
    }
    row
}
