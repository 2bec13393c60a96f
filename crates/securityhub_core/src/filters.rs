//! Translation of query predicates into a Security Hub finding filter.
//!
//! Only string columns participate. `confidence` and `criticality` advertise
//! `>=`/`<=` pushdown in the schema, but no numeric range filter is built for
//! them here: those predicates reach the service unfiltered and the host
//! engine has to apply them to the returned rows.

use serde::{Deserialize, Serialize};

use crate::query::{Operator, QualMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StringFilterComparison {
    Equals,
    NotEquals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StringFilter {
    pub comparison: StringFilterComparison,
    pub value: String,
}

impl StringFilter {
    pub fn equals(value: impl Into<String>) -> Self {
        Self {
            comparison: StringFilterComparison::Equals,
            value: value.into(),
        }
    }

    pub fn not_equals(value: impl Into<String>) -> Self {
        Self {
            comparison: StringFilterComparison::NotEquals,
            value: value.into(),
        }
    }
}

/// Subset of `AwsSecurityFindingFilters` this adapter populates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FindingFilters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub id: Vec<StringFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub company_name: Vec<StringFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compliance_status: Vec<StringFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generator_id: Vec<StringFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_arn: Vec<StringFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_name: Vec<StringFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub record_state: Vec<StringFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub title: Vec<StringFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_state: Vec<StringFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflow_state: Vec<StringFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Id,
    CompanyName,
    ComplianceStatus,
    GeneratorId,
    ProductArn,
    ProductName,
    RecordState,
    Title,
    VerificationState,
    WorkflowState,
}

/// String columns translated into the remote filter, with their target field.
pub const STRING_FILTER_COLUMNS: [(&str, FilterField); 9] = [
    ("company_name", FilterField::CompanyName),
    ("compliance_status", FilterField::ComplianceStatus),
    ("generator_id", FilterField::GeneratorId),
    ("product_arn", FilterField::ProductArn),
    ("product_name", FilterField::ProductName),
    ("record_state", FilterField::RecordState),
    ("title", FilterField::Title),
    ("verification_state", FilterField::VerificationState),
    ("workflow_state", FilterField::WorkflowState),
];

impl FindingFilters {
    /// Filter matching exactly one finding identifier.
    pub fn for_id(id: &str) -> Self {
        Self {
            id: vec![StringFilter::equals(id)],
            ..Self::default()
        }
    }

    pub fn field(&self, field: FilterField) -> &[StringFilter] {
        match field {
            FilterField::Id => &self.id,
            FilterField::CompanyName => &self.company_name,
            FilterField::ComplianceStatus => &self.compliance_status,
            FilterField::GeneratorId => &self.generator_id,
            FilterField::ProductArn => &self.product_arn,
            FilterField::ProductName => &self.product_name,
            FilterField::RecordState => &self.record_state,
            FilterField::Title => &self.title,
            FilterField::VerificationState => &self.verification_state,
            FilterField::WorkflowState => &self.workflow_state,
        }
    }

    fn field_mut(&mut self, field: FilterField) -> &mut Vec<StringFilter> {
        match field {
            FilterField::Id => &mut self.id,
            FilterField::CompanyName => &mut self.company_name,
            FilterField::ComplianceStatus => &mut self.compliance_status,
            FilterField::GeneratorId => &mut self.generator_id,
            FilterField::ProductArn => &mut self.product_arn,
            FilterField::ProductName => &mut self.product_name,
            FilterField::RecordState => &mut self.record_state,
            FilterField::Title => &mut self.title,
            FilterField::VerificationState => &mut self.verification_state,
            FilterField::WorkflowState => &mut self.workflow_state,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Number of individual string filters across every field.
    pub fn len(&self) -> usize {
        [FilterField::Id]
            .into_iter()
            .chain(STRING_FILTER_COLUMNS.iter().map(|(_, field)| *field))
            .map(|field| self.field(field).len())
            .sum()
    }
}

/// Build the remote filter for a list call from the query predicates.
///
/// Empty string values and operators other than `=`/`<>` are skipped.
/// Several predicates on one column accumulate in order.
pub fn build_finding_filters(quals: &QualMap) -> FindingFilters {
    let mut filters = FindingFilters::default();

    for (name, field) in STRING_FILTER_COLUMNS {
        let Some(column_quals) = quals.get(name) else {
            continue;
        };

        for qual in column_quals {
            let Some(value) = qual.value.as_str().filter(|value| !value.is_empty()) else {
                continue;
            };

            let filter = match qual.operator {
                Operator::Eq => StringFilter::equals(value),
                Operator::Ne => StringFilter::not_equals(value),
                Operator::Ge | Operator::Le => continue,
            };
            filters.field_mut(field).push(filter);
        }
    }

    filters
}
