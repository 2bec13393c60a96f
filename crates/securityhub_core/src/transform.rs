//! Derived column values.

const SECURITY_HUB_ARN_PREFIX: &str = "arn:aws:securityhub";

/// Control ARN for a standards-check finding identifier.
///
/// `arn:aws:securityhub:<region>:<account>:subscription/<standard>/<version>/<control>/finding/<uuid>`
/// becomes `arn:aws:securityhub:<region>:<account>:control/<standard>/<version>/<control>`.
/// Identifiers that are not Security Hub ARNs yield `None`.
pub fn standards_control_arn(finding_id: &str) -> Option<String> {
    if !finding_id.contains(SECURITY_HUB_ARN_PREFIX) {
        return None;
    }

    let prefix = finding_id
        .split_once("/finding")
        .map_or(finding_id, |(head, _)| head);
    Some(prefix.replacen("subscription", "control", 1))
}

/// Partition segment of an ARN (`aws`, `aws-cn`, `aws-us-gov`).
pub fn arn_partition(arn: &str) -> Option<&str> {
    let mut segments = arn.split(':');
    if segments.next()? != "arn" {
        return None;
    }
    segments.next().filter(|partition| !partition.is_empty())
}
