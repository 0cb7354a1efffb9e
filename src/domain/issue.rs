// Copyright 2025 Felipe Torres González
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module that includes the definition of the IssueRecord data object and the
//! logic that selects an applicable issue out of a raw brokerage payload.

use crate::domain::ShapeError;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Envelope keys probed when the provider nests the issue list inside an
/// object. The order is a priority: the first key holding a list wins.
const ENVELOPE_KEYS: [&str; 5] = ["object", "data", "content", "items", "results"];

/// Share group an issue must belong to in order to be applicable.
const ORDINARY_SHARES: &str = "Ordinary Shares";

/// Issue status required for an application to be accepted.
const CREATE_APPROVE: &str = "CREATE_APPROVE";

/// An open share issue as reported by the brokerage.
///
/// # Description
///
/// Records are read straight from the applicable-issue endpoint and are never
/// modified nor persisted by this crate: the selection logic below treats the
/// sequence of records as an immutable input and hands back a reference or a
/// clone of one of its members.
///
/// The payload carries more fields than listed here; unknown ones are
/// ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    /// Identifier the brokerage expects back in an application form.
    pub company_share_id: i64,
    /// Ticker-like code of the listed company.
    pub scrip: String,
    pub company_name: String,
    pub share_group_name: String,
    pub status_name: String,
    pub share_type_name: String,
    pub issue_open_date: String,
    pub issue_close_date: String,
    /// Set to `"inProcess"` by the brokerage while an earlier application for
    /// this issue is still being handled for the logged-in account.
    #[serde(default)]
    pub action: Option<String>,
}

impl IssueRecord {
    /// Whether an application for this issue is already in flight.
    pub fn in_process(&self) -> bool {
        self.action.as_deref() == Some("inProcess")
    }
}

impl fmt::Display for IssueRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.scrip, self.company_name)
    }
}

/// Why a record was dropped by the eligibility filter.
///
/// Exclusions are expected and high volume, so they are reported back to the
/// caller for logging instead of being raised as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// `shareGroupName` is not "Ordinary Shares".
    NotOrdinaryShares,
    /// `statusName` is not "CREATE_APPROVE".
    NotApproved,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::NotOrdinaryShares => write!(f, "share group is not ordinary shares"),
            ExclusionReason::NotApproved => write!(f, "status is not CREATE_APPROVE"),
        }
    }
}

/// Unwraps the raw applicable-issue payload into typed records.
///
/// # Description
///
/// Depending on the endpoint version, the brokerage returns either a bare
/// list of issues or an object nesting that list under one of a handful of
/// known keys. The keys are probed in a fixed priority order and the first
/// one holding a list wins; a bare list is used as is.
///
/// # Returns
///
/// The typed records on success. Entries inside a well-shaped list that do
/// not deserialize into an [IssueRecord] are skipped with a warning, as they
/// represent single corrupt rows rather than an unusable payload.
///
/// A [ShapeError] is returned when the payload is an object without any known
/// list-valued key, or not an object at all.
pub fn unwrap_issue_list(payload: &Value) -> Result<Vec<IssueRecord>, ShapeError> {
    let entries = match payload {
        Value::Array(entries) => entries,
        Value::Object(map) => {
            match ENVELOPE_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array))
            {
                Some(entries) => entries,
                None => return Err(ShapeError::UnknownEnvelope(map.keys().cloned().collect())),
            }
        }
        other => return Err(ShapeError::NotAList(json_type_name(other).to_owned())),
    };

    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        match IssueRecord::deserialize(entry) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping a malformed issue entry: {e}"),
        }
    }

    Ok(records)
}

/// Splits records into the applicable subset and the excluded remainder.
///
/// Input order is preserved on both sides. Exclusions come paired with the
/// reason so the caller can log them without this function taking a logger.
pub fn partition_eligible(
    records: &[IssueRecord],
) -> (Vec<&IssueRecord>, Vec<(&IssueRecord, ExclusionReason)>) {
    let mut eligible = Vec::new();
    let mut excluded = Vec::new();

    for record in records {
        if record.share_group_name != ORDINARY_SHARES {
            excluded.push((record, ExclusionReason::NotOrdinaryShares));
        } else if record.status_name != CREATE_APPROVE {
            excluded.push((record, ExclusionReason::NotApproved));
        } else {
            eligible.push(record);
        }
    }

    (eligible, excluded)
}

/// First record whose scrip or company name contains the query.
///
/// Containment is checked case-insensitively and the list order decides ties:
/// there is no scoring, the first accepted record is the answer.
pub fn first_match<'a>(
    eligible: &[&'a IssueRecord],
    company_query: &str,
) -> Option<&'a IssueRecord> {
    let query = company_query.to_lowercase();

    eligible.iter().copied().find(|record| {
        record.scrip.to_lowercase().contains(&query)
            || record.company_name.to_lowercase().contains(&query)
    })
}

/// Selects the issue to apply for out of a raw payload.
///
/// # Description
///
/// Composition of the three steps above: unwrap the payload, drop records
/// outside the ordinary-share/approved window (logging each exclusion at
/// debug level), and take the first remaining record matching the company
/// query. An exhausted list is a regular `None`, not an error: the caller is
/// expected to reply "no applicable issue found".
pub fn select_issue(
    payload: &Value,
    company_query: &str,
) -> Result<Option<IssueRecord>, ShapeError> {
    let records = unwrap_issue_list(payload)?;
    let (eligible, excluded) = partition_eligible(&records);

    for (record, reason) in &excluded {
        debug!("Skipping {record}: {reason}");
    }

    if eligible.is_empty() {
        debug!(
            "No applicable issue left after filtering {} candidates",
            records.len()
        );
        return Ok(None);
    }

    Ok(first_match(&eligible, company_query).cloned())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
