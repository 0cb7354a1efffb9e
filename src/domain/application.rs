// Copyright 2025 Felipe Torres González
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module with the application-side data objects: the stored applicant row,
//! kitta resolution, the submission form and the outcome reported back to
//! the chat transport.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Values applied when neither the message nor the applicant's stored row
/// provides one.
///
/// Passed explicitly into the dispatch flow so tests can override it; the
/// stock default mirrors the household rule of ten kitta per application.
#[derive(Debug, Clone)]
pub struct ApplyDefaults {
    /// Share quantity used when no kitta is given anywhere.
    pub kitta: u32,
}

impl Default for ApplyDefaults {
    fn default() -> Self {
        ApplyDefaults { kitta: 10 }
    }
}

/// A stored applicant row.
///
/// # Description
///
/// Carries the credentials and account coordinates needed to fill an
/// application form on someone's behalf. Rows are maintained in an external
/// credential sheet and handed over by the enclosing service; this crate only
/// reads them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    /// Short name people use in chat messages.
    pub name: String,
    /// Depository participant id used at login.
    pub client_id: String,
    /// The BOID, which doubles as the login username.
    pub username: String,
    pub password: String,
    pub demat: String,
    pub account_number: String,
    pub customer_id: i64,
    pub account_branch_id: i64,
    pub account_type_id: i64,
    pub crn_number: String,
    #[serde(rename = "transactionPIN")]
    pub transaction_pin: String,
    pub bank_id: String,
    /// Preferred kitta from the stored row; empty cells come through unset.
    #[serde(default)]
    pub applied_kitta: Option<u32>,
}

/// Resolves the kitta to apply for.
///
/// The message takes priority over the stored row, and the configured default
/// closes the gap when both are silent.
pub fn resolve_kitta(
    message_kitta: Option<u32>,
    stored_kitta: Option<u32>,
    defaults: &ApplyDefaults,
) -> u32 {
    message_kitta.or(stored_kitta).unwrap_or(defaults.kitta)
}

/// Application form submitted to the brokerage.
///
/// Field spelling and quoting follow the wire format the endpoint expects:
/// `appliedKitta` and `companyShareId` travel as strings while the three
/// account discriminators stay numeric, and the PIN key is fully capitalised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPayload {
    pub demat: String,
    pub boid: String,
    pub account_number: String,
    pub customer_id: i64,
    pub account_branch_id: i64,
    pub account_type_id: i64,
    pub applied_kitta: String,
    pub crn_number: String,
    #[serde(rename = "transactionPIN")]
    pub transaction_pin: String,
    pub company_share_id: String,
    pub bank_id: String,
}

/// Fills an application form for the given issue on the applicant's behalf.
pub fn build_application(
    applicant: &Applicant,
    company_share_id: i64,
    kitta: u32,
) -> ApplicationPayload {
    ApplicationPayload {
        demat: applicant.demat.clone(),
        boid: applicant.username.clone(),
        account_number: applicant.account_number.clone(),
        customer_id: applicant.customer_id,
        account_branch_id: applicant.account_branch_id,
        account_type_id: applicant.account_type_id,
        applied_kitta: kitta.to_string(),
        crn_number: applicant.crn_number.clone(),
        transaction_pin: applicant.transaction_pin.clone(),
        company_share_id: company_share_id.to_string(),
        bank_id: applicant.bank_id.clone(),
    }
}

/// What happened to an inbound application request.
///
/// The `Display` rendering is the operator-facing reply line the chat
/// transport sends back verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The application form was accepted by the brokerage.
    Applied {
        person: String,
        scrip: String,
        company_name: String,
    },
    /// The brokerage already holds an application for this issue.
    AlreadyInProcess {
        person: String,
        scrip: String,
        company_name: String,
    },
    /// No open issue passed the filter and matched the company reference.
    NoApplicableIssue { company_query: String },
    /// The person named in the message is not on the roster.
    UnknownApplicant { person: String },
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Applied {
                person,
                scrip,
                company_name,
            } => write!(
                f,
                "✅ IPO applied successfully for {person} in {scrip} ({company_name})"
            ),
            DispatchOutcome::AlreadyInProcess {
                person,
                scrip,
                company_name,
            } => write!(
                f,
                "⚠️ Already filled IPO for {company_name} ({scrip}) for {person}"
            ),
            DispatchOutcome::NoApplicableIssue { company_query } => write!(
                f,
                "❌ No applicable issue found for {}",
                company_query.to_uppercase()
            ),
            DispatchOutcome::UnknownApplicant { person } => {
                write!(f, "❌ No info found for {person}.")
            }
        }
    }
}
