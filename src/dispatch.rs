// Copyright 2025 Felipe Torres González
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module that wires the pieces together: a chat message comes in, an
//! application form goes out, and the caller gets back a reply to send.

use crate::chat::{find_applicant, parse};
use crate::domain::{
    build_application, resolve_kitta, select_issue, Applicant, ApplicationPayload, ApplyDefaults,
    DispatchError, DispatchOutcome, ProviderError,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Brokerage operations the dispatcher relies on.
///
/// # Description
///
/// The dispatcher only needs two things from the brokerage: the list of
/// issues the user may apply to, and a way to hand in a filled form. Keeping
/// them behind a trait keeps the orchestration independent of the HTTP
/// client; [MeroshareProvider](crate::providers::MeroshareProvider) is the
/// production implementation.
#[async_trait]
pub trait BrokerGateway {
    /// Raw applicable-issue payload, envelope included.
    async fn applicable_issues(&self) -> Result<Value, ProviderError>;

    /// Submits a filled application form, returning the brokerage's reply.
    async fn submit_application(&self, form: &ApplicationPayload) -> Result<Value, ProviderError>;
}

/// Orchestrator for inbound application requests.
///
/// # Description
///
/// One call to [handle_message](IpoDispatcher::handle_message) runs the
/// whole flow: parse the message, resolve the person on the roster, pick the
/// matching open issue, fill the form and submit it. The outcome carries the
/// reply line for the chat transport; typed errors are kept apart from
/// business outcomes so the caller can phrase them differently.
pub struct IpoDispatcher<G> {
    gateway: G,
    defaults: ApplyDefaults,
}

impl<G: BrokerGateway> IpoDispatcher<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_defaults(gateway, ApplyDefaults::default())
    }

    /// Constructor with overridden defaults.
    pub fn with_defaults(gateway: G, defaults: ApplyDefaults) -> Self {
        IpoDispatcher { gateway, defaults }
    }

    /// Processes one chat message against the given applicant roster.
    ///
    /// # Description
    ///
    /// The outcome distinguishes the expected dead ends from a submitted
    /// application:
    /// - [DispatchOutcome::UnknownApplicant] when nobody on the roster
    ///   matches the person named in the message;
    /// - [DispatchOutcome::NoApplicableIssue] when no open issue matches the
    ///   company reference;
    /// - [DispatchOutcome::AlreadyInProcess] when the brokerage already
    ///   holds an application for the selected issue;
    /// - [DispatchOutcome::Applied] once the form was accepted.
    ///
    /// Malformed messages, unrecognised payload shapes and failing brokerage
    /// calls surface as [DispatchError] instead.
    #[instrument(name = "Dispatch a chat request", skip(self, roster))]
    pub async fn handle_message(
        &self,
        message: &str,
        roster: &[Applicant],
    ) -> Result<DispatchOutcome, DispatchError> {
        let parsed = parse(message)?;
        info!("Parsed request: {parsed}");

        let applicant = match find_applicant(&parsed.person, roster) {
            Some(applicant) => applicant,
            None => {
                warn!("Nobody on the roster matches '{}'", parsed.person);
                return Ok(DispatchOutcome::UnknownApplicant {
                    person: parsed.person,
                });
            }
        };

        let payload = self.gateway.applicable_issues().await?;
        let issue = match select_issue(&payload, &parsed.company_query)? {
            Some(issue) => issue,
            None => {
                info!("No applicable issue matches '{}'", parsed.company_query);
                return Ok(DispatchOutcome::NoApplicableIssue {
                    company_query: parsed.company_query,
                });
            }
        };

        if issue.in_process() {
            info!("An application for {issue} is already in process");
            return Ok(DispatchOutcome::AlreadyInProcess {
                person: applicant.name.clone(),
                scrip: issue.scrip,
                company_name: issue.company_name,
            });
        }

        let kitta = resolve_kitta(parsed.kitta, applicant.applied_kitta, &self.defaults);
        let form = build_application(applicant, issue.company_share_id, kitta);

        self.gateway.submit_application(&form).await?;
        info!("Applied {kitta} kitta for {} in {}", applicant.name, issue.scrip);

        Ok(DispatchOutcome::Applied {
            person: applicant.name.clone(),
            scrip: issue.scrip,
            company_name: issue.company_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParseError;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use std::sync::Mutex;

    /// Gateway double serving a canned payload and recording submissions.
    struct StubGateway {
        payload: Value,
        submissions: Mutex<Vec<ApplicationPayload>>,
    }

    impl StubGateway {
        fn new(payload: Value) -> StubGateway {
            StubGateway {
                payload,
                submissions: Mutex::new(Vec::new()),
            }
        }

        fn submitted(&self) -> Vec<ApplicationPayload> {
            self.submissions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BrokerGateway for StubGateway {
        async fn applicable_issues(&self) -> Result<Value, ProviderError> {
            Ok(self.payload.clone())
        }

        async fn submit_application(
            &self,
            form: &ApplicationPayload,
        ) -> Result<Value, ProviderError> {
            self.submissions.lock().unwrap().push(form.clone());
            Ok(json!({"message": "Share applied successfully"}))
        }
    }

    fn issue(id: i64, scrip: &str, name: &str, action: Option<&str>) -> Value {
        json!({
            "companyShareId": id,
            "scrip": scrip,
            "companyName": name,
            "shareGroupName": "Ordinary Shares",
            "statusName": "CREATE_APPROVE",
            "shareTypeName": "IPO",
            "issueOpenDate": "Aug 20, 2025",
            "issueCloseDate": "Aug 25, 2025",
            "action": action
        })
    }

    fn member(name: &str, applied_kitta: Option<u32>) -> Applicant {
        Applicant {
            name: name.to_owned(),
            client_id: "130".to_owned(),
            username: "01234567890123".to_owned(),
            password: "hunter2".to_owned(),
            demat: "1301230001234567".to_owned(),
            account_number: "0123456789012345".to_owned(),
            customer_id: 987654,
            account_branch_id: 44,
            account_type_id: 1,
            crn_number: "CRN-778899".to_owned(),
            transaction_pin: "4321".to_owned(),
            bank_id: "15".to_owned(),
            applied_kitta,
        }
    }

    #[fixture]
    fn roster() -> Vec<Applicant> {
        vec![member("john", None), member("kaka", Some(40))]
    }

    #[fixture]
    fn open_payload() -> Value {
        json!({
            "object": [
                issue(565, "RURU", "Ruru Jalbidhyut Urja Company", None),
                issue(610, "HIMSTAR", "Him Star Hydropower Limited", None),
            ],
            "totalCount": 2
        })
    }

    #[rstest]
    fn a_plain_request_applies_with_the_default_kitta(
        roster: Vec<Applicant>,
        open_payload: Value,
    ) {
        let dispatcher = IpoDispatcher::new(StubGateway::new(open_payload));

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let outcome = dispatcher
                    .handle_message("apply ipo for john in himstar", &roster)
                    .await
                    .unwrap();

                assert_eq!(
                    outcome.to_string(),
                    "✅ IPO applied successfully for john in HIMSTAR (Him Star Hydropower Limited)"
                );

                let submitted = dispatcher.gateway.submitted();
                assert_eq!(submitted.len(), 1);
                assert_eq!(submitted[0].company_share_id, "610");
                assert_eq!(submitted[0].applied_kitta, "10");
                assert_eq!(submitted[0].boid, "01234567890123");
            })
    }

    #[rstest]
    fn the_message_kitta_beats_the_stored_one(roster: Vec<Applicant>, open_payload: Value) {
        let dispatcher = IpoDispatcher::new(StubGateway::new(open_payload));

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                dispatcher
                    .handle_message("apply ipo for kaka in himstar 25 kitta", &roster)
                    .await
                    .unwrap();

                assert_eq!(dispatcher.gateway.submitted()[0].applied_kitta, "25");
            })
    }

    #[rstest]
    fn the_stored_kitta_covers_a_silent_message(roster: Vec<Applicant>, open_payload: Value) {
        let dispatcher = IpoDispatcher::new(StubGateway::new(open_payload));

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                dispatcher
                    .handle_message("apply ipo for kaka in himstar", &roster)
                    .await
                    .unwrap();

                assert_eq!(dispatcher.gateway.submitted()[0].applied_kitta, "40");
            })
    }

    #[rstest]
    fn an_unknown_person_never_reaches_the_brokerage(
        roster: Vec<Applicant>,
        open_payload: Value,
    ) {
        let dispatcher = IpoDispatcher::new(StubGateway::new(open_payload));

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let outcome = dispatcher
                    .handle_message("apply ipo for zorblax in himstar", &roster)
                    .await
                    .unwrap();

                assert_eq!(outcome.to_string(), "❌ No info found for zorblax.");
                assert!(dispatcher.gateway.submitted().is_empty());
            })
    }

    #[rstest]
    fn an_unmatched_company_reports_no_applicable_issue(
        roster: Vec<Applicant>,
        open_payload: Value,
    ) {
        let dispatcher = IpoDispatcher::new(StubGateway::new(open_payload));

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let outcome = dispatcher
                    .handle_message("apply ipo for john in nabil", &roster)
                    .await
                    .unwrap();

                assert_eq!(
                    outcome.to_string(),
                    "❌ No applicable issue found for NABIL"
                );
                assert!(dispatcher.gateway.submitted().is_empty());
            })
    }

    #[rstest]
    fn an_issue_already_in_process_is_not_resubmitted(roster: Vec<Applicant>) {
        let payload = json!({
            "object": [issue(610, "HIMSTAR", "Him Star Hydropower Limited", Some("inProcess"))]
        });
        let dispatcher = IpoDispatcher::new(StubGateway::new(payload));

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let outcome = dispatcher
                    .handle_message("apply ipo for john in himstar", &roster)
                    .await
                    .unwrap();

                assert_eq!(
                    outcome.to_string(),
                    "⚠️ Already filled IPO for Him Star Hydropower Limited (HIMSTAR) for john"
                );
                assert!(dispatcher.gateway.submitted().is_empty());
            })
    }

    #[rstest]
    fn overridden_defaults_flow_into_the_form(roster: Vec<Applicant>, open_payload: Value) {
        let dispatcher = IpoDispatcher::with_defaults(
            StubGateway::new(open_payload),
            ApplyDefaults { kitta: 5 },
        );

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                dispatcher
                    .handle_message("apply ipo for john in himstar", &roster)
                    .await
                    .unwrap();

                assert_eq!(dispatcher.gateway.submitted()[0].applied_kitta, "5");
            })
    }

    #[rstest]
    fn an_unrecognised_payload_shape_is_an_error(roster: Vec<Applicant>) {
        let dispatcher = IpoDispatcher::new(StubGateway::new(json!({"totalCount": 0})));

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let result = dispatcher
                    .handle_message("apply ipo for john in himstar", &roster)
                    .await;

                assert!(matches!(result, Err(DispatchError::Shape(_))));
            })
    }

    #[rstest]
    fn an_empty_message_is_a_parse_error(roster: Vec<Applicant>) {
        let dispatcher = IpoDispatcher::new(StubGateway::new(json!([])));

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let result = dispatcher.handle_message("", &roster).await;

                assert!(matches!(
                    result,
                    Err(DispatchError::Parse(ParseError::InsufficientTokens))
                ));
            })
    }
}
