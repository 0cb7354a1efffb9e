// Copyright 2025 Felipe Torres González
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module that includes code related to the MeroShare brokerage backend:
//! listing the issues a user may apply to, and submitting application forms.

use crate::dispatch::BrokerGateway;
use crate::domain::{ApplicationPayload, ProviderError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, instrument, trace};

/// The backend rejects requests without a browser-looking agent.
const AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Client for the MeroShare brokerage backend.
///
/// # Description
///
/// This object talks to the two endpoints the application workflow needs:
/// the applicable-issue listing and the share-apply form. Both require an
/// authenticated session; obtaining one is outside the scope of this crate,
/// so the session token is injected at construction time and sent verbatim
/// in the `Authorization` header, the way the backend expects it.
pub struct MeroshareProvider {
    /// The main path of the URL.
    base_url: String,
    /// Path extension for the applicable-issue endpoint.
    issues_ext: String,
    /// Path extension for the share-apply endpoint.
    apply_ext: String,
    /// Session token of an already authenticated user.
    token: String,
    client: reqwest::Client,
}

/// `enum` to handle what endpoints of the MeroShare backend are supported by
/// this module.
#[derive(Debug)]
enum EndpointSel {
    /// EP -> `companyShare/applicableIssue`
    IssuesEP,
    /// EP -> `applicantForm/share/apply`
    ApplyEP,
}

impl MeroshareProvider {
    /// Class constructor.
    pub fn new(token: impl Into<String>) -> MeroshareProvider {
        Self::with_base_url("https://webbackend.cdsc.com.np", token)
    }

    /// Constructor pointing the provider at a non-default host.
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> MeroshareProvider {
        MeroshareProvider {
            base_url: base_url.into(),
            issues_ext: String::from("/api/meroShare/companyShare/applicableIssue/"),
            apply_ext: String::from("/api/meroShare/applicantForm/share/apply"),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Filter body the applicable-issue endpoint expects alongside the
    /// request. The field list is fixed; only the paging is meaningful.
    fn issue_filter() -> Value {
        json!({
            "filterFieldParams": [
                {"key": "companyIssue.companyISIN.script", "alias": "Scrip"},
                {"key": "companyIssue.companyISIN.company.name", "alias": "Company Name"},
                {"key": "companyIssue.assignedToClient.name", "value": "", "alias": "Issue Manager"}
            ],
            "page": 1,
            "size": 10,
            "searchRoleViewConstants": "VIEW_APPLICABLE_SHARE",
            "filterDateParams": [
                {"key": "minIssueOpenDate", "condition": "", "alias": "", "value": ""},
                {"key": "maxIssueCloseDate", "condition": "", "alias": "", "value": ""}
            ]
        })
    }

    /// Internal method that executes a POST to the MeroShare backend.
    ///
    /// # Description
    ///
    /// This method's implementation is generic, so it shall be used for any
    /// supported endpoint of the backend. See [EndpointSel] for the full
    /// list. The response body is handed back as raw JSON; unwrapping the
    /// envelope is left to the caller.
    ///
    /// The following errors might happen:
    /// - [ProviderError::ExternalError] when the request fails or comes back
    ///   with a non-200 status.
    /// - [ProviderError::InternalError] when the body is not valid JSON.
    #[instrument(name = "Post to the MeroShare backend", skip(self, body))]
    async fn post_json(&self, endpoint: EndpointSel, body: &Value) -> Result<Value, ProviderError> {
        let endpoint = match endpoint {
            EndpointSel::IssuesEP => &self.issues_ext[..],
            EndpointSel::ApplyEP => &self.apply_ext[..],
        };

        let resp = self
            .client
            .post(format!("{}{endpoint}", self.base_url))
            .header("Authorization", &self.token)
            .header("User-Agent", AGENT)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::ExternalError(e.to_string()))?;

        if resp.status().as_u16() != 200 {
            let error_string = resp.status().as_str().to_string();
            error!("Error found during the request: {error_string}");
            Err(ProviderError::ExternalError(error_string))
        } else {
            let payload = resp
                .json::<Value>()
                .await
                .map_err(|e| ProviderError::InternalError(e.to_string()))?;
            trace!("Response: {:?}", payload);
            Ok(payload)
        }
    }
}

#[async_trait]
impl BrokerGateway for MeroshareProvider {
    /// Raw applicable-issue payload for the authenticated user, envelope
    /// included.
    #[instrument(name = "Fetch the applicable issues", skip(self))]
    async fn applicable_issues(&self) -> Result<Value, ProviderError> {
        self.post_json(EndpointSel::IssuesEP, &Self::issue_filter())
            .await
    }

    /// Submits a filled application form.
    #[instrument(
        name = "Submit an application form",
        skip(self, form),
        fields(company_share_id = %form.company_share_id)
    )]
    async fn submit_application(&self, form: &ApplicationPayload) -> Result<Value, ProviderError> {
        let body =
            serde_json::to_value(form).map_err(|e| ProviderError::InternalError(e.to_string()))?;

        self.post_json(EndpointSel::ApplyEP, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn a_form() -> ApplicationPayload {
        ApplicationPayload {
            demat: "1301230001234567".to_owned(),
            boid: "01234567890123".to_owned(),
            account_number: "0123456789012345".to_owned(),
            customer_id: 987654,
            account_branch_id: 44,
            account_type_id: 1,
            applied_kitta: "10".to_owned(),
            crn_number: "CRN-778899".to_owned(),
            transaction_pin: "4321".to_owned(),
            company_share_id: "610".to_owned(),
            bank_id: "15".to_owned(),
        }
    }

    #[rstest]
    fn applicable_issues_carry_the_session_token() {
        let server = MockServer::start();
        let issues = server.mock(|when, then| {
            when.method(POST)
                .path("/api/meroShare/companyShare/applicableIssue/")
                .header("Authorization", "token-123")
                .json_body_partial(r#"{"searchRoleViewConstants": "VIEW_APPLICABLE_SHARE"}"#);
            then.status(200)
                .json_body(json!({"object": [], "totalCount": 0}));
        });

        let provider = MeroshareProvider::with_base_url(server.base_url(), "token-123");

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let payload = provider.applicable_issues().await.unwrap();
                assert_eq!(payload["totalCount"], 0);
            });

        issues.assert();
    }

    #[rstest]
    fn the_form_travels_in_the_wire_format(a_form: ApplicationPayload) {
        let server = MockServer::start();
        let apply = server.mock(|when, then| {
            when.method(POST)
                .path("/api/meroShare/applicantForm/share/apply")
                .header("Authorization", "token-123")
                .json_body(json!({
                    "demat": "1301230001234567",
                    "boid": "01234567890123",
                    "accountNumber": "0123456789012345",
                    "customerId": 987654,
                    "accountBranchId": 44,
                    "accountTypeId": 1,
                    "appliedKitta": "10",
                    "crnNumber": "CRN-778899",
                    "transactionPIN": "4321",
                    "companyShareId": "610",
                    "bankId": "15"
                }));
            then.status(200)
                .json_body(json!({"message": "Share applied successfully"}));
        });

        let provider = MeroshareProvider::with_base_url(server.base_url(), "token-123");

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let reply = provider.submit_application(&a_form).await.unwrap();
                assert_eq!(reply["message"], "Share applied successfully");
            });

        apply.assert();
    }

    #[rstest]
    fn a_rejected_submission_surfaces_the_status(a_form: ApplicationPayload) {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/api/meroShare/applicantForm/share/apply");
            then.status(409);
        });

        let provider = MeroshareProvider::with_base_url(server.base_url(), "token-123");

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let result = provider.submit_application(&a_form).await;

                match result {
                    Err(ProviderError::ExternalError(status)) => assert_eq!(status, "409"),
                    other => panic!("expected an external error, got {:?}", other),
                }
            });
    }
}
