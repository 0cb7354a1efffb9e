// Copyright 2025 Felipe Torres González
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module that includes code related to the extraction of market data from
//! the [chukul](https://chukul.com) API: the offering boards watched for open
//! issues, and the daily floorsheet.

use crate::domain::{FloorsheetPage, ProviderError};
use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;
use tracing::{debug, error, info, instrument, trace, warn};

/// The endpoint rejects requests without a browser-looking agent.
const AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Handler to extract market data from the chukul API.
///
/// # Description
///
/// This object covers the two endpoints the workflow relies on:
/// - The offering boards ([OfferingBoard]), polled to decide whether any
///   issue is currently open for application.
/// - The daily floorsheet, served date by date in pages of
///   [PAGE_SIZE](crate::domain::PAGE_SIZE) records.
///
/// All responses are plain JSON; no session or authentication is involved.
pub struct ChukulProvider {
    /// The main path of the URL.
    base_url: String,
    /// Path extension for the floorsheet-by-date endpoint.
    floorsheet_ext: String,
    client: reqwest::Client,
}

/// Offering boards checked for open issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferingBoard {
    /// Initial public offerings.
    Ipo,
    /// Follow-on public offerings.
    Fpo,
    /// Right shares offered to existing holders.
    RightShare,
}

impl OfferingBoard {
    /// All boards, in the order they are scanned.
    pub const ALL: [OfferingBoard; 3] = [
        OfferingBoard::Ipo,
        OfferingBoard::Fpo,
        OfferingBoard::RightShare,
    ];

    /// Path extension of the board's listing endpoint.
    fn ext(&self) -> &'static str {
        match self {
            OfferingBoard::Ipo => "/api/ipo/",
            OfferingBoard::Fpo => "/api/fpo/",
            OfferingBoard::RightShare => "/api/right-share/",
        }
    }
}

impl fmt::Display for OfferingBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferingBoard::Ipo => write!(f, "IPO"),
            OfferingBoard::Fpo => write!(f, "FPO"),
            OfferingBoard::RightShare => write!(f, "Right-Share"),
        }
    }
}

/// Whether a board listing contains at least one entry open for application.
///
/// The payload is expected to be a bare list of entries carrying a `status`
/// field; anything else counts as no open entry.
pub fn has_open_entry(payload: &Value) -> bool {
    payload
        .as_array()
        .map(|entries| entries.iter().any(|entry| entry["status"] == "Open"))
        .unwrap_or(false)
}

impl Default for ChukulProvider {
    /// Default implementation delegates to [ChukulProvider::new].
    fn default() -> Self {
        Self::new()
    }
}

impl ChukulProvider {
    /// Class constructor.
    pub fn new() -> ChukulProvider {
        Self::with_base_url("https://chukul.com")
    }

    /// Constructor pointing the provider at a non-default host.
    pub fn with_base_url(base_url: impl Into<String>) -> ChukulProvider {
        ChukulProvider {
            base_url: base_url.into(),
            floorsheet_ext: String::from("/api/data/v2/floorsheet/bydate/"),
            client: reqwest::Client::new(),
        }
    }

    /// Internal method that executes a GET against the chukul API.
    ///
    /// # Description
    ///
    /// No content checking is performed beyond assuring that the HTTP request
    /// succeeds (200) and that the body decodes as JSON. The following errors
    /// might happen:
    /// - [ProviderError::ExternalError] when the request fails or comes back
    ///   with a non-200 status.
    /// - [ProviderError::InternalError] when the body is not valid JSON.
    async fn get_json(&self, url: String) -> Result<Value, ProviderError> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", AGENT)
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

    /// Whether the given board currently lists an open issue.
    #[instrument(name = "Check an offering board", skip(self))]
    pub async fn board_is_open(&self, board: OfferingBoard) -> Result<bool, ProviderError> {
        let payload = self
            .get_json(format!("{}{}", self.base_url, board.ext()))
            .await?;

        Ok(has_open_entry(&payload))
    }

    /// Scans all the offering boards and reports whether any lists an open
    /// issue.
    ///
    /// # Description
    ///
    /// The scan stops at the first open board. A board that cannot be
    /// checked is logged and skipped rather than aborting the scan, so a
    /// single flaky endpoint does not mask an open issue elsewhere.
    #[instrument(name = "Scan the offering boards", skip(self))]
    pub async fn any_board_open(&self) -> bool {
        for board in OfferingBoard::ALL {
            match self.board_is_open(board).await {
                Ok(true) => {
                    info!("The {board} board lists an open issue");
                    return true;
                }
                Ok(false) => debug!("No open issue on the {board} board"),
                Err(e) => warn!("The {board} board could not be checked: {e}"),
            }
        }

        false
    }

    /// Fetches one page of the floorsheet for a trading date.
    #[instrument(name = "Fetch a floorsheet page", skip(self))]
    pub async fn floorsheet_page(
        &self,
        date: NaiveDate,
        page: u64,
        size: u64,
    ) -> Result<FloorsheetPage, ProviderError> {
        let url = format!(
            "{}{}?date={date}&page={page}&size={size}",
            self.base_url, self.floorsheet_ext
        );
        let payload = self.get_json(url).await?;

        serde_json::from_value(payload).map_err(|e| ProviderError::InternalError(e.to_string()))
    }
}
