// Copyright 2025 Felipe Torres González
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IPO Dispatch Library
//!
//! This library automates the submission of IPO share applications on the Nepali stock
//! market on behalf of a small roster of applicants. A short chat message such as
//! `apply ipo for john in himstar` is parsed into a structured request, the person is
//! resolved against the roster, the company reference is matched against the open share
//! issues, and a filled application form is handed to the brokerage backend.
//!
//! ## Anatomy of a Request
//!
//! The flow is wired together by the [IpoDispatcher], and each step lives in its own
//! module:
//!
//! - The message parser ([chat::parse]) extracts the person, the company reference and
//!   an optional share quantity (_kitta_) from free text.
//! - The roster lookup ([chat::find_applicant]) resolves the person to a stored
//!   applicant row, tolerating partial names and small typos.
//! - The issue selection ([domain::select_issue]) unwraps the provider's payload
//!   envelope, keeps the issues open for ordinary application, and picks the first one
//!   matching the company reference.
//! - The application form ([domain::build_application]) is filled with the applicant's
//!   account coordinates and submitted through a [BrokerGateway].
//!
//! ## Supported Sources of Data
//!
//! ### [MeroShare](https://meroshare.cdsc.com.np)
//!
//! The MeroShare backend of the CDSC is the brokerage side of the workflow: it lists
//! the issues a user may apply to and receives the application forms. The
//! [providers::MeroshareProvider] covers both endpoints. Sessions are not managed by
//! this library; an authenticated token is injected at construction time.
//!
//! ### [chukul](https://chukul.com)
//!
//! The chukul API supplies the market data side: the offering boards polled to decide
//! whether anything is open for application, and the daily floorsheet. Both are covered
//! by [providers::ChukulProvider].
//!
//! ## Data Base Management
//!
//! The modules within [feeders] are meant to call modules that produce data and push
//! the new data to the private data base. At the moment this covers mirroring the
//! daily floorsheet.

pub mod chat {
    mod message_parser;
    mod roster;

    pub use message_parser::{parse, ParsedMessage};
    pub use roster::find_applicant;
}

pub mod domain {
    mod application;
    mod errors;
    mod floorsheet;
    mod issue;

    pub use application::{
        build_application, resolve_kitta, Applicant, ApplicationPayload, ApplyDefaults,
        DispatchOutcome,
    };
    pub use errors::{DbError, DispatchError, ParseError, ProviderError, ShapeError};
    pub use floorsheet::{
        estimate_total, looks_complete, missing_pages, FloorsheetPage, FloorsheetRow, PAGE_SIZE,
    };
    pub use issue::{
        first_match, partition_eligible, select_issue, unwrap_issue_list, ExclusionReason,
        IssueRecord,
    };
}

pub mod providers {
    mod chukul;
    mod meroshare;

    pub use chukul::{has_open_entry, ChukulProvider, OfferingBoard};
    pub use meroshare::MeroshareProvider;
}

pub mod feeders {
    mod floorsheet_feeder;

    pub use floorsheet_feeder::FloorsheetFeeder;
}

mod dispatch;

pub use dispatch::{BrokerGateway, IpoDispatcher};
