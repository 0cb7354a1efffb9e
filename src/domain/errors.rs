// Copyright 2025 Felipe Torres González
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module with definitions for custom error types.

use thiserror::Error;

/// Error types for the chat message parser.
///
/// A `ParseError` means the inbound text could not be decomposed into a person
/// and a company token. Callers are expected to answer the sender with a
/// "couldn't understand your request" style reply rather than escalate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The message holds fewer than two meaningful tokens once the template
    /// keywords and the kitta clause are removed.
    #[error("insufficient tokens")]
    InsufficientTokens,
    /// A kitta clause was spotted but its quantity does not fit a share count.
    #[error("unreadable kitta quantity: {0}")]
    InvalidKitta(String),
}

/// Error raised when the applicable-issue payload matches no known envelope.
///
/// The brokerage wraps the issue list under a handful of keys depending on the
/// endpoint version. When none of them holds a list, the payload is unusable
/// and the caller should surface a provider-side error, not an empty result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The payload is an object, but no known key holds a list.
    #[error("no issue list under any known key (found keys: {0:?})")]
    UnknownEnvelope(Vec<String>),
    /// The payload is neither a list nor an object.
    #[error("issue payload is not a list or an object (found {0})")]
    NotAList(String),
}

/// Error types for the HTTP data providers (CDSC MeroShare and Chukul).
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error from the external API.
    #[error("external API error: {0}")]
    ExternalError(String),
    /// Error for the internal methods.
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Error types for the floorsheet data base feeder.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("data base error: {0}")]
    Unknown(String),
}

/// Umbrella error for the end-to-end dispatch flow.
///
/// Each variant keeps its source so the chat transport can pick the right
/// reply: a [ParseError] maps to a "couldn't understand" message, the other
/// two to an internal/provider error notice.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("could not understand the request: {0}")]
    Parse(#[from] ParseError),
    #[error("unusable issue payload: {0}")]
    Shape(#[from] ShapeError),
    #[error("provider failure: {0}")]
    Provider(#[from] ProviderError),
}
