// Copyright 2025 Felipe Torres González
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module that turns a free-text chat message into a structured application
//! request: who applies, for which company, and optionally for how many kitta.

use crate::domain::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Words that structure a message but never name a person or a company.
const KEYWORDS: [&str; 9] = [
    "apply", "appy", "ipo", "for", "in", "company", "the", "a", "an",
];

/// Structured content of an inbound chat message.
///
/// # Description
///
/// A message names a person from the applicant roster, references a company
/// by scrip or by (part of) its name, and may fix the share quantity. All
/// text is folded to lowercase; the roster lookup and the issue matching
/// downstream are case-insensitive as well, so nothing is lost.
///
/// The value is derived once per message and dropped after dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Short name of the applicant, as written in the message.
    pub person: String,
    /// Free-text company reference, matched against scrip and company name.
    pub company_query: String,
    /// Share quantity from the message, when one was given.
    pub kitta: Option<u32>,
}

impl fmt::Display for ParsedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kitta {
            Some(kitta) => write!(f, "{} -> {} ({} kitta)", self.person, self.company_query, kitta),
            None => write!(f, "{} -> {}", self.person, self.company_query),
        }
    }
}

/// Parses a chat message into a [ParsedMessage].
///
/// # Description
///
/// The share quantity is recognised first, via an `<integer> kitta` clause
/// anywhere in the message, and removed before the wording is examined.
/// The remaining text is tried against an ordered list of templates, the
/// more explicit wordings first:
///
/// - `apply ipo for <person> for company <company>`
/// - `apply ipo for <person> in <company>`
/// - `ipo <person> <company>`
/// - `for <person> <company>`
/// - `<person> <company> <N>` (keyword-free messages only; a trailing
///   integer counts as the kitta here)
///
/// When no template matches, a token rule takes over: the first word that is
/// not a structural keyword names the person and whatever follows, keywords
/// removed, names the company. Messages with fewer than two meaningful
/// tokens fail with [ParseError::InsufficientTokens].
pub fn parse(message: &str) -> Result<ParsedMessage, ParseError> {
    static KITTA_CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s+kitta\b").unwrap());

    let mut text = normalize(message);

    if text.is_empty() {
        return Err(ParseError::InsufficientTokens);
    }

    let mut kitta = None;
    if let Some(caps) = KITTA_CLAUSE.captures(&text) {
        let raw = &caps[1];
        kitta = Some(
            raw.parse::<u32>()
                .map_err(|_| ParseError::InvalidKitta(raw.to_owned()))?,
        );
        text = normalize(&KITTA_CLAUSE.replace_all(&text, " "));
    }

    if let Some((person, company)) = match_template(&text) {
        if let Some(company_query) = scrub_company(&company) {
            return Ok(ParsedMessage {
                person,
                company_query,
                kitta,
            });
        }
    }

    if let Some((person, company, trailing)) = match_bare_pair(&text) {
        if let Some(company_query) = scrub_company(&company) {
            return Ok(ParsedMessage {
                person,
                company_query,
                // An explicit kitta clause beats the trailing count.
                kitta: kitta.or(trailing),
            });
        }
    }

    match_tokens(&text, kitta).ok_or(ParseError::InsufficientTokens)
}

/// Folds the message to lowercase, maps punctuation to spaces and collapses
/// runs of whitespace, so the templates only ever see single-spaced words.
fn normalize(message: &str) -> String {
    message
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tries the keyword-led templates in priority order and hands back the
/// person and company captures of the first one that matches.
fn match_template(text: &str) -> Option<(String, String)> {
    static TEMPLATES: Lazy<[Regex; 4]> = Lazy::new(|| {
        [
            // apply ipo for <person> for company <company>
            Regex::new(
                r"^(?:appy|apply)\s+(?:ipo\s+)?for\s+([a-z]+(?:\s+[a-z]+)*?)\s+(?:for\s+)?company\s+([a-z0-9][a-z0-9\s]*)$",
            )
            .unwrap(),
            // apply ipo for <person> in <company>
            Regex::new(
                r"^(?:appy|apply)\s+(?:ipo\s+)?for\s+([a-z]+(?:\s+[a-z]+)*?)\s+in\s+([a-z0-9][a-z0-9\s]*)$",
            )
            .unwrap(),
            // ipo <person> <company>
            Regex::new(r"^ipo\s+([a-z]+)\s+([a-z0-9][a-z0-9\s]*)$").unwrap(),
            // for <person> <company>
            Regex::new(r"^for\s+([a-z]+)\s+([a-z0-9][a-z0-9\s]*)$").unwrap(),
        ]
    });

    TEMPLATES.iter().find_map(|template| {
        template
            .captures(text)
            .map(|caps| (caps[1].to_owned(), caps[2].to_owned()))
    })
}

/// Matches the keyword-free `<person> <company>` wording, where a trailing
/// integer fixes the kitta. Declines as soon as any structural keyword is
/// present, so `apply john 30` never reads 30 as a quantity.
fn match_bare_pair(text: &str) -> Option<(String, String, Option<u32>)> {
    static BARE_PAIR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^([a-z]+)\s+([a-z0-9][a-z0-9\s]*?)(?:\s+(\d+))?$").unwrap());

    if text.split_whitespace().any(|token| KEYWORDS.contains(&token)) {
        return None;
    }

    BARE_PAIR.captures(text).map(|caps| {
        let trailing = caps
            .get(3)
            .and_then(|count| count.as_str().parse::<u32>().ok());
        (caps[1].to_owned(), caps[2].to_owned(), trailing)
    })
}

/// Last-resort token rule: the first non-keyword word is the person, the
/// rest of the message with keywords removed is the company.
fn match_tokens(text: &str, kitta: Option<u32>) -> Option<ParsedMessage> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    let person_idx = tokens.iter().position(|token| {
        !KEYWORDS.contains(token) && token.chars().all(|c| c.is_ascii_alphabetic())
    })?;

    let company = tokens[person_idx + 1..]
        .iter()
        .filter(|token| !KEYWORDS.contains(*token))
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    scrub_company(&company).map(|company_query| ParsedMessage {
        person: tokens[person_idx].to_owned(),
        company_query,
        kitta,
    })
}

/// Drops a stray leading or trailing structural word from a captured company
/// reference. An empty result means no company could be isolated.
fn scrub_company(raw: &str) -> Option<String> {
    static LEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:for|in|company)\s+").unwrap());
    static TRAILING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+(?:for|in|company)$").unwrap());

    let headless = LEADING.replace(raw.trim(), "");
    let company = TRAILING.replace(&headless, "").trim().to_owned();

    if company.is_empty() {
        None
    } else {
        Some(company)
    }
}
