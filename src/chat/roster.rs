// Copyright 2025 Felipe Torres González
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module with the roster lookup: resolving the person named in a chat
//! message to a stored applicant row.

use crate::domain::Applicant;
use tracing::debug;

/// Similarity below which a roster candidate is not accepted as the person
/// named in the message.
const SIMILARITY_FLOOR: f64 = 0.6;

/// Resolves a person token from a chat message against the applicant roster.
///
/// # Description
///
/// People rarely type names exactly as stored, so the lookup is forgiving.
/// Candidates are visited in roster order and the first one whose name
/// contains the token, or is contained by it, wins outright. When no
/// containment hit exists, the candidate with the highest edit-distance
/// similarity above [SIMILARITY_FLOOR] is taken, so one-letter typos still
/// resolve. `None` means nobody on the roster is a plausible match.
pub fn find_applicant<'a>(person: &str, roster: &'a [Applicant]) -> Option<&'a Applicant> {
    let wanted = person.trim().to_lowercase();

    if wanted.is_empty() {
        return None;
    }

    let mut best: Option<(&Applicant, f64)> = None;

    for candidate in roster {
        let candidate_name = candidate.name.to_lowercase();

        if candidate_name.contains(&wanted) || wanted.contains(&candidate_name) {
            return Some(candidate);
        }

        let score = similarity(&wanted, &candidate_name);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ if score > SIMILARITY_FLOOR => best = Some((candidate, score)),
            _ => {}
        }
    }

    if let Some((applicant, score)) = best {
        debug!(
            "No exact roster hit for '{}', accepting '{}' at similarity {:.2}",
            wanted, applicant.name, score
        );
        return Some(applicant);
    }

    None
}

/// Normalised edit-distance similarity between two lowercase names: 1.0 for
/// identical strings, 0.0 for completely unrelated ones.
fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }

    1.0 - edit_distance(a, b) as f64 / longest as f64
}

/// Levenshtein distance over characters, two-row formulation.
fn edit_distance(a: &str, b: &str) -> usize {
    if a.is_empty() {
        return b.chars().count();
    }
    if b.is_empty() {
        return a.chars().count();
    }

    let b_chars = b.chars().collect::<Vec<_>>();
    let mut previous = (0..=b_chars.len()).collect::<Vec<_>>();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, left) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, right) in b_chars.iter().enumerate() {
            let substitution_cost = if left == *right { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + substitution_cost);
        }
        previous.clone_from_slice(&current);
    }

    previous[b_chars.len()]
}
