// Copyright 2025 Felipe Torres González
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module with the floorsheet data objects and the pagination arithmetic that
//! decides how much of a trading day still needs fetching.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Records per page requested from the floorsheet endpoint.
pub const PAGE_SIZE: u64 = 500;

/// A single trade from the daily floorsheet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FloorsheetRow {
    /// Exchange-assigned transaction identifier, unique per trade.
    pub transaction: String,
    pub symbol: String,
    /// Broker number of the buying side.
    pub buyer: String,
    /// Broker number of the selling side.
    pub seller: String,
    pub quantity: i32,
    pub rate: Decimal,
    pub amount: Decimal,
}

/// One page of floorsheet data, as served by the market data endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FloorsheetPage {
    #[serde(default)]
    pub data: Vec<FloorsheetRow>,
    #[serde(default = "single_page")]
    pub last_page: u64,
}

fn single_page() -> u64 {
    1
}

/// Projects the total number of records of a trading day from its first
/// page: every page except the last one comes back full.
pub fn estimate_total(last_page: u64, first_page_len: u64, size: u64) -> u64 {
    last_page.saturating_sub(1) * size + first_page_len
}

/// Whether the stored record count for a day looks final.
///
/// Only the last page of a day is partially filled, so a count sitting
/// exactly on a page boundary means an earlier fetch stopped mid-way. A day
/// whose real total is an exact multiple of the page size defeats the
/// heuristic; the conflict-free insert makes the resulting refetch harmless.
pub fn looks_complete(stored: u64, size: u64) -> bool {
    stored > 0 && stored % size != 0
}

/// Page numbers still to fetch, given how many records are already stored.
pub fn missing_pages(stored: u64, last_page: u64, size: u64) -> Vec<u64> {
    (stored / size + 1..=last_page).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use serde_json::json;

    #[rstest]
    #[case(1, 320, 320)]
    #[case(3, 410, 1410)]
    #[case(3, 500, 1500)]
    #[case(0, 0, 0)]
    fn totals_are_projected_from_the_first_page(
        #[case] last_page: u64,
        #[case] first_page_len: u64,
        #[case] expected: u64,
    ) {
        assert_eq!(estimate_total(last_page, first_page_len, PAGE_SIZE), expected);
    }

    #[rstest]
    #[case(0, false)]
    #[case(320, true)]
    #[case(500, false)]
    #[case(1000, false)]
    #[case(1410, true)]
    fn counts_on_a_page_boundary_look_unfinished(#[case] stored: u64, #[case] complete: bool) {
        assert_eq!(looks_complete(stored, PAGE_SIZE), complete);
    }

    #[rstest]
    #[case(0, 3, vec![1, 2, 3])]
    #[case(500, 3, vec![2, 3])]
    #[case(1000, 3, vec![3])]
    #[case(1500, 3, vec![])]
    #[case(2000, 3, vec![])]
    fn fully_stored_pages_are_not_fetched_again(
        #[case] stored: u64,
        #[case] last_page: u64,
        #[case] expected: Vec<u64>,
    ) {
        assert_eq!(missing_pages(stored, last_page, PAGE_SIZE), expected);
    }

    #[rstest]
    fn a_page_deserializes_with_decimal_prices() {
        let page: FloorsheetPage = serde_json::from_value(json!({
            "data": [{
                "transaction": "2024010253918412",
                "symbol": "HIMSTAR",
                "buyer": "42",
                "seller": "58",
                "quantity": 100,
                "rate": 505.5,
                "amount": 50550.0
            }],
            "last_page": 4
        }))
        .unwrap();

        assert_eq!(page.last_page, 4);
        assert_eq!(page.data.len(), 1);

        let row = &page.data[0];
        assert_eq!(row.symbol, "HIMSTAR");
        assert_eq!(row.quantity, 100);
        assert_eq!(row.rate, Decimal::new(5055, 1));
        assert_eq!(row.amount, Decimal::new(505500, 1));
    }

    #[rstest]
    fn a_bare_page_defaults_to_one_empty_page() {
        let page: FloorsheetPage = serde_json::from_value(json!({})).unwrap();

        assert!(page.data.is_empty());
        assert_eq!(page.last_page, 1);
    }
}
