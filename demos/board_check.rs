// Copyright 2025 Felipe Torres González
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ipo_dispatch::providers::{ChukulProvider, OfferingBoard};

#[tokio::main]
async fn main() {
    let provider = ChukulProvider::new();

    for board in OfferingBoard::ALL {
        match provider.board_is_open(board).await {
            Ok(true) => println!("{board}: an issue is open for application"),
            Ok(false) => println!("{board}: nothing open"),
            Err(e) => println!("Errors found: {:#?}", e),
        }
    }
}
