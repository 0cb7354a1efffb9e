// Copyright 2025 Felipe Torres González
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::domain::{
    estimate_total, looks_complete, missing_pages, DbError, FloorsheetRow, PAGE_SIZE,
};
use crate::providers::ChukulProvider;
use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Kathmandu;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Data feeder for the floorsheet of the Nepali stock exchange.
///
/// # Description
///
/// This `struct` automates the process of mirroring the daily floorsheet
/// into the relational store. The market data API serves each trading day in
/// pages of [PAGE_SIZE] records, and only the last page of a day comes back
/// partially filled; the feeder leans on that to decide whether a stored day
/// is complete, and fetches only the pages that are still missing.
///
/// Inserts are keyed on the exchange's transaction identifier, so feeding
/// the same day twice never duplicates records.
pub struct FloorsheetFeeder<'a> {
    pub provider: Arc<ChukulProvider>,
    pub pool: &'a PgPool,
}

impl<'a> FloorsheetFeeder<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        FloorsheetFeeder {
            provider: Arc::new(ChukulProvider::new()),
            pool,
        }
    }

    /// Refreshes today's floorsheet, today as seen by the exchange's clock.
    #[instrument(name = "Refresh today's floorsheet", skip(self))]
    pub async fn add_today_data(&self) -> Result<u64, Box<dyn Error>> {
        let today = Utc::now().with_timezone(&Kathmandu).date_naive();

        self.sync_date(today).await
    }

    /// Brings one trading date up to date and reports how many records were
    /// inserted.
    ///
    /// # Description
    ///
    /// A date whose stored count does not sit on a page boundary is taken as
    /// complete and skipped without touching the network. Otherwise the
    /// first page is fetched to learn the day's page count, and only the
    /// pages not yet covered by the stored records are requested.
    #[instrument(name = "Sync a floorsheet date", skip(self))]
    pub async fn sync_date(&self, date: NaiveDate) -> Result<u64, Box<dyn Error>> {
        let stored = self.count_for_date(date).await?;

        if looks_complete(stored, PAGE_SIZE) {
            debug!("The floorsheet for {date} is already complete ({stored} records)");
            return Ok(0);
        }

        let first = self
            .provider
            .floorsheet_page(date, 1, PAGE_SIZE)
            .await
            .map_err(Box::new)?;
        let expected = estimate_total(first.last_page, first.data.len() as u64, PAGE_SIZE);
        debug!(
            "Expecting around {expected} records for {date} over {} pages",
            first.last_page
        );

        let pages = missing_pages(stored, first.last_page, PAGE_SIZE);
        if pages.is_empty() {
            debug!("Nothing left to fetch for {date}");
            return Ok(0);
        }

        let mut first_page = Some(first.data);
        let mut inserted = 0;

        for page in pages {
            let rows = match first_page.take() {
                Some(rows) if page == 1 => rows,
                _ => {
                    self.provider
                        .floorsheet_page(date, page, PAGE_SIZE)
                        .await
                        .map_err(Box::new)?
                        .data
                }
            };

            inserted += self.insert_rows(&rows, date).await?;
        }

        info!("Inserted {inserted} new floorsheet records for {date}");

        Ok(inserted)
    }

    /// Walks a date range, syncing each day independently.
    ///
    /// # Description
    ///
    /// A day that fails to sync is logged and skipped so one bad day does
    /// not abort a large backfill. The returned dates are the ones that
    /// received new records.
    #[instrument(name = "Sync a floorsheet date range", skip(self))]
    pub async fn sync_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, Box<dyn Error>> {
        if start > end {
            return Err(format!("The start date {start} is after the end date {end}").into());
        }

        let mut refreshed = Vec::new();
        let mut total_days = 0;
        let mut day = start;

        loop {
            total_days += 1;

            match self.sync_date(day).await {
                Ok(0) => {}
                Ok(_) => refreshed.push(day),
                Err(e) => error!("Failed to sync the floorsheet for {day}: {e}"),
            }

            if day == end {
                break;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        info!(
            "Refreshed {}/{} days between {start} and {end}",
            refreshed.len(),
            total_days
        );

        Ok(refreshed)
    }

    #[instrument(name = "Count stored floorsheet records", skip(self))]
    async fn count_for_date(&self, date: NaiveDate) -> Result<u64, DbError> {
        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM floorsheet WHERE date = $1")
            .bind(date)
            .fetch_one(self.pool)
            .await
            .map_err(|e| DbError::Unknown(e.to_string()))?;

        debug!("Stored floorsheet records for {date}: {stored}");

        Ok(stored.max(0) as u64)
    }

    #[instrument(name = "Insert floorsheet records", skip(self, rows), fields(count = rows.len()))]
    async fn insert_rows(&self, rows: &[FloorsheetRow], date: NaiveDate) -> Result<u64, DbError> {
        if rows.is_empty() {
            warn!("No data to insert for {date}");
            return Ok(0);
        }

        let mut insert: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO floorsheet (transaction, symbol, buyer, seller, quantity, rate, amount, date) ",
        );
        insert.push_values(rows, |mut b, row| {
            b.push_bind(&row.transaction)
                .push_bind(&row.symbol)
                .push_bind(&row.buyer)
                .push_bind(&row.seller)
                .push_bind(row.quantity)
                .push_bind(row.rate)
                .push_bind(row.amount)
                .push_bind(date);
        });
        insert.push(" ON CONFLICT (transaction) DO NOTHING");

        let result = insert
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| DbError::Unknown(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
