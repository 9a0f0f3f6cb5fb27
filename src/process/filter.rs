// src/process/filter.rs

use chrono::{Datelike, Local};
use std::collections::HashSet;
use tracing::info;

use super::table::{EmissionRecord, EmissionTable};
use crate::config::EmissionsConfig;

/// City allow-list plus a trailing window of years.
#[derive(Debug, Clone)]
pub struct RegionFilter {
    cities: HashSet<String>,
    window_years: i32,
}

impl RegionFilter {
    pub fn new<I, S>(cities: I, window_years: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cities: cities.into_iter().map(Into::into).collect(),
            window_years,
        }
    }

    pub fn from_config(cfg: &EmissionsConfig) -> Self {
        Self::new(cfg.cities.iter().cloned(), cfg.window_years)
    }

    pub fn first_year(&self, current_year: i32) -> i32 {
        current_year - self.window_years
    }

    /// A record without a usable year never matches.
    pub fn matches(&self, record: &EmissionRecord, current_year: i32) -> bool {
        let first = self.first_year(current_year);
        self.cities.contains(&record.city) && record.year.map_or(false, |y| y >= first)
    }
}

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Rows of `table` accepted by `filter`, in their original order.
pub fn filter_table(table: &EmissionTable, filter: &RegionFilter, current_year: i32) -> EmissionTable {
    let kept: Vec<EmissionRecord> = table
        .records()
        .iter()
        .filter(|r| filter.matches(r, current_year))
        .cloned()
        .collect();
    info!(
        kept = kept.len(),
        dropped = table.len() - kept.len(),
        from_year = filter.first_year(current_year),
        "filtered"
    );
    table.with_records(kept)
}

/// [`filter_table`] against the wall-clock year.
pub fn filter_recent(table: &EmissionTable, filter: &RegionFilter) -> EmissionTable {
    filter_table(table, filter, current_year())
}
