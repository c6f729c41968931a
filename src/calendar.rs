//! Maps grid cells onto the contribution graph of a year.
//!
//! The graph shows one week per column, Sunday at the top. Its first and last
//! columns usually hold partial weeks that spill into the neighbouring years,
//! so grid column 0 lands on the graph's *second* column.

use chrono::{Datelike, Days, NaiveDate};
use tracing::warn;

use crate::error::{GitArtError, Result};
use crate::grid::PixelGrid;

/// A cell of the grid and the day it paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedDate {
    pub date: NaiveDate,
    pub row: u32,
    pub col: u32,
    pub in_target_year: bool,
}

/// Sunday that opens the first displayed week-column for `year`
/// (January 1 itself when it is a Sunday).
pub fn graph_anchor(year: i32) -> Result<NaiveDate> {
    let jan_1 = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(GitArtError::DateRange { year })?;
    let back = u64::from(jan_1.weekday().num_days_from_sunday());
    jan_1
        .checked_sub_days(Days::new(back))
        .ok_or(GitArtError::DateRange { year })
}

/// Date painted by cell `(row, col)`: `anchor + (col + 1) weeks + row days`.
pub fn cell_date(anchor: NaiveDate, row: u32, col: u32) -> Option<NaiveDate> {
    let offset = (u64::from(col) + 1) * 7 + u64::from(row);
    anchor.checked_add_days(Days::new(offset))
}

/// One entry per active cell, ordered by column then row.
///
/// Dates that fall outside `year` are kept and flagged; dropping them would
/// cut pixels out of the picture.
pub fn map_grid(grid: &PixelGrid, year: i32) -> Result<Vec<MappedDate>> {
    let anchor = graph_anchor(year)?;

    grid.active_cells()
        .map(|(row, col)| {
            let date = cell_date(anchor, row, col).ok_or(GitArtError::DateRange { year })?;
            let in_target_year = date.year() == year;
            if !in_target_year {
                warn!(row, col, %date, year, "pixel lands outside the target year");
            }
            Ok(MappedDate {
                date,
                row,
                col,
                in_target_year,
            })
        })
        .collect()
}
