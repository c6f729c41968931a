//! Draw a small bitmap onto a contribution graph.
//!
//! An image of at most 51x7 pixels is thresholded into a [`PixelGrid`], each
//! active cell is mapped to a day of the chosen year, and one backdated empty
//! commit is created per day.

pub mod calendar;
pub mod config;
pub mod error;
pub mod grid;
pub mod history;
pub mod scheduler;

use std::path::Path;

pub use calendar::{graph_anchor, map_grid, MappedDate};
pub use config::ArtParams;
pub use error::{GitArtError, Result};
pub use grid::{ActivationRule, PixelGrid};
pub use history::{CommitHistory, GitRepository, MemoryHistory};
pub use scheduler::{
    commit_message, Action, CommitScheduler, DateOutcome, Mode, PlannedCommit, RunOutcome,
    RunReport,
};

/// Load an image and return the dates it paints in `year`.
pub fn dates_for_image(path: &Path, year: i32, params: &ArtParams) -> Result<Vec<MappedDate>> {
    let grid = PixelGrid::from_path(path, params)?;
    map_grid(&grid, year)
}

/// Same as [`dates_for_image`] for encoded image bytes (png/bmp/etc).
pub fn dates_for_encoded_image(
    bytes: &[u8],
    year: i32,
    params: &ArtParams,
) -> Result<Vec<MappedDate>> {
    let grid = PixelGrid::from_encoded_bytes(bytes, params)?;
    map_grid(&grid, year)
}
