//! Error taxonomy for image extraction, date mapping and commit creation.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitArtError {
    #[error(
        "failed to load image \"{}\": {message} (expected a readable PNG or other common format)",
        path.display()
    )]
    ImageLoad { path: PathBuf, message: String },

    #[error(
        "image is {width}x{height} pixels but at most {max_width}x{max_height} fits the graph; \
         crop or scale the image down"
    )]
    Dimension {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("year {year} is outside the supported calendar range; pick a recent year")]
    DateRange { year: i32 },

    #[error("{message}; run inside a git repository or `git init` one first")]
    Repository { message: String },

    #[error("commit for {date} failed: {message}")]
    CommitCreation { date: NaiveDate, message: String },
}

pub type Result<T, E = GitArtError> = std::result::Result<T, E>;
