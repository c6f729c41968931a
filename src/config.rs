use chrono::NaiveTime;

/// Tallest image that fits in a week-column.
pub const DEFAULT_MAX_HEIGHT: u32 = 7;
/// Usable week-columns once the first and last graph columns are dropped.
pub const DEFAULT_MAX_WIDTH: u32 = 51;
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 128;
pub const DEFAULT_PREFIX: &str = "ArtCommit";
pub const DEFAULT_COMMIT_TIME: NaiveTime = match NaiveTime::from_hms_opt(12, 0, 0) {
    Some(t) => t,
    None => panic!("12:00:00 is a valid time"),
};

/// Run-wide knobs passed into the extractor and the scheduler.
#[derive(Debug, Clone)]
pub struct ArtParams {
    /// A pixel must be strictly more opaque than this to count.
    pub alpha_threshold: u8,
    pub max_width: u32,
    pub max_height: u32,
    /// Time of day stamped on every commit (local time).
    pub commit_time: NaiveTime,
    pub prefix: String,
}

impl Default for ArtParams {
    fn default() -> Self {
        Self {
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            commit_time: DEFAULT_COMMIT_TIME,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}
