use std::error::Error;

/// Errors reported by the checked entry points.
///
/// Range errors are detected before the slice is touched. A comparator error is reported only
/// after every task of the sort has finished, the order of the slice is unspecified then but it
/// still holds its original elements.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SortError {
    #[error("invalid range: start {start} is past end {end}")]
    InvalidRange { start: usize, end: usize },
    #[error("range end {end} out of bounds for slice of length {len}")]
    OutOfBounds { end: usize, len: usize },
    #[error("comparator failed: {0}")]
    Comparator(#[source] Box<dyn Error + Send + Sync + 'static>),
}
