//! Reduction of barcode rank counts into a two-segment knee curve.
//!
//! # Overview
//!
//! A barcode rank plot shows, on log-log axes, the number of UMIs detected for
//! every barcode, ordered from the most to the least abundant. Barcodes which
//! belong to a cell sit on a high plateau that is followed by a sharp drop (the
//! "knee") into the background of ambient barcodes.
//!
//! The knee is located with a simple order statistic rather than a changepoint
//! method. The count at a fixed rank (the `offset`, 31 by default) is divided by
//! a fixed `divisor` (10 by default) to produce a threshold; every barcode with
//! a count strictly above the threshold is considered a cell.
//!
//! ```
//! use scqc::rank::{reduce, KneeParams};
//!
//! let mut counts = vec![1000; 35];
//! counts.extend([10; 5]);
//!
//! let curve = reduce(&counts, KneeParams::default()).unwrap();
//! assert_eq!(curve.threshold, 100);
//! assert_eq!(curve.split_index, 35);
//! assert_eq!(curve.foreground.len(), 35);
//!
//! // The boundary barcode is part of both segments.
//! assert_eq!(curve.background.x.first(), Some(&35));
//! assert_eq!(curve.background.len(), 6);
//! ```

use std::io::Read;

use serde::Serialize;
use thiserror::Error;

use crate::parse::ParseError;

/// Default 1-based rank at which the knee count is sampled.
pub const DEFAULT_KNEE_OFFSET: usize = 31;

/// Default divisor applied to the sampled count.
pub const DEFAULT_KNEE_DIVISOR: u64 = 10;

/// Errors that can occur while reducing rank counts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankError {
    /// The knee offset must refer to an actual rank.
    #[error("the knee offset must be at least 1")]
    ZeroOffset,

    /// The knee divisor must be non-zero.
    #[error("the knee divisor must be non-zero")]
    ZeroDivisor,

    /// There were not enough barcodes to sample the knee.
    #[error("found {found} barcodes, but at least {required} are needed to locate the knee")]
    TooFewBarcodes {
        /// The number of barcodes provided.
        found: usize,

        /// The number of barcodes required.
        required: usize,
    },
}

/// Parameters of the knee heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KneeParams {
    /// The 1-based rank at which the count is sampled.
    pub offset: usize,

    /// The divisor applied to the sampled count to get the threshold.
    pub divisor: u64,
}

impl KneeParams {
    /// Creates a new [`KneeParams`].
    pub fn new(offset: usize, divisor: u64) -> Self {
        KneeParams { offset, divisor }
    }
}

impl Default for KneeParams {
    fn default() -> Self {
        KneeParams::new(DEFAULT_KNEE_OFFSET, DEFAULT_KNEE_DIVISOR)
    }
}

/// One contiguous segment of a rank curve.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// The 1-based ranks.
    pub x: Vec<usize>,

    /// The counts at each rank.
    pub y: Vec<u64>,
}

impl Segment {
    fn from_range(counts: &[u64], start: usize, end: usize) -> Self {
        Segment {
            x: (start + 1..=end).collect(),
            y: counts[start..end].to_vec(),
        }
    }

    /// The number of points in this segment.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether this segment has no points.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// A rank curve split into cell-associated and background barcodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankCurve {
    /// Counts strictly above this value are considered cells.
    pub threshold: u64,

    /// The number of barcodes considered cells.
    pub split_index: usize,

    /// Ranks `1..=split_index`.
    pub foreground: Segment,

    /// Ranks `split_index..=n`. When `split_index` is zero, the whole curve.
    pub background: Segment,
}

impl RankCurve {
    /// The total number of barcodes in the curve.
    pub fn barcodes(&self) -> usize {
        match self.split_index {
            0 => self.background.len(),
            n => n + self.background.len() - 1,
        }
    }
}

/// Reduces counts (ordered from highest to lowest) into a [`RankCurve`].
pub fn reduce(counts: &[u64], params: KneeParams) -> Result<RankCurve, RankError> {
    if params.offset == 0 {
        return Err(RankError::ZeroOffset);
    }

    if params.divisor == 0 {
        return Err(RankError::ZeroDivisor);
    }

    if counts.len() < params.offset {
        return Err(RankError::TooFewBarcodes {
            found: counts.len(),
            required: params.offset,
        });
    }

    let threshold = counts[params.offset - 1] / params.divisor;
    let split_index = counts.iter().filter(|c| **c > threshold).count();

    let foreground = Segment::from_range(counts, 0, split_index);
    let background = Segment::from_range(counts, split_index.saturating_sub(1), counts.len());

    Ok(RankCurve {
        threshold,
        split_index,
        foreground,
        background,
    })
}

/// Reads barcode counts from a CSV rank report. The first row is a header and
/// the count is held in the second column of every subsequent row.
pub fn read_rank_counts<R>(reader: R) -> Result<Vec<u64>, ParseError>
where
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut counts = Vec::new();

    for result in reader.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        let raw = match row.get(1) {
            Some(r) => r.trim(),
            None => {
                return Err(ParseError::MissingDelimiter {
                    line,
                    delimiter: ',',
                })
            }
        };

        let count = raw.parse::<u64>().map_err(|_| ParseError::InvalidNumber {
            line,
            value: raw.to_string(),
        })?;
        counts.push(count);
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declining_counts() -> Vec<u64> {
        // 500, 488, ..., 80 followed by a tail of 5s: forty barcodes in total.
        let mut counts: Vec<u64> = (0..36).map(|i| 500 - i * 12).collect();
        counts.extend([5; 4]);
        counts
    }

    #[test]
    fn test_reduce_splits_at_the_knee() {
        let counts = declining_counts();
        assert_eq!(counts.len(), 40);

        let curve = reduce(&counts, KneeParams::new(31, 10)).unwrap();
        assert_eq!(curve.threshold, counts[30] / 10);
        assert_eq!(
            curve.split_index,
            counts.iter().filter(|c| **c > curve.threshold).count()
        );
        assert_eq!(curve.split_index, 36);
        assert_eq!(curve.foreground.len(), 36);
        assert_eq!(curve.foreground.x.first(), Some(&1));
        assert_eq!(curve.foreground.y.first(), Some(&500));

        // The boundary barcode is present in both segments.
        assert_eq!(curve.foreground.x.last(), curve.background.x.first());
        assert_eq!(curve.foreground.y.last(), curve.background.y.first());
        assert_eq!(curve.background.x, (36..=40).collect::<Vec<_>>());
        assert_eq!(curve.background.y, vec![80, 5, 5, 5, 5]);
        assert_eq!(curve.barcodes(), 40);
    }

    #[test]
    fn test_reduce_with_no_foreground() {
        let counts = vec![0; 40];
        let curve = reduce(&counts, KneeParams::default()).unwrap();
        assert_eq!(curve.threshold, 0);
        assert_eq!(curve.split_index, 0);
        assert!(curve.foreground.is_empty());
        assert_eq!(curve.background.len(), 40);
        assert_eq!(curve.background.x.first(), Some(&1));
        assert_eq!(curve.barcodes(), 40);
    }

    #[test]
    fn test_reduce_with_too_few_barcodes() {
        let counts = vec![100; 30];
        assert_eq!(
            reduce(&counts, KneeParams::default()),
            Err(RankError::TooFewBarcodes {
                found: 30,
                required: 31
            })
        );
    }

    #[test]
    fn test_reduce_rejects_degenerate_params() {
        let counts = vec![100; 40];
        assert_eq!(
            reduce(&counts, KneeParams::new(0, 10)),
            Err(RankError::ZeroOffset)
        );
        assert_eq!(
            reduce(&counts, KneeParams::new(31, 0)),
            Err(RankError::ZeroDivisor)
        );
    }

    #[test]
    fn test_reduce_with_custom_params() {
        let counts: Vec<u64> = vec![900, 800, 700, 60, 50, 40];
        let curve = reduce(&counts, KneeParams::new(2, 10)).unwrap();
        assert_eq!(curve.threshold, 80);
        assert_eq!(curve.split_index, 3);
        assert_eq!(curve.background.x, vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_read_rank_counts() {
        let csv = "barcode,UMI\nAAAC,120\nAAAG,80\nAAAT,7\n";
        let counts = read_rank_counts(csv.as_bytes()).unwrap();
        assert_eq!(counts, vec![120, 80, 7]);

        let csv = "barcode,UMI\nAAAC,120\nAAAG,many\n";
        match read_rank_counts(csv.as_bytes()) {
            Err(ParseError::InvalidNumber { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "many");
            }
            other => panic!("expected an invalid number error, got {:?}", other),
        }

        let csv = "barcode,UMI\nAAAC\n";
        assert!(matches!(
            read_rank_counts(csv.as_bytes()),
            Err(ParseError::MissingDelimiter { .. })
        ));
    }
}
