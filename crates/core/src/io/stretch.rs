//! Band-stretch statistics files
//!
//! A stretch statistics file records, per band, the physical value range
//! that was linearly stretched onto an output range:
//!
//! ```text
//! #linear
//! #band,img_min,img_max,out_min,out_max
//! 1,14.0,145.0,0,255
//! 2,3.5,98.2,0,255
//! ```
//!
//! Lines starting with `#` and blank lines are ignored. The four numbers are
//! read as `orig_min, orig_max, img_min, img_max`: the original (physical)
//! range followed by the stretched range stored in the image.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stretch statistics for one band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandStretchStats {
    /// 1-based band index as recorded in the file
    pub band: usize,
    pub orig_min: f64,
    pub orig_max: f64,
    pub img_min: f64,
    pub img_max: f64,
}

impl BandStretchStats {
    /// `(offset, gain)` mapping a stretched value back to physical units:
    /// `physical = offset + value * gain`.
    ///
    /// A collapsed stretched range maps everything to `orig_min`.
    pub fn offset_gain(&self) -> (f64, f64) {
        let img_range = self.img_max - self.img_min;
        if img_range == 0.0 {
            return (self.orig_min, 0.0);
        }
        let gain = (self.orig_max - self.orig_min) / img_range;
        (self.orig_min - self.img_min * gain, gain)
    }
}

/// Read a stretch statistics file
pub fn read_stretch_stats<P: AsRef<Path>>(path: P) -> Result<Vec<BandStretchStats>> {
    let text = std::fs::read_to_string(path)?;
    parse_stretch_stats(&text)
}

/// Parse stretch statistics text. Entries are returned sorted by band.
///
/// A band listed twice is a parse error on its second line.
pub fn parse_stretch_stats(text: &str) -> Result<Vec<BandStretchStats>> {
    let mut stats: Vec<BandStretchStats> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = idx + 1;

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 5 {
            return Err(Error::Parse {
                line: line_no,
                reason: format!("expected 5 comma-separated fields, got {}", fields.len()),
            });
        }

        let band: usize = fields[0].parse().map_err(|_| Error::Parse {
            line: line_no,
            reason: format!("invalid band index '{}'", fields[0]),
        })?;
        if band == 0 {
            return Err(Error::Parse {
                line: line_no,
                reason: "band indices start at 1".into(),
            });
        }
        if stats.iter().any(|s| s.band == band) {
            return Err(Error::Parse {
                line: line_no,
                reason: format!("band {} listed twice", band),
            });
        }

        let mut nums = [0.0_f64; 4];
        for (slot, field) in nums.iter_mut().zip(&fields[1..]) {
            *slot = field.parse().map_err(|_| Error::Parse {
                line: line_no,
                reason: format!("invalid number '{}'", field),
            })?;
        }

        stats.push(BandStretchStats {
            band,
            orig_min: nums[0],
            orig_max: nums[1],
            img_min: nums[2],
            img_max: nums[3],
        });
    }

    stats.sort_by_key(|s| s.band);
    Ok(stats)
}
