//! Loader for the line-oriented zone configuration file.
//!
//! ```text
//! run_mode 1
//! zones 1
//! [zone 0]
//! direction down
//! vertices 4
//! p0 120 40
//! p1 300 40
//! p2 330 340
//! p3 90 340
//!
//! [class 1]
//! size 100 2000
//! dimension 0.2 1.0
//! density 0.3 1.0
//! ... two more class blocks ...
//!
//! ```
//!
//! Each zone is followed by three five-line class constraint blocks and a
//! blank line. The constraints are not used for tracking and are skipped.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::tracker::Direction;
use crate::tracker::geometry::Point;
use crate::zone::{ObservationZone, ZoneError};

const CLASS_BLOCKS: usize = 3;
const CLASS_BLOCK_LINES: usize = 5;

#[derive(Debug, Error)]
pub enum ZoneConfigError {
    #[error("failed to read zone config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected {expected}, found end of file")]
    UnexpectedEof { line: usize, expected: &'static str },
    #[error("line {line}: expected {expected}, found {text:?}")]
    Malformed {
        line: usize,
        expected: &'static str,
        text: String,
    },
    #[error("line {line}: unknown direction {token:?}")]
    UnknownDirection { line: usize, token: String },
    #[error("configuration defines no observation zones")]
    NoZones,
    #[error("zone {index}: {source}")]
    Zone {
        index: usize,
        #[source]
        source: ZoneError,
    },
}

/// Read and parse a zone configuration file.
pub fn load_zone_config(path: impl AsRef<Path>) -> Result<Vec<ObservationZone>, ZoneConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ZoneConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let zones = parse_zone_config(&text)?;
    debug!(path = %path.display(), zones = zones.len(), "loaded observation zones");
    Ok(zones)
}

/// Parse zone configuration text. At least one zone is required.
pub fn parse_zone_config(text: &str) -> Result<Vec<ObservationZone>, ZoneConfigError> {
    let mut lines = LineReader::new(text);

    lines.next_line("run mode")?;
    let zone_count: usize = lines.field(1, "zone count")?;
    if zone_count == 0 {
        return Err(ZoneConfigError::NoZones);
    }

    let mut zones = Vec::with_capacity(zone_count);
    for index in 0..zone_count {
        lines.next_line("zone header")?;
        let direction = lines.direction()?;
        let vertex_count: usize = lines.field(1, "vertex count")?;

        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let (line, text) = lines.next_line("vertex")?;
            let x: i32 = parse_token(line, text, 1, "vertex x")?;
            let y: i32 = parse_token(line, text, 2, "vertex y")?;
            vertices.push(Point::new(x as f32, y as f32));
        }

        let zone = ObservationZone::new(index, direction, vertices)
            .map_err(|source| ZoneConfigError::Zone { index, source })?;
        zones.push(zone);

        let wanted = CLASS_BLOCKS * CLASS_BLOCK_LINES + 1;
        let skipped = lines.skip(wanted);
        if skipped < wanted && index + 1 == zone_count {
            warn!(zone = index, skipped, wanted, "class constraint blocks truncated");
        }
    }

    Ok(zones)
}

struct LineReader<'a> {
    lines: std::str::Lines<'a>,
    line_no: usize,
}

impl<'a> LineReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line_no: 0,
        }
    }

    fn next_line(&mut self, expected: &'static str) -> Result<(usize, &'a str), ZoneConfigError> {
        self.line_no += 1;
        self.lines
            .next()
            .map(|text| (self.line_no, text))
            .ok_or(ZoneConfigError::UnexpectedEof {
                line: self.line_no,
                expected,
            })
    }

    /// Parse whitespace token `index` of the next line.
    fn field<T: std::str::FromStr>(
        &mut self,
        index: usize,
        expected: &'static str,
    ) -> Result<T, ZoneConfigError> {
        let (line, text) = self.next_line(expected)?;
        parse_token(line, text, index, expected)
    }

    fn direction(&mut self) -> Result<Direction, ZoneConfigError> {
        let (line, text) = self.next_line("direction")?;
        let token = text
            .split_whitespace()
            .last()
            .ok_or_else(|| ZoneConfigError::Malformed {
                line,
                expected: "direction",
                text: text.to_string(),
            })?;
        match token.to_ascii_lowercase().as_str() {
            "down" | "downstream" => Ok(Direction::Downstream),
            "up" | "upstream" => Ok(Direction::Upstream),
            _ => Err(ZoneConfigError::UnknownDirection {
                line,
                token: token.to_string(),
            }),
        }
    }

    /// Skip up to `count` lines, returning how many were present.
    fn skip(&mut self, count: usize) -> usize {
        let mut skipped = 0;
        while skipped < count && self.lines.next().is_some() {
            self.line_no += 1;
            skipped += 1;
        }
        skipped
    }
}

fn parse_token<T: std::str::FromStr>(
    line: usize,
    text: &str,
    index: usize,
    expected: &'static str,
) -> Result<T, ZoneConfigError> {
    text.split_whitespace()
        .nth(index)
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| ZoneConfigError::Malformed {
            line,
            expected,
            text: text.to_string(),
        })
}
