//! Parser for the `Range: npt=<begin>-[<end>]` header.

use crate::error::{ParseErrorKind, Result, RtspError};

/// A parsed NPT (normal play time) range. `end` is `None` for an
/// open-ended range (`npt=4.0-`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NptRange {
    pub begin: f64,
    pub end: Option<f64>,
}

impl NptRange {
    /// Parse a `Range` header value such as `npt=4.0-` or `npt=0-12.5`.
    pub fn parse(value: &str) -> Result<Self> {
        let rest = value.strip_prefix("npt=").ok_or(RtspError::Parse {
            kind: ParseErrorKind::InvalidHeader,
        })?;

        let (begin_str, end_str) = rest.split_once('-').ok_or(RtspError::Parse {
            kind: ParseErrorKind::InvalidHeader,
        })?;

        let begin = begin_str.trim().parse::<f64>().map_err(|_| RtspError::Parse {
            kind: ParseErrorKind::InvalidHeader,
        })?;

        let end_str = end_str.trim();
        let end = if end_str.is_empty() {
            None
        } else {
            Some(end_str.parse::<f64>().map_err(|_| RtspError::Parse {
                kind: ParseErrorKind::InvalidHeader,
            })?)
        };

        Ok(Self { begin, end })
    }

    /// Render as the open-ended form this system always emits on replies.
    pub fn to_open_ended_header(begin: f64) -> String {
        format!("npt={begin}-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_ended_range() {
        let range = NptRange::parse("npt=4.0-").unwrap();
        assert_eq!(range.begin, 4.0);
        assert_eq!(range.end, None);
    }

    #[test]
    fn parses_closed_range() {
        let range = NptRange::parse("npt=0-12.5").unwrap();
        assert_eq!(range.begin, 0.0);
        assert_eq!(range.end, Some(12.5));
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(NptRange::parse("4.0-").is_err());
    }

    #[test]
    fn rejects_missing_dash() {
        assert!(NptRange::parse("npt=4.0").is_err());
    }

    #[test]
    fn formats_open_ended_header() {
        assert_eq!(NptRange::to_open_ended_header(4.0), "npt=4.0-");
    }
}
