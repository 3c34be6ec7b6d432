//! Single byte-range parsing for the `Range` request header.

/// Inclusive byte span resolved against a concrete file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the span; never zero.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` response header.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// The header could not be satisfied for a file of this size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsatisfiable;

/// Parses `bytes=start-end`, `bytes=start-` or `bytes=-suffix` against `size`.
///
/// `end` past EOF is clamped to the last byte. Other units, multiple ranges,
/// malformed bounds and spans starting at or beyond EOF are unsatisfiable.
pub fn parse_range(header: &str, size: u64) -> Result<ByteRange, Unsatisfiable> {
    let spec = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or(Unsatisfiable)?
        .trim();

    if spec.contains(',') {
        return Err(Unsatisfiable);
    }

    let (first, last) = spec.split_once('-').ok_or(Unsatisfiable)?;
    let (first, last) = (first.trim(), last.trim());

    if size == 0 {
        return Err(Unsatisfiable);
    }

    if first.is_empty() {
        // Suffix form: the final `n` bytes
        let suffix: u64 = last.parse().map_err(|_| Unsatisfiable)?;
        if suffix == 0 {
            return Err(Unsatisfiable);
        }
        let start = size.saturating_sub(suffix);
        return Ok(ByteRange {
            start,
            end: size - 1,
        });
    }

    let start: u64 = first.parse().map_err(|_| Unsatisfiable)?;
    let end = if last.is_empty() {
        size - 1
    } else {
        last.parse::<u64>().map_err(|_| Unsatisfiable)?
    };

    if start >= size || start > end {
        return Err(Unsatisfiable);
    }

    Ok(ByteRange {
        start,
        end: end.min(size - 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_range() {
        let range = parse_range("bytes=0-99", 1000).unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 99 });
        assert_eq!(range.length(), 100);
        assert_eq!(range.content_range(1000), "bytes 0-99/1000");
    }

    #[test]
    fn test_open_ended_range() {
        let range = parse_range("bytes=500-", 1000).unwrap();
        assert_eq!(range, ByteRange { start: 500, end: 999 });
        assert_eq!(range.length(), 500);
    }

    #[test]
    fn test_end_is_clamped() {
        let range = parse_range("bytes=900-5000", 1000).unwrap();
        assert_eq!(range, ByteRange { start: 900, end: 999 });
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            parse_range("bytes=-100", 1000).unwrap(),
            ByteRange { start: 900, end: 999 }
        );
        assert_eq!(
            parse_range("bytes=-5000", 1000).unwrap(),
            ByteRange { start: 0, end: 999 }
        );
        assert!(parse_range("bytes=-0", 1000).is_err());
    }

    #[test]
    fn test_start_at_or_beyond_eof() {
        assert!(parse_range("bytes=1000-", 1000).is_err());
        assert!(parse_range("bytes=1500-2000", 1000).is_err());
        assert!(parse_range("bytes=999-", 1000).is_ok());
    }

    #[test]
    fn test_malformed() {
        assert!(parse_range("items=0-10", 1000).is_err());
        assert!(parse_range("bytes=abc-10", 1000).is_err());
        assert!(parse_range("bytes=10-abc", 1000).is_err());
        assert!(parse_range("bytes=10", 1000).is_err());
        assert!(parse_range("bytes=50-10", 1000).is_err());
        assert!(parse_range("bytes=0-10,20-30", 1000).is_err());
    }

    #[test]
    fn test_empty_file() {
        assert!(parse_range("bytes=0-", 0).is_err());
        assert!(parse_range("bytes=-10", 0).is_err());
    }
}
