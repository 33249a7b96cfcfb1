use crate::error::StreamError;

/// Byte window a client asked for, as read from its `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWindow {
    pub offset: u64,
    /// `None` means "to the end of the resource".
    pub end_inclusive: Option<u64>,
}

impl RangeWindow {
    /// The whole resource, used when no Range header is present.
    pub const WHOLE: RangeWindow = RangeWindow {
        offset: 0,
        end_inclusive: None,
    };

    /// Parse a Range header leniently.
    ///
    /// Only the first range of a `bytes=a-b, c-d` list is honored. Fields that
    /// fail to parse are defaulted: a bad start becomes 0 and a bad end
    /// becomes open-ended. A header without a unit separator reads as the
    /// whole resource.
    pub fn parse(header: Option<&str>) -> Self {
        let Some(value) = header.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::WHOLE;
        };
        let Some((_, ranges)) = value.split_once('=') else {
            return Self::WHOLE;
        };

        let (start, end) = split_first_range(ranges);
        Self {
            offset: start.parse().unwrap_or(0),
            end_inclusive: if end.is_empty() {
                None
            } else {
                end.parse().ok()
            },
        }
    }

    /// Parse a Range header, rejecting anything that is not `bytes=start-[end]`.
    pub fn parse_strict(header: Option<&str>) -> Result<Self, StreamError> {
        let Some(value) = header.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(Self::WHOLE);
        };
        let (unit, ranges) = value
            .split_once('=')
            .ok_or_else(|| StreamError::InvalidRange(format!("missing unit in {:?}", value)))?;
        if !unit.trim().eq_ignore_ascii_case("bytes") {
            return Err(StreamError::InvalidRange(format!("unsupported unit {:?}", unit)));
        }

        let (start, end) = split_first_range(ranges);
        let offset: u64 = start
            .parse()
            .map_err(|_| StreamError::InvalidRange(format!("bad start {:?}", start)))?;
        let end_inclusive = if end.is_empty() {
            None
        } else {
            let end: u64 = end
                .parse()
                .map_err(|_| StreamError::InvalidRange(format!("bad end {:?}", end)))?;
            if end < offset {
                return Err(StreamError::InvalidRange(format!(
                    "end {} before start {}",
                    end, offset
                )));
            }
            Some(end)
        };

        Ok(Self {
            offset,
            end_inclusive,
        })
    }

    /// True for the two-byte `bytes=0-1` probe some players send before playback.
    pub fn is_probe(&self) -> bool {
        self.offset == 0 && self.end_inclusive == Some(1)
    }
}

/// Split the first entry of a range list into trimmed (start, end) strings.
fn split_first_range(ranges: &str) -> (&str, &str) {
    let first = ranges.split(',').next().unwrap_or("").trim();
    match first.split_once('-') {
        Some((start, end)) => (start.trim(), end.trim()),
        None => (first, ""),
    }
}
