// Chunk alignment: snaps a requested byte window onto power-of-two chunk boundaries.

/// Window actually requested from the chunk worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedWindow {
    pub offset: u64,
    pub limit: u64,
}

impl AlignedWindow {
    /// Exclusive end of the window.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.limit)
    }
}

/// Compute the aligned chunk window covering `[offset, end_inclusive]`.
///
/// Open-ended requests and spans at or above `upper_limit` get a full
/// `upper_limit` chunk. Smaller spans get the smallest power of two that is
/// at least the span, doubled while the window aligned to it would stop short
/// of the requested end. `smallest_limit` raises that starting size; pass 1
/// for no floor. The offset is rounded down to a multiple of the chosen limit.
pub fn align(
    offset: u64,
    end_inclusive: Option<u64>,
    upper_limit: u64,
    smallest_limit: u64,
) -> AlignedWindow {
    let upper = upper_limit.max(1);
    let floor = smallest_limit.clamp(1, upper);

    let span = match end_inclusive {
        None => upper,
        Some(end) if end >= offset => (end - offset).saturating_add(1),
        // Inverted ranges still fetch something around the offset.
        Some(_) => 1,
    };

    if span >= upper {
        return AlignedWindow {
            offset: align_offset(offset, upper),
            limit: upper,
        };
    }

    // span < upper here, so this cannot overflow.
    let requested_end = offset + (span - 1);
    let mut limit = align_limit(span).max(floor);
    while limit < upper && align_offset(offset, limit).saturating_add(limit) <= requested_end {
        limit = limit.saturating_mul(2);
    }
    let limit = limit.min(upper);

    AlignedWindow {
        offset: align_offset(offset, limit),
        limit,
    }
}

/// Round `offset` down to a multiple of `base`.
pub fn align_offset(offset: u64, base: u64) -> u64 {
    if base == 0 {
        return offset;
    }
    offset - (offset % base)
}

/// Smallest power of two that is >= `span`; spans below 1 count as 1.
pub fn align_limit(span: u64) -> u64 {
    span.max(1).next_power_of_two()
}
