//! Pagination math for pagers and range labels.

/// Number of pages needed for `total` items; zero when there are none.
#[must_use]
pub fn total_pages(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
}

/// Clamp a requested page into `1..=total_pages` (page one when empty).
#[must_use]
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// Whether a page follows `page`.
#[must_use]
pub const fn has_next(page: u32, total_pages: u32) -> bool {
    page < total_pages
}

/// Whether a page precedes `page`.
#[must_use]
pub const fn has_prev(page: u32) -> bool {
    page > 1
}

/// Up to `width` consecutive page numbers centred on `current`.
#[must_use]
pub fn page_window(current: u32, total_pages: u32, width: u32) -> Vec<u32> {
    if total_pages == 0 || width == 0 {
        return Vec::new();
    }
    let width = width.min(total_pages);
    let current = clamp_page(current, total_pages);
    let start = current
        .saturating_sub(width / 2)
        .clamp(1, total_pages - width + 1);
    (start..start + width).collect()
}

/// 1-based inclusive item range shown on `page`, or `None` past the end.
#[must_use]
pub fn item_range(page: u32, per_page: u32, total: u64) -> Option<(u64, u64)> {
    if page == 0 || per_page == 0 {
        return None;
    }
    let first = u64::from(page - 1) * u64::from(per_page) + 1;
    if first > total {
        return None;
    }
    let last = (first + u64::from(per_page) - 1).min(total);
    Some((first, last))
}
