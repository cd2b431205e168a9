//! List pagination window.

/// Pagination window for list queries.
///
/// Limits are clamped rather than rejected: an oversized `limit` degrades to
/// the cap instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 100;
    pub const MAX_LIMIT: u32 = 500;

    pub fn clamped(limit: Option<u32>, offset: Option<u32>) -> Self {
        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT).min(Self::MAX_LIMIT);
        Self {
            limit: limit.max(1),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}
