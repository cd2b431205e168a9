use serde::Deserialize;

use bodega_infra::Page;

/// Pagination query parameters shared by all list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListQuery {
    pub fn page(&self) -> Page {
        Page::clamped(self.limit, self.offset)
    }
}
