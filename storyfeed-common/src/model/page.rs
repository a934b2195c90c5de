use serde::{Deserialize, Serialize};

/// One page of a paginated collection.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}
