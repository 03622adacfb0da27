use serde::{Deserialize, Serialize};

/// ページ番号ベースのページング要求。page は 1 始まり。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Page 1 is always valid, even for an empty result set. Any other page must
    /// start inside the result set.
    pub fn is_valid_for(&self, total: i64) -> bool {
        self.page == 1 || (self.page > 1 && self.offset() < total)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: &PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.total <= 0 || self.page_size == 0 {
            return 1;
        }
        let pages = (self.total + i64::from(self.page_size) - 1) / i64::from(self.page_size);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn next(&self) -> Option<u32> {
        (self.page < self.total_pages()).then(|| self.page + 1)
    }

    pub fn previous(&self) -> Option<u32> {
        (self.page > 1).then(|| self.page - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
