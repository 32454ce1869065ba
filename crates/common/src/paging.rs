//! Offset pagination shared by the list endpoints.

use serde::{Deserialize, Serialize};

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Sort direction applied to a resource's default sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns the SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A request for one page of a listing.
///
/// Pages are zero-based. The size is clamped to `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
    direction: SortDirection,
}

impl PageRequest {
    /// Creates a page request, clamping the size into the allowed range.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
            direction: SortDirection::Asc,
        }
    }

    /// Sets the sort direction.
    pub fn direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.direction
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    /// Number of rows to return.
    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }

    /// Slices an already sorted collection down to this page.
    pub fn slice<T>(&self, sorted: Vec<T>) -> Page<T> {
        let total = sorted.len() as u64;
        let content = sorted
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.size as usize)
            .collect();
        Page::new(content, *self, total)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results together with the totals needed to navigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Builds a page from its content and the total number of matching rows.
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size());
        Self {
            content,
            page: request.page(),
            size: request.size(),
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }

    /// Converts the content while keeping the paging information.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request_is_first_page_of_twenty() {
        let req = PageRequest::default();
        assert_eq!(req.page(), 0);
        assert_eq!(req.size(), DEFAULT_PAGE_SIZE);
        assert_eq!(req.sort_direction(), SortDirection::Asc);
    }

    #[test]
    fn size_is_clamped() {
        assert_eq!(PageRequest::new(0, 0).size(), 1);
        assert_eq!(PageRequest::new(0, 5000).size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn offset_and_limit() {
        let req = PageRequest::new(3, 10);
        assert_eq!(req.offset(), 30);
        assert_eq!(req.limit(), 10);
    }

    #[test]
    fn slice_returns_requested_window() {
        let page = PageRequest::new(1, 2).slice(vec![1, 2, 3, 4, 5]);
        assert_eq!(page.content, vec![3, 4]);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn slice_past_the_end_is_empty() {
        let page = PageRequest::new(4, 2).slice(vec![1, 2, 3]);
        assert!(page.is_empty());
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn empty_listing_has_no_pages() {
        let page: Page<u8> = PageRequest::default().slice(vec![]);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn map_keeps_paging_info() {
        let page = PageRequest::new(0, 2).slice(vec![1, 2, 3]).map(|n| n * 10);
        assert_eq!(page.content, vec![10, 20]);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.size, 2);
    }

    #[test]
    fn direction_deserializes_lowercase() {
        let dir: SortDirection = serde_json::from_str("\"desc\"").unwrap();
        assert_eq!(dir, SortDirection::Desc);
        assert_eq!(dir.as_sql(), "DESC");
    }
}
