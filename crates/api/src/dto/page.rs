use common::{DEFAULT_PAGE_SIZE, PageRequest, SortDirection};
use serde::Deserialize;

/// Pagination query string: `?page=0&size=20&direction=asc`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub direction: Option<SortDirection>,
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::new(
            query.page.unwrap_or(0),
            query.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .direction(query.direction.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_ascending() {
        let request = PageRequest::from(PageQuery::default());
        assert_eq!(request.page(), 0);
        assert_eq!(request.size(), DEFAULT_PAGE_SIZE);
        assert_eq!(request.sort_direction(), SortDirection::Asc);
    }

    #[test]
    fn oversized_pages_are_clamped() {
        let request = PageRequest::from(PageQuery {
            page: Some(2),
            size: Some(1000),
            direction: Some(SortDirection::Desc),
        });
        assert_eq!(request.size(), 100);
        assert_eq!(request.offset(), 200);
    }
}
