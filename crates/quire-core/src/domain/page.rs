use serde::Serialize;

/// One page of a paginated listing. Pages are numbered from 1.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        Self {
            items,
            page: page.max(1),
            per_page,
            total,
        }
    }

    /// Number of the last non-empty page; an empty listing still has page 1.
    pub fn last_page(&self) -> u64 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page() {
        assert_eq!(Page::<()>::new(vec![], 1, 30, 0).last_page(), 1);
        assert_eq!(Page::<()>::new(vec![], 1, 30, 30).last_page(), 1);
        assert_eq!(Page::<()>::new(vec![], 1, 30, 31).last_page(), 2);
        assert_eq!(Page::<()>::new(vec![], 1, 30, 95).last_page(), 4);
    }

    #[test]
    fn test_page_zero_is_first_page() {
        assert_eq!(Page::<()>::new(vec![], 0, 30, 0).page, 1);
    }
}
