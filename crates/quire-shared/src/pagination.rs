//! Pagination window for listing pages.

use serde::Serialize;

/// Navigation data for one page of a listing. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u64,
    pub last_page: u64,
    pub per_page: u64,
    pub total: u64,
    /// Position of the first item on this page, 0 when the page is empty.
    pub from: u64,
    /// Position of the last item on this page, 0 when the page is empty.
    pub to: u64,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl Pagination {
    pub fn new(current_page: u64, per_page: u64, total: u64) -> Self {
        let current_page = current_page.max(1);
        let last_page = if per_page == 0 {
            1
        } else {
            total.div_ceil(per_page).max(1)
        };

        let offset = (current_page - 1).saturating_mul(per_page);
        let (from, to) = if offset < total {
            (offset + 1, (offset + per_page).min(total))
        } else {
            (0, 0)
        };

        Self {
            current_page,
            last_page,
            per_page,
            total,
            from,
            to,
            prev_page: (current_page > 1).then(|| (current_page - 1).min(last_page)),
            next_page: (current_page < last_page).then_some(current_page + 1),
        }
    }

    pub fn has_pages(&self) -> bool {
        self.last_page > 1
    }
}
