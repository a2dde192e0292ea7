use std::collections::BTreeSet;

/// Association changes that reconcile a post's tag set with a submitted one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSync {
    pub attach: Vec<i64>,
    pub detach: Vec<i64>,
}

impl TagSync {
    pub fn plan(current: &BTreeSet<i64>, submitted: &BTreeSet<i64>) -> Self {
        Self {
            attach: submitted.difference(current).copied().collect(),
            detach: current.difference(submitted).copied().collect(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.attach.is_empty() && self.detach.is_empty()
    }
}
