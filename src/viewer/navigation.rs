//! Page navigation state

/// Current page against the total page count.
///
/// With no pages loaded every transition is a no-op.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Navigation {
    current: usize,
    total: usize,
}

impl Navigation {
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn has_pages(&self) -> bool {
        self.total > 0
    }

    #[must_use]
    pub fn can_next(&self) -> bool {
        self.current + 1 < self.total
    }

    #[must_use]
    pub fn can_previous(&self) -> bool {
        self.current > 0
    }

    /// Advance one page; returns whether the index changed
    pub fn next(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Go back one page; returns whether the index changed
    pub fn previous(&mut self) -> bool {
        if !self.can_previous() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Jump to `page`, clamped to the last page; returns whether the index changed
    pub fn go_to(&mut self, page: usize) -> bool {
        if !self.has_pages() {
            return false;
        }
        let clamped = page.min(self.total - 1);
        let changed = clamped != self.current;
        self.current = clamped;
        changed
    }

    /// A fresh page set: back to the first page
    pub fn reset(&mut self, total: usize) {
        self.total = total;
        self.current = 0;
    }

    /// Forget the page set (a new load is in progress)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
