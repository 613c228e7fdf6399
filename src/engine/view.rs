/// Number of pages needed for `count` records; never less than 1.
pub fn page_count(count: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    count.div_ceil(page_size).max(1)
}

/// A read-only snapshot of one page of a store's filtered, sorted records.
#[derive(Debug, Clone)]
pub struct View<'a, T> {
    /// Records on the current page, in display order.
    pub items: Vec<&'a T>,
    /// Number of records passing all filters, before pagination.
    pub filtered_count: usize,
    /// 1-based current page.
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
}

impl<'a, T> View<'a, T> {
    /// Slices an already filtered and sorted list down to `page`.
    ///
    /// A page past the end is clamped to the last page.
    pub fn paginate(records: Vec<&'a T>, page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let filtered_count = records.len();
        let page_count = page_count(filtered_count, page_size);
        let page = page.clamp(1, page_count);

        let start = (page - 1) * page_size;
        let items = records.into_iter().skip(start).take(page_size).collect();

        Self {
            items,
            filtered_count,
            page,
            page_count,
            page_size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// 1-based position of the first and last record on this page, or `None` when empty.
    pub fn range(&self) -> Option<(usize, usize)> {
        if self.items.is_empty() {
            return None;
        }
        let first = (self.page - 1) * self.page_size + 1;
        Some((first, first + self.items.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 12), 1);
        assert_eq!(page_count(12, 12), 1);
        assert_eq!(page_count(13, 12), 2);
        assert_eq!(page_count(25, 12), 3);
        assert_eq!(page_count(5, 0), 5);
    }

    #[test]
    fn test_paginate_last_page() {
        let data: Vec<u32> = (1..=25).collect();
        let view = View::paginate(data.iter().collect(), 3, 12);
        assert_eq!(view.items, vec![&25]);
        assert_eq!(view.filtered_count, 25);
        assert_eq!(view.page_count, 3);
        assert_eq!(view.range(), Some((25, 25)));
        assert!(!view.has_next());
        assert!(view.has_prev());
    }

    #[test]
    fn test_paginate_clamps_out_of_range() {
        let data: Vec<u32> = (1..=5).collect();
        let view = View::paginate(data.iter().collect(), 9, 2);
        assert_eq!(view.page, 3);
        assert_eq!(view.items, vec![&5]);

        let view = View::paginate(data.iter().collect(), 0, 2);
        assert_eq!(view.page, 1);
    }

    #[test]
    fn test_empty_view_has_one_page() {
        let data: Vec<u32> = Vec::new();
        let view = View::paginate(data.iter().collect(), 1, 12);
        assert!(view.is_empty());
        assert_eq!(view.page_count, 1);
        assert_eq!(view.range(), None);
    }
}
