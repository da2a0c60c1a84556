/// Zero-based page of a fixed size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub size: usize,
}

impl Page {
    pub fn new(index: usize, size: usize) -> Self {
        Self { index, size }
    }

    /// Number of records to skip
    pub fn offset(&self) -> usize {
        self.index.saturating_mul(self.size)
    }

    pub fn limit(&self) -> usize {
        self.size
    }
}

/// Slice `[index * size, index * size + size)` out of an ordered result
///
/// Without a page the whole result is returned.
pub fn paginate<T>(items: Vec<T>, page: Option<Page>) -> Vec<T> {
    match page {
        Some(page) => items
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect(),
        None => items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_page() {
        let items: Vec<u32> = (0..7).collect();
        assert_eq!(paginate(items, Some(Page::new(1, 3))), vec![3, 4, 5]);
    }

    #[test]
    fn test_last_page_partial() {
        let items: Vec<u32> = (0..7).collect();
        assert_eq!(paginate(items, Some(Page::new(2, 3))), vec![6]);
    }

    #[test]
    fn test_past_the_end() {
        let items: Vec<u32> = (0..7).collect();
        assert!(paginate(items, Some(Page::new(usize::MAX, 3))).is_empty());
    }

    #[test]
    fn test_unpaginated() {
        let items: Vec<u32> = (0..7).collect();
        assert_eq!(paginate(items.clone(), None), items);
    }
}
