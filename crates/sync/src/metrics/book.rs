use std::collections::HashSet;

use player_core::model::Percentage;

use super::CompletionMetric;

/// Multi-page book state: `round(viewed / total * 100)`.
#[derive(Debug, Clone, Default)]
pub struct BookMetrics {
    total_pages: u32,
    viewed: HashSet<u32>,
}

impl BookMetrics {
    #[must_use]
    pub fn new(total_pages: u32) -> Self {
        Self {
            total_pages,
            viewed: HashSet::new(),
        }
    }

    /// Record that a page (zero-indexed) was shown. Revisits count once.
    pub fn view_page(&mut self, page: u32) {
        self.viewed.insert(page);
    }

    #[must_use]
    pub fn viewed_count(&self) -> usize {
        self.viewed.len()
    }
}

impl CompletionMetric for BookMetrics {
    fn completion(&self) -> Percentage {
        Percentage::from_ratio(self.viewed.len() as u64, u64::from(self.total_pages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_viewed_pages() {
        let mut book = BookMetrics::new(3);
        book.view_page(0);
        assert_eq!(book.completion().value(), 33);

        book.view_page(1);
        book.view_page(0); // revisit
        assert_eq!(book.completion().value(), 67);

        book.view_page(2);
        assert!(book.completion().is_complete());
    }

    #[test]
    fn empty_book_is_zero() {
        assert_eq!(BookMetrics::new(0).completion(), Percentage::ZERO);
    }
}
