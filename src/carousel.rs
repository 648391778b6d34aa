use std::collections::HashSet;

use crate::models::{Comparison, Product};

/// The visible window holds at most this many products.
pub const WINDOW_CAPACITY: usize = 2;

/// One search's worth of browsing state: the full result set, the bounded
/// visible window, the set of permanently dismissed ids, and a cursor into
/// the not-yet-shown remainder.
///
/// Invariants: a dismissed id never re-enters the window for the lifetime of
/// the current result set; the window never holds duplicate ids; the cursor
/// never moves backwards between searches.
#[derive(Debug, Default)]
pub struct Carousel {
    products: Vec<Product>,
    visible: Vec<Product>,
    dismissed: HashSet<u32>,
    cursor: usize,
    comparison: Option<Comparison>,
}

impl Carousel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reseed from a fresh result set: dismissed ids are forgotten, the
    /// window becomes the first `min(2, N)` entries, and the cursor points
    /// just past the window capacity.
    pub fn seed(&mut self, products: Vec<Product>) {
        self.visible = products.iter().take(WINDOW_CAPACITY).cloned().collect();
        self.products = products;
        self.dismissed.clear();
        self.cursor = WINDOW_CAPACITY;
        self.comparison = None;
    }

    /// Dismiss a visible product permanently and pull the next qualifying
    /// entry into the freed slot. Returns false (and changes nothing) when
    /// the id is not currently visible.
    pub fn dismiss(&mut self, id: u32) -> bool {
        if !self.is_visible(id) {
            return false;
        }

        self.dismissed.insert(id);
        self.visible.retain(|p| p.id != id);

        // Scan from the cursor for a replacement, skipping anything already
        // dismissed or already on screen. The window shrinks if the result
        // set is exhausted first.
        while self.cursor < self.products.len() {
            let candidate = self.products[self.cursor].clone();
            self.cursor += 1;
            if self.dismissed.contains(&candidate.id) || self.is_visible(candidate.id) {
                continue;
            }
            self.visible.push(candidate);
            break;
        }

        self.comparison = None;
        true
    }

    /// Replace the whole window with the next qualifying entries. Returns
    /// false and leaves the window untouched when no qualifying entry
    /// remains (the no-more-products signal).
    pub fn show_next(&mut self) -> bool {
        let mut next_window: Vec<Product> = Vec::with_capacity(WINDOW_CAPACITY);
        let mut cursor = self.cursor;

        while cursor < self.products.len() && next_window.len() < WINDOW_CAPACITY {
            let candidate = &self.products[cursor];
            cursor += 1;
            if self.dismissed.contains(&candidate.id)
                || next_window.iter().any(|p| p.id == candidate.id)
            {
                continue;
            }
            next_window.push(candidate.clone());
        }

        if next_window.is_empty() {
            return false;
        }

        self.cursor = cursor;
        self.visible = next_window;
        self.comparison = None;
        true
    }

    pub fn visible(&self) -> &[Product] {
        &self.visible
    }

    pub fn is_visible(&self, id: u32) -> bool {
        self.visible.iter().any(|p| p.id == id)
    }

    /// Both window slots, when the window is full. Comparison needs exactly
    /// two products.
    pub fn visible_pair(&self) -> Option<(&Product, &Product)> {
        match self.visible.as_slice() {
            [first, second] => Some((first, second)),
            _ => None,
        }
    }

    pub fn comparison(&self) -> Option<&Comparison> {
        self.comparison.as_ref()
    }

    pub fn set_comparison(&mut self, comparison: Comparison) {
        self.comparison = Some(comparison);
    }

    #[cfg(test)]
    fn dismissed(&self) -> &HashSet<u32> {
        &self.dismissed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductVerdict;

    fn product(id: u32, name: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            price: 10.0,
            image_url: "https://img/placeholder.jpg".to_string(),
            asin: None,
            link: None,
            rating: None,
            reviews_count: None,
        }
    }

    fn products(n: u32) -> Vec<Product> {
        (1..=n).map(|i| product(i, &format!("Product {i}"))).collect()
    }

    fn sample_comparison() -> Comparison {
        Comparison {
            first: ProductVerdict {
                pros: vec!["cheap".to_string()],
                cons: vec![],
            },
            second: ProductVerdict {
                pros: vec![],
                cons: vec!["pricey".to_string()],
            },
            summary: "Take the first one".to_string(),
        }
    }

    #[test]
    fn test_seed_resets_state() {
        let mut carousel = Carousel::new();
        carousel.seed(products(5));
        carousel.dismiss(1);
        assert!(!carousel.dismissed().is_empty());

        carousel.seed(products(3));
        assert!(carousel.dismissed().is_empty());
        assert_eq!(
            carousel.visible().iter().map(|p| p.id).collect::<Vec<_>>(),
            [1, 2]
        );
    }

    #[test]
    fn test_seed_with_fewer_products_than_capacity() {
        let mut carousel = Carousel::new();
        carousel.seed(products(1));
        assert_eq!(carousel.visible().len(), 1);
        assert!(!carousel.show_next());
    }

    #[test]
    fn test_dismiss_pulls_replacement_then_shrinks() {
        // Result Set = [1, 2, 3], Window = [1, 2], Cursor = 2.
        let mut carousel = Carousel::new();
        carousel.seed(products(3));

        assert!(carousel.dismiss(1));
        assert_eq!(
            carousel.visible().iter().map(|p| p.id).collect::<Vec<_>>(),
            [2, 3]
        );
        assert!(carousel.dismissed().contains(&1));

        // No replacement left: the window shrinks below capacity.
        assert!(carousel.dismiss(2));
        assert_eq!(
            carousel.visible().iter().map(|p| p.id).collect::<Vec<_>>(),
            [3]
        );
        assert!(carousel.dismissed().contains(&2));
    }

    #[test]
    fn test_dismissed_id_never_returns() {
        let mut carousel = Carousel::new();
        carousel.seed(products(6));

        carousel.dismiss(1);
        carousel.dismiss(2);
        while carousel.show_next() {
            assert!(!carousel.is_visible(1));
            assert!(!carousel.is_visible(2));
        }
    }

    #[test]
    fn test_window_never_holds_duplicates() {
        let mut carousel = Carousel::new();
        carousel.seed(products(8));

        for id in [1, 3, 4, 6] {
            carousel.dismiss(id);
            let mut ids: Vec<u32> = carousel.visible().iter().map(|p| p.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), carousel.visible().len());
        }
    }

    #[test]
    fn test_dismiss_of_non_visible_id_is_a_no_op() {
        let mut carousel = Carousel::new();
        carousel.seed(products(4));
        carousel.set_comparison(sample_comparison());

        assert!(!carousel.dismiss(4));
        assert_eq!(carousel.visible().len(), 2);
        // An unsuccessful dismiss keeps the comparison
        assert!(carousel.comparison().is_some());
    }

    #[test]
    fn test_show_next_pages_through_results() {
        let mut carousel = Carousel::new();
        carousel.seed(products(5));

        assert!(carousel.show_next());
        assert_eq!(
            carousel.visible().iter().map(|p| p.id).collect::<Vec<_>>(),
            [3, 4]
        );

        assert!(carousel.show_next());
        assert_eq!(
            carousel.visible().iter().map(|p| p.id).collect::<Vec<_>>(),
            [5]
        );
    }

    #[test]
    fn test_show_next_at_exhaustion_leaves_window_unchanged() {
        let mut carousel = Carousel::new();
        carousel.seed(products(2));

        assert!(!carousel.show_next());
        assert_eq!(
            carousel.visible().iter().map(|p| p.id).collect::<Vec<_>>(),
            [1, 2]
        );
    }

    #[test]
    fn test_successful_dismiss_clears_comparison() {
        let mut carousel = Carousel::new();
        carousel.seed(products(3));
        carousel.set_comparison(sample_comparison());

        assert!(carousel.dismiss(1));
        assert!(carousel.comparison().is_none());
    }

    #[test]
    fn test_successful_show_next_clears_comparison() {
        let mut carousel = Carousel::new();
        carousel.seed(products(4));
        carousel.set_comparison(sample_comparison());

        assert!(carousel.show_next());
        assert!(carousel.comparison().is_none());
    }

    #[test]
    fn test_failed_show_next_keeps_comparison() {
        let mut carousel = Carousel::new();
        carousel.seed(products(2));
        carousel.set_comparison(sample_comparison());

        assert!(!carousel.show_next());
        assert!(carousel.comparison().is_some());
    }

    #[test]
    fn test_visible_pair_requires_full_window() {
        let mut carousel = Carousel::new();
        carousel.seed(products(2));
        assert!(carousel.visible_pair().is_some());

        carousel.dismiss(1);
        assert!(carousel.visible_pair().is_none());
    }
}
