//! A bounded collection that stays sorted after every insertion.
//!
//! Used by the feed to keep only the most recent entries: pushing appends,
//! re-sorts by the caller's `before` predicate, and truncates to the limit.
//! Anything cut off by the truncation is dropped for good.

use std::cmp::Ordering;

pub struct SortedLimited<T, F>
where
    F: Fn(&T, &T) -> bool,
{
    items: Vec<T>,
    limit: usize,
    before: F,
}

impl<T, F> SortedLimited<T, F>
where
    F: Fn(&T, &T) -> bool,
{
    /// Create an empty collection. `before(a, b)` is true when `a` sorts first.
    pub fn new(limit: usize, before: F) -> Self {
        Self {
            items: Vec::new(),
            limit,
            before,
        }
    }

    pub fn from_items(items: Vec<T>, limit: usize, before: F) -> Self {
        let mut collection = Self::new(limit, before);
        collection.push(items);
        collection
    }

    /// Append `items`, restore the ordering, and drop everything past the limit.
    ///
    /// The sort is stable, so elements that compare equal keep their
    /// insertion order.
    pub fn push<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.items.extend(items);
        let before = &self.before;
        self.items.sort_by(|a, b| {
            if before(a, b) {
                Ordering::Less
            } else if before(b, a) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        });
        self.items.truncate(self.limit);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descending(a: &i32, b: &i32) -> bool {
        a > b
    }

    #[test]
    fn push_keeps_the_top_items() {
        let mut c = SortedLimited::from_items(vec![1, 5, 3], 3, descending);
        c.push(vec![4, 2]);
        assert_eq!(c.items(), &[5, 4, 3]);
    }

    #[test]
    fn discarded_items_do_not_come_back() {
        let mut c = SortedLimited::new(2, descending);
        c.push(vec![10, 9, 8]);
        assert_eq!(c.items(), &[10, 9]);
        c.push(vec![1]);
        assert_eq!(c.items(), &[10, 9]);
    }

    #[test]
    fn never_exceeds_limit() {
        let mut c = SortedLimited::new(4, descending);
        for chunk in (0..50).collect::<Vec<_>>().chunks(7) {
            c.push(chunk.to_vec());
            assert!(c.len() <= c.limit());
            assert!(c.items().windows(2).all(|w| !descending(&w[1], &w[0])));
        }
        assert_eq!(c.into_vec(), vec![49, 48, 47, 46]);
    }

    #[test]
    fn under_limit_keeps_everything_sorted() {
        let c = SortedLimited::from_items(vec![2, 7, 1], 10, descending);
        assert_eq!(c.len(), 3);
        assert_eq!(c.items(), &[7, 2, 1]);
    }

    #[test]
    fn equal_items_keep_insertion_order() {
        fn by_key(x: &(i32, char), y: &(i32, char)) -> bool {
            x.0 > y.0
        }
        let c = SortedLimited::from_items(vec![(1, 'a'), (2, 'b'), (1, 'c')], 3, by_key);
        assert_eq!(c.items(), &[(2, 'b'), (1, 'a'), (1, 'c')]);
    }

    #[test]
    fn zero_limit_is_always_empty() {
        let mut c = SortedLimited::new(0, descending);
        c.push(vec![1, 2, 3]);
        assert!(c.is_empty());
    }
}
