//! Category ordering.
//!
//! The configured `categories` value is a comma-separated list; a category's
//! display order is its position in that list. Names are trimmed, empty
//! entries are skipped, and when a name appears twice the first position wins.

use std::collections::HashMap;

use crate::types::Category;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    orders: HashMap<String, i64>,
}

impl CategoryIndex {
    /// Parse a comma-separated category list.
    pub fn parse(list: &str) -> Self {
        Self::from_names(list.split(','))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut orders = HashMap::new();
        for (position, name) in names.into_iter().enumerate() {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            orders.entry(name.to_string()).or_insert(position as i64);
        }
        Self { orders }
    }

    pub fn order_of(&self, name: &str) -> Option<i64> {
        self.orders.get(name).copied()
    }

    /// Resolve a name to a [`Category`], or `None` if it is not configured.
    pub fn resolve(&self, name: &str) -> Option<Category> {
        self.order_of(name).map(|order| Category {
            name: name.to_string(),
            order,
        })
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
