//! Index aggregation and the two index renderings.
//!
//! [`aggregate`] folds the flat page list into categories ordered by the
//! configured category position, each holding its pages ordered by the
//! front-matter `order`. The result does not depend on the order pages were
//! built in, so parallel page construction cannot reorder the site.
//!
//! Two invariants are checked while folding:
//!
//! - one category position maps to exactly one category name;
//! - within a category, every page `order` is used once.
//!
//! A violation names both conflicting records.

use std::collections::BTreeMap;

use maud::html;
use thiserror::Error;

use crate::types::{IndexItem, IndexItemPage, Page};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error(
        "Category order {order} is used by both {existing:?} (page {existing_url}) and {conflicting:?} (page {conflicting_url})"
    )]
    DuplicateCategory {
        order: i64,
        existing: String,
        existing_url: String,
        conflicting: String,
        conflicting_url: String,
    },
    #[error(
        "Page order {order} in category {category:?} is used by both {existing:?} and {conflicting:?}"
    )]
    DuplicatePageOrder {
        category: String,
        order: i64,
        existing: IndexItemPage,
        conflicting: IndexItemPage,
    },
}

struct Bucket {
    name: String,
    /// URL of the page that introduced this category.
    first_url: String,
    pages: BTreeMap<i64, IndexItemPage>,
}

/// Group pages by category, both levels in ascending order.
pub fn aggregate(pages: &[Page]) -> Result<Vec<IndexItem>, IndexError> {
    let mut buckets: BTreeMap<i64, Bucket> = BTreeMap::new();
    for page in pages {
        let category = &page.meta.category;
        let bucket = buckets.entry(category.order).or_insert_with(|| Bucket {
            name: category.name.clone(),
            first_url: page.url.clone(),
            pages: BTreeMap::new(),
        });
        if bucket.name != category.name {
            return Err(IndexError::DuplicateCategory {
                order: category.order,
                existing: bucket.name.clone(),
                existing_url: bucket.first_url.clone(),
                conflicting: category.name.clone(),
                conflicting_url: page.url.clone(),
            });
        }
        let entry = IndexItemPage {
            title: page.title.clone(),
            url: page.url.clone(),
        };
        if let Some(existing) = bucket.pages.get(&page.meta.order) {
            return Err(IndexError::DuplicatePageOrder {
                category: category.name.clone(),
                order: page.meta.order,
                existing: existing.clone(),
                conflicting: entry,
            });
        }
        bucket.pages.insert(page.meta.order, entry);
    }

    Ok(buckets
        .into_values()
        .map(|bucket| IndexItem {
            name: bucket.name,
            pages: bucket.pages.into_values().collect(),
        })
        .collect())
}

/// The `__INDEX__` fragment: one open `<details>` per category.
pub fn index_menu(items: &[IndexItem]) -> String {
    html! {
        nav.index-menu {
            @for item in items {
                "\n"
                details open {
                    "\n"
                    summary { (item.name) }
                    @for page in &item.pages {
                        "\n"
                        p { a href=(page.url) { (page.title) } }
                    }
                    "\n"
                }
            }
            "\n"
        }
    }
    .into_string()
}

/// Markdown source of the index page: the header, then a section per
/// category with a bullet link per page.
pub fn index_markdown(header: &str, items: &[IndexItem]) -> String {
    let mut md = format!("# {header}\n");
    for item in items {
        md.push_str(&format!("\n## {}\n", item.name));
        for page in &item.pages {
            md.push_str(&format!("* [{}]({})\n", page.title, page.url));
        }
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::page;

    fn sample() -> Vec<Page> {
        vec![
            page("B", 1, 2, "B two", "/b2.html"),
            page("A", 0, 5, "A five", "/a5.html"),
            page("B", 1, 1, "B one", "/b1.html"),
            page("A", 0, 1, "A one", "/a1.html"),
        ]
    }

    fn titles(items: &[IndexItem]) -> Vec<(String, Vec<String>)> {
        items
            .iter()
            .map(|i| (i.name.clone(), i.pages.iter().map(|p| p.title.clone()).collect()))
            .collect()
    }

    #[test]
    fn aggregate_orders_categories_and_pages() {
        let items = aggregate(&sample()).unwrap();
        assert_eq!(
            titles(&items),
            vec![
                ("A".to_string(), vec!["A one".to_string(), "A five".to_string()]),
                ("B".to_string(), vec!["B one".to_string(), "B two".to_string()]),
            ]
        );
    }

    #[test]
    fn aggregate_is_permutation_insensitive() {
        let pages = sample();
        let expected = aggregate(&pages).unwrap();
        // Every rotation and its reverse.
        for shift in 0..pages.len() {
            let mut rotated = pages.clone();
            rotated.rotate_left(shift);
            assert_eq!(aggregate(&rotated).unwrap(), expected);
            rotated.reverse();
            assert_eq!(aggregate(&rotated).unwrap(), expected);
        }
    }

    #[test]
    fn aggregate_empty() {
        assert!(aggregate(&[]).unwrap().is_empty());
    }

    #[test]
    fn duplicate_category_order_fails_with_both_names() {
        let pages = vec![page("A", 0, 1, "a", "/a.html"), page("Z", 0, 2, "z", "/z.html")];
        let err = aggregate(&pages).unwrap_err();
        match err {
            IndexError::DuplicateCategory {
                order,
                existing,
                existing_url,
                conflicting,
                conflicting_url,
            } => {
                assert_eq!(order, 0);
                assert_eq!(existing, "A");
                assert_eq!(existing_url, "/a.html");
                assert_eq!(conflicting, "Z");
                assert_eq!(conflicting_url, "/z.html");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_category_message_names_both_pages() {
        let pages = vec![
            page("A", 0, 1, "a", "/a.html"),
            page("A", 0, 2, "a2", "/a2.html"),
            page("Z", 0, 3, "z", "/z.html"),
        ];
        let message = aggregate(&pages).unwrap_err().to_string();
        assert!(message.contains("/a.html"));
        assert!(message.contains("/z.html"));
        assert!(!message.contains("/a2.html"));
    }

    #[test]
    fn duplicate_page_order_fails_with_both_pages() {
        let pages = vec![page("A", 0, 3, "first", "/1.html"), page("A", 0, 3, "second", "/2.html")];
        let err = aggregate(&pages).unwrap_err();
        match err {
            IndexError::DuplicatePageOrder {
                existing,
                conflicting,
                ..
            } => {
                assert_eq!(existing.title, "first");
                assert_eq!(conflicting.title, "second");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_page_order_in_different_categories_is_fine() {
        let pages = vec![page("A", 0, 1, "a", "/a.html"), page("B", 1, 1, "b", "/b.html")];
        assert_eq!(aggregate(&pages).unwrap().len(), 2);
    }

    #[test]
    fn index_menu_empty() {
        assert_eq!(index_menu(&[]), "<nav class=\"index-menu\">\n</nav>");
    }

    #[test]
    fn index_menu_single_item_without_pages() {
        let items = vec![IndexItem {
            name: "Item1".into(),
            pages: vec![],
        }];
        assert_eq!(
            index_menu(&items),
            "<nav class=\"index-menu\">\n<details open>\n<summary>Item1</summary>\n</details>\n</nav>"
        );
    }

    #[test]
    fn index_menu_escapes_and_lists_pages() {
        let items = aggregate(&[page("Q&A", 0, 1, "Why <this>?", "https://example.com/q.html")]).unwrap();
        assert_eq!(
            index_menu(&items),
            "<nav class=\"index-menu\">\n<details open>\n<summary>Q&amp;A</summary>\n\
             <p><a href=\"https://example.com/q.html\">Why &lt;this&gt;?</a></p>\n</details>\n</nav>"
        );
    }

    #[test]
    fn index_markdown_lists_every_page() {
        let items = aggregate(&sample()).unwrap();
        assert_eq!(
            index_markdown("Docs", &items),
            "# Docs\n\n## A\n* [A one](/a1.html)\n* [A five](/a5.html)\n\n## B\n* [B one](/b1.html)\n* [B two](/b2.html)\n"
        );
    }
}
