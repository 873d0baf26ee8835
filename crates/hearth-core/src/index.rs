//! Page index arithmetic.
//!
//! Two numbering schemes run over the same page list and must not be
//! conflated:
//!
//! - the *widget-page index*: a dense ordinal over every page that hosts
//!   widgets, used to key widget-page records;
//! - the *apps-and-widgets tab index*: the ordinal of a page among
//!   `AppsAndWidgets` pages only.
//!
//! Both are recomputed from the current list on every call; nothing here is
//! cached across structural changes.

use hearth_types::page::PageType;

/// Widget-page index of the page at `page_position`.
///
/// Counts widget-hosting pages in `[0, page_position)`, i.e. the 0-based
/// ordinal of this page among widget-hosting pages. `None` if the position is
/// out of range or the page hosts no widgets.
pub fn widget_page_index_for(pages: &[PageType], page_position: usize) -> Option<usize> {
    let page = pages.get(page_position)?;
    if !page.hosts_widgets() {
        return None;
    }
    Some(
        pages[..page_position]
            .iter()
            .filter(|p| p.hosts_widgets())
            .count(),
    )
}

/// Number of widget pages backing `pages`.
pub fn widget_page_count(pages: &[PageType]) -> usize {
    pages.iter().filter(|p| p.hosts_widgets()).count()
}

/// Count of `AppsAndWidgets` pages strictly before `page_position`.
///
/// `None` if the position is out of range.
pub fn apps_and_widgets_tab_index_for(pages: &[PageType], page_position: usize) -> Option<usize> {
    if page_position >= pages.len() {
        return None;
    }
    Some(
        pages[..page_position]
            .iter()
            .filter(|p| **p == PageType::AppsAndWidgets)
            .count(),
    )
}

/// Home tab after the page at `removed` is deleted.
pub fn home_tab_after_removal(home: usize, removed: usize) -> usize {
    match removed.cmp(&home) {
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Less => home - 1,
        std::cmp::Ordering::Greater => home,
    }
}

/// Home tab after a page is inserted at `inserted`.
pub fn home_tab_after_insert(home: usize, inserted: usize) -> usize {
    if inserted <= home { home + 1 } else { home }
}

/// Where the page at `index` ends up when the page at `from` moves to `to`.
pub fn index_after_move(index: usize, from: usize, to: usize) -> usize {
    if index == from {
        to
    } else if from < to && index > from && index <= to {
        index - 1
    } else if to < from && index >= to && index < from {
        index + 1
    } else {
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_types::page::PageType::{AppsAndWidgets as W, AppsOnly as A};

    #[test]
    fn widget_index_is_dense_over_all_pages() {
        let pages = [A, W, A];
        assert_eq!(widget_page_index_for(&pages, 0), Some(0));
        assert_eq!(widget_page_index_for(&pages, 1), Some(1));
        assert_eq!(widget_page_index_for(&pages, 2), Some(2));
        assert_eq!(widget_page_count(&pages), 3);
    }

    #[test]
    fn widget_index_out_of_range() {
        assert_eq!(widget_page_index_for(&[A], 1), None);
        assert_eq!(widget_page_index_for(&[], 0), None);
    }

    #[test]
    fn tab_index_counts_only_combined_pages_before() {
        let pages = [W, A, W];
        assert_eq!(apps_and_widgets_tab_index_for(&pages, 0), Some(0));
        assert_eq!(apps_and_widgets_tab_index_for(&pages, 1), Some(1));
        assert_eq!(apps_and_widgets_tab_index_for(&pages, 2), Some(1));
        assert_eq!(apps_and_widgets_tab_index_for(&pages, 3), None);
    }

    #[test]
    fn schemes_differ() {
        let pages = [A, A, W];
        assert_eq!(widget_page_index_for(&pages, 2), Some(2));
        assert_eq!(apps_and_widgets_tab_index_for(&pages, 2), Some(0));
    }

    #[test]
    fn home_tab_removal_rules() {
        assert_eq!(home_tab_after_removal(2, 2), 0);
        assert_eq!(home_tab_after_removal(2, 0), 1);
        assert_eq!(home_tab_after_removal(1, 2), 1);
        assert_eq!(home_tab_after_removal(0, 0), 0);
    }

    #[test]
    fn home_tab_insert_rules() {
        assert_eq!(home_tab_after_insert(1, 0), 2);
        assert_eq!(home_tab_after_insert(1, 1), 2);
        assert_eq!(home_tab_after_insert(1, 2), 1);
    }

    #[test]
    fn move_is_a_permutation() {
        for (from, to) in [(0, 2), (2, 0), (1, 1), (0, 1), (2, 1)] {
            let mut seen: Vec<usize> = (0..3).map(|i| index_after_move(i, from, to)).collect();
            assert_eq!(index_after_move(from, from, to), to);
            seen.sort_unstable();
            assert_eq!(seen, vec![0, 1, 2], "from={from} to={to}");
        }
    }

    #[test]
    fn move_forward_shifts_between_down() {
        // [a, b, c] move a to 2 -> [b, c, a]
        assert_eq!(index_after_move(1, 0, 2), 0);
        assert_eq!(index_after_move(2, 0, 2), 1);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn page_type() -> impl Strategy<Value = PageType> {
            prop_oneof![Just(A), Just(W)]
        }

        proptest! {
            #[test]
            fn widget_index_monotone_unit_steps(
                pages in proptest::collection::vec(page_type(), 1..16),
            ) {
                let mut prev: Option<usize> = None;
                for i in 0..pages.len() {
                    let idx = widget_page_index_for(&pages, i).unwrap();
                    if let Some(p) = prev {
                        prop_assert_eq!(idx, p + 1);
                    } else {
                        prop_assert_eq!(idx, 0);
                    }
                    prev = Some(idx);
                }
            }

            #[test]
            fn tab_index_non_decreasing(
                pages in proptest::collection::vec(page_type(), 1..16),
            ) {
                let mut prev = 0;
                for i in 0..pages.len() {
                    let idx = apps_and_widgets_tab_index_for(&pages, i).unwrap();
                    prop_assert!(idx >= prev);
                    prop_assert!(idx - prev <= 1);
                    prev = idx;
                }
            }
        }
    }
}
