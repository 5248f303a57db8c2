use common::data::PageResult;

/// Pages shown on each side of the current one.
pub const WINDOW: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSlot {
    Page(u32),
    Ellipsis,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageControl {
    /// `target` is `None` while on the first page.
    Previous { target: Option<u32> },
    Page { index: u32, active: bool },
    Ellipsis,
    /// `target` is `None` while on the last page.
    Next { target: Option<u32> },
}

/// Zero-based page indices to offer for navigation.
///
/// The first and last pages are always present, along with every page
/// within [`WINDOW`] of `current`. Each run of skipped pages collapses into
/// one ellipsis. When the page count fits inside a single window width,
/// every page is shown.
pub fn page_window(total_pages: u32, current: u32) -> Vec<PageSlot> {
    if total_pages <= 1 {
        return Vec::new();
    }
    if total_pages <= 2 * WINDOW + 1 {
        return (0..total_pages).map(PageSlot::Page).collect();
    }
    let last = total_pages - 1;
    let current = current.min(last);
    let low = current.saturating_sub(WINDOW).max(1);
    let high = current.saturating_add(WINDOW).min(last - 1);

    let mut slots = vec![PageSlot::Page(0)];
    let mut previous = 0;
    for page in (low..=high).chain(std::iter::once(last)) {
        if page <= previous {
            continue;
        }
        if page > previous + 1 {
            slots.push(PageSlot::Ellipsis);
        }
        slots.push(PageSlot::Page(page));
        previous = page;
    }
    slots
}

/// Full control row for a fetched page: previous, the window, next.
/// Nothing at all when there is a single page.
pub fn pagination_controls(page: &PageResult, current: u32) -> Vec<PageControl> {
    let slots = page_window(page.total_pages, current);
    if slots.is_empty() {
        return Vec::new();
    }
    let mut controls = Vec::with_capacity(slots.len() + 2);
    controls.push(PageControl::Previous {
        target: (!page.first).then(|| current.saturating_sub(1)),
    });
    controls.extend(slots.into_iter().map(|slot| match slot {
        PageSlot::Page(index) => PageControl::Page {
            index,
            active: index == current,
        },
        PageSlot::Ellipsis => PageControl::Ellipsis,
    }));
    controls.push(PageControl::Next {
        target: (!page.last).then(|| current + 1),
    });
    controls
}

#[cfg(test)]
mod tests {
    use super::PageSlot::{Ellipsis, Page};
    use super::*;

    #[test]
    fn single_page_has_no_controls() {
        assert!(page_window(0, 0).is_empty());
        assert!(page_window(1, 0).is_empty());
        let page = PageResult {
            total_pages: 1,
            first: true,
            last: true,
            ..Default::default()
        };
        assert!(pagination_controls(&page, 0).is_empty());
    }

    #[test]
    fn small_page_counts_show_everything() {
        assert_eq!(page_window(5, 0), [Page(0), Page(1), Page(2), Page(3), Page(4)]);
        assert_eq!(page_window(2, 1), [Page(0), Page(1)]);
    }

    #[test]
    fn window_in_the_middle() {
        assert_eq!(
            page_window(20, 10),
            [Page(0), Ellipsis, Page(8), Page(9), Page(10), Page(11), Page(12), Ellipsis, Page(19)]
        );
        assert_eq!(
            page_window(10, 5),
            [Page(0), Ellipsis, Page(3), Page(4), Page(5), Page(6), Page(7), Ellipsis, Page(9)]
        );
    }

    #[test]
    fn window_touching_the_edges() {
        assert_eq!(
            page_window(10, 0),
            [Page(0), Page(1), Page(2), Ellipsis, Page(9)]
        );
        assert_eq!(
            page_window(10, 3),
            [Page(0), Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(9)]
        );
        assert_eq!(
            page_window(10, 9),
            [Page(0), Ellipsis, Page(7), Page(8), Page(9)]
        );
        assert_eq!(
            page_window(10, 6),
            [Page(0), Ellipsis, Page(4), Page(5), Page(6), Page(7), Page(8), Page(9)]
        );
    }

    #[test]
    fn out_of_range_current_is_clamped() {
        assert_eq!(
            page_window(10, 42),
            [Page(0), Ellipsis, Page(7), Page(8), Page(9)]
        );
    }

    #[test]
    fn controls_wrap_the_window() {
        let page = PageResult {
            total_pages: 3,
            first: true,
            last: false,
            ..Default::default()
        };
        assert_eq!(
            pagination_controls(&page, 0),
            [
                PageControl::Previous { target: None },
                PageControl::Page { index: 0, active: true },
                PageControl::Page { index: 1, active: false },
                PageControl::Page { index: 2, active: false },
                PageControl::Next { target: Some(1) },
            ]
        );

        let page = PageResult {
            total_pages: 3,
            first: false,
            last: true,
            ..Default::default()
        };
        let controls = pagination_controls(&page, 2);
        assert_eq!(controls.first(), Some(&PageControl::Previous { target: Some(1) }));
        assert_eq!(controls.last(), Some(&PageControl::Next { target: None }));
    }
}
