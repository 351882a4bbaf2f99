use std::cmp;

use model;

/// Number of devices shown per page by the listing views.
pub const ITEMS_PER_PAGE: usize = 8;

pub trait Named {
    fn name(&self) -> &str;
}

#[derive(Debug, PartialEq)]
pub struct Page<'a, A: 'a> {
    pub items: &'a [A],
    /// 1-based, and 1 for an empty result.
    pub number: usize,
    pub total_pages: usize,
}

/// Keeps the items whose name contains `query`, ignoring case.
pub fn filter_by_name<'a, A>(items: &'a [A], query: &str) -> Vec<&'a A>
where
    A: Named,
{
    let query = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.name().to_lowercase().contains(&query))
        .collect()
}

/// Cuts out page `page` (1-based) of `items`; out-of-range pages are clamped to the nearest one.
pub fn paginate<A>(items: &[A], page: usize, per_page: usize) -> Page<A> {
    let per_page = cmp::max(per_page, 1);
    let total_pages = (items.len() + per_page - 1) / per_page;
    let number = cmp::min(cmp::max(page, 1), cmp::max(total_pages, 1));
    let start = cmp::min((number - 1) * per_page, items.len());
    let end = cmp::min(start + per_page, items.len());

    Page {
        items: &items[start..end],
        number,
        total_pages,
    }
}

impl Named for model::Device {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Item(&'static str);

    impl Named for Item {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn filter_ignores_case() {
        let items = [
            Item("Greenhouse Sensor A"),
            Item("Warehouse Sensor B"),
            Item("Office Sensor C"),
        ];

        let found = filter_by_name(&items, "HOUSE");
        assert_eq!(
            vec!["Greenhouse Sensor A", "Warehouse Sensor B"],
            found.iter().map(|i| i.name()).collect::<Vec<_>>()
        );
        assert_eq!(3, filter_by_name(&items, "").len());
        assert!(filter_by_name(&items, "basement").is_empty());
    }

    #[test]
    fn devices_filter_by_name() {
        let devices = ::catalog::fallback_devices();

        let found = filter_by_name(&devices, "sensor b");
        assert_eq!(1, found.len());
        assert_eq!("dev-2", found[0].id);
    }

    #[test]
    fn pages() {
        let items = (0..19).collect::<Vec<u32>>();

        let first = paginate(&items, 1, ITEMS_PER_PAGE);
        assert_eq!(3, first.total_pages);
        assert_eq!(&items[0..8], first.items);

        let last = paginate(&items, 3, ITEMS_PER_PAGE);
        assert_eq!(&[16, 17, 18], last.items);

        assert_eq!(3, paginate(&items, 99, ITEMS_PER_PAGE).number);
        assert_eq!(1, paginate(&items, 0, ITEMS_PER_PAGE).number);
    }

    #[test]
    fn empty_pages() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 2, ITEMS_PER_PAGE);
        assert_eq!(0, page.total_pages);
        assert_eq!(1, page.number);
        assert!(page.items.is_empty());
    }
}
