use serde::{Deserialize, Serialize};

/// The `?page=` query parameter of paginated pages.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    pub fn requested(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

/// Splits `total` items into pages of `per_page` items.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: i64,
    per_page: i64,
}

impl Paginator {
    pub fn new(total: i64, per_page: i64) -> Self {
        Self {
            total: total.max(0),
            per_page: per_page.max(1),
        }
    }

    /// An empty collection still has a single (empty) page.
    pub fn num_pages(&self) -> i64 {
        match self.total {
            0 => 1,
            total => (total + self.per_page - 1) / self.per_page,
        }
    }

    /// Resolves a raw page number from the query string to an existing page.
    /// Missing or non-numeric values give the first page, numbers outside of
    /// the valid range give the last page.
    pub fn page_number(&self, requested: Option<&str>) -> i64 {
        let num_pages = self.num_pages();
        match requested.map(str::trim).map(str::parse::<i64>) {
            None | Some(Err(_)) => 1,
            Some(Ok(number)) if (1..=num_pages).contains(&number) => number,
            Some(Ok(_)) => num_pages,
        }
    }

    pub fn offset(&self, number: i64) -> i64 {
        (number - 1) * self.per_page
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Wraps `object_list` as page `number`.
    pub fn page<T>(&self, number: i64, object_list: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        Page {
            number,
            num_pages,
            total: self.total,
            has_previous: number > 1,
            has_next: number < num_pages,
            previous_page_number: (number > 1).then_some(number - 1),
            next_page_number: (number < num_pages).then_some(number + 1),
            page_range: (1..=num_pages).collect(),
            object_list,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<i64>,
    pub next_page_number: Option<i64>,
    pub page_range: Vec<i64>,
    pub object_list: Vec<T>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn page_counts() {
        assert_eq!(Paginator::new(0, 10).num_pages(), 1);
        assert_eq!(Paginator::new(10, 10).num_pages(), 1);
        assert_eq!(Paginator::new(13, 10).num_pages(), 2);
        assert_eq!(Paginator::new(13, 5).num_pages(), 3);
        assert_eq!(Paginator::new(5, 0).per_page(), 1);
    }

    #[test]
    fn page_numbers() {
        let paginator = Paginator::new(13, 10);
        assert_eq!(paginator.page_number(None), 1);
        assert_eq!(paginator.page_number(Some("2")), 2);
        assert_eq!(paginator.page_number(Some(" 2 ")), 2);
        assert_eq!(paginator.page_number(Some("abc")), 1);
        assert_eq!(paginator.page_number(Some("")), 1);
        assert_eq!(paginator.page_number(Some("3")), 2);
        assert_eq!(paginator.page_number(Some("0")), 2);
        assert_eq!(paginator.page_number(Some("-4")), 2);
        assert_eq!(paginator.offset(2), 10);
    }

    #[test]
    fn page_links() {
        let paginator = Paginator::new(25, 10);
        let first = paginator.page(1, vec![(); 10]);
        assert!(!first.has_previous);
        assert!(first.has_next);
        assert_eq!(first.next_page_number, Some(2));
        assert_eq!(first.page_range, vec![1, 2, 3]);

        let last = paginator.page(3, vec![(); 5]);
        assert!(last.has_previous);
        assert!(!last.has_next);
        assert_eq!(last.previous_page_number, Some(2));
        assert_eq!(last.object_list.len(), 5);
    }
}
