//! Pagination metadata
//!
//! GitLab paginates list endpoints with `x-*` headers and an RFC 5988 `Link`
//! header. The `next` link is followed verbatim, which also covers keyset
//! pagination where page numbers are absent.

use reqwest::header::HeaderMap;

/// One page of a list response
#[derive(Debug, Clone)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub page: Option<u32>,
    pub next_page: Option<u32>,
    pub per_page: Option<u32>,
    pub total: Option<u64>,
    pub total_pages: Option<u32>,
    /// Absolute URL of the next page, from the `Link` header
    pub next_url: Option<String>,
}

impl<T> ListPage<T> {
    pub(crate) fn from_headers(items: Vec<T>, headers: &HeaderMap) -> Self {
        Self {
            items,
            page: header_number(headers, "x-page"),
            next_page: header_number(headers, "x-next-page"),
            per_page: header_number(headers, "x-per-page"),
            total: header_number(headers, "x-total"),
            total_pages: header_number(headers, "x-total-pages"),
            next_url: headers
                .get("link")
                .and_then(|v| v.to_str().ok())
                .and_then(next_link),
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_url.is_some()
    }

    /// Convert the items, keeping the pagination metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ListPage<U> {
        ListPage {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            next_page: self.next_page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
            next_url: self.next_url,
        }
    }

    /// Fallible [`ListPage::map`], stopping at the first error
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<ListPage<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(ListPage {
            items,
            page: self.page,
            next_page: self.next_page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
            next_url: self.next_url,
        })
    }
}

fn header_number<N: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<N> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Extract the `rel="next"` target from a `Link` header value
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments.any(|param| {
            let param = param.trim();
            param == r#"rel="next""# || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}
