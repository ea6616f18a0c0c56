//! Accumulation of paged listings
//!
//! A listing is only usable for classification once every page has been
//! merged: a partial view would report live items as missing. Each page
//! shape implements [`Paginated`]; [`accumulate`] is the single loop that
//! drives them all.

use crate::error::Error;
use std::collections::HashSet;

/// A page of a listing that knows how to reach the next page
pub trait Paginated: Sized {
    /// Token (usually a URL) of the next page, `None` on the last page
    fn next_page_token(&self) -> Option<String>;

    /// Append `other`'s items to this page and adopt its next-page token
    fn merge_in(&mut self, other: Self);
}

/// Follow next-page tokens from `first` until exhausted, merging every page
///
/// `fetch` is called with each token in turn. Any fetch error aborts the
/// whole listing. A token seen twice is reported as [`Error::CursorCycle`].
pub fn accumulate<P, E, F>(first: P, mut fetch: F) -> Result<P, E>
where
    P: Paginated,
    E: From<Error>,
    F: FnMut(&str) -> Result<P, E>,
{
    let mut acc = first;
    let mut seen = HashSet::new();

    while let Some(token) = acc.next_page_token().filter(|t| !t.is_empty()) {
        if !seen.insert(token.clone()) {
            return Err(Error::CursorCycle { token }.into());
        }
        log::trace!("fetching next page: {token}");
        let page = fetch(&token)?;
        acc.merge_in(page);
    }

    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    struct Page {
        items: Vec<u32>,
        next: Option<String>,
    }

    impl Paginated for Page {
        fn next_page_token(&self) -> Option<String> {
            self.next.clone()
        }

        fn merge_in(&mut self, other: Self) {
            self.items.extend(other.items);
            self.next = other.next;
        }
    }

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error(transparent)]
        Paging(#[from] Error),
        #[error("fetch failed: {0}")]
        Fetch(String),
    }

    fn pages() -> HashMap<String, Page> {
        HashMap::from([
            (
                "p2".to_string(),
                Page {
                    items: vec![3, 4],
                    next: Some("p3".into()),
                },
            ),
            (
                "p3".to_string(),
                Page {
                    items: vec![5],
                    next: Some(String::new()),
                },
            ),
        ])
    }

    #[test]
    fn test_accumulate_follows_all_pages() {
        let store = pages();
        let first = Page {
            items: vec![1, 2],
            next: Some("p2".into()),
        };
        let all = accumulate(first, |token| {
            store
                .get(token)
                .cloned()
                .ok_or_else(|| TestError::Fetch(token.to_string()))
        })
        .unwrap();
        assert_eq!(all.items, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_accumulate_single_page() {
        let first = Page {
            items: vec![7],
            next: None,
        };
        let all = accumulate(first, |t| Err::<Page, _>(TestError::Fetch(t.into()))).unwrap();
        assert_eq!(all.items, vec![7]);
    }

    #[test]
    fn test_accumulate_propagates_fetch_error() {
        let first = Page {
            items: vec![1],
            next: Some("missing".into()),
        };
        let result = accumulate(first, |t| Err::<Page, _>(TestError::Fetch(t.into())));
        assert!(matches!(result, Err(TestError::Fetch(t)) if t == "missing"));
    }

    #[test]
    fn test_accumulate_detects_cursor_cycle() {
        let first = Page {
            items: vec![],
            next: Some("loop".into()),
        };
        let result = accumulate(first, |_| {
            Ok::<_, TestError>(Page {
                items: vec![1],
                next: Some("loop".into()),
            })
        });
        assert!(matches!(
            result,
            Err(TestError::Paging(Error::CursorCycle { .. }))
        ));
    }
}
