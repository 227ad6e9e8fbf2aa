//! Cursor-following fetch loop over remote collections.

use super::client::ApiClient;
use super::models::Page;
use super::transport::HttpTransport;
use crate::Result;
use serde::de::DeserializeOwned;
use std::ops::ControlFlow;

/// Why a fetch loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The last page had no `next` cursor.
    Exhausted,
    /// The visitor asked to stop.
    Stopped,
    /// A page answered with a 2xx status other than 200; earlier items are kept.
    Interrupted {
        /// The status of the page that ended the loop.
        status: u16,
    },
}

/// Summary of one fetch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStats {
    /// Pages consumed.
    pub pages: usize,
    /// Items visited.
    pub items: usize,
    /// How the loop ended.
    pub termination: Termination,
}

/// Drives `items`/`next` pagination against one collection.
///
/// Only a 200 page is consumed. A non-2xx page fails with
/// [`crate::Error::Http`]; any other 2xx page ends the loop, leaving the
/// caller with what earlier pages produced.
#[derive(Debug)]
pub struct PaginatedFetcher<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: HttpTransport> PaginatedFetcher<'a, T> {
    /// Creates a fetcher over `client`.
    #[must_use]
    pub const fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Visits every item from `start_url` onwards until the cursor runs out
    /// or `visit` breaks.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Http`] on a non-2xx page, or a decode error
    /// for a malformed page.
    pub fn for_each<I, F>(&self, start_url: &str, mut visit: F) -> Result<PageStats>
    where
        I: DeserializeOwned,
        F: FnMut(I) -> ControlFlow<()>,
    {
        let mut next = Some(start_url.to_string());
        let mut pages = 0;
        let mut items = 0;

        while let Some(url) = next.take() {
            let response = self.client.get(&url)?;
            if response.status != 200 {
                tracing::warn!(
                    status = response.status,
                    pages,
                    items,
                    "Stopping pagination on a non-200 page"
                );
                return Ok(PageStats {
                    pages,
                    items,
                    termination: Termination::Interrupted {
                        status: response.status,
                    },
                });
            }

            let page: Page<I> = response.json()?;
            pages += 1;
            for item in page.items {
                items += 1;
                if visit(item).is_break() {
                    return Ok(PageStats {
                        pages,
                        items,
                        termination: Termination::Stopped,
                    });
                }
            }

            next = page.next.filter(|cursor| !cursor.is_empty());
        }

        tracing::debug!(pages, items, "Pagination exhausted");
        Ok(PageStats {
            pages,
            items,
            termination: Termination::Exhausted,
        })
    }

    /// Collects the projection of every item; `None` projections are skipped.
    ///
    /// # Errors
    ///
    /// See [`PaginatedFetcher::for_each`].
    pub fn collect<I, O, F>(&self, start_url: &str, mut project: F) -> Result<Vec<O>>
    where
        I: DeserializeOwned,
        F: FnMut(I) -> Option<O>,
    {
        let mut accumulated = Vec::new();
        self.for_each(start_url, |item: I| {
            if let Some(value) = project(item) {
                accumulated.push(value);
            }
            ControlFlow::Continue(())
        })?;
        Ok(accumulated)
    }

    /// Returns the first projection that is `Some`, stopping early.
    ///
    /// # Errors
    ///
    /// See [`PaginatedFetcher::for_each`].
    pub fn find<I, O, F>(&self, start_url: &str, mut project: F) -> Result<Option<O>>
    where
        I: DeserializeOwned,
        F: FnMut(I) -> Option<O>,
    {
        let mut found = None;
        self.for_each(start_url, |item: I| {
            found = project(item);
            if found.is_some() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        Ok(found)
    }
}
