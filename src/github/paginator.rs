use async_trait::async_trait;

use crate::error::Result;
use crate::pacing::Pacing;

/// A listing endpoint that can be read one page at a time. Pages are
/// numbered from 1.
#[async_trait]
pub trait PageSource<T: Send>: Send + Sync {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<T>>;
}

/// Walks a [`PageSource`] until it returns an empty page or `max_pages`
/// pages have been read. Hitting the cap means the result may be
/// incomplete.
#[derive(Debug, Clone)]
pub struct Paginator {
    per_page: u32,
    max_pages: u32,
    pacing: Pacing,
}

impl Paginator {
    pub fn new(per_page: u32, max_pages: u32, pacing: Pacing) -> Self {
        Self {
            per_page,
            max_pages,
            pacing,
        }
    }

    pub async fn fetch_all<T, S>(&self, source: &S) -> Result<Vec<T>>
    where
        T: Send,
        S: PageSource<T> + ?Sized,
    {
        let mut all_items = Vec::new();
        let mut page = 1;

        loop {
            tracing::debug!("Requesting page {}", page);
            let items = source.fetch_page(page, self.per_page).await?;

            if items.is_empty() {
                break;
            }

            tracing::info!("Received {} items from page {}", items.len(), page);
            all_items.extend(items);

            if page >= self.max_pages {
                tracing::info!("Page limit reached ({}), results may be incomplete", self.max_pages);
                break;
            }

            self.pacing.wait(page).await;
            page += 1;
        }

        Ok(all_items)
    }
}
