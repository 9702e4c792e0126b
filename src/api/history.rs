//! Backward-in-time pagination over a channel's message history.

use std::cmp::Ordering;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::api::client::{DiscordApi, MESSAGES_PAGE_SIZE};
use crate::api::query::MessagesQuery;
use crate::api::types::Message;
use crate::error::Result;

/// Anything that can serve one page of channel history.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn fetch_messages(&self, channel_id: &str, query: &MessagesQuery) -> Result<Vec<Message>>;
}

#[async_trait]
impl MessageSource for DiscordApi {
    async fn fetch_messages(&self, channel_id: &str, query: &MessagesQuery) -> Result<Vec<Message>> {
        self.get_channel_messages(channel_id, query).await
    }
}

/// Compare two snowflakes by numeric magnitude without parsing them.
pub fn compare_snowflakes(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Where to start and stop walking the history.
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// Only messages older than this id. `None` starts from the newest message.
    pub before: Option<String>,
    /// Only messages newer than this id. `None` walks to the very first message.
    pub after: Option<String>,
    /// Messages per request, at most 100.
    pub page_size: u32,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            before: None,
            after: None,
            page_size: MESSAGES_PAGE_SIZE,
        }
    }
}

/// One page of history, newest message first.
#[derive(Debug, Clone)]
pub struct Page {
    pub messages: Vec<Message>,
    /// False on the last page of the walk.
    pub has_more: bool,
}

/// Cursor over a channel's history.
///
/// Each call to [`next_page`](Self::next_page) requests the messages older than
/// the oldest one seen so far. A short or empty page ends the walk. The
/// paginator cannot be rewound; build a new one to start again.
pub struct HistoryPaginator<'a, S: MessageSource + ?Sized> {
    source: &'a S,
    channel_id: String,
    cursor: Option<String>,
    after: Option<String>,
    page_size: u32,
    exhausted: bool,
    cancel: CancellationToken,
}

impl<'a, S: MessageSource + ?Sized> HistoryPaginator<'a, S> {
    pub fn new(source: &'a S, channel_id: impl Into<String>, options: HistoryOptions) -> Self {
        Self {
            source,
            channel_id: channel_id.into(),
            cursor: options.before,
            after: options.after,
            page_size: options.page_size.clamp(1, MESSAGES_PAGE_SIZE),
            exhausted: false,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop fetching once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Id of the oldest message returned so far.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Fetch the next page, or `None` once the history is exhausted or the
    /// walk was cancelled.
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        if self.exhausted || self.cancel.is_cancelled() {
            return Ok(None);
        }

        let query = MessagesQuery {
            limit: Some(self.page_size),
            before: self.cursor.clone(),
            after: None,
        };

        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = self.source.fetch_messages(&self.channel_id, &query) => Some(result?),
        };

        let Some(fetched) = fetched else {
            tracing::debug!("History walk for {} cancelled", self.channel_id);
            self.exhausted = true;
            return Ok(None);
        };

        let full_page = fetched.len() >= self.page_size as usize;
        if let Some(oldest) = fetched.last() {
            self.cursor = Some(oldest.id.clone());
        }

        let mut messages = fetched;
        let mut reached_lower_bound = false;
        if let Some(after) = &self.after {
            let before_len = messages.len();
            messages.retain(|m| compare_snowflakes(&m.id, after) == Ordering::Greater);
            reached_lower_bound = messages.len() < before_len;
        }

        let has_more = full_page && !reached_lower_bound;
        self.exhausted = !has_more;

        tracing::debug!(
            "Fetched {} messages from {} (cursor {:?}, more: {})",
            messages.len(),
            self.channel_id,
            self.cursor,
            has_more
        );

        if messages.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        Ok(Some(Page { messages, has_more }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::api::types::test_message;
    use crate::error::Error;

    /// In-memory channel holding ids `n..=1`, newest first.
    struct FakeChannel {
        messages: Vec<Message>,
        requests: Mutex<Vec<MessagesQuery>>,
        fail_on_request: Option<usize>,
    }

    impl FakeChannel {
        fn with_messages(n: u64) -> Self {
            Self {
                messages: (1..=n)
                    .rev()
                    .map(|id| test_message(&id.to_string(), "text", Vec::new()))
                    .collect(),
                requests: Mutex::new(Vec::new()),
                fail_on_request: None,
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MessageSource for FakeChannel {
        async fn fetch_messages(&self, _channel_id: &str, query: &MessagesQuery) -> Result<Vec<Message>> {
            let index = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(query.clone());
                requests.len()
            };
            if self.fail_on_request == Some(index) {
                return Err(Error::Api("boom".into()));
            }

            let limit = query.limit.unwrap_or(50) as usize;
            Ok(self
                .messages
                .iter()
                .filter(|m| match &query.before {
                    Some(before) => compare_snowflakes(&m.id, before) == Ordering::Less,
                    None => true,
                })
                .take(limit)
                .cloned()
                .collect())
        }
    }

    async fn collect(source: &FakeChannel, options: HistoryOptions) -> Vec<Page> {
        let mut paginator = HistoryPaginator::new(source, "42", options);
        let mut pages = Vec::new();
        while let Some(page) = paginator.next_page().await.unwrap() {
            pages.push(page);
        }
        pages
    }

    #[test]
    fn test_compare_snowflakes() {
        assert_eq!(compare_snowflakes("100", "90"), Ordering::Greater);
        assert_eq!(compare_snowflakes("90", "100"), Ordering::Less);
        assert_eq!(compare_snowflakes("123", "123"), Ordering::Equal);
        assert_eq!(compare_snowflakes("0090", "90"), Ordering::Equal);
    }

    #[tokio::test]
    async fn test_page_counts_cover_history() {
        for (n, limit) in [(0u64, 100u32), (1, 100), (99, 100), (100, 100), (101, 100), (250, 100), (20, 7), (21, 7)] {
            let source = FakeChannel::with_messages(n);
            let options = HistoryOptions {
                page_size: limit,
                ..Default::default()
            };
            let pages = collect(&source, options).await;

            let expected_pages = (n as usize).div_ceil(limit as usize);
            assert_eq!(pages.len(), expected_pages, "n={} limit={}", n, limit);

            if let Some(last) = pages.last() {
                let remainder = n as usize % limit as usize;
                let expected_last = if remainder == 0 { limit as usize } else { remainder };
                assert_eq!(last.messages.len(), expected_last);
            }

            let ids: Vec<String> = pages
                .iter()
                .flat_map(|p| p.messages.iter().map(|m| m.id.clone()))
                .collect();
            let expected: Vec<String> = (1..=n).rev().map(|id| id.to_string()).collect();
            assert_eq!(ids, expected);
        }
    }

    #[tokio::test]
    async fn test_short_page_ends_walk() {
        let source = FakeChannel::with_messages(150);
        let pages = collect(&source, HistoryOptions::default()).await;
        assert_eq!(pages.len(), 2);
        assert!(pages[0].has_more);
        assert!(!pages[1].has_more);
        // No request is made after the short page.
        assert_eq!(source.request_count(), 2);
        let requests = source.requests.lock().unwrap();
        assert_eq!(requests[0].before, None);
        assert_eq!(requests[1].before.as_deref(), Some("51"));
    }

    #[tokio::test]
    async fn test_before_and_after_bounds() {
        let source = FakeChannel::with_messages(30);
        let options = HistoryOptions {
            before: Some("25".into()),
            after: Some("10".into()),
            page_size: 5,
        };
        let pages = collect(&source, options).await;
        let ids: Vec<u64> = pages
            .iter()
            .flat_map(|p| p.messages.iter().map(|m| m.id.parse::<u64>().unwrap()))
            .collect();
        assert_eq!(ids, (11..=24).rev().collect::<Vec<_>>());
        assert!(!pages.last().unwrap().has_more);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let mut source = FakeChannel::with_messages(300);
        source.fail_on_request = Some(2);
        let mut paginator = HistoryPaginator::new(&source, "42", HistoryOptions::default());
        assert!(paginator.next_page().await.unwrap().is_some());
        assert!(paginator.next_page().await.is_err());
    }

    #[tokio::test]
    async fn test_cancelled_walk_stops() {
        let source = FakeChannel::with_messages(300);
        let cancel = CancellationToken::new();
        let mut paginator =
            HistoryPaginator::new(&source, "42", HistoryOptions::default()).with_cancellation(cancel.clone());

        assert!(paginator.next_page().await.unwrap().is_some());
        cancel.cancel();
        assert!(paginator.next_page().await.unwrap().is_none());
        assert_eq!(source.request_count(), 1);
    }
}
