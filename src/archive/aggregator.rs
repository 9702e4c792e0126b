//! Fixed-size batching of archive items.

use crate::media::ArchiveItem;

/// An ordered, non-empty batch of items written together.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk<T> {
    items: Vec<T>,
}

impl<T> Chunk<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T: ArchiveItem> Chunk<T> {
    /// Message ids of the first and last item, in push order.
    pub fn span(&self) -> Option<(&str, &str)> {
        let first = self.items.first()?;
        let last = self.items.last()?;
        Some((first.message_id(), last.message_id()))
    }
}

/// Collects items and hands them back in groups of `chunk_length`.
///
/// Emission is synchronous: the call that completes a chunk returns it, so
/// the caller handles chunks strictly in push order. Items that do not fill
/// a chunk stay pooled until [`close`](Self::close).
#[derive(Debug)]
pub struct ChunkAggregator<T> {
    pool: Vec<T>,
    chunk_length: usize,
}

impl<T> ChunkAggregator<T> {
    /// A chunk length of zero is treated as one.
    pub fn new(chunk_length: usize) -> Self {
        Self {
            pool: Vec::new(),
            chunk_length: chunk_length.max(1),
        }
    }

    pub fn chunk_length(&self) -> usize {
        self.chunk_length
    }

    /// Items waiting for their chunk to fill up.
    pub fn pending(&self) -> usize {
        self.pool.len()
    }

    /// Add one item; returns every chunk this completes.
    pub fn push(&mut self, item: T) -> Vec<Chunk<T>> {
        self.pool.push(item);
        self.drain_full()
    }

    /// Add a burst of items; returns every chunk they complete, in order.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) -> Vec<Chunk<T>> {
        self.pool.extend(items);
        self.drain_full()
    }

    /// Change the threshold and emit whatever the pool now fills.
    pub fn set_chunk_length(&mut self, chunk_length: usize) -> Vec<Chunk<T>> {
        self.chunk_length = chunk_length.max(1);
        self.drain_full()
    }

    /// Emit the remainder as a final chunk, if there is any.
    ///
    /// Closing again with nothing pooled returns `None`. The aggregator stays
    /// usable afterwards.
    pub fn close(&mut self) -> Option<Chunk<T>> {
        if self.pool.is_empty() {
            return None;
        }
        Some(Chunk {
            items: std::mem::take(&mut self.pool),
        })
    }

    fn drain_full(&mut self) -> Vec<Chunk<T>> {
        let mut chunks = Vec::with_capacity(self.pool.len() / self.chunk_length);
        while self.pool.len() >= self.chunk_length {
            let rest = self.pool.split_off(self.chunk_length);
            let items = std::mem::replace(&mut self.pool, rest);
            chunks.push(Chunk { items });
        }
        chunks
    }
}
