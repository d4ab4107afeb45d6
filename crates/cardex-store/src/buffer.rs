//! Batching in front of a [`Writer`]

use crate::document::Document;
use crate::writer::{WriteReport, Writer};

/// Documents per flush
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Collects documents and hands them to the writer in batches.
///
/// Reports of every flush are merged; call [`DocumentBuffer::finish`] to
/// flush the remainder and get the total.
pub struct DocumentBuffer<'w> {
    writer: &'w Writer,
    batch_size: usize,
    pending: Vec<Document>,
    report: WriteReport,
}

impl<'w> DocumentBuffer<'w> {
    pub fn new(writer: &'w Writer, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            writer,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            report: WriteReport::default(),
        }
    }

    pub fn push(&mut self, doc: Document) {
        self.pending.push(doc);
        if self.is_full() {
            self.flush();
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.pending.len() >= self.batch_size
    }

    /// Write whatever is pending.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let batch = std::mem::replace(&mut self.pending, Vec::with_capacity(self.batch_size));
        self.report.merge(self.writer.write_all(batch));
    }

    /// Report so far, not counting pending documents
    pub fn report(&self) -> &WriteReport {
        &self.report
    }

    pub fn finish(mut self) -> WriteReport {
        self.flush();
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::writer::tests::{FlakyStore, doc};
    use std::sync::Arc;

    #[test]
    fn flushes_when_full() {
        let store = Arc::new(MemoryStore::new());
        let writer = Writer::new(store.clone(), 1).unwrap();
        let mut buf = DocumentBuffer::new(&writer, 3);
        for i in 0..7 {
            buf.push(doc(&format!("a{i}")));
        }
        assert_eq!(store.len(), 6);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.report().written, 6);

        let report = buf.finish();
        assert_eq!(report.written, 7);
        assert_eq!(store.len(), 7);
    }

    #[test]
    fn finish_merges_failures() {
        let store = Arc::new(FlakyStore::default());
        let writer = Writer::new(store, 2).unwrap();
        let mut buf = DocumentBuffer::new(&writer, 2);
        buf.push(doc("bad1"));
        buf.push(doc("a1"));
        buf.push(doc("bad2"));
        let report = buf.finish();
        assert_eq!(report.attempted, 3);
        assert_eq!(report.failures.len(), 2);
    }

    #[test]
    fn zero_batch_size_clamped() {
        let store = Arc::new(MemoryStore::new());
        let writer = Writer::new(store.clone(), 1).unwrap();
        let mut buf = DocumentBuffer::new(&writer, 0);
        buf.push(doc("a1"));
        assert_eq!(store.len(), 1);
    }
}
