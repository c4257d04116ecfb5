//! Outcome counting for writers that run behind a background worker.
//!
//! The non-blocking file writer accepts every line into its queue, so the sink in front
//! of it cannot see disk failures. [`CountingWriter`] sits between the worker and the
//! real file and records what actually reached it.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lines delivered to, or rejected by, the underlying writer.
#[derive(Debug, Default)]
pub struct DeliveryCounters {
    written: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryCounters {
    /// Lines the underlying writer accepted.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Lines the underlying writer rejected.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Writer that counts the outcome of every `write` call.
///
/// The background worker hands over one line per call, so the counters are per line.
/// A failed line is retried once: rotation can fail after the fresh file is already
/// open, and the retry lands the line there.
pub struct CountingWriter<W> {
    inner: W,
    counters: Arc<DeliveryCounters>,
}

impl<W: Write> CountingWriter<W> {
    /// Wrap `inner`, recording outcomes into `counters`.
    pub const fn new(inner: W, counters: Arc<DeliveryCounters>) -> Self {
        Self { inner, counters }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let outcome = self
            .inner
            .write_all(buf)
            .or_else(|_| self.inner.write_all(buf));
        match outcome {
            Ok(()) => {
                self.counters.written.fetch_add(1, Ordering::Relaxed);
                Ok(buf.len())
            }
            Err(err) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalpel_test_support::capture::{FailingWriter, SharedBuffer};

    struct FailsOnce {
        failed: bool,
        out: SharedBuffer,
    }

    impl Write for FailsOnce {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.failed {
                self.out.write(buf)
            } else {
                self.failed = true;
                Err(io::Error::other("rotation failed"))
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn accepted_lines_are_counted() -> io::Result<()> {
        let counters = Arc::new(DeliveryCounters::default());
        let out = SharedBuffer::new();
        let mut writer = CountingWriter::new(out.clone(), Arc::clone(&counters));
        writer.write_all(b"one\n")?;
        writer.write_all(b"two\n")?;
        assert_eq!(out.lines(), vec!["one", "two"]);
        assert_eq!((counters.written(), counters.failed()), (2, 0));
        Ok(())
    }

    #[test]
    fn rejected_lines_are_counted_and_returned() {
        let counters = Arc::new(DeliveryCounters::default());
        let mut writer = CountingWriter::new(FailingWriter, Arc::clone(&counters));
        assert!(writer.write_all(b"lost\n").is_err());
        assert!(writer.write_all(b"lost\n").is_err());
        assert_eq!((counters.written(), counters.failed()), (0, 2));
    }

    #[test]
    fn line_survives_a_single_failure() -> io::Result<()> {
        let counters = Arc::new(DeliveryCounters::default());
        let out = SharedBuffer::new();
        let inner = FailsOnce {
            failed: false,
            out: out.clone(),
        };
        let mut writer = CountingWriter::new(inner, Arc::clone(&counters));
        writer.write_all(b"kept\n")?;
        assert_eq!(out.lines(), vec!["kept"]);
        assert_eq!((counters.written(), counters.failed()), (1, 0));
        Ok(())
    }
}
