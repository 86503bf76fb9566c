/*!
The `ring` module is the boundary between the realtime thread and the printing thread. Data moves
through single-producer/single-consumer lock-free rings; a mutex/condvar pair exists only so the
consumer has something to sleep on. The realtime side never blocks: full rings drop, and the
wakeup uses a try-lock.
!*/

use crate::constants::{LOG_LINE_MAX, LOG_RING_LEN};
use parking_lot::{Condvar, Mutex, MutexGuard};
use rtrb::{Consumer, Producer, RingBuffer};
use std::fmt;
use std::io;
use std::sync::Arc;

/// Logs a line from the realtime thread through an [`RtLog`](crate::ring::RtLog).
macro_rules! rt_log {
    ($log:expr, $($arg:tt)*) => {
        $log.line(format_args!($($arg)*))
    };
}

/// Like `rt_log!` but only when debug logging was requested on the command line.
macro_rules! rt_debug {
    ($log:expr, $($arg:tt)*) => {
        $log.debug(format_args!($($arg)*))
    };
}

/// The wakeup half of the RT/consumer handoff.
///
/// The mutex protects no data; it exists because a condition variable needs a lock to be
/// associated with. The realtime thread only ever *try*-locks it; the consumer holds it for the
/// lifetime of its loop and releases it inside `wait`.
#[derive(Clone, Default)]
pub struct Waker {
    inner: Arc<WakerInner>,
}

#[derive(Default)]
struct WakerInner {
    lock: Mutex<()>,
    ready: Condvar,
}

impl Waker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals the consumer without ever blocking. If the consumer currently holds the mutex
    /// (i.e. it is awake and draining) the signal is skipped; the consumer will drain whatever we
    /// produced before it sleeps again.
    pub fn signal_rt(&self) {
        if let Some(_guard) = self.inner.lock.try_lock() {
            self.inner.ready.notify_one();
        }
    }

    /// Signals the consumer from a non-realtime context (shutdown, SIGINT). Takes the mutex so
    /// the signal cannot fall between the consumer's last ring check and its wait.
    pub fn signal(&self) {
        let _guard = self.inner.lock.lock();
        self.inner.ready.notify_one();
    }

    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.inner.lock.lock()
    }

    pub fn wait(&self, guard: &mut MutexGuard<'_, ()>) {
        self.inner.ready.wait(guard);
    }
}

/// Creates a bounded SPSC queue whose sender wakes the given [`Waker`] after each stored value.
pub fn channel<T>(capacity: usize, waker: &Waker) -> (Sender<T>, Receiver<T>) {
    let (producer, consumer) = RingBuffer::new(capacity);
    (
        Sender {
            producer,
            waker: waker.clone(),
        },
        Receiver { consumer },
    )
}

/// The realtime half of a record queue.
pub struct Sender<T> {
    producer: Producer<T>,
    waker: Waker,
}

impl<T> Sender<T> {
    /// Stores a value and signals the consumer. When the ring is full the value is dropped
    /// silently and `false` is returned; the realtime thread never waits for space.
    pub fn send(&mut self, value: T) -> bool {
        if self.producer.push(value).is_err() {
            return false;
        }
        self.waker.signal_rt();
        true
    }
}

/// The consumer half of a record queue.
pub struct Receiver<T> {
    consumer: Consumer<T>,
}

impl<T> Receiver<T> {
    pub fn try_recv(&mut self) -> Option<T> {
        self.consumer.pop().ok()
    }
}

/// Creates the byte ring that carries formatted log lines out of the realtime thread.
pub fn log_ring(waker: &Waker, debug: bool) -> (RtLog, LogDrain) {
    let (producer, consumer) = RingBuffer::new(LOG_RING_LEN);
    (
        RtLog {
            producer,
            waker: waker.clone(),
            debug,
        },
        LogDrain { consumer },
    )
}

/// Text logging usable from the realtime thread: lines are formatted into a stack buffer and
/// pushed through the byte ring, so nothing allocates and nothing blocks. Lines that do not fit
/// the ring are dropped whole.
pub struct RtLog {
    producer: Producer<u8>,
    waker: Waker,
    debug: bool,
}

impl RtLog {
    pub fn line(&mut self, args: fmt::Arguments<'_>) {
        self.push_line(args);
    }

    pub fn debug(&mut self, args: fmt::Arguments<'_>) {
        if self.debug {
            self.push_line(args);
        }
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    fn push_line(&mut self, args: fmt::Arguments<'_>) {
        let mut buf = [0u8; LOG_LINE_MAX];
        let mut writer = FixedWriter {
            buf: &mut buf,
            len: 0,
        };
        let _ = fmt::Write::write_fmt(&mut writer, args);
        let _ = fmt::Write::write_str(&mut writer, "\n");
        let len = writer.len;
        if self.producer.slots() >= len {
            for &byte in &buf[..len] {
                let _ = self.producer.push(byte);
            }
        }
        self.waker.signal_rt();
    }
}

/// The consumer half of the log ring.
pub struct LogDrain {
    consumer: Consumer<u8>,
}

impl LogDrain {
    /// Writes every pending log byte to `out`.
    pub fn drain_to<W: io::Write>(&mut self, out: &mut W) -> io::Result<()> {
        while let Ok(byte) = self.consumer.pop() {
            out.write_all(&[byte])?;
        }
        Ok(())
    }

    /// Collects pending bytes into a string; for tests.
    pub fn take_string(&mut self) -> String {
        let mut bytes = Vec::new();
        while let Ok(byte) = self.consumer.pop() {
            bytes.push(byte);
        }
        String::from_utf8_lossy(&bytes).to_string()
    }
}

/// A `fmt::Write` over a fixed byte buffer. Output past the end is truncated.
struct FixedWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl fmt::Write for FixedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let available = self.buf.len() - self.len;
        let n = s.len().min(available);
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_then_recv() {
        let waker = Waker::new();
        let (mut tx, mut rx) = channel(4, &waker);
        assert!(tx.send(7u64));
        assert!(tx.send(8u64));
        assert_eq!(rx.try_recv(), Some(7));
        assert_eq!(rx.try_recv(), Some(8));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn full_ring_drops() {
        let waker = Waker::new();
        let (mut tx, mut rx) = channel(2, &waker);
        assert!(tx.send(1u64));
        assert!(tx.send(2u64));
        assert!(!tx.send(3u64));
        assert_eq!(rx.try_recv(), Some(1));
        assert_eq!(rx.try_recv(), Some(2));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn log_line_appends_newline() {
        let waker = Waker::new();
        let (mut log, mut drain) = log_ring(&waker, false);
        rt_log!(log, "new APV: {:.2}", 1920.0);
        assert_eq!(drain.take_string(), "new APV: 1920.00\n");
    }

    #[test]
    fn debug_lines_respect_flag() {
        let waker = Waker::new();
        let (mut log, mut drain) = log_ring(&waker, false);
        rt_debug!(log, "hidden");
        assert_eq!(drain.take_string(), "");

        let (mut log, mut drain) = log_ring(&waker, true);
        rt_debug!(log, "visible");
        assert_eq!(drain.take_string(), "visible\n");
    }

    #[test]
    fn fixed_writer_truncates() {
        let mut buf = [0u8; 8];
        let mut writer = FixedWriter {
            buf: &mut buf,
            len: 0,
        };
        let _ = fmt::Write::write_str(&mut writer, "0123456789");
        assert_eq!(writer.len, 8);
        assert_eq!(&buf, b"01234567");
    }

    #[test]
    fn waker_signal_rt_never_blocks_while_held() {
        let waker = Waker::new();
        let _guard = waker.lock();
        // consumer holds the lock; the RT signal must return immediately
        waker.signal_rt();
    }
}
