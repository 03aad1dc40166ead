//! Bounded single-producer/single-consumer byte pipe (§4.13).
//!
//! A growable ring-ish buffer shared between exactly one producer and one
//! consumer thread, synchronized with a pair of `Mutex`-guarded offsets
//! and a pair of `Condvar`s: `just_pushed` wakes a blocked consumer after
//! a push, `just_pulled` wakes a blocked producer after a pull frees
//! space. Unlike a classic ring buffer the backing `Vec<u8>` is not
//! wrapped — `begin` and `end` only ever grow, and the buffer doubles in
//! capacity instead of blocking when it is full but under its
//! configured ceiling. This matches the always-forward-progress buffer
//! in `original_source/src/utils/pipe.c`, where producer/consumer
//! lifetimes are tracked with reference counts so a pipe can be torn
//! down once both ends have called their `*_destroy`.
//!
//! Locking order is always `end_lock` before `begin_lock` (matching the
//! original's lock nesting) to avoid a deadlock between a producer
//! growing the buffer and a consumer advancing `begin`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum PipeError {
    #[error("pipe has no registered producer")]
    NoProducer,
    #[error("pipe has no registered consumer")]
    NoConsumer,
    #[error("requested capacity exceeds the pipe's configured maximum")]
    CapacityExceeded,
    #[error("no data available and the pipe is not set to block")]
    WouldBlock,
}

struct Shared {
    buffer: Mutex<Vec<u8>>,
    begin: Mutex<usize>,
    end: Mutex<usize>,
    just_pushed: Condvar,
    just_pulled: Condvar,
    max_bytes: usize,
    producers: AtomicUsize,
    consumers: AtomicUsize,
}

/// A bounded byte pipe. Clone freely — every handle shares the same
/// underlying buffer; [`Pipe::producer_create`] / [`Pipe::consumer_create`]
/// track how many producer/consumer handles exist so the pipe knows when
/// both ends are gone.
#[derive(Clone)]
pub struct Pipe {
    shared: Arc<Shared>,
}

impl Pipe {
    /// `initial_capacity` seeds the backing buffer; it doubles on demand
    /// up to `max_bytes` (`usize::MAX` for "unbounded" other than memory).
    pub fn new(initial_capacity: usize, max_bytes: usize) -> Pipe {
        Pipe {
            shared: Arc::new(Shared {
                buffer: Mutex::new(vec![0u8; initial_capacity.max(1)]),
                begin: Mutex::new(0),
                end: Mutex::new(0),
                just_pushed: Condvar::new(),
                just_pulled: Condvar::new(),
                max_bytes,
                producers: AtomicUsize::new(0),
                consumers: AtomicUsize::new(0),
            }),
        }
    }

    pub fn producer_create(&self) -> PipeProducer {
        self.shared.producers.fetch_add(1, Ordering::SeqCst);
        PipeProducer { shared: Arc::clone(&self.shared) }
    }

    pub fn consumer_create(&self) -> PipeConsumer {
        self.shared.consumers.fetch_add(1, Ordering::SeqCst);
        PipeConsumer { shared: Arc::clone(&self.shared) }
    }

    /// Drop every byte currently buffered, resetting both offsets to
    /// zero. Callers must ensure no concurrent push/pull is racing this.
    pub fn clear(&self) {
        let mut end = self.shared.end.lock().expect("pipe end lock poisoned");
        let mut begin = self.shared.begin.lock().expect("pipe begin lock poisoned");
        *end = 0;
        *begin = 0;
    }

    pub fn reserve(&self, additional: usize) -> Result<(), PipeError> {
        let end = *self.shared.end.lock().expect("pipe end lock poisoned");
        grow_to_fit(&self.shared, end, additional)
    }
}

/// The producer-side handle: only [`PipeProducer::push`] is exposed.
pub struct PipeProducer {
    shared: Arc<Shared>,
}

/// The consumer-side handle: only [`PipeConsumer::pull`] /
/// [`PipeConsumer::pull_nonblocking`] are exposed.
pub struct PipeConsumer {
    shared: Arc<Shared>,
}

fn grow_to_fit(shared: &Shared, current_end: usize, needed_additional: usize) -> Result<(), PipeError> {
    let mut buffer = shared.buffer.lock().expect("pipe buffer lock poisoned");
    let required = current_end + needed_additional;
    if required <= buffer.len() {
        return Ok(());
    }
    if required > shared.max_bytes {
        return Err(PipeError::CapacityExceeded);
    }
    let mut new_len = buffer.len().max(1);
    while new_len < required {
        new_len = (new_len * 2).min(shared.max_bytes).max(new_len + 1);
    }
    tracing::debug!(from = buffer.len(), to = new_len, "pipe buffer resized");
    buffer.resize(new_len, 0);
    Ok(())
}

impl PipeProducer {
    /// Append `data`, blocking on `just_pulled` if the pipe is already at
    /// its configured ceiling and the consumer hasn't freed room.
    pub fn push(&self, data: &[u8]) -> Result<(), PipeError> {
        if self.shared.consumers.load(Ordering::SeqCst) == 0 {
            return Err(PipeError::NoConsumer);
        }
        if data.len() > self.shared.max_bytes {
            return Err(PipeError::CapacityExceeded);
        }
        // Locking order: end before begin, matching the original.
        let mut end = self.shared.end.lock().expect("pipe end lock poisoned");
        loop {
            let used = {
                let begin = self.shared.begin.lock().expect("pipe begin lock poisoned");
                *end - *begin
            };
            if used + data.len() <= self.shared.max_bytes {
                break;
            }
            end = self.shared.just_pulled.wait(end).expect("pipe end lock poisoned during wait");
        }
        grow_to_fit(&self.shared, *end, data.len())?;
        {
            let mut buffer = self.shared.buffer.lock().expect("pipe buffer lock poisoned");
            buffer[*end..*end + data.len()].copy_from_slice(data);
        }
        *end += data.len();
        self.shared.just_pushed.notify_all();
        Ok(())
    }
}

impl PipeConsumer {
    /// Read up to `max_len` bytes, blocking on `just_pushed` until at
    /// least one byte is available.
    pub fn pull(&self, max_len: usize) -> Result<Vec<u8>, PipeError> {
        if self.shared.producers.load(Ordering::SeqCst) == 0 {
            let available = self.available();
            if available == 0 {
                return Err(PipeError::NoProducer);
            }
        }
        let mut end = self.shared.end.lock().expect("pipe end lock poisoned");
        loop {
            let begin = *self.shared.begin.lock().expect("pipe begin lock poisoned");
            if *end > begin {
                break;
            }
            if self.shared.producers.load(Ordering::SeqCst) == 0 {
                return Ok(Vec::new());
            }
            end = self.shared.just_pushed.wait(end).expect("pipe end lock poisoned during wait");
        }
        drop(end);
        Ok(self.drain(max_len))
    }

    /// Read up to `max_len` bytes without blocking; an empty result
    /// means "nothing available right now", not end-of-stream.
    pub fn pull_nonblocking(&self, max_len: usize) -> Result<Vec<u8>, PipeError> {
        let available = self.available();
        if available == 0 {
            return Ok(Vec::new());
        }
        Ok(self.drain(max_len))
    }

    fn available(&self) -> usize {
        // Lock order matches push/drain: end before begin.
        let end = *self.shared.end.lock().expect("pipe end lock poisoned");
        let begin = *self.shared.begin.lock().expect("pipe begin lock poisoned");
        end - begin
    }

    fn drain(&self, max_len: usize) -> Vec<u8> {
        let end = *self.shared.end.lock().expect("pipe end lock poisoned");
        let mut begin = self.shared.begin.lock().expect("pipe begin lock poisoned");
        let buffer = self.shared.buffer.lock().expect("pipe buffer lock poisoned");
        let take = max_len.min(end - *begin);
        let out = buffer[*begin..*begin + take].to_vec();
        *begin += take;
        drop(buffer);
        self.shared.just_pulled.notify_all();
        out
    }
}

impl Drop for PipeProducer {
    fn drop(&mut self) {
        if self.shared.producers.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.shared.just_pushed.notify_all();
        }
    }
}

impl Drop for PipeConsumer {
    fn drop(&mut self) {
        if self.shared.consumers.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.shared.just_pulled.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn push_then_pull_roundtrips_bytes() {
        let pipe = Pipe::new(16, 1024);
        let producer = pipe.producer_create();
        let consumer = pipe.consumer_create();
        producer.push(b"hello").unwrap();
        let out = consumer.pull(5).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn auto_resizes_past_initial_capacity() {
        let pipe = Pipe::new(4, 1 << 20);
        let producer = pipe.producer_create();
        let consumer = pipe.consumer_create();
        let payload = vec![7u8; 256];
        producer.push(&payload).unwrap();
        let out = consumer.pull(256).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn pull_nonblocking_returns_empty_when_idle() {
        let pipe = Pipe::new(16, 1024);
        let _producer = pipe.producer_create();
        let consumer = pipe.consumer_create();
        assert_eq!(consumer.pull_nonblocking(16).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn clear_resets_offsets() {
        let pipe = Pipe::new(16, 1024);
        let producer = pipe.producer_create();
        let consumer = pipe.consumer_create();
        producer.push(b"abc").unwrap();
        pipe.clear();
        assert_eq!(consumer.pull_nonblocking(16).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn producer_drop_unblocks_waiting_consumer() {
        let pipe = Pipe::new(16, 1024);
        let producer = pipe.producer_create();
        let consumer = pipe.consumer_create();
        let handle = thread::spawn(move || consumer.pull(16));
        thread::sleep(Duration::from_millis(20));
        drop(producer);
        let result = handle.join().unwrap().unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn cross_thread_push_wakes_blocked_pull() {
        let pipe = Pipe::new(16, 1024);
        let producer = pipe.producer_create();
        let consumer = pipe.consumer_create();
        let handle = thread::spawn(move || consumer.pull(16));
        thread::sleep(Duration::from_millis(20));
        producer.push(b"ping").unwrap();
        let result = handle.join().unwrap().unwrap();
        assert_eq!(result, b"ping");
    }
}
