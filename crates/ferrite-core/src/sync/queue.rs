//! Bounded message queue.
//!
//! Backed by a fixed-depth ring of fixed-size message slots, using the same
//! `% capacity` indexing discipline a byte ring buffer would, generalized
//! from bytes to whole messages so a reader gets one message per `receive`
//! rather than a byte stream.
//!
//! `create(item_size, item_count)` is expressed as the const generics
//! `ITEM_SIZE`/`ITEM_COUNT` rather than runtime fields: every other
//! primitive pool in this crate (`Pool<T, const N: usize>`, `DmaManager<const
//! N: usize>`) is sized at compile time, and a queue's backing storage is no
//! different — it just has two dimensions instead of one. A driver that
//! wants 4-byte, 2-deep queues declares `Queue<4, 2>`; [`DefaultQueue`]
//! covers the common case.
//!
//! [`Queue::close`] wakes any sender or receiver parked with `WAIT_FOREVER`
//! with [`Status::InvalidState`] rather than leaving it blocked on a queue
//! that the caller is about to tear down.

use ferrite_status::Status;

use crate::backend;
use crate::timeout::Timeout;

#[cfg(feature = "std")]
use std::sync::{Condvar, Mutex as StdMutex};

#[cfg(not(feature = "std"))]
use crate::spinlock::SpinLock;

/// Default payload size, in bytes, for [`DefaultQueue`].
pub const DEFAULT_ITEM_SIZE: usize = 64;

/// Default slot count for [`DefaultQueue`].
pub const DEFAULT_ITEM_COUNT: usize = 8;

/// A queue sized for the common case: 64-byte messages, 8 slots deep.
pub type DefaultQueue = Queue<DEFAULT_ITEM_SIZE, DEFAULT_ITEM_COUNT>;

#[derive(Clone, Copy)]
struct Message<const ITEM_SIZE: usize> {
    len: u16,
    bytes: [u8; ITEM_SIZE],
}

impl<const ITEM_SIZE: usize> Message<ITEM_SIZE> {
    const EMPTY: Self = Self {
        len: 0,
        bytes: [0; ITEM_SIZE],
    };
}

struct Ring<const ITEM_SIZE: usize, const ITEM_COUNT: usize> {
    slots: [Message<ITEM_SIZE>; ITEM_COUNT],
    head: usize,
    len: usize,
    closed: bool,
}

impl<const ITEM_SIZE: usize, const ITEM_COUNT: usize> Ring<ITEM_SIZE, ITEM_COUNT> {
    fn new() -> Self {
        Self {
            slots: [Message::EMPTY; ITEM_COUNT],
            head: 0,
            len: 0,
            closed: false,
        }
    }

    fn is_full(&self) -> bool {
        self.len == ITEM_COUNT
    }

    fn push_back(&mut self, msg: Message<ITEM_SIZE>) {
        let tail = (self.head + self.len) % ITEM_COUNT;
        self.slots[tail] = msg;
        self.len += 1;
    }

    fn push_front(&mut self, msg: Message<ITEM_SIZE>) {
        self.head = (self.head + ITEM_COUNT - 1) % ITEM_COUNT;
        self.slots[self.head] = msg;
        self.len += 1;
    }

    fn pop_front(&mut self) -> Message<ITEM_SIZE> {
        let msg = self.slots[self.head];
        self.head = (self.head + 1) % ITEM_COUNT;
        self.len -= 1;
        msg
    }

    fn front(&self) -> Message<ITEM_SIZE> {
        self.slots[self.head]
    }
}

#[cfg(feature = "std")]
struct Inner<const ITEM_SIZE: usize, const ITEM_COUNT: usize> {
    ring: StdMutex<Ring<ITEM_SIZE, ITEM_COUNT>>,
    not_empty: Condvar,
    not_full: Condvar,
}

#[cfg(not(feature = "std"))]
struct Inner<const ITEM_SIZE: usize, const ITEM_COUNT: usize> {
    ring: SpinLock<Ring<ITEM_SIZE, ITEM_COUNT>>,
}

/// A bounded queue of `ITEM_COUNT` messages, each up to `ITEM_SIZE` bytes.
pub struct Queue<const ITEM_SIZE: usize = DEFAULT_ITEM_SIZE, const ITEM_COUNT: usize = DEFAULT_ITEM_COUNT> {
    inner: Inner<ITEM_SIZE, ITEM_COUNT>,
}

fn to_message<const ITEM_SIZE: usize>(data: &[u8]) -> Result<Message<ITEM_SIZE>, Status> {
    if data.len() > ITEM_SIZE {
        return Err(Status::InvalidParam);
    }
    let mut msg = Message::<ITEM_SIZE>::EMPTY;
    msg.len = data.len() as u16;
    msg.bytes[..data.len()].copy_from_slice(data);
    Ok(msg)
}

fn from_message<const ITEM_SIZE: usize>(
    msg: &Message<ITEM_SIZE>,
    out: &mut [u8],
    out_len: &mut usize,
) {
    let n = (msg.len as usize).min(out.len());
    out[..n].copy_from_slice(&msg.bytes[..n]);
    *out_len = n;
}

impl<const ITEM_SIZE: usize, const ITEM_COUNT: usize> Queue<ITEM_SIZE, ITEM_COUNT> {
    /// Creates an empty queue with `ITEM_COUNT` slots of `ITEM_SIZE` bytes
    /// each.
    #[must_use]
    pub fn new() -> Self {
        #[cfg(feature = "std")]
        {
            Self {
                inner: Inner {
                    ring: StdMutex::new(Ring::new()),
                    not_empty: Condvar::new(),
                    not_full: Condvar::new(),
                },
            }
        }
        #[cfg(not(feature = "std"))]
        {
            Self {
                inner: Inner {
                    ring: SpinLock::new(Ring::new()),
                },
            }
        }
    }

    /// Enqueues `data` at the back, blocking per `timeout_ms` while the
    /// queue is full.
    ///
    /// `timeout_ms == 0` returns [`Status::Full`] immediately instead of
    /// [`Status::Timeout`] — a poll is not a wait. A bounded wait that
    /// expires returns [`Status::Timeout`].
    #[must_use]
    pub fn send(&self, data: &[u8]) -> Status {
        self.send_with(data, 0, false)
    }

    /// Like [`send`](Self::send) but with an explicit timeout.
    #[must_use]
    pub fn send_timeout(&self, data: &[u8], timeout_ms: u32) -> Status {
        self.send_with(data, timeout_ms, false)
    }

    /// Enqueues `data` at the front, so it is the next message received.
    #[must_use]
    pub fn send_front(&self, data: &[u8], timeout_ms: u32) -> Status {
        self.send_with(data, timeout_ms, true)
    }

    fn send_with(&self, data: &[u8], timeout_ms: u32, front: bool) -> Status {
        let msg = match to_message::<ITEM_SIZE>(data) {
            Ok(msg) => msg,
            Err(status) => return status,
        };
        let timeout = Timeout::classify(timeout_ms, backend::now_ms());

        #[cfg(feature = "std")]
        {
            let mut guard = self.inner.ring.lock().unwrap_or_else(|e| e.into_inner());
            loop {
                if guard.closed {
                    return Status::InvalidState;
                }
                if !guard.is_full() {
                    if front {
                        guard.push_front(msg);
                    } else {
                        guard.push_back(msg);
                    }
                    drop(guard);
                    self.inner.not_empty.notify_one();
                    return Status::Ok;
                }
                match timeout {
                    Timeout::Poll => return Status::Full,
                    Timeout::Forever => {
                        guard = self
                            .inner
                            .not_full
                            .wait(guard)
                            .unwrap_or_else(|e| e.into_inner());
                    }
                    Timeout::Bounded { deadline_ms } => {
                        let now = backend::now_ms();
                        if now >= deadline_ms {
                            return Status::Timeout;
                        }
                        let remaining = std::time::Duration::from_millis(deadline_ms - now);
                        let (next, _) = self
                            .inner
                            .not_full
                            .wait_timeout(guard, remaining)
                            .unwrap_or_else(|e| e.into_inner());
                        guard = next;
                    }
                }
            }
        }

        #[cfg(not(feature = "std"))]
        {
            loop {
                {
                    let mut guard = self.inner.ring.lock();
                    if guard.closed {
                        return Status::InvalidState;
                    }
                    if !guard.is_full() {
                        if front {
                            guard.push_front(msg);
                        } else {
                            guard.push_back(msg);
                        }
                        return Status::Ok;
                    }
                }
                match timeout {
                    Timeout::Poll => return Status::Full,
                    _ if timeout.is_expired(backend::now_ms()) => return Status::Timeout,
                    _ => core::hint::spin_loop(),
                }
            }
        }
    }

    /// Dequeues the front message into `out`, blocking per `timeout_ms`
    /// while the queue is empty.
    ///
    /// `timeout_ms == 0` returns [`Status::Empty`] immediately instead of
    /// [`Status::Timeout`].
    #[must_use]
    pub fn receive(&self, out: &mut [u8], out_len: &mut usize, timeout_ms: u32) -> Status {
        let timeout = Timeout::classify(timeout_ms, backend::now_ms());

        #[cfg(feature = "std")]
        {
            let mut guard = self.inner.ring.lock().unwrap_or_else(|e| e.into_inner());
            loop {
                if guard.closed {
                    return Status::InvalidState;
                }
                if guard.len > 0 {
                    let msg = guard.pop_front();
                    drop(guard);
                    from_message(&msg, out, out_len);
                    self.inner.not_full.notify_one();
                    return Status::Ok;
                }
                match timeout {
                    Timeout::Poll => return Status::Empty,
                    Timeout::Forever => {
                        guard = self
                            .inner
                            .not_empty
                            .wait(guard)
                            .unwrap_or_else(|e| e.into_inner());
                    }
                    Timeout::Bounded { deadline_ms } => {
                        let now = backend::now_ms();
                        if now >= deadline_ms {
                            return Status::Timeout;
                        }
                        let remaining = std::time::Duration::from_millis(deadline_ms - now);
                        let (next, _) = self
                            .inner
                            .not_empty
                            .wait_timeout(guard, remaining)
                            .unwrap_or_else(|e| e.into_inner());
                        guard = next;
                    }
                }
            }
        }

        #[cfg(not(feature = "std"))]
        {
            loop {
                {
                    let mut guard = self.inner.ring.lock();
                    if guard.closed {
                        return Status::InvalidState;
                    }
                    if guard.len > 0 {
                        let msg = guard.pop_front();
                        from_message(&msg, out, out_len);
                        return Status::Ok;
                    }
                }
                match timeout {
                    Timeout::Poll => return Status::Empty,
                    _ if timeout.is_expired(backend::now_ms()) => return Status::Timeout,
                    _ => core::hint::spin_loop(),
                }
            }
        }
    }

    /// Reads the front message into `out` without removing it.
    ///
    /// Never blocks past a single check regardless of `timeout_ms`'s
    /// classification: a waiting peek could return stale data once woken,
    /// so peek only ever polls.
    #[must_use]
    pub fn peek(&self, out: &mut [u8], out_len: &mut usize) -> Status {
        #[cfg(feature = "std")]
        {
            let guard = self.inner.ring.lock().unwrap_or_else(|e| e.into_inner());
            if guard.len == 0 {
                return Status::Empty;
            }
            from_message(&guard.front(), out, out_len);
            Status::Ok
        }
        #[cfg(not(feature = "std"))]
        {
            let guard = self.inner.ring.lock();
            if guard.len == 0 {
                return Status::Empty;
            }
            from_message(&guard.front(), out, out_len);
            Status::Ok
        }
    }

    /// ISR-context send: never blocks, equivalent to `send` with a poll
    /// timeout.
    #[must_use]
    pub fn send_from_isr(&self, data: &[u8]) -> Status {
        self.send_with(data, 0, false)
    }

    /// ISR-context receive: never blocks, equivalent to `receive` with a
    /// poll timeout.
    #[must_use]
    pub fn receive_from_isr(&self, out: &mut [u8], out_len: &mut usize) -> Status {
        self.receive(out, out_len, 0)
    }

    /// Returns the number of messages currently queued.
    #[must_use]
    pub fn count(&self) -> usize {
        #[cfg(feature = "std")]
        {
            self.inner.ring.lock().unwrap_or_else(|e| e.into_inner()).len
        }
        #[cfg(not(feature = "std"))]
        {
            self.inner.ring.lock().len
        }
    }

    /// Returns `true` if the queue holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns `true` if the queue is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count() == ITEM_COUNT
    }

    /// Marks the queue closed and wakes every blocked sender and receiver.
    ///
    /// A waiter parked in [`send`](Self::send)/[`send_front`](Self::send_front)
    /// or [`receive`](Self::receive) with a `WAIT_FOREVER` timeout observes
    /// the close on its next wake and returns [`Status::InvalidState`]
    /// instead of blocking forever on a queue that is about to disappear.
    /// Call this before the owning pool slot is torn down.
    pub fn close(&self) {
        #[cfg(feature = "std")]
        {
            let mut guard = self.inner.ring.lock().unwrap_or_else(|e| e.into_inner());
            guard.closed = true;
            drop(guard);
            self.inner.not_empty.notify_all();
            self.inner.not_full.notify_all();
        }
        #[cfg(not(feature = "std"))]
        {
            self.inner.ring.lock().closed = true;
        }
    }
}

impl<const ITEM_SIZE: usize, const ITEM_COUNT: usize> Default for Queue<ITEM_SIZE, ITEM_COUNT> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_receive_round_trip() {
        let q = DefaultQueue::new();
        assert_eq!(q.send(b"hi"), Status::Ok);
        let mut out = [0u8; DEFAULT_ITEM_SIZE];
        let mut len = 0;
        assert_eq!(q.receive(&mut out, &mut len, 0), Status::Ok);
        assert_eq!(&out[..len], b"hi");
        assert!(q.is_empty());
    }

    #[test]
    fn receive_on_empty_polls_empty_not_timeout() {
        let q = DefaultQueue::new();
        let mut out = [0u8; DEFAULT_ITEM_SIZE];
        let mut len = 0;
        assert_eq!(q.receive(&mut out, &mut len, 0), Status::Empty);
    }

    #[test]
    fn send_to_full_queue_polls_full_not_timeout() {
        // Matches the spec's boundary scenario directly: a 4-byte, 2-deep
        // queue rejects a third send with `FULL`, not `TIMEOUT`.
        let q: Queue<4, 2> = Queue::new();
        assert_eq!(q.send(&[0xAA]), Status::Ok);
        assert_eq!(q.send(&[0xBB]), Status::Ok);
        assert_eq!(q.send_timeout(&[0xCC], 0), Status::Full);

        let mut out = [0u8; 4];
        let mut len = 0;
        assert_eq!(q.receive(&mut out, &mut len, 0), Status::Ok);
        assert_eq!(out[0], 0xAA);
        assert_eq!(q.receive(&mut out, &mut len, 0), Status::Ok);
        assert_eq!(out[0], 0xBB);
        assert_eq!(q.receive(&mut out, &mut len, 0), Status::Empty);
    }

    #[test]
    fn send_front_is_received_before_existing_messages() {
        let q = DefaultQueue::new();
        assert_eq!(q.send(b"back"), Status::Ok);
        assert_eq!(q.send_front(b"front", 0), Status::Ok);
        let mut out = [0u8; DEFAULT_ITEM_SIZE];
        let mut len = 0;
        q.receive(&mut out, &mut len, 0);
        assert_eq!(&out[..len], b"front");
    }

    #[test]
    fn peek_does_not_remove() {
        let q = DefaultQueue::new();
        q.send(b"x");
        let mut out = [0u8; DEFAULT_ITEM_SIZE];
        let mut len = 0;
        assert_eq!(q.peek(&mut out, &mut len), Status::Ok);
        assert_eq!(q.count(), 1);
    }

    #[test]
    fn oversized_message_is_rejected() {
        let q = DefaultQueue::new();
        let big = [0u8; DEFAULT_ITEM_SIZE + 1];
        assert_eq!(q.send(&big), Status::InvalidParam);
    }

    #[test]
    fn blocked_receiver_is_woken_by_send() {
        let q = std::sync::Arc::new(DefaultQueue::new());
        let receiver = std::thread::spawn({
            let q = q.clone();
            move || {
                let mut out = [0u8; DEFAULT_ITEM_SIZE];
                let mut len = 0;
                let status = q.receive(&mut out, &mut len, 500);
                (status, out, len)
            }
        });
        std::thread::sleep(std::time::Duration::from_millis(20));
        q.send(b"woke");
        let (status, out, len) = receiver.join().unwrap();
        assert_eq!(status, Status::Ok);
        assert_eq!(&out[..len], b"woke");
    }

    #[test]
    fn close_wakes_blocked_receiver_with_invalid_state() {
        let q = std::sync::Arc::new(DefaultQueue::new());
        let receiver = std::thread::spawn({
            let q = q.clone();
            move || {
                let mut out = [0u8; DEFAULT_ITEM_SIZE];
                let mut len = 0;
                q.receive(&mut out, &mut len, crate::timeout::WAIT_FOREVER)
            }
        });
        std::thread::sleep(std::time::Duration::from_millis(20));
        q.close();
        assert_eq!(receiver.join().unwrap(), Status::InvalidState);
    }

    #[test]
    fn close_wakes_blocked_sender_with_invalid_state() {
        let q: std::sync::Arc<Queue<4, 1>> = std::sync::Arc::new(Queue::new());
        assert_eq!(q.send(&[0xAA]), Status::Ok);
        let sender = std::thread::spawn({
            let q = q.clone();
            move || q.send_timeout(&[0xBB], crate::timeout::WAIT_FOREVER)
        });
        std::thread::sleep(std::time::Duration::from_millis(20));
        q.close();
        assert_eq!(sender.join().unwrap(), Status::InvalidState);
    }

    #[test]
    fn closed_queue_rejects_further_sends_and_receives() {
        let q = DefaultQueue::new();
        q.close();
        assert_eq!(q.send(b"x"), Status::InvalidState);
        let mut out = [0u8; DEFAULT_ITEM_SIZE];
        let mut len = 0;
        assert_eq!(q.receive(&mut out, &mut len, 0), Status::InvalidState);
    }
}
