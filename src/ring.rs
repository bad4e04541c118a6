// Lock-free MPMC ring buffer for log records
//
// Ticketed bounded queue: head and tail are monotonic 64-bit ticket
// counters, and each slot carries its own sequence counter ("turn") that
// encodes whether the slot is empty or full for the ticket targeting it.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache-aligned wrapper to prevent false sharing
#[repr(align(64))]
struct CacheAligned<T>(T);

/// One ring slot.
///
/// State machine, for the ticket `t` that maps onto this slot:
/// - `turn == 2 * (t / capacity)`     -> empty, producer ticket `t` may fill
/// - `turn == 2 * (t / capacity) + 1` -> full, consumer ticket `t` may drain
struct Slot<T> {
    turn: CacheAligned<AtomicU64>,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Lock-free multi-producer multi-consumer ring buffer
///
/// Bounded and allocation-free after construction. Producers and consumers
/// claim tickets by CAS on `head`/`tail`; the per-slot `turn` counter is the
/// source of truth for slot state, so a winner never touches a slot a peer
/// is still using. Operations never block and never wait: when the queue is
/// full (or the target slot is still being recycled) `try_enqueue` hands the
/// value back and lets the caller decide between retry and drop.
pub struct RingBuffer<T> {
    slots: Box<[Slot<T>]>,
    capacity: usize,
    mask: usize,
    head: CacheAligned<AtomicU64>,
    tail: CacheAligned<AtomicU64>,
}

// SAFETY: slots are single-writer/single-reader at any instant: a producer
// touches a slot only after winning the head CAS for a ticket whose turn
// marks the slot empty, a consumer only after winning the tail CAS for a
// ticket whose turn marks it full. The turn release/acquire pair publishes
// the value across threads.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Create a ring with at least `capacity` slots, rounded up to the next
    /// power of two. One slot stays reserved to disambiguate full from empty,
    /// so a two-slot ring holds one record.
    ///
    /// # Panics
    /// Panics if `capacity < 2`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "ring capacity must be at least 2");
        let capacity = capacity.next_power_of_two();

        let slots: Vec<Slot<T>> = (0..capacity)
            .map(|_| Slot {
                turn: CacheAligned(AtomicU64::new(0)),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();

        Self {
            slots: slots.into_boxed_slice(),
            capacity,
            mask: capacity - 1,
            head: CacheAligned(AtomicU64::new(0)),
            tail: CacheAligned(AtomicU64::new(0)),
        }
    }

    /// Enqueue a value, handing it back if the queue is full or the target
    /// slot has not been recycled yet.
    pub fn try_enqueue(&self, value: T) -> Result<(), T> {
        loop {
            let head = self.head.0.load(Ordering::Relaxed);
            let tail = self.tail.0.load(Ordering::Relaxed);
            if head.wrapping_sub(tail) >= self.capacity as u64 - 1 {
                return Err(value);
            }

            let idx = (head as usize) & self.mask;
            let turn = head / self.capacity as u64;
            let slot = &self.slots[idx];
            if slot.turn.0.load(Ordering::Acquire) != 2 * turn {
                // A consumer from the previous lap still owns the slot.
                return Err(value);
            }

            match self.head.0.compare_exchange_weak(
                head,
                head.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    // We own the slot: move the value in, then publish.
                    unsafe {
                        (*slot.value.get()).write(value);
                    }
                    slot.turn.0.store(2 * turn + 1, Ordering::Release);
                    return Ok(());
                }
                Err(_) => {
                    std::hint::spin_loop();
                }
            }
        }
    }

    /// Dequeue the oldest value, or None if the queue is empty (or the head
    /// slot is still mid-write).
    pub fn try_dequeue(&self) -> Option<T> {
        loop {
            let tail = self.tail.0.load(Ordering::Relaxed);
            let idx = (tail as usize) & self.mask;
            let turn = tail / self.capacity as u64;
            let slot = &self.slots[idx];
            if slot.turn.0.load(Ordering::Acquire) != 2 * turn + 1 {
                return None;
            }

            match self.tail.0.compare_exchange_weak(
                tail,
                tail.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    let value = unsafe { (*slot.value.get()).assume_init_read() };
                    slot.turn.0.store(2 * (turn + 1), Ordering::Release);
                    return Some(value);
                }
                Err(_) => {
                    std::hint::spin_loop();
                }
            }
        }
    }

    /// Check if the queue is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        let head = self.head.0.load(Ordering::Relaxed);
        let tail = self.tail.0.load(Ordering::Relaxed);
        head == tail
    }

    /// Number of values currently queued
    pub fn len(&self) -> usize {
        let head = self.head.0.load(Ordering::Relaxed);
        let tail = self.tail.0.load(Ordering::Relaxed);
        (head.saturating_sub(tail) as usize).min(self.capacity)
    }

    /// Slot count after power-of-two rounding
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        // Run destructors for anything still queued.
        while self.try_dequeue().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_enqueue_dequeue_basic() {
        let ring = RingBuffer::new(16);
        assert!(ring.try_enqueue(42).is_ok());
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.try_dequeue(), Some(42));
        assert!(ring.is_empty());
    }

    #[test]
    fn test_empty_queue_behavior() {
        let ring: RingBuffer<i32> = RingBuffer::new(16);
        assert!(ring.is_empty());
        assert_eq!(ring.try_dequeue(), None);
    }

    #[test]
    fn test_capacity_rounding() {
        let r1: RingBuffer<i32> = RingBuffer::new(15);
        let r2: RingBuffer<i32> = RingBuffer::new(17);
        assert_eq!(r1.capacity(), 16);
        assert_eq!(r2.capacity(), 32);
    }

    #[test]
    #[should_panic(expected = "ring capacity must be at least 2")]
    fn test_capacity_below_minimum() {
        let _ring: RingBuffer<i32> = RingBuffer::new(1);
    }

    #[test]
    fn test_full_queue_behavior() {
        let ring = RingBuffer::new(16);
        for i in 0..15 {
            assert!(ring.try_enqueue(i).is_ok());
        }
        // One slot is reserved: the 16th enqueue hands the value back.
        assert_eq!(ring.try_enqueue(99), Err(99));
    }

    #[test]
    fn test_wraparound() {
        let ring = RingBuffer::new(4);
        for lap in 0..10 {
            for i in 0..3 {
                assert!(ring.try_enqueue(lap * 3 + i).is_ok());
            }
            for i in 0..3 {
                assert_eq!(ring.try_dequeue(), Some(lap * 3 + i));
            }
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn test_spsc_ordering() {
        let ring = Arc::new(RingBuffer::new(1024));
        const COUNT: u64 = 100_000;

        let producer_ring = Arc::clone(&ring);
        let producer = thread::spawn(move || {
            for i in 0..COUNT {
                let mut value = i;
                while let Err(v) = producer_ring.try_enqueue(value) {
                    value = v;
                    thread::yield_now();
                }
            }
        });

        let mut consumed = Vec::with_capacity(COUNT as usize);
        while consumed.len() < COUNT as usize {
            if let Some(value) = ring.try_dequeue() {
                consumed.push(value);
            }
        }

        producer.join().unwrap();
        assert!(ring.is_empty());
        assert!(consumed.iter().copied().eq(0..COUNT));
    }

    #[test]
    fn test_mpmc_concurrent() {
        let ring = Arc::new(RingBuffer::new(1024));
        let mut handles = vec![];

        for t in 0..4u64 {
            let ring = Arc::clone(&ring);
            handles.push(thread::spawn(move || {
                for i in 0..100u64 {
                    let mut value = t * 1000 + i;
                    while let Err(v) = ring.try_enqueue(value) {
                        value = v;
                        thread::yield_now();
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let mut count = 0;
        while ring.try_dequeue().is_some() {
            count += 1;
        }
        assert_eq!(count, 400);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let ring = Arc::new(RingBuffer::new(8));
        let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let mut handles = vec![];

        for _ in 0..2 {
            let ring = Arc::clone(&ring);
            let stop = Arc::clone(&stop);
            handles.push(thread::spawn(move || {
                while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                    let _ = ring.try_enqueue(1u32);
                }
            }));
        }
        for _ in 0..2 {
            let ring = Arc::clone(&ring);
            let stop = Arc::clone(&stop);
            handles.push(thread::spawn(move || {
                while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                    let _ = ring.try_dequeue();
                }
            }));
        }

        for _ in 0..10_000 {
            assert!(ring.len() <= ring.capacity());
        }
        stop.store(true, std::sync::atomic::Ordering::Relaxed);
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_drop_runs_destructors() {
        struct Counted(Arc<std::sync::atomic::AtomicUsize>);
        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            }
        }

        let drops = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        {
            let ring = RingBuffer::new(8);
            for _ in 0..5 {
                assert!(ring.try_enqueue(Counted(Arc::clone(&drops))).is_ok());
            }
            assert_eq!(ring.try_dequeue().map(drop), Some(()));
        }
        assert_eq!(drops.load(std::sync::atomic::Ordering::Relaxed), 5);
    }
}
