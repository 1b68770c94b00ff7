//! Double-buffered sample handoff
//!
//! Two equal regions of signed 16-bit samples; the acquisition context fills
//! one while the main loop processes the other. [`BufferPair::new`] splits
//! into a [`SampleWriter`] (single producer) and a [`BufferReader`] (single
//! consumer). The only synchronization is a ready flag published with a
//! release store after the region swap and consumed with an acquire load, so
//! the consumer never observes a partially-written sample.
//!
//! If the consumer still holds the other region when a capture completes,
//! [`SampleWriter::publish`] refuses and the burst is dropped — absence of
//! output, not an error, matching the link's silent failure model.

use std::cell::UnsafeCell;
use std::hint;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

struct Shared {
    regions: [UnsafeCell<Box<[i16]>>; 2],
    len: usize,
    /// Set by the producer after a swap; cleared by the consumer on take.
    ready: AtomicBool,
    /// Which region `ready` refers to; written before the release store.
    ready_region: AtomicUsize,
    /// Consumer currently holds a [`ReadyBuffer`] guard.
    held: AtomicBool,
}

// Safety: the regions are plain sample storage. The writer only touches its
// active region and the reader only the published one; `publish` refuses to
// swap into a region while `ready` or `held` says the consumer may still
// access it, and the release/acquire pairing on those flags orders the data
// accesses on either side of the handoff.
unsafe impl Send for Shared {}
unsafe impl Sync for Shared {}

/// Allocates the two regions and hands out the producer and consumer halves.
pub struct BufferPair;

impl BufferPair {
    pub fn new(len: usize) -> (SampleWriter, BufferReader) {
        let shared = Arc::new(Shared {
            regions: [
                UnsafeCell::new(vec![0i16; len].into_boxed_slice()),
                UnsafeCell::new(vec![0i16; len].into_boxed_slice()),
            ],
            len,
            ready: AtomicBool::new(false),
            ready_region: AtomicUsize::new(0),
            held: AtomicBool::new(false),
        });
        (
            SampleWriter {
                shared: Arc::clone(&shared),
                active: 0,
            },
            BufferReader { shared },
        )
    }
}

/// Producer half: owned by the acquisition tick context.
pub struct SampleWriter {
    shared: Arc<Shared>,
    active: usize,
}

impl SampleWriter {
    pub fn len(&self) -> usize {
        self.shared.len
    }

    pub fn is_empty(&self) -> bool {
        self.shared.len == 0
    }

    /// Store one sample into the active region.
    ///
    /// The caller (the tick handler) owns the cursor and guarantees
    /// `cursor < len`; this is the hot path and stays branch-light.
    #[inline]
    pub fn write(&mut self, cursor: usize, sample: i16) {
        debug_assert!(cursor < self.shared.len);
        // Safety: the producer is the sole accessor of the active region;
        // see the protocol note on `Shared`.
        let region = unsafe { &mut *self.shared.regions[self.active].get() };
        region[cursor] = sample;
    }

    /// Hand the filled active region to the consumer and swap to the other.
    ///
    /// The swap happens strictly before the ready signal. Returns `false`
    /// without swapping when the consumer is not yet done with the other
    /// region; the caller then recycles the active region for the next burst.
    pub fn publish(&mut self) -> bool {
        // `ready` still set: the previous publish was never taken.
        // `held`: the consumer is inside the other region right now.
        // Acquire on `ready` pairs with the consumer's release store in
        // `take_ready`, so a cleared flag implies `held` is already visible.
        if self.shared.ready.load(Ordering::Acquire) || self.shared.held.load(Ordering::Acquire) {
            return false;
        }
        self.shared
            .ready_region
            .store(self.active, Ordering::Relaxed);
        self.active ^= 1;
        self.shared.ready.store(true, Ordering::Release);
        true
    }
}

/// Consumer half: owned by the main loop.
pub struct BufferReader {
    shared: Arc<Shared>,
}

impl BufferReader {
    pub fn len(&self) -> usize {
        self.shared.len
    }

    pub fn is_empty(&self) -> bool {
        self.shared.len == 0
    }

    /// Take the published region if one is pending.
    pub fn try_take(&mut self) -> Option<ReadyBuffer<'_>> {
        if !self.shared.ready.load(Ordering::Acquire) {
            return None;
        }
        Some(self.take_ready())
    }

    /// Busy-wait until a region is published.
    ///
    /// There is no blocking primitive in this design; the original polls an
    /// index in an empty loop. No timeout: the caller blocks indefinitely.
    pub fn wait_take(&mut self) -> ReadyBuffer<'_> {
        while !self.shared.ready.load(Ordering::Acquire) {
            hint::spin_loop();
        }
        self.take_ready()
    }

    /// Claim the published region; `ready` must have been observed set.
    fn take_ready(&mut self) -> ReadyBuffer<'_> {
        let region = self.shared.ready_region.load(Ordering::Relaxed);
        // mark the region held before releasing the ready slot, so a
        // concurrent publish can never swap into it
        self.shared.held.store(true, Ordering::Relaxed);
        self.shared.ready.store(false, Ordering::Release);
        ReadyBuffer {
            shared: &*self.shared,
            region,
        }
    }
}

/// Exclusive view of a published region; the transform runs in place here.
///
/// Dropping the guard returns the region to the producer.
pub struct ReadyBuffer<'a> {
    shared: &'a Shared,
    region: usize,
}

impl Deref for ReadyBuffer<'_> {
    type Target = [i16];

    fn deref(&self) -> &[i16] {
        // Safety: `held` keeps the producer out of this region (see Shared)
        unsafe { &*self.shared.regions[self.region].get() }
    }
}

impl DerefMut for ReadyBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [i16] {
        // Safety: as above, plus the guard is unique by &mut self
        unsafe { &mut *self.shared.regions[self.region].get() }
    }
}

impl Drop for ReadyBuffer<'_> {
    fn drop(&mut self) {
        self.shared.held.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_ready_initially() {
        let (_writer, mut reader) = BufferPair::new(32);
        assert!(reader.try_take().is_none());
    }

    #[test]
    fn test_publish_then_take_sees_all_samples() {
        let (mut writer, mut reader) = BufferPair::new(32);
        for cursor in 0..32 {
            writer.write(cursor, cursor as i16 * 3);
        }
        assert!(writer.publish());

        let buffer = reader.try_take().expect("published region");
        for (cursor, &sample) in buffer.iter().enumerate() {
            assert_eq!(sample, cursor as i16 * 3);
        }
    }

    #[test]
    fn test_regions_alternate_across_publishes() {
        let (mut writer, mut reader) = BufferPair::new(8);
        writer.write(0, 111);
        assert!(writer.publish());
        {
            let buffer = reader.try_take().unwrap();
            assert_eq!(buffer[0], 111);
        }

        // second fill lands in the other region and must not disturb data
        // already handed over
        writer.write(0, 222);
        assert!(writer.publish());
        let buffer = reader.try_take().unwrap();
        assert_eq!(buffer[0], 222);
    }

    #[test]
    fn test_publish_refused_while_pending() {
        let (mut writer, mut reader) = BufferPair::new(8);
        assert!(writer.publish());
        // consumer has not taken the first region yet
        assert!(!writer.publish());
        let _ = reader.try_take().unwrap();
        // guard dropped, both regions free again
        assert!(writer.publish());
    }

    #[test]
    fn test_publish_refused_while_guard_held() {
        let (mut writer, mut reader) = BufferPair::new(8);
        assert!(writer.publish());
        let guard = reader.try_take().unwrap();
        assert!(!writer.publish());
        drop(guard);
        assert!(writer.publish());
    }

    #[test]
    fn test_wait_take_returns_published_region() {
        let (mut writer, mut reader) = BufferPair::new(4);
        writer.write(0, -5);
        assert!(writer.publish());
        let buffer = reader.wait_take();
        assert_eq!(buffer[0], -5);
    }
}
