//! Counting semaphore around file extraction.
//!
//! Every `read_file` spawns a 7z process that lives as long as the download; the limiter
//! caps how many of those run at once. Permits are tokens in a bounded channel: taking
//! one is a `recv`, returning it is a `send` from the guard's `Drop`.

use crossbeam_channel::{bounded, Receiver, Sender};

#[derive(Clone, Debug)]
pub struct ReadLimiter {
    permits: usize,
    tx: Sender<()>,
    rx: Receiver<()>,
}

/// Returns its permit on drop.
#[derive(Debug)]
pub struct ReadPermit<'a> {
    tx: &'a Sender<()>,
}

impl Drop for ReadPermit<'_> {
    fn drop(&mut self) {
        let _ = self.tx.try_send(());
    }
}

impl ReadLimiter {
    /// A limiter with `permits` slots (at least one).
    pub fn new(permits: usize) -> Self {
        let permits = permits.max(1);
        let (tx, rx) = bounded(permits);
        for _ in 0..permits {
            // Capacity equals the number of tokens, so this never blocks.
            let _ = tx.try_send(());
        }
        Self { permits, tx, rx }
    }

    /// Blocks until a slot is free.
    pub fn acquire(&self) -> ReadPermit<'_> {
        // `self` owns a sender, so the channel can never disconnect here.
        let _ = self.rx.recv();
        ReadPermit { tx: &self.tx }
    }

    /// Takes a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<ReadPermit<'_>> {
        self.rx.try_recv().ok().map(|_| ReadPermit { tx: &self.tx })
    }

    pub fn capacity(&self) -> usize {
        self.permits
    }

    pub fn available(&self) -> usize {
        self.rx.len()
    }
}

impl Default for ReadLimiter {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn permits_are_returned_on_drop() {
        let limiter = ReadLimiter::new(2);
        assert_eq!(limiter.available(), 2);
        let a = limiter.acquire();
        let b = limiter.acquire();
        assert_eq!(limiter.available(), 0);
        assert!(limiter.try_acquire().is_none());
        drop(a);
        assert_eq!(limiter.available(), 1);
        drop(b);
        assert_eq!(limiter.available(), 2);
    }

    #[test]
    fn zero_is_clamped_to_one() {
        let limiter = ReadLimiter::new(0);
        assert_eq!(limiter.capacity(), 1);
        let _p = limiter.acquire();
        assert!(limiter.try_acquire().is_none());
    }

    #[test]
    fn caps_concurrency() {
        let limiter = Arc::new(ReadLimiter::new(3));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let limiter = limiter.clone();
                let active = active.clone();
                let peak = peak.clone();
                thread::spawn(move || {
                    let _permit = limiter.acquire();
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(10));
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(limiter.available(), 3);
    }
}
