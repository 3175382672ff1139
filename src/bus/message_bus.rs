//! Message Bus - Synchronization Layer + Device Facade
//!
//! Satu `Mutex` kasar melindungi gabungan `{ring, registry}` — persis satu
//! exclusive section per operasi, seperti pasangan `sema`/`wait_queue` di
//! desain asli. Satu `Condvar` untuk reader yang menunggu data:
//!
//! - producer `notify_all` setelah SETIAP append yang sukses (broadcast
//!   wake, bukan targeted)
//! - reader yang menunggu melepas lock selama wait, lalu re-check predikat
//!   setelah bangun (spurious wakeup ditoleransi)
//! - tidak ada busy-wait di mana pun
//!
//! Bus dibangun eksplisit lewat [`MessageBus::new`] dan dipakai by
//! reference; untuk lintas thread, bungkus dengan `Arc`. Tidak ada global
//! tersembunyi.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::bus::{BusConfig, BusError, WritePolicy};
use crate::core::{MessageRing, UserRegistry};
use crate::protocol::{address, ChatRecord, Pid};

/// State yang dilindungi satu lock: posisi tulis DAN semua cursor.
struct BusState<const C: usize, const N: usize> {
    ring: MessageRing<C>,
    registry: UserRegistry<N>,
}

impl<const C: usize, const N: usize> BusState<C, N> {
    /// Skip-scan: kunjungi slot satu per satu sampai ketemu record yang
    /// deliverable atau window habis. Cursor maju melewati private message
    /// milik orang lain tanpa pernah kembali.
    fn take_next(&mut self, pid: Pid) -> Result<Option<ChatRecord>, BusError> {
        let BusState { ring, registry } = self;
        let cursor = registry.lookup_mut(pid).ok_or(BusError::Unregistered)?;

        while ring.pending_for(cursor.head) > 0 {
            if let Some(record) = ring.scan_for(cursor) {
                return Ok(Some(*record));
            }
        }
        Ok(None)
    }
}

struct BusInner<const C: usize, const N: usize> {
    state: Mutex<BusState<C, N>>,
    readable: Condvar,
    config: BusConfig,
}

/// Shared message bus: registrasi consumer, produce, consume.
///
/// `C` = kapasitas ring (power of 2), `N` = maksimum user terdaftar.
/// Kapasitas referensi ada di [`ChatBus`].
pub struct MessageBus<const C: usize, const N: usize> {
    inner: Arc<BusInner<C, N>>,
}

/// Bus dengan kapasitas referensi: ring 64 slot, 16 user.
pub type ChatBus = MessageBus<64, 16>;

impl<const C: usize, const N: usize> Default for MessageBus<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const C: usize, const N: usize> MessageBus<C, N> {
    /// Bus baru dengan policy default ([`WritePolicy::Overwrite`]).
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(BusInner {
                state: Mutex::new(BusState {
                    ring: MessageRing::new(),
                    registry: UserRegistry::new(),
                }),
                readable: Condvar::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> BusConfig {
        self.inner.config
    }

    /// Lock poisoned (holder panic) muncul sebagai `Fault`, bukan panic
    /// lanjutan di caller.
    fn lock(&self) -> Result<MutexGuard<'_, BusState<C, N>>, BusError> {
        self.inner.state.lock().map_err(|_| BusError::Fault)
    }

    /// Daftarkan `pid` sebagai consumer. Cursornya di-seed di `tail` saat
    /// ini: hanya pesan SETELAH registrasi yang terlihat.
    ///
    /// `Full` jika registry penuh atau pid sudah terdaftar.
    pub fn register(&self, pid: Pid) -> Result<(), BusError> {
        let mut state = self.lock()?;
        let tail = state.ring.tail();
        state.registry.register(pid, tail)
    }

    /// Bebaskan slot registry milik `pid` (dipanggil layer boundary saat
    /// session ditutup). `Unregistered` jika pid tidak dikenal.
    pub fn unregister(&self, pid: Pid) -> Result<(), BusError> {
        let mut state = self.lock()?;
        if state.registry.unregister(pid) {
            Ok(())
        } else {
            Err(BusError::Unregistered)
        }
    }

    /// Produce: parse payload, append ke ring, bangunkan semua reader.
    ///
    /// Returns jumlah bytes yang diterima. `Unregistered` jika pengirim
    /// tidak terdaftar; `InvalidFormat` jika prefix `@` rusak atau payload
    /// kebesaran (ring tidak tersentuh); `Full` hanya pada policy `Reject`.
    pub fn write(&self, pid: Pid, payload: &[u8]) -> Result<usize, BusError> {
        // Parsing di luar critical section — bounded lock hold time
        let (target, content) = address::parse(payload)?;
        let record = ChatRecord::new(pid, target, content);

        let mut state = self.lock()?;
        if state.registry.lookup(pid).is_none() {
            return Err(BusError::Unregistered);
        }

        let policy = self.inner.config.write_policy;
        let BusState { ring, registry } = &mut *state;
        let floor = registry.min_head().unwrap_or_else(|| ring.tail());
        ring.append(record, floor, policy)?;

        if policy == WritePolicy::Overwrite {
            registry.clamp(ring.tail(), C as u64);
        }

        log::debug!("bus: user {} appended {:?} at {}", pid, target, ring.tail() - 1);

        // Broadcast wake, terlepas ada yang menunggu atau tidak
        self.inner.readable.notify_all();
        Ok(payload.len())
    }

    /// Consume non-blocking: `Ok(None)` kalau tidak ada pesan deliverable
    /// saat ini. Content di-copy ke `buf` maksimal `buf.len()` bytes.
    ///
    /// `Ok(Some(0))` berarti satu record DITERIMA tapi content-nya kosong
    /// (ping `@pid` tanpa isi) — bukan "tidak ada pesan". Cursor hanya maju
    /// pada kasus `Some`.
    pub fn read(&self, pid: Pid, buf: &mut [u8]) -> Result<Option<usize>, BusError> {
        let mut state = self.lock()?;
        Ok(state.take_next(pid)?.map(|record| copy_out(&record, buf)))
    }

    /// Consume blocking: suspend sampai ada pesan deliverable, atau sampai
    /// `cancel` di-trigger (→ `Interrupted`, cursor tetap konsisten).
    ///
    /// Lock dilepas selama wait dan diambil lagi setelah bangun; predikat
    /// selalu di-re-check.
    pub fn read_blocking(
        &self,
        pid: Pid,
        buf: &mut [u8],
        cancel: &CancelToken<C, N>,
    ) -> Result<usize, BusError> {
        let mut state = self.lock()?;
        loop {
            if cancel.is_cancelled() {
                return Err(BusError::Interrupted);
            }
            if let Some(record) = state.take_next(pid)? {
                return Ok(copy_out(&record, buf));
            }
            state = self
                .inner
                .readable
                .wait(state)
                .map_err(|_| BusError::Fault)?;
        }
    }

    /// Consume blocking dengan deadline. `TimedOut` jelas berbeda dari
    /// "tidak ada pesan" (`Ok(0)` tidak pernah dikembalikan di sini kecuali
    /// record yang diterima memang ber-content kosong). Seperti
    /// [`read_blocking`](Self::read_blocking), wait bisa diputus lebih awal
    /// lewat `cancel` (→ `Interrupted`).
    pub fn read_timeout(
        &self,
        pid: Pid,
        buf: &mut [u8],
        timeout: Duration,
        cancel: &CancelToken<C, N>,
    ) -> Result<usize, BusError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock()?;
        loop {
            if cancel.is_cancelled() {
                return Err(BusError::Interrupted);
            }
            if let Some(record) = state.take_next(pid)? {
                return Ok(copy_out(&record, buf));
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(BusError::TimedOut);
            }
            let (guard, _) = self
                .inner
                .readable
                .wait_timeout(state, deadline - now)
                .map_err(|_| BusError::Fault)?;
            // Re-check predikat dulu; flag timed_out saja belum cukup
            state = guard;
        }
    }

    /// Jumlah slot yang belum dikunjungi cursor `pid` (termasuk slot yang
    /// nantinya akan di-skip). Saturasi di `C` oleh kebijakan overwrite.
    pub fn pending(&self, pid: Pid) -> Result<usize, BusError> {
        let state = self.lock()?;
        let cursor = state.registry.lookup(pid).ok_or(BusError::Unregistered)?;
        Ok(state.ring.pending_for(cursor.head) as usize)
    }

    /// Jumlah user terdaftar saat ini.
    pub fn user_count(&self) -> Result<usize, BusError> {
        Ok(self.lock()?.registry.len())
    }

    /// Token untuk membatalkan [`read_blocking`](Self::read_blocking) atau
    /// [`read_timeout`](Self::read_timeout) dari thread lain — analog
    /// userspace dari signal yang membangunkan `wait_event_interruptible`.
    pub fn cancel_token(&self) -> CancelToken<C, N> {
        CancelToken {
            cancelled: Arc::new(AtomicBool::new(false)),
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Copy content record ke buffer caller, terpotong ke `buf.len()`.
#[inline(always)]
fn copy_out(record: &ChatRecord, buf: &mut [u8]) -> usize {
    let content = record.content();
    let n = content.len().min(buf.len());
    buf[..n].copy_from_slice(&content[..n]);
    n
}

/// Pembatalan blocking read. Clone-able; semua clone membatalkan wait yang
/// memegang token yang sama.
pub struct CancelToken<const C: usize, const N: usize> {
    cancelled: Arc<AtomicBool>,
    inner: Arc<BusInner<C, N>>,
}

impl<const C: usize, const N: usize> Clone for CancelToken<C, N> {
    fn clone(&self) -> Self {
        Self {
            cancelled: Arc::clone(&self.cancelled),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<const C: usize, const N: usize> CancelToken<C, N> {
    /// Set flag lalu bangunkan SEMUA waiter. Waiter lain yang tidak
    /// dibatalkan hanya re-check predikatnya dan tidur lagi.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // Sinkronisasi singkat dengan lock supaya tidak ada waiter yang
        // kelewat notification di antara check flag dan wait
        if let Ok(guard) = self.inner.state.lock() {
            drop(guard);
        }
        self.inner.readable.notify_all();
    }

    #[inline(always)]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_write_read_cycle() {
        let bus: MessageBus<8, 4> = MessageBus::new();
        bus.register(1).unwrap();
        bus.register(2).unwrap();

        assert_eq!(bus.write(1, b"halo").unwrap(), 4);

        let mut buf = [0u8; 256];
        let n = bus.read(2, &mut buf).unwrap().unwrap();
        assert_eq!(&buf[..n], b"halo");

        // Sekali saja
        assert_eq!(bus.read(2, &mut buf).unwrap(), None);
    }

    #[test]
    fn test_unregistered_caller_rejected() {
        let bus: MessageBus<8, 4> = MessageBus::new();
        let mut buf = [0u8; 16];

        assert_eq!(bus.write(5, b"x"), Err(BusError::Unregistered));
        assert_eq!(bus.read(5, &mut buf), Err(BusError::Unregistered));
        assert_eq!(bus.pending(5), Err(BusError::Unregistered));
        assert_eq!(bus.unregister(5), Err(BusError::Unregistered));
    }

    #[test]
    fn test_small_buffer_truncates() {
        let bus: MessageBus<8, 4> = MessageBus::new();
        bus.register(1).unwrap();
        bus.write(1, b"panjang sekali").unwrap();

        let mut buf = [0u8; 4];
        let n = bus.read(1, &mut buf).unwrap().unwrap();
        assert_eq!(&buf[..n], b"panj");
    }

    #[test]
    fn test_empty_content_read_is_some_zero() {
        let bus: MessageBus<8, 4> = MessageBus::new();
        bus.register(1).unwrap();
        bus.register(7).unwrap();

        // Ping tanpa isi: record tetap record, bukan "tidak ada pesan"
        bus.write(1, b"@7").unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(bus.read(7, &mut buf).unwrap(), Some(0));
        assert_eq!(bus.read(7, &mut buf).unwrap(), None);
    }

    #[test]
    fn test_invalid_format_leaves_ring_untouched() {
        let bus: MessageBus<8, 4> = MessageBus::new();
        bus.register(1).unwrap();

        assert_eq!(bus.write(1, b"@abc no-space-after"), Err(BusError::InvalidFormat));
        assert_eq!(bus.pending(1).unwrap(), 0);
    }

    #[test]
    fn test_cancel_token_flag() {
        let bus: MessageBus<8, 4> = MessageBus::new();
        let token = bus.cancel_token();
        assert!(!token.is_cancelled());
        token.clone().cancel();
        assert!(token.is_cancelled());
    }
}
