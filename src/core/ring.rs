//! Message Ring - Circular Log dengan Per-Consumer Cursor
//!
//! Satu posisi tulis (`tail`) dipakai bersama oleh semua producer; setiap
//! consumer membawa cursor baca sendiri. Ring TIDAK menyimpan "jumlah pesan
//! hidup" — liveness selalu relatif terhadap cursor masing-masing consumer.
//!
//! Posisi disimpan sebagai u64 monotonik, index slot = `pos & (C-1)`.
//! Dengan begitu `tail - head` langsung memberi jumlah slot yang belum
//! dikunjungi, tanpa ambiguitas kosong-vs-penuh dari aritmetika modulo.

use crate::bus::{BusError, WritePolicy};
use crate::core::registry::ConsumerCursor;
use crate::protocol::ChatRecord;

/// Circular log berkapasitas tetap. C HARUS power of 2.
pub struct MessageRing<const C: usize> {
    // Pre-allocated di heap, tidak ada alokasi setelah init
    slots: Box<[ChatRecord]>,
    // Posisi tulis berikutnya, monotonik (tidak pernah di-wrap)
    tail: u64,
    // Mask untuk operasi modulo yang cepat
    mask: u64,
}

impl<const C: usize> Default for MessageRing<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const C: usize> MessageRing<C> {
    /// Membuat ring baru. Alokasi hanya terjadi sekali di sini.
    ///
    /// # Panics
    /// Panic jika C bukan power of 2 atau C == 0.
    pub fn new() -> Self {
        assert!(C > 0 && C.is_power_of_two(), "C must be power of 2");

        Self {
            slots: vec![ChatRecord::blank(); C].into_boxed_slice(),
            tail: 0,
            mask: (C - 1) as u64,
        }
    }

    /// Posisi tulis saat ini. Cursor baru di-seed dari sini supaya consumer
    /// hanya melihat pesan yang diproduksi SETELAH registrasi.
    #[inline(always)]
    pub fn tail(&self) -> u64 {
        self.tail
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        C
    }

    /// Append record di `tail` lalu maju satu slot.
    ///
    /// `floor` adalah head terkecil di antara semua cursor (atau `tail` jika
    /// belum ada consumer). Perilakunya tergantung policy:
    /// - [`WritePolicy::Overwrite`]: selalu sukses; consumer yang tertinggal
    ///   kehilangan record tertuanya (caller wajib meng-clamp cursor).
    /// - [`WritePolicy::Reject`]: gagal `Full` begitu window consumer paling
    ///   lambat sudah berisi C slot; `tail` tidak berubah.
    pub fn append(
        &mut self,
        record: ChatRecord,
        floor: u64,
        policy: WritePolicy,
    ) -> Result<(), BusError> {
        if policy == WritePolicy::Reject && self.tail.wrapping_sub(floor) >= C as u64 {
            return Err(BusError::Full);
        }

        self.slots[(self.tail & self.mask) as usize] = record;
        self.tail = self.tail.wrapping_add(1);
        Ok(())
    }

    /// Kunjungi SATU slot di `cursor.head` dan majukan cursor.
    ///
    /// Cursor selalu maju satu slot, deliverable atau tidak — slot yang
    /// sudah dikunjungi tidak pernah di-scan ulang. Returns `Some` hanya
    /// jika record deliverable untuk pid cursor (broadcast, atau private
    /// yang ditujukan ke pid itu). `None` bisa berarti window kosong ATAU
    /// slot dilewati; bedakan lewat `pending_for` sebelum memanggil.
    #[inline(always)]
    pub fn scan_for(&self, cursor: &mut ConsumerCursor) -> Option<&ChatRecord> {
        if cursor.head >= self.tail {
            return None;
        }

        let slot = &self.slots[(cursor.head & self.mask) as usize];
        cursor.head = cursor.head.wrapping_add(1);

        if slot.target().accepts(cursor.pid) {
            Some(slot)
        } else {
            None
        }
    }

    /// Jumlah slot yang belum dikunjungi oleh cursor dengan head ini.
    #[inline(always)]
    pub fn pending_for(&self, head: u64) -> u64 {
        self.tail.wrapping_sub(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Target;

    fn rec(sender: u32, target: Target, content: &[u8]) -> ChatRecord {
        ChatRecord::new(sender, target, content)
    }

    #[test]
    fn test_append_advances_tail() {
        let mut ring: MessageRing<4> = MessageRing::new();
        assert_eq!(ring.tail(), 0);

        ring.append(rec(1, Target::Broadcast, b"a"), 0, WritePolicy::Overwrite)
            .unwrap();
        assert_eq!(ring.tail(), 1);
    }

    #[test]
    fn test_scan_delivers_broadcast() {
        let mut ring: MessageRing<4> = MessageRing::new();
        let mut cursor = ConsumerCursor { pid: 9, head: 0 };

        ring.append(rec(1, Target::Broadcast, b"halo"), 0, WritePolicy::Overwrite)
            .unwrap();

        let got = ring.scan_for(&mut cursor).unwrap();
        assert_eq!(got.content(), b"halo");
        assert_eq!(cursor.head, 1);

        // Window kosong sekarang
        assert!(ring.scan_for(&mut cursor).is_none());
        assert_eq!(cursor.head, 1);
    }

    #[test]
    fn test_scan_skips_foreign_private_but_advances() {
        let mut ring: MessageRing<4> = MessageRing::new();
        let mut cursor = ConsumerCursor { pid: 9, head: 0 };

        ring.append(rec(1, Target::Pid(2), b"rahasia"), 0, WritePolicy::Overwrite)
            .unwrap();

        // Bukan untuk pid 9, tapi cursor tetap maju
        assert!(ring.scan_for(&mut cursor).is_none());
        assert_eq!(cursor.head, 1);
        assert_eq!(ring.pending_for(cursor.head), 0);
    }

    #[test]
    fn test_overwrite_wraps_silently() {
        let mut ring: MessageRing<4> = MessageRing::new();
        for i in 0..6u32 {
            ring.append(
                rec(1, Target::Broadcast, format!("m{}", i).as_bytes()),
                0,
                WritePolicy::Overwrite,
            )
            .unwrap();
        }
        assert_eq!(ring.tail(), 6);

        // Cursor yang sudah di-clamp ke tail - C membaca 4 pesan terbaru
        let mut cursor = ConsumerCursor { pid: 9, head: 2 };
        let first = ring.scan_for(&mut cursor).unwrap();
        assert_eq!(first.content(), b"m2");
    }

    #[test]
    fn test_reject_policy_stops_at_capacity() {
        let mut ring: MessageRing<4> = MessageRing::new();
        let floor = 0u64; // consumer paling lambat masih di awal

        for _ in 0..4 {
            ring.append(rec(1, Target::Broadcast, b"x"), floor, WritePolicy::Reject)
                .unwrap();
        }

        let err = ring
            .append(rec(1, Target::Broadcast, b"y"), floor, WritePolicy::Reject)
            .unwrap_err();
        assert_eq!(err, BusError::Full);
        assert_eq!(ring.tail(), 4); // tail tidak berubah setelah gagal
    }

    #[test]
    fn test_reject_policy_frees_up_after_read() {
        let mut ring: MessageRing<4> = MessageRing::new();
        let mut cursor = ConsumerCursor { pid: 9, head: 0 };

        for _ in 0..4 {
            ring.append(rec(1, Target::Broadcast, b"x"), cursor.head, WritePolicy::Reject)
                .unwrap();
        }
        ring.scan_for(&mut cursor).unwrap();

        // Slot paling tua sudah dikunjungi, append boleh lagi
        ring.append(rec(1, Target::Broadcast, b"z"), cursor.head, WritePolicy::Reject)
            .unwrap();
        assert_eq!(ring.tail(), 5);
    }
}
