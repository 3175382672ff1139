//! User Registry - Tabel Consumer Berkapasitas Tetap
//!
//! Maksimal N consumer terdaftar, satu cursor per pid. Registrasi gagal
//! `Full` begitu tabel penuh ATAU pid sudah terdaftar (tidak ada silent
//! re-init cursor). Slot dibebaskan lewat `unregister` — dipanggil oleh
//! layer boundary saat sebuah session ditutup.

use crate::bus::BusError;
use crate::protocol::Pid;

/// Posisi baca private milik satu consumer.
///
/// `head` monotonik, sama seperti `tail` di ring; `tail - head` adalah
/// jumlah slot yang belum dikunjungi consumer ini.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerCursor {
    pub pid: Pid,
    pub head: u64,
}

/// Tabel berkapasitas tetap dari cursor yang terdaftar.
pub struct UserRegistry<const N: usize> {
    entries: [Option<ConsumerCursor>; N],
}

impl<const N: usize> Default for UserRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> UserRegistry<N> {
    /// Tabel kosong. Tidak ada alokasi: N slot inline.
    pub fn new() -> Self {
        Self {
            entries: [None; N],
        }
    }

    /// Daftarkan `pid` dengan cursor di posisi tulis saat ini.
    ///
    /// Consumer baru hanya melihat pesan yang diproduksi setelah titik ini,
    /// bukan history. `Full` jika tabel penuh atau pid sudah terdaftar.
    pub fn register(&mut self, pid: Pid, tail: u64) -> Result<(), BusError> {
        if self.lookup(pid).is_some() {
            return Err(BusError::Full);
        }

        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.is_none())
            .ok_or(BusError::Full)?;

        *slot = Some(ConsumerCursor { pid, head: tail });
        log::info!("registry: user {} registered at head {}", pid, tail);
        Ok(())
    }

    /// O(N) scan berdasarkan pid.
    #[inline]
    pub fn lookup(&self, pid: Pid) -> Option<&ConsumerCursor> {
        self.entries
            .iter()
            .flatten()
            .find(|cursor| cursor.pid == pid)
    }

    #[inline]
    pub fn lookup_mut(&mut self, pid: Pid) -> Option<&mut ConsumerCursor> {
        self.entries
            .iter_mut()
            .flatten()
            .find(|cursor| cursor.pid == pid)
    }

    /// Bebaskan slot milik `pid`. Returns `false` jika tidak terdaftar.
    pub fn unregister(&mut self, pid: Pid) -> bool {
        for entry in self.entries.iter_mut() {
            if matches!(entry, Some(cursor) if cursor.pid == pid) {
                *entry = None;
                log::info!("registry: user {} unregistered", pid);
                return true;
            }
        }
        false
    }

    /// Jumlah consumer terdaftar.
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.is_none())
    }

    /// Head terkecil di antara semua cursor — window consumer paling lambat.
    pub fn min_head(&self) -> Option<u64> {
        self.entries.iter().flatten().map(|c| c.head).min()
    }

    /// Tarik maju cursor yang tertinggal lebih dari `capacity` slot di
    /// belakang `tail`. Record yang dilewati hilang permanen untuk consumer
    /// itu (kebijakan data-loss saat backpressure, bukan bug). Dipanggil
    /// setelah setiap append ketika policy-nya overwrite.
    pub fn clamp(&mut self, tail: u64, capacity: u64) {
        for cursor in self.entries.iter_mut().flatten() {
            let lag = tail.wrapping_sub(cursor.head);
            if lag > capacity {
                let lost = lag - capacity;
                cursor.head = tail.wrapping_sub(capacity);
                log::warn!(
                    "registry: user {} lost {} record(s) to ring wraparound",
                    cursor.pid,
                    lost
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut reg: UserRegistry<4> = UserRegistry::new();
        reg.register(100, 5).unwrap();

        let cursor = reg.lookup(100).unwrap();
        assert_eq!(cursor.head, 5);
        assert_eq!(reg.len(), 1);
        assert!(reg.lookup(200).is_none());
    }

    #[test]
    fn test_full_at_capacity() {
        let mut reg: UserRegistry<2> = UserRegistry::new();
        reg.register(1, 0).unwrap();
        reg.register(2, 0).unwrap();
        assert_eq!(reg.register(3, 0), Err(BusError::Full));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_duplicate_pid_rejected() {
        let mut reg: UserRegistry<4> = UserRegistry::new();
        reg.register(7, 3).unwrap();
        assert_eq!(reg.register(7, 9), Err(BusError::Full));
        // Cursor lama tidak tersentuh
        assert_eq!(reg.lookup(7).unwrap().head, 3);
    }

    #[test]
    fn test_unregister_frees_slot() {
        let mut reg: UserRegistry<2> = UserRegistry::new();
        reg.register(1, 0).unwrap();
        reg.register(2, 0).unwrap();

        assert!(reg.unregister(1));
        assert!(!reg.unregister(1));
        assert_eq!(reg.len(), 1);

        // Slot bisa dipakai lagi
        reg.register(3, 10).unwrap();
        assert_eq!(reg.lookup(3).unwrap().head, 10);
    }

    #[test]
    fn test_clamp_pulls_lagging_cursor() {
        let mut reg: UserRegistry<2> = UserRegistry::new();
        reg.register(1, 0).unwrap();

        // tail sudah 9, kapasitas 8 → cursor tertinggal 1 record
        reg.clamp(9, 8);
        assert_eq!(reg.lookup(1).unwrap().head, 1);

        // Dalam window: tidak tersentuh
        reg.clamp(9, 8);
        assert_eq!(reg.lookup(1).unwrap().head, 1);
    }

    #[test]
    fn test_min_head() {
        let mut reg: UserRegistry<4> = UserRegistry::new();
        assert_eq!(reg.min_head(), None);
        reg.register(1, 4).unwrap();
        reg.register(2, 7).unwrap();
        assert_eq!(reg.min_head(), Some(4));
    }
}
