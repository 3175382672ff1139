//! Konfigurasi bus — keputusan policy yang eksplisit.
//!
//! Dua pilihan desain yang di repo aslinya muncul sebagai perbedaan tak
//! disengaja antar varian, di sini dikunci sebagai konfigurasi:
//!
//! - Full-buffer policy: [`WritePolicy`], dipilih per bus.
//! - Realisasi broadcast: SELALU tag-and-filter-at-read (satu append dengan
//!   `Target::Broadcast`, filtering di `scan_for`). Fan-out-at-write tidak
//!   diimplementasikan; satu code path saja.

/// Kebijakan saat ring penuh terhadap consumer paling lambat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Writer tidak pernah nunggu reader: slot tertua di-overwrite, consumer
    /// yang tertinggal kehilangan record yang belum dibacanya. Default,
    /// mengikuti varian wraparound dari desain asli.
    #[default]
    Overwrite,
    /// Tolak `write` dengan `Full` begitu window consumer paling lambat
    /// berisi C slot. Mengikuti varian linear-buffer dari desain asli.
    Reject,
}

/// Konfigurasi [`MessageBus`](crate::bus::MessageBus).
#[derive(Debug, Clone, Copy, Default)]
pub struct BusConfig {
    pub write_policy: WritePolicy,
}
