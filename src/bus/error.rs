//! Taksonomi error boundary operations.
//!
//! Semua kegagalan dilaporkan sebagai nilai — tidak ada yang fatal untuk
//! proses, dan operasi yang gagal tidak merusak state ring/registry untuk
//! caller lain. Retry adalah urusan caller, bus tidak pernah retry sendiri.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// Registry atau ring sudah penuh (termasuk registrasi pid duplikat).
    #[error("registry or ring at capacity")]
    Full,
    /// Prefix private-address malformed, atau payload melebihi batas.
    #[error("malformed message payload")]
    InvalidFormat,
    /// Caller tidak punya entry di registry.
    #[error("caller is not a registered user")]
    Unregistered,
    /// Blocking read dibatalkan lewat [`CancelToken`](crate::bus::CancelToken).
    #[error("blocking read interrupted")]
    Interrupted,
    /// Blocking read melewati deadline. Berbeda dari "tidak ada pesan".
    #[error("blocking read timed out")]
    TimedOut,
    /// State bersama tidak bisa diakses (lock poisoned oleh holder yang
    /// panic). Tidak recoverable dari sisi core.
    #[error("shared bus state unavailable")]
    Fault,
}
