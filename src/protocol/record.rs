//! Chat Record - Fixed-Size Message Format
//!
//! Layout per record:
//! ┌─────────────────────────────────────────────────────┐
//! │ sender: Pid │ target: Target │ content (max 255 B)  │
//! └─────────────────────────────────────────────────────┘
//!
//! Record berukuran tetap dan `Copy`, jadi ring buffer bisa pre-allocate
//! semua slot saat init. Immutable setelah di-append.

use std::fmt;

/// Process id pengirim/penerima. Boundary API mengidentifikasi caller
/// lewat pid, bukan session token.
pub type Pid = u32;

/// Panjang maksimum payload mentah yang diterima `write` (termasuk prefix
/// `@pid `). Payload lebih panjang ditolak, bukan dipotong.
pub const MAX_PAYLOAD_LEN: usize = 256;

/// Panjang maksimum content yang disimpan per record. Byte ke-256 di desain
/// aslinya dipakai terminating NUL; di sini kita simpan length eksplisit.
pub const MAX_CONTENT_LEN: usize = 255;

/// Alamat tujuan sebuah record.
///
/// Menggantikan sentinel `target_pid == 0`: broadcast adalah varian
/// eksplisit, bukan nilai ajaib.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Terlihat oleh semua consumer yang terdaftar.
    Broadcast,
    /// Private: hanya terlihat oleh satu pid.
    Pid(Pid),
}

impl Target {
    /// Apakah record dengan target ini deliverable untuk `pid`?
    #[inline(always)]
    pub fn accepts(&self, pid: Pid) -> bool {
        match *self {
            Target::Broadcast => true,
            Target::Pid(target) => target == pid,
        }
    }
}

/// Satu pesan chat di dalam ring.
///
/// Fixed-size dan `Copy` supaya slot ring bisa di-overwrite tanpa alokasi.
/// Content yang lebih panjang dari [`MAX_CONTENT_LEN`] dipotong saat
/// konstruksi (aturan NUL-termination dari desain asli).
#[derive(Clone, Copy)]
pub struct ChatRecord {
    sender: Pid,
    target: Target,
    content: [u8; MAX_CONTENT_LEN],
    content_len: u8,
}

impl ChatRecord {
    /// Membuat record baru. Content dipotong ke [`MAX_CONTENT_LEN`] bytes.
    pub fn new(sender: Pid, target: Target, content: &[u8]) -> Self {
        let len = content.len().min(MAX_CONTENT_LEN);
        let mut buf = [0u8; MAX_CONTENT_LEN];
        buf[..len].copy_from_slice(&content[..len]);
        Self {
            sender,
            target,
            content: buf,
            content_len: len as u8,
        }
    }

    /// Record kosong untuk pre-fill slot ring. Tidak pernah terbaca:
    /// `scan_for` hanya mengunjungi slot di bawah `tail`.
    pub(crate) fn blank() -> Self {
        Self::new(0, Target::Broadcast, &[])
    }

    #[inline(always)]
    pub fn sender(&self) -> Pid {
        self.sender
    }

    #[inline(always)]
    pub fn target(&self) -> Target {
        self.target
    }

    /// Content sebagai byte slice (panjang sebenarnya, tanpa padding).
    #[inline(always)]
    pub fn content(&self) -> &[u8] {
        &self.content[..self.content_len as usize]
    }
}

impl fmt::Debug for ChatRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatRecord")
            .field("sender", &self.sender)
            .field("target", &self.target)
            .field("content", &String::from_utf8_lossy(self.content()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_truncated() {
        let long = vec![b'x'; 400];
        let rec = ChatRecord::new(1, Target::Broadcast, &long);
        assert_eq!(rec.content().len(), MAX_CONTENT_LEN);
    }

    #[test]
    fn test_target_accepts() {
        assert!(Target::Broadcast.accepts(42));
        assert!(Target::Pid(42).accepts(42));
        assert!(!Target::Pid(42).accepts(43));
    }

    #[test]
    fn test_content_roundtrip() {
        let rec = ChatRecord::new(7, Target::Pid(9), b"halo dunia");
        assert_eq!(rec.sender(), 7);
        assert_eq!(rec.target(), Target::Pid(9));
        assert_eq!(rec.content(), b"halo dunia");
    }
}
