//! Protocol Layer: Chat Record dan Addressing
//!
//! Prinsip desain:
//! - Fixed-size records: slot ring di-pre-allocate, tidak ada alokasi saat append
//! - Text addressing: prefix `@pid ` untuk private, sisanya broadcast
//! - Validasi di depan: payload malformed tidak pernah menyentuh ring

pub mod address;
mod record;

pub use record::{ChatRecord, Pid, Target, MAX_CONTENT_LEN, MAX_PAYLOAD_LEN};
