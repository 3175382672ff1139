//! Core module: Message Ring dan User Registry
//!
//! Prinsip desain:
//! - Fixed-capacity: ring dan registry di-pre-allocate saat init
//! - Posisi monotonik: index slot lewat mask, tidak ada ambiguitas wrap
//! - Per-cursor liveness: ring tidak tahu berapa pesan yang "hidup",
//!   setiap consumer menghitung sendiri relatif ke cursornya

mod registry;
mod ring;

pub use registry::{ConsumerCursor, UserRegistry};
pub use ring::MessageRing;
