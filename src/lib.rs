//! Kurir - In-Memory Chat Message Bus
//!
//! Message bus bergaya character device: proses (atau koneksi TCP) mendaftar
//! sekali, lalu bertukar pesan broadcast dan private lewat satu ring buffer
//! bersama. Porting semantik dari chat device kernel module ke crate murni
//! userspace.
//!
//! Arsitektur:
//! - Fixed-Capacity: ring 64 slot + registry 16 user, pre-allocated saat init
//! - Per-Cursor Reads: setiap consumer membawa posisi bacanya sendiri
//! - Coarse Lock: satu Mutex untuk `{tail, cursors}`, satu Condvar untuk
//!   reader yang menunggu (tidak ada busy-wait)
//! - Text Addressing: prefix `@pid ` untuk private message
//!
//! ```
//! use kurir::{ChatBus, BusError};
//!
//! let bus = ChatBus::new();
//! bus.register(100)?;
//! bus.register(200)?;
//!
//! bus.write(100, b"@200 halo")?;       // private ke 200
//! bus.write(100, b"meeting jam 3")?;   // broadcast
//!
//! let mut buf = [0u8; 256];
//! let n = bus.read(200, &mut buf)?.unwrap(); // None = belum ada pesan
//! assert_eq!(&buf[..n], b"halo");
//! # Ok::<(), BusError>(())
//! ```

pub mod bus;
pub mod core;
pub mod network;
pub mod protocol;

pub use bus::{BusConfig, BusError, CancelToken, ChatBus, MessageBus, WritePolicy};
pub use protocol::{ChatRecord, Pid, Target, MAX_CONTENT_LEN, MAX_PAYLOAD_LEN};
