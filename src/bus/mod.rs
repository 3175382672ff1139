//! Bus Layer: Synchronization + Device Facade
//!
//! Boundary operations yang di desain aslinya dipanggil oleh glue kernel
//! module (`open`/`write`/`read`/`release`), di sini menjadi method publik
//! [`MessageBus`]: `register`, `write`, `read`/`read_blocking`/`read_timeout`,
//! `unregister`.

mod config;
mod error;
mod message_bus;

pub use config::{BusConfig, WritePolicy};
pub use error::BusError;
pub use message_bus::{CancelToken, ChatBus, MessageBus};
