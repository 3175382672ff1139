//! Network Layer: TCP Front End untuk Bus
//!
//! Menggunakan mio untuk cross-platform non-blocking I/O. Layer ini adalah
//! analog dari glue kernel-module di desain asli: menerjemahkan lifecycle
//! koneksi menjadi register/unregister, dan byte stream menjadi
//! write/read terhadap bus.

mod connection;
mod server;

pub use connection::Connection;
pub use server::Server;
