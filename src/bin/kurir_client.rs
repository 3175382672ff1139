//! Kurir Client - Line-Oriented Chat Client
//!
//! Client minimal untuk ngobrol lewat kurir_server:
//! - baris pertama dari server: `ID <pid>` (alamat private kita)
//! - ketik pesan lalu Enter untuk broadcast
//! - awali dengan `@<pid> ` untuk private message
//!
//! Usage:
//!   cargo run --release --bin kurir_client -- --host 127.0.0.1:7777

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn parse_host() -> String {
    let args: Vec<String> = std::env::args().collect();
    let mut host = "127.0.0.1:7777".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                if i + 1 < args.len() {
                    host = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kurir Client\n");
                println!("Usage: kurir_client [--host ADDR]");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    host
}

fn main() -> io::Result<()> {
    env_logger::init();

    let host = parse_host();

    println!("🚀 Kurir Client");
    println!("Connecting to {}...", host);

    let stream = TcpStream::connect(&host)?;
    stream.set_nodelay(true)?;

    let running = Arc::new(AtomicBool::new(true));

    // Reader thread: print semua yang datang dari server
    let reader_running = Arc::clone(&running);
    let reader_stream = stream.try_clone()?;
    let reader = thread::spawn(move || {
        let mut lines = BufReader::new(reader_stream).lines();
        while reader_running.load(Ordering::Relaxed) {
            match lines.next() {
                Some(Ok(line)) => {
                    if let Some(pid) = line.strip_prefix("ID ") {
                        println!("✅ Connected. Your address is @{}", pid);
                    } else if let Some(err) = line.strip_prefix("ERR ") {
                        println!("⚠️  Server rejected message: {}", err);
                    } else {
                        println!("📨 {}", line);
                    }
                }
                Some(Err(_)) | None => break,
            }
        }
        println!("Connection closed by server.");
    });

    // Main loop: stdin → socket
    let mut writer = stream;
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }

    running.store(false, Ordering::Relaxed);
    writer.shutdown(std::net::Shutdown::Both).ok();
    reader.join().ok();
    Ok(())
}
