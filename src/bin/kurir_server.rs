//! Kurir Server Binary
//!
//! Chat server TCP di atas [`ChatBus`]: maksimal 16 user, ring 64 pesan.
//!
//! Usage:
//!   cargo run --release --bin kurir_server [OPTIONS]

use std::net::SocketAddr;

use kurir::network::Server;
use kurir::{BusConfig, WritePolicy};

struct ServerArgs {
    bind_addr: String,
    reject_when_full: bool,
    verbose: bool,
}

impl Default for ServerArgs {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7777".to_string(),
            reject_when_full: false,
            verbose: false,
        }
    }
}

fn parse_args() -> ServerArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = ServerArgs::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    parsed.bind_addr = args[i + 1].clone();
                    i += 1;
                }
            }
            "--reject-when-full" => {
                parsed.reject_when_full = true;
            }
            "--verbose" | "-v" => {
                parsed.verbose = true;
            }
            "--help" | "-h" => {
                println!("Kurir Server - In-Memory Chat Message Bus\n");
                println!("Usage: kurir_server [OPTIONS]\n");
                println!("Options:");
                println!("  -b, --bind <ADDR>      Bind address (default: 0.0.0.0:7777)");
                println!("      --reject-when-full Reject writes instead of overwriting oldest");
                println!("  -v, --verbose          Verbose output");
                println!("  -h, --help             Show this help");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    parsed
}

fn main() {
    let args = parse_args();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let addr: SocketAddr = match args.bind_addr.parse() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("❌ Invalid bind address '{}': {}", args.bind_addr, e);
            std::process::exit(1);
        }
    };

    let config = BusConfig {
        write_policy: if args.reject_when_full {
            WritePolicy::Reject
        } else {
            WritePolicy::Overwrite
        },
    };

    println!("🚀 KURIR SERVER - Chat Message Bus");
    println!("==================================\n");
    println!("🔌 Listening on {}", addr);
    println!("📦 Write policy: {:?}", config.write_policy);
    println!("💬 Protocol: one line per message, '@<pid> ...' for private\n");

    let mut server = match Server::bind(addr, config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}
