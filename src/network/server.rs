//! Chat Server dengan event-driven I/O
//!
//! Menggunakan mio untuk non-blocking I/O multiplexing. Setiap koneksi
//! yang diterima didaftarkan ke bus sebagai satu user (pid = nomor token),
//! persis seperti `open()` pada device file aslinya:
//!
//! - baris masuk → `bus.write` (prefix `@pid ` untuk private message)
//! - setiap putaran event loop, record yang deliverable di-drain ke socket
//! - disconnect → `bus.unregister`, slot registry-nya bebas lagi
//!
//! Satu thread, satu event loop; blocking ada di `Poll::poll`, bukan di bus.

use std::collections::HashMap;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::time::Duration;

use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};

use crate::bus::{BusConfig, BusError, ChatBus};
use crate::network::Connection;
use crate::protocol::{Pid, MAX_CONTENT_LEN};

const SERVER_TOKEN: Token = Token(0);
const EVENTS_CAPACITY: usize = 256;

struct Peer {
    conn: Connection,
    pid: Pid,
}

/// TCP front end untuk [`ChatBus`].
pub struct Server {
    poll: Poll,
    listener: TcpListener,
    peers: HashMap<Token, Peer>,
    next_token: usize,
    bus: ChatBus,
}

impl Server {
    /// Bind listener dan siapkan bus dengan konfigurasi yang diberikan.
    pub fn bind(addr: SocketAddr, config: BusConfig) -> io::Result<Self> {
        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(addr)?;

        poll.registry()
            .register(&mut listener, SERVER_TOKEN, Interest::READABLE)?;

        Ok(Self {
            poll,
            listener,
            peers: HashMap::new(),
            next_token: 1,
            bus: ChatBus::with_config(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run event loop. Tidak pernah return kecuali error poll.
    pub fn run(&mut self) -> io::Result<()> {
        let mut events = Events::with_capacity(EVENTS_CAPACITY);

        log::info!("server listening on {:?}", self.listener.local_addr()?);

        loop {
            // Timeout 1ms supaya delivery tetap jalan saat trafik sepi
            self.poll
                .poll(&mut events, Some(Duration::from_millis(1)))?;

            let mut dead: Vec<Token> = Vec::new();

            for event in events.iter() {
                match event.token() {
                    SERVER_TOKEN => self.accept_peers()?,
                    token => {
                        if event.is_readable() && !self.handle_read(token) {
                            dead.push(token);
                        }
                        if event.is_writable() {
                            if let Some(peer) = self.peers.get_mut(&token) {
                                if peer.conn.flush_write_buffer().is_err() {
                                    dead.push(token);
                                }
                            }
                        }
                    }
                }
            }

            self.deliver_pending(&mut dead);

            for token in dead {
                self.drop_peer(token);
            }
        }
    }

    /// Accept koneksi baru dan daftarkan ke bus. `Full` → koneksi ditolak
    /// dengan satu baris error, slot registry tidak tersentuh.
    fn accept_peers(&mut self) -> io::Result<()> {
        loop {
            match self.listener.accept() {
                Ok((mut stream, addr)) => {
                    let pid = self.next_token as Pid;

                    if let Err(e) = self.bus.register(pid) {
                        log::warn!("refusing {} (register failed: {})", addr, e);
                        let _ = stream.write_all(b"ERR full\n");
                        continue;
                    }

                    let token = Token(self.next_token);
                    self.next_token += 1;

                    let mut conn = match Connection::new(stream) {
                        Ok(c) => c,
                        Err(e) => {
                            let _ = self.bus.unregister(pid);
                            log::warn!("failed to set up {}: {}", addr, e);
                            continue;
                        }
                    };

                    // Kasih tahu client alamat private-nya
                    let _ = conn.queue_write(format!("ID {}\n", pid).as_bytes());

                    self.poll.registry().register(
                        conn.stream_mut(),
                        token,
                        Interest::READABLE | Interest::WRITABLE,
                    )?;

                    log::info!("peer {} connected as user {}", addr, pid);
                    self.peers.insert(token, Peer { conn, pid });
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Proses data masuk dari satu peer. Returns `false` jika koneksi mati.
    fn handle_read(&mut self, token: Token) -> bool {
        let peer = match self.peers.get_mut(&token) {
            Some(p) => p,
            None => return true,
        };

        match peer.conn.fill_read_buffer() {
            Ok(_) => {}
            Err(ref e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::ConnectionReset
                        | io::ErrorKind::ConnectionAborted
                        | io::ErrorKind::UnexpectedEof
                ) =>
            {
                return false;
            }
            Err(e) => {
                log::warn!("user {} read error: {}", peer.pid, e);
                return false;
            }
        }

        while let Some(line) = peer.conn.take_line() {
            if line.is_empty() {
                continue;
            }

            if let Err(e) = self.bus.write(peer.pid, &line) {
                let reply: &[u8] = match e {
                    BusError::InvalidFormat => b"ERR invalid-format\n",
                    BusError::Full => b"ERR full\n",
                    _ => b"ERR fault\n",
                };
                let _ = peer.conn.queue_write(reply);
                log::debug!("user {} write rejected: {}", peer.pid, e);
            }
        }

        true
    }

    /// Drain record yang deliverable untuk setiap peer ke socket-nya.
    /// Record ber-content kosong (`Some(0)`) tetap dikirim sebagai satu
    /// baris kosong, bukan dibuang.
    fn deliver_pending(&mut self, dead: &mut Vec<Token>) {
        let mut buf = [0u8; MAX_CONTENT_LEN + 1];

        for (&token, peer) in self.peers.iter_mut() {
            loop {
                match self.bus.read(peer.pid, &mut buf[..MAX_CONTENT_LEN]) {
                    Ok(None) => break,
                    Ok(Some(n)) => {
                        // Content + terminator di-queue sebagai SATU unit;
                        // kalau tidak muat, baris itu drop utuh dan baris
                        // berikutnya tidak pernah menyambung ke baris ini
                        buf[n] = b'\n';
                        if !peer.conn.queue_write(&buf[..n + 1]).unwrap_or(false) {
                            log::warn!("user {} dropped a message (send buffer full)", peer.pid);
                        }
                    }
                    Err(e) => {
                        log::warn!("user {} delivery failed: {}", peer.pid, e);
                        break;
                    }
                }
            }

            if peer.conn.write_pending() > 0 && peer.conn.flush_write_buffer().is_err() {
                dead.push(token);
            }
        }
    }

    /// Lepas peer: deregister dari poll DAN dari bus — slot user-nya
    /// langsung bisa dipakai koneksi berikutnya.
    fn drop_peer(&mut self, token: Token) {
        if let Some(mut peer) = self.peers.remove(&token) {
            let _ = self.poll.registry().deregister(peer.conn.stream_mut());
            let _ = self.bus.unregister(peer.pid);
            log::info!("user {} disconnected", peer.pid);
        }
    }
}
