//! Connection handling dengan buffered I/O
//!
//! Pre-allocated read/write buffer per koneksi, traffic-nya line-oriented:
//! satu baris = satu payload untuk bus. Tidak ada alokasi di hot path
//! selain `Vec` kecil per baris yang diekstrak.

use std::io::{self, Read, Write};

use mio::net::TcpStream;

// Chat payload maksimal 256 bytes; 8KB cukup untuk burst beberapa baris
const READ_BUFFER_SIZE: usize = 8 * 1024;
const WRITE_BUFFER_SIZE: usize = 8 * 1024;

/// Wrapper koneksi non-blocking dengan buffer pre-allocated.
pub struct Connection {
    stream: TcpStream,
    read_buffer: Box<[u8]>,
    write_buffer: Box<[u8]>,
    read_pos: usize,
    read_len: usize,
    write_pos: usize,
}

impl Connection {
    /// Wrap stream mio (sudah non-blocking) dengan buffered I/O.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        // Disable Nagle's algorithm untuk pesan chat yang kecil-kecil
        stream.set_nodelay(true)?;

        // Socket buffer tuning - ignore errors, tidak semua platform support
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            let fd = stream.as_raw_fd();
            unsafe {
                let optval: libc::c_int = 64 * 1024;
                libc::setsockopt(
                    fd,
                    libc::SOL_SOCKET,
                    libc::SO_SNDBUF,
                    &optval as *const _ as *const libc::c_void,
                    std::mem::size_of::<libc::c_int>() as libc::socklen_t,
                );
                libc::setsockopt(
                    fd,
                    libc::SOL_SOCKET,
                    libc::SO_RCVBUF,
                    &optval as *const _ as *const libc::c_void,
                    std::mem::size_of::<libc::c_int>() as libc::socklen_t,
                );
            }
        }

        Ok(Self {
            stream,
            read_buffer: vec![0u8; READ_BUFFER_SIZE].into_boxed_slice(),
            write_buffer: vec![0u8; WRITE_BUFFER_SIZE].into_boxed_slice(),
            read_pos: 0,
            read_len: 0,
            write_pos: 0,
        })
    }

    /// Read data ke internal buffer.
    ///
    /// Returns jumlah bytes yang tersedia untuk dibaca.
    pub fn fill_read_buffer(&mut self) -> io::Result<usize> {
        // Compact buffer jika perlu
        if self.read_pos > 0 {
            let remaining = self.read_len - self.read_pos;
            if remaining > 0 {
                self.read_buffer
                    .copy_within(self.read_pos..self.read_len, 0);
            }
            self.read_len = remaining;
            self.read_pos = 0;
        }

        match self.stream.read(&mut self.read_buffer[self.read_len..]) {
            Ok(0) => Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection closed",
            )),
            Ok(n) => {
                self.read_len += n;
                Ok(self.read_len)
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                Ok(self.read_len - self.read_pos)
            }
            Err(e) => Err(e),
        }
    }

    /// Ekstrak satu baris (tanpa `\n`/`\r\n`) dari read buffer.
    ///
    /// Kalau buffer penuh tanpa newline, seluruh isinya dikembalikan
    /// sebagai satu "baris" — payload kebesaran akan ditolak bus, dan
    /// koneksi tidak macet.
    pub fn take_line(&mut self) -> Option<Vec<u8>> {
        let readable = &self.read_buffer[self.read_pos..self.read_len];

        if let Some(idx) = readable.iter().position(|&b| b == b'\n') {
            let mut line = readable[..idx].to_vec();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            self.read_pos += idx + 1;
            return Some(line);
        }

        if self.read_len == self.read_buffer.len() && self.read_pos == 0 {
            let line = readable.to_vec();
            self.read_pos = self.read_len;
            return Some(line);
        }

        None
    }

    /// Queue data untuk dikirim. Returns `Ok(false)` kalau buffer penuh
    /// dan data di-drop (slow consumer).
    pub fn queue_write(&mut self, data: &[u8]) -> io::Result<bool> {
        if self.write_pos + data.len() > self.write_buffer.len() {
            // Flush dulu jika buffer penuh
            self.flush_write_buffer()?;
        }

        if self.write_pos + data.len() > self.write_buffer.len() {
            return Ok(false);
        }

        self.write_buffer[self.write_pos..self.write_pos + data.len()].copy_from_slice(data);
        self.write_pos += data.len();
        Ok(true)
    }

    /// Flush write buffer ke socket. Partial write di-compact, sisanya
    /// menunggu event writable berikutnya.
    pub fn flush_write_buffer(&mut self) -> io::Result<()> {
        if self.write_pos == 0 {
            return Ok(());
        }

        let mut written = 0;
        while written < self.write_pos {
            match self
                .stream
                .write(&self.write_buffer[written..self.write_pos])
            {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write to socket",
                    ));
                }
                Ok(n) => written += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if written > 0 {
                        self.write_buffer.copy_within(written..self.write_pos, 0);
                        self.write_pos -= written;
                    }
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        self.write_pos = 0;
        Ok(())
    }

    /// Stream mio untuk registrasi/deregistrasi ke Poll.
    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Bytes pending di write buffer.
    #[inline(always)]
    pub fn write_pending(&self) -> usize {
        self.write_pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_conn() -> (Connection, std::net::TcpStream) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let peer = std::net::TcpStream::connect(addr).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        accepted.set_nonblocking(true).unwrap();
        let conn = Connection::new(TcpStream::from_std(accepted)).unwrap();
        (conn, peer)
    }

    #[test]
    fn test_queue_write_frame_is_all_or_nothing() {
        let (mut conn, _peer) = connected_conn();

        // Frame yang lebih besar dari seluruh buffer: ditolak utuh,
        // tidak ada byte yang sempat masuk
        let oversized = vec![b'x'; WRITE_BUFFER_SIZE + 1];
        assert!(!conn.queue_write(&oversized).unwrap());
        assert_eq!(conn.write_pending(), 0);

        // Frame normal (content + newline sekali jalan) masuk utuh
        assert!(conn.queue_write(b"halo\n").unwrap());
        assert_eq!(conn.write_pending(), 5);
    }
}
