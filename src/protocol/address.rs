//! Address Router - Parsing Prefix `@pid` untuk Private Message
//!
//! Konvensi wire (text, bukan binary framing):
//! - `"@1234 hello"` → private ke pid 1234, content `"hello"`
//! - `"hello"`       → broadcast, content `"hello"`
//!
//! Parsing zero-copy: content dikembalikan sebagai slice ke payload asli.
//! Prefix yang malformed ditolak SEBELUM menyentuh ring.

use crate::bus::BusError;
use crate::protocol::record::{Pid, Target, MAX_PAYLOAD_LEN};

/// Parse payload mentah menjadi `(target, content)`.
///
/// Aturan (mengikuti perilaku `simple_strtol` + cek `*endptr` di desain
/// asli, diperketat: minimal satu digit setelah `@`):
/// - byte pertama bukan `@` → broadcast, seluruh payload jadi content
/// - `@` diikuti 1..n digit lalu spasi → private, content setelah spasi
/// - `@` diikuti 1..n digit lalu end-of-payload → private, content kosong
/// - `@` tanpa digit, atau byte non-spasi setelah digit → `InvalidFormat`
/// - payload lebih dari [`MAX_PAYLOAD_LEN`] bytes → `InvalidFormat`
#[inline]
pub fn parse(payload: &[u8]) -> Result<(Target, &[u8]), BusError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(BusError::InvalidFormat);
    }

    if payload.first() != Some(&b'@') {
        return Ok((Target::Broadcast, payload));
    }

    let rest = &payload[1..];
    let digits_end = rest
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());

    if digits_end == 0 {
        // "@" tanpa digit ("@abc ...", "@ hello", "@")
        return Err(BusError::InvalidFormat);
    }

    // Digit ASCII dijamin UTF-8 valid; overflow u32 → InvalidFormat
    let pid = std::str::from_utf8(&rest[..digits_end])
        .ok()
        .and_then(|digits| digits.parse::<Pid>().ok())
        .ok_or(BusError::InvalidFormat)?;

    match rest.get(digits_end).copied() {
        // "@123" → private dengan content kosong
        None => Ok((Target::Pid(pid), &rest[digits_end..])),
        // "@123 hello" → content setelah spasi pertama
        Some(b' ') => Ok((Target::Pid(pid), &rest[digits_end + 1..])),
        // "@123x..." → format rusak
        Some(_) => Err(BusError::InvalidFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_plain() {
        let (target, content) = parse(b"hello").unwrap();
        assert_eq!(target, Target::Broadcast);
        assert_eq!(content, b"hello");
    }

    #[test]
    fn test_private_with_content() {
        let (target, content) = parse(b"@1234 hello").unwrap();
        assert_eq!(target, Target::Pid(1234));
        assert_eq!(content, b"hello");
    }

    #[test]
    fn test_private_empty_content() {
        let (target, content) = parse(b"@77").unwrap();
        assert_eq!(target, Target::Pid(77));
        assert!(content.is_empty());
    }

    #[test]
    fn test_content_may_contain_at() {
        // '@' hanya spesial di posisi pertama
        let (target, content) = parse(b"email: x@y").unwrap();
        assert_eq!(target, Target::Broadcast);
        assert_eq!(content, b"email: x@y");
    }

    #[test]
    fn test_rejects_non_digit_after_at() {
        assert_eq!(parse(b"@abc no-space-after"), Err(BusError::InvalidFormat));
        assert_eq!(parse(b"@ hello"), Err(BusError::InvalidFormat));
        assert_eq!(parse(b"@"), Err(BusError::InvalidFormat));
    }

    #[test]
    fn test_rejects_junk_after_digits() {
        assert_eq!(parse(b"@12x hello"), Err(BusError::InvalidFormat));
    }

    #[test]
    fn test_rejects_pid_overflow() {
        assert_eq!(parse(b"@99999999999 hi"), Err(BusError::InvalidFormat));
    }

    #[test]
    fn test_rejects_oversized_payload() {
        let big = vec![b'a'; MAX_PAYLOAD_LEN + 1];
        assert_eq!(parse(&big), Err(BusError::InvalidFormat));
    }

    #[test]
    fn test_max_size_payload_accepted() {
        let exact = vec![b'a'; MAX_PAYLOAD_LEN];
        assert!(parse(&exact).is_ok());
    }
}
