//! Memcached text protocol.
//!
//! Commands are encoded into a `BytesMut`; replies are decoded from the
//! bytes read so far, with [`CacheError::Incomplete`] signalling that more
//! input is needed.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{BufMut, BytesMut};

use crate::error::{CacheError, Result};

/// Longest key the server accepts.
pub const MAX_KEY_LEN: usize = 250;

/// Expiration times above this many seconds are read as unix timestamps.
const MAX_RELATIVE_EXPTIME: u64 = 60 * 60 * 24 * 30;

/// Storage verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Store unconditionally.
    Set,
    /// Store only if the key does not exist.
    Add,
}

impl StoreMode {
    const fn verb(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Add => "add",
        }
    }
}

/// A request to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Store {
        mode: StoreMode,
        key: &'a str,
        exptime: u64,
        data: &'a [u8],
    },
    Get {
        key: &'a str,
    },
    Delete {
        key: &'a str,
    },
    FlushAll {
        delay: Option<u64>,
    },
}

impl Command<'_> {
    /// Name of the command, for logs and error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Store { mode, .. } => mode.verb(),
            Self::Get { .. } => "get",
            Self::Delete { .. } => "delete",
            Self::FlushAll { .. } => "flush_all",
        }
    }
}

/// One item of a `VALUE` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub key: String,
    pub flags: u32,
    pub data: Vec<u8>,
}

/// A server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Stored,
    NotStored,
    Exists,
    NotFound,
    Deleted,
    Ok,
    /// Items returned by `get`, empty on a miss.
    Values(Vec<Item>),
    /// Unknown command.
    Error,
    ClientError(String),
    ServerError(String),
}

/// Checks that `key` can be sent on the wire.
///
/// # Errors
///
/// Returns [`CacheError::InvalidKey`] for empty or over-long keys and keys
/// with whitespace or control characters.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.chars().any(|c| c.is_whitespace() || c.is_control());
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidKey(key.to_string()))
    }
}

/// Converts a time-to-live into the protocol's expiration field.
///
/// `None` and zero mean "never expire". Sub-second remainders round up, and
/// lifetimes over thirty days are sent as absolute unix timestamps.
#[must_use]
pub fn exptime(ttl: Option<Duration>) -> u64 {
    let Some(ttl) = ttl.filter(|ttl| !ttl.is_zero()) else {
        return 0;
    };
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    if secs <= MAX_RELATIVE_EXPTIME {
        return secs;
    }
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |since| since.as_secs());
    now + secs
}

/// Appends the wire form of `command` to `buf`.
pub fn encode(command: &Command<'_>, buf: &mut BytesMut) {
    match command {
        Command::Store {
            mode,
            key,
            exptime,
            data,
        } => {
            put_line(buf, &format!("{} {key} 0 {exptime} {}", mode.verb(), data.len()));
            buf.put_slice(data);
            buf.put_slice(b"\r\n");
        }
        Command::Get { key } => put_line(buf, &format!("get {key}")),
        Command::Delete { key } => put_line(buf, &format!("delete {key}")),
        Command::FlushAll { delay: None } => put_line(buf, "flush_all"),
        Command::FlushAll { delay: Some(delay) } => put_line(buf, &format!("flush_all {delay}")),
    }
}

fn put_line(buf: &mut BytesMut, line: &str) {
    buf.reserve(line.len() + 2);
    buf.put_slice(line.as_bytes());
    buf.put_slice(b"\r\n");
}

/// Decodes one reply from the front of `buf`.
///
/// Returns the reply and the number of bytes it occupied.
///
/// # Errors
///
/// [`CacheError::Incomplete`] when `buf` ends mid-reply, and
/// [`CacheError::Protocol`] for anything that is not a valid reply.
pub fn decode(buf: &[u8]) -> Result<(Reply, usize)> {
    let (line, mut pos) = read_line(buf, 0)?;
    let reply = match line {
        "STORED" => Reply::Stored,
        "NOT_STORED" => Reply::NotStored,
        "EXISTS" => Reply::Exists,
        "NOT_FOUND" => Reply::NotFound,
        "DELETED" => Reply::Deleted,
        "OK" => Reply::Ok,
        "ERROR" => Reply::Error,
        "END" => Reply::Values(Vec::new()),
        _ => {
            if let Some(message) = line.strip_prefix("CLIENT_ERROR") {
                Reply::ClientError(message.trim().to_string())
            } else if let Some(message) = line.strip_prefix("SERVER_ERROR") {
                Reply::ServerError(message.trim().to_string())
            } else if line.starts_with("VALUE ") {
                let mut items = Vec::new();
                let mut header = line;
                loop {
                    let (item, next) = read_item(buf, header, pos)?;
                    items.push(item);
                    let (line, after) = read_line(buf, next)?;
                    pos = after;
                    match line {
                        "END" => break,
                        _ if line.starts_with("VALUE ") => header = line,
                        _ => return Err(unexpected(line)),
                    }
                }
                Reply::Values(items)
            } else {
                return Err(unexpected(line));
            }
        }
    };
    Ok((reply, pos))
}

/// Reads the line starting at `start`, returning it without `\r\n` and the
/// position just past it.
fn read_line(buf: &[u8], start: usize) -> Result<(&str, usize)> {
    let rest = &buf[start..];
    let end = rest
        .windows(2)
        .position(|window| window == b"\r\n")
        .ok_or(CacheError::Incomplete)?;
    let line = std::str::from_utf8(&rest[..end])
        .map_err(|_| CacheError::Protocol(String::from("reply line is not valid UTF-8")))?;
    Ok((line, start + end + 2))
}

/// Reads the data block announced by `header` (`VALUE <key> <flags> <bytes> [<cas>]`).
fn read_item(buf: &[u8], header: &str, start: usize) -> Result<(Item, usize)> {
    let mut parts = header.split_ascii_whitespace().skip(1);
    let (Some(key), Some(flags), Some(len)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(unexpected(header));
    };
    let flags: u32 = flags.parse().map_err(|_| unexpected(header))?;
    let len: usize = len.parse().map_err(|_| unexpected(header))?;

    let end = start + len;
    if buf.len() < end + 2 {
        return Err(CacheError::Incomplete);
    }
    if &buf[end..end + 2] != b"\r\n" {
        return Err(CacheError::Protocol(format!(
            "data block for '{key}' is not terminated"
        )));
    }
    let item = Item {
        key: key.to_string(),
        flags,
        data: buf[start..end].to_vec(),
    };
    Ok((item, end + 2))
}

fn unexpected(line: &str) -> CacheError {
    CacheError::Protocol(format!("unexpected reply line: {line}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(command: &Command<'_>) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode(command, &mut buf);
        buf.to_vec()
    }

    #[test]
    fn test_encode_store() {
        let command = Command::Store {
            mode: StoreMode::Add,
            key: "app:user",
            exptime: 60,
            data: b"bob",
        };
        assert_eq!(encoded(&command), b"add app:user 0 60 3\r\nbob\r\n");
    }

    #[test]
    fn test_encode_flush() {
        assert_eq!(encoded(&Command::FlushAll { delay: None }), b"flush_all\r\n");
        assert_eq!(
            encoded(&Command::FlushAll { delay: Some(10) }),
            b"flush_all 10\r\n"
        );
    }

    #[test]
    fn test_decode_simple_replies() {
        assert_eq!(decode(b"STORED\r\n").unwrap(), (Reply::Stored, 8));
        assert_eq!(decode(b"NOT_FOUND\r\nextra").unwrap(), (Reply::NotFound, 11));
        assert_eq!(
            decode(b"SERVER_ERROR out of memory\r\n").unwrap().0,
            Reply::ServerError(String::from("out of memory"))
        );
        assert_eq!(decode(b"END\r\n").unwrap().0, Reply::Values(Vec::new()));
    }

    #[test]
    fn test_decode_values() {
        let buf = b"VALUE a 0 2\r\nhi\r\nVALUE b 5 0 99\r\n\r\nEND\r\n";
        let (reply, consumed) = decode(buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(
            reply,
            Reply::Values(vec![
                Item {
                    key: String::from("a"),
                    flags: 0,
                    data: b"hi".to_vec(),
                },
                Item {
                    key: String::from("b"),
                    flags: 5,
                    data: Vec::new(),
                },
            ])
        );
    }

    #[test]
    fn test_decode_data_may_contain_crlf() {
        let (reply, _) = decode(b"VALUE k 0 4\r\n\r\n\r\n\r\nEND\r\n").unwrap();
        assert_eq!(
            reply,
            Reply::Values(vec![Item {
                key: String::from("k"),
                flags: 0,
                data: b"\r\n\r\n".to_vec(),
            }])
        );
    }

    #[test]
    fn test_decode_incomplete() {
        for partial in [
            &b"STOR"[..],
            b"VALUE a 0 5\r\nhel",
            b"VALUE a 0 2\r\nhi\r\n",
            b"VALUE a 0 2\r\nhi\r\nEN",
        ] {
            assert!(matches!(decode(partial), Err(CacheError::Incomplete)));
        }
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode(b"HELLO\r\n"), Err(CacheError::Protocol(_))));
        assert!(matches!(
            decode(b"VALUE a x 2\r\nhi\r\nEND\r\n"),
            Err(CacheError::Protocol(_))
        ));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("app:user:1").is_ok());
        assert!(validate_key(&"k".repeat(MAX_KEY_LEN)).is_ok());
        for bad in ["", "has space", "tab\there", "nl\n", "bell\u{7}"] {
            assert!(matches!(validate_key(bad), Err(CacheError::InvalidKey(_))));
        }
        assert!(validate_key(&"k".repeat(MAX_KEY_LEN + 1)).is_err());
    }

    #[test]
    fn test_exptime() {
        assert_eq!(exptime(None), 0);
        assert_eq!(exptime(Some(Duration::ZERO)), 0);
        assert_eq!(exptime(Some(Duration::from_secs(60))), 60);
        assert_eq!(exptime(Some(Duration::from_millis(1500))), 2);
        let absolute = exptime(Some(Duration::from_secs(MAX_RELATIVE_EXPTIME + 1)));
        assert!(absolute > MAX_RELATIVE_EXPTIME * 10);
    }
}
