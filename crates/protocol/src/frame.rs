//! Length-prefixed framing: an 8-byte header (4-byte big-endian length, 4-byte
//! ASCII tag padded with spaces) followed by a payload of exactly that length.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FrameError;

const HEADER_LEN: usize = 8;
const TAG_LEN: usize = 4;

/// Maximum payload size accepted on read. Generous relative to typical object
/// file sizes while still bounding a hostile/corrupt length.
pub const MAX_PAYLOAD_LEN: u32 = 512 * 1024 * 1024;

/// The wire message-type tag. Always four ASCII bytes on the wire, left-justified
/// and space-padded; only the trimmed name is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Ping,
    Pong,
    Job,
    Src,
    Hdr,
    Ok,
    Err,
    Obj,
    Quit,
}

impl Tag {
    /// The trimmed ASCII name, e.g. `"JOB"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Ping => "PING",
            Tag::Pong => "PONG",
            Tag::Job => "JOB",
            Tag::Src => "SRC",
            Tag::Hdr => "HDR",
            Tag::Ok => "OK",
            Tag::Err => "ERR",
            Tag::Obj => "OBJ",
            Tag::Quit => "QUIT",
        }
    }

    fn to_wire_bytes(self) -> [u8; TAG_LEN] {
        let mut out = [b' '; TAG_LEN];
        let bytes = self.as_str().as_bytes();
        out[..bytes.len()].copy_from_slice(bytes);
        out
    }

    fn from_trimmed(s: &str) -> Option<Tag> {
        match s {
            "PING" => Some(Tag::Ping),
            "PONG" => Some(Tag::Pong),
            "JOB" => Some(Tag::Job),
            "SRC" => Some(Tag::Src),
            "HDR" => Some(Tag::Hdr),
            "OK" => Some(Tag::Ok),
            "ERR" => Some(Tag::Err),
            "OBJ" => Some(Tag::Obj),
            "QUIT" => Some(Tag::Quit),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded frame: either a recognized [`Tag`] or an unknown one (the receiver
/// contract requires replying `ERR` and continuing, not dropping the connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameTag {
    Known(Tag),
    Unknown(String),
}

/// Write one frame: header followed by `payload`, as a single buffered write.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    tag: Tag,
    payload: &[u8],
) -> Result<(), FrameError> {
    write_frame_raw(writer, tag.to_wire_bytes(), payload).await
}

async fn write_frame_raw<W: AsyncWrite + Unpin>(
    writer: &mut W,
    tag_bytes: [u8; TAG_LEN],
    payload: &[u8],
) -> Result<(), FrameError> {
    let len: u32 = payload
        .len()
        .try_into()
        .map_err(|_| FrameError::PayloadTooLarge(payload.len()))?;

    let mut header = [0u8; HEADER_LEN];
    header[..4].copy_from_slice(&len.to_be_bytes());
    header[4..].copy_from_slice(&tag_bytes);

    writer.write_all(&header).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame in full: the 8-byte header (looping until satisfied), then
/// exactly `length` payload bytes. A short read anywhere is a fatal transport error.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<(FrameTag, Vec<u8>), FrameError> {
    let mut header = [0u8; HEADER_LEN];
    reader
        .read_exact(&mut header)
        .await
        .map_err(FrameError::from_header_io)?;

    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if len > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLarge(len as usize));
    }

    let tag_str = std::str::from_utf8(&header[4..8])
        .map_err(|_| FrameError::MalformedTag(header[4..8].to_vec()))?
        .trim_end()
        .to_string();

    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|_| FrameError::UnexpectedEof)?;

    let tag = match Tag::from_trimmed(&tag_str) {
        Some(t) => FrameTag::Known(t),
        None => FrameTag::Unknown(tag_str),
    };
    Ok((tag, payload))
}

/// Read a frame and require that it carry `expected`; any other tag (known or
/// not) is a protocol error naming what was actually seen.
pub async fn read_expected<R: AsyncRead + Unpin>(
    reader: &mut R,
    expected: Tag,
) -> Result<Vec<u8>, FrameError> {
    let (tag, payload) = read_frame(reader).await?;
    match tag {
        FrameTag::Known(t) if t == expected => Ok(payload),
        FrameTag::Known(other) => Err(FrameError::UnexpectedTag {
            expected: expected.as_str(),
            got: other.as_str().to_string(),
        }),
        FrameTag::Unknown(other) => Err(FrameError::UnexpectedTag {
            expected: expected.as_str(),
            got: other,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn round_trips_a_frame() {
        let mut buf = Vec::new();
        write_frame(&mut buf, Tag::Job, b"hello").await.unwrap();

        let mut cursor = Cursor::new(buf);
        let (tag, payload) = read_frame(&mut cursor).await.unwrap();
        assert_eq!(tag, FrameTag::Known(Tag::Job));
        assert_eq!(payload, b"hello");
    }

    #[tokio::test]
    async fn empty_payload_round_trips() {
        let mut buf = Vec::new();
        write_frame(&mut buf, Tag::Ping, b"").await.unwrap();
        let mut cursor = Cursor::new(buf);
        let (tag, payload) = read_frame(&mut cursor).await.unwrap();
        assert_eq!(tag, FrameTag::Known(Tag::Ping));
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn concatenated_frames_are_unambiguous() {
        let mut buf = Vec::new();
        write_frame(&mut buf, Tag::Job, b"{}").await.unwrap();
        write_frame(&mut buf, Tag::Src, &[0u8, 1, 2, 255]).await.unwrap();
        write_frame(&mut buf, Tag::Hdr, b"{}").await.unwrap();

        let mut cursor = Cursor::new(buf);
        let (t1, p1) = read_frame(&mut cursor).await.unwrap();
        let (t2, p2) = read_frame(&mut cursor).await.unwrap();
        let (t3, p3) = read_frame(&mut cursor).await.unwrap();

        assert_eq!(t1, FrameTag::Known(Tag::Job));
        assert_eq!(p1, b"{}");
        assert_eq!(t2, FrameTag::Known(Tag::Src));
        assert_eq!(p2, vec![0u8, 1, 2, 255]);
        assert_eq!(t3, FrameTag::Known(Tag::Hdr));
        assert_eq!(p3, b"{}");
    }

    #[tokio::test]
    async fn unknown_tag_is_preserved_trimmed() {
        let mut buf = Vec::new();
        write_frame_raw(&mut buf, *b"FOO ", b"x").await.unwrap();
        let mut cursor = Cursor::new(buf);
        let (tag, _) = read_frame(&mut cursor).await.unwrap();
        assert_eq!(tag, FrameTag::Unknown("FOO".to_string()));
    }

    #[tokio::test]
    async fn truncated_header_is_a_transport_error() {
        let buf = vec![0u8, 0, 0, 5, b'J', b'O']; // short header
        let mut cursor = Cursor::new(buf);
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, FrameError::UnexpectedEof));
    }

    #[tokio::test]
    async fn truncated_payload_is_a_transport_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&10u32.to_be_bytes());
        buf.extend_from_slice(b"OBJ ");
        buf.extend_from_slice(b"short"); // fewer than 10 bytes
        let mut cursor = Cursor::new(buf);
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, FrameError::UnexpectedEof));
    }

    #[tokio::test]
    async fn read_expected_rejects_wrong_tag() {
        let mut buf = Vec::new();
        write_frame(&mut buf, Tag::Err, b"nope").await.unwrap();
        let mut cursor = Cursor::new(buf);
        let err = read_expected(&mut cursor, Tag::Src).await.unwrap_err();
        match err {
            FrameError::UnexpectedTag { expected, got } => {
                assert_eq!(expected, "SRC");
                assert_eq!(got, "ERR");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
