//! Wire protocol for the distributed compile service: an 8-byte framed header
//! plus JSON/binary payloads, shared verbatim by the dispatcher and the worker
//! daemon so the two can be reimplemented independently and stay interoperable.

mod error;
mod frame;
mod messages;

pub use error::FrameError;
pub use frame::{read_expected, read_frame, write_frame, FrameTag, Tag, MAX_PAYLOAD_LEN};
pub use messages::{decode_headers, encode_headers, JobFailure, JobRequest, JobSuccess, SystemInfo};
