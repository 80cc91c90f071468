//! Per-connection handler loop: read a frame, dispatch on tag, repeat until
//! `QUIT` or any I/O error, which silently ends the connection.

use std::collections::BTreeMap;
use std::sync::Arc;

use distcc_core::CompilerSpec;
use distcc_protocol::{read_frame, write_frame, FrameTag, Tag};
use tokio::net::TcpStream;

use crate::job::handle_job;
use crate::system_info;

pub async fn handle_connection(mut stream: TcpStream, compilers: Arc<BTreeMap<String, CompilerSpec>>) {
    loop {
        let (tag, payload) = match read_frame(&mut stream).await {
            Ok(v) => v,
            Err(_) => return,
        };

        match tag {
            FrameTag::Known(Tag::Ping) => {
                let info = system_info::gather();
                let Ok(encoded) = serde_json::to_vec(&info) else {
                    return;
                };
                if write_frame(&mut stream, Tag::Pong, &encoded).await.is_err() {
                    return;
                }
            }
            FrameTag::Known(Tag::Job) => {
                if handle_job(&mut stream, &payload, &compilers).await.is_err() {
                    return;
                }
            }
            FrameTag::Known(Tag::Quit) => return,
            FrameTag::Known(other) => {
                let msg = format!("unexpected message type: {other}");
                if write_frame(&mut stream, Tag::Err, msg.as_bytes()).await.is_err() {
                    return;
                }
            }
            FrameTag::Unknown(name) => {
                let msg = format!("unknown message type: {name}");
                if write_frame(&mut stream, Tag::Err, msg.as_bytes()).await.is_err() {
                    return;
                }
            }
        }
    }
}
