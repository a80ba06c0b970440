//! Tiny blocking HTTP/1.1 media server for relay tests.
//!
//! Serves one body for every path and answers `Range: bytes=a-b` with
//! 206 Partial Content. Unsatisfiable ranges get 416.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct MediaServerOptions {
    /// Honor Range requests; otherwise always send the full body with 200.
    pub support_ranges: bool,
    /// Send `Accept-Ranges: bytes`.
    pub advertise_ranges: bool,
    /// Content-Type to send, if any.
    pub content_type: Option<&'static str>,
}

impl Default for MediaServerOptions {
    fn default() -> Self {
        Self { support_ranges: true, advertise_ranges: true, content_type: Some("video/mp4") }
    }
}

/// Serve `body` on an ephemeral loopback port; returns the media URL.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, MediaServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: MediaServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let body = Arc::new(body);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            thread::spawn(move || serve(stream, &body, opts));
        }
    });
    format!("http://127.0.0.1:{port}/media/clip_720p.mp4")
}

fn serve(mut stream: TcpStream, body: &[u8], opts: MediaServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 4096];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };

    let total = body.len() as u64;
    let range = if opts.support_ranges { requested_range(request) } else { None };

    let (status, content_range, slice) = match range {
        Some((start, end)) => {
            let end = end.min(total.saturating_sub(1));
            if start >= total || start > end {
                ("416 Range Not Satisfiable", Some(format!("bytes */{total}")), &body[0..0])
            } else {
                let slice = &body[start as usize..=end as usize];
                ("206 Partial Content", Some(format!("bytes {start}-{end}/{total}")), slice)
            }
        }
        None => ("200 OK", None, body),
    };

    let mut head = format!("HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n", slice.len());
    if let Some(content_range) = content_range {
        head.push_str(&format!("Content-Range: {content_range}\r\n"));
    }
    if opts.advertise_ranges {
        head.push_str("Accept-Ranges: bytes\r\n");
    }
    if let Some(content_type) = opts.content_type {
        head.push_str(&format!("Content-Type: {content_type}\r\n"));
    }
    head.push_str("Cache-Control: public, max-age=3600\r\n\r\n");

    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(slice);
}

/// `(start, end_inclusive)` from a `Range: bytes=a-b` header; open ends run to EOF.
fn requested_range(request: &str) -> Option<(u64, u64)> {
    request
        .lines()
        .skip(1)
        .take_while(|line| !line.trim().is_empty())
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("range"))
        .and_then(|(_, value)| value.trim().strip_prefix("bytes="))
        .and_then(|spec| spec.split_once('-'))
        .map(|(a, b)| {
            let start = a.trim().parse().unwrap_or(0);
            let end = b.trim().parse().unwrap_or(u64::MAX);
            (start, end)
        })
}
