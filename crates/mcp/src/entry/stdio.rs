#![forbid(unsafe_code)]

use crate::{JsonRpcRequest, McpServer, json_rpc_error};
use serde_json::Value;
use std::io::{BufRead, Write};

const MAX_CONTENT_LENGTH_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StdioMode {
    NewlineJson,
    ContentLength,
}

fn detect_mode_from_first_line(line: &str) -> Option<StdioMode> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some(StdioMode::NewlineJson);
    }

    // Content-Length headers followed by a blank line and a JSON body. Some clients send
    // Content-Type first.
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("content-length:") || lower.starts_with("content-type:") {
        return Some(StdioMode::ContentLength);
    }

    None
}

fn parse_content_length_header(line: &str) -> Option<usize> {
    let (key, value) = line.trim().split_once(':')?;
    if !key.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse::<usize>().ok()
}

/// Read the rest of a header block starting at `first_header`, then the body.
/// `Ok(None)` means the peer closed the stream mid-frame.
fn read_content_length_frame(
    reader: &mut impl BufRead,
    first_header: String,
) -> std::io::Result<Option<Vec<u8>>> {
    let mut content_length = parse_content_length_header(&first_header);
    let mut header = first_header;

    while !header.trim_end().is_empty() {
        header.clear();
        if reader.read_line(&mut header)? == 0 {
            return Ok(None);
        }
        if content_length.is_none() {
            content_length = parse_content_length_header(&header);
        }
    }

    let Some(len) = content_length else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Missing Content-Length header",
        ));
    };
    if len > MAX_CONTENT_LENGTH_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Content-Length exceeds max allowed size",
        ));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(Some(body))
}

fn write_frame(
    out: &mut impl Write,
    mode: StdioMode,
    resp: &Value,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = serde_json::to_vec(resp)?;
    match mode {
        StdioMode::NewlineJson => {
            out.write_all(&body)?;
            out.write_all(b"\n")?;
        }
        StdioMode::ContentLength => {
            write!(out, "Content-Length: {}\r\n\r\n", body.len())?;
            out.write_all(&body)?;
        }
    }
    out.flush()?;
    Ok(())
}

pub(crate) fn run_stdio(server: &mut McpServer) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    serve(server, &mut stdin.lock(), &mut stdout.lock())
}

/// Framing is detected once from the first non-blank line and kept for the whole session so
/// responses never mix styles.
fn serve(
    server: &mut McpServer,
    reader: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mode: Option<StdioMode> = None;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let current = match mode {
            Some(current) => current,
            None => match detect_mode_from_first_line(&line) {
                Some(detected) => {
                    tracing::debug!(mode = ?detected, "stdio framing detected");
                    mode = Some(detected);
                    detected
                }
                None => continue,
            },
        };

        let response = match current {
            StdioMode::NewlineJson => handle_message(server, line.trim().as_bytes()),
            StdioMode::ContentLength => {
                let Some(body) = read_content_length_frame(reader, line)? else {
                    break;
                };
                handle_message(server, &body)
            }
        };
        if let Some(response) = response {
            write_frame(out, current, &response)?;
        }
    }

    tracing::debug!("stdin closed");
    Ok(())
}

fn handle_message(server: &mut McpServer, raw: &[u8]) -> Option<Value> {
    let data: Value = match serde_json::from_slice(raw) {
        Ok(v) => v,
        Err(e) => return Some(json_rpc_error(None, -32700, &format!("Parse error: {e}"))),
    };

    let (id, has_method) = match data.as_object() {
        Some(obj) => (obj.get("id").cloned(), obj.contains_key("method")),
        None => return Some(json_rpc_error(None, -32600, "Invalid Request")),
    };
    if !has_method {
        return Some(json_rpc_error(id, -32600, "Invalid Request"));
    }

    match serde_json::from_value::<JsonRpcRequest>(data) {
        Ok(request) => server.handle(request),
        Err(e) => Some(json_rpc_error(id, -32600, &format!("Invalid Request: {e}"))),
    }
}
