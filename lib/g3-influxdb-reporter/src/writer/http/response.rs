/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::str::FromStr;

use http::StatusCode;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

#[derive(Debug, Error)]
pub enum HttpResponseError {
    #[error("read failed: {0:?}")]
    ReadFailed(#[from] io::Error),
    #[error("connection closed by peer")]
    ClosedByPeer,
    #[error("response header too large")]
    HeaderTooLarge,
    #[error("invalid status line")]
    InvalidStatusLine,
    #[error("invalid header line")]
    InvalidHeaderLine,
    #[error("invalid content length")]
    InvalidContentLength,
    #[error("error response: {0} {1}")]
    ErrorStatus(StatusCode, String),
}

pub(super) struct HttpWriteResponse {
    pub(super) code: StatusCode,
    pub(super) keep_alive: bool,
    content_length: Option<u64>,
    chunked: bool,
}

impl HttpWriteResponse {
    pub(super) async fn parse<R>(
        reader: &mut R,
        max_header_size: usize,
    ) -> Result<Self, HttpResponseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line_buf = Vec::with_capacity(256);
        let mut header_size = 0;

        let line = read_line(reader, &mut line_buf, &mut header_size, max_header_size).await?;
        let mut rsp = HttpWriteResponse::parse_status_line(line)?;

        loop {
            let line =
                read_line(reader, &mut line_buf, &mut header_size, max_header_size).await?;
            if line.is_empty() {
                break;
            }
            rsp.parse_header_line(line)?;
        }
        Ok(rsp)
    }

    fn parse_status_line(line: &[u8]) -> Result<Self, HttpResponseError> {
        let line = std::str::from_utf8(line).map_err(|_| HttpResponseError::InvalidStatusLine)?;
        let mut parts = line.splitn(3, ' ');
        let version = parts.next().ok_or(HttpResponseError::InvalidStatusLine)?;
        let keep_alive = match version {
            "HTTP/1.1" => true,
            "HTTP/1.0" => false,
            _ => return Err(HttpResponseError::InvalidStatusLine),
        };
        let code = parts.next().ok_or(HttpResponseError::InvalidStatusLine)?;
        let code =
            StatusCode::from_str(code).map_err(|_| HttpResponseError::InvalidStatusLine)?;
        Ok(HttpWriteResponse {
            code,
            keep_alive,
            content_length: None,
            chunked: false,
        })
    }

    fn parse_header_line(&mut self, line: &[u8]) -> Result<(), HttpResponseError> {
        let Some(p) = memchr::memchr(b':', line) else {
            return Err(HttpResponseError::InvalidHeaderLine);
        };
        let name = std::str::from_utf8(&line[..p])
            .map_err(|_| HttpResponseError::InvalidHeaderLine)?
            .trim();
        let value = std::str::from_utf8(&line[p + 1..])
            .map_err(|_| HttpResponseError::InvalidHeaderLine)?
            .trim();

        if name.eq_ignore_ascii_case("content-length") {
            let len =
                u64::from_str(value).map_err(|_| HttpResponseError::InvalidContentLength)?;
            self.content_length = Some(len);
        } else if name.eq_ignore_ascii_case("connection") {
            for v in value.split(',') {
                let v = v.trim();
                if v.eq_ignore_ascii_case("close") {
                    self.keep_alive = false;
                } else if v.eq_ignore_ascii_case("keep-alive") {
                    self.keep_alive = true;
                }
            }
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            self.chunked = value
                .split(',')
                .any(|v| v.trim().eq_ignore_ascii_case("chunked"));
        }
        Ok(())
    }

    /// Read the body if it has a known size not larger than `max_size`.
    ///
    /// The connection can't be reused if the body is skipped.
    pub(super) async fn read_body<R>(
        &mut self,
        reader: &mut R,
        max_size: usize,
    ) -> Result<Vec<u8>, HttpResponseError>
    where
        R: AsyncBufRead + Unpin,
    {
        if self.code == StatusCode::NO_CONTENT || self.code == StatusCode::NOT_MODIFIED {
            return Ok(Vec::new());
        }
        if self.chunked {
            self.keep_alive = false;
            return Ok(Vec::new());
        }
        match self.content_length {
            Some(0) => Ok(Vec::new()),
            Some(len) if len <= max_size as u64 => {
                let mut body = vec![0u8; len as usize];
                reader.read_exact(&mut body).await?;
                Ok(body)
            }
            _ => {
                self.keep_alive = false;
                Ok(Vec::new())
            }
        }
    }

    pub(super) fn check(&self, body: &[u8]) -> Result<(), HttpResponseError> {
        if self.code == StatusCode::OK || self.code == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let detail = std::str::from_utf8(body).unwrap_or_default().trim();
        Err(HttpResponseError::ErrorStatus(self.code, detail.to_string()))
    }
}

async fn read_line<'a, R>(
    reader: &mut R,
    buf: &'a mut Vec<u8>,
    header_size: &mut usize,
    max_header_size: usize,
) -> Result<&'a [u8], HttpResponseError>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let limit = max_header_size.saturating_sub(*header_size) as u64;
    let nr = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if nr == 0 {
        return if limit == 0 {
            Err(HttpResponseError::HeaderTooLarge)
        } else {
            Err(HttpResponseError::ClosedByPeer)
        };
    }
    if buf.last() != Some(&b'\n') {
        return if nr as u64 >= limit {
            Err(HttpResponseError::HeaderTooLarge)
        } else {
            Err(HttpResponseError::ClosedByPeer)
        };
    }
    *header_size += nr;

    let mut line = &buf[..nr - 1];
    if let Some(stripped) = line.strip_suffix(b"\r") {
        line = stripped;
    }
    Ok(line)
}
