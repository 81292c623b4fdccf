/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
use std::net::SocketAddr;

use anyhow::{Context, anyhow};
use http::uri::PathAndQuery;
use http::{HeaderMap, HeaderValue, header};
use log::debug;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::PointsWriter;
use crate::batch::BatchPoints;
use crate::precision::TimestampPrecision;

mod config;
pub use config::HttpWriterConfig;

mod version;
pub use version::ApiVersion;

mod response;
use response::HttpWriteResponse;
pub use response::HttpResponseError;

/// Write batches to InfluxDB through its HTTP line protocol API.
///
/// A single keep-alive connection is reused between writes when the server allows it.
pub struct HttpPointsWriter {
    config: HttpWriterConfig,
    peer: String,
    api_path: PathAndQuery,
    static_headers: HeaderMap,
    connection: Option<BufReader<TcpStream>>,
    header_buf: Vec<u8>,
    body_buf: Vec<u8>,
}

impl HttpPointsWriter {
    pub fn new(config: HttpWriterConfig) -> anyhow::Result<Self> {
        config.check()?;
        let api_path = config.build_api_path()?;

        let mut static_headers = HeaderMap::new();
        static_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        static_headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(v) = config.build_auth_header()? {
            static_headers.insert(header::AUTHORIZATION, v);
        }

        Ok(HttpPointsWriter {
            peer: config.peer(),
            config,
            api_path,
            static_headers,
            connection: None,
            header_buf: Vec::with_capacity(512),
            body_buf: Vec::with_capacity(4096),
        })
    }

    async fn connect(&self) -> anyhow::Result<TcpStream> {
        let peers: Vec<SocketAddr> = tokio::net::lookup_host(&self.peer)
            .await
            .map_err(|e| anyhow!("failed to resolve {}: {e}", self.peer))?
            .collect();
        let Some(peer) = fastrand::choice(&peers).copied() else {
            return Err(anyhow!("no address found for {}", self.peer));
        };

        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(peer))
            .await
            .map_err(|_| anyhow!("timed out connecting to {peer}"))?
            .map_err(|e| anyhow!("failed to connect to {peer}: {e}"))?;
        let _ = stream.set_nodelay(true);
        debug!("influxdb writer: connected to {peer}");
        Ok(stream)
    }

    fn write_header(&mut self, content_length: usize) {
        self.header_buf.clear();
        self.header_buf.extend_from_slice(b"POST ");
        self.header_buf
            .extend_from_slice(self.api_path.as_str().as_bytes());
        self.header_buf.extend_from_slice(b" HTTP/1.1\r\n");
        let _ = write!(&mut self.header_buf, "Host: {}\r\n", self.peer);
        self.header_buf
            .extend_from_slice(b"Connection: keep-alive\r\n");
        for (name, value) in &self.static_headers {
            self.header_buf.extend_from_slice(name.as_str().as_bytes());
            self.header_buf.extend_from_slice(b": ");
            self.header_buf.extend_from_slice(value.as_bytes());
            self.header_buf.extend_from_slice(b"\r\n");
        }
        let _ = write!(
            &mut self.header_buf,
            "Content-Length: {content_length}\r\n\r\n"
        );
    }

    async fn send_request<S>(
        &self,
        stream: &mut S,
    ) -> anyhow::Result<(HttpWriteResponse, Vec<u8>)>
    where
        S: AsyncBufRead + AsyncWrite + Unpin,
    {
        stream
            .write_all(&self.header_buf)
            .await
            .map_err(|e| anyhow!("failed to send request header: {e}"))?;
        stream
            .write_all(&self.body_buf)
            .await
            .map_err(|e| anyhow!("failed to send request body: {e}"))?;
        stream
            .flush()
            .await
            .map_err(|e| anyhow!("failed to flush request: {e}"))?;

        let mut rsp = HttpWriteResponse::parse(stream, self.config.rsp_header_max_size)
            .await
            .context("failed to read response header")?;
        let body = rsp
            .read_body(stream, self.config.rsp_body_max_size)
            .await
            .context("failed to read response body")?;
        Ok((rsp, body))
    }

    async fn take_connection(&mut self) -> anyhow::Result<BufReader<TcpStream>> {
        if let Some(conn) = self.connection.take()
            && is_reusable(&conn)
        {
            return Ok(conn);
        }
        let stream = self.connect().await?;
        Ok(BufReader::new(stream))
    }
}

/// Check that an idle connection hasn't been closed by the server.
fn is_reusable(conn: &BufReader<TcpStream>) -> bool {
    if !conn.buffer().is_empty() {
        return false;
    }
    let mut buf = [0u8; 1];
    match conn.get_ref().try_read(&mut buf) {
        Ok(_) => false,
        Err(e) => e.kind() == io::ErrorKind::WouldBlock,
    }
}

impl PointsWriter for HttpPointsWriter {
    fn new_batch(&self, precision: TimestampPrecision) -> anyhow::Result<BatchPoints> {
        if precision != self.config.precision() {
            return Err(anyhow!(
                "precision {precision} doesn't match the api precision {}",
                self.config.precision()
            ));
        }
        Ok(BatchPoints::new(precision))
    }

    async fn write(&mut self, batch: &BatchPoints) -> anyhow::Result<()> {
        self.body_buf.clear();
        batch.encode_line_protocol(&mut self.body_buf);
        self.write_header(self.body_buf.len());

        let mut conn = self.take_connection().await?;
        let (rsp, body) = self.send_request(&mut conn).await?;
        if rsp.keep_alive {
            self.connection = Some(conn);
        }
        rsp.check(&body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Arc;

    use chrono::DateTime;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt};
    use tokio::net::TcpListener;

    use crate::point::{DataPoint, FieldValue};
    use crate::tag::TagMap;

    async fn read_request<R>(reader: &mut R) -> Option<(String, Vec<u8>)>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.ok()? == 0 {
                return None;
            }
            if line == "\r\n" {
                break;
            }
            if let Some(v) = line.strip_prefix("Content-Length: ") {
                content_length = usize::from_str(v.trim()).ok()?;
            }
            head.push_str(&line);
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).await.ok()?;
        Some((head, body))
    }

    fn batch() -> BatchPoints {
        let time = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut batch = BatchPoints::new(TimestampPrecision::Seconds);
        let p = DataPoint::with_field(
            Arc::from("app"),
            Arc::new(TagMap::from_iter([("host", "h1")])),
            "requests",
            FieldValue::Integer(7),
            time,
        )
        .unwrap();
        batch.add_point(p);
        batch
    }

    #[tokio::test]
    async fn write_keep_alive() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut stream = BufReader::new(stream);

            let (head, body) = read_request(&mut stream).await.unwrap();
            assert!(
                head.starts_with("POST /api/v2/write?bucket=metrics&precision=s HTTP/1.1\r\n")
            );
            assert!(head.contains("authorization: Token t0k3n\r\n"));
            assert_eq!(body.as_slice(), b"app,host=h1 requests=7i 1700000000\n");
            stream
                .write_all(b"HTTP/1.1 204 No Content\r\n\r\n")
                .await
                .unwrap();

            // the second request comes on the same connection
            let (_, body) = read_request(&mut stream).await.unwrap();
            assert!(body.is_empty());
            stream
                .write_all(
                    b"HTTP/1.1 400 Bad Request\r\n\
                      Content-Length: 15\r\n\
                      Connection: close\r\n\r\n\
                      unable to parse",
                )
                .await
                .unwrap();
        });

        let mut config = HttpWriterConfig::new("127.0.0.1", port, "metrics");
        config.set_api_token("t0k3n");
        let mut writer = HttpPointsWriter::new(config).unwrap();

        writer.write(&batch()).await.unwrap();
        assert!(writer.connection.is_some());

        let empty = writer.new_batch(TimestampPrecision::Seconds).unwrap();
        let e = writer.write(&empty).await.unwrap_err();
        assert_eq!(
            e.to_string(),
            "error response: 400 Bad Request unable to parse"
        );
        assert!(writer.connection.is_none());

        server.await.unwrap();
    }

    #[tokio::test]
    async fn connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = HttpWriterConfig::new("127.0.0.1", port, "metrics");
        let mut writer = HttpPointsWriter::new(config).unwrap();
        assert!(writer.write(&batch()).await.is_err());
    }

    #[test]
    fn precision_mismatch() {
        let mut config = HttpWriterConfig::new("127.0.0.1", 8086, "metrics");
        config.set_precision(TimestampPrecision::MilliSeconds);
        let writer = HttpPointsWriter::new(config).unwrap();
        assert!(writer.new_batch(TimestampPrecision::Seconds).is_err());
        assert!(writer.new_batch(TimestampPrecision::MilliSeconds).is_ok());
    }

    #[test]
    fn invalid_config() {
        let config = HttpWriterConfig::new("", 8086, "metrics");
        assert!(HttpPointsWriter::new(config).is_err());
    }
}
