use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::files::StaticFiles;
use crate::http::parser::{parse_http_request, ParseError};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    state: ConnectionState,
    files: Arc<StaticFiles>,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

/// Outcome of trying to read the next request off the socket.
enum ReadOutcome {
    Request(Request),
    /// The bytes could not be parsed; answer and close.
    Rejected(Response),
    Eof,
}

impl Connection {
    pub fn new(stream: TcpStream, files: Arc<StaticFiles>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::Reading,
            files,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    match self.read_request().await? {
                        ReadOutcome::Request(req) => {
                            self.state = ConnectionState::Processing(req);
                        }
                        ReadOutcome::Rejected(response) => {
                            let response = response.with_header("Connection", "close");
                            let writer = ResponseWriter::new(&response, true);
                            self.state = ConnectionState::Writing(writer, false);
                        }
                        ReadOutcome::Eof => {
                            self.state = ConnectionState::Closed;
                        }
                    }
                }

                ConnectionState::Processing(req) => {
                    let keep_alive = req.keep_alive();
                    let include_body = req.method != Method::HEAD;

                    let mut response = self.files.handle(req).await;
                    tracing::info!(
                        method = ?req.method,
                        path = %req.path,
                        status = response.status.as_u16(),
                        "Request served"
                    );

                    if !keep_alive {
                        response = response.with_header("Connection", "close");
                    }

                    let writer = ResponseWriter::new(&response, include_body);
                    self.state = ConnectionState::Writing(writer, keep_alive);
                }

                ConnectionState::Writing(writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if *keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    // Remove consumed bytes
                    let _ = self.buffer.split_to(consumed);
                    return Ok(ReadOutcome::Request(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(ParseError::InvalidMethod) => {
                    tracing::debug!("Unsupported request method");
                    return Ok(ReadOutcome::Rejected(Response::method_not_allowed()));
                }

                Err(ParseError::BodyTooLarge) => {
                    tracing::debug!("Request body over the size limit");
                    return Ok(ReadOutcome::Rejected(Response::payload_too_large()));
                }

                Err(e) => {
                    tracing::debug!(error = ?e, "Malformed request");
                    return Ok(ReadOutcome::Rejected(Response::bad_request()));
                }
            }

            // Read more data
            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                if !self.buffer.is_empty() {
                    tracing::debug!(pending = self.buffer.len(), "Client closed mid-request");
                }
                // Client closed connection
                return Ok(ReadOutcome::Eof);
            }
        }
    }
}
