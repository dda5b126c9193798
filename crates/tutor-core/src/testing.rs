//! Scripted hardware doubles shared by the unit tests

use alloc::collections::VecDeque;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::Cell;

pub use embassy_futures::block_on;

use crate::http::{self, HttpClient, HttpError, Response, Scheme, Transport, Url};
use crate::input::{ControllerState, Gamepad};
use crate::timer::Timer;
use crate::touch::{RawTouch, TouchPanel};

/// Returned when a scripted device runs out of input, so a test with a
/// short script fails instead of spinning forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptExhausted;

pub struct ScriptedGamepad {
    script: VecDeque<ControllerState>,
    reads: usize,
}

impl ScriptedGamepad {
    pub fn new(script: impl IntoIterator<Item = ControllerState>) -> Self {
        Self {
            script: script.into_iter().collect(),
            reads: 0,
        }
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Gamepad for ScriptedGamepad {
    type Error = ScriptExhausted;

    async fn read(&mut self) -> Result<ControllerState, Self::Error> {
        self.reads += 1;
        self.script.pop_front().ok_or(ScriptExhausted)
    }
}

/// Plays back touch samples, then reports an untouched panel
#[derive(Default)]
pub struct ScriptedTouch {
    script: VecDeque<Option<RawTouch>>,
}

impl ScriptedTouch {
    pub fn new(script: impl IntoIterator<Item = Option<RawTouch>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl TouchPanel for ScriptedTouch {
    type Error = ScriptExhausted;

    async fn read(&mut self) -> Result<Option<RawTouch>, Self::Error> {
        Ok(self.script.pop_front().flatten())
    }
}

/// Canned responses keyed by URL prefix
#[derive(Default)]
pub struct MockHttp {
    routes: Vec<(String, Result<Vec<u8>, HttpError>)>,
    requests: Vec<String>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, prefix: &str, response: Result<Vec<u8>, HttpError>) -> Self {
        self.routes.push((prefix.to_string(), response));
        self
    }

    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl HttpClient for MockHttp {
    async fn get(&mut self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.requests.push(url.to_string());
        self.routes
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or(Err(HttpError::Status(404)))
    }
}

/// Clock that advances by `tick_ms` on every read and by the full amount
/// on every delay
pub struct FakeTimer {
    now: Cell<u64>,
    tick_ms: u64,
    delays: Vec<u32>,
}

impl FakeTimer {
    pub fn new(tick_ms: u64) -> Self {
        Self {
            now: Cell::new(0),
            tick_ms,
            delays: Vec::new(),
        }
    }

    pub fn delays(&self) -> &[u32] {
        &self.delays
    }
}

impl Timer for FakeTimer {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.tick_ms);
        now
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
        self.now.set(self.now.get() + ms as u64);
    }
}

/// In-memory byte stream: hands out one scripted chunk per read and
/// records everything written
pub struct MockStream {
    chunks: VecDeque<Vec<u8>>,
    written: Vec<u8>,
}

impl MockStream {
    pub fn new<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Self {
        Self {
            chunks: chunks.into_iter().map(<[u8]>::to_vec).collect(),
            written: Vec::new(),
        }
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }
}

impl embedded_io_async::ErrorType for MockStream {
    type Error = embedded_io_async::ErrorKind;
}

impl embedded_io_async::Read for MockStream {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some(chunk) = self.chunks.front_mut() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        chunk.drain(..n);
        if chunk.is_empty() {
            self.chunks.pop_front();
        }
        Ok(n)
    }
}

impl embedded_io_async::Write for MockStream {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Connection-level double: every exchange replays the next raw HTTP
/// response through [`http::get`] and records the URL it was asked for
pub struct MockTransport {
    responses: VecDeque<Vec<u8>>,
    requests: Vec<String>,
}

impl MockTransport {
    pub fn new(responses: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            requests: Vec::new(),
        }
    }

    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl Transport for MockTransport {
    async fn exchange(&mut self, url: &Url<'_>) -> Result<Response, HttpError> {
        let scheme = match url.scheme {
            Scheme::Http => "http",
            Scheme::Https => "https",
        };
        let mut full = alloc::format!("{scheme}://{}", url.host);
        if url.port != url.scheme.default_port() {
            full.push(':');
            full.push_str(&url.port.to_string());
        }
        full.push_str(url.path);
        self.requests.push(full);

        let raw = self.responses.pop_front().ok_or(HttpError::Connect)?;
        let mut stream = MockStream::new([raw.as_slice()]);
        let mut rx = [0u8; http::HEADER_BUF_SIZE];
        http::get(&mut stream, url, &mut rx, http::DEFAULT_MAX_BODY).await
    }
}

/// I2C bus double: records every write and answers reads from a queue
#[derive(Default)]
pub struct MockI2c {
    pub writes: Vec<(u8, Vec<u8>)>,
    responses: VecDeque<Vec<u8>>,
}

impl MockI2c {
    pub fn new(responses: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            writes: Vec::new(),
            responses: responses.into_iter().collect(),
        }
    }
}

impl embedded_hal_async::i2c::ErrorType for MockI2c {
    type Error = embedded_hal_async::i2c::ErrorKind;
}

impl embedded_hal_async::i2c::I2c for MockI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [embedded_hal_async::i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        use embedded_hal_async::i2c::{ErrorKind, NoAcknowledgeSource, Operation};

        for operation in operations {
            match operation {
                Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                Operation::Read(buf) => {
                    let response = self
                        .responses
                        .pop_front()
                        .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data))?;
                    let n = response.len().min(buf.len());
                    buf[..n].copy_from_slice(&response[..n]);
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct NoopDelay;

impl embedded_hal_async::delay::DelayNs for NoopDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}
