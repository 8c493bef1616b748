//! Timed streaming responses.
//!
//! # Responsibilities
//! - Describe a stream as a pure [`StreamPlan`]
//! - Write one line at a time, flushing each line to the client
//! - Stop as soon as the client goes away
//!
//! # Design Decisions
//! - Flushing is a capability of the sink, checked once before the first write
//! - The emitter runs in its own task; the response body is fed by a channel
//! - A failed write ends the loop; there is no retry

use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures_util::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;

/// Frames buffered between the emitter task and the connection.
const CHANNEL_CAPACITY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("expected response writer to support flushing")]
    FlushUnsupported,

    #[error("client disconnected")]
    Disconnected,
}

/// Everything that determines a stream's output.
#[derive(Debug, Clone, Copy)]
pub struct StreamPlan {
    pub line_count: usize,
    pub interval: Duration,
    pub formatter: fn(usize) -> String,
}

impl StreamPlan {
    /// 15 numbered lines with Fizz/Buzz markers, 300ms apart.
    pub fn fizzbuzz() -> Self {
        Self {
            line_count: 15,
            interval: Duration::from_millis(300),
            formatter: fizzbuzz_line,
        }
    }

    /// 7 plain counter lines, 600ms apart.
    pub fn counter() -> Self {
        Self {
            line_count: 7,
            interval: Duration::from_millis(600),
            formatter: counter_line,
        }
    }

    /// Time spent sleeping over the whole stream.
    pub fn total_duration(&self) -> Duration {
        self.interval * self.line_count as u32
    }

    /// Duration of the slowest built-in plan. The write timeout must exceed it.
    pub fn longest_duration() -> Duration {
        [Self::fizzbuzz(), Self::counter()]
            .iter()
            .map(StreamPlan::total_duration)
            .max()
            .unwrap_or_default()
    }
}

/// `#003 Fizz`, `#005 Buzz`, `#015 FizzBuzz`, `#007`.
pub fn fizzbuzz_line(index: usize) -> String {
    let mut line = format!("#{:03} ", index);
    if index % 3 == 0 {
        line.push_str("Fizz");
    }
    if index % 5 == 0 {
        line.push_str("Buzz");
    }
    format!("{}\n", line.trim())
}

pub fn counter_line(index: usize) -> String {
    format!("{}\n", index)
}

/// A response body that can be written and flushed incrementally.
pub trait StreamSink: Send {
    /// Whether [`StreamSink::flush`] actually delivers data to the client.
    fn can_flush(&self) -> bool {
        true
    }

    fn write(&mut self, chunk: &[u8]) -> impl Future<Output = Result<(), StreamError>> + Send;

    fn flush(&mut self) -> impl Future<Output = Result<(), StreamError>> + Send;
}

pub fn ensure_flushable<S: StreamSink>(sink: &S) -> Result<(), StreamError> {
    if sink.can_flush() {
        Ok(())
    } else {
        Err(StreamError::FlushUnsupported)
    }
}

/// Write every line of `plan`, flushing after each and sleeping in between.
pub async fn emit<S: StreamSink>(sink: &mut S, plan: &StreamPlan) -> Result<(), StreamError> {
    ensure_flushable(sink)?;

    for index in 1..=plan.line_count {
        let line = (plan.formatter)(index);
        sink.write(line.as_bytes()).await?;
        sink.flush().await?;
        tokio::time::sleep(plan.interval).await;
    }

    Ok(())
}

/// Sink feeding an HTTP response body. Writes are buffered; each flush
/// becomes one body frame.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<Bytes>,
    buffer: Vec<u8>,
}

impl ChannelSink {
    /// Create a sink and the body it feeds.
    pub fn open() -> (Self, Body) {
        let (tx, rx) = mpsc::channel::<Bytes>(CHANNEL_CAPACITY);
        let sink = Self {
            tx,
            buffer: Vec::new(),
        };
        (sink, Body::from_stream(frames(rx)))
    }
}

/// Body frames in send order. Fused: body wrappers such as the gzip encoder
/// poll again after the end and must keep seeing `None`.
fn frames(rx: mpsc::Receiver<Bytes>) -> impl Stream<Item = Result<Bytes, Infallible>> + Send {
    futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|frame| (Ok::<_, Infallible>(frame), rx))
    })
    .fuse()
}

impl StreamSink for ChannelSink {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        if self.tx.is_closed() {
            return Err(StreamError::Disconnected);
        }
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), StreamError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let frame = Bytes::from(std::mem::take(&mut self.buffer));
        self.tx
            .send(frame)
            .await
            .map_err(|_| StreamError::Disconnected)
    }
}

/// Start streaming `plan` in a background task and return the response
/// carrying it.
pub fn stream_response(plan: StreamPlan) -> Result<Response, StreamError> {
    let (mut sink, body) = ChannelSink::open();
    ensure_flushable(&sink)?;

    tokio::spawn(async move {
        match emit(&mut sink, &plan).await {
            Ok(()) => tracing::debug!(lines = plan.line_count, "Stream complete"),
            Err(e) => tracing::debug!(error = %e, "Stream ended early"),
        }
    });

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    /// Records lines as they are flushed.
    #[derive(Default)]
    struct RecordingSink {
        pending: Vec<u8>,
        flushed: Vec<String>,
        writes: usize,
        flushes: usize,
        fail_on_write: Option<usize>,
        no_flush: bool,
    }

    impl StreamSink for RecordingSink {
        fn can_flush(&self) -> bool {
            !self.no_flush
        }

        async fn write(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
            if self.fail_on_write == Some(self.writes + 1) {
                return Err(StreamError::Disconnected);
            }
            self.writes += 1;
            self.pending.extend_from_slice(chunk);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), StreamError> {
            self.flushes += 1;
            let chunk = String::from_utf8(std::mem::take(&mut self.pending)).unwrap();
            self.flushed.push(chunk);
            Ok(())
        }
    }

    #[test]
    fn test_fizzbuzz_lines() {
        assert_eq!(fizzbuzz_line(1), "#001\n");
        assert_eq!(fizzbuzz_line(3), "#003 Fizz\n");
        assert_eq!(fizzbuzz_line(5), "#005 Buzz\n");
        assert_eq!(fizzbuzz_line(15), "#015 FizzBuzz\n");
    }

    #[test]
    fn test_longest_duration() {
        assert_eq!(StreamPlan::fizzbuzz().total_duration(), Duration::from_millis(4_500));
        assert_eq!(StreamPlan::counter().total_duration(), Duration::from_millis(4_200));
        assert_eq!(StreamPlan::longest_duration(), Duration::from_millis(4_500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fizzbuzz_flushes_every_line() {
        let mut sink = RecordingSink::default();
        let plan = StreamPlan::fizzbuzz();

        let started = Instant::now();
        emit(&mut sink, &plan).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(sink.flushed.len(), 15);
        assert_eq!(sink.flushes, 15);
        assert_eq!(sink.flushed[2], "#003 Fizz\n");
        assert_eq!(sink.flushed[14], "#015 FizzBuzz\n");
        assert!(elapsed >= Duration::from_millis(4_500));
        assert!(elapsed < Duration::from_millis(4_600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_write_failure() {
        let mut sink = RecordingSink {
            fail_on_write: Some(4),
            ..Default::default()
        };

        let started = Instant::now();
        let result = emit(&mut sink, &StreamPlan::fizzbuzz()).await;

        assert_eq!(result, Err(StreamError::Disconnected));
        assert_eq!(sink.flushed.len(), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(900));
        assert!(elapsed < Duration::from_millis(1_000));
    }

    #[tokio::test]
    async fn test_unflushable_sink_writes_nothing() {
        let mut sink = RecordingSink {
            no_flush: true,
            ..Default::default()
        };

        let result = emit(&mut sink, &StreamPlan::counter()).await;

        assert_eq!(result, Err(StreamError::FlushUnsupported));
        assert_eq!(sink.writes, 0);
        assert_eq!(sink.flushes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_sink_feeds_body() {
        let (mut sink, body) = ChannelSink::open();
        let task = tokio::spawn(async move { emit(&mut sink, &StreamPlan::counter()).await });

        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"1\n2\n3\n4\n5\n6\n7\n");
        assert_eq!(task.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn test_frames_end_stays_ended() {
        let (tx, rx) = mpsc::channel::<Bytes>(CHANNEL_CAPACITY);
        let mut frames = Box::pin(frames(rx));

        tx.send(Bytes::from_static(b"1\n")).await.unwrap();
        drop(tx);

        assert_eq!(frames.next().await, Some(Ok(Bytes::from_static(b"1\n"))));
        assert_eq!(frames.next().await, None);
        assert_eq!(frames.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_compressed_stream_body_completes() {
        use axum::routing::get;
        use axum::Router;
        use tower::ServiceExt;
        use tower_http::compression::CompressionLayer;

        let router = Router::new()
            .route(
                "/counter",
                get(|| async { stream_response(StreamPlan::counter()).map_err(|e| e.to_string()) }),
            )
            .layer(CompressionLayer::new());
        let request = axum::http::Request::get("/counter")
            .header(header::ACCEPT_ENCODING, "gzip")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        // gzip member: magic header and a complete 8-byte trailer
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        let trailer = &bytes[bytes.len() - 4..];
        let size = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        assert_eq!(size as usize, b"1\n2\n3\n4\n5\n6\n7\n".len());
    }

    #[tokio::test]
    async fn test_channel_sink_detects_dropped_body() {
        let (mut sink, body) = ChannelSink::open();
        drop(body);

        assert_eq!(sink.write(b"x").await, Err(StreamError::Disconnected));
    }
}
