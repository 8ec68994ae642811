use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use std::fmt::Display;
use std::pin::Pin;

use super::buffering::LineBuffer;
use crate::error::{LlmError, Result};
use crate::streaming::{ChatStreamChunk, DeltaFragment};

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_MARKER: &str = "[DONE]";

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<DeltaFragment>> + Send>>;

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;
type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatStreamChunk>> + Send>>;

/// Upstream ingestion adapter
///
/// Both variants feed the same delta extraction, so the relay never needs to
/// know which shape the provider produced.
pub enum FrameSource {
    /// Raw `data: <json>` line framing over an unbounded byte stream
    Sse(ByteStream),
    /// Chunk objects already parsed by a client library
    Chunks(ChunkStream),
}

impl FrameSource {
    /// Wrap a byte stream. Read errors become `UpstreamTransport`.
    pub fn sse<S, E>(bytes: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Display + 'static,
    {
        FrameSource::Sse(Box::pin(bytes.map(|r| {
            r.map_err(|e| LlmError::UpstreamTransport(e.to_string()))
        })))
    }

    /// Wrap a sequence of pre-parsed chunks. Errors become `UpstreamTransport`.
    pub fn chunks<S, E>(chunks: S) -> Self
    where
        S: Stream<Item = std::result::Result<ChatStreamChunk, E>> + Send + 'static,
        E: Display + 'static,
    {
        FrameSource::Chunks(Box::pin(chunks.map(|r| {
            r.map_err(|e| LlmError::UpstreamTransport(e.to_string()))
        })))
    }

    /// Await the first upstream unit without consuming it.
    ///
    /// Fails with `UpstreamNoBody` when the source ends before yielding
    /// anything, or with the read error itself.
    pub async fn ready(self) -> Result<Self> {
        match self {
            FrameSource::Sse(mut inner) => {
                let first = loop {
                    let bytes = inner.next().await.ok_or(LlmError::UpstreamNoBody)??;
                    if !bytes.is_empty() {
                        break bytes;
                    }
                };
                Ok(FrameSource::Sse(Box::pin(stream::iter([Ok(first)]).chain(inner))))
            }
            FrameSource::Chunks(mut inner) => {
                let first = inner.next().await.ok_or(LlmError::UpstreamNoBody)??;
                Ok(FrameSource::Chunks(Box::pin(stream::iter([Ok(first)]).chain(inner))))
            }
        }
    }

    pub fn into_fragments(self) -> FragmentStream {
        match self {
            FrameSource::Sse(bytes) => decode_sse(bytes),
            FrameSource::Chunks(chunks) => decode_chunks(chunks),
        }
    }
}

enum LineOutcome {
    Fragment(DeltaFragment),
    Done,
    Skip,
}

fn process_line(line: String) -> LineOutcome {
    let Some(data) = line.strip_prefix(DATA_PREFIX) else {
        return LineOutcome::Skip;
    };

    if data == DONE_MARKER {
        return LineOutcome::Done;
    }

    match serde_json::from_str::<ChatStreamChunk>(data) {
        Ok(chunk) => {
            if let Some(reason) = chunk.finish_reason() {
                tracing::debug!(finish_reason = reason, "Upstream signalled finish");
            }
            chunk.extract_delta().map_or(LineOutcome::Skip, LineOutcome::Fragment)
        }
        Err(e) => {
            let err = LlmError::MalformedFrame(e.to_string());
            tracing::warn!(error = %err, frame = data, "Skipping malformed chunk");
            LineOutcome::Skip
        }
    }
}

/// Decode SSE line framing into delta fragments
///
/// Pull-based: the upstream is only read when the returned stream is polled.
/// Ends cleanly on `[DONE]` or end of input, and ends with the read error on
/// a transport failure.
pub fn decode_sse<S>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(bytes);
        let mut buffer = LineBuffer::with_capacity(4096);

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(&bytes);

                    while let Some(line) = buffer.next_line() {
                        match process_line(line) {
                            LineOutcome::Fragment(fragment) => yield Ok(fragment),
                            LineOutcome::Done => {
                                tracing::debug!("Received {} sentinel", DONE_MARKER);
                                return;
                            }
                            LineOutcome::Skip => {}
                        }
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        // Upstream closed without a trailing newline
        if let Some(line) = buffer.take_remainder() {
            if let LineOutcome::Fragment(fragment) = process_line(line) {
                yield Ok(fragment);
            }
        }
    })
}

/// Pass pre-parsed chunks straight to delta extraction
pub fn decode_chunks<S>(chunks: S) -> FragmentStream
where
    S: Stream<Item = Result<ChatStreamChunk>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut chunks = Box::pin(chunks);

        while let Some(chunk_result) = chunks.next().await {
            match chunk_result {
                Ok(chunk) => {
                    if let Some(fragment) = chunk.extract_delta() {
                        yield Ok(fragment);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn frame(content: &str) -> String {
        format!("data: {}\n\n", serde_json::json!({"choices": [{"delta": {"content": content}}]}))
    }

    fn source(parts: Vec<Vec<u8>>) -> FrameSource {
        FrameSource::sse(stream::iter(
            parts.into_iter().map(|p| Ok::<_, io::Error>(Bytes::from(p))),
        ))
    }

    async fn collect(source: FrameSource) -> Vec<Result<DeltaFragment>> {
        source.into_fragments().collect().await
    }

    fn contents(results: Vec<Result<DeltaFragment>>) -> Vec<String> {
        results
            .into_iter()
            .map(|r| r.unwrap().content().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_decodes_frames_until_done() {
        let body = format!("{}{}data: [DONE]\n\n", frame("A"), frame("B"));
        let out = collect(source(vec![body.into_bytes()])).await;

        assert_eq!(contents(out), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_nothing_after_done_is_read() {
        let body = format!("{}data: [DONE]\n{}", frame("A"), frame("late"));
        let out = collect(source(vec![body.into_bytes()])).await;

        assert_eq!(contents(out), vec!["A"]);
    }

    #[tokio::test]
    async fn test_split_at_every_offset_decodes_identically() {
        let body = format!("{}{}data: [DONE]\n", frame("héllo wörld"), frame("✓ 日本"));
        let bytes = body.into_bytes();
        let whole = contents(collect(source(vec![bytes.clone()])).await);

        for split in 1..bytes.len() {
            let parts = vec![bytes[..split].to_vec(), bytes[split..].to_vec()];
            let out = contents(collect(source(parts)).await);
            assert_eq!(out, whole, "split at byte {}", split);
        }
    }

    #[tokio::test]
    async fn test_byte_at_a_time() {
        let body = format!("{}{}", frame("one"), frame("two"));
        let parts = body.into_bytes().into_iter().map(|b| vec![b]).collect();

        assert_eq!(contents(collect(source(parts)).await), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped() {
        let body = format!("{}data: {{not json\n{}", frame("A"), frame("B"));
        let out = collect(source(vec![body.into_bytes()])).await;

        assert_eq!(contents(out), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_byte_is_replaced_not_dropped() {
        let mut body = b"data: {\"choices\":[{\"delta\":{\"content\":\"caf\xE9 ok\"}}]}\n".to_vec();
        body.extend_from_slice(frame("next").as_bytes());
        let out = collect(source(vec![body])).await;

        assert_eq!(contents(out), vec!["caf\u{FFFD} ok", "next"]);
    }

    #[tokio::test]
    async fn test_non_data_lines_are_ignored() {
        let body = format!(
            ": keep-alive\nevent: message\nid: 7\nretry: 100\ndata:{{\"x\":1}}\n{}",
            frame("A")
        );
        let out = collect(source(vec![body.into_bytes()])).await;

        assert_eq!(contents(out), vec!["A"]);
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let body = format!("{}{}", frame("A"), frame("B").trim_end());
        let out = collect(source(vec![body.into_bytes()])).await;

        assert_eq!(contents(out), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_trailing_done_without_newline() {
        let body = format!("{}data: [DONE]", frame("A"));
        let out = collect(source(vec![body.into_bytes()])).await;

        assert_eq!(contents(out), vec!["A"]);
    }

    #[tokio::test]
    async fn test_transport_error_terminates_with_error() {
        let parts: Vec<std::result::Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from(frame("A"))),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
            Ok(Bytes::from(frame("never"))),
        ];
        let out = collect(FrameSource::sse(stream::iter(parts))).await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap().content(), Some("A"));
        assert!(matches!(out[1], Err(LlmError::UpstreamTransport(_))));
    }

    #[tokio::test]
    async fn test_reasoning_frames() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"think\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"say\"}}]}\n",
        );
        let out: Vec<DeltaFragment> = collect(source(vec![body.as_bytes().to_vec()]))
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].reasoning(), Some("think"));
        assert_eq!(out[1].content(), Some("say"));
    }

    #[tokio::test]
    async fn test_chunk_adapter() {
        let chunks: Vec<std::result::Result<ChatStreamChunk, io::Error>> = vec![
            Ok(ChatStreamChunk::from_delta(Some("A"), None)),
            Ok(ChatStreamChunk::default()),
            Ok(ChatStreamChunk::from_delta(None, Some("r"))),
        ];
        let out = collect(FrameSource::chunks(stream::iter(chunks))).await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap().content(), Some("A"));
        assert_eq!(out[1].as_ref().unwrap().reasoning(), Some("r"));
    }

    #[tokio::test]
    async fn test_ready_rejects_empty_source() {
        let empty = source(vec![]);
        assert!(matches!(empty.ready().await, Err(LlmError::UpstreamNoBody)));

        let blank = source(vec![Vec::new(), Vec::new()]);
        assert!(matches!(blank.ready().await, Err(LlmError::UpstreamNoBody)));

        let empty = Vec::<std::result::Result<ChatStreamChunk, io::Error>>::new();
        let chunks = FrameSource::chunks(stream::iter(empty));
        assert!(matches!(chunks.ready().await, Err(LlmError::UpstreamNoBody)));
    }

    #[tokio::test]
    async fn test_ready_surfaces_first_read_error() {
        let parts: Vec<std::result::Result<Bytes, io::Error>> =
            vec![Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))];
        let result = FrameSource::sse(stream::iter(parts)).ready().await;

        assert!(matches!(result, Err(LlmError::UpstreamTransport(_))));
    }

    #[tokio::test]
    async fn test_ready_keeps_first_chunk() {
        let ready = source(vec![frame("A").into_bytes(), frame("B").into_bytes()])
            .ready()
            .await
            .unwrap();

        assert_eq!(contents(collect(ready).await), vec!["A", "B"]);
    }
}
