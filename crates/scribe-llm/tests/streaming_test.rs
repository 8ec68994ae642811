use bytes::Bytes;
use futures::{stream, StreamExt};
use scribe_llm::{ChatStreamChunk, FrameSource, OutputEvent, OutputMode};

async fn relay_text(body: &str, mode: OutputMode) -> String {
    let source = FrameSource::sse(stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from(
        body.to_string(),
    ))]));
    let mut fragments = source.into_fragments();
    let mut out = Vec::new();

    while let Some(fragment) = fragments.next().await {
        for event in fragment.unwrap().into_events() {
            if let Some(bytes) = mode.encode(&event).unwrap() {
                out.extend_from_slice(&bytes);
            }
        }
    }

    String::from_utf8(out).unwrap()
}

const TWO_FRAMES: &str = concat!(
    "data: {\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"B\"}}]}\n",
    "data: [DONE]\n",
);

#[tokio::test]
async fn test_plain_relay_of_two_frames() {
    assert_eq!(relay_text(TWO_FRAMES, OutputMode::Plain).await, "AB");
}

#[tokio::test]
async fn test_typed_relay_of_two_frames() {
    assert_eq!(
        relay_text(TWO_FRAMES, OutputMode::Typed).await,
        "{\"type\":\"content\",\"content\":\"A\"}\n{\"type\":\"content\",\"content\":\"B\"}\n"
    );
}

#[tokio::test]
async fn test_reasoning_is_dropped_in_plain_and_kept_in_typed() {
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"r\",\"content\":\"c\"}}]}\n",
        "data: [DONE]\n",
    );

    assert_eq!(relay_text(body, OutputMode::Plain).await, "c");
    assert_eq!(
        relay_text(body, OutputMode::Typed).await,
        "{\"type\":\"thinking\",\"content\":\"r\"}\n{\"type\":\"content\",\"content\":\"c\"}\n"
    );
}

#[test]
fn test_output_event_serialization() {
    let event = OutputEvent::Thinking {
        content: "Analyze".to_string(),
    };

    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"thinking\""));
}

#[test]
fn test_output_event_deserialization() {
    let json = r#"{"type":"content","content":"Hello"}"#;
    let event: OutputEvent = serde_json::from_str(json).unwrap();

    match event {
        OutputEvent::Content { content } => assert_eq!(content, "Hello"),
        _ => panic!("Expected Content variant"),
    }
}

#[test]
fn test_chunk_tolerates_provider_extras() {
    let json = r#"{"id":"x","object":"chat.completion.chunk","created":1,"model":"m","system_fingerprint":null,"choices":[{"index":0,"delta":{"content":"hi"},"logprobs":null,"finish_reason":null}],"usage":null}"#;
    let chunk: ChatStreamChunk = serde_json::from_str(json).unwrap();

    assert_eq!(chunk.extract_delta().unwrap().content(), Some("hi"));
}
