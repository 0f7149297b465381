use insightforge::api::stream::StreamParser;
use insightforge::types::StreamEvent;

#[test]
fn test_fragmented_events() {
    let mut parser = StreamParser::new();

    let chunk1 = b"data: {\"choices\":[{\"delta\":{\"cont";
    let events1 = parser.process(chunk1).expect("first chunk parse");
    assert_eq!(events1.len(), 0);

    let chunk2 = b"ent\":\"Hi\"},\"finish_reason\":null}]}\n\n";
    let events2 = parser.process(chunk2).expect("second chunk parse");
    assert_eq!(events2, vec![StreamEvent::Delta("Hi".to_string())]);
}

#[test]
fn test_parse_error_handling() {
    let mut parser = StreamParser::new();

    let chunk = b"data: {invalid json}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n";
    let events = parser
        .process(chunk)
        .expect("error handling should not fail parser");
    assert_eq!(events, vec![StreamEvent::Delta("ok".to_string())]);
}

#[test]
fn test_crlf_frames_and_comments_are_accepted() {
    let mut parser = StreamParser::new();

    let chunk = b": keep-alive\r\n\r\ndata: {\"choices\":[{\"delta\":{\"content\":\"# Overview\\n\"}}]}\r\n\r\n";
    let events = parser.process(chunk).expect("crlf frames");
    assert_eq!(events, vec![StreamEvent::Delta("# Overview\n".to_string())]);
}

#[test]
fn test_role_only_and_empty_deltas_are_skipped() {
    let mut parser = StreamParser::new();

    let chunk = b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\n";
    let events = parser.process(chunk).expect("role-only frames");
    assert!(events.is_empty());
}

#[test]
fn test_done_sentinel_is_reported_once() {
    let mut parser = StreamParser::new();

    let events = parser
        .process(b"data: [DONE]\n\ndata: [DONE]\n\n")
        .expect("done frames");
    assert_eq!(events, vec![StreamEvent::Done]);
    assert!(parser.is_done());
}

#[test]
fn test_unterminated_final_frame_is_flushed() {
    let mut parser = StreamParser::new();

    let events = parser
        .process(b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}")
        .expect("partial frame");
    assert!(events.is_empty());
    assert_eq!(parser.flush(), vec![StreamEvent::Delta("tail".to_string())]);
}
