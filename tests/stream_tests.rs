use bytes::Bytes;
use futures::Stream;

use agentcore_chat::stream::{
  ChunkFramer, EventFramer, LineFramer, StreamDecoder, Utf8Decoder
};
use agentcore_chat::{Error, Framing};

fn byte_stream(
  parts: Vec<Vec<u8>>
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin
{   futures::stream::iter(
      parts.into_iter().map(|p| Ok(Bytes::from(p)))
    )
}

/// Split `body` into reads at the given byte offsets
fn split_at(body: &str, cuts: &[usize]) -> Vec<Vec<u8>>
{   let bytes = body.as_bytes();
    let mut parts = vec![];
    let mut start = 0;
    for &cut in cuts
    {   parts.push(bytes[start..cut].to_vec());
        start = cut;
    }
    parts.push(bytes[start..].to_vec());
    parts
}

async fn decode(
  framing: Framing
, parts: Vec<Vec<u8>>
) -> (String, Vec<String>)
{   let mut seen = vec![];
    let mut on_chunk = |c: &str| seen.push(c.to_string());
    let reply = StreamDecoder::new(framing)
      .decode(byte_stream(parts), Some("rid-1".to_string()), &mut on_chunk)
      .await
      .unwrap();
    assert_eq!(reply.request_id.as_deref(), Some("rid-1"));
    (reply.response, seen)
}

const LINES_BODY: &str =
  "data: \"Hello\"\ndata: \", wor\"\ndata: \"ld\\n\"\ndata: plain text\n";

const EVENTS_BODY: &str =
  "data: \"Bonds \"\n\ndata: \"are \"\ndata: \"fixed\"\n\n\n\ndata: \" income\"\n\n";

#[tokio::test]
async fn line_framing_reports_chunks_in_order()
{   let (text, seen) = decode(
      Framing::Lines
    , vec![LINES_BODY.as_bytes().to_vec()]
    ).await;
    assert_eq!(seen, vec!["Hello", ", wor", "ld\n", "plain text"]);
    assert_eq!(text, seen.concat());
}

#[tokio::test]
async fn event_framing_reports_chunks_in_order()
{   let (text, seen) = decode(
      Framing::Events
    , vec![EVENTS_BODY.as_bytes().to_vec()]
    ).await;
    assert_eq!(seen, vec!["Bonds ", "are ", "fixed", " income"]);
    assert_eq!(text, "Bonds are fixed income");
}

#[tokio::test]
async fn read_boundaries_do_not_change_output()
{   for (framing, body) in
      [ (Framing::Lines, LINES_BODY)
      , (Framing::Events, EVENTS_BODY)
      ]
    {   let (whole, whole_seen) = decode(
          framing
        , vec![body.as_bytes().to_vec()]
        ).await;
        for cut in 1..body.len()
        {   let (text, seen) = decode(framing, split_at(body, &[cut])).await;
            assert_eq!(text, whole, "{:?} cut at {}", framing, cut);
            assert_eq!(seen, whole_seen, "{:?} cut at {}", framing, cut);
        }
        let every_byte: Vec<usize> = (1..body.len()).collect();
        let (text, _) = decode(framing, split_at(body, &every_byte)).await;
        assert_eq!(text, whole);
    }
}

#[tokio::test]
async fn multibyte_characters_survive_split_reads()
{   let body = "data: \"caf\u{e9} \u{1f4c8} \u{2022} ok\"\n";
    let euro = body.find('\u{1f4c8}').unwrap();
    let parts = split_at(body, &[euro + 1, euro + 2, euro + 3]);
    let (text, seen) = decode(Framing::Lines, parts).await;
    assert_eq!(text, "caf\u{e9} \u{1f4c8} \u{2022} ok");
    assert_eq!(seen.len(), 1);
}

#[tokio::test]
async fn dangling_fragment_is_dropped()
{   let (text, _) = decode(
      Framing::Lines
    , vec![b"data: \"kept\"\ndata: \"lost\"".to_vec()]
    ).await;
    assert_eq!(text, "kept");

    let (text, _) = decode(
      Framing::Events
    , vec![b"data: \"kept\"\n\ndata: \"lost\"\n".to_vec()]
    ).await;
    assert_eq!(text, "kept");
}

#[tokio::test]
async fn non_string_json_is_taken_verbatim()
{   let (text, seen) = decode(
      Framing::Lines
    , vec![b"data: {\"a\":1}\ndata: 42\nevent: ping\n: comment\n".to_vec()]
    ).await;
    assert_eq!(seen, vec!["{\"a\":1}", "42"]);
    assert_eq!(text, "{\"a\":1}42");
}

#[tokio::test]
async fn stream_failure_propagates()
{   let items: Vec<Result<Bytes, std::io::Error>> = vec![
      Ok(Bytes::from_static(b"data: \"partial\"\n"))
    , Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"))
    ];
    let mut seen = vec![];
    let mut on_chunk = |c: &str| seen.push(c.to_string());
    let err = StreamDecoder::new(Framing::Lines)
      .decode(futures::stream::iter(items), None, &mut on_chunk)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Invocation(ref m) if m.contains("reset")));
    assert_eq!(seen, vec!["partial"]);
}

#[test]
fn framers_keep_unfinished_input()
{   let mut lines = LineFramer::default();
    assert!(lines.push("data: \"a").is_empty());
    assert_eq!(lines.pending(), "data: \"a");
    assert_eq!(lines.push("\"\ndata"), vec!["a"]);
    assert_eq!(lines.pending(), "data");

    let mut events = EventFramer::default();
    assert!(events.push("data: \"a\"\n").is_empty());
    assert_eq!(events.push("\n"), vec!["a"]);
    assert_eq!(events.pending(), "");
}

#[test]
fn utf8_decoder_replaces_invalid_bytes()
{   let mut utf8 = Utf8Decoder::new();
    assert_eq!(utf8.decode(&[b'a', 0xff, b'b']), "a\u{fffd}b");
    assert_eq!(utf8.decode(&[0xe2, 0x82]), "");
    assert!(utf8.has_pending());
    assert_eq!(utf8.decode(&[0xac]), "\u{20ac}");
    assert!(!utf8.has_pending());
}
