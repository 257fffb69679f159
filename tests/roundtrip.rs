use dquads::codec::MsgReader;
use dquads::wire::WireMessage;
use dquads::{DEFAULT_MAX_SIZE, Options, Quad, Reader, Term, Writer};
use std::io::{Cursor, Read};

fn init_logging() {
    let _ = env_logger::try_init();
}

fn iri(s: &str) -> Term {
    Term::Iri(s.into())
}

fn lit(s: &str) -> Term {
    Term::Literal {
        lex: s.into(),
        dt: None,
        lang: None,
    }
}

fn sample_quads() -> Vec<Quad> {
    vec![
        Quad::new(iri("http://ex/a"), iri("http://ex/p"), lit("one")),
        Quad::new(iri("http://ex/a"), iri("http://ex/p"), lit("two")),
        Quad::new(iri("http://ex/b"), iri("http://ex/p"), lit("two")),
        Quad::with_label(
            iri("http://ex/b"),
            iri("http://ex/q"),
            Term::BNode("_:b0".into()),
            iri("http://ex/g"),
        ),
        Quad::new(
            iri("http://ex/b"),
            iri("http://ex/q"),
            Term::Literal {
                lex: "drei".into(),
                dt: None,
                lang: Some("de".into()),
            },
        ),
        Quad::new(
            iri("http://ex/b"),
            iri("http://ex/q"),
            Term::Literal {
                lex: "3".into(),
                dt: Some("http://www.w3.org/2001/XMLSchema#integer".into()),
                lang: None,
            },
        ),
    ]
}

fn encode(quads: &[Quad], opts: Options) -> Vec<u8> {
    let mut out = Vec::new();
    let mut w = Writer::with_options(&mut out, opts).expect("header");
    let (n, err) = w.write_quads(quads);
    assert_eq!(n, quads.len());
    assert!(err.is_none());
    w.close().expect("close");
    drop(w);
    out
}

fn decode_all(bytes: &[u8]) -> Vec<Quad> {
    let mut r = Reader::new(Cursor::new(bytes)).expect("header");
    let mut out = Vec::new();
    while let Some(q) = r.read_quad().expect("read") {
        out.push(q);
    }
    out
}

#[test]
fn roundtrip_delta_mode() {
    init_logging();
    let quads = sample_quads();
    let bytes = encode(&quads, Options::default());
    assert_eq!(decode_all(&bytes), quads);
}

#[test]
fn roundtrip_full_mode() {
    let quads = sample_quads();
    let bytes = encode(
        &quads,
        Options {
            full: true,
            strict: false,
        },
    );
    let mut r = Reader::new(Cursor::new(&bytes[..])).expect("header");
    assert!(r.options().full);
    drop(r);
    assert_eq!(decode_all(&bytes), quads);
}

#[test]
fn full_mode_is_larger_for_repetitive_streams() {
    let quads = sample_quads();
    let delta = encode(&quads, Options::default());
    let full = encode(
        &quads,
        Options {
            full: true,
            strict: false,
        },
    );
    assert!(full.len() > delta.len());
}

#[test]
fn iterator_yields_every_quad() {
    let quads = sample_quads();
    let bytes = encode(&quads, Options::default());
    let mut r = Reader::new(Cursor::new(bytes)).expect("header");
    let got: Vec<Quad> = r.quads().map(|q| q.expect("decode")).collect();
    assert_eq!(got, quads);
}

#[test]
fn writer_tracks_max_message_size() {
    let mut out = Vec::new();
    let mut w = Writer::new(&mut out).expect("header");
    w.write_quad(&Quad::new(iri("s"), iri("p"), lit("o")))
        .expect("small");
    let small = w.max_message_size();
    assert!(small > 0);
    let big = "x".repeat(4096);
    w.write_quad(&Quad::new(iri("s"), iri("p"), lit(&big)))
        .expect("big");
    assert!(w.max_message_size() > 4096);
    assert!(w.max_message_size() > small);
}

/// Skips the fixed header plus the options message, leaving the cursor on
/// the first quad message.
fn quad_messages(bytes: &[u8]) -> MsgReader<Cursor<&[u8]>> {
    let mut cur = Cursor::new(bytes);
    let mut head = [0u8; 8];
    cur.read_exact(&mut head).expect("fixed header");
    let mut mr = MsgReader::new(cur, DEFAULT_MAX_SIZE);
    mr.read_msg().expect("options").expect("options present");
    mr
}

#[test]
fn repeated_subject_and_predicate_are_omitted_on_the_wire() {
    let quads = vec![
        Quad::new(iri("http://ex/a"), iri("http://ex/p"), lit("one")),
        Quad::new(iri("http://ex/a"), iri("http://ex/p"), lit("two")),
    ];
    let bytes = encode(&quads, Options::default());
    let mut mr = quad_messages(&bytes);
    mr.read_msg().expect("first").expect("first present");
    let second = mr.read_msg().expect("second").expect("second present").to_vec();
    let WireMessage::Lossy(wq) = WireMessage::decode(false, &second).expect("decode") else {
        panic!("expected the lossy variant");
    };
    assert!(wq.subject.is_none());
    assert!(wq.predicate.is_none());
    assert_eq!(wq.object, Some(lit("two")));
    assert!(wq.label.is_none());

    assert_eq!(decode_all(&bytes), quads);
}

#[test]
fn changed_subject_is_written_while_rest_is_omitted() {
    let quads = vec![
        Quad::new(iri("http://ex/a"), iri("http://ex/p"), lit("one")),
        Quad::new(iri("http://ex/b"), iri("http://ex/p"), lit("one")),
    ];
    let bytes = encode(&quads, Options::default());
    let mut mr = quad_messages(&bytes);
    mr.read_msg().expect("first").expect("first present");
    let second = mr.read_msg().expect("second").expect("second present").to_vec();
    let WireMessage::Lossy(wq) = WireMessage::decode(false, &second).expect("decode") else {
        panic!("expected the lossy variant");
    };
    assert_eq!(wq.subject, Some(iri("http://ex/b")));
    assert!(wq.predicate.is_none());
    assert!(wq.object.is_none());

    assert_eq!(decode_all(&bytes), quads);
}

#[test]
fn full_mode_writes_every_field() {
    let quads = vec![
        Quad::new(iri("http://ex/a"), iri("http://ex/p"), lit("one")),
        Quad::new(iri("http://ex/a"), iri("http://ex/p"), lit("one")),
    ];
    let bytes = encode(
        &quads,
        Options {
            full: true,
            strict: false,
        },
    );
    let mut mr = quad_messages(&bytes);
    for _ in 0..2 {
        let body = mr.read_msg().expect("msg").expect("present").to_vec();
        let WireMessage::Lossy(wq) = WireMessage::decode(false, &body).expect("decode") else {
            panic!("expected the lossy variant");
        };
        assert!(wq.subject.is_some());
        assert!(wq.predicate.is_some());
        assert!(wq.object.is_some());
    }
}

#[test]
fn roundtrip_through_a_file() {
    let quads = sample_quads();
    let mut tmp = tempfile::NamedTempFile::new().expect("tempfile");
    {
        let mut w = Writer::new(tmp.as_file_mut()).expect("header");
        let (n, err) = w.write_quads(&quads);
        assert_eq!(n, quads.len());
        assert!(err.is_none());
        w.close().expect("close");
    }
    let mut file = tmp.reopen().expect("reopen");
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).expect("read file");
    assert_eq!(decode_all(&bytes), quads);
}

#[test]
fn empty_stream_roundtrips() {
    let bytes = encode(&[], Options::default());
    assert!(decode_all(&bytes).is_empty());
}

#[test]
fn label_is_never_compacted() {
    // Identical labels on consecutive quads are still written each time.
    let g = iri("http://ex/g");
    let quads = vec![
        Quad::with_label(iri("a"), iri("p"), lit("1"), g.clone()),
        Quad::with_label(iri("a"), iri("p"), lit("2"), g.clone()),
    ];
    let bytes = encode(&quads, Options::default());
    let mut mr = quad_messages(&bytes);
    mr.read_msg().expect("first").expect("first present");
    let second = mr.read_msg().expect("second").expect("second present").to_vec();
    let WireMessage::Lossy(wq) = WireMessage::decode(false, &second).expect("decode") else {
        panic!("expected the lossy variant");
    };
    assert_eq!(wq.label, Some(g));
    assert_eq!(decode_all(&bytes), quads);
}
