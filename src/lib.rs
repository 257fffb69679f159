//! dquads — delta-compacted binary codec for streams of RDF quads.
//!
//! A stream starts with a fixed 8-byte header (magic plus a little-endian
//! version), a one-time options message, and then one length-delimited
//! message per quad. In the default mode a field that equals the same
//! position of the previous quad is omitted on the wire ("delta
//! compaction"); `full` mode writes every field and in exchange lets
//! [`Reader::skip_quad`] discard messages without decoding them. `strict`
//! mode restricts values to RDF-legal placements (e.g. an IRI in the
//! predicate position).
//!
//! Quick start: write a stream and read it back
//!
//! ```
//! use dquads::{Quad, Reader, Term, Writer};
//! use std::io::Cursor;
//!
//! let name = Quad::new(
//!     Term::Iri("http://example.org/Alice".into()),
//!     Term::Iri("http://xmlns.com/foaf/0.1/name".into()),
//!     Term::Literal { lex: "Alice".into(), dt: None, lang: None },
//! );
//!
//! let mut buf = Vec::new();
//! let mut w = Writer::new(&mut buf).expect("header");
//! w.write_quad(&name).expect("write");
//! w.close().expect("close");
//! drop(w);
//!
//! let mut r = Reader::new(Cursor::new(buf)).expect("header");
//! assert_eq!(r.read_quad().expect("read"), Some(name));
//! assert_eq!(r.read_quad().expect("read"), None);
//! ```

pub mod codec;
pub mod delta;
pub mod header;
pub mod reader;
pub mod wire;
pub mod writer;

pub use codec::DEFAULT_MAX_SIZE;
pub use header::{CURRENT_VERSION, MAGIC, Options};
pub use reader::{DqError, Quads, Reader};
pub use writer::{Quad, Term, Writer};

/// Crate-level result type using the codec error.
pub type Result<T> = std::result::Result<T, crate::reader::DqError>;
