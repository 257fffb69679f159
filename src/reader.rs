//! Quad decoder: header gating, variant selection, delta expansion, skip.
//!
//! The primary entry point is [`Reader`]. Construction reads and checks the
//! stream header; after that each [`Reader::read_quad`] call decodes one
//! message and expands omitted fields from the last-seen state.
//!
//! ```
//! use dquads::{Quad, Reader, Term, Writer};
//! use std::io::Cursor;
//!
//! let mut buf = Vec::new();
//! let mut w = Writer::new(&mut buf).expect("header");
//! w.write_quad(&Quad::new(
//!     Term::Iri("http://example.org/s".into()),
//!     Term::Iri("http://example.org/p".into()),
//!     Term::Literal { lex: "o".into(), dt: None, lang: None },
//! ))
//! .expect("write");
//! drop(w);
//!
//! let mut r = Reader::new(Cursor::new(buf)).expect("header");
//! for quad in r.quads() {
//!     let quad = quad.expect("decode");
//!     assert!(quad.is_valid());
//! }
//! ```

use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use log::{debug, trace};

use crate::codec::{DEFAULT_MAX_SIZE, MsgReader};
use crate::delta::DeltaState;
use crate::header::{self, Options};
use crate::wire::WireMessage;
use crate::writer::Quad;

/// Errors surfaced by the codec.
///
/// `Clone` so a recorded failure can be replayed by every later call on the
/// same writer or reader.
#[derive(Debug, Clone)]
pub enum DqError {
    /// Underlying stream failure, propagated verbatim.
    Io(Arc<io::Error>),
    /// Bad magic, unsupported version, or malformed wire data.
    Format(String),
    /// Quad missing a required field; nothing was written for it.
    Validation(&'static str),
    /// Value placement disallowed by RDF rules (strict mode only).
    StrictViolation(&'static str),
}

impl fmt::Display for DqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DqError::Io(e) => write!(f, "{}", e),
            DqError::Format(m) => write!(f, "{}", m),
            DqError::Validation(m) => write!(f, "{}", m),
            DqError::StrictViolation(m) => write!(f, "{}", m),
        }
    }
}
impl std::error::Error for DqError {}
impl From<io::Error> for DqError {
    fn from(e: io::Error) -> Self {
        DqError::Io(Arc::new(e))
    }
}

pub type Result<T> = std::result::Result<T, DqError>;

/// Streaming quad decoder.
pub struct Reader<R: Read> {
    mr: MsgReader<R>,
    opts: Options,
    state: DeltaState,
    err: Option<DqError>,
    closer: Option<Box<dyn FnOnce() -> io::Result<()>>>,
}

impl<R: Read> std::fmt::Debug for Reader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("opts", &self.opts)
            .field("err", &self.err)
            .field("closer", &self.closer.is_some())
            .finish_non_exhaustive()
    }
}

impl<R: Read> Reader<R> {
    /// Open a reader with the default message size bound.
    pub fn new(r: R) -> Result<Self> {
        Self::with_max_size(r, DEFAULT_MAX_SIZE)
    }

    /// Open a reader. `max_size` bounds a single message's payload; zero
    /// selects [`DEFAULT_MAX_SIZE`]. The header is read and checked here; a
    /// failure surfaces as the constructor's error and no reader is
    /// produced.
    pub fn with_max_size(mut r: R, max_size: usize) -> Result<Self> {
        let max = if max_size == 0 {
            DEFAULT_MAX_SIZE
        } else {
            max_size
        };
        let opts = header::read_header(&mut r, max)?;
        debug!(
            "dquads stream opened for reading: full={} strict={}",
            opts.full, opts.strict
        );
        Ok(Reader {
            mr: MsgReader::new(r, max),
            opts,
            state: DeltaState::default(),
            err: None,
            closer: None,
        })
    }

    /// Options parsed from the stream header.
    pub fn options(&self) -> Options {
        self.opts
    }

    /// Attach a resource released exactly once by [`Reader::close`].
    pub fn set_closer<F>(&mut self, f: F)
    where
        F: FnOnce() -> io::Result<()> + 'static,
    {
        self.closer = Some(Box::new(f));
    }

    fn fail(&mut self, e: DqError) -> DqError {
        self.err.get_or_insert(e).clone()
    }

    /// Decode the next quad, or `Ok(None)` at the end of the stream.
    ///
    /// Any failure is recorded and replayed by every subsequent call
    /// without touching the stream again.
    pub fn read_quad(&mut self) -> Result<Option<Quad>> {
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        match self.read_inner() {
            Ok(q) => Ok(q),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn read_inner(&mut self) -> Result<Option<Quad>> {
        let body = match self.mr.read_msg()? {
            Some(body) => body,
            None => return Ok(None),
        };
        let msg = WireMessage::decode(self.opts.strict, body)?;
        Ok(Some(self.state.expand(msg.into_quad())))
    }

    /// Discard the next quad, returning `false` at the end of the stream.
    ///
    /// In full mode the message bytes are dropped without decoding. In
    /// delta mode a structural skip could desynchronize the last-seen field
    /// state a later [`Reader::read_quad`] depends on, so the quad is
    /// decoded and discarded instead.
    pub fn skip_quad(&mut self) -> Result<bool> {
        if !self.opts.full {
            return Ok(self.read_quad()?.is_some());
        }
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        match self.mr.skip_msg() {
            Ok(Some(n)) => {
                trace!("skipped quad message of {n} bytes");
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Iterate over the remaining quads. The iterator ends at the end of
    /// the stream or after yielding the first error.
    pub fn quads(&mut self) -> Quads<'_, R> {
        Quads {
            r: self,
            done: false,
        }
    }

    /// Release the attached resource, if any. A no-op otherwise.
    pub fn close(&mut self) -> Result<()> {
        if let Some(c) = self.closer.take() {
            c()?;
        }
        Ok(())
    }

    /// Consume the reader, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.mr.into_inner()
    }
}

/// Iterator over decoded quads, created by [`Reader::quads`].
pub struct Quads<'a, R: Read> {
    r: &'a mut Reader<R>,
    done: bool,
}

impl<R: Read> Iterator for Quads<'_, R> {
    type Item = Result<Quad>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.r.read_quad() {
            Ok(Some(q)) => Some(Ok(q)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
