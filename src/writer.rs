//! Quad encoder: validation, delta compaction, variant selection, framing.

use std::io::{self, Write};

use log::{debug, trace};

use crate::codec::MsgWriter;
use crate::delta::DeltaState;
use crate::header::{self, Options};
use crate::reader::{DqError, Result};
use crate::wire::WireMessage;

/// RDF term carried in quad fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// IRI/URI node.
    Iri(String),
    /// Blank node label (with or without `_:` prefix).
    BNode(String),
    /// Literal with optional datatype or language tag.
    Literal {
        lex: String,
        dt: Option<String>,
        lang: Option<String>,
    },
}

/// Subject/predicate/object plus an optional label, the unit of a stream.
///
/// A quad is valid when subject, predicate, and object are all present;
/// the label may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quad {
    pub subject: Option<Term>,
    pub predicate: Option<Term>,
    pub object: Option<Term>,
    pub label: Option<Term>,
}

impl Quad {
    /// A labelless quad with all required fields present.
    pub fn new(s: Term, p: Term, o: Term) -> Self {
        Quad {
            subject: Some(s),
            predicate: Some(p),
            object: Some(o),
            label: None,
        }
    }

    /// A quad carrying a graph label.
    pub fn with_label(s: Term, p: Term, o: Term, label: Term) -> Self {
        Quad {
            subject: Some(s),
            predicate: Some(p),
            object: Some(o),
            label: Some(label),
        }
    }

    /// True when subject, predicate, and object are all present.
    pub fn is_valid(&self) -> bool {
        self.subject.is_some() && self.predicate.is_some() && self.object.is_some()
    }
}

/// Streaming quad encoder.
///
/// Writes the stream header at construction, then one length-delimited
/// message per quad. Unless the stream was opened in full mode, fields that
/// repeat the previous quad's value are omitted on the wire.
///
/// ```
/// use dquads::{Quad, Term, Writer};
///
/// let mut buf = Vec::new();
/// let mut w = Writer::new(&mut buf).expect("header");
/// w.write_quad(&Quad::new(
///     Term::Iri("http://example.org/s".into()),
///     Term::Iri("http://example.org/p".into()),
///     Term::Iri("http://example.org/o".into()),
/// ))
/// .expect("write");
/// w.close().expect("close");
/// ```
pub struct Writer<W: Write> {
    mw: MsgWriter<W>,
    opts: Options,
    state: DeltaState,
    max: usize,
    err: Option<DqError>,
    closer: Option<Box<dyn FnOnce() -> io::Result<()>>>,
    buf: Vec<u8>,
}

impl<W: Write> Writer<W> {
    /// Create a writer with default options (delta compaction, lossy values).
    pub fn new(w: W) -> Result<Self> {
        Self::with_options(w, Options::default())
    }

    /// Create a writer with explicit [`Options`]. The header and the options
    /// message are written here; a failure surfaces as the constructor's
    /// error and no writer is produced.
    pub fn with_options(mut w: W, opts: Options) -> Result<Self> {
        header::write_header(&mut w, opts)?;
        debug!(
            "dquads stream opened for writing: full={} strict={}",
            opts.full, opts.strict
        );
        Ok(Writer {
            mw: MsgWriter::new(w),
            opts,
            state: DeltaState::default(),
            max: 0,
            err: None,
            closer: None,
            buf: Vec::new(),
        })
    }

    /// Options this stream was opened with.
    pub fn options(&self) -> Options {
        self.opts
    }

    /// Largest framed message written so far, in bytes.
    pub fn max_message_size(&self) -> usize {
        self.max
    }

    /// Attach a resource released exactly once by [`Writer::close`].
    pub fn set_closer<F>(&mut self, f: F)
    where
        F: FnOnce() -> io::Result<()> + 'static,
    {
        self.closer = Some(Box::new(f));
    }

    /// Record `e` unless an earlier failure is already recorded, and return
    /// the error every later call will replay.
    fn fail(&mut self, e: DqError) -> DqError {
        self.err.get_or_insert(e).clone()
    }

    /// Encode one quad.
    ///
    /// A quad missing a required field is rejected with
    /// [`DqError::Validation`] before any byte is written and does not
    /// poison the stream. Any other failure is recorded and replayed by
    /// every subsequent call.
    pub fn write_quad(&mut self, q: &Quad) -> Result<()> {
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        if !q.is_valid() {
            return Err(DqError::Validation("quad is missing a required field"));
        }
        let outgoing = if self.opts.full {
            q.clone()
        } else {
            self.state.compact(q.clone())
        };
        match self.emit(outgoing) {
            Ok(()) => {
                // Only a quad that actually hit the stream updates the
                // last-seen state.
                self.state.commit(q);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn emit(&mut self, q: Quad) -> Result<()> {
        let msg = WireMessage::from_quad(self.opts.strict, q)?;
        self.buf.clear();
        msg.encode(&mut self.buf);
        let n = self.mw.write_msg(&self.buf)?;
        trace!("wrote quad message of {n} bytes");
        if n > self.max {
            self.max = n;
        }
        Ok(())
    }

    /// Encode a batch in order, stopping at the first failure.
    ///
    /// Returns the number of quads written together with the error that
    /// stopped the batch, if any; on failure the count is the index of the
    /// offending quad.
    pub fn write_quads(&mut self, quads: &[Quad]) -> (usize, Option<DqError>) {
        for (i, q) in quads.iter().enumerate() {
            if let Err(e) = self.write_quad(q) {
                return (i, Some(e));
            }
        }
        (quads.len(), None)
    }

    /// Flush the stream and release the attached resource, if any.
    /// Safe to call with nothing attached, and safe to call twice.
    pub fn close(&mut self) -> Result<()> {
        self.mw.flush()?;
        if let Some(c) = self.closer.take() {
            c()?;
        }
        Ok(())
    }

    /// Consume the writer, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.mw.into_inner()
    }
}

#[cfg(feature = "oxigraph")]
fn term_from_ox_term_ref(t: &oxigraph::model::TermRef<'_>) -> Term {
    use oxigraph::model::TermRef as TR;
    match t {
        TR::NamedNode(n) => Term::Iri(n.as_str().to_string()),
        TR::BlankNode(b) => Term::BNode(format!("_:{}", b.as_str())),
        TR::Literal(l) => {
            let lex = l.value().to_string();
            if let Some(lang) = l.language() {
                Term::Literal {
                    lex,
                    dt: None,
                    lang: Some(lang.to_string()),
                }
            } else {
                Term::Literal {
                    lex,
                    dt: Some(l.datatype().as_str().to_string()),
                    lang: None,
                }
            }
        }
        _ => Term::Iri(t.to_string()),
    }
}

#[cfg(feature = "oxigraph")]
impl Term {
    pub fn from_oxigraph(t: &oxigraph::model::Term) -> Term {
        term_from_ox_term_ref(&t.as_ref())
    }
}

#[cfg(feature = "oxigraph")]
impl Quad {
    /// Convert an `oxigraph` quad; the default graph maps to an absent
    /// label. Fails on subject kinds this model cannot carry.
    pub fn from_oxigraph(q: &oxigraph::model::Quad) -> Result<Self> {
        use oxigraph::model::{GraphName, Subject};
        let subject = match &q.subject {
            Subject::NamedNode(n) => Term::Iri(n.as_str().to_string()),
            Subject::BlankNode(b) => Term::BNode(format!("_:{}", b.as_str())),
            _ => return Err(DqError::Validation("unsupported subject kind")),
        };
        let predicate = Term::Iri(q.predicate.as_str().to_string());
        let object = term_from_ox_term_ref(&q.object.as_ref());
        let label = match &q.graph_name {
            GraphName::DefaultGraph => None,
            GraphName::NamedNode(n) => Some(Term::Iri(n.as_str().to_string())),
            GraphName::BlankNode(b) => Some(Term::BNode(format!("_:{}", b.as_str()))),
        };
        Ok(Quad {
            subject: Some(subject),
            predicate: Some(predicate),
            object: Some(object),
            label,
        })
    }
}

#[cfg(feature = "oxigraph")]
impl<W: Write> Writer<W> {
    /// Convert and encode one `oxigraph` quad.
    pub fn write_oxigraph_quad(&mut self, q: &oxigraph::model::Quad) -> Result<()> {
        self.write_quad(&Quad::from_oxigraph(q)?)
    }
}
