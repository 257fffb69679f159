//! On-wire quad message shapes and their byte encoding.
//!
//! Two bodies share one layout: a presence-flags byte, then each present
//! field in subject/predicate/object/label order. The lossy shape carries a
//! full [`Term`] per field; the strict shape narrows subject and label to
//! nodes and the predicate to a bare IRI, so RDF-illegal placements cannot
//! be represented at all.

use crate::codec::{push_uvarint, read_uvarint};
use crate::reader::{DqError, Result};
use crate::writer::{Quad, Term};

const F_SUBJECT: u8 = 1;
const F_PREDICATE: u8 = 1 << 1;
const F_OBJECT: u8 = 1 << 2;
const F_LABEL: u8 = 1 << 3;

const KIND_IRI: u8 = 0;
const KIND_BNODE: u8 = 1;
const KIND_LITERAL: u8 = 2;

/// Lossy on-wire quad. An absent field means "same value as the previous
/// quad at this position".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireQuad {
    pub subject: Option<Term>,
    pub predicate: Option<Term>,
    pub object: Option<Term>,
    pub label: Option<Term>,
}

/// Term allowed in the subject or label position under strict rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Iri(String),
    BNode(String),
}

/// Strict on-wire quad: placements restricted to RDF-legal values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrictQuad {
    pub subject: Option<Node>,
    /// Predicate IRI.
    pub predicate: Option<String>,
    pub object: Option<Term>,
    pub label: Option<Node>,
}

/// Message variant, selected once per stream from the parsed options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    Lossy(WireQuad),
    Strict(StrictQuad),
}

fn bad(m: &str) -> DqError {
    DqError::Format(m.into())
}

fn node_from(t: Term, err: &'static str) -> Result<Node> {
    match t {
        Term::Iri(s) => Ok(Node::Iri(s)),
        Term::BNode(s) => Ok(Node::BNode(s)),
        Term::Literal { .. } => Err(DqError::StrictViolation(err)),
    }
}

impl From<Node> for Term {
    fn from(n: Node) -> Term {
        match n {
            Node::Iri(s) => Term::Iri(s),
            Node::BNode(s) => Term::BNode(s),
        }
    }
}

impl From<Quad> for WireQuad {
    fn from(q: Quad) -> WireQuad {
        WireQuad {
            subject: q.subject,
            predicate: q.predicate,
            object: q.object,
            label: q.label,
        }
    }
}

impl WireQuad {
    pub fn into_quad(self) -> Quad {
        Quad {
            subject: self.subject,
            predicate: self.predicate,
            object: self.object,
            label: self.label,
        }
    }
}

impl StrictQuad {
    /// Narrow a quad to the strict shape, rejecting RDF-illegal placements.
    pub fn try_from_quad(q: Quad) -> Result<StrictQuad> {
        let subject = q
            .subject
            .map(|t| node_from(t, "literal not allowed in subject position"))
            .transpose()?;
        let predicate = q
            .predicate
            .map(|t| match t {
                Term::Iri(s) => Ok(s),
                _ => Err(DqError::StrictViolation("predicate must be an IRI")),
            })
            .transpose()?;
        let label = q
            .label
            .map(|t| node_from(t, "literal not allowed in label position"))
            .transpose()?;
        Ok(StrictQuad {
            subject,
            predicate,
            object: q.object,
            label,
        })
    }

    pub fn into_quad(self) -> Quad {
        Quad {
            subject: self.subject.map(Term::from),
            predicate: self.predicate.map(Term::Iri),
            object: self.object,
            label: self.label.map(Term::from),
        }
    }
}

fn push_str(s: &str, out: &mut Vec<u8>) {
    push_uvarint(s.len() as u64, out);
    out.extend_from_slice(s.as_bytes());
}

fn push_term(t: &Term, out: &mut Vec<u8>) {
    match t {
        Term::Iri(s) => {
            out.push(KIND_IRI);
            push_str(s, out);
        }
        Term::BNode(s) => {
            out.push(KIND_BNODE);
            push_str(s, out);
        }
        Term::Literal { lex, dt, lang } => {
            out.push(KIND_LITERAL);
            push_str(lex, out);
            match dt {
                Some(d) => {
                    out.push(1);
                    push_str(d, out);
                }
                None => out.push(0),
            }
            match lang {
                Some(l) => {
                    out.push(1);
                    push_str(l, out);
                }
                None => out.push(0),
            }
        }
    }
}

fn push_node(n: &Node, out: &mut Vec<u8>) {
    match n {
        Node::Iri(s) => {
            out.push(KIND_IRI);
            push_str(s, out);
        }
        Node::BNode(s) => {
            out.push(KIND_BNODE);
            push_str(s, out);
        }
    }
}

fn read_str(buf: &[u8], off: usize) -> Result<(String, usize)> {
    let (len, off) = read_uvarint(buf, off).ok_or_else(|| bad("truncated string length"))?;
    let end = off
        .checked_add(len as usize)
        .filter(|&e| e <= buf.len())
        .ok_or_else(|| bad("string out of bounds"))?;
    let s = std::str::from_utf8(&buf[off..end])
        .map_err(|_| bad("string is not valid UTF-8"))?
        .to_string();
    Ok((s, end))
}

fn read_opt_str(buf: &[u8], off: usize) -> Result<(Option<String>, usize)> {
    match *buf.get(off).ok_or_else(|| bad("truncated literal"))? {
        0 => Ok((None, off + 1)),
        1 => {
            let (s, off) = read_str(buf, off + 1)?;
            Ok((Some(s), off))
        }
        _ => Err(bad("bad literal presence flag")),
    }
}

fn read_term(buf: &[u8], off: usize) -> Result<(Term, usize)> {
    let kind = *buf.get(off).ok_or_else(|| bad("truncated term"))?;
    let off = off + 1;
    match kind {
        KIND_IRI => {
            let (s, off) = read_str(buf, off)?;
            Ok((Term::Iri(s), off))
        }
        KIND_BNODE => {
            let (s, off) = read_str(buf, off)?;
            Ok((Term::BNode(s), off))
        }
        KIND_LITERAL => {
            let (lex, off) = read_str(buf, off)?;
            let (dt, off) = read_opt_str(buf, off)?;
            let (lang, off) = read_opt_str(buf, off)?;
            Ok((Term::Literal { lex, dt, lang }, off))
        }
        _ => Err(bad("unknown term kind")),
    }
}

fn read_node(buf: &[u8], off: usize) -> Result<(Node, usize)> {
    let kind = *buf.get(off).ok_or_else(|| bad("truncated term"))?;
    let off = off + 1;
    match kind {
        KIND_IRI => {
            let (s, off) = read_str(buf, off)?;
            Ok((Node::Iri(s), off))
        }
        KIND_BNODE => {
            let (s, off) = read_str(buf, off)?;
            Ok((Node::BNode(s), off))
        }
        _ => Err(bad("bad term kind in node position")),
    }
}

impl WireMessage {
    /// Build the outgoing message for one (already compacted) quad.
    pub fn from_quad(strict: bool, q: Quad) -> Result<WireMessage> {
        if strict {
            Ok(WireMessage::Strict(StrictQuad::try_from_quad(q)?))
        } else {
            Ok(WireMessage::Lossy(WireQuad::from(q)))
        }
    }

    pub fn into_quad(self) -> Quad {
        match self {
            WireMessage::Lossy(q) => q.into_quad(),
            WireMessage::Strict(q) => q.into_quad(),
        }
    }

    /// Append the message body to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            WireMessage::Lossy(q) => {
                let mut flags = 0u8;
                if q.subject.is_some() {
                    flags |= F_SUBJECT;
                }
                if q.predicate.is_some() {
                    flags |= F_PREDICATE;
                }
                if q.object.is_some() {
                    flags |= F_OBJECT;
                }
                if q.label.is_some() {
                    flags |= F_LABEL;
                }
                out.push(flags);
                for t in [&q.subject, &q.predicate, &q.object, &q.label]
                    .into_iter()
                    .flatten()
                {
                    push_term(t, out);
                }
            }
            WireMessage::Strict(q) => {
                let mut flags = 0u8;
                if q.subject.is_some() {
                    flags |= F_SUBJECT;
                }
                if q.predicate.is_some() {
                    flags |= F_PREDICATE;
                }
                if q.object.is_some() {
                    flags |= F_OBJECT;
                }
                if q.label.is_some() {
                    flags |= F_LABEL;
                }
                out.push(flags);
                if let Some(n) = &q.subject {
                    push_node(n, out);
                }
                if let Some(p) = &q.predicate {
                    push_str(p, out);
                }
                if let Some(o) = &q.object {
                    push_term(o, out);
                }
                if let Some(n) = &q.label {
                    push_node(n, out);
                }
            }
        }
    }

    /// Decode one message body in the variant the stream options selected.
    pub fn decode(strict: bool, body: &[u8]) -> Result<WireMessage> {
        let flags = *body.first().ok_or_else(|| bad("empty quad message"))?;
        if flags & !(F_SUBJECT | F_PREDICATE | F_OBJECT | F_LABEL) != 0 {
            return Err(bad("unknown quad flags"));
        }
        let mut off = 1usize;
        let msg = if strict {
            let mut q = StrictQuad::default();
            if flags & F_SUBJECT != 0 {
                let (n, o) = read_node(body, off)?;
                q.subject = Some(n);
                off = o;
            }
            if flags & F_PREDICATE != 0 {
                let (s, o) = read_str(body, off)?;
                q.predicate = Some(s);
                off = o;
            }
            if flags & F_OBJECT != 0 {
                let (t, o) = read_term(body, off)?;
                q.object = Some(t);
                off = o;
            }
            if flags & F_LABEL != 0 {
                let (n, o) = read_node(body, off)?;
                q.label = Some(n);
                off = o;
            }
            WireMessage::Strict(q)
        } else {
            let mut q = WireQuad::default();
            if flags & F_SUBJECT != 0 {
                let (t, o) = read_term(body, off)?;
                q.subject = Some(t);
                off = o;
            }
            if flags & F_PREDICATE != 0 {
                let (t, o) = read_term(body, off)?;
                q.predicate = Some(t);
                off = o;
            }
            if flags & F_OBJECT != 0 {
                let (t, o) = read_term(body, off)?;
                q.object = Some(t);
                off = o;
            }
            if flags & F_LABEL != 0 {
                let (t, o) = read_term(body, off)?;
                q.label = Some(t);
                off = o;
            }
            WireMessage::Lossy(q)
        };
        if off != body.len() {
            return Err(bad("trailing bytes in quad message"));
        }
        Ok(msg)
    }
}
