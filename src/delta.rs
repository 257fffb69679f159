//! Last-seen field state shared by delta compaction and expansion.

use crate::writer::{Quad, Term};

/// The last subject, predicate, and object materialized on a stream.
///
/// Owned by exactly one [`crate::Writer`] or [`crate::Reader`]; never reset
/// after construction. [`DeltaState::compact`] and [`DeltaState::expand`]
/// are symmetric so the two directions cannot drift apart.
#[derive(Debug, Default)]
pub struct DeltaState {
    s: Option<Term>,
    p: Option<Term>,
    o: Option<Term>,
}

impl DeltaState {
    /// Blank out the fields of `q` that repeat the last committed quad.
    /// Pure; call [`DeltaState::commit`] once the quad was actually written.
    pub fn compact(&self, mut q: Quad) -> Quad {
        if q.subject == self.s {
            q.subject = None;
        }
        if q.predicate == self.p {
            q.predicate = None;
        }
        if q.object == self.o {
            q.object = None;
        }
        q
    }

    /// Remember the present fields of a quad that was written.
    pub fn commit(&mut self, q: &Quad) {
        if q.subject.is_some() {
            self.s.clone_from(&q.subject);
        }
        if q.predicate.is_some() {
            self.p.clone_from(&q.predicate);
        }
        if q.object.is_some() {
            self.o.clone_from(&q.object);
        }
    }

    /// Fill absent fields of a decoded quad from the last seen values, and
    /// remember the present ones.
    pub fn expand(&mut self, mut q: Quad) -> Quad {
        match &q.subject {
            None => q.subject = self.s.clone(),
            Some(_) => self.s.clone_from(&q.subject),
        }
        match &q.predicate {
            None => q.predicate = self.p.clone(),
            Some(_) => self.p.clone_from(&q.predicate),
        }
        match &q.object {
            None => q.object = self.o.clone(),
            Some(_) => self.o.clone_from(&q.object),
        }
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(s: &str) -> Term {
        Term::Iri(s.into())
    }

    fn quad(s: &str, p: &str, o: &str) -> Quad {
        Quad::new(iri(s), iri(p), iri(o))
    }

    #[test]
    fn compact_then_expand_is_identity() {
        let mut enc = DeltaState::default();
        let mut dec = DeltaState::default();
        let stream = [
            quad("a", "p", "x"),
            quad("a", "p", "y"),
            quad("b", "p", "y"),
            quad("b", "q", "y"),
            quad("b", "q", "y"),
        ];
        for q in stream {
            let wire = enc.compact(q.clone());
            enc.commit(&q);
            assert_eq!(dec.expand(wire), q);
        }
    }

    #[test]
    fn first_quad_is_never_compacted() {
        let state = DeltaState::default();
        let q = quad("a", "p", "x");
        assert_eq!(state.compact(q.clone()), q);
    }

    #[test]
    fn repeated_fields_are_blanked() {
        let mut state = DeltaState::default();
        let first = quad("a", "p", "x");
        state.commit(&first);
        let wire = state.compact(quad("a", "p", "y"));
        assert!(wire.subject.is_none());
        assert!(wire.predicate.is_none());
        assert_eq!(wire.object, Some(iri("y")));
    }
}
