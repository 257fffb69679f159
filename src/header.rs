//! Stream header: magic, version, and the one-time options message.

use std::io::{self, Read, Write};

use crate::codec::{MsgReader, MsgWriter};
use crate::reader::{DqError, Result};

/// First four bytes of every dquads stream.
pub const MAGIC: [u8; 4] = [0x00, b'd', b'q', 0x00];

/// The only wire version this crate reads and writes.
pub const CURRENT_VERSION: u32 = 1;

const OPT_FULL: u8 = 1;
const OPT_NOT_STRICT: u8 = 1 << 1;

/// Per-stream options, written once right after the fixed header and
/// immutable for the stream's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Disable field compaction. Streams get larger, but messages can be
    /// skipped without decoding.
    pub full: bool,
    /// Only accept quads whose values satisfy RDF placement rules.
    pub strict: bool,
}

impl Options {
    fn to_flags(self) -> u8 {
        let mut flags = 0u8;
        if self.full {
            flags |= OPT_FULL;
        }
        // The wire stores the inverted strict flag.
        if !self.strict {
            flags |= OPT_NOT_STRICT;
        }
        flags
    }

    fn from_flags(flags: u8) -> Result<Self> {
        if flags & !(OPT_FULL | OPT_NOT_STRICT) != 0 {
            return Err(DqError::Format("unknown option flags".into()));
        }
        Ok(Options {
            full: flags & OPT_FULL != 0,
            strict: flags & OPT_NOT_STRICT == 0,
        })
    }
}

/// Emit the fixed header and the options message.
pub fn write_header<W: Write>(w: &mut W, opts: Options) -> Result<()> {
    let mut fixed = [0u8; 8];
    fixed[..4].copy_from_slice(&MAGIC);
    fixed[4..8].copy_from_slice(&CURRENT_VERSION.to_le_bytes());
    w.write_all(&fixed)?;
    MsgWriter::new(w).write_msg(&[opts.to_flags()])?;
    Ok(())
}

/// Read and check the fixed header, then the options message.
pub fn read_header<R: Read>(r: &mut R, max_size: usize) -> Result<Options> {
    let mut fixed = [0u8; 8];
    r.read_exact(&mut fixed)?;
    if fixed[..4] != MAGIC {
        return Err(DqError::Format("not a dquads stream".into()));
    }
    let version = u32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
    if version != CURRENT_VERSION {
        return Err(DqError::Format(format!(
            "unsupported dquads version {version}"
        )));
    }
    let mut mr = MsgReader::new(r, max_size);
    let body = mr.read_msg()?.ok_or_else(|| {
        DqError::from(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "missing options header",
        ))
    })?;
    if body.len() > 1 {
        return Err(DqError::Format("malformed options header".into()));
    }
    // An empty options body decodes as all-zero flags.
    Options::from_flags(body.first().copied().unwrap_or(0))
}
