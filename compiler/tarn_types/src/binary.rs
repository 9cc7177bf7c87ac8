//! Structural type signatures.
//!
//! A [`BinaryType`] is the canonical encoding of a type's shape: a
//! pre-order walk that emits one [`Tag`] per node followed by the node's
//! payload and children. Equal shapes produce equal signatures, so the
//! signature serves as the key of the specialization cache and as the
//! equality test behind homogeneous tuple detection.
//!
//! # Design
//!
//! - Function nodes embed their declaration's [`DeclarationId`], so two
//!   textually identical lambdas never share a specialization.
//! - The byte stream is padded to an even length and packed into `u16`
//!   units; the hash is computed once at construction, making equality and
//!   hashing of signatures cheap.
//! - Builders draw their buffers from a process-wide pool, since signatures
//!   are computed constantly and recursively during resolution.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use crossbeam::queue::ArrayQueue;
use rustc_hash::FxHasher;
use tarn_ir::{DeclarationId, IntWidth};

/// Number of idle buffers kept for reuse.
const POOL_CAPACITY: usize = 64;

/// Initial capacity of a freshly allocated buffer.
const BUFFER_CAPACITY: usize = 64;

static BUFFER_POOL: LazyLock<ArrayQueue<Vec<u8>>> =
    LazyLock::new(|| ArrayQueue::new(POOL_CAPACITY));

/// Node discriminator in a structural signature.
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Tag {
    Bool = 0x01,
    Int = 0x02,
    UInt = 0x03,
    Void = 0x04,
    Never = 0x05,
    PlaceHolder = 0x06,
    Not = 0x07,
    Pointer = 0x08,
    MutPointer = 0x09,
    TupleStart = 0x0A,
    TupleEnd = 0x0B,
    FunctionStart = 0x0C,
    FunctionEnd = 0x0D,
}

/// Accumulates a signature. Buffers return to the pool on drop.
pub struct BinaryTypeBuilder {
    buffer: Vec<u8>,
}

impl BinaryTypeBuilder {
    pub fn new() -> Self {
        let buffer = BUFFER_POOL
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(BUFFER_CAPACITY));
        BinaryTypeBuilder { buffer }
    }

    #[inline]
    pub fn push_tag(&mut self, tag: Tag) {
        self.buffer.push(tag as u8);
    }

    #[inline]
    pub fn push_byte(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    /// Width payload of an integer node.
    #[inline]
    pub fn push_width(&mut self, width: IntWidth) {
        #[allow(clippy::cast_possible_truncation, reason = "widths are at most 16 bytes")]
        self.push_byte(width.bytes() as u8);
    }

    #[inline]
    pub fn push_declaration(&mut self, id: DeclarationId) {
        self.buffer.extend_from_slice(&id.to_bytes());
    }

    /// Number of bytes pushed so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn finish(self) -> BinaryType {
        let units: Arc<[u16]> = self
            .buffer
            .chunks(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
            .collect();
        let mut hasher = FxHasher::default();
        units.hash(&mut hasher);
        BinaryType {
            hash: hasher.finish(),
            units,
        }
    }
}

impl Default for BinaryTypeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BinaryTypeBuilder {
    fn drop(&mut self) {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        // a full pool just frees the buffer
        let _ = BUFFER_POOL.push(buffer);
    }
}

/// Canonical structural signature of a type.
#[derive(Clone)]
pub struct BinaryType {
    hash: u64,
    units: Arc<[u16]>,
}

impl BinaryType {
    /// Encoded length in `u16` units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl PartialEq for BinaryType {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && (Arc::ptr_eq(&self.units, &other.units) || self.units == other.units)
    }
}

impl Eq for BinaryType {}

impl Hash for BinaryType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for BinaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryType(")?;
        for unit in self.units.iter() {
            write!(f, "{unit:04x}")?;
        }
        write!(f, ")")
    }
}
