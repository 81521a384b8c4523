//! Bump allocator with checkpoint/rollback
//!
//! An [`Arena`] is a fixed-capacity region carved front to back. Allocations
//! are handed out as [`Span`]s (word offsets into the region) instead of
//! addresses, so nothing outside the arena ever holds a pointer into it.
//!
//! Reclamation is bulk only:
//!
//! - [`Arena::clear`] wipes the whole region.
//! - [`Arena::checkpoint`] / [`Arena::rollback`] free everything allocated
//!   since the matching checkpoint. Checkpoints nest.
//!
//! Reclaimed bytes are zeroed, so every fresh allocation reads as zero.
//!
//! # Example
//!
//! ```
//! use nfnn::arena::Arena;
//!
//! let mut arena = Arena::new(1024).unwrap();
//! arena.checkpoint();
//! let span = arena.alloc_f32(4).unwrap();
//! arena.get_mut(span).unwrap().fill(3.0);
//! arena.rollback().unwrap();
//!
//! assert_eq!(arena.used(), 0);
//! assert!(arena.get(span).unwrap().iter().all(|&x| x == 0.0));
//! ```

use crate::{Error, Result};


/// Size in bytes of one storage word.
pub const WORD: usize = std::mem::size_of::<f32>();

/// A contiguous run of `f32` words inside an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    offset: usize,
    len: usize,
}

impl Span {
    /// Word offset from the start of the arena
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of `f32` words
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the span covers no words
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the span in bytes
    pub fn byte_size(&self) -> usize {
        self.len * WORD
    }

    /// Split into `[0, mid)` and `[mid, len)`
    pub(crate) fn split_at(self, mid: usize) -> (Span, Span) {
        let mid = mid.min(self.len);
        (
            Span {
                offset: self.offset,
                len: mid,
            },
            Span {
                offset: self.offset + mid,
                len: self.len - mid,
            },
        )
    }

    fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Fixed-capacity bump allocator
#[derive(Debug)]
pub struct Arena {
    storage: Vec<f32>,
    /// Bytes handed out so far
    used: usize,
    /// Saved `used` offsets, innermost last
    checkpoints: Vec<usize>,
}

impl Arena {
    /// Acquire a zero-filled region of `capacity` bytes.
    ///
    /// The capacity is rounded down to a whole number of words.
    pub fn new(capacity: usize) -> Result<Self> {
        let words = capacity / WORD;
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(words)
            .map_err(|_| Error::ArenaInit(capacity))?;
        storage.resize(words, 0.0);

        log::debug!("arena initialised with {} bytes", words * WORD);

        Ok(Self {
            storage,
            used: 0,
            checkpoints: Vec::new(),
        })
    }

    /// Total capacity in bytes
    pub fn capacity(&self) -> usize {
        self.storage.len() * WORD
    }

    /// Bytes currently allocated
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes still available
    pub fn remaining(&self) -> usize {
        self.capacity() - self.used
    }

    /// Number of checkpoints currently saved
    pub fn checkpoint_depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// Allocate the next `size` bytes, rounded up to whole words.
    ///
    /// The returned span is zero-filled. Fails with [`Error::ArenaOverflow`]
    /// when the request does not fit; the arena is left untouched.
    pub fn alloc(&mut self, size: usize) -> Result<Span> {
        let words = size.div_ceil(WORD);
        let bytes = words * WORD;

        if bytes > self.remaining() {
            return Err(Error::ArenaOverflow {
                requested: bytes,
                used: self.used,
                capacity: self.capacity(),
            });
        }

        let span = Span {
            offset: self.used / WORD,
            len: words,
        };
        self.used += bytes;
        self.storage[span.range()].fill(0.0);

        Ok(span)
    }

    /// Allocate room for `len` floats
    pub fn alloc_f32(&mut self, len: usize) -> Result<Span> {
        let size = len.checked_mul(WORD).ok_or(Error::ArenaOverflow {
            requested: usize::MAX,
            used: self.used,
            capacity: self.capacity(),
        })?;
        self.alloc(size)
    }

    /// Zero the whole region and forget every allocation and checkpoint
    pub fn clear(&mut self) {
        self.storage.fill(0.0);
        self.used = 0;
        self.checkpoints.clear();
    }

    /// Save the current offset. Returns the new checkpoint depth.
    pub fn checkpoint(&mut self) -> usize {
        self.checkpoints.push(self.used);
        self.checkpoints.len()
    }

    /// Free and zero everything allocated since the innermost checkpoint.
    ///
    /// Returns the restored offset.
    pub fn rollback(&mut self) -> Result<usize> {
        let mark = self.checkpoints.pop().ok_or(Error::NoCheckpoint)?;
        self.storage[mark / WORD..self.used / WORD].fill(0.0);
        self.used = mark;
        Ok(mark)
    }

    /// Read the words covered by `span`
    pub fn get(&self, span: Span) -> Option<&[f32]> {
        self.storage.get(span.range())
    }

    /// Mutably borrow the words covered by `span`
    pub fn get_mut(&mut self, span: Span) -> Option<&mut [f32]> {
        self.storage.get_mut(span.range())
    }
}
