use std::ops::Range;

/// A [`Span`] is a half-open byte range `[lo, hi)` into a document. It is used to locate a region
/// or an entry within the source text. An invariant to be maintained is that `lo <= hi`. It is
/// typically the case that your code has logic bugs if this invariant is violated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub lo: usize,
    pub hi: usize,
}

impl Span {
    /// Construct a new span. Will panic if `lo > hi`. Prefer this constructor to construct a new
    /// [`Span`] over using direct struct initialization.
    pub const fn new(lo: usize, hi: usize) -> Self {
        assert!(lo <= hi, "`lo` must not be larger than `hi`");
        Span { lo, hi }
    }

    pub const fn len(&self) -> usize {
        self.hi - self.lo
    }

    /// The span strictly between the first and last byte, i.e. what lies between a pair of
    /// single-byte delimiters.
    pub fn interior(&self) -> Span {
        debug_assert!(self.len() >= 2, "span too short to have delimiters");
        Span::new(self.lo + 1, self.hi - 1)
    }

    pub fn slice<'s>(&self, src: &'s str) -> &'s str {
        &src[self.lo..self.hi]
    }

    /// Convert a byte span into a char-indexed range, which is what `ariadne` labels expect.
    pub fn char_range(&self, src: &str) -> Range<usize> {
        let lo = src[..self.lo].chars().count();
        let hi = lo + src[self.lo..self.hi].chars().count();
        lo..hi
    }
}
