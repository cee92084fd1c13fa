/// A storage row: the index of one entity's values across every column of an archetype.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Row(usize);

impl From<usize> for Row {
    #[inline]
    fn from(value: usize) -> Self {
        Self::new(value)
    }
}

impl Row {
    /// Construct a row from an index.
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the index used in the column vecs.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }

    /// The last row of storage holding `len` rows, or `None` when it is empty.
    #[inline]
    pub fn last_of(len: usize) -> Option<Self> {
        len.checked_sub(1).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_of_len() {
        assert_eq!(Row::last_of(0), None);
        assert_eq!(Row::last_of(1), Some(Row::new(0)));
        assert_eq!(Row::last_of(5), Some(Row::new(4)));
    }
}
