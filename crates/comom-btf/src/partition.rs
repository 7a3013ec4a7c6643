//! Partition of a block axis into consecutive leaf extents.

/// Partition of an axis into blocks.
///
/// A secondary block spans the leaves of two macro blocks; its row axis is
/// partitioned by the row extents of one, its column axis by the column
/// extents of the other. A class view keeps a leading prefix of blocks,
/// so the retained corner is read straight off the offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPartition {
    /// Size of each block.
    block_sizes: Vec<usize>,
    /// Cumulative offsets: `[0, s0, s0+s1, ..., total_dim]`.
    offsets: Vec<usize>,
}

impl BlockPartition {
    /// Create a new partition from block sizes.
    pub fn new(block_sizes: Vec<usize>) -> Self {
        let mut offsets = Vec::with_capacity(block_sizes.len() + 1);
        offsets.push(0);
        let mut cumsum = 0;
        for &size in &block_sizes {
            cumsum += size;
            offsets.push(cumsum);
        }
        Self {
            block_sizes,
            offsets,
        }
    }

    /// Get the number of blocks.
    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.block_sizes.len()
    }

    /// Get the total dimension (sum of all block sizes).
    #[inline]
    pub fn total_dim(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Extent covered by the first `num_blocks` blocks.
    #[inline]
    pub fn prefix_dim(&self, num_blocks: usize) -> usize {
        self.offsets[num_blocks.min(self.num_blocks())]
    }

    /// Block containing `index`, if any.
    pub fn block_of(&self, index: usize) -> Option<usize> {
        if index >= self.total_dim() {
            return None;
        }
        // first offset strictly greater than index, minus one
        Some(self.offsets.partition_point(|&o| o <= index) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_offsets() {
        let p = BlockPartition::new(vec![4, 4, 4]);
        assert_eq!(p.num_blocks(), 3);
        assert_eq!(p.total_dim(), 12);
        assert_eq!(p.block_of(7), Some(1));
    }

    #[test]
    fn test_prefix_and_lookup() {
        let p = BlockPartition::new(vec![2, 0, 3]);
        assert_eq!(p.prefix_dim(0), 0);
        assert_eq!(p.prefix_dim(1), 2);
        assert_eq!(p.prefix_dim(3), 5);
        assert_eq!(p.prefix_dim(7), 5);
        assert_eq!(p.block_of(0), Some(0));
        assert_eq!(p.block_of(1), Some(0));
        assert_eq!(p.block_of(2), Some(2));
        assert_eq!(p.block_of(4), Some(2));
        assert_eq!(p.block_of(5), None);
    }
}
