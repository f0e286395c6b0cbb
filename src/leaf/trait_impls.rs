use super::*;
use crate::traits::{DynBitVec, StaticBitVec};
use std::fmt;

impl Default for Leaf {
    fn default() -> Self {
        Self::new()
    }
}

/// Backing words are elided; `Leaf[size 130, ones 5]` is enough to follow
/// tree surgery in test output.
impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Leaf[size {:4}, ones {:4}]", self.size, self.ones)
    }
}

/// Forward the read-only queries, widening the leaf-local `u32` indices.
impl StaticBitVec for Leaf {
    #[inline]
    fn len(&self) -> u64 {
        self.size as u64
    }

    #[inline]
    fn ones(&self) -> u64 {
        self.ones as u64
    }

    #[inline]
    fn access(&self, index: u64) -> bool {
        Leaf::access(self, index as u32)
    }

    #[inline]
    fn read(&self, index: u64, len: u64, dst: &mut [u64], j: u64) {
        Leaf::read(self, index as u32, len as u32, dst, j)
    }

    #[inline]
    fn rank1(&self, index: u64) -> u64 {
        Leaf::rank1(self, index as u32) as u64
    }

    #[inline]
    fn select1(&self, j: u64) -> u64 {
        Leaf::select1(self, j as u32) as u64
    }

    #[inline]
    fn select0(&self, j: u64) -> u64 {
        Leaf::select0(self, j as u32) as u64
    }

    #[inline]
    fn next1(&self, index: u64) -> Option<u64> {
        Leaf::next1(self, index as u32).map(u64::from)
    }

    #[inline]
    fn next0(&self, index: u64) -> Option<u64> {
        Leaf::next0(self, index as u32).map(u64::from)
    }
}

impl DynBitVec for Leaf {
    #[inline]
    fn write(&mut self, index: u64, bit: bool) -> i32 {
        Leaf::write(self, index as u32, bit)
    }

    #[inline]
    fn insert(&mut self, index: u64, bit: bool) {
        Leaf::insert(self, index as u32, bit)
    }

    #[inline]
    fn delete(&mut self, index: u64) -> i32 {
        -(Leaf::delete(self, index as u32) as i32)
    }
}
