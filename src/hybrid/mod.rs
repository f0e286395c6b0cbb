use crate::bits::words_for;
use crate::leaf::{Leaf, MAX_BITS, NEW_BITS};
use crate::static_vector::StaticVector;
use either::{Left, Right};
use std::io::{self, Read, Write};
use std::mem;

type Side<T> = either::Either<T, T>;

/// Fraction of the whole bit vector a subtree may span and still be
/// flattened by read traffic.
const EPSILON: f64 = 0.10;

/// Weight balance factor, in (3/5, 1): neither child may span more than
/// `ALPHA` of its parent after a rebuild decision.
const ALPHA: f64 = 0.65;

/// Fewest bits moved that make a transfer between sibling leaves worth it.
const TRANSFER_MIN: u32 = (MAX_BITS as f64 * 0.125) as u32;

/// Smallest combined child size at which a rebuild for balance is
/// considered.
const MIN_BALANCE_BITS: u64 = 5 * MAX_BITS as u64;

/// Fill fraction below which a subtree is rebuilt after a delete. Must be
/// at most `GAMMA / 2`.
const MIN_FILL: f64 = 0.3;

/// Default read/length ratio at which a read-heavy subtree is flattened.
pub const DEFAULT_THETA: f32 = 0.01;

/// One region of the bit sequence, in whichever shape last suited it.
#[derive(Debug, Clone)]
enum Hybrid {
    /// short or recently edited: mutable in place
    Leaf(Leaf),
    /// long and read-mostly: preprocessed for rank/select
    Static(Box<StaticVector>),
    /// long and edited: split in two, routed by length or rank
    Internal(Box<Internal>),
}

/// Interior node of the hybrid tree.
#[derive(Debug, Clone)]
struct Internal {
    /// bits in this subtree
    size: u64,
    /// 1-bits in this subtree
    ones: u64,
    /// leaves in this subtree; a static child counts one leaf per
    /// `NEW_BITS` started
    leaves: u64,
    /// reads routed through this node since its last update
    accesses: u64,
    left: Hybrid,
    right: Hybrid,
}

impl Internal {
    /// Route a position: it stays in the left child or shifts into the
    /// right one.
    fn route(&self, index: u64) -> Side<u64> {
        let lsize = self.left.len();
        if index < lsize {
            Left(index)
        } else {
            Right(index - lsize)
        }
    }

    /// Route a 1-rank (1-based).
    fn route_ones(&self, j: u64) -> Side<u64> {
        let lones = self.left.ones();
        if j <= lones {
            Left(j)
        } else {
            Right(j - lones)
        }
    }

    /// Route a 0-rank (1-based).
    fn route_zeros(&self, j: u64) -> Side<u64> {
        let lzeros = self.left.len() - self.left.ones();
        if j <= lzeros {
            Left(j)
        } else {
            Right(j - lzeros)
        }
    }

    /// A subtree is flattened once it has seen `theta` times its length in
    /// reads since its last update, unless it spans too much of the whole
    /// vector (`n` bits) for the rebuild to stay cheap.
    fn must_flatten(&self, n: u64, theta: f32) -> bool {
        self.size as f64 <= EPSILON * n as f64
            && self.accesses as f64 >= theta as f64 * self.size as f64
    }

    fn add_leaves(&mut self, delta: i64) {
        self.leaves = (self.leaves as i64 + delta) as u64;
    }

    /// Move bits from the left leaf child to the right one. True if a
    /// worthwhile amount could be moved.
    fn transfer_to_right(&mut self) -> bool {
        let (Hybrid::Leaf(l), Hybrid::Leaf(r)) = (&mut self.left, &mut self.right) else {
            return false;
        };
        let trf = (l.len() - r.len() + 1) / 2;
        if trf < TRANSFER_MIN {
            return false;
        }
        r.steal_back(l, trf);
        true
    }

    /// Move bits from the right leaf child to the left one. True if a
    /// worthwhile amount could be moved.
    fn transfer_to_left(&mut self) -> bool {
        let (Hybrid::Leaf(l), Hybrid::Leaf(r)) = (&mut self.left, &mut self.right) else {
            return false;
        };
        let trf = (r.len() - l.len() + 1) / 2;
        if trf < TRANSFER_MIN {
            return false;
        }
        l.steal_front(r, trf);
        true
    }
}

/// Predict the halves a rebuild would create and check that neither breaks
/// the balance bound once the pending insert/delete lands.
fn can_balance(n: u64, dleft: i64, dright: i64) -> bool {
    let left = (n.div_ceil(NEW_BITS) / 2) * NEW_BITS;
    let right = n - left;
    let total = (n as i64 + dleft + dright) as f64;
    (left as i64 + dleft) as f64 <= ALPHA * total && (right as i64 + dright) as f64 <= ALPHA * total
}

/// Bottom-up split of a word buffer into a tree whose fresh leaves span
/// `NEW_BITS` each. Only the half holding `index` keeps splitting; the
/// other half stays flat, so the path to `index` ends in a leaf without
/// shattering the rest.
fn split_words(words: &[u64], n: u64, ones: u64, index: u64) -> Hybrid {
    let nblock = n.div_ceil(NEW_BITS);
    if nblock < 2 {
        return Hybrid::Leaf(Leaf::from_words(words, n as u32));
    }
    let lbits = (nblock / 2) * NEW_BITS;
    let mid = words_for(lbits);
    let (left, right);
    if index < lbits {
        let flat = Hybrid::from_words(&words[mid..], n - lbits);
        left = split_words(&words[..mid], lbits, ones - flat.ones(), index);
        right = flat;
    } else {
        let flat = Hybrid::from_words(&words[..mid], lbits);
        right = split_words(&words[mid..], n - lbits, ones - flat.ones(), index - lbits);
        left = flat;
    }
    Hybrid::Internal(Box::new(Internal {
        size: n,
        ones,
        leaves: nblock,
        accesses: 0,
        left,
        right,
    }))
}

impl Hybrid {
    /// Throwaway value for `mem::replace` while a node changes shape.
    fn hole() -> Hybrid {
        Hybrid::Static(Box::new(StaticVector::from_bits(Vec::new(), 0)))
    }

    /// Leaf for up to `NEW_BITS` bits, preprocessed block beyond.
    fn from_words(words: &[u64], n: u64) -> Hybrid {
        if n > NEW_BITS {
            let owned = words[..words_for(n)].to_vec();
            Hybrid::Static(Box::new(StaticVector::from_bits(owned, n)))
        } else {
            Hybrid::Leaf(Leaf::from_words(words, n as u32))
        }
    }

    fn len(&self) -> u64 {
        match self {
            Hybrid::Leaf(l) => l.len() as u64,
            Hybrid::Static(s) => s.len(),
            Hybrid::Internal(d) => d.size,
        }
    }

    fn ones(&self) -> u64 {
        match self {
            Hybrid::Leaf(l) => l.ones() as u64,
            Hybrid::Static(s) => s.ones(),
            Hybrid::Internal(d) => d.ones,
        }
    }

    /// Number of leaves this subtree stands for.
    fn leaves(&self) -> u64 {
        match self {
            Hybrid::Leaf(_) => 1,
            Hybrid::Static(s) => s.len().div_ceil(NEW_BITS),
            Hybrid::Internal(d) => d.leaves,
        }
    }

    fn space_words(&self) -> u64 {
        let own = (mem::size_of::<Hybrid>() as u64).div_ceil(8);
        match self {
            Hybrid::Leaf(l) => own + l.space_words(),
            Hybrid::Static(s) => own + s.space_words(),
            Hybrid::Internal(d) => {
                own + (mem::size_of::<Internal>() as u64).div_ceil(8)
                    + d.left.space_words()
                    + d.right.space_words()
            }
        }
    }

    // TRANSITIONS

    /// Internal → Leaf or Static: concatenate every descendant bit into a
    /// flat node. Returns the change in leaf count; no-op on flat nodes.
    fn flatten(&mut self) -> i64 {
        if !matches!(self, Hybrid::Internal(_)) {
            return 0;
        }
        let len = self.len();
        let old = self.leaves() as i64;
        let mut words = vec![0u64; words_for(len)];
        self.read_into(0, len, &mut words, 0);
        *self = if len > NEW_BITS {
            Hybrid::Static(Box::new(StaticVector::from_bits(words, len)))
        } else {
            Hybrid::Leaf(Leaf::from_words(&words, len as u32))
        };
        self.leaves() as i64 - old
    }

    /// Rebuild from scratch around `index`: flatten into a buffer, then
    /// split back so the weight invariant holds again. Returns the change
    /// in leaf count.
    fn rebuild_around(&mut self, index: u64) -> i64 {
        let len = self.len();
        let ones = self.ones();
        let old = self.leaves() as i64;
        let mut words = vec![0u64; words_for(len)];
        self.read_into(0, len, &mut words, 0);
        *self = split_words(&words, len, ones, index);
        self.leaves() as i64 - old
    }

    /// Static → Internal, carving a leaf out around `index` and keeping the
    /// rest preprocessed. Leaf count is unchanged.
    fn split_static(&mut self, index: u64) {
        let Hybrid::Static(s) = mem::replace(self, Hybrid::hole()) else {
            unreachable!("split_static on a non-static node");
        };
        *self = split_words(&s.data, s.len(), s.ones(), index);
    }

    /// Internal with two leaf children that fit one → Leaf.
    fn merge_children(&mut self) {
        let Hybrid::Internal(node) = mem::replace(self, Hybrid::hole()) else {
            unreachable!("merge on a flat node");
        };
        let Internal {
            left: Hybrid::Leaf(mut l),
            right: Hybrid::Leaf(r),
            ..
        } = *node
        else {
            unreachable!("merge with non-leaf children");
        };
        l.extend_from(&r);
        *self = Hybrid::Leaf(l);
    }

    // READ-LIKE OPERATIONS
    //
    // Every descent through an internal node bumps its read counter and may
    // flatten it on the spot. The change in leaf count is handed back up so
    // each ancestor can refresh its own `leaves` field as the calls return.

    fn access(&mut self, index: u64, n: u64, theta: f32) -> (bool, i64) {
        let mut delta = 0;
        if let Hybrid::Internal(node) = self {
            node.accesses += 1;
            if !node.must_flatten(n, theta) {
                let (bit, d) = match node.route(index) {
                    Left(i) => node.left.access(i, n, theta),
                    Right(i) => node.right.access(i, n, theta),
                };
                node.add_leaves(d);
                return (bit, d);
            }
            delta = self.flatten();
        }
        let bit = match self {
            Hybrid::Leaf(l) => l.access(index as u32),
            Hybrid::Static(s) => s.access(index),
            Hybrid::Internal(_) => unreachable!(),
        };
        (bit, delta)
    }

    /// Read without touching the counters; transitions collect through this.
    fn read_into(&self, index: u64, len: u64, dst: &mut [u64], j: u64) {
        match self {
            Hybrid::Leaf(l) => l.read(index as u32, len as u32, dst, j),
            Hybrid::Static(s) => s.read(index, len, dst, j),
            Hybrid::Internal(d) => {
                let lsize = d.left.len();
                if index + len <= lsize {
                    d.left.read_into(index, len, dst, j);
                } else if index >= lsize {
                    d.right.read_into(index - lsize, len, dst, j);
                } else {
                    let lpart = lsize - index;
                    d.left.read_into(index, lpart, dst, j);
                    d.right.read_into(0, len - lpart, dst, j + lpart);
                }
            }
        }
    }

    fn read(&mut self, index: u64, len: u64, dst: &mut [u64], j: u64, n: u64, theta: f32) -> i64 {
        let mut delta = 0;
        if let Hybrid::Internal(node) = self {
            node.accesses += 1;
            if !node.must_flatten(n, theta) {
                let lsize = node.left.len();
                let d = if index + len <= lsize {
                    node.left.read(index, len, dst, j, n, theta)
                } else if index >= lsize {
                    node.right.read(index - lsize, len, dst, j, n, theta)
                } else {
                    let lpart = lsize - index;
                    let dl = node.left.read(index, lpart, dst, j, n, theta);
                    dl + node.right.read(0, len - lpart, dst, j + lpart, n, theta)
                };
                node.add_leaves(d);
                return d;
            }
            delta = self.flatten();
        }
        self.read_into(index, len, dst, j);
        delta
    }

    fn rank1(&mut self, index: u64, n: u64, theta: f32) -> (u64, i64) {
        let mut delta = 0;
        if let Hybrid::Internal(node) = self {
            node.accesses += 1;
            if !node.must_flatten(n, theta) {
                let (rank, d) = match node.route(index) {
                    Left(i) => node.left.rank1(i, n, theta),
                    Right(i) => {
                        let lones = node.left.ones();
                        let (r, d) = node.right.rank1(i, n, theta);
                        (lones + r, d)
                    }
                };
                node.add_leaves(d);
                return (rank, d);
            }
            delta = self.flatten();
        }
        let rank = match self {
            Hybrid::Leaf(l) => l.rank1(index as u32) as u64,
            Hybrid::Static(s) => s.rank1(index),
            Hybrid::Internal(_) => unreachable!(),
        };
        (rank, delta)
    }

    fn select1(&mut self, j: u64, n: u64, theta: f32) -> (u64, i64) {
        let mut delta = 0;
        if let Hybrid::Internal(node) = self {
            node.accesses += 1;
            if !node.must_flatten(n, theta) {
                let (pos, d) = match node.route_ones(j) {
                    Left(j) => node.left.select1(j, n, theta),
                    Right(j) => {
                        let lsize = node.left.len();
                        let (p, d) = node.right.select1(j, n, theta);
                        (lsize + p, d)
                    }
                };
                node.add_leaves(d);
                return (pos, d);
            }
            delta = self.flatten();
        }
        let pos = match self {
            Hybrid::Leaf(l) => l.select1(j as u32) as u64,
            Hybrid::Static(s) => s.select1(j),
            Hybrid::Internal(_) => unreachable!(),
        };
        (pos, delta)
    }

    fn select0(&mut self, j: u64, n: u64, theta: f32) -> (u64, i64) {
        let mut delta = 0;
        if let Hybrid::Internal(node) = self {
            node.accesses += 1;
            if !node.must_flatten(n, theta) {
                let (pos, d) = match node.route_zeros(j) {
                    Left(j) => node.left.select0(j, n, theta),
                    Right(j) => {
                        let lsize = node.left.len();
                        let (p, d) = node.right.select0(j, n, theta);
                        (lsize + p, d)
                    }
                };
                node.add_leaves(d);
                return (pos, d);
            }
            delta = self.flatten();
        }
        let pos = match self {
            Hybrid::Leaf(l) => l.select0(j as u32) as u64,
            Hybrid::Static(s) => s.select0(j),
            Hybrid::Internal(_) => unreachable!(),
        };
        (pos, delta)
    }

    fn next1(&mut self, index: u64, n: u64, theta: f32) -> (Option<u64>, i64) {
        let mut delta = 0;
        if let Hybrid::Internal(node) = self {
            if node.ones == 0 {
                return (None, 0); // settled without reading any region
            }
            node.accesses += 1;
            if !node.must_flatten(n, theta) {
                let lsize = node.left.len();
                let mut d = 0;
                if index < lsize {
                    let (hit, dl) = node.left.next1(index, n, theta);
                    d += dl;
                    if let Some(pos) = hit {
                        node.add_leaves(d);
                        return (Some(pos), d);
                    }
                }
                let (hit, dr) = node.right.next1(index.saturating_sub(lsize), n, theta);
                d += dr;
                node.add_leaves(d);
                return (hit.map(|pos| lsize + pos), d);
            }
            delta = self.flatten();
        }
        let hit = match self {
            Hybrid::Leaf(l) => l.next1(index as u32).map(u64::from),
            Hybrid::Static(s) => s.next1(index),
            Hybrid::Internal(_) => unreachable!(),
        };
        (hit, delta)
    }

    fn next0(&mut self, index: u64, n: u64, theta: f32) -> (Option<u64>, i64) {
        let mut delta = 0;
        if let Hybrid::Internal(node) = self {
            if node.ones == node.size {
                return (None, 0);
            }
            node.accesses += 1;
            if !node.must_flatten(n, theta) {
                let lsize = node.left.len();
                let mut d = 0;
                if index < lsize {
                    let (hit, dl) = node.left.next0(index, n, theta);
                    d += dl;
                    if let Some(pos) = hit {
                        node.add_leaves(d);
                        return (Some(pos), d);
                    }
                }
                let (hit, dr) = node.right.next0(index.saturating_sub(lsize), n, theta);
                d += dr;
                node.add_leaves(d);
                return (hit.map(|pos| lsize + pos), d);
            }
            delta = self.flatten();
        }
        let hit = match self {
            Hybrid::Leaf(l) => l.next0(index as u32).map(u64::from),
            Hybrid::Static(s) => s.next0(index),
            Hybrid::Internal(_) => unreachable!(),
        };
        (hit, delta)
    }

    // MUTATING OPERATIONS
    //
    // Updates reset the read counters on their way down. A static node hit
    // by any update splits first; a full leaf splits in two; a lopsided
    // subtree is rebuilt before the update re-enters it.

    fn write(&mut self, index: u64, bit: bool) -> i32 {
        if matches!(self, Hybrid::Static(_)) {
            self.split_static(index);
        }
        match self {
            Hybrid::Leaf(l) => l.write(index as u32, bit),
            Hybrid::Internal(node) => {
                node.accesses = 0;
                let dif = match node.route(index) {
                    Left(i) => node.left.write(i, bit),
                    Right(i) => node.right.write(i, bit),
                };
                node.ones = (node.ones as i64 + dif as i64) as u64;
                dif
            }
            Hybrid::Static(_) => unreachable!(),
        }
    }

    fn insert(&mut self, index: u64, bit: bool) -> i64 {
        let mut delta = 0i64;
        if matches!(self, Hybrid::Static(_)) {
            self.split_static(index); // leaf count is unchanged by this
        }
        if let Hybrid::Leaf(leaf) = self {
            if !leaf.is_full() {
                leaf.insert(index as u32, bit);
                return 0;
            }
            let (l, r) = leaf.split_half();
            *self = Hybrid::Internal(Box::new(Internal {
                size: (l.len() + r.len()) as u64,
                ones: (l.ones() + r.ones()) as u64,
                leaves: 2,
                accesses: 0,
                left: Hybrid::Leaf(l),
                right: Hybrid::Leaf(r),
            }));
            delta += 1;
        }
        let Hybrid::Internal(node) = self else {
            unreachable!()
        };
        node.accesses = 0;
        let lsize = node.left.len();
        let rsize = node.right.len();
        let total = lsize + rsize;
        if index < lsize {
            if lsize == MAX_BITS as u64
                && rsize < MAX_BITS as u64
                && node.transfer_to_right()
            {
                // the insert may belong to the other side now
                return delta + self.insert(index, bit);
            }
            if (lsize + 1) as f64 > ALPHA * (total + 1) as f64
                && total >= MIN_BALANCE_BITS
                && can_balance(total, 1, 0)
            {
                delta += self.rebuild_around(index);
                return delta + self.insert(index, bit);
            }
            let d = node.left.insert(index, bit);
            node.add_leaves(d);
            delta += d;
        } else {
            if rsize == MAX_BITS as u64
                && lsize < MAX_BITS as u64
                && node.transfer_to_left()
            {
                return delta + self.insert(index, bit);
            }
            if (rsize + 1) as f64 > ALPHA * (total + 1) as f64
                && total >= MIN_BALANCE_BITS
                && can_balance(total, 0, 1)
            {
                delta += self.rebuild_around(index);
                return delta + self.insert(index, bit);
            }
            let d = node.right.insert(index - lsize, bit);
            node.add_leaves(d);
            delta += d;
        }
        node.size += 1;
        node.ones += bit as u64;
        delta
    }

    fn delete(&mut self, index: u64) -> (bool, i64) {
        let mut delta = 0i64;
        if matches!(self, Hybrid::Static(_)) {
            self.split_static(index);
        }
        if let Hybrid::Leaf(leaf) = self {
            return (leaf.delete(index as u32), 0);
        }
        let Hybrid::Internal(node) = self else {
            unreachable!()
        };
        node.accesses = 0;
        let lsize = node.left.len();
        let rsize = node.right.len();
        let total = lsize + rsize;
        let bit;
        if index < lsize {
            if rsize as f64 > ALPHA * (total - 1) as f64
                && total >= MIN_BALANCE_BITS
                && can_balance(total, -1, 0)
            {
                delta += self.rebuild_around(index);
                // the delete may belong to the other side now
                let (b, d) = self.delete(index);
                return (b, delta + d);
            }
            let (b, d) = node.left.delete(index);
            node.add_leaves(d);
            delta += d;
            bit = b;
            if lsize == 1 {
                // the left child just emptied; its sibling takes this spot
                let right = mem::replace(&mut node.right, Hybrid::hole());
                *self = right;
                return (bit, delta - 1);
            }
        } else {
            if lsize as f64 > ALPHA * (total - 1) as f64
                && total >= MIN_BALANCE_BITS
                && can_balance(total, 0, -1)
            {
                delta += self.rebuild_around(index);
                let (b, d) = self.delete(index);
                return (b, delta + d);
            }
            let (b, d) = node.right.delete(index - lsize);
            node.add_leaves(d);
            delta += d;
            bit = b;
            if rsize == 1 {
                let left = mem::replace(&mut node.left, Hybrid::hole());
                *self = left;
                return (bit, delta - 1);
            }
        }
        node.size -= 1;
        node.ones -= bit as u64;
        if node.size <= NEW_BITS {
            // small enough again; both children are necessarily leaves
            self.merge_children();
            delta -= 1;
        } else if (node.size as f64) < node.leaves as f64 * NEW_BITS as f64 * MIN_FILL {
            delta += self.flatten();
        }
        (bit, delta)
    }

    // VALIDATION

    /// Recompute `(size, ones, leaves)` bottom-up and compare with the
    /// stored aggregates.
    fn check(&self) -> Result<(u64, u64, u64), &'static str> {
        match self {
            Hybrid::Leaf(l) => Ok((l.len() as u64, l.ones() as u64, 1)),
            Hybrid::Static(s) => {
                if s.len() <= NEW_BITS {
                    return Err("static block short enough to be a leaf");
                }
                Ok((s.len(), s.ones(), s.len().div_ceil(NEW_BITS)))
            }
            Hybrid::Internal(d) => {
                let (ls, lo, ll) = d.left.check()?;
                let (rs, ro, rl) = d.right.check()?;
                if d.size != ls + rs {
                    return Err("internal size does not match its children");
                }
                if d.ones != lo + ro {
                    return Err("internal ones does not match its children");
                }
                if d.leaves != ll + rl {
                    return Err("internal leaves does not match its children");
                }
                Ok((d.size, d.ones, d.leaves))
            }
        }
    }
}

/// Adaptive dynamic bit vector of up to `2^64 - 1` bits.
///
/// Regions of the sequence live in whichever shape last suited them: short
/// or recently edited regions as mutable [`Leaf`]s, long read-mostly
/// regions as preprocessed [`StaticVector`]s, and long edited regions as a
/// weight-balanced binary tree over both. The structure reshapes itself as
/// the workload shifts: an update expands the block it lands in, a subtree
/// that has seen [`theta`](Self::theta) times its length in reads since its
/// last update collapses back into a block, and a subtree left sparse by
/// deletes is rebuilt compactly.
///
/// All positions are zero-based and assumed in range; `select` ranks start
/// at 1. Query methods take `&mut self` because even reads maintain the
/// per-subtree counters and may reshape the tree.
///
/// # Examples
/// ```
/// use mutabilis::HybridBitVector;
///
/// let mut bv = HybridBitVector::new();
/// for i in 0..64 {
///     bv.insert(i, i % 2 == 1);
/// }
/// assert_eq!(bv.len(), 64);
/// assert_eq!(bv.ones(), 32);
/// assert_eq!(bv.select1(1), 1);
/// assert_eq!(bv.rank1(63), 32);
/// ```
#[derive(Debug, Clone)]
pub struct HybridBitVector {
    root: Hybrid,
    theta: f32,
}

impl HybridBitVector {
    // CONSTRUCTORS

    /// Constructs a new, empty bit vector.
    pub fn new() -> Self {
        HybridBitVector {
            root: Hybrid::Leaf(Leaf::new()),
            theta: DEFAULT_THETA,
        }
    }

    /// Builds from a word buffer holding `n` bits, taking ownership of the
    /// buffer. Bits past `n` in the last used word are dropped.
    ///
    /// # Panics
    /// If `words` holds fewer than `n` bits.
    pub fn from_bits(words: Vec<u64>, n: u64) -> Self {
        let root = if n > NEW_BITS {
            Hybrid::Static(Box::new(StaticVector::from_bits(words, n)))
        } else {
            Hybrid::Leaf(Leaf::from_words(&words, n as u32))
        };
        HybridBitVector {
            root,
            theta: DEFAULT_THETA,
        }
    }

    // TUNING

    /// Read/length ratio at which a read-heavy subtree is flattened.
    pub fn theta(&self) -> f32 {
        self.theta
    }

    /// Adjust the flatten threshold. Lower values flatten more eagerly;
    /// this is the only runtime-tunable knob.
    pub fn set_theta(&mut self, theta: f32) {
        self.theta = theta;
    }

    // LENGTH / ONES / SPACE

    /// Number of bits held.
    pub fn len(&self) -> u64 {
        self.root.len()
    }

    /// If no bits are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of 1-bits held.
    pub fn ones(&self) -> u64 {
        self.root.ones()
    }

    /// Number of leaves the tree currently stands for.
    pub fn leaves(&self) -> u64 {
        self.root.leaves()
    }

    /// Allocated size in 64-bit words, every node and directory included.
    pub fn space_words(&self) -> u64 {
        self.root.space_words()
    }

    // QUERIES

    /// Bit value at position `index`.
    pub fn access(&mut self, index: u64) -> bool {
        let n = self.root.len();
        self.root.access(index, n, self.theta).0
    }

    /// Copy bits `[index..index + len)` to `dst`, starting at bit offset
    /// `j`.
    pub fn read(&mut self, index: u64, len: u64, dst: &mut [u64], j: u64) {
        let n = self.root.len();
        self.root.read(index, len, dst, j, n, self.theta);
    }

    /// Number of 1-bits in positions `0..=index` (inclusive).
    pub fn rank1(&mut self, index: u64) -> u64 {
        let n = self.root.len();
        self.root.rank1(index, n, self.theta).0
    }

    /// Number of 0-bits in positions `0..=index` (inclusive).
    pub fn rank0(&mut self, index: u64) -> u64 {
        index + 1 - self.rank1(index)
    }

    /// Position of the `j`-th 1-bit, `j` starting at 1.
    pub fn select1(&mut self, j: u64) -> u64 {
        let n = self.root.len();
        self.root.select1(j, n, self.theta).0
    }

    /// Position of the `j`-th 0-bit, `j` starting at 1.
    pub fn select0(&mut self, j: u64) -> u64 {
        let n = self.root.len();
        self.root.select0(j, n, self.theta).0
    }

    /// Lowest position `>= index` holding a 1, if any.
    pub fn next1(&mut self, index: u64) -> Option<u64> {
        let n = self.root.len();
        self.root.next1(index, n, self.theta).0
    }

    /// Lowest position `>= index` holding a 0, if any.
    pub fn next0(&mut self, index: u64) -> Option<u64> {
        let n = self.root.len();
        self.root.next0(index, n, self.theta).0
    }

    // UPDATES

    /// Set bit `index` to `bit`; returns the change in [`Self::ones`]
    /// (`+1`, `-1` or `0`).
    pub fn write(&mut self, index: u64, bit: bool) -> i32 {
        self.root.write(index, bit)
    }

    /// Insert `bit` at position `index`, shifting later bits up by one.
    pub fn insert(&mut self, index: u64, bit: bool) {
        self.root.insert(index, bit);
    }

    /// Remove bit `index`, shifting later bits down by one; returns the
    /// change in [`Self::ones`] (`0` or `-1`).
    pub fn delete(&mut self, index: u64) -> i32 {
        -(self.root.delete(index).0 as i32)
    }

    // PERSISTENCE

    /// Flatten the root and write `u64 size` followed by the data words,
    /// all little-endian. Identical bit content yields identical bytes.
    pub fn save<S: Write + ?Sized>(&mut self, sink: &mut S) -> io::Result<()> {
        self.root.flatten();
        match &self.root {
            Hybrid::Leaf(l) => {
                sink.write_all(&(l.len() as u64).to_le_bytes())?;
                l.save(sink)
            }
            Hybrid::Static(s) => {
                sink.write_all(&s.len().to_le_bytes())?;
                s.save(sink)
            }
            Hybrid::Internal(_) => unreachable!("root was flattened"),
        }
    }

    /// Read a bit vector written by [`Self::save`]. The rank directory is
    /// rebuilt here if the content loads as a static block.
    pub fn load<R: Read + ?Sized>(source: &mut R) -> io::Result<Self> {
        let mut header = [0u8; 8];
        source.read_exact(&mut header)?;
        let size = u64::from_le_bytes(header);
        let mut bytes = vec![0u8; words_for(size) * 8];
        source.read_exact(&mut bytes)?;
        let words = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                u64::from_le_bytes(raw)
            })
            .collect();
        Ok(HybridBitVector::from_bits(words, size))
    }

    // VALIDATION

    /// Walk the whole tree and verify that every stored aggregate matches
    /// its children. Meant for tests and sanity drivers.
    pub fn check(&self) -> Result<(), &'static str> {
        self.root.check().map(|_| ())
    }
}

impl Default for HybridBitVector {
    fn default() -> Self {
        Self::new()
    }
}
