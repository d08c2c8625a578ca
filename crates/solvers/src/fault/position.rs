//! The position module holds the [Position] trait and its implementation for generalized indices.

/// The [Position] trait defines the interface of a generalized index within the bisection tree.
/// A "Generalized Index" is calculated as `2^{depth} + index_at_depth`.
pub trait Position {
    /// Returns the depth of the [Position] within the tree.
    fn depth(&self) -> u64;
    /// Returns the index at depth of the [Position] within the tree.
    fn index_at_depth(&self) -> u64;
    /// Returns the left child [Position] relative to the current [Position].
    fn left(&self) -> Self;
    /// Returns the right child [Position] relative to the current [Position].
    fn right(&self) -> Self;
    /// Returns the parent [Position] relative to the current [Position].
    fn parent(&self) -> Self;
    /// Returns `true` if the [Position] is the root of the tree.
    fn is_root(&self) -> bool;
    /// Returns the rightmost [Position] that commits to the same trace index as the current [Position].
    fn right_index(&self, max_depth: u64) -> Self;
    /// Returns the trace index that the current [Position] commits to.
    fn trace_index(&self, max_depth: u64) -> u64;
    /// Returns the relative [Position] for an attack or defense move against the current [Position].
    /// Attacks descend to the left child, defenses to the right child.
    fn make_move(&self, is_attack: bool) -> Self;
}

/// The deepest game supported. Every trace index of such a game fits in a `u64`.
pub const MAX_GAME_DEPTH: u64 = 63;

/// Computes a generalized index from a depth and index at depth.
///
/// ### Takes
/// - `depth`: The depth of the generalized index.
/// - `index_at_depth`: The index at depth of the generalized index.
///
/// ### Returns
/// - `u128`: The generalized index: `2^{depth} + index_at_depth`.
pub fn compute_gindex(depth: u8, index_at_depth: u64) -> u128 {
    2u128.pow(depth as u32) + index_at_depth as u128
}

/// Implementation of the [Position] trait for the [std::u128] primitive type.
impl Position for u128 {
    fn depth(&self) -> u64 {
        127 - self.leading_zeros() as u64
    }

    fn index_at_depth(&self) -> u64 {
        (self - (1 << self.depth())) as u64
    }

    fn left(&self) -> Self {
        self << 1
    }

    fn right(&self) -> Self {
        self.left() | 1
    }

    fn parent(&self) -> Self {
        self >> 1
    }

    fn is_root(&self) -> bool {
        *self == 1
    }

    fn right_index(&self, max_depth: u64) -> Self {
        let remaining = max_depth.saturating_sub(self.depth());
        (self << remaining) | ((1 << remaining) - 1)
    }

    fn trace_index(&self, max_depth: u64) -> u64 {
        self.right_index(max_depth).index_at_depth()
    }

    fn make_move(&self, is_attack: bool) -> Self {
        if is_attack {
            self.left()
        } else {
            self.right()
        }
    }
}
