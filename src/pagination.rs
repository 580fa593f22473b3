//! Two-up pagination state machine.
//!
//! The state is the pair of displayed indices plus a `shifted` flag. Every
//! transition checks its guard against the current page count and either
//! mutates and returns `true`, or leaves the state untouched and returns
//! `false`. With no pages every transition is a no-op.
//!
//! `previous` requires `left > 1` rather than `left > 0`; that boundary is
//! kept as is. `next` only checks the right index, so with an odd page count
//! the right slot may point one past the last page. Rendering tolerates that
//! by leaving the side empty (see [`crate::output::Spread::select`]).

use serde::{Deserialize, Serialize};

/// Indices of the left and right page plus the shift flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    left: usize,
    right: usize,
    shifted: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new()
    }
}

impl Pagination {
    /// The state every freshly loaded document starts in: `(0, 1, false)`.
    pub fn new() -> Self {
        Self {
            left: 0,
            right: 1,
            shifted: false,
        }
    }

    pub fn indices(&self) -> (usize, usize) {
        (self.left, self.right)
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn right(&self) -> usize {
        self.right
    }

    pub fn is_shifted(&self) -> bool {
        self.shifted
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance by two pages.
    pub fn next(&mut self, page_count: usize) -> bool {
        if page_count == 0 || self.right >= page_count - 1 {
            return false;
        }
        self.left += 2;
        self.right += 2;
        true
    }

    /// Step back by two pages.
    pub fn previous(&mut self, page_count: usize) -> bool {
        if page_count == 0 || self.left <= 1 {
            return false;
        }
        self.step_back(2)
    }

    /// Exchange the left and right pages. The shift flag is untouched.
    pub fn swap(&mut self, page_count: usize) -> bool {
        if page_count == 0 {
            return false;
        }
        std::mem::swap(&mut self.left, &mut self.right);
        true
    }

    /// Offset the pairing by one page.
    pub fn shift(&mut self, page_count: usize) -> bool {
        if page_count == 0 || self.shifted || self.right >= page_count - 1 {
            return false;
        }
        self.left += 1;
        self.right += 1;
        self.shifted = true;
        true
    }

    /// Undo a previous [`shift`](Self::shift).
    pub fn unshift(&mut self, page_count: usize) -> bool {
        if page_count == 0 || !self.shifted || self.left == 0 {
            return false;
        }
        if self.step_back(1) {
            self.shifted = false;
            return true;
        }
        false
    }

    /// `unshift` when shifted, `shift` otherwise.
    pub fn toggle_shift(&mut self, page_count: usize) -> bool {
        if self.shifted {
            self.unshift(page_count)
        } else {
            self.shift(page_count)
        }
    }

    // A swapped pair can have right < left; refuse a step that would take
    // either index below zero.
    fn step_back(&mut self, n: usize) -> bool {
        match (self.left.checked_sub(n), self.right.checked_sub(n)) {
            (Some(left), Some(right)) => {
                self.left = left;
                self.right = right;
                true
            }
            _ => false,
        }
    }
}
