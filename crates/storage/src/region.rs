//! Rectangular region arithmetic
//!
//! Regions are inclusive `lb..=ub` boxes with axis 0 fastest varying, so a
//! cell's linear position is `sum((idx[i] - lb[i]) * stride[i])` with
//! `stride[0] = 1`.

use snapstage_core::{Status, StatusResult};

/// Inclusive N-dimensional box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Lower corner
    pub lb: Vec<u64>,
    /// Upper corner
    pub ub: Vec<u64>,
}

impl Region {
    /// Validate and build a region.
    pub fn new(lb: &[u64], ub: &[u64]) -> StatusResult<Self> {
        if lb.is_empty() || lb.len() != ub.len() {
            return Err(Status::INVALID_ARGUMENT);
        }
        if lb.iter().zip(ub).any(|(l, u)| l > u) {
            return Err(Status::INVALID_ARGUMENT);
        }
        Ok(Self {
            lb: lb.to_vec(),
            ub: ub.to_vec(),
        })
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.lb.len()
    }

    /// Cells along `axis`.
    pub fn extent(&self, axis: usize) -> u64 {
        self.ub[axis] - self.lb[axis] + 1
    }

    /// Total cells, `None` on overflow.
    pub fn volume(&self) -> Option<u64> {
        (0..self.ndim()).try_fold(1u64, |acc, axis| acc.checked_mul(self.extent(axis)))
    }

    /// True when the region fits inside a global shape.
    pub fn fits(&self, shape: &[u64]) -> bool {
        shape.len() == self.ndim() && self.ub.iter().zip(shape).all(|(u, s)| u < s)
    }

    /// Overlap with `other`, if any.
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        if self.ndim() != other.ndim() {
            return None;
        }
        let lb: Vec<u64> = self.lb.iter().zip(&other.lb).map(|(a, b)| *a.max(b)).collect();
        let ub: Vec<u64> = self.ub.iter().zip(&other.ub).map(|(a, b)| *a.min(b)).collect();
        if lb.iter().zip(&ub).any(|(l, u)| l > u) {
            return None;
        }
        Some(Region { lb, ub })
    }

    /// Linear cell position of `idx` within this region.
    pub fn linear(&self, idx: &[u64]) -> usize {
        let mut offset = 0u64;
        let mut stride = 1u64;
        for axis in 0..self.ndim() {
            offset += (idx[axis] - self.lb[axis]) * stride;
            stride *= self.extent(axis);
        }
        offset as usize
    }

    /// Visit the start of every axis-0 run in the region, in storage order.
    ///
    /// Each run covers `extent(0)` consecutive cells.
    pub fn for_each_run(&self, mut f: impl FnMut(&[u64])) {
        let mut idx = self.lb.clone();
        loop {
            f(&idx);
            let mut axis = 1;
            loop {
                if axis >= self.ndim() {
                    return;
                }
                if idx[axis] < self.ub[axis] {
                    idx[axis] += 1;
                    break;
                }
                idx[axis] = self.lb[axis];
                axis += 1;
            }
        }
    }
}
