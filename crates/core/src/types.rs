//! Identifiers, store status codes and slice bounds

use std::fmt;

/// Position of a process within its group (0-based).
pub type Rank = usize;

/// Snapshot version, typically the simulation step counter.
///
/// Static schema metadata is always published at version 0.
pub type Version = u64;

/// Size in bytes of one array element. Every cell is an `f64`.
pub const ELEMENT_SIZE: usize = std::mem::size_of::<f64>();

/// Result of a raw staging store call.
pub type StatusResult<T> = std::result::Result<T, Status>;

/// Numeric status code returned by the staging store.
///
/// Zero is success; every other value is a failure. Stores may return codes
/// outside the named constants, so the raw code is always preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(i32);

impl Status {
    /// Call succeeded
    pub const SUCCESS: Status = Status(0);
    /// Handle is not connected (never initialized or already finalized)
    pub const NOT_CONNECTED: Status = Status(-1);
    /// This rank already holds a connection
    pub const ALREADY_CONNECTED: Status = Status(-2);
    /// Malformed arguments (rank, bounds order, payload length)
    pub const INVALID_ARGUMENT: Status = Status(-3);
    /// Region lies outside the declared global shape
    pub const OUT_OF_BOUNDS: Status = Status(-4);
    /// Requested array region or version does not exist
    pub const NOT_FOUND: Status = Status(-5);

    /// Wrap a raw status code.
    pub const fn from_code(code: i32) -> Self {
        Status(code)
    }

    /// The raw status code.
    pub const fn code(self) -> i32 {
        self.0
    }

    /// True for [`Status::SUCCESS`].
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Staging store operation, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// Collective connection setup
    Init,
    /// Global shape declaration
    DefineGdim,
    /// Array slice write
    Put,
    /// Metadata write
    PutMeta,
    /// Array region read
    Get,
    /// Metadata read
    GetMeta,
    /// Connection teardown
    Finalize,
}

impl StoreOp {
    /// Operation name as it appears in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            StoreOp::Init => "init",
            StoreOp::DefineGdim => "define_gdim",
            StoreOp::Put => "put",
            StoreOp::PutMeta => "put_meta",
            StoreOp::Get => "get",
            StoreOp::GetMeta => "get_meta",
            StoreOp::Finalize => "finalize",
        }
    }
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive bounding box of a 2D slice.
///
/// Axis 0 spans fields, axis 1 spans records. Both bounds are inclusive,
/// matching the staging store's `lb`/`ub` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    /// Lower corner `[field, record]`
    pub lower: [u64; 2],
    /// Upper corner `[field, record]`
    pub upper: [u64; 2],
}

impl Bounds {
    /// Number of cells along `axis`.
    pub fn extent(&self, axis: usize) -> u64 {
        self.upper[axis] - self.lower[axis] + 1
    }

    /// Total number of cells in the box.
    pub fn volume(&self) -> u64 {
        self.extent(0) * self.extent(1)
    }

    /// Inclusive record range covered on axis 1.
    pub fn records(&self) -> std::ops::RangeInclusive<u64> {
        self.lower[1]..=self.upper[1]
    }
}
