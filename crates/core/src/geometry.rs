//! Simulation box geometry and its metadata record
//!
//! The leader publishes one fixed-size record describing the box so readers can
//! interpret record coordinates. Layout (little-endian, no padding):
//!
//! | offset | field | type |
//! |---|---|---|
//! | 0 | `lo[3]` | f64 |
//! | 24 | `hi[3]` | f64 |
//! | 48 | `triclinic` | i32 |
//! | 52 | `bound_lo[3]` | f64 |
//! | 76 | `bound_hi[3]` | f64 |
//! | 100 | `tilt[3]` (xy, xz, yz) | f64 |
//! | 124 | `boundary[3][2]` | i32 |

use byteorder::{ByteOrder, LittleEndian};

use crate::codec::DecodeError;

/// Encoded size of the geometry record in bytes.
pub const GEOMETRY_RECORD_LEN: usize = 148;

/// Boundary condition at one face of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum BoundaryKind {
    /// Periodic
    #[default]
    Periodic = 0,
    /// Fixed, non-periodic
    Fixed = 1,
    /// Shrink-wrapped
    Shrink = 2,
    /// Shrink-wrapped with a minimum extent
    ShrinkMin = 3,
}

impl BoundaryKind {
    /// Numeric code stored in the metadata record.
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Parse a numeric code.
    pub fn from_code(code: i32) -> Result<Self, DecodeError> {
        match code {
            0 => Ok(BoundaryKind::Periodic),
            1 => Ok(BoundaryKind::Fixed),
            2 => Ok(BoundaryKind::Shrink),
            3 => Ok(BoundaryKind::ShrinkMin),
            other => Err(DecodeError::UnknownBoundary(other)),
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c {
            'p' => Some(BoundaryKind::Periodic),
            'f' => Some(BoundaryKind::Fixed),
            's' => Some(BoundaryKind::Shrink),
            'm' => Some(BoundaryKind::ShrinkMin),
            _ => None,
        }
    }

    /// Parse one axis of a boundary style such as `"p"`, `"f"` or `"fs"`.
    ///
    /// One letter applies to both faces; two letters give low then high.
    /// Periodic cannot be mixed with a non-periodic face.
    pub fn parse_axis(style: &str) -> Option<[BoundaryKind; 2]> {
        let letters: Vec<char> = style.chars().collect();
        let faces = match letters.as_slice() {
            [c] => {
                let kind = Self::from_letter(*c)?;
                [kind, kind]
            }
            [lo, hi] => [Self::from_letter(*lo)?, Self::from_letter(*hi)?],
            _ => return None,
        };
        let periodic = |k: BoundaryKind| k == BoundaryKind::Periodic;
        if periodic(faces[0]) != periodic(faces[1]) {
            return None;
        }
        Some(faces)
    }
}

/// Simulation box at the time metadata is taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    /// Lower corner per axis
    pub lo: [f64; 3],
    /// Upper corner per axis
    pub hi: [f64; 3],
    /// Tilt factors `(xy, xz, yz)` for a triclinic box
    pub tilt: Option<[f64; 3]>,
    /// Boundary codes, `[axis][lo/hi face]`
    pub boundary: [[BoundaryKind; 2]; 3],
}

impl BoxGeometry {
    /// Orthogonal box.
    pub fn orthogonal(lo: [f64; 3], hi: [f64; 3], boundary: [[BoundaryKind; 2]; 3]) -> Self {
        Self {
            lo,
            hi,
            tilt: None,
            boundary,
        }
    }

    /// Triclinic box with tilt factors `(xy, xz, yz)`.
    pub fn triclinic(
        lo: [f64; 3],
        hi: [f64; 3],
        tilt: [f64; 3],
        boundary: [[BoundaryKind; 2]; 3],
    ) -> Self {
        Self {
            lo,
            hi,
            tilt: Some(tilt),
            boundary,
        }
    }

    /// True when tilt factors are present.
    pub fn is_triclinic(&self) -> bool {
        self.tilt.is_some()
    }

    /// Orthogonal bounding box enclosing the (possibly tilted) box.
    pub fn bounding_box(&self) -> ([f64; 3], [f64; 3]) {
        let [xy, xz, yz] = match self.tilt {
            None => return (self.lo, self.hi),
            Some(t) => t,
        };
        let x_shift = [0.0, xy, xz, xy + xz];
        let min_x = x_shift.iter().copied().fold(f64::INFINITY, f64::min);
        let max_x = x_shift.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (
            [self.lo[0] + min_x, self.lo[1] + yz.min(0.0), self.lo[2]],
            [self.hi[0] + max_x, self.hi[1] + yz.max(0.0), self.hi[2]],
        )
    }

    /// Encode the metadata record.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; GEOMETRY_RECORD_LEN];
        let (bound_lo, bound_hi) = self.bounding_box();
        LittleEndian::write_f64_into(&self.lo, &mut buf[0..24]);
        LittleEndian::write_f64_into(&self.hi, &mut buf[24..48]);
        LittleEndian::write_i32(&mut buf[48..52], i32::from(self.is_triclinic()));
        LittleEndian::write_f64_into(&bound_lo, &mut buf[52..76]);
        LittleEndian::write_f64_into(&bound_hi, &mut buf[76..100]);
        LittleEndian::write_f64_into(&self.tilt.unwrap_or([0.0; 3]), &mut buf[100..124]);
        let codes: Vec<i32> = self
            .boundary
            .iter()
            .flat_map(|faces| faces.iter().map(|k| k.code()))
            .collect();
        LittleEndian::write_i32_into(&codes, &mut buf[124..148]);
        buf
    }

    /// Decode a metadata record.
    ///
    /// The stored bounding box is derived data and is not read back.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != GEOMETRY_RECORD_LEN {
            return Err(DecodeError::Length {
                what: "box geometry",
                expected: GEOMETRY_RECORD_LEN,
                actual: bytes.len(),
            });
        }
        let mut lo = [0.0; 3];
        let mut hi = [0.0; 3];
        let mut tilt = [0.0; 3];
        let mut codes = [0i32; 6];
        LittleEndian::read_f64_into(&bytes[0..24], &mut lo);
        LittleEndian::read_f64_into(&bytes[24..48], &mut hi);
        let triclinic = match LittleEndian::read_i32(&bytes[48..52]) {
            0 => false,
            1 => true,
            other => return Err(DecodeError::InvalidFlag(other)),
        };
        LittleEndian::read_f64_into(&bytes[100..124], &mut tilt);
        LittleEndian::read_i32_into(&bytes[124..148], &mut codes);

        let mut boundary = [[BoundaryKind::Periodic; 2]; 3];
        for (i, code) in codes.iter().enumerate() {
            boundary[i / 2][i % 2] = BoundaryKind::from_code(*code)?;
        }
        Ok(Self {
            lo,
            hi,
            tilt: triclinic.then_some(tilt),
            boundary,
        })
    }
}
