use crate::grid::Extent;
use std::error::Error;
use std::fmt;

pub type Result<T> = std::result::Result<T, StructureError>;

/// Structural inconsistencies found by `Structure::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    UnsupportedVersion { found: i32, expected: i32 },
    BadExtent(Vec<i32>),
    BadOrigin(Vec<i32>),
    /// The cell count does not fit in memory, or an axis does not fit the size field.
    ExtentTooLarge(Extent),
    NoLayers,
    NoPalettes,
    LayerSizeMismatch {
        layer: usize,
        expected: usize,
        found: usize,
    },
    PaletteSizeMismatch { expected: usize, found: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnsupportedVersion { found, expected } => write!(
                f,
                "unsupported format version {}: expected version {}",
                found, expected
            ),
            ValidationError::BadExtent(size) => write!(
                f,
                "structure size must have 3 non-negative values, but got {:?}",
                size
            ),
            ValidationError::BadOrigin(origin) => write!(
                f,
                "structure origin must have 3 values, but got {:?}",
                origin
            ),
            ValidationError::ExtentTooLarge(extent) => {
                write!(f, "structure size {} is too large", extent)
            }
            ValidationError::NoLayers => write!(f, "structure has no blocks in it"),
            ValidationError::NoPalettes => write!(f, "structure has no palettes in it"),
            ValidationError::LayerSizeMismatch {
                layer,
                expected,
                found,
            } => write!(
                f,
                "layer {} should have {} blocks, but got {}",
                layer, expected, found
            ),
            ValidationError::PaletteSizeMismatch { expected, found } => write!(
                f,
                "all palettes must have the same length, but got one with length {} and one with length {}",
                expected, found
            ),
        }
    }
}

impl Error for ValidationError {}

/// Tag tree shapes that cannot be mapped onto a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    MissingField(String),
    UnexpectedType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    InvalidPositionKey(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MissingField(field) => write!(f, "missing field {}", field),
            DecodeError::UnexpectedType {
                field,
                expected,
                found,
            } => write!(f, "field {} should be {}, but is {}", field, expected, found),
            DecodeError::InvalidPositionKey(key) => {
                write!(f, "block position key {:?} is not a block offset", key)
            }
        }
    }
}

impl Error for DecodeError {}

#[derive(Debug)]
pub enum StructureError {
    Io(std::io::Error),
    Decode(DecodeError),
    Validation(ValidationError),
    OutOfBounds {
        x: usize,
        y: usize,
        z: usize,
        extent: Extent,
    },
    /// The active palette has more entries than a block index can address.
    PaletteFull(usize),
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureError::Io(err) => write!(f, "IO error: {}", err),
            StructureError::Decode(err) => write!(f, "decode structure: {}", err),
            StructureError::Validation(err) => write!(f, "verify structure: {}", err),
            StructureError::OutOfBounds { x, y, z, extent } => write!(
                f,
                "position ({}, {}, {}) is outside of a {} structure",
                x, y, z, extent
            ),
            StructureError::PaletteFull(len) => write!(
                f,
                "palette entry {} cannot be addressed by a block index",
                len
            ),
        }
    }
}

impl Error for StructureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StructureError::Io(err) => Some(err),
            StructureError::Decode(err) => Some(err),
            StructureError::Validation(err) => Some(err),
            StructureError::OutOfBounds { .. } | StructureError::PaletteFull(_) => None,
        }
    }
}

impl From<std::io::Error> for StructureError {
    fn from(err: std::io::Error) -> Self {
        StructureError::Io(err)
    }
}

impl From<DecodeError> for StructureError {
    fn from(err: DecodeError) -> Self {
        StructureError::Decode(err)
    }
}

impl From<ValidationError> for StructureError {
    fn from(err: ValidationError) -> Self {
        StructureError::Validation(err)
    }
}
