//! Bedrock structure (`.mcstructure`) documents: a box of palette-indexed blocks with an optional
//! liquid layer, read from and written to little-endian NBT.
//!
//! Blocks are resolved through a [`BlockCatalog`] supplied by the host application.

pub mod catalog;
pub mod codec;
pub mod document;
pub mod error;
pub mod grid;
pub mod io;
pub mod palette;
pub mod rotate;

// Re-export commonly used items
pub use catalog::{BlockCatalog, Direction, Properties, Rotatable};
pub use document::{Structure, AIR, DEFAULT_PALETTE, FORMAT_VERSION};
pub use elytra_nbt::{Compound, Tag};
pub use error::{DecodeError, Result, StructureError, ValidationError};
pub use grid::{Extent, VoxelGrid, NO_BLOCK};
pub use io::{CodecOptions, Compression, Endian};
pub use palette::{Palette, PaletteEntry, ResolvedBlock};
