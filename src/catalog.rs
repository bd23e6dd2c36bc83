//! The block catalog port.
//!
//! A structure only stores block identities as `(name, properties)` pairs. Turning those into
//! usable block values, and asking those values what they can do, is the job of the host
//! application's block registry, which the structure reaches through [`BlockCatalog`].

use elytra_nbt::Compound;
use serde::{Deserialize, Serialize};

/// Block state properties, e.g. `{"facing_direction": Int(2), "open_bit": Byte(0)}`.
///
/// Values are scalar tags. Two property maps are equal when they hold the same keys with
/// equal values; insertion order is irrelevant.
pub type Properties = Compound;

/// Direction of a quarter turn around the Y axis, as seen from above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Anti-clockwise.
    Left,
    /// Clockwise.
    Right,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Implemented by orientation-carrying property values (facing, axis, ...).
pub trait Rotatable: Sized {
    fn rotate(&self, direction: Direction) -> Self;
}

/// Capabilities the structure needs from the host's block registry.
pub trait BlockCatalog {
    type Block: Clone;

    /// Block version stamped on palette entries created by this catalog.
    fn block_version(&self) -> i32;

    /// Canonical identity of a block.
    fn encode_identity(&self, block: &Self::Block) -> (String, Properties);

    /// Looks a block up by identity. `None` if the catalog does not know it.
    fn resolve(&self, name: &str, properties: &Properties) -> Option<Self::Block>;

    /// Migrates an identity written under an older block version. The default keeps it as is.
    fn upgrade(&self, name: &str, properties: &Properties, version: i32) -> (String, Properties) {
        let _ = version;
        (name.to_owned(), properties.clone())
    }

    /// Whether the block keeps extra per-position state (block entity data).
    fn has_auxiliary_payload(&self, block: &Self::Block) -> bool {
        let _ = block;
        false
    }

    fn encode_auxiliary_payload(&self, block: &Self::Block) -> Compound {
        let _ = block;
        Compound::new()
    }

    fn decode_auxiliary_payload(&self, block: Self::Block, payload: &Compound) -> Self::Block {
        let _ = payload;
        block
    }

    fn is_liquid(&self, block: &Self::Block) -> bool;

    /// Rotates the orientation of a block. Returns `None` for blocks without orientation.
    ///
    /// Catalogs usually implement this by calling [`Rotatable::rotate`] on each orientation
    /// property of the block.
    fn rotate(&self, block: &Self::Block, direction: Direction) -> Option<Self::Block> {
        let _ = (block, direction);
        None
    }
}
