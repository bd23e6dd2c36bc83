use crate::error::{Result, StructureError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pointer value meaning "nothing at this position". Distinct from an explicit air entry.
pub const NO_BLOCK: i32 = -1;

pub const BLOCK_LAYER: usize = 0;
pub const LIQUID_LAYER: usize = 1;

/// Size of a structure along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Extent {
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Extent { x, y, z }
    }

    /// Number of cells, or `None` if it does not fit a `usize`.
    pub fn volume(&self) -> Option<usize> {
        self.x.checked_mul(self.y)?.checked_mul(self.z)
    }

    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.x && y < self.y && z < self.z
    }

    /// Linear offset of a position: Z varies fastest, then Y, then X.
    pub fn offset(&self, x: usize, y: usize, z: usize) -> Result<usize> {
        let out_of_bounds = || StructureError::OutOfBounds {
            x,
            y,
            z,
            extent: *self,
        };
        if !self.contains(x, y, z) {
            return Err(out_of_bounds());
        }
        // (x * sy + y) * sz + z
        x.checked_mul(self.y)
            .and_then(|v| v.checked_add(y))
            .and_then(|v| v.checked_mul(self.z))
            .and_then(|v| v.checked_add(z))
            .ok_or_else(out_of_bounds)
    }

    /// Position of a linear offset; the inverse of `offset` for offsets below the volume.
    pub fn position(&self, offset: usize) -> (usize, usize, usize) {
        let column = self.z.max(1);
        let plane = column * self.y.max(1);
        (offset / plane, (offset / column) % self.y.max(1), offset % column)
    }

    /// Extent after a quarter turn around the Y axis.
    pub fn turned(&self) -> Extent {
        Extent::new(self.z, self.y, self.x)
    }

    pub fn to_array(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// Volume of an extent that can be stored and written back out. Every axis has to fit the
/// `int` size field and the product has to fit a `usize`.
fn storable_volume(extent: Extent) -> std::result::Result<usize, ValidationError> {
    let fits = extent
        .to_array()
        .iter()
        .all(|axis| i32::try_from(*axis).is_ok());
    extent
        .volume()
        .filter(|_| fits)
        .ok_or(ValidationError::ExtentTooLarge(extent))
}

/// Parallel index planes over an extent. Layer 0 holds blocks, the optional layer 1 holds
/// liquids that waterlog the block at the same offset.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    extent: Extent,
    volume: usize,
    layers: Vec<Vec<i32>>,
}

impl VoxelGrid {
    /// Allocates a block layer filled with `fill` and, if asked, a liquid layer of `NO_BLOCK`.
    pub fn new(
        extent: Extent,
        fill: i32,
        liquid_layer: bool,
    ) -> std::result::Result<Self, ValidationError> {
        let volume = storable_volume(extent)?;
        let mut layers = vec![vec![fill; volume]];
        if liquid_layer {
            layers.push(vec![NO_BLOCK; volume]);
        }
        Ok(VoxelGrid {
            extent,
            volume,
            layers,
        })
    }

    /// Wraps decoded layers without checking their lengths; see `Structure::validate`.
    pub(crate) fn from_layers(
        extent: Extent,
        layers: Vec<Vec<i32>>,
    ) -> std::result::Result<Self, ValidationError> {
        let volume = storable_volume(extent)?;
        Ok(VoxelGrid {
            extent,
            volume,
            layers,
        })
    }

    /// An air-filled grid (pointer 0) with a liquid layer, over the extent turned a quarter turn.
    pub(crate) fn turned_blank(&self) -> VoxelGrid {
        VoxelGrid {
            extent: self.extent.turned(),
            volume: self.volume,
            layers: vec![vec![0; self.volume], vec![NO_BLOCK; self.volume]],
        }
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn volume(&self) -> usize {
        self.volume
    }

    pub fn layers(&self) -> &[Vec<i32>] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn has_liquid_layer(&self) -> bool {
        self.layers.len() > LIQUID_LAYER
    }

    /// Adds layers filled with `NO_BLOCK` until `layer` exists.
    pub fn ensure_layer(&mut self, layer: usize) {
        while self.layers.len() <= layer {
            self.layers.push(vec![NO_BLOCK; self.volume]);
        }
    }

    /// Pointer stored at an offset. A missing layer or offset reads as `NO_BLOCK`.
    pub fn get(&self, layer: usize, offset: usize) -> i32 {
        self.layers
            .get(layer)
            .and_then(|cells| cells.get(offset))
            .copied()
            .unwrap_or(NO_BLOCK)
    }

    /// Stores a pointer at an offset. Writes to missing layers or offsets are dropped.
    pub fn put(&mut self, layer: usize, offset: usize, value: i32) {
        if let Some(cell) = self
            .layers
            .get_mut(layer)
            .and_then(|cells| cells.get_mut(offset))
        {
            *cell = value;
        }
    }

    pub fn read(&self, layer: usize, x: usize, y: usize, z: usize) -> Result<i32> {
        let offset = self.extent.offset(x, y, z)?;
        Ok(self.get(layer, offset))
    }

    pub fn write(&mut self, layer: usize, x: usize, y: usize, z: usize, value: i32) -> Result<()> {
        let offset = self.extent.offset(x, y, z)?;
        self.ensure_layer(layer);
        self.put(layer, offset, value);
        Ok(())
    }
}
