use crate::catalog::{BlockCatalog, Properties};
use crate::error::{Result, StructureError, ValidationError};
use crate::grid::{Extent, VoxelGrid, BLOCK_LAYER, LIQUID_LAYER, NO_BLOCK};
use crate::palette::{Palette, PaletteEntry};
use elytra_logger::{log, LogSeverity::Debug};
use elytra_nbt::Compound;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The only structure format version in existence.
pub const FORMAT_VERSION: i32 = 1;

/// Palette selected when a structure is created or read.
pub const DEFAULT_PALETTE: &str = "default";

pub const AIR: &str = "minecraft:air";

/// A structure: a box of blocks with optional waterlogging liquids, a set of named palettes and
/// the entities that were saved with it.
///
/// Exactly one palette is active at a time and every `set`/`at` goes through it. A structure is
/// not synchronised; callers that share one between threads must serialise access themselves.
pub struct Structure<C: BlockCatalog> {
    catalog: Arc<C>,
    format_version: i32,
    origin: [i32; 3],
    entities: Vec<Compound>,
    grid: VoxelGrid,
    // Committed palettes. The active one lives in `palette` while it is being worked on.
    palettes: HashMap<String, Palette<C::Block>>,
    palette: Palette<C::Block>,
    palette_name: String,
    // False while the active palette is a stand-in that was never read or written to.
    palette_committed: bool,
}

impl<C: BlockCatalog> Clone for Structure<C> {
    fn clone(&self) -> Self {
        Structure {
            catalog: Arc::clone(&self.catalog),
            format_version: self.format_version,
            origin: self.origin,
            entities: self.entities.clone(),
            grid: self.grid.clone(),
            palettes: self.palettes.clone(),
            palette: self.palette.clone(),
            palette_name: self.palette_name.clone(),
            palette_committed: self.palette_committed,
        }
    }
}

impl<C: BlockCatalog> fmt::Debug for Structure<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structure")
            .field("format_version", &self.format_version)
            .field("extent", &self.grid.extent())
            .field("origin", &self.origin)
            .field("palette_name", &self.palette_name)
            .field("palette_len", &self.palette.len())
            .field("palettes", &self.palette_names())
            .field("entities", &self.entities.len())
            .finish()
    }
}

impl<C: BlockCatalog> Structure<C> {
    /// Creates a structure filled with air, with an empty liquid layer and the default palette
    /// active. Fails with `ExtentTooLarge` if the extent cannot be stored.
    pub fn new(catalog: Arc<C>, extent: Extent) -> Result<Self> {
        let grid = VoxelGrid::new(extent, 0, true)?;
        Ok(Self::with_grid(catalog, grid, DEFAULT_PALETTE))
    }

    /// Wraps a grid whose pointers are all 0, which becomes air in a fresh palette.
    pub(crate) fn with_grid(catalog: Arc<C>, grid: VoxelGrid, palette_name: &str) -> Self {
        let mut palette = Palette::new();
        let air = PaletteEntry::new(AIR, Properties::new(), catalog.block_version());
        palette.insert(catalog.as_ref(), air);
        palette.activate(catalog.as_ref());

        Structure {
            catalog,
            format_version: FORMAT_VERSION,
            origin: [0, 0, 0],
            entities: Vec::new(),
            grid,
            palettes: HashMap::new(),
            palette,
            palette_name: palette_name.to_owned(),
            palette_committed: true,
        }
    }

    /// Assembles a decoded structure: checks it, then selects the default palette. No structure
    /// is returned if any check fails.
    ///
    /// Without a default palette an empty one is selected. It is not written out or validated
    /// until something is placed through it.
    pub(crate) fn from_parts(
        catalog: Arc<C>,
        format_version: i32,
        origin: [i32; 3],
        entities: Vec<Compound>,
        grid: VoxelGrid,
        mut palettes: HashMap<String, Palette<C::Block>>,
    ) -> std::result::Result<Self, ValidationError> {
        check(
            format_version,
            &grid,
            palettes.values().map(|palette| palette.len()),
        )?;

        let (mut palette, palette_committed) = match palettes.remove(DEFAULT_PALETTE) {
            Some(palette) => (palette, true),
            None => {
                log(
                    format!("Structure has no {} palette, selecting an empty one", DEFAULT_PALETTE),
                    Debug,
                );
                (Palette::new(), false)
            }
        };
        palette.activate(catalog.as_ref());
        Ok(Structure {
            catalog,
            format_version,
            origin,
            entities,
            grid,
            palettes,
            palette,
            palette_name: DEFAULT_PALETTE.to_owned(),
            palette_committed,
        })
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    pub fn format_version(&self) -> i32 {
        self.format_version
    }

    pub fn extent(&self) -> Extent {
        self.grid.extent()
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.grid.extent().to_array()
    }

    pub fn origin(&self) -> [i32; 3] {
        self.origin
    }

    pub fn set_origin(&mut self, origin: [i32; 3]) {
        self.origin = origin;
    }

    pub fn entities(&self) -> &[Compound] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut Vec<Compound> {
        &mut self.entities
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn palette_name(&self) -> &str {
        &self.palette_name
    }

    /// The active palette.
    pub fn palette(&self) -> &Palette<C::Block> {
        &self.palette
    }

    pub fn palette_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.committed_palettes().map(|(name, _)| name).collect();
        names.sort_unstable();
        names
    }

    /// Every palette as it would be written, the active one included.
    pub fn committed_palettes(&self) -> impl Iterator<Item = (&str, &Palette<C::Block>)> {
        self.palettes
            .iter()
            .map(|(name, palette)| (name.as_str(), palette))
            .chain(
                self.palette_committed
                    .then_some((self.palette_name.as_str(), &self.palette)),
            )
    }

    /// Makes the palette called `name` active, creating it empty if it does not exist. The
    /// palette that was active so far is committed under its own name first, unless it is the
    /// untouched stand-in selected for a file without a default palette.
    pub fn use_palette(&mut self, name: &str) {
        if name == self.palette_name {
            return;
        }
        let next = match self.palettes.remove(name) {
            Some(palette) => palette,
            None => {
                log(format!("Creating empty palette {}", name), Debug);
                Palette::new()
            }
        };
        let mut previous = std::mem::replace(&mut self.palette, next);
        previous.deactivate();
        let previous_name = std::mem::replace(&mut self.palette_name, name.to_owned());
        if self.palette_committed {
            self.palettes.insert(previous_name, previous);
        }
        self.palette_committed = true;
        self.palette.activate(self.catalog.as_ref());
    }

    /// Checks structural consistency, stopping at the first problem found.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        check(
            self.format_version,
            &self.grid,
            self.committed_palettes().map(|(_, palette)| palette.len()),
        )
    }

    /// Places `block` at a position, waterlogged by `liquid` if one is given. Without a liquid
    /// the position's liquid slot is cleared.
    pub fn set(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        block: &C::Block,
        liquid: Option<&C::Block>,
    ) -> Result<()> {
        let offset = self.extent().offset(x, y, z)?;
        self.put_block(offset, block)?;
        self.put_liquid(offset, liquid)
    }

    pub(crate) fn put_block(&mut self, offset: usize, block: &C::Block) -> Result<()> {
        let catalog = Arc::clone(&self.catalog);
        let pointer = self.pointer_for(block)?;
        self.grid.put(BLOCK_LAYER, offset, pointer);
        if catalog.has_auxiliary_payload(block) {
            let payload = catalog.encode_auxiliary_payload(block);
            self.palette.set_payload(offset, payload);
        } else {
            self.palette.remove_payload(offset);
        }
        Ok(())
    }

    pub(crate) fn put_liquid(&mut self, offset: usize, liquid: Option<&C::Block>) -> Result<()> {
        match liquid {
            Some(liquid) => {
                let pointer = self.pointer_for(liquid)?;
                self.grid.ensure_layer(LIQUID_LAYER);
                self.grid.put(LIQUID_LAYER, offset, pointer);
            }
            None => self.grid.put(LIQUID_LAYER, offset, NO_BLOCK),
        }
        Ok(())
    }

    /// Stores an identity as is, without resolving it, so blocks the catalog does not know
    /// survive being moved. `None` leaves nothing in the layer.
    pub(crate) fn put_entry(
        &mut self,
        layer: usize,
        offset: usize,
        entry: Option<&PaletteEntry>,
    ) -> Result<()> {
        let Some(entry) = entry else {
            self.grid.put(layer, offset, NO_BLOCK);
            return Ok(());
        };
        let index = match self.palette.lookup(&entry.name, &entry.properties) {
            Some(index) => index,
            None => self.palette.insert(self.catalog.as_ref(), entry.clone()),
        };
        let pointer = to_pointer(index)?;
        self.palette_committed = true;
        self.grid.ensure_layer(layer);
        self.grid.put(layer, offset, pointer);
        Ok(())
    }

    /// Leaves nothing at a position: neither block nor liquid nor payload.
    pub fn remove(&mut self, x: usize, y: usize, z: usize) -> Result<()> {
        let offset = self.extent().offset(x, y, z)?;
        for layer in 0..self.grid.layer_count() {
            self.grid.put(layer, offset, NO_BLOCK);
        }
        self.palette.remove_payload(offset);
        Ok(())
    }

    /// Block and liquid at a position. Empty slots and blocks the catalog does not know both
    /// read as `None`.
    pub fn at(
        &self,
        x: usize,
        y: usize,
        z: usize,
    ) -> Result<(Option<C::Block>, Option<C::Block>)> {
        let offset = self.extent().offset(x, y, z)?;
        let catalog = self.catalog.as_ref();

        let block = self
            .palette
            .resolved(self.grid.get(BLOCK_LAYER, offset))
            .map(|resolved| match self.palette.payload(offset) {
                Some(payload) if resolved.has_payload => {
                    catalog.decode_auxiliary_payload(resolved.block.clone(), payload)
                }
                _ => resolved.block.clone(),
            });

        let liquid = self
            .palette
            .resolved(self.grid.get(LIQUID_LAYER, offset))
            .map(|resolved| &resolved.block)
            .filter(|liquid| catalog.is_liquid(liquid))
            .cloned();

        Ok((block, liquid))
    }

    fn pointer_for(&mut self, block: &C::Block) -> Result<i32> {
        let (name, properties) = self.catalog.encode_identity(block);
        let index = self
            .palette
            .index_or_insert(self.catalog.as_ref(), name, properties);
        self.palette_committed = true;
        to_pointer(index)
    }

    pub(crate) fn palette_mut(&mut self) -> &mut Palette<C::Block> {
        &mut self.palette
    }
}

fn to_pointer(index: usize) -> Result<i32> {
    i32::try_from(index).map_err(|_| StructureError::PaletteFull(index))
}

fn check(
    format_version: i32,
    grid: &VoxelGrid,
    palette_lens: impl Iterator<Item = usize>,
) -> std::result::Result<(), ValidationError> {
    if format_version != FORMAT_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            found: format_version,
            expected: FORMAT_VERSION,
        });
    }
    if grid.layer_count() == 0 {
        return Err(ValidationError::NoLayers);
    }
    let mut palette_lens = palette_lens.peekable();
    if palette_lens.peek().is_none() {
        return Err(ValidationError::NoPalettes);
    }
    let volume = grid.volume();
    for (layer, cells) in grid.layers().iter().enumerate() {
        if cells.len() != volume {
            return Err(ValidationError::LayerSizeMismatch {
                layer,
                expected: volume,
                found: cells.len(),
            });
        }
    }
    let mut expected = None;
    for len in palette_lens {
        match expected {
            None => expected = Some(len),
            Some(expected) if expected != len => {
                return Err(ValidationError::PaletteSizeMismatch {
                    expected,
                    found: len,
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_pointers_are_not_clamped() {
        assert_eq!(to_pointer(0).unwrap(), 0);
        assert_eq!(to_pointer(i32::MAX as usize).unwrap(), i32::MAX);
        assert_matches!(
            to_pointer(i32::MAX as usize + 1),
            Err(StructureError::PaletteFull(len)) if len == i32::MAX as usize + 1
        );
    }
}
