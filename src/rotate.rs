use crate::catalog::{BlockCatalog, Direction};
use crate::document::Structure;
use crate::error::Result;
use crate::grid::{Extent, BLOCK_LAYER, LIQUID_LAYER};
use crate::palette::{Palette, PaletteEntry};
use elytra_logger::{enabled, log, LogSeverity};
use std::sync::Arc;

/// Position a block at `(x, z)` ends up at after a quarter turn of a structure of `extent`.
pub fn turn_position(extent: Extent, direction: Direction, x: usize, z: usize) -> (usize, usize) {
    match direction {
        Direction::Right => (extent.z - 1 - z, x),
        Direction::Left => (z, extent.x - 1 - x),
    }
}

impl<C: BlockCatalog> Structure<C> {
    /// A copy of the structure turned 90 degrees anti-clockwise.
    pub fn rotate_left(&self) -> Structure<C> {
        self.rotate(Direction::Left)
    }

    /// A copy of the structure turned 90 degrees clockwise.
    pub fn rotate_right(&self) -> Structure<C> {
        self.rotate(Direction::Right)
    }

    /// Turns the structure clockwise by `turns` quarter turns; negative values turn it
    /// anti-clockwise. Zero turns give an identical copy.
    pub fn rotate_quarter_turns(&self, turns: i32) -> Structure<C> {
        match turns.rem_euclid(4) {
            1 => self.rotate_right(),
            2 => self.rotate_right().rotate_right(),
            3 => self.rotate_left(),
            _ => self.clone(),
        }
    }

    /// A new structure with X and Z swapped and every block turned around the Y axis. `self` is
    /// left untouched.
    ///
    /// Positions are remapped cell by cell. Orientation (facing, axis, ...) is a property of a
    /// palette entry, so it is turned once per entry of the new palette afterwards. Entries the
    /// catalog cannot resolve are carried over unchanged, payload included, and keep their
    /// orientation.
    pub fn rotate(&self, direction: Direction) -> Structure<C> {
        let extent = self.extent();
        let mut rotated = Structure::with_grid(
            Arc::clone(self.catalog()),
            self.grid().turned_blank(),
            self.palette_name(),
        );
        rotated.set_origin(self.origin());
        if !self.entities().is_empty() {
            log(
                format!(
                    "Dropping {} entities while rotating a {} structure",
                    self.entities().len(),
                    extent
                ),
                LogSeverity::Warning,
            );
        }

        // Offsets below the volume are positions inside both extents, and the new palette
        // holds at most one entry per source entry plus air.
        for offset in 0..self.grid().volume() {
            let (x, y, z) = extent.position(offset);
            let (new_x, new_z) = turn_position(extent, direction, x, z);
            let copied = rotated
                .extent()
                .offset(new_x, y, new_z)
                .and_then(|target| self.copy_cell(&mut rotated, offset, target));
            debug_assert!(copied.is_ok());
        }

        let catalog = Arc::clone(rotated.catalog());
        turn_palette(catalog.as_ref(), rotated.palette_mut(), direction);
        rotated
    }

    /// Copies one cell into another structure. Resolved blocks go through the catalog like a
    /// `set`; anything else is copied as the raw palette entry.
    fn copy_cell(&self, into: &mut Structure<C>, offset: usize, target: usize) -> Result<()> {
        let palette = self.palette();
        let entry_at = |layer: usize| {
            usize::try_from(self.grid().get(layer, offset))
                .ok()
                .and_then(|index| palette.entry(index))
        };

        match palette.resolved(self.grid().get(BLOCK_LAYER, offset)) {
            Some(resolved) => {
                let block = match palette.payload(offset) {
                    Some(payload) if resolved.has_payload => self
                        .catalog()
                        .decode_auxiliary_payload(resolved.block.clone(), payload),
                    _ => resolved.block.clone(),
                };
                into.put_block(target, &block)?;
            }
            None => {
                into.put_entry(BLOCK_LAYER, target, entry_at(BLOCK_LAYER))?;
                if let Some(payload) = palette.payload(offset) {
                    into.palette_mut().set_payload(target, payload.clone());
                }
            }
        }

        let liquid = palette
            .resolved(self.grid().get(LIQUID_LAYER, offset))
            .map(|resolved| &resolved.block)
            .filter(|liquid| self.catalog().is_liquid(liquid));
        match liquid {
            Some(liquid) => into.put_liquid(target, Some(liquid)),
            None => into.put_entry(LIQUID_LAYER, target, entry_at(LIQUID_LAYER)),
        }
    }
}

/// Turns the orientation of every entry of a palette in place.
fn turn_palette<C: BlockCatalog>(catalog: &C, palette: &mut Palette<C::Block>, direction: Direction) {
    for index in 0..palette.len() {
        let Some(entry) = palette.entry(index) else {
            continue;
        };
        let Some(resolved) = Palette::resolve(catalog, entry) else {
            if enabled(LogSeverity::Debug) {
                log(
                    format!("Not rotating unknown block {}", entry.name),
                    LogSeverity::Debug,
                );
            }
            continue;
        };
        let Some(turned) = catalog.rotate(&resolved.block, direction) else {
            continue;
        };
        let (name, properties) = catalog.encode_identity(&turned);
        let version = entry.version;
        palette.replace(catalog, index, PaletteEntry::new(name, properties, version));
    }
}
