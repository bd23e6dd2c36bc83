//! Mapping between a [`Structure`] and its tag tree.
//!
//! ```text
//! format_version: int
//! size: [int; 3]
//! structure_world_origin: [int; 3]
//! structure:
//!   block_indices: [[int]]        layer 0 blocks, layer 1 liquids (optional)
//!   entities: [compound]
//!   palette: {name: {block_palette: [{name, states, version}],
//!                    block_position_data: {"<offset>": {block_entity_data: compound}}}}
//! ```

use crate::catalog::BlockCatalog;
use crate::document::Structure;
use crate::error::{DecodeError, Result, ValidationError};
use crate::grid::{Extent, VoxelGrid};
use crate::palette::{Palette, PaletteEntry};
use elytra_logger::{log, LogSeverity::Debug};
use elytra_nbt::{Compound, Tag};
use std::collections::HashMap;
use std::sync::Arc;

const FORMAT_VERSION_KEY: &str = "format_version";
const SIZE_KEY: &str = "size";
const ORIGIN_KEY: &str = "structure_world_origin";
const STRUCTURE_KEY: &str = "structure";
const BLOCK_INDICES_KEY: &str = "block_indices";
const ENTITIES_KEY: &str = "entities";
const PALETTE_KEY: &str = "palette";
const BLOCK_PALETTE_KEY: &str = "block_palette";
const BLOCK_POSITION_DATA_KEY: &str = "block_position_data";
const BLOCK_ENTITY_DATA_KEY: &str = "block_entity_data";
const NAME_KEY: &str = "name";
const STATES_KEY: &str = "states";
const VERSION_KEY: &str = "version";

fn unexpected(field: &str, expected: &'static str, found: &Tag) -> DecodeError {
    DecodeError::UnexpectedType {
        field: field.to_owned(),
        expected,
        found: found.type_name(),
    }
}

fn required<'a>(compound: &'a Compound, field: &str) -> std::result::Result<&'a Tag, DecodeError> {
    compound
        .get(field)
        .ok_or_else(|| DecodeError::MissingField(field.to_owned()))
}

fn compound_field<'a>(
    compound: &'a Compound,
    field: &str,
) -> std::result::Result<&'a Compound, DecodeError> {
    let tag = required(compound, field)?;
    tag.as_compound()
        .ok_or_else(|| unexpected(field, "compound", tag))
}

/// Optional compound; absent means empty.
fn optional_compound<'a>(
    compound: &'a Compound,
    field: &str,
) -> std::result::Result<Option<&'a Compound>, DecodeError> {
    match compound.get(field) {
        None => Ok(None),
        Some(tag) => tag
            .as_compound()
            .map(Some)
            .ok_or_else(|| unexpected(field, "compound", tag)),
    }
}

/// Optional list; absent means empty.
fn optional_list<'a>(
    compound: &'a Compound,
    field: &str,
) -> std::result::Result<&'a [Tag], DecodeError> {
    match compound.get(field) {
        None => Ok(&[]),
        Some(tag) => tag
            .as_list()
            .map(Vec::as_slice)
            .ok_or_else(|| unexpected(field, "list", tag)),
    }
}

fn int_field(compound: &Compound, field: &str) -> std::result::Result<i32, DecodeError> {
    let tag = required(compound, field)?;
    tag.as_i32().ok_or_else(|| unexpected(field, "int", tag))
}

fn ints_field(compound: &Compound, field: &str) -> std::result::Result<Vec<i32>, DecodeError> {
    let tag = required(compound, field)?;
    tag.to_i32_vec()
        .ok_or_else(|| unexpected(field, "list of ints", tag))
}

fn int_list(values: impl IntoIterator<Item = i32>) -> Tag {
    Tag::List(values.into_iter().map(Tag::Int).collect())
}

/// Three non-negative axes whose cell count fits a `usize`.
fn decode_extent(size: &[i32]) -> std::result::Result<Extent, ValidationError> {
    let bad = || ValidationError::BadExtent(size.to_vec());
    let [x, y, z] = size else {
        return Err(bad());
    };
    let axis = |v: i32| usize::try_from(v).map_err(|_| bad());
    let extent = Extent::new(axis(*x)?, axis(*y)?, axis(*z)?);
    match extent.volume() {
        Some(_) => Ok(extent),
        None => Err(bad()),
    }
}

fn decode_entry(tag: &Tag, index: usize) -> std::result::Result<PaletteEntry, DecodeError> {
    let field = format!("{}[{}]", BLOCK_PALETTE_KEY, index);
    let entry = tag
        .as_compound()
        .ok_or_else(|| unexpected(&field, "compound", tag))?;

    let name_tag = required(entry, NAME_KEY)?;
    let name = name_tag
        .as_string()
        .ok_or_else(|| unexpected(NAME_KEY, "string", name_tag))?;
    let properties = optional_compound(entry, STATES_KEY)?
        .cloned()
        .unwrap_or_default();
    let version = match entry.get(VERSION_KEY) {
        None => 0,
        Some(tag) => tag
            .as_i32()
            .ok_or_else(|| unexpected(VERSION_KEY, "int", tag))?,
    };
    Ok(PaletteEntry::new(name.clone(), properties, version))
}

fn decode_palette<B: Clone>(tag: &Tag, name: &str) -> std::result::Result<Palette<B>, DecodeError> {
    let palette = tag
        .as_compound()
        .ok_or_else(|| unexpected(&format!("{}.{}", PALETTE_KEY, name), "compound", tag))?;

    let entries = optional_list(palette, BLOCK_PALETTE_KEY)?
        .iter()
        .enumerate()
        .map(|(index, tag)| decode_entry(tag, index))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut position_data = HashMap::new();
    if let Some(positions) = optional_compound(palette, BLOCK_POSITION_DATA_KEY)? {
        for (key, data) in positions {
            let offset = key
                .parse::<usize>()
                .map_err(|_| DecodeError::InvalidPositionKey(key.clone()))?;
            let data = data
                .as_compound()
                .ok_or_else(|| unexpected(key, "compound", data))?;
            // Position data without block entity data carries nothing we keep.
            if let Some(block_entity) = optional_compound(data, BLOCK_ENTITY_DATA_KEY)? {
                position_data.insert(offset, block_entity.clone());
            }
        }
    }
    Ok(Palette::from_parts(entries, position_data))
}

/// Builds a structure from its tag tree and validates it. The default palette is active
/// afterwards.
pub fn decode<C: BlockCatalog>(tag: &Tag, catalog: Arc<C>) -> Result<Structure<C>> {
    let root = tag
        .as_compound()
        .ok_or_else(|| unexpected("root", "compound", tag))?;

    let format_version = int_field(root, FORMAT_VERSION_KEY)?;
    if format_version != crate::document::FORMAT_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            found: format_version,
            expected: crate::document::FORMAT_VERSION,
        }
        .into());
    }
    let extent = decode_extent(&ints_field(root, SIZE_KEY)?)?;
    let origin = match ints_field(root, ORIGIN_KEY)?.as_slice() {
        [x, y, z] => [*x, *y, *z],
        other => return Err(ValidationError::BadOrigin(other.to_vec()).into()),
    };

    let structure = compound_field(root, STRUCTURE_KEY)?;

    let layers = optional_list(structure, BLOCK_INDICES_KEY)?
        .iter()
        .enumerate()
        .map(|(layer, tag)| {
            tag.to_i32_vec().ok_or_else(|| {
                unexpected(&format!("{}[{}]", BLOCK_INDICES_KEY, layer), "list of ints", tag)
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let entities = optional_list(structure, ENTITIES_KEY)?
        .iter()
        .enumerate()
        .map(|(index, tag)| {
            tag.as_compound().cloned().ok_or_else(|| {
                unexpected(&format!("{}[{}]", ENTITIES_KEY, index), "compound", tag)
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut palettes = HashMap::new();
    if let Some(named) = optional_compound(structure, PALETTE_KEY)? {
        for (name, tag) in named {
            palettes.insert(name.clone(), decode_palette(tag, name)?);
        }
    }

    let grid = VoxelGrid::from_layers(extent, layers)?;
    let structure = Structure::from_parts(catalog, format_version, origin, entities, grid, palettes)?;
    log(
        format!(
            "Decoded {} structure with palettes {:?}",
            structure.extent(),
            structure.palette_names()
        ),
        Debug,
    );
    Ok(structure)
}

fn encode_palette<B: Clone>(palette: &Palette<B>) -> Tag {
    let entries = palette
        .entries()
        .iter()
        .map(|entry| {
            let mut compound = Compound::new();
            compound.insert(NAME_KEY.to_owned(), Tag::String(entry.name.clone()));
            compound.insert(STATES_KEY.to_owned(), Tag::Compound(entry.properties.clone()));
            compound.insert(VERSION_KEY.to_owned(), Tag::Int(entry.version));
            Tag::Compound(compound)
        })
        .collect();

    let positions = palette
        .position_data()
        .iter()
        .map(|(offset, payload)| {
            let mut data = Compound::new();
            data.insert(BLOCK_ENTITY_DATA_KEY.to_owned(), Tag::Compound(payload.clone()));
            (offset.to_string(), Tag::Compound(data))
        })
        .collect();

    let mut compound = Compound::new();
    compound.insert(BLOCK_PALETTE_KEY.to_owned(), Tag::List(entries));
    compound.insert(BLOCK_POSITION_DATA_KEY.to_owned(), Tag::Compound(positions));
    Tag::Compound(compound)
}

/// Builds the tag tree of a structure. The active palette is written under its own name next to
/// the other palettes.
pub fn encode<C: BlockCatalog>(structure: &Structure<C>) -> Tag {
    let extent = structure.extent();

    let layers = structure
        .grid()
        .layers()
        .iter()
        .map(|cells| int_list(cells.iter().copied()))
        .collect();
    let entities = structure
        .entities()
        .iter()
        .cloned()
        .map(Tag::Compound)
        .collect();
    let palettes = structure
        .committed_palettes()
        .map(|(name, palette)| (name.to_owned(), encode_palette(palette)))
        .collect();

    let mut data = Compound::new();
    data.insert(BLOCK_INDICES_KEY.to_owned(), Tag::List(layers));
    data.insert(ENTITIES_KEY.to_owned(), Tag::List(entities));
    data.insert(PALETTE_KEY.to_owned(), Tag::Compound(palettes));

    // Grids refuse axes above i32::MAX when they are built.
    let axis = |v: usize| i32::try_from(v).unwrap_or(i32::MAX);

    let mut root = Compound::new();
    root.insert(
        FORMAT_VERSION_KEY.to_owned(),
        Tag::Int(structure.format_version()),
    );
    root.insert(
        SIZE_KEY.to_owned(),
        int_list([axis(extent.x), axis(extent.y), axis(extent.z)]),
    );
    root.insert(ORIGIN_KEY.to_owned(), int_list(structure.origin()));
    root.insert(STRUCTURE_KEY.to_owned(), Tag::Compound(data));
    Tag::Compound(root)
}

impl<C: BlockCatalog> Structure<C> {
    pub fn from_tag(tag: &Tag, catalog: Arc<C>) -> Result<Self> {
        decode(tag, catalog)
    }

    pub fn to_tag(&self) -> Tag {
        encode(self)
    }
}
