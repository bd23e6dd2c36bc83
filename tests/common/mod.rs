use elytra_structure::{BlockCatalog, Compound, Direction, Properties, Rotatable, Tag};
use std::collections::HashMap;
use std::sync::Arc;

pub const CURRENT_VERSION: i32 = 17_959_425;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Rotatable for Facing {
    fn rotate(&self, direction: Direction) -> Self {
        match (self, direction) {
            (Facing::North, Direction::Right) | (Facing::South, Direction::Left) => Facing::East,
            (Facing::East, Direction::Right) | (Facing::West, Direction::Left) => Facing::South,
            (Facing::South, Direction::Right) | (Facing::North, Direction::Left) => Facing::West,
            (Facing::West, Direction::Right) | (Facing::East, Direction::Left) => Facing::North,
        }
    }
}

impl Facing {
    fn to_int(self) -> i32 {
        match self {
            Facing::North => 2,
            Facing::South => 3,
            Facing::West => 4,
            Facing::East => 5,
        }
    }

    fn from_int(value: i32) -> Option<Self> {
        match value {
            2 => Some(Facing::North),
            3 => Some(Facing::South),
            4 => Some(Facing::West),
            5 => Some(Facing::East),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Rotatable for Axis {
    fn rotate(&self, _direction: Direction) -> Self {
        match self {
            Axis::X => Axis::Z,
            Axis::Y => Axis::Y,
            Axis::Z => Axis::X,
        }
    }
}

impl Axis {
    fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Air,
    Stone,
    Wool { color: String },
    Stairs { facing: Facing },
    Log { axis: Axis },
    Chest { facing: Facing, items: Vec<String> },
    Water { depth: i32 },
}

impl Block {
    pub fn wool(color: &str) -> Self {
        Block::Wool {
            color: color.to_owned(),
        }
    }

    pub fn chest(items: &[&str]) -> Self {
        Block::Chest {
            facing: Facing::North,
            items: items.iter().map(|item| item.to_string()).collect(),
        }
    }

    pub fn water() -> Self {
        Block::Water { depth: 0 }
    }

    /// The block with its orientation dropped, for comparing positions only.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Air => "air",
            Block::Stone => "stone",
            Block::Wool { .. } => "wool",
            Block::Stairs { .. } => "stairs",
            Block::Log { .. } => "log",
            Block::Chest { .. } => "chest",
            Block::Water { .. } => "water",
        }
    }
}

/// Block registry for tests. `minecraft:log` is the old name of `minecraft:oak_log`.
pub struct TestCatalog;

pub fn catalog() -> Arc<TestCatalog> {
    Arc::new(TestCatalog)
}

pub fn props(pairs: &[(&str, Tag)]) -> Properties {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

impl BlockCatalog for TestCatalog {
    type Block = Block;

    fn block_version(&self) -> i32 {
        CURRENT_VERSION
    }

    fn encode_identity(&self, block: &Block) -> (String, Properties) {
        let (name, properties) = match block {
            Block::Air => ("minecraft:air", Properties::new()),
            Block::Stone => ("minecraft:stone", Properties::new()),
            Block::Wool { color } => (
                "minecraft:wool",
                props(&[("color", Tag::String(color.clone()))]),
            ),
            Block::Stairs { facing } => (
                "minecraft:oak_stairs",
                props(&[("facing_direction", Tag::Int(facing.to_int()))]),
            ),
            Block::Log { axis } => (
                "minecraft:oak_log",
                props(&[("pillar_axis", Tag::String(axis.name().to_owned()))]),
            ),
            Block::Chest { facing, .. } => (
                "minecraft:chest",
                props(&[("facing_direction", Tag::Int(facing.to_int()))]),
            ),
            Block::Water { depth } => (
                "minecraft:water",
                props(&[("liquid_depth", Tag::Int(*depth))]),
            ),
        };
        (name.to_owned(), properties)
    }

    fn resolve(&self, name: &str, properties: &Properties) -> Option<Block> {
        let facing = || {
            properties
                .get("facing_direction")
                .and_then(Tag::as_i32)
                .and_then(Facing::from_int)
        };
        match name {
            "minecraft:air" => Some(Block::Air),
            "minecraft:stone" => Some(Block::Stone),
            "minecraft:wool" => Some(Block::Wool {
                color: properties.get("color")?.as_string()?.clone(),
            }),
            "minecraft:oak_stairs" => Some(Block::Stairs { facing: facing()? }),
            "minecraft:oak_log" => Some(Block::Log {
                axis: Axis::from_name(properties.get("pillar_axis")?.as_string()?)?,
            }),
            "minecraft:chest" => Some(Block::Chest {
                facing: facing()?,
                items: Vec::new(),
            }),
            "minecraft:water" => Some(Block::Water {
                depth: properties.get("liquid_depth")?.as_i32()?,
            }),
            _ => None,
        }
    }

    fn upgrade(&self, name: &str, properties: &Properties, _version: i32) -> (String, Properties) {
        match name {
            "minecraft:log" => ("minecraft:oak_log".to_owned(), properties.clone()),
            _ => (name.to_owned(), properties.clone()),
        }
    }

    fn has_auxiliary_payload(&self, block: &Block) -> bool {
        matches!(block, Block::Chest { .. })
    }

    fn encode_auxiliary_payload(&self, block: &Block) -> Compound {
        let mut payload = Compound::new();
        if let Block::Chest { items, .. } = block {
            payload.insert("id".to_owned(), Tag::String("Chest".to_owned()));
            payload.insert(
                "Items".to_owned(),
                Tag::List(items.iter().cloned().map(Tag::String).collect()),
            );
        }
        payload
    }

    fn decode_auxiliary_payload(&self, block: Block, payload: &Compound) -> Block {
        match block {
            Block::Chest { facing, .. } => Block::Chest {
                facing,
                items: payload
                    .get("Items")
                    .and_then(Tag::as_list)
                    .map(|items| items.iter().filter_map(Tag::as_string).cloned().collect())
                    .unwrap_or_default(),
            },
            other => other,
        }
    }

    fn is_liquid(&self, block: &Block) -> bool {
        matches!(block, Block::Water { .. })
    }

    fn rotate(&self, block: &Block, direction: Direction) -> Option<Block> {
        match block {
            Block::Stairs { facing } => Some(Block::Stairs {
                facing: facing.rotate(direction),
            }),
            Block::Log { axis } => Some(Block::Log {
                axis: axis.rotate(direction),
            }),
            Block::Chest { facing, items } => Some(Block::Chest {
                facing: facing.rotate(direction),
                items: items.clone(),
            }),
            _ => None,
        }
    }
}

pub fn entry_tag(name: &str, states: Properties, version: i32) -> Tag {
    let mut entry = Compound::new();
    entry.insert("name".to_owned(), Tag::String(name.to_owned()));
    entry.insert("states".to_owned(), Tag::Compound(states));
    entry.insert("version".to_owned(), Tag::Int(version));
    Tag::Compound(entry)
}

pub fn palette_tag(entries: Vec<Tag>) -> Tag {
    let mut palette = Compound::new();
    palette.insert("block_palette".to_owned(), Tag::List(entries));
    palette.insert(
        "block_position_data".to_owned(),
        Tag::Compound(Compound::new()),
    );
    Tag::Compound(palette)
}

fn ints(values: &[i32]) -> Tag {
    Tag::List(values.iter().copied().map(Tag::Int).collect())
}

/// Tag tree of a structure with the given fields; everything else is left empty.
pub fn structure_tag(
    format_version: i32,
    size: &[i32],
    origin: &[i32],
    layers: &[Vec<i32>],
    palettes: HashMap<String, Tag>,
) -> Tag {
    let mut data = Compound::new();
    data.insert(
        "block_indices".to_owned(),
        Tag::List(layers.iter().map(|layer| ints(layer)).collect()),
    );
    data.insert("entities".to_owned(), Tag::List(Vec::new()));
    data.insert("palette".to_owned(), Tag::Compound(palettes));

    let mut root = Compound::new();
    root.insert("format_version".to_owned(), Tag::Int(format_version));
    root.insert("size".to_owned(), ints(size));
    root.insert("structure_world_origin".to_owned(), ints(origin));
    root.insert("structure".to_owned(), Tag::Compound(data));
    Tag::Compound(root)
}

/// A single `default` palette holding stone and air.
pub fn stone_and_air() -> HashMap<String, Tag> {
    let mut palettes = HashMap::new();
    palettes.insert(
        "default".to_owned(),
        palette_tag(vec![
            entry_tag("minecraft:stone", Properties::new(), CURRENT_VERSION),
            entry_tag("minecraft:air", Properties::new(), CURRENT_VERSION),
        ]),
    );
    palettes
}
