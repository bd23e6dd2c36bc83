use crate::catalog::{BlockCatalog, Properties};
use elytra_logger::{enabled, log, LogSeverity::Debug};
use elytra_nbt::Compound;
use std::collections::HashMap;

/// A deduplicated block identity.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    pub name: String,
    pub properties: Properties,
    /// Block version the entry was written under. Drives `BlockCatalog::upgrade`.
    pub version: i32,
}

impl PaletteEntry {
    pub fn new(name: impl Into<String>, properties: Properties, version: i32) -> Self {
        PaletteEntry {
            name: name.into(),
            properties,
            version,
        }
    }

    pub fn matches(&self, name: &str, properties: &Properties) -> bool {
        self.name == name && self.properties == *properties
    }
}

/// Runtime block an entry resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBlock<B> {
    pub block: B,
    pub has_payload: bool,
}

/// Append-only table of block identities plus the auxiliary payloads attached to positions.
///
/// While a palette is active its entries are mirrored by a cache of resolved blocks, so reads
/// never go back to the catalog.
#[derive(Debug, Clone)]
pub struct Palette<B> {
    entries: Vec<PaletteEntry>,
    position_data: HashMap<usize, Compound>,
    resolved: Vec<Option<ResolvedBlock<B>>>,
    active: bool,
}

impl<B> Default for Palette<B> {
    fn default() -> Self {
        Palette {
            entries: Vec::new(),
            position_data: HashMap::new(),
            resolved: Vec::new(),
            active: false,
        }
    }
}

impl<B: Clone> Palette<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(entries: Vec<PaletteEntry>, position_data: HashMap<usize, Compound>) -> Self {
        Palette {
            entries,
            position_data,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&PaletteEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Index of the first entry with this identity. Earlier entries win ties.
    pub fn lookup(&self, name: &str, properties: &Properties) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.matches(name, properties))
    }

    /// Appends an entry and returns its index. Active palettes resolve it right away.
    pub fn insert<C>(&mut self, catalog: &C, entry: PaletteEntry) -> usize
    where
        C: BlockCatalog<Block = B>,
    {
        if self.active {
            self.resolved.push(Self::resolve(catalog, &entry));
        }
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Index of an identity, appending it with the catalog's block version if it is new.
    pub fn index_or_insert<C>(&mut self, catalog: &C, name: String, properties: Properties) -> usize
    where
        C: BlockCatalog<Block = B>,
    {
        match self.lookup(&name, &properties) {
            Some(index) => index,
            None => {
                let version = catalog.block_version();
                self.insert(catalog, PaletteEntry::new(name, properties, version))
            }
        }
    }

    /// Overwrites an entry in place, keeping the cache in step.
    pub fn replace<C>(&mut self, catalog: &C, index: usize, entry: PaletteEntry)
    where
        C: BlockCatalog<Block = B>,
    {
        if index >= self.entries.len() {
            return;
        }
        if self.active {
            if let Some(slot) = self.resolved.get_mut(index) {
                *slot = Self::resolve(catalog, &entry);
            }
        }
        self.entries[index] = entry;
    }

    /// Rebuilds the resolved cache from the entries, in order.
    pub fn activate<C>(&mut self, catalog: &C)
    where
        C: BlockCatalog<Block = B>,
    {
        self.resolved = self
            .entries
            .iter()
            .map(|entry| Self::resolve(catalog, entry))
            .collect();
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.resolved = Vec::new();
        self.active = false;
    }

    /// Resolves an entry through the catalog, upgrading entries written under an older block
    /// version first. Unknown identities resolve to `None`.
    pub fn resolve<C>(catalog: &C, entry: &PaletteEntry) -> Option<ResolvedBlock<B>>
    where
        C: BlockCatalog<Block = B>,
    {
        let block = if entry.version < catalog.block_version() {
            let (name, properties) = catalog.upgrade(&entry.name, &entry.properties, entry.version);
            catalog.resolve(&name, &properties)
        } else {
            catalog.resolve(&entry.name, &entry.properties)
        };

        match block {
            Some(block) => Some(ResolvedBlock {
                has_payload: catalog.has_auxiliary_payload(&block),
                block,
            }),
            None => {
                if enabled(Debug) {
                    log(
                        format!("Unknown block {} {:?}", entry.name, entry.properties),
                        Debug,
                    );
                }
                None
            }
        }
    }

    /// Cached block behind a grid pointer. `NO_BLOCK`, unknown pointers and unresolvable
    /// entries all give `None`.
    pub fn resolved(&self, pointer: i32) -> Option<&ResolvedBlock<B>> {
        let index = usize::try_from(pointer).ok()?;
        self.resolved.get(index)?.as_ref()
    }

    pub fn position_data(&self) -> &HashMap<usize, Compound> {
        &self.position_data
    }

    pub fn payload(&self, offset: usize) -> Option<&Compound> {
        self.position_data.get(&offset)
    }

    pub fn set_payload(&mut self, offset: usize, payload: Compound) {
        self.position_data.insert(offset, payload);
    }

    pub fn remove_payload(&mut self, offset: usize) -> Option<Compound> {
        self.position_data.remove(&offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elytra_nbt::Tag;

    const VERSION: i32 = 3;

    /// Knows every name except `minecraft:unknown`. Chests carry payload.
    struct NameCatalog;

    impl BlockCatalog for NameCatalog {
        type Block = String;

        fn block_version(&self) -> i32 {
            VERSION
        }

        fn encode_identity(&self, block: &String) -> (String, Properties) {
            (block.clone(), Properties::new())
        }

        fn resolve(&self, name: &str, _properties: &Properties) -> Option<String> {
            (name != "minecraft:unknown").then(|| name.to_owned())
        }

        fn upgrade(&self, name: &str, properties: &Properties, _version: i32) -> (String, Properties) {
            (name.replace("legacy_", ""), properties.clone())
        }

        fn has_auxiliary_payload(&self, block: &String) -> bool {
            block == "minecraft:chest"
        }

        fn is_liquid(&self, block: &String) -> bool {
            block == "minecraft:water"
        }
    }

    fn props(key: &str, value: i32) -> Properties {
        let mut properties = Properties::new();
        properties.insert(key.to_owned(), Tag::Int(value));
        properties
    }

    #[test]
    fn test_dedup() {
        let mut palette = Palette::new();
        let stone = palette.index_or_insert(&NameCatalog, "minecraft:stone".into(), props("a", 1));
        let again = palette.index_or_insert(&NameCatalog, "minecraft:stone".into(), props("a", 1));
        assert_eq!(stone, again);
        assert_eq!(palette.len(), 1);

        let other = palette.index_or_insert(&NameCatalog, "minecraft:stone".into(), props("a", 2));
        assert_eq!(other, 1);
        let bare = palette.index_or_insert(&NameCatalog, "minecraft:stone".into(), Properties::new());
        assert_eq!(bare, 2);
        assert_eq!(palette.len(), 3);
        assert_eq!(palette.entry(2).unwrap().version, VERSION);
    }

    #[test]
    fn test_first_match_wins() {
        let mut palette: Palette<String> = Palette::from_parts(
            vec![
                PaletteEntry::new("minecraft:dirt", Properties::new(), 1),
                PaletteEntry::new("minecraft:dirt", Properties::new(), 2),
            ],
            HashMap::new(),
        );
        assert_eq!(palette.lookup("minecraft:dirt", &Properties::new()), Some(0));
        palette.activate(&NameCatalog);
        assert_eq!(palette.resolved(1).unwrap().block, "minecraft:dirt");
    }

    #[test]
    fn test_cache_follows_inserts_while_active() {
        let mut palette = Palette::new();
        palette.insert(&NameCatalog, PaletteEntry::new("minecraft:chest", Properties::new(), VERSION));
        assert!(palette.resolved(0).is_none());

        palette.activate(&NameCatalog);
        let chest = palette.resolved(0).unwrap();
        assert!(chest.has_payload);

        palette.insert(&NameCatalog, PaletteEntry::new("minecraft:unknown", Properties::new(), VERSION));
        palette.insert(&NameCatalog, PaletteEntry::new("minecraft:water", Properties::new(), VERSION));
        assert!(palette.resolved(1).is_none());
        assert_eq!(palette.resolved(2).unwrap().block, "minecraft:water");
        assert!(palette.resolved(-1).is_none());
        assert!(palette.resolved(3).is_none());

        palette.deactivate();
        assert!(palette.resolved(0).is_none());
        assert_eq!(palette.len(), 3);
    }

    #[test]
    fn test_old_entries_are_upgraded() {
        let mut palette: Palette<String> = Palette::from_parts(
            vec![
                PaletteEntry::new("minecraft:legacy_log", Properties::new(), VERSION - 1),
                PaletteEntry::new("minecraft:legacy_log", Properties::new(), VERSION),
            ],
            HashMap::new(),
        );
        palette.activate(&NameCatalog);
        assert_eq!(palette.resolved(0).unwrap().block, "minecraft:log");
        assert_eq!(palette.resolved(1).unwrap().block, "minecraft:legacy_log");
    }

    #[test]
    fn test_replace_updates_cache() {
        let mut palette = Palette::new();
        palette.activate(&NameCatalog);
        palette.insert(&NameCatalog, PaletteEntry::new("minecraft:stone", Properties::new(), VERSION));
        palette.replace(&NameCatalog, 0, PaletteEntry::new("minecraft:chest", Properties::new(), VERSION));
        assert_eq!(palette.resolved(0).unwrap().block, "minecraft:chest");
        palette.replace(&NameCatalog, 5, PaletteEntry::new("minecraft:chest", Properties::new(), VERSION));
        assert_eq!(palette.len(), 1);
    }

    #[test]
    fn test_payloads() {
        let mut palette: Palette<String> = Palette::new();
        let mut payload = Compound::new();
        payload.insert("id".to_owned(), Tag::String("Chest".to_owned()));
        palette.set_payload(7, payload.clone());
        assert_eq!(palette.payload(7), Some(&payload));
        assert_eq!(palette.remove_payload(7), Some(payload));
        assert!(palette.payload(7).is_none());
    }
}
