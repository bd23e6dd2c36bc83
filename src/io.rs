use crate::catalog::BlockCatalog;
use crate::document::Structure;
use crate::error::Result;
use byteorder::{BigEndian, LittleEndian};
use elytra_nbt::NBTFile;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Byte order of the tag stream. Bedrock `.mcstructure` files are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

/// How structures are laid out on disk. The default matches Bedrock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    pub endian: Endian,
    pub compression: Compression,
}

fn read_nbt<R: Read>(reader: &mut R, options: CodecOptions) -> std::io::Result<NBTFile> {
    match (options.endian, options.compression) {
        (Endian::Little, Compression::None) => NBTFile::read_with::<LittleEndian, R>(reader),
        (Endian::Little, Compression::Gzip) => NBTFile::read_gzip_with::<LittleEndian, R>(reader),
        (Endian::Big, Compression::None) => NBTFile::read_with::<BigEndian, R>(reader),
        (Endian::Big, Compression::Gzip) => NBTFile::read_gzip_with::<BigEndian, R>(reader),
    }
}

fn write_nbt<W: Write>(file: &NBTFile, writer: &mut W, options: CodecOptions) -> std::io::Result<()> {
    match (options.endian, options.compression) {
        (Endian::Little, Compression::None) => file.write_with::<LittleEndian, W>(writer),
        (Endian::Little, Compression::Gzip) => file.write_gzip_with::<LittleEndian, W>(writer),
        (Endian::Big, Compression::None) => file.write_with::<BigEndian, W>(writer),
        (Endian::Big, Compression::Gzip) => file.write_gzip_with::<BigEndian, W>(writer),
    }
}

impl<C: BlockCatalog> Structure<C> {
    /// Reads a Bedrock structure. The default palette is active afterwards; see `use_palette`.
    pub fn read<R: Read>(reader: &mut R, catalog: Arc<C>) -> Result<Self> {
        Self::read_with(reader, catalog, CodecOptions::default())
    }

    pub fn read_with<R: Read>(reader: &mut R, catalog: Arc<C>, options: CodecOptions) -> Result<Self> {
        let file = read_nbt(reader, options)?;
        Structure::from_tag(&file.root, catalog)
    }

    pub fn read_file<P: AsRef<Path>>(path: P, catalog: Arc<C>) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read(&mut reader, catalog)
    }

    /// Writes a Bedrock structure. The active palette is written under its current name.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.write_with(writer, CodecOptions::default())
    }

    pub fn write_with<W: Write>(&self, writer: &mut W, options: CodecOptions) -> Result<()> {
        let file = NBTFile::new(String::new(), self.to_tag());
        write_nbt(&file, writer, options)?;
        Ok(())
    }

    /// Writes the structure to a file, creating it if needed and truncating it otherwise.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
