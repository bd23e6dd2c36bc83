use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::{self, Read, Write};

/// Named children of a `Tag::Compound`.
pub type Compound = HashMap<String, Tag>;

// Deeper trees than this are rejected instead of recursing until the stack gives out.
const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<Tag>),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn read_len<E: ByteOrder, R: Read>(reader: &mut R) -> io::Result<usize> {
    let length = reader.read_i32::<E>()?;
    usize::try_from(length).map_err(|_| invalid_data(format!("Negative length: {}", length)))
}

fn write_len<E: ByteOrder, W: Write>(writer: &mut W, len: usize) -> io::Result<()> {
    let length = i32::try_from(len)
        .map_err(|_| invalid_data(format!("Length does not fit in an i32: {}", len)))?;
    writer.write_i32::<E>(length)
}

fn read_str<E: ByteOrder, R: Read>(reader: &mut R) -> io::Result<String> {
    let length = reader.read_u16::<E>()?;
    let mut bytes = vec![0u8; length as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn write_str<E: ByteOrder, W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let length = u16::try_from(value.len())
        .map_err(|_| invalid_data(format!("String too long: {} bytes", value.len())))?;
    writer.write_u16::<E>(length)?;
    writer.write_all(value.as_bytes())
}

impl Tag {
    pub fn get_type_id(&self) -> u8 {
        match self {
            Tag::End => 0,
            Tag::Byte(_) => 1,
            Tag::Short(_) => 2,
            Tag::Int(_) => 3,
            Tag::Long(_) => 4,
            Tag::Float(_) => 5,
            Tag::Double(_) => 6,
            Tag::ByteArray(_) => 7,
            Tag::String(_) => 8,
            Tag::List(_) => 9,
            Tag::Compound(_) => 10,
            Tag::IntArray(_) => 11,
            Tag::LongArray(_) => 12,
        }
    }

    /// Human readable name of the tag type, used in decode error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Tag::End => "end",
            Tag::Byte(_) => "byte",
            Tag::Short(_) => "short",
            Tag::Int(_) => "int",
            Tag::Long(_) => "long",
            Tag::Float(_) => "float",
            Tag::Double(_) => "double",
            Tag::ByteArray(_) => "byte array",
            Tag::String(_) => "string",
            Tag::List(_) => "list",
            Tag::Compound(_) => "compound",
            Tag::IntArray(_) => "int array",
            Tag::LongArray(_) => "long array",
        }
    }

    /// Reads a named tag in the Java (big-endian) flavour.
    pub fn read<R: Read>(reader: &mut R) -> io::Result<(String, Tag)> {
        Tag::read_with::<BigEndian, R>(reader)
    }

    /// Reads a named tag in the Bedrock (little-endian) flavour.
    pub fn read_le<R: Read>(reader: &mut R) -> io::Result<(String, Tag)> {
        Tag::read_with::<LittleEndian, R>(reader)
    }

    pub fn read_with<E: ByteOrder, R: Read>(reader: &mut R) -> io::Result<(String, Tag)> {
        Tag::read_named::<E, R>(reader, 0)
    }

    fn read_named<E: ByteOrder, R: Read>(reader: &mut R, depth: usize) -> io::Result<(String, Tag)> {
        let type_id = reader.read_u8()?;
        if type_id == 0 {
            return Ok((String::new(), Tag::End));
        }

        let name = read_str::<E, R>(reader)?;
        let tag = Tag::read_payload::<E, R>(reader, type_id, depth)?;
        Ok((name, tag))
    }

    fn read_payload<E: ByteOrder, R: Read>(
        reader: &mut R,
        type_id: u8,
        depth: usize,
    ) -> io::Result<Tag> {
        if depth > MAX_DEPTH {
            return Err(invalid_data(format!("Nesting deeper than {}", MAX_DEPTH)));
        }
        match type_id {
            0 => Ok(Tag::End),
            1 => Ok(Tag::Byte(reader.read_i8()?)),
            2 => Ok(Tag::Short(reader.read_i16::<E>()?)),
            3 => Ok(Tag::Int(reader.read_i32::<E>()?)),
            4 => Ok(Tag::Long(reader.read_i64::<E>()?)),
            5 => Ok(Tag::Float(reader.read_f32::<E>()?)),
            6 => Ok(Tag::Double(reader.read_f64::<E>()?)),
            7 => {
                let length = read_len::<E, R>(reader)?;
                let mut bytes = Vec::new();
                (&mut *reader).take(length as u64).read_to_end(&mut bytes)?;
                if bytes.len() != length {
                    return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
                }
                Ok(Tag::ByteArray(bytes.into_iter().map(|b| b as i8).collect()))
            }
            8 => Ok(Tag::String(read_str::<E, R>(reader)?)),
            9 => {
                let list_type = reader.read_u8()?;
                let length = read_len::<E, R>(reader)?;
                if list_type == 0 && length > 0 {
                    return Err(invalid_data(format!("List of {} end tags", length)));
                }
                // Lengths come from the stream, so growth is driven by what was actually read.
                let mut list = Vec::new();
                for _ in 0..length {
                    list.push(Tag::read_payload::<E, R>(reader, list_type, depth + 1)?);
                }
                Ok(Tag::List(list))
            }
            10 => {
                let mut compound = HashMap::new();
                loop {
                    let (name, tag) = Tag::read_named::<E, R>(reader, depth + 1)?;
                    if let Tag::End = tag {
                        break;
                    }
                    compound.insert(name, tag);
                }
                Ok(Tag::Compound(compound))
            }
            11 => {
                let length = read_len::<E, R>(reader)?;
                let mut ints = Vec::new();
                for _ in 0..length {
                    ints.push(reader.read_i32::<E>()?);
                }
                Ok(Tag::IntArray(ints))
            }
            12 => {
                let length = read_len::<E, R>(reader)?;
                let mut longs = Vec::new();
                for _ in 0..length {
                    longs.push(reader.read_i64::<E>()?);
                }
                Ok(Tag::LongArray(longs))
            }
            _ => Err(invalid_data(format!("Invalid tag type: {}", type_id))),
        }
    }

    /// Writes a named tag in the Java (big-endian) flavour.
    pub fn write<W: Write>(&self, writer: &mut W, name: &str) -> io::Result<()> {
        self.write_with::<BigEndian, W>(writer, name)
    }

    /// Writes a named tag in the Bedrock (little-endian) flavour.
    pub fn write_le<W: Write>(&self, writer: &mut W, name: &str) -> io::Result<()> {
        self.write_with::<LittleEndian, W>(writer, name)
    }

    pub fn write_with<E: ByteOrder, W: Write>(&self, writer: &mut W, name: &str) -> io::Result<()> {
        writer.write_u8(self.get_type_id())?;

        if !matches!(self, Tag::End) {
            write_str::<E, W>(writer, name)?;
        }

        self.write_payload::<E, W>(writer)
    }

    fn write_payload<E: ByteOrder, W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Tag::End => Ok(()),
            Tag::Byte(v) => writer.write_i8(*v),
            Tag::Short(v) => writer.write_i16::<E>(*v),
            Tag::Int(v) => writer.write_i32::<E>(*v),
            Tag::Long(v) => writer.write_i64::<E>(*v),
            Tag::Float(v) => writer.write_f32::<E>(*v),
            Tag::Double(v) => writer.write_f64::<E>(*v),
            Tag::ByteArray(v) => {
                write_len::<E, W>(writer, v.len())?;
                let bytes: Vec<u8> = v.iter().map(|&b| b as u8).collect();
                writer.write_all(&bytes)
            }
            Tag::String(v) => write_str::<E, W>(writer, v),
            Tag::List(v) => {
                // Empty lists are typed TAG_End.
                let element_type = v.first().map_or(0, Tag::get_type_id);
                if let Some(odd) = v.iter().find(|tag| tag.get_type_id() != element_type) {
                    return Err(invalid_data(format!(
                        "List mixes {} and {} elements",
                        v[0].type_name(),
                        odd.type_name()
                    )));
                }
                writer.write_u8(element_type)?;
                write_len::<E, W>(writer, v.len())?;
                for tag in v {
                    tag.write_payload::<E, W>(writer)?;
                }
                Ok(())
            }
            Tag::Compound(v) => {
                for (name, tag) in v {
                    tag.write_with::<E, W>(writer, name)?;
                }
                Tag::End.write_with::<E, W>(writer, "")
            }
            Tag::IntArray(v) => {
                write_len::<E, W>(writer, v.len())?;
                for &i in v {
                    writer.write_i32::<E>(i)?;
                }
                Ok(())
            }
            Tag::LongArray(v) => {
                write_len::<E, W>(writer, v.len())?;
                for &l in v {
                    writer.write_i64::<E>(l)?;
                }
                Ok(())
            }
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Tag>> {
        match self {
            Tag::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&String> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Tag::Short(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Tag::Byte(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Tag::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Tag::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Reads a sequence of ints stored either as a list of `Int` tags or as an `IntArray`.
    pub fn to_i32_vec(&self) -> Option<Vec<i32>> {
        match self {
            Tag::IntArray(ints) => Some(ints.clone()),
            Tag::List(list) => list.iter().map(Tag::as_i32).collect(),
            _ => None,
        }
    }
}

// NBTFile represents a complete NBT file with compression support
pub struct NBTFile {
    pub root: Tag,
    pub name: String,
}

impl NBTFile {
    pub fn new(name: String, root: Tag) -> Self {
        NBTFile { root, name }
    }

    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        Self::read_with::<BigEndian, R>(reader)
    }

    pub fn read_with<E: ByteOrder, R: Read>(reader: &mut R) -> io::Result<Self> {
        let (name, root) = Tag::read_with::<E, R>(reader)?;
        Ok(NBTFile { root, name })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.write_with::<BigEndian, W>(writer)
    }

    pub fn write_with<E: ByteOrder, W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.root.write_with::<E, W>(writer, &self.name)
    }

    pub fn read_gzip<R: Read>(reader: &mut R) -> io::Result<Self> {
        Self::read_gzip_with::<BigEndian, R>(reader)
    }

    pub fn read_gzip_with<E: ByteOrder, R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut decoder = GzDecoder::new(reader);
        Self::read_with::<E, _>(&mut decoder)
    }

    pub fn write_gzip<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.write_gzip_with::<BigEndian, W>(writer)
    }

    pub fn write_gzip_with<E: ByteOrder, W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        self.write_with::<E, _>(&mut encoder)?;
        encoder.finish()?;
        Ok(())
    }
}
