//! One serializable entity: scalar fields plus child entities.
//!
//! An [`ObjectNode`] is the in-memory form of one object in the graph. It is
//! transient: built immediately before [`ObjectNode::pack`], or produced by
//! [`ObjectNode::unpack`] and discarded once its fields are extracted.
//!
//! # Packed layout
//!
//! A packed node is a 104-byte header followed by four sub-buffers:
//!
//! ```text
//! [ Header ] [ Strings ] [ Field Table ] [ Child Table ] [ Data Blob ]
//! ```
//!
//! The header holds string-table offsets for the node's own type/owner/name,
//! the two table counts, and `{offset, length}` for each sub-buffer (absolute
//! within the packed node). Field entries reference owner/name/type strings
//! and a `{offset, length}` slice of the data blob; child entries reference
//! owner/name strings and the child's fully packed bytes inside the same
//! blob, unpacked recursively. Only the strings table is deduplicated.

use crate::buffer::{checked_add, checked_mul, checked_range, read_cstr, ByteBuffer};
use crate::error::{Result, StowageError};
use crate::format::read_u64;
use crate::scalar::Scalar;

/// Size of the packed node header.
pub const NODE_HEADER_SIZE: usize = 104;

/// Packed size of one field-table entry.
pub const FIELD_ENTRY_SIZE: usize = 40;

/// Packed size of one child-table entry.
pub const CHILD_ENTRY_SIZE: usize = 32;

/// Type tag recorded for string fields.
pub const STR_TAG: &str = "str";

/// Type tag recorded for raw byte payloads.
pub const BYTES_TAG: &str = "bytes";

/// A leaf value attached to a node.
///
/// The stored length always equals the declared size at write time: the
/// record owns exactly the bytes it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    owner: String,
    name: String,
    type_tag: String,
    data: Vec<u8>,
}

impl FieldRecord {
    /// Owner type name.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recorded type tag.
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// The raw stored bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// One serializable entity: ordered fields and ordered child entities,
/// addressed by (owner, name) pairs.
///
/// Duplicates are permitted; lookups return the first match in insertion
/// order. [`ObjectNode::single_child`] enforces uniqueness where a caller
/// needs it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectNode {
    owner: String,
    name: String,
    type_tag: String,
    fields: Vec<FieldRecord>,
    children: Vec<ObjectNode>,
}

impl ObjectNode {
    /// Creates an empty node identified by (owner, name).
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            type_tag: String::new(),
            fields: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Owner type name.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Variable name within the parent scope.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The recorded type tag of the object this node serializes.
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Sets the recorded type tag.
    pub fn set_type_tag(&mut self, tag: impl Into<String>) {
        self.type_tag = tag.into();
    }

    /// The ordered field records.
    pub fn fields(&self) -> &[FieldRecord] {
        &self.fields
    }

    /// The ordered child nodes.
    pub fn children(&self) -> &[ObjectNode] {
        &self.children
    }

    // --- Building ---

    /// Attaches a field, copying `data` verbatim. Duplicates are permitted.
    pub fn add_field(
        &mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
        type_tag: impl Into<String>,
        data: &[u8],
    ) {
        self.fields.push(FieldRecord {
            owner: owner.into(),
            name: name.into(),
            type_tag: type_tag.into(),
            data: data.to_vec(),
        });
    }

    /// Attaches a scalar field under its type's tag.
    pub fn add_scalar<T: Scalar>(
        &mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
        value: T,
    ) {
        let mut data = Vec::with_capacity(T::SIZE);
        value.write_le(&mut data);
        self.fields.push(FieldRecord {
            owner: owner.into(),
            name: name.into(),
            type_tag: T::TAG.to_string(),
            data,
        });
    }

    /// Attaches a string field (UTF-8 bytes, no terminator; the record length
    /// carries the size).
    pub fn add_str(&mut self, owner: impl Into<String>, name: impl Into<String>, value: &str) {
        self.add_field(owner, name, STR_TAG, value.as_bytes());
    }

    /// Attaches a raw byte payload.
    pub fn add_bytes(&mut self, owner: impl Into<String>, name: impl Into<String>, data: &[u8]) {
        self.add_field(owner, name, BYTES_TAG, data);
    }

    /// Appends an empty child node and returns a handle for populating it.
    pub fn create_child(
        &mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> &mut ObjectNode {
        self.children.push(ObjectNode::new(owner, name));
        // Just pushed, so the vector is non-empty.
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Appends an already-built child node.
    pub fn add_child(&mut self, child: ObjectNode) {
        self.children.push(child);
    }

    // --- Lookup ---

    fn find_field(&self, owner: &str, name: &str) -> Option<&FieldRecord> {
        self.fields
            .iter()
            .find(|f| f.owner == owner && f.name == name)
    }

    /// Returns true if a field with this (owner, name) exists.
    pub fn has_field(&self, owner: &str, name: &str) -> bool {
        self.find_field(owner, name).is_some()
    }

    /// Returns the first child matching (owner, name), if any.
    pub fn get_child(&self, owner: &str, name: &str) -> Option<&ObjectNode> {
        self.children
            .iter()
            .find(|c| c.owner == owner && c.name == name)
    }

    /// Returns the child matching (owner, name), requiring exactly one match.
    ///
    /// # Errors
    /// [`StowageError::NotFound`] if no child matches,
    /// [`StowageError::MultipleEntries`] if more than one does.
    pub fn single_child(&self, owner: &str, name: &str) -> Result<&ObjectNode> {
        let mut matches = self
            .children
            .iter()
            .filter(|c| c.owner == owner && c.name == name);
        let first = matches.next().ok_or_else(|| StowageError::NotFound {
            owner: owner.to_string(),
            name: name.to_string(),
        })?;
        if matches.next().is_some() {
            return Err(StowageError::MultipleEntries {
                owner: owner.to_string(),
                name: name.to_string(),
            });
        }
        Ok(first)
    }

    /// Reads a scalar field.
    ///
    /// The recorded type tag must match the requested type exactly. If the
    /// stored size differs from the requested size, the fixed widening
    /// allow-list ([`Scalar::coerce`]) is consulted; any mismatch outside it
    /// fails with [`StowageError::TypeMismatch`].
    pub fn read_field<T: Scalar>(&self, owner: &str, name: &str) -> Result<T> {
        let field = self.find_field(owner, name).ok_or_else(|| {
            StowageError::NotFound {
                owner: owner.to_string(),
                name: name.to_string(),
            }
        })?;
        if field.type_tag != T::TAG {
            return Err(StowageError::TypeMismatch(format!(
                "{owner}::{name} is stored as {}, requested {}",
                field.type_tag,
                T::TAG
            )));
        }
        if field.data.len() == T::SIZE {
            return T::read_le(&field.data);
        }
        T::coerce(&field.data).ok_or_else(|| {
            StowageError::TypeMismatch(format!(
                "{owner}::{name} stored {} bytes, requested {} expects {}",
                field.data.len(),
                T::TAG,
                T::SIZE
            ))
        })
    }

    /// Reads a string field.
    pub fn read_str(&self, owner: &str, name: &str) -> Result<&str> {
        let data = self.read_tagged(owner, name, STR_TAG)?;
        std::str::from_utf8(data)
            .map_err(|e| StowageError::Corrupt(format!("{owner}::{name} is not UTF-8: {e}")))
    }

    /// Reads a raw byte payload.
    pub fn read_bytes(&self, owner: &str, name: &str) -> Result<&[u8]> {
        self.read_tagged(owner, name, BYTES_TAG)
    }

    fn read_tagged(&self, owner: &str, name: &str, tag: &str) -> Result<&[u8]> {
        let field = self.find_field(owner, name).ok_or_else(|| {
            StowageError::NotFound {
                owner: owner.to_string(),
                name: name.to_string(),
            }
        })?;
        if field.type_tag != tag {
            return Err(StowageError::TypeMismatch(format!(
                "{owner}::{name} is stored as {}, requested {tag}",
                field.type_tag
            )));
        }
        Ok(&field.data)
    }

    // --- Pack / unpack ---

    /// Serializes the node (and, recursively, its children) into a fresh
    /// buffer. The node itself is not mutated.
    pub fn pack(&self) -> Result<ByteBuffer> {
        let mut strings = ByteBuffer::new();
        let type_off = strings.append_str(&self.type_tag, true)?;
        let owner_off = strings.append_str(&self.owner, true)?;
        let name_off = strings.append_str(&self.name, true)?;

        let mut field_table = ByteBuffer::new();
        let mut data = ByteBuffer::new();
        for field in &self.fields {
            let f_owner = strings.append_str(&field.owner, true)?;
            let f_name = strings.append_str(&field.name, true)?;
            let f_type = strings.append_str(&field.type_tag, true)?;
            let f_data = data.append(&field.data, false)?;
            field_table.append_scalar(f_owner as u64)?;
            field_table.append_scalar(f_name as u64)?;
            field_table.append_scalar(f_type as u64)?;
            field_table.append_scalar(f_data as u64)?;
            field_table.append_scalar(field.data.len() as u64)?;
        }

        let mut child_table = ByteBuffer::new();
        for child in &self.children {
            let c_owner = strings.append_str(&child.owner, true)?;
            let c_name = strings.append_str(&child.name, true)?;
            let packed = child.pack()?;
            let c_data = data.append_buffer(&packed)?;
            child_table.append_scalar(c_owner as u64)?;
            child_table.append_scalar(c_name as u64)?;
            child_table.append_scalar(c_data as u64)?;
            child_table.append_scalar(packed.len() as u64)?;
        }

        let strings_off = NODE_HEADER_SIZE;
        let fields_off = checked_add(strings_off, strings.len())?;
        let children_off = checked_add(fields_off, field_table.len())?;
        let data_off = checked_add(children_off, child_table.len())?;
        let total = checked_add(data_off, data.len())?;

        let mut out = ByteBuffer::with_capacity(total);
        out.append_scalar(type_off as u64)?;
        out.append_scalar(owner_off as u64)?;
        out.append_scalar(name_off as u64)?;
        out.append_scalar(self.fields.len() as u64)?;
        out.append_scalar(self.children.len() as u64)?;
        out.append_scalar(strings_off as u64)?;
        out.append_scalar(strings.len() as u64)?;
        out.append_scalar(fields_off as u64)?;
        out.append_scalar(field_table.len() as u64)?;
        out.append_scalar(children_off as u64)?;
        out.append_scalar(child_table.len() as u64)?;
        out.append_scalar(data_off as u64)?;
        out.append_scalar(data.len() as u64)?;
        out.append_buffer(&strings)?;
        out.append_buffer(&field_table)?;
        out.append_buffer(&child_table)?;
        out.append_buffer(&data)?;
        Ok(out)
    }

    /// Reconstructs a node from its packed bytes.
    ///
    /// Every declared (offset, length) is validated against the sub-buffer it
    /// indexes before anything is read; children are unpacked recursively
    /// from their slices of the data blob.
    pub fn unpack(bytes: &[u8]) -> Result<ObjectNode> {
        if bytes.len() < NODE_HEADER_SIZE {
            return Err(StowageError::Corrupt(format!(
                "packed node of {} bytes is smaller than its {NODE_HEADER_SIZE}-byte header",
                bytes.len()
            )));
        }
        let type_off = to_index(read_u64(bytes, 0))?;
        let owner_off = to_index(read_u64(bytes, 8))?;
        let name_off = to_index(read_u64(bytes, 16))?;
        let field_count = to_index(read_u64(bytes, 24))?;
        let child_count = to_index(read_u64(bytes, 32))?;

        let strings = sub_buffer(bytes, read_u64(bytes, 40), read_u64(bytes, 48))?;
        let field_table = sub_buffer(bytes, read_u64(bytes, 56), read_u64(bytes, 64))?;
        let child_table = sub_buffer(bytes, read_u64(bytes, 72), read_u64(bytes, 80))?;
        let data = sub_buffer(bytes, read_u64(bytes, 88), read_u64(bytes, 96))?;

        if field_table.len() != checked_mul(field_count, FIELD_ENTRY_SIZE)? {
            return Err(StowageError::Corrupt(format!(
                "field table holds {} bytes but {field_count} entries are declared",
                field_table.len()
            )));
        }
        if child_table.len() != checked_mul(child_count, CHILD_ENTRY_SIZE)? {
            return Err(StowageError::Corrupt(format!(
                "child table holds {} bytes but {child_count} entries are declared",
                child_table.len()
            )));
        }

        let mut node = ObjectNode::new(read_cstr(strings, owner_off)?, read_cstr(strings, name_off)?);
        node.set_type_tag(read_cstr(strings, type_off)?);

        for entry in field_table.chunks_exact(FIELD_ENTRY_SIZE) {
            let f_owner = to_index(read_u64(entry, 0))?;
            let f_name = to_index(read_u64(entry, 8))?;
            let f_type = to_index(read_u64(entry, 16))?;
            let f_data = to_index(read_u64(entry, 24))?;
            let f_size = to_index(read_u64(entry, 32))?;
            let end = checked_range(f_data, f_size, data.len())?;
            node.add_field(
                read_cstr(strings, f_owner)?,
                read_cstr(strings, f_name)?,
                read_cstr(strings, f_type)?,
                &data[f_data..end],
            );
        }

        for entry in child_table.chunks_exact(CHILD_ENTRY_SIZE) {
            let c_data = to_index(read_u64(entry, 16))?;
            let c_size = to_index(read_u64(entry, 24))?;
            let end = checked_range(c_data, c_size, data.len())?;
            let child = ObjectNode::unpack(&data[c_data..end])?;
            // The child table's owner/name must agree with the child's own
            // header; trust the recursive unpack and verify the table.
            let c_owner = read_cstr(strings, to_index(read_u64(entry, 0))?)?;
            let c_name = read_cstr(strings, to_index(read_u64(entry, 8))?)?;
            if child.owner() != c_owner || child.name() != c_name {
                return Err(StowageError::Corrupt(format!(
                    "child table names {c_owner}::{c_name} but the packed child is {}::{}",
                    child.owner(),
                    child.name()
                )));
            }
            node.add_child(child);
        }

        Ok(node)
    }
}

fn to_index(value: u64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| StowageError::Corrupt(format!("offset {value} exceeds address space")))
}

fn sub_buffer(bytes: &[u8], offset: u64, len: u64) -> Result<&[u8]> {
    let offset = to_index(offset)?;
    let len = to_index(len)?;
    let end = checked_range(offset, len, bytes.len())?;
    Ok(&bytes[offset..end])
}
