//! The reflection layer: field-descriptor tables and typed wrappers.
//!
//! A serializable type implements [`Persist`]: a static ordered
//! field-descriptor table plus `push`/`pop` that move its state into and out
//! of an [`ObjectNode`] through accessor calls — never through raw memory
//! offsets. [`StoreValue`] is the companion contract for the values a field
//! can carry: scalars, strings, raw payloads, and vectors of any of these
//! (or of nested objects). [`BoundVar`] bridges values that live behind
//! getter/setter closures rather than inline in a struct.
//!
//! Subtype chaining is composition: a derived state struct embeds its parent
//! state, and its `push`/`pop` invoke the parent's first before handling its
//! own fields.

use crate::error::{Result, StowageError};
use crate::node::ObjectNode;
use std::marker::PhantomData;

/// One row of a type's static field-descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Owner type name the field is recorded under.
    pub owner: &'static str,
    /// Field name.
    pub name: &'static str,
    /// Recorded type tag.
    pub type_tag: &'static str,
    /// Encoded width in bytes; zero for variable-size values (strings, raw
    /// payloads, vectors).
    pub size: usize,
    /// True if the field is itself a serializable object, stored as a child
    /// node rather than a field record.
    pub nested: bool,
}

/// A type that can flatten itself into an [`ObjectNode`] and restore from one.
pub trait Persist {
    /// The type tag recorded on the node.
    fn type_tag(&self) -> &'static str;

    /// The static ordered field-descriptor table.
    fn describe_fields(&self) -> &'static [FieldInfo];

    /// Writes every field into `node`, nested objects as child nodes.
    fn push(&self, node: &mut ObjectNode) -> Result<()>;

    /// Restores every field from `node`.
    ///
    /// Implementations may leave `self` partially updated on failure; callers
    /// treat a failed restore as "keep the defaults" and discard the value.
    fn pop(&mut self, node: &ObjectNode) -> Result<()>;

    /// Walks the descriptor table and confirms `node` carries every declared
    /// entry, so a restore fails up front with a precise name instead of
    /// midway through `pop`.
    fn validate(&self, node: &ObjectNode) -> Result<()> {
        for info in self.describe_fields() {
            let present = if info.nested {
                node.get_child(info.owner, info.name).is_some()
            } else {
                node.has_field(info.owner, info.name)
            };
            if !present {
                return Err(StowageError::NotFound {
                    owner: info.owner.to_string(),
                    name: info.name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Records `value`'s type tag on `node` and pushes its fields.
pub fn push_object<T: Persist + ?Sized>(value: &T, node: &mut ObjectNode) -> Result<()> {
    node.set_type_tag(value.type_tag());
    value.push(node)
}

/// Restores `value` from `node`, failing with [`StowageError::TypeMismatch`]
/// if the node's recorded type tag disagrees.
pub fn pop_object<T: Persist + ?Sized>(value: &mut T, node: &ObjectNode) -> Result<()> {
    if node.type_tag() != value.type_tag() {
        return Err(StowageError::TypeMismatch(format!(
            "node {}::{} records type {}, expected {}",
            node.owner(),
            node.name(),
            node.type_tag(),
            value.type_tag()
        )));
    }
    value.validate(node)?;
    value.pop(node)
}

/// Stores a nested object as a child node of `parent`.
pub fn store_nested<T: Persist>(
    value: &T,
    parent: &mut ObjectNode,
    owner: &str,
    name: &str,
) -> Result<()> {
    let child = parent.create_child(owner, name);
    push_object(value, child)
}

/// Restores a nested object from the first matching child of `parent`.
pub fn load_nested<T: Persist + Default>(
    parent: &ObjectNode,
    owner: &str,
    name: &str,
) -> Result<T> {
    let child = parent
        .get_child(owner, name)
        .ok_or_else(|| StowageError::NotFound {
            owner: owner.to_string(),
            name: name.to_string(),
        })?;
    let mut value = T::default();
    pop_object(&mut value, child)?;
    Ok(value)
}

/// The storable-value contract: anything that can be recorded under an
/// (owner, name) pair on a node and read back.
///
/// Scalars become raw field records, strings and [`Blob`]s become sized
/// fields, and `Vec<T>` stores a length field plus one entry per element —
/// a raw field when `T` is a leaf, a child node when `T` is a nested object
/// (via its own `StoreValue` implementation).
pub trait StoreValue: Sized {
    /// Records the value on `node`.
    fn store(&self, node: &mut ObjectNode, owner: &str, name: &str) -> Result<()>;

    /// Reads the value back from `node`.
    fn load(node: &ObjectNode, owner: &str, name: &str) -> Result<Self>;
}

macro_rules! impl_store_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl StoreValue for $t {
                fn store(&self, node: &mut ObjectNode, owner: &str, name: &str) -> Result<()> {
                    node.add_scalar(owner, name, *self);
                    Ok(())
                }

                fn load(node: &ObjectNode, owner: &str, name: &str) -> Result<Self> {
                    node.read_field(owner, name)
                }
            }
        )*
    };
}

impl_store_scalar!(
    u8, u16, u32, u64, i8, i16, i32, i64, f32, f64, usize, isize, bool, char
);

impl StoreValue for String {
    fn store(&self, node: &mut ObjectNode, owner: &str, name: &str) -> Result<()> {
        node.add_str(owner, name, self);
        Ok(())
    }

    fn load(node: &ObjectNode, owner: &str, name: &str) -> Result<Self> {
        Ok(node.read_str(owner, name)?.to_string())
    }
}

/// A raw byte payload stored as a single sized field, for data that would be
/// wasteful as per-element records (icon pixels, spectrum dumps).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob(pub Vec<u8>);

impl StoreValue for Blob {
    fn store(&self, node: &mut ObjectNode, owner: &str, name: &str) -> Result<()> {
        node.add_bytes(owner, name, &self.0);
        Ok(())
    }

    fn load(node: &ObjectNode, owner: &str, name: &str) -> Result<Self> {
        Ok(Blob(node.read_bytes(owner, name)?.to_vec()))
    }
}

impl<T: StoreValue> StoreValue for Vec<T> {
    fn store(&self, node: &mut ObjectNode, owner: &str, name: &str) -> Result<()> {
        node.add_scalar(owner, format!("{name}.len"), self.len() as u64);
        for (i, item) in self.iter().enumerate() {
            item.store(node, owner, &format!("{name}[{i}]"))?;
        }
        Ok(())
    }

    fn load(node: &ObjectNode, owner: &str, name: &str) -> Result<Self> {
        let count: u64 = node.read_field(owner, &format!("{name}.len"))?;
        let count = usize::try_from(count)
            .map_err(|_| StowageError::Corrupt(format!("{owner}::{name} length {count}")))?;
        let mut items = Vec::new();
        for i in 0..count {
            items.push(T::load(node, owner, &format!("{name}[{i}]"))?);
        }
        Ok(items)
    }
}

/// A value reached through getter/setter closures instead of an inline field.
///
/// Stores whatever the getter currently yields; on load, feeds the restored
/// value through the setter. The carried type decides the representation via
/// its [`StoreValue`] implementation, so bound nested objects recurse the
/// same way inline ones do.
pub struct BoundVar<T, G, S>
where
    G: Fn() -> T,
    S: FnMut(T),
{
    owner: String,
    name: String,
    get: G,
    set: S,
    _marker: PhantomData<T>,
}

impl<T, G, S> BoundVar<T, G, S>
where
    T: StoreValue,
    G: Fn() -> T,
    S: FnMut(T),
{
    /// Binds an (owner, name) identity to a getter/setter pair.
    pub fn new(owner: impl Into<String>, name: impl Into<String>, get: G, set: S) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            get,
            set,
            _marker: PhantomData,
        }
    }

    /// Records the getter's current value on `node`.
    pub fn store(&self, node: &mut ObjectNode) -> Result<()> {
        (self.get)().store(node, &self.owner, &self.name)
    }

    /// Reads the value back from `node` and feeds it to the setter.
    pub fn load(&mut self, node: &ObjectNode) -> Result<()> {
        let value = T::load(node, &self.owner, &self.name)?;
        (self.set)(value);
        Ok(())
    }
}

impl<T, G, S> std::fmt::Debug for BoundVar<T, G, S>
where
    G: Fn() -> T,
    S: FnMut(T),
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundVar")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
