//! Object shapes: the ordered role table of a Rust type's members.

use std::fmt;

use rusqlite::types::Value;

use super::value::{pack, unpack};
use super::{ColumnValue, InstanceId, Primitive, Reference};
use crate::catalog::{ColumnSpec, DataType, Library, SatelliteSpec, TableKind, TypeKey};
use crate::error::{Error, Result};
use crate::query::check_shape;

/// A Rust type that can be stored through a compiled query.
///
/// The member list must line up with the flattened layout of the type the
/// query is bound to: the instance id, then every scalar column in property
/// order (nested members flattened in place), with array members in the
/// order of their satellite tables.
///
/// ```
/// use folio::object::{InstanceId, Member, Members, Object};
///
/// #[derive(Default)]
/// struct Float3 {
///     x: f32,
///     y: f32,
///     z: f32,
/// }
///
/// impl Object for Float3 {
///     fn members() -> Vec<Member<Self>> {
///         Members::<Self>::new()
///             .primitive("x", |v| &v.x, |v| &mut v.x)
///             .primitive("y", |v| &v.y, |v| &mut v.y)
///             .primitive("z", |v| &v.z, |v| &mut v.z)
///             .build()
///     }
/// }
///
/// #[derive(Default)]
/// struct Material {
///     id: InstanceId,
///     name: String,
///     color: Float3,
///     specular: f32,
/// }
///
/// impl Object for Material {
///     fn members() -> Vec<Member<Self>> {
///         Members::<Self>::new()
///             .instance_id("id", |m| &m.id, |m| &mut m.id)
///             .string("name", |m| &m.name, |m| &mut m.name)
///             .nested("color", |m| &m.color, |m| &mut m.color)
///             .primitive("specular", |m| &m.specular, |m| &mut m.specular)
///             .build()
///     }
/// }
///
/// let names: Vec<_> = Material::members().iter().map(|m| m.name().to_string()).collect();
/// assert_eq!(names, ["id", "name", "color_x", "color_y", "color_z", "specular"]);
/// ```
pub trait Object: Sized + 'static {
    /// Ordered member list.
    fn members() -> Vec<Member<Self>>;
}

/// How a member is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    /// The object's identity.
    InstanceId,
    /// Scalar primitive column.
    Primitive(DataType),
    /// String column.
    String,
    /// Blob column.
    Blob,
    /// Primitive vector packed into a blob column.
    PrimitiveBlob(DataType),
    /// Reference column.
    Reference,
    /// Primitive array satellite.
    PrimitiveArray(DataType),
    /// String array satellite.
    StringArray,
    /// Blob array satellite.
    BlobArray,
    /// Reference array satellite.
    ReferenceArray,
}

impl MemberRole {
    /// Satellite kind for array roles. `None` for scalar roles, which live in
    /// the instance table.
    pub fn table_kind(&self) -> Option<TableKind> {
        match self {
            MemberRole::PrimitiveArray(_) | MemberRole::StringArray => {
                Some(TableKind::PrimitiveArray)
            }
            MemberRole::BlobArray => Some(TableKind::BlobArray),
            MemberRole::ReferenceArray => Some(TableKind::ReferenceArray),
            _ => None,
        }
    }

    /// Check if this role can be stored in an instance table column.
    pub(crate) fn accepts_column(&self, column: &ColumnSpec) -> bool {
        match *self {
            MemberRole::Primitive(data_type) => !column.blob && column.data_type == data_type,
            MemberRole::String => !column.blob && column.data_type.is_string(),
            MemberRole::Blob => !column.blob && column.data_type.is_blob(),
            MemberRole::PrimitiveBlob(data_type) => column.blob && column.data_type == data_type,
            MemberRole::Reference => column.data_type.is_reference(),
            _ => false,
        }
    }

    /// Check if this role can be stored in a satellite table.
    pub(crate) fn accepts_satellite(&self, satellite: &SatelliteSpec) -> bool {
        if self.table_kind() != Some(satellite.kind) {
            return false;
        }
        match *self {
            MemberRole::PrimitiveArray(data_type) => satellite.data_type == data_type,
            MemberRole::StringArray => satellite.data_type.is_string(),
            _ => true,
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRole::InstanceId => f.write_str("instance id"),
            MemberRole::Primitive(t) => write!(f, "{t}"),
            MemberRole::String => f.write_str("String"),
            MemberRole::Blob => f.write_str("Blob"),
            MemberRole::PrimitiveBlob(t) => write!(f, "{t}*"),
            MemberRole::Reference => f.write_str("Reference"),
            MemberRole::PrimitiveArray(t) => write!(f, "{t}[]"),
            MemberRole::StringArray => f.write_str("String[]"),
            MemberRole::BlobArray => f.write_str("Blob[]"),
            MemberRole::ReferenceArray => f.write_str("Reference[]"),
        }
    }
}

/// A member value on its way to or from the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// One column value.
    Scalar(Value),
    /// Satellite values in element order.
    Array(Vec<Value>),
}

impl Field {
    fn into_scalar(self) -> Result<Value> {
        match self {
            Field::Scalar(value) => Ok(value),
            Field::Array(_) => Err(Error::Conversion("expected a scalar value".into())),
        }
    }

    fn into_array(self) -> Result<Vec<Value>> {
        match self {
            Field::Array(values) => Ok(values),
            Field::Scalar(_) => Err(Error::Conversion("expected an array value".into())),
        }
    }
}

type Reader<T> = Box<dyn Fn(&T) -> Field + Send + Sync>;
type Writer<T> = Box<dyn Fn(&mut T, Field) -> Result<()> + Send + Sync>;

/// Checks the shape a reference points at against the referenced type.
pub(crate) type TargetCheck = fn(&Library, TypeKey) -> Result<()>;

/// One named, typed member of an object shape.
pub struct Member<T> {
    name: String,
    role: MemberRole,
    read: Reader<T>,
    write: Writer<T>,
    target: Option<TargetCheck>,
}

impl<T> Member<T> {
    /// Flattened member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage role.
    pub fn role(&self) -> MemberRole {
        self.role
    }

    /// Shape check of the referenced object, for reference members.
    pub(crate) fn target(&self) -> Option<TargetCheck> {
        self.target
    }

    /// Read the member out of an object.
    pub(crate) fn read(&self, object: &T) -> Field {
        (self.read)(object)
    }

    /// Write a stored value into an object.
    pub(crate) fn write(&self, object: &mut T, field: Field) -> Result<()> {
        (self.write)(object, field)
    }

    /// Read an instance id member.
    pub(crate) fn read_id(&self, object: &T) -> Result<InstanceId> {
        InstanceId::from_value(self.read(object).into_scalar()?)
    }

    /// Write an instance id member.
    pub(crate) fn write_id(&self, object: &mut T, id: InstanceId) -> Result<()> {
        self.write(object, Field::Scalar(id.to_value()))
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Builder for an object's member list.
///
/// Accessors are plain functions (non-capturing closures) returning a
/// reference to the field.
pub struct Members<T> {
    members: Vec<Member<T>>,
}

impl<T: 'static> Default for Members<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Members<T> {
    /// Start an empty member list.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Finish the member list.
    pub fn build(self) -> Vec<Member<T>> {
        self.members
    }

    fn push(mut self, name: &str, role: MemberRole, read: Reader<T>, write: Writer<T>) -> Self {
        self.members.push(Member {
            name: name.to_string(),
            role,
            read,
            write,
            target: None,
        });
        self
    }

    fn targeting<R: Object>(mut self) -> Self {
        if let Some(member) = self.members.last_mut() {
            member.target = Some(check_shape::<R>);
        }
        self
    }

    fn scalar<V: ColumnValue + 'static>(
        self,
        name: &str,
        role: MemberRole,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.push(
            name,
            role,
            Box::new(move |object| Field::Scalar(get(object).to_value())),
            Box::new(move |object, field| {
                *get_mut(object) = V::from_value(field.into_scalar()?)?;
                Ok(())
            }),
        )
    }

    fn array<V: ColumnValue + 'static>(
        self,
        name: &str,
        role: MemberRole,
        get: fn(&T) -> &Vec<V>,
        get_mut: fn(&mut T) -> &mut Vec<V>,
    ) -> Self {
        self.push(
            name,
            role,
            Box::new(move |object| {
                Field::Array(get(object).iter().map(ColumnValue::to_value).collect())
            }),
            Box::new(move |object, field| {
                *get_mut(object) = field
                    .into_array()?
                    .into_iter()
                    .map(V::from_value)
                    .collect::<Result<_>>()?;
                Ok(())
            }),
        )
    }

    /// The object's instance id. Exactly one is required by every query.
    pub fn instance_id(
        self,
        name: &str,
        get: fn(&T) -> &InstanceId,
        get_mut: fn(&mut T) -> &mut InstanceId,
    ) -> Self {
        self.scalar(name, MemberRole::InstanceId, get, get_mut)
    }

    /// Scalar primitive.
    pub fn primitive<P: Primitive>(
        self,
        name: &str,
        get: fn(&T) -> &P,
        get_mut: fn(&mut T) -> &mut P,
    ) -> Self {
        self.scalar(name, MemberRole::Primitive(P::DATA_TYPE), get, get_mut)
    }

    /// String.
    pub fn string(
        self,
        name: &str,
        get: fn(&T) -> &String,
        get_mut: fn(&mut T) -> &mut String,
    ) -> Self {
        self.scalar(name, MemberRole::String, get, get_mut)
    }

    /// Opaque bytes.
    pub fn blob(
        self,
        name: &str,
        get: fn(&T) -> &Vec<u8>,
        get_mut: fn(&mut T) -> &mut Vec<u8>,
    ) -> Self {
        self.scalar(name, MemberRole::Blob, get, get_mut)
    }

    /// Primitive vector packed into one blob column.
    pub fn primitive_blob<P: Primitive>(
        self,
        name: &str,
        get: fn(&T) -> &Vec<P>,
        get_mut: fn(&mut T) -> &mut Vec<P>,
    ) -> Self {
        self.push(
            name,
            MemberRole::PrimitiveBlob(P::DATA_TYPE),
            Box::new(move |object| Field::Scalar(Value::Blob(pack(get(object))))),
            Box::new(move |object, field| {
                let bytes = Vec::<u8>::from_value(field.into_scalar()?)?;
                *get_mut(object) = unpack(&bytes)?;
                Ok(())
            }),
        )
    }

    /// Reference to another object. Queries check `R` against the
    /// referenced type.
    pub fn reference<R: Object>(
        self,
        name: &str,
        get: fn(&T) -> &Reference<R>,
        get_mut: fn(&mut T) -> &mut Reference<R>,
    ) -> Self {
        self.scalar(name, MemberRole::Reference, get, get_mut)
            .targeting::<R>()
    }

    /// Array of primitives.
    pub fn primitive_array<P: Primitive>(
        self,
        name: &str,
        get: fn(&T) -> &Vec<P>,
        get_mut: fn(&mut T) -> &mut Vec<P>,
    ) -> Self {
        self.array(name, MemberRole::PrimitiveArray(P::DATA_TYPE), get, get_mut)
    }

    /// Array of strings.
    pub fn string_array(
        self,
        name: &str,
        get: fn(&T) -> &Vec<String>,
        get_mut: fn(&mut T) -> &mut Vec<String>,
    ) -> Self {
        self.array(name, MemberRole::StringArray, get, get_mut)
    }

    /// Array of byte vectors.
    pub fn blob_array(
        self,
        name: &str,
        get: fn(&T) -> &Vec<Vec<u8>>,
        get_mut: fn(&mut T) -> &mut Vec<Vec<u8>>,
    ) -> Self {
        self.array(name, MemberRole::BlobArray, get, get_mut)
    }

    /// Array of references. Queries check `R` against the referenced type.
    pub fn reference_array<R: Object>(
        self,
        name: &str,
        get: fn(&T) -> &Vec<Reference<R>>,
        get_mut: fn(&mut T) -> &mut Vec<Reference<R>>,
    ) -> Self {
        self.array(name, MemberRole::ReferenceArray, get, get_mut)
            .targeting::<R>()
    }

    /// Inline the members of a nested object under `<name>_`. Instance id
    /// members of the nested object are skipped.
    pub fn nested<N: Object>(
        mut self,
        name: &str,
        get: fn(&T) -> &N,
        get_mut: fn(&mut T) -> &mut N,
    ) -> Self {
        for member in N::members() {
            if member.role == MemberRole::InstanceId {
                continue;
            }
            let Member {
                name: inner,
                role,
                read,
                write,
                target,
            } = member;
            self.members.push(Member {
                name: format!("{name}_{inner}"),
                role,
                read: Box::new(move |object| read(get(object))),
                write: Box::new(move |object, field| write(get_mut(object), field)),
                target,
            });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Inner {
        id: InstanceId,
        weights: Vec<f64>,
        label: String,
    }

    impl Object for Inner {
        fn members() -> Vec<Member<Self>> {
            Members::<Self>::new()
                .instance_id("id", |i| &i.id, |i| &mut i.id)
                .primitive_array("weights", |i| &i.weights, |i| &mut i.weights)
                .string("label", |i| &i.label, |i| &mut i.label)
                .build()
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Outer {
        id: InstanceId,
        inner: Inner,
        samples: Vec<i32>,
        link: Reference<Inner>,
    }

    impl Object for Outer {
        fn members() -> Vec<Member<Self>> {
            Members::<Self>::new()
                .instance_id("id", |o| &o.id, |o| &mut o.id)
                .nested("inner", |o| &o.inner, |o| &mut o.inner)
                .primitive_blob("samples", |o| &o.samples, |o| &mut o.samples)
                .reference("link", |o| &o.link, |o| &mut o.link)
                .build()
        }
    }

    #[test]
    fn test_nested_members_are_prefixed() {
        let members = Outer::members();
        let shape: Vec<_> = members.iter().map(|m| (m.name(), m.role())).collect();
        assert_eq!(
            shape,
            [
                ("id", MemberRole::InstanceId),
                ("inner_weights", MemberRole::PrimitiveArray(DataType::Double)),
                ("inner_label", MemberRole::String),
                ("samples", MemberRole::PrimitiveBlob(DataType::Int32)),
                ("link", MemberRole::Reference),
            ]
        );
    }

    #[test]
    fn test_only_references_carry_a_target_check() {
        let members = Outer::members();
        let targeted: Vec<_> = members
            .iter()
            .filter(|m| m.target().is_some())
            .map(Member::name)
            .collect();
        assert_eq!(targeted, ["link"]);
    }

    #[test]
    fn test_read_and_write_through_accessors() {
        let members = Outer::members();
        let source = Outer {
            id: InstanceId::generate(),
            inner: Inner {
                id: InstanceId::generate(),
                weights: vec![0.5, 1.5],
                label: "left".into(),
            },
            samples: vec![1, -1],
            link: Reference::new(InstanceId::generate()),
        };

        let mut copy = Outer::default();
        for member in &members {
            member.write(&mut copy, member.read(&source)).unwrap();
        }

        assert_eq!(copy.id, source.id);
        assert_eq!(copy.inner.weights, source.inner.weights);
        assert_eq!(copy.inner.label, "left");
        assert!(!copy.inner.id.is_valid());
        assert_eq!(copy.samples, [1, -1]);
        assert_eq!(copy.link, source.link);
        assert_eq!(members[0].read_id(&copy).unwrap(), source.id);
    }

    #[test]
    fn test_field_kind_mismatch() {
        let members = Outer::members();
        let mut target = Outer::default();
        let err = members[2]
            .write(&mut target, Field::Array(vec![]))
            .unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
    }

    #[test]
    fn test_role_table_kinds() {
        assert_eq!(MemberRole::StringArray.table_kind(), Some(TableKind::PrimitiveArray));
        assert_eq!(MemberRole::BlobArray.table_kind(), Some(TableKind::BlobArray));
        assert_eq!(MemberRole::Reference.table_kind(), None);
        assert_eq!(MemberRole::PrimitiveArray(DataType::UInt32).to_string(), "Uint32[]");
    }
}
