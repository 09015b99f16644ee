//! Shared fixtures for integration tests.

#![allow(dead_code)]

use folio::catalog::{DataType, DefaultValue, Property};
use folio::object::{InstanceId, Member, Members, Object, Reference};
use folio::{Library, TypeKey};

/// Install a test subscriber once. Honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Float3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Object for Float3 {
    fn members() -> Vec<Member<Self>> {
        Members::<Self>::new()
            .primitive("x", |v| &v.x, |v| &mut v.x)
            .primitive("y", |v| &v.y, |v| &mut v.y)
            .primitive("z", |v| &v.z, |v| &mut v.z)
            .build()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Material {
    pub id: InstanceId,
    pub name: String,
    pub color: Float3,
    pub specular: f32,
}

impl Material {
    pub fn new(name: &str, color: Float3, specular: f32) -> Self {
        Self {
            name: name.to_string(),
            color,
            specular,
            ..Default::default()
        }
    }
}

impl Object for Material {
    fn members() -> Vec<Member<Self>> {
        Members::<Self>::new()
            .instance_id("id", |m| &m.id, |m| &mut m.id)
            .string("name", |m| &m.name, |m| &mut m.name)
            .nested("color", |m| &m.color, |m| &mut m.color)
            .primitive("specular", |m| &m.specular, |m| &mut m.specular)
            .build()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mesh {
    pub id: InstanceId,
    pub name: String,
    pub scale: f64,
    pub count: u64,
    pub small: u32,
    pub delta: i64,
    pub material: Reference<Material>,
    pub thumbnail: Vec<u8>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    pub labels: Vec<String>,
    pub chunks: Vec<Vec<u8>>,
    pub materials: Vec<Reference<Material>>,
    pub origin: Float3,
}

impl Object for Mesh {
    fn members() -> Vec<Member<Self>> {
        Members::<Self>::new()
            .instance_id("id", |m| &m.id, |m| &mut m.id)
            .string("name", |m| &m.name, |m| &mut m.name)
            .primitive("scale", |m| &m.scale, |m| &mut m.scale)
            .primitive("count", |m| &m.count, |m| &mut m.count)
            .primitive("small", |m| &m.small, |m| &mut m.small)
            .primitive("delta", |m| &m.delta, |m| &mut m.delta)
            .reference("material", |m| &m.material, |m| &mut m.material)
            .blob("thumbnail", |m| &m.thumbnail, |m| &mut m.thumbnail)
            .primitive_blob("normals", |m| &m.normals, |m| &mut m.normals)
            .primitive_array("indices", |m| &m.indices, |m| &mut m.indices)
            .string_array("labels", |m| &m.labels, |m| &mut m.labels)
            .blob_array("chunks", |m| &m.chunks, |m| &mut m.chunks)
            .reference_array("materials", |m| &m.materials, |m| &mut m.materials)
            .nested("origin", |m| &m.origin, |m| &mut m.origin)
            .build()
    }
}

/// Type keys of the test schema.
pub struct Schema {
    pub float3: TypeKey,
    pub material: TypeKey,
    pub mesh: TypeKey,
}

/// Create and commit `main::float3`, `main::material` and `main::mesh`.
pub fn build_schema(library: &mut Library) -> Schema {
    let main = library.create_namespace("main").unwrap();

    let float3 = library.create_type(main, "float3", false).unwrap();
    for axis in ["x", "y", "z"] {
        library
            .add_property(float3, Property::primitive(axis, DataType::Float))
            .unwrap();
    }
    library.commit(float3).unwrap();

    let material = library.create_type(main, "material", true).unwrap();
    library.add_property(material, Property::string("name")).unwrap();
    library
        .add_property(material, Property::nested("color", float3))
        .unwrap();
    library
        .add_property(
            material,
            Property::primitive("specular", DataType::Float).with_default(DefaultValue::Float(0.5)),
        )
        .unwrap();
    library.commit(material).unwrap();

    let mesh = library.create_type(main, "mesh", true).unwrap();
    let properties = [
        Property::string("name"),
        Property::primitive("scale", DataType::Double),
        Property::primitive("count", DataType::UInt64),
        Property::primitive("small", DataType::UInt32),
        Property::primitive("delta", DataType::Int64),
        Property::reference("material", material),
        Property::blob("thumbnail"),
        Property::primitive_blob("normals", DataType::Float),
        Property::primitive_array("indices", DataType::UInt32),
        Property::string_array("labels"),
        Property::blob_array("chunks"),
        Property::reference_array("materials", material),
        Property::nested("origin", float3),
    ];
    for property in properties {
        library.add_property(mesh, property).unwrap();
    }
    library.commit(mesh).unwrap();

    Schema {
        float3,
        material,
        mesh,
    }
}

/// Row count of a physical table.
pub fn row_count(library: &Library, table: &str) -> i64 {
    library
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))
        .unwrap()
}
