//! CRUD benchmarks.
//!
//! Measures the compiled insert, get, update and search queries on an
//! in-memory library, with and without satellite tables.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use folio::catalog::{DataType, Property};
use folio::object::{InstanceId, Member, Members, Object};
use folio::query::{Condition, GetQuery, InsertQuery, Match, SearchQuery, UpdateQuery};
use folio::{Library, TypeKey};

#[derive(Debug, Default, Clone)]
struct Point {
    id: InstanceId,
    label: String,
    x: f64,
    y: f64,
    weight: i64,
}

impl Object for Point {
    fn members() -> Vec<Member<Self>> {
        Members::<Self>::new()
            .instance_id("id", |p| &p.id, |p| &mut p.id)
            .string("label", |p| &p.label, |p| &mut p.label)
            .primitive("x", |p| &p.x, |p| &mut p.x)
            .primitive("y", |p| &p.y, |p| &mut p.y)
            .primitive("weight", |p| &p.weight, |p| &mut p.weight)
            .build()
    }
}

#[derive(Debug, Default, Clone)]
struct Polyline {
    id: InstanceId,
    name: String,
    xs: Vec<f32>,
    tags: Vec<String>,
}

impl Object for Polyline {
    fn members() -> Vec<Member<Self>> {
        Members::<Self>::new()
            .instance_id("id", |p| &p.id, |p| &mut p.id)
            .string("name", |p| &p.name, |p| &mut p.name)
            .primitive_array("xs", |p| &p.xs, |p| &mut p.xs)
            .string_array("tags", |p| &p.tags, |p| &mut p.tags)
            .build()
    }
}

struct Schema {
    point: TypeKey,
    polyline: TypeKey,
}

fn setup() -> (Library, Schema) {
    let mut library = Library::in_memory().unwrap();
    let bench = library.create_namespace("bench").unwrap();

    let point = library.create_type(bench, "point", true).unwrap();
    library.add_property(point, Property::string("label")).unwrap();
    library
        .add_property(point, Property::primitive("x", DataType::Double))
        .unwrap();
    library
        .add_property(point, Property::primitive("y", DataType::Double))
        .unwrap();
    library
        .add_property(point, Property::primitive("weight", DataType::Int64))
        .unwrap();
    library.commit(point).unwrap();

    let polyline = library.create_type(bench, "polyline", true).unwrap();
    library.add_property(polyline, Property::string("name")).unwrap();
    library
        .add_property(polyline, Property::primitive_array("xs", DataType::Float))
        .unwrap();
    library
        .add_property(polyline, Property::string_array("tags"))
        .unwrap();
    library.commit(polyline).unwrap();

    (library, Schema { point, polyline })
}

fn point(i: usize) -> Point {
    Point {
        label: format!("p{i}"),
        x: i as f64,
        y: (i * 2) as f64,
        weight: (i % 10) as i64,
        ..Default::default()
    }
}

fn polyline(len: usize) -> Polyline {
    Polyline {
        name: format!("line{len}"),
        xs: (0..len).map(|i| i as f32).collect(),
        tags: (0..len.min(8)).map(|i| format!("t{i}")).collect(),
        ..Default::default()
    }
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("crud/insert");

    group.bench_function("point", |b| {
        let (library, schema) = setup();
        let insert = InsertQuery::new(&library, schema.point).unwrap();
        let mut i = 0;
        b.iter(|| {
            let mut p = point(i);
            i += 1;
            black_box(insert.insert(&mut p).unwrap());
        });
    });

    for len in [0, 16, 256] {
        group.bench_with_input(BenchmarkId::new("polyline", len), &len, |b, &len| {
            let (library, schema) = setup();
            let insert = InsertQuery::new(&library, schema.polyline).unwrap();
            let template = polyline(len);
            b.iter(|| {
                let mut line = template.clone();
                black_box(insert.insert(&mut line).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("crud/get");

    // Setup: pre-populate with 1000 points and 100 polylines
    let (library, schema) = setup();
    let insert = InsertQuery::new(&library, schema.point).unwrap();
    let ids: Vec<InstanceId> = (0..1000)
        .map(|i| insert.insert(&mut point(i)).unwrap())
        .collect();
    let insert = InsertQuery::new(&library, schema.polyline).unwrap();
    let line_ids: Vec<InstanceId> = (0..100)
        .map(|_| insert.insert(&mut polyline(64)).unwrap())
        .collect();

    group.bench_function("point", |b| {
        let get = GetQuery::<Point>::new(&library, schema.point).unwrap();
        let mut idx = 0;
        b.iter(|| {
            let id = ids[idx % ids.len()];
            idx += 1;
            black_box(get.get(&id).unwrap());
        });
    });

    group.bench_function("polyline_64", |b| {
        let get = GetQuery::<Polyline>::new(&library, schema.polyline).unwrap();
        let mut idx = 0;
        b.iter(|| {
            let id = line_ids[idx % line_ids.len()];
            idx += 1;
            black_box(get.get(&id).unwrap());
        });
    });

    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("crud/update");

    let (library, schema) = setup();
    let mut line = polyline(64);
    InsertQuery::new(&library, schema.polyline)
        .unwrap()
        .insert(&mut line)
        .unwrap();

    group.bench_function("polyline_64", |b| {
        let update = UpdateQuery::new(&library, schema.polyline).unwrap();
        b.iter(|| {
            line.xs.rotate_left(1);
            black_box(update.update(&line).unwrap());
        });
    });

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("crud/search");

    let (library, schema) = setup();
    let insert = InsertQuery::new(&library, schema.point).unwrap();
    for i in 0..1000 {
        insert.insert(&mut point(i)).unwrap();
    }
    let search = SearchQuery::new(&library, schema.point).unwrap();

    group.bench_function("equals", |b| {
        b.iter(|| {
            black_box(
                search
                    .find(Match::All, &[Condition::equals("weight", 3i64)])
                    .unwrap(),
            );
        });
    });

    group.bench_function("count", |b| {
        b.iter(|| black_box(search.count().unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_get, bench_update, bench_search);
criterion_main!(benches);
