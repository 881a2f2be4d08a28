use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jsv_text::{csv, json, jsv, reflect_composite};

#[derive(Default, Clone)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

reflect_composite!(User {
    "Id" => id,
    "Name" => name,
    "Email" => email,
    "Active" => active,
});

#[derive(Default, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

reflect_composite!(Product {
    "Sku" => sku,
    "Name" => name,
    "Price" => price,
    "Quantity" => quantity,
});

#[derive(Default, Clone)]
struct NestedData {
    id: u32,
    metadata: Metadata,
    tags: Vec<String>,
}

reflect_composite!(NestedData { "Id" => id, "Metadata" => metadata, "Tags" => tags });

#[derive(Default, Clone)]
struct Metadata {
    created: String,
    updated: String,
    version: u32,
}

reflect_composite!(Metadata {
    "Created" => created,
    "Updated" => updated,
    "Version" => version,
});

fn sample_user() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
    }
}

fn sample_nested() -> NestedData {
    NestedData {
        id: 42,
        metadata: Metadata {
            created: "2023-01-01T00:00:00Z".to_string(),
            updated: "2023-12-31T23:59:59Z".to_string(),
            version: 3,
        },
        tags: vec![
            "important".to_string(),
            "verified".to_string(),
            "production".to_string(),
        ],
    }
}

fn products(size: u32) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU{}", i),
            name: format!("Product {}", i),
            price: 9.99 + f64::from(i),
            quantity: i,
        })
        .collect()
}

fn benchmark_simple(c: &mut Criterion) {
    let user = sample_user();
    let jsv_input = jsv::to_string(&user).unwrap();
    let json_input = json::to_string(&user).unwrap();

    let mut group = c.benchmark_group("simple_struct");
    group.bench_function("jsv_serialize", |b| b.iter(|| jsv::to_string(black_box(&user))));
    group.bench_function("json_serialize", |b| b.iter(|| json::to_string(black_box(&user))));
    group.bench_function("jsv_deserialize", |b| {
        b.iter(|| jsv::from_str::<User>(black_box(&jsv_input)))
    });
    group.bench_function("json_deserialize", |b| {
        b.iter(|| json::from_str::<User>(black_box(&json_input)))
    });
    group.finish();
}

fn benchmark_nested(c: &mut Criterion) {
    let data = sample_nested();
    let jsv_input = jsv::to_string(&data).unwrap();
    let json_input = json::to_string(&data).unwrap();

    let mut group = c.benchmark_group("nested_struct");
    group.bench_function("jsv_serialize", |b| b.iter(|| jsv::to_string(black_box(&data))));
    group.bench_function("json_serialize", |b| b.iter(|| json::to_string(black_box(&data))));
    group.bench_function("jsv_deserialize", |b| {
        b.iter(|| jsv::from_str::<NestedData>(black_box(&jsv_input)))
    });
    group.bench_function("json_deserialize", |b| {
        b.iter(|| json::from_str::<NestedData>(black_box(&json_input)))
    });
    group.finish();
}

fn benchmark_serialize_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize_array");

    for size in [10, 50, 100, 500].iter() {
        let items = products(*size);
        group.bench_with_input(BenchmarkId::new("jsv", size), &items, |b, items| {
            b.iter(|| jsv::to_string(black_box(items)))
        });
        group.bench_with_input(BenchmarkId::new("json", size), &items, |b, items| {
            b.iter(|| json::to_string(black_box(items)))
        });
        group.bench_with_input(BenchmarkId::new("csv", size), &items, |b, items| {
            b.iter(|| csv::to_string(black_box(items)))
        });
    }
    group.finish();
}

fn benchmark_deserialize_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("deserialize_array");

    for size in [10, 50, 100, 500].iter() {
        let items = products(*size);
        let jsv_input = jsv::to_string(&items).unwrap();
        let csv_text = csv::to_string(&items).unwrap();

        group.bench_with_input(BenchmarkId::new("jsv", size), &jsv_input, |b, text| {
            b.iter(|| jsv::from_str::<Vec<Product>>(black_box(text)))
        });
        group.bench_with_input(BenchmarkId::new("csv", size), &csv_text, |b, text| {
            b.iter(|| csv::from_str::<Vec<Product>>(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_primitive_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitive_array");

    let numbers: Vec<i32> = (0..100).collect();
    let floats: Vec<f64> = (0..100).map(|i| f64::from(i) * 1.5).collect();
    let numbers_text = jsv::to_string(&numbers).unwrap();
    let floats_text = jsv::to_string(&floats).unwrap();

    group.bench_function("serialize_integers", |b| {
        b.iter(|| jsv::to_string(black_box(&numbers)))
    });
    group.bench_function("serialize_floats", |b| {
        b.iter(|| jsv::to_string(black_box(&floats)))
    });
    group.bench_function("deserialize_integers", |b| {
        b.iter(|| jsv::from_str::<Vec<i32>>(black_box(&numbers_text)))
    });
    group.bench_function("deserialize_floats", |b| {
        b.iter(|| jsv::from_str::<Vec<f64>>(black_box(&floats_text)))
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_simple,
    benchmark_nested,
    benchmark_serialize_array,
    benchmark_deserialize_array,
    benchmark_primitive_array
);
criterion_main!(benches);
