use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polycodec::{convert, from_slice, read, to_value, to_vec, write, Format, Matrix, Value};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

fn user() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
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

fn benchmark_write_per_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    let doc = to_value(&products(100)).unwrap();

    for format in Format::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(format), &doc, |b, doc| {
            b.iter(|| write(format, black_box(doc)))
        });
    }
    group.finish();
}

fn benchmark_read_per_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    let doc = to_value(&products(100)).unwrap();

    for format in Format::ALL {
        let bytes = write(format, &doc).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(format), &bytes, |b, bytes| {
            b.iter(|| read(format, black_box(bytes)))
        });
    }
    group.finish();
}

fn benchmark_binary_array_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary_array");

    for size in [10, 50, 100, 500].iter() {
        let bytes = to_vec(Format::Binary, &products(*size)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| from_slice::<Vec<Product>>(Format::Binary, black_box(bytes)))
        });
    }
    group.finish();
}

fn benchmark_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix");
    let data: Vec<f64> = (0..64 * 64).map(|i| f64::from(i) * 0.5).collect();
    let doc = Value::Matrix(Matrix::from_data(vec![64, 64], data).unwrap());

    for format in [Format::Binary, Format::JsonText, Format::Yaml] {
        let bytes = write(format, &doc).unwrap();
        group.bench_with_input(BenchmarkId::new("write", format), &doc, |b, doc| {
            b.iter(|| write(format, black_box(doc)))
        });
        group.bench_with_input(BenchmarkId::new("read", format), &bytes, |b, bytes| {
            b.iter(|| read(format, black_box(bytes)))
        });
    }
    group.finish();
}

fn benchmark_comparison_with_json(c: &mut Criterion) {
    let user = user();
    let mut group = c.benchmark_group("comparison");

    group.bench_function("polycodec_json_serialize", |b| {
        b.iter(|| to_vec(Format::JsonText, black_box(&user)))
    });

    group.bench_function("serde_json_serialize", |b| {
        b.iter(|| serde_json::to_vec_pretty(black_box(&user)))
    });

    let ours = to_vec(Format::JsonText, &user).unwrap();
    let theirs = serde_json::to_vec(&user).unwrap();

    group.bench_function("polycodec_json_deserialize", |b| {
        b.iter(|| from_slice::<User>(Format::JsonText, black_box(&ours)))
    });

    group.bench_function("serde_json_deserialize", |b| {
        b.iter(|| serde_json::from_slice::<User>(black_box(&theirs)))
    });

    group.finish();
}

fn benchmark_convert(c: &mut Criterion) {
    let json = to_vec(Format::JsonText, &products(100)).unwrap();

    c.bench_function("convert_json_to_yaml", |b| {
        b.iter(|| convert(Format::JsonText, Format::Yaml, black_box(&json)))
    });
}

criterion_group!(
    benches,
    benchmark_write_per_format,
    benchmark_read_per_format,
    benchmark_binary_array_sizes,
    benchmark_matrix,
    benchmark_comparison_with_json,
    benchmark_convert
);
criterion_main!(benches);
