use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sqldump_extract::parser::{
    classify, parse_insert, SqlDialect, Statement, StatementReader,
};
use sqldump_extract::schema::parse_column_names;
use std::hint::black_box;
use std::io::BufReader;

fn generate_sql_data(num_statements: usize) -> String {
    let mut data = String::new();

    data.push_str(
        "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(255), email VARCHAR(255));\n",
    );

    for i in 0..num_statements {
        data.push_str(&format!(
            "INSERT INTO users VALUES ({}, 'User {}', 'user{}@example.com');\n",
            i, i, i
        ));
    }

    data
}

fn generate_extended_inserts(statements: usize, rows_per_statement: usize) -> String {
    let mut data = String::new();
    for s in 0..statements {
        data.push_str("INSERT INTO `posts` VALUES ");
        for r in 0..rows_per_statement {
            if r > 0 {
                data.push(',');
            }
            data.push_str(&format!(
                "({},'Title {}','Lorem ipsum, dolor \\'sit\\' amet;\\n consectetur',NULL,3.14)",
                s * rows_per_statement + r,
                r
            ));
        }
        data.push_str(";\n");
    }
    data
}

fn bench_read_statement_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("reader_throughput");

    for size in [1000, 10000, 50000] {
        let data = generate_sql_data(size);

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("next_statement", format!("{}_stmts", size)),
            &data,
            |b, data| {
                b.iter(|| {
                    let mut reader = StatementReader::new(data.as_bytes(), SqlDialect::Auto);
                    let mut count = 0;
                    while let Ok(Some(_stmt)) = reader.next_statement() {
                        count += 1;
                    }
                    black_box(count)
                })
            },
        );
    }

    group.finish();
}

fn bench_buffer_sizes(c: &mut Criterion) {
    let data = generate_extended_inserts(200, 50);

    let mut group = c.benchmark_group("buffer_sizes");
    group.throughput(Throughput::Bytes(data.len() as u64));

    for buffer_size in [16 * 1024, 256 * 1024, 10 * 1024 * 1024] {
        group.bench_with_input(
            BenchmarkId::new("next_statement", format!("{}KB", buffer_size / 1024)),
            &buffer_size,
            |b, &buffer_size| {
                b.iter(|| {
                    let buffered = BufReader::with_capacity(buffer_size, data.as_bytes());
                    let mut reader = StatementReader::new(buffered, SqlDialect::Auto);
                    let mut count = 0;
                    while let Ok(Some(_stmt)) = reader.next_statement() {
                        count += 1;
                    }
                    black_box(count)
                })
            },
        );
    }

    group.finish();
}

fn bench_tokenize_insert(c: &mut Criterion) {
    let data = generate_extended_inserts(1, 500);
    let mut reader = StatementReader::new(data.as_bytes(), SqlDialect::Auto);
    let raw = match reader.next_statement() {
        Ok(Some(raw)) => raw,
        _ => panic!("benchmark input has no statement"),
    };
    let Statement::InsertInto { body_text, .. } = classify(&raw) else {
        panic!("benchmark input is not an insert");
    };

    let mut group = c.benchmark_group("value_tokenizer");
    group.throughput(Throughput::Bytes(body_text.len() as u64));
    group.bench_function("extended_insert_500_rows", |b| {
        b.iter(|| parse_insert(black_box(&body_text), SqlDialect::Auto))
    });
    group.finish();
}

fn bench_schema_tokenizer(c: &mut Criterion) {
    let body = " (\n  `id` int(11) NOT NULL AUTO_INCREMENT,\n  `name` varchar(255) DEFAULT 'a, b',\n  `price` decimal(10,2) DEFAULT NULL,\n  PRIMARY KEY (`id`),\n  KEY `idx_price` (`price`)\n) ENGINE=InnoDB;";

    c.bench_function("parse_column_names", |b| {
        b.iter(|| parse_column_names(black_box(body)))
    });
}

criterion_group!(
    benches,
    bench_read_statement_throughput,
    bench_buffer_sizes,
    bench_tokenize_insert,
    bench_schema_tokenizer,
);
criterion_main!(benches);
