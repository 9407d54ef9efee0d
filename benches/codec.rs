use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use starkbind::abi::Argument;
use starkbind::codegen::{ContractSource, Generator, GeneratorConfig};
use starkbind::{pack, unpack, Felt, Interface, Value, U256};

const TOKEN_ABI: &str = include_str!("../tests/fixtures/erc20.json");

fn transfer_args() -> Vec<Argument> {
    vec![
        Argument::new("to", "core::starknet::contract_address::ContractAddress"),
        Argument::new("amount", "core::integer::u256"),
    ]
}

fn benchmark_scalars(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_scalars");

    let args = transfer_args();
    let values = vec![
        Value::Felt(Felt::from_hex_unchecked(
            "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef",
        )),
        Value::U256(U256::from_words(u128::MAX - 7, u128::MAX - 11)),
    ];
    group.bench_function("pack_transfer", |b| {
        b.iter(|| black_box(pack(black_box(&args), black_box(&values))));
    });

    let packed = pack(&args, &values).expect("pack failed");
    group.bench_function("unpack_transfer", |b| {
        b.iter(|| black_box(unpack(black_box(&args), black_box(&packed))));
    });

    group.bench_function("pack_u256_from_text", |b| {
        let args = [Argument::new("amount", "core::integer::u256")];
        let values = [Value::text("115792089237316195423570985008687907853269984665640564039457584007913129639935")];
        b.iter(|| black_box(pack(black_box(&args), black_box(&values))));
    });

    group.finish();
}

fn benchmark_arrays(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_arrays");
    let args = [Argument::new("amounts", "core::array::Array::<core::integer::u256>")];

    for size in [16usize, 256, 4096] {
        let values = vec![Value::Sequence(
            (0..size)
                .map(|i| Value::U256(U256::from(i as u64)))
                .collect(),
        )];
        let packed = pack(&args, &values).expect("pack failed");

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("pack", size), &values, |b, values| {
            b.iter(|| black_box(pack(black_box(&args), black_box(values))));
        });
        group.bench_with_input(BenchmarkId::new("unpack", size), &packed, |b, packed| {
            b.iter(|| black_box(unpack(black_box(&args), black_box(packed))));
        });
    }

    group.finish();
}

fn benchmark_codegen(c: &mut Criterion) {
    let mut group = c.benchmark_group("codegen");

    group.bench_function("parse_erc20_abi", |b| {
        b.iter(|| black_box(black_box(TOKEN_ABI).parse::<Interface>()));
    });

    let generator = Generator::new(GeneratorConfig::default()).expect("generator");
    let sources = [ContractSource::new("Erc20", TOKEN_ABI)];
    group.bench_function("render_erc20", |b| {
        b.iter(|| black_box(generator.bind(black_box(&sources))));
    });

    group.finish();
}

criterion_group!(benches, benchmark_scalars, benchmark_arrays, benchmark_codegen);
criterion_main!(benches);
