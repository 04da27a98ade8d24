use criterion::{criterion_group, criterion_main, Criterion};
use gabac::context_model::ContextModel;
use gabac::decoder::BinaryArithmeticDecoder;
use gabac::encoder::BinaryArithmeticEncoder;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

const BIN_NUM: usize = 1 << 20;

fn random_bins() -> Vec<u8> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1337);
    (0..BIN_NUM).map(|_| rng.gen_bool(0.9) as u8).collect()
}

fn encode_1m_bins(c: &mut Criterion) {
    let bins = random_bins();

    c.bench_function("Encode 1M context-coded bins", |b| {
        b.iter(|| {
            let mut encoder = BinaryArithmeticEncoder::new();
            let mut context = ContextModel::new();
            for &bin in &bins {
                encoder.encode_bin(bin, &mut context);
            }
            encoder.flush();
        })
    });

    c.bench_function("Encode 1M bypass bins", |b| {
        b.iter(|| {
            let mut encoder = BinaryArithmeticEncoder::new();
            for &bin in &bins {
                encoder.encode_bin_ep(bin);
            }
            encoder.flush();
        })
    });
}

fn decode_1m_bins(c: &mut Criterion) {
    let bins = random_bins();
    let mut encoder = BinaryArithmeticEncoder::new();
    let mut context = ContextModel::new();
    for &bin in &bins {
        encoder.encode_bin(bin, &mut context);
    }
    encoder.flush();
    let data = encoder.into_output().into_inner();

    c.bench_function("Decode 1M context-coded bins", |b| {
        b.iter(|| {
            let mut decoder = BinaryArithmeticDecoder::new(&data).unwrap();
            let mut context = ContextModel::new();
            for _ in 0..BIN_NUM {
                decoder.decode_bin(&mut context).unwrap();
            }
            decoder.close().unwrap();
        })
    });
}

criterion_group!(benches, encode_1m_bins, decode_1m_bins);
criterion_main!(benches);
