use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fwe_core::{CommodityRecord, ContractRecord, Multipliers};

fn build_tables(n: usize) -> (Vec<CommodityRecord>, Vec<ContractRecord>) {
    let mut prices = Vec::with_capacity(n);
    let mut contracts = Vec::with_capacity(n);
    for i in 0..n {
        prices.push(CommodityRecord {
            name: format!("c{i}"),
            unit_price_usd: 300.0 + (i % 17) as f64 * 90.0,
            kcal_per_kg: 2000.0 + (i % 11) as f64 * 600.0,
            protein_g_per_kg: (i % 5) as f64 * 50.0,
        });
        contracts.push(ContractRecord {
            commodity: format!("c{i}"),
            tons: 10_000.0 + (i % 7) as f64 * 25_000.0,
        });
    }
    (prices, contracts)
}

fn bench_solve(c: &mut Criterion) {
    let opt: fwe_opt::ProcurementOptimizer = Default::default();
    let m = Multipliers {
        delivery: 0.8,
        insurance_delta: 0.2,
        price_friction: 1.1,
        margin: 1.3,
    };
    for n in [4usize, 64] {
        let (prices, contracts) = build_tables(n);
        c.bench_function(&format!("procurement {n} commodities"), |b| {
            b.iter(|| {
                let _ = black_box(opt.solve(&prices, &contracts, &m, black_box(500.0)));
            })
        });
    }
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
