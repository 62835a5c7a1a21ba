use criterion::{black_box, criterion_group, criterion_main, Criterion};

use clasp::profile::{Metadata, Profile, Taxonomy};
use clasp::search::{self, Algorithm, Mode, SearchOpt};

const MARKERS: [&str; 16] = [
    "CSF1PO", "D13S317", "D16S539", "D18S51", "D21S11", "D3S1358", "D5S818", "D7S820", "D8S1179",
    "FGA", "Penta D", "Penta E", "TH01", "TPOX", "vWA", "Amelogenin",
];

/// 伪随机生成 n 个参考图谱，每 3 个共用一个 identifier 模拟多来源
fn make_db(n: usize) -> Vec<Profile> {
    let mut x: u32 = 42;
    let mut next = move |m: u32| {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (x >> 16) % m
    };
    (0..n)
        .map(|i| {
            let alleles: Vec<(&str, String)> = MARKERS
                .iter()
                .map(|&marker| {
                    let value = if marker == "Amelogenin" {
                        if next(2) == 0 { "X".to_string() } else { "X,Y".to_string() }
                    } else {
                        let a = 6 + next(20);
                        let b = 6 + next(20);
                        format!("{a},{b}")
                    };
                    (marker, value)
                })
                .collect();
            let meta = Metadata {
                identifier: Some(format!("CL-{}", i / 3)),
                accession: Some(format!("CVCL_{:04}", i / 3)),
                taxid: Some(Taxonomy::Single(9606)),
                source: Some(format!("SRC{}", i % 3)),
                ..Metadata::default()
            };
            Profile::new(alleles, meta).expect("valid synthetic profile")
        })
        .collect()
}

fn make_query(db: &[Profile], sample: &str) -> Profile {
    let alleles: Vec<(String, String)> = db[0].allele_map().into_iter().collect();
    Profile::new(alleles, Metadata::for_sample(sample)).expect("valid query")
}

fn bench_score(c: &mut Criterion) {
    let db = make_db(2);
    let (query, reference) = (&db[0], &db[1]);

    c.bench_function("score_tanabe_intersect", |b| {
        b.iter(|| {
            black_box(search::score(
                black_box(query),
                black_box(reference),
                Algorithm::Tanabe,
                Mode::Intersect,
                false,
            ));
        })
    });
}

fn bench_search(c: &mut Criterion) {
    let db = make_db(3_000);
    let query = make_query(&db, "bench");
    let opt = SearchOpt::default();

    c.bench_function("search_3000_profiles", |b| {
        b.iter(|| {
            black_box(search::search(black_box(&db), black_box(&query), &opt));
        })
    });

    c.bench_function("search_3000_profiles_full_report", |b| {
        b.iter(|| {
            let result = search::search(&db, &query, &opt);
            black_box(result.full_report());
        })
    });
}

fn bench_search_all(c: &mut Criterion) {
    let db = make_db(3_000);
    let queries: Vec<Profile> = (0..8).map(|i| make_query(&db, &format!("q{i}"))).collect();
    let opt = SearchOpt::default();

    c.bench_function("search_all_8_queries", |b| {
        b.iter(|| {
            black_box(search::search_all(&db, black_box(&queries), &opt));
        })
    });
}

criterion_group!(benches, bench_score, bench_search, bench_search_all);
criterion_main!(benches);
