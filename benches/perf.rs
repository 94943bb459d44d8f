use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use sheet_leaderboard::gviz::{Cell, RawTable, parse_gviz_response};
use sheet_leaderboard::reconcile::reconcile;

const PREAMBLE: &str = "/*O_o*/\ngoogle.visualization.Query.setResponse(";

fn wide_rounds_table(players: usize, rounds: usize) -> RawTable {
    RawTable::new(
        (0..players)
            .map(|p| {
                std::iter::once(Cell::Text(format!("Player {p}")))
                    .chain((0..rounds).map(|r| {
                        if (p + r) % 7 == 0 {
                            Cell::Empty
                        } else {
                            Cell::Number(((p * 31 + r * 17) % 40) as f64)
                        }
                    }))
                    .collect()
            })
            .collect(),
    )
}

fn totals_table(players: usize) -> RawTable {
    RawTable::new(
        (0..players)
            .map(|p| {
                vec![
                    Cell::Text(format!("player {p} ")),
                    Cell::Number(((p * 13) % 200) as f64),
                ]
            })
            .collect(),
    )
}

fn gviz_body(players: usize, rounds: usize) -> String {
    let rows: Vec<String> = (0..players)
        .map(|p| {
            let mut cells = vec![format!(r#"{{"v":"Player {p}"}}"#)];
            cells.extend((0..rounds).map(|r| format!(r#"{{"v":{}.0}}"#, (p + r) % 40)));
            format!(r#"{{"c":[{}]}}"#, cells.join(","))
        })
        .collect();
    format!(
        r#"{PREAMBLE}{{"version":"0.6","status":"ok","table":{{"cols":[],"rows":[{}]}}}});"#,
        rows.join(",")
    )
}

fn bench_gviz_parse(c: &mut Criterion) {
    let body = gviz_body(200, 30);
    c.bench_function("gviz_parse_200x30", |b| {
        b.iter(|| {
            let table = parse_gviz_response(black_box(&body)).unwrap();
            black_box(table.rows.len());
        })
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let totals = totals_table(200);
    let rounds = wide_rounds_table(200, 30);
    c.bench_function("reconcile_200x30", |b| {
        b.iter(|| {
            let model = reconcile(black_box(&totals), black_box(&rounds));
            black_box(model.max_rounds);
        })
    });
}

criterion_group!(benches, bench_gviz_parse, bench_reconcile);
criterion_main!(benches);
