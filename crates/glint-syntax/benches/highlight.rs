//! Highlighting throughput benchmarks.
//!
//! Run with: `cargo bench --package glint-syntax`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use glint_syntax::{highlight, HighlightOptions, Lang, Token, TokenBuffer};

fn token_count(source: &[u8], lang: Lang) -> usize {
    let mut count = 0;
    let mut backing = [Token::default(); 256];
    let mut sink = |tokens: &[Token]| count += tokens.len();
    let mut out = TokenBuffer::new(&mut backing, &mut sink);
    highlight(source, lang, &mut out, &HighlightOptions::default()).unwrap();
    out.flush();
    drop(out);
    count
}

const CPP_SOURCE: &str = r#"
#include <vector>

namespace demo {

/// Sums the squares of the first n integers.
constexpr long sum_squares(int n) noexcept
{
    long total = 0;
    for (int i = 0; i < n; ++i) {
        total += static_cast<long>(i) * i;
    }
    return total;
}

struct Point {
    double x = 0.0;
    double y = 0.0;
};

} // namespace demo
"#;

const JS_SOURCE: &str = r#"
const cache = new Map();

export async function fetchUser(id) {
    if (cache.has(id)) {
        return cache.get(id);
    }
    const response = await fetch(`/api/users/${id}`);
    const user = await response.json();
    cache.set(id, user);
    return user;
}

const pattern = /[a-z]+_[0-9]{2,}/gi;
"#;

const HTML_SOURCE: &str = r#"
<!DOCTYPE html>
<html>
  <head>
    <title>Bench &amp; test</title>
    <style>body { margin: 0; color: #333; }</style>
  </head>
  <body>
    <p class="lead">Hello</p>
    <script>document.title = "done";</script>
  </body>
</html>
"#;

fn bench_languages(c: &mut Criterion) {
    let mut group = c.benchmark_group("highlight");

    let cases: &[(&str, Lang, &str)] = &[
        ("cpp", Lang::Cpp, CPP_SOURCE),
        ("javascript", Lang::JavaScript, JS_SOURCE),
        ("html", Lang::Html, HTML_SOURCE),
    ];
    for &(name, lang, source) in cases {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| token_count(black_box(source.as_bytes()), lang))
        });
    }
    group.finish();
}

fn bench_pathological(c: &mut Criterion) {
    let mut group = c.benchmark_group("highlight_pathological");

    // A long run of unterminated template substitutions.
    let nested_js = "`${".repeat(200);
    group.throughput(Throughput::Bytes(nested_js.len() as u64));
    group.bench_function("nested_substitutions", |b| {
        b.iter(|| token_count(black_box(nested_js.as_bytes()), Lang::JavaScript))
    });

    let long_line = format!("// {}", "x".repeat(16 * 1024));
    group.throughput(Throughput::Bytes(long_line.len() as u64));
    group.bench_function("long_comment", |b| {
        b.iter(|| token_count(black_box(long_line.as_bytes()), Lang::Cpp))
    });

    group.finish();
}

criterion_group!(benches, bench_languages, bench_pathological);
criterion_main!(benches);
