//! Selector Operations Benchmarks
//!
//! Benchmarks for selector scoring, candidate generation, and a single
//! satisfied wait against the in-memory page.
//!
//! Run with: `cargo bench --bench selector_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use locus::prelude::*;
use locus::{MockElement, MockPage};

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");

    let cases = vec![
        ("id_plain", Strategy::Id, "login"),
        ("id_numbered", Strategy::Id, "btn42"),
        ("css_id", Strategy::Css, "#submit"),
        ("css_chain", Strategy::Css, "main > div > ul > li > a"),
        ("css_attr", Strategy::Css, "input[name='email']"),
        ("xpath_id", Strategy::Xpath, "//button[@id='submitBtn']"),
        ("xpath_long", Strategy::Xpath, "/html/body/div/main/section/form"),
        ("class_multi", Strategy::Class, "btn btn-primary large"),
    ];

    for (name, strategy, value) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &value, |bench, v| {
            bench.iter(|| black_box(locus::score(strategy, black_box(v))));
        });
    }

    group.finish();
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    let generator = SelectorGenerator::new();

    let descriptors = vec![
        ("with_id", ElementDescriptor::new("button").with_id("submitBtn")),
        ("with_name", ElementDescriptor::new("input").with_name("email")),
        (
            "with_class",
            ElementDescriptor::new("div").with_class("card card-lg shadow"),
        ),
        (
            "anchor_text",
            ElementDescriptor::new("a").with_text("Documentation"),
        ),
        (
            "attribute_only",
            ElementDescriptor::new("div").with_attribute("role", "dialog"),
        ),
    ];

    for (name, descriptor) in descriptors {
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &descriptor,
            |bench, d| {
                bench.iter(|| {
                    let set = generator.generate(black_box(d));
                    black_box(set.recommend().cloned());
                });
            },
        );
    }

    group.finish();
}

fn bench_satisfied_wait(c: &mut Criterion) {
    let page = MockPage::new();
    page.insert(Locator::id("ready"), MockElement::new("button"));
    let waiter = ElementWaiter::new(&page);
    let options = WaitOptions::new().with_timeout(1_000).with_poll_interval(10);
    let locator = Locator::id("ready");

    c.bench_function("wait_clickable_immediate", |bench| {
        bench.iter(|| {
            let outcome = waiter.wait_for_element(&locator, &WaitCondition::Clickable, &options);
            black_box(outcome.is_success());
        });
    });
}

criterion_group!(benches, bench_scoring, bench_generation, bench_satisfied_wait);
criterion_main!(benches);
