use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{AddressId, CustomerId, Money, Order, Product, ProductId};

fn catalog(size: i64) -> Vec<Product> {
    (1..=size)
        .map(|id| Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Money::from_cents(100 * id),
            category_ids: vec![],
        })
        .collect()
}

fn bench_add_items(c: &mut Criterion) {
    let products = catalog(50);

    c.bench_function("order/add_50_items", |b| {
        b.iter(|| {
            let mut order = Order::new(CustomerId::new(1), AddressId::new(1), Utc::now());
            for product in &products {
                order.add_item(product, 2).unwrap();
            }
            order.total()
        });
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let products = catalog(100);
    let mut base = Order::new(CustomerId::new(1), AddressId::new(1), Utc::now());
    for product in &products[..50] {
        base.add_item(product, 1).unwrap();
    }

    c.bench_function("order/reconcile_half_overlap", |b| {
        b.iter(|| {
            let mut order = base.clone();
            order
                .reconcile_items(products[25..75].iter().map(|p| (p, 3)))
                .unwrap();
            order.total()
        });
    });
}

criterion_group!(benches, bench_add_items, bench_reconcile);
criterion_main!(benches);
