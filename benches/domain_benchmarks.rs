use criterion::{Criterion, criterion_group, criterion_main};
use farmeely_api::domain::validation::{
    create_user_validation, initialize_payment_validation, reset_password_validation,
};
use farmeely_api::domain::{InitializePaymentRequest, to_minor_units};
use serde_json::json;
use std::hint::black_box;
use validator::Validate;

fn bench_validation(c: &mut Criterion) {
    let request = InitializePaymentRequest {
        email: "ada@farmeely.com".to_string(),
        amount: 2500.0,
        reference: "wallet_funding_1718000000000_k3j9x2abc".to_string(),
        metadata: Some(json!({"user_id": "user_1"})),
    };

    c.bench_function("validate_initialize_payment_request", |b| {
        b.iter(|| {
            let _ = black_box(&request).validate();
        })
    });

    let payload = json!({
        "email": "ada@farmeely.com",
        "amount": 2500,
        "reference": "wallet_funding_1718000000000_k3j9x2abc"
    });
    c.bench_function("initialize_payment_schema", |b| {
        b.iter(|| initialize_payment_validation(black_box(&payload)))
    });

    let user = json!({
        "first_name": "Ada",
        "last_name": "Obi",
        "email": "ada@farmeely.com",
        "phone": "+2348012345678",
        "password": "Str0ng!Pass"
    });
    c.bench_function("create_user_schema", |b| {
        b.iter(|| create_user_validation(black_box(&user)))
    });

    let reset = json!({
        "email": "ada@farmeely.com",
        "otp": "042917",
        "password": "Str0ng!Pass",
        "confirm_password": "Str0ng!Pass"
    });
    c.bench_function("reset_password_schema", |b| {
        b.iter(|| reset_password_validation(black_box(&reset)))
    });
}

fn bench_amount_conversion(c: &mut Criterion) {
    c.bench_function("to_minor_units", |b| {
        b.iter(|| to_minor_units(black_box(1234.56)))
    });
}

criterion_group!(benches, bench_validation, bench_amount_conversion);
criterion_main!(benches);
