//! Seed data script - loads a demo catalog and coupons
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - 8 products (course books, flashcard decks, digital courses)
//! - 3 coupons (percentage with cap, fixed with minimum, expired)

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::time::Duration as StdDuration;
use tracing::info;
use uuid::Uuid;

use storefront_commerce::{
    db,
    entities::commerce::{coupon, product, DiscountType, ProductStatus},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== Storefront Seed Data ===");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://storefront.db?mode=rwc".to_string());

    let mut options = ConnectOptions::new(database_url.clone());
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(StdDuration::from_secs(10))
        .acquire_timeout(StdDuration::from_secs(10));

    info!("Connecting to database: {}", database_url);
    let conn = Database::connect(options).await?;
    db::run_migrations(&conn).await?;

    let products = create_products(&conn).await?;
    info!("  Created {} products", products.len());

    let coupons = create_coupons(&conn).await?;
    info!("  Created {} coupons", coupons);

    info!("Try these API calls:");
    info!("  curl http://localhost:8080/api/v1/cart");
    info!("  curl -X POST http://localhost:8080/api/v1/products/check-stock");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

async fn create_products(db: &DatabaseConnection) -> anyhow::Result<Vec<product::Model>> {
    // (name, slug, price, sale price, stock, tracked)
    let products_data: Vec<(&str, &str, Decimal, Option<Decimal>, i32, bool)> = vec![
        ("Spanish Grammar Workbook", "spanish-grammar-workbook", dec!(24.99), None, 40, true),
        ("French Vocabulary Flashcards", "french-vocab-flashcards", dec!(19.99), Some(dec!(14.99)), 25, true),
        ("Japanese Kana Practice Pad", "japanese-kana-pad", dec!(9.50), None, 3, true),
        ("German Phrasebook", "german-phrasebook", dec!(12.00), None, 60, true),
        ("Italian Verb Wheel", "italian-verb-wheel", dec!(7.99), None, 0, true),
        ("Mandarin Tone Trainer Cards", "mandarin-tone-cards", dec!(29.00), None, 12, true),
        ("Conversational Spanish Course", "conversational-spanish-course", dec!(49.00), None, 0, false),
        ("Portuguese Pronunciation Audio Pack", "portuguese-audio-pack", dec!(15.00), Some(dec!(11.25)), 0, false),
    ];

    let mut created = Vec::new();
    let now = Utc::now();

    for (name, slug, price, sale_price, stock, tracked) in products_data {
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            price: Set(price),
            sale_price: Set(sale_price),
            stock_quantity: Set(stock),
            track_inventory: Set(tracked),
            low_stock_threshold: Set(5),
            status: Set(ProductStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
        created.push(model);
    }

    Ok(created)
}

async fn create_coupons(db: &DatabaseConnection) -> anyhow::Result<usize> {
    let now = Utc::now();
    // (code, type, value, minimum, cap, limit, from, until)
    let coupons = vec![
        ("WELCOME10", DiscountType::Percentage, dec!(10), dec!(0), Some(dec!(20)), None, now - Duration::days(1), now + Duration::days(365)),
        ("SAVE5", DiscountType::Fixed, dec!(5), dec!(25), None, Some(100), now - Duration::days(1), now + Duration::days(90)),
        ("SPRING2020", DiscountType::Percentage, dec!(25), dec!(0), None, None, now - Duration::days(400), now - Duration::days(300)),
    ];

    let count = coupons.len();
    for (code, discount_type, value, minimum, cap, limit, from, until) in coupons {
        coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_string()),
            description: Set(Some(format!("Demo coupon {}", code))),
            discount_type: Set(discount_type),
            discount_value: Set(value),
            minimum_order: Set(minimum),
            maximum_discount: Set(cap),
            usage_limit: Set(limit),
            used_count: Set(0),
            valid_from: Set(from),
            valid_until: Set(until),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
    }

    Ok(count)
}
