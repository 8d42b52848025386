//! # Seed Data Generator
//!
//! Populates a development database with catalog products and discount codes.
//!
//! ## Usage
//! ```bash
//! # Full catalog (200 products) plus the standard discount codes
//! cargo run -p emporium-db --bin seed
//!
//! # Only the first 50 products
//! cargo run -p emporium-db --bin seed -- --count 50
//!
//! # Specify database path
//! cargo run -p emporium-db --bin seed -- --db ./data/emporium.db
//! ```
//!
//! ## Generated Data
//! - Products across categories (apparel, home, kitchen, outdoor, stationery)
//!   with SKU `{CATEGORY}-{ABBR}-{NNN}`, price $4.99 - $55.98 and stock 0 - 50
//! - Discount codes covering every rule the checkout evaluates:
//!   percentage with cap, fixed amount with minimum, single use, expired,
//!   not yet active

use chrono::{Duration, Utc};
use emporium_core::validation::{validate_new_discount, validate_product_name, validate_sku};
use emporium_core::{Money, NewDiscount, Percentage, Product};
use emporium_db::{Database, DbConfig};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "APP",
        &[
            "Linen Shirt",
            "Denim Jacket",
            "Wool Beanie",
            "Canvas Sneakers",
            "Rain Shell",
            "Merino Socks",
            "Cotton Tee",
            "Chino Shorts",
        ],
    ),
    (
        "HOM",
        &[
            "Throw Blanket",
            "Scented Candle",
            "Linen Napkins",
            "Ceramic Vase",
            "Wall Clock",
            "Table Lamp",
            "Door Mat",
            "Cushion Cover",
        ],
    ),
    (
        "KIT",
        &[
            "Chef Knife",
            "Cast Iron Pan",
            "Pour Over Kettle",
            "Cutting Board",
            "Spice Grinder",
            "Mixing Bowls",
            "Tea Towel",
            "French Press",
        ],
    ),
    (
        "OUT",
        &[
            "Camp Mug",
            "Trail Bottle",
            "Day Pack",
            "Headlamp",
            "Picnic Blanket",
            "Folding Stool",
            "Dry Bag",
            "Hammock",
        ],
    ),
    (
        "STA",
        &[
            "Dot Notebook",
            "Fountain Pen",
            "Desk Planner",
            "Pencil Set",
            "Washi Tape",
            "Letter Press Cards",
            "Brass Ruler",
            "Ink Bottle",
        ],
    ),
];

/// Variants with their price addon in cents
const VARIANTS: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 300),
    ("Large", 600),
    ("Natural", 0),
    ("Charcoal", 200),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("EMPORIUM_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./emporium_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Emporium Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./emporium_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, products = count, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(
            existing,
            "Database already has products; skipping seed. Delete the file to regenerate."
        );
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0;

    'outer: for (category_idx, (category_code, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (variant_idx, (variant, price_addon)) in VARIANTS.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = category_idx * 1000 + name_idx * 20 + variant_idx;
                let product = generate_product(category_code, name, variant, *price_addon, seed);

                if let Err(e) = validate_sku(&product.sku).and(validate_product_name(&product.name)) {
                    warn!(sku = %product.sku, error = %e, "Skipping invalid product");
                    continue;
                }

                if let Err(e) = db.products().insert(&product).await {
                    warn!(sku = %product.sku, error = %e, "Failed to insert product");
                    continue;
                }

                generated += 1;
            }
        }
    }

    info!(generated, elapsed = ?start.elapsed(), "Products generated");

    let mut codes = 0;
    for discount in discount_codes() {
        let discount = match validate_new_discount(&discount) {
            Ok(d) => d,
            Err(e) => {
                warn!(code = %discount.code, error = %e, "Skipping invalid discount");
                continue;
            }
        };

        match db.discounts().insert(&discount).await {
            Ok(d) => {
                info!(code = %d.code, "Discount created");
                codes += 1;
            }
            Err(e) => warn!(code = %discount.code, error = %e, "Failed to insert discount"),
        }
    }

    info!(products = generated, discounts = codes, "Seed complete");
    db.close().await;

    Ok(())
}

/// Generates a single product with realistic data.
fn generate_product(category: &str, name: &str, variant: &str, price_addon: i64, seed: usize) -> Product {
    let now = Utc::now();

    let abbr: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();
    let sku = format!("{}-{}-{:03}", category, abbr, seed % 1000);

    // $4.99 - $49.98 base, plus the variant addon
    let base_price = 499 + ((seed * 37) % 4500) as i64;

    Product {
        id: Uuid::new_v4().to_string(),
        sku,
        name: format!("{} ({})", name, variant),
        description: Some(format!("{} in {}", name, variant.to_lowercase())),
        price_cents: base_price + price_addon,
        stock_quantity: (seed % 51) as i64,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Codes exercising each discount rule.
fn discount_codes() -> Vec<NewDiscount> {
    let now = Utc::now();

    let mut welcome = NewDiscount::percentage("WELCOME10", Percentage::from_whole(10));
    welcome.description = Some("10% off, at most $15".to_string());
    welcome.max_discount_cents = Some(1500);

    let mut flat = NewDiscount::fixed_amount("TAKE5", Money::from_cents(500));
    flat.description = Some("$5 off orders of $25 or more".to_string());
    flat.min_order_cents = 2500;

    let mut vip = NewDiscount::percentage("VIP25", Percentage::from_whole(25));
    vip.description = Some("25% off, single use".to_string());
    vip.usage_limit = Some(1);

    let mut expired = NewDiscount::percentage("SUMMER15", Percentage::from_whole(15));
    expired.description = Some("Last summer's sale".to_string());
    expired.starts_at = Some(now - Duration::days(120));
    expired.ends_at = Some(now - Duration::days(30));

    let mut upcoming = NewDiscount::fixed_amount("HOLIDAY20", Money::from_cents(2000));
    upcoming.description = Some("$20 off, opens next month".to_string());
    upcoming.starts_at = Some(now + Duration::days(30));
    upcoming.min_order_cents = 10_000;

    vec![welcome, flat, vip, expired, upcoming]
}
