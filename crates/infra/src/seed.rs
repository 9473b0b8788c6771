//! Demo catalog, inserted at startup when `SEED_CATALOG` is set.
//!
//! Idempotent: categories and products are matched by slug and existing rows
//! are left untouched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use storefront_products::{Category, NewProduct};

use crate::repository::CatalogRepository;
use crate::services::ServiceResult;

struct SeedCategory {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
}

struct SeedProduct {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    /// Price in cents.
    price: i64,
    category: &'static str,
    stock: i32,
}

const CATEGORIES: &[SeedCategory] = &[
    SeedCategory {
        name: "Streaming Services",
        slug: "streaming-services",
        description: "Music and video streaming platforms",
    },
    SeedCategory {
        name: "AI Tools",
        slug: "ai-tools",
        description: "Artificial Intelligence and machine learning tools",
    },
    SeedCategory {
        name: "Productivity",
        slug: "productivity",
        description: "Productivity and business tools",
    },
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Spotify Premium",
        slug: "spotify-premium",
        description: "Premium music streaming service with ad-free listening, offline downloads, and high-quality audio. Access millions of songs and podcasts.",
        price: 999,
        category: "streaming-services",
        stock: 100,
    },
    SeedProduct {
        name: "ChatGPT Plus",
        slug: "chatgpt-plus",
        description: "Advanced AI assistant with GPT-4 access, priority support, and faster response times. Perfect for professionals and power users.",
        price: 2000,
        category: "ai-tools",
        stock: 50,
    },
    SeedProduct {
        name: "Netflix Premium",
        slug: "netflix-premium",
        description: "Ultra HD streaming on up to 4 devices simultaneously. Watch your favorite shows and movies in the highest quality.",
        price: 1599,
        category: "streaming-services",
        stock: 75,
    },
    SeedProduct {
        name: "Adobe Creative Cloud",
        slug: "adobe-creative-cloud",
        description: "Complete suite of creative tools including Photoshop, Illustrator, Premiere Pro, and more. Perfect for designers and creators.",
        price: 5299,
        category: "productivity",
        stock: 30,
    },
    SeedProduct {
        name: "YouTube Premium",
        slug: "youtube-premium",
        description: "Ad-free YouTube experience with background playback, offline downloads, and YouTube Music Premium included.",
        price: 1199,
        category: "streaming-services",
        stock: 90,
    },
    SeedProduct {
        name: "Midjourney Subscription",
        slug: "midjourney-subscription",
        description: "AI-powered image generation tool. Create stunning artwork and images from text descriptions with advanced AI technology.",
        price: 1000,
        category: "ai-tools",
        stock: 40,
    },
    SeedProduct {
        name: "Notion Pro",
        slug: "notion-pro",
        description: "All-in-one workspace for notes, docs, databases, and collaboration. Organize your work and life in one place.",
        price: 800,
        category: "productivity",
        stock: 60,
    },
    SeedProduct {
        name: "Disney+ Premium",
        slug: "disney-plus-premium",
        description: "Stream Disney, Pixar, Marvel, Star Wars, and National Geographic content in 4K Ultra HD with HDR.",
        price: 1099,
        category: "streaming-services",
        stock: 80,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub products_created: usize,
}

pub async fn seed_demo_catalog(
    catalog: &dyn CatalogRepository,
    now: DateTime<Utc>,
) -> ServiceResult<SeedReport> {
    let mut stored = Vec::with_capacity(CATEGORIES.len());
    for seed in CATEGORIES {
        let category = Category::new(seed.name, seed.slug, Some(seed.description.to_string()))?;
        stored.push(catalog.ensure_category(&category).await?);
    }

    let mut products_created = 0;
    for seed in PRODUCTS {
        let category = stored.iter().find(|c| c.slug == seed.category).cloned();
        let product = NewProduct {
            name: seed.name.to_string(),
            slug: seed.slug.to_string(),
            description: seed.description.to_string(),
            price: Decimal::new(seed.price, 2),
            category,
            stock: seed.stock,
            is_active: true,
        }
        .into_product(now)?;

        if catalog.ensure_product(&product).await? {
            products_created += 1;
        }
    }

    info!(
        categories = stored.len(),
        products_created, "demo catalog seeded"
    );
    Ok(SeedReport {
        categories: stored.len(),
        products_created,
    })
}
