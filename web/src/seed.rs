//! Demo catalog for a fresh kiosk.

use kiosk_core::providers::KioskStore;
use kiosk_core::{BottleSize, Money, NewProduct, Result, StockDraft, VariantPrices};
use kiosk_runtime::Kiosk;

struct DemoFragrance {
    name: &'static str,
    description: &'static str,
    prices: [u64; 4],
    bottles: u32,
}

const DEMO_FRAGRANCES: [DemoFragrance; 3] = [
    DemoFragrance {
        name: "Cedar Smoke",
        description: "Dry cedar, vetiver and a trace of birch tar",
        prices: [500, 3000, 5500, 8000],
        bottles: 6,
    },
    DemoFragrance {
        name: "Neroli Tide",
        description: "Orange blossom over a salt-air musk",
        prices: [500, 2800, 5000, 7500],
        bottles: 4,
    },
    DemoFragrance {
        name: "Velvet Oud",
        description: "Oud, saffron and rose",
        prices: [800, 4500, 8000, 12000],
        bottles: 2,
    },
];

/// Load the demo catalog into an empty store.
///
/// Each fragrance gets a spray slot and its 30 ml bottles in a bottle slot.
/// Returns the number of products created; a store that already has products
/// is left alone.
///
/// # Errors
///
/// Returns the first store error.
pub async fn seed_demo_catalog<S: KioskStore>(kiosk: &Kiosk<S>) -> Result<usize> {
    if !kiosk.catalog.list_all().await?.is_empty() {
        return Ok(0);
    }

    for (number, demo) in (1_u8..).zip(DEMO_FRAGRANCES.iter()) {
        let [spray, ml30, ml60, ml100] = demo.prices.map(Money::from_minor);
        let mut product = NewProduct::new(demo.name, VariantPrices { spray, ml30, ml60, ml100 });
        product.description = demo.description.to_string();
        product.stock = StockDraft {
            ml30: Some(demo.bottles),
            ml60: Some(demo.bottles),
            ml100: Some(demo.bottles),
            ..StockDraft::default()
        };

        let product = kiosk.catalog.create(product).await?;
        kiosk.slots.assign_spray(product.id, number, 0).await?;
        kiosk
            .slots
            .assign_bottle(product.id, number, BottleSize::Ml30, 0, demo.bottles)
            .await?;
    }

    tracing::info!(products = DEMO_FRAGRANCES.len(), "Demo catalog seeded");
    Ok(DEMO_FRAGRANCES.len())
}
