use crate::gateway::MockPaymentGateway;
use crate::mocks::ManualClock;
use kiosk_core::{Money, NewProduct, StockDraft, VariantPrices};
use kiosk_runtime::{AdminSettings, InMemoryStore, Kiosk};
use std::sync::Arc;

/// Admin login name used by [`TestKiosk`]
pub const ADMIN_USERNAME: &str = "admin";

/// Admin password used by [`TestKiosk`]
pub const ADMIN_PASSWORD: &str = "kiosk-test-password";

/// 5.00 spray, 30.00 / 55.00 / 80.00 bottles
#[must_use]
pub const fn standard_prices() -> VariantPrices {
    VariantPrices {
        spray: Money::from_minor(500),
        ml30: Money::from_minor(3_000),
        ml60: Money::from_minor(5_500),
        ml100: Money::from_minor(8_000),
    }
}

/// Builder for [`NewProduct`] with standard prices
///
/// Stock not set explicitly falls back to the store defaults.
///
/// ```
/// use kiosk_testing::ProductBuilder;
///
/// let product = ProductBuilder::new("Vetiver").spray(10).ml30(5).build();
/// assert_eq!(product.stock.spray, Some(10));
/// assert_eq!(product.stock.ml60, None);
/// ```
#[derive(Debug, Clone)]
pub struct ProductBuilder {
    product: NewProduct,
}

impl ProductBuilder {
    /// Start a visible product
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            product: NewProduct::new(name, standard_prices()),
        }
    }

    /// Spray stock
    #[must_use]
    pub const fn spray(mut self, quantity: u32) -> Self {
        self.product.stock.spray = Some(quantity);
        self
    }

    /// 30 ml stock
    #[must_use]
    pub const fn ml30(mut self, quantity: u32) -> Self {
        self.product.stock.ml30 = Some(quantity);
        self
    }

    /// 60 ml stock
    #[must_use]
    pub const fn ml60(mut self, quantity: u32) -> Self {
        self.product.stock.ml60 = Some(quantity);
        self
    }

    /// 100 ml stock
    #[must_use]
    pub const fn ml100(mut self, quantity: u32) -> Self {
        self.product.stock.ml100 = Some(quantity);
        self
    }

    /// Zero stock everywhere
    #[must_use]
    pub const fn empty(mut self) -> Self {
        self.product.stock = StockDraft {
            spray: Some(0),
            ml30: Some(0),
            ml60: Some(0),
            ml100: Some(0),
        };
        self
    }

    /// Replace the prices
    #[must_use]
    pub const fn prices(mut self, prices: VariantPrices) -> Self {
        self.product.prices = prices;
        self
    }

    /// Hide from customers
    #[must_use]
    pub const fn unavailable(mut self) -> Self {
        self.product.available = false;
        self
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> NewProduct {
        self.product
    }
}

/// A kiosk over an in-memory store with a mock gateway and a manual clock
///
/// The gateway and clock handles share state with the ones inside the kiosk.
#[derive(Clone)]
pub struct TestKiosk {
    /// The wired services
    pub kiosk: Kiosk<InMemoryStore>,
    /// Gateway used by the engine
    pub gateway: MockPaymentGateway,
    /// Clock used by every service
    pub clock: ManualClock,
}

impl TestKiosk {
    /// Approving gateway, clock at [`crate::test_time`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_gateway(MockPaymentGateway::approving())
    }

    /// Custom gateway
    #[must_use]
    pub fn with_gateway(gateway: MockPaymentGateway) -> Self {
        let clock = ManualClock::starting_at(crate::test_time());
        let kiosk = Kiosk::new(
            InMemoryStore::new(),
            Arc::new(gateway.clone()),
            Arc::new(clock.clone()),
            AdminSettings::new(ADMIN_USERNAME, ADMIN_PASSWORD),
        );
        Self { kiosk, gateway, clock }
    }
}

impl Default for TestKiosk {
    fn default() -> Self {
        Self::new()
    }
}
