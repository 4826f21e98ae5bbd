//! Domain types for the fragrance kiosk.
//!
//! Value objects (identifiers, money, variants, slots), entities (products,
//! slot assignments, orders, admin sessions) and the input types used to
//! create or change them.

use crate::allocation::BOTTLE_STOCK_CEILING;
use crate::error::{KioskError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! sequence_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[doc = concat!("Wraps a raw store-issued `", stringify!($name), "`")]
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the raw sequence value
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

sequence_id!(
    /// Store-issued product identifier
    ProductId
);
sequence_id!(
    /// Store-issued order identifier
    OrderId
);
sequence_id!(
    /// Store-issued slot assignment identifier
    AssignmentId
);

/// Bearer token identifying an admin session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    /// Creates a new random token
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a token from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for SessionToken {
    type Err = KioskError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| KioskError::SessionNotFound)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (minor units to avoid floating point errors)
// ============================================================================

/// An amount in minor currency units (paise, cents)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from minor units
    #[must_use]
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Returns the amount in minor units
    #[must_use]
    pub const fn minor(self) -> u64 {
        self.0
    }

    /// Adds two amounts, clamping at the maximum
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Variants
// ============================================================================

/// Bottle sizes the machine can dispense
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BottleSize {
    /// 30 ml bottle
    #[serde(rename = "30ml")]
    Ml30,
    /// 60 ml bottle
    #[serde(rename = "60ml")]
    Ml60,
    /// 100 ml bottle
    #[serde(rename = "100ml")]
    Ml100,
}

impl BottleSize {
    /// Every bottle size, smallest first
    pub const ALL: [Self; 3] = [Self::Ml30, Self::Ml60, Self::Ml100];

    /// Wire name (`"30ml"`, `"60ml"`, `"100ml"`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ml30 => "30ml",
            Self::Ml60 => "60ml",
            Self::Ml100 => "100ml",
        }
    }
}

impl FromStr for BottleSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "30ml" => Ok(Self::Ml30),
            "60ml" => Ok(Self::Ml60),
            "100ml" => Ok(Self::Ml100),
            other => Err(format!("unknown bottle size: {other}")),
        }
    }
}

impl fmt::Display for BottleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of stock, pricing and slot assignment for a product
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    /// A single spray from a tester
    Spray,
    /// A sealed bottle of the given size
    Bottle(BottleSize),
}

impl Variant {
    /// Every variant, spray first
    pub const ALL: [Self; 4] = [
        Self::Spray,
        Self::Bottle(BottleSize::Ml30),
        Self::Bottle(BottleSize::Ml60),
        Self::Bottle(BottleSize::Ml100),
    ];

    /// Wire name (`"spray"`, `"30ml"`, ...)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spray => "spray",
            Self::Bottle(size) => size.as_str(),
        }
    }

    /// The bottle size, if this is a bottle variant
    #[must_use]
    pub const fn bottle_size(self) -> Option<BottleSize> {
        match self {
            Self::Spray => None,
            Self::Bottle(size) => Some(size),
        }
    }

    /// Kind of slot that can hold this variant
    #[must_use]
    pub const fn slot_kind(self) -> SlotKind {
        match self {
            Self::Spray => SlotKind::Spray,
            Self::Bottle(_) => SlotKind::Bottle,
        }
    }
}

impl From<BottleSize> for Variant {
    fn from(size: BottleSize) -> Self {
        Self::Bottle(size)
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "spray" {
            return Ok(Self::Spray);
        }
        s.parse::<BottleSize>()
            .map(Self::Bottle)
            .map_err(|_| format!("unknown variant: {s}"))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Variant {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Variant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Slots
// ============================================================================

/// Physical slot families in the machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// Spray testers, slots 1–5
    Spray,
    /// Bottle dispensers, slots 1–15
    Bottle,
}

impl SlotKind {
    /// Number of slots of this kind
    #[must_use]
    pub const fn capacity(self) -> u8 {
        match self {
            Self::Spray => 5,
            Self::Bottle => 15,
        }
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spray => "spray",
            Self::Bottle => "bottle",
        }
    }
}

impl FromStr for SlotKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "spray" => Ok(Self::Spray),
            "bottle" => Ok(Self::Bottle),
            other => Err(format!("unknown slot kind: {other}")),
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical slot, always within range for its kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSlot")]
pub struct Slot {
    kind: SlotKind,
    number: u8,
}

#[derive(Deserialize)]
struct RawSlot {
    kind: SlotKind,
    number: u8,
}

impl TryFrom<RawSlot> for Slot {
    type Error = KioskError;

    fn try_from(raw: RawSlot) -> Result<Self> {
        Self::new(raw.kind, raw.number)
    }
}

impl Slot {
    /// Creates a slot, validating the number against the kind's range
    ///
    /// # Errors
    ///
    /// Returns `KioskError::InvalidSlot` if `number` is 0 or above the kind's capacity.
    pub const fn new(kind: SlotKind, number: u8) -> Result<Self> {
        if number == 0 || number > kind.capacity() {
            return Err(KioskError::InvalidSlot { kind, number });
        }
        Ok(Self { kind, number })
    }

    /// Spray slot 1–5
    ///
    /// # Errors
    ///
    /// Returns `KioskError::InvalidSlot` when out of range.
    pub const fn spray(number: u8) -> Result<Self> {
        Self::new(SlotKind::Spray, number)
    }

    /// Bottle slot 1–15
    ///
    /// # Errors
    ///
    /// Returns `KioskError::InvalidSlot` when out of range.
    pub const fn bottle(number: u8) -> Result<Self> {
        Self::new(SlotKind::Bottle, number)
    }

    /// Every slot of a kind, in ascending order
    pub fn all(kind: SlotKind) -> impl Iterator<Item = Self> {
        (1..=kind.capacity()).map(move |number| Self { kind, number })
    }

    /// Slot kind
    #[must_use]
    pub const fn kind(self) -> SlotKind {
        self.kind
    }

    /// Slot number (1-based)
    #[must_use]
    pub const fn number(self) -> u8 {
        self.number
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.number)
    }
}

// ============================================================================
// Products
// ============================================================================

/// Per-variant stock counters
///
/// Bottle counters are capped at [`BOTTLE_STOCK_CEILING`]; the spray counter is
/// unbounded. Every mutation goes through [`StockLevels::set`] or
/// [`StockLevels::decrement`] so the cap cannot be bypassed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    spray: u32,
    ml30: u32,
    ml60: u32,
    ml100: u32,
}

impl StockLevels {
    /// Spray stock for a newly created product when none is given
    pub const DEFAULT_SPRAY: u32 = 100;

    /// Bottle stock for a newly created product when none is given, before the ceiling applies
    pub const DEFAULT_BOTTLES: [u32; 3] = [50, 30, 20];

    /// All counters at zero
    pub const EMPTY: Self = Self { spray: 0, ml30: 0, ml60: 0, ml100: 0 };

    /// Builds stock levels, rejecting bottle counts above the ceiling
    ///
    /// # Errors
    ///
    /// Returns `KioskError::LimitExceeded` for a bottle count above 20.
    pub fn new(spray: u32, ml30: u32, ml60: u32, ml100: u32) -> Result<Self> {
        let mut levels = Self { spray, ..Self::EMPTY };
        levels.set(Variant::Bottle(BottleSize::Ml30), ml30)?;
        levels.set(Variant::Bottle(BottleSize::Ml60), ml60)?;
        levels.set(Variant::Bottle(BottleSize::Ml100), ml100)?;
        Ok(levels)
    }

    /// Current stock of a variant
    #[must_use]
    pub const fn get(&self, variant: Variant) -> u32 {
        match variant {
            Variant::Spray => self.spray,
            Variant::Bottle(BottleSize::Ml30) => self.ml30,
            Variant::Bottle(BottleSize::Ml60) => self.ml60,
            Variant::Bottle(BottleSize::Ml100) => self.ml100,
        }
    }

    /// Checks a stock value against the variant's ceiling
    ///
    /// # Errors
    ///
    /// Returns `KioskError::LimitExceeded` for a bottle count above 20.
    pub const fn check(variant: Variant, quantity: u32) -> Result<()> {
        if let Variant::Bottle(_) = variant {
            if quantity > BOTTLE_STOCK_CEILING {
                return Err(KioskError::LimitExceeded {
                    variant,
                    requested: quantity,
                    limit: BOTTLE_STOCK_CEILING,
                });
            }
        }
        Ok(())
    }

    /// Sets a variant's stock to an absolute value
    ///
    /// # Errors
    ///
    /// Returns `KioskError::LimitExceeded` for a bottle count above 20.
    pub fn set(&mut self, variant: Variant, quantity: u32) -> Result<()> {
        Self::check(variant, quantity)?;
        *self.slot_mut(variant) = quantity;
        Ok(())
    }

    /// Removes `amount` units, failing closed if fewer are on hand
    ///
    /// # Errors
    ///
    /// Returns `KioskError::InsufficientStock` and leaves the counter untouched.
    pub fn decrement(&mut self, product_id: ProductId, variant: Variant, amount: u32) -> Result<()> {
        let current = self.slot_mut(variant);
        match current.checked_sub(amount) {
            Some(remaining) => {
                *current = remaining;
                Ok(())
            }
            None => Err(KioskError::InsufficientStock {
                product_id,
                variant,
                requested: amount,
                available: *current,
            }),
        }
    }

    fn slot_mut(&mut self, variant: Variant) -> &mut u32 {
        match variant {
            Variant::Spray => &mut self.spray,
            Variant::Bottle(BottleSize::Ml30) => &mut self.ml30,
            Variant::Bottle(BottleSize::Ml60) => &mut self.ml60,
            Variant::Bottle(BottleSize::Ml100) => &mut self.ml100,
        }
    }
}

impl Default for StockLevels {
    /// 100 sprays and the legacy 50/30/20 bottle defaults clamped to the ceiling.
    fn default() -> Self {
        let [ml30, ml60, ml100] = Self::DEFAULT_BOTTLES.map(|n| n.min(BOTTLE_STOCK_CEILING));
        Self { spray: Self::DEFAULT_SPRAY, ml30, ml60, ml100 }
    }
}

/// Optional per-variant stock values; missing values take the defaults
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDraft {
    /// Spray stock
    #[serde(default)]
    pub spray: Option<u32>,
    /// 30 ml bottles
    #[serde(default)]
    pub ml30: Option<u32>,
    /// 60 ml bottles
    #[serde(default)]
    pub ml60: Option<u32>,
    /// 100 ml bottles
    #[serde(default)]
    pub ml100: Option<u32>,
}

impl StockDraft {
    /// The values that were actually provided
    pub fn provided(&self) -> impl Iterator<Item = (Variant, u32)> + '_ {
        Variant::ALL
            .into_iter()
            .filter_map(|variant| self.value(variant).map(|quantity| (variant, quantity)))
    }

    const fn value(&self, variant: Variant) -> Option<u32> {
        match variant {
            Variant::Spray => self.spray,
            Variant::Bottle(BottleSize::Ml30) => self.ml30,
            Variant::Bottle(BottleSize::Ml60) => self.ml60,
            Variant::Bottle(BottleSize::Ml100) => self.ml100,
        }
    }

    /// Fills gaps with the defaults and validates
    ///
    /// # Errors
    ///
    /// Returns `KioskError::LimitExceeded` for a bottle count above 20.
    pub fn resolve(&self) -> Result<StockLevels> {
        let mut levels = StockLevels::default();
        for (variant, quantity) in self.provided() {
            levels.set(variant, quantity)?;
        }
        Ok(levels)
    }
}

/// Per-variant prices
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPrices {
    /// Price of a single spray
    pub spray: Money,
    /// Price of a 30 ml bottle
    pub ml30: Money,
    /// Price of a 60 ml bottle
    pub ml60: Money,
    /// Price of a 100 ml bottle
    pub ml100: Money,
}

impl VariantPrices {
    /// Current price of a variant
    #[must_use]
    pub const fn get(&self, variant: Variant) -> Money {
        match variant {
            Variant::Spray => self.spray,
            Variant::Bottle(BottleSize::Ml30) => self.ml30,
            Variant::Bottle(BottleSize::Ml60) => self.ml60,
            Variant::Bottle(BottleSize::Ml100) => self.ml100,
        }
    }
}

/// A fragrance offered by the kiosk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Store-issued id
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Display description
    pub description: String,
    /// Image shown on the kiosk
    pub image_url: Option<String>,
    /// Whether customers can see and buy it
    pub available: bool,
    /// Stock per variant
    pub stock: StockLevels,
    /// Price per variant
    pub prices: VariantPrices,
    /// Primary spray slot (the slot table is authoritative)
    pub spray_slot: Option<Slot>,
    /// Primary bottle slot (the slot table is authoritative)
    pub bottle_slot: Option<Slot>,
    /// Size held in the primary bottle slot
    pub bottle_size: Option<BottleSize>,
    /// When the product was created
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Clears primary back-references pointing at `slot`
    pub fn release_slot(&mut self, slot: Slot) {
        if self.spray_slot == Some(slot) {
            self.spray_slot = None;
        }
        if self.bottle_slot == Some(slot) {
            self.bottle_slot = None;
            self.bottle_size = None;
        }
    }

    /// Records `slot` as the primary slot for `variant` if none is set yet
    pub fn claim_slot(&mut self, slot: Slot, variant: Variant) {
        match variant {
            Variant::Spray => {
                if self.spray_slot.is_none() {
                    self.spray_slot = Some(slot);
                }
            }
            Variant::Bottle(size) => {
                if self.bottle_slot.is_none() {
                    self.bottle_slot = Some(slot);
                    self.bottle_size = Some(size);
                }
            }
        }
    }
}

/// Fields for creating a product
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name
    pub name: String,
    /// Display description
    #[serde(default)]
    pub description: String,
    /// Image shown on the kiosk
    #[serde(default)]
    pub image_url: Option<String>,
    /// Whether customers can see it
    #[serde(default = "default_available")]
    pub available: bool,
    /// Initial stock (gaps take the defaults)
    #[serde(default)]
    pub stock: StockDraft,
    /// Prices per variant
    pub prices: VariantPrices,
}

const fn default_available() -> bool {
    true
}

impl NewProduct {
    /// Creates a visible product with default stock
    #[must_use]
    pub fn new(name: impl Into<String>, prices: VariantPrices) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            image_url: None,
            available: true,
            stock: StockDraft::default(),
            prices,
        }
    }

    /// Builds the stored product under a store-issued id
    ///
    /// # Errors
    ///
    /// Returns `KioskError::LimitExceeded` for a bottle count above 20.
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> Result<Product> {
        Ok(Product {
            id,
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            available: self.available,
            stock: self.stock.resolve()?,
            prices: self.prices,
            spray_slot: None,
            bottle_slot: None,
            bottle_size: None,
            created_at,
        })
    }
}

/// Shallow partial update of a product
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    /// New display name
    #[serde(default)]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// New image
    #[serde(default)]
    pub image_url: Option<String>,
    /// New visibility
    #[serde(default)]
    pub available: Option<bool>,
    /// New prices
    #[serde(default)]
    pub prices: Option<VariantPrices>,
    /// Absolute stock values to set
    #[serde(default)]
    pub stock: StockDraft,
    /// New primary spray slot
    #[serde(default)]
    pub spray_slot: Option<Slot>,
    /// New primary bottle slot
    #[serde(default)]
    pub bottle_slot: Option<Slot>,
    /// Size in the primary bottle slot
    #[serde(default)]
    pub bottle_size: Option<BottleSize>,
}

impl ProductPatch {
    /// Applies the non-stock fields
    ///
    /// Stock values go through the store's `set_stock` path so reservation
    /// checks apply to them as well. Slot back-references are checked first,
    /// so a rejected patch leaves `product` untouched.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::VariantMismatch` for a back-reference to a slot of
    /// the wrong kind and `KioskError::IncompleteBottleSlot` when the bottle
    /// slot and bottle size would not both be set.
    pub fn apply_fields(&self, product: &mut Product) -> Result<()> {
        self.check_slots(product)?;

        if let Some(name) = &self.name {
            product.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            product.description.clone_from(description);
        }
        if let Some(image_url) = &self.image_url {
            product.image_url = Some(image_url.clone());
        }
        if let Some(available) = self.available {
            product.available = available;
        }
        if let Some(prices) = self.prices {
            product.prices = prices;
        }
        if let Some(slot) = self.spray_slot {
            product.spray_slot = Some(slot);
        }
        if let Some(slot) = self.bottle_slot {
            product.bottle_slot = Some(slot);
        }
        if let Some(size) = self.bottle_size {
            product.bottle_size = Some(size);
        }
        Ok(())
    }

    fn check_slots(&self, product: &Product) -> Result<()> {
        if let Some(slot) = self.spray_slot {
            if slot.kind() != SlotKind::Spray {
                return Err(KioskError::VariantMismatch { kind: slot.kind(), variant: Variant::Spray });
            }
        }

        let bottle_slot = self.bottle_slot.or(product.bottle_slot);
        let bottle_size = self.bottle_size.or(product.bottle_size);
        match (bottle_slot, bottle_size) {
            (Some(slot), Some(size)) if slot.kind() != SlotKind::Bottle => Err(KioskError::VariantMismatch {
                kind: slot.kind(),
                variant: Variant::Bottle(size),
            }),
            (Some(_), Some(_)) | (None, None) => Ok(()),
            _ => Err(KioskError::IncompleteBottleSlot),
        }
    }
}

// ============================================================================
// Slot Assignments
// ============================================================================

/// A product variant placed in a physical slot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAssignment {
    /// Store-issued id
    pub id: AssignmentId,
    /// Slot holding the product
    pub slot: Slot,
    /// Product in the slot
    pub product_id: ProductId,
    /// Variant in the slot (spray for spray slots)
    pub variant: Variant,
    /// Units this slot holds (always 1 for spray slots)
    pub slot_quantity: u32,
    /// Dispense order, lowest first
    pub priority: u32,
    /// When the assignment was made
    pub assigned_at: DateTime<Utc>,
}

impl SlotAssignment {
    /// Whether this row reserves units of `product_id` in `size`
    #[must_use]
    pub fn holds(&self, product_id: ProductId, variant: Variant) -> bool {
        self.product_id == product_id && self.variant == variant
    }
}

/// A validated request to place a variant in a slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewAssignment {
    slot: Slot,
    product_id: ProductId,
    variant: Variant,
    slot_quantity: u32,
    priority: u32,
}

impl NewAssignment {
    /// Spray tester assignment
    ///
    /// # Errors
    ///
    /// Returns `KioskError::VariantMismatch` if `slot` is not a spray slot.
    pub const fn spray(product_id: ProductId, slot: Slot, priority: u32) -> Result<Self> {
        if !matches!(slot.kind(), SlotKind::Spray) {
            return Err(KioskError::VariantMismatch { kind: slot.kind(), variant: Variant::Spray });
        }
        Ok(Self { slot, product_id, variant: Variant::Spray, slot_quantity: 1, priority })
    }

    /// Bottle assignment holding `slot_quantity` units
    ///
    /// # Errors
    ///
    /// Returns `KioskError::VariantMismatch` if `slot` is not a bottle slot and
    /// `KioskError::InvalidQuantity` if `slot_quantity` is outside `1..=20`.
    pub const fn bottle(
        product_id: ProductId,
        slot: Slot,
        bottle_size: BottleSize,
        priority: u32,
        slot_quantity: u32,
    ) -> Result<Self> {
        let variant = Variant::Bottle(bottle_size);
        if !matches!(slot.kind(), SlotKind::Bottle) {
            return Err(KioskError::VariantMismatch { kind: slot.kind(), variant });
        }
        if slot_quantity == 0 || slot_quantity > crate::allocation::MAX_SLOT_QUANTITY {
            return Err(KioskError::InvalidQuantity {
                quantity: slot_quantity,
                max: crate::allocation::MAX_SLOT_QUANTITY,
            });
        }
        Ok(Self { slot, product_id, variant, slot_quantity, priority })
    }

    /// Target slot
    #[must_use]
    pub const fn slot(&self) -> Slot {
        self.slot
    }

    /// Product being placed
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Variant being placed
    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.variant
    }

    /// Units being reserved
    #[must_use]
    pub const fn slot_quantity(&self) -> u32 {
        self.slot_quantity
    }

    /// Dispense priority
    #[must_use]
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    /// Materializes the row under a store-issued id
    #[must_use]
    pub const fn into_assignment(self, id: AssignmentId, assigned_at: DateTime<Utc>) -> SlotAssignment {
        SlotAssignment {
            id,
            slot: self.slot,
            product_id: self.product_id,
            variant: self.variant,
            slot_quantity: self.slot_quantity,
            priority: self.priority,
            assigned_at,
        }
    }
}

// ============================================================================
// Orders
// ============================================================================

/// Order lifecycle: `pending → completed | failed`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Waiting for the payment outcome
    Pending,
    /// Paid; stock has been reconciled
    Completed,
    /// Payment failed; no stock effect
    Failed,
}

impl OrderStatus {
    /// Whether no further transitions are possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer pays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Card on the terminal
    Card,
    /// UPI QR code
    Upi,
    /// Mobile wallet
    Wallet,
}

impl PaymentMethod {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Upi => "upi",
            Self::Wallet => "wallet",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "wallet" => Ok(Self::Wallet),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// One unit of one variant within an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product bought
    pub product_id: ProductId,
    /// Variant bought
    pub variant: Variant,
    /// Price at order time
    pub price: Money,
}

/// A purchase attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Store-issued id
    pub id: OrderId,
    /// One line per unit to dispense
    pub lines: Vec<LineItem>,
    /// How the customer pays
    pub payment_method: PaymentMethod,
    /// Amount charged
    pub amount: Money,
    /// Lifecycle state
    pub status: OrderStatus,
    /// When the order was created
    pub created_at: DateTime<Utc>,
    /// When the order reached a terminal state
    pub settled_at: Option<DateTime<Utc>>,
}

/// A validated order ready to be appended to the ledger
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrder {
    /// Lines to dispense
    pub lines: Vec<LineItem>,
    /// How the customer pays
    pub payment_method: PaymentMethod,
    /// Amount to charge
    pub amount: Money,
}

impl NewOrder {
    /// Materializes the pending order under a store-issued id
    #[must_use]
    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            lines: self.lines,
            payment_method: self.payment_method,
            amount: self.amount,
            status: OrderStatus::Pending,
            created_at,
            settled_at: None,
        }
    }
}

/// One bottle in a basket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketItem {
    /// Product wanted
    pub product_id: ProductId,
    /// Size wanted
    pub bottle_size: BottleSize,
}

/// Result of an order status change
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderTransition {
    /// The order moved from `pending` into the requested state
    Applied(Order),
    /// The order was already in the requested state
    Unchanged(Order),
}

impl OrderTransition {
    /// The order after the call
    #[must_use]
    pub fn into_order(self) -> Order {
        match self {
            Self::Applied(order) | Self::Unchanged(order) => order,
        }
    }
}

/// What the payment collaborator said about an order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PaymentOutcome {
    /// Money was captured
    Verified {
        /// Gateway payment reference
        payment_ref: String,
    },
    /// Payment did not go through
    Declined {
        /// Gateway explanation
        reason: String,
    },
}

// ============================================================================
// Admin Sessions & Usage
// ============================================================================

/// An authenticated dashboard session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    /// Bearer token
    pub token: SessionToken,
    /// When the session was issued
    pub created_at: DateTime<Utc>,
    /// When the token stops working
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    /// Whether the session is past its expiry at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Dispense counters for one slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUsage {
    /// Slot the counters belong to
    pub slot: Slot,
    /// Product most recently dispensed from it
    pub product_id: Option<ProductId>,
    /// Dispense events so far
    pub usage_count: u64,
    /// Last dispense
    pub last_used_at: Option<DateTime<Utc>>,
}

impl SlotUsage {
    /// Zeroed counters
    #[must_use]
    pub const fn unused(slot: Slot) -> Self {
        Self { slot, product_id: None, usage_count: 0, last_used_at: None }
    }

    /// Counts one dispense event
    pub fn record(&mut self, product_id: ProductId, at: DateTime<Utc>) {
        self.usage_count = self.usage_count.saturating_add(1);
        self.product_id = Some(product_id);
        self.last_used_at = Some(at);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_ranges() {
        assert!(Slot::spray(1).is_ok());
        assert!(Slot::spray(5).is_ok());
        assert!(Slot::spray(6).is_err());
        assert!(Slot::bottle(0).is_err());
        assert!(Slot::bottle(15).is_ok());
        assert!(Slot::bottle(16).is_err());
        assert_eq!(Slot::all(SlotKind::Bottle).count(), 15);
    }

    #[test]
    fn test_slot_deserialization_validates_range() {
        let ok: Slot = serde_json::from_str(r#"{"kind":"bottle","number":15}"#).unwrap();
        assert_eq!(ok.number(), 15);

        let bad = serde_json::from_str::<Slot>(r#"{"kind":"spray","number":9}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_variant_wire_names() {
        for variant in Variant::ALL {
            let json = serde_json::to_string(&variant).unwrap();
            assert_eq!(json, format!("\"{}\"", variant.as_str()));
            let back: Variant = serde_json::from_str(&json).unwrap();
            assert_eq!(back, variant);
        }
        assert!("250ml".parse::<Variant>().is_err());
    }

    #[test]
    fn test_default_stock_respects_ceiling() {
        let stock = StockLevels::default();
        assert_eq!(stock.get(Variant::Spray), 100);
        for size in BottleSize::ALL {
            assert!(stock.get(Variant::Bottle(size)) <= BOTTLE_STOCK_CEILING);
        }
        assert_eq!(stock.get(Variant::Bottle(BottleSize::Ml100)), 20);
    }

    #[test]
    fn test_set_stock_ceiling() {
        let mut stock = StockLevels::EMPTY;
        let err = stock.set(Variant::Bottle(BottleSize::Ml60), 25).unwrap_err();
        assert!(matches!(err, KioskError::LimitExceeded { requested: 25, limit: 20, .. }));
        assert_eq!(stock.get(Variant::Bottle(BottleSize::Ml60)), 0);

        stock.set(Variant::Bottle(BottleSize::Ml60), 20).unwrap();
        assert_eq!(stock.get(Variant::Bottle(BottleSize::Ml60)), 20);

        // Spray has no ceiling
        stock.set(Variant::Spray, 10_000).unwrap();
    }

    #[test]
    fn test_decrement_fails_closed() {
        let mut stock = StockLevels::new(1, 0, 0, 0).unwrap();
        let id = ProductId::new(1);

        stock.decrement(id, Variant::Spray, 1).unwrap();
        let err = stock.decrement(id, Variant::Spray, 1).unwrap_err();

        assert!(matches!(err, KioskError::InsufficientStock { available: 0, requested: 1, .. }));
        assert_eq!(stock.get(Variant::Spray), 0);
    }

    #[test]
    fn test_stock_draft_fills_defaults() {
        let draft = StockDraft { ml60: Some(3), ..StockDraft::default() };
        let stock = draft.resolve().unwrap();
        assert_eq!(stock.get(Variant::Bottle(BottleSize::Ml60)), 3);
        assert_eq!(stock.get(Variant::Spray), StockLevels::DEFAULT_SPRAY);

        let too_many = StockDraft { ml30: Some(21), ..StockDraft::default() };
        assert!(too_many.resolve().is_err());
    }

    #[test]
    fn test_new_assignment_validation() {
        let product = ProductId::new(1);
        let spray = Slot::spray(2).unwrap();
        let bottle = Slot::bottle(3).unwrap();

        assert!(NewAssignment::spray(product, spray, 0).is_ok());
        assert!(matches!(
            NewAssignment::spray(product, bottle, 0),
            Err(KioskError::VariantMismatch { .. })
        ));
        assert!(matches!(
            NewAssignment::bottle(product, bottle, BottleSize::Ml30, 0, 0),
            Err(KioskError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            NewAssignment::bottle(product, bottle, BottleSize::Ml30, 0, 21),
            Err(KioskError::InvalidQuantity { .. })
        ));
        assert!(NewAssignment::bottle(product, bottle, BottleSize::Ml30, 0, 20).is_ok());
    }

    #[test]
    fn test_patch_checks_slot_back_references() {
        let prices = VariantPrices {
            spray: Money::from_minor(500),
            ml30: Money::from_minor(3_000),
            ml60: Money::from_minor(5_000),
            ml100: Money::from_minor(8_000),
        };
        let mut product = NewProduct::new("Oud", prices).into_product(ProductId::new(1), Utc::now()).unwrap();
        let spray = Slot::spray(2).unwrap();
        let bottle = Slot::bottle(4).unwrap();

        let wrong_spray = ProductPatch { spray_slot: Some(bottle), name: Some("X".into()), ..ProductPatch::default() };
        assert_eq!(
            wrong_spray.apply_fields(&mut product),
            Err(KioskError::VariantMismatch { kind: SlotKind::Bottle, variant: Variant::Spray })
        );
        assert_eq!(product.name, "Oud");

        let wrong_bottle = ProductPatch {
            bottle_slot: Some(spray),
            bottle_size: Some(BottleSize::Ml30),
            ..ProductPatch::default()
        };
        assert_eq!(
            wrong_bottle.apply_fields(&mut product),
            Err(KioskError::VariantMismatch { kind: SlotKind::Spray, variant: Variant::Bottle(BottleSize::Ml30) })
        );

        let size_only = ProductPatch { bottle_size: Some(BottleSize::Ml60), ..ProductPatch::default() };
        assert_eq!(size_only.apply_fields(&mut product), Err(KioskError::IncompleteBottleSlot));
        assert_eq!(product.bottle_size, None);

        let both = ProductPatch {
            spray_slot: Some(spray),
            bottle_slot: Some(bottle),
            bottle_size: Some(BottleSize::Ml60),
            ..ProductPatch::default()
        };
        both.apply_fields(&mut product).unwrap();
        assert_eq!(product.spray_slot, Some(spray));
        assert_eq!((product.bottle_slot, product.bottle_size), (Some(bottle), Some(BottleSize::Ml60)));
    }

    #[test]
    fn test_money_display_and_sum() {
        let total: Money = [Money::from_minor(1999), Money::from_minor(1)].into_iter().sum();
        assert_eq!(total, Money::from_minor(2000));
        assert_eq!(total.to_string(), "20.00");
    }

    #[test]
    fn test_session_token_parse() {
        let token = SessionToken::generate();
        let parsed: SessionToken = token.to_string().parse().unwrap();
        assert_eq!(parsed, token);
        assert_eq!("not-a-token".parse::<SessionToken>(), Err(KioskError::SessionNotFound));
    }
}
