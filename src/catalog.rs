//! Catalog
//!
//! The read-only product table, loaded from YAML, with the collection page's
//! search, brand and price-band filters.

use std::{fmt, fs, path::Path, str::FromStr};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    cart::NewCartItem,
    favorites::NewFavorite,
    prices::{Price, PriceError},
};

pub mod customization;

pub use customization::{Customization, DiamondCarat, DiamondType, GoldCarat, UnknownOption};

/// Image shared by every catalog watch.
pub const WATCH_IMAGE: &str = "./assets/watch-1-L_BZsghZ.jpg";

const BUILTIN_CATALOG: &str = include_str!("../fixtures/catalog.yml");

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// A product's price could not be parsed
    #[error("Invalid price for {id}: {source}")]
    InvalidPrice {
        /// Product id
        id: String,

        /// Underlying price error
        source: PriceError,
    },

    /// Two products share an id
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(String),

    /// A specification value is not a plain string
    #[error("Invalid specification {label} for {id}")]
    InvalidSpecification {
        /// Product id
        id: String,

        /// Specification label
        label: String,
    },
}

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
struct CatalogFixture {
    products: Vec<ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
struct ProductFixture {
    id: String,
    name: String,
    brand: String,

    /// Price in major units (e.g. "45000")
    price: String,

    #[serde(default)]
    image: Option<String>,

    #[serde(default)]
    description: String,

    /// Label → value, in display order
    #[serde(default)]
    specifications: serde_norway::Mapping,

    #[serde(default)]
    stock: Option<String>,
}

impl TryFrom<ProductFixture> for Product {
    type Error = CatalogError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let price = Price::parse(&fixture.price)
            .and_then(Price::require_positive)
            .map_err(|source| CatalogError::InvalidPrice {
                id: fixture.id.clone(),
                source,
            })?;

        let specifications = fixture
            .specifications
            .iter()
            .map(|(label, value)| {
                let label = label.as_str().unwrap_or_default().to_string();

                match value.as_str() {
                    Some(value) if !label.is_empty() => Ok(Specification {
                        label,
                        value: value.to_string(),
                    }),
                    _ => Err(CatalogError::InvalidSpecification {
                        id: fixture.id.clone(),
                        label,
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: fixture.id,
            name: fixture.name,
            brand: fixture.brand,
            price,
            image: fixture.image.unwrap_or_else(|| WATCH_IMAGE.to_string()),
            description: fixture.description,
            specifications,
            stock: fixture.stock.unwrap_or_else(|| "In Stock".to_string()),
        })
    }
}

/// One labelled technical detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specification {
    /// e.g. "Case Size"
    pub label: String,

    /// e.g. "41mm"
    pub value: String,
}

/// A watch offered in the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Identifier
    pub id: String,

    /// Model name
    pub name: String,

    /// Manufacturer
    pub brand: String,

    /// Base price
    pub price: Price,

    /// Image path
    pub image: String,

    /// Marketing copy
    pub description: String,

    /// Technical details, in display order
    pub specifications: Vec<Specification>,

    /// Availability label
    pub stock: String,
}

impl Product {
    /// Base price plus the customization surcharge.
    pub fn customized_price(&self, customization: &Customization) -> Price {
        [self.price, customization.surcharge()].into_iter().sum()
    }

    /// A cart item for `qty` units with the given customization.
    pub fn to_cart_item(&self, qty: u32, customization: &Customization) -> NewCartItem {
        NewCartItem::new(
            self.id.clone(),
            self.customized_price(customization).to_major_f64(),
        )
        .name(self.name.clone())
        .brand(self.brand.clone())
        .image(self.image.clone())
        .qty(i64::from(qty))
    }

    /// A favorites entry for this product.
    pub fn to_favorite(&self) -> NewFavorite {
        NewFavorite {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price.to_major_f64(),
            image: self.image.clone(),
            brand: self.brand.clone(),
        }
    }

    /// Look up a specification by label.
    pub fn specification(&self, label: &str) -> Option<&str> {
        self.specifications
            .iter()
            .find(|spec| spec.label == label)
            .map(|spec| spec.value.as_str())
    }
}

/// The collection page's price filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBand {
    /// Under 10,000
    Under10k,

    /// 10,000 to 25,000 inclusive
    From10kTo25k,

    /// 25,000 to 50,000 inclusive
    From25kTo50k,

    /// Over 50,000
    Over50k,
}

impl PriceBand {
    /// Whether `price` falls in the band.
    pub fn contains(self, price: Price) -> bool {
        let ten = Price::from_major(10_000);
        let twenty_five = Price::from_major(25_000);
        let fifty = Price::from_major(50_000);

        match self {
            Self::Under10k => price < ten,
            Self::From10kTo25k => (ten..=twenty_five).contains(&price),
            Self::From25kTo50k => (twenty_five..=fifty).contains(&price),
            Self::Over50k => price > fifty,
        }
    }

    /// The filter widget's value.
    pub fn code(self) -> &'static str {
        match self {
            Self::Under10k => "0-10000",
            Self::From10kTo25k => "10000-25000",
            Self::From25kTo50k => "25000-50000",
            Self::Over50k => "50000+",
        }
    }
}

impl fmt::Display for PriceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a price band is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown price band: {0} (expected 0-10000, 10000-25000, 25000-50000 or 50000+)")]
pub struct UnknownPriceBand(pub String);

impl FromStr for PriceBand {
    type Err = UnknownPriceBand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0-10000" => Ok(Self::Under10k),
            "10000-25000" => Ok(Self::From10kTo25k),
            "25000-50000" => Ok(Self::From25kTo50k),
            "50000+" => Ok(Self::Over50k),
            other => Err(UnknownPriceBand(other.to_string())),
        }
    }
}

/// Collection page filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Case-insensitive substring of name, brand or description
    pub search: Option<String>,

    /// Exact brand
    pub brand: Option<String>,

    /// Price band
    pub price: Option<PriceBand>,
}

impl CatalogFilter {
    /// Whether `product` passes every set filter.
    pub fn matches(&self, product: &Product) -> bool {
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        let search_ok = search.is_none_or(|term| {
            [&product.name, &product.brand, &product.description]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
        });

        let brand_ok = self
            .brand
            .as_deref()
            .is_none_or(|brand| product.brand == brand);

        let price_ok = self.price.is_none_or(|band| band.contains(product.price));

        search_ok && brand_ok && price_ok
    }
}

/// The product table.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// The six watches bundled with the storefront.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the bundled table is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Parses a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] for malformed YAML, unparseable prices or
    /// duplicate ids.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(yaml)?;

        let mut products: Vec<Product> = Vec::with_capacity(fixture.products.len());

        for product in fixture.products {
            let product = Product::try_from(product)?;

            if products.iter().any(|existing| existing.id == product.id) {
                return Err(CatalogError::DuplicateProduct(product.id));
            }

            products.push(product);
        }

        Ok(Self { products })
    }

    /// Reads and parses a catalog file.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Look up a product by id.
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Every product, in table order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Distinct brands, sorted.
    pub fn brands(&self) -> Vec<&str> {
        let mut brands: Vec<&str> = self
            .products
            .iter()
            .map(|product| product.brand.as_str())
            .collect();

        brands.sort_unstable();
        brands.dedup();

        brands
    }

    /// Products passing `filter`, in table order.
    pub fn filter(&self, filter: &CatalogFilter) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|product| filter.matches(product))
            .collect()
    }
}
