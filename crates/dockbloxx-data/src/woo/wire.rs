//! WooCommerce REST v3 response bodies and their conversion into
//! storefront types.
//!
//! Prices arrive as decimal strings and are parsed straight into minor
//! units. Unset prices come through as `""`.

use crate::FetchError;
use chrono::{DateTime, NaiveDateTime, Utc};
use dockbloxx_commerce::cart::{Coupon, DiscountType, DiscountValue};
use dockbloxx_commerce::catalog::{
    Category, CategoryRef, Product, ProductAttribute, ProductImage, ProductType, ProductVariation,
    StockStatus, VariantOption,
};
use dockbloxx_commerce::checkout::{OrderReceipt, OrderStatus};
use dockbloxx_commerce::money::parse_percent_bps;
use dockbloxx_commerce::{CategoryId, CouponId, Currency, Money, OrderId, ProductId, VariationId};
use serde::Deserialize;

fn money(field: &str, value: &str, currency: Currency) -> Result<Money, FetchError> {
    Money::parse_or_zero(value, currency)
        .map_err(|e| FetchError::Parse(format!("{}: {}", field, e)))
}

/// A positive amount, or None for `""` and `"0.00"`.
fn optional_money(field: &str, value: &str, currency: Currency) -> Result<Option<Money>, FetchError> {
    let amount = money(field, value, currency)?;
    Ok(amount.is_positive().then_some(amount))
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireImage {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

impl From<WireImage> for ProductImage {
    fn from(image: WireImage) -> Self {
        ProductImage {
            src: image.src,
            alt: image.alt,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireCategoryRef {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

impl From<WireCategoryRef> for CategoryRef {
    fn from(c: WireCategoryRef) -> Self {
        CategoryRef {
            id: CategoryId::new(c.id),
            name: c.name,
            slug: c.slug,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireAttribute {
    pub name: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub variation: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireProduct {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub sale_price: String,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub stock_status: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub images: Vec<WireImage>,
    #[serde(default)]
    pub categories: Vec<WireCategoryRef>,
    #[serde(default)]
    pub attributes: Vec<WireAttribute>,
    #[serde(default)]
    pub variations: Vec<u64>,
}

impl WireProduct {
    pub fn into_product(self, currency: Currency) -> Result<Product, FetchError> {
        let price = money("price", &self.price, currency)?;
        let regular_price = match optional_money("regular_price", &self.regular_price, currency)? {
            Some(regular) => regular,
            None => price,
        };
        let sale_price = optional_money("sale_price", &self.sale_price, currency)?;

        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            slug: self.slug,
            permalink: self.permalink,
            product_type: ProductType::parse(&self.kind).unwrap_or_default(),
            price,
            regular_price,
            sale_price,
            on_sale: self.on_sale,
            stock_status: StockStatus::parse(&self.stock_status).unwrap_or_default(),
            short_description: self.short_description,
            images: self.images.into_iter().map(Into::into).collect(),
            categories: self.categories.into_iter().map(Into::into).collect(),
            attributes: self
                .attributes
                .into_iter()
                .map(|a| ProductAttribute {
                    name: a.name,
                    options: a.options,
                    variation: a.variation,
                })
                .collect(),
            variations: self.variations.into_iter().map(VariationId::new).collect(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireVariationAttribute {
    pub name: String,
    #[serde(default)]
    pub option: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireVariation {
    pub id: u64,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub stock_status: String,
    #[serde(default)]
    pub attributes: Vec<WireVariationAttribute>,
    #[serde(default)]
    pub image: Option<WireImage>,
}

impl WireVariation {
    pub fn into_variation(
        self,
        product_id: ProductId,
        currency: Currency,
    ) -> Result<ProductVariation, FetchError> {
        Ok(ProductVariation {
            id: VariationId::new(self.id),
            product_id,
            price: money("price", &self.price, currency)?,
            on_sale: self.on_sale,
            stock_status: StockStatus::parse(&self.stock_status).unwrap_or_default(),
            attributes: self
                .attributes
                .into_iter()
                .map(|a| VariantOption::new(a.name, a.option))
                .collect(),
            image: self.image.filter(|i| !i.src.is_empty()).map(Into::into),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireCategory {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<WireImage>,
    #[serde(default)]
    pub count: u64,
}

impl From<WireCategory> for Category {
    fn from(c: WireCategory) -> Self {
        Category {
            id: CategoryId::new(c.id),
            parent_id: (c.parent != 0).then(|| CategoryId::new(c.parent)),
            name: c.name,
            slug: c.slug,
            description: c.description,
            image_url: c.image.map(|i| i.src).filter(|src| !src.is_empty()),
            product_count: c.count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireCoupon {
    pub id: u64,
    pub code: String,
    #[serde(default)]
    pub amount: String,
    pub discount_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date_expires_gmt: Option<String>,
    #[serde(default)]
    pub usage_count: u32,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub product_ids: Vec<u64>,
    #[serde(default)]
    pub excluded_product_ids: Vec<u64>,
    #[serde(default)]
    pub free_shipping: bool,
    #[serde(default)]
    pub product_categories: Vec<u64>,
    #[serde(default)]
    pub excluded_product_categories: Vec<u64>,
    #[serde(default)]
    pub exclude_sale_items: bool,
    #[serde(default)]
    pub minimum_amount: String,
    #[serde(default)]
    pub maximum_amount: String,
    #[serde(default)]
    pub limit_usage_to_x_items: Option<u32>,
}

/// Parse a WooCommerce GMT timestamp (`2026-12-31T23:59:59`, no offset).
fn parse_gmt(value: &str) -> Result<DateTime<Utc>, FetchError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| FetchError::Parse(format!("date_expires_gmt {:?}: {}", value, e)))
}

impl WireCoupon {
    pub fn into_coupon(self, currency: Currency) -> Result<Coupon, FetchError> {
        let kind = DiscountType::parse(&self.discount_type).ok_or_else(|| {
            FetchError::Parse(format!("unknown discount_type {:?}", self.discount_type))
        })?;
        let value = match kind {
            DiscountType::Percent => DiscountValue::Percent {
                bps: parse_percent_bps(&self.amount)
                    .map_err(|e| FetchError::Parse(format!("amount: {}", e)))?,
            },
            DiscountType::FixedCart => DiscountValue::FixedCart {
                amount: money("amount", &self.amount, currency)?,
            },
            DiscountType::FixedProduct => DiscountValue::FixedProduct {
                amount: money("amount", &self.amount, currency)?,
            },
        };
        let expires_at = match self.date_expires_gmt.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(parse_gmt(s)?),
            _ => None,
        };

        Ok(Coupon {
            id: CouponId::new(self.id),
            code: self.code,
            description: self.description,
            value,
            free_shipping: self.free_shipping,
            expires_at,
            usage_count: self.usage_count,
            usage_limit: self.usage_limit,
            minimum_spend: optional_money("minimum_amount", &self.minimum_amount, currency)?,
            maximum_spend: optional_money("maximum_amount", &self.maximum_amount, currency)?,
            product_ids: self.product_ids.into_iter().map(ProductId::new).collect(),
            excluded_product_ids: self
                .excluded_product_ids
                .into_iter()
                .map(ProductId::new)
                .collect(),
            category_ids: self
                .product_categories
                .into_iter()
                .map(CategoryId::new)
                .collect(),
            excluded_category_ids: self
                .excluded_product_categories
                .into_iter()
                .map(CategoryId::new)
                .collect(),
            exclude_sale_items: self.exclude_sale_items,
            limit_usage_to_x_items: self.limit_usage_to_x_items.filter(|n| *n > 0),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireOrder {
    pub id: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub order_key: String,
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub currency: String,
}

impl WireOrder {
    pub fn into_receipt(self, fallback: Currency) -> Result<OrderReceipt, FetchError> {
        let currency = Currency::from_code(&self.currency).unwrap_or(fallback);
        Ok(OrderReceipt {
            id: OrderId::new(self.id),
            status: OrderStatus::parse(&self.status).unwrap_or_default(),
            order_key: self.order_key,
            total: money("total", &self.total, currency)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PRODUCT: &str = r#"{
        "id": 812,
        "name": "Dock Bloxx Cup Holder",
        "slug": "dock-bloxx-cup-holder",
        "permalink": "https://dockbloxx.test/product/dock-bloxx-cup-holder/",
        "type": "simple",
        "status": "publish",
        "price": "24.99",
        "regular_price": "29.99",
        "sale_price": "24.99",
        "on_sale": true,
        "stock_status": "instock",
        "short_description": "<p>Holds two cups.</p>",
        "images": [{"id": 1, "src": "https://dockbloxx.test/cup.jpg", "alt": "Cup holder"}],
        "categories": [{"id": 17, "name": "Accessories", "slug": "accessories"}],
        "attributes": [{"id": 0, "name": "Color", "options": ["Black", "White"], "variation": false}],
        "variations": []
    }"#;

    #[test]
    fn test_product_conversion() {
        let wire: WireProduct = serde_json::from_str(PRODUCT).unwrap();
        let product = wire.into_product(Currency::USD).unwrap();

        assert_eq!(product.id, ProductId::new(812));
        assert_eq!(product.price.amount_cents, 2499);
        assert_eq!(product.regular_price.amount_cents, 2999);
        assert_eq!(product.sale_price.map(|m| m.amount_cents), Some(2499));
        assert_eq!(product.product_type, ProductType::Simple);
        assert!(product.in_category("accessories"));
        assert_eq!(product.categories[0].id, CategoryId::new(17));
        assert_eq!(product.attributes[0].options.len(), 2);
        assert!(product.is_purchasable());
    }

    #[test]
    fn test_product_blank_prices() {
        let wire: WireProduct = serde_json::from_str(
            r#"{"id": 5, "name": "Quote only", "price": "", "regular_price": "", "sale_price": ""}"#,
        )
        .unwrap();
        let product = wire.into_product(Currency::USD).unwrap();
        assert!(product.price.is_zero());
        assert!(product.sale_price.is_none());
        assert_eq!(product.stock_status, StockStatus::InStock);
    }

    #[test]
    fn test_bad_price_is_parse_error() {
        let wire: WireProduct =
            serde_json::from_str(r#"{"id": 5, "name": "Bad", "price": "twelve"}"#).unwrap();
        assert!(matches!(
            wire.into_product(Currency::USD),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn test_variation_conversion() {
        let wire: WireVariation = serde_json::from_str(
            r#"{
                "id": 901,
                "price": "149.00",
                "stock_status": "onbackorder",
                "attributes": [{"id": 1, "name": "Length", "option": "48in"}],
                "image": {"id": 0, "src": "", "alt": ""}
            }"#,
        )
        .unwrap();
        let variation = wire.into_variation(ProductId::new(900), Currency::USD).unwrap();
        assert_eq!(variation.price.amount_cents, 14900);
        assert_eq!(variation.attributes, vec![VariantOption::new("Length", "48in")]);
        assert_eq!(variation.stock_status, StockStatus::OnBackorder);
        assert!(variation.image.is_none());
    }

    #[test]
    fn test_category_conversion() {
        let wire: WireCategory = serde_json::from_str(
            r#"{"id": 17, "name": "Accessories", "slug": "accessories", "parent": 0,
                "description": "", "image": null, "count": 14}"#,
        )
        .unwrap();
        let category = Category::from(wire);
        assert!(category.is_root());
        assert_eq!(category.product_count, 14);
        assert!(category.image_url.is_none());
    }

    #[test]
    fn test_percent_coupon_conversion() {
        let wire: WireCoupon = serde_json::from_str(
            r#"{
                "id": 44,
                "code": "summer15",
                "amount": "15.00",
                "discount_type": "percent",
                "date_expires_gmt": "2026-12-31T23:59:59",
                "usage_count": 3,
                "usage_limit": 100,
                "product_categories": [17],
                "minimum_amount": "50.00",
                "maximum_amount": "0.00",
                "limit_usage_to_x_items": null
            }"#,
        )
        .unwrap();
        let coupon = wire.into_coupon(Currency::USD).unwrap();

        assert_eq!(coupon.value, DiscountValue::Percent { bps: 1500 });
        assert_eq!(coupon.minimum_spend.map(|m| m.amount_cents), Some(5000));
        assert!(coupon.maximum_spend.is_none());
        assert_eq!(coupon.category_ids, vec![CategoryId::new(17)]);
        assert_eq!(
            coupon.expires_at,
            Some(Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap())
        );
        assert_eq!(coupon.usage_limit, Some(100));
    }

    #[test]
    fn test_fixed_coupon_conversion() {
        let wire: WireCoupon = serde_json::from_str(
            r#"{"id": 45, "code": "DOCK10", "amount": "10.00", "discount_type": "fixed_cart",
                "date_expires_gmt": null, "minimum_amount": "", "free_shipping": true,
                "individual_use": true}"#,
        )
        .unwrap();
        let coupon = wire.into_coupon(Currency::USD).unwrap();
        assert_eq!(
            coupon.value,
            DiscountValue::FixedCart {
                amount: Money::new(1000, Currency::USD)
            }
        );
        assert!(coupon.free_shipping);
        assert!(coupon.expires_at.is_none());
        assert!(coupon.minimum_spend.is_none());
    }

    #[test]
    fn test_unknown_discount_type() {
        let wire: WireCoupon = serde_json::from_str(
            r#"{"id": 46, "code": "x", "amount": "5", "discount_type": "sign_up_fee"}"#,
        )
        .unwrap();
        assert!(wire.into_coupon(Currency::USD).is_err());
    }

    #[test]
    fn test_order_receipt() {
        let wire: WireOrder = serde_json::from_str(
            r#"{"id": 5001, "status": "pending", "order_key": "wc_order_abc",
                "total": "25.99", "currency": "USD"}"#,
        )
        .unwrap();
        let receipt = wire.into_receipt(Currency::EUR).unwrap();
        assert_eq!(receipt.id, OrderId::new(5001));
        assert_eq!(receipt.status, OrderStatus::Pending);
        assert_eq!(receipt.total, Money::new(2599, Currency::USD));
    }
}
