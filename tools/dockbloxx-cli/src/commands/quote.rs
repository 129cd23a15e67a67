//! Cart quote command.

use std::collections::HashMap;

use anyhow::{bail, Context as _, Result};
use dockbloxx_commerce::cart::{redeem_coupon, CartItem, CartStore, CartTotals};
use dockbloxx_commerce::catalog::{Product, ProductVariation};
use dockbloxx_commerce::{ProductId, VariationId};
use dockbloxx_data::WooClient;
use serde::Serialize;

use super::QuoteArgs;
use crate::context::Context;

/// One `--item` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ItemSpec {
    product_id: ProductId,
    variation_id: Option<VariationId>,
    quantity: u32,
}

fn parse_item_spec(raw: &str) -> Result<ItemSpec> {
    let (ids, quantity) = raw
        .trim()
        .split_once('=')
        .with_context(|| format!("Invalid item {:?}: expected ID[:VARIATION]=QTY", raw))?;
    let (product, variation) = match ids.split_once(':') {
        Some((product, variation)) => (product, Some(variation)),
        None => (ids, None),
    };

    let product_id: ProductId = product
        .parse()
        .with_context(|| format!("Invalid product id in {:?}", raw))?;
    let variation_id = variation
        .map(str::parse::<VariationId>)
        .transpose()
        .with_context(|| format!("Invalid variation id in {:?}", raw))?;
    let quantity: u32 = quantity
        .trim()
        .parse()
        .with_context(|| format!("Invalid quantity in {:?}", raw))?;
    if quantity == 0 {
        bail!("Quantity must be at least 1 in {:?}", raw);
    }

    Ok(ItemSpec {
        product_id,
        variation_id,
        quantity,
    })
}

#[derive(Serialize)]
struct QuoteOutput<'a> {
    items: &'a [CartItem],
    totals: CartTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    coupon_error: Option<String>,
}

/// Run the quote command.
pub async fn run(args: QuoteArgs, ctx: &Context) -> Result<()> {
    let specs = args
        .items
        .iter()
        .map(|raw| parse_item_spec(raw))
        .collect::<Result<Vec<_>>>()?;

    let woo = ctx.woo_client()?;
    let mut cart = CartStore::new(woo.currency());

    let spinner = ctx.output.spinner("Loading products");
    let built = build_cart(&mut cart, &woo, &specs).await;
    spinner.finish_and_clear();
    built?;

    let mut coupon_error = None;
    if let Some(code) = &args.coupon {
        if let Err(e) = redeem_coupon(&mut cart, woo.as_ref(), code).await {
            ctx.output.warn(&e.to_string());
            coupon_error = Some(e.to_string());
        }
    }

    let totals = cart.totals();
    if ctx.output.is_json() {
        ctx.output.json(&QuoteOutput {
            items: cart.items(),
            totals,
            coupon_error,
        });
        return Ok(());
    }

    print_quote(&cart, &totals, ctx);
    Ok(())
}

async fn build_cart(cart: &mut CartStore, woo: &WooClient, specs: &[ItemSpec]) -> Result<()> {
    let mut products: HashMap<ProductId, Product> = HashMap::new();
    let mut variations: HashMap<ProductId, Vec<ProductVariation>> = HashMap::new();

    for spec in specs {
        if !products.contains_key(&spec.product_id) {
            let product = woo
                .get_product(spec.product_id)
                .await
                .with_context(|| format!("Failed to load product {}", spec.product_id))?;
            products.insert(spec.product_id, product);
        }
        let Some(product) = products.get(&spec.product_id) else {
            continue;
        };

        let input = match spec.variation_id {
            Some(variation_id) => {
                if !variations.contains_key(&spec.product_id) {
                    let list = woo.list_variations(spec.product_id).await.with_context(|| {
                        format!("Failed to load variations of product {}", spec.product_id)
                    })?;
                    variations.insert(spec.product_id, list);
                }
                let variation = variations
                    .get(&spec.product_id)
                    .and_then(|list| list.iter().find(|v| v.id == variation_id))
                    .with_context(|| {
                        format!(
                            "Product {} has no variation {}",
                            spec.product_id, variation_id
                        )
                    })?;
                variation.to_cart_input(product, spec.quantity)
            }
            None if product.has_variations() => {
                bail!(
                    "{} is a variable product; pass {}:VARIATION=QTY",
                    product.name,
                    product.id
                );
            }
            None => product.to_cart_input(spec.quantity),
        };

        cart.add_item(input)
            .with_context(|| format!("Could not add product {} to the cart", spec.product_id))?;
    }

    Ok(())
}

fn print_quote(cart: &CartStore, totals: &CartTotals, ctx: &Context) {
    ctx.output.header("Quote");

    let widths = [5, ctx.output.name_width(), 12, 12];
    ctx.output.table_row(&["QTY", "ITEM", "UNIT", "TOTAL"], &widths);
    for (item, line) in cart.items().iter().zip(&totals.lines) {
        let total = if line.discount.is_positive() {
            format!("{} (-{})", line.total, line.discount)
        } else {
            line.total.to_string()
        };
        ctx.output.table_row(
            &[
                &line.quantity.to_string(),
                &item.name,
                &line.unit_price.to_string(),
                &total,
            ],
            &widths,
        );
    }

    ctx.output.info("");
    ctx.output.kv("items", &totals.item_count.to_string());
    ctx.output.kv("subtotal", &totals.subtotal.to_string());
    if let Some(code) = &totals.coupon_code {
        if totals.coupon_applicable {
            ctx.output.kv(&format!("discount ({})", code), &format!("-{}", totals.discount_total));
        } else {
            ctx.output
                .warn(&format!("Coupon {} no longer applies to this cart", code));
        }
    }
    ctx.output.kv("total", &totals.grand_total.to_string());
    if totals.free_shipping {
        ctx.output.success("Coupon includes free shipping");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_item() {
        assert_eq!(
            parse_item_spec("42=3").unwrap(),
            ItemSpec {
                product_id: ProductId::new(42),
                variation_id: None,
                quantity: 3,
            }
        );
    }

    #[test]
    fn test_parse_variation_item() {
        let spec = parse_item_spec(" 42:7=1 ").unwrap();
        assert_eq!(spec.variation_id, Some(VariationId::new(7)));
        assert_eq!(spec.quantity, 1);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_item_spec("42").is_err());
        assert!(parse_item_spec("abc=1").is_err());
        assert!(parse_item_spec("42:x=1").is_err());
        assert!(parse_item_spec("42=0").is_err());
        assert!(parse_item_spec("42=-1").is_err());
    }
}
