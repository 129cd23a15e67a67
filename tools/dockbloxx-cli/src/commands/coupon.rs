//! Coupon lookup command.

use anyhow::{bail, Context as _, Result};
use dockbloxx_commerce::cart::Coupon;

use super::CouponArgs;
use crate::context::Context;

/// Run the coupon command.
pub async fn run(args: CouponArgs, ctx: &Context) -> Result<()> {
    let code = args.code.trim();
    if code.is_empty() {
        bail!("Please enter a coupon code");
    }

    let woo = ctx.woo_client()?;
    let coupon = woo
        .get_coupon(code)
        .await
        .with_context(|| format!("Failed to look up coupon {:?}", code))?;
    let Some(coupon) = coupon else {
        bail!("Coupon {:?} does not exist", code);
    };

    if ctx.output.is_json() {
        ctx.output.json(&coupon);
        return Ok(());
    }

    print_coupon(&coupon, ctx);
    Ok(())
}

fn print_coupon(coupon: &Coupon, ctx: &Context) {
    ctx.output.header(&format!("Coupon {}", coupon.code));
    ctx.output.kv("discount", &coupon.value.label());
    if !coupon.description.is_empty() {
        ctx.output.kv("description", &coupon.description);
    }
    if let Some(minimum) = &coupon.minimum_spend {
        ctx.output.kv("minimum spend", &minimum.to_string());
    }
    if let Some(maximum) = &coupon.maximum_spend {
        ctx.output.kv("maximum spend", &maximum.to_string());
    }
    if let Some(expires) = &coupon.expires_at {
        ctx.output.kv("expires", &expires.format("%Y-%m-%d %H:%M UTC").to_string());
    }
    let usage = match coupon.usage_limit {
        Some(limit) => format!("{} of {}", coupon.usage_count, limit),
        None => format!("{} (unlimited)", coupon.usage_count),
    };
    ctx.output.kv("used", &usage);
    if let Some(items) = coupon.limit_usage_to_x_items {
        ctx.output.kv("item limit", &items.to_string());
    }
    if coupon.free_shipping {
        ctx.output.kv("free shipping", "yes");
    }
    if coupon.exclude_sale_items {
        ctx.output.kv("sale items", "excluded");
    }
    if !coupon.product_ids.is_empty() || !coupon.category_ids.is_empty() {
        ctx.output.kv(
            "restricted to",
            &format!(
                "{} product(s), {} category(ies)",
                coupon.product_ids.len(),
                coupon.category_ids.len()
            ),
        );
    }

    if let Err(rejection) = coupon.check_redeemable(chrono::Utc::now()) {
        ctx.output.warn(&rejection.to_string());
    }
}
