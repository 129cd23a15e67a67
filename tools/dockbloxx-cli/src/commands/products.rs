//! Product listing command.

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use dockbloxx_commerce::listing::{Namespace, PageCache, ProductPage};
use futures::future::join_all;
use serde::Serialize;

use super::ProductsArgs;
use crate::context::Context;
use crate::output::stock_badge;

#[derive(Serialize)]
struct ListingOutput<'a> {
    namespace: String,
    total: Option<u64>,
    total_pages: Option<u32>,
    pages: Vec<&'a ProductPage>,
}

/// Run the products command.
pub async fn run(args: ProductsArgs, ctx: &Context) -> Result<()> {
    if args.page == 0 {
        bail!("Pages are numbered from 1");
    }

    let woo = ctx.woo_client()?;
    let cache = PageCache::new(woo).with_per_page(ctx.config.store.per_page);
    let namespace = match &args.category {
        Some(slug) => Namespace::category(slug.trim()),
        None => Namespace::Shop,
    };
    cache.switch_namespace(namespace.clone());

    let spinner = ctx
        .output
        .spinner(&format!("Loading {} page {}", namespace, args.page));
    let view = cache.set_current_page(args.page).await;
    spinner.finish_and_clear();

    if let Some(err) = view.error {
        return Err(err).with_context(|| format!("Failed to load {} page {}", namespace, args.page));
    }
    let Some(first) = view.page else {
        bail!("{} page {} did not load", namespace, args.page);
    };

    let mut pages = vec![first];
    pages.extend(prefetch(&cache, &args, ctx).await);

    if ctx.output.is_json() {
        ctx.output.json(&ListingOutput {
            namespace: namespace.to_string(),
            total: cache.total(),
            total_pages: cache.total_pages(),
            pages: pages.iter().map(Arc::as_ref).collect(),
        });
        return Ok(());
    }

    for page in &pages {
        print_page(page, &namespace, ctx);
    }

    Ok(())
}

/// Load the pages after `--page` concurrently. Failed pages are reported and skipped.
async fn prefetch(cache: &PageCache, args: &ProductsArgs, ctx: &Context) -> Vec<Arc<ProductPage>> {
    let last = match cache.total_pages() {
        Some(total_pages) => args
            .page
            .saturating_add(args.pages.saturating_sub(1))
            .min(total_pages),
        None => args.page,
    };
    if last <= args.page {
        return Vec::new();
    }

    let numbers: Vec<u32> = (args.page + 1..=last).collect();
    let pb = ctx.output.progress(numbers.len() as u64, "Loading pages");
    let results = join_all(numbers.iter().map(|&number| {
        let pb = pb.clone();
        async move {
            let result = cache.ensure_page(number).await;
            pb.inc(1);
            (number, result)
        }
    }))
    .await;
    pb.finish_and_clear();

    results
        .into_iter()
        .filter_map(|(number, result)| match result {
            Ok(page) => Some(page),
            Err(e) => {
                ctx.output.warn(&format!("Page {} failed: {}", number, e));
                None
            }
        })
        .collect()
}

fn print_page(page: &ProductPage, namespace: &Namespace, ctx: &Context) {
    let pagination = page.pagination();
    ctx.output.header(&format!(
        "{} - page {} of {}",
        namespace, pagination.page, pagination.total_pages
    ));

    if page.is_empty() {
        ctx.output.info("No products.");
        return;
    }

    let name_width = ctx.output.name_width();
    let widths = [8, name_width, 12, 12];
    ctx.output.table_row(&["ID", "NAME", "PRICE", "STOCK"], &widths);
    for product in &page.products {
        let price = if product.on_sale {
            format!("{}*", product.price)
        } else {
            product.price.to_string()
        };
        ctx.output.table_row(
            &[
                &product.id.to_string(),
                &product.name,
                &price,
                &stock_badge(product.stock_status),
            ],
            &widths,
        );
    }

    ctx.output.info(&format!(
        "Showing {}-{} of {} products",
        pagination.start_item(),
        pagination.end_item(),
        pagination.total
    ));
}
