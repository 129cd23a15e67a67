//! Category listing command.

use anyhow::{Context as _, Result};
use dockbloxx_commerce::catalog::Category;

use crate::context::Context;

/// Run the categories command.
pub async fn run(ctx: &Context) -> Result<()> {
    let woo = ctx.woo_client()?;

    let spinner = ctx.output.spinner("Loading categories");
    let categories = woo.list_categories().await;
    spinner.finish_and_clear();
    let mut categories = categories.context("Failed to load categories")?;
    categories.sort_by(|a, b| a.name.cmp(&b.name));

    if ctx.output.is_json() {
        ctx.output.json(&categories);
        return Ok(());
    }

    ctx.output.header(&format!("Categories ({})", categories.len()));
    for root in categories.iter().filter(|c| c.is_root()) {
        print_tree(root, &categories, 0, ctx);
    }

    Ok(())
}

fn print_tree(category: &Category, all: &[Category], depth: usize, ctx: &Context) {
    ctx.output.list_item(&format!(
        "{}{} ({}) - {} products",
        "  ".repeat(depth),
        category.name,
        category.slug,
        category.product_count
    ));
    for child in category.children(all) {
        print_tree(child, all, depth + 1, ctx);
    }
}
