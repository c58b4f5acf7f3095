//! Wishlist commands.

use shophub_client::backend::Backend;
use shophub_core::{CurrencyCode, Price, ProductId};

use super::{build, require_sign_in};

fn print_wishlist(store: &shophub_client::stores::WishlistStore) {
    let items = store.items();
    if items.is_empty() {
        println!("Wishlist is empty");
        return;
    }

    println!("Wishlist ({} items):", items.len());
    for product in &items {
        println!(
            "  {}  {}  (id: {})",
            product.name,
            Price::new(product.discounted_unit_price(), CurrencyCode::USD).display(),
            product.id,
        );
    }
}

/// Fetch and print the wishlist.
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    let identity = require_sign_in(&app).await?;

    app.wishlist.fetch_wishlist(identity.user_id).await;
    if let Some(error) = app.wishlist.last_error() {
        println!("Fetch failed: {error} (showing last-known list)");
    }
    print_wishlist(&app.wishlist);
    Ok(())
}

/// Add a product to the wishlist by id, resolving its details first.
pub async fn add(product: ProductId) -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    require_sign_in(&app).await?;

    let found = app.backend.fetch_products_by_ids(&[product]).await?;
    let Some(product) = found.into_iter().next() else {
        println!("Product {product} not found");
        return Ok(());
    };

    app.wishlist.add_item(product).await;
    print_wishlist(&app.wishlist);
    Ok(())
}

/// Remove a product from the wishlist.
pub async fn remove(product: ProductId) -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    require_sign_in(&app).await?;
    app.wishlist.remove_item(product).await;
    print_wishlist(&app.wishlist);
    Ok(())
}
