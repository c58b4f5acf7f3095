//! Cart commands.

use rust_decimal::Decimal;
use shophub_core::{CartLine, CurrencyCode, Price, ProductId, SellerId};

use super::{build, sign_in_if_configured};

fn money(amount: Decimal) -> String {
    Price::new(amount, CurrencyCode::USD).display()
}

fn print_cart(cart: &shophub_client::stores::CartStore) {
    let lines = cart.lines();
    if lines.is_empty() {
        println!("Cart is empty");
        return;
    }

    println!("Cart ({} items, {}):", cart.total_items(), money(cart.total_price()));
    for line in &lines {
        let discount = if line.discount_percent.is_zero() {
            String::new()
        } else {
            format!("  ({}% off)", line.discount_percent)
        };
        println!(
            "  {}  x{}  @ {}{}  = {}",
            line.name,
            line.quantity,
            money(line.unit_price),
            discount,
            money(line.line_total()),
        );
    }
    if let Some(error) = cart.last_error() {
        println!("  (last backend error: {error})");
    }
}

/// Print the local (persisted) cart.
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    print_cart(&app.cart);
    Ok(())
}

/// Add a line; writes through to the backend when signed in.
pub async fn add(
    product: ProductId,
    name: String,
    price: Decimal,
    discount: Decimal,
    quantity: u32,
    seller: SellerId,
    image: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    sign_in_if_configured(&app).await?;

    app.cart
        .add_item(CartLine {
            product_id: product,
            name,
            unit_price: price,
            discount_percent: discount,
            quantity,
            image_ref: image,
            seller_id: seller,
        })
        .await;

    print_cart(&app.cart);
    Ok(())
}

/// Remove a line.
pub async fn remove(product: ProductId) -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    sign_in_if_configured(&app).await?;
    app.cart.remove_item(product).await;
    print_cart(&app.cart);
    Ok(())
}

/// Set a line's quantity (0 removes it).
pub async fn set_quantity(
    product: ProductId,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    sign_in_if_configured(&app).await?;
    app.cart.update_quantity(product, quantity).await;
    print_cart(&app.cart);
    Ok(())
}

/// Empty the cart.
pub async fn clear() -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    sign_in_if_configured(&app).await?;
    app.cart.clear_cart().await;
    println!("Cart cleared");
    Ok(())
}

/// Replace the local cart with the backend rows.
pub async fn sync() -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    let identity = super::require_sign_in(&app).await?;
    app.cart.sync_with_database(identity.user_id).await;
    if let Some(error) = app.cart.last_error() {
        println!("Sync failed: {error}");
    } else {
        print_cart(&app.cart);
    }
    Ok(())
}
