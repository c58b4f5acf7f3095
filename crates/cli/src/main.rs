//! ShopHub CLI - drive a shopping session from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the local (persisted) cart
//! shophub cart show
//!
//! # Add two units of a product to the cart
//! shophub cart add --product <uuid> --name "Walnut Desk Organizer" \
//!     --price 100 --discount 10 --quantity 2 --seller <uuid>
//!
//! # Reconcile the cart against the backend (requires SHOPHUB_ACCESS_TOKEN)
//! shophub cart sync
//!
//! # Notifications
//! shophub notifications list
//! shophub notifications read <uuid>
//! shophub notifications read-all
//!
//! # Run the self-contained demo (no backend required)
//! shophub demo
//! ```
//!
//! # Commands
//!
//! - `cart` - show/mutate/sync the shopping cart
//! - `notifications` - list and mark notifications read
//! - `wishlist` - show/mutate the wishlist
//! - `session` - inspect the signed-in identity
//! - `demo` - scripted session against the in-process backend

#![cfg_attr(not(test), forbid(unsafe_code))]
// Terminal output is this binary's job.
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use shophub_core::{NotificationId, ProductId, SellerId};

mod commands;

#[derive(Parser)]
#[command(name = "shophub")]
#[command(author, version, about = "ShopHub session CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show, mutate, or sync the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// List notifications and mark them read
    Notifications {
        #[command(subcommand)]
        action: NotificationsAction,
    },
    /// Show or mutate the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Inspect the signed-in identity
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Run a scripted session against the in-process backend
    Demo,
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the local (persisted) cart with totals
    Show,
    /// Add a line to the cart (merges quantity if the product is present)
    Add {
        /// Product id (UUID)
        #[arg(long)]
        product: ProductId,

        /// Product display name
        #[arg(long)]
        name: String,

        /// Undiscounted unit price
        #[arg(long)]
        price: Decimal,

        /// Percentage discount in [0, 100]
        #[arg(long, default_value = "0")]
        discount: Decimal,

        /// Number of units
        #[arg(long, default_value = "1")]
        quantity: u32,

        /// Seller id (UUID)
        #[arg(long)]
        seller: SellerId,

        /// Product image reference
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a line from the cart
    Remove {
        /// Product id (UUID)
        #[arg(long)]
        product: ProductId,
    },
    /// Set the quantity of a line (0 removes it)
    SetQty {
        /// Product id (UUID)
        #[arg(long)]
        product: ProductId,

        /// New quantity
        #[arg(long)]
        quantity: u32,
    },
    /// Empty the cart
    Clear,
    /// Replace the local cart with the backend rows
    Sync,
}

#[derive(Subcommand)]
enum NotificationsAction {
    /// Fetch and print the recent notification history
    List,
    /// Mark one notification as read
    Read {
        /// Notification id (UUID)
        id: NotificationId,
    },
    /// Mark every notification as read
    ReadAll,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Print the wishlist
    Show,
    /// Add a product to the wishlist by id
    Add {
        /// Product id (UUID)
        #[arg(long)]
        product: ProductId,
    },
    /// Remove a product from the wishlist
    Remove {
        /// Product id (UUID)
        #[arg(long)]
        product: ProductId,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Print the signed-in identity and role
    Whoami,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show().await?,
            CartAction::Add {
                product,
                name,
                price,
                discount,
                quantity,
                seller,
                image,
            } => {
                commands::cart::add(product, name, price, discount, quantity, seller, image)
                    .await?;
            }
            CartAction::Remove { product } => commands::cart::remove(product).await?,
            CartAction::SetQty { product, quantity } => {
                commands::cart::set_quantity(product, quantity).await?;
            }
            CartAction::Clear => commands::cart::clear().await?,
            CartAction::Sync => commands::cart::sync().await?,
        },
        Commands::Notifications { action } => match action {
            NotificationsAction::List => commands::notifications::list().await?,
            NotificationsAction::Read { id } => commands::notifications::read(id).await?,
            NotificationsAction::ReadAll => commands::notifications::read_all().await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show().await?,
            WishlistAction::Add { product } => commands::wishlist::add(product).await?,
            WishlistAction::Remove { product } => commands::wishlist::remove(product).await?,
        },
        Commands::Session { action } => match action {
            SessionAction::Whoami => commands::session::whoami().await?,
        },
        Commands::Demo => commands::demo::run().await?,
    }
    Ok(())
}
