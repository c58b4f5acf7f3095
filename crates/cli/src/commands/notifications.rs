//! Notification commands.

use shophub_core::NotificationId;

use super::{build, require_sign_in};

fn print_notifications(store: &shophub_client::stores::NotificationsStore) {
    let items = store.items();
    if items.is_empty() {
        println!("No notifications");
        return;
    }

    println!("Notifications ({} unread):", store.unread_count());
    for n in &items {
        let marker = if n.is_read { " " } else { "*" };
        println!(
            "  {marker} [{}] {}  {}  ({})",
            n.kind,
            n.title,
            n.message,
            n.created_at.format("%Y-%m-%d %H:%M"),
        );
        println!("      id: {}", n.id);
    }
}

/// Fetch and print the recent notification history.
pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    let identity = require_sign_in(&app).await?;

    app.notifications.fetch_notifications(identity.user_id).await;
    if let Some(error) = app.notifications.last_error() {
        println!("Fetch failed: {error} (showing last-known list)");
    }
    print_notifications(&app.notifications);
    Ok(())
}

/// Mark one notification as read.
pub async fn read(id: NotificationId) -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    let identity = require_sign_in(&app).await?;

    app.notifications.fetch_notifications(identity.user_id).await;
    app.notifications.mark_as_read(id).await;
    if let Some(error) = app.notifications.last_error() {
        println!("Mark-as-read failed: {error}");
    }
    println!("{} unread", app.notifications.unread_count());
    Ok(())
}

/// Mark every notification as read.
pub async fn read_all() -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    let identity = require_sign_in(&app).await?;

    app.notifications.fetch_notifications(identity.user_id).await;
    app.notifications.mark_all_as_read().await;
    if let Some(error) = app.notifications.last_error() {
        println!("Mark-all-as-read failed: {error}");
    } else {
        println!("All notifications marked read");
    }
    Ok(())
}
