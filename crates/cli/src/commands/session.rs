//! Session commands.

use super::{build, sign_in_if_configured};

/// Print the signed-in identity and role.
pub async fn whoami() -> Result<(), Box<dyn std::error::Error>> {
    let app = build()?;
    match sign_in_if_configured(&app).await? {
        Some(identity) => {
            println!("user: {}", identity.user_id);
            println!("role: {}", identity.role);
        }
        None => println!("Not signed in (set SHOPHUB_ACCESS_TOKEN)"),
    }
    Ok(())
}
