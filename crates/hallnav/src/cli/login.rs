//! Login command
//!
//! Sign-in is not enforced. Any submission goes straight back home.

use hallnav::LoginPage;

pub fn run(username: Option<String>) -> anyhow::Result<()> {
    let username = username.unwrap_or_default();
    if let Some(route) = LoginPage.submit(&username, "").route() {
        println!("Sign-in is not required. Continuing to {}", route);
    }
    Ok(())
}
