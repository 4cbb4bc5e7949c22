//! Sign-in, registration and sign-out.

use std::io::Write;

use secrecy::SecretString;
use souk_client::Storefront;

use crate::error::CliError;

pub async fn login(
    storefront: &Storefront,
    out: &mut impl Write,
    email: &str,
    password: String,
) -> Result<(), CliError> {
    let user = storefront
        .login(email, &SecretString::from(password))
        .await?;
    writeln!(out, "Signed in as {} <{}>", user.name, user.email)?;
    writeln!(out, "{} item(s) in cart", storefront.cart().item_count().await)?;
    Ok(())
}

pub async fn register(
    storefront: &Storefront,
    out: &mut impl Write,
    name: &str,
    email: &str,
    password: String,
) -> Result<(), CliError> {
    let user = storefront
        .register(name, email, &SecretString::from(password))
        .await?;
    writeln!(out, "Welcome, {}! Your account is ready", user.name)?;
    Ok(())
}

pub async fn logout(storefront: &Storefront, out: &mut impl Write) -> Result<(), CliError> {
    storefront.logout().await;
    writeln!(out, "Signed out")?;
    Ok(())
}

pub fn whoami(storefront: &Storefront, out: &mut impl Write) -> Result<(), CliError> {
    match storefront.user() {
        Some(user) => {
            write!(out, "{} <{}>", user.name, user.email)?;
            if let Some(role) = user.role {
                write!(out, " ({role})")?;
            }
            writeln!(out)?;
        }
        None => writeln!(out, "Not signed in")?,
    }
    Ok(())
}
