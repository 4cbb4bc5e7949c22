//! UI preference commands.

use std::io::Write;

use souk_client::Storefront;
use souk_client::preferences::Theme;

use crate::error::CliError;

pub fn show(storefront: &Storefront, out: &mut impl Write) -> Result<(), CliError> {
    let prefs = storefront.preferences();
    writeln!(out, "theme:  {}", prefs.theme())?;
    writeln!(out, "locale: {}", prefs.locale())?;
    Ok(())
}

pub fn theme(storefront: &Storefront, out: &mut impl Write, theme: Theme) -> Result<(), CliError> {
    storefront.preferences().set_theme(theme)?;
    writeln!(out, "Theme set to {theme}")?;
    Ok(())
}

pub fn locale(storefront: &Storefront, out: &mut impl Write, locale: &str) -> Result<(), CliError> {
    storefront.preferences().set_locale(locale)?;
    writeln!(out, "Locale set to {}", storefront.preferences().locale())?;
    Ok(())
}
