//! Money conversion and display.
//!
//! The backend stores prices as integer minor units (satang, cents). Display
//! values are major units. Formatting works from the integer so the printed
//! digits are exact; only [`CurrencyFormat::format_major`] goes through a
//! float, and it rounds to the nearest minor unit first.

#[cfg(test)]
#[path = "money_test.rs"]
mod money_test;

use crate::config::{DEFAULT_CURRENCY, DEFAULT_LOCALE};

/// Minor units per major unit.
pub const MINOR_PER_MAJOR: i64 = 100;

/// Minor units to major units. No rounding.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_display(minor: i64) -> f64 {
    minor as f64 / 100.0
}

/// Major units to minor units, rounded to the nearest integer.
/// Non-finite input yields `0`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_minor_units(display: f64) -> i64 {
    if !display.is_finite() {
        return 0;
    }
    (display * 100.0).round() as i64
}

/// Separators and symbol placement for one locale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LocaleStyle {
    group: char,
    decimal: char,
    symbol_after: bool,
}

const EN_STYLE: LocaleStyle = LocaleStyle { group: ',', decimal: '.', symbol_after: false };
const DE_STYLE: LocaleStyle = LocaleStyle { group: '.', decimal: ',', symbol_after: true };
const FR_STYLE: LocaleStyle = LocaleStyle { group: '\u{202f}', decimal: ',', symbol_after: true };

/// Matched on the language subtag. `th-TH`, `en-US`, `en-GB`, `ja-JP` and
/// unknown locales all use the en-US separators.
fn locale_style(locale: &str) -> LocaleStyle {
    let tag = locale.trim().to_ascii_lowercase().replace('_', "-");
    match tag.split('-').next().unwrap_or_default() {
        "de" => DE_STYLE,
        "fr" => FR_STYLE,
        _ => EN_STYLE,
    }
}

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency {
        "THB" => Some("฿"),
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

/// Locale and ISO 4217 currency used for price display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub locale: String,
    pub currency: String,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE, DEFAULT_CURRENCY)
    }
}

impl CurrencyFormat {
    pub fn new(locale: impl Into<String>, currency: impl Into<String>) -> Self {
        Self { locale: locale.into(), currency: currency.into().trim().to_ascii_uppercase() }
    }

    fn style(&self) -> LocaleStyle {
        locale_style(&self.locale)
    }

    /// Format a minor-unit amount. `None` formats as zero.
    #[must_use]
    pub fn format_display_price(&self, minor: Option<i64>) -> String {
        let minor = minor.unwrap_or(0);
        let style = self.style();
        let abs = minor.unsigned_abs();
        let major = group_digits(abs / 100, style.group);
        let number = format!("{major}{}{:02}", style.decimal, abs % 100);
        let sign = if minor < 0 { "-" } else { "" };

        match (currency_symbol(&self.currency), style.symbol_after) {
            (Some(symbol), false) => format!("{sign}{symbol}{number}"),
            (None, false) => format!("{sign}{} {number}", self.currency),
            (Some(symbol), true) => format!("{sign}{number}\u{a0}{symbol}"),
            (None, true) => format!("{sign}{number}\u{a0}{}", self.currency),
        }
    }

    /// Format a major-unit amount, rounded to the nearest minor unit.
    #[must_use]
    pub fn format_major(&self, display: Option<f64>) -> String {
        self.format_display_price(display.map(to_minor_units))
    }

    /// Parse user-entered text such as `"฿1,234.50"` back to minor units.
    ///
    /// The currency symbol or code, whitespace, and group separators are
    /// ignored. At most two fraction digits are accepted.
    #[must_use]
    pub fn parse_display_amount(&self, raw: &str) -> Option<i64> {
        let style = self.style();
        let mut text = raw.trim().replace(&self.currency, "");
        if let Some(symbol) = currency_symbol(&self.currency) {
            text = text.replace(symbol, "");
        }
        let text: String = text.chars().filter(|c| !c.is_whitespace() && *c != style.group).collect();

        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.as_str()),
        };
        let (whole, fraction) = match digits.split_once(style.decimal) {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) || fraction.len() > 2 {
            return None;
        }

        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let fraction: i64 = format!("{fraction:0<2}").parse().ok()?;
        let magnitude = whole.checked_mul(MINOR_PER_MAJOR)?.checked_add(fraction)?;
        Some(if negative { -magnitude } else { magnitude })
    }
}

/// Insert `sep` between groups of three digits.
fn group_digits(value: u64, sep: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * sep.len_utf8());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}
