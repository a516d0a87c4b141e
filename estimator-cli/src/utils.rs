use estimator_core::Locale;
use estimator_core::calculations::common::round_half_up;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a `--material` argument cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid material '{input}': expected ID or ID:QTY")]
pub struct ParseMaterialError {
    input: String,
}

/// A material picked on the command line: `ID` or `ID:QTY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialArg {
    pub id: i64,
    pub quantity: Option<i64>,
}

/// Parses `ID` or `ID:QTY`. The quantity may be zero or negative, which
/// removes the line item again.
pub fn parse_material_arg(s: &str) -> Result<MaterialArg, ParseMaterialError> {
    let err = || ParseMaterialError {
        input: s.to_string(),
    };
    let (id, quantity) = match s.trim().split_once(':') {
        Some((id, qty)) => (id, Some(qty.trim().parse().map_err(|_| err())?)),
        None => (s.trim(), None),
    };
    let id = id.trim().parse().map_err(|_| err())?;
    Ok(MaterialArg { id, quantity })
}

/// Formats a DOP amount for display.
///
/// Rounds half-up to two decimals and groups thousands with commas:
/// `es` renders `RD$1,234.56`, `en` renders `DOP 1,234.56`.
pub fn format_currency(
    amount: Decimal,
    locale: Locale,
) -> String {
    let rounded = round_half_up(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let prefix = match locale {
        Locale::Es => "RD$",
        Locale::En => "DOP ",
    };
    format!("{sign}{prefix}{}.{frac_part}", group_thousands(int_part))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
