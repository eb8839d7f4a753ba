use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::DEFAULT_CURRENCY;

pub const NOT_SPECIFIED: &str = "Not specified";

/// Formats an amount the way an en-US locale shows currency, e.g.
/// `$25,000.00`, `€1,250.50`, `¥5,000`, `-$12.00`.
///
/// A missing or zero amount yields [`NOT_SPECIFIED`].
pub fn format_currency(value: Option<Decimal>, currency: Option<&str>) -> String {
    let Some(value) = value.filter(|amount| !amount.is_zero()) else {
        return NOT_SPECIFIED.to_string();
    };

    let code = currency
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let scale = fraction_digits(&code);
    let rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let digits = format!("{:.*}", scale as usize, rounded.abs());
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits.as_str(), None),
    };

    let mut amount = group_thousands(whole);
    if let Some(fraction) = fraction {
        amount.push('.');
        amount.push_str(fraction);
    }

    match symbol(&code) {
        Some(symbol) => format!("{sign}{symbol}{amount}"),
        None => format!("{sign}{code}\u{a0}{amount}"),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn symbol(code: &str) -> Option<&'static str> {
    let symbol = match code {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "CNY" => "CN¥",
        "INR" => "₹",
        "KRW" => "₩",
        "CAD" => "CA$",
        "AUD" => "A$",
        "NZD" => "NZ$",
        "HKD" => "HK$",
        "MXN" => "MX$",
        "TWD" => "NT$",
        "BRL" => "R$",
        "ILS" => "₪",
        "VND" => "₫",
        "PHP" => "₱",
        _ => return None,
    };
    Some(symbol)
}

fn fraction_digits(code: &str) -> u32 {
    match code {
        "JPY" | "KRW" | "VND" | "CLP" | "ISK" | "PYG" | "UGX" => 0,
        _ => 2,
    }
}
