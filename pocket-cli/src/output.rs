//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table, ContentArrangement};
use rust_decimal::Decimal;

use pocket_core::TransactionType;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format an amount with thousands separators, e.g. `53,000.00 TL`
pub fn format_amount(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}{}.{} TL", sign, grouped, cents)
}

/// Amount with a direction marker, coloured for the terminal
pub fn signed_amount(amount: Decimal, kind: TransactionType) -> String {
    match kind {
        TransactionType::Incoming => format!("+{}", format_amount(amount)).green().to_string(),
        TransactionType::Outgoing => format!("-{}", format_amount(amount)).red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_groups_thousands() {
        assert_eq!(format_amount(Decimal::new(53000, 0)), "53,000.00 TL");
        assert_eq!(format_amount(Decimal::new(123456789, 2)), "1,234,567.89 TL");
        assert_eq!(format_amount(Decimal::new(5, 1)), "0.50 TL");
        assert_eq!(format_amount(Decimal::new(-1000, 0)), "-1,000.00 TL");
    }
}
