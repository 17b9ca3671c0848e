/// Format a dollar amount with thousands separators and cents
/// 1234.5 -> "$1,234.50", -15.0 -> "-$15.00"
pub fn format_money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = group_thousands(cents / 100);
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, dollars, cents % 100)
}

/// American odds with an explicit sign, "-" when no price was recorded
pub fn format_price(price: i32) -> String {
    if price == 0 {
        "-".to_string()
    } else {
        format!("{:+}", price)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
