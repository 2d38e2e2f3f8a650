/// Splits `value` on `delimiter`, maps every piece through `f` and drops
/// pieces that end up empty.
///
/// # Examples
///
/// ```
/// use clearmarkup_utils::string::explode_map;
///
/// let tags = explode_map("rust, ,sql ,", ",", |s| s.trim().to_string());
/// assert_eq!(tags, vec!["rust", "sql"]);
/// ```
pub fn explode_map<F>(value: &str, delimiter: &str, f: F) -> Vec<String>
where
    F: FnMut(&str) -> String,
{
    value
        .split(delimiter)
        .map(f)
        .filter(|piece| !piece.is_empty())
        .collect()
}

const SUFFIXES: [(f64, f64, &str); 4] = [
    (900.0, 1.0, ""),
    (900_000.0, 1_000.0, "k"),
    (900_000_000.0, 1_000_000.0, "m"),
    (900_000_000_000.0, 1_000_000_000.0, "b"),
];

/// Formats a number into a short human readable form (`1.5k`, `2m`, ...).
///
/// Values below 900 are printed as they are, larger values are scaled down
/// and get one of the `k`, `m`, `b` or `t` suffixes. A fractional part made
/// only of zeroes is dropped (`1.0k` becomes `1k`) while partial fractions
/// are kept as formatted (`1.50k` stays `1.50k`).
pub fn short_number(n: f64, precision: usize) -> String {
    let (divisor, suffix) = SUFFIXES
        .iter()
        .find(|(bound, ..)| n < *bound)
        .map(|(_, divisor, suffix)| (*divisor, *suffix))
        .unwrap_or((1_000_000_000_000.0, "t"));

    let mut formatted = group_thousands(&format!("{:.*}", precision, n / divisor));

    if precision > 0 {
        let dot_zero = format!(".{}", "0".repeat(precision));
        formatted = formatted.replace(&dot_zero, "");
    }

    formatted + suffix
}

fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
