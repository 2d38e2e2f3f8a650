use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Parses a duration string into a [`Duration`].
///
/// This function takes a string in the format `1d1h1m1s` and parses it into
/// a duration. The string can contain any number of digits, followed by any
/// combination of the letters `s`, `m`, `h`, and `d` to represent seconds,
/// minutes, hours, and days, respectively.
///
/// # Arguments
/// * `input` - A string in the format `1d1h1m1s`.
///
/// # Returns
/// The parsed duration, or `None` if the input string is invalid or the
/// total overflows.
///
/// # Examples
///
/// ```
/// use clearmarkup_utils::time::parse_duration;
///
/// let window = parse_duration("1h30m").unwrap();
/// assert_eq!(window.as_secs(), 90 * 60);
/// ```
pub fn parse_duration(input: &str) -> Option<Duration> {
    let mut total: u64 = 0;
    let mut chars = input.chars().peekable();

    while chars.peek().is_some() {
        let mut number_str = String::new();
        while let Some(c) = chars.peek() {
            if c.is_ascii_digit() {
                number_str.push(chars.next()?);
            } else {
                break;
            }
        }

        if number_str.is_empty() {
            return None;
        }

        let number: u64 = number_str.parse().ok()?;
        let multiplier = match chars.next()? {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            _ => return None,
        };

        total = total.checked_add(number.checked_mul(multiplier)?)?;
    }

    Some(Duration::from_secs(total))
}

/// Seconds elapsed since the Unix epoch, saturating to zero for clocks set
/// before it.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
