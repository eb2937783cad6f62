pub fn format_percent(value: f32) -> String {
    format!("{}{:.2}%", if value >= 0.0 { "+" } else { "" }, value * 100.0)
}

pub fn format_market_cap(cap: f64) -> String {
    const UNITS: [(f64, &str); 3] = [(1e12, "T"), (1e9, "B"), (1e6, "M")];

    for (threshold, suffix) in UNITS {
        if cap >= threshold {
            return format!("${:.1}{}", cap / threshold, suffix);
        }
    }
    format!("${cap:.0}")
}

pub fn format_minutes(minutes: f32) -> String {
    if minutes >= 60.0 {
        format!("{:.1}h", minutes / 60.0)
    } else {
        format!("{minutes:.0}m")
    }
}

/// Parses `#rrggbb` into RGB components. Anything else yields `None`.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_formatting_keeps_sign() {
        assert_eq!(format_percent(0.0592), "+5.92%");
        assert_eq!(format_percent(-0.0403), "-4.03%");
    }

    #[test]
    fn market_cap_picks_unit() {
        assert_eq!(format_market_cap(2.4e12), "$2.4T");
        assert_eq!(format_market_cap(31.0e9), "$31.0B");
        assert_eq!(format_market_cap(850.0e6), "$850.0M");
    }

    #[test]
    fn hex_color_round_trip() {
        assert_eq!(parse_hex_color("#f59e0b"), Some([0xf5, 0x9e, 0x0b]));
        assert_eq!(parse_hex_color("f59e0b"), None);
        assert_eq!(parse_hex_color("#xyzxyz"), None);
        assert_eq!(parse_hex_color("#fff"), None);
    }
}
