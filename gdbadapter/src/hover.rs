/// Hover tooltip support: resolves the symbol under the mouse cursor via
/// `-data-evaluate-expression`, caching the result until a different symbol
/// is hovered.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverValue {
    pub symbol: String,
    pub decimal: String,
    pub hex: String,
}

#[derive(Debug, Clone, Default)]
pub struct HoverResolver {
    cached: Option<HoverValue>,
}

impl HoverResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `symbol` differs from whatever is currently cached, i.e. a
    /// fresh `-data-evaluate-expression` is needed.
    pub fn needs_query(&self, symbol: &str) -> bool {
        self.cached.as_ref().map(|c| c.symbol != symbol).unwrap_or(true)
    }

    /// Record the evaluated value for `symbol`, formatted both ways.
    pub fn set_value(&mut self, symbol: &str, raw_value: &str) {
        let (decimal, hex) = format_dual(raw_value);
        self.cached = Some(HoverValue {
            symbol: symbol.to_string(),
            decimal,
            hex,
        });
    }

    pub fn clear(&mut self) {
        self.cached = None;
    }

    pub fn current(&self) -> Option<&HoverValue> {
        self.cached.as_ref()
    }
}

/// Format a raw evaluate-expression result as both decimal and hex when it
/// parses as an integer; otherwise hex mirrors decimal (the value is not
/// numeric, e.g. a struct dump).
fn format_dual(raw: &str) -> (String, String) {
    let trimmed = raw.trim();
    let parsed = if let Some(hex) = trimmed.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else {
        trimmed.parse::<i64>().ok()
    };

    match parsed {
        Some(n) => (n.to_string(), format!("0x{:x}", n)),
        None => (trimmed.to_string(), trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_query_true_until_a_value_is_cached() {
        let resolver = HoverResolver::new();
        assert!(resolver.needs_query("x"));
    }

    #[test]
    fn same_symbol_does_not_need_requery() {
        let mut resolver = HoverResolver::new();
        resolver.set_value("x", "42");
        assert!(!resolver.needs_query("x"));
        assert!(resolver.needs_query("y"));
    }

    #[test]
    fn decimal_value_formats_both_ways() {
        let mut resolver = HoverResolver::new();
        resolver.set_value("x", "255");
        let v = resolver.current().unwrap();
        assert_eq!(v.decimal, "255");
        assert_eq!(v.hex, "0xff");
    }

    #[test]
    fn hex_input_reparses_to_decimal() {
        let mut resolver = HoverResolver::new();
        resolver.set_value("x", "0x10");
        let v = resolver.current().unwrap();
        assert_eq!(v.decimal, "16");
    }

    #[test]
    fn non_numeric_value_passes_through_unchanged() {
        let mut resolver = HoverResolver::new();
        resolver.set_value("s", "{a = 1, b = 2}");
        let v = resolver.current().unwrap();
        assert_eq!(v.decimal, "{a = 1, b = 2}");
        assert_eq!(v.hex, "{a = 1, b = 2}");
    }
}
