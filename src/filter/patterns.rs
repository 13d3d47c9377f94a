use regex::Regex;

/// True iff any skip pattern matches the name
#[must_use]
pub fn should_skip(name: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|p| p.is_match(name))
}

/// True iff the dataset ID is selected.
///
/// `None` patterns select everything, including datasets without an ID. Under an active
/// pattern set a missing ID is never selected.
#[must_use]
pub fn should_select(id: Option<&str>, patterns: Option<&[Regex]>) -> bool {
    match (patterns, id) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(patterns), Some(id)) => patterns.iter().any(|p| p.is_match(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(patterns: &[&str]) -> Vec<Regex> {
        patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
    }

    #[test]
    fn test_skip_matches_anywhere() {
        let skips = compile(&["Individual Files", "^Forecast"]);
        assert!(should_skip("MODIS Individual Files", &skips));
        assert!(should_skip("Forecast Model Run", &skips));
        assert!(!should_skip("Best Forecast", &skips));
        assert!(!should_skip("anything", &[]));
    }

    #[test]
    fn test_skip_everything() {
        let skips = compile(&[".*"]);
        assert!(should_skip("", &skips));
        assert!(should_skip("MODIS-Agg", &skips));
    }

    #[test]
    fn test_select_none_selects_all() {
        assert!(should_select(Some("MODIS1"), None));
        assert!(should_select(None, None));
    }

    #[test]
    fn test_select_empty_selects_nothing() {
        assert!(!should_select(Some("MODIS1"), Some(&[][..])));
    }

    #[test]
    fn test_select_by_id() {
        let selects = compile(&[".*-Agg", "MODIS3"]);
        assert!(should_select(Some("MODIS-2012-Agg"), Some(selects.as_slice())));
        assert!(should_select(Some("MODIS3"), Some(selects.as_slice())));
        assert!(!should_select(Some("MODIS1"), Some(selects.as_slice())));
        assert!(!should_select(None, Some(selects.as_slice())));
    }
}
