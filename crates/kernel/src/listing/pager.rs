//! Pagination engine.

use super::schema::PagerConfig;

/// Resolved page window. Both numbers are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    /// Page number (1-indexed).
    pub page: u32,

    /// Items per page, capped at the resource maximum.
    pub per_page: u32,
}

impl PageSpec {
    /// Resolve raw `page` / `limit` parameters.
    ///
    /// Anything that is not a positive integer falls back to the default
    /// (page 1, the resource's default limit); the limit is then capped.
    pub fn resolve(page: Option<&str>, limit: Option<&str>, config: PagerConfig) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let max = config.max_limit.max(1);
        let requested = parse_positive(limit);

        if let Some(requested) = requested
            && requested > max
        {
            tracing::debug!(requested, capped = max, "limit exceeds maximum, capping");
        }

        let per_page = requested.unwrap_or(config.default_limit).clamp(1, max);

        Self { page, per_page }
    }

    /// Number of records before this page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    /// Take this page out of an already ordered set.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.skip()).unwrap_or(usize::MAX);
        items
            .into_iter()
            .skip(skip)
            .take(self.per_page as usize)
            .collect()
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    let value: i64 = raw?.trim().parse().ok()?;
    if value < 1 {
        return None;
    }
    Some(u32::try_from(value).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: PagerConfig = PagerConfig {
        default_limit: 25,
        max_limit: 100,
    };

    #[test]
    fn defaults_when_absent() {
        let spec = PageSpec::resolve(None, None, CONFIG);
        assert_eq!((spec.page, spec.per_page), (1, 25));
        assert_eq!(spec.skip(), 0);
    }

    #[test]
    fn invalid_inputs_fall_back() {
        for raw in ["0", "-3", "abc", "", "1.5", "NaN"] {
            let spec = PageSpec::resolve(Some(raw), Some(raw), CONFIG);
            assert_eq!(spec.page, 1, "page for {raw:?}");
            assert_eq!(spec.per_page, 25, "limit for {raw:?}");
        }
    }

    #[test]
    fn limit_is_capped() {
        let spec = PageSpec::resolve(Some("2"), Some("1000"), CONFIG);
        assert_eq!(spec.per_page, 100);
        assert_eq!(spec.skip(), 100);
    }

    #[test]
    fn bounds_hold_for_any_input() {
        let inputs = [
            None,
            Some("-1"),
            Some("0"),
            Some("1"),
            Some("99"),
            Some("100"),
            Some("101"),
            Some("99999999999"),
            Some("x"),
        ];
        for page in inputs {
            for limit in inputs {
                let spec = PageSpec::resolve(page, limit, CONFIG);
                assert!(spec.page >= 1);
                assert!((1..=CONFIG.max_limit).contains(&spec.per_page));
            }
        }
    }

    #[test]
    fn zero_max_still_yields_one() {
        let config = PagerConfig {
            default_limit: 0,
            max_limit: 0,
        };
        assert_eq!(PageSpec::resolve(None, None, config).per_page, 1);
    }

    #[test]
    fn skip_is_derived() {
        let spec = PageSpec::resolve(Some("3"), Some("20"), CONFIG);
        assert_eq!(spec.skip(), 40);
    }

    #[test]
    fn slice_takes_window() {
        let spec = PageSpec {
            page: 2,
            per_page: 2,
        };
        assert_eq!(spec.slice(vec![1, 2, 3, 4, 5]), vec![3, 4]);

        let past_end = PageSpec {
            page: 9,
            per_page: 2,
        };
        assert!(past_end.slice(vec![1, 2, 3]).is_empty());
    }
}
