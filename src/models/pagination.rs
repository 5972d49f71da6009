use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationQuery {
    /// Maximum number of items to return (default: 50, max: 100)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
}

impl PaginationQuery {
    pub fn get_limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }

    pub fn get_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_bounds() {
        let defaults = PaginationQuery::default();
        assert_eq!(defaults.get_limit(), 50);
        assert_eq!(defaults.get_offset(), 0);

        let extreme = PaginationQuery {
            limit: Some(10_000),
            offset: Some(-5),
        };
        assert_eq!(extreme.get_limit(), 100);
        assert_eq!(extreme.get_offset(), 0);

        let zero = PaginationQuery {
            limit: Some(0),
            offset: None,
        };
        assert_eq!(zero.get_limit(), 1);
    }
}
