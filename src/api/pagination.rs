use serde::{Deserialize, Serialize};

pub(crate) const fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageParams {
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

impl PageParams {
    pub(crate) fn clamped(&self) -> (i64, i64) {
        (self.skip.max(0), self.limit.clamp(1, default_limit()))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

#[cfg(test)]
mod tests {
    use super::PageParams;

    #[test]
    fn clamps_out_of_range_params() {
        let params = PageParams { skip: -5, limit: 10_000 };
        assert_eq!(params.clamped(), (0, 100));

        let params = PageParams { skip: 20, limit: 0 };
        assert_eq!(params.clamped(), (20, 1));
    }
}
