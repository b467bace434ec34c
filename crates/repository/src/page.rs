//! Limit/offset normalisation shared by both backends.

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// `None` when the page is empty by construction (`limit <= 0`).
    ///
    /// A negative offset is read as zero.
    pub(crate) fn new(limit: i64, offset: i64) -> Option<Self> {
        (limit > 0).then(|| Self {
            limit,
            offset: offset.max(0),
        })
    }

    /// Offset as the unsigned skip count the document driver expects.
    pub(crate) fn skip(self) -> u64 {
        u64::try_from(self.offset).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_limit_is_empty() {
        assert_eq!(Page::new(0, 0), None);
        assert_eq!(Page::new(-5, 0), None);
    }

    #[test]
    fn test_negative_offset_clamped() {
        let page = Page::new(2, -3);
        assert_eq!(page, Some(Page { limit: 2, offset: 0 }));
        assert_eq!(page.map(Page::skip), Some(0));
    }

    #[test]
    fn test_skip_matches_offset() {
        assert_eq!(Page::new(2, 4).map(Page::skip), Some(4));
    }
}
