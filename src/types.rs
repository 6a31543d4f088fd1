// src/types.rs
use serde::Deserialize;

/// `GET /?url=<string>&w=<int>&q=<int>`
///
/// `w` and `q` are kept as raw strings so junk values fall back to 0 instead
/// of rejecting the whole request.
#[derive(Debug, Default, Deserialize)]
pub struct ImageProxyQuery {
    pub url: Option<String>,
    pub w: Option<String>,
    pub q: Option<String>,
}

impl ImageProxyQuery {
    pub fn width(&self) -> u32 {
        parse_or_zero(self.w.as_deref())
    }

    /// 最大 100
    pub fn quality(&self) -> u8 {
        let q = parse_or_zero(self.q.as_deref()).min(100);
        u8::try_from(q).unwrap_or(100)
    }
}

fn parse_or_zero(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(w: Option<&str>, q: Option<&str>) -> ImageProxyQuery {
        ImageProxyQuery {
            url: Some("https://example.com/a.jpg".to_string()),
            w: w.map(str::to_string),
            q: q.map(str::to_string),
        }
    }

    #[test]
    fn numbers_parse() {
        let q = query(Some("100"), Some("80"));
        assert_eq!(q.width(), 100);
        assert_eq!(q.quality(), 80);
    }

    #[test]
    fn absent_or_junk_means_zero() {
        assert_eq!(query(None, None).width(), 0);
        assert_eq!(query(Some("wide"), Some("-3")).width(), 0);
        assert_eq!(query(Some("wide"), Some("-3")).quality(), 0);
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(query(None, Some("250")).quality(), 100);
    }
}
