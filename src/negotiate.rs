// src/negotiate.rs
/// Encodings the proxy can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    WebP,
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Best effort `Accept` negotiation. WebP whenever the client can take
    /// it (including no header at all), then JPEG, then PNG if explicitly
    /// asked for, JPEG as the last resort.
    pub fn from_accept(accept: Option<&str>) -> Self {
        let ranges: Vec<String> = match accept {
            Some(raw) if !raw.trim().is_empty() => accepted_ranges(raw),
            _ => return OutputFormat::WebP,
        };
        let accepts = |range: &str| ranges.iter().any(|r| r == range);

        if accepts("image/webp") || accepts("image/*") || accepts("*/*") {
            OutputFormat::WebP
        } else if accepts("image/jpeg") {
            OutputFormat::Jpeg
        } else if accepts("image/png") {
            OutputFormat::Png
        } else {
            OutputFormat::Jpeg
        }
    }
}

/// Lower-cased media ranges without parameters, minus those with `q=0`.
fn accepted_ranges(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|item| {
            let mut parts = item.split(';');
            let range = parts.next()?.trim().to_ascii_lowercase();
            if range.is_empty() {
                return None;
            }
            let refused = parts.any(|p| {
                p.trim()
                    .strip_prefix("q=")
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .is_some_and(|q| q <= 0.0)
            });
            (!refused).then_some(range)
        })
        .collect()
}
