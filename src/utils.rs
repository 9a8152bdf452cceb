use chrono::{DateTime, FixedOffset};
use lazy_regex::regex;

pub const NOT_AVAILABLE: &str = "N/A";

/// Collapses whitespace runs and trims; blank input becomes `"N/A"`.
pub fn normalize<S: AsRef<str>>(s: S) -> String {
    let collapsed = regex!(r"\s+").replace_all(s.as_ref(), " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Like [`normalize`], but keeps blank input as `None`.
pub fn non_blank<S: AsRef<str>>(s: S) -> Option<String> {
    let s = normalize(s);
    (s != NOT_AVAILABLE).then_some(s)
}

/// Non-numeric and negative counts are coerced to zero.
pub fn parse_count<S: AsRef<str>>(s: S) -> u32 {
    s.as_ref().trim().parse::<u32>().unwrap_or(0)
}

pub fn get_now() -> DateTime<FixedOffset> {
    chrono::offset::Local::now().into()
}
