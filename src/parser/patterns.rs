use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static VERSION_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?:current\s+version|当前版本|最新版本|版本号)",
        r"\s*[:：]?\s*v\s*(\d+(?:\.\d+)*)",
    ))
    .unwrap()
});
static VERSION_BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[^a-z0-9_])v\s*(\d+(?:\.\d+)+)").unwrap());
static DATE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?:(?:last\s+)?updated(?:\s+on)?|更新时间|更新日期|最后更新)",
        r"\s*[:：]?\s*(\d{4}-\d{2}-\d{2})",
    ))
    .unwrap()
});
static DATE_BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{4}-\d{2}-\d{2})").unwrap());

/// Labelled version first, then any bare `V1.2.3`. First pattern to hit wins.
pub fn find_version(text: &str) -> Option<String> {
    [&*VERSION_LABEL_RE, &*VERSION_BARE_RE]
        .into_iter()
        .find_map(|re| re.captures(text).map(|c| normalize_version(&c[1])))
}

/// Only the bare `V1.2.3` form, for text already narrowed to one element.
pub fn find_bare_version(text: &str) -> Option<String> {
    VERSION_BARE_RE
        .captures(text)
        .map(|c| normalize_version(&c[1]))
}

/// Labelled date first, then any bare `YYYY-MM-DD` that is a real calendar day.
pub fn find_date(text: &str) -> Option<String> {
    [&*DATE_LABEL_RE, &*DATE_BARE_RE].into_iter().find_map(|re| {
        re.captures_iter(text)
            .map(|c| c[1].to_string())
            .find(|d| is_calendar_date(d))
    })
}

pub fn is_calendar_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// `4.1.29` -> `V4.1.29`; the page writes `V 4.1.29`, `v4.1.29` and so on.
fn normalize_version(digits: &str) -> String {
    format!("V{}", digits)
}
