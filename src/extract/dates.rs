//! Publish-date resolution.
//!
//! Candidate strings come from four places, tried in order: JSON-LD
//! `datePublished`/`dateModified`, a `<time datetime>` attribute, a date
//! `<meta>` tag, and finally a labelled phrase in the visible text. Each
//! candidate is normalized and then tried against [`DateParser`]'s format
//! list; the first parse that succeeds wins.

use super::page::{Page, json_str};
use super::text::{clean, visible_text};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;

static TIME_TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("time[datetime]").unwrap());
static META_DATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="date"], meta[name="pubdate"]"#).unwrap());

static SPACE_BEFORE_OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([+-]\d{2}:?\d{2})$").unwrap());
static COMPACT_OFFSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"([+-]\d{2})(\d{2})$").unwrap());
static LABELLED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:Published|publishdate|datePublished|datePosted)[:\s]+(\d{1,2}/\d{1,2}/\d{4}\s+\d{1,2}:\d{2}|\w+\s+\d{1,2},\s*\d{4})",
    )
    .unwrap()
});
static VIETNAMESE_MONTH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:tháng|thg)\s*(\d{1,2})\s+(\d{1,2}),\s*(\d{4})$").unwrap());
static COMMA_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*").unwrap());

/// Offset-aware layouts, tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"];
/// Layouts without zone information; the default offset is applied.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M",
];
const MONTH_DAY_YEAR_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y"];

/// Drop whitespace in front of a trailing UTC offset and rewrite a compact
/// `+HHMM` suffix as `+HH:MM`.
///
/// `"2023-05-01T10:00 +0700"` becomes `"2023-05-01T10:00+07:00"`.
pub fn normalize_offset(raw: &str) -> String {
    let trimmed = raw.trim();
    let joined = SPACE_BEFORE_OFFSET.replace(trimmed, "$1");
    COMPACT_OFFSET.replace(&joined, "$1:$2").into_owned()
}

/// Multi-format date parser.
#[derive(Debug, Clone, Copy)]
pub struct DateParser {
    default_offset: FixedOffset,
}

impl DateParser {
    pub fn new(default_offset: FixedOffset) -> Self {
        Self { default_offset }
    }

    /// Parse a publish-date candidate in any of the layouts news sites use.
    ///
    /// `raw` is first passed through [`normalize_offset`], then tried as
    /// RFC 3339, as one of the offset-aware layouts (a trailing `Z` counts
    /// as `+00:00`), as one of the zone-less layouts, and finally as a
    /// month-name date (`May 3, 2023` or `tháng 5 03, 2023`).
    ///
    /// # Arguments
    ///
    /// * `raw` - Date string as found on the page
    ///
    /// # Returns
    ///
    /// The parsed instant. Zone-less inputs take the parser's default
    /// offset; date-only inputs are midnight at that offset. `None` when no
    /// layout fits.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let parser = DateParser::new(FixedOffset::east_opt(7 * 3600).unwrap());
    /// let dt = parser.parse("01/05/2023 10:00").unwrap();
    /// assert_eq!(dt.to_rfc3339(), "2023-05-01T10:00:00+07:00");
    /// assert!(parser.parse("yesterday").is_none());
    /// ```
    pub fn parse(&self, raw: &str) -> Option<DateTime<FixedOffset>> {
        let s = normalize_offset(raw);
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
            return Some(dt);
        }
        let with_offset = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
            Some(rest) => format!("{rest}+00:00"),
            None => s.clone(),
        };
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(&with_offset, fmt) {
                return Some(dt);
            }
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(&s, fmt) {
                return self.localize(naive);
            }
        }
        self.parse_month_day_year(&s)
    }

    fn parse_month_day_year(&self, s: &str) -> Option<DateTime<FixedOffset>> {
        let s = COMMA_SPACING.replace_all(s, ", ");
        for fmt in MONTH_DAY_YEAR_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(&s, fmt) {
                return self.localize(date.and_hms_opt(0, 0, 0)?);
            }
        }
        let caps = VIETNAMESE_MONTH_DATE.captures(&s)?;
        let month = caps[1].parse().ok()?;
        let day = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        self.localize(date.and_hms_opt(0, 0, 0)?)
    }

    fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        self.default_offset.from_local_datetime(&naive).single()
    }
}

/// One way of finding a publish date on a page.
pub type DateStrategy = fn(&Page, &DateParser) -> Option<DateTime<FixedOffset>>;

/// Date strategies in priority order.
pub const DATE_STRATEGIES: &[DateStrategy] = &[from_json_ld, from_time_tag, from_meta, from_text];

/// Run [`DATE_STRATEGIES`] until one yields a date.
pub fn resolve_publish_time(page: &Page, parser: &DateParser) -> Option<DateTime<FixedOffset>> {
    DATE_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(page, parser))
}

fn from_json_ld(page: &Page, parser: &DateParser) -> Option<DateTime<FixedOffset>> {
    page.json_ld().iter().find_map(|node| {
        let published = json_str(node, "datePublished").map(clean).unwrap_or_default();
        let candidate = if published.is_empty() {
            json_str(node, "dateModified").map(clean).unwrap_or_default()
        } else {
            published
        };
        parser.parse(&candidate)
    })
}

fn from_time_tag(page: &Page, parser: &DateParser) -> Option<DateTime<FixedOffset>> {
    page.select(&TIME_TAG)
        .filter_map(|t| t.value().attr("datetime"))
        .find_map(|raw| parser.parse(&clean(raw)))
}

fn from_meta(page: &Page, parser: &DateParser) -> Option<DateTime<FixedOffset>> {
    page.meta_content(&META_DATE)
        .and_then(|raw| parser.parse(&clean(raw)))
}

fn from_text(page: &Page, parser: &DateParser) -> Option<DateTime<FixedOffset>> {
    let text = visible_text(page.document().root_element());
    let caps = LABELLED_DATE.captures(&text)?;
    parser.parse(&caps[1])
}
