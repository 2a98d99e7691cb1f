use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::sync::OnceLock;

fn years_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*yrs?").expect("valid years pattern"))
}

fn months_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*mos?").expect("valid months pattern"))
}

/// A length of time in whole years and months. `months` is always below 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DurationSpan {
    pub years: u32,
    pub months: u32,
}

impl DurationSpan {
    /// Years past `u32::MAX` are clamped to it.
    pub fn from_months(total: u64) -> Self {
        DurationSpan {
            years: u32::try_from(total / 12).unwrap_or(u32::MAX),
            months: (total % 12) as u32,
        }
    }

    pub fn total_months(&self) -> u64 {
        u64::from(self.years) * 12 + u64::from(self.months)
    }
}

impl Add for DurationSpan {
    type Output = DurationSpan;

    fn add(self, rhs: DurationSpan) -> DurationSpan {
        DurationSpan::from_months(self.total_months().saturating_add(rhs.total_months()))
    }
}

impl Sum for DurationSpan {
    fn sum<I: Iterator<Item = DurationSpan>>(iter: I) -> Self {
        DurationSpan::from_months(
            iter.map(|s| s.total_months())
                .fold(0, u64::saturating_add),
        )
    }
}

impl fmt::Display for DurationSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} yrs {} mos", self.years, self.months)
    }
}

// Exported files carry the formatted string, not the two numbers.
impl Serialize for DurationSpan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DurationSpan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(parse_duration(&text))
    }
}

/// Reads the "<N> yr(s)" and "<N> mo(s)" parts out of free text such as
/// "Jan 2021 - Present · 2 yrs 3 mos". Missing parts count as zero, numbers
/// too large to represent saturate.
pub fn parse_duration(text: &str) -> DurationSpan {
    // The captures are all digits, so a failed parse can only be overflow.
    let capture = |re: &Regex| match re.captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().parse::<u64>().unwrap_or(u64::MAX),
        None => 0,
    };
    let years = capture(years_regex());
    let months = capture(months_regex());
    DurationSpan::from_months(years.saturating_mul(12).saturating_add(months))
}

pub fn sum_durations<I>(spans: I) -> DurationSpan
where
    I: IntoIterator<Item = DurationSpan>,
{
    spans.into_iter().sum()
}

pub fn format_duration(span: &DurationSpan) -> String {
    span.to_string()
}
