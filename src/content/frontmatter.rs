//! Front-matter parsing

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use super::ContentError;

/// Marker line that opens and closes a YAML block
const YAML_MARKER: &str = "---";
/// Marker line that opens and closes a JSON block
const JSON_MARKER: &str = ";;;";

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<Scalar>()? {
                vec.push(item.0);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// A scalar front-matter value read as text (`title: 2024` is a title too)
struct Scalar(String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
                Ok(Scalar(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|s| s.0))
}

/// Front-matter data from a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(
        deserialize_with = "optional_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        deserialize_with = "optional_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,
    #[serde(deserialize_with = "string_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// Unrecognized keys, kept in source order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// Which marker delimited the block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatterFormat {
    Yaml,
    Json,
}

impl MatterFormat {
    fn from_marker(line: &str) -> Option<Self> {
        match line.trim_end() {
            YAML_MARKER => Some(MatterFormat::Yaml),
            JSON_MARKER => Some(MatterFormat::Json),
            _ => None,
        }
    }

    fn marker(self) -> &'static str {
        match self {
            MatterFormat::Yaml => YAML_MARKER,
            MatterFormat::Json => JSON_MARKER,
        }
    }
}

/// Raw front-matter block and the body that follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    pub format: MatterFormat,
    pub matter: &'a str,
    pub body: &'a str,
}

/// Opening line of a fenced code block, as (fence char, fence length)
fn fence_open(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let ch = trimmed.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }
    let len = trimmed.chars().take_while(|&c| c == ch).count();
    (len >= 3).then_some((ch, len))
}

/// Whether `line` closes a fence opened with `fence`
fn fence_closes(line: &str, fence: (char, usize)) -> bool {
    let trimmed = line.trim();
    let len = trimmed.chars().take_while(|&c| c == fence.0).count();
    len >= fence.1 && trimmed.chars().all(|c| c == fence.0)
}

/// Split a source into its front-matter block and body.
///
/// The first non-blank line must be a marker. The block ends at the next line
/// equal to the same marker, starting at column 0; marker lines inside fenced
/// code never count.
pub fn split<'a>(name: &str, content: &'a str) -> Result<Split<'a>, ContentError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut offset = 0;
    let mut format = None;
    for line in content.split_inclusive('\n') {
        offset += line.len();
        if line.trim().is_empty() {
            continue;
        }
        format = MatterFormat::from_marker(line);
        break;
    }
    let format = format.ok_or_else(|| ContentError::MissingFrontMatter {
        name: name.to_string(),
    })?;

    let matter_start = offset;
    let mut fence: Option<(char, usize)> = None;
    for line in content[matter_start..].split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if let Some(open) = fence {
            if fence_closes(line, open) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = fence_open(line) {
            fence = Some(open);
            continue;
        }
        // Indented marker lines belong to YAML block scalars
        if line.trim_end() == format.marker() {
            return Ok(Split {
                format,
                matter: &content[matter_start..line_start],
                body: &content[offset..],
            });
        }
    }

    Err(ContentError::MalformedFrontMatter {
        name: name.to_string(),
        reason: format!("no closing `{}` line", format.marker()),
    })
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, body)
    pub fn parse<'a>(name: &str, content: &'a str) -> Result<(Self, &'a str), ContentError> {
        let split = split(name, content)?;
        let malformed = |reason: String| ContentError::MalformedFrontMatter {
            name: name.to_string(),
            reason,
        };

        if split.matter.trim().is_empty() {
            return Ok((FrontMatter::default(), split.body));
        }

        let fm = match split.format {
            MatterFormat::Yaml => serde_yaml::from_str::<FrontMatter>(split.matter)
                .map_err(|e| malformed(e.to_string()))?,
            MatterFormat::Json => serde_json::from_str::<FrontMatter>(split.matter)
                .map_err(|e| malformed(e.to_string()))?,
        };

        Ok((fm, split.body))
    }

    /// Serialize back into a `---` delimited YAML block, closing newline included
    pub fn render(&self) -> String {
        let yaml = match serde_yaml::to_string(self) {
            Ok(yaml) => yaml,
            Err(e) => {
                tracing::warn!("Failed to serialize front-matter: {}", e);
                String::new()
            }
        };
        let yaml = if yaml.trim() == "{}" { "" } else { yaml.as_str() };
        format!("{YAML_MARKER}\n{yaml}{YAML_MARKER}\n")
    }
}

/// Parse a front-matter date.
///
/// Values carrying an offset keep it; naive values are read as wall-clock time
/// in `tz`. Returns `None` for anything that is not a real calendar instant.
pub fn parse_date(value: &str, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let s = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    let offset_formats = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S %z"];
    for fmt in offset_formats {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    let naive = datetime_formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            ["%Y-%m-%d", "%Y/%m/%d"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}
