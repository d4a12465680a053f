//! Search filters for `mediaItems:search`.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentCategory {
    Animals,
    Arts,
    Birthdays,
    Cityscapes,
    Crafts,
    Documents,
    Fashion,
    Flowers,
    Food,
    Gardens,
    Holidays,
    Houses,
    Landmarks,
    Landscapes,
    Night,
    People,
    Performances,
    Pets,
    Receipts,
    Screenshots,
    Selfies,
    Sport,
    Travel,
    Utility,
    Weddings,
    Whiteboards,
}

impl FromStr for ContentCategory {
    type Err = ProtocolError;

    /// Accepts the wire name in any case, e.g. `landscapes` or `LANDSCAPES`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wire = serde_json::Value::String(s.trim().to_ascii_uppercase());
        serde_json::from_value(wire)
            .map_err(|_| ProtocolError::InvalidFilter(format!("unknown content category '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    AllMedia,
    Photo,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feature {
    Favorites,
}

/// Calendar date. A zero component acts as a wildcard on the service side
/// (e.g. `month: 0` matches the whole year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Date {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl Date {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        if self.year < 0 || self.year > 9999 {
            return Err(ProtocolError::InvalidDateRange(format!(
                "year {} out of range",
                self.year
            )));
        }
        if self.month > 12 {
            return Err(ProtocolError::InvalidDateRange(format!(
                "month {} out of range",
                self.month
            )));
        }
        if self.day > 31 {
            return Err(ProtocolError::InvalidDateRange(format!(
                "day {} out of range",
                self.day
            )));
        }
        Ok(())
    }
}

impl From<NaiveDate> for Date {
    fn from(d: NaiveDate) -> Self {
        Self::new(d.year(), d.month(), d.day())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: Date,
    pub end_date: Date,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_content_categories: Vec<ContentCategory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_content_categories: Vec<ContentCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dates: Vec<Date>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<DateRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_features: Vec<Feature>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTypeFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_types: Vec<MediaType>,
}

/// Combined search filter. Empty sub-filters are dropped by [`Filter::tidy`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_filter: Option<ContentFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_filter: Option<DateFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_filter: Option<FeatureFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type_filter: Option<MediaTypeFilter>,
    #[serde(default)]
    pub exclude_non_app_created_data: bool,
    #[serde(default)]
    pub include_archived_media: bool,
}

impl Filter {
    pub fn date_range(start: impl Into<Date>, end: impl Into<Date>) -> Self {
        Self {
            date_filter: Some(DateFilter {
                dates: Vec::new(),
                ranges: vec![DateRange {
                    start_date: start.into(),
                    end_date: end.into(),
                }],
            }),
            ..Self::default()
        }
    }

    pub fn categories(categories: impl IntoIterator<Item = ContentCategory>) -> Self {
        Self {
            content_filter: Some(ContentFilter {
                included_content_categories: categories.into_iter().collect(),
                excluded_content_categories: Vec::new(),
            }),
            ..Self::default()
        }
    }

    pub fn media_types(types: impl IntoIterator<Item = MediaType>) -> Self {
        Self {
            media_type_filter: Some(MediaTypeFilter {
                media_types: types.into_iter().collect(),
            }),
            ..Self::default()
        }
    }

    pub fn favorites() -> Self {
        Self {
            feature_filter: Some(FeatureFilter {
                included_features: vec![Feature::Favorites],
            }),
            ..Self::default()
        }
    }

    /// Removes sub-filters that carry no criteria.
    pub fn tidy(mut self) -> Self {
        if self
            .content_filter
            .as_ref()
            .is_some_and(|f| f.included_content_categories.is_empty() && f.excluded_content_categories.is_empty())
        {
            tracing::debug!("content filter empty, removed from request");
            self.content_filter = None;
        }
        if self
            .date_filter
            .as_ref()
            .is_some_and(|f| f.dates.is_empty() && f.ranges.is_empty())
        {
            tracing::debug!("date filter empty, removed from request");
            self.date_filter = None;
        }
        if self
            .media_type_filter
            .as_ref()
            .is_some_and(|f| f.media_types.is_empty())
        {
            tracing::debug!("media type filter empty, removed from request");
            self.media_type_filter = None;
        }
        if self
            .feature_filter
            .as_ref()
            .is_some_and(|f| f.included_features.is_empty())
        {
            tracing::debug!("feature filter empty, removed from request");
            self.feature_filter = None;
        }
        self
    }

    /// Checks date components and range ordering, and that a category is not
    /// both included and excluded.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if let Some(df) = &self.date_filter {
            if df.dates.len() > 5 || df.ranges.len() > 5 {
                return Err(ProtocolError::InvalidFilter(
                    "at most 5 dates and 5 ranges are allowed".into(),
                ));
            }
            for d in &df.dates {
                d.validate()?;
            }
            for r in &df.ranges {
                r.start_date.validate()?;
                r.end_date.validate()?;
                if r.start_date > r.end_date {
                    return Err(ProtocolError::InvalidDateRange(format!(
                        "start {}-{}-{} is after end {}-{}-{}",
                        r.start_date.year,
                        r.start_date.month,
                        r.start_date.day,
                        r.end_date.year,
                        r.end_date.month,
                        r.end_date.day
                    )));
                }
            }
        }
        if let Some(cf) = &self.content_filter {
            if let Some(c) = cf
                .included_content_categories
                .iter()
                .find(|c| cf.excluded_content_categories.contains(c))
            {
                return Err(ProtocolError::InvalidFilter(format!(
                    "{c:?} is both included and excluded"
                )));
            }
        }
        Ok(())
    }
}
