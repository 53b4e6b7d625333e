//! Core data types for anime records, identities and resolver input.
//!
//! This module defines the structures shared by every component:
//!
//! - [`AnimeId`] - five cross-provider ids merged "last non-unset wins"
//! - [`AnimeResource`] - the wider set of external references merged by vote
//! - [`Anime`] - the full aggregate record, partial or canonical
//! - [`AnimeInfo`] - what the orchestrator knows before resolution starts
//! - [`AnimeDate`] - a calendar date where both `0-0-0` and `1-1-1` mean "unset"
//!
//! Every numeric id uses `0` for "unset" and every string id uses `""`.
//!
//! # Examples
//!
//! ```rust
//! use anicine::types::{AnimeDate, AnimeInfo};
//!
//! let info = AnimeInfo {
//!     title: "Frieren: Beyond Journey's End".to_string(),
//!     query: "frieren-beyond-journey-s-end".to_string(),
//!     kind: "tv".to_string(),
//!     mal_id: 52991,
//!     start_date: AnimeDate::new(2023, 9, 29),
//!     end_date: AnimeDate::default(),
//! };
//!
//! assert!(!info.start_date.is_unset());
//! assert!(info.end_date.is_unset());
//! ```

use serde::{Deserialize, Serialize};

/// Cross-provider identity bundle.
///
/// Merged sequentially: a later non-zero field always overwrites the merged
/// value, see [`merge_ids`](crate::merge::merge_ids).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimeId {
    /// MyAnimeList id
    pub mal: u32,
    /// AniList id
    pub anilist: u32,
    /// AniDB id
    pub anidb: u32,
    /// TheTVDB id
    pub tvdb: u64,
    /// TheMovieDB id
    pub tmdb: u64,
}

impl AnimeId {
    /// Returns `true` when no field is set.
    pub fn is_unset(&self) -> bool {
        *self == AnimeId::default()
    }
}

/// External references for one anime across many providers.
///
/// Unlike [`AnimeId`], these are observed on many same-confidence records and
/// merged by frequency voting, see
/// [`merge_resources`](crate::merge::merge_resources).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeResource {
    pub mal: u32,
    pub anilist: u32,
    pub anidb: u32,
    pub kitsu: String,
    pub tvdb: u64,
    pub tmdb: u64,
    pub imdb: String,
    pub anisearch: u64,
    pub livechart: u64,
    pub notify_moe: String,
    pub anime_planet: String,
    pub wikidata: String,
}

/// A calendar date as reported by providers.
///
/// Providers encode "unknown" either as all zeros or as `0001-01-01`; both forms
/// are unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimeDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl AnimeDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Returns `true` for `0-0-0` and for `1-1-1`.
    ///
    /// ```rust
    /// use anicine::types::AnimeDate;
    ///
    /// assert!(AnimeDate::new(0, 0, 0).is_unset());
    /// assert!(AnimeDate::new(1, 1, 1).is_unset());
    /// assert!(!AnimeDate::new(2001, 1, 1).is_unset());
    /// ```
    pub fn is_unset(&self) -> bool {
        (self.year == 0 && self.month == 0 && self.day == 0)
            || (self.year == 1 && self.month == 1 && self.day == 1)
    }

    /// Year and month equality, the granularity resolvers match dates at.
    pub fn same_month(&self, year: i32, month: u32) -> bool {
        !self.is_unset() && self.year == year && self.month == month
    }
}

impl From<chrono::NaiveDate> for AnimeDate {
    fn from(date: chrono::NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// Resolver input supplied once per resolution session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeInfo {
    /// Display title
    pub title: String,
    /// Normalized, dash-joined query (see [`clean_title`](crate::text::clean_title))
    pub query: String,
    /// Media type text ("tv", "movie", ...), may be empty
    pub kind: String,
    /// The trusted anchor id every candidate is cross-checked against
    pub mal_id: u32,
    pub start_date: AnimeDate,
    pub end_date: AnimeDate,
}

/// The three title sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeTitles {
    pub original: Vec<String>,
    pub official: Vec<String>,
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimePeriod {
    pub season: String,
    pub year: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeCompany {
    pub id: AnimeId,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeLink {
    pub site: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeImage {
    pub image: String,
    pub thumbnail: String,
    pub height: u32,
    pub width: u32,
}

impl AnimeImage {
    pub fn new(image: impl Into<String>, thumbnail: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            thumbnail: thumbnail.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeTrailer {
    pub is_official: bool,
    pub host_name: String,
    pub host_key: String,
}

/// A node of a relation group (a sequel, a prequel, a spin-off...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationNode {
    pub id: AnimeId,
    pub name: String,
    pub format: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Related works grouped by the nature of the relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeRelation {
    pub nature: String,
    pub nodes: Vec<RelationNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeName {
    pub full: String,
    pub native: String,
    pub alternative: Vec<String>,
    pub spoilers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    pub iso639_1: String,
}

/// A localized title and overview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaData {
    pub language: Language,
    pub title: String,
    pub overview: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceActor {
    pub id: AnimeId,
    pub name: AnimeName,
    pub language: Language,
    pub images: Vec<AnimeImage>,
    pub social_media: Vec<AnimeLink>,
    pub age: u32,
    pub gender: String,
    pub date_of_birth: AnimeDate,
    pub date_of_death: AnimeDate,
    pub home: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDescription {
    pub mal: String,
    pub anilist: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeCharacter {
    pub id: AnimeId,
    pub name: AnimeName,
    pub images: Vec<AnimeImage>,
    pub description: CharacterDescription,
    pub age: u32,
    pub gender: String,
    pub date_of_birth: AnimeDate,
    pub role: String,
    pub voice_actors: Vec<VoiceActor>,
}

/// The full aggregate record.
///
/// Scrapers and resolvers produce partial `Anime` values; the
/// [`merge`](crate::merge) engine fuses them into one canonical record. Partial
/// records are never mutated after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anime {
    #[serde(rename = "type")]
    pub kind: String,
    pub resources: AnimeResource,
    pub titles: AnimeTitles,
    pub description: String,
    #[serde(default)]
    pub metadata: Vec<MetaData>,
    pub portrait: AnimeImage,
    pub landscape: AnimeImage,
    pub status: String,
    pub content_rating: String,
    pub country_of_origin: String,
    pub period: AnimePeriod,
    pub start_date: AnimeDate,
    pub end_date: AnimeDate,
    #[serde(default)]
    pub studios: Vec<AnimeCompany>,
    #[serde(default)]
    pub producers: Vec<AnimeCompany>,
    #[serde(default)]
    pub licensors: Vec<AnimeCompany>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub relations: Vec<AnimeRelation>,
    #[serde(default)]
    pub characters: Vec<AnimeCharacter>,
    #[serde(default)]
    pub trailers: Vec<AnimeTrailer>,
    #[serde(default)]
    pub external: Vec<AnimeLink>,
    #[serde(default)]
    pub posters: Vec<AnimeImage>,
    #[serde(default)]
    pub backdrops: Vec<AnimeImage>,
    #[serde(default)]
    pub logos: Vec<AnimeImage>,
    #[serde(default)]
    pub banners: Vec<AnimeImage>,
    #[serde(default)]
    pub arts: Vec<AnimeImage>,
}

/// Countries recognized when normalizing an origin country:
/// `(name, short name, ISO 3166-1 alpha-2)`.
pub const COUNTRIES: [(&str, &str, &str); 15] = [
    ("japan", "jpn", "jp"),
    ("united-states", "usa", "us"),
    ("south-korea", "kor", "kr"),
    ("china", "chn", "cn"),
    ("india", "ind", "in"),
    ("france", "fra", "fr"),
    ("united-kingdom", "gbr", "gb"),
    ("germany", "deu", "de"),
    ("italy", "ita", "it"),
    ("canada", "can", "ca"),
    ("australia", "aus", "au"),
    ("brazil", "bra", "br"),
    ("mexico", "mex", "mx"),
    ("spain", "esp", "es"),
    ("russia", "rus", "ru"),
];

/// Translation targets, English first: `(name, ISO 639-1)`.
pub const LANGUAGES: [(&str, &str); 13] = [
    ("english", "en"),
    ("arabic", "ar"),
    ("japanese", "ja"),
    ("italian", "it"),
    ("spanish", "es"),
    ("portuguese", "pt"),
    ("russian", "ru"),
    ("german", "de"),
    ("korean", "ko"),
    ("mandarin-chinese", "zh"),
    ("hindi", "hi"),
    ("french", "fr"),
    ("thai", "th"),
];

/// Seasons and the months they cover.
pub const SEASONS: [(&str, [u32; 3]); 4] = [
    ("fall", [9, 10, 11]),
    ("winter", [12, 1, 2]),
    ("spring", [3, 4, 5]),
    ("summer", [6, 7, 8]),
];

impl Language {
    /// Builds a catalog entry from [`LANGUAGES`].
    pub fn from_catalog((name, iso): (&str, &str)) -> Self {
        Self {
            name: name.to_string(),
            iso639_1: iso.to_string(),
        }
    }
}

/// Season name for a month, `None` outside 1..=12.
pub fn season_of(month: u32) -> Option<&'static str> {
    SEASONS
        .iter()
        .find(|(_, zone)| zone.contains(&month))
        .map(|(name, _)| *name)
}
