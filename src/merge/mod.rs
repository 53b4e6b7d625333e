//! Fusion of partial anime records into one canonical record.
//!
//! [`merge_anime`] takes the partial records of every provider, in trust order,
//! and builds a fresh [`Anime`]. Merging is pure: inputs are never mutated and
//! nothing here fails; a field that cannot be populated stays empty.
//!
//! Each field has its own policy:
//!
//! | Field | Policy |
//! |---|---|
//! | ids of companies, characters, relation nodes | [`merge_ids`]: last non-unset wins |
//! | resources | [`merge_resources`]: most frequent value per field |
//! | images, trailers, external links | [`media`]: concatenate, deduplicate |
//! | titles | normalized union, first-seen order |
//! | description | longest normalized text |
//! | content rating, country, status | first value seen twice, else the last one |
//! | media type | most frequent value over all records, uppercased |
//! | companies, characters, relations | [`people`]: grouped by normalized key |
//!
//! Ties in frequency votes go to the value observed first.
//!
//! # Examples
//!
//! ```rust
//! use anicine::merge::merge_anime;
//! use anicine::types::Anime;
//!
//! let first = Anime { content_rating: "PG".into(), ..Default::default() };
//! let second = Anime { content_rating: "R".into(), ..Default::default() };
//! let third = Anime { content_rating: "pg".into(), ..Default::default() };
//!
//! let merged = merge_anime(&[Some(first), None, Some(second), Some(third)]);
//! assert_eq!(merged.content_rating, "pg");
//! ```

use crate::text::{clean_country, clean_overview, clean_strings, clean_tag, clean_title, clean_unicode};
use crate::types::{Anime, AnimeDate, AnimeId, AnimePeriod, AnimeResource, AnimeTitles, MetaData, season_of};

pub mod media;
pub mod people;

pub use media::{merge_externals, merge_images, merge_trailers, pick_image};
pub use people::{merge_characters, merge_companies, merge_relations, merge_voice_actors};

/// Fuses `records` in order; `None` entries are skipped.
pub fn merge_anime(records: &[Option<Anime>]) -> Anime {
    let records: Vec<&Anime> = records.iter().flatten().collect();

    let start_date = merge_dates(records.iter().map(|r| &r.start_date));
    let end_date = merge_dates(records.iter().map(|r| &r.end_date));

    Anime {
        kind: merge_kind(&records),
        resources: merge_resources(records.iter().map(|r| &r.resources)),
        titles: merge_titles(&records),
        description: merge_overview(&records),
        metadata: merge_metadata(&records),
        portrait: pick_image(records.iter().map(|r| &r.portrait)),
        landscape: pick_image(records.iter().map(|r| &r.landscape)),
        status: first_repeated(records.iter().map(|r| clean_title(&r.status))),
        content_rating: first_repeated(records.iter().map(|r| clean_title(&r.content_rating))),
        country_of_origin: first_repeated(
            records.iter().map(|r| clean_country(&r.country_of_origin)),
        ),
        period: merge_period(&records, &start_date),
        start_date,
        end_date,
        studios: merge_companies(records.iter().flat_map(|r| &r.studios)),
        producers: merge_companies(records.iter().flat_map(|r| &r.producers)),
        licensors: merge_companies(records.iter().flat_map(|r| &r.licensors)),
        genres: merge_genres(&records),
        tags: merge_tags(&records),
        relations: merge_relations(records.iter().flat_map(|r| &r.relations)),
        characters: merge_characters(records.iter().flat_map(|r| &r.characters)),
        trailers: merge_trailers(records.iter().flat_map(|r| &r.trailers)),
        external: merge_externals(records.iter().flat_map(|r| &r.external)),
        posters: merge_images(records.iter().flat_map(|r| &r.posters)),
        backdrops: merge_images(records.iter().flat_map(|r| &r.backdrops)),
        logos: merge_images(records.iter().flat_map(|r| &r.logos)),
        banners: merge_images(records.iter().flat_map(|r| &r.banners)),
        arts: merge_images(records.iter().flat_map(|r| &r.arts)),
    }
}

/// Sequential id merge: every non-zero field overwrites the accumulator.
///
/// ```rust
/// use anicine::merge::merge_ids;
/// use anicine::types::AnimeId;
///
/// let merged = merge_ids([
///     &AnimeId { mal: 5, ..Default::default() },
///     &AnimeId { anilist: 9, ..Default::default() },
///     &AnimeId { mal: 12, ..Default::default() },
/// ]);
/// assert_eq!((merged.mal, merged.anilist), (12, 9));
/// ```
pub fn merge_ids<'a>(ids: impl IntoIterator<Item = &'a AnimeId>) -> AnimeId {
    let mut merged = AnimeId::default();
    for id in ids {
        if id.mal != 0 {
            merged.mal = id.mal;
        }
        if id.anilist != 0 {
            merged.anilist = id.anilist;
        }
        if id.anidb != 0 {
            merged.anidb = id.anidb;
        }
        if id.tvdb != 0 {
            merged.tvdb = id.tvdb;
        }
        if id.tmdb != 0 {
            merged.tmdb = id.tmdb;
        }
    }
    merged
}

/// Per-field vote over same-entity observations.
///
/// Unset values do not vote. String ids are trimmed before counting.
pub fn merge_resources<'a>(resources: impl IntoIterator<Item = &'a AnimeResource>) -> AnimeResource {
    let resources: Vec<&AnimeResource> = resources.into_iter().collect();
    let numbers = |field: fn(&AnimeResource) -> u64| vote_number(resources.iter().map(|r| field(r)));

    AnimeResource {
        mal: numbers(|r| u64::from(r.mal)) as u32,
        anilist: numbers(|r| u64::from(r.anilist)) as u32,
        anidb: numbers(|r| u64::from(r.anidb)) as u32,
        kitsu: vote_text(resources.iter().map(|r| r.kitsu.as_str())),
        tvdb: numbers(|r| r.tvdb),
        tmdb: numbers(|r| r.tmdb),
        imdb: vote_text(resources.iter().map(|r| r.imdb.as_str())),
        anisearch: numbers(|r| r.anisearch),
        livechart: numbers(|r| r.livechart),
        notify_moe: vote_text(resources.iter().map(|r| r.notify_moe.as_str())),
        anime_planet: vote_text(resources.iter().map(|r| r.anime_planet.as_str())),
        wikidata: vote_text(resources.iter().map(|r| r.wikidata.as_str())),
    }
}

fn vote_number(values: impl Iterator<Item = u64>) -> u64 {
    mode(values.filter(|v| *v != 0)).unwrap_or_default()
}

fn vote_text<'a>(values: impl Iterator<Item = &'a str>) -> String {
    mode(values.map(str::trim).filter(|v| !v.is_empty()))
        .map(String::from)
        .unwrap_or_default()
}

/// Most frequent value; the first observed wins a tie.
pub(crate) fn mode<T: PartialEq>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        if best.as_ref().is_none_or(|(_, top)| count > *top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// First non-empty value observed a second time, else the last non-empty one.
///
/// ```rust
/// use anicine::merge::first_repeated;
///
/// let pick = |v: &[&str]| first_repeated(v.iter().map(|s| s.to_string()));
/// assert_eq!(pick(&["pg", "r", "pg"]), "pg");
/// assert_eq!(pick(&["pg", "r", "g"]), "g");
/// assert_eq!(pick(&[]), "");
/// ```
pub fn first_repeated(values: impl IntoIterator<Item = String>) -> String {
    let mut seen: Vec<String> = Vec::new();
    for value in values.into_iter().filter(|v| !v.is_empty()) {
        if seen.contains(&value) {
            return value;
        }
        seen.push(value);
    }
    seen.pop().unwrap_or_default()
}

fn merge_kind(records: &[&Anime]) -> String {
    mode(
        records
            .iter()
            .map(|r| clean_unicode(&r.kind))
            .filter(|kind| !kind.is_empty()),
    )
    .unwrap_or_default()
    .to_uppercase()
}

fn merge_titles(records: &[&Anime]) -> AnimeTitles {
    AnimeTitles {
        original: clean_strings(records.iter().flat_map(|r| &r.titles.original)),
        official: clean_strings(records.iter().flat_map(|r| &r.titles.official)),
        synonyms: clean_strings(records.iter().flat_map(|r| &r.titles.synonyms)),
    }
}

fn merge_overview(records: &[&Anime]) -> String {
    let mut longest = String::new();
    for overview in records.iter().map(|r| clean_overview(&r.description)) {
        if overview.chars().count() > longest.chars().count() {
            longest = overview;
        }
    }
    longest
}

// One entry per language, the first record providing it wins.
fn merge_metadata(records: &[&Anime]) -> Vec<MetaData> {
    let mut merged: Vec<MetaData> = Vec::new();
    for entry in records.iter().flat_map(|r| &r.metadata) {
        let code = &entry.language.iso639_1;
        if code.is_empty() || merged.iter().any(|m| &m.language.iso639_1 == code) {
            continue;
        }
        merged.push(entry.clone());
    }
    merged
}

fn merge_genres(records: &[&Anime]) -> Vec<String> {
    unique(records.iter().flat_map(|r| &r.genres).map(|g| clean_title(g)))
}

fn merge_tags(records: &[&Anime]) -> Vec<String> {
    unique(
        records
            .iter()
            .flat_map(|r| &r.tags)
            .map(|t| clean_title(&clean_tag(t))),
    )
}

fn unique(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for value in values {
        if !value.is_empty() && !result.contains(&value) {
            result.push(value);
        }
    }
    result
}

/// First date observed twice, else the last set date.
fn merge_dates<'a>(dates: impl Iterator<Item = &'a AnimeDate>) -> AnimeDate {
    let mut seen: Vec<AnimeDate> = Vec::new();
    for date in dates.filter(|d| !d.is_unset()) {
        if seen.contains(date) {
            return *date;
        }
        seen.push(*date);
    }
    seen.pop().unwrap_or_default()
}

fn merge_period(records: &[&Anime], start_date: &AnimeDate) -> AnimePeriod {
    let mut period = AnimePeriod::default();

    for candidate in records.iter().map(|r| &r.period) {
        if !candidate.season.is_empty() {
            period.season = candidate.season.to_lowercase();
        }
        if candidate.year != 0 {
            period.year = candidate.year;
        }
        if !period.season.is_empty() && period.year != 0 {
            return period;
        }
    }

    if period.season.is_empty() {
        if let Some(season) = season_of(start_date.month) {
            period.season = season.to_string();
        }
    }
    period
}
