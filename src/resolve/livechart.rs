use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate};
use scraper::{Html, Selector};

use crate::{
    error::{Error, Result},
    net::{Request, RetrievalClient, html},
    resolve::{Candidate, Provider, Session},
    similarity::token_score,
    text::{clean_query, clean_title, extract_aid, extract_anime_path, extract_num},
    types::{AnimeInfo, AnimeResource},
};

/// Minimum [`token_score`] between a search result's romaji title and the query.
const SEARCH_THRESHOLD: f64 = 50.0;

/// LiveChart.me resolver.
///
/// Search cards carry the premiere as a unix timestamp; a card is accepted on
/// year and month equality with the anchor's start date, or on the romaji title
/// scoring at least 50 against the query. The detail page must show a premiere
/// in the same month and link back to the anchor's MyAnimeList entry.
pub struct LiveChartResolver {
    client: RetrievalClient,
}

impl LiveChartResolver {
    pub fn new(client: RetrievalClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider for LiveChartResolver {
    fn id(&self) -> &'static str {
        "livechart"
    }

    fn name(&self) -> &'static str {
        "LiveChart.me"
    }

    fn base_url(&self) -> &str {
        "https://www.livechart.me"
    }

    fn known_id(&self, resource: &AnimeResource) -> Option<String> {
        (resource.livechart != 0).then(|| resource.livechart.to_string())
    }

    async fn search(&self, session: &Session) -> Result<Vec<Candidate>> {
        let url = format!(
            "{}/search?q={}",
            self.base_url(),
            clean_query(&urlencoding::encode(&session.info.query))
        );
        let mut request = Request::parse(&url)?;
        let body = self.client.get_text(&session.cancel, &mut request).await?;

        Ok(parse_search(&body, &session.info))
    }

    async fn check(&self, session: &Session, id: &str) -> Result<AnimeResource> {
        let livechart: u64 = id
            .parse()
            .map_err(|_| Error::bad_data(format!("livechart id {id:?} is not numeric")))?;

        let url = format!("{}/anime/{}", self.base_url(), livechart);
        let mut request = Request::parse(&url)?.with_header("Authority", "www.livechart.me");
        let body = self.client.get_text(&session.cancel, &mut request).await?;

        parse_detail(&body, livechart, &session.info)
    }
}

fn parse_search(body: &str, info: &AnimeInfo) -> Vec<Candidate> {
    let document = html::parse(body);

    html::parse_items(&document, ".anime-list li", |item| {
        let id = html::element_attr(item, "li", "data-anime-id")?;
        let title = html::element_attr(item, "li", "data-romaji").unwrap_or_default();

        let premiere = html::element_attr(item, "li", "data-premiere")
            .and_then(|value| value.parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        let same_month = premiere.is_some_and(|date| info.start_date.same_month(date.year(), date.month()));
        let similar = token_score(&clean_title(&title), &info.query) >= SEARCH_THRESHOLD;

        (same_month || similar).then_some(Candidate { id, title })
    })
}

fn parse_detail(body: &str, livechart: u64, info: &AnimeInfo) -> Result<AnimeResource> {
    let document = html::parse(body);

    let confirmed = premiere_dates(&document)
        .iter()
        .any(|date| info.start_date.same_month(date.year(), date.month()));
    if !confirmed {
        return Err(Error::not_found(format!(
            "livechart {livechart}: no premiere in {}-{:02}",
            info.start_date.year, info.start_date.month
        )));
    }

    let mal = link_num(&document, ".lc-btn-myanimelist");
    if mal != u64::from(info.mal_id) {
        return Err(Error::bad_data(format!(
            "livechart {livechart}: links myanimelist {mal}, expected {}",
            info.mal_id
        )));
    }

    let kitsu = link_num(&document, ".lc-btn-kitsu");

    Ok(AnimeResource {
        mal: info.mal_id,
        anilist: u32::try_from(link_num(&document, ".lc-btn-anilist")).unwrap_or_default(),
        anidb: html::select_attr(&document, ".lc-btn-anidb", "href")
            .map(|href| anidb_id(&href))
            .unwrap_or_default(),
        anisearch: link_num(&document, ".lc-btn-anisearch"),
        kitsu: if kitsu != 0 { kitsu.to_string() } else { String::new() },
        anime_planet: html::select_attr(&document, ".lc-btn-animeplanet", "href")
            .map(|href| extract_anime_path(&format!("{href}/")))
            .unwrap_or_default(),
        livechart,
        ..Default::default()
    })
}

/// Premiere dates shown in the poster column.
///
/// The link text is a long-form date; its `/schedule?date=` target is the
/// fallback when the text does not parse.
fn premiere_dates(document: &Html) -> Vec<NaiveDate> {
    let Ok(selector) = Selector::parse(".lc-poster-col .text-sm .link-hover") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            if !href.contains("date") {
                return None;
            }
            let text = link.text().collect::<String>();
            let text = text.trim();
            if text.is_empty() {
                return None;
            }

            NaiveDate::parse_from_str(text, "%B %d, %Y")
                .or_else(|_| NaiveDate::parse_from_str(href.trim_start_matches("/schedule?date="), "%Y-%m-%d"))
                .ok()
        })
        .collect()
}

/// Numeric id in the `anime/<id>` segment of a button link, `0` when absent.
fn link_num(document: &Html, selector: &str) -> u64 {
    html::select_attr(document, selector, "href")
        .map(|href| extract_num(&extract_anime_path(&format!("{href}/"))))
        .unwrap_or_default()
}

/// AniDB links come as `?aid=`, `/a<id>` or `/anime/<id>`.
fn anidb_id(href: &str) -> u32 {
    if let Some(aid) = extract_aid(href) {
        return aid;
    }

    let path = href
        .trim_start_matches("https://anidb.net/")
        .trim_start_matches("http://anidb.net/");
    let first = path.split('/').next().unwrap_or_default();
    let id = match extract_num(first) {
        0 => extract_num(href.trim_end_matches('/').rsplit('/').next().unwrap_or_default()),
        id => id,
    };
    u32::try_from(id).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnimeDate;

    #[test]
    fn test_anidb_id_formats() {
        assert_eq!(anidb_id("https://anidb.net/anime/17617"), 17617);
        assert_eq!(anidb_id("https://anidb.net/a17617"), 17617);
        assert_eq!(anidb_id("https://anidb.net/perl-bin/animedb.pl?show=anime&aid=17617"), 17617);
    }

    #[test]
    fn test_premiere_date_falls_back_to_schedule_link() {
        let document = html::parse(
            r#"<div class="lc-poster-col"><div class="text-sm">
                <a class="link-hover" href="/schedule?date=2023-09-29">Fall 2023</a>
            </div></div>"#,
        );
        assert_eq!(
            premiere_dates(&document),
            vec![NaiveDate::from_ymd_opt(2023, 9, 29).unwrap()]
        );
    }

    #[test]
    fn test_search_accepts_premiere_month_or_title() {
        let info = AnimeInfo {
            query: "sousou-no-frieren".into(),
            start_date: AnimeDate::new(2023, 9, 29),
            ..Default::default()
        };
        // 1695945600 = 2023-09-29
        let body = r#"<ul class="anime-list">
            <li data-anime-id="11728" data-romaji="Sousou no Frieren" data-premiere="1695945600"></li>
            <li data-anime-id="12001" data-romaji="Frieren Mini" data-premiere="1704067200"></li>
            <li data-anime-id="99" data-romaji="Sousou no Frieren 2" data-premiere="1767225600"></li>
        </ul>"#;

        let ids: Vec<String> = parse_search(body, &info).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["11728", "99"]);
    }
}
