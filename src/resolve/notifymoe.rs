use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    net::{Request, RetrievalClient, html},
    resolve::{Candidate, Provider, Session},
    similarity::token_score,
    text::{clean_title, extract_num},
    types::{AnimeInfo, AnimeResource},
};

/// Minimum [`token_score`] between a search label and the query.
const SEARCH_THRESHOLD: f64 = 40.0;

/// notify.moe anime API response
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NotifyMoeAnime {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "startDate")]
    start_date: String,
    mappings: Vec<NotifyMoeMapping>,
}

/// notify.moe cross-service mapping
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NotifyMoeMapping {
    service: String,
    #[serde(rename = "serviceId")]
    service_id: String,
}

/// notify.moe resolver.
///
/// The search fragment lists anime links labelled with their title; a link is
/// accepted when the normalized label contains the query or scores at least 40
/// against it. The JSON API then confirms the start month, the media type when
/// both sides know it, and the MyAnimeList mapping.
pub struct NotifyMoeResolver {
    client: RetrievalClient,
}

impl NotifyMoeResolver {
    pub fn new(client: RetrievalClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider for NotifyMoeResolver {
    fn id(&self) -> &'static str {
        "notifymoe"
    }

    fn name(&self) -> &'static str {
        "notify.moe"
    }

    fn base_url(&self) -> &str {
        "https://notify.moe"
    }

    fn known_id(&self, resource: &AnimeResource) -> Option<String> {
        (!resource.notify_moe.is_empty()).then(|| resource.notify_moe.clone())
    }

    async fn search(&self, session: &Session) -> Result<Vec<Candidate>> {
        let url = format!(
            "{}/_/anime-search/{}",
            self.base_url(),
            urlencoding::encode(&session.info.query)
        );
        let mut request = Request::parse(&url)?.with_header("Authority", "notify.moe");
        let body = self.client.get_text(&session.cancel, &mut request).await?;

        Ok(parse_search(&body, &session.info.query))
    }

    async fn check(&self, session: &Session, id: &str) -> Result<AnimeResource> {
        let url = format!("{}/api/anime/{}", self.base_url(), urlencoding::encode(id));
        let mut request = Request::parse(&url)?
            .with_header("Authority", "notify.moe")
            .with_header("Referer", "https://notify.moe");
        let anime: NotifyMoeAnime = self.client.get_json(&session.cancel, &mut request).await?;

        confirm(anime, &session.info)
    }
}

fn parse_search(body: &str, query: &str) -> Vec<Candidate> {
    let document = html::parse(body);

    html::parse_items(&document, ".anime-search a", |link| {
        let href = html::element_attr(link, "a", "href")?;
        let id = href.trim_end_matches('/').rsplit('/').next()?.to_string();
        if id.is_empty() {
            return None;
        }

        let title = html::element_attr(link, "a", "aria-label").unwrap_or_default();
        let label = clean_title(&title);
        let accepted = title.is_empty()
            || label.contains(query)
            || token_score(&label, query) >= SEARCH_THRESHOLD;

        accepted.then_some(Candidate { id, title })
    })
}

fn confirm(anime: NotifyMoeAnime, info: &AnimeInfo) -> Result<AnimeResource> {
    let date = NaiveDate::parse_from_str(&anime.start_date, "%Y-%m-%d")
        .map_err(|e| Error::parse(format!("notify.moe {}: start date {:?}: {e}", anime.id, anime.start_date)))?;

    if !info.start_date.same_month(date.year(), date.month()) {
        return Err(Error::not_found(format!(
            "notify.moe {}: started {date}, expected {}-{:02}",
            anime.id, info.start_date.year, info.start_date.month
        )));
    }

    if !info.kind.is_empty() && !anime.kind.is_empty() && clean_title(&info.kind) != clean_title(&anime.kind) {
        return Err(Error::not_found(format!(
            "notify.moe {}: type {:?}, expected {:?}",
            anime.id, anime.kind, info.kind
        )));
    }

    let mut resource = AnimeResource {
        notify_moe: anime.id.clone(),
        ..Default::default()
    };

    for mapping in &anime.mappings {
        let id = extract_num(&mapping.service_id);
        if mapping.service.contains("myanimelist/anime") {
            if id != u64::from(info.mal_id) {
                return Err(Error::bad_data(format!(
                    "notify.moe {}: maps myanimelist {id}, expected {}",
                    anime.id, info.mal_id
                )));
            }
            resource.mal = info.mal_id;
        } else if mapping.service.contains("anilist/anime") {
            resource.anilist = u32::try_from(id).unwrap_or_default();
        } else if mapping.service.contains("kitsu/anime") {
            if id != 0 {
                resource.kitsu = id.to_string();
            }
        } else if mapping.service.contains("anidb/anime") {
            resource.anidb = u32::try_from(id).unwrap_or_default();
        }
    }

    Ok(resource)
}
