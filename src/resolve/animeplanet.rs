use async_trait::async_trait;

use crate::{
    error::{Error, Result},
    net::{Request, RetrievalClient, html},
    resolve::{Candidate, Provider, Session},
    similarity::edit_score,
    text::{clean_title, extract_anime_path, extract_year},
    types::{AnimeInfo, AnimeResource},
};

/// Minimum [`edit_score`] between a card's normalized name and the query.
const SEARCH_THRESHOLD: f64 = 90.0;

/// Anime-Planet resolver.
///
/// The catalog search is narrowed to the premiere year; a card is accepted when
/// its year equals the anchor's and its name scores at least 90 against the
/// query by edit distance. The detail page must show the same year. Ids are the
/// page slugs.
pub struct AnimePlanetResolver {
    client: RetrievalClient,
}

impl AnimePlanetResolver {
    pub fn new(client: RetrievalClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider for AnimePlanetResolver {
    fn id(&self) -> &'static str {
        "animeplanet"
    }

    fn name(&self) -> &'static str {
        "Anime-Planet"
    }

    fn base_url(&self) -> &str {
        "https://www.anime-planet.com"
    }

    fn known_id(&self, resource: &AnimeResource) -> Option<String> {
        (!resource.anime_planet.is_empty()).then(|| resource.anime_planet.clone())
    }

    async fn search(&self, session: &Session) -> Result<Vec<Candidate>> {
        let info = &session.info;
        let url = format!(
            "{}/anime/all?name={}&year={}&to_year={}",
            self.base_url(),
            urlencoding::encode(&info.query.replace('-', " ")),
            info.start_date.year,
            info.start_date.year
        );
        let mut request = Request::parse(&url)?;
        let body = self.client.get_text(&session.cancel, &mut request).await?;

        Ok(parse_search(&body, info))
    }

    async fn check(&self, session: &Session, id: &str) -> Result<AnimeResource> {
        let url = format!("{}/anime/{}", self.base_url(), urlencoding::encode(id));
        let mut request = Request::parse(&url)?;
        let body = self.client.get_text(&session.cancel, &mut request).await?;

        let document = html::parse(&body);
        let year = html::select_text(&document, ".iconYear").and_then(|text| extract_year(&text));
        if year != Some(session.info.start_date.year) {
            return Err(Error::not_found(format!(
                "anime-planet {id}: premiered {year:?}, expected {}",
                session.info.start_date.year
            )));
        }

        Ok(AnimeResource {
            anime_planet: id.to_string(),
            ..Default::default()
        })
    }
}

// Card details live in the `title` attribute as an HTML snippet.
fn parse_search(body: &str, info: &AnimeInfo) -> Vec<Candidate> {
    let document = html::parse(body);

    html::parse_items(&document, "ul.cardGrid li", |card| {
        let tooltip = html::element_attr(card, "li", "title")?;
        let details = html::parse(&tooltip);
        let name = html::select_text(&details, ".theme-font")?;
        let year = html::select_text(&details, ".iconYear").and_then(|text| extract_year(&text))?;

        if year != info.start_date.year || edit_score(&clean_title(&name), &info.query) < SEARCH_THRESHOLD {
            return None;
        }

        let href = html::element_attr(card, "a", "href")?;
        let slug = extract_anime_path(&format!("{href}/"));
        (!slug.is_empty()).then_some(Candidate { id: slug, title: name })
    })
}
