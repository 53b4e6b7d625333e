mod common;

use std::sync::Arc;

use anicine::error::{Error, Result};
use anicine::resolve::{
    AnimePlanetResolver, Candidate, LiveChartResolver, NotifyMoeResolver, Provider, Resolvers, Session, resolve,
};
use anicine::types::AnimeResource;
use async_trait::async_trait;
use common::{FRIEREN_MAL, MockTransport, RecordingSleeper, client, frieren, reply};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

const LIVECHART_SEARCH: &str = r#"<ul class="anime-list">
    <li data-anime-id="11728" data-romaji="Sousou no Frieren" data-premiere="1695945600"></li>
    <li data-anime-id="404" data-romaji="Dungeon Meshi" data-premiere="1704326400"></li>
</ul>"#;

const LIVECHART_DETAIL: &str = r#"<div class="lc-poster-col">
    <div class="text-sm"><a class="link-hover" href="/schedule?date=2023-09-29">September 29, 2023</a></div>
</div>
<div class="lc-anime-links">
    <a class="lc-btn-myanimelist" href="https://myanimelist.net/anime/52991">MAL</a>
    <a class="lc-btn-anilist" href="https://anilist.co/anime/154587">AniList</a>
    <a class="lc-btn-anidb" href="https://anidb.net/anime/17617">AniDB</a>
    <a class="lc-btn-kitsu" href="https://kitsu.app/anime/46474">Kitsu</a>
    <a class="lc-btn-anisearch" href="https://www.anisearch.com/anime/17565,sousou-no-frieren">aniSearch</a>
    <a class="lc-btn-animeplanet" href="https://www.anime-planet.com/anime/frieren-beyond-journeys-end">Anime-Planet</a>
</div>"#;

const NOTIFYMOE_SEARCH: &str = r#"<div class="anime-search">
    <a href="/anime/0ZpGFaIiR" aria-label="Sousou no Frieren"></a>
</div>"#;

const NOTIFYMOE_DETAIL: &str = r#"{
    "id": "0ZpGFaIiR",
    "type": "tv",
    "startDate": "2023-09-29",
    "mappings": [
        {"service": "myanimelist/anime", "serviceId": "52991"},
        {"service": "anilist/anime", "serviceId": "154587"},
        {"service": "kitsu/anime", "serviceId": "46474"}
    ]
}"#;

const ANIMEPLANET_SEARCH: &str = r#"<ul class="cardGrid">
    <li title="&lt;h5 class=&quot;theme-font&quot;&gt;Sousou no Frieren&lt;/h5&gt;&lt;span class=&quot;iconYear&quot;&gt;2023&lt;/span&gt;">
        <a href="/anime/frieren-beyond-journeys-end">Frieren</a>
    </li>
</ul>"#;

const ANIMEPLANET_DETAIL: &str = r#"<section class="pure-g entryBar">
    <div class="pure-1 md-1-5"><span class="iconYear">2023 - 2024</span></div>
</section>"#;

fn livechart_site() -> MockTransport {
    MockTransport::new()
        .page("/search", reply(200, LIVECHART_SEARCH))
        .page("/anime/11728", reply(200, LIVECHART_DETAIL))
}

fn session() -> Session {
    Session::new(frieren(), CancellationToken::new())
}

#[tokio::test]
async fn test_livechart_search_and_confirm() {
    let transport = livechart_site();
    let provider = LiveChartResolver::new(client(&transport, &RecordingSleeper::new()));

    let resource = resolve(&provider, &session(), None).await.unwrap();

    assert_eq!(resource.livechart, 11728);
    assert_eq!(resource.mal, FRIEREN_MAL);
    assert_eq!(resource.anilist, 154587);
    assert_eq!(resource.anidb, 17617);
    assert_eq!(resource.kitsu, "46474");
    assert_eq!(resource.anisearch, 17565);
    assert_eq!(resource.anime_planet, "frieren-beyond-journeys-end");
    assert_eq!(transport.paths(), vec!["/search", "/anime/11728"]);
}

#[tokio::test]
async fn test_known_id_skips_search() {
    let transport = livechart_site();
    let provider = LiveChartResolver::new(client(&transport, &RecordingSleeper::new()));

    let resource = resolve(&provider, &session(), Some("11728")).await.unwrap();

    assert_eq!(resource.livechart, 11728);
    assert_eq!(transport.paths(), vec!["/anime/11728"]);
}

#[tokio::test]
async fn test_rejected_known_id_falls_back_to_search() {
    let transport = livechart_site();
    let provider = LiveChartResolver::new(client(&transport, &RecordingSleeper::new()));

    let resource = resolve(&provider, &session(), Some("1")).await.unwrap();

    assert_eq!(resource.livechart, 11728);
    assert_eq!(transport.paths(), vec!["/anime/1", "/search", "/anime/11728"]);
}

#[tokio::test]
async fn test_livechart_rejects_foreign_anchor() {
    let foreign = LIVECHART_DETAIL.replace("anime/52991", "anime/1");
    let transport = MockTransport::new()
        .page("/search", reply(200, LIVECHART_SEARCH))
        .page("/anime/11728", reply(200, &foreign));
    let provider = LiveChartResolver::new(client(&transport, &RecordingSleeper::new()));

    let result = resolve(&provider, &session(), None).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_notifymoe_search_and_confirm() {
    let transport = MockTransport::new()
        .page("/_/anime-search/sousou-no-frieren", reply(200, NOTIFYMOE_SEARCH))
        .page("/api/anime/0ZpGFaIiR", reply(200, NOTIFYMOE_DETAIL));
    let provider = NotifyMoeResolver::new(client(&transport, &RecordingSleeper::new()));

    let resource = resolve(&provider, &session(), None).await.unwrap();

    assert_eq!(resource.notify_moe, "0ZpGFaIiR");
    assert_eq!(resource.mal, FRIEREN_MAL);
    assert_eq!(resource.kitsu, "46474");
}

#[tokio::test]
async fn test_animeplanet_search_and_confirm() {
    let transport = MockTransport::new()
        .page("/anime/all", reply(200, ANIMEPLANET_SEARCH))
        .page("/anime/frieren-beyond-journeys-end", reply(200, ANIMEPLANET_DETAIL));
    let provider = AnimePlanetResolver::new(client(&transport, &RecordingSleeper::new()));

    let resource = resolve(&provider, &session(), None).await.unwrap();

    assert_eq!(resource.anime_planet, "frieren-beyond-journeys-end");
    let search = &transport.calls()[0].url;
    assert!(search.query().unwrap_or_default().contains("year=2023"));
}

#[tokio::test]
async fn test_canceled_session_makes_no_calls() {
    let transport = livechart_site();
    let provider = LiveChartResolver::new(client(&transport, &RecordingSleeper::new()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = resolve(&provider, &Session::new(frieren(), cancel), Some("11728")).await;

    assert!(matches!(result, Err(Error::Canceled)));
    assert_eq!(transport.count(), 0);
}

#[tokio::test]
async fn test_failed_search_is_not_found() {
    let transport = MockTransport::new();
    let provider = NotifyMoeResolver::new(client(&transport, &RecordingSleeper::new()));

    let result = resolve(&provider, &session(), None).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

/// Provider with scripted candidates and per-id check outcomes.
struct ScriptedProvider {
    candidates: Vec<&'static str>,
    checked: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    fn new(candidates: Vec<&'static str>) -> Self {
        Self {
            candidates,
            checked: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn id(&self) -> &'static str {
        "scripted"
    }

    fn name(&self) -> &'static str {
        "Scripted"
    }

    fn base_url(&self) -> &str {
        "https://scripted.invalid"
    }

    fn known_id(&self, resource: &AnimeResource) -> Option<String> {
        (!resource.wikidata.is_empty()).then(|| resource.wikidata.clone())
    }

    async fn search(&self, _session: &Session) -> Result<Vec<Candidate>> {
        Ok(self
            .candidates
            .iter()
            .map(|id| Candidate {
                id: id.to_string(),
                title: id.to_uppercase(),
            })
            .collect())
    }

    async fn check(&self, _session: &Session, id: &str) -> Result<AnimeResource> {
        self.checked.lock().push(id.to_string());
        match id {
            "mismatch" => Err(Error::bad_data("anchor mismatch")),
            "missing" => Err(Error::not_found("gone")),
            "abort" => Err(Error::Canceled),
            _ => Ok(AnimeResource {
                wikidata: id.to_string(),
                ..Default::default()
            }),
        }
    }
}

#[tokio::test]
async fn test_candidates_tried_until_one_confirms() {
    let provider = ScriptedProvider::new(vec!["mismatch", "missing", "Q119911", "Q1"]);
    let checked = provider.checked.clone();

    let resource = resolve(&provider, &session(), None).await.unwrap();

    assert_eq!(resource.wikidata, "Q119911");
    assert_eq!(*checked.lock(), vec!["mismatch", "missing", "Q119911"]);
}

#[tokio::test]
async fn test_canceled_candidate_stops_resolution() {
    let provider = ScriptedProvider::new(vec!["abort", "Q119911"]);
    let checked = provider.checked.clone();

    let result = resolve(&provider, &session(), None).await;

    assert!(matches!(result, Err(Error::Canceled)));
    assert_eq!(*checked.lock(), vec!["abort"]);
}

#[tokio::test]
async fn test_resolvers_merge_all_providers() {
    let transport = livechart_site()
        .page("/_/anime-search/sousou-no-frieren", reply(200, NOTIFYMOE_SEARCH))
        .page("/api/anime/0ZpGFaIiR", reply(200, NOTIFYMOE_DETAIL))
        .page("/anime/all", reply(200, ANIMEPLANET_SEARCH))
        .page("/anime/frieren-beyond-journeys-end", reply(200, ANIMEPLANET_DETAIL));
    let client = client(&transport, &RecordingSleeper::new());

    let mut resolvers = Resolvers::new();
    resolvers
        .add(LiveChartResolver::new(client.clone()))
        .add(NotifyMoeResolver::new(client.clone()))
        .add(AnimePlanetResolver::new(client));
    assert_eq!(resolvers.list_ids(), vec!["livechart", "notifymoe", "animeplanet"]);
    assert!(resolvers.get("notifymoe").is_some());

    let merged = resolvers
        .resolve_merged(&session(), &AnimeResource::default())
        .await
        .unwrap();

    assert_eq!(merged.mal, FRIEREN_MAL);
    assert_eq!(merged.livechart, 11728);
    assert_eq!(merged.notify_moe, "0ZpGFaIiR");
    assert_eq!(merged.anime_planet, "frieren-beyond-journeys-end");
    assert_eq!(merged.kitsu, "46474");
}

#[tokio::test]
async fn test_resolvers_report_total_failure() {
    let transport = MockTransport::new();
    let client = client(&transport, &RecordingSleeper::new());

    let mut resolvers = Resolvers::new();
    resolvers
        .add(LiveChartResolver::new(client.clone()))
        .add(NotifyMoeResolver::new(client));

    let error = resolvers
        .resolve_merged(&session(), &AnimeResource::default())
        .await
        .unwrap_err();

    assert!(matches!(error, Error::NotFound(_)));
    assert!(error.to_string().contains("All providers failed"));
}

#[tokio::test]
async fn test_resolvers_start_from_known_ids() {
    let provider = ScriptedProvider::new(vec!["Q1"]);
    let checked = provider.checked.clone();

    let mut resolvers = Resolvers::new();
    resolvers.add(provider);
    let known = AnimeResource {
        wikidata: "Q119911".into(),
        ..Default::default()
    };

    let results = resolvers.resolve_all(&session(), &known).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, "scripted");
    assert_eq!(results[0].1.as_ref().unwrap().wikidata, "Q119911");
    assert_eq!(*checked.lock(), vec!["Q119911"]);
}

#[tokio::test]
async fn test_resolvers_replace_provider_with_same_id() {
    let first = ScriptedProvider::new(vec!["Q1"]);
    let second = ScriptedProvider::new(vec!["Q119911"]);
    let first_checked = first.checked.clone();
    let second_checked = second.checked.clone();

    let mut resolvers = Resolvers::new();
    resolvers.add(first).add(second);
    assert_eq!(resolvers.len(), 1);
    assert_eq!(resolvers.list_ids(), vec!["scripted"]);

    let results = resolvers.resolve_all(&session(), &AnimeResource::default()).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].1.as_ref().unwrap().wikidata, "Q119911");
    assert!(first_checked.lock().is_empty());
    assert_eq!(*second_checked.lock(), vec!["Q119911"]);
}
