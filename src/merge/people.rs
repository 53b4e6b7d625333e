//! Companies, characters, voice actors and relations.
//!
//! Every entity class is grouped by an exact normalized key except voice actors,
//! whose names are clustered with [`token_score`] at threshold 80 within one
//! language.

use tracing::debug;

use super::media::merge_images;
use super::merge_ids;
use crate::similarity::token_score;
use crate::text::{clean_title, clean_unicode};
use crate::types::{AnimeCharacter, AnimeCompany, AnimeRelation, VoiceActor};

/// Minimum [`token_score`] for two same-language voice actor names to merge.
pub const VOICE_ACTOR_THRESHOLD: f64 = 80.0;

/// Groups companies by normalized name and merges each group's ids.
///
/// ```rust
/// use anicine::merge::merge_companies;
/// use anicine::types::{AnimeCompany, AnimeId};
///
/// let merged = merge_companies(&[
///     AnimeCompany { id: AnimeId { mal: 11, ..Default::default() }, name: "Madhouse".into() },
///     AnimeCompany { id: AnimeId { anilist: 11, ..Default::default() }, name: "MADHOUSE ".into() },
/// ]);
///
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged[0].name, "madhouse");
/// assert_eq!((merged[0].id.mal, merged[0].id.anilist), (11, 11));
/// ```
pub fn merge_companies<'a>(companies: impl IntoIterator<Item = &'a AnimeCompany>) -> Vec<AnimeCompany> {
    let mut merged: Vec<AnimeCompany> = Vec::new();

    for company in companies {
        let name = clean_title(&company.name);
        if name.is_empty() {
            continue;
        }

        match merged.iter_mut().find(|m| m.name == name) {
            Some(existing) => existing.id = merge_ids([&existing.id, &company.id]),
            None => merged.push(AnimeCompany {
                id: company.id,
                name,
            }),
        }
    }

    merged
}

/// Groups characters by native name with whitespace removed.
///
/// Characters without a native name are dropped. Within a group, scalar fields
/// keep the first non-empty value, name lists are concatenated and voice actors
/// go through [`merge_voice_actors`].
pub fn merge_characters<'a>(
    characters: impl IntoIterator<Item = &'a AnimeCharacter>,
) -> Vec<AnimeCharacter> {
    let mut groups: Vec<(String, AnimeCharacter)> = Vec::new();

    for character in characters {
        let key = clean_unicode(&character.name.native.replace(' ', ""));
        if key.is_empty() {
            continue;
        }

        let index = match groups.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                groups.push((key, AnimeCharacter::default()));
                groups.len() - 1
            }
        };
        let merged = &mut groups[index].1;

        merged.id = merge_ids([&merged.id, &character.id]);
        if merged.name.full.is_empty() {
            merged.name.full = character.name.full.clone();
        }
        if merged.name.native.is_empty() {
            merged.name.native = character.name.native.clone();
        }
        merged.name.alternative.extend(character.name.alternative.iter().cloned());
        merged.name.spoilers.extend(character.name.spoilers.iter().cloned());
        merged.images.extend(character.images.iter().cloned());
        if merged.description.mal.is_empty() {
            merged.description.mal = character.description.mal.clone();
        }
        if merged.description.anilist.is_empty() {
            merged.description.anilist = character.description.anilist.clone();
        }
        if merged.age == 0 {
            merged.age = character.age;
        }
        if merged.gender.is_empty() {
            merged.gender = clean_title(&character.gender);
        }
        if merged.role.is_empty() {
            merged.role = clean_title(&character.role);
        }
        if merged.date_of_birth.is_unset() {
            merged.date_of_birth = character.date_of_birth;
        }
        merged.voice_actors = merge_voice_actors(merged.voice_actors.iter().chain(&character.voice_actors));
    }

    groups
        .into_iter()
        .map(|(_, mut character)| {
            character.images = merge_images(&character.images);
            character
        })
        .collect()
}

/// Clusters voice actors by language and fuzzy name similarity.
///
/// An actor joins the first existing cluster with the same ISO 639-1 code whose
/// normalized name scores at least [`VOICE_ACTOR_THRESHOLD`]; otherwise it
/// starts a new cluster keyed by its own normalized name.
pub fn merge_voice_actors<'a>(actors: impl IntoIterator<Item = &'a VoiceActor>) -> Vec<VoiceActor> {
    let mut groups: Vec<(String, VoiceActor)> = Vec::new();

    for actor in actors {
        let name = clean_title(&actor.name.full);
        if name.is_empty() {
            continue;
        }

        let found = groups.iter().position(|(key, existing)| {
            if existing.language.iso639_1 != actor.language.iso639_1 {
                return false;
            }
            let score = token_score(key, &name);
            debug!(left = %key, right = %name, score, "voice actor similarity");
            score >= VOICE_ACTOR_THRESHOLD
        });
        let index = match found {
            Some(index) => index,
            None => {
                groups.push((name, VoiceActor::default()));
                groups.len() - 1
            }
        };
        let merged = &mut groups[index].1;

        merged.language = actor.language.clone();
        merged.id = merge_ids([&merged.id, &actor.id]);
        if merged.name.full.is_empty() {
            merged.name.full = actor.name.full.clone();
        }
        if merged.name.native.is_empty() {
            merged.name.native = actor.name.native.clone();
        }
        merged.name.alternative.extend(actor.name.alternative.iter().cloned());
        merged.name.spoilers.extend(actor.name.spoilers.iter().cloned());
        merged.images.extend(actor.images.iter().cloned());
        merged.social_media.extend(actor.social_media.iter().cloned());
        if merged.age == 0 {
            merged.age = actor.age;
        }
        if merged.gender.trim().is_empty() {
            merged.gender = actor.gender.replace(' ', "");
        }
        if merged.date_of_birth.is_unset() {
            merged.date_of_birth = actor.date_of_birth;
        }
        if merged.date_of_death.is_unset() {
            merged.date_of_death = actor.date_of_death;
        }
        if merged.home.trim().is_empty() {
            merged.home = clean_unicode(actor.home.trim());
        }
    }

    groups
        .into_iter()
        .map(|(_, mut actor)| {
            actor.images = merge_images(&actor.images);
            actor
        })
        .collect()
}

/// Groups relations by nature and merges matching nodes.
///
/// Each incoming node is compared with every node the group held before this
/// relation arrived. A node with the same normalized name and type merges its
/// ids into the existing one; every non-matching comparison appends the
/// incoming node, so a group with several existing nodes can receive the same
/// node more than once.
// TODO: append an unmatched node once, after it has been compared with every
// existing node, when downstream consumers can take deduplicated relations.
pub fn merge_relations<'a>(relations: impl IntoIterator<Item = &'a AnimeRelation>) -> Vec<AnimeRelation> {
    let mut merged: Vec<AnimeRelation> = Vec::new();

    for relation in relations {
        let index = match merged.iter().position(|r| r.nature == relation.nature) {
            Some(index) => index,
            None => {
                merged.push(AnimeRelation {
                    nature: relation.nature.clone(),
                    nodes: Vec::new(),
                });
                merged.len() - 1
            }
        };
        let group = &mut merged[index];

        if group.nodes.is_empty() {
            group.nodes.extend(relation.nodes.iter().cloned());
            continue;
        }

        let existing = group.nodes.len();
        for i in 0..existing {
            let current = group.nodes[i].clone();
            for node in &relation.nodes {
                if clean_title(&current.name) == clean_title(&node.name) && current.kind == node.kind {
                    group.nodes[i].id = merge_ids([&current.id, &node.id]);
                } else {
                    group.nodes.push(node.clone());
                }
            }
        }
    }

    merged
}
