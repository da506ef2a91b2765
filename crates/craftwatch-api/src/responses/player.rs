//! Public representation of one online player

use crate::enrichment::EnrichmentResult;
use craftwatch_protocol::PlayerSample;
use serde::Serialize;

const CRAFATAR: &str = "https://crafatar.com";

/// Avatar image URLs at several sizes and renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvatarUrls {
    pub small: String,
    pub medium: String,
    pub large: String,
    pub head_3d: String,
    pub body_3d: String,
}

impl AvatarUrls {
    pub fn for_uuid(uuid: &str) -> Self {
        Self {
            small: format!("{CRAFATAR}/avatars/{uuid}?size=32"),
            medium: format!("{CRAFATAR}/avatars/{uuid}?size=64"),
            large: format!("{CRAFATAR}/avatars/{uuid}?size=128"),
            head_3d: format!("{CRAFATAR}/renders/head/{uuid}?size=64"),
            body_3d: format!("{CRAFATAR}/renders/body/{uuid}?size=64"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkinUrls {
    pub url: String,
    pub cape_url: String,
}

impl SkinUrls {
    pub fn for_uuid(uuid: &str) -> Self {
        Self {
            url: format!("{CRAFATAR}/skins/{uuid}"),
            cape_url: format!("{CRAFATAR}/capes/{uuid}"),
        }
    }
}

/// One entry of a player list.
///
/// `essentials` is omitted when the service runs without an enrichment
/// source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRecord {
    pub name: String,
    pub uid: String,
    pub display_name: String,
    pub avatar: AvatarUrls,
    pub skin: SkinUrls,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub essentials: Option<EnrichmentResult>,
}

impl PlayerRecord {
    pub fn new(sample: &PlayerSample, essentials: Option<EnrichmentResult>) -> Self {
        Self {
            name: sample.name.clone(),
            uid: sample.id.clone(),
            display_name: sample.name.clone(),
            avatar: AvatarUrls::for_uuid(&sample.id),
            skin: SkinUrls::for_uuid(&sample.id),
            essentials,
        }
    }
}
