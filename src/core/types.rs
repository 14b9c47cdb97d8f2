use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Result, SyncError};

/// Encoded in the catalog's spelling; decoded case-insensitively through
/// [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Status {
    Alive,
    Dead,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Alive => "Alive",
            Self::Dead => "Dead",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Status {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alive" => Ok(Self::Alive),
            "dead" => Ok(Self::Dead),
            "unknown" => Ok(Self::Unknown),
            other => Err(SyncError::InvalidArgument(format!(
                "unknown status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Gender {
    Female,
    Male,
    Genderless,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl Gender {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
            Self::Genderless => "Genderless",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Gender {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" => Ok(Self::Female),
            "male" => Ok(Self::Male),
            "genderless" => Ok(Self::Genderless),
            "unknown" => Ok(Self::Unknown),
            other => Err(SyncError::InvalidArgument(format!(
                "unknown gender '{}'",
                other
            ))),
        }
    }
}

fn deserialize_label<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = SyncError>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserialize_label(deserializer)
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserialize_label(deserializer)
    }
}

/// Named reference to an origin or current location.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// A catalog record, owned either by the remote catalog (`id > 0`, no
/// bookkeeping) or by the local overlay (`_local` and `_updatedAt` set).
///
/// Descriptive fields beyond the core attributes are carried through
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub species: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<LocationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationRef>,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episode: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(
        rename = "_local",
        alias = "isLocal",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_local: Option<bool>,
    #[serde(
        rename = "_updatedAt",
        alias = "updatedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity {
    /// Marks the record as overlay-owned and stamps the write time.
    pub fn mark_local(&mut self, now: DateTime<Utc>) {
        self.is_local = Some(true);
        self.updated_at = Some(now);
    }

    pub fn is_local(&self) -> bool {
        self.is_local.unwrap_or(false)
    }
}

/// Input for a locally created record: an entity without its identifier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityDraft {
    pub name: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub species: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<LocationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationRef>,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episode: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl EntityDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn into_entity(self, id: i64) -> Entity {
        Entity {
            id,
            name: self.name,
            status: self.status,
            species: self.species,
            kind: self.kind,
            gender: self.gender,
            origin: self.origin,
            location: self.location,
            image: self.image,
            episode: self.episode,
            url: None,
            created: self.created,
            is_local: None,
            updated_at: None,
        }
    }
}

/// Partial update of the editable fields. Unset fields keep their value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl EntityPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, entity: &mut Entity) {
        if let Some(name) = &self.name {
            entity.name = name.clone();
        }
        if let Some(status) = self.status {
            entity.status = status;
        }
        if let Some(species) = &self.species {
            entity.species = species.clone();
        }
        if let Some(kind) = &self.kind {
            entity.kind = Some(kind.clone());
        }
        if let Some(gender) = self.gender {
            entity.gender = gender;
        }
        if let Some(image) = &self.image {
            entity.image = image.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub pages: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
}

/// Page as returned by the remote catalog. Either part may be missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub info: Option<PageInfo>,
    #[serde(default)]
    pub results: Option<Vec<Entity>>,
}

impl PageResponse {
    pub fn into_page(self) -> CatalogPage {
        CatalogPage {
            count: self.info.map(|info| info.count).unwrap_or(0),
            results: self.results.unwrap_or_default(),
        }
    }
}

/// Normalised remote page: reported catalog size plus this page's entities.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogPage {
    pub count: u64,
    pub results: Vec<Entity>,
}

impl From<Option<PageResponse>> for CatalogPage {
    fn from(response: Option<PageResponse>) -> Self {
        response.map(PageResponse::into_page).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rick_json() -> serde_json::Value {
        json!({
            "id": 1,
            "name": "Rick Sanchez",
            "status": "Alive",
            "species": "Human",
            "type": "",
            "gender": "Male",
            "origin": { "name": "Earth (C-137)", "url": "https://rickandmortyapi.com/api/location/1" },
            "location": { "name": "Citadel of Ricks", "url": "https://rickandmortyapi.com/api/location/3" },
            "image": "https://rickandmortyapi.com/api/character/avatar/1.jpeg",
            "episode": ["https://rickandmortyapi.com/api/episode/1"],
            "url": "https://rickandmortyapi.com/api/character/1",
            "created": "2017-11-04T18:48:46.250Z"
        })
    }

    #[test]
    fn test_decodes_remote_wire_shape() {
        let entity: Entity = serde_json::from_value(rick_json()).unwrap();
        assert_eq!(entity.id, 1);
        assert_eq!(entity.status, Status::Alive);
        assert_eq!(entity.gender, Gender::Male);
        assert_eq!(entity.kind.as_deref(), Some(""));
        assert_eq!(entity.origin.as_ref().unwrap().name, "Earth (C-137)");
        assert_eq!(entity.episode.len(), 1);
        assert!(!entity.is_local());
        assert!(entity.updated_at.is_none());
    }

    #[test]
    fn test_lowercase_unknown_round_trips_with_catalog_spelling() {
        let entity: Entity = serde_json::from_value(json!({
            "id": 2, "name": "X", "status": "unknown", "gender": "unknown"
        }))
        .unwrap();
        assert_eq!(entity.status, Status::Unknown);
        assert_eq!(entity.gender, Gender::Unknown);

        let encoded = serde_json::to_value(&entity).unwrap();
        assert_eq!(encoded["status"], "unknown");
        assert_eq!(encoded["gender"], "unknown");
    }

    #[test]
    fn test_bookkeeping_fields_use_overlay_names_and_accept_aliases() {
        let mut entity = EntityDraft::new("Local").into_entity(-1);
        let now = Utc::now();
        entity.mark_local(now);

        let encoded = serde_json::to_value(&entity).unwrap();
        assert_eq!(encoded["_local"], true);
        assert!(encoded["_updatedAt"].is_string());
        assert!(encoded.get("url").is_none());

        let aliased: Entity = serde_json::from_value(json!({
            "id": -3, "name": "Alias", "isLocal": true,
            "updatedAt": "2025-09-26T10:00:00.000Z"
        }))
        .unwrap();
        assert!(aliased.is_local());
        assert!(aliased.updated_at.is_some());
    }

    #[test]
    fn test_patch_overwrites_only_set_fields() {
        let mut entity: Entity = serde_json::from_value(rick_json()).unwrap();
        let patch = EntityPatch {
            name: Some("Pickle Rick".into()),
            status: Some(Status::Dead),
            ..EntityPatch::default()
        };
        patch.apply_to(&mut entity);

        assert_eq!(entity.name, "Pickle Rick");
        assert_eq!(entity.status, Status::Dead);
        assert_eq!(entity.species, "Human");
        assert_eq!(entity.gender, Gender::Male);
        assert!(!patch.is_empty());
        assert!(EntityPatch::default().is_empty());
    }

    #[test]
    fn test_page_response_edge_cases_normalise_to_empty_pages() {
        let missing_results: PageResponse =
            serde_json::from_value(json!({ "info": { "count": 826 } })).unwrap();
        let page = missing_results.into_page();
        assert_eq!(page.count, 826);
        assert!(page.results.is_empty());

        let null_results: PageResponse =
            serde_json::from_value(json!({ "info": null, "results": null })).unwrap();
        assert_eq!(null_results.into_page(), CatalogPage::default());

        assert_eq!(CatalogPage::from(None), CatalogPage::default());
    }

    #[test]
    fn test_status_and_gender_parse_case_insensitively() {
        assert_eq!("ALIVE".parse::<Status>().unwrap(), Status::Alive);
        assert_eq!(" dead ".parse::<Status>().unwrap(), Status::Dead);
        assert_eq!("Genderless".parse::<Gender>().unwrap(), Gender::Genderless);
        assert!("zombie".parse::<Status>().is_err());
        assert_eq!(Status::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_decode_accepts_any_case_and_encodes_catalog_spelling() {
        let entity: Entity = serde_json::from_value(json!({
            "id": -1, "name": "Local", "status": "aLiVe", "gender": "MALE"
        }))
        .unwrap();
        assert_eq!(entity.status, Status::Alive);
        assert_eq!(entity.gender, Gender::Male);

        let shouting: Entity = serde_json::from_value(json!({
            "id": -2, "name": "Other", "status": "UNKNOWN", "gender": "UNKNOWN"
        }))
        .unwrap();
        assert_eq!(shouting.status, Status::Unknown);
        assert_eq!(shouting.gender, Gender::Unknown);

        let encoded = serde_json::to_value(&entity).unwrap();
        assert_eq!(encoded["status"], "Alive");
        assert_eq!(encoded["gender"], "Male");
    }

    #[test]
    fn test_decode_rejects_unknown_labels() {
        let err = serde_json::from_value::<Entity>(json!({
            "id": 3, "name": "X", "status": "zombie"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("zombie"));
    }
}
