//! # Recipes
//!
//! Records submitted by viewers, competition participants and chefs.
//!
//! ## Identity
//! - `id`: opaque storage identity, assigned by the store on insert
//! - `seq`: business-facing ordering key, allocated from the `recipes` counter
//!
//! `seq` is stamped exactly once before the record is persisted and is never
//! touched by updates. Listings are always ordered by `seq` ascending.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthorType {
    #[serde(alias = "viewer")]
    Viewer,
    #[serde(alias = "participant")]
    Participant,
    #[serde(alias = "chef")]
    Chef,
}

/// Writable recipe fields once they have passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFields {
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub chef_name: String,
    pub author_type: AuthorType,
    #[serde(default)]
    pub season: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub seq: i64,
    #[serde(flatten)]
    pub fields: RecipeFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stamped recipe that has not been given a storage identity yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub seq: i64,
    pub fields: RecipeFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeDraft {
    pub fn new(seq: i64, fields: RecipeFields, now: DateTime<Utc>) -> Self {
        Self {
            seq,
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_recipe(self, id: String) -> Recipe {
        Recipe {
            id,
            seq: self.seq,
            fields: self.fields,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Request body for create and update. Every field is optional so that
/// missing fields are reported alongside invalid ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInput {
    pub title: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub steps: Option<Vec<String>>,
    pub chef_name: Option<String>,
    pub author_type: Option<AuthorType>,
    pub season: Option<i32>,
}
