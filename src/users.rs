//! User directory and profile service

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::matching::{self, MatchBuckets};
use crate::media::{parse_data_url, MediaError, MediaUploader, UploadOptions};
use crate::models::{normalize_skills, Availability, DirectoryFilter, ProfileUpdate, PublicUser};
use crate::policy::{self, Access};
use crate::store::{StoreError, UserStore};

/// User service error
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Profile update body.
///
/// Only owner-editable fields are listed; `fullName`, `email`, `password`
/// and `_id` in the body are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    /// Blank clears the location
    pub location: Option<String>,
    /// URL, inline `data:image/...` URL, or `""` to clear
    pub profile_pic: Option<String>,
    pub skills_offered: Option<Vec<String>>,
    pub skills_wanted: Option<Vec<String>>,
    pub availability: Option<Availability>,
    pub is_public: Option<bool>,
}

/// User directory and profile service
pub struct UserService {
    users: Arc<dyn UserStore>,
    media: Arc<dyn MediaUploader>,
    media_folder: Option<String>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserStore>,
        media: Arc<dyn MediaUploader>,
        media_folder: Option<String>,
    ) -> Self {
        Self {
            users,
            media,
            media_folder,
        }
    }

    /// Public users other than the viewer, newest first
    pub async fn browse(
        &self,
        viewer: Uuid,
        filter: DirectoryFilter,
    ) -> Result<Vec<PublicUser>, UserError> {
        let filter = DirectoryFilter {
            search: non_blank(filter.search),
            skill: non_blank(filter.skill),
            location: non_blank(filter.location),
            exclude: Some(viewer),
        };

        let users = self.users.list_public_users(&filter).await?;
        Ok(users
            .into_iter()
            .filter(|user| policy::listed_in_directory(viewer, user))
            .map(PublicUser::from)
            .collect())
    }

    /// One profile, if the viewer may see it
    pub async fn profile(&self, viewer: Uuid, target: Uuid) -> Result<PublicUser, UserError> {
        let user = self.users.find_user(target).await?.ok_or(UserError::NotFound)?;
        match policy::can_view_profile(viewer, &user) {
            Access::Allowed => Ok(user.into()),
            Access::Denied(reason) => Err(UserError::Forbidden(reason)),
        }
    }

    pub async fn me(&self, user_id: Uuid) -> Result<PublicUser, UserError> {
        let user = self.users.find_user(user_id).await?.ok_or(UserError::NotFound)?;
        Ok(user.into())
    }

    /// Apply an owner's profile edits
    pub async fn update_profile(
        &self,
        owner: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<PublicUser, UserError> {
        let profile_pic = match request.profile_pic {
            None => None,
            Some(value) => Some(self.store_picture(value.trim()).await?),
        };

        let update = ProfileUpdate {
            bio: request.bio.map(|bio| bio.trim().to_string()),
            location: request.location.map(|loc| non_blank(Some(loc))),
            profile_pic,
            skills_offered: request.skills_offered.map(normalize_skills),
            skills_wanted: request.skills_wanted.map(normalize_skills),
            availability: request.availability,
            is_public: request.is_public,
        };

        let user = self
            .users
            .update_profile(owner, update)
            .await?
            .ok_or(UserError::NotFound)?;

        tracing::info!(user_id = %owner, "profile updated");
        Ok(user.into())
    }

    /// Match buckets for the viewer over the public directory
    pub async fn matches(&self, viewer: Uuid) -> Result<MatchBuckets, UserError> {
        let me = self.me(viewer).await?;
        let candidates = self.browse(viewer, DirectoryFilter::default()).await?;
        Ok(matching::classify(&me, candidates))
    }

    async fn store_picture(&self, value: &str) -> Result<Option<String>, UserError> {
        if value.is_empty() {
            return Ok(None);
        }

        match parse_data_url(value)? {
            None => Ok(Some(value.to_string())),
            Some(image) => {
                let url = self
                    .media
                    .upload(
                        image.bytes,
                        UploadOptions {
                            content_type: image.content_type,
                            folder: self.media_folder.clone(),
                        },
                    )
                    .await?;
                Ok(Some(url))
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::DisabledUploader;
    use crate::models::NewUser;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    struct FixedUploader;

    #[async_trait]
    impl MediaUploader for FixedUploader {
        async fn upload(
            &self,
            image: Vec<u8>,
            options: UploadOptions,
        ) -> Result<String, MediaError> {
            Ok(format!(
                "https://cdn.example.com/{}/{}.png",
                options.folder.unwrap_or_default(),
                image.len()
            ))
        }
    }

    async fn add(store: &MemoryStore, name: &str) -> Uuid {
        store
            .insert_user(NewUser {
                full_name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn service(store: Arc<MemoryStore>) -> UserService {
        UserService::new(store, Arc::new(FixedUploader), Some("avatars".to_string()))
    }

    #[tokio::test]
    async fn browse_excludes_self_and_private_profiles() {
        let store = Arc::new(MemoryStore::new());
        let ana = add(&store, "Ana").await;
        let bo = add(&store, "Bo").await;
        let cy = add(&store, "Cy").await;
        let users = service(store.clone());

        users
            .update_profile(
                cy,
                UpdateProfileRequest {
                    is_public: Some(false),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();

        let listed = users.browse(ana, DirectoryFilter::default()).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![bo]);
    }

    #[tokio::test]
    async fn blank_filters_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let ana = add(&store, "Ana").await;
        add(&store, "Bo").await;
        let users = service(store);

        let filter = DirectoryFilter {
            search: Some("  ".to_string()),
            ..DirectoryFilter::default()
        };
        assert_eq!(users.browse(ana, filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn private_profile_is_forbidden_to_others_but_not_owner() {
        let store = Arc::new(MemoryStore::new());
        let ana = add(&store, "Ana").await;
        let bo = add(&store, "Bo").await;
        let users = service(store);

        users
            .update_profile(
                bo,
                UpdateProfileRequest {
                    is_public: Some(false),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            users.profile(ana, bo).await,
            Err(UserError::Forbidden("Profile is private"))
        ));
        assert!(users.profile(bo, bo).await.is_ok());
        assert!(matches!(
            users.profile(ana, Uuid::new_v4()).await,
            Err(UserError::NotFound)
        ));
    }

    #[tokio::test]
    async fn blank_location_clears_it() {
        let store = Arc::new(MemoryStore::new());
        let ana = add(&store, "Ana").await;
        let users = service(store);

        let set: UpdateProfileRequest =
            serde_json::from_value(serde_json::json!({ "location": " Lisbon " })).unwrap();
        assert_eq!(
            users.update_profile(ana, set).await.unwrap().location.as_deref(),
            Some("Lisbon")
        );

        let untouched = users
            .update_profile(ana, UpdateProfileRequest::default())
            .await
            .unwrap();
        assert_eq!(untouched.location.as_deref(), Some("Lisbon"));

        let clear: UpdateProfileRequest =
            serde_json::from_value(serde_json::json!({ "location": "  " })).unwrap();
        assert_eq!(users.update_profile(ana, clear).await.unwrap().location, None);
    }

    #[tokio::test]
    async fn full_name_and_email_cannot_be_changed() {
        let store = Arc::new(MemoryStore::new());
        let ana = add(&store, "Ana").await;
        let users = service(store);

        let body = serde_json::json!({
            "fullName": "Someone Else",
            "email": "other@example.com",
            "password": "hijack",
            "bio": "  Guitarist  ",
            "skillsOffered": ["Guitar", " "],
            "availability": "weekends"
        });
        let request: UpdateProfileRequest = serde_json::from_value(body).unwrap();
        let updated = users.update_profile(ana, request).await.unwrap();

        assert_eq!(updated.full_name, "Ana");
        assert_eq!(updated.email, "ana@example.com");
        assert_eq!(updated.bio, "Guitarist");
        assert_eq!(updated.skills_offered, vec!["Guitar"]);
        assert_eq!(updated.availability, Availability::Weekends);
    }

    #[tokio::test]
    async fn inline_pictures_are_uploaded_and_urls_kept() {
        let store = Arc::new(MemoryStore::new());
        let ana = add(&store, "Ana").await;
        let users = service(store);

        let inline = format!("data:image/png;base64,{}", STANDARD.encode([1u8, 2, 3]));
        let updated = users
            .update_profile(
                ana,
                UpdateProfileRequest {
                    profile_pic: Some(inline),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            updated.profile_pic.as_deref(),
            Some("https://cdn.example.com/avatars/3.png")
        );

        let cleared = users
            .update_profile(
                ana,
                UpdateProfileRequest {
                    profile_pic: Some(String::new()),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.profile_pic, None);

        let linked = users
            .update_profile(
                ana,
                UpdateProfileRequest {
                    profile_pic: Some("https://img.example.com/me.jpg".to_string()),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            linked.profile_pic.as_deref(),
            Some("https://img.example.com/me.jpg")
        );
    }

    #[tokio::test]
    async fn inline_picture_without_uploader_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let ana = add(&store, "Ana").await;
        let users = UserService::new(store, Arc::new(DisabledUploader), None);

        let inline = format!("data:image/png;base64,{}", STANDARD.encode([1u8]));
        let result = users
            .update_profile(
                ana,
                UpdateProfileRequest {
                    profile_pic: Some(inline),
                    ..UpdateProfileRequest::default()
                },
            )
            .await;
        assert!(matches!(result, Err(UserError::Media(MediaError::NotConfigured))));
    }

    #[tokio::test]
    async fn matches_use_the_public_directory() {
        let store = Arc::new(MemoryStore::new());
        let ana = add(&store, "Ana").await;
        let bo = add(&store, "Bo").await;
        let users = service(store);

        let skills = |offered: &[&str], wanted: &[&str]| UpdateProfileRequest {
            skills_offered: Some(offered.iter().map(|s| s.to_string()).collect()),
            skills_wanted: Some(wanted.iter().map(|s| s.to_string()).collect()),
            ..UpdateProfileRequest::default()
        };
        users.update_profile(ana, skills(&["Guitar"], &["Spanish"])).await.unwrap();
        users.update_profile(bo, skills(&["spanish"], &["guitar"])).await.unwrap();

        let buckets = users.matches(ana).await.unwrap();
        assert_eq!(buckets.mutual_matches.len(), 1);
        assert_eq!(buckets.mutual_matches[0].user.id, bo);
        assert_eq!(buckets.mutual_matches[0].match_score, 100);
    }
}
