//! Kick and comment lifecycle
//!
//! Every operation takes the authenticated [`Caller`]. Checks run in a fixed
//! order: path ids, then body, then existence, then ownership, then the
//! store write.

use bson::oid::ObjectId;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::Caller;
use crate::config::ReadScope;
use crate::db::{
    AccountStore, Category, CommentDoc, KickChanges, KickDoc, KickStatus, KickStore,
};
use crate::services::views::{CommentView, HandleIndex, KickView, MessageView};
use crate::types::{AuthzError, NotFoundError, Result, ValidationError};

/// Configurable parts of the kick rules
#[derive(Debug, Clone, Copy, Default)]
pub struct KickPolicy {
    pub require_description: bool,
    pub read_scope: ReadScope,
}

/// POST /kicks and PUT /kicks/:id body. Unknown keys (such as `owner`) are
/// ignored, and `null` is the same as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub completion_date: Option<String>,
}

/// PATCH /kicks/:id/status body
#[derive(Debug, Default, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

/// Comment create/update body
#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Parse a 24-char hex path id
pub fn parse_id(raw: &str, kind: &'static str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| ValidationError::InvalidId(kind).into())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_category(raw: &str) -> Result<Category> {
    Category::parse(raw).ok_or_else(|| {
        ValidationError::InvalidEnum {
            field: "category",
            value: raw.to_string(),
            allowed: Category::allowed(),
        }
        .into()
    })
}

fn parse_status(raw: &str) -> Result<KickStatus> {
    KickStatus::parse(raw).ok_or_else(|| {
        ValidationError::InvalidEnum {
            field: "status",
            value: raw.to_string(),
            allowed: KickStatus::allowed(),
        }
        .into()
    })
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp
fn parse_date(raw: &str, field: &'static str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| {
            ValidationError::InvalidField {
                field,
                reason: format!("'{}' is not a YYYY-MM-DD or RFC 3339 date", raw),
            }
            .into()
        })
}

fn optional_date(value: &Option<String>, field: &'static str) -> Result<Option<NaiveDate>> {
    present(value).map(|raw| parse_date(raw, field)).transpose()
}

fn comment_text(req: &CommentRequest) -> Result<String> {
    present(&req.text)
        .map(str::to_string)
        .ok_or_else(|| ValidationError::MissingFields(vec!["text"]).into())
}

#[derive(Clone)]
pub struct KickService {
    kicks: Arc<dyn KickStore>,
    accounts: Arc<dyn AccountStore>,
    policy: KickPolicy,
}

impl KickService {
    pub fn new(
        kicks: Arc<dyn KickStore>,
        accounts: Arc<dyn AccountStore>,
        policy: KickPolicy,
    ) -> Self {
        Self {
            kicks,
            accounts,
            policy,
        }
    }

    /// Create a kick owned by the caller
    pub async fn create(&self, caller: &Caller, req: KickRequest) -> Result<KickView> {
        let mut missing = Vec::new();
        let title = present(&req.title);
        let category = present(&req.category);
        let description = present(&req.description);
        if title.is_none() {
            missing.push("title");
        }
        if category.is_none() {
            missing.push("category");
        }
        if self.policy.require_description && description.is_none() {
            missing.push("description");
        }
        let (Some(title), Some(category)) = (title, category) else {
            return Err(ValidationError::MissingFields(missing).into());
        };
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing).into());
        }

        let mut kick = KickDoc::new(title.to_string(), parse_category(category)?, caller.id);
        kick.description = description.map(str::to_string);
        kick.location = present(&req.location).map(str::to_string);
        if let Some(status) = present(&req.status) {
            kick.status = parse_status(status)?;
        }
        kick.target_date = optional_date(&req.target_date, "targetDate")?;
        kick.completion_date = optional_date(&req.completion_date, "completionDate")?;

        let kick = self.kicks.insert_kick(kick).await?;
        info!("Kick created: {} by {}", id_of(&kick), caller.handle);

        Ok(KickView::build(&kick, &caller_index(caller)))
    }

    /// The caller's kicks, newest first
    pub async fn list(&self, caller: &Caller) -> Result<Vec<KickView>> {
        let kicks = self.kicks.list_by_owner(&caller.id).await?;
        let handles = caller_index(caller);
        Ok(kicks.iter().map(|k| KickView::build(k, &handles)).collect())
    }

    /// Single kick with owner and comment authors populated
    pub async fn get(&self, caller: &Caller, raw_id: &str) -> Result<KickView> {
        let id = parse_id(raw_id, "kick")?;
        let kick = self.find(&id).await?;

        if self.policy.read_scope == ReadScope::OwnerOnly && kick.owner != caller.id {
            debug!("Kick {} hidden from non-owner {}", id, caller.handle);
            return Err(NotFoundError::Kick.into());
        }

        let handles = self.populate(&kick).await?;
        Ok(KickView::build(&kick, &handles))
    }

    /// Partial update, owner only
    pub async fn update(&self, caller: &Caller, raw_id: &str, req: KickRequest) -> Result<KickView> {
        let id = parse_id(raw_id, "kick")?;
        let changes = self.changes_from(&req)?;

        let kick = self.find(&id).await?;
        ensure_owner(&kick, caller)?;

        let updated = self
            .kicks
            .update_kick(&id, &changes)
            .await?
            .ok_or(NotFoundError::Kick)?;
        info!("Kick updated: {} by {}", id, caller.handle);

        let handles = self.populate(&updated).await?;
        Ok(KickView::build(&updated, &handles))
    }

    /// Status-only transition, owner only
    pub async fn update_status(
        &self,
        caller: &Caller,
        raw_id: &str,
        req: StatusRequest,
    ) -> Result<KickView> {
        let id = parse_id(raw_id, "kick")?;
        let status = present(&req.status)
            .ok_or_else(|| ValidationError::MissingFields(vec!["status"]))?;
        let changes = KickChanges {
            status: Some(parse_status(status)?),
            ..Default::default()
        };

        let kick = self.find(&id).await?;
        ensure_owner(&kick, caller)?;

        let updated = self
            .kicks
            .update_kick(&id, &changes)
            .await?
            .ok_or(NotFoundError::Kick)?;
        info!("Kick {} status -> {}", id, status);

        let handles = self.populate(&updated).await?;
        Ok(KickView::build(&updated, &handles))
    }

    /// Delete a kick and its comments, owner only
    pub async fn delete(&self, caller: &Caller, raw_id: &str) -> Result<MessageView> {
        let id = parse_id(raw_id, "kick")?;
        let kick = self.find(&id).await?;
        ensure_owner(&kick, caller)?;

        if !self.kicks.delete_kick(&id).await? {
            return Err(NotFoundError::Kick.into());
        }
        info!("Kick deleted: {} by {}", id, caller.handle);

        Ok(MessageView::new("Kick deleted successfully"))
    }

    /// Append a comment by the caller to any existing kick
    pub async fn add_comment(
        &self,
        caller: &Caller,
        raw_kick_id: &str,
        req: CommentRequest,
    ) -> Result<CommentView> {
        let kick_id = parse_id(raw_kick_id, "kick")?;
        let text = comment_text(&req)?;

        let comment = CommentDoc::new(text, caller.id);
        if !self.kicks.push_comment(&kick_id, comment.clone()).await? {
            return Err(NotFoundError::Kick.into());
        }
        debug!("Comment {} added to kick {}", comment._id, kick_id);

        Ok(CommentView::build(&comment, &caller_index(caller)))
    }

    /// Replace a comment's text, author only
    pub async fn update_comment(
        &self,
        caller: &Caller,
        raw_kick_id: &str,
        raw_comment_id: &str,
        req: CommentRequest,
    ) -> Result<CommentView> {
        let kick_id = parse_id(raw_kick_id, "kick")?;
        let comment_id = parse_id(raw_comment_id, "comment")?;
        let text = comment_text(&req)?;

        let kick = self.find(&kick_id).await?;
        ensure_author(&kick, &comment_id, caller)?;

        let comment = self
            .kicks
            .set_comment_text(&kick_id, &comment_id, &text)
            .await?
            .ok_or(NotFoundError::Comment)?;
        debug!("Comment {} on kick {} edited", comment_id, kick_id);

        Ok(CommentView::build(&comment, &caller_index(caller)))
    }

    /// Remove one comment, author only
    pub async fn delete_comment(
        &self,
        caller: &Caller,
        raw_kick_id: &str,
        raw_comment_id: &str,
    ) -> Result<MessageView> {
        let kick_id = parse_id(raw_kick_id, "kick")?;
        let comment_id = parse_id(raw_comment_id, "comment")?;

        let kick = self.find(&kick_id).await?;
        ensure_author(&kick, &comment_id, caller)?;

        if !self.kicks.pull_comment(&kick_id, &comment_id).await? {
            return Err(NotFoundError::Comment.into());
        }
        debug!("Comment {} removed from kick {}", comment_id, kick_id);

        Ok(MessageView::new("Comment deleted successfully"))
    }

    async fn find(&self, id: &ObjectId) -> Result<KickDoc> {
        self.kicks
            .find_kick(id)
            .await?
            .ok_or_else(|| NotFoundError::Kick.into())
    }

    /// Resolve handles for the owner and every comment author
    async fn populate(&self, kick: &KickDoc) -> Result<HandleIndex> {
        let ids: HashSet<ObjectId> = std::iter::once(kick.owner)
            .chain(kick.comments.iter().map(|c| c.author))
            .collect();
        let ids: Vec<ObjectId> = ids.into_iter().collect();

        Ok(self
            .accounts
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .filter_map(|a| a._id.map(|id| (id, a.handle)))
            .collect())
    }

    fn changes_from(&self, req: &KickRequest) -> Result<KickChanges> {
        let mut changes = KickChanges {
            title: req.title.as_deref().map(|t| t.trim().to_string()),
            description: req.description.as_deref().map(|d| d.trim().to_string()),
            location: req.location.as_deref().map(|l| l.trim().to_string()),
            ..Default::default()
        };
        if let Some(category) = &req.category {
            changes.category = Some(parse_category(category.trim())?);
        }
        if let Some(status) = &req.status {
            changes.status = Some(parse_status(status.trim())?);
        }
        if let Some(date) = &req.target_date {
            changes.target_date = Some(parse_date(date.trim(), "targetDate")?);
        }
        if let Some(date) = &req.completion_date {
            changes.completion_date = Some(parse_date(date.trim(), "completionDate")?);
        }

        if changes.is_empty() {
            return Err(ValidationError::NoFields.into());
        }
        if changes.title.as_deref() == Some("") {
            return Err(ValidationError::InvalidField {
                field: "title",
                reason: "must not be empty".into(),
            }
            .into());
        }
        if self.policy.require_description && changes.description.as_deref() == Some("") {
            return Err(ValidationError::InvalidField {
                field: "description",
                reason: "must not be empty".into(),
            }
            .into());
        }
        Ok(changes)
    }
}

fn ensure_owner(kick: &KickDoc, caller: &Caller) -> Result<()> {
    if kick.owner != caller.id {
        debug!("{} is not the owner of kick {}", caller.handle, id_of(kick));
        return Err(AuthzError::NotOwner.into());
    }
    Ok(())
}

fn ensure_author(kick: &KickDoc, comment_id: &ObjectId, caller: &Caller) -> Result<()> {
    let comment = kick.comment(comment_id).ok_or(NotFoundError::Comment)?;
    if comment.author != caller.id {
        debug!("{} is not the author of comment {}", caller.handle, comment_id);
        return Err(AuthzError::NotAuthor.into());
    }
    Ok(())
}

fn caller_index(caller: &Caller) -> HandleIndex {
    HandleIndex::from([(caller.id, caller.handle.clone())])
}

fn id_of(kick: &KickDoc) -> String {
    kick._id.map(|id| id.to_hex()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AccountDoc, MemoryAccountStore, MemoryKickStore};
    use crate::types::KicklistError;

    struct Fixture {
        svc: KickService,
        kicks: Arc<MemoryKickStore>,
        owner: Caller,
        other: Caller,
    }

    async fn fixture(policy: KickPolicy) -> Fixture {
        let accounts = Arc::new(MemoryAccountStore::new());
        let kicks = Arc::new(MemoryKickStore::new());

        let mut callers = Vec::new();
        for handle in ["owner", "other"] {
            let doc = accounts
                .create_account(AccountDoc::new(
                    handle.into(),
                    handle.into(),
                    format!("{handle}@example.com"),
                    "$argon2id$stub".into(),
                ))
                .await
                .unwrap();
            callers.push(Caller {
                id: doc._id.unwrap(),
                handle: handle.into(),
            });
        }
        let other = callers.pop().unwrap();
        let owner = callers.pop().unwrap();

        Fixture {
            svc: KickService::new(kicks.clone(), accounts, policy),
            kicks,
            owner,
            other,
        }
    }

    fn climbing() -> KickRequest {
        KickRequest {
            title: Some("Learn Rock Climbing".into()),
            category: Some("Adventure".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_get() {
        let f = fixture(KickPolicy::default()).await;
        let created = f.svc.create(&f.owner, climbing()).await.unwrap();

        let fetched = f.svc.get(&f.owner, &created.id).await.unwrap();
        assert_eq!(fetched.status, "Open");
        assert!(fetched.comments.is_empty());
        assert_eq!(fetched.owner.handle.as_deref(), Some("owner"));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_category_without_persisting() {
        let f = fixture(KickPolicy::default()).await;
        let err = f
            .svc
            .create(
                &f.owner,
                KickRequest {
                    category: Some("Invalid".into()),
                    ..climbing()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            KicklistError::Validation(ValidationError::InvalidEnum { field: "category", .. })
        ));
        assert!(f.kicks.is_empty());
    }

    #[tokio::test]
    async fn test_required_description_policy() {
        let f = fixture(KickPolicy {
            require_description: true,
            ..Default::default()
        })
        .await;

        let err = f.svc.create(&f.owner, climbing()).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: description");

        let ok = f
            .svc
            .create(
                &f.owner,
                KickRequest {
                    description: Some("Indoor first".into()),
                    ..climbing()
                },
            )
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden_and_leaves_kick() {
        let f = fixture(KickPolicy::default()).await;
        let created = f.svc.create(&f.owner, climbing()).await.unwrap();

        let err = f
            .svc
            .update(
                &f.other,
                &created.id,
                KickRequest {
                    title: Some("Hijacked".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, KicklistError::Forbidden(AuthzError::NotOwner)));

        let fetched = f.svc.get(&f.owner, &created.id).await.unwrap();
        assert_eq!(fetched.title, "Learn Rock Climbing");
    }

    #[tokio::test]
    async fn test_empty_update_rejected_before_lookup() {
        let f = fixture(KickPolicy::default()).await;
        let err = f
            .svc
            .update(&f.owner, &ObjectId::new().to_hex(), KickRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KicklistError::Validation(ValidationError::NoFields)
        ));
    }

    #[tokio::test]
    async fn test_partial_update_and_status() {
        let f = fixture(KickPolicy::default()).await;
        let created = f.svc.create(&f.owner, climbing()).await.unwrap();

        let updated = f
            .svc
            .update(
                &f.owner,
                &created.id,
                KickRequest {
                    location: Some("Yosemite".into()),
                    target_date: Some("2027-05-01".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.location.as_deref(), Some("Yosemite"));
        assert_eq!(updated.target_date.as_deref(), Some("2027-05-01"));
        assert_eq!(updated.title, "Learn Rock Climbing");

        let done = f
            .svc
            .update_status(
                &f.owner,
                &created.id,
                StatusRequest {
                    status: Some("Completed".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(done.status, "Completed");

        let bad = f
            .svc
            .update_status(
                &f.owner,
                &created.id,
                StatusRequest {
                    status: Some("Done".into()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(bad.status_code(), hyper::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_owner_only_read_scope_hides_kick() {
        let f = fixture(KickPolicy {
            read_scope: ReadScope::OwnerOnly,
            ..Default::default()
        })
        .await;
        let created = f.svc.create(&f.owner, climbing()).await.unwrap();

        let err = f.svc.get(&f.other, &created.id).await.unwrap_err();
        assert!(matches!(err, KicklistError::NotFound(NotFoundError::Kick)));
        assert!(f.svc.get(&f.owner, &created.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_id_rejected() {
        let f = fixture(KickPolicy::default()).await;
        let err = f.svc.get(&f.owner, "not-an-id").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid kick id");
    }

    #[tokio::test]
    async fn test_comment_author_rules() {
        let f = fixture(KickPolicy::default()).await;
        let kick = f.svc.create(&f.owner, climbing()).await.unwrap();

        let comment = f
            .svc
            .add_comment(
                &f.other,
                &kick.id,
                CommentRequest {
                    text: Some("  Start bouldering  ".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(comment.text, "Start bouldering");

        // The kick owner is not the comment author
        let err = f
            .svc
            .delete_comment(&f.owner, &kick.id, &comment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, KicklistError::Forbidden(AuthzError::NotAuthor)));

        let edited = f
            .svc
            .update_comment(
                &f.other,
                &kick.id,
                &comment.id,
                CommentRequest {
                    text: Some("Start top-roping".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.text, "Start top-roping");

        let fetched = f.svc.get(&f.owner, &kick.id).await.unwrap();
        assert_eq!(fetched.comments[0].author.handle.as_deref(), Some("other"));

        f.svc
            .delete_comment(&f.other, &kick.id, &comment.id)
            .await
            .unwrap();
        let err = f
            .svc
            .delete_comment(&f.other, &kick.id, &comment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, KicklistError::NotFound(NotFoundError::Comment)));
    }

    #[tokio::test]
    async fn test_blank_comment_rejected() {
        let f = fixture(KickPolicy::default()).await;
        let kick = f.svc.create(&f.owner, climbing()).await.unwrap();

        let err = f
            .svc
            .add_comment(
                &f.owner,
                &kick.id,
                CommentRequest {
                    text: Some("   ".into()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: text");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_comments() {
        let f = fixture(KickPolicy::default()).await;
        let kick = f.svc.create(&f.owner, climbing()).await.unwrap();
        let comment = f
            .svc
            .add_comment(
                &f.other,
                &kick.id,
                CommentRequest {
                    text: Some("Good luck".into()),
                },
            )
            .await
            .unwrap();

        f.svc.delete(&f.owner, &kick.id).await.unwrap();

        let err = f
            .svc
            .update_comment(
                &f.other,
                &kick.id,
                &comment.id,
                CommentRequest {
                    text: Some("Still here?".into()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, KicklistError::NotFound(NotFoundError::Kick)));
    }

    #[tokio::test]
    async fn test_concurrent_comments_both_persist() {
        let f = fixture(KickPolicy::default()).await;
        let kick = f.svc.create(&f.owner, climbing()).await.unwrap();

        let tasks: Vec<_> = [f.owner.clone(), f.other.clone()]
            .into_iter()
            .map(|caller| {
                let svc = f.svc.clone();
                let kick_id = kick.id.clone();
                tokio::spawn(async move {
                    svc.add_comment(
                        &caller,
                        &kick_id,
                        CommentRequest {
                            text: Some(format!("from {}", caller.handle)),
                        },
                    )
                    .await
                })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        let fetched = f.svc.get(&f.owner, &kick.id).await.unwrap();
        assert_eq!(fetched.comments.len(), 2);
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(
            parse_date("2027-01-15", "targetDate").unwrap(),
            NaiveDate::from_ymd_opt(2027, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date("2027-01-15T10:00:00Z", "targetDate").unwrap(),
            NaiveDate::from_ymd_opt(2027, 1, 15).unwrap()
        );
        assert!(parse_date("next year", "targetDate").is_err());
    }
}
