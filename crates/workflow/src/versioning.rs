//! Template version chain: snapshot, edit, restore and diff
//!
//! All functions are copy-on-write. The input template is never modified;
//! each mutation appends exactly one snapshot of the pre-mutation content
//! and bumps `version` by one.

use crate::approval::reset_after_edit;
use crate::model::{ContractTemplate, TemplateContent, TemplateEdit, TemplateVersion};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot the current content and advance the version counter
pub fn create_new_version(
    template: &ContractTemplate,
    change_notes: &str,
    username: &str,
    now: DateTime<Utc>,
) -> ContractTemplate {
    let mut next = template.clone();
    next.version_history.push(TemplateVersion {
        id: Uuid::new_v4(),
        template_id: template.id,
        version: template.version,
        content: template.content.clone(),
        created_at: now,
        created_by: username.to_string(),
        change_notes: change_notes.to_string(),
    });
    next.version += 1;
    next.updated_at = now;
    next.last_modified_by = username.to_string();
    reset_after_edit(&mut next);
    next
}

/// Snapshot, then overwrite the content fields present in `edit`
pub fn apply_edit(
    template: &ContractTemplate,
    edit: TemplateEdit,
    change_notes: &str,
    username: &str,
    now: DateTime<Utc>,
) -> ContractTemplate {
    let mut next = create_new_version(template, change_notes, username, now);
    edit.apply_to(&mut next.content);
    next
}

/// Bring back the content of a historical version as a new version.
///
/// Returns `None` when `version_id` is not in the history.
pub fn restore_version(
    template: &ContractTemplate,
    version_id: Uuid,
    username: &str,
    now: DateTime<Utc>,
) -> Option<ContractTemplate> {
    let target = template.find_version(version_id)?;
    let notes = format!("State before restoring to version {}", target.version);
    let content = target.content.clone();

    let mut next = create_new_version(template, &notes, username, now);
    next.content = content;
    Some(next)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange<T> {
    pub before: T,
    pub after: T,
    pub changed: bool,
}

impl<T: PartialEq + Clone> FieldChange<T> {
    fn between(before: &T, after: &T) -> Self {
        Self {
            changed: before != after,
            before: before.clone(),
            after: after.clone(),
        }
    }
}

/// Per-field comparison of two template contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDiff {
    pub name: FieldChange<String>,
    pub description: FieldChange<String>,
    pub contract_type: FieldChange<String>,
    pub responsibilities: FieldChange<Vec<String>>,
    pub default_duration: FieldChange<Option<u32>>,
    pub category: FieldChange<String>,
}

impl TemplateDiff {
    /// Wire names of the fields that differ
    pub fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.changed),
            ("description", self.description.changed),
            ("contractType", self.contract_type.changed),
            ("responsibilities", self.responsibilities.changed),
            ("defaultDuration", self.default_duration.changed),
            ("category", self.category.changed),
        ]
        .into_iter()
        .filter_map(|(field, changed)| changed.then_some(field))
        .collect()
    }
}

pub fn compare_versions(a: &TemplateContent, b: &TemplateContent) -> TemplateDiff {
    TemplateDiff {
        name: FieldChange::between(&a.name, &b.name),
        description: FieldChange::between(&a.description, &b.description),
        contract_type: FieldChange::between(&a.contract_type, &b.contract_type),
        responsibilities: FieldChange::between(&a.responsibilities, &b.responsibilities),
        default_duration: FieldChange::between(&a.default_duration, &b.default_duration),
        category: FieldChange::between(&a.category, &b.category),
    }
}

/// Either a stored version or the live content of the template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionRef {
    Current,
    Stored(Uuid),
}

impl VersionRef {
    /// `"current"` or a version id
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("current") {
            return Some(VersionRef::Current);
        }
        Uuid::parse_str(raw).ok().map(VersionRef::Stored)
    }

    pub fn resolve<'a>(&self, template: &'a ContractTemplate) -> Option<&'a TemplateContent> {
        match self {
            VersionRef::Current => Some(&template.content),
            VersionRef::Stored(id) => template.find_version(*id).map(|v| &v.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{transition, ApprovalEvent};
    use pactforge_common::ApprovalStatus;

    fn template() -> ContractTemplate {
        ContractTemplate::new(
            TemplateContent {
                name: "Promoter".into(),
                description: "Standard promoter assignment".into(),
                contract_type: "promoter".into(),
                responsibilities: vec!["Attend".into()],
                default_duration: Some(30),
                category: "retail".into(),
            },
            "alice",
            Utc::now(),
        )
    }

    fn rename(t: &ContractTemplate, name: &str) -> ContractTemplate {
        apply_edit(
            t,
            TemplateEdit {
                name: Some(name.into()),
                ..Default::default()
            },
            "rename",
            "alice",
            Utc::now(),
        )
    }

    #[test]
    fn test_version_monotonicity() {
        let mut t = template();
        for n in 1..=5 {
            t = create_new_version(&t, &format!("edit {n}"), "alice", Utc::now());
            assert_eq!(t.version, n + 1);
            assert_eq!(t.version_history.len() as i32, n);
        }
        let numbers: Vec<i32> = t.version_history.iter().map(|v| v.version).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let t = template();
        let next = rename(&t, "Renamed");
        assert_eq!(t.version, 1);
        assert!(t.version_history.is_empty());
        assert_eq!(t.content.name, "Promoter");
        assert_eq!(next.content.name, "Renamed");
        assert_eq!(next.version_history[0].content.name, "Promoter");
    }

    #[test]
    fn test_restore_correctness() {
        let t0 = template();
        let t1 = rename(&t0, "Second");
        let t2 = rename(&t1, "Third");
        let v1 = t2.version_history[0].clone();

        let restored = restore_version(&t2, v1.id, "bob", Utc::now()).unwrap();
        assert_eq!(restored.content, v1.content);
        assert_eq!(restored.version, t2.version + 1);
        assert_eq!(restored.version_history.len(), 3);

        let last = restored.version_history.last().unwrap();
        assert_eq!(last.change_notes, "State before restoring to version 1");
        assert_eq!(last.content.name, "Third");
        assert_eq!(restored.last_modified_by, "bob");
    }

    #[test]
    fn test_restore_unknown_version_is_none() {
        let t = rename(&template(), "Second");
        assert!(restore_version(&t, Uuid::new_v4(), "bob", Utc::now()).is_none());
    }

    #[test]
    fn test_compare_same_version_is_unchanged() {
        let t = template();
        let diff = compare_versions(&t.content, &t.content);
        assert!(diff.changed_fields().is_empty());
        assert!(!diff.name.changed);
        assert!(!diff.responsibilities.changed);
    }

    #[test]
    fn test_compare_reports_changed_fields() {
        let t0 = template();
        let t1 = apply_edit(
            &t0,
            TemplateEdit {
                category: Some("events".into()),
                responsibilities: Some(vec!["Attend".into(), "Report".into()]),
                ..Default::default()
            },
            "scope",
            "alice",
            Utc::now(),
        );
        let diff = compare_versions(&t1.version_history[0].content, &t1.content);
        assert_eq!(diff.changed_fields(), vec!["responsibilities", "category"]);
        assert_eq!(diff.category.before, "retail");
        assert_eq!(diff.category.after, "events");
    }

    #[test]
    fn test_edit_after_approval_resets_to_draft() {
        let mut t = template();
        transition(&mut t, &ApprovalEvent::Submit, "alice", Utc::now()).unwrap();
        transition(&mut t, &ApprovalEvent::Approve { comments: None }, "boss", Utc::now()).unwrap();
        assert!(t.is_published);

        let edited = rename(&t, "Changed");
        assert_eq!(edited.status(), ApprovalStatus::Draft);
        assert!(edited.approval.approved_at.is_none());
        assert!(edited.approval.approved_by.is_none());
        assert!(!edited.is_published);
    }

    #[test]
    fn test_version_ref_parse() {
        let t = rename(&template(), "Second");
        let id = t.version_history[0].id;

        assert_eq!(VersionRef::parse("current"), Some(VersionRef::Current));
        assert_eq!(VersionRef::parse(&id.to_string()), Some(VersionRef::Stored(id)));
        assert!(VersionRef::parse("v3").is_none());

        let stored = VersionRef::Stored(id).resolve(&t).unwrap();
        assert_eq!(stored.name, "Promoter");
    }
}
