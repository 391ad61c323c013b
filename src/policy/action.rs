//! Actions
//!
//! Actions run against one matched resource at a time. Each action edits the
//! resource's in-flight working copy and pushes the resulting state to the
//! provider with an update call, so the next action in the chain sees what the
//! previous one produced.

use super::tags::{self, DefinedTagMerge, DefinedTags, FreeformTags, QualifiedKey, TagSet};
use crate::error::{PolicyError, Result};
use crate::resource::{Resource, ResourceDef, ResourceManager};
use serde::Deserialize;
use serde_json::{Map, Value};

pub const REMOVE_TAG: &str = "remove-tag";

/// Runtime knobs shared by every action of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Plan actions on the working copy without calling the provider
    pub dry_run: bool,
    /// Resources whose action chains may run at the same time
    pub concurrency: usize,
    /// Drop a defined-tag namespace once `remove-tag` leaves it empty
    pub remove_empty_namespaces: bool,
    pub defined_tag_merge: DefinedTagMerge,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            concurrency: 4,
            remove_empty_namespaces: false,
            defined_tag_merge: DefinedTagMerge::Key,
        }
    }
}

/// One parameterized operation of a policy
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Update(UpdateAction),
    RemoveTag(RemoveTagAction),
}

/// `update-<resource>`: merge tag deltas and pass other fields through
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAction {
    pub name: String,
    pub freeform_tags: Option<FreeformTags>,
    pub defined_tags: Option<DefinedTags>,
    /// Non-tag fields of the update payload, e.g. `display_name`
    pub fields: Map<String, Value>,
}

/// `remove-tag`: delete freeform keys and qualified defined keys
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveTagAction {
    pub freeform_tags: Vec<String>,
    pub defined_tags: Vec<QualifiedKey>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateActionSpec {
    #[serde(rename = "type")]
    _kind: String,
    params: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RemoveTagSpec {
    #[serde(rename = "type")]
    _kind: String,
    #[serde(default)]
    freeform_tags: Vec<String>,
    #[serde(default)]
    defined_tags: Vec<String>,
}

impl Action {
    /// Parse one action for a resource type
    pub fn parse(spec: &Value, resource_def: &ResourceDef) -> Result<Self> {
        let kind = spec
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PolicyError::MalformedAction(format!("action without a type: {}", spec))
            })?;

        if kind == REMOVE_TAG {
            return RemoveTagAction::parse(spec).map(Self::RemoveTag);
        }

        let update_name = resource_def.update_action_name();
        if kind == update_name {
            return UpdateAction::parse(spec, resource_def).map(Self::Update);
        }

        let hint = if kind.starts_with("update-") {
            format!(" ({} supports `{}`)", resource_def.key, update_name)
        } else {
            String::new()
        };
        Err(PolicyError::MalformedAction(format!(
            "unknown action type `{}`{}",
            kind, hint
        )))
    }

    /// Parse a policy's action list
    pub fn parse_all(specs: &[Value], resource_def: &ResourceDef) -> Result<Vec<Self>> {
        specs.iter().map(|s| Self::parse(s, resource_def)).collect()
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Update(update) => &update.name,
            Self::RemoveTag(_) => REMOVE_TAG,
        }
    }

    /// Apply the action to the working copy and return the update payload
    pub fn plan(&self, working: &mut Resource, options: &ExecutionOptions) -> Value {
        let mut tag_set = TagSet::from_resource(working);
        let mut details = Map::new();

        match self {
            Self::Update(update) => {
                if let Some(freeform) = &update.freeform_tags {
                    tag_set.merge_freeform(freeform);
                    details.insert(tags::FREEFORM_TAGS.to_string(), tag_set.freeform_value());
                }
                if let Some(defined) = &update.defined_tags {
                    tag_set.merge_defined(defined, options.defined_tag_merge);
                    details.insert(tags::DEFINED_TAGS.to_string(), tag_set.defined_value());
                }
                for (key, value) in &update.fields {
                    details.insert(key.clone(), value.clone());
                }
            },
            Self::RemoveTag(remove) => {
                if !remove.freeform_tags.is_empty() {
                    tag_set.remove_freeform(&remove.freeform_tags);
                    details.insert(tags::FREEFORM_TAGS.to_string(), tag_set.freeform_value());
                }
                if !remove.defined_tags.is_empty() {
                    tag_set.remove_defined(&remove.defined_tags, options.remove_empty_namespaces);
                    details.insert(tags::DEFINED_TAGS.to_string(), tag_set.defined_value());
                }
            },
        }

        if let Value::Object(map) = working {
            for (key, value) in &details {
                map.insert(key.clone(), value.clone());
            }
        }

        Value::Object(details)
    }

    /// Apply the action to the resource `id` through its manager
    pub async fn apply(
        &self,
        manager: &dyn ResourceManager,
        id: &str,
        working: &mut Resource,
        options: &ExecutionOptions,
    ) -> Result<()> {
        let details = self.plan(working, options);

        if options.dry_run {
            tracing::info!("[dry-run] {} {}: {}", self.type_name(), id, details);
            return Ok(());
        }

        tracing::info!("{} {}", self.type_name(), id);
        manager.update(id, &details).await?;
        Ok(())
    }
}

impl UpdateAction {
    fn parse(spec: &Value, resource_def: &ResourceDef) -> Result<Self> {
        let raw = UpdateActionSpec::deserialize(spec).map_err(|e| {
            PolicyError::MalformedAction(format!("{}: {}", resource_def.update_action_name(), e))
        })?;

        let details_key = &resource_def.update_details_key;
        if let Some(unknown) = raw.params.keys().find(|k| *k != details_key) {
            return Err(PolicyError::MalformedAction(format!(
                "unknown parameter `{}`, expected `{}`",
                unknown, details_key
            )));
        }

        let details = raw
            .params
            .get(details_key)
            .and_then(|v| v.as_object())
            .ok_or_else(|| {
                PolicyError::MalformedAction(format!("params.{} must be a map", details_key))
            })?;

        let mut action = Self {
            name: resource_def.update_action_name(),
            freeform_tags: None,
            defined_tags: None,
            fields: Map::new(),
        };

        for (key, value) in details {
            match key.as_str() {
                tags::FREEFORM_TAGS => action.freeform_tags = Some(tags::parse_freeform(value)?),
                tags::DEFINED_TAGS => action.defined_tags = Some(tags::parse_defined(value)?),
                "id" => {
                    return Err(PolicyError::MalformedAction(
                        "the resource id cannot be updated".to_string(),
                    ))
                },
                _ => {
                    action.fields.insert(key.clone(), value.clone());
                },
            }
        }

        if action.freeform_tags.is_none()
            && action.defined_tags.is_none()
            && action.fields.is_empty()
        {
            return Err(PolicyError::MalformedAction(format!(
                "params.{} is empty",
                details_key
            )));
        }

        Ok(action)
    }
}

impl RemoveTagAction {
    fn parse(spec: &Value) -> Result<Self> {
        let raw = RemoveTagSpec::deserialize(spec)
            .map_err(|e| PolicyError::MalformedAction(format!("{}: {}", REMOVE_TAG, e)))?;

        if raw.freeform_tags.is_empty() && raw.defined_tags.is_empty() {
            return Err(PolicyError::MalformedAction(format!(
                "{} needs freeform_tags or defined_tags",
                REMOVE_TAG
            )));
        }

        let defined_tags = raw
            .defined_tags
            .iter()
            .map(|k| k.parse())
            .collect::<Result<Vec<QualifiedKey>>>()?;

        Ok(Self {
            freeform_tags: raw.freeform_tags,
            defined_tags,
        })
    }
}
