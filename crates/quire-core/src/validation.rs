//! Post form input and field-level validation errors.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::{Post, PostFields};

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    /// All messages, field by field.
    pub fn messages(&self) -> Vec<&str> {
        self.0.values().flatten().map(String::as_str).collect()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join(", "))
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid.", field.replace('_', " ")));
                out.add(field.to_string(), message);
            }
        }
        out
    }
}

pub fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some(Cow::from("This field is required."));
        Err(error)
    } else {
        Ok(())
    }
}

/// A submitted post form, before any rule has run.
///
/// Every field defaults so that a form missing keys still deserializes and
/// reports field errors instead of failing as a malformed request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PostInput {
    #[validate(custom(function = "validate_required", message = "The title field is required."))]
    #[validate(length(max = 255, message = "The title may not be greater than 255 characters."))]
    pub title: String,

    #[validate(custom(function = "validate_required", message = "The slug field is required."))]
    #[validate(length(max = 255, message = "The slug may not be greater than 255 characters."))]
    pub slug: String,

    #[validate(required(message = "The category id field is required."))]
    pub category_id: Option<i64>,

    #[validate(custom(function = "validate_required", message = "The creator field is required."))]
    #[validate(length(max = 50, message = "The creator may not be greater than 50 characters."))]
    pub creator: String,

    #[validate(custom(
        function = "validate_required",
        message = "The description field is required."
    ))]
    pub description: String,

    #[validate(url(message = "The image format is invalid."))]
    #[validate(length(max = 255, message = "The image may not be greater than 255 characters."))]
    pub image: Option<String>,

    #[validate(custom(
        function = "validate_required",
        message = "The date creation field is required."
    ))]
    #[validate(length(max = 20, message = "The date creation may not be greater than 20 characters."))]
    pub date_creation: String,

    #[serde(alias = "tags[]")]
    pub tags: Vec<i64>,
}

impl PostInput {
    /// Trim text fields; a blank image means no image.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            slug: self.slug.trim().to_string(),
            category_id: self.category_id,
            creator: self.creator.trim().to_string(),
            description: self.description.trim().to_string(),
            image: self
                .image
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty()),
            date_creation: self.date_creation.trim().to_string(),
            tags: self.tags,
        }
    }

    /// Distinct submitted tag ids.
    pub fn tag_set(&self) -> BTreeSet<i64> {
        self.tags.iter().copied().collect()
    }

    /// Run the static field rules.
    pub fn check(&self) -> FieldErrors {
        match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(errors) => errors.into(),
        }
    }

    /// Convert into persistable fields. Returns `None` while a required value is missing.
    pub fn into_fields(self) -> Option<PostFields> {
        let tag_ids = self.tag_set();
        Some(PostFields {
            title: self.title,
            slug: self.slug,
            category_id: self.category_id?,
            creator: self.creator,
            description: self.description,
            image: self.image,
            date_creation: self.date_creation,
            tag_ids,
        })
    }
}

impl From<&Post> for PostInput {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            category_id: Some(post.category_id),
            creator: post.creator.clone(),
            description: post.description.clone(),
            image: post.image.clone(),
            date_creation: post.date_creation.clone(),
            tags: post.tag_ids.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PostInput {
        PostInput {
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            category_id: Some(1),
            creator: "Bob".to_string(),
            description: "x".to_string(),
            image: None,
            date_creation: "2020-01-01".to_string(),
            tags: vec![1, 2],
        }
    }

    #[test]
    fn test_valid_input_has_no_errors() {
        assert!(valid().check().is_empty());
    }

    #[test]
    fn test_every_required_field_is_reported() {
        let errors = PostInput::default().check();

        for field in [
            "title",
            "slug",
            "category_id",
            "creator",
            "description",
            "date_creation",
        ] {
            assert!(errors.has(field), "missing error for {field}");
        }
        assert!(!errors.has("image"));
        assert!(!errors.has("tags"));
        assert_eq!(errors.first("title"), Some("The title field is required."));
    }

    #[test]
    fn test_blank_strings_count_as_missing() {
        let input = PostInput {
            title: "   ".to_string(),
            ..valid()
        };
        assert!(input.check().has("title"));
    }

    #[test]
    fn test_length_limits() {
        let input = PostInput {
            title: "t".repeat(256),
            creator: "c".repeat(51),
            date_creation: "d".repeat(21),
            ..valid()
        };
        let errors = input.check();

        assert_eq!(
            errors.first("title"),
            Some("The title may not be greater than 255 characters.")
        );
        assert!(errors.has("creator"));
        assert!(errors.has("date_creation"));

        let at_limit = PostInput {
            title: "t".repeat(255),
            creator: "c".repeat(50),
            date_creation: "d".repeat(20),
            ..valid()
        };
        assert!(at_limit.check().is_empty());
    }

    #[test]
    fn test_image_must_be_url() {
        let input = PostInput {
            image: Some("not a url".to_string()),
            ..valid()
        };
        assert_eq!(
            input.check().first("image"),
            Some("The image format is invalid.")
        );

        let input = PostInput {
            image: Some("https://example.com/cover.png".to_string()),
            ..valid()
        };
        assert!(input.check().is_empty());
    }

    #[test]
    fn test_normalized_trims_and_drops_blank_image() {
        let input = PostInput {
            title: "  Hello ".to_string(),
            image: Some("  ".to_string()),
            ..valid()
        }
        .normalized();

        assert_eq!(input.title, "Hello");
        assert_eq!(input.image, None);
    }

    #[test]
    fn test_into_fields_collapses_duplicate_tags() {
        let input = PostInput {
            tags: vec![2, 1, 2],
            ..valid()
        };
        let fields = input.into_fields().unwrap();
        assert_eq!(fields.tag_ids, BTreeSet::from([1, 2]));
    }

    #[test]
    fn test_display_joins_messages() {
        let mut errors = FieldErrors::new();
        errors.add("slug", "The slug has already been taken.");
        errors.add("title", "The title field is required.");
        assert_eq!(
            errors.to_string(),
            "The slug has already been taken., The title field is required."
        );
    }
}
