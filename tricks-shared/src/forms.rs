/// Trick creation and edit forms
///
/// A form wraps the raw request fields and the optional archive upload.
/// Validation runs in two passes: field rules declared with `validator`, then
/// rules that need the repositories (unique title, known tag and category
/// ids). A valid form yields [`ValidTrick`], whose data converts into the
/// model inputs.
///
/// # Rules
///
/// | field        | rule                                                  |
/// |--------------|-------------------------------------------------------|
/// | `title`      | 4 to 255 characters, slug unique and not reserved     |
/// | `description`| at least 10 characters                                |
/// | `code`       | required                                              |
/// | `tags`       | at least one, every id an existing tag                |
/// | `categories` | at least one, every id an existing category           |
/// | `archive`    | optional; file name must reduce to a plain file name  |
///
/// The edit form ignores the edited trick itself when checking title and
/// slug uniqueness.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::archive::UploadedArchive;
use crate::models::trick::{generate_slug, CreateTrick, UpdateTrick};
use crate::repositories::{CategoryRepository, TagRepository, TrickRepository};

/// Slugs shadowed by static routes under `/user/tricks`
pub const RESERVED_SLUGS: &[&str] = &["new"];

/// A single field validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Error returned by [`TrickForm::validate`]
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// One or more fields failed validation
    #[error("Form validation failed: {} errors", .0.len())]
    Invalid(Vec<FieldError>),

    /// A repository lookup needed by validation failed
    #[error("Database error during validation: {0}")]
    Database(#[from] sqlx::Error),
}

/// Raw trick fields as submitted
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TrickFormInput {
    #[validate(length(
        min = 4,
        max = 255,
        message = "The title must be between 4 and 255 characters."
    ))]
    pub title: String,

    #[validate(length(min = 10, message = "The description must be at least 10 characters."))]
    pub description: String,

    #[validate(length(min = 1, message = "The code field is required."))]
    pub code: String,

    /// Tag ids as strings, parsed during validation
    #[validate(length(min = 1, message = "Select at least one tag."))]
    pub tags: Vec<String>,

    /// Category ids as strings, parsed during validation
    #[validate(length(min = 1, message = "Select at least one category."))]
    pub categories: Vec<String>,
}

/// The `archive` part of a submission
#[derive(Debug, Clone)]
pub enum ArchiveUpload {
    /// No file chosen
    Absent,

    /// A usable upload
    Present(UploadedArchive),

    /// A file was sent under a name that cannot be stored
    Rejected(String),
}

impl ArchiveUpload {
    /// Classifies a multipart file part
    ///
    /// Browsers send an empty part with an empty file name when no file was
    /// chosen; that counts as absent, as does a named but empty file.
    pub fn from_part(file_name: Option<&str>, data: Bytes) -> Self {
        let file_name = file_name.unwrap_or("");
        if file_name.is_empty() || data.is_empty() {
            return ArchiveUpload::Absent;
        }

        match UploadedArchive::new(file_name, data) {
            Ok(upload) => ArchiveUpload::Present(upload),
            Err(_) => ArchiveUpload::Rejected(file_name.to_string()),
        }
    }
}

/// Validated trick fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrickData {
    pub title: String,
    pub description: String,
    pub code: String,
    pub tags: Vec<Uuid>,
    pub categories: Vec<Uuid>,
}

impl TrickData {
    /// Stamps the owner onto the data for insertion
    pub fn into_create(self, user_id: Uuid) -> CreateTrick {
        CreateTrick {
            user_id,
            title: self.title,
            description: self.description,
            code: self.code,
            tags: self.tags,
            categories: self.categories,
        }
    }

    pub fn into_update(self) -> UpdateTrick {
        UpdateTrick {
            title: self.title,
            description: self.description,
            code: self.code,
            tags: self.tags,
            categories: self.categories,
        }
    }
}

/// Outcome of a successful validation
#[derive(Debug, Clone)]
pub struct ValidTrick {
    pub data: TrickData,
    pub archive: Option<UploadedArchive>,
}

/// Creation or edit form for a trick
#[derive(Debug, Clone)]
pub struct TrickForm {
    /// Trick excluded from the title uniqueness check (edit forms)
    editing: Option<Uuid>,
    input: TrickFormInput,
    archive: ArchiveUpload,
}

impl TrickForm {
    /// Form for a new trick
    pub fn creation(input: TrickFormInput, archive: ArchiveUpload) -> Self {
        Self {
            editing: None,
            input,
            archive,
        }
    }

    /// Form bound to an existing trick
    pub fn edit(trick_id: Uuid, input: TrickFormInput, archive: ArchiveUpload) -> Self {
        Self {
            editing: Some(trick_id),
            input,
            archive,
        }
    }

    /// Validates every field, collecting all failures
    ///
    /// # Errors
    ///
    /// - `FormError::Invalid` with one entry per failed rule
    /// - `FormError::Database` when a lookup fails
    pub async fn validate(
        self,
        tricks: &dyn TrickRepository,
        tags: &dyn TagRepository,
        categories: &dyn CategoryRepository,
    ) -> Result<ValidTrick, FormError> {
        let mut input = self.input;
        input.title = input.title.trim().to_string();
        input.description = input.description.trim().to_string();
        if input.code.trim().is_empty() {
            input.code.clear();
        }

        let mut errors = match input.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };

        if !errors.iter().any(|e| e.field == "title") {
            if let Some(message) = title_conflict(tricks, &input.title, self.editing).await? {
                errors.push(FieldError::new("title", message));
            }
        }

        let tag_ids = if input.tags.is_empty() {
            Vec::new()
        } else {
            let known: HashSet<Uuid> = tags.list_all().await?.into_iter().map(|t| t.id).collect();
            match parse_known_ids(&input.tags, &known) {
                Some(ids) => ids,
                None => {
                    errors.push(FieldError::new("tags", "An unknown tag was selected."));
                    Vec::new()
                }
            }
        };

        let category_ids = if input.categories.is_empty() {
            Vec::new()
        } else {
            let known: HashSet<Uuid> = categories
                .list_all()
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect();
            match parse_known_ids(&input.categories, &known) {
                Some(ids) => ids,
                None => {
                    errors.push(FieldError::new(
                        "categories",
                        "An unknown category was selected.",
                    ));
                    Vec::new()
                }
            }
        };

        let archive = match self.archive {
            ArchiveUpload::Absent => None,
            ArchiveUpload::Present(upload) => Some(upload),
            ArchiveUpload::Rejected(_) => {
                errors.push(FieldError::new(
                    "archive",
                    "The archive file name is not valid.",
                ));
                None
            }
        };

        if !errors.is_empty() {
            return Err(FormError::Invalid(errors));
        }

        Ok(ValidTrick {
            data: TrickData {
                title: input.title,
                description: input.description,
                code: input.code,
                tags: tag_ids,
                categories: category_ids,
            },
            archive,
        })
    }
}

/// Checks the title against the slug rules and the stored tricks
async fn title_conflict(
    tricks: &dyn TrickRepository,
    title: &str,
    editing: Option<Uuid>,
) -> Result<Option<&'static str>, sqlx::Error> {
    let slug = generate_slug(title);

    let message = if slug.is_empty() {
        Some("The title must contain letters or digits.")
    } else if RESERVED_SLUGS.contains(&slug.as_str()) {
        Some("This title is reserved.")
    } else if tricks.title_exists(title, editing).await? {
        Some("The title has already been taken.")
    } else if tricks.slug_exists(&slug, editing).await? {
        Some("The title is too close to the title of another trick.")
    } else {
        None
    };

    Ok(message)
}

/// Flattens `validator` errors into field errors, ordered by field name
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect()
}

/// Parses ids and checks each against `known`, dropping duplicates
///
/// Returns `None` when any id is malformed or unknown.
fn parse_known_ids(raw: &[String], known: &HashSet<Uuid>) -> Option<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(raw.len());
    for value in raw {
        let id = Uuid::parse_str(value.trim()).ok()?;
        if !known.contains(&id) {
            return None;
        }
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Some(ids)
}
