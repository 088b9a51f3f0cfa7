/// The signed-in user's trick pages
///
/// | method | path                                 | handler          |
/// |--------|--------------------------------------|------------------|
/// | GET    | `/user`                              | [`index`]        |
/// | GET    | `/user/tricks/new`                   | [`create_form`]  |
/// | POST   | `/user/tricks/new`                   | [`store`]        |
/// | GET    | `/user/tricks/:slug`                 | [`edit_form`]    |
/// | POST   | `/user/tricks/:slug`                 | [`update`]       |
/// | GET    | `/user/tricks/:slug/delete`          | [`delete`]       |
/// | GET    | `/user/tricks/:slug/archive/delete`  | [`delete_archive`] |
///
/// Every route needs a valid access token. The `:slug` routes also run the
/// owner guard, which resolves the trick and hands it to the handler as
/// `Extension<Trick>`.
///
/// Form posts are `multipart/form-data` with the fields `title`,
/// `description`, `code`, repeated `tags` and `categories` (trick ids, a `[]`
/// suffix is accepted) and an optional `archive` file.

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    Extension,
};
use serde_json::json;
use tracing::{debug, info};
use tricks_shared::{
    auth::middleware::AuthContext,
    forms::{ArchiveUpload, FieldError, FormError, TrickForm, TrickFormInput, ValidTrick},
    lang::Message,
    models::trick::Trick,
};

use crate::{
    app::AppState,
    error::ApiResult,
    response::{FlashRedirect, View},
};

pub const USER_INDEX_PATH: &str = "/user";
pub const NEW_TRICK_PATH: &str = "/user/tricks/new";

/// Path of the edit page for `slug`
pub fn edit_path(slug: &str) -> String {
    format!("/user/tricks/{}", slug)
}

/// Lists the caller's tricks, newest first
pub async fn index(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<View> {
    let tricks = state.tricks.list_for_user(auth.user_id).await?;

    Ok(View::new("user.index", json!({ "tricks": tricks })))
}

pub async fn create_form(State(state): State<AppState>) -> ApiResult<View> {
    let tag_list = state.tags.list_all().await?;
    let category_list = state.categories.list_all().await?;

    Ok(View::new(
        "tricks.new",
        json!({
            "tag_list": tag_list,
            "category_list": category_list,
        }),
    ))
}

/// Creates a trick owned by the caller
///
/// An invalid form redirects back with the errors and writes nothing.
pub async fn store(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<FlashRedirect> {
    let (input, archive) = read_submission(multipart).await?;

    let valid = match validate(&state, TrickForm::creation(input, archive)).await? {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(FlashRedirect::back(&headers, NEW_TRICK_PATH).with_errors(errors));
        }
    };

    let trick = state
        .tricks
        .create(valid.data.into_create(auth.user_id))
        .await?;

    if let Some(upload) = &valid.archive {
        state.archives.store(trick.id, upload).await?;
    }

    info!(
        trick_id = %trick.id,
        user_id = %auth.user_id,
        slug = %trick.slug,
        with_archive = valid.archive.is_some(),
        "Trick created"
    );

    Ok(FlashRedirect::to(USER_INDEX_PATH))
}

pub async fn edit_form(
    State(state): State<AppState>,
    Extension(trick): Extension<Trick>,
) -> ApiResult<View> {
    let tag_list = state.tags.list_all().await?;
    let category_list = state.categories.list_all().await?;
    let selected_tags = state.tricks.list_tag_ids_for_trick(&trick).await?;
    let selected_categories = state.tricks.list_category_ids_for_trick(&trick).await?;
    let archive = state.archives.current(trick.id).await?;

    Ok(View::new(
        "tricks.edit",
        json!({
            "tag_list": tag_list,
            "selected_tags": selected_tags,
            "category_list": category_list,
            "selected_categories": selected_categories,
            "archive": archive,
            "trick": trick,
        }),
    ))
}

/// Applies an edit; a new archive replaces the whole archive folder
pub async fn update(
    State(state): State<AppState>,
    Extension(trick): Extension<Trick>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<FlashRedirect> {
    let (input, archive) = read_submission(multipart).await?;

    let valid = match validate(&state, TrickForm::edit(trick.id, input, archive)).await? {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(FlashRedirect::back(&headers, edit_path(&trick.slug)).with_errors(errors));
        }
    };

    let updated = state.tricks.edit(&trick, valid.data.into_update()).await?;

    if let Some(upload) = &valid.archive {
        state.archives.replace(trick.id, upload).await?;
    }

    info!(
        trick_id = %trick.id,
        old_slug = %trick.slug,
        slug = %updated.slug,
        archive_replaced = valid.archive.is_some(),
        "Trick updated"
    );

    Ok(FlashRedirect::to(edit_path(&updated.slug)).with_success(Message::TrickUpdated))
}

/// Detaches tags, detaches categories, deletes the row, then the folder
///
/// The steps are not transactional: a failure part way leaves the earlier
/// steps applied.
pub async fn delete(
    State(state): State<AppState>,
    Extension(trick): Extension<Trick>,
) -> ApiResult<FlashRedirect> {
    let tags = state.tricks.detach_tags(&trick).await?;
    let categories = state.tricks.detach_categories(&trick).await?;
    state.tricks.delete(&trick).await?;
    state.archives.delete_folder(trick.id).await?;

    info!(
        trick_id = %trick.id,
        slug = %trick.slug,
        detached_tags = tags,
        detached_categories = categories,
        "Trick deleted"
    );

    Ok(FlashRedirect::to(USER_INDEX_PATH).with_success(Message::TrickDeleted))
}

pub async fn delete_archive(
    State(state): State<AppState>,
    Extension(trick): Extension<Trick>,
) -> ApiResult<FlashRedirect> {
    let existed = state.archives.delete_folder(trick.id).await?;
    info!(trick_id = %trick.id, existed, "Trick archive deleted");

    Ok(FlashRedirect::to(edit_path(&trick.slug))
        .with_success(Message::TrickArchiveDeleted))
}

/// Runs form validation, separating field errors from infrastructure errors
async fn validate(
    state: &AppState,
    form: TrickForm,
) -> ApiResult<Result<ValidTrick, Vec<FieldError>>> {
    match form
        .validate(&*state.tricks, &*state.tags, &*state.categories)
        .await
    {
        Ok(valid) => Ok(Ok(valid)),
        Err(FormError::Invalid(errors)) => {
            debug!(errors = errors.len(), "Trick form rejected");
            Ok(Err(errors))
        }
        Err(e) => Err(e.into()),
    }
}

/// Collects the trick fields and the archive part from a multipart body
///
/// Unknown fields are ignored. Blank `tags`/`categories` entries, as sent by
/// an empty select, are skipped.
async fn read_submission(mut multipart: Multipart) -> ApiResult<(TrickFormInput, ArchiveUpload)> {
    let mut input = TrickFormInput::default();
    let mut archive = ArchiveUpload::Absent;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.trim_end_matches("[]") {
            "title" => input.title = field.text().await?,
            "description" => input.description = field.text().await?,
            "code" => input.code = field.text().await?,
            "tags" => push_id(&mut input.tags, field.text().await?),
            "categories" => push_id(&mut input.categories, field.text().await?),
            "archive" => {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                archive = ArchiveUpload::from_part(file_name.as_deref(), data);
            }
            _ => {}
        }
    }

    Ok((input, archive))
}

fn push_id(ids: &mut Vec<String>, value: String) {
    if !value.trim().is_empty() {
        ids.push(value);
    }
}
