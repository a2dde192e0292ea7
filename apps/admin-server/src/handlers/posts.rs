//! Post administration handlers.

use actix_web::http::{StatusCode, Uri, header};
use actix_web::{HttpRequest, HttpResponse, web};
use minijinja::context;
use serde::Deserialize;

use quire_core::domain::{Page, Post};
use quire_core::{DomainError, FieldErrors, FormOptions, PostInput, policy};
use quire_shared::Pagination;

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::form::{self, HtmlForm};
use crate::state::AppState;

/// Listing page selector, `?page=N` (1-based). Anything unparsable is page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    page: Option<String>,
}

impl PageQuery {
    fn page(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .unwrap_or(1)
            .max(1)
    }
}

/// `_method` field of a POSTed form.
#[derive(Debug, Deserialize)]
struct MethodOverride {
    #[serde(rename = "_method", default)]
    method: String,
}

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(header::ContentType::html())
        .body(body)
}

fn redirect(location: impl Into<String>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.into()))
        .finish()
}

/// Where to send the user after a delete: the path (and query) of the page
/// they came from, unless that page was the deleted post itself.
///
/// Only the path of the Referer is kept so the redirect never leaves the site.
fn back_after_delete(req: &HttpRequest, id: i64) -> String {
    const MINE: &str = "/admin/posts/mine";

    let Some(referer) = req
        .headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Uri>().ok())
    else {
        return MINE.to_string();
    };

    let path = referer.path();
    let gone = format!("/admin/posts/{id}");
    // `//host` would be followed as a protocol-relative URL.
    let local = path.starts_with('/') && !path.starts_with("//");
    if !local || path == gone || path == format!("{gone}/edit") {
        return MINE.to_string();
    }

    referer
        .path_and_query()
        .map_or_else(|| MINE.to_string(), |pq| pq.as_str().to_string())
}

fn render_listing(
    state: &AppState,
    identity: &Identity,
    heading: &str,
    base: &str,
    page: Page<Post>,
) -> AppResult<HttpResponse> {
    let pagination = Pagination::new(page.page, page.per_page, page.total);
    let body = state.views.render(
        "posts/index.html",
        context! {
            heading,
            base,
            posts => page.items,
            has_pages => pagination.has_pages(),
            pagination,
            identity,
        },
    )?;

    Ok(html(StatusCode::OK, body))
}

fn render_create(
    state: &AppState,
    identity: &Identity,
    input: &PostInput,
    errors: &FieldErrors,
    options: FormOptions,
    status: StatusCode,
) -> AppResult<HttpResponse> {
    let body = state.views.render(
        "posts/create.html",
        context! {
            identity,
            input,
            errors,
            categories => options.categories,
            tags => options.tags,
        },
    )?;

    Ok(html(status, body))
}

fn render_edit(
    state: &AppState,
    identity: &Identity,
    post: &Post,
    input: &PostInput,
    errors: &FieldErrors,
    options: FormOptions,
    status: StatusCode,
) -> AppResult<HttpResponse> {
    let body = state.views.render(
        "posts/edit.html",
        context! {
            identity,
            post,
            input,
            errors,
            categories => options.categories,
            tags => options.tags,
        },
    )?;

    Ok(html(status, body))
}

/// GET /admin/posts
///
/// Every post, for reviewers holding the admin role.
pub async fn index(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    if !policy::can_list_all(&identity.roles) {
        tracing::warn!(user_id = identity.user_id, "Listing all posts requires the admin role");
        return Err(AppError::Forbidden);
    }

    let page = state.posts.list_all(query.page()).await?;
    render_listing(&state, &identity, "All posts", "/admin/posts", page)
}

/// GET /admin/posts/mine
pub async fn mine(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .posts
        .list_owned_by(identity.user_id, query.page())
        .await?;
    render_listing(&state, &identity, "My posts", "/admin/posts/mine", page)
}

/// GET /admin/posts/create
pub async fn create(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let options = state.posts.form_options().await?;
    render_create(
        &state,
        &identity,
        &PostInput::default(),
        &FieldErrors::new(),
        options,
        StatusCode::OK,
    )
}

/// POST /admin/posts
pub async fn store(
    state: web::Data<AppState>,
    identity: Identity,
    form: HtmlForm<PostInput>,
) -> AppResult<HttpResponse> {
    let input = form.into_inner();

    match state.posts.store(identity.user_id, input.clone()).await {
        Ok(post) => {
            tracing::info!(
                post_id = post.id,
                user_id = identity.user_id,
                slug = %post.slug,
                tags = post.tag_ids.len(),
                "Post created"
            );
            Ok(redirect(format!("/admin/posts/{}", post.id)))
        }
        Err(DomainError::Validation(errors)) => {
            tracing::debug!(user_id = identity.user_id, %errors, "Post rejected");
            let options = state.posts.form_options().await?;
            render_create(
                &state,
                &identity,
                &input,
                &errors,
                options,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /admin/posts/{id}
///
/// Public. Owners additionally get edit and delete controls.
pub async fn show(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let detail = state.posts.show(path.into_inner()).await?;
    let identity = identity.0;
    let can_modify = identity
        .as_ref()
        .is_some_and(|i| policy::can_modify(i.user_id, &detail.post));

    let body = state.views.render(
        "posts/show.html",
        context! {
            identity,
            can_modify,
            post => detail.post,
            categories => detail.categories,
            tags => detail.tags,
        },
    )?;

    Ok(html(StatusCode::OK, body))
}

/// GET /admin/posts/{id}/edit
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let detail = state
        .posts
        .edit(identity.user_id, id)
        .await
        .inspect_err(|e| warn_forbidden(e, &identity, id, "edit"))?;

    let input = PostInput::from(&detail.post);
    render_edit(
        &state,
        &identity,
        &detail.post,
        &input,
        &FieldErrors::new(),
        FormOptions {
            categories: detail.categories,
            tags: detail.tags,
        },
        StatusCode::OK,
    )
}

/// PUT|PATCH /admin/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    form: HtmlForm<PostInput>,
) -> AppResult<HttpResponse> {
    update_post(&state, &identity, path.into_inner(), form.into_inner()).await
}

/// DELETE /admin/posts/{id}
pub async fn destroy(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    destroy_post(&req, &state, &identity, path.into_inner()).await
}

/// POST /admin/posts/{id}
///
/// HTML forms can only POST; `_method` selects update or destroy.
pub async fn method_override(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    form::check_form_content_type(&req)?;
    let id = path.into_inner();
    let MethodOverride { method } = form::parse(&body)?;

    match method.to_ascii_uppercase().as_str() {
        "PUT" | "PATCH" => update_post(&state, &identity, id, form::parse(&body)?).await,
        "DELETE" => destroy_post(&req, &state, &identity, id).await,
        "" => Err(AppError::BadRequest(
            "Missing `_method` form field.".to_string(),
        )),
        other => Err(AppError::BadRequest(format!(
            "Unsupported `_method` value `{other}`."
        ))),
    }
}

async fn update_post(
    state: &AppState,
    identity: &Identity,
    id: i64,
    input: PostInput,
) -> AppResult<HttpResponse> {
    match state.posts.update(identity.user_id, id, input.clone()).await {
        Ok(post) => {
            tracing::info!(
                post_id = post.id,
                user_id = identity.user_id,
                slug = %post.slug,
                tags = post.tag_ids.len(),
                "Post updated"
            );
            Ok(redirect(format!("/admin/posts/{}", post.id)))
        }
        Err(DomainError::Validation(errors)) => {
            tracing::debug!(post_id = id, user_id = identity.user_id, %errors, "Post update rejected");
            let detail = state.posts.edit(identity.user_id, id).await?;
            render_edit(
                state,
                identity,
                &detail.post,
                &input,
                &errors,
                FormOptions {
                    categories: detail.categories,
                    tags: detail.tags,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
        Err(e) => {
            warn_forbidden(&e, identity, id, "update");
            Err(e.into())
        }
    }
}

async fn destroy_post(
    req: &HttpRequest,
    state: &AppState,
    identity: &Identity,
    id: i64,
) -> AppResult<HttpResponse> {
    state
        .posts
        .destroy(identity.user_id, id)
        .await
        .inspect_err(|e| warn_forbidden(e, identity, id, "delete"))?;

    tracing::info!(post_id = id, user_id = identity.user_id, "Post deleted");
    Ok(redirect(back_after_delete(req, id)))
}

fn warn_forbidden(err: &DomainError, identity: &Identity, post_id: i64, action: &str) {
    if matches!(err, DomainError::Forbidden) {
        tracing::warn!(post_id, user_id = identity.user_id, action, "Refused non-owner");
    }
}
