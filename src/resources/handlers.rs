use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument};

use super::kind::ResourceKind;
use crate::{
    auth::{
        extractors::{AuthUser, Authorized},
        role::AdminOnly,
    },
    error::{method_not_allowed, ApiError},
    response::Envelope,
    state::AppState,
    store::{new_document_id, timestamp_now, Document, Fields},
};

/// Routes for one collection, with its descriptor attached as an extension.
pub fn resource_routes(kind: &'static ResourceKind) -> Router<AppState> {
    Router::new()
        .route(
            &format!("/{}", kind.path),
            get(list_records)
                .post(create_record)
                .fallback(method_not_allowed),
        )
        .route(
            &format!("/{}/:id", kind.path),
            get(get_record)
                .put(update_record)
                .delete(delete_record)
                .fallback(method_not_allowed),
        )
        .layer(Extension(kind))
}

#[instrument(skip_all, fields(resource = kind.path))]
pub async fn create_record(
    State(state): State<AppState>,
    Extension(kind): Extension<&'static ResourceKind>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Fields>>), ApiError> {
    let Json(body) = payload?;
    let mut fields = kind.prepare_create(body)?;

    let now = timestamp_now()?;
    fields.insert("createdAt".into(), now.clone().into());
    fields.insert("updatedAt".into(), now.into());

    let doc = state
        .store
        .insert(kind.collection, &new_document_id(), fields)
        .await?;

    info!(id = %doc.id, "record created");
    Ok((StatusCode::CREATED, Json(Envelope::created(doc.id, doc.fields))))
}

/// Public on purpose: the admin front ends read lists before sign-in.
#[instrument(skip_all, fields(resource = kind.path))]
pub async fn list_records(
    State(state): State<AppState>,
    Extension(kind): Extension<&'static ResourceKind>,
) -> Result<Json<Envelope<Vec<Document>>>, ApiError> {
    let docs = state.store.list(kind.collection, kind.sort_field).await?;
    Ok(Json(Envelope::data(docs)))
}

#[instrument(skip_all, fields(resource = kind.path, id = %id))]
pub async fn get_record(
    State(state): State<AppState>,
    Extension(kind): Extension<&'static ResourceKind>,
    AuthUser(_identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Document>>, ApiError> {
    let doc = state
        .store
        .get(kind.collection, &id)
        .await?
        .ok_or_else(|| kind.not_found())?;
    Ok(Json(Envelope::data(doc)))
}

#[instrument(skip_all, fields(resource = kind.path, id = %id))]
pub async fn update_record(
    State(state): State<AppState>,
    Extension(kind): Extension<&'static ResourceKind>,
    Authorized(identity, _): Authorized<AdminOnly>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Envelope<Document>>, ApiError> {
    let Json(body) = payload?;
    let mut patch = kind.prepare_update(body)?;
    patch.insert("updatedAt".into(), timestamp_now()?.into());

    // Concurrent updates are not coordinated; the last merge wins.
    let doc = state
        .store
        .merge(kind.collection, &id, patch)
        .await?
        .ok_or_else(|| kind.not_found())?;

    info!(user_id = %identity.id, "record updated");
    Ok(Json(Envelope::data(doc)))
}

#[instrument(skip_all, fields(resource = kind.path, id = %id))]
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(kind): Extension<&'static ResourceKind>,
    Authorized(identity, _): Authorized<AdminOnly>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    if !state.store.delete(kind.collection, &id).await? {
        return Err(kind.not_found());
    }
    info!(user_id = %identity.id, "record deleted");
    Ok(Json(Envelope::ack()))
}
