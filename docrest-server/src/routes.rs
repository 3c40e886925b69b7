//! HTTP handlers for the collection routes.
//!
//! | Method | Path           | Operation                      |
//! |--------|----------------|--------------------------------|
//! | POST   | `/{name}`      | create                         |
//! | GET    | `/{name}`      | find one, by ids, page or many |
//! | GET    | `/{name}/{id}` | find one by id                 |
//! | PATCH  | `/{name}`      | update by ids, many or one     |
//! | PATCH  | `/{name}/{id}` | update one by id               |
//! | PUT    | `/{name}/{id}` | replace one by id              |
//! | DELETE | `/{name}/{id}` | delete one by id               |

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use docrest::{
    collection::UpdateTarget,
    mutation::{DeleteResult, UpdatePayload, UpdateResult},
};
use serde_json::{Value, json};

use crate::{
    AppState,
    binding::{self, DocBody, RequestQuery, UpdateBody},
    error::ApiError,
    render,
};

type ApiResult<T> = Result<T, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/{name}", post(create).get(find).patch(update))
        .route(
            "/{name}/{id}",
            get(find_one_by_id)
                .patch(update_one_by_id)
                .put(replace_one_by_id)
                .delete(delete_one_by_id),
        )
        .with_state(state)
}

async fn create(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<DocBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(body) = body?;
    let ctx = state.context();

    let id = state.store.collection(&name).create(&ctx, body.doc).await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": render::bson(id) }))))
}

async fn find(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Value>> {
    let page = binding::pagination(&headers)?;
    let query = RequestQuery::from_pairs(pairs)?;
    let ctx = state.context();
    let collection = state.store.collection(&name);

    if query.single {
        let document = collection.find_one(&ctx, query.filter).await?;
        return Ok(Json(render::document(document)));
    }

    let sort = query.sort_spec()?;
    if !query.ids.is_empty() {
        let documents = collection.find_by_ids(&ctx, query.ids.as_slice(), &sort).await?;
        return Ok(Json(render::documents(documents)));
    }

    let result = collection
        .find_paginated(&ctx, page, query.filter, &sort)
        .await?;

    Ok(Json(render::find_result(result)))
}

async fn find_one_by_id(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let ctx = state.context();
    let document = state.store.collection(&name).find_one_by_id(&ctx, &id).await?;

    Ok(Json(render::document(document)))
}

async fn update(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    body: Result<Json<UpdateBody>, JsonRejection>,
) -> ApiResult<Json<UpdateResult>> {
    let query = RequestQuery::from_pairs(pairs)?;
    let Json(body) = body?;

    let target = if !query.ids.is_empty() {
        UpdateTarget::Ids(query.ids)
    } else if query.multiple {
        UpdateTarget::Many(query.filter)
    } else {
        UpdateTarget::One(query.filter)
    };

    let ctx = state.context();
    let result = state
        .store
        .collection(&name)
        .update(&ctx, target, UpdatePayload::classify(body.update))
        .await?;

    Ok(Json(result))
}

async fn update_one_by_id(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    body: Result<Json<UpdateBody>, JsonRejection>,
) -> ApiResult<Json<UpdateResult>> {
    let Json(body) = body?;
    let ctx = state.context();

    let result = state
        .store
        .collection(&name)
        .update_one_by_id(&ctx, &id, UpdatePayload::classify(body.update))
        .await?;

    Ok(Json(result))
}

async fn replace_one_by_id(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    body: Result<Json<DocBody>, JsonRejection>,
) -> ApiResult<Json<UpdateResult>> {
    let Json(body) = body?;
    let ctx = state.context();

    let result = state
        .store
        .collection(&name)
        .replace_one_by_id(&ctx, &id, body.doc)
        .await?;

    Ok(Json(result))
}

async fn delete_one_by_id(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> ApiResult<Json<DeleteResult>> {
    let ctx = state.context();
    let result = state.store.collection(&name).delete_one_by_id(&ctx, &id).await?;

    Ok(Json(result))
}
