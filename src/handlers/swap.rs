//! Swap request handlers

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{MessageResponse, SwapDetailResponse, SwapListResponse, SwapResponse};
use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::models::SwapDirection;
use crate::swap::{CreateSwapRequest, SwapService};

#[derive(Debug, Deserialize)]
pub struct ListSwapsQuery {
    /// `sent`, `received`, or absent for both
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

pub async fn create_swap(
    State(swaps): State<Arc<SwapService>>,
    session: AuthenticatedUser,
    payload: Result<Json<CreateSwapRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SwapResponse>)> {
    let Json(request) = payload?;
    let swap = swaps.create(session.id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(SwapResponse {
            message: "Swap request sent successfully".to_string(),
            swap,
        }),
    ))
}

pub async fn list_swaps(
    State(swaps): State<Arc<SwapService>>,
    session: AuthenticatedUser,
    query: Result<Query<ListSwapsQuery>, QueryRejection>,
) -> ApiResult<Json<SwapListResponse>> {
    let Query(query) = query?;
    let direction = SwapDirection::from_query(query.kind.as_deref());
    let swaps = swaps.list_for_user(session.id, direction).await?;
    Ok(Json(SwapListResponse {
        success: true,
        swaps,
    }))
}

pub async fn get_swap(
    State(swaps): State<Arc<SwapService>>,
    session: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<SwapDetailResponse>> {
    let Path(swap_id) = path?;
    let swap = swaps.get_details(swap_id, session.id).await?;
    Ok(Json(SwapDetailResponse { swap }))
}

pub async fn accept_swap(
    State(swaps): State<Arc<SwapService>>,
    session: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<SwapResponse>> {
    let Path(swap_id) = path?;
    let swap = swaps.accept(swap_id, session.id).await?;
    Ok(Json(SwapResponse {
        message: "Swap request accepted successfully".to_string(),
        swap,
    }))
}

pub async fn reject_swap(
    State(swaps): State<Arc<SwapService>>,
    session: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<SwapResponse>> {
    let Path(swap_id) = path?;
    let swap = swaps.reject(swap_id, session.id).await?;
    Ok(Json(SwapResponse {
        message: "Swap request rejected".to_string(),
        swap,
    }))
}

pub async fn cancel_swap(
    State(swaps): State<Arc<SwapService>>,
    session: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(swap_id) = path?;
    swaps.cancel(swap_id, session.id).await?;
    Ok(Json(MessageResponse::new("Swap request cancelled successfully")))
}

pub async fn complete_swap(
    State(swaps): State<Arc<SwapService>>,
    session: AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<SwapResponse>> {
    let Path(swap_id) = path?;
    let swap = swaps.complete(swap_id, session.id).await?;
    Ok(Json(SwapResponse {
        message: "Swap marked as completed".to_string(),
        swap,
    }))
}
