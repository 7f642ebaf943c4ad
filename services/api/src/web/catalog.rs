//! services/api/src/web/catalog.rs
//!
//! Services and clients.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use barbershop_core::domain::{Client, NewClient, Service, ServiceDraft};
use barbershop_core::ports::{PortError, PortResult};
use barbershop_core::validation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::rest::{port_error, HttpResult};
use crate::web::state::AppState;

/// A service cannot take longer than the working day.
const MAX_SERVICE_MINUTES: u32 = 9 * 60;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ServiceResponse {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: u32,
    pub active: bool,
}

impl From<Service> for ServiceResponse {
    fn from(s: Service) -> Self {
        Self {
            id: s.id,
            name: s.name,
            price: s.price,
            duration_minutes: s.duration_minutes,
            active: s.active,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ServicePayload {
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: u32,
    /// Defaults to `true`.
    pub active: Option<bool>,
}

impl ServicePayload {
    fn into_draft(self) -> PortResult<ServiceDraft> {
        let name = validation::required("name", &self.name)?;
        let price = validation::non_negative("price", self.price)
            .and_then(|p| validation::money("price", p))?;
        if self.duration_minutes == 0 {
            return Err(PortError::validation("duration_minutes", "must be greater than zero"));
        }
        if self.duration_minutes > MAX_SERVICE_MINUTES {
            return Err(PortError::validation(
                "duration_minutes",
                format!("cannot exceed {} minutes", MAX_SERVICE_MINUTES),
            ));
        }
        Ok(ServiceDraft {
            name,
            price,
            duration_minutes: self.duration_minutes,
            active: self.active.unwrap_or(true),
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct ClientResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub staff_id: Option<Uuid>,
}

impl From<Client> for ClientResponse {
    fn from(c: Client) -> Self {
        Self {
            id: c.id,
            name: c.name,
            phone: c.phone,
            email: c.email,
            notes: c.notes,
            staff_id: c.staff_id,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ClientPayload {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
}

impl ClientPayload {
    fn into_new_client(self, staff_id: Uuid) -> PortResult<NewClient> {
        Ok(NewClient {
            name: validation::required("name", &self.name)?,
            phone: validation::phone(&self.phone)?,
            email: validation::optional_email(self.email.as_deref())?,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            staff_id: Some(staff_id),
        })
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /services - The active services, by name
#[utoipa::path(
    get,
    path = "/services",
    responses((status = 200, description = "Active services", body = [ServiceResponse]))
)]
pub async fn list_services_handler(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<ServiceResponse>>> {
    let services = state.catalog.list_services(true).await.map_err(port_error)?;
    Ok(Json(services.into_iter().map(Into::into).collect()))
}

/// POST /services
#[utoipa::path(
    post,
    path = "/services",
    request_body = ServicePayload,
    responses(
        (status = 201, description = "Service created", body = ServiceResponse),
        (status = 400, description = "Invalid input", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn create_service_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ServicePayload>,
) -> HttpResult<impl IntoResponse> {
    let draft = payload.into_draft().map_err(port_error)?;
    let service = state.catalog.create_service(draft).await.map_err(port_error)?;
    info!("Created service {} ({})", service.name, service.id);
    Ok((StatusCode::CREATED, Json(ServiceResponse::from(service))))
}

/// PUT /services/{id}
#[utoipa::path(
    put,
    path = "/services/{id}",
    params(("id" = Uuid, Path, description = "Service id")),
    request_body = ServicePayload,
    responses(
        (status = 200, description = "Service replaced", body = ServiceResponse),
        (status = 404, description = "Unknown service", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn update_service_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ServicePayload>,
) -> HttpResult<Json<ServiceResponse>> {
    let draft = payload.into_draft().map_err(port_error)?;
    let service = state
        .catalog
        .update_service(id, draft)
        .await
        .map_err(port_error)?;
    Ok(Json(service.into()))
}

/// DELETE /services/{id}
///
/// Appointments keep the name and price they were booked with.
#[utoipa::path(
    delete,
    path = "/services/{id}",
    params(("id" = Uuid, Path, description = "Service id")),
    responses(
        (status = 204, description = "Service deleted"),
        (status = 404, description = "Unknown service", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn delete_service_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> HttpResult<StatusCode> {
    state.catalog.delete_service(id).await.map_err(port_error)?;
    info!("Deleted service {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /clients
#[utoipa::path(
    get,
    path = "/clients",
    responses((status = 200, description = "All clients, by name", body = [ClientResponse]))
)]
pub async fn list_clients_handler(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<ClientResponse>>> {
    let clients = state.catalog.list_clients().await.map_err(port_error)?;
    Ok(Json(clients.into_iter().map(Into::into).collect()))
}

/// POST /clients
#[utoipa::path(
    post,
    path = "/clients",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Client created", body = ClientResponse),
        (status = 400, description = "Invalid input", body = crate::web::rest::ErrorBody),
        (status = 409, description = "Phone already registered", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn create_client_handler(
    State(state): State<Arc<AppState>>,
    Extension(staff_id): Extension<Uuid>,
    Json(payload): Json<ClientPayload>,
) -> HttpResult<impl IntoResponse> {
    let client = payload.into_new_client(staff_id).map_err(port_error)?;
    let client = state.catalog.create_client(client).await.map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(ClientResponse::from(client))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(price: Decimal, duration_minutes: u32) -> ServicePayload {
        ServicePayload {
            name: "Corte".into(),
            price,
            duration_minutes,
            active: None,
        }
    }

    #[test]
    fn service_duration_is_bounded() {
        let draft = payload(Decimal::new(15, 0), 45).into_draft().unwrap();
        assert_eq!(draft.duration_minutes, 45);
        assert!(draft.active);

        for minutes in [0, MAX_SERVICE_MINUTES + 1, u32::MAX] {
            assert!(matches!(
                payload(Decimal::new(15, 0), minutes).into_draft(),
                Err(PortError::Validation { field, .. }) if field == "duration_minutes"
            ));
        }
    }

    #[test]
    fn service_price_is_whole_cents() {
        assert!(matches!(
            payload(Decimal::new(15005, 3), 30).into_draft(),
            Err(PortError::Validation { field, .. }) if field == "price"
        ));
    }
}
