use axum::Json;
use axum::extract::{Path, Query, State};

use slotguard_core::{BookingOutcome, BookingRequest, RequesterId, Reservation, ReservationId};

use super::AppState;
use super::schemas::{ConflictResponse, ErrorResponse, MessageResponse, UserQuery};
use crate::error::ServerError;

const NOT_FOUND: &str = "Booking not found";

/// `POST /api/booking/book` -- book one analyst slot.
#[utoipa::path(
    post,
    path = "/api/booking/book",
    tag = "Booking",
    summary = "Book a slot",
    description = "Locks the (analyst, slot time) pair, checks it is free and records a confirmed reservation.",
    request_body(content = BookingRequest, description = "Slot to book"),
    responses(
        (status = 200, description = "Reservation confirmed", body = Reservation),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Slot already booked or locked", body = ConflictResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn book(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<Reservation>, ServerError> {
    match state.coordinator.book(request).await? {
        BookingOutcome::Confirmed(reservation) => Ok(Json(reservation)),
        BookingOutcome::Rejected(reason) => Err(ServerError::Conflict(reason)),
    }
}

/// `GET /api/booking/my-bookings` -- every reservation made by a user.
#[utoipa::path(
    get,
    path = "/api/booking/my-bookings",
    tag = "Booking",
    summary = "List a user's bookings",
    description = "Returns confirmed and cancelled reservations, latest slot first.",
    params(UserQuery),
    responses(
        (status = 200, description = "Reservations for the user", body = Vec<Reservation>),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn my_bookings(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<Reservation>>, ServerError> {
    let requester = RequesterId::new(query.user_id);
    let reservations = state.coordinator.list_for_requester(&requester).await?;
    Ok(Json(reservations))
}

/// `GET /api/booking/{booking_id}` -- one reservation owned by the caller.
#[utoipa::path(
    get,
    path = "/api/booking/{booking_id}",
    tag = "Booking",
    summary = "Get a booking",
    params(
        ("booking_id" = String, Path, description = "Reservation id"),
        UserQuery
    ),
    responses(
        (status = 200, description = "The reservation", body = Reservation),
        (status = 404, description = "No such booking for this user", body = ErrorResponse)
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Reservation>, ServerError> {
    let id = ReservationId::new(booking_id);
    match state.coordinator.get(&id).await? {
        Some(reservation) if reservation.requester_id.as_str() == query.user_id => {
            Ok(Json(reservation))
        }
        _ => Err(ServerError::NotFound(NOT_FOUND.into())),
    }
}

/// `DELETE /api/booking/{booking_id}` -- cancel a confirmed booking.
#[utoipa::path(
    delete,
    path = "/api/booking/{booking_id}",
    tag = "Booking",
    summary = "Cancel a booking",
    description = "Marks the reservation cancelled, freeing its slot. Only the user who made it may cancel.",
    params(
        ("booking_id" = String, Path, description = "Reservation id"),
        UserQuery
    ),
    responses(
        (status = 200, description = "Booking cancelled", body = MessageResponse),
        (status = 404, description = "No confirmed booking with this id for the user", body = ErrorResponse)
    )
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<MessageResponse>, ServerError> {
    let id = ReservationId::new(booking_id);
    let requester = RequesterId::new(query.user_id);
    if state.coordinator.cancel(&id, &requester).await? {
        Ok(Json(MessageResponse {
            message: "Booking cancelled successfully".into(),
        }))
    } else {
        Err(ServerError::NotFound(NOT_FOUND.into()))
    }
}
