#![allow(clippy::needless_for_each)]

use slotguard_core::{
    AnalystId, BookingRequest, RejectReason, RequesterId, Reservation, ReservationId,
    ReservationStatus,
};

use super::schemas::{
    ConflictResponse, ErrorResponse, HealthResponse, MessageResponse, MetricsResponse,
    RootEndpoints, RootResponse,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "SlotGuard Booking API",
        version = "0.1.0",
        description = "Book analyst time slots with at most one confirmed reservation per slot.",
        license(name = "MIT")
    ),
    tags(
        (name = "Booking", description = "Slot booking, listing and cancellation"),
        (name = "Health", description = "Service health and metrics")
    ),
    paths(
        super::health::root,
        super::health::health,
        super::health::metrics,
        super::booking::book,
        super::booking::my_bookings,
        super::booking::get_booking,
        super::booking::cancel_booking,
    ),
    components(schemas(
        AnalystId,
        RequesterId,
        ReservationId,
        BookingRequest,
        Reservation,
        ReservationStatus,
        RejectReason,
        ConflictResponse,
        ErrorResponse,
        HealthResponse,
        MessageResponse,
        MetricsResponse,
        RootEndpoints,
        RootResponse,
    ))
)]
pub struct ApiDoc;
