//! Booking handlers

use crate::dto::{
    ApiResponse, BookingCreateRequest, BookingListParams, BookingUpdateRequest, PaginationParams,
};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use carwash_core::AppError;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Create a booking
///
/// POST /api/v1/bookings
#[instrument(skip(data, req))]
pub async fn create_booking(
    data: web::Data<AppState>,
    req: web::Json<BookingCreateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Booking validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let booking = data.bookings.create(req.into_inner().into()).await?;

    info!(
        id = %booking.id,
        date = %booking.date,
        total = %booking.total_price,
        "Booking created"
    );

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        booking,
        "Booking created successfully",
    )))
}

/// Get a booking by ID
///
/// GET /api/v1/bookings/{id}
#[instrument(skip(data))]
pub async fn get_booking(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let booking = data.bookings.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(booking)))
}

/// List bookings with status and search filters
///
/// GET /api/v1/bookings?status=confirmed&search=danoon&page=1&limit=10
#[instrument(skip(data))]
pub async fn list_bookings(
    data: web::Data<AppState>,
    filters: web::Query<BookingListParams>,
    pagination: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    pagination.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;
    let filter = filters.to_filter()?;

    let (bookings, total) = data
        .bookings
        .list(&filter, pagination.limit, pagination.offset())
        .await?;

    info!(
        total = total,
        returned = bookings.len(),
        page = pagination.page,
        "Listed bookings"
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(pagination.paginate(bookings, total))))
}

/// Update status, location or notes
///
/// PUT /api/v1/bookings/{id}
#[instrument(skip(data, req))]
pub async fn update_booking(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<BookingUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Booking update validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let id = path.into_inner();
    let booking = data
        .bookings
        .update(id, req.into_inner().into_changes()?)
        .await?;

    info!(id = %id, status = %booking.status, "Booking updated");

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        booking,
        "Booking updated successfully",
    )))
}

/// Cancel a booking, releasing its slot
///
/// DELETE /api/v1/bookings/{id}
#[instrument(skip(data))]
pub async fn cancel_booking(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let booking = data.bookings.cancel(path.into_inner()).await?;

    info!(id = %booking.id, "Booking cancelled");

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        booking,
        "Booking cancelled successfully",
    )))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .route("", web::get().to(list_bookings))
            .route("", web::post().to(create_booking))
            .route("/{id}", web::get().to(get_booking))
            .route("/{id}", web::put().to(update_booking))
            .route("/{id}", web::delete().to(cancel_booking)),
    );
}
