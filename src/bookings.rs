use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::auth::guard::AuthSession;
use crate::cars::parse_id;
use crate::error::ApiError;
use crate::store::{Booking, ListingStatus};
use crate::AppState;

/// POST /book. The conditional status flip is the sole arbiter of who gets
/// the car: two concurrent calls can both see `Available`, but only one
/// flip succeeds and only that caller's booking is inserted.
pub async fn book_car(
	State(state): State<AppState>,
	session: AuthSession,
	body: Json<Value>,
) -> Result<Json<Value>, ApiError> {
	let obj = body
		.as_object()
		.ok_or_else(|| ApiError::validation("expected a JSON object"))?;

	let user_email = obj.get("userEmail").and_then(Value::as_str).unwrap_or_default();
	if user_email != session.email {
		return Err(ApiError::forbidden("userEmail does not match the logged-in user"));
	}

	let car_id = obj
		.get("carId")
		.and_then(Value::as_str)
		.ok_or_else(|| ApiError::validation("carId is required"))?;
	let car_id = parse_id(car_id, "car")?;

	let listing = state.listings.get(car_id).await?.ok_or(ApiError::NotFound("car"))?;
	if listing.provider_email == session.email {
		return Err(ApiError::bad_request("cannot book own listing"));
	}
	if listing.status != ListingStatus::Available {
		return Err(ApiError::bad_request("car already booked or unavailable"));
	}

	let flipped = state
		.listings
		.set_status_if(car_id, ListingStatus::Available, ListingStatus::Booked)
		.await?;
	if flipped == 0 {
		// lost the race since the read above
		return Err(ApiError::bad_request("car already booked or unavailable"));
	}

	let booking = Booking::create(obj.clone(), car_id, session.email.clone());
	if let Err(e) = state.bookings.insert(&booking).await {
		log::error!("booking insert failed after status flip: {}", e);
		if let Err(e) = state.listings.set_status(car_id, ListingStatus::Available).await {
			log::error!("status revert for car {} failed: {}", car_id, e);
		}
		return Err(ApiError::Internal(anyhow::anyhow!("booking could not be saved")));
	}
	log::info!("car {} booked by {} (booking {})", car_id, session.email, booking.id);

	Ok(Json(json!({
		"message": "car booked",
		"bookingId": booking.id,
		"carStatus": ListingStatus::Booked.as_str(),
	})))
}

/// GET /my-bookings. Each booking carries a `car` snapshot, null when the
/// listing has since been deleted.
pub async fn my_bookings(
	State(state): State<AppState>,
	session: AuthSession,
) -> Result<Json<Vec<Value>>, ApiError> {
	let rows = state.bookings.for_user_with_cars(&session.email).await?;
	let out = rows
		.into_iter()
		.map(|(booking, car)| {
			let mut doc = booking.doc;
			doc["car"] = car.map(|c| c.doc).unwrap_or(Value::Null);
			doc
		})
		.collect();
	Ok(Json(out))
}

/// DELETE /booking/:id. Deleting the booking is what counts; the status
/// revert afterwards is best-effort and never fails the call (the listing
/// may be gone by then).
pub async fn cancel_booking(
	State(state): State<AppState>,
	session: AuthSession,
	Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
	let id = parse_id(&id, "booking")?;

	let booking = state.bookings.get(id).await?.ok_or(ApiError::NotFound("booking"))?;
	if booking.user_email != session.email {
		return Err(ApiError::forbidden("you do not own this booking"));
	}

	let deleted = state.bookings.delete(id).await?;
	if deleted == 0 {
		return Err(ApiError::Internal(anyhow::anyhow!(
			"booking vanished before it could be cancelled"
		)));
	}

	match state.listings.set_status(booking.car_id, ListingStatus::Available).await {
		Ok(0) => log::warn!("cancelled booking {} referenced a deleted car {}", id, booking.car_id),
		Ok(_) => {}
		Err(e) => log::error!("status revert for car {} failed: {}", booking.car_id, e),
	}
	log::info!("booking {} cancelled by {}", id, session.email);

	Ok(Json(json!({ "message": "booking cancelled" })))
}
