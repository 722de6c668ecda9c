pub mod auth;
pub mod bookings;
pub mod cars;
pub mod config;
pub mod error;
pub mod store;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use auth::verifier::IdentityVerifier;
use config::Environment;
use store::{BookingStore, ListingStore};

/// Everything handlers need, injected through axum state. Stores and the
/// identity verifier sit behind trait objects so tests can swap them out.
#[derive(Clone)]
pub struct AppState {
	pub listings: Arc<dyn ListingStore>,
	pub bookings: Arc<dyn BookingStore>,
	pub verifier: Arc<dyn IdentityVerifier>,
	pub jwt_secret: String,
	pub environment: Environment,
}

pub fn app(state: AppState) -> Router {
	Router::new()
		.route("/auth/jwt", post(auth::issue_jwt))
		.route("/auth/logout", post(auth::logout))
		.route("/cars", get(cars::list_cars).post(cars::create_car))
		.route(
			"/cars/:id",
			get(cars::get_car).patch(cars::update_car).delete(cars::delete_car),
		)
		.route("/my-listings", get(cars::my_listings))
		.route("/book", post(bookings::book_car))
		.route("/my-bookings", get(bookings::my_bookings))
		.route("/booking/:id", delete(bookings::cancel_booking))
		.layer(CorsLayer::permissive())
		.with_state(state)
}
