use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::guard::AuthSession;
use crate::error::ApiError;
use crate::store::{Listing, ListingQuery};
use crate::AppState;

/// Fields a listing owner may change through PATCH. Everything else in the
/// payload is ignored, so ownership and identity cannot be rewritten.
const ALLOWED_UPDATE_FIELDS: [&str; 3] = ["carName", "description", "location"];

const REQUIRED_CREATE_FIELDS: [&str; 3] = ["providerEmail", "carName", "rentPrice"];

pub fn parse_id(raw: &str, what: &'static str) -> Result<Uuid, ApiError> {
	Uuid::parse_str(raw).map_err(|_| ApiError::validation(format!("malformed {} id", what)))
}

fn coerce_price(v: &Value) -> Result<f64, ApiError> {
	match v {
		Value::Number(n) => n
			.as_f64()
			.ok_or_else(|| ApiError::validation("rentPrice must be a number")),
		Value::String(s) => s
			.trim()
			.parse::<f64>()
			.map_err(|_| ApiError::validation("rentPrice must be a number")),
		_ => Err(ApiError::validation("rentPrice must be a number")),
	}
}

fn is_missing(v: Option<&Value>) -> bool {
	match v {
		None | Some(Value::Null) => true,
		Some(Value::String(s)) => s.trim().is_empty(),
		Some(_) => false,
	}
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ApiError> {
	body.as_object()
		.ok_or_else(|| ApiError::validation("expected a JSON object"))
}

/// Projects a PATCH payload through the allow-list. Price is always written:
/// coerced when supplied, reset to zero when absent or empty.
fn project_update(body: &Map<String, Value>) -> Result<Map<String, Value>, ApiError> {
	let mut fields = Map::new();
	for key in ALLOWED_UPDATE_FIELDS {
		if let Some(v) = body.get(key) {
			fields.insert(key.to_string(), v.clone());
		}
	}
	let price = match body.get("rentPrice") {
		v if is_missing(v) => 0.0,
		Some(v) => coerce_price(v)?,
		None => 0.0,
	};
	fields.insert("rentPrice".to_string(), json!(price));
	Ok(fields)
}

#[derive(Debug, serde::Deserialize)]
pub struct ListParams {
	pub search: Option<String>,
	pub limit: Option<i64>,
}

/// GET /cars. A search term filters by name substring; a bare limit caps the
/// newest listings. A search term makes the limit a no-op.
pub async fn list_cars(
	State(state): State<AppState>,
	Query(params): Query<ListParams>,
) -> Result<Json<Vec<Value>>, ApiError> {
	let query = ListingQuery {
		search: params.search.filter(|s| !s.is_empty()),
		limit: params.limit,
	};
	let listings = state.listings.search(&query).await?;
	Ok(Json(listings.into_iter().map(|l| l.doc).collect()))
}

/// GET /cars/:id.
pub async fn get_car(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
	let id = parse_id(&id, "car")?;
	let listing = state.listings.get(id).await?.ok_or(ApiError::NotFound("car"))?;
	Ok(Json(listing.doc))
}

/// POST /cars. The payload is stored verbatim apart from the server-assigned
/// id, status and creation time.
pub async fn create_car(
	State(state): State<AppState>,
	_session: AuthSession,
	body: Json<Value>,
) -> Result<Json<Value>, ApiError> {
	let obj = as_object(&body)?;

	let missing: Vec<&str> = REQUIRED_CREATE_FIELDS
		.iter()
		.filter(|k| is_missing(obj.get(**k)))
		.copied()
		.collect();
	if !missing.is_empty() {
		return Err(ApiError::validation(format!(
			"missing required fields: {}",
			missing.join(", ")
		)));
	}

	let price = coerce_price(&obj["rentPrice"])?;
	let provider_email = obj["providerEmail"].as_str().unwrap_or_default().to_string();

	let mut doc = obj.clone();
	doc.insert("rentPrice".to_string(), json!(price));
	let listing = Listing::create(doc, provider_email);
	state.listings.insert(&listing).await?;
	log::info!("listing {} created by {}", listing.id, listing.provider_email);

	Ok(Json(json!({ "message": "car created", "id": listing.id })))
}

/// GET /my-listings.
pub async fn my_listings(
	State(state): State<AppState>,
	session: AuthSession,
) -> Result<Json<Vec<Value>>, ApiError> {
	let listings = state.listings.by_provider(&session.email).await?;
	Ok(Json(listings.into_iter().map(|l| l.doc).collect()))
}

/// PATCH /cars/:id. Owner only.
pub async fn update_car(
	State(state): State<AppState>,
	session: AuthSession,
	Path(id): Path<String>,
	body: Json<Value>,
) -> Result<Json<Value>, ApiError> {
	let id = parse_id(&id, "car")?;
	let obj = as_object(&body)?;

	let listing = state.listings.get(id).await?.ok_or(ApiError::NotFound("car"))?;
	if listing.provider_email != session.email {
		return Err(ApiError::forbidden("you do not own this listing"));
	}

	let fields = project_update(obj)?;
	let modified = state.listings.apply_update(id, &fields).await?;
	if modified == 0 {
		return Err(ApiError::NotFound("car"));
	}
	Ok(Json(json!({ "message": "car updated", "modified": modified })))
}

/// DELETE /cars/:id. Owner only; no cascade against bookings.
pub async fn delete_car(
	State(state): State<AppState>,
	session: AuthSession,
	Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
	let id = parse_id(&id, "car")?;
	let listing = state.listings.get(id).await?.ok_or(ApiError::NotFound("car"))?;
	if listing.provider_email != session.email {
		return Err(ApiError::forbidden("you do not own this listing"));
	}
	let deleted = state.listings.delete(id).await?;
	log::info!("listing {} deleted by {}", id, session.email);
	Ok(Json(json!({ "message": "car deleted", "deleted": deleted })))
}
