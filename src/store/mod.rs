pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Availability of a car listing. Only the booking transition flips this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStatus {
	Available,
	Booked,
}

impl ListingStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			ListingStatus::Available => "Available",
			ListingStatus::Booked => "Booked",
		}
	}

	pub fn parse(s: &str) -> Option<ListingStatus> {
		match s {
			"Available" => Some(ListingStatus::Available),
			"Booked" => Some(ListingStatus::Booked),
			_ => None,
		}
	}
}

/// A car listing. The JSON document is the record of truth; the typed fields
/// mirror the parts the stores index and query on.
#[derive(Debug, Clone)]
pub struct Listing {
	pub id: Uuid,
	pub provider_email: String,
	pub status: ListingStatus,
	pub created_at: DateTime<Utc>,
	pub doc: Value,
}

impl Listing {
	/// Builds a listing from caller fields, stamping the server-assigned
	/// id, status and creation time into the document (overriding any
	/// caller-supplied values for those keys).
	pub fn create(mut doc: Map<String, Value>, provider_email: String) -> Listing {
		let id = Uuid::new_v4();
		let created_at = Utc::now();
		doc.insert("id".to_string(), Value::String(id.to_string()));
		doc.insert("providerEmail".to_string(), Value::String(provider_email.clone()));
		doc.insert("status".to_string(), Value::String(ListingStatus::Available.as_str().to_string()));
		doc.insert("createdAt".to_string(), Value::String(created_at.to_rfc3339()));
		Listing {
			id,
			provider_email,
			status: ListingStatus::Available,
			created_at,
			doc: Value::Object(doc),
		}
	}

	/// Re-derives the mirror fields from a stored document.
	pub fn from_doc(doc: Value) -> Result<Listing, StoreError> {
		let id = doc
			.get("id")
			.and_then(Value::as_str)
			.and_then(|s| Uuid::parse_str(s).ok())
			.ok_or_else(|| StoreError::Corrupt("listing id"))?;
		let provider_email = doc
			.get("providerEmail")
			.and_then(Value::as_str)
			.ok_or_else(|| StoreError::Corrupt("listing providerEmail"))?
			.to_string();
		let status = doc
			.get("status")
			.and_then(Value::as_str)
			.and_then(ListingStatus::parse)
			.ok_or_else(|| StoreError::Corrupt("listing status"))?;
		let created_at = doc
			.get("createdAt")
			.and_then(Value::as_str)
			.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
			.map(|t| t.with_timezone(&Utc))
			.ok_or_else(|| StoreError::Corrupt("listing createdAt"))?;
		Ok(Listing { id, provider_email, status, created_at, doc })
	}
}

/// A booking referencing a listing by id. Extra caller fields live in the
/// document verbatim.
#[derive(Debug, Clone)]
pub struct Booking {
	pub id: Uuid,
	pub car_id: Uuid,
	pub user_email: String,
	pub booking_date: DateTime<Utc>,
	pub doc: Value,
}

impl Booking {
	pub fn create(mut doc: Map<String, Value>, car_id: Uuid, user_email: String) -> Booking {
		let id = Uuid::new_v4();
		let booking_date = Utc::now();
		doc.insert("id".to_string(), Value::String(id.to_string()));
		doc.insert("carId".to_string(), Value::String(car_id.to_string()));
		doc.insert("userEmail".to_string(), Value::String(user_email.clone()));
		doc.insert("bookingDate".to_string(), Value::String(booking_date.to_rfc3339()));
		Booking {
			id,
			car_id,
			user_email,
			booking_date,
			doc: Value::Object(doc),
		}
	}

	pub fn from_doc(doc: Value) -> Result<Booking, StoreError> {
		let id = doc
			.get("id")
			.and_then(Value::as_str)
			.and_then(|s| Uuid::parse_str(s).ok())
			.ok_or_else(|| StoreError::Corrupt("booking id"))?;
		let car_id = doc
			.get("carId")
			.and_then(Value::as_str)
			.and_then(|s| Uuid::parse_str(s).ok())
			.ok_or_else(|| StoreError::Corrupt("booking carId"))?;
		let user_email = doc
			.get("userEmail")
			.and_then(Value::as_str)
			.ok_or_else(|| StoreError::Corrupt("booking userEmail"))?
			.to_string();
		let booking_date = doc
			.get("bookingDate")
			.and_then(Value::as_str)
			.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
			.map(|t| t.with_timezone(&Utc))
			.ok_or_else(|| StoreError::Corrupt("booking bookingDate"))?;
		Ok(Booking { id, car_id, user_email, booking_date, doc })
	}
}

/// Query shape for the public listing endpoint. `search` wins over `limit`
/// when both are present.
#[derive(Debug, Default, Clone)]
pub struct ListingQuery {
	pub search: Option<String>,
	pub limit: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Db(#[from] tokio_postgres::Error),
	#[error("corrupt record: bad {0}")]
	Corrupt(&'static str),
	#[error("store unavailable: {0}")]
	Unavailable(&'static str),
}

#[async_trait]
pub trait ListingStore: Send + Sync {
	async fn search(&self, query: &ListingQuery) -> Result<Vec<Listing>, StoreError>;
	async fn get(&self, id: Uuid) -> Result<Option<Listing>, StoreError>;
	async fn by_provider(&self, email: &str) -> Result<Vec<Listing>, StoreError>;
	async fn insert(&self, listing: &Listing) -> Result<(), StoreError>;
	/// Merges the given fields into the document. Returns the number of
	/// listings modified (0 when the id is gone).
	async fn apply_update(&self, id: Uuid, fields: &Map<String, Value>) -> Result<u64, StoreError>;
	/// Conditional status flip: succeeds only when the current status is
	/// `from`. The returned row count is the arbiter for booking races.
	async fn set_status_if(
		&self,
		id: Uuid,
		from: ListingStatus,
		to: ListingStatus,
	) -> Result<u64, StoreError>;
	/// Unconditional status write; a missing listing is a 0-row no-op.
	async fn set_status(&self, id: Uuid, to: ListingStatus) -> Result<u64, StoreError>;
	async fn delete(&self, id: Uuid) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
	async fn insert(&self, booking: &Booking) -> Result<(), StoreError>;
	async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;
	/// A user's bookings, each paired with the referenced listing when it
	/// still exists.
	async fn for_user_with_cars(
		&self,
		email: &str,
	) -> Result<Vec<(Booking, Option<Listing>)>, StoreError>;
	async fn delete(&self, id: Uuid) -> Result<u64, StoreError>;
}
