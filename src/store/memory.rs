//! In-memory implementation of the two stores, used by the test suite. Both
//! collections live in one struct so the booking join can see the listings.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
	Booking, BookingStore, Listing, ListingQuery, ListingStatus, ListingStore, StoreError,
};

#[derive(Default)]
pub struct MemStore {
	listings: RwLock<HashMap<Uuid, Value>>,
	bookings: RwLock<HashMap<Uuid, Value>>,
	fail_next_booking_insert: AtomicBool,
}

impl MemStore {
	pub fn new() -> MemStore {
		MemStore::default()
	}

	/// Test hook: makes the next booking insert fail once, to exercise the
	/// compensation path of the booking transition.
	pub fn fail_next_booking_insert(&self) {
		self.fail_next_booking_insert.store(true, Ordering::SeqCst);
	}
}

#[async_trait]
impl ListingStore for MemStore {
	async fn search(&self, query: &ListingQuery) -> Result<Vec<Listing>, StoreError> {
		let map = self.listings.read().await;
		let mut out = Vec::new();
		for doc in map.values() {
			out.push(Listing::from_doc(doc.clone())?);
		}
		if let Some(term) = &query.search {
			let term = term.to_lowercase();
			out.retain(|l| {
				l.doc
					.get("carName")
					.and_then(Value::as_str)
					.map(|n| n.to_lowercase().contains(&term))
					.unwrap_or(false)
			});
		} else if let Some(limit) = query.limit {
			out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
			out.truncate(limit.max(0) as usize);
		}
		Ok(out)
	}

	async fn get(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
		let map = self.listings.read().await;
		map.get(&id).cloned().map(Listing::from_doc).transpose()
	}

	async fn by_provider(&self, email: &str) -> Result<Vec<Listing>, StoreError> {
		let map = self.listings.read().await;
		let mut out = Vec::new();
		for doc in map.values() {
			let listing = Listing::from_doc(doc.clone())?;
			if listing.provider_email == email {
				out.push(listing);
			}
		}
		Ok(out)
	}

	async fn insert(&self, listing: &Listing) -> Result<(), StoreError> {
		let mut map = self.listings.write().await;
		map.insert(listing.id, listing.doc.clone());
		Ok(())
	}

	async fn apply_update(&self, id: Uuid, fields: &Map<String, Value>) -> Result<u64, StoreError> {
		let mut map = self.listings.write().await;
		let Some(doc) = map.get_mut(&id) else {
			return Ok(0);
		};
		if let Value::Object(obj) = doc {
			for (k, v) in fields {
				obj.insert(k.clone(), v.clone());
			}
		}
		Ok(1)
	}

	async fn set_status_if(
		&self,
		id: Uuid,
		from: ListingStatus,
		to: ListingStatus,
	) -> Result<u64, StoreError> {
		let mut map = self.listings.write().await;
		let Some(doc) = map.get_mut(&id) else {
			return Ok(0);
		};
		let current = doc.get("status").and_then(Value::as_str);
		if current != Some(from.as_str()) {
			return Ok(0);
		}
		doc["status"] = Value::String(to.as_str().to_string());
		Ok(1)
	}

	async fn set_status(&self, id: Uuid, to: ListingStatus) -> Result<u64, StoreError> {
		let mut map = self.listings.write().await;
		let Some(doc) = map.get_mut(&id) else {
			return Ok(0);
		};
		doc["status"] = Value::String(to.as_str().to_string());
		Ok(1)
	}

	async fn delete(&self, id: Uuid) -> Result<u64, StoreError> {
		let mut map = self.listings.write().await;
		Ok(map.remove(&id).map(|_| 1).unwrap_or(0))
	}
}

#[async_trait]
impl BookingStore for MemStore {
	async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
		if self.fail_next_booking_insert.swap(false, Ordering::SeqCst) {
			return Err(StoreError::Unavailable("injected booking insert failure"));
		}
		let mut map = self.bookings.write().await;
		map.insert(booking.id, booking.doc.clone());
		Ok(())
	}

	async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
		let map = self.bookings.read().await;
		map.get(&id).cloned().map(Booking::from_doc).transpose()
	}

	async fn for_user_with_cars(
		&self,
		email: &str,
	) -> Result<Vec<(Booking, Option<Listing>)>, StoreError> {
		let bookings = self.bookings.read().await;
		let listings = self.listings.read().await;
		let mut out = Vec::new();
		for doc in bookings.values() {
			let booking = Booking::from_doc(doc.clone())?;
			if booking.user_email != email {
				continue;
			}
			let car = match listings.get(&booking.car_id) {
				Some(car_doc) => Some(Listing::from_doc(car_doc.clone())?),
				None => None,
			};
			out.push((booking, car));
		}
		Ok(out)
	}

	async fn delete(&self, id: Uuid) -> Result<u64, StoreError> {
		let mut map = self.bookings.write().await;
		Ok(map.remove(&id).map(|_| 1).unwrap_or(0))
	}
}
