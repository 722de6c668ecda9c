use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_postgres::{Client, NoTls};
use uuid::Uuid;

use super::{
	Booking, BookingStore, Listing, ListingQuery, ListingStatus, ListingStore, StoreError,
};
use crate::config::Config;

/// Both collections on one Postgres connection. Each row is the JSON
/// document plus mirror columns for the fields queries filter on.
pub struct PgStore {
	client: Client,
}

impl PgStore {
	pub async fn connect(config: &Config) -> anyhow::Result<PgStore> {
		let (client, monitor) =
			tokio_postgres::connect(config.pg_config_string().as_str(), NoTls).await?;

		tokio::spawn(async move {
			if let Err(e) = monitor.await {
				log::error!("connection error: {}", e);
			}
		});

		let store = PgStore { client };
		store.init_schema().await?;
		Ok(store)
	}

	async fn init_schema(&self) -> Result<(), StoreError> {
		self.client
			.batch_execute(
				"CREATE TABLE IF NOT EXISTS cars (
					id UUID PRIMARY KEY,
					provider_email TEXT NOT NULL,
					status TEXT NOT NULL,
					created_at TIMESTAMPTZ NOT NULL,
					doc JSONB NOT NULL
				);
				CREATE TABLE IF NOT EXISTS bookings (
					id UUID PRIMARY KEY,
					car_id UUID NOT NULL,
					user_email TEXT NOT NULL,
					booking_date TIMESTAMPTZ NOT NULL,
					doc JSONB NOT NULL
				);",
			)
			.await?;
		Ok(())
	}
}

#[async_trait]
impl ListingStore for PgStore {
	async fn search(&self, query: &ListingQuery) -> Result<Vec<Listing>, StoreError> {
		let rows = if let Some(term) = &query.search {
			let pattern = format!("%{}%", term);
			self.client
				.query("SELECT doc FROM cars WHERE doc->>'carName' ILIKE $1", &[&pattern])
				.await?
		} else if let Some(limit) = query.limit {
			self.client
				.query("SELECT doc FROM cars ORDER BY created_at DESC LIMIT $1", &[&limit])
				.await?
		} else {
			self.client.query("SELECT doc FROM cars", &[]).await?
		};
		rows.into_iter().map(|row| Listing::from_doc(row.get(0))).collect()
	}

	async fn get(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
		let row = self
			.client
			.query_opt("SELECT doc FROM cars WHERE id=$1", &[&id])
			.await?;
		row.map(|r| Listing::from_doc(r.get(0))).transpose()
	}

	async fn by_provider(&self, email: &str) -> Result<Vec<Listing>, StoreError> {
		let rows = self
			.client
			.query("SELECT doc FROM cars WHERE provider_email=$1", &[&email])
			.await?;
		rows.into_iter().map(|row| Listing::from_doc(row.get(0))).collect()
	}

	async fn insert(&self, listing: &Listing) -> Result<(), StoreError> {
		self.client
			.execute(
				"INSERT INTO cars (id, provider_email, status, created_at, doc) VALUES ($1,$2,$3,$4,$5)",
				&[
					&listing.id,
					&listing.provider_email,
					&listing.status.as_str(),
					&listing.created_at,
					&listing.doc,
				],
			)
			.await?;
		Ok(())
	}

	async fn apply_update(&self, id: Uuid, fields: &Map<String, Value>) -> Result<u64, StoreError> {
		let patch = Value::Object(fields.clone());
		let n = self
			.client
			.execute("UPDATE cars SET doc = doc || $2 WHERE id=$1", &[&id, &patch])
			.await?;
		Ok(n)
	}

	async fn set_status_if(
		&self,
		id: Uuid,
		from: ListingStatus,
		to: ListingStatus,
	) -> Result<u64, StoreError> {
		let n = self
			.client
			.execute(
				"UPDATE cars SET status=$3, doc = jsonb_set(doc, '{status}', to_jsonb($3::text))
				 WHERE id=$1 AND status=$2",
				&[&id, &from.as_str(), &to.as_str()],
			)
			.await?;
		Ok(n)
	}

	async fn set_status(&self, id: Uuid, to: ListingStatus) -> Result<u64, StoreError> {
		let n = self
			.client
			.execute(
				"UPDATE cars SET status=$2, doc = jsonb_set(doc, '{status}', to_jsonb($2::text))
				 WHERE id=$1",
				&[&id, &to.as_str()],
			)
			.await?;
		Ok(n)
	}

	async fn delete(&self, id: Uuid) -> Result<u64, StoreError> {
		let n = self.client.execute("DELETE FROM cars WHERE id=$1", &[&id]).await?;
		Ok(n)
	}
}

#[async_trait]
impl BookingStore for PgStore {
	async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
		self.client
			.execute(
				"INSERT INTO bookings (id, car_id, user_email, booking_date, doc) VALUES ($1,$2,$3,$4,$5)",
				&[
					&booking.id,
					&booking.car_id,
					&booking.user_email,
					&booking.booking_date,
					&booking.doc,
				],
			)
			.await?;
		Ok(())
	}

	async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
		let row = self
			.client
			.query_opt("SELECT doc FROM bookings WHERE id=$1", &[&id])
			.await?;
		row.map(|r| Booking::from_doc(r.get(0))).transpose()
	}

	async fn for_user_with_cars(
		&self,
		email: &str,
	) -> Result<Vec<(Booking, Option<Listing>)>, StoreError> {
		let rows = self
			.client
			.query(
				"SELECT b.doc, c.doc FROM bookings b
				 LEFT JOIN cars c ON c.id = b.car_id
				 WHERE b.user_email=$1",
				&[&email],
			)
			.await?;
		let mut out = Vec::with_capacity(rows.len());
		for row in rows {
			let booking = Booking::from_doc(row.get(0))?;
			let car = row
				.get::<_, Option<Value>>(1)
				.map(Listing::from_doc)
				.transpose()?;
			out.push((booking, car));
		}
		Ok(out)
	}

	async fn delete(&self, id: Uuid) -> Result<u64, StoreError> {
		let n = self
			.client
			.execute("DELETE FROM bookings WHERE id=$1", &[&id])
			.await?;
		Ok(n)
	}
}
