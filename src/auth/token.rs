use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

pub const TOKEN_TTL_DAYS: i64 = 7;

/// Claims carried by the session cookie. Stateless: nothing is persisted
/// server-side, the signature is the whole session.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Claims {
	pub email: String,
	pub iat: i64,
	pub exp: i64,
}

pub fn mint(email: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
	let now = Utc::now();
	let claims = Claims {
		email: email.to_string(),
		iat: now.timestamp(),
		exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
	};
	encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn verify(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
	let data = decode::<Claims>(
		token,
		&DecodingKey::from_secret(secret.as_bytes()),
		&Validation::default(),
	)?;
	Ok(data.claims)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mint_and_verify_round_trip() {
		let token = mint("a@x.com", "secret").unwrap();
		let claims = verify(&token, "secret").unwrap();
		assert_eq!(claims.email, "a@x.com");
		assert!(claims.exp > claims.iat);
	}

	#[test]
	fn wrong_secret_is_rejected() {
		let token = mint("a@x.com", "secret").unwrap();
		assert!(verify(&token, "other").is_err());
	}

	#[test]
	fn expired_token_is_rejected() {
		let past = Utc::now() - Duration::days(TOKEN_TTL_DAYS + 1);
		let claims = Claims {
			email: "a@x.com".to_string(),
			iat: past.timestamp(),
			exp: (past + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
		};
		let token = encode(
			&Header::default(),
			&claims,
			&EncodingKey::from_secret(b"secret"),
		)
		.unwrap();
		assert!(verify(&token, "secret").is_err());
	}

	#[test]
	fn garbage_is_rejected() {
		assert!(verify("not-a-jwt", "secret").is_err());
	}
}
