use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
	#[error("assertion rejected by identity provider")]
	Rejected,
	#[error("identity provider unreachable: {0}")]
	Upstream(#[from] reqwest::Error),
}

/// Seam to the external identity provider: turns a caller-supplied
/// assertion into a verified email, or rejects it.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
	async fn verify(&self, assertion: &str) -> Result<String, VerifyError>;
}

/// Verifies assertions against an HTTP token-info endpoint. The endpoint is
/// expected to answer 200 with a JSON body carrying an `email` field for a
/// valid assertion, and a non-2xx status otherwise.
pub struct HttpVerifier {
	client: reqwest::Client,
	endpoint: String,
}

impl HttpVerifier {
	pub fn new(endpoint: String) -> HttpVerifier {
		HttpVerifier {
			client: reqwest::Client::new(),
			endpoint,
		}
	}
}

#[async_trait]
impl IdentityVerifier for HttpVerifier {
	async fn verify(&self, assertion: &str) -> Result<String, VerifyError> {
		let res = self
			.client
			.get(&self.endpoint)
			.query(&[("id_token", assertion)])
			.send()
			.await?;
		if !res.status().is_success() {
			return Err(VerifyError::Rejected);
		}
		let body: Value = res.json().await?;
		match body.get("email").and_then(Value::as_str) {
			Some(email) => Ok(email.to_string()),
			None => Err(VerifyError::Rejected),
		}
	}
}
