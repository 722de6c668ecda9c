use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
	Development,
	Production,
}

#[derive(Debug, Clone)]
pub struct Config {
	pub bind_addr: String,
	pub db_host: String,
	pub db_user: String,
	pub db_password: String,
	pub db_name: String,
	pub jwt_secret: String,
	pub verifier_url: String,
	pub environment: Environment,
}

impl Config {
	pub fn from_env() -> Config {
		let environment = match env::var("ENVIRONMENT").as_deref() {
			Ok("production") => Environment::Production,
			_ => Environment::Development,
		};
		Config {
			bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string()),
			db_host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
			db_user: env::var("DB_USER").unwrap_or_else(|_| "ubuntu".to_string()),
			db_password: env::var("DB_PASSWORD").unwrap_or_default(),
			db_name: env::var("DB_NAME").unwrap_or_else(|_| "rental".to_string()),
			jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret".to_string()),
			verifier_url: env::var("VERIFIER_URL")
				.unwrap_or_else(|_| "https://oauth2.googleapis.com/tokeninfo".to_string()),
			environment,
		}
	}

	pub fn pg_config_string(&self) -> String {
		format!(
			"host={} user={} password={} dbname={}",
			self.db_host, self.db_user, self.db_password, self.db_name
		)
	}
}
