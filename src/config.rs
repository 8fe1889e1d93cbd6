use clap::Parser;
use std::fmt;

/// Runtime settings. Every value can come from the environment (and `.env`) or a flag.
#[derive(Parser, Clone)]
#[command(name = "mobank-core", about = "Mobile banking ledger and approval service", version)]
pub struct Config {
	#[arg(long, env = "DB_HOST", default_value = "localhost")]
	pub db_host: String,

	#[arg(long, env = "DB_PORT", default_value_t = 5432)]
	pub db_port: u16,

	#[arg(long, env = "DB_USER")]
	pub db_user: String,

	#[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
	pub db_password: String,

	#[arg(long, env = "DB_NAME", default_value = "mobank")]
	pub db_name: String,

	#[arg(long, env = "DB_SSLMODE", default_value = "disable")]
	pub db_sslmode: String,

	/// HS256 signing secret for bearer tokens.
	#[arg(long, env = "JWT_SECRET", hide_env_values = true)]
	pub jwt_secret: String,

	#[arg(long, env = "PORT", default_value_t = 8080)]
	pub port: u16,

	#[arg(long, env = "DB_POOL_SIZE", default_value_t = 16)]
	pub db_pool_size: u32,

	/// Interval of the background expiry sweep; 0 turns it off.
	#[arg(long, env = "EXPIRY_SWEEP_SECS", default_value_t = 60)]
	pub expiry_sweep_secs: u64,
}

impl Config {
	pub fn database_url(&self) -> String {
		format!(
			"postgres://{}:{}@{}:{}/{}?sslmode={}",
			self.db_user, self.db_password, self.db_host, self.db_port, self.db_name, self.db_sslmode
		)
	}

	pub fn bind_addr(&self) -> (String, u16) {
		("0.0.0.0".to_string(), self.port)
	}
}

impl fmt::Debug for Config {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Config")
			.field("db_host", &self.db_host)
			.field("db_port", &self.db_port)
			.field("db_user", &self.db_user)
			.field("db_password", &"***")
			.field("db_name", &self.db_name)
			.field("db_sslmode", &self.db_sslmode)
			.field("jwt_secret", &"***")
			.field("port", &self.port)
			.field("db_pool_size", &self.db_pool_size)
			.field("expiry_sweep_secs", &self.expiry_sweep_secs)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(extra: &[&str]) -> Config {
		let mut args = vec![
			"mobank-core",
			"--db-user",
			"bank",
			"--db-password",
			"s3cret",
			"--jwt-secret",
			"signing-key",
		];
		args.extend_from_slice(extra);
		Config::try_parse_from(args).unwrap()
	}

	#[test]
	fn test_database_url_from_flags() {
		let cfg = parse(&["--db-host", "db", "--db-port", "6543", "--db-name", "core"]);
		assert_eq!(cfg.database_url(), "postgres://bank:s3cret@db:6543/core?sslmode=disable");
	}

	#[test]
	fn test_debug_hides_secrets() {
		let cfg = parse(&[]);
		let printed = format!("{:?}", cfg);
		assert!(!printed.contains("s3cret"));
		assert!(!printed.contains("signing-key"));
		assert!(printed.contains("***"));
	}
}
