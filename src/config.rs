use std::env;

use rust_decimal::Decimal;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub upload_dir: String,
    pub adult_entrance_fee: Decimal,
    pub child_entrance_fee: Decimal,
    pub rebooking_fee: Decimal,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string()),
            adult_entrance_fee: env::var("ADULT_ENTRANCE_FEE")
                .unwrap_or_else(|_| "100.00".to_string())
                .parse()
                .expect("ADULT_ENTRANCE_FEE must be a decimal amount"),
            child_entrance_fee: env::var("CHILD_ENTRANCE_FEE")
                .unwrap_or_else(|_| "50.00".to_string())
                .parse()
                .expect("CHILD_ENTRANCE_FEE must be a decimal amount"),
            rebooking_fee: env::var("REBOOKING_FEE")
                .unwrap_or_else(|_| "200.00".to_string())
                .parse()
                .expect("REBOOKING_FEE must be a decimal amount"),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
