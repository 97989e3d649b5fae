// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    // Engine tunables
    pub platform_fee_percent: f64,
    pub match_min_candidates: usize,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8000);

        let platform_fee_percent = std::env::var("PLATFORM_FEE_PERCENT")
            .ok()
            .and_then(|p| p.parse::<f64>().ok())
            .unwrap_or(3.0);

        let match_min_candidates = std::env::var("MATCH_MIN_CANDIDATES")
            .ok()
            .and_then(|p| p.parse::<usize>().ok())
            .unwrap_or(1);

        Config {
            database_url,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().unwrap(),
            port,
            platform_fee_percent,
            match_min_candidates,
        }
    }
}
