use super::*;

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://e1d8c72d-759e-4f00-a641-7ea6ad0ad98e-00-2bnv37rv12ota.kirk.replit.dev"
                .to_string(),
            fleet_api_url: "https://fleet-api.prd.na.vn.cloud.tesla.com".to_string(),
            timeout_secs: 30,
            user_agent: format!("sonic/{}", env!("APP_VERSION")),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_margin_secs: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/sonic.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
            store_path: "/data/sonic_store.json".to_string(),
        }
    }
}
