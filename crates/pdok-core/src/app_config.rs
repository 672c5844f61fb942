/// Runtime settings of a spider run, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub csw_url: String,
    pub owner: String,
    pub log_level: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub fan_out_workers: usize,
    pub csw_page_size: u32,
    pub csw_max_retries: u32,
    pub csw_retry_backoff_base_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            csw_url: crate::config::DEFAULT_CSW_URL.to_owned(),
            owner: crate::config::DEFAULT_OWNER.to_owned(),
            log_level: "info".to_owned(),
            http_timeout_secs: 30,
            user_agent: crate::config::DEFAULT_USER_AGENT.to_owned(),
            fan_out_workers: 10,
            csw_page_size: 50,
            csw_max_retries: 2,
            csw_retry_backoff_base_secs: 1,
        }
    }
}
