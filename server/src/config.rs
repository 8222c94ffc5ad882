use shared::DEFAULT_MAX_FRAME_LEN;

/// Settings the relay needs from whoever starts it.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bytes a connection may send without a sentinel before it is dropped.
    pub max_frame_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 2525,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "127.0.0.1:2525");
        assert_eq!(config.max_frame_len, 64 * 1024);
    }

    #[test]
    fn test_address_formatting() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.address(), "0.0.0.0:0");
    }
}
