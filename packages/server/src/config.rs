//! Relay configuration.

use std::time::Duration;

/// Default listen port of the relay
pub const DEFAULT_PORT: u16 = 3001;
/// Default identity pool size (Alice, Bob, Charlie)
pub const DEFAULT_POOL_SIZE: usize = 3;
/// Default capacity of each connection's outbound buffer (frames)
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;
/// Default timeout of a single socket write
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5000;

/// `init` and the first roster are queued before the writer starts.
const MIN_OUTBOUND_BUFFER: usize = 2;

/// Runtime configuration of the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub pool_size: usize,
    outbound_buffer: usize,
    pub write_timeout: Duration,
}

impl RelayConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// 送信バッファ容量を設定（下限は 2）
    pub fn with_outbound_buffer(mut self, outbound_buffer: usize) -> Self {
        self.outbound_buffer = outbound_buffer.max(MIN_OUTBOUND_BUFFER);
        self
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn outbound_buffer(&self) -> usize {
        self.outbound_buffer
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            pool_size: DEFAULT_POOL_SIZE,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // テスト項目: デフォルト設定はポート 3001、プールサイズ 3
        // given (前提条件):

        // when (操作):
        let config = RelayConfig::default();

        // then (期待する結果):
        assert_eq!(config.port, 3001);
        assert_eq!(config.pool_size, 3);
        assert_eq!(config.outbound_buffer(), 64);
        assert_eq!(config.bind_addr(), "127.0.0.1:3001");
    }

    #[test]
    fn test_outbound_buffer_has_lower_bound() {
        // テスト項目: 送信バッファ容量は 2 未満にならない
        // given (前提条件):
        let config = RelayConfig::new("0.0.0.0", 0);

        // when (操作):
        let config = config.with_outbound_buffer(0);

        // then (期待する結果):
        assert_eq!(config.outbound_buffer(), 2);
    }
}
