use std::sync::Arc;

use crate::config::RelayConfig;
use crate::model_client::ModelClient;

/// 两个 handler 共享的只读状态：
/// - config: 上游地址、模型名、生成参数、超时
/// - client: 上游调用实现（测试里换成假的）
pub struct AppState {
    pub config: RelayConfig,
    pub client: Arc<dyn ModelClient>,
}

impl AppState {
    pub fn new(config: RelayConfig, client: Arc<dyn ModelClient>) -> Arc<Self> {
        Arc::new(Self { config, client })
    }
}
