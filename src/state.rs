use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        interaction::InteractionService,
        query::InteractionQueryService,
        store::InteractionStore,
    },
};

/// 应用程序的共享状态
/// 包含配置与交互引擎服务
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 投票/收藏切换服务
    pub interaction_service: InteractionService,

    /// 交互查询服务
    pub query_service: InteractionQueryService,
}

impl AppState {
    /// 基于同一个存储后端构建读写两侧服务
    pub fn new(config: Config, store: Arc<dyn InteractionStore>) -> Self {
        let interaction_service = InteractionService::new(store.clone())
            .with_tombstone_policy(config.tombstone_policy);
        let query_service = InteractionQueryService::new(store).with_page_limits(
            config.default_bookmarks_per_page,
            config.max_bookmarks_per_page,
        );

        Self {
            config,
            interaction_service,
            query_service,
        }
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }
}
