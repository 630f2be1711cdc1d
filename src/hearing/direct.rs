//! 直接入库路径
//!
//! 无需模型解读的结构化数据（年收入、年龄等）直接写入会话：会话 id 缺省时先创建，
//! 再做一次 append。本路径不调用模型、自身不重试，是否重试由调用方包一层决定。

use serde_json::Value;

use crate::hearing::types::{DirectDataRequest, DirectDataResponse};
use crate::hearing::{HearingError, HearingService};

impl HearingService {
    /// 直接存储已清洗的键值数据，必要时先创建会话
    pub async fn store_direct(
        &self,
        request: DirectDataRequest,
    ) -> Result<DirectDataResponse, HearingError> {
        let session_id = match request.session_id {
            Some(id) => id,
            None => self.sessions.create_session(&request.user_id).await?,
        };

        // 过期会话已被远端删除，append 失败一律按不存在处理
        let payload = Value::Object(request.data);
        self.sessions
            .append_session_data(&session_id, &payload, None)
            .await?;

        let stored_at = chrono::Utc::now().to_rfc3339();
        tracing::info!("Stored direct data into session {}", session_id);
        Ok(DirectDataResponse {
            success: true,
            session_id,
            stored_at,
        })
    }
}
