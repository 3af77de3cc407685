//! # 会话状态
//!
//! 迁移进度的唯一消费者。状态文本与项目列表只在这里被修改，
//! 工作线程通过 `MigrationEvent` 通道把变化交给它处理。

use tokio::sync::mpsc::UnboundedReceiver;

use crate::models::project::ProjectRecord;
use crate::services::migrator::MigrationEvent;

/// 面向用户的会话状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// 当前状态文本
    pub state: String,
    /// 当前显示的项目列表
    pub projects: Vec<ProjectRecord>,
    pub converted: Vec<String>,
    pub skipped: Vec<String>,
}

impl SessionState {
    pub fn with_projects(projects: Vec<ProjectRecord>) -> Self {
        Self {
            projects,
            ..Self::default()
        }
    }

    /// 应用一条进度事件
    pub fn apply(&mut self, event: &MigrationEvent) {
        match event {
            MigrationEvent::State(text) => self.state = text.clone(),
            MigrationEvent::ProjectDone(name) => self.converted.push(name.clone()),
            MigrationEvent::ProjectSkipped { name, .. } => self.skipped.push(name.clone()),
            MigrationEvent::Projects(projects) => self.projects = projects.clone(),
        }
    }

    /// 消费事件直到发送端全部关闭
    ///
    /// 每条事件应用后回调 `on_event`，调用方据此刷新输出。
    pub async fn consume<F>(mut self, mut rx: UnboundedReceiver<MigrationEvent>, mut on_event: F) -> Self
    where
        F: FnMut(&SessionState, &MigrationEvent),
    {
        while let Some(event) = rx.recv().await {
            self.apply(&event);
            on_event(&self, &event);
        }
        self
    }
}
