//! # 迁移编排服务
//!
//! 按项目依次执行：保存 → 移除不兼容的程序集特性 → 移除框架引用 → 改写项目文件，
//! 并通过事件通道向唯一的消费者报告进度。
//!
//! ## 并发模型
//! - 整批处理在 `spawn_blocking` 工作线程上顺序执行，不阻塞调用方
//! - 进度以 `MigrationEvent` 经 `tokio::sync::mpsc` 发送，由单一消费者持有并修改界面状态
//! - 单飞保护：`AtomicBool` 原子置位，同一时刻只允许一次 `update`，第二次直接拒绝
//! - 不支持取消，也不对宿主调用设置超时
//!
//! ## 错误策略
//! - 项目暂时不可用（`HostError::Unavailable`）：记录日志，跳过该项目，继续下一个
//! - 其他宿主错误或落盘错误：中止整批处理并返回错误

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::models::framework::PortableProfileDescriptor;
use crate::models::project::{HostProject, ProjectRecord};
use crate::services::assembly_info;
use crate::services::classifier::ReferenceClassifier;
use crate::services::file_guard::{self, PersistError};
use crate::services::host::{self, HostError, ProjectHost};

pub const STATE_UPDATING: &str = "Updating...";
pub const STATE_DONE: &str = "Done...";
pub const STATE_NO_PROJECTS: &str = "No .Net projects";
pub const STATE_NO_SOLUTION: &str = "No solution";

/// 迁移错误
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("已有迁移正在进行")]
    AlreadyRunning,

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("后台任务异常结束: {0}")]
    Worker(String),
}

/// 发往状态消费者的进度事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationEvent {
    /// 面向用户的状态文本
    State(String),
    ProjectDone(String),
    ProjectSkipped { name: String, reason: String },
    /// 迁移结束后重新加载得到的项目列表
    Projects(Vec<ProjectRecord>),
}

/// 一次迁移的结果汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub converted: Vec<String>,
    pub skipped: Vec<String>,
}

/// 重新加载结果：候选项目与对应的状态文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadResult {
    pub state: String,
    pub projects: Vec<ProjectRecord>,
}

/// 重新加载项目列表
///
/// 展平解决方案文件夹，并行读取每个项目的目标框架，只保留框架可读的项目。
pub fn reload(host: &dyn ProjectHost) -> Result<ReloadResult, HostError> {
    let Some(tree) = host.list_projects()? else {
        return Ok(ReloadResult {
            state: STATE_NO_SOLUTION.to_string(),
            projects: vec![],
        });
    };

    let projects: Vec<ProjectRecord> = host::flatten_projects(tree)
        .par_iter()
        .map(|p| map_project(host, p))
        .filter(ProjectRecord::has_framework)
        .collect();

    let state = if projects.is_empty() {
        STATE_NO_PROJECTS.to_string()
    } else {
        String::new()
    };

    Ok(ReloadResult { state, projects })
}

fn map_project(host: &dyn ProjectHost, project: &HostProject) -> ProjectRecord {
    match host.current_framework(project) {
        Ok(framework) => ProjectRecord::from_host(project, Some(framework)),
        // 项目仍在加载中
        Err(HostError::MetadataMismatch(reason)) => {
            log::debug!("{}: 无法读取目标框架: {}", project.name, reason);
            ProjectRecord::from_host(project, None)
        }
        Err(e) => {
            log::warn!("{}: 读取目标框架失败: {}", project.name, e);
            ProjectRecord::from_host(project, None)
        }
    }
}

/// 单飞守卫：持有期间 `running` 为 true，析构时复位
struct RunGuard(Arc<AtomicBool>);

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 迁移编排器
#[derive(Clone)]
pub struct Migrator {
    host: Arc<dyn ProjectHost>,
    classifier: ReferenceClassifier,
    running: Arc<AtomicBool>,
}

impl Migrator {
    pub fn new(host: Arc<dyn ProjectHost>, classifier: ReferenceClassifier) -> Self {
        Self {
            host,
            classifier,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 在工作线程上重新加载项目列表
    pub async fn reload(&self) -> Result<ReloadResult, MigrationError> {
        let host = Arc::clone(&self.host);
        tokio::task::spawn_blocking(move || reload(host.as_ref()))
            .await
            .map_err(|e| MigrationError::Worker(e.to_string()))?
            .map_err(MigrationError::from)
    }

    /// 将已勾选的 4.5 项目转换为以 `profile` 为目标的可移植类库
    ///
    /// 事件顺序：`"Updating..."` → 每个项目 `"Updating... {name} done"` →
    /// 刷新后的项目列表 → `"Done..."`。
    pub async fn update(
        &self,
        projects: Vec<ProjectRecord>,
        profile: PortableProfileDescriptor,
        events: UnboundedSender<MigrationEvent>,
    ) -> Result<MigrationSummary, MigrationError> {
        let _guard = RunGuard::acquire(&self.running).ok_or(MigrationError::AlreadyRunning)?;

        emit(&events, MigrationEvent::State(STATE_UPDATING.to_string()));

        let host = Arc::clone(&self.host);
        let classifier = self.classifier.clone();
        let worker_events = events.clone();
        let summary = tokio::task::spawn_blocking(move || {
            run_batch(
                host.as_ref(),
                &classifier,
                &projects,
                &profile.name,
                &worker_events,
            )
        })
        .await
        .map_err(|e| MigrationError::Worker(e.to_string()))??;

        let refreshed = self.reload().await?;
        emit(&events, MigrationEvent::Projects(refreshed.projects));
        emit(&events, MigrationEvent::State(STATE_DONE.to_string()));

        log::info!(
            "迁移完成：转换 {} 个项目，跳过 {} 个",
            summary.converted.len(),
            summary.skipped.len()
        );
        Ok(summary)
    }
}

fn emit(events: &UnboundedSender<MigrationEvent>, event: MigrationEvent) {
    if events.send(event).is_err() {
        log::debug!("状态消费者已关闭，丢弃进度事件");
    }
}

fn run_batch(
    host: &dyn ProjectHost,
    classifier: &ReferenceClassifier,
    projects: &[ProjectRecord],
    profile_name: &str,
    events: &UnboundedSender<MigrationEvent>,
) -> Result<MigrationSummary, MigrationError> {
    let mut summary = MigrationSummary::default();

    for record in projects.iter().filter(|r| r.is_eligible()) {
        match migrate_project(host, classifier, record, profile_name) {
            Ok(()) => {
                summary.converted.push(record.name.clone());
                emit(events, MigrationEvent::ProjectDone(record.name.clone()));
                emit(
                    events,
                    MigrationEvent::State(format!("Updating... {} done", record.name)),
                );
            }
            Err(MigrationError::Host(HostError::Unavailable(reason)))
            | Err(MigrationError::Persist(PersistError::Host(HostError::Unavailable(reason)))) => {
                log::warn!("{}: 项目不可用，已跳过: {}", record.name, reason);
                summary.skipped.push(record.name.clone());
                emit(
                    events,
                    MigrationEvent::ProjectSkipped {
                        name: record.name.clone(),
                        reason,
                    },
                );
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

fn migrate_project(
    host: &dyn ProjectHost,
    classifier: &ReferenceClassifier,
    record: &ProjectRecord,
    profile_name: &str,
) -> Result<(), MigrationError> {
    let project = record.host_project();
    host.save_project(&project)?;

    let already_portable = record
        .current_framework
        .as_ref()
        .is_some_and(|f| f.is_portable());

    if !already_portable {
        let files = assembly_info::strip_assembly_metadata(host, &project)?;
        let references = classifier.strip_framework_references(host, &project)?;
        log::debug!(
            "{}: 改写 {} 个 AssemblyInfo，移除 {} 个框架引用",
            project.name,
            files,
            references
        );
    }

    file_guard::retarget_project_file(host, &project, profile_name)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use tokio::sync::mpsc;

    use super::*;
    use crate::models::assembly::AssemblyIdentity;
    use crate::models::framework::FrameworkDescriptor;
    use crate::models::project::{ProjectNode, ReferenceDescriptor};
    use crate::models::settings::DOTNET_FRAMEWORK_PRODUCT;
    use crate::services::host::{AssemblyResolver, ResolveError, ResolvedAssembly};
    use crate::services::project_file::PORTABLE_PROJECT_TYPES_LINE;
    use crate::utils::path::backup_path;

    const CLASSIC: &str = "<Project>\n  <PropertyGroup>\n    <TargetFrameworkVersion>v4.5</TargetFrameworkVersion>\n  </PropertyGroup>\n  <Import Project=\"$(MSBuildToolsPath)\\Microsoft.CSharp.targets\" />\n</Project>\n";
    const ASSEMBLY_INFO: &str = "[assembly: AssemblyTitle(\"A\")]\n[assembly: ComVisible(false)]\n[assembly: Guid(\"abc\")]\n";

    /// 内存中的项目宿主替身；项目文件本身写在临时目录中
    #[derive(Default)]
    struct FakeHost {
        tree: Option<Vec<ProjectNode>>,
        frameworks: HashMap<String, FrameworkDescriptor>,
        unavailable: HashSet<String>,
        texts: Mutex<HashMap<PathBuf, String>>,
        references: Mutex<HashMap<String, Vec<ReferenceDescriptor>>>,
        saves: Mutex<Vec<String>>,
    }

    impl AssemblyResolver for FakeHost {
        fn resolve(&self, identity: &AssemblyIdentity) -> Result<ResolvedAssembly, ResolveError> {
            if identity.name.starts_with("System") || identity.name == "mscorlib" {
                Ok(ResolvedAssembly {
                    name: identity.name.clone(),
                    product: Some(DOTNET_FRAMEWORK_PRODUCT.to_string()),
                })
            } else {
                Err(ResolveError::NotFound(identity.to_string()))
            }
        }
    }

    impl ProjectHost for FakeHost {
        fn list_projects(&self) -> Result<Option<Vec<ProjectNode>>, HostError> {
            Ok(self.tree.clone())
        }

        fn current_framework(&self, project: &HostProject) -> Result<FrameworkDescriptor, HostError> {
            self.frameworks
                .get(&project.name)
                .cloned()
                .ok_or_else(|| HostError::MetadataMismatch(project.name.clone()))
        }

        fn save_project(&self, project: &HostProject) -> Result<(), HostError> {
            if self.unavailable.contains(&project.name) {
                return Err(HostError::Unavailable(project.name.clone()));
            }
            self.saves.lock().unwrap().push(project.name.clone());
            Ok(())
        }

        fn list_file_items(&self, project: &HostProject) -> Result<Vec<PathBuf>, HostError> {
            let dir = project.file_path.parent().unwrap();
            Ok(vec![
                dir.join("Class1.cs"),
                dir.join("Properties").join("AssemblyInfo.cs"),
            ])
        }

        fn read_text(&self, item: &Path) -> Result<String, HostError> {
            Ok(self.texts.lock().unwrap().get(item).cloned().unwrap_or_default())
        }

        fn write_text(&self, item: &Path, content: &str) -> Result<(), HostError> {
            self.texts
                .lock()
                .unwrap()
                .insert(item.to_path_buf(), content.to_string());
            Ok(())
        }

        fn list_references(&self, project: &HostProject) -> Result<Vec<ReferenceDescriptor>, HostError> {
            Ok(self
                .references
                .lock()
                .unwrap()
                .get(&project.name)
                .cloned()
                .unwrap_or_default())
        }

        fn remove_reference(
            &self,
            project: &HostProject,
            reference: &ReferenceDescriptor,
        ) -> Result<(), HostError> {
            if reference.name == "System.Locked" {
                return Err(HostError::NotFound(reference.name.clone()));
            }
            if let Some(list) = self.references.lock().unwrap().get_mut(&project.name) {
                list.retain(|r| r.name != reference.name);
            }
            Ok(())
        }
    }

    fn framework(name: &str) -> FrameworkDescriptor {
        FrameworkDescriptor {
            id: 262149,
            name: name.to_string(),
        }
    }

    fn reference(name: &str) -> ReferenceDescriptor {
        ReferenceDescriptor {
            include: name.to_string(),
            name: name.to_string(),
            major_version: 4,
            minor_version: 0,
            build_number: 0,
            revision_number: 0,
            culture: None,
            public_key_token: None,
            has_source_project: false,
        }
    }

    fn add_project(host: &mut FakeHost, root: &Path, name: &str, moniker: &str) -> HostProject {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        let file_path = dir.join(format!("{name}.csproj"));
        std::fs::write(&file_path, CLASSIC).unwrap();

        host.frameworks.insert(name.to_string(), framework(moniker));
        host.texts.lock().unwrap().insert(
            dir.join("Properties").join("AssemblyInfo.cs"),
            ASSEMBLY_INFO.to_string(),
        );
        host.references.lock().unwrap().insert(
            name.to_string(),
            vec![
                reference("mscorlib"),
                reference("System.Xml"),
                reference("System.Locked"),
                reference("Vendor.Lib"),
            ],
        );

        let project = HostProject {
            name: name.to_string(),
            file_path,
        };
        host.tree
            .get_or_insert_with(Vec::new)
            .push(ProjectNode::Project(project.clone()));
        project
    }

    fn select_all(mut projects: Vec<ProjectRecord>) -> Vec<ProjectRecord> {
        projects.iter_mut().for_each(|p| p.selected = true);
        projects
    }

    fn profile() -> PortableProfileDescriptor {
        PortableProfileDescriptor {
            name: "Profile136".to_string(),
            description: String::new(),
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<MigrationEvent>) -> Vec<MigrationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_reload_flattens_and_filters() {
        let root = tempfile::tempdir().unwrap();
        let mut host = FakeHost::default();
        add_project(&mut host, root.path(), "A", ".NETFramework,Version=v4.5");
        let loading = HostProject {
            name: "Loading".to_string(),
            file_path: root.path().join("Loading.csproj"),
        };
        let old = HostProject {
            name: "Old".to_string(),
            file_path: root.path().join("Old.csproj"),
        };
        host.frameworks
            .insert("Old".to_string(), framework(".NETFramework,Version=v4.0"));
        host.tree.as_mut().unwrap().push(ProjectNode::Folder {
            name: "src".to_string(),
            children: vec![ProjectNode::Project(loading), ProjectNode::Project(old)],
        });

        let result = reload(&host).unwrap();
        let names: Vec<&str> = result.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "Old"]);
        assert_eq!(result.state, "");
    }

    #[test]
    fn test_reload_state_text() {
        let empty = FakeHost {
            tree: Some(vec![]),
            ..FakeHost::default()
        };
        assert_eq!(reload(&empty).unwrap().state, STATE_NO_PROJECTS);

        let no_solution = FakeHost::default();
        assert_eq!(reload(&no_solution).unwrap().state, STATE_NO_SOLUTION);
    }

    #[tokio::test]
    async fn test_update_converts_selected_projects() {
        let root = tempfile::tempdir().unwrap();
        let mut host = FakeHost::default();
        let a = add_project(&mut host, root.path(), "A", ".NETFramework,Version=v4.5");
        let b = add_project(&mut host, root.path(), "B", ".NETFramework,Version=v4.5");
        let host = Arc::new(host);

        let migrator = Migrator::new(host.clone(), ReferenceClassifier::default());
        let mut projects = migrator.reload().await.unwrap().projects;
        projects[0].selected = true;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let summary = migrator.update(projects, profile(), tx).await.unwrap();

        assert_eq!(summary.converted, vec!["A"]);
        assert!(!migrator.is_running());

        let converted = std::fs::read_to_string(&a.file_path).unwrap();
        assert!(converted.contains("<TargetFrameworkProfile>Profile136</TargetFrameworkProfile>"));
        assert!(converted.contains(PORTABLE_PROJECT_TYPES_LINE));
        assert_eq!(std::fs::read_to_string(backup_path(&a.file_path)).unwrap(), CLASSIC);
        assert_eq!(std::fs::read_to_string(&b.file_path).unwrap(), CLASSIC);

        let info = host
            .read_text(&root.path().join("A").join("Properties").join("AssemblyInfo.cs"))
            .unwrap();
        assert_eq!(info, "[assembly: AssemblyTitle(\"A\")]\n\n\n");

        let remaining: Vec<String> = host
            .list_references(&a)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(remaining, vec!["mscorlib", "System.Locked", "Vendor.Lib"]);

        let events = drain(&mut rx);
        assert_eq!(events.first(), Some(&MigrationEvent::State(STATE_UPDATING.to_string())));
        assert!(events.contains(&MigrationEvent::ProjectDone("A".to_string())));
        assert!(events.contains(&MigrationEvent::State("Updating... A done".to_string())));
        assert!(matches!(events[events.len() - 2], MigrationEvent::Projects(ref p) if p.len() == 2));
        assert_eq!(events.last(), Some(&MigrationEvent::State("Done...".to_string())));
    }

    #[tokio::test]
    async fn test_unavailable_project_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let mut host = FakeHost::default();
        let a = add_project(&mut host, root.path(), "A", ".NETFramework,Version=v4.5");
        let b = add_project(&mut host, root.path(), "B", ".NETFramework,Version=v4.5");
        host.unavailable.insert("A".to_string());

        let migrator = Migrator::new(Arc::new(host), ReferenceClassifier::default());
        let projects = select_all(migrator.reload().await.unwrap().projects);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let summary = migrator.update(projects, profile(), tx).await.unwrap();

        assert_eq!(summary.skipped, vec!["A"]);
        assert_eq!(summary.converted, vec!["B"]);
        assert_eq!(std::fs::read_to_string(&a.file_path).unwrap(), CLASSIC);
        assert_ne!(std::fs::read_to_string(&b.file_path).unwrap(), CLASSIC);

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(e, MigrationEvent::ProjectSkipped { name, .. } if name == "A")));
    }

    #[tokio::test]
    async fn test_portable_project_keeps_references_and_attributes() {
        let root = tempfile::tempdir().unwrap();
        let mut host = FakeHost::default();
        let p = add_project(
            &mut host,
            root.path(),
            "P",
            ".NETPortable,Version=v4.5,Profile=Profile7",
        );
        let host = Arc::new(host);

        let migrator = Migrator::new(host.clone(), ReferenceClassifier::default());
        let projects = select_all(migrator.reload().await.unwrap().projects);
        let (tx, _rx) = mpsc::unbounded_channel();
        migrator.update(projects, profile(), tx).await.unwrap();

        assert_eq!(host.list_references(&p).unwrap().len(), 4);
        let info = host
            .read_text(&root.path().join("P").join("Properties").join("AssemblyInfo.cs"))
            .unwrap();
        assert_eq!(info, ASSEMBLY_INFO);
    }

    #[tokio::test]
    async fn test_non_v45_projects_are_not_touched() {
        let root = tempfile::tempdir().unwrap();
        let mut host = FakeHost::default();
        let old = add_project(&mut host, root.path(), "Old", ".NETFramework,Version=v4.0");

        let migrator = Migrator::new(Arc::new(host), ReferenceClassifier::default());
        let projects = select_all(migrator.reload().await.unwrap().projects);
        let (tx, _rx) = mpsc::unbounded_channel();
        let summary = migrator.update(projects, profile(), tx).await.unwrap();

        assert!(summary.converted.is_empty());
        assert!(!backup_path(&old.file_path).exists());
    }

    #[tokio::test]
    async fn test_second_concurrent_update_is_rejected() {
        let migrator = Migrator::new(Arc::new(FakeHost::default()), ReferenceClassifier::default());
        let guard = RunGuard::acquire(&migrator.running).unwrap();
        assert!(migrator.is_running());

        let (tx, _rx) = mpsc::unbounded_channel();
        let result = migrator.update(vec![], profile(), tx).await;
        assert!(matches!(result, Err(MigrationError::AlreadyRunning)));

        drop(guard);
        assert!(!migrator.is_running());
    }
}
