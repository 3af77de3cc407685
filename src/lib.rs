//! # PCL Converter - 核心初始化模块
//!
//! 本模块负责命令行工具的完整启动流程：
//! - 解析命令行参数
//! - 安装日志后端（`log` 门面经 `tracing-subscriber` 输出到 stderr）
//! - 读取 `~/.pcl-converter/config.json` 并加载框架定义列表
//! - 构建 tokio 运行时并分派子命令
//!
//! ## 模块结构
//! - `commands/` - 命令处理函数
//! - `models/` - 数据模型
//! - `services/` - 核心业务逻辑（宿主、改写、迁移编排）
//! - `utils/` - 通用工具函数

pub mod commands;
pub mod models;
pub mod services;
pub mod utils;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::convert::Selection;
use models::framework::FrameworkDescriptor;
use models::settings::AppConfig;
use services::catalog::FrameworkCatalog;
use services::classifier::ReferenceClassifier;
use services::migrator::{MigrationEvent, Migrator};
use services::resolver::ReferenceAssemblyResolver;
use services::workspace::FileSystemHost;

/// 将 .NET 4.5 类库项目转换为可移植类库
#[derive(Debug, Parser)]
#[command(name = "pcl-converter", version, about)]
pub struct Cli {
    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 定义列表（frameworks.json / portable-frameworks.json）所在目录
    #[arg(long, global = true, env = "PCL_CONVERTER_DEFINITIONS")]
    definitions: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 列出可移植配置文件
    Profiles,

    /// 列出经典框架
    Frameworks {
        /// 只显示名称包含该片段的第一个框架
        filter: Option<String>,
    },

    /// 列出根目录下可转换的候选项目
    List {
        root: PathBuf,

        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 转换勾选的 4.5 项目
    Convert {
        root: PathBuf,

        /// 目标可移植配置文件，例如 Profile259
        #[arg(short, long)]
        profile: Option<String>,

        /// 要转换的项目名称，可重复
        #[arg(long = "project", conflicts_with = "all")]
        projects: Vec<String>,

        /// 转换全部候选项目
        #[arg(long)]
        all: bool,
    },
}

/// 命令行工具启动函数
///
/// 定义列表加载失败属于启动级致命错误，直接以非零状态退出。
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("创建运行时失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), String> {
    let config = commands::settings::read_config().await?;

    let definitions = cli.definitions.or_else(|| config.definitions_dir.clone());
    let catalog =
        FrameworkCatalog::locate_and_load(definitions.as_deref()).map_err(|e| e.to_string())?;

    match cli.command {
        Command::Profiles => {
            for profile in commands::settings::list_profiles(&catalog) {
                println!("{:<12} {}", profile.name, profile.description);
            }
        }
        Command::Frameworks { filter } => {
            for framework in commands::settings::list_frameworks(&catalog, filter.as_deref())? {
                println!("{:>8}  {}", framework.id, framework.name);
            }
        }
        Command::List { root, json } => {
            let migrator = build_migrator(&root, &config);
            let result = commands::projects::reload_projects(&migrator).await?;

            if json {
                let output = serde_json::to_string_pretty(&result.projects)
                    .map_err(|e| format!("序列化项目列表失败: {}", e))?;
                println!("{}", output);
            } else {
                if !result.state.is_empty() {
                    println!("{}", result.state);
                }
                for project in &result.projects {
                    let label = project
                        .current_framework
                        .as_ref()
                        .map(|f| framework_label(&catalog, f))
                        .unwrap_or_default();
                    println!("{:<32} {}", project.name, label);
                }
            }
        }
        Command::Convert {
            root,
            profile,
            projects,
            all,
        } => {
            let selection = match (all, projects.is_empty()) {
                (true, _) => Selection::All,
                (false, false) => Selection::Named(projects),
                (false, true) => return Err("请使用 --project 指定项目，或使用 --all".to_string()),
            };

            let migrator = build_migrator(&root, &config);
            let session = commands::convert::convert_projects(
                &migrator,
                &catalog,
                &selection,
                profile.as_deref(),
                config.default_profile.as_deref(),
                |_, event| {
                    if let MigrationEvent::State(text) = event {
                        println!("{}", text);
                    }
                },
            )
            .await?;

            if !session.skipped.is_empty() {
                log::warn!("以下项目不可用，已跳过: {}", session.skipped.join(", "));
            }
        }
    }

    Ok(())
}

fn build_migrator(root: &Path, config: &AppConfig) -> Migrator {
    let resolver = ReferenceAssemblyResolver::new(config.reference_assembly_dirs.clone());
    let host = FileSystemHost::new(root, resolver);
    log::debug!("项目根目录: {}", host.root().display());

    Migrator::new(
        Arc::new(host),
        ReferenceClassifier::new(config.framework_product.clone()),
    )
}

/// 经典框架优先显示目录中的名称；可移植框架显示项目中读到的完整名称
fn framework_label(catalog: &FrameworkCatalog, framework: &FrameworkDescriptor) -> String {
    if framework.is_portable() {
        return framework.name.clone();
    }
    catalog
        .find_by_id(framework.id)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| framework.name.clone())
}
