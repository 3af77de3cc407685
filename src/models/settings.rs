//! # 应用配置数据模型
//!
//! 定义 PCL Converter 自身的配置（AppConfig），存储在
//! `~/.pcl-converter/config.json`。所有字段都有默认值，
//! 配置文件缺失或部分缺失时按默认值补齐。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// .NET Framework 程序集的产品名称（AssemblyProduct 特性值）
pub const DOTNET_FRAMEWORK_PRODUCT: &str = "Microsoft® .NET Framework";

/// 引用程序集搜索目录
///
/// 在 `path` 目录下找到的程序集，其产品名称视为 `product`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceAssemblyDir {
    pub path: PathBuf,
    pub product: String,
}

/// 应用配置数据结构
///
/// 配置文件示例：
/// ```json
/// {
///   "definitionsDir": "C:\\Tools\\pcl-converter\\data",
///   "referenceAssemblyDirs": [
///     { "path": "/usr/lib/mono/4.5", "product": "Microsoft® .NET Framework" }
///   ],
///   "defaultProfile": "Profile259"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// 定义列表（frameworks.json / portable-frameworks.json）所在目录；
    /// 为 `None` 时依次尝试可执行文件所在目录和 `./data`
    pub definitions_dir: Option<PathBuf>,

    /// 文件系统程序集解析器使用的引用程序集目录
    pub reference_assembly_dirs: Vec<ReferenceAssemblyDir>,

    /// 判定框架引用时比对的产品名称
    pub framework_product: String,

    /// 未指定 `--profile` 时使用的目标配置文件
    pub default_profile: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            definitions_dir: None,
            reference_assembly_dirs: default_reference_assembly_dirs(),
            framework_product: DOTNET_FRAMEWORK_PRODUCT.to_string(),
            default_profile: None,
        }
    }
}

/// 平台默认的 .NET Framework 4.5 引用程序集目录
fn default_reference_assembly_dirs() -> Vec<ReferenceAssemblyDir> {
    let path = if cfg!(windows) {
        let program_files = std::env::var_os("ProgramFiles(x86)")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\Program Files (x86)"));
        program_files
            .join("Reference Assemblies")
            .join("Microsoft")
            .join("Framework")
            .join(".NETFramework")
            .join("v4.5")
    } else {
        PathBuf::from("/usr/lib/mono/4.5")
    };

    vec![ReferenceAssemblyDir {
        path,
        product: DOTNET_FRAMEWORK_PRODUCT.to_string(),
    }]
}
