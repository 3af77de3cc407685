//! # 目标框架数据模型
//!
//! 定义经典 .NET 框架描述（FrameworkDescriptor）与可移植配置文件描述
//! （PortableProfileDescriptor）。两者均从外部定义列表加载一次，之后只读。
//!
//! 对应定义文件：
//! - `frameworks.json` — `[{ "id": 262149, "name": ".NETFramework,Version=v4.5" }, ...]`
//! - `portable-frameworks.json` — `[{ "name": "Profile136", "description": "..." }, ...]`

use serde::{Deserialize, Serialize};

/// 经典 .NET 目标框架描述
///
/// `id` 为宿主的数值型 TargetFramework 属性（主版本号左移 16 位再加次版本号，
/// 例如 v4.5 → `0x40005` = 262149），`name` 为目标框架名称（moniker）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkDescriptor {
    pub id: u32,
    pub name: String,
}

impl FrameworkDescriptor {
    /// 该框架是否已是可移植目标（名称包含 "port"，不区分大小写）
    pub fn is_portable(&self) -> bool {
        self.name.to_lowercase().contains("port")
    }

    /// 该框架是否属于可转换的 4.5 系列
    pub fn is_v45(&self) -> bool {
        self.name.contains("4.5")
    }
}

/// 可移植类库配置文件描述（如 "Profile136"）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortableProfileDescriptor {
    pub name: String,
    pub description: String,
}
