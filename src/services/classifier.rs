//! # 引用分类器
//!
//! 判断一个外部程序集引用是否为"框架引用"（属于经典 .NET 运行时发行版、
//! 与可移植目标不兼容，需要移除）。
//!
//! ## 判定顺序
//! 1. 项目到项目的引用 → 不是框架引用
//! 2. 核心运行时程序集（名称包含 `mscorlib`）→ 始终保留
//! 3. 通过宿主解析程序集标识；找不到 → 不是框架引用（第三方程序集保守保留）
//! 4. 解析成功且产品名称与 .NET Framework 产品名完全一致 → 框架引用
//!
//! 解析过程中的任何其他错误都被吞掉并视为"不是框架引用"，
//! 单个引用永远不会导致整个项目失败。

use crate::models::assembly::AssemblyIdentity;
use crate::models::project::{HostProject, ReferenceDescriptor};
use crate::models::settings::DOTNET_FRAMEWORK_PRODUCT;
use crate::services::host::{AssemblyResolver, HostError, ProjectHost, ResolveError};

/// 框架引用分类器
#[derive(Debug, Clone)]
pub struct ReferenceClassifier {
    framework_product: String,
}

impl ReferenceClassifier {
    pub fn new(framework_product: impl Into<String>) -> Self {
        Self {
            framework_product: framework_product.into(),
        }
    }

    /// 判断引用是否为需要移除的框架引用
    pub fn is_framework_reference<R>(&self, resolver: &R, reference: &ReferenceDescriptor) -> bool
    where
        R: AssemblyResolver + ?Sized,
    {
        if reference.has_source_project {
            return false;
        }

        let identity = AssemblyIdentity::from_reference(reference);
        if identity.is_core_runtime() {
            return false;
        }

        match resolver.resolve(&identity) {
            Ok(assembly) => assembly.product.as_deref() == Some(self.framework_product.as_str()),
            // 不可用的第三方程序集
            Err(ResolveError::NotFound(_)) => false,
            Err(e) => {
                log::debug!("解析 {} 时出错，按非框架引用处理: {}", identity, e);
                false
            }
        }
    }

    /// 移除项目中的所有框架引用，返回成功移除的数量
    ///
    /// 单个引用移除失败时静默忽略（仅记录调试日志），不影响其余引用。
    /// 处理结束后保存项目。
    pub fn strip_framework_references(
        &self,
        host: &dyn ProjectHost,
        project: &HostProject,
    ) -> Result<usize, HostError> {
        let references = host.list_references(project)?;

        let mut removed = 0;
        for reference in references
            .iter()
            .filter(|r| self.is_framework_reference(host, r))
        {
            match host.remove_reference(project, reference) {
                Ok(()) => {
                    log::debug!("{}: 已移除框架引用 {}", project.name, reference.name);
                    removed += 1;
                }
                Err(e) => log::debug!("{}: 移除引用 {} 失败: {}", project.name, reference.name, e),
            }
        }

        host.save_project(project)?;
        Ok(removed)
    }
}

impl Default for ReferenceClassifier {
    fn default() -> Self {
        Self::new(DOTNET_FRAMEWORK_PRODUCT)
    }
}
