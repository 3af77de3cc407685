//! # 文件系统程序集解析器
//!
//! 在配置的引用程序集目录中查找 `{name}.dll`。找到即视为解析成功，
//! 其产品名称取该目录配置的 `product`（例如 .NET Framework 引用程序集目录
//! 对应 `Microsoft® .NET Framework`）。

use std::io::ErrorKind;

use crate::models::assembly::AssemblyIdentity;
use crate::models::settings::ReferenceAssemblyDir;
use crate::services::host::{AssemblyResolver, ResolveError, ResolvedAssembly};

#[derive(Debug, Clone, Default)]
pub struct ReferenceAssemblyResolver {
    dirs: Vec<ReferenceAssemblyDir>,
}

impl ReferenceAssemblyResolver {
    pub fn new(dirs: Vec<ReferenceAssemblyDir>) -> Self {
        Self { dirs }
    }
}

impl AssemblyResolver for ReferenceAssemblyResolver {
    fn resolve(&self, identity: &AssemblyIdentity) -> Result<ResolvedAssembly, ResolveError> {
        let file_name = format!("{}.dll", identity.name);

        for dir in &self.dirs {
            let candidate = dir.path.join(&file_name);
            match std::fs::metadata(&candidate) {
                Ok(meta) if meta.is_file() => {
                    return Ok(ResolvedAssembly {
                        name: identity.name.clone(),
                        product: Some(dir.product.clone()),
                    });
                }
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(ResolveError::Failed(format!("{}: {}", candidate.display(), e)));
                }
            }
        }

        Err(ResolveError::NotFound(identity.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::DOTNET_FRAMEWORK_PRODUCT;

    #[test]
    fn test_resolves_from_first_matching_dir() {
        let framework = tempfile::tempdir().unwrap();
        let vendor = tempfile::tempdir().unwrap();
        std::fs::write(framework.path().join("System.Xml.dll"), b"MZ").unwrap();
        std::fs::write(vendor.path().join("Vendor.Lib.dll"), b"MZ").unwrap();

        let resolver = ReferenceAssemblyResolver::new(vec![
            ReferenceAssemblyDir {
                path: framework.path().to_path_buf(),
                product: DOTNET_FRAMEWORK_PRODUCT.to_string(),
            },
            ReferenceAssemblyDir {
                path: vendor.path().to_path_buf(),
                product: "Vendor".to_string(),
            },
        ]);

        let xml = resolver.resolve(&AssemblyIdentity::parse("System.Xml").unwrap()).unwrap();
        assert_eq!(xml.product.as_deref(), Some(DOTNET_FRAMEWORK_PRODUCT));

        let vendor_lib = resolver.resolve(&AssemblyIdentity::parse("Vendor.Lib").unwrap()).unwrap();
        assert_eq!(vendor_lib.product.as_deref(), Some("Vendor"));

        let missing = resolver.resolve(&AssemblyIdentity::parse("Missing").unwrap());
        assert!(matches!(missing, Err(ResolveError::NotFound(_))));
    }
}
