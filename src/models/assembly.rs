//! # 程序集标识
//!
//! `AssemblyIdentity` 对应完全限定的程序集显示名称：
//! `"{name}, Version={major}.{minor}.{build}.{revision}, Culture={culture}, PublicKeyToken={token}"`。
//!
//! 文化缺省时写作 `neutral`，公钥令牌缺省时写作 `null`。

use std::fmt;

use crate::models::project::ReferenceDescriptor;

/// 四段式程序集版本号
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl AssemblyVersion {
    /// 解析 `"4.0.0.0"` 形式的版本号，缺失的段按 0 处理
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = [0u16; 4];
        let mut count = 0;
        for (i, segment) in text.trim().split('.').enumerate() {
            if i >= 4 {
                return None;
            }
            parts[i] = segment.parse().ok()?;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(Self {
            major: parts[0],
            minor: parts[1],
            build: parts[2],
            revision: parts[3],
        })
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// 完全限定的程序集标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyIdentity {
    pub name: String,
    pub version: AssemblyVersion,
    pub culture: Option<String>,
    pub public_key_token: Option<String>,
}

impl AssemblyIdentity {
    /// 由外部引用描述构建程序集标识
    pub fn from_reference(reference: &ReferenceDescriptor) -> Self {
        Self {
            name: reference.name.clone(),
            version: AssemblyVersion {
                major: reference.major_version,
                minor: reference.minor_version,
                build: reference.build_number,
                revision: reference.revision_number,
            },
            culture: non_empty(reference.culture.as_deref()),
            public_key_token: non_empty(reference.public_key_token.as_deref()),
        }
    }

    /// 解析 `"Name, Key=Value, ..."` 形式的程序集显示名称
    ///
    /// 未知的键（如 `processorArchitecture`）被忽略；`neutral` 文化和 `null`
    /// 令牌视为缺省。名称为空时返回 `None`。
    pub fn parse(display_name: &str) -> Option<Self> {
        let mut parts = display_name.split(',');
        let name = parts.next()?.trim();
        if name.is_empty() {
            return None;
        }

        let mut identity = Self {
            name: name.to_string(),
            version: AssemblyVersion::default(),
            culture: None,
            public_key_token: None,
        };

        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "version" => identity.version = AssemblyVersion::parse(value)?,
                "culture" if !value.eq_ignore_ascii_case("neutral") => {
                    identity.culture = non_empty(Some(value));
                }
                "publickeytoken" if !value.eq_ignore_ascii_case("null") => {
                    identity.public_key_token = non_empty(Some(value));
                }
                _ => {}
            }
        }

        Some(identity)
    }

    /// 是否为核心运行时程序集（始终保留）
    pub fn is_core_runtime(&self) -> bool {
        self.name.contains("mscorlib")
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, Version={}, Culture={}, PublicKeyToken={}",
            self.name,
            self.version,
            self.culture.as_deref().unwrap_or("neutral"),
            self.public_key_token.as_deref().unwrap_or("null")
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
