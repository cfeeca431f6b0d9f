use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host platforms a catalog can publish artifacts for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Windows,
    Macos,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Linux, Platform::Windows, Platform::Macos];

    /// Platform of the running host, if it is one the catalog knows about
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "linux") {
            Some(Platform::Linux)
        } else if cfg!(target_os = "windows") {
            Some(Platform::Windows)
        } else if cfg!(target_os = "macos") {
            Some(Platform::Macos)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Windows => "windows",
            Platform::Macos => "macos",
        }
    }

    /// Platform-specific executable file name for a base name
    pub fn executable_name(&self, base: &str) -> String {
        match self {
            Platform::Windows if !base.to_ascii_lowercase().ends_with(".exe") => {
                format!("{base}.exe")
            }
            _ => base.to_string(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "windows" | "win" | "win32" => Ok(Platform::Windows),
            "macos" | "mac" | "darwin" => Ok(Platform::Macos),
            other => Err(format!(
                "Unknown platform '{other}'. Valid platforms: linux, windows, macos"
            )),
        }
    }
}

/// One versioned artifact entry in a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Download {
    /// Version string as published upstream (may be loose, e.g. "v6.3.0-beta")
    ///
    /// Unquoted YAML numbers are accepted and stringified, so `6.10` reads
    /// as "6.1"; quote versions with significant trailing zeros.
    #[serde(deserialize_with = "version_scalar")]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macos_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionScalar {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

fn version_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match VersionScalar::deserialize(deserializer)? {
        VersionScalar::Text(text) => text,
        VersionScalar::Unsigned(n) => n.to_string(),
        VersionScalar::Signed(n) => n.to_string(),
        VersionScalar::Float(n) => n.to_string(),
    })
}

impl Download {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            linux_url: None,
            windows_url: None,
            macos_url: None,
        }
    }

    pub fn with_url(mut self, platform: Platform, url: impl Into<String>) -> Self {
        let url = Some(url.into());
        match platform {
            Platform::Linux => self.linux_url = url,
            Platform::Windows => self.windows_url = url,
            Platform::Macos => self.macos_url = url,
        }
        self
    }

    /// Artifact URL for a platform. Blank URLs count as absent.
    pub fn url_for(&self, platform: Platform) -> Option<&str> {
        let url = match platform {
            Platform::Linux => self.linux_url.as_deref(),
            Platform::Windows => self.windows_url.as_deref(),
            Platform::Macos => self.macos_url.as_deref(),
        };
        url.filter(|u| !u.trim().is_empty())
    }

    /// Platforms this entry publishes an artifact for
    pub fn platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.url_for(*p).is_some())
            .collect()
    }
}

#[cfg(test)]
mod download_tests {
    use super::*;

    #[test]
    fn test_url_for_platform() {
        let download = Download::new("6.3.0")
            .with_url(Platform::Linux, "https://example.invalid/xmrig-linux.tar.gz")
            .with_url(Platform::Windows, "   ");

        assert_eq!(
            download.url_for(Platform::Linux),
            Some("https://example.invalid/xmrig-linux.tar.gz")
        );
        assert_eq!(download.url_for(Platform::Windows), None);
        assert_eq!(download.url_for(Platform::Macos), None);
        assert_eq!(download.platforms(), vec![Platform::Linux]);
    }

    #[test]
    fn test_parse_download_yaml() {
        let yaml = r#"
version: "6.3.0"
linuxUrl: https://example.invalid/a
windowsUrl: https://example.invalid/b
"#;
        let download: Download = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(download.version, "6.3.0");
        assert_eq!(download.platforms(), vec![Platform::Linux, Platform::Windows]);
    }

    #[test]
    fn test_unquoted_numeric_versions() {
        let yaml = r#"
- version: 6.3
  linuxUrl: https://example.invalid/a
- version: 6
  linuxUrl: https://example.invalid/b
- version: 6.2.2
  linuxUrl: https://example.invalid/c
"#;
        let downloads: Vec<Download> = serde_yaml_ng::from_str(yaml).unwrap();
        let versions: Vec<&str> = downloads.iter().map(|d| d.version.as_str()).collect();
        assert_eq!(versions, vec!["6.3", "6", "6.2.2"]);

        let json: Download =
            serde_json::from_str(r#"{"version": 7, "linuxUrl": "https://example.invalid/d"}"#)
                .unwrap();
        assert_eq!(json.version, "7");
    }

    #[test]
    fn test_platform_parsing_and_executables() {
        assert_eq!("Linux".parse::<Platform>().unwrap(), Platform::Linux);
        assert_eq!("win32".parse::<Platform>().unwrap(), Platform::Windows);
        assert_eq!("darwin".parse::<Platform>().unwrap(), Platform::Macos);
        assert!("beos".parse::<Platform>().is_err());

        assert_eq!(Platform::Linux.executable_name("xmrig"), "xmrig");
        assert_eq!(Platform::Windows.executable_name("xmrig"), "xmrig.exe");
        assert_eq!(Platform::Windows.executable_name("xmrig.EXE"), "xmrig.EXE");
    }
}
