use super::archive::ArchiveKind;
use super::platform::{RuntimeArch, RuntimeDescriptor, RuntimeOs};
use once_cell::sync::Lazy;
use std::collections::HashMap;

const ADOPTIUM_BINARY_BASE: &str = "https://api.adoptium.net/v3/binary/latest";

/// Temurin JRE builds published per (major, os, arch)
const PUBLISHED_BUILDS: &[(u32, RuntimeOs, RuntimeArch)] = &[
    (8, RuntimeOs::Windows, RuntimeArch::X64),
    (8, RuntimeOs::Windows, RuntimeArch::X86),
    (8, RuntimeOs::Linux, RuntimeArch::X64),
    (8, RuntimeOs::Linux, RuntimeArch::Arm64),
    (8, RuntimeOs::MacOs, RuntimeArch::X64),
    (17, RuntimeOs::Windows, RuntimeArch::X64),
    (17, RuntimeOs::Windows, RuntimeArch::X86),
    (17, RuntimeOs::Linux, RuntimeArch::X64),
    (17, RuntimeOs::Linux, RuntimeArch::Arm64),
    (17, RuntimeOs::MacOs, RuntimeArch::X64),
    (17, RuntimeOs::MacOs, RuntimeArch::Arm64),
    (21, RuntimeOs::Windows, RuntimeArch::X64),
    (21, RuntimeOs::Linux, RuntimeArch::X64),
    (21, RuntimeOs::Linux, RuntimeArch::Arm64),
    (21, RuntimeOs::MacOs, RuntimeArch::X64),
    (21, RuntimeOs::MacOs, RuntimeArch::Arm64),
];

/// Where to fetch one runtime build and how it is packed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeBuild {
    pub url: String,
    pub archive: ArchiveKind,
}

fn adoptium_build(major: u32, os: RuntimeOs, arch: RuntimeArch) -> RuntimeBuild {
    let os_param = match os {
        RuntimeOs::Windows => "windows",
        RuntimeOs::Linux => "linux",
        RuntimeOs::MacOs => "mac",
    };
    let arch_param = match arch {
        RuntimeArch::X64 => "x64",
        RuntimeArch::X86 => "x32",
        RuntimeArch::Arm64 => "aarch64",
    };
    let archive = match os {
        RuntimeOs::Windows => ArchiveKind::Zip,
        _ => ArchiveKind::TarGz,
    };

    RuntimeBuild {
        url: format!(
            "{}/{}/ga/{}/{}/jre/hotspot/normal/eclipse",
            ADOPTIUM_BINARY_BASE, major, os_param, arch_param
        ),
        archive,
    }
}

static DEFAULT_BUILDS: Lazy<HashMap<RuntimeDescriptor, RuntimeBuild>> = Lazy::new(|| {
    PUBLISHED_BUILDS
        .iter()
        .map(|&(major, os, arch)| {
            (
                RuntimeDescriptor::new(major, os, arch),
                adoptium_build(major, os, arch),
            )
        })
        .collect()
});

/// Lookup table of runtime download locations keyed by descriptor
#[derive(Debug, Clone)]
pub struct RuntimeCatalog {
    builds: HashMap<RuntimeDescriptor, RuntimeBuild>,
}

impl Default for RuntimeCatalog {
    fn default() -> Self {
        Self {
            builds: DEFAULT_BUILDS.clone(),
        }
    }
}

impl RuntimeCatalog {
    /// Catalog with no entries; every lookup fails
    pub fn empty() -> Self {
        Self {
            builds: HashMap::new(),
        }
    }

    /// Add or replace the build for a descriptor (e.g. an internal mirror)
    pub fn insert(&mut self, descriptor: RuntimeDescriptor, build: RuntimeBuild) {
        self.builds.insert(descriptor, build);
    }

    pub fn lookup(&self, descriptor: &RuntimeDescriptor) -> Option<&RuntimeBuild> {
        self.builds.get(descriptor)
    }

    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_platform_urls() {
        let catalog = RuntimeCatalog::default();
        assert_eq!(catalog.len(), PUBLISHED_BUILDS.len());

        let linux = catalog
            .lookup(&RuntimeDescriptor::new(17, RuntimeOs::Linux, RuntimeArch::X64))
            .unwrap();
        assert_eq!(
            linux.url,
            "https://api.adoptium.net/v3/binary/latest/17/ga/linux/x64/jre/hotspot/normal/eclipse"
        );
        assert_eq!(linux.archive, ArchiveKind::TarGz);

        let windows = catalog
            .lookup(&RuntimeDescriptor::new(8, RuntimeOs::Windows, RuntimeArch::X86))
            .unwrap();
        assert!(windows.url.contains("/windows/x32/"));
        assert_eq!(windows.archive, ArchiveKind::Zip);
    }

    #[test]
    fn unpublished_combinations_are_absent() {
        let catalog = RuntimeCatalog::default();
        assert!(catalog
            .lookup(&RuntimeDescriptor::new(8, RuntimeOs::MacOs, RuntimeArch::Arm64))
            .is_none());
        assert!(catalog
            .lookup(&RuntimeDescriptor::new(21, RuntimeOs::Linux, RuntimeArch::X86))
            .is_none());
    }

    #[test]
    fn insert_overrides_entry() {
        let mut catalog = RuntimeCatalog::empty();
        let d = RuntimeDescriptor::new(21, RuntimeOs::Linux, RuntimeArch::X64);
        catalog.insert(
            d,
            RuntimeBuild {
                url: "http://mirror.local/jre21.tar.gz".to_string(),
                archive: ArchiveKind::TarGz,
            },
        );
        assert_eq!(catalog.lookup(&d).unwrap().url, "http://mirror.local/jre21.tar.gz");
    }
}
