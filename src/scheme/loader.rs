use tracing::{debug, warn};

use crate::host::fs::{is_user_resource, normalize_resource_path};
use crate::host::{HostError, ResourceLoader};

use super::{SchemeDocument, SchemeError, SchemeFormat, SchemeResult};

/// A scheme document with every override fragment already layered on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedScheme {
    pub document: SchemeDocument,
    pub scheme_file: String,
    /// Override fragments in the order they were applied.
    pub overrides: Vec<String>,
}

pub struct SchemeLoader<'a> {
    resources: &'a dyn ResourceLoader,
}

impl<'a> SchemeLoader<'a> {
    pub fn new(resources: &'a dyn ResourceLoader) -> Self {
        Self { resources }
    }

    pub fn load(&self, scheme_file: &str) -> SchemeResult<LoadedScheme> {
        let scheme_file = normalize_resource_path(scheme_file);
        let mut document = self.read_document(&scheme_file)?;

        let mut overrides = Vec::new();
        for path in self.override_paths(&scheme_file) {
            match self.read_document(&path) {
                Ok(fragment) => {
                    debug!(path = %path, rules = fragment.rules.len(), "applying scheme override");
                    document.merge(fragment);
                    overrides.push(path);
                }
                Err(err) => warn!(path = %path, %err, "skipping unreadable scheme override"),
            }
        }

        Ok(LoadedScheme {
            document,
            scheme_file,
            overrides,
        })
    }

    fn read_document(&self, path: &str) -> SchemeResult<SchemeDocument> {
        let bytes = self.resources.load_bytes(path).map_err(|err| match err {
            HostError::NotFound(_) => SchemeError::NotFound(path.to_string()),
            source => SchemeError::Resource {
                path: path.to_string(),
                source,
            },
        })?;
        let text = String::from_utf8(bytes)
            .map_err(|err| SchemeError::parse(path, format!("invalid utf-8: {err}")))?;
        SchemeDocument::parse(path, &text)
    }

    /// Every `<stem>.sublime-color-scheme` other than the scheme itself, with
    /// the user's package last.
    fn override_paths(&self, scheme_file: &str) -> Vec<String> {
        let Some(file_name) = override_file_name(scheme_file) else {
            return Vec::new();
        };
        let mut paths = match self.resources.find_resources(&file_name) {
            Ok(paths) => paths,
            Err(err) => {
                warn!(file = %file_name, %err, "failed to search for scheme overrides");
                return Vec::new();
            }
        };
        paths.retain(|path| normalize_resource_path(path) != scheme_file);
        paths.sort_by_key(|path| is_user_resource(path));
        paths
    }
}

fn override_file_name(scheme_file: &str) -> Option<String> {
    let file_name = scheme_file.rsplit('/').next()?;
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };
    (!stem.is_empty()).then(|| format!("{stem}{}", SchemeFormat::MODERN_EXTENSION))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::host::HostResult;
    use crate::scheme::{ForegroundExpr, Rule};

    #[derive(Default)]
    struct MemoryResources {
        files: HashMap<String, String>,
    }

    impl MemoryResources {
        fn with(mut self, path: &str, contents: &str) -> Self {
            self.files.insert(path.to_string(), contents.to_string());
            self
        }
    }

    impl ResourceLoader for MemoryResources {
        fn load_bytes(&self, path: &str) -> HostResult<Vec<u8>> {
            self.files
                .get(path)
                .map(|contents| contents.as_bytes().to_vec())
                .ok_or_else(|| HostError::NotFound(path.to_string()))
        }

        fn find_resources(&self, file_name: &str) -> HostResult<Vec<String>> {
            let mut found: Vec<String> = self
                .files
                .keys()
                .filter(|path| path.ends_with(&format!("/{file_name}")))
                .cloned()
                .collect();
            found.sort();
            Ok(found)
        }
    }

    const BASE: &str = r##"{
        "variables": { "accent": "#f00" },
        "globals": { "background": "#000" },
        "rules": [{ "scope": "string", "foreground": "var(accent)" }]
    }"##;

    #[test]
    fn overrides_layer_in_package_order_with_user_last() {
        let resources = MemoryResources::default()
            .with("Packages/Theme/Dark.sublime-color-scheme", BASE)
            .with(
                "Packages/User/Dark.sublime-color-scheme",
                r##"{ "variables": { "accent": "#00f" } }"##,
            )
            .with(
                "Packages/Addon/Dark.sublime-color-scheme",
                r##"{ "variables": { "accent": "#0f0" }, "rules": [{ "scope": "comment" }] }"##,
            );

        let loaded = SchemeLoader::new(&resources)
            .load("Packages/Theme/Dark.sublime-color-scheme")
            .expect("load scheme");

        assert_eq!(
            loaded.overrides,
            [
                "Packages/Addon/Dark.sublime-color-scheme",
                "Packages/User/Dark.sublime-color-scheme",
            ]
        );
        assert_eq!(loaded.document.variables["accent"], "#00f");
        assert_eq!(loaded.document.globals["background"], "#000");
        let scopes: Vec<_> = loaded
            .document
            .rules
            .iter()
            .map(|rule| rule.scope.as_str())
            .collect();
        assert_eq!(scopes, ["string", "comment"]);
    }

    #[test]
    fn legacy_scheme_picks_up_modern_overrides() {
        let plist = r#"<plist><dict><key>settings</key><array>
            <dict><key>settings</key><dict><key>background</key><string>#111111</string></dict></dict>
        </array></dict></plist>"#;
        let resources = MemoryResources::default()
            .with("Packages/Legacy/Old.tmTheme", plist)
            .with(
                "Packages/User/Old.sublime-color-scheme",
                r##"{ "rules": [{ "name": "Mine", "scope": "string", "foreground": "#fff" }] }"##,
            );

        let loaded = SchemeLoader::new(&resources)
            .load("Packages/Legacy/Old.tmTheme")
            .expect("load scheme");

        assert_eq!(loaded.document.globals["background"], "#111111");
        assert_eq!(
            loaded.document.rules,
            [Rule {
                name: "Mine".into(),
                scope: "string".into(),
                foreground: Some(ForegroundExpr::Solid("#fff".into())),
                ..Rule::default()
            }]
        );
    }

    #[test]
    fn broken_override_is_skipped() {
        let resources = MemoryResources::default()
            .with("Packages/Theme/Dark.sublime-color-scheme", BASE)
            .with("Packages/User/Dark.sublime-color-scheme", "{ not json");

        let loaded = SchemeLoader::new(&resources)
            .load("Packages/Theme/Dark.sublime-color-scheme")
            .expect("root scheme still loads");

        assert!(loaded.overrides.is_empty());
        assert_eq!(loaded.document.variables["accent"], "#f00");
    }

    #[test]
    fn missing_scheme_is_not_found() {
        let resources = MemoryResources::default();
        let err = SchemeLoader::new(&resources)
            .load("Packages/Theme/Gone.tmTheme")
            .expect_err("scheme is missing");
        assert!(matches!(err, SchemeError::NotFound(path) if path == "Packages/Theme/Gone.tmTheme"));
    }

    #[test]
    fn override_file_name_swaps_extension() {
        assert_eq!(
            override_file_name("Packages/Theme/Dark.tmTheme").as_deref(),
            Some("Dark.sublime-color-scheme")
        );
        assert_eq!(
            override_file_name("Packages/Theme/Dark.sublime-color-scheme").as_deref(),
            Some("Dark.sublime-color-scheme")
        );
    }
}
