//! JAR manifest parsing
//!
//! Parses the main section of `META-INF/MANIFEST.MF`: `Name: value`
//! lines, where a line starting with a single space continues the
//! previous value. Attribute names compare case-insensitively.

/// Path of the manifest inside a JAR or WAR
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Main-section attributes of a JAR manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    /// Parse manifest text. Malformed lines are skipped.
    pub fn parse(content: &str) -> Self {
        let mut attributes: Vec<(String, String)> = Vec::new();

        for line in content.lines() {
            let line = line.strip_suffix('\r').unwrap_or(line);

            // Blank line ends the main section
            if line.is_empty() {
                break;
            }

            if let Some(continuation) = line.strip_prefix(' ') {
                if let Some((_, value)) = attributes.last_mut() {
                    value.push_str(continuation);
                }
                continue;
            }

            if let Some((name, value)) = line.split_once(':') {
                let value = value.strip_prefix(' ').unwrap_or(value);
                attributes.push((name.trim().to_string(), value.to_string()));
            }
        }

        Self { attributes }
    }

    /// Look up an attribute by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `Main-Class` attribute, if present and non-empty
    pub fn main_class(&self) -> Option<&str> {
        self.get("Main-Class")
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_main_class() {
        let manifest = Manifest::parse(
            "Manifest-Version: 1.0\r\nMain-Class: com.example.Main\r\nCreated-By: Gradle\r\n\r\n",
        );
        assert_eq!(manifest.main_class(), Some("com.example.Main"));
        assert_eq!(manifest.get("created-by"), Some("Gradle"));
    }

    #[test]
    fn joins_continuation_lines() {
        let manifest = Manifest::parse(
            "Manifest-Version: 1.0\nMain-Class: org.springframework.boot.loader.Jar\n Launcher\n",
        );
        assert_eq!(
            manifest.main_class(),
            Some("org.springframework.boot.loader.JarLauncher")
        );
    }

    #[test]
    fn ignores_per_entry_sections() {
        let manifest = Manifest::parse(
            "Manifest-Version: 1.0\n\nName: com/example/\nMain-Class: com.example.Hidden\n",
        );
        assert_eq!(manifest.main_class(), None);
    }

    #[test]
    fn empty_main_class_is_absent() {
        let manifest = Manifest::parse("Manifest-Version: 1.0\nMain-Class: \n");
        assert_eq!(manifest.main_class(), None);
    }
}
