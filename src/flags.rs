// Flag Registry
// Static mapping from TSCA/PMN flag codes to human-readable explanations

use std::collections::HashMap;

/// Rendered for any code that has no definition
pub const MISSING_DESCRIPTION: &str = "Flag description not available";

/// Built-in flag definitions (code, description)
pub const FLAG_DEFINITIONS: &[(&str, &str)] = &[
    ("PMN", "Indicates a commenced PMN substance."),
    ("P", "Indicates a commenced PMN substance."),
    ("S", "Indicates a substance that is identified in a final Significant New Use Rule."),
    ("SP", "Indicates a substance that is identified in a proposed Significant New Use Rule."),
    ("5E", "Indicates a substance that is the subject of a Section 5(e) Order under TSCA."),
    ("5F", "Indicates a substance that is the subject of a Section 5(f) Order under TSCA."),
    ("E", "Indicates a substance that is the subject of a Section 5(e) Consent Order under TSCA."),
    ("F", "Indicates a substance that is the subject of a Section 5(f) Rule under TSCA."),
    ("R", "Indicates a substance that is the subject of a Section 6 risk management rule under TSCA."),
    ("T", "Indicates a substance that is the subject of a final Section 4 test rule under TSCA."),
    ("TP", "Indicates a substance that is the subject of a proposed Section 4 test rule under TSCA."),
    (
        "N",
        "Indicates a polymeric substance whose Inventory name covers the presence of a free-radical initiator not listed in the name.",
    ),
    (
        "UV",
        "Indicates a substance of Unknown or Variable composition, Complex reaction products and Biological materials (UVCB).",
    ),
    ("XU", "Indicates a substance exempt from reporting under the Chemical Data Reporting Rule."),
    (
        "Y1",
        "Indicates an exempt polymer that has a number-average molecular weight of 1,000 or greater.",
    ),
    (
        "Y2",
        "Indicates an exempt polymer that is a polyester made only from reactants on a specified list.",
    ),
];

/// FlagRegistry - fixed at process start, never mutated afterwards
#[derive(Debug, Clone)]
pub struct FlagRegistry {
    definitions: HashMap<String, String>,
}

impl FlagRegistry {
    /// Registry with the built-in TSCA/PMN definitions
    pub fn standard() -> Self {
        Self::from_pairs(FLAG_DEFINITIONS.iter().copied())
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let definitions = pairs
            .into_iter()
            .map(|(code, text)| (code.to_string(), text.to_string()))
            .collect();
        FlagRegistry { definitions }
    }

    /// Explanation for a single code, if known
    pub fn definition(&self, code: &str) -> Option<&str> {
        self.definitions.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Render the description for a semicolon-separated flag string.
    ///
    /// Codes keep their input order; each becomes "<code>: <description>" and
    /// the parts are joined with "; ". Unknown codes still appear, with
    /// [`MISSING_DESCRIPTION`]. Returns None when there are no codes at all.
    pub fn describe(&self, flags: &str) -> Option<String> {
        let parts: Vec<String> = flags
            .split(';')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(|code| {
                let text = self.definition(code).unwrap_or(MISSING_DESCRIPTION);
                format!("{}: {}", code, text)
            })
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

impl Default for FlagRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_preserves_order() {
        let registry = FlagRegistry::standard();

        assert_eq!(
            registry.describe("PMN; S").as_deref(),
            Some(
                "PMN: Indicates a commenced PMN substance.; \
                 S: Indicates a substance that is identified in a final Significant New Use Rule."
            )
        );

        let reversed = registry.describe("S;PMN").unwrap();
        assert!(reversed.starts_with("S: "));
        assert!(reversed.contains("; PMN: "));
    }

    #[test]
    fn test_unknown_code_is_kept() {
        let registry = FlagRegistry::standard();

        assert_eq!(
            registry.describe("ZZ").as_deref(),
            Some("ZZ: Flag description not available")
        );
        assert_eq!(
            registry.describe("PMN;ZZ").as_deref(),
            Some("PMN: Indicates a commenced PMN substance.; ZZ: Flag description not available")
        );
    }

    #[test]
    fn test_blank_flags() {
        let registry = FlagRegistry::standard();

        assert_eq!(registry.describe(""), None);
        assert_eq!(registry.describe(" ; ;"), None);
        // Stray separators are dropped, codes survive
        assert_eq!(
            registry.describe(";XU;").as_deref(),
            Some("XU: Indicates a substance exempt from reporting under the Chemical Data Reporting Rule.")
        );
    }

    #[test]
    fn test_codes_are_case_sensitive() {
        let registry = FlagRegistry::standard();
        assert_eq!(registry.definition("pmn"), None);
        assert!(registry.definition("PMN").is_some());
    }

    #[test]
    fn test_custom_registry() {
        let registry = FlagRegistry::from_pairs([("A", "Alpha"), ("B", "Beta")]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.describe("B;A").as_deref(), Some("B: Beta; A: Alpha"));
    }
}
