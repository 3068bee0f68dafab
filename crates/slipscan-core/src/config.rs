//! Lottery variants and the registry that resolves them.
//!
//! A variant is a plain [`LotteryConfig`] value: grid shape, numbering range and
//! draw size. Adding a variant means registering another value (in code via
//! [`Registry::with`] or from JSON via [`Registry::from_json`]), never a new type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// LotteryConfig
// ---------------------------------------------------------------------------

/// Shape of one lottery variant's betting slip.
///
/// Invariants (checked by [`LotteryConfig::new`] and on deserialization):
/// `rows > 0`, `cols > 0`, `total_numbers == rows * cols`, `min_number == 1`,
/// `max_number == total_numbers`, `0 < draw_size <= total_numbers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VariantDef")]
pub struct LotteryConfig {
    slug: String,
    name: String,
    rows: usize,
    cols: usize,
    total_numbers: u32,
    draw_size: usize,
    min_number: u32,
    max_number: u32,
}

/// Serialized form of a variant; the numbering range may be omitted.
#[derive(Debug, Clone, Deserialize)]
struct VariantDef {
    slug: String,
    name: Option<String>,
    rows: usize,
    cols: usize,
    draw_size: usize,
    total_numbers: Option<u32>,
    min_number: Option<u32>,
    max_number: Option<u32>,
}

impl TryFrom<VariantDef> for LotteryConfig {
    type Error = ConfigError;

    fn try_from(def: VariantDef) -> Result<Self, Self::Error> {
        let total = def
            .rows
            .checked_mul(def.cols)
            .and_then(|cells| u32::try_from(cells).ok())
            .ok_or_else(|| ConfigError::Invalid {
                slug: def.slug.clone(),
                reason: format!("{}x{} grid has too many cells", def.rows, def.cols),
            })?;
        let name = def.name.unwrap_or_else(|| def.slug.clone());
        let config = LotteryConfig {
            slug: def.slug,
            name,
            rows: def.rows,
            cols: def.cols,
            total_numbers: def.total_numbers.unwrap_or(total),
            draw_size: def.draw_size,
            min_number: def.min_number.unwrap_or(1),
            max_number: def.max_number.unwrap_or(total),
        };
        config.check()?;
        Ok(config)
    }
}

impl LotteryConfig {
    /// Build a variant with numbers `1..=rows*cols`.
    pub fn new(
        slug: &str,
        name: &str,
        rows: usize,
        cols: usize,
        draw_size: usize,
    ) -> Result<Self, ConfigError> {
        VariantDef {
            slug: slug.to_string(),
            name: Some(name.to_string()),
            rows,
            cols,
            draw_size,
            total_numbers: None,
            min_number: None,
            max_number: None,
        }
        .try_into()
    }

    /// Mega-Sena: 10x6 slip, numbers 1-60, 6 drawn.
    pub fn megasena() -> Self {
        Self::builtin("megasena", "Mega-Sena", 10, 6, 6)
    }

    /// Lotofacil: 5x5 slip, numbers 1-25, 15 drawn.
    pub fn lotofacil() -> Self {
        Self::builtin("lotofacil", "Lotofácil", 5, 5, 15)
    }

    fn builtin(slug: &str, name: &str, rows: usize, cols: usize, draw_size: usize) -> Self {
        let total = (rows * cols) as u32;
        Self {
            slug: slug.to_string(),
            name: name.to_string(),
            rows,
            cols,
            total_numbers: total,
            draw_size,
            min_number: 1,
            max_number: total,
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        let fail = |reason: String| {
            Err(ConfigError::Invalid {
                slug: self.slug.clone(),
                reason,
            })
        };
        if self.slug.trim().is_empty() {
            return fail("slug must not be empty".into());
        }
        if self.rows == 0 || self.cols == 0 {
            return fail("grid dimensions must be positive".into());
        }
        let cells = self.rows.checked_mul(self.cols).unwrap_or(usize::MAX);
        if self.total_numbers as usize != cells {
            return fail(format!(
                "total_numbers ({}) must equal rows * cols ({cells})",
                self.total_numbers
            ));
        }
        if self.min_number != 1 {
            return fail(format!("min_number must be 1, got {}", self.min_number));
        }
        if self.max_number != self.total_numbers {
            return fail(format!(
                "max_number ({}) must equal total_numbers ({})",
                self.max_number, self.total_numbers
            ));
        }
        if self.draw_size == 0 || self.draw_size > cells {
            return fail(format!(
                "draw_size ({}) invalid for {cells} numbers",
                self.draw_size
            ));
        }
        Ok(())
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn total_numbers(&self) -> u32 {
        self.total_numbers
    }

    pub fn draw_size(&self) -> usize {
        self.draw_size
    }

    pub fn min_number(&self) -> u32 {
        self.min_number
    }

    pub fn max_number(&self) -> u32 {
        self.max_number
    }
}

impl std::fmt::Display for LotteryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}x{} grid, {} of {})",
            self.name, self.rows, self.cols, self.draw_size, self.total_numbers
        )
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable slug → variant mapping, resolved explicitly by callers.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    variants: BTreeMap<String, LotteryConfig>,
}

impl Registry {
    /// The variants shipped with the crate: `megasena` and `lotofacil`.
    pub fn builtin() -> Self {
        Self::default()
            .with(LotteryConfig::megasena())
            .with(LotteryConfig::lotofacil())
    }

    /// A copy of this registry with `config` added (replacing a same-slug entry).
    pub fn with(mut self, config: LotteryConfig) -> Self {
        self.variants.insert(config.slug().to_string(), config);
        self
    }

    /// Builtin variants merged with a JSON array of variant objects.
    ///
    /// ```
    /// use slipscan_core::Registry;
    ///
    /// let json = r#"[{"slug": "quina", "name": "Quina", "rows": 8, "cols": 10, "draw_size": 5}]"#;
    /// let registry = Registry::from_json(json).unwrap();
    /// assert_eq!(registry.get("quina").unwrap().total_numbers(), 80);
    /// assert!(registry.get("megasena").is_ok());
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let extra: Vec<LotteryConfig> =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(extra.into_iter().fold(Self::builtin(), Self::with))
    }

    /// Resolve a variant by slug.
    pub fn get(&self, slug: &str) -> Result<&LotteryConfig, ConfigError> {
        self.variants
            .get(slug)
            .ok_or_else(|| ConfigError::UnknownVariant {
                slug: slug.to_string(),
                available: self.slugs().join(", "),
            })
    }

    pub fn slugs(&self) -> Vec<&str> {
        self.variants.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LotteryConfig> {
        self.variants.values()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_variants() {
        let registry = Registry::builtin();
        assert_eq!(registry.len(), 2);

        let mega = registry.get("megasena").unwrap();
        assert_eq!((mega.rows(), mega.cols()), (10, 6));
        assert_eq!(mega.total_numbers(), 60);
        assert_eq!(mega.draw_size(), 6);
        assert_eq!((mega.min_number(), mega.max_number()), (1, 60));

        let loto = registry.get("lotofacil").unwrap();
        assert_eq!((loto.rows(), loto.cols()), (5, 5));
        assert_eq!(loto.draw_size(), 15);
    }

    #[test]
    fn test_unknown_variant_lists_available() {
        let err = Registry::builtin().get("quina").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("quina"));
        assert!(msg.contains("lotofacil, megasena"));
    }

    #[test]
    fn test_new_rejects_bad_draw_size() {
        assert!(LotteryConfig::new("x", "X", 3, 3, 0).is_err());
        assert!(LotteryConfig::new("x", "X", 3, 3, 10).is_err());
        assert!(LotteryConfig::new("x", "X", 0, 3, 1).is_err());
        assert!(LotteryConfig::new("x", "X", 3, 3, 9).is_ok());
    }

    #[test]
    fn test_json_rejects_inconsistent_total() {
        let json = r#"[{"slug": "bad", "rows": 2, "cols": 2, "draw_size": 1, "total_numbers": 5}]"#;
        assert!(matches!(
            Registry::from_json(json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_oversized_grid_rejected() {
        assert!(matches!(
            LotteryConfig::new("huge", "Huge", usize::MAX, 2, 1),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            LotteryConfig::new("wide", "Wide", 70_000, 70_000, 1),
            Err(ConfigError::Invalid { .. })
        ));
        let json = format!(
            r#"[{{"slug": "huge", "rows": {}, "cols": 2, "draw_size": 1}}]"#,
            usize::MAX
        );
        assert!(matches!(
            Registry::from_json(&json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let mega = LotteryConfig::megasena();
        let json = serde_json::to_string(&vec![mega.clone()]).unwrap();
        let registry = Registry::from_json(&json).unwrap();
        assert_eq!(registry.get("megasena").unwrap(), &mega);
    }

    #[test]
    fn test_with_adds_variant() {
        let small = LotteryConfig::new("tiny", "Tiny", 2, 3, 2).unwrap();
        let registry = Registry::builtin().with(small);
        assert_eq!(registry.slugs(), vec!["lotofacil", "megasena", "tiny"]);
    }
}
