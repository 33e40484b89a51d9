//! Equipment category classification.
//!
//! Maps a machine's model designation (and, as a fallback, its
//! manufacturer) to an [`EquipmentCategory`]. The rule table is an ordered,
//! immutable list: the **first** matching rule wins, so the order of the
//! rules is part of their meaning. For example model rules are checked
//! before the manufacturer fallbacks, so a `BW 120` roller sold by Kubota
//! is still a compactor.
//!
//! Descriptive words such as `scissor` match anywhere in the value. Short
//! designation codes such as `GS` or `EZ` only match at the start of a
//! whitespace-separated token, so an `Inverter` generator does not contain
//! an `ERT` scissor lift.

use fleet_equipment_models::EquipmentCategory;

/// Which extracted value a rule is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Model,
    Manufacturer,
}

/// Where in the value a pattern may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Anywhere.
    Substring,
    /// At the start of a whitespace-separated token.
    TokenPrefix,
}

/// A single case-insensitive rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub pattern: String,
    pub scope: RuleScope,
    pub kind: PatternKind,
    pub category: EquipmentCategory,
}

impl CategoryRule {
    /// Creates a rule matching `pattern` anywhere in the model designation.
    #[must_use]
    pub fn model(pattern: &str, category: EquipmentCategory) -> Self {
        Self {
            pattern: pattern.to_owned(),
            scope: RuleScope::Model,
            kind: PatternKind::Substring,
            category,
        }
    }

    /// Creates a rule matching a designation code such as `GS` or `Z-` at
    /// the start of a token of the model designation.
    #[must_use]
    pub fn model_code(code: &str, category: EquipmentCategory) -> Self {
        Self {
            pattern: code.to_owned(),
            scope: RuleScope::Model,
            kind: PatternKind::TokenPrefix,
            category,
        }
    }

    /// Creates a rule matching `pattern` anywhere in the manufacturer.
    #[must_use]
    pub fn manufacturer(pattern: &str, category: EquipmentCategory) -> Self {
        Self {
            pattern: pattern.to_owned(),
            scope: RuleScope::Manufacturer,
            kind: PatternKind::Substring,
            category,
        }
    }

    fn matches(&self, model_lower: &str, manufacturer_lower: &str) -> bool {
        let haystack = match self.scope {
            RuleScope::Model => model_lower,
            RuleScope::Manufacturer => manufacturer_lower,
        };

        match self.kind {
            PatternKind::Substring => {
                !self.pattern.is_empty() && haystack.contains(&self.pattern.to_lowercase())
            }
            PatternKind::TokenPrefix => {
                let code = self.pattern.trim().to_lowercase();
                !code.is_empty()
                    && haystack
                        .split_whitespace()
                        .any(|token| token.starts_with(&code))
            }
        }
    }
}

/// Result of classifying one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: EquipmentCategory,
    pub category_group: &'static str,
}

impl From<EquipmentCategory> for Classification {
    fn from(category: EquipmentCategory) -> Self {
        Self {
            category,
            category_group: category.group(),
        }
    }
}

/// Ordered first-match-wins rule table.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<CategoryRule>,
}

impl Classifier {
    /// Creates a classifier over `rules`, evaluated in the given order.
    #[must_use]
    pub const fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// The rule table in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Classifies a machine. Never fails: when no rule matches the result
    /// is [`EquipmentCategory::Other`].
    #[must_use]
    pub fn classify(&self, model: &str, manufacturer: &str) -> Classification {
        let model_lower = model.to_lowercase();
        let manufacturer_lower = manufacturer.to_lowercase();

        self.rules
            .iter()
            .find(|rule| rule.matches(&model_lower, &manufacturer_lower))
            .map_or(EquipmentCategory::Other, |rule| rule.category)
            .into()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

/// The built-in rule table.
#[must_use]
pub fn default_rules() -> Vec<CategoryRule> {
    use EquipmentCategory::{
        BoomLift, Compactor, Dumper, Excavator, Forklift, Generator, ScissorLift, Telehandler,
        WheelLoader,
    };

    fn model(patterns: &[&str], category: EquipmentCategory) -> Vec<CategoryRule> {
        patterns
            .iter()
            .map(|p| CategoryRule::model(p, category))
            .collect()
    }

    fn codes(codes: &[&str], category: EquipmentCategory) -> Vec<CategoryRule> {
        codes
            .iter()
            .map(|c| CategoryRule::model_code(c, category))
            .collect()
    }

    fn manufacturer(patterns: &[&str], category: EquipmentCategory) -> Vec<CategoryRule> {
        patterns
            .iter()
            .map(|p| CategoryRule::manufacturer(p, category))
            .collect()
    }

    [
        // ── Access platforms ────────────────────────────────────────
        model(&["scissor"], ScissorLift),
        codes(&["GS", "ERT", "SJIII"], ScissorLift),
        model(&["boom"], BoomLift),
        codes(&["Z-", "S-", "HA1", "HT1"], BoomLift),
        // ── Handling ────────────────────────────────────────────────
        model(&["telehandler"], Telehandler),
        codes(&["GTH", "MT", "TH-"], Telehandler),
        // ── Earthmoving ─────────────────────────────────────────────
        model(&["excavator"], Excavator),
        codes(&["ZX", "ViO", "KX", "EZ"], Excavator),
        model(&["loader"], WheelLoader),
        codes(&["WL"], WheelLoader),
        model(&["dumper"], Dumper),
        codes(&["DW", "DV"], Dumper),
        model(&["roller", "rammer", "plate"], Compactor),
        codes(&["BW", "DPU", "VP"], Compactor),
        // ── Power and warehouse ─────────────────────────────────────
        model(&["generator"], Generator),
        codes(&["kVA"], Generator),
        model(&["forklift"], Forklift),
        // ── Manufacturer fallbacks ──────────────────────────────────
        manufacturer(&["Bomag", "Ammann"], Compactor),
        manufacturer(&["Manitou", "Merlo"], Telehandler),
        manufacturer(&["Kubota", "Yanmar"], Excavator),
    ]
    .into_iter()
    .flatten()
    .collect()
}
