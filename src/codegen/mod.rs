// Code generation: validated definition -> target-language source text
pub mod python;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::StrategyDefinition;

/// Language the emitter writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitTarget {
    #[default]
    Python,
}

impl EmitTarget {
    pub const ALL: [EmitTarget; 1] = [EmitTarget::Python];

    pub fn as_str(self) -> &'static str {
        match self {
            EmitTarget::Python => "python",
        }
    }

    /// File extension for artifacts in this language
    pub fn extension(self) -> &'static str {
        match self {
            EmitTarget::Python => "py",
        }
    }
}

impl fmt::Display for EmitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EmitTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmitTarget::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s) || t.extension() == s)
            .ok_or_else(|| format!("unsupported emit target: {}", s))
    }
}

/// Render a validated definition as source text.
///
/// Deterministic: equal definitions always produce byte-identical output.
pub fn emit(definition: &StrategyDefinition, target: EmitTarget) -> String {
    match target {
        EmitTarget::Python => python::emit(definition),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parse() {
        assert_eq!("python".parse::<EmitTarget>(), Ok(EmitTarget::Python));
        assert_eq!("py".parse::<EmitTarget>(), Ok(EmitTarget::Python));
        assert!("csharp".parse::<EmitTarget>().is_err());
        assert_eq!(EmitTarget::default().extension(), "py");
    }
}
