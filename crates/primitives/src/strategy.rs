//! Strategy and portfolio side definitions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing a strategy, side or leg name fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseError {}

/// Factor column a strategy ranks on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Winsorized, standardized raw inflow.
    Pure,
    /// Inflow residualized against log market cap.
    Neu,
    /// Inflow magnitude residualized against log market cap, signed by direction.
    Absneu,
}

impl Strategy {
    /// All strategies, in persistence order.
    pub const ALL: [Self; 3] = [Self::Pure, Self::Neu, Self::Absneu];

    /// Column / persistence name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pure => "pure",
            Self::Neu => "neu",
            Self::Absneu => "absneu",
        }
    }

    /// Title-cased name used in published portfolio names.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Pure => "Pure",
            Self::Neu => "Neu",
            Self::Absneu => "Absneu",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pure" => Ok(Self::Pure),
            "neu" => Ok(Self::Neu),
            "absneu" => Ok(Self::Absneu),
            other => Err(ParseError { kind: "strategy", value: other.to_string() }),
        }
    }
}

/// Side a position is held on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Top-quantile holdings.
    Long,
    /// Bottom-quantile holdings.
    Short,
}

impl Side {
    /// Both sides, long first.
    pub const BOTH: [Self; 2] = [Self::Long, Self::Short];

    /// Persistence name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }

    /// Sign applied when netting into the long-short book.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long" => Ok(Self::Long),
            "short" => Ok(Self::Short),
            other => Err(ParseError { kind: "side", value: other.to_string() }),
        }
    }
}

/// A reported book: either one side, or the netted long-short combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Leg {
    /// Long side on its own.
    #[serde(rename = "long")]
    Long,
    /// Short side on its own.
    #[serde(rename = "short")]
    Short,
    /// Long minus short.
    #[serde(rename = "long-short")]
    LongShort,
}

impl Leg {
    /// All legs, in persistence order.
    pub const ALL: [Self; 3] = [Self::Long, Self::Short, Self::LongShort];

    /// Persistence name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
            Self::LongShort => "long-short",
        }
    }

    /// The single side this leg holds, if any.
    #[must_use]
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::Long => Some(Side::Long),
            Self::Short => Some(Side::Short),
            Self::LongShort => None,
        }
    }
}

impl From<Side> for Leg {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => Self::Long,
            Side::Short => Self::Short,
        }
    }
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Leg {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long" => Ok(Self::Long),
            "short" => Ok(Self::Short),
            "long-short" => Ok(Self::LongShort),
            other => Err(ParseError { kind: "leg", value: other.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Strategy::Pure, "pure")]
    #[case(Strategy::Neu, "neu")]
    #[case(Strategy::Absneu, "absneu")]
    fn strategy_round_trips_through_str(#[case] strategy: Strategy, #[case] name: &str) {
        assert_eq!(strategy.to_string(), name);
        assert_eq!(name.parse::<Strategy>().unwrap(), strategy);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = "momentum".parse::<Strategy>().unwrap_err();
        assert!(err.to_string().contains("momentum"));
    }

    #[test]
    fn leg_serializes_with_hyphen() {
        let json = serde_json::to_string(&Leg::LongShort).unwrap();
        assert_eq!(json, "\"long-short\"");
        assert_eq!("long-short".parse::<Leg>().unwrap(), Leg::LongShort);
    }

    #[test]
    fn side_to_leg() {
        assert_eq!(Leg::from(Side::Short), Leg::Short);
        assert_eq!(Leg::LongShort.side(), None);
        assert_eq!(Side::Short.sign(), -1.0);
    }
}
