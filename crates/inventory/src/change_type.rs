use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult};

use crate::stock::Underflow;

/// Kind of stock movement recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Goods received (purchases, manual receipts).
    Import,
    /// Goods sold.
    Sale,
    /// Goods returned by a customer.
    Return,
    /// Absolute correction: the quantity *is* the new stock level.
    Adjust,
}

/// How a ledger entry moves the projected stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    Delta { delta: i64, underflow: Underflow },
    Set(i64),
}

impl ChangeType {
    pub const ALL: [ChangeType; 4] = [Self::Import, Self::Sale, Self::Return, Self::Adjust];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Sale => "sale",
            Self::Return => "return",
            Self::Adjust => "adjust",
        }
    }

    /// Quantity rules for entries written through the inventory-log path.
    pub fn validate_quantity(self, quantity: i64) -> DomainResult<()> {
        match self {
            Self::Adjust if quantity < 0 => Err(DomainError::validation(
                "adjust quantity cannot be negative",
            )),
            Self::Import | Self::Sale | Self::Return if quantity <= 0 => Err(
                DomainError::validation(format!("{self} quantity must be greater than zero")),
            ),
            _ => Ok(()),
        }
    }

    pub fn effect(self, quantity: i64) -> StockEffect {
        match self {
            Self::Import | Self::Return => StockEffect::Delta {
                delta: quantity,
                underflow: Underflow::Allow,
            },
            Self::Sale => StockEffect::Delta {
                delta: quantity.saturating_neg(),
                underflow: Underflow::Reject,
            },
            Self::Adjust => StockEffect::Set(quantity),
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "import" => Ok(Self::Import),
            "sale" => Ok(Self::Sale),
            "return" => Ok(Self::Return),
            "adjust" => Ok(Self::Adjust),
            other => Err(DomainError::InvalidChangeType(other.to_string())),
        }
    }
}
