//! Order payment: a shared state over a closed set of payment methods.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::UnknownCode;

/// Settlement state of a payment.
///
/// Wire codes: `1` pending, `2` settled, `3` cancelled. Any state may be
/// overwritten by any other; no transition table is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentState {
    #[default]
    Pending,
    Settled,
    Cancelled,
}

impl PaymentState {
    pub fn code(&self) -> i32 {
        match self {
            PaymentState::Pending => 1,
            PaymentState::Settled => 2,
            PaymentState::Cancelled => 3,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PaymentState::Pending => "Pendente",
            PaymentState::Settled => "Quitado",
            PaymentState::Cancelled => "Cancelado",
        }
    }

    pub fn from_code(code: i32) -> Result<Self, UnknownCode> {
        match code {
            1 => Ok(PaymentState::Pending),
            2 => Ok(PaymentState::Settled),
            3 => Ok(PaymentState::Cancelled),
            _ => Err(UnknownCode {
                kind: "payment state",
                code,
            }),
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "Pending",
            PaymentState::Settled => "Settled",
            PaymentState::Cancelled => "Cancelled",
        }
    }
}

impl TryFrom<i32> for PaymentState {
    type Error = UnknownCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of payment a client asks for when placing an order.
///
/// Wire codes: `1` credit card, `2` bank slip (boleto).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentKind {
    Card,
    BankSlip,
}

impl PaymentKind {
    pub fn code(&self) -> i32 {
        match self {
            PaymentKind::Card => 1,
            PaymentKind::BankSlip => 2,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PaymentKind::Card => "Cartão de Crédito",
            PaymentKind::BankSlip => "Boleto",
        }
    }

    pub fn from_code(code: i32) -> Result<Self, UnknownCode> {
        match code {
            1 => Ok(PaymentKind::Card),
            2 => Ok(PaymentKind::BankSlip),
            _ => Err(UnknownCode {
                kind: "payment kind",
                code,
            }),
        }
    }
}

impl TryFrom<i32> for PaymentKind {
    type Error = UnknownCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

/// Variant-specific payment data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentMethod {
    Card {
        installments: Option<i32>,
    },
    BankSlip {
        due_date: Option<NaiveDate>,
        paid_date: Option<NaiveDate>,
    },
}

impl PaymentMethod {
    pub fn kind(&self) -> PaymentKind {
        match self {
            PaymentMethod::Card { .. } => PaymentKind::Card,
            PaymentMethod::BankSlip { .. } => PaymentKind::BankSlip,
        }
    }
}

/// The payment of an order. It has no identifier of its own: it is stored
/// under its order's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    state: PaymentState,
    method: PaymentMethod,
}

impl Payment {
    pub fn new(state: PaymentState, method: PaymentMethod) -> Self {
        Self { state, method }
    }

    /// Creates a pending payment of the requested kind.
    ///
    /// `installments` only applies to card payments and is not validated;
    /// bank slips start without due or paid dates.
    pub fn pending(kind: PaymentKind, installments: Option<i32>) -> Self {
        let method = match kind {
            PaymentKind::Card => PaymentMethod::Card { installments },
            PaymentKind::BankSlip => PaymentMethod::BankSlip {
                due_date: None,
                paid_date: None,
            },
        };
        Self::new(PaymentState::Pending, method)
    }

    pub fn state(&self) -> PaymentState {
        self.state
    }

    pub fn method(&self) -> &PaymentMethod {
        &self.method
    }

    pub fn kind(&self) -> PaymentKind {
        self.method.kind()
    }

    pub(crate) fn set_state(&mut self, state: PaymentState) {
        self.state = state;
    }
}
