//! Customers and their delivery addresses.

use std::collections::BTreeSet;

use common::{AddressId, CityId, CustomerId};
use serde::{Deserialize, Serialize};

use crate::UnknownCode;

/// Whether the customer is a natural person or a company.
///
/// Wire codes: `1` individual (CPF), `2` company (CNPJ).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerKind {
    Individual,
    Company,
}

impl CustomerKind {
    pub fn code(&self) -> i32 {
        match self {
            CustomerKind::Individual => 1,
            CustomerKind::Company => 2,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CustomerKind::Individual => "Pessoa Física",
            CustomerKind::Company => "Pessoa Jurídica",
        }
    }

    pub fn from_code(code: i32) -> Result<Self, UnknownCode> {
        match code {
            1 => Ok(CustomerKind::Individual),
            2 => Ok(CustomerKind::Company),
            _ => Err(UnknownCode {
                kind: "customer kind",
                code,
            }),
        }
    }
}

impl TryFrom<i32> for CustomerKind {
    type Error = UnknownCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

/// A delivery address owned by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub postal_code: String,
    pub city_id: CityId,
}

/// Address fields supplied when a customer is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub postal_code: String,
    pub city_id: CityId,
}

/// A customer with its phones and addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    /// CPF for individuals, CNPJ for companies.
    pub document: String,
    pub kind: CustomerKind,
    pub phones: BTreeSet<String>,
    pub addresses: Vec<Address>,
}

impl Customer {
    /// Applies the fields a customer may change after registration.
    pub fn apply(&mut self, update: CustomerUpdate) {
        self.name = update.name;
        self.email = update.email;
    }

    pub fn address(&self, address_id: AddressId) -> Option<&Address> {
        self.addresses.iter().find(|a| a.id == address_id)
    }
}

/// Everything needed to register a customer together with a first address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub document: String,
    pub kind: CustomerKind,
    pub phones: BTreeSet<String>,
    pub address: NewAddress,
}

/// The editable subset of a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerUpdate {
    pub name: String,
    pub email: String,
}
