use serde::{Deserialize, Serialize};

/// Declares a typed identifier over the database's `BIGINT` primary keys.
///
/// Each entity gets its own type so a customer id can never be passed where
/// an order id is expected.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from its raw value.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw value.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Identifier of a product category.
    CategoryId
);
entity_id!(
    /// Identifier of a catalog product.
    ProductId
);
entity_id!(
    /// Identifier of a federative state.
    StateId
);
entity_id!(
    /// Identifier of a city.
    CityId
);
entity_id!(
    /// Identifier of a customer.
    CustomerId
);
entity_id!(
    /// Identifier of a customer address.
    AddressId
);
entity_id!(
    /// Identifier of an order. The order's payment shares this identifier.
    OrderId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_preserves_raw_value() {
        let id = OrderId::new(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(OrderId::from(42), id);
    }

    #[test]
    fn id_parses_from_path_segment() {
        assert_eq!("17".parse::<CustomerId>().unwrap(), CustomerId::new(17));
        assert_eq!(" 3 ".parse::<CategoryId>().unwrap(), CategoryId::new(3));
        assert!("abc".parse::<ProductId>().is_err());
        assert!("".parse::<AddressId>().is_err());
    }

    #[test]
    fn id_serializes_as_plain_number() {
        let json = serde_json::to_string(&CityId::new(7)).unwrap();
        assert_eq!(json, "7");

        let id: StateId = serde_json::from_str("9").unwrap();
        assert_eq!(id, StateId::new(9));
    }

    #[test]
    fn ids_order_by_raw_value() {
        let mut ids = vec![ProductId::new(3), ProductId::new(1), ProductId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![ProductId::new(1), ProductId::new(2), ProductId::new(3)]);
    }
}
