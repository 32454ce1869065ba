use common::{AddressId, CityId, CustomerId};
use domain::{Address, Customer, CustomerKind, CustomerUpdate, NewAddress, NewCustomer, UnknownCode};
use serde::{Deserialize, Serialize};

use super::{FieldErrors, Validate};

/// Body of `POST /clientes`: the customer, its phones and its first address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerRequest {
    pub name: String,
    pub email: String,
    pub document: String,
    pub kind: i32,
    pub phones: Vec<String>,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub postal_code: String,
    pub city_id: i64,
}

impl Validate for CustomerRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", &self.name);
        errors.email("email", &self.email);
        errors.not_blank("document", &self.document);
        if let Err(err) = CustomerKind::from_code(self.kind) {
            errors.add("kind", err.to_string());
        }
        errors.into_result()
    }
}

impl TryFrom<CustomerRequest> for NewCustomer {
    type Error = UnknownCode;

    fn try_from(request: CustomerRequest) -> Result<Self, Self::Error> {
        Ok(NewCustomer {
            name: request.name,
            email: request.email,
            document: request.document,
            kind: CustomerKind::from_code(request.kind)?,
            phones: request
                .phones
                .into_iter()
                .filter(|phone| !phone.trim().is_empty())
                .collect(),
            address: NewAddress {
                street: request.street,
                number: request.number,
                complement: request.complement,
                district: request.district,
                postal_code: request.postal_code,
                city_id: CityId::new(request.city_id),
            },
        })
    }
}

/// Body of `PUT /clientes/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerUpdateRequest {
    pub name: String,
    pub email: String,
}

impl Validate for CustomerUpdateRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", &self.name);
        errors.email("email", &self.email);
        errors.into_result()
    }
}

impl From<CustomerUpdateRequest> for CustomerUpdate {
    fn from(request: CustomerUpdateRequest) -> Self {
        CustomerUpdate {
            name: request.name,
            email: request.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressResponse {
    pub id: AddressId,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub postal_code: String,
    pub city_id: CityId,
}

impl From<Address> for AddressResponse {
    fn from(address: Address) -> Self {
        Self {
            id: address.id,
            street: address.street,
            number: address.number,
            complement: address.complement,
            district: address.district,
            postal_code: address.postal_code,
            city_id: address.city_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub document: String,
    pub kind: i32,
    pub kind_description: String,
    pub phones: Vec<String>,
    pub addresses: Vec<AddressResponse>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            document: customer.document,
            kind: customer.kind.code(),
            kind_description: customer.kind.description().to_string(),
            phones: customer.phones.into_iter().collect(),
            addresses: customer
                .addresses
                .into_iter()
                .map(AddressResponse::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CustomerRequest {
        CustomerRequest {
            name: "Maria Silva".to_string(),
            email: "maria@gmail.com".to_string(),
            document: "36378912377".to_string(),
            kind: 1,
            phones: vec!["27363323".to_string(), " ".to_string()],
            street: "Rua Flores".to_string(),
            number: "300".to_string(),
            complement: Some("Apto 303".to_string()),
            district: "Jardim".to_string(),
            postal_code: "38220834".to_string(),
            city_id: 1,
        }
    }

    #[test]
    fn valid_request_maps_to_new_customer() {
        let request = valid_request();
        assert!(request.validate().is_ok());

        let customer = NewCustomer::try_from(request).unwrap();
        assert_eq!(customer.kind, CustomerKind::Individual);
        assert_eq!(customer.phones.len(), 1);
        assert_eq!(customer.address.city_id, CityId::new(1));
    }

    #[test]
    fn every_failing_field_is_reported() {
        let request = CustomerRequest {
            email: "not-an-email".to_string(),
            kind: 5,
            ..CustomerRequest::default()
        };

        let errors = request.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("name"), Some("must not be blank"));
        assert_eq!(errors.get("email"), Some("must be a valid email address"));
        assert_eq!(errors.get("kind"), Some("Invalid customer kind code: 5"));
    }

    #[test]
    fn update_requires_name_and_email() {
        let request = CustomerUpdateRequest {
            name: "Maria".to_string(),
            email: String::new(),
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("must not be blank"));
    }
}
