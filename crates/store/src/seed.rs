//! Reference data loaded into an empty store.

use std::collections::BTreeSet;

use common::PageRequest;
use domain::{CustomerKind, Money, NewAddress, NewCategory, NewCustomer, NewProduct};

use crate::{
    Result,
    store::{
        CategoryRepository, CustomerRepository, LocationRepository, ProductRepository, Store,
        UnitOfWork,
    },
};

/// Number of rows inserted by [`seed_reference_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub states: usize,
    pub cities: usize,
    pub customers: usize,
    pub addresses: usize,
}

impl SeedSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Seeds categories, products, locations and one customer.
///
/// Does nothing when the store already holds categories, so running it on
/// every startup is safe.
pub async fn seed_reference_data<S: Store>(store: &S) -> Result<SeedSummary> {
    let mut uow = store.begin().await?;

    let existing = uow.list_categories(PageRequest::new(0, 1)).await?;
    if existing.total_elements > 0 {
        tracing::debug!("store already seeded");
        return Ok(SeedSummary::default());
    }

    let mut summary = SeedSummary::default();

    let computing = uow
        .insert_category(&NewCategory::new("Informática"))
        .await?;
    let office = uow.insert_category(&NewCategory::new("Escritório")).await?;
    summary.categories = 2;

    for product in [
        NewProduct::new("Computador", Money::from_units(2000), vec![computing.id]),
        NewProduct::new(
            "Impressora",
            Money::from_units(800),
            vec![computing.id, office.id],
        ),
        NewProduct::new("Mouse", Money::from_units(80), vec![computing.id]),
    ] {
        uow.insert_product(&product).await?;
        summary.products += 1;
    }

    let minas = uow.insert_state("Minas Gerais").await?;
    let sao_paulo = uow.insert_state("São Paulo").await?;
    summary.states = 2;

    let uberlandia = uow.insert_city("Uberlândia", minas.id).await?;
    let sao_paulo_city = uow.insert_city("São Paulo", sao_paulo.id).await?;
    uow.insert_city("Campinas", sao_paulo.id).await?;
    summary.cities = 3;

    let customer = uow
        .insert_customer(&NewCustomer {
            name: "Maria Silva".to_string(),
            email: "maria@gmail.com".to_string(),
            document: "36378912377".to_string(),
            kind: CustomerKind::Individual,
            phones: BTreeSet::from(["27363323".to_string(), "93838393".to_string()]),
            address: NewAddress {
                street: "Rua Flores".to_string(),
                number: "300".to_string(),
                complement: Some("Apto 303".to_string()),
                district: "Jardim".to_string(),
                postal_code: "38220834".to_string(),
                city_id: uberlandia.id,
            },
        })
        .await?;
    uow.insert_address(
        customer.id,
        &NewAddress {
            street: "Avenida Matos".to_string(),
            number: "105".to_string(),
            complement: Some("Sala 800".to_string()),
            district: "Centro".to_string(),
            postal_code: "38777012".to_string(),
            city_id: sao_paulo_city.id,
        },
    )
    .await?;
    summary.customers = 1;
    summary.addresses = 2;

    uow.commit().await?;

    tracing::info!(
        categories = summary.categories,
        products = summary.products,
        cities = summary.cities,
        customers = summary.customers,
        "reference data seeded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStore;

    #[tokio::test]
    async fn seeds_an_empty_store_once() {
        let store = InMemoryStore::new();

        let first = seed_reference_data(&store).await.unwrap();
        assert_eq!(first.products, 3);
        assert_eq!(first.addresses, 2);

        let second = seed_reference_data(&store).await.unwrap();
        assert!(second.is_empty());

        let mut uow = store.begin().await.unwrap();
        let categories = uow.list_categories(PageRequest::default()).await.unwrap();
        assert_eq!(categories.total_elements, 2);
    }

    #[tokio::test]
    async fn seeded_customer_has_both_addresses() {
        let store = InMemoryStore::new();
        seed_reference_data(&store).await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let customers = uow.list_customers(PageRequest::default()).await.unwrap();
        let maria = &customers.content[0];
        assert_eq!(maria.name, "Maria Silva");
        assert_eq!(maria.addresses.len(), 2);
        assert_eq!(maria.phones.len(), 2);
    }
}
