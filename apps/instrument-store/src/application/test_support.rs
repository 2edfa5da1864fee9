//! Shared fixture for application and adapter tests.

use rust_decimal::Decimal;

use crate::application::ports::{Store, StoreTx};
use crate::domain::catalog::{Category, Instrument, InstrumentDraft};
use crate::domain::identity::{Role, User, UserRegistration};
use crate::domain::shared::{CategoryId, InstrumentId, Money, Timestamp, UserId};
use crate::infrastructure::persistence::InMemoryStore;

pub const STRINGS: &str = "cat-strings";
pub const PERCUSSION: &str = "cat-percussion";
pub const GUITAR: &str = "inst-guitar";
pub const DRUM: &str = "inst-drum";
pub const ADMIN: &str = "user-admin";
pub const OPERATOR: &str = "user-operator";
pub const VIEWER: &str = "user-viewer";
pub const PASSWORD: &str = "secret";

/// Catalog with two categories, a guitar (stock 10, $100.00) and a drum
/// (stock 5, $50.00), plus one user per role.
pub async fn populate<S: Store>(store: &S) {
    let mut tx = store.begin().await.unwrap();
    for role in Role::ALL {
        tx.insert_role(role).await.unwrap();
    }
    for (id, name) in [(STRINGS, "Cuerda"), (PERCUSSION, "Percusión")] {
        tx.insert_category(&Category::create(CategoryId::new(id), name).unwrap())
            .await
            .unwrap();
    }
    for (id, code, name, stock, category, cents) in [
        (GUITAR, "INST-1", "Guitarra Criolla", 10, STRINGS, 10_000),
        (DRUM, "INST-2", "Bombo", 5, PERCUSSION, 5_000),
    ] {
        let instrument = Instrument::create(
            InstrumentId::new(id),
            InstrumentDraft {
                code: code.to_string(),
                name: name.to_string(),
                brand: "Generic".to_string(),
                stock,
                description: String::new(),
                image: String::new(),
                category_id: CategoryId::new(category),
            },
        )
        .unwrap();
        tx.insert_instrument(&instrument).await.unwrap();
        tx.append_price(instrument.id(), Money::from_cents(cents), Timestamp::now())
            .await
            .unwrap();
    }
    for (id, role) in [(ADMIN, Role::Admin), (OPERATOR, Role::Operator), (VIEWER, Role::Viewer)] {
        let user = User::register(
            UserId::new(id),
            UserRegistration {
                email: format!("{id}@example.com"),
                password: PASSWORD.to_string(),
                first_name: None,
                last_name: None,
                role,
            },
        )
        .unwrap();
        tx.insert_user(&user).await.unwrap();
    }
    tx.commit().await.unwrap();
}

/// In-memory store holding the [`populate`] data.
pub async fn fixture() -> InMemoryStore {
    let store = InMemoryStore::new();
    populate(&store).await;
    store
}

/// Decimal helper.
pub fn dec(units: i64) -> Decimal {
    Decimal::new(units, 0)
}
