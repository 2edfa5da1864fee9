//! Fixtures shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use instrument_store::config::{PersistenceConfig, StoreBackend};
use instrument_store::domain::catalog::{Category, Instrument, InstrumentDraft};
use instrument_store::domain::identity::{Role, User, UserRegistration};
use instrument_store::{
    CategoryId, InMemoryStore, InstrumentId, Money, SqliteStore, Store, StoreTx, Timestamp, UserId,
};
use tempfile::TempDir;

pub const STRINGS: &str = "cat-strings";
pub const WIND: &str = "cat-wind";
pub const GUITAR: &str = "inst-guitar";
pub const FLUTE: &str = "inst-flute";
pub const ADMIN: &str = "user-admin";
pub const OPERATOR: &str = "user-operator";
pub const CUSTOMER: &str = "user-customer";
pub const PASSWORD: &str = "secret";

/// SQLite store in a temporary directory. Keep the `TempDir` alive for the
/// duration of the test.
pub async fn sqlite_store() -> (SqliteStore, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = PersistenceConfig {
        backend: StoreBackend::Sqlite,
        url: format!("sqlite://{}/store.db", dir.path().display()),
        ..PersistenceConfig::default()
    };
    (SqliteStore::connect(&config).await.unwrap(), dir)
}

pub fn memory_store() -> InMemoryStore {
    InMemoryStore::new()
}

/// Two categories, a guitar (stock 10, $100.00), a flute (stock 4,
/// $40.00) and one user per role.
pub async fn populate<S: Store>(store: &S) {
    let mut tx = store.begin().await.unwrap();
    for role in Role::ALL {
        tx.insert_role(role).await.unwrap();
    }
    for (id, name) in [(STRINGS, "Cuerda"), (WIND, "Viento")] {
        tx.insert_category(&Category::create(CategoryId::new(id), name).unwrap())
            .await
            .unwrap();
    }
    for (id, code, name, stock, category, cents) in [
        (GUITAR, "INST-1", "Guitarra Criolla", 10, STRINGS, 10_000),
        (FLUTE, "INST-2", "Flauta Dulce", 4, WIND, 4_000),
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
    for (id, role) in [
        (ADMIN, Role::Admin),
        (OPERATOR, Role::Operator),
        (CUSTOMER, Role::Viewer),
    ] {
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

pub async fn stock<S: Store>(store: &S, id: &str) -> u32 {
    let mut tx = store.read().await.unwrap();
    tx.instrument(&InstrumentId::new(id))
        .await
        .unwrap()
        .unwrap()
        .stock()
}
