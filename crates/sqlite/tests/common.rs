//! Shared fixtures for runner integration tests.
#![allow(dead_code)]

use easy_criteria::{Relation, entity};
use easy_criteria_sqlite::{ConnectOptions, SqliteRunner};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

entity! {
    table = "pet_addresses",
    #[derive(Debug, Clone)]
    pub struct PetAddress {
        pub id: i64 => ID,
        pub state: Option<String> => STATE,
        pub zip: String => ZIP,
    }
}

entity! {
    table = "dogs",
    #[derive(Debug, Clone)]
    pub struct Dog {
        pub id: i64 => ID,
        pub name: String => NAME,
        pub age: i32 => AGE,
        pub pet_address_id: i64,
    }
}

impl Dog {
    pub const PET_ADDRESS: Relation<Self, PetAddress> =
        Relation::new("pet_address", "pet_address_id", "id");
}

// Single-column shape over `dogs`
entity! {
    table = "dogs",
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DogAge {
        pub age: i32,
    }
}

entity! {
    table = "home_animals",
    #[derive(Debug, Clone)]
    pub struct HomeAnimal {
        pub id: i64 => ID,
        pub name: String => NAME,
        pub owner: String => OWNER,
        pub pet_address_id: i64,
    }
}

impl HomeAnimal {
    pub const PET_ADDRESS: Relation<Self, PetAddress> =
        Relation::new("pet_address", "pet_address_id", "id");
}

entity! {
    table = "projects",
    #[derive(Debug, Clone)]
    pub struct Project {
        pub id: i64 => ID,
        pub name: String => NAME,
        pub home_animal_id: i64,
    }
}

impl Project {
    pub const HOME_ANIMAL: Relation<Self, HomeAnimal> =
        Relation::new("home_animal", "home_animal_id", "id");
}

const SCHEMA: &str = "
    CREATE TABLE pet_addresses (id INTEGER PRIMARY KEY, state TEXT, zip TEXT NOT NULL);
    CREATE TABLE dogs (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        age INTEGER NOT NULL,
        pet_address_id INTEGER NOT NULL
    );
    CREATE TABLE home_animals (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        owner TEXT NOT NULL,
        pet_address_id INTEGER NOT NULL
    );
    CREATE TABLE projects (id INTEGER PRIMARY KEY, name TEXT NOT NULL, home_animal_id INTEGER NOT NULL);
";

const FIXTURES: &str = "
    INSERT INTO pet_addresses (id, state, zip) VALUES (1, 'st1', 'zip1'), (2, 'st2', 'zip2'), (3, NULL, 'zip1');
    INSERT INTO dogs (id, name, age, pet_address_id) VALUES
        (1, 'dog1', 3, 1),
        (2, 'dog2', 5, 2),
        (3, 'dog3', 3, 3),
        (4, 'dog4', 5, 2),
        (5, 'dog5', 7, 2);
    INSERT INTO home_animals (id, name, owner, pet_address_id) VALUES
        (1, 'home_animal1', 'owner1', 1),
        (2, 'home_animal2', 'owner2', 2);
    INSERT INTO projects (id, name, home_animal_id) VALUES
        (1, 'project1', 1),
        (2, 'project2', 2),
        (3, 'project3', 99);
";

/// Installs a debug subscriber once per test binary.
pub fn init_tracing() {
    let _ = Registry::default().with(EnvFilter::new("debug")).with(fmt::layer()).try_init();
}

/// A private in-memory database loaded with the animal fixtures.
#[allow(clippy::missing_panics_doc)]
pub fn runner() -> SqliteRunner {
    init_tracing();

    let runner = SqliteRunner::connect_with(ConnectOptions {
        database: ":memory:".to_string(),
    })
    .expect("connect");
    runner.execute_batch(SCHEMA).expect("create schema");
    runner.execute_batch(FIXTURES).expect("load fixtures");
    runner
}
