//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use easy_criteria::{Relation, entity};

// Test entities used across multiple test files

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
        pub pet_address_id: i64 => PET_ADDRESS_ID,
    }
}

impl Dog {
    pub const PET_ADDRESS: Relation<Self, PetAddress> =
        Relation::new("pet_address", "pet_address_id", "id");
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

// Narrower result shape over `projects`
entity! {
    table = "projects",
    #[derive(Debug, Clone)]
    pub struct ProjectName {
        pub name: String,
    }
}

/// Normalize SQL by collapsing whitespace.
fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize SQL for comparison by removing identifier quotes and normalizing whitespace.
/// Preserves quotes inside string literals.
pub fn canonicalize_sql(sql: &str) -> String {
    let mut cleaned = String::with_capacity(sql.len());
    let mut in_single_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_single_quote = !in_single_quote;
                cleaned.push(ch);
            }
            '"' if !in_single_quote => {}
            _ => cleaned.push(ch),
        }
    }

    normalize_sql(&cleaned)
}

/// Assert that SQL contains all expected fragments in order.
///
/// Identifier quotes are stripped and whitespace normalized on both sides, so
/// fragments can be written without ``SeaQuery``'s quoting.
#[allow(clippy::missing_panics_doc)]
pub fn assert_sql_contains(actual: &str, fragments: &[&str]) {
    let actual_canonical = canonicalize_sql(actual);
    let mut search_start = 0usize;

    for fragment in fragments {
        let fragment_canonical = canonicalize_sql(fragment);
        if fragment_canonical.is_empty() {
            continue;
        }

        if let Some(pos) = actual_canonical[search_start..].find(&fragment_canonical) {
            search_start += pos + fragment_canonical.len();
        } else {
            panic!(
                "expected SQL fragment `{fragment_canonical}` not found in `{actual_canonical}`"
            );
        }
    }
}
