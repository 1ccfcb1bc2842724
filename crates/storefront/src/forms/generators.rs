//! Random card name and address.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

const FIRST_NAMES: [&str; 20] = [
    "James", "John", "Robert", "Michael", "William", "David", "Richard", "Joseph", "Thomas",
    "Christopher", "Mary", "Patricia", "Jennifer", "Linda", "Elizabeth", "Barbara", "Susan",
    "Jessica", "Sarah", "Karen",
];

const LAST_NAMES: [&str; 20] = [
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin",
];

const STREET_NAMES: [&str; 20] = [
    "Main", "Oak", "Maple", "Cedar", "Elm", "Washington", "Lake", "Hill", "Park", "Pine", "First",
    "Second", "Third", "Fourth", "Fifth", "Sunset", "River", "Forest", "Spring", "Valley",
];

const STREET_TYPES: [&str; 9] = ["St", "Ave", "Blvd", "Dr", "Ln", "Rd", "Way", "Ct", "Pl"];

const CITIES: [&str; 20] = [
    "Springfield", "Franklin", "Clinton", "Madison", "Georgetown", "Salem", "Fairview",
    "Riverside", "Arlington", "Manchester", "Oxford", "Clayton", "Milton", "Newport", "Ashland",
    "Burlington", "Greenville", "Bristol", "Lexington", "Auburn",
];

const STATES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY",
];

/// Address printed on the card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

fn pick<R: Rng + ?Sized>(rng: &mut R, words: &[&'static str]) -> &'static str {
    words.choose(rng).copied().unwrap_or_default()
}

/// `First Last` from the built-in name lists.
#[must_use]
pub fn generate_full_name() -> String {
    full_name_with(&mut rand::rng())
}

/// Street number 100-9999, a street, a city, a state and a five-digit ZIP.
#[must_use]
pub fn generate_address() -> GeneratedAddress {
    address_with(&mut rand::rng())
}

fn full_name_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{} {}", pick(rng, &FIRST_NAMES), pick(rng, &LAST_NAMES))
}

fn address_with<R: Rng + ?Sized>(rng: &mut R) -> GeneratedAddress {
    let number: u32 = rng.random_range(100..=9999);
    let street = format!(
        "{number} {} {}",
        pick(rng, &STREET_NAMES),
        pick(rng, &STREET_TYPES)
    );
    let city = pick(rng, &CITIES).to_string();
    let state = pick(rng, &STATES).to_string();
    let zip: u32 = rng.random_range(10_000..=99_999);

    GeneratedAddress {
        street,
        city,
        state,
        zip: zip.to_string(),
    }
}
