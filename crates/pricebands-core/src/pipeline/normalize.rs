use crate::pipeline::types::Transaction;

const KEY_SEPARATOR: char = '|';

/// Canonical form shared by postcodes and address components: ASCII uppercase
/// with every non-alphanumeric character removed.
pub fn normalize_component(value: &str) -> String {
    value
        .chars()
        .filter(|character| character.is_ascii_alphanumeric())
        .map(|character| character.to_ascii_uppercase())
        .collect()
}

/// Postcodes use the component rule so the batch key, identity key, and
/// geography join all agree on one definition.
pub fn normalize_postcode(value: &str) -> String {
    normalize_component(value)
}

/// Identity of a physical property, derived from postcode and address.
///
/// Two sales with equal keys are treated as sales of the same unit. The
/// separator cannot appear in a normalized component, so `("1", "23")` and
/// `("12", "3")` never collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyIdentityKey(String);

impl PropertyIdentityKey {
    pub fn new(postcode: &str, primary: &str, secondary: &str) -> Self {
        let mut key = normalize_postcode(postcode);
        key.push(KEY_SEPARATOR);
        key.push_str(&normalize_component(primary));
        key.push(KEY_SEPARATOR);
        key.push_str(&normalize_component(secondary));
        Self(key)
    }

    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self::new(
            &transaction.raw_postcode,
            &transaction.primary_address_component,
            &transaction.secondary_address_component,
        )
    }

    pub fn postcode(&self) -> &str {
        self.0.split(KEY_SEPARATOR).next().unwrap_or_default()
    }
}
