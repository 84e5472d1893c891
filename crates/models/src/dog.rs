use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, server-assigned dog identifier. The only identity key for a [`Dog`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DogId(String);

impl DogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DogId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DogId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Immutable dog record as returned by `POST dogs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dog {
    pub id: DogId,
    pub name: String,
    pub breed: String,
    pub age: u32,
    pub zip_code: String,
    pub img: String,
}

/// Result of putting a record batch into the order of the id sequence that requested it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedBatch {
    pub dogs: Vec<Dog>,
    /// Requested ids the batch had no record for.
    pub missing: Vec<DogId>,
    /// Records whose id was never requested; dropped from `dogs`.
    pub unexpected: usize,
}

/// Reorder `records` to follow `ids`. Duplicate ids in `ids` map to the same record once;
/// records not named in `ids` are dropped.
pub fn order_by_ids(ids: &[DogId], records: Vec<Dog>) -> OrderedBatch {
    let total = records.len();
    let mut by_id: HashMap<DogId, Dog> = records.into_iter().map(|d| (d.id.clone(), d)).collect();
    let duplicates_in_batch = total - by_id.len();

    let mut batch = OrderedBatch::default();
    for id in ids {
        match by_id.remove(id) {
            Some(dog) => batch.dogs.push(dog),
            None if batch.dogs.iter().any(|d| &d.id == id) => {}
            None => batch.missing.push(id.clone()),
        }
    }
    batch.unexpected = by_id.len() + duplicates_in_batch;
    batch
}

#[cfg(test)]
pub(crate) fn sample(id: &str, breed: &str) -> Dog {
    Dog {
        id: DogId::new(id),
        name: format!("dog-{id}"),
        breed: breed.to_string(),
        age: 3,
        zip_code: "10001".to_string(),
        img: format!("https://img.example/{id}.jpg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<DogId> {
        raw.iter().map(|s| DogId::new(*s)).collect()
    }

    #[test]
    fn decodes_api_record() {
        let json = r#"{"id":"abc","img":"https://x/y.jpg","name":"Rex","age":4,"zip_code":"02110","breed":"Poodle"}"#;
        let dog: Dog = serde_json::from_str(json).unwrap();
        assert_eq!(dog.id, DogId::new("abc"));
        assert_eq!(dog.age, 4);
    }

    #[test]
    fn negative_age_fails_to_decode() {
        let json = r#"{"id":"abc","img":"i","name":"Rex","age":-1,"zip_code":"02110","breed":"Poodle"}"#;
        assert!(serde_json::from_str::<Dog>(json).is_err());
    }

    #[test]
    fn missing_field_fails_to_decode() {
        let json = r#"{"id":"abc","name":"Rex","age":1,"zip_code":"02110","breed":"Poodle"}"#;
        assert!(serde_json::from_str::<Dog>(json).is_err());
    }

    #[test]
    fn order_follows_requested_ids_for_every_rotation() {
        let wanted = ids(&["a", "b", "c", "d"]);
        let records: Vec<Dog> = ["a", "b", "c", "d"].iter().map(|id| sample(id, "Pug")).collect();
        for shift in 0..records.len() {
            let mut shuffled = records.clone();
            shuffled.rotate_left(shift);
            shuffled.swap(0, shift.min(3));
            let batch = order_by_ids(&wanted, shuffled);
            let got: Vec<&str> = batch.dogs.iter().map(|d| d.id.as_str()).collect();
            assert_eq!(got, vec!["a", "b", "c", "d"]);
            assert!(batch.missing.is_empty());
            assert_eq!(batch.unexpected, 0);
        }
    }

    #[test]
    fn reports_missing_and_unexpected_records() {
        let wanted = ids(&["a", "b"]);
        let batch = order_by_ids(&wanted, vec![sample("z", "Pug"), sample("b", "Pug")]);
        assert_eq!(batch.dogs.len(), 1);
        assert_eq!(batch.dogs[0].id.as_str(), "b");
        assert_eq!(batch.missing, ids(&["a"]));
        assert_eq!(batch.unexpected, 1);
    }

    #[test]
    fn id_serializes_as_bare_string() {
        let body = serde_json::to_string(&ids(&["idA", "idB"])).unwrap();
        assert_eq!(body, r#"["idA","idB"]"#);
    }
}
