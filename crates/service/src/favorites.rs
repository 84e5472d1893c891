use models::{Dog, DogId};

/// Dogs the user marked as match candidates. Unique by id, insertion ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteSet {
    dogs: Vec<Dog>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when a dog with the same id is already present.
    pub fn add(&mut self, dog: Dog) -> bool {
        if self.contains(&dog.id) {
            return false;
        }
        self.dogs.push(dog);
        true
    }

    /// Returns false when the id was not present.
    pub fn remove(&mut self, id: &DogId) -> bool {
        let before = self.dogs.len();
        self.dogs.retain(|d| &d.id != id);
        self.dogs.len() != before
    }

    pub fn contains(&self, id: &DogId) -> bool {
        self.dogs.iter().any(|d| &d.id == id)
    }

    /// Ids in insertion order; this is the body sent to `dogs/match`.
    pub fn ids(&self) -> Vec<DogId> {
        self.dogs.iter().map(|d| d.id.clone()).collect()
    }

    pub fn dogs(&self) -> &[Dog] {
        &self.dogs
    }

    pub fn len(&self) -> usize {
        self.dogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dogs.is_empty()
    }
}
