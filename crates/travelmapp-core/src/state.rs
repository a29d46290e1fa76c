//! Observable UI state for place screens.
//!
//! `PlacesViewModel` runs repository calls and publishes their progress over
//! `tokio::sync::watch` channels, so any number of views can follow the
//! latest state without polling.

use tokio::sync::watch;

use crate::error::Error;
use crate::models::{ImageUpload, Place, PlaceId};
use crate::places::PlacesRepository;

/// State of the place list.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacesState {
    Loading,
    Empty,
    Success(Vec<Place>),
    Error(String),
}

/// State of a single place being viewed.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceDetailsState {
    Idle,
    Loading,
    Success(Place),
    Error(String),
}

/// State of the last add, update or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOperationState {
    Idle,
    Loading,
    Success(PlaceId),
    Deleted,
    Error(String),
}

pub struct PlacesViewModel {
    repository: PlacesRepository,
    places: watch::Sender<PlacesState>,
    details: watch::Sender<PlaceDetailsState>,
    operation: watch::Sender<PlaceOperationState>,
}

impl PlacesViewModel {
    pub fn new(repository: PlacesRepository) -> Self {
        let (places, _) = watch::channel(PlacesState::Loading);
        let (details, _) = watch::channel(PlaceDetailsState::Idle);
        let (operation, _) = watch::channel(PlaceOperationState::Idle);
        Self {
            repository,
            places,
            details,
            operation,
        }
    }

    pub fn subscribe_places(&self) -> watch::Receiver<PlacesState> {
        self.places.subscribe()
    }

    pub fn subscribe_place_details(&self) -> watch::Receiver<PlaceDetailsState> {
        self.details.subscribe()
    }

    pub fn subscribe_operation(&self) -> watch::Receiver<PlaceOperationState> {
        self.operation.subscribe()
    }

    pub fn places_state(&self) -> PlacesState {
        self.places.borrow().clone()
    }

    pub fn place_details_state(&self) -> PlaceDetailsState {
        self.details.borrow().clone()
    }

    pub fn operation_state(&self) -> PlaceOperationState {
        self.operation.borrow().clone()
    }

    pub async fn load_places(&self) {
        self.places.send_replace(PlacesState::Loading);

        let next = match self.repository.list().await {
            Ok(places) if places.is_empty() => PlacesState::Empty,
            Ok(places) => PlacesState::Success(places),
            Err(error) => PlacesState::Error(message_or(&error, "Failed to load places")),
        };
        self.places.send_replace(next);
    }

    pub async fn load_place(&self, id: &PlaceId) {
        self.details.send_replace(PlaceDetailsState::Loading);

        let next = match self.repository.get(id).await {
            Ok(place) => PlaceDetailsState::Success(place),
            Err(error) => PlaceDetailsState::Error(message_or(&error, "Failed to load place")),
        };
        self.details.send_replace(next);
    }

    pub async fn add_place(&self, draft: Place, image: Option<ImageUpload>) {
        tracing::debug!("Adding place {}", draft.name);
        self.operation.send_replace(PlaceOperationState::Loading);

        let next = match self.repository.add(draft, image).await {
            Ok(id) => PlaceOperationState::Success(id),
            Err(error) => PlaceOperationState::Error(message_or(&error, "Failed to add place")),
        };
        self.operation.send_replace(next);
    }

    pub async fn update_place(&self, place: &Place, image: Option<ImageUpload>) {
        self.operation.send_replace(PlaceOperationState::Loading);

        let next = match self.repository.update(place, image).await {
            Ok(()) => PlaceOperationState::Success(place.id.clone()),
            Err(error) => {
                PlaceOperationState::Error(message_or(&error, "Failed to update place"))
            }
        };
        self.operation.send_replace(next);
    }

    pub async fn delete_place(&self, id: &PlaceId) {
        self.operation.send_replace(PlaceOperationState::Loading);

        let next = match self.repository.delete(id).await {
            Ok(()) => PlaceOperationState::Deleted,
            Err(error) => {
                PlaceOperationState::Error(message_or(&error, "Failed to delete place"))
            }
        };
        self.operation.send_replace(next);
    }

    pub fn reset_operation_state(&self) {
        self.operation.send_replace(PlaceOperationState::Idle);
    }
}

fn message_or(error: &Error, fallback: &str) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::session::{SessionProvider, StaticSession};
    use crate::storage::{BlobStore, InMemoryBlobStore};
    use crate::store::{DocumentStore, InMemoryDocumentStore};

    fn view_model(session: Arc<StaticSession>) -> PlacesViewModel {
        let repository = PlacesRepository::new(
            session as Arc<dyn SessionProvider>,
            Arc::new(InMemoryDocumentStore::new()) as Arc<dyn DocumentStore>,
            Arc::new(InMemoryBlobStore::new()) as Arc<dyn BlobStore>,
        );
        PlacesViewModel::new(repository)
    }

    #[test]
    fn initial_states() {
        let vm = view_model(Arc::new(StaticSession::anonymous()));
        assert_eq!(vm.places_state(), PlacesState::Loading);
        assert_eq!(vm.place_details_state(), PlaceDetailsState::Idle);
        assert_eq!(vm.operation_state(), PlaceOperationState::Idle);
    }

    #[tokio::test]
    async fn empty_collection_is_reported_as_empty() {
        let vm = view_model(Arc::new(StaticSession::anonymous()));
        vm.load_places().await;
        assert_eq!(vm.places_state(), PlacesState::Empty);
    }

    #[tokio::test]
    async fn add_then_load_publishes_success() {
        let vm = view_model(Arc::new(StaticSession::signed_in("u1")));
        let mut operations = vm.subscribe_operation();

        vm.add_place(Place::new("Louvre").with_rating(4.0), None).await;

        assert!(operations.has_changed().unwrap());
        let PlaceOperationState::Success(id) = operations.borrow_and_update().clone() else {
            panic!("expected success, got {:?}", vm.operation_state());
        };

        vm.load_places().await;
        let PlacesState::Success(places) = vm.places_state() else {
            panic!("expected places");
        };
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].id, id);

        vm.load_place(&id).await;
        let PlaceDetailsState::Success(place) = vm.place_details_state() else {
            panic!("expected place details");
        };
        assert_eq!(place.name, "Louvre");
    }

    #[tokio::test]
    async fn failures_publish_error_text() {
        let vm = view_model(Arc::new(StaticSession::anonymous()));

        vm.add_place(Place::new("Louvre"), None).await;
        assert_eq!(
            vm.operation_state(),
            PlaceOperationState::Error("User not logged in".to_string())
        );

        vm.load_place(&PlaceId::from("ghost")).await;
        assert_eq!(
            vm.place_details_state(),
            PlaceDetailsState::Error("Place not found: ghost".to_string())
        );
    }

    #[tokio::test]
    async fn update_success_reports_place_id() {
        let vm = view_model(Arc::new(StaticSession::signed_in("u1")));
        vm.add_place(Place::new("Louvre"), None).await;
        let PlaceOperationState::Success(id) = vm.operation_state() else {
            panic!("expected success");
        };

        let place = Place {
            id: id.clone(),
            ..Place::new("Musée du Louvre")
        };
        vm.update_place(&place, None).await;
        assert_eq!(vm.operation_state(), PlaceOperationState::Success(id));
    }

    #[tokio::test]
    async fn delete_then_reset() {
        let session = Arc::new(StaticSession::signed_in("u1"));
        let vm = view_model(Arc::clone(&session));
        vm.add_place(Place::new("Louvre"), None).await;
        let PlaceOperationState::Success(id) = vm.operation_state() else {
            panic!("expected success");
        };

        session.sign_in("u2");
        vm.delete_place(&id).await;
        assert_eq!(
            vm.operation_state(),
            PlaceOperationState::Error("You can only delete your own places".to_string())
        );

        session.sign_in("u1");
        vm.delete_place(&id).await;
        assert_eq!(vm.operation_state(), PlaceOperationState::Deleted);

        vm.reset_operation_state();
        assert_eq!(vm.operation_state(), PlaceOperationState::Idle);
    }

    #[test]
    fn empty_error_text_uses_fallback() {
        let error = Error::Forbidden(String::new());
        assert_eq!(message_or(&error, "Failed to delete place"), "Failed to delete place");
        assert_eq!(
            message_or(&Error::Unauthenticated, "Failed to delete place"),
            "User not logged in"
        );
    }
}
