use std::path::Path;

use travelmapp_core::Place;

use crate::commands::common::{
    connect, normalize_name, normalize_place_id, read_optional_image, validate_rating,
};
use crate::error::CliError;

/// Field changes requested on the command line. `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct PlaceEdits {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub remove_image: bool,
}

impl PlaceEdits {
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.rating.is_none()
            && !self.remove_image
    }

    /// Apply the edits to a loaded place, validating each new value.
    pub fn apply(self, place: Place) -> Result<Place, CliError> {
        let mut place = place;
        if let Some(name) = self.name {
            place.name = normalize_name(&name)?;
        }
        if let Some(description) = self.description {
            place.description = description.trim().to_string();
        }
        if let Some(rating) = self.rating {
            place.rating = validate_rating(rating)?;
        }
        if self.remove_image {
            place.image_url.clear();
        }
        Ok(place)
    }
}

pub async fn run_edit(id: &str, edits: PlaceEdits, image: Option<&Path>) -> Result<(), CliError> {
    let place_id = normalize_place_id(id)?;
    let image = read_optional_image(image).await?;
    let repository = connect().await?;
    let place = repository.get(&place_id).await?;

    if edits.is_empty() && image.is_none() {
        println!("{}", place.id);
        return Ok(());
    }

    let updated = edits.apply(place)?;
    repository.update(&updated, image).await?;
    println!("{}", updated.id);
    Ok(())
}
