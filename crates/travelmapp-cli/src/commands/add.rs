use std::path::Path;

use travelmapp_core::Place;

use crate::commands::common::{connect, normalize_name, read_optional_image, validate_rating};
use crate::error::CliError;

pub async fn run_add(
    name: &str,
    description: &str,
    rating: f64,
    image: Option<&Path>,
) -> Result<(), CliError> {
    let draft = Place::new(normalize_name(name)?)
        .with_description(description.trim())
        .with_rating(validate_rating(rating)?);
    let image = read_optional_image(image).await?;

    let repository = connect().await?;
    let id = repository.add(draft, image).await?;

    println!("{id}");
    Ok(())
}
