use crate::commands::common::{connect, normalize_place_id};
use crate::error::CliError;

pub async fn run_delete(id: &str) -> Result<(), CliError> {
    let place_id = normalize_place_id(id)?;
    let repository = connect().await?;

    repository.delete(&place_id).await?;
    println!("{place_id}");
    Ok(())
}
