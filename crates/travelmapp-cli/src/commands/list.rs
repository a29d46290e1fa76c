use crate::commands::common::{connect, format_place_lines, place_to_list_item, PlaceListItem};
use crate::error::CliError;

pub async fn run_list(as_json: bool) -> Result<(), CliError> {
    let repository = connect().await?;
    let places = repository.list().await?;

    if as_json {
        let json_items = places
            .iter()
            .map(place_to_list_item)
            .collect::<Vec<PlaceListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if places.is_empty() {
        println!("No places yet. Add one with `travelmapp add --name <NAME>`.");
    } else {
        for line in format_place_lines(&places) {
            println!("{line}");
        }
    }

    Ok(())
}
