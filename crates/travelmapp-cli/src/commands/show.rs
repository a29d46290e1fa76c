use crate::commands::common::{
    connect, format_place_details, normalize_place_id, place_to_list_item,
};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool) -> Result<(), CliError> {
    let place_id = normalize_place_id(id)?;
    let repository = connect().await?;
    let place = repository.get(&place_id).await?;

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&place_to_list_item(&place))?
        );
    } else {
        for line in format_place_details(&place) {
            println!("{line}");
        }
    }

    Ok(())
}
