use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::RoomCollection;

pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

/// One compact JSON document per line, for streaming output.
pub fn print_json_line(value: &serde_json::Value) {
    println!("{}", serde_json::to_string(value).unwrap_or_default());
}

pub fn print_table<T: Tabled>(data: &[T]) {
    if data.is_empty() {
        println!("No results.");
        return;
    }
    let table = Table::new(data).with(Style::rounded()).to_string();
    println!("{}", table);
}

#[derive(Tabled)]
pub struct RoomRow {
    #[tabled(rename = "ROOM")]
    pub room: String,
    #[tabled(rename = "STATE")]
    pub state: String,
}

pub fn room_rows(rooms: &RoomCollection) -> Vec<RoomRow> {
    rooms
        .iter()
        .map(|r| RoomRow {
            room: r.id.clone(),
            state: r.state_str().to_string(),
        })
        .collect()
}

pub fn print_error(err: &crate::error::AppError) {
    eprintln!(
        "{}",
        serde_json::to_string_pretty(&err.to_json()).unwrap_or_default()
    );
}
