use chrono::Local;

/// The `get_time` tool: current local date and time.
///
/// Not deterministic; tests check the shape of the output, never the value.
pub fn handle() -> Result<String, String> {
    Ok(Local::now().format("%Y-%m-%d %H:%M:%S").to_string())
}
