use crate::error::CoreError;

/// Parses a boolean-ish token, case-insensitively.
///
/// Accepts `t/true/1/yes/y` as true and `f/false/0/no/n` plus the empty
/// string as false; any other token is an error rather than a guess.
pub fn parse_bool(input: &str) -> Result<bool, CoreError> {
    match input.to_ascii_lowercase().as_str() {
        "t" | "true" | "1" | "yes" | "y" => Ok(true),
        "f" | "false" | "0" | "no" | "n" | "" => Ok(false),
        _ => Err(CoreError::InvalidBool(input.to_string())),
    }
}
