use assay_core::error::AssayError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), AssayError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
