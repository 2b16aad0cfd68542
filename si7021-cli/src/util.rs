/// Parse a 7-bit I2C address written in hexadecimal, with or without `0x`.
pub(crate) fn address_from_hex(value: &str) -> Result<u8, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    let address =
        u8::from_str_radix(digits, 16).map_err(|e| format!("{value:?} is not a hex byte: {e}"))?;
    if address > 0x7F {
        return Err(format!("{address:#04x} is not a 7-bit I2C address"));
    }
    Ok(address)
}
