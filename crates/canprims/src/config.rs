use canprims_transport::{EndpointConfig, FilterRule, DEFAULT_INTERFACE, FILTER_ID_BITS};
use clap::Args;

/// Largest value accepted at the flags prompt (one hex nibble).
pub const MAX_FLAGS: u8 = 15;

/// Endpoint options shared by every bus subcommand.
///
/// Each value resolves as: command-line flag, then environment, then default.
#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    /// CAN interface to bind.
    #[arg(
        long,
        short = 'i',
        value_name = "NAME",
        env = "CANPRIMS_INTERFACE",
        default_value = DEFAULT_INTERFACE
    )]
    pub interface: String,

    /// Accept only identifiers matching this value under --filter-mask.
    #[arg(
        long,
        value_name = "ID",
        env = "CANPRIMS_FILTER_ID",
        default_value = "5",
        value_parser = parse_filter_id
    )]
    pub filter_id: u32,

    /// Mask applied to both the filter id and incoming identifiers.
    #[arg(
        long,
        value_name = "MASK",
        env = "CANPRIMS_FILTER_MASK",
        default_value = "0x7FF",
        value_parser = parse_u32
    )]
    pub filter_mask: u32,

    /// Accept every identifier (overrides --filter-id).
    #[arg(long)]
    pub no_filter: bool,

    /// Classic CAN only; do not enable CAN FD frames.
    #[arg(long)]
    pub classic: bool,
}

impl EndpointArgs {
    pub fn to_config(&self) -> EndpointConfig {
        let filter = (!self.no_filter).then(|| FilterRule::new(self.filter_id, self.filter_mask));
        EndpointConfig::new(self.interface.clone())
            .with_filter(filter)
            .with_fd_frames(!self.classic)
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal number.
pub fn parse_number(input: &str) -> Option<u64> {
    let input = input.trim();
    match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() => u64::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None => input.parse().ok(),
    }
}

/// Parse a flags value in `0..=15`.
pub fn parse_flags(input: &str) -> Option<u8> {
    parse_number(input)
        .filter(|v| *v <= u64::from(MAX_FLAGS))
        .map(|v| v as u8)
}

pub fn parse_u32(input: &str) -> Result<u32, String> {
    parse_number(input)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| format!("expected a 32-bit number (decimal or 0x hex), got {input:?}"))
}

/// Parse a filter id; only identifier bits and the extended flag are allowed.
pub fn parse_filter_id(input: &str) -> Result<u32, String> {
    let id = parse_u32(input)?;
    if id & !FILTER_ID_BITS != 0 {
        return Err(format!(
            "filter id {id:#x} sets bits outside {FILTER_ID_BITS:#x} (inverted or RTR/error rules are not supported)"
        ));
    }
    Ok(id)
}

pub fn parse_flags_arg(input: &str) -> Result<u8, String> {
    parse_flags(input).ok_or_else(|| format!("flags must be a number from 0 to {MAX_FLAGS}, got {input:?}"))
}
