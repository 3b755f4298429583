//! Endpoint configuration and acceptance filter rules.

/// Standard (11-bit) identifier mask.
pub const SFF_MASK: u32 = 0x0000_07FF;

/// Extended (29-bit) identifier mask.
pub const EFF_MASK: u32 = 0x1FFF_FFFF;

/// Marks an extended identifier in the kernel `can_id` word.
pub const EFF_FLAG: u32 = 0x8000_0000;

/// Bits a filter id may carry. `CAN_INV_FILTER` (bit 29) and the RTR/ERR
/// flags are excluded: the kernel would invert or reinterpret the rule.
pub const FILTER_ID_BITS: u32 = EFF_MASK | EFF_FLAG;

/// Interface used when nothing else is configured.
pub const DEFAULT_INTERFACE: &str = "vcan0";

/// Identifier matched by the default filter.
pub const DEFAULT_FILTER_ID: u32 = 5;

/// A single acceptance filter.
///
/// An incoming identifier `i` passes when `(i & mask) == (id & mask)`.
/// The mask only covers identifier bits unless the caller includes
/// [`EFF_FLAG`], so with the default standard mask an extended frame whose
/// low 11 bits equal `id` is accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRule {
    pub id: u32,
    pub mask: u32,
}

impl FilterRule {
    pub fn new(id: u32, mask: u32) -> Self {
        Self { id, mask }
    }

    /// Filter on the standard identifier bits.
    pub fn standard(id: u32) -> Self {
        Self::new(id, SFF_MASK)
    }

    /// Returns true if the id only uses identifier bits and [`EFF_FLAG`].
    pub fn is_valid(&self) -> bool {
        self.id & !FILTER_ID_BITS == 0
    }

    /// Returns true if a frame with this identifier passes the filter.
    pub fn matches(&self, identifier: u32) -> bool {
        (identifier & self.mask) == (self.id & self.mask)
    }
}

/// Returns true if `identifier` passes the optional filter.
///
/// No filter accepts everything.
pub fn accepts(filter: Option<&FilterRule>, identifier: u32) -> bool {
    filter.is_none_or(|rule| rule.matches(identifier))
}

/// Everything needed to open a [`CanSocket`](crate::CanSocket).
///
/// Built once at startup and handed to the socket by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Interface name, e.g. `vcan0` or `can1`.
    pub interface: String,
    /// Optional acceptance filter installed before binding.
    pub filter: Option<FilterRule>,
    /// Enable CAN-FD frames (`CAN_RAW_FD_FRAMES`).
    pub fd_frames: bool,
}

impl EndpointConfig {
    /// Configuration for `interface` with no filter and FD frames enabled.
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            filter: None,
            fd_frames: true,
        }
    }

    pub fn with_filter(mut self, filter: Option<FilterRule>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_fd_frames(mut self, fd_frames: bool) -> Self {
        self.fd_frames = fd_frames;
        self
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INTERFACE).with_filter(Some(FilterRule::standard(DEFAULT_FILTER_ID)))
    }
}
