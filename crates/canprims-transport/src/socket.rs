use std::ffi::CString;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{EndpointConfig, FilterRule};
use crate::error::{Result, TransportError};

/// Kernel limit for interface names, including the trailing NUL.
const IFNAMSIZ: usize = 16;

/// Raw SocketCAN endpoint bound to a single interface.
///
/// Implements [`Read`] and [`Write`]: every call is exactly one `read(2)` or
/// `write(2)` on the socket, and the kernel moves at most one frame per call.
/// Both block until the operation completes unless a timeout was set.
pub struct CanSocket {
    fd: OwnedFd,
    interface: String,
    ifindex: u32,
    fd_frames: bool,
    filter: Option<FilterRule>,
}

impl CanSocket {
    /// Open a raw CAN socket and bind it to the configured interface.
    ///
    /// Steps run in a fixed order: create socket, resolve the interface,
    /// enable FD frames, install the filter, bind. The first failure is
    /// returned and the socket is closed.
    pub fn open(config: EndpointConfig) -> Result<Self> {
        let fd = open_raw_socket()?;
        let ifindex = resolve_interface(&config.interface)?;

        if config.fd_frames {
            let enable: libc::c_int = 1;
            set_option(&fd, libc::SOL_CAN_RAW, libc::CAN_RAW_FD_FRAMES, &enable).map_err(
                |source| TransportError::Capability {
                    option: "CAN_RAW_FD_FRAMES",
                    source,
                },
            )?;
            debug!(interface = %config.interface, "enabled CAN FD frames");
        }

        if let Some(rule) = config.filter {
            if !rule.is_valid() {
                return Err(TransportError::InvalidFilter { id: rule.id });
            }
            let filter = libc::can_filter {
                can_id: rule.id,
                can_mask: rule.mask,
            };
            set_option(&fd, libc::SOL_CAN_RAW, libc::CAN_RAW_FILTER, &filter).map_err(
                |source| TransportError::Capability {
                    option: "CAN_RAW_FILTER",
                    source,
                },
            )?;
            debug!(
                id = format_args!("{:#x}", rule.id),
                mask = format_args!("{:#x}", rule.mask),
                "installed acceptance filter"
            );
        }

        bind_interface(&fd, ifindex).map_err(|source| TransportError::Bind {
            interface: config.interface.clone(),
            source,
        })?;

        info!(
            interface = %config.interface,
            ifindex,
            fd_frames = config.fd_frames,
            "bound raw CAN socket"
        );

        Ok(Self {
            fd,
            interface: config.interface,
            ifindex,
            fd_frames: config.fd_frames,
            filter: config.filter,
        })
    }

    /// Interface name this socket is bound to.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Kernel interface index this socket is bound to.
    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }

    /// Whether CAN FD frames were enabled on this socket.
    pub fn fd_frames(&self) -> bool {
        self.fd_frames
    }

    /// The acceptance filter installed at open time, if any.
    pub fn filter(&self) -> Option<&FilterRule> {
        self.filter.as_ref()
    }

    /// Set read timeout (`SO_RCVTIMEO`). `None` blocks indefinitely.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        set_timeout(&self.fd, libc::SO_RCVTIMEO, timeout)
    }

    /// Set write timeout (`SO_SNDTIMEO`). `None` blocks indefinitely.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        set_timeout(&self.fd, libc::SO_SNDTIMEO, timeout)
    }

    /// Duplicate the descriptor, giving a second handle on the same binding.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            fd: self.fd.try_clone()?,
            interface: self.interface.clone(),
            ifindex: self.ifindex,
            fd_frames: self.fd_frames,
            filter: self.filter,
        })
    }

    /// Close the socket.
    pub fn close(self) {
        debug!(interface = %self.interface, "closing raw CAN socket");
        drop(self.fd);
    }
}

impl Read for CanSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes and the
        // descriptor is owned by `self` for the duration of the call.
        let n = unsafe {
            libc::read(
                self.fd.as_raw_fd(),
                buf.as_mut_ptr().cast::<libc::c_void>(),
                buf.len(),
            )
        };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }
}

impl Write for CanSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // SAFETY: `buf` is valid for reads of `buf.len()` bytes and the
        // descriptor is owned by `self` for the duration of the call.
        let n = unsafe {
            libc::write(
                self.fd.as_raw_fd(),
                buf.as_ptr().cast::<libc::c_void>(),
                buf.len(),
            )
        };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsFd for CanSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for CanSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl std::fmt::Debug for CanSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanSocket")
            .field("interface", &self.interface)
            .field("ifindex", &self.ifindex)
            .field("fd_frames", &self.fd_frames)
            .field("filter", &self.filter)
            .finish()
    }
}

/// Resolve an interface name to its kernel index.
pub fn resolve_interface(name: &str) -> Result<u32> {
    let resolution = |source| TransportError::Resolution {
        interface: name.to_string(),
        source,
    };

    if name.is_empty() || name.len() >= IFNAMSIZ {
        return Err(resolution(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("interface name must be 1-{} bytes", IFNAMSIZ - 1),
        )));
    }
    let c_name = CString::new(name).map_err(|_| {
        resolution(io::Error::new(
            io::ErrorKind::InvalidInput,
            "interface name contains a NUL byte",
        ))
    })?;

    // SAFETY: `c_name` is a valid NUL-terminated string that outlives the call.
    let index = unsafe { libc::if_nametoindex(c_name.as_ptr()) };
    if index == 0 {
        return Err(resolution(io::Error::last_os_error()));
    }
    Ok(index)
}

fn open_raw_socket() -> Result<OwnedFd> {
    // SAFETY: plain socket(2) call with constant arguments.
    let raw = unsafe {
        libc::socket(
            libc::PF_CAN,
            libc::SOCK_RAW | libc::SOCK_CLOEXEC,
            libc::CAN_RAW,
        )
    };
    if raw < 0 {
        return Err(TransportError::Open(io::Error::last_os_error()));
    }
    // SAFETY: `raw` is a freshly created descriptor that nothing else owns.
    Ok(unsafe { OwnedFd::from_raw_fd(raw) })
}

fn bind_interface(fd: &OwnedFd, ifindex: u32) -> io::Result<()> {
    // SAFETY: `sockaddr_can` is plain old data; all-zero is a valid value.
    let mut addr: libc::sockaddr_can = unsafe { std::mem::zeroed() };
    addr.can_family = libc::AF_CAN as libc::sa_family_t;
    addr.can_ifindex = ifindex as libc::c_int;

    // SAFETY: `addr` is a valid `sockaddr_can` and the length matches it.
    let rc = unsafe {
        libc::bind(
            fd.as_raw_fd(),
            (&addr as *const libc::sockaddr_can).cast::<libc::sockaddr>(),
            std::mem::size_of::<libc::sockaddr_can>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn set_option<T>(fd: &OwnedFd, level: libc::c_int, name: libc::c_int, value: &T) -> io::Result<()> {
    // SAFETY: `value` points to a live `T` and the length passed is its size.
    let rc = unsafe {
        libc::setsockopt(
            fd.as_raw_fd(),
            level,
            name,
            (value as *const T).cast::<libc::c_void>(),
            std::mem::size_of::<T>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn set_timeout(fd: &OwnedFd, name: libc::c_int, timeout: Option<Duration>) -> Result<()> {
    let tv = match timeout {
        Some(d) if d.is_zero() => {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "zero timeout is not allowed",
            )));
        }
        Some(d) => libc::timeval {
            tv_sec: d.as_secs() as libc::time_t,
            tv_usec: d.subsec_micros() as libc::suseconds_t,
        },
        None => libc::timeval {
            tv_sec: 0,
            tv_usec: 0,
        },
    };
    set_option(fd, libc::SOL_SOCKET, name, &tv)?;
    Ok(())
}
