// systemd.rs - Readiness and status notification for the service manager.
//
// Implements the sd_notify datagram protocol: a `KEY=VALUE` message sent to
// the socket named by NOTIFY_SOCKET. A leading `@` names a Linux abstract
// socket. Without NOTIFY_SOCKET (not started by systemd) nothing is sent.

use std::ffi::OsStr;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::net::UnixDatagram;
use std::path::Path;

/// Directory that exists only when the host was booted with systemd.
pub const SYSTEMD_RUNTIME_DIR: &str = "/run/systemd/system";

/// Whether the host runs systemd as its service manager.
pub fn booted() -> bool {
    Path::new(SYSTEMD_RUNTIME_DIR).is_dir()
}

/// Send `state` to the service manager.
///
/// Returns `Ok(false)` when NOTIFY_SOCKET is unset.
pub fn notify(state: &str) -> io::Result<bool> {
    match std::env::var_os("NOTIFY_SOCKET") {
        Some(socket) => notify_to(&socket, state).map(|()| true),
        None => Ok(false),
    }
}

fn notify_to(socket: &OsStr, state: &str) -> io::Result<()> {
    let sock = UnixDatagram::unbound()?;
    let name = socket.as_bytes();
    match name.split_first() {
        Some((&b'@', abstract_name)) => send_abstract(&sock, abstract_name, state.as_bytes()),
        _ => sock.send_to(state.as_bytes(), Path::new(socket)).map(|_| ()),
    }
}

#[cfg(target_os = "linux")]
fn send_abstract(sock: &UnixDatagram, name: &[u8], payload: &[u8]) -> io::Result<()> {
    use std::os::linux::net::SocketAddrExt;
    use std::os::unix::net::SocketAddr;

    let addr = SocketAddr::from_abstract_name(name)?;
    sock.send_to_addr(payload, &addr).map(|_| ())
}

#[cfg(not(target_os = "linux"))]
fn send_abstract(_sock: &UnixDatagram, _name: &[u8], _payload: &[u8]) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "abstract notify sockets are only available on Linux",
    ))
}

/// Send `state`, logging instead of failing.
pub fn notify_or_log(state: &str) {
    match notify(state) {
        Ok(true) => tracing::debug!(state, "notified service manager"),
        Ok(false) => tracing::trace!(state, "NOTIFY_SOCKET unset, not notifying"),
        Err(e) => tracing::warn!(state, error = %e, "failed to notify service manager"),
    }
}

pub fn ready() {
    notify_or_log("READY=1");
}

pub fn status(message: &str) {
    notify_or_log(&format!("STATUS={}", message));
}

pub fn stopping() {
    notify_or_log("STOPPING=1");
}
