//! Process supervisor: staged subsystem start/undo, a dedicated
//! `SIGTERM`-handling shutdown thread, and ordered teardown.
//!
//! Grounded line-for-line on `meta_process.c`: `process_add_object_to_start`,
//! `shutdown_thread`, `handle_shutdown`, `process_start`, and
//! `process_wait_for_shutdown`. Signal handling uses `signal-hook`'s
//! blocking `Signals` iterator as the Rust analog of `sigwait` -- both block
//! the calling thread until the process-wide-masked signal is delivered to
//! whichever thread is waiting for it.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use signal_hook::consts::signal::SIGTERM;
use signal_hook::iterator::Signals;

use crate::error::{Error, Result};

/// A subsystem registered with the supervisor, exposing `do`/`undo`/`run`/
/// `shutdown` operations. `shutdown` must be idempotent and tolerant of a
/// not-yet-running subject, since it is called on every subsystem
/// regardless of whether its worker has been spawned yet.
pub trait Subsystem: Send + Sync {
    fn name(&self) -> &str;
    fn start(&self) -> Result<()> {
        Ok(())
    }
    fn undo(&self) {}
    fn run(&self) -> i32;
    fn shutdown(&self);
}

struct Entry {
    subsystem: Arc<dyn Subsystem>,
    started: AtomicBool,
    exitcode: Mutex<Option<i32>>,
}

/// Coordinates process-wide startup and a single graceful-shutdown path
/// across every registered [`Subsystem`].
pub struct Supervisor {
    appname: String,
    rootdir: Option<PathBuf>,
    username: Option<String>,
    entries: Vec<Entry>,
    shutting_down: Arc<AtomicBool>,
    shutdown_handle: Mutex<Option<JoinHandle<()>>>,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Supervisor {
    pub fn new(appname: impl Into<String>) -> Self {
        Self {
            appname: appname.into(),
            rootdir: None,
            username: None,
            entries: Vec::new(),
            shutting_down: Arc::new(AtomicBool::new(false)),
            shutdown_handle: Mutex::new(None),
            worker_handles: Mutex::new(Vec::new()),
        }
    }

    /// Directory to `chroot` into after startup, before privileges are
    /// dropped.
    pub fn set_rootdir(&mut self, dir: impl Into<PathBuf>) {
        self.rootdir = Some(dir.into());
    }

    /// Unprivileged user to `setuid` to after startup.
    pub fn set_username(&mut self, user: impl Into<String>) {
        self.username = Some(user.into());
    }

    /// Appends a subsystem. Registration order determines `do` order;
    /// `undo`/`shutdown` run in reverse.
    pub fn register(&mut self, subsystem: Arc<dyn Subsystem>) {
        self.entries.push(Entry {
            subsystem,
            started: AtomicBool::new(false),
            exitcode: Mutex::new(None),
        });
    }

    pub fn shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    fn write_pid_file(&self) -> Result<()> {
        let path = PathBuf::from(format!("/var/run/{}.pid", self.appname));
        fs::write(&path, std::process::id().to_string())
            .map_err(|e| Error::with_source(crate::error::ErrorKind::Io, "write pid file", e))
    }

    /// Runs every registered subsystem's `do`, undoing previously-succeeded
    /// ones in reverse on the first failure.
    fn start_all(&self) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            match entry.subsystem.start() {
                Ok(()) => entry.started.store(true, Ordering::Release),
                Err(e) => {
                    for prior in self.entries[..i].iter().rev() {
                        if prior.started.load(Ordering::Acquire) {
                            prior.subsystem.undo();
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Blocks `SIGTERM` process-wide (via `signal_hook`'s registration),
    /// writes the pid file, waits for delivery, then runs every
    /// subsystem's `shutdown` in reverse registration order.
    fn spawn_shutdown_thread(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let mut signals = Signals::new([SIGTERM])
            .map_err(|e| Error::with_source(crate::error::ErrorKind::Io, "install SIGTERM handler", e))?;
        self.write_pid_file()?;

        let this = Arc::clone(self);
        Ok(std::thread::spawn(move || {
            for _ in signals.forever() {
                break;
            }
            this.shutting_down.store(true, Ordering::Release);
            for entry in this.entries.iter().rev() {
                entry.subsystem.shutdown();
            }
        }))
    }

    /// Forks and detaches: the parent exits immediately, the child closes
    /// stdin/stdout/stderr and continues as the supervised process.
    fn fork_and_detach() -> Result<()> {
        // Safety: fork() is async-signal-safe at this point in startup --
        // no other threads have been spawned yet, so there is nothing for
        // the child to inherit in an inconsistent state.
        let pid = unsafe { libc::fork() };
        if pid < 0 {
            return Err(Error::with_source(
                crate::error::ErrorKind::Io,
                "fork failed",
                std::io::Error::last_os_error(),
            ));
        }
        if pid > 0 {
            std::process::exit(0);
        }
        // Safety: stdio fds are always valid to close in the freshly forked
        // child; errors are not actionable here.
        unsafe {
            libc::close(0);
            libc::close(1);
            libc::close(2);
        }
        Ok(())
    }

    /// Resolves `username`, then `chdir`+`chroot` (if `rootdir` is
    /// configured), then `setuid`. Any failure here should trigger a full
    /// undo by the caller.
    fn drop_privileges(&self) -> Result<()> {
        if let Some(dir) = &self.rootdir {
            let c_dir = std::ffi::CString::new(dir.as_os_str().as_encoded_bytes())
                .map_err(|e| Error::configuration(format!("invalid rootdir: {e}")))?;
            // Safety: `c_dir` is a valid, NUL-terminated path for the
            // duration of this call.
            let rc = unsafe { libc::chdir(c_dir.as_ptr()) };
            if rc != 0 {
                return Err(Error::with_source(
                    crate::error::ErrorKind::Io,
                    "chdir failed",
                    std::io::Error::last_os_error(),
                ));
            }
            // Safety: same pointer, still valid.
            let rc = unsafe { libc::chroot(c_dir.as_ptr()) };
            if rc != 0 {
                return Err(Error::with_source(
                    crate::error::ErrorKind::Io,
                    "chroot failed",
                    std::io::Error::last_os_error(),
                ));
            }
        }

        if let Some(user) = &self.username {
            let c_user = std::ffi::CString::new(user.as_bytes())
                .map_err(|e| Error::configuration(format!("invalid username: {e}")))?;
            let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
            let mut buf = vec![0i8; 16 * 1024];
            let mut result: *mut libc::passwd = std::ptr::null_mut();
            // Safety: `buf` is sized generously and `pwd`/`result` are valid
            // out-parameters per `getpwnam_r`'s contract.
            let rc = unsafe {
                libc::getpwnam_r(
                    c_user.as_ptr(),
                    &mut pwd,
                    buf.as_mut_ptr(),
                    buf.len(),
                    &mut result,
                )
            };
            if rc != 0 || result.is_null() {
                return Err(Error::configuration(format!("unknown user {user}")));
            }
            // Safety: `setuid` takes a plain integer; no aliasing concerns.
            let rc = unsafe { libc::setuid(pwd.pw_uid) };
            if rc != 0 {
                return Err(Error::with_source(
                    crate::error::ErrorKind::Io,
                    "setuid failed",
                    std::io::Error::last_os_error(),
                ));
            }
        }
        Ok(())
    }

    /// Starts every subsystem, installs the shutdown thread, optionally
    /// drops privileges, then spawns a worker thread per subsystem
    /// executing `run`.
    pub fn start(self: &Arc<Self>, fork_and_close: bool) -> Result<()> {
        if fork_and_close {
            Self::fork_and_detach()?;
        }

        self.start_all()?;

        let shutdown_handle = self.spawn_shutdown_thread()?;
        *self.shutdown_handle.lock().unwrap() = Some(shutdown_handle);

        if let Err(e) = self.drop_privileges() {
            for entry in self.entries.iter().rev() {
                entry.subsystem.undo();
            }
            return Err(e);
        }

        let mut handles = Vec::with_capacity(self.entries.len());
        for (i, entry) in self.entries.iter().enumerate() {
            let this = Arc::clone(self);
            handles.push(std::thread::spawn(move || {
                let code = this.entries[i].subsystem.run();
                *this.entries[i].exitcode.lock().unwrap() = Some(code);
            }));
        }
        *self.worker_handles.lock().unwrap() = handles;
        Ok(())
    }

    /// Joins the shutdown thread, then every subsystem worker.
    pub fn wait_for_shutdown(&self) -> Result<()> {
        if let Some(handle) = self.shutdown_handle.lock().unwrap().take() {
            handle
                .join()
                .map_err(|_| Error::invalid_state("shutdown thread panicked"))?;
        }
        let handles = std::mem::take(&mut *self.worker_handles.lock().unwrap());
        for handle in handles {
            handle
                .join()
                .map_err(|_| Error::invalid_state("subsystem worker panicked"))?;
        }
        Ok(())
    }

    pub fn exitcode(&self, name: &str) -> Option<i32> {
        let entry = self.entries.iter().find(|e| e.subsystem.name() == name)?;
        *entry.exitcode.lock().unwrap()
    }
}
