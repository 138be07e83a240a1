//! Named POSIX shared-memory segment: create/attach/unmap/unlink.
//!
//! This is the only module that touches raw OS handles. Everything above it
//! operates on the mapping through typed pointers into a [`Segment`]'s memory.

use std::ffi::CString;
use std::ptr;

use crate::error::QueueError;

/// Prefix prepended to every caller-supplied name before it reaches `shm_open`.
pub const SHM_PREFIX: &str = "/arquebus_";

/// Conservative, portable bound on a POSIX shared-memory object name, chosen to
/// match the historical `NAME_MAX` of 255 bytes rather than depend on a
/// platform-specific `libc` constant that isn't guaranteed to exist on every
/// target this crate builds for.
const NAME_MAX: usize = 255;

/// A scoped raw file descriptor, closed on drop.
///
/// `shm_open` hands back a descriptor that is only needed to `ftruncate` and
/// `mmap`; once the mapping exists the descriptor itself can be closed without
/// affecting the mapping's lifetime. Keeping it behind a tiny guard means every
/// early-return path (including on error) still closes it.
struct RawFd(libc::c_int);

impl Drop for RawFd {
    fn drop(&mut self) {
        if self.0 >= 0 {
            unsafe {
                libc::close(self.0);
            }
        }
    }
}

/// A mapped POSIX shared-memory segment.
///
/// Not `Clone`, not `Copy`. Exactly one `Segment` per process holds the "unlink
/// owner" bit; only that one removes the name from the filesystem namespace when
/// dropped. Every other attached `Segment` only unmaps.
pub struct Segment {
    name: CString,
    display_name: String,
    ptr: *mut u8,
    len: usize,
    is_unlink_owner: bool,
}

// The mapping is plain bytes shared with other processes; synchronization within
// it is the caller's responsibility via the atomics it contains. The `Segment`
// handle itself has no interior mutability beyond the raw pointer, so it's safe
// to move (and thus send) between threads within one process.
unsafe impl Send for Segment {}
unsafe impl Sync for Segment {}

fn full_name(name: &str) -> Result<CString, QueueError> {
    if name.is_empty() {
        return Err(QueueError::InvalidName {
            name: name.to_owned(),
            reason: "name must not be empty",
        });
    }
    if name.len() >= NAME_MAX - SHM_PREFIX.len() {
        return Err(QueueError::InvalidName {
            name: name.to_owned(),
            reason: "name is too long once the shared-memory prefix is added",
        });
    }
    let full = format!("{SHM_PREFIX}{name}");
    CString::new(full).map_err(|_| QueueError::InvalidName {
        name: name.to_owned(),
        reason: "name must not contain an embedded NUL byte",
    })
}

fn map(fd: libc::c_int, len: usize, name: &str) -> Result<*mut u8, QueueError> {
    let ptr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            fd,
            0,
        )
    };
    if ptr == libc::MAP_FAILED {
        return Err(QueueError::MapFailed {
            name: name.to_owned(),
            syscall: "mmap",
            errno: unsafe { *libc::__errno_location() },
        });
    }
    Ok(ptr.cast())
}

impl Segment {
    /// Create a new segment, failing if one of this name already exists.
    ///
    /// The returned `Segment` is the unlink owner: dropping it removes the name
    /// from the filesystem namespace as well as unmapping.
    pub fn create(name: &str, len: usize) -> Result<Self, QueueError> {
        let full = full_name(name)?;
        let fd = unsafe {
            libc::shm_open(
                full.as_ptr(),
                libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                0o600,
            )
        };
        if fd < 0 {
            let errno = unsafe { *libc::__errno_location() };
            return Err(if errno == libc::EEXIST {
                QueueError::AlreadyExists {
                    name: name.to_owned(),
                }
            } else {
                QueueError::MapFailed {
                    name: name.to_owned(),
                    syscall: "shm_open",
                    errno,
                }
            });
        }
        let fd = RawFd(fd);

        if unsafe { libc::ftruncate(fd.0, len as libc::off_t) } != 0 {
            let errno = unsafe { *libc::__errno_location() };
            unsafe {
                libc::shm_unlink(full.as_ptr());
            }
            return Err(QueueError::MapFailed {
                name: name.to_owned(),
                syscall: "ftruncate",
                errno,
            });
        }

        let ptr = match map(fd.0, len, name) {
            Ok(ptr) => ptr,
            Err(err) => {
                unsafe {
                    libc::shm_unlink(full.as_ptr());
                }
                return Err(err);
            }
        };

        Ok(Self {
            name: full,
            display_name: name.to_owned(),
            ptr,
            len,
            is_unlink_owner: true,
        })
    }

    /// Attach to an existing segment, failing if none of this name exists.
    pub fn attach(name: &str, len: usize) -> Result<Self, QueueError> {
        let full = full_name(name)?;
        let fd = unsafe { libc::shm_open(full.as_ptr(), libc::O_RDWR, 0) };
        if fd < 0 {
            let errno = unsafe { *libc::__errno_location() };
            return Err(if errno == libc::ENOENT {
                QueueError::NotFound {
                    name: name.to_owned(),
                }
            } else {
                QueueError::MapFailed {
                    name: name.to_owned(),
                    syscall: "shm_open",
                    errno,
                }
            });
        }
        let fd = RawFd(fd);

        let ptr = map(fd.0, len, name)?;

        Ok(Self {
            name: full,
            display_name: name.to_owned(),
            ptr,
            len,
            is_unlink_owner: false,
        })
    }

    /// Unconditionally unlink a segment name, ignoring "does not exist". Used
    /// only by the host's explicit recreate path.
    pub fn delete_existing(name: &str) -> Result<(), QueueError> {
        let full = full_name(name)?;
        unsafe {
            libc::shm_unlink(full.as_ptr());
        }
        Ok(())
    }

    /// Raw pointer to the start of the mapping.
    #[must_use]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// Length of the mapping in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.display_name
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr.cast(), self.len);
        }
        if self.is_unlink_owner {
            unsafe {
                libc::shm_unlink(self.name.as_ptr());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn unique_name(tag: &str) -> String {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        format!(
            "test_{tag}_{}_{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        )
    }

    #[test]
    fn create_then_attach_share_memory() {
        let name = unique_name("create_attach");
        let host = Segment::create(&name, 4096).expect("create");
        let user = Segment::attach(&name, 4096).expect("attach");

        unsafe {
            host.as_ptr().write(0x42);
        }
        assert_eq!(unsafe { user.as_ptr().read() }, 0x42);
    }

    #[test]
    fn create_twice_fails_with_already_exists() {
        let name = unique_name("create_twice");
        let _host = Segment::create(&name, 4096).expect("create");
        let err = Segment::create(&name, 4096).unwrap_err();
        assert!(matches!(err, QueueError::AlreadyExists { .. }));
    }

    #[test]
    fn attach_without_create_fails_with_not_found() {
        let name = unique_name("attach_missing");
        let err = Segment::attach(&name, 4096).unwrap_err();
        assert!(matches!(err, QueueError::NotFound { .. }));
    }

    #[test]
    fn dropping_the_owner_unlinks_the_name() {
        let name = unique_name("unlink");
        let host = Segment::create(&name, 4096).expect("create");
        drop(host);
        let err = Segment::attach(&name, 4096).unwrap_err();
        assert!(matches!(err, QueueError::NotFound { .. }));
    }

    #[test]
    fn dropping_a_non_owner_leaves_the_name_intact() {
        let name = unique_name("non_owner_drop");
        let host = Segment::create(&name, 4096).expect("create");
        let user = Segment::attach(&name, 4096).expect("attach");
        drop(user);
        // the segment should still be attachable; host is still alive
        let user2 = Segment::attach(&name, 4096).expect("re-attach");
        drop(user2);
        drop(host);
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = Segment::create("", 4096).unwrap_err();
        assert!(matches!(err, QueueError::InvalidName { .. }));
    }
}
