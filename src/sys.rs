//! The privileged system calls, behind a trait so the ordering of
//! the identity change can be observed without actually being root.

use std::convert::Infallible;
use std::ffi::{CStr, CString};
use std::path::Path;

use nix;
use nix::errno::Errno;
use nix::unistd::{self, Gid, Uid, SysconfVar};

use descriptor::JailId;
use err::*;

/// Real and effective ids, as reported after the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials {
    pub uid:  Uid,
    pub euid: Uid,
    pub gid:  Gid,
    pub egid: Gid,
}

pub trait Kernel {
    fn jail_attach(&mut self, jid: JailId) -> nix::Result<()>;
    fn chroot(&mut self, path: &Path) -> nix::Result<()>;
    fn chdir(&mut self, path: &Path) -> nix::Result<()>;
    fn setgroups(&mut self, groups: &[Gid]) -> nix::Result<()>;
    fn setgid(&mut self, gid: Gid) -> nix::Result<()>;
    fn setuid(&mut self, uid: Uid) -> nix::Result<()>;
    fn credentials(&self) -> Credentials;
    fn execve(&mut self, path: &CStr, argv: &[CString], envp: &[CString])
              -> nix::Result<Infallible>;
}

/// The running kernel.
#[derive(Debug, Default, Clone, Copy)]
pub struct Host;

#[cfg(target_os = "freebsd")]
fn attach(jid: JailId) -> nix::Result<()> {
    let rv = unsafe { ::libc::jail_attach(jid) };
    Errno::result(rv).map(drop)
}

// Jails are a FreeBSD facility.
#[cfg(not(target_os = "freebsd"))]
fn attach(_jid: JailId) -> nix::Result<()> {
    Err(Errno::ENOSYS)
}

impl Kernel for Host {
    fn jail_attach(&mut self, jid: JailId) -> nix::Result<()> {
        attach(jid)
    }
    fn chroot(&mut self, path: &Path) -> nix::Result<()> {
        unistd::chroot(path)
    }
    fn chdir(&mut self, path: &Path) -> nix::Result<()> {
        unistd::chdir(path)
    }
    fn setgroups(&mut self, groups: &[Gid]) -> nix::Result<()> {
        unistd::setgroups(groups)
    }
    fn setgid(&mut self, gid: Gid) -> nix::Result<()> {
        unistd::setgid(gid)
    }
    fn setuid(&mut self, uid: Uid) -> nix::Result<()> {
        unistd::setuid(uid)
    }
    fn credentials(&self) -> Credentials {
        Credentials {
            uid:  unistd::getuid(),
            euid: unistd::geteuid(),
            gid:  unistd::getgid(),
            egid: unistd::getegid(),
        }
    }
    fn execve(&mut self, path: &CStr, argv: &[CString], envp: &[CString])
              -> nix::Result<Infallible> {
        unistd::execve(path, argv, envp)
    }
}

/// The platform's NGROUPS_MAX, queried at run time.
pub fn max_groups() -> Result<usize, LaunchError> {
    match unistd::sysconf(SysconfVar::NGROUPS_MAX) {
        Ok(Some(n)) if n > 0 => Ok(n as usize),
        Ok(_) => Err(map_nix_err(Errno::EINVAL,
                                 String::from("sysconf(NGROUPS_MAX)"))),
        Err(e) => Err(map_nix_err(e, String::from("sysconf(NGROUPS_MAX)"))),
    }
}
