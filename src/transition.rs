//! The identity change, as a chain of states.
//!
//! Each step consumes the previous state and returns the next one, so
//! the order is fixed at compile time:
//!
//! ```text
//! Detached -> Attached -> Rebased -> InWorkdir
//!          -> GroupsSet -> GroupDropped -> Unprivileged -> exec
//! ```
//!
//! The user id is changed last; once it is gone we could no longer
//! change groups.  Any failure hands back a `LaunchError` and the
//! chain is dropped, so nothing after the failing step is attempted.
//!
//! Skipping a step does not compile:
//!
//! ```compile_fail
//! extern crate jail_stage2;
//! use jail_stage2::{Descriptor, Host, Transition};
//!
//! fn main() {
//!     let descriptor = Descriptor::parse("3:1000:1000:myapp:/srv", 16).unwrap();
//!     let mut host = Host;
//!     let attached = Transition::new(&mut host, &descriptor).attach().unwrap();
//!     let _ = attached.set_user();
//! }
//! ```

use std::marker::PhantomData;
use std::path::Path;

use descriptor::Descriptor;
use environ::{ExecArgv, ExecEnv};
use err::*;
use sys::Kernel;

pub struct Detached;
pub struct Attached;
pub struct Rebased;
pub struct InWorkdir;
pub struct GroupsSet;
pub struct GroupDropped;
pub struct Unprivileged;

/// How to move `/` into the application's root directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebase {
    /// `chroot(root)`.
    Direct,
    /// `chdir(root)` then `chroot(".")`, so the path is resolved only
    /// once and cannot be swapped underneath us.
    Safe,
}

impl Default for Rebase {
    fn default() -> Rebase { Rebase::Safe }
}

pub struct Transition<'a, K: Kernel + 'a, S> {
    kernel:     &'a mut K,
    descriptor: &'a Descriptor,
    state:      PhantomData<S>,
}

impl<'a, K: Kernel + 'a, S> Transition<'a, K, S> {
    fn advance<T>(self) -> Transition<'a, K, T> {
        Transition {
            kernel:     self.kernel,
            descriptor: self.descriptor,
            state:      PhantomData,
        }
    }
}

impl<'a, K: Kernel + 'a> Transition<'a, K, Detached> {
    pub fn new(kernel: &'a mut K, descriptor: &'a Descriptor)
               -> Transition<'a, K, Detached> {
        Transition { kernel: kernel, descriptor: descriptor,
                     state: PhantomData }
    }

    pub fn attach(self) -> Result<Transition<'a, K, Attached>, LaunchError> {
        let jid = self.descriptor.jid;
        self.kernel.jail_attach(jid)
            .map_err(|e| map_nix_err(e, format!("jail_attach({})", jid)))?;
        Ok(self.advance())
    }
}

impl<'a, K: Kernel + 'a> Transition<'a, K, Attached> {
    pub fn rebase_root(self, how: Rebase)
                       -> Result<Transition<'a, K, Rebased>, LaunchError> {
        let root = self.descriptor.root_dir();
        match how {
            Rebase::Direct => {
                self.kernel.chroot(&root)
                    .map_err(|e| map_nix_err(e, format!("chroot: {}",
                                                        root.display())))?;
            },
            Rebase::Safe => {
                self.kernel.chdir(&root)
                    .map_err(|e| map_nix_err(e, format!("chdir: {}",
                                                        root.display())))?;
                self.kernel.chroot(Path::new("."))
                    .map_err(|e| map_nix_err(e, format!("chroot: {}",
                                                        root.display())))?;
            },
        }
        Ok(self.advance())
    }
}

impl<'a, K: Kernel + 'a> Transition<'a, K, Rebased> {
    /// Resolved inside the new root, never on the host.
    pub fn enter_workdir(self) -> Result<Transition<'a, K, InWorkdir>, LaunchError> {
        let cwd = &self.descriptor.workdir;
        self.kernel.chdir(Path::new(cwd))
            .map_err(|e| map_nix_err(e, format!("chdir: {}", cwd)))?;
        Ok(self.advance())
    }
}

impl<'a, K: Kernel + 'a> Transition<'a, K, InWorkdir> {
    pub fn set_groups(self) -> Result<Transition<'a, K, GroupsSet>, LaunchError> {
        let groups = self.descriptor.groups.as_slice();
        self.kernel.setgroups(groups)
            .map_err(|e| {
                let ids: Vec<String> =
                    groups.iter().map(|g| g.to_string()).collect();
                map_nix_err(e, format!("setgroups: {}", ids.join(",")))
            })?;
        Ok(self.advance())
    }
}

impl<'a, K: Kernel + 'a> Transition<'a, K, GroupsSet> {
    pub fn set_primary_group(self)
                             -> Result<Transition<'a, K, GroupDropped>, LaunchError> {
        let gid = self.descriptor.groups.primary();
        self.kernel.setgid(gid)
            .map_err(|e| map_nix_err(e, format!("setgid: {}", gid)))?;
        Ok(self.advance())
    }
}

impl<'a, K: Kernel + 'a> Transition<'a, K, GroupDropped> {
    /// Drop the user id, then make sure the kernel agrees about who we
    /// are now.
    pub fn set_user(self) -> Result<Transition<'a, K, Unprivileged>, LaunchError> {
        let uid = self.descriptor.uid;
        let gid = self.descriptor.groups.primary();
        self.kernel.setuid(uid)
            .map_err(|e| map_nix_err(e, format!("setuid: {}", uid)))?;

        let creds = self.kernel.credentials();
        if creds.uid != uid || creds.euid != uid {
            return Err(LaunchError::Unverified {
                detail: format!("expected uid {}, have uid {} euid {}",
                                uid, creds.uid, creds.euid)
            });
        }
        if creds.gid != gid || creds.egid != gid {
            return Err(LaunchError::Unverified {
                detail: format!("expected gid {}, have gid {} egid {}",
                                gid, creds.gid, creds.egid)
            });
        }
        Ok(self.advance())
    }
}

impl<'a, K: Kernel + 'a> Transition<'a, K, Unprivileged> {
    /// Replace the process image.  Only returns on failure.
    pub fn exec(self, argv: &ExecArgv, env: &ExecEnv) -> LaunchError {
        let prog = argv.program();
        match self.kernel.execve(prog, argv.as_slice(), env.as_slice()) {
            Ok(never) => match never {},
            Err(e) => map_nix_err(e, format!("execve: {}",
                                             prog.to_string_lossy())),
        }
    }
}

/// Run the whole chain.  Returns only if something went wrong.
pub fn launch<K: Kernel>(kernel: &mut K, descriptor: &Descriptor,
                         argv: &ExecArgv, env: &ExecEnv, how: Rebase)
                         -> LaunchError {
    let ready = Transition::new(kernel, descriptor)
        .attach()
        .and_then(|t| t.rebase_root(how))
        .and_then(|t| t.enter_workdir())
        .and_then(|t| t.set_groups())
        .and_then(|t| t.set_primary_group())
        .and_then(|t| t.set_user());
    match ready {
        Ok(t) => t.exec(argv, env),
        Err(e) => e,
    }
}
