//! Second stage of jail startup: attach to a jail that the first stage
//! has already built, chroot into the application's root filesystem,
//! drop to the application's user and groups, and exec it.

#![cfg(unix)]

extern crate clap;
extern crate libc;
extern crate nix;

mod err;
pub use err::*;

mod descriptor;
pub use descriptor::*;

mod environ;
pub use environ::*;

mod cli;
pub use cli::*;

mod sys;
pub use sys::*;

mod transition;
pub use transition::*;
