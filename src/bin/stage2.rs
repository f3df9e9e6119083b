/* Enter a running jail as an unprivileged application.
 *
 * Copyright © 2016 Zack Weinberg
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * http://www.apache.org/licenses/LICENSE-2.0
 * There is NO WARRANTY.
 *
 *     stage2 JID:UID:GID[,GID...]:APP:CWD [VAR=val...] PROG [ARG...]
 *
 * attaches to the already-running jail JID, makes /app/APP/rootfs
 * (as seen from inside the jail) the root directory, changes to CWD
 * inside that root, sets the supplementary group list to exactly the
 * listed GIDs, the primary group to the first GID, and finally the
 * user to UID.  Then it execs PROG, which must be an absolute path,
 * with ARGs.
 *
 * The environment of PROG is AC_APP_NAME=APP followed by the
 * VAR=val arguments, in order.  The first argument that starts with
 * '/' is taken as PROG.  Nothing from our own environment is passed
 * down.
 *
 * Every failure is fatal: a diagnostic goes to stderr and the exit
 * status is 1.  There is no point at which it is safe to carry on
 * with a half-changed identity.
 *
 * This program is meant to be run as root by the first stage, which
 * creates the jail and the application's root filesystem.  Jails are
 * FreeBSD-specific; elsewhere the attach step fails with ENOSYS.
 */

extern crate jail_stage2;

use std::env;
use std::io;
use std::process;

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;

use jail_stage2::*;

fn run(args: Vec<OsString>) -> LaunchError {
    let max_groups = match max_groups() {
        Ok(n) => n,
        Err(e) => return e,
    };
    let inv = match Invocation::from_args(args, max_groups) {
        Ok(inv) => inv,
        Err(e) => return e,
    };
    launch(&mut Host, &inv.descriptor, &inv.argv, &inv.env, Rebase::Safe)
}

fn report(progname: &str, err: LaunchError) -> ! {
    if let LaunchError::Cli { cause } = err {
        cause.exit();
    }
    let mut stderr = io::stderr();
    let _ = writeln!(stderr, "{}: {}", progname, err);
    if err.is_usage() {
        let _ = writeln!(stderr, "{}", usage(progname));
    }
    process::exit(1);
}

fn main() {
    let args: Vec<OsString> = env::args_os().collect();
    let progname = args.first()
        .and_then(|a| Path::new(a).file_name())
        .and_then(|s| s.to_str())
        .unwrap_or("stage2")
        .to_owned();

    let err = run(args);
    report(&progname, err);
}
