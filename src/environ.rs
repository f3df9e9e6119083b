//! Environment synthesis and the split between environment entries
//! and the target program's argv.
//!
//! The arguments after the descriptor look like
//!
//! ```text
//! [VAR=val...] /path/to/program [arg...]
//! ```
//!
//! Everything before the first argument starting with `/` goes into
//! the environment, verbatim; the rest is the argv.

use std::ffi::{CStr, CString, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;

use err::*;

/// Always the first entry of the environment.
pub const APP_NAME_VAR: &'static str = "AC_APP_NAME";

fn to_cstring(arg: &OsStr, what: &str) -> Result<CString, LaunchError> {
    CString::new(arg.as_bytes())
        .map_err(|e| map_nul_err(e, format!("{} {:?}", what, arg)))
}

fn is_program(arg: &OsStr) -> bool {
    arg.as_bytes().first() == Some(&b'/')
}

/// Environment block for the target program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecEnv(Vec<CString>);

impl ExecEnv {
    pub fn as_slice(&self) -> &[CString] {
        &self.0
    }
}

/// Argument vector for the target program.  Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecArgv(Vec<CString>);

impl ExecArgv {
    /// Path of the program to execute (argv[0]).
    pub fn program(&self) -> &CStr {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[CString] {
        &self.0
    }
}

/// Split `trailing` at the first `/`-prefixed argument.  Fails if
/// there is none, since then there is nothing to execute.
pub fn partition(app_name: &str, trailing: &[OsString])
                 -> Result<(ExecEnv, ExecArgv), LaunchError> {
    let split = trailing.iter()
        .position(|a| is_program(a))
        .ok_or_else(|| usage_err("No program to execute"))?;
    let (vars, prog) = trailing.split_at(split);

    let mut env = Vec::with_capacity(vars.len() + 1);
    env.push(CString::new(format!("{}={}", APP_NAME_VAR, app_name))
             .map_err(|e| map_nul_err(e, String::from("application name")))?);
    for var in vars {
        env.push(to_cstring(var, "environment entry")?);
    }

    let argv = prog.iter()
        .map(|a| to_cstring(a, "argument"))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((ExecEnv(env), ExecArgv(argv)))
}
