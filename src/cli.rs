//! Command line handling: turn `argv` into an `Invocation`.
//!
//! clap only ever sees the program name and the descriptor slot, so
//! `--help` and `--version` work there and nowhere else.  Everything
//! after the descriptor is handed to `environ::partition` untouched;
//! `--`, `-h` and friends in the `VAR=val` position are environment
//! entries like any other.

use std::cmp;
use std::ffi::{OsStr, OsString};

use clap::{App, AppSettings, Arg};

use descriptor::Descriptor;
use environ::{self, ExecArgv, ExecEnv};
use err::*;

macro_rules! synopsis {
    () => ("JID:UID:GID[,GID...]:APP:CWD [VAR=val...] PROG [ARG...]")
}

pub const USAGE: &'static str = synopsis!();

/// The one-line usage message, for `progname`.
pub fn usage(progname: &str) -> String {
    format!("Usage: {} {}", progname, USAGE)
}

pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("stage2")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Attach to a jail, drop privileges, and exec an application.")
        .usage(concat!("stage2 ", synopsis!()))
        .setting(AppSettings::AllowLeadingHyphen)
        .arg(Arg::with_name("descriptor")
             .value_name("DESCRIPTOR")
             .help("JID:UID:GID[,GID...]:APP:CWD")
             .required(true)
             .index(1))
        // Listed for --help only; never parsed by clap.
        .arg(Arg::with_name("command")
             .value_name("COMMAND")
             .help("[VAR=val...] followed by the absolute program path \
                    and its arguments")
             .multiple(true)
             .index(2))
}

/// Everything needed to run the identity change and exec.
#[derive(Debug)]
pub struct Invocation {
    pub descriptor: Descriptor,
    pub env:        ExecEnv,
    pub argv:       ExecArgv,
}

impl Invocation {
    /// `args` includes the program name, as from `env::args_os()`.
    pub fn from_args<I, T>(args: I, max_groups: usize)
                           -> Result<Invocation, LaunchError>
        where I: IntoIterator<Item = T>,
              T: Into<OsString>
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let (head, trailing) = args.split_at(cmp::min(args.len(), 2));

        let matches = app().get_matches_from_safe(head.iter().cloned())
            .map_err(map_cli_err)?;

        let descriptor = matches.value_of_os("descriptor")
            .and_then(OsStr::to_str)
            .ok_or_else(|| usage_err("Descriptor is not valid UTF-8"))?;
        let descriptor = Descriptor::parse(descriptor, max_groups)?;

        let (env, argv) = environ::partition(&descriptor.app_name, trailing)?;

        Ok(Invocation { descriptor: descriptor, env: env, argv: argv })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ErrorKind;
    use nix::unistd::{Gid, Uid};

    fn invoke(args: &[&str]) -> Result<Invocation, LaunchError> {
        let mut full = vec!["stage2"];
        full.extend_from_slice(args);
        Invocation::from_args(full, 16)
    }

    fn strings(list: &[::std::ffi::CString]) -> Vec<String> {
        list.iter().map(|c| c.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn end_to_end_single_group() {
        let inv = invoke(&["3:1000:1000:myapp:/srv", "FOO=bar",
                           "/bin/echo", "hi"]).unwrap();
        assert_eq!(inv.descriptor.jid, 3);
        assert_eq!(inv.descriptor.uid, Uid::from_raw(1000));
        assert_eq!(inv.descriptor.groups.as_slice(), &[Gid::from_raw(1000)]);
        assert_eq!(strings(inv.env.as_slice()),
                   vec!["AC_APP_NAME=myapp", "FOO=bar"]);
        assert_eq!(strings(inv.argv.as_slice()), vec!["/bin/echo", "hi"]);
    }

    #[test]
    fn program_arguments_may_look_like_flags() {
        let inv = invoke(&["3:1000:1000:myapp:/srv", "/bin/ls", "-l",
                           "--color=never"]).unwrap();
        assert_eq!(strings(inv.argv.as_slice()),
                   vec!["/bin/ls", "-l", "--color=never"]);
        assert_eq!(strings(inv.env.as_slice()), vec!["AC_APP_NAME=myapp"]);
    }

    #[test]
    fn missing_program_is_a_usage_error() {
        let e = invoke(&["3:1000:1000:myapp:/srv", "FOO=bar", "BAR=baz"])
            .unwrap_err();
        assert!(e.is_usage());
        match e {
            LaunchError::Usage { .. } => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn too_few_arguments_are_usage_errors() {
        match invoke(&["3:1000:1000:myapp:/srv"]) {
            Err(LaunchError::Usage { .. }) => (),
            other => panic!("{:?}", other),
        }
        match invoke(&[]) {
            Err(LaunchError::Cli { .. }) => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn option_lookalikes_after_the_descriptor_are_environment_entries() {
        let inv = invoke(&["3:1:1:a:/", "--", "-h", "--help", "-x=1", "-V",
                           "--version", "/bin/true", "--help"]).unwrap();
        assert_eq!(strings(inv.env.as_slice()),
                   vec!["AC_APP_NAME=a", "--", "-h", "--help", "-x=1", "-V",
                        "--version"]);
        assert_eq!(strings(inv.argv.as_slice()), vec!["/bin/true", "--help"]);
    }

    #[test]
    fn option_lookalikes_without_a_program_are_still_usage_errors() {
        match invoke(&["3:1:1:a:/", "--help", "-V"]) {
            Err(LaunchError::Usage { .. }) => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn help_is_only_recognised_before_the_descriptor() {
        match invoke(&["--help"]) {
            Err(LaunchError::Cli { cause }) => {
                assert_eq!(cause.kind, ErrorKind::HelpDisplayed);
            }
            other => panic!("{:?}", other),
        }
        match invoke(&["-V"]) {
            Err(LaunchError::Cli { cause }) => {
                assert_eq!(cause.kind, ErrorKind::VersionDisplayed);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn bad_descriptor_is_a_usage_error() {
        let e = invoke(&["3:1000:1000:myapp", "/bin/true"]).unwrap_err();
        assert!(e.is_usage());
    }

    #[test]
    fn usage_names_the_program() {
        assert_eq!(usage("stage2"),
                   "Usage: stage2 JID:UID:GID[,GID...]:APP:CWD [VAR=val...] \
                    PROG [ARG...]");
        assert_eq!(concat!("stage2 ", synopsis!()), &usage("stage2")[7..]);
    }
}
