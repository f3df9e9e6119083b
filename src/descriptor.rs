//! The identity descriptor handed to us by the first stage:
//!
//! ```text
//! JID:UID:GID[,GID...]:APP:CWD
//! ```
//!
//! Fields are split with bounds-checked borrowed slices; nothing is
//! trimmed, and every numeric field must be all decimal digits.

use std::cmp;
use std::path::PathBuf;
use std::str::FromStr;

use libc::c_int;
use nix::unistd::{Gid, Uid};

use err::*;

pub type JailId = c_int;

/// Parse an id made of decimal digits only.  Signs are refused, so
/// `-1` (the "unchanged" sentinel of the set*id calls) and friends
/// can never sneak in through `str::parse`.
fn parse_id<T: FromStr>(field: &'static str, text: &str)
                        -> Result<T, LaunchError> {
    let bad = || LaunchError::BadField { field: field,
                                         value: text.to_owned() };
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    text.parse::<T>().map_err(|_| bad())
}

fn parse_raw_id(field: &'static str, text: &str) -> Result<u32, LaunchError> {
    let id = parse_id::<u32>(field, text)?;
    if id == u32::max_value() {
        return Err(LaunchError::BadField { field: field,
                                           value: text.to_owned() });
    }
    Ok(id)
}

/// Supplementary group list, primary group first.  Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupList(Vec<Gid>);

impl GroupList {
    /// Parse `GID[,GID...]`.  `max_groups` is the platform's
    /// NGROUPS_MAX; one more than that may be given, since the
    /// primary group rides along in the list.
    pub fn parse(text: &str, max_groups: usize) -> Result<GroupList, LaunchError> {
        let limit = max_groups.saturating_add(1);
        let count = text.split(',').count();
        if count > limit {
            return Err(LaunchError::TooManyGroups { count: count,
                                                    max: limit });
        }

        let mut gids = Vec::with_capacity(cmp::min(count, limit));
        for item in text.split(',') {
            gids.push(Gid::from_raw(parse_raw_id("group id", item)?));
        }
        Ok(GroupList(gids))
    }

    pub fn primary(&self) -> Gid {
        self.0[0]
    }

    pub fn as_slice(&self) -> &[Gid] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub jid:      JailId,
    pub uid:      Uid,
    pub groups:   GroupList,
    pub app_name: String,
    pub workdir:  String,
}

fn next_field<'a, I>(fields: &mut I, name: &str) -> Result<&'a str, LaunchError>
    where I: Iterator<Item = &'a str>
{
    match fields.next() {
        Some(f) if !f.is_empty() => Ok(f),
        _ => Err(usage_err(format!("Descriptor is missing the {}", name))),
    }
}

fn check_app_name(name: &str) -> Result<(), LaunchError> {
    if name == "." || name == ".." || name.contains('/') {
        return Err(LaunchError::BadField { field: "application name",
                                           value: name.to_owned() });
    }
    Ok(())
}

impl Descriptor {
    pub fn parse(text: &str, max_groups: usize) -> Result<Descriptor, LaunchError> {
        // The working directory is whatever follows the fourth colon.
        let mut fields = text.splitn(5, ':');

        let jid = next_field(&mut fields, "jail id")?;
        let jid = parse_id::<JailId>("jail id", jid)?;

        let uid = next_field(&mut fields, "user id")?;
        let uid = Uid::from_raw(parse_raw_id("user id", uid)?);

        let groups = next_field(&mut fields, "group list")?;
        let groups = GroupList::parse(groups, max_groups)?;

        let app_name = next_field(&mut fields, "application name")?;
        check_app_name(app_name)?;

        let workdir = next_field(&mut fields, "working directory")?;

        Ok(Descriptor {
            jid:      jid,
            uid:      uid,
            groups:   groups,
            app_name: app_name.to_owned(),
            workdir:  workdir.to_owned(),
        })
    }

    /// Directory that becomes `/` for the application.
    pub fn root_dir(&self) -> PathBuf {
        PathBuf::from(format!("/app/{}/rootfs", self.app_name))
    }
}
