use std::sync::LazyLock;

use regex::Regex;

pub const EMAIL_MAX_LENGTH: usize = 254;
pub const EMAIL_LOCAL_PART_MAX_LENGTH: usize = 64;

pub static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

/// Returns whether `value` has the shape of an email address.
pub fn is_valid_email(value: &str) -> bool {
    let Some((local, _)) = value.split_once('@') else {
        return false;
    };

    value.len() <= EMAIL_MAX_LENGTH
        && local.len() <= EMAIL_LOCAL_PART_MAX_LENGTH
        && EMAIL_REGEX.is_match(value)
}
